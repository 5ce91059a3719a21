use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, PageParams};
use crate::config;
use crate::database::models::{
    Freshness, ListingType, PriceHistory, Property, PropertyStatus,
};
use crate::error::ApiError;
use crate::middleware::AuthSession;
use crate::services::property_service::{self, ListFilters, NewProperty, PropertyPatch};
use crate::state::AppState;

/// Property plus its derived freshness classification, computed at
/// serialization time so it can never go stale.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: Property,
    pub freshness: Freshness,
}

impl From<Property> for PropertyView {
    fn from(property: Property) -> Self {
        let window = config::config().listings.staleness_window_days;
        let freshness = property.freshness(Utc::now(), window);
        Self { property, freshness }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<PropertyStatus>,
    pub listing_type: Option<ListingType>,
    pub city: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl PropertyListQuery {
    fn filters(&self, agent_scope: Option<Uuid>) -> ListFilters {
        ListFilters {
            status: self.status,
            listing_type: self.listing_type,
            city: self.city.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            agent_scope,
        }
    }

    fn page_params(&self) -> PageParams {
        PageParams { page: self.page, limit: self.limit }
    }
}

/// GET /properties - public buyer-facing listing search
pub async fn public_list(
    State(state): State<AppState>,
    Query(query): Query<PropertyListQuery>,
) -> ApiResult<Vec<PropertyView>> {
    let (page, limit) = query.page_params().resolve()?;
    let (rows, total) =
        property_service::list_properties(&state.pool, &query.filters(None), page, limit).await?;

    let views = rows.into_iter().map(PropertyView::from).collect();
    Ok(ApiResponse::paginated(views, page, limit, total))
}

/// GET /properties/:id - public property detail
pub async fn public_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PropertyView> {
    let property = property_service::get_property(&state.pool, id).await?;
    Ok(ApiResponse::success(property.into()))
}

/// GET /api/properties - agent dashboard listing, scoped by role
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(query): Query<PropertyListQuery>,
) -> ApiResult<Vec<PropertyView>> {
    let agent = session.require_agent()?;
    let scope = if agent.role.is_internal() { None } else { Some(agent.id) };

    let (page, limit) = query.page_params().resolve()?;
    let (rows, total) =
        property_service::list_properties(&state.pool, &query.filters(scope), page, limit).await?;

    let views = rows.into_iter().map(PropertyView::from).collect();
    Ok(ApiResponse::paginated(views, page, limit, total))
}

/// POST /api/properties - create a listing (plus its initial price-history
/// row). Missing coordinates are filled from the geocoding provider when
/// one is configured; provider failure is non-fatal.
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(mut new): Json<NewProperty>,
) -> ApiResult<PropertyView> {
    let agent = session.require_agent()?;
    if new.agent_id.is_none() {
        new.agent_id = Some(agent.id);
    }

    if new.lat.is_none() || new.lng.is_none() {
        if let Some(query) = geocode_query(&new) {
            match state.geocoder.forward(&query).await {
                Ok(Some(found)) => {
                    new.lat.get_or_insert(found.lat);
                    new.lng.get_or_insert(found.lng);
                    if new.city.is_none() {
                        new.city = found.city;
                    }
                    if new.postal_code.is_none() {
                        new.postal_code = found.postal_code;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("geocoding failed, creating property without coordinates: {}", e);
                }
            }
        }
    }

    let property = property_service::create_property(&state.pool, new, &agent.email).await?;
    Ok(ApiResponse::created(property.into()))
}

/// PATCH /api/properties/:id - partial update; price changes append audit
/// history, status changes go through the lifecycle rules
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(patch): Json<PropertyPatch>,
) -> ApiResult<PropertyView> {
    let agent = session.require_agent()?;
    let property = property_service::update_property(&state.pool, id, patch, agent).await?;
    Ok(ApiResponse::success(property.into()))
}

/// GET /api/properties/:id/price-history - audit trail, oldest last
pub async fn price_history(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<PriceHistory>> {
    let agent = session.require_agent()?;
    let property = property_service::get_property(&state.pool, id).await?;
    if !agent.role.is_internal() && property.agent_id != Some(agent.id) {
        return Err(ApiError::forbidden("Property belongs to another agent"));
    }

    let rows = property_service::price_history(&state.pool, id).await?;
    Ok(ApiResponse::success(rows))
}

fn geocode_query(new: &NewProperty) -> Option<String> {
    match (&new.address, &new.city) {
        (Some(address), Some(city)) => Some(format!("{}, {}", address, city)),
        (Some(address), None) => Some(address.clone()),
        (None, Some(city)) => Some(city.clone()),
        (None, None) => None,
    }
}
