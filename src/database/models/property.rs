use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "property_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    Available,
    Pending,
    Sold,
    Rented,
}

impl PropertyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyStatus::Available => "AVAILABLE",
            PropertyStatus::Pending => "PENDING",
            PropertyStatus::Sold => "SOLD",
            PropertyStatus::Rented => "RENTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingType {
    Sale,
    Rent,
    Both,
}

/// The actor category that most recently confirmed the property's status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_source", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationSource {
    Owner,
    System,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub status: PropertyStatus,
    pub listing_type: ListingType,
    pub price: Decimal,
    pub rent_price: Option<Decimal>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub verification_source: Option<VerificationSource>,
    pub agent_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived classification: never stored, recomputed at query time so it
/// cannot go stale beyond one read cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    NeedsCheck,
}

impl Freshness {
    pub fn classify(
        last_verified_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        staleness_window_days: i64,
    ) -> Self {
        match last_verified_at {
            Some(verified) if now - verified <= Duration::days(staleness_window_days) => {
                Freshness::Fresh
            }
            _ => Freshness::NeedsCheck,
        }
    }
}

impl Property {
    pub fn freshness(&self, now: DateTime<Utc>, staleness_window_days: i64) -> Freshness {
        Freshness::classify(self.last_verified_at, now, staleness_window_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_verified_needs_check() {
        assert_eq!(
            Freshness::classify(None, Utc::now(), 14),
            Freshness::NeedsCheck
        );
    }

    #[test]
    fn recently_verified_is_fresh() {
        let now = Utc::now();
        let verified = now - Duration::days(13);
        assert_eq!(Freshness::classify(Some(verified), now, 14), Freshness::Fresh);
    }

    #[test]
    fn verified_outside_window_needs_check() {
        let now = Utc::now();
        let verified = now - Duration::days(15);
        assert_eq!(
            Freshness::classify(Some(verified), now, 14),
            Freshness::NeedsCheck
        );
    }
}
