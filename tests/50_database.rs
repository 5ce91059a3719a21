mod common;

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use estate_api_rust::database::models::{
    AgentProfile, AgentRole, EnquiryStatus, ListingType, PriceChangeType, PropertyStatus,
    VerificationSource,
};
use estate_api_rust::services::deal_service::{self, DealPatch, NewDeal};
use estate_api_rust::services::enquiry_service::{self, NewEnquiry};
use estate_api_rust::services::property_service::{
    self, NewProperty, PropertyPatch, VerifyAction,
};

// Every test here needs a live Postgres; they skip when DATABASE_URL is
// not set so the non-DB suites stay runnable anywhere.
macro_rules! require_db {
    () => {
        match common::try_db_pool().await {
            Some(pool) => pool,
            None => {
                eprintln!("DATABASE_URL not set or unreachable; skipping");
                return Ok(());
            }
        }
    };
}

async fn seed_agent(pool: &PgPool, role: AgentRole) -> Result<AgentProfile> {
    let agent = sqlx::query_as::<_, AgentProfile>(
        r#"
        INSERT INTO agent_profiles (id, email, name, role, is_active, created_at)
        VALUES ($1, $2, $3, $4, TRUE, NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(format!("agent-{}@test.example", Uuid::new_v4().simple()))
    .bind("Test Agent")
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(agent)
}

fn listing(agent_id: Uuid, price: i64) -> NewProperty {
    NewProperty {
        title: format!("Listing {}", Uuid::new_v4().simple()),
        description: None,
        address: Some("12 Test Lane".into()),
        city: Some("Bangkok".into()),
        postal_code: None,
        lat: None,
        lng: None,
        listing_type: ListingType::Both,
        price: Decimal::new(price, 0),
        rent_price: Some(Decimal::new(1_500, 0)),
        agent_id: Some(agent_id),
        project_id: None,
    }
}

async fn history_count(pool: &PgPool, property_id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM price_history WHERE property_id = $1")
            .bind(property_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[tokio::test]
async fn create_writes_initial_history_and_verification() -> Result<()> {
    let pool = require_db!();
    let agent = seed_agent(&pool, AgentRole::Agent).await?;

    let property =
        property_service::create_property(&pool, listing(agent.id, 100_000), &agent.email).await?;

    assert_eq!(property.status, PropertyStatus::Available);
    assert_eq!(property.verification_source, Some(VerificationSource::Agent));
    assert!(property.last_verified_at.is_some());

    let history = property_service::price_history(&pool, property.id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change_type, PriceChangeType::Created);
    assert_eq!(history[0].price, property.price);
    assert_eq!(history[0].changed_by, agent.email);
    Ok(())
}

#[tokio::test]
async fn each_price_affecting_update_appends_exactly_one_row() -> Result<()> {
    let pool = require_db!();
    let agent = seed_agent(&pool, AgentRole::Agent).await?;
    let property =
        property_service::create_property(&pool, listing(agent.id, 100_000), &agent.email).await?;

    // Both prices change in one patch: still a single row, typed as a
    // sale-price change
    let patch = PropertyPatch {
        price: Some(Decimal::new(120_000, 0)),
        rent_price: Some(Some(Decimal::new(1_800, 0))),
        ..Default::default()
    };
    property_service::update_property(&pool, property.id, patch, &agent).await?;
    assert_eq!(history_count(&pool, property.id).await?, 2);

    let history = property_service::price_history(&pool, property.id).await?;
    assert_eq!(history[0].change_type, PriceChangeType::PriceChange);
    assert_eq!(history[0].price, Decimal::new(120_000, 0));
    assert_eq!(history[0].rent_price, Some(Decimal::new(1_800, 0)));

    // Rent-only change
    let patch = PropertyPatch {
        rent_price: Some(Some(Decimal::new(2_000, 0))),
        ..Default::default()
    };
    property_service::update_property(&pool, property.id, patch, &agent).await?;
    assert_eq!(history_count(&pool, property.id).await?, 3);
    let history = property_service::price_history(&pool, property.id).await?;
    assert_eq!(history[0].change_type, PriceChangeType::RentPriceChange);

    // Non-price patch leaves the audit trail alone
    let patch = PropertyPatch { title: Some("Renamed".into()), ..Default::default() };
    property_service::update_property(&pool, property.id, patch, &agent).await?;
    assert_eq!(history_count(&pool, property.id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn explicit_null_clears_rent_price() -> Result<()> {
    let pool = require_db!();
    let agent = seed_agent(&pool, AgentRole::Agent).await?;
    let property =
        property_service::create_property(&pool, listing(agent.id, 100_000), &agent.email).await?;
    assert!(property.rent_price.is_some());

    let patch = PropertyPatch {
        listing_type: Some(ListingType::Sale),
        rent_price: Some(None),
        ..Default::default()
    };
    let updated = property_service::update_property(&pool, property.id, patch, &agent).await?;
    assert_eq!(updated.listing_type, ListingType::Sale);
    assert_eq!(updated.rent_price, None);
    Ok(())
}

#[tokio::test]
async fn deal_stage_change_refreshes_the_property() -> Result<()> {
    let pool = require_db!();
    let agent = seed_agent(&pool, AgentRole::Agent).await?;
    let property =
        property_service::create_property(&pool, listing(agent.id, 90_000), &agent.email).await?;
    let verified_at_create = property.last_verified_at.unwrap();

    let deal = deal_service::create_deal(
        &pool,
        NewDeal {
            property_id: property.id,
            stage: "OFFER".into(),
            amount: Some(Decimal::new(85_000, 0)),
            deposit: None,
            lease_start: None,
            lease_end: None,
        },
        &agent,
    )
    .await?;

    // Amount-only update must not touch the property's verification
    let patch = DealPatch { amount: Some(Decimal::new(86_000, 0)), ..Default::default() };
    deal_service::update_deal(&pool, deal.id, patch, &agent).await?;
    let untouched = property_service::get_property(&pool, property.id).await?;
    assert_eq!(untouched.last_verified_at, Some(verified_at_create));
    assert_eq!(untouched.verification_source, Some(VerificationSource::Agent));

    // A stage change refreshes it with source SYSTEM, monotonically
    let patch = DealPatch { stage: Some("CONTRACT".into()), ..Default::default() };
    let deal = deal_service::update_deal(&pool, deal.id, patch, &agent).await?;
    assert_eq!(deal.stage, "CONTRACT");

    let refreshed = property_service::get_property(&pool, property.id).await?;
    assert_eq!(refreshed.verification_source, Some(VerificationSource::System));
    assert!(refreshed.last_verified_at.unwrap() >= verified_at_create);
    Ok(())
}

#[tokio::test]
async fn verify_sold_sets_status_source_and_timestamp() -> Result<()> {
    let pool = require_db!();
    let agent = seed_agent(&pool, AgentRole::Agent).await?;
    let property =
        property_service::create_property(&pool, listing(agent.id, 75_000), &agent.email).await?;
    let verified_at_create = property.last_verified_at.unwrap();

    let sold = property_service::apply_verify_action(
        &pool,
        property.id,
        VerifyAction::Sold,
        VerificationSource::Owner,
    )
    .await?;

    assert_eq!(sold.status, PropertyStatus::Sold);
    assert_eq!(sold.verification_source, Some(VerificationSource::Owner));
    assert!(sold.last_verified_at.unwrap() >= verified_at_create);
    Ok(())
}

#[tokio::test]
async fn enquiry_listing_is_scoped_to_the_owning_agent() -> Result<()> {
    let pool = require_db!();
    let agent_a = seed_agent(&pool, AgentRole::Agent).await?;
    let agent_b = seed_agent(&pool, AgentRole::Agent).await?;
    let staff = seed_agent(&pool, AgentRole::PlatformAgent).await?;

    let property_a =
        property_service::create_property(&pool, listing(agent_a.id, 50_000), &agent_a.email)
            .await?;
    let property_b =
        property_service::create_property(&pool, listing(agent_b.id, 60_000), &agent_b.email)
            .await?;

    let enquiry_a = enquiry_service::create_enquiry(
        &pool,
        NewEnquiry {
            property_id: property_a.id,
            name: "Buyer A".into(),
            email: "buyer-a@test.example".into(),
            phone: None,
            message: None,
        },
    )
    .await?;
    let enquiry_b = enquiry_service::create_enquiry(
        &pool,
        NewEnquiry {
            property_id: property_b.id,
            name: "Buyer B".into(),
            email: "buyer-b@test.example".into(),
            phone: None,
            message: None,
        },
    )
    .await?;

    // Routed to the listing agents on intake
    assert_eq!(enquiry_a.agent_id, Some(agent_a.id));
    assert_eq!(enquiry_b.agent_id, Some(agent_b.id));

    // agent A sees only its own enquiries
    let (rows, _) = enquiry_service::list_enquiries(&pool, &agent_a, 1, 500).await?;
    assert!(rows.iter().all(|e| e.agent_id == Some(agent_a.id)));
    assert!(rows.iter().any(|e| e.id == enquiry_a.id));
    assert!(!rows.iter().any(|e| e.id == enquiry_b.id));

    // platform staff see across agents
    let (rows, _) = enquiry_service::list_enquiries(&pool, &staff, 1, 500).await?;
    assert!(rows.iter().any(|e| e.id == enquiry_a.id));
    assert!(rows.iter().any(|e| e.id == enquiry_b.id));

    // and a foreign agent cannot move someone else's enquiry
    let denied =
        enquiry_service::update_status(&pool, enquiry_a.id, EnquiryStatus::Closed, &agent_b).await;
    assert!(denied.is_err());
    Ok(())
}

#[tokio::test]
async fn responded_at_is_written_exactly_once() -> Result<()> {
    let pool = require_db!();
    let agent = seed_agent(&pool, AgentRole::Agent).await?;
    let property =
        property_service::create_property(&pool, listing(agent.id, 40_000), &agent.email).await?;
    let enquiry = enquiry_service::create_enquiry(
        &pool,
        NewEnquiry {
            property_id: property.id,
            name: "Buyer".into(),
            email: "buyer@test.example".into(),
            phone: None,
            message: None,
        },
    )
    .await?;
    assert_eq!(enquiry.responded_at, None);

    let contacted =
        enquiry_service::update_status(&pool, enquiry.id, EnquiryStatus::Contacted, &agent).await?;
    let first_response = contacted.responded_at.unwrap();

    // Later pipeline moves, including a second CONTACTED, keep the
    // original response timestamp
    let closed =
        enquiry_service::update_status(&pool, enquiry.id, EnquiryStatus::Closed, &agent).await?;
    assert_eq!(closed.responded_at, Some(first_response));
    let recontacted =
        enquiry_service::update_status(&pool, enquiry.id, EnquiryStatus::Contacted, &agent).await?;
    assert_eq!(recontacted.responded_at, Some(first_response));
    Ok(())
}
