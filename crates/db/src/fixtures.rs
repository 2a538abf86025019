//! Deterministic demo fixtures for local development and the CLI `seed`
//! command. Ids are stable so reseeding is idempotent.

use cotiza_core::chrono::{TimeZone, Utc};
use cotiza_core::domain::item::{CatalogItem, ItemId, PricingCategory, RecurrenceUnit};
use cotiza_core::domain::quote::{LineItem, Quote, QuoteDraftInput, QuoteId};
use cotiza_core::domain::user::{IssuerProfile, UserId};
use cotiza_core::rust_decimal::Decimal;

use crate::repositories::{
    ItemRepository, QuoteRepository, RepositoryError, SqlItemRepository, SqlQuoteRepository,
    SqlUserRepository, UserRepository,
};
use crate::DbPool;

pub const DEMO_USER_ID: &str = "demo-user-0001";
pub const DEMO_QUOTE_ID: &str = "d3m0c0t1-0000-4000-8000-000000000001";

pub fn demo_user() -> IssuerProfile {
    IssuerProfile {
        id: UserId(DEMO_USER_ID.to_string()),
        name: "Laura Gómez".to_string(),
        company: Some("Brainware SAS".to_string()),
        email: "laura@brainware.dev".to_string(),
        logo_url: None,
    }
}

pub fn demo_items() -> Vec<CatalogItem> {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).single().unwrap_or_else(Utc::now);
    vec![
        CatalogItem {
            id: ItemId("demo-item-web".to_string()),
            owner_id: UserId(DEMO_USER_ID.to_string()),
            name: "Diseño web".to_string(),
            sku: Some("WEB-001".to_string()),
            description: "Diseño y desarrollo de sitio corporativo".to_string(),
            base_price: Decimal::from(50_000),
            category: PricingCategory::OneTime,
            recurrence: None,
            internal_notes: Some("Margen objetivo 40%".to_string()),
            created_at,
        },
        CatalogItem {
            id: ItemId("demo-item-soporte".to_string()),
            owner_id: UserId(DEMO_USER_ID.to_string()),
            name: "Soporte mensual".to_string(),
            sku: Some("SOP-001".to_string()),
            description: "Bolsa de horas de soporte y mantenimiento".to_string(),
            base_price: Decimal::from(120_000),
            category: PricingCategory::Recurring,
            recurrence: Some(RecurrenceUnit::Monthly),
            internal_notes: None,
            created_at,
        },
        CatalogItem {
            id: ItemId("demo-item-dominio".to_string()),
            owner_id: UserId(DEMO_USER_ID.to_string()),
            name: "Registro de dominio".to_string(),
            sku: None,
            description: "Pago directo al registrador, se factura aparte".to_string(),
            base_price: Decimal::from(80_000),
            category: PricingCategory::AdditionalCost,
            recurrence: None,
            internal_notes: None,
            created_at,
        },
    ]
}

pub fn demo_quote() -> Quote {
    let items = demo_items();
    let mut quote = Quote::create(
        QuoteDraftInput {
            owner_id: UserId(DEMO_USER_ID.to_string()),
            client_name: "Acme SAS".to_string(),
            client_email: Some("pagos@acme.co".to_string()),
            lines: vec![
                LineItem::from_catalog(&items[0], 3),
                LineItem::from_catalog(&items[2], 1),
            ],
            tax_rate_percent: Decimal::from(19),
            notes: Some("Entrega estimada: cuatro semanas.".to_string()),
            legal_terms: None,
            exclusions: Some("No incluye hosting ni licencias.".to_string()),
            signature_url: None,
        },
        Utc.with_ymd_and_hms(2024, 2, 1, 15, 30, 0).single().unwrap_or_else(Utc::now),
    )
    .expect("demo quote input is valid");
    quote.id = QuoteId(DEMO_QUOTE_ID.to_string());
    quote
}

/// Insert the demo dataset. Safe to call on a database that already holds
/// it: rows are keyed by the fixed ids above.
pub async fn seed_demo(pool: &DbPool) -> Result<(), RepositoryError> {
    let users = SqlUserRepository::new(pool.clone());
    let items = SqlItemRepository::new(pool.clone());
    let quotes = SqlQuoteRepository::new(pool.clone());

    users.upsert(&demo_user()).await?;

    for item in demo_items() {
        if items.find_by_id(&item.id).await?.is_none() {
            items.create(&item).await?;
        }
    }

    let quote = demo_quote();
    if quotes.find_by_id(&quote.id).await?.is_none() {
        quotes.create(&quote).await?;
    }

    Ok(())
}
