use cotiza_core::chrono::{Duration, Utc};
use cotiza_core::domain::item::{CatalogItem, ItemId, PricingCategory};
use cotiza_core::domain::quote::{DocumentKind, LineItem, PipelineStatus, Quote, QuoteDraftInput};
use cotiza_core::domain::user::{IssuerProfile, UserId};
use cotiza_core::rust_decimal::Decimal;

use cotiza_db::{
    connect_with_settings, fixtures, migrations, DbPool, ItemRepository, QuoteRepository,
    SqlItemRepository, SqlQuoteRepository, SqlUserRepository, UserRepository, WriteOutcome,
};

async fn pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("run migrations");
    pool
}

fn owner() -> UserId {
    UserId("u-1".to_string())
}

async fn seed_owner(pool: &DbPool) {
    SqlUserRepository::new(pool.clone())
        .upsert(&IssuerProfile {
            id: owner(),
            name: "Laura Gómez".to_string(),
            company: Some("Brainware SAS".to_string()),
            email: "laura@brainware.dev".to_string(),
            logo_url: None,
        })
        .await
        .expect("seed owner");
}

fn catalog_item(id: &str, name: &str, category: PricingCategory, price: i64) -> CatalogItem {
    CatalogItem {
        id: ItemId(id.to_string()),
        owner_id: owner(),
        name: name.to_string(),
        sku: Some("SKU-01".to_string()),
        description: String::new(),
        base_price: Decimal::from(price),
        category,
        recurrence: None,
        internal_notes: Some("solo interno".to_string()),
        created_at: Utc::now(),
    }
}

fn quote_with_lines(lines: Vec<LineItem>) -> Quote {
    Quote::create(
        QuoteDraftInput {
            owner_id: owner(),
            client_name: "Acme SAS".to_string(),
            client_email: Some("pagos@acme.co".to_string()),
            lines,
            tax_rate_percent: Decimal::from(19),
            notes: Some("Entrega en dos semanas".to_string()),
            legal_terms: None,
            exclusions: None,
            signature_url: None,
        },
        Utc::now(),
    )
    .expect("valid quote")
}

#[tokio::test]
async fn item_crud_round_trip() {
    let pool = pool().await;
    seed_owner(&pool).await;
    let repo = SqlItemRepository::new(pool.clone());

    let mut item = catalog_item("item-1", "Diseño web", PricingCategory::OneTime, 50_000);
    repo.create(&item).await.expect("create item");

    let found = repo.find_by_id(&item.id).await.expect("find item").expect("item exists");
    assert_eq!(found, item);

    item.name = "Diseño web premium".to_string();
    item.base_price = Decimal::from(75_000);
    assert_eq!(repo.update(&item).await.expect("update item"), WriteOutcome::Updated);

    let found = repo.find_by_id(&item.id).await.expect("find item").expect("item exists");
    assert_eq!(found.name, "Diseño web premium");
    assert_eq!(found.base_price, Decimal::from(75_000));

    assert_eq!(
        repo.delete(&item.id, &owner()).await.expect("delete item"),
        WriteOutcome::Updated
    );
    assert!(repo.find_by_id(&item.id).await.expect("find item").is_none());
}

#[tokio::test]
async fn item_writes_by_non_owner_are_forbidden() {
    let pool = pool().await;
    seed_owner(&pool).await;
    let repo = SqlItemRepository::new(pool.clone());

    let item = catalog_item("item-1", "Diseño web", PricingCategory::OneTime, 50_000);
    repo.create(&item).await.expect("create item");

    let outcome =
        repo.delete(&item.id, &UserId("intruder".to_string())).await.expect("guarded delete");
    assert_eq!(outcome, WriteOutcome::Forbidden);

    let outcome = repo
        .delete(&ItemId("missing".to_string()), &owner())
        .await
        .expect("delete missing item");
    assert_eq!(outcome, WriteOutcome::NotFound);
}

#[tokio::test]
async fn quote_round_trip_preserves_lines_totals_and_order() {
    let pool = pool().await;
    seed_owner(&pool).await;
    let repo = SqlQuoteRepository::new(pool.clone());

    let items = [
        catalog_item("item-1", "Diseño web", PricingCategory::OneTime, 50_000),
        catalog_item("item-2", "Registro de dominio", PricingCategory::AdditionalCost, 80_000),
    ];
    let quote = quote_with_lines(vec![
        LineItem::from_catalog(&items[0], 3),
        LineItem::from_catalog(&items[1], 1),
    ]);
    repo.create(&quote).await.expect("create quote");

    let found = repo.find_by_id(&quote.id).await.expect("find quote").expect("quote exists");
    assert_eq!(found.lines.len(), 2);
    assert_eq!(found.lines[0].name, "Diseño web");
    assert_eq!(found.lines[1].name, "Registro de dominio");
    assert_eq!(found.totals.subtotal, Decimal::from(150_000));
    assert_eq!(found.totals.tax_amount, Decimal::from(28_500));
    assert_eq!(found.totals.total, Decimal::from(178_500));
    assert_eq!(found.status, PipelineStatus::InProgress);
    assert_eq!(found.document_kind, DocumentKind::Quote);
}

#[tokio::test]
async fn quotes_list_newest_first() {
    let pool = pool().await;
    seed_owner(&pool).await;
    let repo = SqlQuoteRepository::new(pool.clone());
    let item = catalog_item("item-1", "Diseño web", PricingCategory::OneTime, 50_000);

    let mut older = quote_with_lines(vec![LineItem::from_catalog(&item, 1)]);
    older.created_at = Utc::now() - Duration::days(2);
    let newer = quote_with_lines(vec![LineItem::from_catalog(&item, 1)]);

    repo.create(&older).await.expect("create older");
    repo.create(&newer).await.expect("create newer");

    let listed = repo.list_for_owner(&owner()).await.expect("list quotes");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);
    assert_eq!(listed[1].id, older.id);
}

#[tokio::test]
async fn status_updates_are_guarded_by_ownership() {
    let pool = pool().await;
    seed_owner(&pool).await;
    let repo = SqlQuoteRepository::new(pool.clone());
    let item = catalog_item("item-1", "Diseño web", PricingCategory::OneTime, 50_000);
    let quote = quote_with_lines(vec![LineItem::from_catalog(&item, 1)]);
    repo.create(&quote).await.expect("create quote");

    let outcome = repo
        .update_status(&quote.id, &UserId("intruder".to_string()), PipelineStatus::Sent)
        .await
        .expect("guarded update");
    assert_eq!(outcome, WriteOutcome::Forbidden);

    let unchanged =
        repo.find_by_id(&quote.id).await.expect("find quote").expect("quote exists");
    assert_eq!(unchanged.status, PipelineStatus::InProgress);

    let outcome = repo
        .update_status(&quote.id, &owner(), PipelineStatus::Sent)
        .await
        .expect("owner update");
    assert_eq!(outcome, WriteOutcome::Updated);
}

#[tokio::test]
async fn terminal_stages_absorb_at_the_storage_layer() {
    let pool = pool().await;
    seed_owner(&pool).await;
    let repo = SqlQuoteRepository::new(pool.clone());
    let item = catalog_item("item-1", "Diseño web", PricingCategory::OneTime, 50_000);
    let quote = quote_with_lines(vec![LineItem::from_catalog(&item, 1)]);
    repo.create(&quote).await.expect("create quote");

    repo.update_status(&quote.id, &owner(), PipelineStatus::Won).await.expect("move to won");

    let outcome = repo
        .update_status(&quote.id, &owner(), PipelineStatus::Sent)
        .await
        .expect("blocked move");
    assert_eq!(outcome, WriteOutcome::Conflict);

    let found = repo.find_by_id(&quote.id).await.expect("find quote").expect("quote exists");
    assert_eq!(found.status, PipelineStatus::Won);
}

#[tokio::test]
async fn opened_signal_upgrades_sent_once_and_never_downgrades() {
    let pool = pool().await;
    seed_owner(&pool).await;
    let repo = SqlQuoteRepository::new(pool.clone());
    let item = catalog_item("item-1", "Diseño web", PricingCategory::OneTime, 50_000);
    let quote = quote_with_lines(vec![LineItem::from_catalog(&item, 1)]);
    repo.create(&quote).await.expect("create quote");

    // Not yet sent: signal is a no-op.
    assert!(!repo.apply_opened_signal(&quote.id).await.expect("signal"));

    repo.update_status(&quote.id, &owner(), PipelineStatus::Sent).await.expect("send");
    assert!(repo.apply_opened_signal(&quote.id).await.expect("signal"));

    let found = repo.find_by_id(&quote.id).await.expect("find quote").expect("quote exists");
    assert_eq!(found.status, PipelineStatus::Processing);

    // Repeat signal: idempotent, no error.
    assert!(!repo.apply_opened_signal(&quote.id).await.expect("repeat signal"));
    let found = repo.find_by_id(&quote.id).await.expect("find quote").expect("quote exists");
    assert_eq!(found.status, PipelineStatus::Processing);

    // Payment stages never regress.
    repo.update_status(&quote.id, &owner(), PipelineStatus::Paid).await.expect("pay");
    assert!(!repo.apply_opened_signal(&quote.id).await.expect("signal after paid"));
    let found = repo.find_by_id(&quote.id).await.expect("find quote").expect("quote exists");
    assert_eq!(found.status, PipelineStatus::Paid);
}

#[tokio::test]
async fn conversion_forces_approved_and_is_one_way() {
    let pool = pool().await;
    seed_owner(&pool).await;
    let repo = SqlQuoteRepository::new(pool.clone());
    let item = catalog_item("item-1", "Diseño web", PricingCategory::OneTime, 50_000);
    let quote = quote_with_lines(vec![LineItem::from_catalog(&item, 1)]);
    repo.create(&quote).await.expect("create quote");

    let outcome = repo
        .convert_document_kind(&quote.id, &owner(), DocumentKind::InvoiceOnAccount)
        .await
        .expect("convert");
    assert_eq!(outcome, WriteOutcome::Updated);

    let found = repo.find_by_id(&quote.id).await.expect("find quote").expect("quote exists");
    assert_eq!(found.document_kind, DocumentKind::InvoiceOnAccount);
    assert_eq!(found.status, PipelineStatus::Approved);

    let outcome = repo
        .convert_document_kind(&quote.id, &owner(), DocumentKind::ProformaInvoice)
        .await
        .expect("second convert");
    assert_eq!(outcome, WriteOutcome::Conflict);
}

#[tokio::test]
async fn deleting_a_catalog_item_leaves_saved_quotes_intact() {
    let pool = pool().await;
    seed_owner(&pool).await;
    let items = SqlItemRepository::new(pool.clone());
    let quotes = SqlQuoteRepository::new(pool.clone());

    let item = catalog_item("item-1", "Diseño web", PricingCategory::OneTime, 50_000);
    items.create(&item).await.expect("create item");

    let quote = quote_with_lines(vec![LineItem::from_catalog(&item, 2)]);
    quotes.create(&quote).await.expect("create quote");

    items.delete(&item.id, &owner()).await.expect("delete item");

    let found = quotes.find_by_id(&quote.id).await.expect("find quote").expect("quote exists");
    assert_eq!(found.lines[0].name, "Diseño web");
    assert_eq!(found.lines[0].unit_price, Decimal::from(50_000));
    // The weak reference now dangles; resolution against the live catalog fails.
    let catalog = items.list_for_owner(&owner()).await.expect("list items");
    assert!(found.lines[0].resolve(&catalog).is_none());
}

#[tokio::test]
async fn demo_seed_is_idempotent() {
    let pool = pool().await;

    fixtures::seed_demo(&pool).await.expect("first seed");
    fixtures::seed_demo(&pool).await.expect("second seed");

    let quotes = SqlQuoteRepository::new(pool.clone());
    let listed = quotes
        .list_for_owner(&UserId(fixtures::DEMO_USER_ID.to_string()))
        .await
        .expect("list quotes");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].totals.subtotal, Decimal::from(150_000));
}
