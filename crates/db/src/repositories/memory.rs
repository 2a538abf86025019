use std::collections::HashMap;

use tokio::sync::RwLock;

use cotiza_core::domain::item::{CatalogItem, ItemId};
use cotiza_core::domain::quote::{DocumentKind, PipelineStatus, Quote, QuoteId};
use cotiza_core::domain::user::{IssuerProfile, UserId};

use super::{ItemRepository, QuoteRepository, RepositoryError, UserRepository, WriteOutcome};

#[derive(Default)]
pub struct InMemoryItemRepository {
    items: RwLock<HashMap<String, CatalogItem>>,
}

#[async_trait::async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn create(&self, item: &CatalogItem) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        items.insert(item.id.0.clone(), item.clone());
        Ok(())
    }

    async fn update(&self, item: &CatalogItem) -> Result<WriteOutcome, RepositoryError> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id.0) {
            None => Ok(WriteOutcome::NotFound),
            Some(existing) if existing.owner_id != item.owner_id => Ok(WriteOutcome::Forbidden),
            Some(existing) => {
                *existing = item.clone();
                Ok(WriteOutcome::Updated)
            }
        }
    }

    async fn delete(&self, id: &ItemId, owner: &UserId) -> Result<WriteOutcome, RepositoryError> {
        let mut items = self.items.write().await;
        match items.get(&id.0) {
            None => Ok(WriteOutcome::NotFound),
            Some(existing) if &existing.owner_id != owner => Ok(WriteOutcome::Forbidden),
            Some(_) => {
                items.remove(&id.0);
                Ok(WriteOutcome::Updated)
            }
        }
    }

    async fn find_by_id(&self, id: &ItemId) -> Result<Option<CatalogItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.get(&id.0).cloned())
    }

    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<CatalogItem>, RepositoryError> {
        let items = self.items.read().await;
        let mut owned: Vec<CatalogItem> =
            items.values().filter(|item| &item.owner_id == owner).cloned().collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

#[derive(Default)]
pub struct InMemoryQuoteRepository {
    quotes: RwLock<HashMap<String, Quote>>,
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        quotes.insert(quote.id.0.clone(), quote.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.get(&id.0).cloned())
    }

    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        let mut owned: Vec<Quote> =
            quotes.values().filter(|quote| &quote.owner_id == owner).cloned().collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update_status(
        &self,
        id: &QuoteId,
        owner: &UserId,
        status: PipelineStatus,
    ) -> Result<WriteOutcome, RepositoryError> {
        let mut quotes = self.quotes.write().await;
        match quotes.get_mut(&id.0) {
            None => Ok(WriteOutcome::NotFound),
            Some(quote) if &quote.owner_id != owner => Ok(WriteOutcome::Forbidden),
            Some(quote) => match quote.set_status(status) {
                Ok(()) => Ok(WriteOutcome::Updated),
                Err(_) => Ok(WriteOutcome::Conflict),
            },
        }
    }

    async fn convert_document_kind(
        &self,
        id: &QuoteId,
        owner: &UserId,
        kind: DocumentKind,
    ) -> Result<WriteOutcome, RepositoryError> {
        let mut quotes = self.quotes.write().await;
        match quotes.get_mut(&id.0) {
            None => Ok(WriteOutcome::NotFound),
            Some(quote) if &quote.owner_id != owner => Ok(WriteOutcome::Forbidden),
            Some(quote) => match quote.convert_to(kind) {
                Ok(()) => Ok(WriteOutcome::Updated),
                Err(_) => Ok(WriteOutcome::Conflict),
            },
        }
    }

    async fn apply_opened_signal(&self, id: &QuoteId) -> Result<bool, RepositoryError> {
        let mut quotes = self.quotes.write().await;
        Ok(quotes.get_mut(&id.0).map(Quote::apply_opened_signal).unwrap_or(false))
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, IssuerProfile>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<IssuerProfile>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(&id.0).cloned())
    }

    async fn upsert(&self, profile: &IssuerProfile) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users.insert(profile.id.0.clone(), profile.clone());
        Ok(())
    }
}
