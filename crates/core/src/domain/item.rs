use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Pricing category of a catalog item. `AdditionalCost` lines are shown on
/// documents for transparency but never enter subtotal, tax, or total: they
/// are paid directly to third parties, not collected by the issuer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingCategory {
    OneTime,
    Recurring,
    AdditionalCost,
}

impl PricingCategory {
    /// Storage/display label, kept identical to the legacy column values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "Pago único",
            Self::Recurring => "Pago recurrente",
            Self::AdditionalCost => "Costo adicional",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pago único" => Some(Self::OneTime),
            "Pago recurrente" => Some(Self::Recurring),
            "Costo adicional" => Some(Self::AdditionalCost),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceUnit {
    Hourly,
    Daily,
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl RecurrenceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "Por hora",
            Self::Daily => "Diario",
            Self::Monthly => "Mensual",
            Self::Quarterly => "Trimestral",
            Self::Semiannual => "Semestral",
            Self::Annual => "Anual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Por hora" => Some(Self::Hourly),
            "Diario" => Some(Self::Daily),
            "Mensual" => Some(Self::Monthly),
            "Trimestral" => Some(Self::Quarterly),
            "Semestral" => Some(Self::Semiannual),
            "Anual" => Some(Self::Annual),
            _ => None,
        }
    }
}

/// A sellable catalog entry owned by one issuer. `internal_notes` never
/// appears on rendered documents. Deleting an item does not touch quotes
/// that reference it: line items keep a denormalized copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub owner_id: UserId,
    pub name: String,
    pub sku: Option<String>,
    pub description: String,
    pub base_price: Decimal,
    pub category: PricingCategory,
    pub recurrence: Option<RecurrenceUnit>,
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CatalogItem {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingItemName);
        }
        if self.base_price.is_sign_negative() {
            return Err(DomainError::NegativeBasePrice);
        }
        match (self.category, self.recurrence) {
            (PricingCategory::Recurring, None) => Err(DomainError::MissingRecurrence),
            (PricingCategory::OneTime | PricingCategory::AdditionalCost, Some(_)) => {
                Err(DomainError::UnexpectedRecurrence)
            }
            _ => Ok(()),
        }
    }
}
