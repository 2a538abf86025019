use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::item::{CatalogItem, ItemId, PricingCategory, RecurrenceUnit};
use crate::domain::user::UserId;
use crate::errors::DomainError;
use crate::totals::{compute_totals, round_minor, Totals};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Human-facing reference: first 8 characters of the id, uppercase.
    /// Shown in document headers and used in export filenames.
    pub fn short_reference(&self) -> String {
        self.0.chars().take(8).collect::<String>().to_uppercase()
    }
}

impl Default for QuoteId {
    fn default() -> Self {
        Self::new()
    }
}

/// Sales-pipeline stage of a quote. Board columns, not an approval workflow:
/// users move quotes freely between non-terminal stages. `Won` and `Lost`
/// absorb; `Processing` is the soft "client opened the email" signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    InProgress,
    Sent,
    Processing,
    Approved,
    Paid,
    Won,
    Lost,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "En proceso",
            Self::Sent => "Enviado",
            Self::Processing => "Leído",
            Self::Approved => "Aprobado",
            Self::Paid => "Pagado",
            Self::Won => "Ganado",
            Self::Lost => "Perdido",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "En proceso" => Some(Self::InProgress),
            "Enviado" => Some(Self::Sent),
            "Leído" => Some(Self::Processing),
            "Aprobado" => Some(Self::Approved),
            "Pagado" => Some(Self::Paid),
            "Ganado" => Some(Self::Won),
            "Perdido" => Some(Self::Lost),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Monotonic upgrade applied when the delivery provider reports the
    /// quote email as opened. Only `Sent` moves (and `Processing` stays);
    /// every other stage is left untouched, so a payment or terminal stage
    /// can never regress to "opened".
    pub fn opened_upgrade(self) -> Self {
        match self {
            Self::Sent | Self::Processing => Self::Processing,
            other => other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Quote,
    InvoiceOnAccount,
    ProformaInvoice,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "cotizacion",
            Self::InvoiceOnAccount => "cuenta_cobro",
            Self::ProformaInvoice => "factura_proforma",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cotizacion" => Some(Self::Quote),
            "cuenta_cobro" => Some(Self::InvoiceOnAccount),
            "factura_proforma" => Some(Self::ProformaInvoice),
            _ => None,
        }
    }

    /// Document title as printed in the header.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Quote => "COTIZACIÓN",
            Self::InvoiceOnAccount => "CUENTA DE COBRO",
            Self::ProformaInvoice => "FACTURA PROFORMA",
        }
    }
}

/// One priced entry of a quote. Name, SKU, price, and category are copied
/// from the catalog at add time so later catalog edits or deletes never
/// alter a saved quote. `item_id` stays behind as a weak reference only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: ItemId,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub extended_price: Decimal,
    pub category: PricingCategory,
    pub recurrence: Option<RecurrenceUnit>,
}

/// Coerce arbitrary quantity input to a usable value. Entry is never
/// blocked: anything below 1 becomes 1.
pub fn clamp_quantity(raw: i64) -> u32 {
    if raw < 1 {
        1
    } else {
        raw.min(i64::from(u32::MAX)) as u32
    }
}

impl LineItem {
    pub fn new(
        item_id: ItemId,
        name: String,
        sku: Option<String>,
        quantity: u32,
        unit_price: Decimal,
        category: PricingCategory,
        recurrence: Option<RecurrenceUnit>,
    ) -> Self {
        let quantity = quantity.max(1);
        let mut line = Self {
            item_id,
            name,
            sku,
            quantity,
            unit_price,
            extended_price: Decimal::ZERO,
            category,
            recurrence,
        };
        line.recompute();
        line
    }

    pub fn from_catalog(item: &CatalogItem, quantity: u32) -> Self {
        Self::new(
            item.id.clone(),
            item.name.clone(),
            item.sku.clone(),
            quantity,
            item.base_price,
            item.category,
            item.recurrence,
        )
    }

    pub fn set_quantity(&mut self, raw: i64) {
        self.quantity = clamp_quantity(raw);
        self.recompute();
    }

    pub fn set_unit_price(&mut self, unit_price: Decimal) {
        self.unit_price = unit_price;
        self.recompute();
    }

    /// Extended price is derived state. It is recomputed on every quantity
    /// or price edit and is not directly assignable.
    fn recompute(&mut self) {
        self.extended_price = round_minor(self.unit_price * Decimal::from(self.quantity));
    }

    /// Follow the weak catalog reference. `None` when the item was deleted
    /// after this line was added.
    pub fn resolve<'a>(&self, catalog: &'a [CatalogItem]) -> Option<&'a CatalogItem> {
        catalog.iter().find(|item| item.id == self.item_id)
    }
}

/// Input for [`Quote::create`]; everything the composer screen collects.
#[derive(Clone, Debug)]
pub struct QuoteDraftInput {
    pub owner_id: UserId,
    pub client_name: String,
    pub client_email: Option<String>,
    pub lines: Vec<LineItem>,
    pub tax_rate_percent: Decimal,
    pub notes: Option<String>,
    pub legal_terms: Option<String>,
    pub exclusions: Option<String>,
    pub signature_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub owner_id: UserId,
    pub client_name: String,
    pub client_email: Option<String>,
    pub lines: Vec<LineItem>,
    pub tax_rate_percent: Decimal,
    pub totals: Totals,
    pub notes: Option<String>,
    pub legal_terms: Option<String>,
    pub exclusions: Option<String>,
    pub signature_url: Option<String>,
    pub document_kind: DocumentKind,
    pub status: PipelineStatus,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Validate and assemble a new quote. Totals are computed here, once,
    /// from the lines as they stand: the quote is a frozen financial
    /// snapshot and later catalog price changes never touch it.
    pub fn create(input: QuoteDraftInput, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if input.client_name.trim().is_empty() {
            return Err(DomainError::MissingClientName);
        }
        if input.lines.is_empty() {
            return Err(DomainError::EmptyLineItems);
        }

        let totals = compute_totals(&input.lines, input.tax_rate_percent);

        Ok(Self {
            id: QuoteId::new(),
            owner_id: input.owner_id,
            client_name: input.client_name,
            client_email: input.client_email.filter(|email| !email.trim().is_empty()),
            lines: input.lines,
            tax_rate_percent: input.tax_rate_percent.max(Decimal::ZERO),
            totals,
            notes: input.notes,
            legal_terms: input.legal_terms,
            exclusions: input.exclusions,
            signature_url: input.signature_url,
            document_kind: DocumentKind::Quote,
            status: PipelineStatus::InProgress,
            created_at: now,
        })
    }

    pub fn short_reference(&self) -> String {
        self.id.short_reference()
    }

    /// Manual board move. Free movement with one exception: `Won` and
    /// `Lost` absorb.
    pub fn set_status(&mut self, next: PipelineStatus) -> Result<(), DomainError> {
        if self.status.is_terminal() && next != self.status {
            return Err(DomainError::TerminalStatus { from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }

    /// Delivery-open signal from the email provider webhook. Returns
    /// whether the status actually changed; never fails and never
    /// downgrades (a repeat signal is a no-op).
    pub fn apply_opened_signal(&mut self) -> bool {
        let next = self.status.opened_upgrade();
        let changed = next != self.status;
        self.status = next;
        changed
    }

    /// One-way conversion to an invoice kind. Converting implies the
    /// client accepted, so the status jumps straight to `Approved` without
    /// passing through `Sent` or `Processing`.
    pub fn convert_to(&mut self, kind: DocumentKind) -> Result<(), DomainError> {
        if kind == DocumentKind::Quote {
            return Err(DomainError::InvalidConversion);
        }
        if self.document_kind != DocumentKind::Quote {
            return Err(DomainError::AlreadyConverted { kind: self.document_kind });
        }
        self.document_kind = kind;
        self.status = PipelineStatus::Approved;
        Ok(())
    }
}
