pub mod format;
pub mod layout;
mod paginate;

use serde::{Deserialize, Serialize};

use crate::domain::quote::Quote;
use crate::domain::user::IssuerProfile;
use crate::render::format::{format_cop, format_long_date};
use crate::render::layout::{
    footer_section, header_section, item_table_section, parties_section, signature_section,
    summary_section, text_section, Section, SectionKind, DOC_MIN_HEIGHT, DOC_WIDTH,
};

pub use paginate::{paginate, Page};

/// Shown in place of a line's description when its catalog item was deleted
/// and no denormalized name survived.
pub const MISSING_ITEM_LABEL: &str = "Ítem no disponible en el catálogo";

/// Issuer identity as printed on the document, resolved from the profile at
/// render time rather than stored on the quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerSnapshot {
    pub name: String,
    pub company: Option<String>,
    pub email: String,
    pub logo_url: Option<String>,
}

impl From<&IssuerProfile> for IssuerSnapshot {
    fn from(profile: &IssuerProfile) -> Self {
        Self {
            name: profile.name.clone(),
            company: profile.company.clone(),
            email: profile.email.clone(),
            logo_url: profile.logo_url.clone(),
        }
    }
}

/// One row of the printed item table, prices already formatted.
/// Pass-through (additional cost) rows render like any other row; they are
/// only excluded from the aggregates, not from the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub extended_price: String,
    pub pass_through: bool,
}

/// A quote laid out as a single continuous document: fixed width, content
/// height, sections in fixed order. Everything downstream (HTML template,
/// PDF slicing) consumes this; it contains no unformatted money values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub width: u32,
    pub height: u32,
    pub sections: Vec<Section>,
    pub title: String,
    pub short_reference: String,
    pub issued_on: String,
    pub issuer: IssuerSnapshot,
    pub client_name: String,
    pub client_email: Option<String>,
    pub rows: Vec<TableRow>,
    pub subtotal: String,
    pub tax_amount: Option<String>,
    pub total: String,
    pub notes: Option<String>,
    pub legal_terms: Option<String>,
    pub exclusions: Option<String>,
    pub signature_url: Option<String>,
}

impl RenderedDocument {
    /// Export filename: `Cotizacion-<SHORTREF>.pdf`, regardless of kind.
    pub fn pdf_filename(&self) -> String {
        format!("Cotizacion-{}.pdf", self.short_reference)
    }

    #[doc(hidden)]
    pub fn empty() -> Self {
        Self {
            width: DOC_WIDTH,
            height: 0,
            sections: Vec::new(),
            title: String::new(),
            short_reference: String::new(),
            issued_on: String::new(),
            issuer: IssuerSnapshot {
                name: String::new(),
                company: None,
                email: String::new(),
                logo_url: None,
            },
            client_name: String::new(),
            client_email: None,
            rows: Vec::new(),
            subtotal: String::new(),
            tax_amount: None,
            total: String::new(),
            notes: None,
            legal_terms: None,
            exclusions: None,
            signature_url: None,
        }
    }
}

fn present(text: &Option<String>) -> Option<&str> {
    text.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Lay out a quote deterministically. Pure: same quote and issuer always
/// produce the same document, byte for byte.
pub fn render(quote: &Quote, issuer: &IssuerSnapshot) -> RenderedDocument {
    let rows: Vec<TableRow> = quote
        .lines
        .iter()
        .map(|line| TableRow {
            name: if line.name.trim().is_empty() {
                MISSING_ITEM_LABEL.to_string()
            } else {
                line.name.clone()
            },
            sku: line.sku.clone().filter(|sku| !sku.trim().is_empty()),
            quantity: line.quantity,
            unit_price: format_cop(line.unit_price),
            extended_price: format_cop(line.extended_price),
            pass_through: matches!(
                line.category,
                crate::domain::item::PricingCategory::AdditionalCost
            ),
        })
        .collect();

    let shows_tax_row = quote.totals.tax_amount > rust_decimal::Decimal::ZERO;

    let mut sections = vec![
        header_section(),
        parties_section(),
        item_table_section(&rows.iter().map(|row| row.sku.is_some()).collect::<Vec<_>>()),
        summary_section(shows_tax_row),
    ];
    if let Some(notes) = present(&quote.notes) {
        sections.push(text_section(SectionKind::Notes, notes));
    }
    if let Some(terms) = present(&quote.legal_terms) {
        sections.push(text_section(SectionKind::LegalTerms, terms));
    }
    if let Some(exclusions) = present(&quote.exclusions) {
        sections.push(text_section(SectionKind::Exclusions, exclusions));
    }
    if quote.signature_url.is_some() {
        sections.push(signature_section());
    }
    sections.push(footer_section());

    let content_height: u32 = sections.iter().map(|section| section.height).sum();

    RenderedDocument {
        width: DOC_WIDTH,
        height: content_height.max(DOC_MIN_HEIGHT),
        sections,
        title: quote.document_kind.title().to_string(),
        short_reference: quote.short_reference(),
        issued_on: format_long_date(&quote.created_at),
        issuer: issuer.clone(),
        client_name: quote.client_name.clone(),
        client_email: quote.client_email.clone(),
        rows,
        subtotal: format_cop(quote.totals.subtotal),
        tax_amount: shows_tax_row.then(|| format_cop(quote.totals.tax_amount)),
        total: format_cop(quote.totals.total),
        notes: present(&quote.notes).map(str::to_string),
        legal_terms: present(&quote.legal_terms).map(str::to_string),
        exclusions: present(&quote.exclusions).map(str::to_string),
        signature_url: quote.signature_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::domain::item::{ItemId, PricingCategory};
    use crate::domain::quote::{LineItem, Quote, QuoteDraftInput, QuoteId};
    use crate::domain::user::UserId;
    use crate::render::layout::{SectionKind, DOC_MIN_HEIGHT, DOC_WIDTH};

    use super::{render, IssuerSnapshot, MISSING_ITEM_LABEL};

    fn issuer() -> IssuerSnapshot {
        IssuerSnapshot {
            name: "Laura Gómez".to_string(),
            company: Some("Brainware SAS".to_string()),
            email: "laura@brainware.dev".to_string(),
            logo_url: None,
        }
    }

    fn line(name: &str, category: PricingCategory, unit_price: i64, quantity: u32) -> LineItem {
        LineItem::new(
            ItemId("item-1".to_string()),
            name.to_string(),
            Some("SKU-01".to_string()),
            quantity,
            Decimal::from(unit_price),
            category,
            None,
        )
    }

    fn quote(lines: Vec<LineItem>, tax_rate: i64) -> Quote {
        let mut quote = Quote::create(
            QuoteDraftInput {
                owner_id: UserId("u-1".to_string()),
                client_name: "Acme SAS".to_string(),
                client_email: None,
                lines,
                tax_rate_percent: Decimal::from(tax_rate),
                notes: None,
                legal_terms: None,
                exclusions: None,
                signature_url: None,
            },
            Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap(),
        )
        .expect("valid quote");
        quote.id = QuoteId("a3f9c2e1-77b4-4f0e-9c61-000000000000".to_string());
        quote
    }

    #[test]
    fn sections_keep_their_fixed_order() {
        let mut subject = quote(vec![line("Diseño web", PricingCategory::OneTime, 50_000, 1)], 19);
        subject.notes = Some("Entrega en dos semanas".to_string());
        subject.exclusions = Some("No incluye hosting".to_string());
        subject.signature_url = Some("https://blob/firma.png".to_string());

        let document = render(&subject, &issuer());
        let kinds: Vec<SectionKind> =
            document.sections.iter().map(|section| section.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Header,
                SectionKind::Parties,
                SectionKind::ItemTable,
                SectionKind::Summary,
                SectionKind::Notes,
                SectionKind::Exclusions,
                SectionKind::Signature,
                SectionKind::Footer,
            ]
        );
    }

    #[test]
    fn optional_sections_are_absent_when_null_or_blank() {
        let mut subject = quote(vec![line("Diseño web", PricingCategory::OneTime, 50_000, 1)], 0);
        subject.legal_terms = Some("   ".to_string());

        let document = render(&subject, &issuer());
        assert!(document
            .sections
            .iter()
            .all(|section| !matches!(section.kind, SectionKind::LegalTerms | SectionKind::Notes)));
        assert_eq!(document.legal_terms, None);
    }

    #[test]
    fn pass_through_lines_appear_in_the_table_but_not_the_totals() {
        let subject = quote(
            vec![
                line("Diseño web", PricingCategory::OneTime, 100_000, 1),
                line("Licencia de terceros", PricingCategory::AdditionalCost, 20_000, 1),
            ],
            0,
        );

        let document = render(&subject, &issuer());
        assert_eq!(document.rows.len(), 2);
        assert!(document.rows[1].pass_through);
        assert_eq!(document.subtotal, "$ 100.000");
        assert_eq!(document.total, "$ 100.000");
    }

    #[test]
    fn tax_row_is_hidden_at_zero_rate() {
        let subject = quote(vec![line("Diseño web", PricingCategory::OneTime, 50_000, 1)], 0);
        assert_eq!(render(&subject, &issuer()).tax_amount, None);

        let subject = quote(vec![line("Diseño web", PricingCategory::OneTime, 50_000, 1)], 19);
        assert_eq!(render(&subject, &issuer()).tax_amount.as_deref(), Some("$ 9.500"));
    }

    #[test]
    fn header_carries_short_reference_and_kind_title() {
        let subject = quote(vec![line("Diseño web", PricingCategory::OneTime, 50_000, 1)], 19);
        let document = render(&subject, &issuer());

        assert_eq!(document.short_reference, "A3F9C2E1");
        assert_eq!(document.title, "COTIZACIÓN");
        assert_eq!(document.issued_on, "2 de marzo de 2024");
        assert_eq!(document.pdf_filename(), "Cotizacion-A3F9C2E1.pdf");
    }

    #[test]
    fn deleted_catalog_items_fall_back_to_the_sentinel_label() {
        let subject = quote(vec![line("", PricingCategory::OneTime, 50_000, 1)], 0);
        let document = render(&subject, &issuer());
        assert_eq!(document.rows[0].name, MISSING_ITEM_LABEL);
    }

    #[test]
    fn short_documents_pad_to_one_full_page() {
        let subject = quote(vec![line("Diseño web", PricingCategory::OneTime, 50_000, 1)], 0);
        let document = render(&subject, &issuer());
        assert_eq!(document.width, DOC_WIDTH);
        assert_eq!(document.height, DOC_MIN_HEIGHT);
    }

    #[test]
    fn long_item_tables_grow_past_the_minimum_height() {
        let lines: Vec<_> = (0..30)
            .map(|i| line(&format!("Servicio {i}"), PricingCategory::OneTime, 10_000, 1))
            .collect();
        let document = render(&quote(lines, 19), &issuer());
        assert!(document.height > DOC_MIN_HEIGHT);
    }

    #[test]
    fn rendering_is_deterministic() {
        let subject = quote(vec![line("Diseño web", PricingCategory::OneTime, 50_000, 2)], 19);
        assert_eq!(render(&subject, &issuer()), render(&subject, &issuer()));
    }
}
