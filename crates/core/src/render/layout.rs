//! Fixed-width virtual page model.
//!
//! The document is laid out at a print-page-equivalent width and grows
//! downward as far as its content needs; pagination happens afterwards by
//! slicing (see `paginate`). All measurements are virtual units (CSS pixels
//! of the reference layout).

use serde::{Deserialize, Serialize};

/// Virtual document width. Every document renders at exactly this width.
pub const DOC_WIDTH: u32 = 794;
/// Documents are padded to at least one A4-at-96dpi page.
pub const DOC_MIN_HEIGHT: u32 = 1123;

/// A4 export page size in millimetres.
pub const A4_PAGE_WIDTH: u32 = 210;
pub const A4_PAGE_HEIGHT: u32 = 297;

const HEADER_HEIGHT: u32 = 132;
const PARTIES_HEIGHT: u32 = 152;
const TABLE_HEADER_HEIGHT: u32 = 42;
const ROW_HEIGHT: u32 = 56;
const ROW_SKU_EXTRA: u32 = 14;
const SUMMARY_BASE_HEIGHT: u32 = 86;
const TAX_ROW_HEIGHT: u32 = 24;
const TEXT_BLOCK_CHROME: u32 = 62;
const TEXT_LINE_HEIGHT: u32 = 18;
const TEXT_WRAP_COLUMNS: usize = 88;
const SIGNATURE_HEIGHT: u32 = 176;
const FOOTER_HEIGHT: u32 = 196;

/// Document sections in their fixed top-to-bottom order. Optional sections
/// are simply absent from the section list when their data is null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    Header,
    Parties,
    ItemTable,
    Summary,
    Notes,
    LegalTerms,
    Exclusions,
    Signature,
    Footer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub height: u32,
}

pub(crate) fn header_section() -> Section {
    Section { kind: SectionKind::Header, height: HEADER_HEIGHT }
}

pub(crate) fn parties_section() -> Section {
    Section { kind: SectionKind::Parties, height: PARTIES_HEIGHT }
}

pub(crate) fn item_table_section(rows_with_sku: &[bool]) -> Section {
    let rows: u32 = rows_with_sku
        .iter()
        .map(|has_sku| ROW_HEIGHT + if *has_sku { ROW_SKU_EXTRA } else { 0 })
        .sum();
    Section { kind: SectionKind::ItemTable, height: TABLE_HEADER_HEIGHT + rows }
}

pub(crate) fn summary_section(shows_tax_row: bool) -> Section {
    let height = SUMMARY_BASE_HEIGHT + if shows_tax_row { TAX_ROW_HEIGHT } else { 0 };
    Section { kind: SectionKind::Summary, height }
}

/// Height of a wrapped prose block (notes, legal terms, exclusions).
/// Wrapping is estimated at a fixed column count; the estimate only has to
/// be deterministic, not typographically exact.
pub(crate) fn text_section(kind: SectionKind, text: &str) -> Section {
    let lines: usize =
        text.lines().map(|line| 1 + line.chars().count() / TEXT_WRAP_COLUMNS).sum::<usize>().max(1);
    Section { kind, height: TEXT_BLOCK_CHROME + TEXT_LINE_HEIGHT * lines as u32 }
}

pub(crate) fn signature_section() -> Section {
    Section { kind: SectionKind::Signature, height: SIGNATURE_HEIGHT }
}

pub(crate) fn footer_section() -> Section {
    Section { kind: SectionKind::Footer, height: FOOTER_HEIGHT }
}
