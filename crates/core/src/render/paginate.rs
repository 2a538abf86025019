use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::render::RenderedDocument;

/// One physical export page: a `page_height`-tall window into the scaled
/// document, starting `offset` units from its top.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub offset: Decimal,
    pub width: u32,
    pub height: u32,
}

/// Slice a rendered document into physical pages.
///
/// This is image-slicing pagination: the whole document is scaled to the
/// page width, then cut into page-height chunks top to bottom. A cut can
/// land in the middle of a table row or paragraph; that is the accepted
/// price of pixel-faithful output (a content-flow paginator that breaks
/// between sections would be the quality-first alternative). The final
/// partial chunk is emitted as a full page, and even zero-height content
/// yields one page.
pub fn paginate(document: &RenderedDocument, page_width: u32, page_height: u32) -> Vec<Page> {
    let scaled_height = if document.width == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(document.height) * Decimal::from(page_width) / Decimal::from(document.width)
    };
    let page_step = Decimal::from(page_height);

    let mut pages = Vec::new();
    let mut offset = Decimal::ZERO;
    let mut remaining = scaled_height;
    loop {
        pages.push(Page {
            number: pages.len() as u32 + 1,
            offset,
            width: page_width,
            height: page_height,
        });
        offset += page_step;
        remaining -= page_step;
        if remaining <= Decimal::ZERO {
            break;
        }
    }
    pages
}
