//! PDF export for quote documents.
//!
//! The core's layout model decides page arithmetic; this module renders the
//! document to HTML with a tera template and converts it with wkhtmltopdf
//! when the binary is on PATH. Without it, the HTML itself is returned for
//! browser-side printing.

use std::process::Stdio;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, info, warn};

use cotiza_core::render::layout::{A4_PAGE_HEIGHT, A4_PAGE_WIDTH};
use cotiza_core::render::{paginate, render, IssuerSnapshot, RenderedDocument};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::quotes::fetch_owned;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct PdfGenerator {
    tera: Tera,
    wkhtmltopdf_path: Option<String>,
}

impl PdfGenerator {
    pub fn new() -> Result<Self, PdfError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            "documento.html.tera",
            include_str!("../../../templates/documento.html.tera"),
        )
        .map_err(|err| PdfError::Template(err.to_string()))?;

        let wkhtmltopdf_path =
            which::which("wkhtmltopdf").ok().map(|path| path.to_string_lossy().to_string());

        match &wkhtmltopdf_path {
            Some(path) => info!(path = %path, "wkhtmltopdf found"),
            None => {
                warn!("wkhtmltopdf not found in PATH - exports fall back to printable HTML")
            }
        }

        Ok(Self { tera, wkhtmltopdf_path })
    }

    #[cfg(test)]
    pub fn html_only() -> Self {
        let mut generator = Self::new().expect("embedded template loads");
        generator.wkhtmltopdf_path = None;
        generator
    }

    pub fn render_html(&self, document: &RenderedDocument) -> Result<String, PdfError> {
        let context = Context::from_serialize(document)
            .map_err(|err| PdfError::Template(err.to_string()))?;
        self.tera
            .render("documento.html.tera", &context)
            .map_err(|err| PdfError::Template(err.to_string()))
    }

    pub async fn generate(&self, document: &RenderedDocument) -> Result<PdfResult, PdfError> {
        let html = self.render_html(document)?;

        if let Some(wkhtmltopdf) = &self.wkhtmltopdf_path {
            match self.convert_html_to_pdf(&html, wkhtmltopdf).await {
                Ok(pdf_bytes) => return Ok(PdfResult::Pdf(pdf_bytes)),
                Err(err) => {
                    warn!(error = %err, "PDF conversion failed, falling back to HTML");
                }
            }
        }
        Ok(PdfResult::Html(html))
    }

    async fn convert_html_to_pdf(
        &self,
        html: &str,
        wkhtmltopdf_path: &str,
    ) -> Result<Vec<u8>, PdfError> {
        let temp_dir = std::env::temp_dir();
        let html_path = temp_dir.join(format!("cotiza_{}.html", uuid::Uuid::new_v4()));
        let pdf_path = temp_dir.join(format!("cotiza_{}.pdf", uuid::Uuid::new_v4()));

        tokio::fs::write(&html_path, html).await?;

        let output = Command::new(wkhtmltopdf_path)
            .arg("--page-size")
            .arg("A4")
            .arg("--margin-top")
            .arg("0mm")
            .arg("--margin-bottom")
            .arg("0mm")
            .arg("--margin-left")
            .arg("0mm")
            .arg("--margin-right")
            .arg("0mm")
            .arg("--encoding")
            .arg("utf-8")
            .arg("--enable-local-file-access")
            .arg(&html_path)
            .arg(&pdf_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(stderr = %stderr, "wkhtmltopdf failed");
            return Err(PdfError::Conversion(stderr.to_string()));
        }

        let pdf_bytes = tokio::fs::read(&pdf_path).await?;

        let _ = tokio::fs::remove_file(&html_path).await;
        let _ = tokio::fs::remove_file(&pdf_path).await;

        info!(size = pdf_bytes.len(), "PDF generated");
        Ok(pdf_bytes)
    }
}

pub enum PdfResult {
    Pdf(Vec<u8>),
    Html(String),
}

impl PdfResult {
    pub fn into_response(self, filename: &str) -> Response {
        let builder = Response::builder().status(StatusCode::OK);
        let result = match self {
            PdfResult::Pdf(bytes) => builder
                .header(header::CONTENT_TYPE, "application/pdf")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                )
                .body(Body::from(bytes)),
            PdfResult::Html(html) => builder
                .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
                .body(Body::from(html)),
        };
        result.unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

/// GET /api/quotes/{id}/pdf
pub async fn export(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let quote = fetch_owned(&state, &caller, &id).await?;

    let profile = state
        .users
        .find_by_id(&quote.owner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("issuer profile not found".to_string()))?;

    let document = render(&quote, &IssuerSnapshot::from(&profile));
    let pages = paginate(&document, A4_PAGE_WIDTH, A4_PAGE_HEIGHT);
    info!(
        quote_id = %quote.id.0,
        reference = %document.short_reference,
        pages = pages.len(),
        "exporting document"
    );

    let filename = document.pdf_filename();
    let result = state
        .pdf
        .generate(&document)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(result.into_response(&filename))
}
