//! Outbound quote email via a Resend-style HTTP provider. The quote id is
//! attached as a correlation tag so the open-tracking webhook can find the
//! quote later.

use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::Json;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::quotes::fetch_owned;
use crate::state::AppState;

pub const CORRELATION_TAG: &str = "cotizacion_id";

/// Provider rejection (bad recipient, unverified sender) is reported apart
/// from transport failure: the first will not be fixed by retrying.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MailError {
    #[error("email transport failure: {0}")]
    Transport(String),
    #[error("email provider rejected the send: {0}")]
    Rejected(String),
}

#[derive(Clone, Debug)]
pub struct OutboundQuoteEmail {
    pub to: String,
    pub subject: String,
    pub company_name: Option<String>,
    pub document_url: String,
    pub quote_id: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the quote email; returns the provider's delivery id.
    async fn send_quote(&self, email: &OutboundQuoteEmail) -> Result<String, MailError>;
}

pub struct ResendMailer {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    sender: String,
}

impl ResendMailer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        sender: impl Into<String>,
    ) -> Result<Self, MailError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| MailError::Transport(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            sender: sender.into(),
        })
    }

    fn html_body(email: &OutboundQuoteEmail) -> String {
        let company = email.company_name.as_deref().unwrap_or("nuestra empresa");
        format!(
            "<div style=\"font-family: sans-serif;\">\
<h2>Hola!</h2>\
<p>Tienes una nueva cotización de <strong>{company}</strong>.</p>\
<p>Puedes revisarla en el siguiente enlace seguro:</p>\
<a href=\"{url}\" style=\"display:inline-block;padding:10px 20px;\
background-color:#fc7ebf;color:#fff;text-decoration:none;border-radius:5px;\
margin-top:10px;\">Ver Cotización</a>\
<p style=\"margin-top:20px;font-size:12px;color:#666;\">ID de Referencia: {id}</p>\
</div>",
            url = email.document_url,
            id = email.quote_id,
        )
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
    error: Option<serde_json::Value>,
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_quote(&self, email: &OutboundQuoteEmail) -> Result<String, MailError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| MailError::Rejected("email api key not configured".to_string()))?;

        let display_name = email.company_name.as_deref().unwrap_or("Cotizaciones");
        let payload = json!({
            "from": format!("{display_name} <{}>", self.sender),
            "to": [email.to],
            "subject": email.subject,
            "html": Self::html_body(email),
            "tags": [{ "name": CORRELATION_TAG, "value": email.quote_id }],
        });

        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        let status = response.status();
        let body: SendResponse =
            response.json().await.map_err(|err| MailError::Transport(err.to_string()))?;

        if !status.is_success() || body.error.is_some() {
            let detail = body
                .error
                .map(|value| value.to_string())
                .unwrap_or_else(|| format!("provider returned {status}"));
            return Err(MailError::Rejected(detail));
        }

        body.id.ok_or_else(|| {
            MailError::Rejected("provider response had no delivery id".to_string())
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SendQuotePayload {
    pub para: String,
    pub asunto: Option<String>,
    pub cotizacion_id: String,
    pub url_documento: String,
}

/// POST /api/send-quote. Sending does not move the pipeline stage; the user
/// marks the quote as Enviado from the board.
pub async fn send_quote(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<SendQuotePayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.para.trim().is_empty() {
        return Err(ApiError::Validation("destinatario requerido".to_string()));
    }

    let quote = fetch_owned(&state, &caller, &payload.cotizacion_id).await?;
    let profile = state.users.find_by_id(&quote.owner_id).await?;

    let delivery_id = state
        .mailer
        .send_quote(&OutboundQuoteEmail {
            to: payload.para,
            subject: payload.asunto.unwrap_or_else(|| "Nueva Cotización".to_string()),
            company_name: profile.and_then(|profile| profile.company),
            document_url: payload.url_documento,
            quote_id: quote.id.0.clone(),
        })
        .await?;

    info!(quote_id = %quote.id.0, delivery_id = %delivery_id, "quote email sent");
    Ok(Json(json!({ "id_envio": delivery_id })))
}
