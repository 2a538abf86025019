//! Free text to quote draft, against the caller's catalog.
//!
//! The model only ever sees the catalog supplied with the request, and the
//! closed-world rule is enforced again in code after parsing: an id that is
//! not in that catalog is moved to `no_encontrados`, never invented.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use cotiza_core::domain::item::CatalogItem;
use cotiza_core::domain::quote::clamp_quantity;

use crate::llm::{AdapterError, ChatRequest, LlmClient};

/// Wire shape of the structured draft. Field names are the JSON contract
/// shared with the composer UI and must stay as they are.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteDraft {
    #[serde(default)]
    pub cliente_nombre: String,
    #[serde(default)]
    pub cliente_email: String,
    #[serde(default)]
    pub items: Vec<DraftItem>,
    #[serde(default)]
    pub no_encontrados: Vec<String>,
    #[serde(default)]
    pub notas_sugeridas: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DraftItem {
    pub item_id: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default = "default_cantidad")]
    pub cantidad: i64,
    #[serde(default)]
    pub precio_unitario: Option<Decimal>,
}

fn default_cantidad() -> i64 {
    1
}

pub struct QuoteMapper<C> {
    client: C,
}

impl<C: LlmClient> QuoteMapper<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn draft(
        &self,
        message: &str,
        catalog: &[CatalogItem],
    ) -> Result<QuoteDraft, AdapterError> {
        let request = ChatRequest {
            system: Some(system_prompt(catalog)),
            user: message.to_string(),
            temperature: 0.1,
        };

        let raw = self.client.complete(&request).await?;
        let cleaned = strip_markdown_fences(&raw);

        let parsed: QuoteDraft = serde_json::from_str(cleaned).map_err(|err| {
            AdapterError::StructuredOutput(format!("draft is not valid JSON: {err}"))
        })?;

        Ok(sanitize(parsed, catalog))
    }
}

fn system_prompt(catalog: &[CatalogItem]) -> String {
    let listing = catalog
        .iter()
        .map(|item| {
            format!(
                "- ID: \"{}\" | Nombre: \"{}\" | SKU: \"{}\" | Precio: ${}",
                item.id.0,
                item.name,
                item.sku.as_deref().unwrap_or("N/A"),
                item.base_price,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Eres un asistente de cotizaciones. Interpreta solicitudes informales y \
mapéalas a ítems del catálogo de productos/servicios.\n\n\
CATÁLOGO DISPONIBLE:\n{listing}\n\n\
REGLAS ESTRICTAS:\n\
1. SOLO puedes usar ítems que existan en el catálogo de arriba.\n\
2. Si un ítem mencionado no coincide con ninguno, busca el más parecido.\n\
3. Si definitivamente no hay coincidencia, agrégalo a \"no_encontrados\".\n\
4. Las cantidades deben ser números enteros positivos.\n\
5. Si no se especifica cantidad, asume 1.\n\
6. Si el usuario menciona un nombre o email de cliente, extráelo.\n\n\
Responde ÚNICAMENTE con un JSON válido, sin markdown ni texto adicional, con esta \
estructura exacta:\n\
{{\n\
    \"cliente_nombre\": \"\",\n\
    \"cliente_email\": \"\",\n\
    \"items\": [{{\"item_id\": \"\", \"nombre\": \"\", \"cantidad\": 1, \"precio_unitario\": 0}}],\n\
    \"no_encontrados\": [],\n\
    \"notas_sugeridas\": \"\"\n\
}}"
    )
}

/// Drop a wrapping ```json fence if the model added one anyway.
fn strip_markdown_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

/// Re-validate the parsed draft against the supplied catalog: fabricated
/// ids move to `no_encontrados`, quantities clamp positive, and name/price
/// gaps are filled from the catalog entry.
fn sanitize(draft: QuoteDraft, catalog: &[CatalogItem]) -> QuoteDraft {
    let QuoteDraft {
        cliente_nombre,
        cliente_email,
        items: proposals,
        mut no_encontrados,
        notas_sugeridas,
    } = draft;
    let mut items = Vec::with_capacity(proposals.len());

    for proposal in proposals {
        match catalog.iter().find(|item| item.id.0 == proposal.item_id) {
            Some(entry) => {
                let nombre = if proposal.nombre.trim().is_empty() {
                    entry.name.clone()
                } else {
                    proposal.nombre
                };
                items.push(DraftItem {
                    item_id: proposal.item_id,
                    nombre,
                    cantidad: i64::from(clamp_quantity(proposal.cantidad)),
                    precio_unitario: Some(proposal.precio_unitario.unwrap_or(entry.base_price)),
                });
            }
            None => {
                warn!(item_id = %proposal.item_id, "draft proposed an id outside the catalog");
                let label = if proposal.nombre.trim().is_empty() {
                    proposal.item_id
                } else {
                    proposal.nombre
                };
                no_encontrados.push(label);
            }
        }
    }

    QuoteDraft { cliente_nombre, cliente_email, items, no_encontrados, notas_sugeridas }
}

#[cfg(test)]
mod tests {
    use cotiza_core::chrono::Utc;
    use cotiza_core::domain::item::{CatalogItem, ItemId, PricingCategory};
    use cotiza_core::domain::user::UserId;
    use rust_decimal::Decimal;

    use crate::llm::{AdapterError, ScriptedLlmClient};

    use super::{strip_markdown_fences, QuoteMapper};

    fn catalog() -> Vec<CatalogItem> {
        vec![CatalogItem {
            id: ItemId("a1".to_string()),
            owner_id: UserId("u-1".to_string()),
            name: "Diseño web".to_string(),
            sku: None,
            description: String::new(),
            base_price: Decimal::from(50_000),
            category: PricingCategory::OneTime,
            recurrence: None,
            internal_notes: None,
            created_at: Utc::now(),
        }]
    }

    #[tokio::test]
    async fn maps_informal_text_onto_catalog_items() {
        let client = ScriptedLlmClient::replying(
            r#"{"cliente_nombre": "", "cliente_email": "",
                "items": [{"item_id": "a1", "cantidad": 2}],
                "no_encontrados": [], "notas_sugeridas": ""}"#,
        );
        let mapper = QuoteMapper::new(client);

        let draft = mapper.draft("necesito 2 diseños web", &catalog()).await.expect("draft");

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].item_id, "a1");
        assert_eq!(draft.items[0].cantidad, 2);
        assert_eq!(draft.items[0].nombre, "Diseño web");
        assert_eq!(draft.items[0].precio_unitario, Some(Decimal::from(50_000)));
        assert!(draft.no_encontrados.is_empty());
    }

    #[tokio::test]
    async fn fabricated_ids_are_moved_to_no_encontrados() {
        let client = ScriptedLlmClient::replying(
            r#"{"items": [
                {"item_id": "a1", "cantidad": 1},
                {"item_id": "invented-id", "nombre": "Consultoría SAP", "cantidad": 3}
            ]}"#,
        );
        let mapper = QuoteMapper::new(client);

        let draft = mapper.draft("diseño web y consultoría SAP", &catalog()).await.expect("draft");

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].item_id, "a1");
        assert_eq!(draft.no_encontrados, vec!["Consultoría SAP".to_string()]);
    }

    #[tokio::test]
    async fn markdown_fences_are_tolerated() {
        let client = ScriptedLlmClient::replying(
            "```json\n{\"items\": [{\"item_id\": \"a1\"}]}\n```",
        );
        let mapper = QuoteMapper::new(client);

        let draft = mapper.draft("un diseño web", &catalog()).await.expect("draft");
        assert_eq!(draft.items[0].cantidad, 1);
    }

    #[tokio::test]
    async fn unparsable_content_is_a_structured_output_error() {
        let client = ScriptedLlmClient::replying("lo siento, no entiendo la solicitud");
        let mapper = QuoteMapper::new(client);

        let error = mapper.draft("algo", &catalog()).await.expect_err("must fail");
        assert!(matches!(error, AdapterError::StructuredOutput(_)));
    }

    #[tokio::test]
    async fn transport_errors_pass_through_unchanged() {
        let client = ScriptedLlmClient::with_responses([Err(AdapterError::Transport(
            "connection refused".to_string(),
        ))]);
        let mapper = QuoteMapper::new(client);

        let error = mapper.draft("algo", &catalog()).await.expect_err("must fail");
        assert!(matches!(error, AdapterError::Transport(_)));
    }

    #[tokio::test]
    async fn non_positive_quantities_clamp_to_one() {
        let client = ScriptedLlmClient::replying(
            r#"{"items": [{"item_id": "a1", "cantidad": -4}]}"#,
        );
        let mapper = QuoteMapper::new(client);

        let draft = mapper.draft("diseño web", &catalog()).await.expect("draft");
        assert_eq!(draft.items[0].cantidad, 1);
    }

    #[test]
    fn fence_stripping_keeps_plain_json_untouched() {
        assert_eq!(strip_markdown_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_markdown_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_markdown_fences("```\n{}\n```"), "{}");
    }
}
