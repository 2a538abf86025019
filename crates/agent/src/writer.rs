//! Copy improvement for the free-text blocks of a quote (notes, legal
//! terms, exclusions, item descriptions). Purely textual; unlike the quote
//! mapper it has no catalog awareness.

use crate::llm::{AdapterError, ChatRequest, LlmClient};

pub struct TextImprover<C> {
    client: C,
}

impl<C: LlmClient> TextImprover<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn improve(&self, text: &str, context: &str) -> Result<String, AdapterError> {
        let context = if context.trim().is_empty() { "Sección de la cotización" } else { context };

        let prompt = format!(
            "Actúa como un asistente profesional experto en redacción B2B.\n\n\
El usuario está en una plataforma de cotizaciones y quiere mejorar o redactar el \
texto para el siguiente contexto:\n\
[CONTEXTO DEL DOCUMENTO]: {context}\n\n\
Original: \"{text}\"\n\n\
Instrucciones:\n\
1. Mejora la redacción haciéndola más profesional, clara y persuasiva.\n\
2. Corrige ortografía y gramática.\n\
3. Si el texto original es muy corto, expándelo a algo comercial e impactante.\n\
4. Devuelve SOLO el texto mejorado, sin introducciones ni comentarios adicionales."
        );

        let improved = self
            .client
            .complete(&ChatRequest { system: None, user: prompt, temperature: 0.7 })
            .await?;

        let improved = improved.trim();
        if improved.is_empty() {
            return Err(AdapterError::StructuredOutput("empty completion".to_string()));
        }
        Ok(improved.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::llm::{AdapterError, ScriptedLlmClient};

    use super::TextImprover;

    #[tokio::test]
    async fn returns_the_improved_text_trimmed() {
        let client = ScriptedLlmClient::replying(
            "  Diseño y desarrollo de sitio web optimizado para alta conversión.  ",
        );
        let improver = TextImprover::new(client);

        let improved = improver.improve("diseño web", "Descripción de ítem").await.expect("ok");
        assert_eq!(improved, "Diseño y desarrollo de sitio web optimizado para alta conversión.");
    }

    #[tokio::test]
    async fn empty_completions_are_content_errors() {
        let client = ScriptedLlmClient::replying("   ");
        let improver = TextImprover::new(client);

        let error = improver.improve("diseño web", "").await.expect_err("must fail");
        assert!(matches!(error, AdapterError::StructuredOutput(_)));
    }

    #[tokio::test]
    async fn transport_failures_are_distinguishable() {
        let client = ScriptedLlmClient::with_responses([Err(AdapterError::Transport(
            "timeout".to_string(),
        ))]);
        let improver = TextImprover::new(client);

        let error = improver.improve("texto", "Notas").await.expect_err("must fail");
        assert!(matches!(error, AdapterError::Transport(_)));
    }
}
