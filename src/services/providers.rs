// ============================================================================
// PROVIDERS IA - un trait commun, trois implémentations interchangeables
// ============================================================================
//
// Chaque provider externe (OpenAI, Anthropic, Gemini) a son propre format de
// requête/réponse HTTP, mais tous exposent la même capacité: un prompt +
// paramètres de génération en entrée, du texte généré en sortie.
//
// Points d'attention:
//   - Un seul appel réseau par opération, pas de retry automatique
//   - Timeout fixe de 30 secondes
//   - La clé API ne doit JAMAIS apparaître dans un message d'erreur ou un log:
//     tout texte d'erreur passe par redact() avant propagation
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const AI_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Erreur réseau: {0}")]
    Http(String),

    #[error("Erreur API (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Limite de requêtes atteinte chez le provider: {0}")]
    RateLimited(String),

    #[error("Réponse vide du provider")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub tokens_used: u32,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Nom affiché dans les réponses API (ex: "OpenAI GPT-4o-mini")
    fn label(&self) -> &'static str;

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, ProviderError>;
}

/// Remplace toute occurrence littérale de la clé API par "***"
pub fn redact(message: &str, key: &str) -> String {
    if key.is_empty() {
        return message.to_string();
    }
    message.replace(key, "***")
}

fn http_client() -> Client {
    Client::builder()
        .timeout(AI_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Mappe une réponse non-2xx vers l'erreur adaptée, clé redactée
async fn error_from_response(
    response: reqwest::Response,
    key: &str,
) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = redact(&body, key);

    if status == 429 {
        ProviderError::RateLimited(message)
    } else {
        ProviderError::Api { status, message }
    }
}

// ----------------------------------------------------------------------------
// OpenAI (chat completions)
// ----------------------------------------------------------------------------

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiProvider {
    client: Client,
    key: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: OpenAiUsage,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct OpenAiUsage {
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(key: String) -> Self {
        Self { client: http_client(), key }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn label(&self) -> &'static str {
        "OpenAI GPT-4o-mini"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, ProviderError> {
        let body = OpenAiRequest {
            model: OPENAI_MODEL,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: "Tu es un expert en rédaction de lettres de motivation professionnelles.",
                },
                OpenAiMessage { role: "user", content: prompt },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(OPENAI_URL)
            .bearer_auth(&self.key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(redact(&e.to_string(), &self.key)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &self.key).await);
        }

        let data: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(redact(&e.to_string(), &self.key)))?;

        let text = data
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ProviderError::EmptyContent)?;

        Ok(Completion { text, tokens_used: data.usage.total_tokens })
    }
}

// ----------------------------------------------------------------------------
// Anthropic (messages)
// ----------------------------------------------------------------------------

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";

pub struct AnthropicProvider {
    client: Client,
    key: String,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(key: String) -> Self {
        Self { client: http_client(), key }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn label(&self) -> &'static str {
        "Claude 3 Haiku"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, ProviderError> {
        let body = AnthropicRequest {
            model: ANTHROPIC_MODEL,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: vec![AnthropicMessage { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(redact(&e.to_string(), &self.key)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &self.key).await);
        }

        let data: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(redact(&e.to_string(), &self.key)))?;

        let text = data
            .content
            .into_iter()
            .find_map(|b| b.text)
            .ok_or(ProviderError::EmptyContent)?;

        Ok(Completion {
            text,
            tokens_used: data.usage.input_tokens + data.usage.output_tokens,
        })
    }
}

// ----------------------------------------------------------------------------
// Google Gemini (generateContent)
// ----------------------------------------------------------------------------

const GEMINI_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiProvider {
    client: Client,
    key: String,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

impl GeminiProvider {
    pub fn new(key: String) -> Self {
        Self { client: http_client(), key }
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn label(&self) -> &'static str {
        "Google Gemini 2.5 Flash"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, ProviderError> {
        // La clé passe en query string: toute URL d'erreur doit être redactée
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            GEMINI_MODEL, self.key
        );

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(redact(&e.to_string(), &self.key)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &self.key).await);
        }

        let data: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(redact(&e.to_string(), &self.key)))?;

        let text = data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text))
            .ok_or(ProviderError::EmptyContent)?;

        // Gemini ne retourne pas toujours le compte de tokens
        Ok(Completion { text, tokens_used: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_scrubs_key() {
        let msg = "error calling https://api?key=sk-secret123: 401";
        assert_eq!(
            redact(msg, "sk-secret123"),
            "error calling https://api?key=***: 401"
        );
    }

    #[test]
    fn test_redact_empty_key_is_noop() {
        assert_eq!(redact("message", ""), "message");
    }

    #[test]
    fn test_redact_multiple_occurrences() {
        assert_eq!(redact("k k k", "k"), "*** *** ***");
    }
}
