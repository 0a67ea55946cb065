// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE LLM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait e implementações para o colaborador de geração de texto.
// Implementação real: Gemini `generateContent`. Mock scriptado para testes.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::config::EngineConfig;

/// Erros do cliente LLM
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Missing Gemini API key")]
    MissingApiKey,

    #[error("Invalid prompt: must provide a non-empty string")]
    InvalidPrompt,

    #[error("Gemini API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from Gemini API: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Trait principal para clientes de geração
///
/// Um único método: prompt → texto. Falhas carregam status/mensagem do provedor.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Gera texto para o prompt
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError>;

    /// Verifica a configuração antes do pipeline chamar qualquer colaborador
    fn ensure_ready(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO GEMINI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
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
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Cliente para a API Gemini
pub struct GeminiClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Cria um cliente com chave e endpoint explícitos
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self {
            api_key,
            endpoint,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Cria um cliente a partir da configuração carregada do ambiente
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.gemini_api_key.clone(), config.gemini_api_url.clone())
    }
}

/// Extrai o texto do primeiro candidato da resposta
fn extract_text(response: GeminiResponse) -> Result<String, LlmError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("missing candidates[0].content.parts[0].text".into()))
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn ensure_ready(&self) -> Result<(), LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        Ok(())
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        if prompt.trim().is_empty() {
            return Err(LlmError::InvalidPrompt);
        }
        self.ensure_ready()?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
                temperature,
                top_p: 0.95,
                top_k: 64,
            },
        };

        log::debug!(
            "🤖 Gemini: {} chars de prompt | max_tokens={} | temperature={}",
            prompt.len(),
            max_tokens,
            temperature
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = if error_text.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                error_text
            };
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        extract_text(body)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente mock scriptado.
///
/// Cada regra associa um trecho do prompt a uma resposta (ou erro); a primeira
/// regra cujo trecho aparece no prompt vence. Todas as chamadas são registradas.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    rules: Vec<(String, Result<String, String>)>,
    default_response: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockLlmClient {
    /// Mock sem regras
    pub fn new() -> Self {
        Self::default()
    }

    /// Responde `response` quando o prompt contém `pattern`
    pub fn with_response(mut self, pattern: &str, response: &str) -> Self {
        self.rules.push((pattern.into(), Ok(response.into())));
        self
    }

    /// Falha com erro de API quando o prompt contém `pattern`
    pub fn with_error(mut self, pattern: &str, message: &str) -> Self {
        self.rules.push((pattern.into(), Err(message.into())));
        self
    }

    /// Resposta para prompts sem regra
    pub fn with_default(mut self, response: &str) -> Self {
        self.default_response = Some(response.into());
        self
    }

    /// Prompts recebidos, em ordem
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Número de chamadas recebidas
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt.to_string());
        }

        let scripted = self
            .rules
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, outcome)| outcome.clone());

        match scripted {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Api {
                status: 500,
                message,
            }),
            None => self.default_response.clone().ok_or(LlmError::Api {
                status: 404,
                message: "no mock response".into(),
            }),
        }
    }
}
