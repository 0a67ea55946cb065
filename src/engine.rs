// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PLATES ENGINE - ORQUESTRAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Fluxo por pergunta:
//   Classifier → busca → Aggregator → geração → Organizer → chamador
//
// Nenhum estado é mantido entre chamadas.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::Serialize;
use std::sync::Arc;

use crate::aggregator::{search_and_fetch_content, StatusSink};
use crate::classifier::{break_into_single_topics, detect_multi_topic_query};
use crate::llm::{LlmClient, LlmError};
use crate::organizer::{count_headings, organize_topics};
use crate::search::SearchClient;
use crate::types::{GeneratedContent, Quote, SearchResult};
use crate::utils::{collapse_whitespace, ActionTimer};

/// Tokens máximos da resposta final
pub const ANSWER_MAX_TOKENS: u32 = 8000;

/// Temperatura da resposta final
pub const ANSWER_TEMPERATURE: f32 = 0.1;

/// Erros fatais de `generate_content`
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Empty input provided")]
    EmptyInput,

    #[error("No relevant information found")]
    NoResults,

    #[error(transparent)]
    Generation(#[from] LlmError),

    #[error("Empty response received")]
    EmptyResponse,

    #[error("Failed to organize response into sections")]
    OrganizeFailed,
}

/// Resposta final junto com as fontes que a fundamentaram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineReport {
    /// Texto bruto ou seções organizadas
    pub content: GeneratedContent,
    /// Resultados agregados, na ordem em que entraram no prompt
    pub sources: Vec<SearchResult>,
}

/// Orquestrador do pipeline de resposta
pub struct PlatesEngine {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
}

impl PlatesEngine {
    /// Cria um engine com os colaboradores fornecidos
    pub fn new(llm: Arc<dyn LlmClient>, search: Arc<dyn SearchClient>) -> Self {
        Self { llm, search }
    }

    /// Gera a resposta para a pergunta do usuário.
    ///
    /// Retorna texto bruto quando a resposta não tem headings `###`, ou a
    /// lista de seções organizadas caso contrário.
    pub async fn generate_content(
        &self,
        input: &str,
        status: &StatusSink,
    ) -> Result<GeneratedContent, EngineError> {
        self.generate_report(input, status)
            .await
            .map(|report| report.content)
    }

    /// Como [`generate_content`](Self::generate_content), mas devolve também as
    /// fontes agregadas usadas no prompt
    pub async fn generate_report(
        &self,
        input: &str,
        status: &StatusSink,
    ) -> Result<EngineReport, EngineError> {
        let question = input.trim();
        if question.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        self.llm.ensure_ready().map_err(|e| {
            log::error!("💥 Cliente LLM não configurado: {}", e);
            EngineError::Generation(e)
        })?;

        let is_multi_topic = detect_multi_topic_query(question);
        log::info!(
            "❓ Pergunta: {} | múltiplos tópicos: {}",
            question,
            is_multi_topic
        );

        status("Searching for relevant information");
        let results =
            search_and_fetch_content(self.llm.as_ref(), self.search.as_ref(), question, status)
                .await;

        if results.is_empty() {
            return Err(EngineError::NoResults);
        }

        let prompt = build_answer_prompt(question, &results, is_multi_topic);

        status("Formulating detailed response...");
        let timer = ActionTimer::start("Geração");
        let response = self
            .llm
            .generate(&prompt, ANSWER_MAX_TOKENS, ANSWER_TEMPERATURE)
            .await
            .map_err(|e| {
                log::error!("💥 Geração falhou: {}", e);
                EngineError::Generation(e)
            })?;
        timer.stop_and_log();

        if response.trim().is_empty() {
            return Err(EngineError::EmptyResponse);
        }

        let heading_count = count_headings(&response);
        log::debug!("📑 {} headings H3 na resposta", heading_count);

        let content = if heading_count == 0 {
            GeneratedContent::Text(response)
        } else {
            let sections = organize_topics(&response);
            if sections.is_empty() {
                return Err(EngineError::OrganizeFailed);
            }
            log::info!("✅ Resposta organizada em {} seções", sections.len());
            GeneratedContent::Sections(sections)
        };

        Ok(EngineReport {
            content,
            sources: results,
        })
    }
}

/// Bloco de contexto de uma fonte, com as citações anexadas
pub fn format_source(result: &SearchResult) -> String {
    let quotes = if result.quotes.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = result.quotes.iter().map(Quote::to_prompt_line).collect();
        format!("\nQUOTES FROM THIS SOURCE:\n{}", lines.join("\n"))
    };

    format!(
        "SOURCE: \"{}\" ({})\nCONTENT:\n{}{}\n---\n",
        result.title, result.url, result.content, quotes
    )
}

const QUOTE_RULES: &str = r#"2. If quoting directly, format EXACTLY as follows:
   - For Quran verses: {Verse text (Surah Al-Name 2:255)}
   - For hadiths: "Hadith text" [Sahih Bukhari 123]
   - Use the ACTUAL BOOK NAME as the source (e.g., Fatawa Islamiyah, Sahih Muslim, Bulugh al-Maram)
   - Do NOT cite scholars or narrators as sources - use the BOOK NAME instead
   - Always include the URL with quotes when available"#;

/// Monta o prompt final com todas as fontes agregadas
pub fn build_answer_prompt(question: &str, results: &[SearchResult], is_multi_topic: bool) -> String {
    let context = results
        .iter()
        .map(format_source)
        .collect::<Vec<_>>()
        .join("\n");

    let (intro, heading_rule, guidelines) = if is_multi_topic {
        let topics = break_into_single_topics(question)
            .iter()
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n");
        (
            format!(
                "You are a helpful AI assistant specializing in Islamic knowledge. The user has asked a question with multiple topics or aspects. Please respond in the same language as the input question.\n\nFor each topic or aspect of the question, create a dedicated section with a clear heading.\n\nDetected topics:\n{}",
                topics
            ),
            "3. Use markdown \"### \" (H3) format for EACH main section heading",
            "1. Present multiple viewpoints when available\n2. If context lacks clear evidence, acknowledge the limitations\n3. Make each section comprehensive and able to stand alone\n4. Elaborate in detail on each point with thorough explanations\n5. Put relevant quotes in each section where appropriate\n6. When mentioning a scholar, always include their FULL name with honorifics",
        )
    } else {
        (
            "You are a helpful AI assistant specializing in Islamic knowledge. Please respond in the same language as the input question.".to_string(),
            "3. Use markdown \"### \" (H3) format for ALL section headings",
            "1. Present multiple viewpoints when available\n2. If context lacks clear evidence, acknowledge the limitations\n3. Elaborate in detail with thorough explanations and examples\n4. Put quotes in separate paragraphs with proper attribution\n5. For Islamic rulings, clearly state the basis of the ruling\n6. When mentioning a scholar, always include their FULL name with honorifics",
        )
    };

    format!(
        "{intro}\n\nContext from Islamic sources:\n{context}\n\nQuestion: {question}\n\nFORMATTING RULES:\n1. Use ONLY information provided in the context above\n{QUOTE_RULES}\n{heading_rule}\n4. Start with a \"### Introduction\" or \"### Overview\" section\n5. When mentioning Islamic rulings like \"it is haram/halal/permissible\", use bold format like **this is haram**\n\nCONTENT GUIDELINES:\n{guidelines}\n\nBegin Response:"
    )
}

/// Normaliza whitespace do conteúdo e anexa as citações relevantes
pub fn process_content(content: &str, quotes: &[Quote]) -> String {
    let mut clean = collapse_whitespace(content);

    if !quotes.is_empty() {
        let lines: Vec<String> = quotes.iter().map(Quote::to_prompt_line).collect();
        clean.push_str("\n\nRelevant Quotes:\n");
        clean.push_str(&lines.join("\n"));
    }

    clean
}
