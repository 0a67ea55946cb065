//! # Plates Engine
//!
//! Motor de respostas para um assistente de conhecimento islâmico. Recebe uma
//! pergunta em linguagem natural, decide se precisa de busca web, agrega
//! fontes com citações e pede ao LLM uma resposta fundamentada, que é então
//! organizada em seções tituladas.
//!
//! ## Pipeline
//!
//! ```text
//! pergunta
//!    │
//!    ▼
//! classifier ── precisa de busca? múltiplos tópicos? sub-queries
//!    │
//!    ▼
//! aggregator ── busca sequencial, limites, dedup por URL, citações
//!    │
//!    ▼
//! engine ────── prompt com fontes → LLM
//!    │
//!    ▼
//! organizer ─── seções `###`, títulos únicos, blocos de citação
//! ```
//!
//! ## Colaboradores
//!
//! Toda I/O passa por duas traits, com implementações reais e mocks:
//! - [`llm::LlmClient`]: [`llm::GeminiClient`], [`llm::MockLlmClient`]
//! - [`search::SearchClient`]: [`search::GoogleSearchClient`], [`search::MockSearchClient`]
//!
//! ## Exemplo de Uso
//!
//! ```rust,ignore
//! use plates_engine::prelude::*;
//! use std::sync::Arc;
//!
//! let config = load_engine_config();
//! let engine = PlatesEngine::new(
//!     Arc::new(GeminiClient::from_config(&config)),
//!     Arc::new(GoogleSearchClient::from_config(&config)),
//! );
//! let content = engine
//!     .generate_content("What is the ruling on fasting while travelling?", &|s| eprintln!("{}", s))
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Tipos compartilhados: [`Quote`], [`SearchResult`], [`TopicSection`],
/// [`GeneratedContent`].
pub mod types;

/// Configuração do engine (chaves, endpoints) e do runtime Tokio.
///
/// **Engine:**
/// - `GOOGLE_API_KEY`, `SEARCH_ENGINE_ID`: Google Custom Search
/// - `GEMINI_API_KEY`, `GEMINI_API_URL`: geração
/// - `NODE_ENV` / `APP_ENV`: `development` ativa logs de debug
///
/// **Runtime Tokio:**
/// - `TOKIO_THREADS`: número fixo de threads
/// - `TOKIO_MAX_THREADS`: máximo para cálculo dinâmico (padrão: 4)
pub mod config;

/// Cliente de geração de texto (Gemini + mock).
pub mod llm;

/// Cliente de busca web e de imagens (Google CSE + mock) e score de relevância.
pub mod search;

/// Classificação da pergunta: necessidade de busca, múltiplos tópicos,
/// expansão em sub-queries.
pub mod classifier;

/// Agregação de resultados: limites, deduplicação e citações.
pub mod aggregator;

/// Organização da resposta em seções e renderização de citações.
pub mod organizer;

/// Orquestração ponta a ponta (`generate_content`).
pub mod engine;

/// Sessão de transcrição de áudio que alimenta o engine.
pub mod transcript;

/// Utilitários de texto e medição de tempo.
pub mod utils;

// Re-exports principais
pub use config::{
    create_tokio_runtime, load_engine_config, load_runtime_config, EngineConfig, RuntimeConfig,
};
pub use engine::{EngineError, EngineReport, PlatesEngine};
pub use types::*;

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude com imports comuns para uso rápido.
///
/// ```rust,ignore
/// use plates_engine::prelude::*;
/// ```
pub mod prelude {
    pub use crate::aggregator::{search_and_fetch_content, StatusSink};
    pub use crate::classifier::{detect_multi_topic_query, needs_web_search, optimize_query};
    pub use crate::config::{load_engine_config, EngineConfig};
    pub use crate::engine::{process_content, EngineError, EngineReport, PlatesEngine};
    pub use crate::llm::{GeminiClient, LlmClient, LlmError, MockLlmClient};
    pub use crate::organizer::organize_topics;
    pub use crate::search::{GoogleSearchClient, MockSearchClient, SearchClient, SearchError};
    pub use crate::transcript::{Transcriber, TranscriptSession, TranscriptionConfig};
    pub use crate::types::*;
}
