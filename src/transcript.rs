//! # Sessão de transcrição
//!
//! Acumula o texto transcrito de trechos de áudio e o converte em uma
//! pergunta para o engine. Captura de áudio e backends concretos de
//! speech-to-text ficam fora deste crate: o chamador fornece um [`Transcriber`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::process_content;

/// Erros de transcrição
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("API key required for cloud transcription")]
    MissingApiKey,

    #[error("Transcription backend failed: {0}")]
    Backend(String),
}

/// Backend de speech-to-text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcreve um trecho de áudio no idioma informado
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String, TranscriptionError>;
}

/// Configuração do backend de transcrição
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionConfig {
    /// Chave do serviço em nuvem
    pub api_key: Option<String>,
    /// Usa um modelo local em vez do serviço em nuvem
    pub use_local_model: bool,
    /// Idioma esperado do áudio
    pub language: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            use_local_model: false,
            language: "en".into(),
        }
    }
}

impl TranscriptionConfig {
    /// Backend em nuvem exige chave
    pub fn validate(&self) -> Result<(), TranscriptionError> {
        let has_key = self.api_key.as_deref().map_or(false, |k| !k.trim().is_empty());
        if !self.use_local_model && !has_key {
            return Err(TranscriptionError::MissingApiKey);
        }
        Ok(())
    }
}

/// Transcrição acumulada de uma gravação
#[derive(Debug, Clone)]
pub struct TranscriptSession {
    id: Uuid,
    config: TranscriptionConfig,
    started_at: DateTime<Utc>,
    transcript: String,
    chunks: usize,
}

impl TranscriptSession {
    /// Nova sessão vazia; falha se a configuração do backend for inválida
    pub fn new(config: TranscriptionConfig) -> Result<Self, TranscriptionError> {
        config.validate()?;

        let session = Self {
            id: Uuid::new_v4(),
            config,
            started_at: Utc::now(),
            transcript: String::new(),
            chunks: 0,
        };
        log::info!(
            "🎙️ Sessão de transcrição {} iniciada (idioma: {}, local: {})",
            session.id,
            session.config.language,
            session.config.use_local_model
        );
        Ok(session)
    }

    /// Identificador da sessão
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configuração validada da sessão
    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }

    /// Início da gravação
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Trechos transcritos com sucesso
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Texto acumulado até agora
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Transcreve um trecho e anexa o texto.
    ///
    /// `on_update` recebe a transcrição completa após cada trecho bem-sucedido.
    /// Falhas do backend são logadas e o trecho é descartado.
    pub async fn process_chunk<F>(&mut self, transcriber: &dyn Transcriber, audio: &[u8], on_update: F)
    where
        F: FnOnce(&str),
    {
        if audio.is_empty() {
            return;
        }

        match transcriber.transcribe(audio, &self.config.language).await {
            Ok(text) => {
                self.transcript.push_str(&text);
                self.transcript.push(' ');
                self.chunks += 1;
                log::debug!("🎙️ Trecho {} transcrito ({} bytes)", self.chunks, audio.len());
                on_update(&self.transcript);
            }
            Err(e) => {
                log::warn!("⚠️ Falha ao transcrever trecho: {}", e);
            }
        }
    }

    /// Transcrição normalizada, pronta para `generate_content`
    pub fn to_query(&self) -> Option<String> {
        if self.transcript.trim().is_empty() {
            return None;
        }
        Some(process_content(&self.transcript, &[]))
    }

    /// Encerra a sessão e devolve o texto final
    pub fn finish(self) -> String {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        log::info!(
            "🎙️ Sessão {} encerrada: {} trechos em {}s",
            self.id,
            self.chunks,
            elapsed.num_seconds()
        );
        self.transcript.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTranscriber;

    #[async_trait]
    impl Transcriber for EchoTranscriber {
        async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String, TranscriptionError> {
            if audio == b"bad" {
                return Err(TranscriptionError::Backend("corrupted chunk".into()));
            }
            let text = String::from_utf8_lossy(audio).into_owned();
            if language == "en" {
                Ok(text)
            } else {
                Ok(format!("[{}] {}", language, text))
            }
        }
    }

    fn local_session() -> TranscriptSession {
        TranscriptSession::new(TranscriptionConfig {
            use_local_model: true,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_chunks_accumulate() {
        let mut session = local_session();
        let mut updates = Vec::new();

        session
            .process_chunk(&EchoTranscriber, b"what is", |t| updates.push(t.to_string()))
            .await;
        session
            .process_chunk(&EchoTranscriber, b"zakat", |t| updates.push(t.to_string()))
            .await;

        assert_eq!(updates, vec!["what is ", "what is zakat "]);
        assert_eq!(session.chunk_count(), 2);
        assert_eq!(session.to_query().as_deref(), Some("what is zakat"));
        assert_eq!(session.finish(), "what is zakat");
    }

    #[tokio::test]
    async fn test_failed_and_empty_chunks_skipped() {
        let mut session = local_session();
        let mut updates = 0;

        session.process_chunk(&EchoTranscriber, b"bad", |_| updates += 1).await;
        session.process_chunk(&EchoTranscriber, b"", |_| updates += 1).await;
        assert_eq!(updates, 0);
        assert_eq!(session.transcript(), "");
        assert!(session.to_query().is_none());

        session.process_chunk(&EchoTranscriber, b"hajj", |_| updates += 1).await;
        assert_eq!(updates, 1);
        assert_eq!(session.transcript(), "hajj ");
    }

    #[test]
    fn test_sessions_are_independent() {
        let a = local_session();
        let b = local_session();
        assert_ne!(a.id(), b.id());
        assert!(a.started_at() <= Utc::now());
    }

    #[test]
    fn test_session_requires_valid_config() {
        let result = TranscriptSession::new(TranscriptionConfig::default());
        assert!(matches!(result, Err(TranscriptionError::MissingApiKey)));

        let session = TranscriptSession::new(TranscriptionConfig {
            api_key: Some("k".into()),
            language: "ar".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(session.config().language, "ar");
    }

    #[tokio::test]
    async fn test_language_passed_to_transcriber() {
        let mut session = TranscriptSession::new(TranscriptionConfig {
            use_local_model: true,
            language: "ur".into(),
            ..Default::default()
        })
        .unwrap();

        session.process_chunk(&EchoTranscriber, b"zakat", |_| {}).await;
        assert_eq!(session.transcript(), "[ur] zakat ");
    }

    #[test]
    fn test_config_validation() {
        let cloud = TranscriptionConfig::default();
        assert_eq!(cloud.language, "en");
        assert!(matches!(cloud.validate(), Err(TranscriptionError::MissingApiKey)));

        let keyed = TranscriptionConfig {
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert!(keyed.validate().is_ok());

        let local = TranscriptionConfig {
            use_local_model: true,
            ..Default::default()
        };
        assert!(local.validate().is_ok());
    }
}
