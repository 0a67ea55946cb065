// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO DO ENGINE E DO RUNTIME
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Chaves dos provedores (busca e geração) e configuração do runtime Tokio.
// Todas as configurações podem ser definidas via .env
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fmt;

/// Endpoint padrão do Gemini
pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Configuração dos colaboradores externos.
///
/// Carregada uma vez no início do processo e somente leitura depois disso.
/// Valores ausentes viram strings vazias; a falta da chave do Gemini só é
/// reportada na primeira chamada de geração.
#[derive(Clone, Default)]
pub struct EngineConfig {
    /// Chave da Google Custom Search API
    pub google_api_key: String,
    /// ID do mecanismo de busca (cx)
    pub search_engine_id: String,
    /// Chave da API Gemini
    pub gemini_api_key: String,
    /// Endpoint `generateContent` do Gemini
    pub gemini_api_url: String,
    /// Ambiente de desenvolvimento (logs mais verbosos)
    pub is_dev: bool,
}

impl EngineConfig {
    /// Indica se a busca web pode ser usada
    pub fn has_search_credentials(&self) -> bool {
        !self.google_api_key.is_empty() && !self.search_engine_id.is_empty()
    }

    /// Loga a configuração carregada e avisa sobre credenciais ausentes.
    ///
    /// Chamado depois que o logger foi inicializado.
    pub fn log_summary(&self) {
        if !self.has_search_credentials() {
            log::warn!("⚠️ GOOGLE_API_KEY/SEARCH_ENGINE_ID ausentes: buscas web vão falhar");
        }
        if self.gemini_api_key.is_empty() {
            log::warn!("⚠️ GEMINI_API_KEY ausente: a geração vai falhar");
        }
        log::debug!("📦 {:?}", self);
    }

    /// Filtro padrão para o env_logger
    pub fn default_log_filter(&self) -> &'static str {
        if self.is_dev {
            "debug"
        } else {
            "info"
        }
    }
}

// As chaves nunca aparecem em logs.
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("google_api_key", &mask(&self.google_api_key))
            .field("search_engine_id", &self.search_engine_id)
            .field("gemini_api_key", &mask(&self.gemini_api_key))
            .field("gemini_api_url", &self.gemini_api_url)
            .field("is_dev", &self.is_dev)
            .finish()
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Carrega a configuração do engine a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `GOOGLE_API_KEY`: chave da Custom Search API
/// - `SEARCH_ENGINE_ID`: ID do mecanismo (cx)
/// - `GEMINI_API_KEY`: chave do Gemini
/// - `GEMINI_API_URL`: endpoint customizado (padrão: gemini-2.0-flash)
/// - `NODE_ENV` / `APP_ENV`: `development` ativa o modo dev
pub fn load_engine_config() -> EngineConfig {
    load_engine_config_from(|key| std::env::var(key).ok())
}

/// Mesma lógica de [`load_engine_config`], com a fonte de variáveis injetada.
pub fn load_engine_config_from<F>(get: F) -> EngineConfig
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| get(key).map(|v| v.trim().to_string()).unwrap_or_default();

    let gemini_api_url = match read("GEMINI_API_URL") {
        url if url.is_empty() => DEFAULT_GEMINI_API_URL.to_string(),
        url => url,
    };

    let is_dev = ["NODE_ENV", "APP_ENV"]
        .iter()
        .any(|key| read(key).eq_ignore_ascii_case("development"));

    EngineConfig {
        google_api_key: read("GOOGLE_API_KEY"),
        search_engine_id: read("SEARCH_ENGINE_ID"),
        gemini_api_key: read("GEMINI_API_KEY"),
        gemini_api_url,
        is_dev,
    }
}

/// Configuração do runtime Tokio.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Número de worker threads do Tokio.
    /// Se None, usa cálculo dinâmico: min(cpu_cores, max_threads).
    pub worker_threads: Option<usize>,

    /// Número máximo de threads (limite superior para cálculo dinâmico).
    /// Padrão: 4
    pub max_threads: usize,

    /// Nome das threads do runtime.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_threads: 4,
            thread_name: "plates-engine".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Calcula número efetivo de worker threads.
    pub fn effective_worker_threads(&self) -> usize {
        if let Some(threads) = self.worker_threads {
            threads
        } else {
            std::cmp::min(num_cpus::get(), self.max_threads)
        }
    }
}

/// Carrega configuração do runtime a partir das variáveis de ambiente.
///
/// - `TOKIO_THREADS`: número fixo de threads (opcional)
/// - `TOKIO_MAX_THREADS`: máximo de threads para cálculo dinâmico (padrão: 4)
pub fn load_runtime_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();

    if let Some(threads) = parse_positive("TOKIO_THREADS") {
        config.worker_threads = Some(threads);
        log::info!("📦 TOKIO_THREADS={} (fixo)", threads);
    }

    if let Some(max) = parse_positive("TOKIO_MAX_THREADS") {
        config.max_threads = max;
        log::info!("📦 TOKIO_MAX_THREADS={}", max);
    }

    config
}

fn parse_positive(key: &str) -> Option<usize> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

/// Cria o runtime Tokio com a configuração fornecida.
pub fn create_tokio_runtime(config: &RuntimeConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let worker_threads = config.effective_worker_threads();

    log::debug!("🚀 Criando runtime Tokio: {} workers", worker_threads);

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .thread_name(&config.thread_name)
        .enable_all()
        .build()
}
