// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DE BUSCA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait e implementações para busca web e de imagens.
// Implementação real: Google Custom Search JSON API. Mock scriptado para testes.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::EngineConfig;
use crate::types::ImageResult;
use crate::utils::significant_words;

/// Endpoint da Custom Search JSON API
pub const GOOGLE_CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Erros do cliente de busca
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search error: HTTP {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid search response: {0}")]
    Parse(String),
}

/// Bloco `pagemap` de um item (apenas `metatags` é usado)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMap {
    #[serde(default)]
    pub metatags: Vec<HashMap<String, serde_json::Value>>,
}

/// Item bruto de resultado web
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    pub pagemap: Option<PageMap>,
}

impl SearchItem {
    /// `og:description` (ou `description`) do primeiro bloco de metatags
    pub fn meta_description(&self) -> Option<&str> {
        let meta = self.pagemap.as_ref()?.metatags.first()?;
        ["og:description", "description"]
            .iter()
            .filter_map(|key| meta.get(*key).and_then(|v| v.as_str()))
            .find(|v| !v.is_empty())
    }
}

#[derive(Deserialize)]
struct CseResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct ImageItem {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    image: Option<ImageMeta>,
}

#[derive(Deserialize)]
struct ImageMeta {
    #[serde(rename = "thumbnailLink", default)]
    thumbnail_link: String,
    #[serde(rename = "contextLink", default)]
    context_link: String,
}

impl From<ImageItem> for ImageResult {
    fn from(item: ImageItem) -> Self {
        let (thumbnail_url, context_url) = item
            .image
            .map(|m| (m.thumbnail_link, m.context_link))
            .unwrap_or_default();
        ImageResult {
            url: item.link,
            title: item.title,
            thumbnail_url,
            context_url,
        }
    }
}

/// Trait principal para clientes de busca
///
/// Falhas são sinalizadas por status HTTP não-sucesso.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Busca web; itens na ordem do mecanismo
    async fn search_web(&self, query: &str) -> Result<Vec<SearchItem>, SearchError>;

    /// Busca de imagens (até `num` itens)
    async fn search_images(&self, query: &str, num: u32) -> Result<Vec<ImageResult>, SearchError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO GOOGLE CUSTOM SEARCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente para a Google Custom Search JSON API
pub struct GoogleSearchClient {
    api_key: String,
    search_engine_id: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GoogleSearchClient {
    /// Cria um cliente com chave e ID do mecanismo
    pub fn new(api_key: String, search_engine_id: String) -> Self {
        Self {
            api_key,
            search_engine_id,
            endpoint: GOOGLE_CSE_ENDPOINT.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Cria um cliente a partir da configuração carregada do ambiente
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.google_api_key.clone(), config.search_engine_id.clone())
    }

    /// Substitui o endpoint (proxies, testes locais)
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_url(&self, query: &str, extra: &str) -> String {
        format!(
            "{}?key={}&cx={}&q={}{}",
            self.endpoint,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.search_engine_id),
            urlencoding::encode(query),
            extra
        )
    }

    async fn fetch<T>(&self, url: &str) -> Result<Vec<T>, SearchError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http {
                status: status.as_u16(),
            });
        }

        let body: CseResponse<T> = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;
        Ok(body.items)
    }
}

#[async_trait]
impl SearchClient for GoogleSearchClient {
    async fn search_web(&self, query: &str) -> Result<Vec<SearchItem>, SearchError> {
        let url = self.build_url(query, "");
        self.fetch::<SearchItem>(&url).await
    }

    async fn search_images(&self, query: &str, num: u32) -> Result<Vec<ImageResult>, SearchError> {
        let url = self.build_url(query, &format!("&searchType=image&num={}", num));
        let items = self.fetch::<ImageItem>(&url).await?;
        Ok(items
            .into_iter()
            .take(num as usize)
            .map(ImageResult::from)
            .collect())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente mock scriptado por query exata.
///
/// Queries sem script retornam lista vazia. Cada busca web é registrada.
#[derive(Debug, Default)]
pub struct MockSearchClient {
    web: HashMap<String, Result<Vec<SearchItem>, u16>>,
    images: HashMap<String, Vec<ImageResult>>,
    web_calls: Mutex<Vec<String>>,
}

impl MockSearchClient {
    /// Mock sem nenhum script
    pub fn new() -> Self {
        Self::default()
    }

    /// Resultados web para uma query
    pub fn with_items(mut self, query: &str, items: Vec<SearchItem>) -> Self {
        self.web.insert(query.into(), Ok(items));
        self
    }

    /// Busca web falha com o status HTTP informado
    pub fn with_failure(mut self, query: &str, status: u16) -> Self {
        self.web.insert(query.into(), Err(status));
        self
    }

    /// Imagens para uma query
    pub fn with_images(mut self, query: &str, images: Vec<ImageResult>) -> Self {
        self.images.insert(query.into(), images);
        self
    }

    /// Queries web recebidas, em ordem
    pub fn web_queries(&self) -> Vec<String> {
        self.web_calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search_web(&self, query: &str) -> Result<Vec<SearchItem>, SearchError> {
        if let Ok(mut calls) = self.web_calls.lock() {
            calls.push(query.to_string());
        }
        match self.web.get(query) {
            Some(Ok(items)) => Ok(items.clone()),
            Some(Err(status)) => Err(SearchError::Http { status: *status }),
            None => Ok(vec![]),
        }
    }

    async fn search_images(&self, query: &str, num: u32) -> Result<Vec<ImageResult>, SearchError> {
        Ok(self
            .images
            .get(query)
            .map(|images| images.iter().take(num as usize).cloned().collect())
            .unwrap_or_default())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UTILITÁRIOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Extrai hostname de uma URL
pub fn extract_hostname(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
}

/// Domínios que recebem boost de autoridade
const AUTHORITATIVE_DOMAINS: &[&str] = &[".gov", ".edu", "wikipedia", "researchgate"];

/// Score heurístico de relevância de um item para uma query.
///
/// - +3 por palavra significativa da query presente no título
/// - +10 se o título contém a query inteira
/// - +1 por palavra significativa presente no snippet
/// - +2 por domínio autoritativo presente no link
pub fn relevance_score(item: &SearchItem, query: &str) -> u32 {
    let words = significant_words(query);
    let mut score = 0;

    let title = item.title.to_lowercase();
    if !title.is_empty() {
        score += 3 * words.iter().filter(|w| title.contains(w.as_str())).count() as u32;
        if title.contains(&query.to_lowercase()) {
            score += 10;
        }
    }

    let snippet = item.snippet.to_lowercase();
    score += words.iter().filter(|w| snippet.contains(w.as_str())).count() as u32;

    let link = item.link.to_lowercase();
    score += 2 * AUTHORITATIVE_DOMAINS
        .iter()
        .filter(|d| link.contains(*d))
        .count() as u32;

    score
}
