//! # Result Aggregator
//!
//! Executa as sub-queries em sequência, deduplica documentos por URL e
//! empacota cada documento como [`SearchResult`] com uma citação.
//!
//! ## Limites
//! - [`MAX_TOTAL_RESULTS`] resultados no total
//! - [`MAX_RESULTS_PER_QUERY`] resultados por sub-query
//! - URLs únicas em todo o conjunto
//!
//! Sub-queries rodam estritamente em sequência, então a ordem dos status e a
//! checagem dos limites são determinísticas. Dentro de uma sub-query, a busca
//! de imagens e a busca web rodam em paralelo.

use std::collections::HashSet;

use crate::classifier::{needs_web_search, optimize_query};
use crate::llm::LlmClient;
use crate::search::{extract_hostname, relevance_score, SearchClient, SearchItem};
use crate::types::{ImageResult, Quote, SearchResult};
use crate::utils::{char_len, excerpt, ActionTimer};

/// Máximo de resultados agregados por chamada
pub const MAX_TOTAL_RESULTS: usize = 6;

/// Máximo de resultados contribuídos por uma sub-query
pub const MAX_RESULTS_PER_QUERY: usize = 2;

/// Tamanho máximo (em caracteres) do excerpt de uma citação
pub const QUOTE_EXCERPT_CHARS: usize = 200;

/// Imagens pedidas por sub-query
pub const IMAGES_PER_QUERY: u32 = 3;

/// Título do resultado sintético quando a busca é dispensada
pub const DIRECT_ANSWER_TITLE: &str = "Direct Answer";

/// Sink de status: callback síncrono, nunca aguardado
pub type StatusSink = dyn Fn(&str) + Send + Sync;

/// Busca e agrega conteúdo para a query.
///
/// Nunca falha: sub-queries com erro são puladas e logadas; uma falha na
/// resposta direta resulta em lista vazia.
pub async fn search_and_fetch_content(
    llm: &dyn LlmClient,
    search: &dyn SearchClient,
    query: &str,
    status: &StatusSink,
) -> Vec<SearchResult> {
    if !needs_web_search(llm, query).await {
        return direct_answer(llm, query).await;
    }

    let sub_queries = optimize_query(llm, query).await;
    let timer = ActionTimer::start("Busca");

    let mut results: Vec<SearchResult> = Vec::new();
    let mut seen_urls: HashSet<String> = HashSet::new();

    for sub_query in &sub_queries {
        status(&format!("Searching for: \"{}\"", sub_query));

        // Defensivo: com MAX_SUB_QUERIES * MAX_RESULTS_PER_QUERY <= MAX_TOTAL_RESULTS
        // o limite total só dispara se essas constantes mudarem.
        if results.len() >= MAX_TOTAL_RESULTS {
            break;
        }

        let (images, web) = futures::join!(
            search.search_images(sub_query, IMAGES_PER_QUERY),
            search.search_web(sub_query)
        );

        let items = match web {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                log::debug!("🔍 Nenhum resultado para \"{}\"", sub_query);
                continue;
            }
            Err(e) => {
                log::warn!("❌ Busca falhou para \"{}\": {}", sub_query, e);
                continue;
            }
        };

        let images = images.unwrap_or_else(|e| {
            log::warn!("🖼️ Busca de imagens falhou para \"{}\": {}", sub_query, e);
            Vec::new()
        });

        let mut added_for_query = 0;
        for item in &items {
            if added_for_query >= MAX_RESULTS_PER_QUERY || results.len() >= MAX_TOTAL_RESULTS {
                break;
            }
            if !seen_urls.insert(item.link.clone()) {
                continue;
            }

            let result = build_result(item, sub_query, &images);
            log::info!(
                "📄 Resultado adicionado: {} [{}] ({} imagens)",
                result.title,
                extract_hostname(&result.url).unwrap_or_default(),
                result.images.len()
            );
            results.push(result);
            added_for_query += 1;
        }
    }

    timer.stop_and_log();

    let quote_count: usize = results.iter().map(|r| r.quotes.len()).sum();
    log::info!(
        "📚 {} citações de {} fontes ({} sub-queries)",
        quote_count,
        results.len(),
        sub_queries.len()
    );

    if !results.is_empty() {
        status(&format!(
            "Preparing information from {} sources...",
            results.len()
        ));
    }

    results
}

/// Resposta gerada diretamente, sem busca
async fn direct_answer(llm: &dyn LlmClient, query: &str) -> Vec<SearchResult> {
    let prompt = format!("Please provide a clear, concise explanation of: {}", query);

    match llm.generate(&prompt, 2048, 0.3).await {
        Ok(answer) => vec![SearchResult {
            title: DIRECT_ANSWER_TITLE.to_string(),
            content: answer,
            query: query.to_string(),
            ..Default::default()
        }],
        Err(e) => {
            log::error!("💥 Resposta direta falhou: {}", e);
            Vec::new()
        }
    }
}

/// Melhor conteúdo disponível: snippet, meta description mais longa ou placeholder
pub fn select_content(item: &SearchItem) -> String {
    let mut content = item.snippet.as_str();
    if let Some(description) = item.meta_description() {
        if char_len(description) > char_len(content) {
            content = description;
        }
    }

    if content.is_empty() {
        format!("Information from {}", item.title)
    } else {
        content.to_string()
    }
}

fn build_result(item: &SearchItem, sub_query: &str, images: &[ImageResult]) -> SearchResult {
    let content = select_content(item);
    let quote = Quote {
        text: excerpt(&content, QUOTE_EXCERPT_CHARS),
        source: item.title.clone(),
        url: Some(item.link.clone()),
    };

    SearchResult {
        title: item.title.clone(),
        relevance: relevance_score(item, sub_query),
        content,
        quotes: vec![quote],
        url: item.link.clone(),
        query: sub_query.to_string(),
        images: images.to_vec(),
    }
}
