//! # Query Classifier
//!
//! Decide se uma pergunta precisa de busca web, detecta perguntas com
//! múltiplos tópicos e expande a pergunta em sub-queries de busca.
//!
//! Nenhuma função deste módulo propaga erro: falhas do LLM degradam para um
//! default seguro (assumir que a busca é necessária, usar a query original).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::llm::LlmClient;
use crate::utils::char_len;

/// Queries abaixo deste tamanho (sem " and " nem "?") não são reformuladas
pub const SIMPLE_QUERY_MAX_CHARS: usize = 50;

/// Máximo de sub-queries retornadas por [`optimize_query`] (original incluída)
pub const MAX_SUB_QUERIES: usize = 3;

/// Sinais estruturais de pergunta com múltiplos tópicos
static MULTI_TOPIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d+\s*[.)]\s*\w+",                // itens numerados
        r"[-•*]\s*\w+",                     // bullets
        r"\?.*\?",                          // múltiplos "?"
        r"(?i)\?.+and.+\?",                 // "and" entre perguntas
        r"(?i)what about|also|additionally", // indicadores de pergunta adicional
        r"\?\s+[A-Z]",                      // nova frase após "?"
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+[.)]\s*[^.?!]+[.?!]").expect("valid regex"));
static BULLET_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-•*]\s*[^.?!]+[.?!]").expect("valid regex"));
static QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+\?").expect("valid regex"));
static CONJUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:and|vs|versus)\s+").expect("valid regex"));

/// Pergunta ao LLM se a query precisa de busca web.
///
/// Qualquer falha do colaborador resulta em `true`.
pub async fn needs_web_search(llm: &dyn LlmClient, query: &str) -> bool {
    let prompt = format!(
        "Analyze this query and determine if it requires web search for accurate answers. Reply with ONLY \"yes\" or \"no\":\n\"{}\"",
        query
    );

    match llm.generate(&prompt, 1024, 0.1).await {
        Ok(decision) => {
            let needed = decision.trim().to_lowercase() == "yes";
            log::debug!("🔎 Busca necessária para \"{}\": {}", query, needed);
            needed
        }
        Err(e) => {
            log::warn!("⚠️ Falha ao decidir necessidade de busca ({}), assumindo que sim", e);
            true
        }
    }
}

/// Detecta se a query contém múltiplas perguntas/tópicos.
///
/// Casamento puro de padrões sobre o texto, sem chamada ao LLM.
pub fn detect_multi_topic_query(query: &str) -> bool {
    MULTI_TOPIC_PATTERNS.iter().any(|p| p.is_match(query))
}

/// Query curta e simples que dispensa reformulação
pub fn is_simple_query(query: &str) -> bool {
    char_len(query) < SIMPLE_QUERY_MAX_CHARS && !query.contains(" and ") && !query.contains('?')
}

/// Expande a query em até [`MAX_SUB_QUERIES`] sub-queries, a original primeiro.
///
/// Queries simples retornam `[query]` sem chamar o LLM.
pub async fn optimize_query(llm: &dyn LlmClient, query: &str) -> Vec<String> {
    if is_simple_query(query) {
        return vec![query.to_string()];
    }

    let prompt = format!(
        "Convert this query into 2 short, focused search terms (max 5 words each): \"{}\". Output only the terms, one per line starting with -.",
        query
    );

    match llm.generate(&prompt, 1024, 0.3).await {
        Ok(output) => {
            let mut queries = vec![query.to_string()];
            queries.extend(parse_dash_lines(&output));
            let queries = dedup_preserving_order(queries, MAX_SUB_QUERIES);
            log::info!("🔄 Queries otimizadas: {:?}", queries);
            queries
        }
        Err(e) => {
            log::warn!("⚠️ Otimização de query falhou ({}), usando original", e);
            vec![query.to_string()]
        }
    }
}

/// Linhas que começam com "-", sem o marcador
fn parse_dash_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-'))
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

fn dedup_preserving_order(queries: Vec<String>, limit: usize) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(limit);
    for q in queries {
        if unique.len() == limit {
            break;
        }
        if !unique.contains(&q) {
            unique.push(q);
        }
    }
    unique
}

/// Quebra uma pergunta complexa em tópicos individuais.
///
/// Ordem de tentativa: itens numerados, bullets, perguntas separadas e, por
/// fim, partes unidas por "and"/"vs"/"versus". Sem tópicos detectáveis,
/// retorna `[query]`.
pub fn break_into_single_topics(query: &str) -> Vec<String> {
    let matches = |re: &Regex| -> Vec<String> {
        re.find_iter(query)
            .map(|m| m.as_str().trim().to_string())
            .collect()
    };

    for re in [&*NUMBERED_ITEM, &*BULLET_ITEM, &*QUESTION] {
        let topics = matches(re);
        if topics.len() > 1 {
            return topics;
        }
    }

    if query.contains(" and ") || query.contains(" vs ") || query.contains(" versus ") {
        let parts: Vec<String> = CONJUNCTION
            .split(query)
            .map(|p| p.trim().to_string())
            .filter(|p| char_len(p) > 10)
            .collect();
        if parts.len() > 1 {
            return parts;
        }
    }

    vec![query.to_string()]
}
