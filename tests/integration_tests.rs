//! # Testes de Integração
//!
//! Fluxo completo `generate_content` com clientes mock:
//! - Classifier → Aggregator → geração → Organizer
//! - Falhas parciais de busca, erros fatais e ordem dos status

use plates_engine::aggregator::DIRECT_ANSWER_TITLE;
use plates_engine::llm::{GeminiClient, LlmError, MockLlmClient};
use plates_engine::search::{MockSearchClient, SearchItem};
use plates_engine::{EngineError, GeneratedContent, PlatesEngine};
use std::sync::{Arc, Mutex};

const QUESTION: &str = "What are the conditions of zakat and who must pay it?";
const ANSWER_MARKER: &str = "Begin Response:";

fn item(n: usize) -> SearchItem {
    SearchItem {
        title: format!("Fiqh of Zakat vol. {}", n),
        link: format!("https://zakat{}.example/fiqh", n),
        snippet: format!("Zakat is due on wealth above the nisab ({})", n),
        pagemap: None,
    }
}

/// LLM que pede busca, expande em duas sub-queries e responde `answer`
fn searching_llm(answer: &str) -> Arc<MockLlmClient> {
    Arc::new(
        MockLlmClient::new()
            .with_response("requires web search", "yes")
            .with_response("Convert this query", "- zakat conditions\n- who pays zakat")
            .with_response(ANSWER_MARKER, answer),
    )
}

fn populated_search() -> Arc<MockSearchClient> {
    Arc::new(
        MockSearchClient::new()
            .with_items(QUESTION, vec![item(1)])
            .with_items("zakat conditions", vec![item(2)])
            .with_items("who pays zakat", vec![item(3)]),
    )
}

fn status_recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink_log = log.clone();
    (log, move |s: &str| sink_log.lock().unwrap().push(s.to_string()))
}

// ============================================================================
// RESPOSTAS BEM-SUCEDIDAS
// ============================================================================

#[tokio::test]
async fn test_plain_answer_returned_unmodified() {
    let answer = "Zakat is obligatory on every adult Muslim whose wealth exceeds the nisab.\n\n> Take from their wealth a charity";
    let engine = PlatesEngine::new(searching_llm(answer), populated_search());
    let (_, sink) = status_recorder();

    let content = engine.generate_content(QUESTION, &sink).await.unwrap();

    assert_eq!(content, GeneratedContent::Text(answer.to_string()));
}

#[tokio::test]
async fn test_sectioned_answer_with_duplicate_titles() {
    let answer = "### Introduction\nZakat is a pillar.\n### Conditions\n> Wealth must reach the nisab\n[Fiqh al-Zakah]\n### introduction\nRepeated.";
    let engine = PlatesEngine::new(searching_llm(answer), populated_search());
    let (_, sink) = status_recorder();

    let content = engine.generate_content(QUESTION, &sink).await.unwrap();
    let sections = content.sections().expect("sections");

    let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Introduction", "Conditions"]);
    assert_eq!(sections[0].id, "topic-1");
    assert_eq!(sections[1].id, "topic-2");
    assert_eq!(
        sections[1].content,
        r#"<div class="quote-container"><div class="quote-source">Fiqh al-Zakah</div><div class="quote-text">Wealth must reach the nisab</div></div>"#
    );
}

#[tokio::test]
async fn test_failed_subquery_among_three() {
    let llm = searching_llm("Answer text");
    let search = Arc::new(
        MockSearchClient::new()
            .with_items(QUESTION, vec![item(1)])
            .with_failure("zakat conditions", 500)
            .with_items("who pays zakat", vec![item(3)]),
    );
    let engine = PlatesEngine::new(llm.clone(), search.clone());
    let (log, sink) = status_recorder();

    let report = engine.generate_report(QUESTION, &sink).await.unwrap();

    let urls: Vec<&str> = report.sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://zakat1.example/fiqh", "https://zakat3.example/fiqh"]
    );
    assert_eq!(search.web_queries().len(), 3);

    let statuses = log.lock().unwrap().clone();
    assert_eq!(
        statuses,
        vec![
            "Searching for relevant information".to_string(),
            format!("Searching for: \"{}\"", QUESTION),
            "Searching for: \"zakat conditions\"".to_string(),
            "Searching for: \"who pays zakat\"".to_string(),
            "Preparing information from 2 sources...".to_string(),
            "Formulating detailed response...".to_string(),
        ]
    );

    // o prompt final carrega as duas fontes e suas citações
    let final_prompt = llm
        .calls()
        .into_iter()
        .find(|p| p.contains(ANSWER_MARKER))
        .expect("final prompt");
    assert!(final_prompt.contains("SOURCE: \"Fiqh of Zakat vol. 1\" (https://zakat1.example/fiqh)"));
    assert!(final_prompt.contains("SOURCE: \"Fiqh of Zakat vol. 3\" (https://zakat3.example/fiqh)"));
    assert!(final_prompt.contains("QUOTES FROM THIS SOURCE:"));
    assert!(!final_prompt.contains("vol. 2"));
}

#[tokio::test]
async fn test_direct_answer_path() {
    let llm = Arc::new(
        MockLlmClient::new()
            .with_response("requires web search", "no")
            .with_response("concise explanation", "Salah is the ritual prayer.")
            .with_response(ANSWER_MARKER, "Salah is performed five times a day."),
    );
    let search = Arc::new(MockSearchClient::new());
    let engine = PlatesEngine::new(llm.clone(), search.clone());
    let (_, sink) = status_recorder();

    let report = engine.generate_report("what is salah", &sink).await.unwrap();

    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.sources[0].title, DIRECT_ANSWER_TITLE);
    assert!(search.web_queries().is_empty());
    assert_eq!(
        report.content.text(),
        Some("Salah is performed five times a day.")
    );
}

#[tokio::test]
async fn test_multi_topic_prompt_lists_topics() {
    let question = "What is the ruling on music? Also, what about singing?";
    let llm = Arc::new(
        MockLlmClient::new()
            .with_response("requires web search", "yes")
            .with_response("Convert this query", "- music ruling")
            .with_response(ANSWER_MARKER, "### Music\nText\n### Singing\nText"),
    );
    let search = Arc::new(MockSearchClient::new().with_items("music ruling", vec![item(1)]));
    let engine = PlatesEngine::new(llm.clone(), search);
    let (_, sink) = status_recorder();

    let content = engine.generate_content(question, &sink).await.unwrap();
    assert_eq!(content.sections().map(|s| s.len()), Some(2));

    let final_prompt = llm
        .calls()
        .into_iter()
        .find(|p| p.contains(ANSWER_MARKER))
        .expect("final prompt");
    assert!(final_prompt.contains("Detected topics:"));
    assert!(final_prompt.contains("- What is the ruling on music?"));
}

// ============================================================================
// ERROS FATAIS
// ============================================================================

#[tokio::test]
async fn test_empty_input_rejected_before_any_call() {
    let llm = searching_llm("unused");
    let search = populated_search();
    let engine = PlatesEngine::new(llm.clone(), search.clone());
    let (log, sink) = status_recorder();

    for input in ["", "   \n\t"] {
        let result = engine.generate_content(input, &sink).await;
        assert!(matches!(result, Err(EngineError::EmptyInput)));
    }

    assert_eq!(llm.call_count(), 0);
    assert!(search.web_queries().is_empty());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_generation_key_fails_before_search() {
    let llm = Arc::new(GeminiClient::new(String::new(), "http://127.0.0.1:9".into()));
    let search = populated_search();
    let engine = PlatesEngine::new(llm, search.clone());
    let (log, sink) = status_recorder();

    let result = engine.generate_content(QUESTION, &sink).await;

    assert!(matches!(
        result,
        Err(EngineError::Generation(LlmError::MissingApiKey))
    ));
    assert!(search.web_queries().is_empty());
    assert!(log.lock().unwrap().is_empty());

    // sem resultados de busca o erro de chave continua visível
    let empty_engine = PlatesEngine::new(
        Arc::new(GeminiClient::new(String::new(), "http://127.0.0.1:9".into())),
        Arc::new(MockSearchClient::new()),
    );
    let result = empty_engine.generate_content(QUESTION, &sink).await;
    assert!(matches!(
        result,
        Err(EngineError::Generation(LlmError::MissingApiKey))
    ));
}

#[tokio::test]
async fn test_no_results() {
    let llm = searching_llm("unused");
    let engine = PlatesEngine::new(llm.clone(), Arc::new(MockSearchClient::new()));
    let (log, sink) = status_recorder();

    let result = engine.generate_content(QUESTION, &sink).await;

    assert!(matches!(result, Err(EngineError::NoResults)));
    assert_eq!(result.unwrap_err().to_string(), "No relevant information found");
    assert!(!llm.calls().iter().any(|p| p.contains(ANSWER_MARKER)));
    assert!(!log
        .lock()
        .unwrap()
        .iter()
        .any(|s| s.starts_with("Preparing information")));
}

#[tokio::test]
async fn test_empty_response() {
    let engine = PlatesEngine::new(searching_llm("  \n "), populated_search());
    let (_, sink) = status_recorder();

    let result = engine.generate_content(QUESTION, &sink).await;
    assert!(matches!(result, Err(EngineError::EmptyResponse)));
}

#[tokio::test]
async fn test_generation_failure_propagates() {
    let llm = Arc::new(
        MockLlmClient::new()
            .with_response("requires web search", "yes")
            .with_response("Convert this query", "- zakat conditions")
            .with_error(ANSWER_MARKER, "quota exceeded"),
    );
    let engine = PlatesEngine::new(llm, populated_search());
    let (_, sink) = status_recorder();

    let result = engine.generate_content(QUESTION, &sink).await;

    match result {
        Err(EngineError::Generation(e)) => assert!(e.to_string().contains("quota exceeded")),
        other => panic!("expected generation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_headings_without_titles_fail_to_organize() {
    let engine = PlatesEngine::new(searching_llm("###   \nbody only"), populated_search());
    let (_, sink) = status_recorder();

    let result = engine.generate_content(QUESTION, &sink).await;
    assert!(matches!(result, Err(EngineError::OrganizeFailed)));
}
