// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PLATES ENGINE CLI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Executa o pipeline completo para uma pergunta.
//
// Uso:
//   plates-engine-cli "What is the ruling on fasting while travelling?"
//   plates-engine-cli --json "pergunta"   (saída JSON: conteúdo + fontes)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use plates_engine::llm::{GeminiClient, LlmClient};
use plates_engine::search::{GoogleSearchClient, SearchClient};
use plates_engine::{
    create_tokio_runtime, load_engine_config, load_runtime_config, EngineReport,
    GeneratedContent, PlatesEngine,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Tenta carregar o arquivo .env de múltiplos locais possíveis
fn load_dotenv() {
    let possible_paths = [PathBuf::from(".env"), PathBuf::from("../.env")];

    for path in &possible_paths {
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => {
                    eprintln!(
                        "✓ Carregado .env de: {:?}",
                        path.canonicalize().unwrap_or(path.clone())
                    );
                    return;
                }
                Err(e) => {
                    eprintln!("⚠ Erro ao carregar {:?}: {}", path, e);
                }
            }
        }
    }

    eprintln!("⚠ Nenhum arquivo .env encontrado. Certifique-se de que GEMINI_API_KEY, GOOGLE_API_KEY e SEARCH_ENGINE_ID estão definidas.");
}

fn print_usage(program: &str) {
    eprintln!("Plates Engine CLI v{}", plates_engine::VERSION);
    eprintln!();
    eprintln!("Uso: {} [--json] <pergunta>", program);
    eprintln!();
    eprintln!("Opções:");
    eprintln!("  --json   Imprime conteúdo e fontes em JSON");
    eprintln!();
    eprintln!("Exemplos:");
    eprintln!("  {} \"What is the ruling on fasting while travelling?\"", program);
    eprintln!("  {} --json \"What is zakat? Also, who must pay it?\"", program);
}

fn main() {
    // Carregar .env PRIMEIRO, antes de qualquer coisa
    load_dotenv();

    let config = load_engine_config();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.default_log_filter()),
    )
    .init();
    config.log_summary();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("plates-engine-cli");

    let (json, question) = match args.get(1).map(String::as_str) {
        Some("--json") => (true, args[2..].join(" ")),
        _ => (false, args.get(1..).map(|a| a.join(" ")).unwrap_or_default()),
    };

    if question.trim().is_empty() {
        print_usage(program);
        std::process::exit(1);
    }

    if let Err(e) = run(config, &question, json) {
        eprintln!("✗ Erro: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: plates_engine::EngineConfig, question: &str, json: bool) -> anyhow::Result<()> {
    let runtime = create_tokio_runtime(&load_runtime_config())?;

    let llm: Arc<dyn LlmClient> = Arc::new(GeminiClient::from_config(&config));
    let search: Arc<dyn SearchClient> = Arc::new(GoogleSearchClient::from_config(&config));
    let engine = PlatesEngine::new(llm, search);

    let status = |message: &str| eprintln!("… {}", message);
    let report = runtime.block_on(engine.generate_report(question, &status))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(question, &report);
    }

    Ok(())
}

fn print_report(question: &str, report: &EngineReport) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" {}", question);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    match &report.content {
        GeneratedContent::Text(text) => println!("{}", text),
        GeneratedContent::Sections(sections) => {
            for section in sections {
                println!("## {}", section.title);
                println!();
                println!("{}", section.content);
                println!();
            }
        }
    }

    if !report.sources.is_empty() {
        println!();
        println!("Fontes:");
        for (i, source) in report.sources.iter().enumerate() {
            if source.url.is_empty() {
                println!("  {}. {}", i + 1, source.title);
            } else {
                println!(
                    "  {}. {} - {} (relevância: {})",
                    i + 1,
                    source.title,
                    source.url,
                    source.relevance
                );
            }
        }
    }
}
