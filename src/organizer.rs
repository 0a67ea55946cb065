//! # Response Organizer
//!
//! Divide uma resposta gerada em seções tituladas (headings `### `),
//! descarta títulos repetidos e converte as notações de citação em blocos
//! de apresentação.
//!
//! ## Notações de citação
//! - `<quote>texto<source>fonte</source></quote>`
//! - linhas iniciadas por `>` seguidas opcionalmente de uma linha `[fonte]`
//!
//! Marcação malformada (ex.: `<quote>` sem fechamento) permanece como texto literal.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::types::TopicSection;
use crate::utils::normalize_title;

/// Prefixo de heading de nível 3
pub const HEADING_PREFIX: &str = "### ";

static LEADING_STRAY_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]\s+").expect("valid regex"));
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static TAGGED_QUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<quote>(.*?)<source>(.*?)</source></quote>").expect("valid regex")
});
static SOURCE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([^\]]+)\]\s*$").expect("valid regex"));

/// Organiza o conteúdo em seções, na ordem do documento.
///
/// Conteúdo sem nenhum heading `###` resulta em lista vazia; o chamador
/// deve tratar o texto como um bloco único.
pub fn organize_topics(content: &str) -> Vec<TopicSection> {
    log::debug!("[PlatesEngine] Organizando tópicos ({} chars)", content.len());

    if content.trim().is_empty() {
        return Vec::new();
    }

    let normalized = normalize(content);
    let raw_sections = split_sections(&normalized);
    log::debug!("[PlatesEngine] {} seções brutas", raw_sections.len());

    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut sections = Vec::new();

    for raw in raw_sections {
        let Some((title, body)) = parse_section(raw) else {
            log::debug!("[PlatesEngine] Seção sem heading, ignorando");
            continue;
        };
        if title.is_empty() {
            log::debug!("[PlatesEngine] Heading vazio, ignorando");
            continue;
        }
        if !seen_titles.insert(normalize_title(title)) {
            log::info!("[PlatesEngine] Título duplicado: {}, ignorando", title);
            continue;
        }

        sections.push(TopicSection {
            id: format!("topic-{}", sections.len() + 1),
            title: title.to_string(),
            content: render_quotes(body),
        });
    }

    sections
}

/// Conta as linhas que abrem uma seção `### `
pub fn count_headings(text: &str) -> usize {
    text.lines().filter(|line| is_heading_line(line)).count()
}

/// Trim, remove um caractere solto no início e colapsa 3+ quebras de linha
fn normalize(content: &str) -> String {
    let trimmed = content.trim();
    let stripped = LEADING_STRAY_CHAR.replace(trimmed, "");
    EXCESS_NEWLINES.replace_all(&stripped, "\n\n").into_owned()
}

fn is_heading_line(line: &str) -> bool {
    line.trim_end_matches('\n')
        .strip_prefix(HEADING_PREFIX)
        .map_or(false, |rest| !rest.is_empty())
}

/// Corta o texto antes de cada linha de heading; o heading fica com a seção seguinte
fn split_sections(text: &str) -> Vec<&str> {
    let mut starts = vec![0];
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if offset > 0 && is_heading_line(line) {
            starts.push(offset);
        }
        offset += line.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| match starts.get(i + 1) {
            // descarta o '\n' que antecede o próximo heading
            Some(&next) => &text[start..next - 1],
            None => &text[start..],
        })
        .collect()
}

/// Separa `(título, corpo)` de uma seção que começa com heading
fn parse_section(section: &str) -> Option<(&str, &str)> {
    let rest = section.strip_prefix(HEADING_PREFIX)?;
    let (title, body) = rest.split_once('\n').unwrap_or((rest, ""));
    Some((title.trim(), body.trim()))
}

/// Bloco de apresentação de uma citação
pub fn quote_markup(source: Option<&str>, text: &str) -> String {
    let mut html = String::from(r#"<div class="quote-container">"#);
    if let Some(source) = source.filter(|s| !s.is_empty()) {
        html.push_str(&format!(r#"<div class="quote-source">{}</div>"#, source));
    }
    html.push_str(&format!(r#"<div class="quote-text">{}</div></div>"#, text));
    html
}

/// Converte as duas notações de citação em blocos de apresentação
pub fn render_quotes(body: &str) -> String {
    let tagged = TAGGED_QUOTE.replace_all(body, |caps: &Captures<'_>| {
        quote_markup(Some(caps[2].trim()), caps[1].trim())
    });
    render_block_quotes(&tagged)
}

fn render_block_quotes(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        if !lines[i].starts_with('>') {
            out.push(lines[i].to_string());
            i += 1;
            continue;
        }

        let mut quoted = Vec::new();
        while i < lines.len() && lines[i].starts_with('>') {
            quoted.push(lines[i][1..].trim_start());
            i += 1;
        }

        let source = lines
            .get(i)
            .and_then(|line| SOURCE_LINE.captures(line))
            .map(|caps| caps[1].trim().to_string());
        if source.is_some() {
            i += 1;
        }

        let quote_text = quoted.join("\n");
        out.push(quote_markup(source.as_deref(), quote_text.trim()));
    }

    out.join("\n")
}
