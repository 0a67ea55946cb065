// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIPOS COMPARTILHADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};

/// Tipo de URL (alias para String)
pub type Url = String;

/// Citação atribuída a uma fonte
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quote {
    /// Texto citado
    pub text: String,
    /// Nome da fonte (título do documento ou livro)
    pub source: String,
    /// URL da fonte, se conhecida
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
}

impl Quote {
    /// Formata no padrão usado nos prompts: `"texto" [fonte url]`
    pub fn to_prompt_line(&self) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => format!("\"{}\" [{} {}]", self.text, self.source, url),
            _ => format!("\"{}\" [{}]", self.text, self.source),
        }
    }
}

/// Imagem retornada pela busca de imagens
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageResult {
    /// URL da imagem
    pub url: Url,
    /// Título da imagem
    pub title: String,
    /// URL da miniatura
    pub thumbnail_url: Url,
    /// Página onde a imagem aparece
    pub context_url: Url,
}

/// Documento encontrado para uma sub-query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// Título do documento
    pub title: String,
    /// Conteúdo selecionado (snippet, meta description ou placeholder)
    pub content: String,
    /// Citações extraídas do conteúdo
    pub quotes: Vec<Quote>,
    /// URL do documento (vazia para respostas diretas)
    pub url: Url,
    /// Sub-query que encontrou o documento
    pub query: String,
    /// Imagens relacionadas à sub-query
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageResult>,
    /// Score heurístico de relevância (informativo, não reordena)
    #[serde(default)]
    pub relevance: u32,
}

/// Seção titulada de uma resposta gerada
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSection {
    /// Identificador estável dentro da resposta (`topic-1`, `topic-2`, ...)
    pub id: String,
    /// Título extraído do heading `###`
    pub title: String,
    /// Conteúdo com blocos de citação renderizados
    pub content: String,
}

/// Resultado de `generate_content`: texto bruto ou lista de seções.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GeneratedContent {
    /// Resposta sem headings `###`, devolvida sem modificação
    Text(String),
    /// Resposta organizada em seções
    Sections(Vec<TopicSection>),
}

impl GeneratedContent {
    /// Retorna as seções, se houver
    pub fn sections(&self) -> Option<&[TopicSection]> {
        match self {
            Self::Sections(sections) => Some(sections),
            Self::Text(_) => None,
        }
    }

    /// Retorna o texto bruto, se a resposta não foi seccionada
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Sections(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_prompt_line_with_url() {
        let quote = Quote {
            text: "Actions are by intentions".into(),
            source: "Sahih Bukhari 1".into(),
            url: Some("https://sunnah.com/bukhari:1".into()),
        };
        assert_eq!(
            quote.to_prompt_line(),
            "\"Actions are by intentions\" [Sahih Bukhari 1 https://sunnah.com/bukhari:1]"
        );
    }

    #[test]
    fn test_quote_prompt_line_without_url() {
        let quote = Quote {
            text: "text".into(),
            source: "Book".into(),
            url: Some(String::new()),
        };
        assert_eq!(quote.to_prompt_line(), "\"text\" [Book]");
    }

    #[test]
    fn test_generated_content_accessors() {
        let text = GeneratedContent::Text("plain".into());
        assert_eq!(text.text(), Some("plain"));
        assert!(text.sections().is_none());

        let sections = GeneratedContent::Sections(vec![TopicSection {
            id: "topic-1".into(),
            title: "Introduction".into(),
            content: "foo".into(),
        }]);
        assert_eq!(sections.sections().map(|s| s.len()), Some(1));
        assert!(sections.text().is_none());
    }

    #[test]
    fn test_generated_content_serialization() {
        let json = serde_json::to_value(GeneratedContent::Text("x".into())).unwrap();
        assert_eq!(json["kind"], "text");
        assert_eq!(json["value"], "x");
    }
}
