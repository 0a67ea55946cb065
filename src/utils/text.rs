// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TEXT UTILITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários para processamento de texto:
// - Excerpts com limite de caracteres
// - Normalização de whitespace
// - Normalização de títulos
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Marcador anexado a excerpts truncados
pub const ELLIPSIS: &str = "...";

/// Número de caracteres (não bytes) de um texto
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Retorna os primeiros `max_chars` caracteres, respeitando boundaries UTF-8
pub fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Excerpt de até `max_chars` caracteres, com `...` quando o texto foi cortado.
///
/// O corte é aparado antes do marcador, então o resultado nunca passa de
/// `max_chars + 3` caracteres.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let head = take_chars(text, max_chars).trim();
    if char_len(text) > max_chars {
        format!("{}{}", head, ELLIPSIS)
    } else {
        head.to_string()
    }
}

/// Colapsa qualquer sequência de whitespace (inclusive quebras de linha) em um espaço
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Chave de unicidade de um título: minúsculas e whitespace colapsado
pub fn normalize_title(title: &str) -> String {
    collapse_whitespace(title).to_lowercase()
}

/// Palavras de uma query com mais de 3 caracteres, em minúsculas
pub fn significant_words(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|w| char_len(w) > 3)
        .map(|w| w.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_chars_multibyte() {
        assert_eq!(take_chars("السلام عليكم", 6), "السلام");
        assert_eq!(take_chars("abc", 10), "abc");
    }

    #[test]
    fn test_excerpt_short_text_untouched() {
        assert_eq!(excerpt("  short text ", 200), "short text");
    }

    #[test]
    fn test_excerpt_truncates_with_ellipsis() {
        let text = "a".repeat(250);
        let result = excerpt(&text, 200);
        assert_eq!(char_len(&result), 203);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_excerpt_exact_limit_has_no_ellipsis() {
        let text = "b".repeat(200);
        assert_eq!(excerpt(&text, 200), text);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("Hello\n\n  world\t test"), "Hello world test");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  The   Ruling "), "the ruling");
    }

    #[test]
    fn test_significant_words() {
        assert_eq!(significant_words("the rules of fasting"), vec!["rules", "fasting"]);
    }
}
