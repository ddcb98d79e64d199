//! # Tokenização por Espaços
//!
//! O etiquetador recebe a sentença já segmentada: cada sequência de caracteres
//! sem espaço em branco é um token. Não há separação de pontuação nem de clíticos,
//! então a saída fica alinhada 1:1 com os tokens que o chamador vê.
//!
//! Cada [`Token`] guarda seus offsets no texto original para que a interface web
//! consiga destacar as palavras sem reconstruir o texto.

use serde::{Deserialize, Serialize};

/// Um token extraído do texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto exato do token (sem normalização).
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

/// Fatias do texto separadas por espaço em branco (mesma regra de `str::split_whitespace`).
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Tokeniza preservando offsets.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                push_token(&mut tokens, text, s, i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        push_token(&mut tokens, text, s, text.len());
    }
    tokens
}

fn push_token(tokens: &mut Vec<Token>, text: &str, start: usize, end: usize) {
    let index = tokens.len();
    tokens.push(Token {
        text: text[start..end].to_string(),
        start,
        end,
        index,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenization() {
        let tokens = tokenize("the quick  brown\tfox");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["the", "quick", "brown", "fox"]);
        assert_eq!(tokens[2].start, 11);
        assert_eq!(tokens[2].end, 16);
        assert_eq!(tokens[3].index, 3);
    }

    #[test]
    fn test_offsets_point_into_original_text() {
        let text = "  São Paulo,\n é  grande. ";
        for token in tokenize(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_matches_split_whitespace() {
        let text = "\u{00A0}a\u{2003}b  c\r\nd ";
        let from_tokens: Vec<String> = tokenize(text).into_iter().map(|t| t.text).collect();
        assert_eq!(from_tokens, words(text));
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t\n ").is_empty());
        assert!(words("   ").is_empty());
    }
}
