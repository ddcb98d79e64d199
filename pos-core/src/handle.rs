//! # Handle do Etiquetador
//!
//! Ciclo de vida explícito `create → annotate* → release`, pensado para ser dirigido
//! por uma camada FFI:
//!
//! - `create` carrega o modelo ou devolve um [`LoadError`](crate::error::LoadError) classificado;
//! - `annotate` sobrescreve um **único buffer de resultados** pertencente ao handle e
//!   devolve uma fatia dele. A fatia vale até a próxima chamada de `annotate` ou até
//!   `release` (em Rust o borrow checker garante isso; do lado C é contrato);
//! - `release` consome o handle e descarta modelo e buffer. Nada continua rodando depois.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::TaggerConfig;
use crate::error::LoadResult;
use crate::model::Model;
use crate::tagger::{PerceptronTagger, TaggedWord};
use crate::tokenizer;

/// Etiquetador dono de um buffer de resultados reutilizável.
#[derive(Debug)]
pub struct TaggerHandle {
    tagger: PerceptronTagger,
    results: Vec<TaggedWord>,
}

impl TaggerHandle {
    /// Carrega os três artefatos. Falha cedo, uma única vez.
    pub fn create(
        weights_path: impl AsRef<Path>,
        dictionary_path: impl AsRef<Path>,
        classes_path: impl AsRef<Path>,
    ) -> LoadResult<Self> {
        let config = TaggerConfig::new(
            weights_path.as_ref(),
            dictionary_path.as_ref(),
            classes_path.as_ref(),
        );
        Self::from_config(&config)
    }

    pub fn from_config(config: &TaggerConfig) -> LoadResult<Self> {
        Ok(Self::from_tagger(PerceptronTagger::from_config(config)?))
    }

    pub fn from_model(model: Model) -> Self {
        Self::from_tagger(PerceptronTagger::new(Arc::new(model)))
    }

    pub fn from_tagger(tagger: PerceptronTagger) -> Self {
        Self {
            tagger,
            results: Vec::new(),
        }
    }

    /// Etiqueta `sentence` (tokens separados por espaço) e devolve o buffer atualizado.
    pub fn annotate(&mut self, sentence: &str) -> &[TaggedWord] {
        let words = tokenizer::words(sentence);
        self.tagger.annotate_into(&words, &mut self.results);
        &self.results
    }

    /// Resultado da última chamada de [`annotate`](Self::annotate).
    pub fn results(&self) -> &[TaggedWord] {
        &self.results
    }

    pub fn tagger(&self) -> &PerceptronTagger {
        &self.tagger
    }

    /// Libera o modelo e o buffer.
    pub fn release(self) {
        debug!(buffered = self.results.len(), "handle do etiquetador liberado");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    fn handle() -> TaggerHandle {
        let mut b = ModelBuilder::new(["NOUN", "VERB"]);
        b.set_weight("i word dog", "NOUN", 3.0)
            .set_weight("i word runs", "VERB", 3.0);
        TaggerHandle::from_model(b.build().unwrap())
    }

    #[test]
    fn test_annotate_overwrites_buffer() {
        let mut h = handle();
        assert_eq!(h.annotate("the dog runs").len(), 3);
        let copied: Vec<TaggedWord> = h.results().to_vec();

        let second = h.annotate("runs");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].tag, "VERB");
        assert_eq!(h.results().len(), 1);
        // O que foi copiado antes continua válido.
        assert_eq!(copied[1].tag, "NOUN");
    }

    #[test]
    fn test_empty_sentence_clears_buffer() {
        let mut h = handle();
        h.annotate("dog");
        assert!(h.annotate("").is_empty());
        assert!(h.results().is_empty());
    }

    #[test]
    fn test_create_with_missing_files_fails() {
        let err = TaggerHandle::create(
            "/nonexistent/weights.json",
            "/nonexistent/tags.json",
            "/nonexistent/classes.txt",
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::LoadErrorKind::Missing);
    }

    #[test]
    fn test_release() {
        let mut h = handle();
        h.annotate("dog");
        h.release();
    }
}
