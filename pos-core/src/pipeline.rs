//! # Pipeline POS — Orquestrador com Eventos Observáveis
//!
//! O pipeline coordena tokenizador, dicionário, features e perceptron, e emite
//! eventos em cada passo via um canal Rust (`mpsc`). O servidor WebSocket usa esses
//! eventos para mostrar a decodificação token a token.
//!
//! Os eventos são gerados pelo mesmo laço de [`PerceptronTagger::annotate_observed`],
//! então o resultado final do pipeline é sempre idêntico ao de `annotate`.

use std::sync::mpsc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::TaggerConfig;
use crate::error::LoadResult;
use crate::perceptron::top_contributions;
use crate::tagger::{Decision, PerceptronTagger, TagSource, TaggedWord};
use crate::tokenizer::{tokenize, Token};

/// Quantas features são enviadas por token no evento [`PipelineEvent::FeaturesComputed`].
const TOP_FEATURES: usize = 10;
/// Quantas classes são enviadas no evento [`PipelineEvent::ScoresComputed`].
const TOP_CLASSES: usize = 5;

/// Eventos emitidos pelo pipeline durante o processamento.
///
/// Cada variante carrega o necessário para a interface renderizar uma etapa.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: Tokenização concluída.
    TokenizationDone { tokens: Vec<Token>, total: usize },
    /// **Passo 2a**: Palavra resolvida pelo dicionário (sem features, sem scores).
    DictionaryHit {
        token_index: usize,
        token_text: String,
        tag: String,
    },
    /// **Passo 2b**: Features extraídas; mostra as que mais pesaram para a classe vencedora.
    FeaturesComputed {
        token_index: usize,
        token_text: String,
        total_features: usize,
        top_features: Vec<(String, f64)>,
    },
    /// **Passo 3**: Scores das melhores classes e a margem entre os dois primeiros.
    ScoresComputed {
        token_index: usize,
        token_text: String,
        ranked: Vec<(String, f64)>,
        margin: Option<f64>,
    },
    /// **Passo 4**: Tag definitiva, já gravada no contexto.
    TagAssigned {
        token_index: usize,
        token_text: String,
        tag: String,
        confidence: f64,
        source: TagSource,
    },
    /// **Conclusão**.
    Done {
        tagged: Vec<TaggedWord>,
        total_tokens: usize,
        processing_ms: u64,
    },
}

/// O pipeline POS principal.
///
/// - **Sync**: [`analyze`](Self::analyze) para chamadas diretas.
/// - **Streaming**: [`analyze_streaming`](Self::analyze_streaming) para UIs reativas.
#[derive(Debug, Clone)]
pub struct PosPipeline {
    tagger: PerceptronTagger,
}

impl PosPipeline {
    pub fn new(tagger: PerceptronTagger) -> Self {
        Self { tagger }
    }

    pub fn from_config(config: &TaggerConfig) -> LoadResult<Self> {
        Ok(Self::new(PerceptronTagger::from_config(config)?))
    }

    pub fn tagger(&self) -> &PerceptronTagger {
        &self.tagger
    }

    /// Processa o texto de forma síncrona.
    pub fn analyze(&self, text: &str) -> Vec<TaggedWord> {
        let (tx, rx) = mpsc::channel();
        self.analyze_streaming(text, tx);
        let mut tagged = vec![];

        while let Ok(event) = rx.recv() {
            if let PipelineEvent::Done { tagged: result, .. } = event {
                tagged = result;
            }
        }
        tagged
    }

    /// Executa o pipeline enviando eventos de progresso pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `TokenizationDone`
    /// 2. Para cada token: `DictionaryHit` **ou** `FeaturesComputed` + `ScoresComputed`, depois `TagAssigned`
    /// 3. `Done`
    ///
    /// Se o receptor for descartado no meio, os envios falham silenciosamente e o
    /// processamento termina normalmente.
    pub fn analyze_streaming(&self, text: &str, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();

        // === Passo 1: Tokenização ===
        let tokens = tokenize(text);
        let total = tokens.len();
        let _ = tx.send(PipelineEvent::TokenizationDone {
            tokens: tokens.clone(),
            total,
        });

        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        let model = self.tagger.model();
        let mut tagged = Vec::with_capacity(total);

        // === Passos 2-4: decodificação observada ===
        self.tagger.annotate_observed(&words, |i, tw, decision| {
            match decision {
                Decision::Dictionary { .. } => {
                    let _ = tx.send(PipelineEvent::DictionaryHit {
                        token_index: i,
                        token_text: tw.word.clone(),
                        tag: tw.tag.clone(),
                    });
                }
                Decision::Scored {
                    features,
                    prediction,
                } => {
                    let _ = tx.send(PipelineEvent::FeaturesComputed {
                        token_index: i,
                        token_text: tw.word.clone(),
                        total_features: features.len(),
                        top_features: top_contributions(model, features, prediction.class, TOP_FEATURES),
                    });
                    let ranked = prediction
                        .scores
                        .ranked(TOP_CLASSES)
                        .into_iter()
                        .map(|(class, score)| (model.classes()[class].clone(), score))
                        .collect();
                    let _ = tx.send(PipelineEvent::ScoresComputed {
                        token_index: i,
                        token_text: tw.word.clone(),
                        ranked,
                        margin: prediction.scores.margin(),
                    });
                }
            }
            let _ = tx.send(PipelineEvent::TagAssigned {
                token_index: i,
                token_text: tw.word.clone(),
                tag: tw.tag.clone(),
                confidence: tw.confidence,
                source: tw.source,
            });
            tagged.push(tw.clone());
        });

        let _ = tx.send(PipelineEvent::Done {
            tagged,
            total_tokens: total,
            processing_ms: start.elapsed().as_millis() as u64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;
    use std::sync::Arc;

    fn pipeline() -> PosPipeline {
        let mut b = ModelBuilder::new(["NOUN", "VERB", "DET"]);
        b.set_weight("bias", "NOUN", 0.1)
            .set_weight("i word dog", "NOUN", 4.0)
            .set_weight("i word runs", "VERB", 4.0)
            .set_tag("the", "DET");
        PosPipeline::new(PerceptronTagger::new(Arc::new(b.build().unwrap())))
    }

    fn collect(p: &PosPipeline, text: &str) -> Vec<PipelineEvent> {
        let (tx, rx) = mpsc::channel();
        p.analyze_streaming(text, tx);
        rx.try_iter().collect()
    }

    #[test]
    fn test_analyze_matches_tagger() {
        let p = pipeline();
        let text = "the dog runs";
        assert_eq!(p.analyze(text), p.tagger().tag(text));
    }

    #[test]
    fn test_event_sequence() {
        let p = pipeline();
        let events = collect(&p, "the dog");
        let kinds: Vec<&str> = events
            .iter()
            .map(|e| match e {
                PipelineEvent::TokenizationDone { .. } => "tokens",
                PipelineEvent::DictionaryHit { .. } => "dict",
                PipelineEvent::FeaturesComputed { .. } => "features",
                PipelineEvent::ScoresComputed { .. } => "scores",
                PipelineEvent::TagAssigned { .. } => "tag",
                PipelineEvent::Done { .. } => "done",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["tokens", "dict", "tag", "features", "scores", "tag", "done"]
        );
    }

    #[test]
    fn test_features_event_explains_winner() {
        let p = pipeline();
        let events = collect(&p, "dog");
        let top = events.iter().find_map(|e| match e {
            PipelineEvent::FeaturesComputed { top_features, .. } => Some(top_features.clone()),
            _ => None,
        });
        assert_eq!(top.unwrap()[0], ("i word dog".to_string(), 4.0));

        let ranked = events.iter().find_map(|e| match e {
            PipelineEvent::ScoresComputed { ranked, margin, .. } => Some((ranked.clone(), *margin)),
            _ => None,
        });
        let (ranked, margin) = ranked.unwrap();
        assert_eq!(ranked[0].0, "NOUN");
        assert!((margin.unwrap() - 4.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text() {
        let p = pipeline();
        let events = collect(&p, "   ");
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PipelineEvent::TokenizationDone { total: 0, .. }));
        assert!(matches!(&events[1], PipelineEvent::Done { tagged, .. } if tagged.is_empty()));
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let p = pipeline();
        let events = collect(&p, "dog");
        let json = serde_json::to_string(&events[events.len() - 1]).unwrap();
        assert!(json.starts_with(r#"{"type":"Done""#));
    }
}
