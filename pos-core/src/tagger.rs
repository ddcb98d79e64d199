//! # Decodificação Gulosa da Esquerda para a Direita
//!
//! O etiquetador percorre a sentença um token por vez:
//!
//! 1. Normaliza a palavra e consulta o **dicionário de tags**. Se a palavra estiver lá,
//!    a tag é atribuída direto, com confiança `1.0`, sem extrair features.
//!    Se a forma normalizada não estiver, tenta a palavra exata (dicionários
//!    exportados com chaves cruas, como `Mr.` ou `1984`).
//! 2. Caso contrário extrai as features ([`crate::features`]), pontua todas as classes
//!    ([`crate::perceptron`]) e escolhe o argmax.
//! 3. Grava a tag escolhida no contexto **antes** de avançar: as features de histórico
//!    do próximo token leem esse valor definitivo.
//!
//! Por causa do passo 3 a decodificação de uma sentença é inerentemente sequencial.
//! O paralelismo existe apenas entre sentenças ([`PerceptronTagger::annotate_batch`]).

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaggerConfig;
use crate::confidence::DICTIONARY_CONFIDENCE;
use crate::error::LoadResult;
use crate::features::{extract, FeatureSet, SentenceContext};
use crate::model::Model;
use crate::perceptron::{self, Prediction};
use crate::tokenizer;

/// De onde veio a tag de um token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSource {
    /// Atalho do dicionário de palavras não ambíguas.
    Dictionary,
    /// Argmax do perceptron.
    Model,
}

/// Um token com sua tag e a confiança da atribuição.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedWord {
    /// Texto exato do token de entrada (não a forma normalizada).
    pub word: String,
    pub tag: String,
    /// Confiança em `[0, 1]`; sempre `1.0` para o dicionário.
    pub confidence: f64,
    pub source: TagSource,
}

/// Como a decisão de um token foi tomada, exposta aos observadores da decodificação.
#[derive(Debug)]
pub enum Decision<'s> {
    Dictionary {
        class: usize,
    },
    Scored {
        features: &'s FeatureSet,
        prediction: &'s Prediction,
    },
}

/// Etiquetador POS sobre um [`Model`] compartilhado.
///
/// Clonar é barato (só incrementa o `Arc`), e o modelo nunca é mutado:
/// várias threads podem etiquetar ao mesmo tempo sem sincronização.
#[derive(Debug, Clone)]
pub struct PerceptronTagger {
    model: Arc<Model>,
}

impl PerceptronTagger {
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }

    /// Carrega os três artefatos e constrói o etiquetador.
    pub fn from_config(config: &TaggerConfig) -> LoadResult<Self> {
        Ok(Self::new(Arc::new(Model::load(config)?)))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn shared_model(&self) -> Arc<Model> {
        Arc::clone(&self.model)
    }

    /// Separa a sentença por espaços e etiqueta cada token.
    pub fn tag(&self, sentence: &str) -> Vec<TaggedWord> {
        self.annotate(&tokenizer::words(sentence))
    }

    /// Etiqueta uma sequência de tokens já segmentada.
    ///
    /// A saída tem exatamente um item por token de entrada, na mesma ordem.
    /// Entrada vazia produz saída vazia.
    pub fn annotate(&self, tokens: &[&str]) -> Vec<TaggedWord> {
        let mut out = Vec::with_capacity(tokens.len());
        self.annotate_into(tokens, &mut out);
        out
    }

    /// Igual a [`annotate`](Self::annotate), mas reaproveita o buffer `out` (que é limpo antes).
    pub fn annotate_into(&self, tokens: &[&str], out: &mut Vec<TaggedWord>) {
        out.clear();
        self.annotate_observed(tokens, |_, tagged, _| out.push(tagged.clone()));
    }

    /// Etiqueta várias sentenças independentes em paralelo (rayon).
    ///
    /// A ordem da saída é a ordem da entrada.
    pub fn annotate_batch<S>(&self, sentences: &[S]) -> Vec<Vec<TaggedWord>>
    where
        S: AsRef<str> + Sync,
    {
        sentences
            .par_iter()
            .map(|sentence| self.tag(sentence.as_ref()))
            .collect()
    }

    /// Núcleo da decodificação. `on_step` é chamado uma vez por token, em ordem,
    /// com o resultado e a forma como ele foi decidido.
    pub fn annotate_observed<F>(&self, tokens: &[&str], mut on_step: F)
    where
        F: FnMut(usize, &TaggedWord, Decision<'_>),
    {
        let model = self.model.as_ref();
        let mut context = SentenceContext::new(tokens);
        let mut dictionary_hits = 0usize;

        for (position, &raw) in tokens.iter().enumerate() {
            // Forma normalizada primeiro; a forma crua é só fallback.
            let dictionary_class = model
                .dictionary_index(&context.token(position).normalized)
                .or_else(|| model.dictionary_index(raw));

            let class = match dictionary_class {
                Some(class) => {
                    dictionary_hits += 1;
                    let tagged = TaggedWord {
                        word: raw.to_string(),
                        tag: model.classes()[class].clone(),
                        confidence: DICTIONARY_CONFIDENCE,
                        source: TagSource::Dictionary,
                    };
                    on_step(position, &tagged, Decision::Dictionary { class });
                    class
                }
                None => {
                    let features = extract(&context, position);
                    let prediction = perceptron::predict(model, &features);
                    let tagged = TaggedWord {
                        word: raw.to_string(),
                        tag: model.classes()[prediction.class].clone(),
                        confidence: prediction.confidence,
                        source: TagSource::Model,
                    };
                    on_step(
                        position,
                        &tagged,
                        Decision::Scored {
                            features: &features,
                            prediction: &prediction,
                        },
                    );
                    prediction.class
                }
            };

            context.commit(position, model.classes()[class].as_str());
        }

        debug!(tokens = tokens.len(), dictionary_hits, "sentença etiquetada");
    }
}
