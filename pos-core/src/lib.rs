//! # pos-core — Etiquetador Morfossintático (POS) com Averaged Perceptron
//!
//! Este crate implementa a **inferência** de um etiquetador de classes gramaticais
//! (part-of-speech) baseado em Averaged Perceptron pré-treinado. O treino acontece
//! offline; aqui os pesos são apenas carregados e consultados, nunca alterados.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: Texto bruto (String).
//! 2.  **Tokenização** ([`tokenizer`]): Divisão por espaços em branco, preservando offsets.
//! 3.  **Modelo** ([`model`]): Tabela de pesos, conjunto de classes e dicionário de tags, imutáveis.
//! 4.  **Decodificação** ([`tagger`]), token a token, da esquerda para a direita:
//!     *   **Dicionário**: palavras não ambíguas recebem a tag direto (confiança 1.0).
//!     *   **Features** ([`features`]): contexto de palavras + as duas tags já decididas.
//!     *   **Perceptron** ([`perceptron`]): soma de pesos por classe, argmax com desempate determinístico.
//! 5.  **Confiança** ([`confidence`]): softmax numericamente estável da classe vencedora.
//! 6.  **Saída**: Lista de [`TaggedWord`] alinhada 1:1 com os tokens de entrada.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use pos_core::{model::ModelBuilder, PerceptronTagger};
//!
//! // 1. Um modelo mínimo escrito à mão (em produção: Model::load com os três arquivos)
//! let mut builder = ModelBuilder::new(["NOUN", "VERB", "DET"]);
//! builder.set_weight("i word dog", "NOUN", 5.0);
//! builder.set_weight("i word runs", "VERB", 4.0);
//! builder.set_tag("the", "DET");
//! let tagger = PerceptronTagger::new(Arc::new(builder.build().unwrap()));
//!
//! // 2. Etiqueta
//! for tw in tagger.tag("the dog runs") {
//!     println!("{} {} {:.3}", tw.word, tw.tag, tw.confidence);
//! }
//! ```
//!
//! ## Módulos Principais
//!
//! - [`handle`]: ciclo de vida `create → annotate → release` com buffer de resultados reutilizável.
//! - [`pipeline`]: decodificação com eventos observáveis (usado pelo servidor web).
//! - [`config`]: caminhos dos artefatos do modelo.
//! - [`error`]: erros de carga classificados.

pub mod confidence;
pub mod config;
pub mod error;
pub mod features;
pub mod handle;
pub mod model;
pub mod perceptron;
pub mod pipeline;
pub mod tagger;
pub mod tokenizer;

pub use config::TaggerConfig;
pub use error::{LoadError, LoadErrorKind};
pub use handle::TaggerHandle;
pub use model::Model;
pub use pipeline::{PipelineEvent, PosPipeline};
pub use tagger::{PerceptronTagger, TagSource, TaggedWord};
pub use tokenizer::Token;
