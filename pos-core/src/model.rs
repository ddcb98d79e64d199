//! # Modelo Pré-treinado (Model Store)
//!
//! O modelo encapsula os três artefatos imutáveis produzidos pelo treino offline:
//! - **Tabela de pesos**: `feature → classe → peso` (esparsa; pares ausentes valem 0).
//! - **Conjunto de classes**: lista ordenada de tags (ex: inventário Penn Treebank).
//!   A ordem só importa para o desempate determinístico.
//! - **Dicionário de tags**: palavras cuja tag no treino foi praticamente sempre a mesma.
//!
//! ## Validação
//!
//! Um modelo parcial é mais perigoso do que uma falha de carga, então qualquer
//! entrada malformada derruba a carga inteira:
//! - peso não numérico, valor interno que não é objeto, chave duplicada;
//! - conjunto de classes vazio;
//! - pesos ou dicionário referenciando uma classe que não foi declarada.
//!
//! Depois de construído, o [`Model`] nunca é mutado e pode ser compartilhado via `Arc`
//! entre quantas threads for preciso.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;
use std::time::Instant;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use tracing::{info, warn};

use crate::config::TaggerConfig;
use crate::error::{Artifact, LoadError, LoadResult};

/// Pesos de uma feature: pares `(índice da classe, peso)`, apenas os não nulos no arquivo.
pub type ClassWeights = Vec<(usize, f64)>;

/// O modelo Averaged Perceptron congelado.
#[derive(Debug)]
pub struct Model {
    /// `feature → [(classe, peso)]`. Lista curta por feature: a maioria das features
    /// só tem peso para poucas classes.
    weights: HashMap<String, ClassWeights>,
    /// Classes na ordem declarada.
    classes: Vec<String>,
    class_index: HashMap<String, usize>,
    /// `palavra normalizada → índice da classe`.
    dictionary: HashMap<String, usize>,
}

impl Model {
    /// Carrega o modelo a partir dos três arquivos descritos em `config`.
    pub fn load(config: &TaggerConfig) -> LoadResult<Self> {
        config.validate()?;
        let start = Instant::now();

        let weights = read_artifact(Artifact::Weights, &config.weights_path)?;
        let classes = read_artifact(Artifact::Classes, &config.classes_path)?;
        let dictionary = read_artifact(Artifact::Dictionary, &config.dictionary_path)?;

        let model = Self::from_sources(&weights, &dictionary, &classes)?;
        info!(
            classes = model.classes.len(),
            features = model.weights.len(),
            dictionary = model.dictionary.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "modelo POS carregado de {}",
            config.weights_path.display()
        );
        Ok(model)
    }

    /// Carrega o modelo a partir de leitores arbitrários (arquivos, buffers, rede...).
    pub fn from_readers<W: Read, D: Read, C: Read>(
        mut weights: W,
        mut dictionary: D,
        mut classes: C,
    ) -> LoadResult<Self> {
        let weights = read_all(Artifact::Weights, &mut weights)?;
        let dictionary = read_all(Artifact::Dictionary, &mut dictionary)?;
        let classes = read_all(Artifact::Classes, &mut classes)?;
        Self::from_sources(&weights, &dictionary, &classes)
    }

    /// Carrega o modelo a partir do conteúdo textual dos três artefatos.
    pub fn from_sources(weights_json: &str, dictionary_json: &str, classes_text: &str) -> LoadResult<Self> {
        let classes = parse_classes(classes_text);

        let weights: StrictMap<StrictMap<f64>> = serde_json::from_str(weights_json)
            .map_err(|e| LoadError::malformed(Artifact::Weights, e.to_string()))?;
        let dictionary: StrictMap<String> = serde_json::from_str(dictionary_json)
            .map_err(|e| LoadError::malformed(Artifact::Dictionary, e.to_string()))?;

        let weights = weights
            .0
            .into_iter()
            .map(|(feature, per_class)| (feature, per_class.0))
            .collect();

        Self::assemble(weights, classes, dictionary.0)
    }

    /// Constrói o modelo a partir de estruturas em memória, com a mesma validação da carga.
    pub fn from_parts(
        weights: HashMap<String, HashMap<String, f64>>,
        classes: Vec<String>,
        dictionary: HashMap<String, String>,
    ) -> LoadResult<Self> {
        let weights = weights
            .into_iter()
            .map(|(feature, per_class)| (feature, per_class.into_iter().collect()))
            .collect();
        Self::assemble(weights, dedup_classes(classes), dictionary.into_iter().collect())
    }

    fn assemble(
        weights: Vec<(String, Vec<(String, f64)>)>,
        classes: Vec<String>,
        dictionary: Vec<(String, String)>,
    ) -> LoadResult<Self> {
        if classes.is_empty() {
            return Err(LoadError::EmptyClassSet);
        }
        let class_index: HashMap<String, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        let lookup = |artifact: Artifact, class: &str| -> LoadResult<usize> {
            class_index.get(class).copied().ok_or_else(|| LoadError::UnknownClass {
                artifact,
                class: class.to_string(),
            })
        };

        let mut table = HashMap::with_capacity(weights.len());
        for (feature, per_class) in weights {
            let mut entries: ClassWeights = Vec::with_capacity(per_class.len());
            for (class, weight) in per_class {
                if !weight.is_finite() {
                    return Err(LoadError::malformed(
                        Artifact::Weights,
                        format!("non-finite weight for feature '{feature}', class '{class}'"),
                    ));
                }
                let idx = lookup(Artifact::Weights, &class)?;
                if weight != 0.0 {
                    entries.push((idx, weight));
                }
            }
            entries.sort_by_key(|(idx, _)| *idx);
            if table.insert(feature.clone(), entries).is_some() {
                return Err(LoadError::malformed(
                    Artifact::Weights,
                    format!("duplicate feature '{feature}'"),
                ));
            }
        }

        let mut tag_dictionary = HashMap::with_capacity(dictionary.len());
        for (word, tag) in dictionary {
            let idx = lookup(Artifact::Dictionary, &tag)?;
            tag_dictionary.insert(word, idx);
        }

        Ok(Self {
            weights: table,
            classes,
            class_index,
            dictionary: tag_dictionary,
        })
    }

    /// Peso do par `(feature, classe)`; 0 quando ausente.
    pub fn weight(&self, feature: &str, class: &str) -> f64 {
        let Some(idx) = self.class_index(class) else {
            return 0.0;
        };
        self.feature_weights(feature)
            .and_then(|entries| entries.iter().find(|(c, _)| *c == idx))
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// Todos os pesos não nulos de uma feature, ordenados pelo índice da classe.
    pub fn feature_weights(&self, feature: &str) -> Option<&[(usize, f64)]> {
        self.weights.get(feature).map(Vec::as_slice)
    }

    /// Classes na ordem declarada.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_index(&self, class: &str) -> Option<usize> {
        self.class_index.get(class).copied()
    }

    /// Tag fixa para uma palavra não ambígua, se existir.
    pub fn dictionary_tag(&self, word: &str) -> Option<&str> {
        self.dictionary
            .get(word)
            .map(|&idx| self.classes[idx].as_str())
    }

    pub(crate) fn dictionary_index(&self, word: &str) -> Option<usize> {
        self.dictionary.get(word).copied()
    }

    pub fn num_features(&self) -> usize {
        self.weights.len()
    }

    pub fn dictionary_len(&self) -> usize {
        self.dictionary.len()
    }
}

/// Construtor incremental de modelos em memória.
///
/// Útil para testes e para embutir pequenos modelos escritos à mão:
///
/// ```rust
/// use pos_core::model::ModelBuilder;
///
/// let mut builder = ModelBuilder::new(["NOUN", "VERB"]);
/// builder.set_weight("i word dog", "NOUN", 5.0);
/// builder.set_tag("the", "NOUN");
/// let model = builder.build().unwrap();
/// assert_eq!(model.weight("i word dog", "NOUN"), 5.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    classes: Vec<String>,
    weights: HashMap<String, HashMap<String, f64>>,
    dictionary: HashMap<String, String>,
}

impl ModelBuilder {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn set_weight(&mut self, feature: &str, class: &str, weight: f64) -> &mut Self {
        self.weights
            .entry(feature.to_string())
            .or_default()
            .insert(class.to_string(), weight);
        self
    }

    pub fn set_tag(&mut self, word: &str, class: &str) -> &mut Self {
        self.dictionary.insert(word.to_string(), class.to_string());
        self
    }

    pub fn build(self) -> LoadResult<Model> {
        Model::from_parts(self.weights, self.classes, self.dictionary)
    }
}

/// Uma linha por classe; espaços aparados, linhas em branco ignoradas.
fn parse_classes(text: &str) -> Vec<String> {
    dedup_classes(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Remove duplicatas mantendo a primeira ocorrência (e portanto a ordem de desempate).
fn dedup_classes(classes: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(classes.len());
    let mut out = Vec::with_capacity(classes.len());
    for class in classes {
        if seen.insert(class.clone()) {
            out.push(class);
        } else {
            warn!(class = %class, "classe duplicada ignorada");
        }
    }
    out
}

fn read_artifact(artifact: Artifact, path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|e| LoadError::from_io(artifact, path, e))
}

fn read_all<R: Read>(artifact: Artifact, reader: &mut R) -> LoadResult<String> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).map_err(|e| LoadError::Io {
        artifact,
        path: "<reader>".into(),
        source: e,
    })?;
    Ok(buf)
}

/// Objeto JSON que preserva a ordem e rejeita chaves duplicadas.
///
/// `serde_json` sobrescreve silenciosamente chaves repetidas ao desserializar para `HashMap`;
/// aqui isso vira erro de carga.
struct StrictMap<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for StrictMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StrictMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for StrictMapVisitor<V> {
            type Value = StrictMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut seen = HashSet::new();
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    if !seen.insert(key.clone()) {
                        return Err(de::Error::custom(format!("duplicate key '{key}'")));
                    }
                    entries.push((key, value));
                }
                Ok(StrictMap(entries))
            }
        }

        deserializer.deserialize_map(StrictMapVisitor(PhantomData))
    }
}
