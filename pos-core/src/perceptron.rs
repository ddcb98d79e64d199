//! # Averaged Perceptron (inferência)
//!
//! Os pesos já chegam treinados e médios; aqui só existe a parte de predição:
//!
//! $$ score(c) = \sum_{f \in features} w_{f,c} $$
//!
//! A classe vencedora é o argmax. Empates são resolvidos pela ordem declarada no
//! conjunto de classes (a primeira vence), nunca pela ordem em que os scores foram somados.

use crate::confidence;
use crate::features::FeatureSet;
use crate::model::Model;

/// Scores acumulados de um token, indexados pela posição da classe no [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVector {
    scores: Vec<f64>,
}

impl ScoreVector {
    pub fn zeros(num_classes: usize) -> Self {
        Self {
            scores: vec![0.0; num_classes],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Índice da maior pontuação; em caso de empate, o menor índice.
    pub fn argmax(&self) -> usize {
        debug_assert!(!self.scores.is_empty(), "conjunto de classes vazio passou pela carga");
        let mut best = 0;
        for (idx, &score) in self.scores.iter().enumerate().skip(1) {
            if score > self.scores[best] {
                best = idx;
            }
        }
        best
    }

    /// Diferença entre o vencedor e o segundo colocado (`None` com uma única classe).
    pub fn margin(&self) -> Option<f64> {
        let ranked = self.ranked(2);
        match ranked.as_slice() {
            [(_, first), (_, second)] => Some(first - second),
            _ => None,
        }
    }

    /// As `k` melhores classes, da maior para a menor pontuação (empates pela ordem declarada).
    pub fn ranked(&self, k: usize) -> Vec<(usize, f64)> {
        let mut pairs: Vec<(usize, f64)> = self.scores.iter().copied().enumerate().collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        pairs.truncate(k);
        pairs
    }

    /// Confiança softmax da classe `class`.
    pub fn confidence(&self, class: usize) -> f64 {
        confidence::score(&self.scores, class)
    }
}

/// Resultado da predição de um token pelo perceptron.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub class: usize,
    pub confidence: f64,
    pub scores: ScoreVector,
}

/// Soma os pesos de todas as features ativas para cada classe.
pub fn score(model: &Model, features: &FeatureSet) -> ScoreVector {
    let mut scores = ScoreVector::zeros(model.classes().len());
    for feature in features.iter() {
        if let Some(weights) = model.feature_weights(feature) {
            for &(class, weight) in weights {
                scores.scores[class] += weight;
            }
        }
    }
    scores
}

/// Pontua, escolhe a classe vencedora e calcula sua confiança.
pub fn predict(model: &Model, features: &FeatureSet) -> Prediction {
    let scores = score(model, features);
    let class = scores.argmax();
    Prediction {
        class,
        confidence: scores.confidence(class),
        scores,
    }
}

/// As `k` features que mais contribuíram (em módulo) para a classe `class`.
///
/// Usado pelo pipeline para mostrar "por que" uma tag venceu.
pub fn top_contributions(model: &Model, features: &FeatureSet, class: usize, k: usize) -> Vec<(String, f64)> {
    let mut contributions: Vec<(String, f64)> = features
        .iter()
        .filter_map(|feature| {
            let weights = model.feature_weights(feature)?;
            let (_, w) = weights.iter().find(|(c, _)| *c == class)?;
            Some((feature.to_string(), *w))
        })
        .collect();
    contributions.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then_with(|| a.0.cmp(&b.0)));
    contributions.truncate(k);
    contributions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    fn features(keys: &[&str]) -> FeatureSet {
        let mut fs = FeatureSet::new(0);
        for k in keys {
            fs.insert(*k);
        }
        fs
    }

    #[test]
    fn test_scores_sum_active_features() {
        let mut b = ModelBuilder::new(["NOUN", "VERB"]);
        b.set_weight("bias", "NOUN", 0.5)
            .set_weight("i word dog", "NOUN", 2.0)
            .set_weight("i word dog", "VERB", -1.0)
            .set_weight("i word run", "VERB", 3.0);
        let model = b.build().unwrap();

        let scores = score(&model, &features(&["bias", "i word dog", "unseen"]));
        assert_eq!(scores.as_slice(), &[2.5, -1.0]);
        assert_eq!(scores.argmax(), 0);
        assert_eq!(scores.margin(), Some(3.5));
    }

    #[test]
    fn test_tie_goes_to_first_declared_class() {
        let mut b = ModelBuilder::new(["B", "A", "C"]);
        b.set_weight("bias", "A", 1.0).set_weight("bias", "C", 1.0);
        let model = b.build().unwrap();
        for _ in 0..20 {
            let p = predict(&model, &features(&["bias"]));
            assert_eq!(model.classes()[p.class], "A");
        }
    }

    #[test]
    fn test_all_zero_scores_pick_first_class() {
        let model = ModelBuilder::new(["X", "Y"]).build().unwrap();
        let p = predict(&model, &features(&["nothing"]));
        assert_eq!(p.class, 0);
        assert!((p.confidence - 0.5).abs() < 1e-12);
        assert_eq!(p.scores.margin(), Some(0.0));
    }

    #[test]
    fn test_single_class_margin() {
        let model = ModelBuilder::new(["ONLY"]).build().unwrap();
        let p = predict(&model, &features(&["bias"]));
        assert_eq!(p.scores.margin(), None);
        assert_eq!(p.confidence, 1.0);
    }

    #[test]
    fn test_ranked_orders_by_score_then_class() {
        let mut b = ModelBuilder::new(["A", "B", "C", "D"]);
        b.set_weight("bias", "A", 1.0)
            .set_weight("bias", "B", 3.0)
            .set_weight("bias", "C", 3.0)
            .set_weight("bias", "D", -2.0);
        let model = b.build().unwrap();
        let scores = score(&model, &features(&["bias"]));
        assert_eq!(scores.ranked(3), vec![(1, 3.0), (2, 3.0), (0, 1.0)]);
    }

    #[test]
    fn test_top_contributions() {
        let mut b = ModelBuilder::new(["NOUN", "VERB"]);
        b.set_weight("bias", "NOUN", 0.1)
            .set_weight("i word dog", "NOUN", 4.0)
            .set_weight("i-1 tag DT", "NOUN", -2.0)
            .set_weight("i-1 tag DT", "VERB", 9.0);
        let model = b.build().unwrap();
        let top = top_contributions(&model, &features(&["bias", "i word dog", "i-1 tag DT"]), 0, 2);
        assert_eq!(
            top,
            vec![("i word dog".to_string(), 4.0), ("i-1 tag DT".to_string(), -2.0)]
        );
    }
}
