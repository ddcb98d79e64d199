//! # Confiança da Predição
//!
//! Converte o vetor de scores brutos de um token numa confiança em `[0, 1]`:
//!
//! $$ conf = \frac{\exp(s_{escolhida} - m)}{\sum_c \exp(s_c - m)}, \quad m = \max_c s_c $$
//!
//! Subtrair o máximo antes de exponenciar evita overflow quando os pesos são grandes.
//! Atribuições feitas pelo dicionário não têm vetor de scores e recebem
//! [`DICTIONARY_CONFIDENCE`].

/// Confiança fixa das palavras resolvidas pelo dicionário de tags.
pub const DICTIONARY_CONFIDENCE: f64 = 1.0;

/// Probabilidade softmax da classe `chosen` sobre todas as classes.
///
/// Fora do intervalo devolve 0; se a soma degenerar (zero ou não finita),
/// devolve a probabilidade uniforme `1/n`.
pub fn score(scores: &[f64], chosen: usize) -> f64 {
    let Some(&chosen_score) = scores.get(chosen) else {
        return 0.0;
    };
    let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = scores.iter().map(|&s| (s - max_score).exp()).sum();
    if sum == 0.0 || !sum.is_finite() {
        return 1.0 / scores.len() as f64;
    }
    ((chosen_score - max_score).exp() / sum).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_class_values_sum_to_one() {
        let scores = [1.0, 2.0, 3.0, -4.0];
        let probs: Vec<f64> = (0..scores.len()).map(|i| score(&scores, i)).collect();
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        // A maior pontuação tem a maior probabilidade.
        assert!(probs[2] > probs[1] && probs[1] > probs[0] && probs[0] > probs[3]);
    }

    #[test]
    fn test_matches_softmax_definition() {
        let scores = [0.3, -1.2, 2.7];
        let denom: f64 = scores.iter().map(|s| f64::exp(*s)).sum();
        for (i, s) in scores.iter().enumerate() {
            assert!((score(&scores, i) - s.exp() / denom).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_sum_falls_back_to_uniform() {
        let scores = [f64::NAN, 1.0, 2.0, 3.0];
        assert_eq!(score(&scores, 1), 0.25);
    }

    #[test]
    fn test_near_equal_scores_approach_half() {
        let conf = score(&[1.0000001, 1.0], 0);
        assert!((conf - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_shrinks_with_margin() {
        let margins = [4.0, 2.0, 1.0, 0.5, 0.1, 0.0];
        let confs: Vec<f64> = margins.iter().map(|m| score(&[m + 1.0, 1.0], 0)).collect();
        for pair in confs.windows(2) {
            assert!(pair[0] > pair[1], "{confs:?}");
        }
        assert!((confs[confs.len() - 1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_large_scores_do_not_overflow() {
        let conf = score(&[1.0e6, 1.0e6 - 1.0, -1.0e6], 0);
        assert!(conf.is_finite());
        assert!(conf > 0.5 && conf <= 1.0);
    }

    #[test]
    fn test_out_of_range_and_empty() {
        assert_eq!(score(&[1.0], 3), 0.0);
        assert_eq!(score(&[], 0), 0.0);
    }
}
