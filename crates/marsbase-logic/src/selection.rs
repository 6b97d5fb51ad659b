//! Weighted random selection over scored candidates.
//!
//! Every task choice in the scheduler funnels through [`weighted_pick`]:
//! a candidate is drawn with probability proportional to its score, so
//! workers spread across good options instead of all herding onto the single
//! best one. Zero, negative and non-finite scores are never drawn.

use rand::Rng;

fn usable(score: f32) -> bool {
    score.is_finite() && score > 0.0
}

/// Sum of all drawable scores.
pub fn total_score(scores: &[f32]) -> f64 {
    scores
        .iter()
        .filter(|s| usable(**s))
        .map(|s| *s as f64)
        .sum()
}

/// Pick an index with probability proportional to its score.
/// Returns `None` when no score is positive.
pub fn weighted_pick(scores: &[f32], rng: &mut impl Rng) -> Option<usize> {
    let total = total_score(scores);
    if total <= 0.0 {
        return None;
    }

    let mut roll = rng.gen_range(0.0..total);
    let mut last_usable = None;
    for (i, score) in scores.iter().enumerate() {
        if !usable(*score) {
            continue;
        }
        let s = *score as f64;
        if roll < s {
            return Some(i);
        }
        roll -= s;
        last_usable = Some(i);
    }
    // Float rounding can leave a sliver of roll past the last bucket.
    last_usable
}

/// Weighted pick over `(candidate, score)` pairs, returning the candidate.
pub fn pick_candidate<'a, T>(candidates: &'a [(T, f32)], rng: &mut impl Rng) -> Option<&'a T> {
    let scores: Vec<f32> = candidates.iter().map(|(_, s)| *s).collect();
    weighted_pick(&scores, rng).map(|i| &candidates[i].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(weighted_pick(&[], &mut rng), None);
    }

    #[test]
    fn all_zero_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(weighted_pick(&[0.0, 0.0, -2.0], &mut rng), None);
    }

    #[test]
    fn single_positive_always_chosen() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(weighted_pick(&[0.0, 3.0, f32::NAN], &mut rng), Some(1));
        }
    }

    #[test]
    fn infinite_score_ignored() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(weighted_pick(&[f32::INFINITY, 1.0], &mut rng), Some(1));
        }
    }

    #[test]
    fn pick_candidate_returns_item() {
        let mut rng = StdRng::seed_from_u64(9);
        let candidates = [("sleep", 0.0), ("eat", 2.0)];
        assert_eq!(pick_candidate(&candidates, &mut rng), Some(&"eat"));
    }

    #[test]
    fn total_skips_unusable() {
        assert!((total_score(&[1.0, -1.0, 2.5, f32::NAN]) - 3.5).abs() < 1e-9);
    }
}
