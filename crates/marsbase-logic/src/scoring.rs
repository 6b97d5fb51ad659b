//! Score factors shared by the meta tasks.
//!
//! A meta task's score is built by multiplying or adding these factors. They
//! are pure functions so scoring curves can be tuned and tested without a
//! live settlement. A final score of 0 means "not eligible".

use rand::Rng;

use crate::constants::battery;

/// Compute the overcrowding stress factor for a building.
/// Returns 0.0 (empty) to 1.0+ (severely overcrowded).
pub fn overcrowding_factor(occupants: u32, capacity: u32) -> f32 {
    if capacity == 0 {
        return 1.0;
    }
    let ratio = occupants as f32 / capacity as f32;
    if ratio <= 0.7 {
        0.0
    } else if ratio <= 1.0 {
        (ratio - 0.7) / 0.3
    } else {
        1.0 + (ratio - 1.0)
    }
}

/// Multiplier that shrinks a score as a building gets crowded.
/// 1.0 when comfortable, approaching 0.0 when packed.
pub fn crowding_modifier(occupants: u32, capacity: u32) -> f32 {
    1.0 / (1.0 + overcrowding_factor(occupants, capacity) * 2.0)
}

/// Quadratic urgency curve for a need in 0..1 (0 = satisfied).
pub fn need_urgency(level: f32, weight: f32) -> f32 {
    let level = level.clamp(0.0, 1.0);
    level * level * weight
}

/// Urgency of recharging a robot battery (0..100).
/// Zero at or above the recommended level; steep below the critical level.
pub fn battery_urgency(level: f32) -> f32 {
    if level >= battery::RECOMMENDED_LEVEL {
        return 0.0;
    }
    let deficit = (battery::RECOMMENDED_LEVEL - level) / battery::RECOMMENDED_LEVEL;
    let base = 10.0 + deficit * 40.0;
    if level < battery::CRITICAL_LEVEL {
        base * 4.0
    } else {
        base
    }
}

/// Skill multiplier: an unskilled worker still scores half.
pub fn skill_modifier(skill: f32) -> f32 {
    0.5 + skill.clamp(0.0, 1.0)
}

/// Performance multiplier; poor performers are less keen on demanding work.
pub fn performance_modifier(performance: f32) -> f32 {
    performance.clamp(0.0, 1.0)
}

/// Personal-preference jitter in 0.8..1.2 so equal offers don't tie.
pub fn preference_jitter(rng: &mut impl Rng) -> f32 {
    rng.gen_range(0.8..1.2)
}

/// Clamp a composed score into the non-negative range, mapping NaN to 0.
pub fn finalize(score: f32) -> f32 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_overcrowding_factor() {
        assert!((overcrowding_factor(0, 10) - 0.0).abs() < 0.01);
        assert!((overcrowding_factor(7, 10) - 0.0).abs() < 0.01);
        assert!(overcrowding_factor(8, 10) > 0.0);
        assert!((overcrowding_factor(10, 10) - 1.0).abs() < 0.01);
        assert!(overcrowding_factor(15, 10) > 1.0);
        assert!((overcrowding_factor(0, 0) - 1.0).abs() < 0.01);
    }

    #[test]
    fn crowding_modifier_shrinks() {
        assert!((crowding_modifier(1, 10) - 1.0).abs() < 1e-6);
        assert!(crowding_modifier(10, 10) < crowding_modifier(8, 10));
        assert!(crowding_modifier(20, 10) > 0.0);
    }

    #[test]
    fn battery_urgency_curve() {
        assert_eq!(battery_urgency(70.0), 0.0);
        assert_eq!(battery_urgency(95.0), 0.0);
        let moderate = battery_urgency(60.0);
        let low = battery_urgency(30.0);
        let critical = battery_urgency(10.0);
        assert!(moderate > 0.0);
        assert!(low > moderate);
        assert!(critical > low * 2.0);
    }

    #[test]
    fn need_urgency_is_quadratic() {
        assert_eq!(need_urgency(0.0, 10.0), 0.0);
        assert!((need_urgency(0.5, 10.0) - 2.5).abs() < 1e-6);
        assert!((need_urgency(2.0, 10.0) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn skill_modifier_range() {
        assert!((skill_modifier(0.0) - 0.5).abs() < 1e-6);
        assert!((skill_modifier(1.0) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn jitter_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let j = preference_jitter(&mut rng);
            assert!((0.8..1.2).contains(&j));
        }
    }

    #[test]
    fn finalize_clamps() {
        assert_eq!(finalize(-1.0), 0.0);
        assert_eq!(finalize(f32::NAN), 0.0);
        assert_eq!(finalize(2.0), 2.0);
    }
}
