//! Facility ranking: choosing among capacity-limited facilities.
//!
//! When several buildings offer the same facility (charging slots, lab
//! benches, beds), a worker prefers one with a free slot, then the least
//! crowded, and breaks remaining ties at random so that workers don't all
//! pile onto the first building in iteration order.

use rand::seq::SliceRandom;
use rand::Rng;

/// Occupancy snapshot of one candidate facility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacilityCandidate<T> {
    pub id: T,
    pub occupied: u32,
    pub capacity: u32,
}

impl<T> FacilityCandidate<T> {
    pub fn has_free_slot(&self) -> bool {
        self.occupied < self.capacity
    }

    /// Occupied fraction; a zero-capacity facility counts as full.
    pub fn crowding(&self) -> f32 {
        if self.capacity == 0 {
            1.0
        } else {
            self.occupied as f32 / self.capacity as f32
        }
    }
}

/// Pick the best facility with a free slot, or `None` if every one is full.
pub fn rank_facilities<T: Copy>(
    candidates: &[FacilityCandidate<T>],
    rng: &mut impl Rng,
) -> Option<T> {
    let free: Vec<&FacilityCandidate<T>> =
        candidates.iter().filter(|c| c.has_free_slot()).collect();

    let least = free
        .iter()
        .map(|c| c.crowding())
        .fold(f32::INFINITY, f32::min);

    let best: Vec<T> = free
        .iter()
        .filter(|c| (c.crowding() - least).abs() < 1e-6)
        .map(|c| c.id)
        .collect();

    best.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cand(id: u32, occupied: u32, capacity: u32) -> FacilityCandidate<u32> {
        FacilityCandidate {
            id,
            occupied,
            capacity,
        }
    }

    #[test]
    fn all_full_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        let c = [cand(1, 2, 2), cand(2, 1, 1), cand(3, 0, 0)];
        assert_eq!(rank_facilities(&c, &mut rng), None);
    }

    #[test]
    fn prefers_free_over_full() {
        let mut rng = StdRng::seed_from_u64(1);
        let c = [cand(1, 2, 2), cand(2, 3, 4)];
        assert_eq!(rank_facilities(&c, &mut rng), Some(2));
    }

    #[test]
    fn prefers_least_crowded() {
        let mut rng = StdRng::seed_from_u64(1);
        let c = [cand(1, 3, 4), cand(2, 1, 4), cand(3, 2, 4)];
        for _ in 0..20 {
            assert_eq!(rank_facilities(&c, &mut rng), Some(2));
        }
    }

    #[test]
    fn ties_spread_across_candidates() {
        let mut rng = StdRng::seed_from_u64(42);
        let c = [cand(1, 0, 2), cand(2, 0, 2)];
        let mut seen = [0u32; 3];
        for _ in 0..200 {
            let id = rank_facilities(&c, &mut rng).unwrap();
            seen[id as usize] += 1;
        }
        assert!(seen[1] > 0 && seen[2] > 0, "ties should be broken randomly");
    }
}
