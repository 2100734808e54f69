//! Position allocation within a container.
//!
//! Positions are `f64` ordinals. A task dropped at index `i` gets the midpoint
//! between its future neighbours; the ends extend by a fixed step. When the
//! neighbours can no longer be separated the caller renumbers the whole
//! container at `step` increments and allocates again.

use super::container::clamp_index;

pub const DEFAULT_STEP: f64 = 1024.0;

/// Neighbours closer than this are treated as inseparable.
pub const MIN_GAP: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Allocation {
    Position(f64),
    /// The gap at the requested index is exhausted.
    Renumber,
}

/// Result of [`PositionAllocator::place`].
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub position: f64,
    /// New sibling positions, in the same order as the input, when a
    /// renumbering pass was needed.
    pub renumbered: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionAllocator {
    step: f64,
}

impl PositionAllocator {
    pub fn new(step: f64) -> Self {
        let step = if step.is_finite() && step >= 1.0 { step } else { DEFAULT_STEP };
        PositionAllocator { step }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Position for a task inserted among `siblings` (display order, moved
    /// task excluded) at `requested_index`.
    pub fn allocate(&self, siblings: &[f64], requested_index: Option<usize>) -> Allocation {
        let index = clamp_index(requested_index, siblings.len());
        if siblings.is_empty() {
            return Allocation::Position(self.step);
        }
        if index == 0 {
            return Allocation::Position(siblings[0] - self.step);
        }
        if index == siblings.len() {
            return Allocation::Position(siblings[index - 1] + self.step);
        }

        let (prev, next) = (siblings[index - 1], siblings[index]);
        if next - prev < MIN_GAP {
            return Allocation::Renumber;
        }
        let mid = prev + (next - prev) / 2.0;
        if mid <= prev || mid >= next {
            return Allocation::Renumber;
        }
        Allocation::Position(mid)
    }

    /// Fresh positions for `count` members: `step, 2*step, ...`.
    pub fn renumbered(&self, count: usize) -> Vec<f64> {
        (1..=count).map(|i| i as f64 * self.step).collect()
    }

    /// Allocates, falling back to a renumbering pass when the gap is exhausted.
    pub fn place(&self, siblings: &[f64], requested_index: Option<usize>) -> Placed {
        match self.allocate(siblings, requested_index) {
            Allocation::Position(position) => Placed {
                position,
                renumbered: None,
            },
            Allocation::Renumber => {
                let renumbered = self.renumbered(siblings.len());
                let position = match self.allocate(&renumbered, requested_index) {
                    Allocation::Position(position) => position,
                    Allocation::Renumber => (clamp_index(requested_index, siblings.len()) as f64 + 0.5) * self.step,
                };
                Placed {
                    position,
                    renumbered: Some(renumbered),
                }
            }
        }
    }
}

impl Default for PositionAllocator {
    fn default() -> Self {
        PositionAllocator::new(DEFAULT_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_container_starts_at_step() {
        let allocator = PositionAllocator::default();
        assert_eq!(allocator.allocate(&[], Some(3)), Allocation::Position(DEFAULT_STEP));
    }

    #[test]
    fn ends_extend_by_step() {
        let allocator = PositionAllocator::new(100.0);
        assert_eq!(allocator.allocate(&[100.0, 200.0], Some(0)), Allocation::Position(0.0));
        assert_eq!(allocator.allocate(&[100.0, 200.0], None), Allocation::Position(300.0));
        assert_eq!(allocator.allocate(&[100.0, 200.0], Some(99)), Allocation::Position(300.0));
    }

    #[test]
    fn middle_interpolates() {
        let allocator = PositionAllocator::new(100.0);
        assert_eq!(allocator.allocate(&[100.0, 200.0, 300.0], Some(1)), Allocation::Position(150.0));
    }

    #[test]
    fn duplicate_neighbours_need_renumbering() {
        let allocator = PositionAllocator::new(100.0);
        assert_eq!(allocator.allocate(&[100.0, 100.0], Some(1)), Allocation::Renumber);

        let placed = allocator.place(&[100.0, 100.0], Some(1));
        assert_eq!(placed.renumbered, Some(vec![100.0, 200.0]));
        assert_eq!(placed.position, 150.0);
    }

    #[test]
    fn repeated_inserts_eventually_renumber_and_keep_order() {
        let allocator = PositionAllocator::new(1.0);
        let mut siblings = vec![1.0, 2.0];
        let mut renumbered_once = false;
        for _ in 0..80 {
            let placed = allocator.place(&siblings, Some(1));
            if let Some(fresh) = placed.renumbered {
                renumbered_once = true;
                siblings = fresh;
            }
            siblings.insert(1, placed.position);
            assert!(siblings.windows(2).all(|pair| pair[0] < pair[1]));
        }
        assert!(renumbered_once);
    }

    #[test]
    fn invalid_step_falls_back_to_default() {
        assert_eq!(PositionAllocator::new(f64::NAN).step(), DEFAULT_STEP);
        assert_eq!(PositionAllocator::new(0.0).step(), DEFAULT_STEP);
    }

    #[test]
    fn nearly_equal_neighbours_renumber_around_the_index() {
        let allocator = PositionAllocator::default();
        let placed = allocator.place(&[1.0, 1.0 + 1e-7], Some(1));
        assert_eq!(placed.renumbered, Some(vec![1024.0, 2048.0]));
        assert_eq!(placed.position, 1536.0);
    }
}
