//! Vertical overlap resolution across one parent's ordered child subtrees.
//!
//! Siblings are visited top to bottom. When sibling `i + 1` reaches into
//! sibling `i`, it and every sibling after it are pushed down by the overlap,
//! one at a time, each re-settled before the next pair is inspected.

use super::types::Rect;

/// Overlaps below this are float noise left over from a previous push.
pub(crate) const OVERLAP_EPSILON: f32 = 1e-3;

/// Handles to sibling subtrees that can be inspected and pushed down.
pub trait SiblingSet {
    /// Settled bounding rect of the subtree rooted at `node`, if available.
    fn bounding_rect(&self, node: usize) -> Option<Rect>;
    fn pending_offset(&self, node: usize) -> f32;
    /// Requests a cumulative downward offset. Returns the distance moved.
    fn update_subtree_offset(&mut self, node: usize, offset_y: f32) -> f32;
    /// Re-derives the subtree's rects after a move.
    fn settle(&mut self, node: usize);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdjustOutcome {
    /// Overlapping pairs found across all passes.
    pub overlaps: usize,
    pub passes: usize,
    pub converged: bool,
}

/// Pushes overlapping siblings down until a full pass finds nothing to fix or
/// `max_passes` is reached.
pub fn adjust_siblings<S: SiblingSet + ?Sized>(
    set: &mut S,
    siblings: &[usize],
    max_passes: usize,
) -> AdjustOutcome {
    let mut outcome = AdjustOutcome::default();
    if siblings.len() < 2 {
        outcome.converged = true;
        return outcome;
    }
    for _ in 0..max_passes.max(1) {
        outcome.passes += 1;
        let found = sweep(set, siblings);
        outcome.overlaps += found;
        if found == 0 {
            outcome.converged = true;
            return outcome;
        }
    }
    outcome.converged = first_overlap(set, siblings).is_none();
    outcome
}

fn sweep<S: SiblingSet + ?Sized>(set: &mut S, siblings: &[usize]) -> usize {
    let mut found = 0;
    for i in 0..siblings.len() - 1 {
        let overlap = match (
            set.bounding_rect(siblings[i]),
            set.bounding_rect(siblings[i + 1]),
        ) {
            (Some(top), Some(bottom)) => top.vertical_overlap(&bottom),
            _ => continue,
        };
        if overlap <= OVERLAP_EPSILON {
            continue;
        }
        found += 1;
        // Later siblings have not moved yet; push the whole tail by the same amount.
        for &sibling in &siblings[i + 1..] {
            let target = set.pending_offset(sibling) + overlap;
            set.update_subtree_offset(sibling, target);
            set.settle(sibling);
        }
    }
    found
}

fn first_overlap<S: SiblingSet + ?Sized>(set: &S, siblings: &[usize]) -> Option<usize> {
    siblings.windows(2).position(|pair| {
        match (set.bounding_rect(pair[0]), set.bounding_rect(pair[1])) {
            (Some(top), Some(bottom)) => top.vertical_overlap(&bottom) > OVERLAP_EPSILON,
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeSiblings {
        rects: Vec<Option<Rect>>,
        pending: Vec<f32>,
        calls: Vec<(usize, f32)>,
        settled: Vec<usize>,
        /// How far a subtree reaches further up every time it is settled.
        growth: f32,
    }

    impl FakeSiblings {
        fn with_rects(rects: Vec<Option<Rect>>) -> Self {
            let pending = vec![0.0; rects.len()];
            Self {
                rects,
                pending,
                ..Default::default()
            }
        }
    }

    impl SiblingSet for FakeSiblings {
        fn bounding_rect(&self, node: usize) -> Option<Rect> {
            self.rects[node]
        }

        fn pending_offset(&self, node: usize) -> f32 {
            self.pending[node]
        }

        fn update_subtree_offset(&mut self, node: usize, offset_y: f32) -> f32 {
            self.calls.push((node, offset_y));
            if offset_y <= self.pending[node] {
                return 0.0;
            }
            let shift = offset_y - self.pending[node];
            self.pending[node] = offset_y;
            if let Some(rect) = self.rects[node].as_mut() {
                rect.y += shift;
            }
            shift
        }

        fn settle(&mut self, node: usize) {
            self.settled.push(node);
            if let Some(rect) = self.rects[node].as_mut() {
                rect.y -= self.growth;
                rect.height += self.growth;
            }
        }
    }

    fn rect(y: f32, height: f32) -> Option<Rect> {
        Some(Rect::new(0.0, y, 50.0, height))
    }

    #[test]
    fn clear_siblings_are_untouched() {
        let mut set = FakeSiblings::with_rects(vec![rect(0.0, 40.0), rect(62.0, 40.0)]);
        let outcome = adjust_siblings(&mut set, &[0, 1], 8);
        assert!(outcome.converged);
        assert_eq!(outcome.overlaps, 0);
        assert!(set.calls.is_empty());
    }

    #[test]
    fn overlap_cascades_to_every_later_sibling() {
        let mut set = FakeSiblings::with_rects(vec![
            rect(0.0, 40.0),
            rect(20.0, 200.0),
            rect(240.0, 40.0),
            rect(300.0, 40.0),
        ]);
        let outcome = adjust_siblings(&mut set, &[0, 1, 2, 3], 8);
        assert!(outcome.converged);
        // 1 overlaps 0 by 20 -> 1, 2 and 3 pushed by 20; 2 and 3 keep their gaps
        assert_eq!(set.calls[..3], [(1, 20.0), (2, 20.0), (3, 20.0)]);
        assert_eq!(set.settled[..3], [1, 2, 3]);
        assert_eq!(set.rects[1].map(|r| r.y), Some(40.0));
        assert_eq!(set.rects[2].map(|r| r.y), Some(260.0));
        assert_eq!(set.rects[3].map(|r| r.y), Some(320.0));
        assert!(first_overlap(&set, &[0, 1, 2, 3]).is_none());
    }

    #[test]
    fn second_overlap_adds_to_pending_offset() {
        let mut set = FakeSiblings::with_rects(vec![
            rect(0.0, 40.0),
            rect(30.0, 100.0),
            rect(100.0, 40.0),
        ]);
        adjust_siblings(&mut set, &[0, 1, 2], 8);
        // pair (0,1): overlap 10 -> 1 at 40, 2 at 110
        // pair (1,2): 1 spans 40..140, 2 at 110 -> overlap 30, 2 requested 10 + 30
        assert_eq!(set.calls, vec![(1, 10.0), (2, 10.0), (2, 40.0)]);
        assert_eq!(set.rects[2].map(|r| r.y), Some(140.0));
    }

    #[test]
    fn unsettled_siblings_are_skipped() {
        let mut set = FakeSiblings::with_rects(vec![rect(0.0, 40.0), None, rect(10.0, 40.0)]);
        let outcome = adjust_siblings(&mut set, &[0, 1, 2], 8);
        assert!(outcome.converged);
        assert!(set.calls.is_empty());
    }

    #[test]
    fn subtree_growing_upward_hits_the_pass_ceiling() {
        let mut set = FakeSiblings::with_rects(vec![rect(0.0, 40.0), rect(20.0, 40.0)]);
        set.growth = 5.0;
        let outcome = adjust_siblings(&mut set, &[0, 1], 3);
        assert_eq!(outcome.passes, 3);
        assert_eq!(outcome.overlaps, 3);
        assert!(!outcome.converged);
    }

    #[test]
    fn single_sibling_converges_immediately() {
        let mut set = FakeSiblings::with_rects(vec![rect(0.0, 40.0)]);
        let outcome = adjust_siblings(&mut set, &[0], 8);
        assert_eq!(outcome, AdjustOutcome { overlaps: 0, passes: 0, converged: true });
    }
}
