//! Per-subtree layout state kept in an index-addressed arena.
//!
//! Every node owns one [`SubtreeState`]. Children report their LEFT anchor to
//! the parent's state; a parent derives its bounding rects only once every
//! child has settled.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::LayoutConfig;
use crate::theme::Theme;
use crate::tree::TreeNode;

use super::error::LayoutError;
use super::node_box;
use super::sibling::SiblingSet;
use super::text::TextMeasure;
use super::types::{
    ChildAnchor, EdgeLocator, LayoutNode, LayoutWarning, OffsetCorrection, Point, Rect,
    SubtreePhase, SubtreeState,
};

pub(crate) type NodeIndex = usize;

/// Slot of child `index` among `count` siblings, fanned out vertically around the parent.
///
/// An odd count puts the middle child level with the parent; an even count
/// straddles it by half a step.
pub fn child_slot(parent: Point, index: usize, count: usize, spacing: f32, offset_x: f32) -> Point {
    let mut step = index as f32 - (count / 2) as f32;
    if count % 2 == 0 {
        step += 0.5;
    }
    Point::new(parent.x + offset_x, parent.y + step * spacing)
}

/// Origin of the first child, widest child's width, first top to last bottom.
///
/// `None` until every child has a rect.
pub fn children_bounding_rect(rects: &[Option<Rect>]) -> Option<Rect> {
    let first = (*rects.first()?)?;
    let last = (*rects.last()?)?;
    let mut width: f32 = 0.0;
    for rect in rects {
        width = width.max((*rect)?.width);
    }
    Some(Rect::new(first.x, first.y, width, last.bottom() - first.y))
}

/// Records `point` as the anchor of child `id`, replacing a stale entry.
///
/// New ids are appended only while the list is shorter than `expected`.
/// Returns whether the list changed.
pub fn upsert_child_position(
    anchors: &mut Vec<ChildAnchor>,
    id: &str,
    point: Point,
    expected: usize,
) -> bool {
    if let Some(existing) = anchors.iter_mut().find(|anchor| anchor.id == id) {
        if existing.point == point {
            return false;
        }
        existing.point = point;
        return true;
    }
    if anchors.len() < expected {
        anchors.push(ChildAnchor {
            id: id.to_string(),
            point,
        });
        return true;
    }
    false
}

#[derive(Debug, Default)]
pub(crate) struct LayoutTree {
    pub nodes: Vec<LayoutNode>,
    pub states: Vec<SubtreeState>,
    pub parent: Vec<Option<NodeIndex>>,
    pub children: Vec<Vec<NodeIndex>>,
    expected_children: Vec<usize>,
    pub index: HashMap<String, NodeIndex>,
    pub corrections: Vec<OffsetCorrection>,
    /// Raised while nodes are created; kept for the lifetime of the layout.
    pub node_warnings: Vec<LayoutWarning>,
    /// Raised by the sibling pass of the most recent command.
    pub pass_warnings: Vec<LayoutWarning>,
}

impl LayoutTree {
    /// Downward phase: places every node in its slot (pre-order) and reports
    /// anchors. Nodes are stored in pre-order, so index 0 is the root.
    pub fn mount(
        root: &TreeNode,
        theme: &Theme,
        config: &LayoutConfig,
        measure: &dyn TextMeasure,
    ) -> Result<Self, LayoutError> {
        let mut tree = LayoutTree::default();
        let mut stack: Vec<(&TreeNode, Option<NodeIndex>, String, Point)> = vec![(
            root,
            None,
            "1".to_string(),
            Point::new(config.root_x, config.root_y),
        )];

        while let Some((source, parent, sequence, position)) = stack.pop() {
            if tree.index.contains_key(&source.id) {
                return Err(LayoutError::DuplicateId(source.id.clone()));
            }
            let node = node_box::create(
                &source.id,
                &source.title,
                position,
                &sequence,
                theme,
                config,
                measure,
                &mut tree.node_warnings,
            );
            let level = node.level;
            let idx = tree.nodes.len();
            let child_count = source.children().len();
            tree.nodes.push(node);
            tree.states
                .push(SubtreeState::new(source.id.clone(), source.is_leaf()));
            tree.parent.push(parent);
            tree.children.push(Vec::with_capacity(child_count));
            tree.expected_children.push(child_count);
            tree.index.insert(source.id.clone(), idx);
            if let Some(parent) = parent {
                tree.children[parent].push(idx);
            }
            tree.report_anchors(idx);
            trace!(id = %source.id, %sequence, x = position.x, y = position.y, "mounted");

            let spacing = config.level_spacing(level);
            for (i, child) in source.children().iter().enumerate().rev() {
                let slot = child_slot(position, i, child_count, spacing, config.offset_x);
                stack.push((child, Some(idx), format!("{sequence}-{}", i + 1), slot));
            }
        }
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn ancestors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self.parent[idx], move |current| self.parent[*current])
    }

    /// Refreshes the node's own RIGHT anchor and its LEFT anchor in the parent.
    pub fn report_anchors(&mut self, idx: NodeIndex) {
        let node = &self.nodes[idx];
        let (Some(left), Some(right)) = (
            node.border_coordinate(EdgeLocator::Left),
            node.border_coordinate(EdgeLocator::Right),
        ) else {
            return;
        };
        if self.expected_children[idx] > 0 {
            self.states[idx].root_pos = Some(right);
        }
        if let Some(parent) = self.parent[idx] {
            let expected = self.expected_children[parent];
            let id = node.id.clone();
            if upsert_child_position(&mut self.states[parent].child_positions, &id, left, expected) {
                trace!(parent = %self.states[parent].id, child = %id, y = left.y, "anchor updated");
            }
        }
    }

    /// Recomputes the children and subtree rects from the current children.
    ///
    /// The subtree rect covers the node's own rect as well as its descendants.
    /// An internal node with an unmeasured child keeps both rects unset.
    pub fn derive_rects(&mut self, idx: NodeIndex) {
        let own = self.nodes[idx].rect();
        if self.children[idx].is_empty() {
            self.states[idx].children_bounding_rect = None;
            self.states[idx].subtree_bounding_rect = own;
            return;
        }
        let child_rects: Vec<Option<Rect>> = self.children[idx]
            .iter()
            .map(|child| self.nodes[*child].rect())
            .collect();
        let children_rect = children_bounding_rect(&child_rects);
        let subtree_rect = children_rect.and_then(|children_rect| {
            let mut merged = own.map_or(children_rect, |own| own.union(&children_rect));
            for child in &self.children[idx] {
                merged = merged.union(&self.states[*child].subtree_bounding_rect?);
            }
            Some(merged)
        });
        let state = &mut self.states[idx];
        state.children_bounding_rect = children_rect;
        state.subtree_bounding_rect = subtree_rect;
    }

    /// Marks the node settled (or back to leaf) once its rects are derived.
    pub fn finish_settle(&mut self, idx: NodeIndex) {
        self.derive_rects(idx);
        let state = &mut self.states[idx];
        state.phase = if self.children[idx].is_empty() {
            SubtreePhase::Leaf
        } else {
            SubtreePhase::Settled
        };
    }

    /// Raises the subtree's cumulative offset to `target` and moves it by the
    /// difference. Requests at or below the current offset change nothing.
    pub fn update_subtree_offset(&mut self, idx: NodeIndex, target: f32) -> f32 {
        let pending = self.states[idx].pending_offset_y;
        let applied = if target > pending {
            let shift = target - pending;
            self.states[idx].pending_offset_y = target;
            self.states[idx].phase = SubtreePhase::Correcting;
            self.translate_subtree(idx, shift);
            shift
        } else {
            0.0
        };
        debug!(id = %self.states[idx].id, requested = target, applied, "subtree offset");
        self.corrections.push(OffsetCorrection {
            id: self.states[idx].id.clone(),
            requested: target,
            applied,
        });
        applied
    }

    fn translate_subtree(&mut self, root: NodeIndex, dy: f32) {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            self.nodes[idx].position.y += dy;
            let state = &mut self.states[idx];
            state.children_bounding_rect = state.children_bounding_rect.map(|r| r.translate_y(dy));
            state.subtree_bounding_rect = state.subtree_bounding_rect.map(|r| r.translate_y(dy));
            self.report_anchors(idx);
            stack.extend(self.children[idx].iter().rev().copied());
        }
    }
}

impl SiblingSet for LayoutTree {
    fn bounding_rect(&self, node: usize) -> Option<Rect> {
        self.states[node].subtree_bounding_rect
    }

    fn pending_offset(&self, node: usize) -> f32 {
        self.states[node].pending_offset_y
    }

    fn update_subtree_offset(&mut self, node: usize, offset_y: f32) -> f32 {
        LayoutTree::update_subtree_offset(self, node, offset_y)
    }

    fn settle(&mut self, node: usize) {
        self.finish_settle(node);
    }
}
