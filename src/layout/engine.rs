use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, warn};

use crate::config::{Config, LayoutConfig};
use crate::theme::Theme;
use crate::tree::{TreeNode, dfs, find_by_id};

use super::connector::{ConnectorStyle, build_connectors};
use super::error::LayoutError;
use super::sibling::adjust_siblings;
use super::subtree::{LayoutTree, NodeIndex};
use super::text::{TextMeasure, default_measure};
use super::types::{Connector, LayoutResult, LayoutWarning, Point};

/// Owns one tree and its layout state, and answers interaction commands.
///
/// Every command returns a fresh [`LayoutResult`] snapshot; the `corrections`
/// log in it covers that command only.
pub struct LayoutEngine<M: TextMeasure = Box<dyn TextMeasure>> {
    theme: Theme,
    config: LayoutConfig,
    measure: M,
    source: Option<TreeNode>,
    tree: Option<LayoutTree>,
}

impl LayoutEngine<Box<dyn TextMeasure>> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.theme.clone(),
            config.layout.clone(),
            default_measure(config.layout.fast_text_metrics),
        )
    }
}

impl<M: TextMeasure> LayoutEngine<M> {
    pub fn new(theme: Theme, config: LayoutConfig, measure: M) -> Self {
        Self {
            theme,
            config,
            measure,
            source: None,
            tree: None,
        }
    }

    /// Lays out `tree` from scratch, replacing any previous layout.
    pub fn layout(&mut self, tree: TreeNode) -> Result<LayoutResult, LayoutError> {
        let mut arena = LayoutTree::mount(&tree, &self.theme, &self.config, &self.measure)?;
        settle_all(&mut arena, &self.config);
        let result = snapshot(&arena, &self.config);
        debug!(
            nodes = arena.len(),
            corrections = result.corrections.len(),
            "layout complete"
        );
        self.source = Some(tree);
        self.tree = Some(arena);
        Ok(result)
    }

    /// Moves a single node to `position`, then re-settles it and its ancestors.
    ///
    /// Descendants stay where they are. Siblings the node now overlaps are
    /// pushed down.
    pub fn apply_drag(&mut self, id: &str, position: Point) -> Result<LayoutResult, LayoutError> {
        let tree = self.tree.as_mut().ok_or(LayoutError::NoLayout)?;
        let idx = lookup(tree, id)?;
        begin_command(tree);
        let offset = accumulated_offset(tree, idx);
        let node = &mut tree.nodes[idx];
        node.position = position;
        node.slot = Point::new(position.x, position.y - offset);
        tree.report_anchors(idx);
        debug!(id, x = position.x, y = position.y, "node dragged");
        resettle_from(tree, idx, &self.config);
        Ok(snapshot(tree, &self.config))
    }

    /// Raises the cumulative offset of the subtree rooted at `id` to
    /// `offset_y`, then re-settles its ancestors. A request at or below the
    /// current offset only shows up in the corrections log.
    pub fn update_subtree_offset(
        &mut self,
        id: &str,
        offset_y: f32,
    ) -> Result<LayoutResult, LayoutError> {
        let tree = self.tree.as_mut().ok_or(LayoutError::NoLayout)?;
        let idx = lookup(tree, id)?;
        begin_command(tree);
        tree.update_subtree_offset(idx, offset_y);
        resettle_from(tree, idx, &self.config);
        Ok(snapshot(tree, &self.config))
    }

    pub fn result(&self) -> Option<LayoutResult> {
        self.tree
            .as_ref()
            .map(|tree| snapshot(tree, &self.config))
    }

    /// Source topic behind a laid-out node.
    pub fn source_node(&self, id: &str) -> Option<&TreeNode> {
        self.source.as_ref().and_then(|root| find_by_id(dfs(root), id))
    }
}

fn lookup(tree: &LayoutTree, id: &str) -> Result<NodeIndex, LayoutError> {
    tree.index
        .get(id)
        .copied()
        .ok_or_else(|| LayoutError::UnknownNode(id.to_string()))
}

fn begin_command(tree: &mut LayoutTree) {
    tree.corrections.clear();
    tree.pass_warnings.clear();
}

fn accumulated_offset(tree: &LayoutTree, idx: NodeIndex) -> f32 {
    std::iter::once(idx)
        .chain(tree.ancestors(idx))
        .map(|i| tree.states[i].pending_offset_y)
        .sum()
}

/// Upward phase: leaves report first (pre-order); a parent is queued once its
/// last child has settled.
fn settle_all(tree: &mut LayoutTree, config: &LayoutConfig) {
    begin_command(tree);
    let mut waiting: Vec<usize> = tree.children.iter().map(Vec::len).collect();
    let mut queue: VecDeque<NodeIndex> = (0..tree.len()).filter(|idx| waiting[*idx] == 0).collect();
    while let Some(idx) = queue.pop_front() {
        settle_node(tree, idx, config);
        if let Some(parent) = tree.parent[idx] {
            waiting[parent] -= 1;
            if waiting[parent] == 0 {
                queue.push_back(parent);
            }
        }
    }
}

fn settle_node(tree: &mut LayoutTree, idx: NodeIndex, config: &LayoutConfig) {
    if !tree.children[idx].is_empty() {
        let children = tree.children[idx].clone();
        let outcome = adjust_siblings(tree, &children, config.max_correction_passes);
        if !outcome.converged {
            let warning = LayoutWarning::CorrectionLimit {
                id: tree.states[idx].id.clone(),
                passes: outcome.passes,
            };
            warn!("{warning}");
            tree.pass_warnings.push(warning);
        }
    }
    tree.finish_settle(idx);
    debug!(
        id = %tree.states[idx].id,
        subtree = ?tree.states[idx].subtree_bounding_rect,
        "subtree settled"
    );
}

fn resettle_from(tree: &mut LayoutTree, idx: NodeIndex, config: &LayoutConfig) {
    let chain: Vec<NodeIndex> = std::iter::once(idx).chain(tree.ancestors(idx)).collect();
    for node in chain {
        settle_node(tree, node, config);
    }
}

fn snapshot(tree: &LayoutTree, config: &LayoutConfig) -> LayoutResult {
    let style = ConnectorStyle::from(config);
    let mut connectors = Vec::new();
    for state in &tree.states {
        let Some(start) = state.root_pos else {
            continue;
        };
        let ends: Vec<Point> = state.child_positions.iter().map(|a| a.point).collect();
        let curves = build_connectors(start, &ends, style);
        connectors.extend(state.child_positions.iter().zip(curves).map(|(anchor, points)| {
            Connector {
                parent: state.id.clone(),
                child: anchor.id.clone(),
                points,
            }
        }));
    }

    let bounds = tree
        .nodes
        .iter()
        .filter_map(|node| node.rect())
        .reduce(|acc, rect| acc.union(&rect))
        .unwrap_or_default();

    LayoutResult {
        root: tree.nodes.first().map(|n| n.id.clone()).unwrap_or_default(),
        nodes: tree
            .nodes
            .iter()
            .map(|node| (node.id.clone(), node.clone()))
            .collect::<BTreeMap<_, _>>(),
        subtrees: tree
            .states
            .iter()
            .map(|state| (state.id.clone(), state.clone()))
            .collect(),
        order: tree.nodes.iter().map(|n| n.id.clone()).collect(),
        connectors,
        corrections: tree.corrections.clone(),
        warnings: tree
            .node_warnings
            .iter()
            .chain(&tree.pass_warnings)
            .cloned()
            .collect(),
        bounds,
    }
}
