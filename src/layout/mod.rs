mod connector;
mod engine;
mod error;
mod node_box;
mod sibling;
mod subtree;
pub(crate) mod text;
pub(crate) mod types;

pub use connector::{ConnectorStyle, build_connector, build_connectors};
pub use engine::LayoutEngine;
pub use error::LayoutError;
pub use node_box::{border_coordinate, branch_of, level_of, node_fill};
pub use sibling::{AdjustOutcome, SiblingSet, adjust_siblings};
pub use subtree::{child_slot, children_bounding_rect, upsert_child_position};
pub use text::{FallbackMeasure, SystemFontMeasure, TextMeasure, compute_node_box, default_measure};
pub use types::*;

use crate::config::LayoutConfig;
use crate::theme::Theme;
use crate::tree::TreeNode;

/// One-shot layout of `tree` with the measurer selected by `config`.
pub fn compute_layout(
    tree: TreeNode,
    theme: &Theme,
    config: &LayoutConfig,
) -> Result<LayoutResult, LayoutError> {
    let mut engine = LayoutEngine::new(
        theme.clone(),
        config.clone(),
        default_measure(config.fast_text_metrics),
    );
    engine.layout(tree)
}
