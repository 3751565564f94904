//! Creation of individual node boxes: depth-derived font, branch colour and
//! border attachment points.

use tracing::warn;

use crate::config::LayoutConfig;
use crate::theme::{Theme, lighten};

use super::text::{TextMeasure, compute_node_box};
use super::types::{EdgeLocator, FontSpec, LayoutNode, LayoutWarning, Point, Rect};

pub fn level_of(sequence: &str) -> usize {
    sequence.split('-').count()
}

/// Second path segment: which top-level branch the node belongs to.
pub fn branch_of(sequence: &str) -> Option<usize> {
    sequence.split('-').nth(1).and_then(|part| part.parse().ok())
}

/// Fill colour by depth: the root takes `palette[0]`, a branch head takes
/// `palette[branch]`, deeper nodes a lightened variant of the branch colour.
///
/// `Err` carries the branch index when a deep node's branch has no colour.
pub fn node_fill(
    sequence: &str,
    theme: &Theme,
    lighten_amount: f64,
) -> Result<String, usize> {
    let level = level_of(sequence);
    let branch = branch_of(sequence).unwrap_or(0);
    match level {
        1 => Ok(theme
            .palette
            .first()
            .cloned()
            .unwrap_or_else(|| theme.default_node_fill.clone())),
        2 => Ok(theme
            .palette
            .get(branch)
            .cloned()
            .unwrap_or_else(|| theme.default_node_fill.clone())),
        _ => {
            let base = theme.palette.get(branch).ok_or(branch)?;
            Ok(lighten(base, lighten_amount).unwrap_or_else(|| base.clone()))
        }
    }
}

/// Measures and colours one node placed at `position`.
///
/// Never fails: a missing branch colour leaves `fill` empty and pushes a warning.
pub fn create(
    id: &str,
    text: &str,
    position: Point,
    sequence: &str,
    theme: &Theme,
    config: &LayoutConfig,
    measure: &dyn TextMeasure,
    warnings: &mut Vec<LayoutWarning>,
) -> LayoutNode {
    let level = level_of(sequence);
    let font = FontSpec::new(config.font_size_for_level(level), config.font_family.clone());
    let metrics = compute_node_box(
        measure,
        text,
        &font,
        config.node_padding,
        config.min_node_width,
        config.min_node_height,
    );
    let fill = match node_fill(sequence, theme, config.lighten_amount) {
        Ok(fill) => Some(fill),
        Err(branch) => {
            let warning = LayoutWarning::MissingBranchColor {
                id: id.to_string(),
                branch,
            };
            warn!("{warning}");
            warnings.push(warning);
            None
        }
    };
    LayoutNode {
        id: id.to_string(),
        title: text.to_string(),
        sequence: sequence.to_string(),
        level,
        slot: position,
        position,
        font,
        metrics: Some(metrics),
        fill,
    }
}

pub fn border_coordinate(rect: &Rect, locator: EdgeLocator) -> Point {
    let Rect {
        x,
        y,
        width,
        height,
    } = *rect;
    match locator {
        EdgeLocator::TopLeft => Point::new(x, y),
        EdgeLocator::TopRight => Point::new(x + width, y),
        EdgeLocator::BottomLeft => Point::new(x, y + height),
        EdgeLocator::BottomRight => Point::new(x + width, y + height),
        EdgeLocator::Top => Point::new(x + width / 2.0, y),
        EdgeLocator::Bottom => Point::new(x + width / 2.0, y + height),
        EdgeLocator::Left => Point::new(x, y + height / 2.0),
        EdgeLocator::Right => Point::new(x + width, y + height / 2.0),
        EdgeLocator::Center => Point::new(x + width / 2.0, y + height / 2.0),
    }
}
