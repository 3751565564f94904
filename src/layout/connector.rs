use crate::config::LayoutConfig;

use super::types::Point;

/// Shape parameters of a parent -> child connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorStyle {
    /// Horizontal run leaving the parent and entering the child.
    pub stub: f32,
    /// Nudge applied to the midpoint, against the direction of travel.
    pub bend_x: f32,
    pub bend_y: f32,
}

impl Default for ConnectorStyle {
    fn default() -> Self {
        Self {
            stub: 10.0,
            bend_x: 4.0,
            bend_y: 5.0,
        }
    }
}

impl From<&LayoutConfig> for ConnectorStyle {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            stub: config.connector_stub,
            bend_x: config.connector_bend_x,
            bend_y: config.connector_bend_y,
        }
    }
}

/// Five control points of an S-curve from a parent's right edge to a child's
/// left edge: start, start stub, bent midpoint, end stub, end.
pub fn build_connector(start: Point, end: Point, style: ConnectorStyle) -> [Point; 5] {
    let start_stub = Point::new(start.x + style.stub, start.y);
    let end_stub = Point::new(end.x - style.stub, end.y);
    let mut mid = Point::new(
        (end_stub.x - start_stub.x) / 2.0 + start_stub.x,
        (end_stub.y - start_stub.y) / 2.0 + start_stub.y,
    );

    // Slope in y-up coordinates; a vertical run has no defined slope and no bend.
    let dx = end_stub.x - start_stub.x;
    let dy = end_stub.y - start_stub.y;
    let slope = if dx == 0.0 { 0.0 } else { -dy / dx };
    if slope > 0.0 {
        mid.x -= style.bend_x;
        mid.y -= style.bend_y;
    } else if slope < 0.0 {
        mid.x -= style.bend_x;
        mid.y += style.bend_y;
    }

    [start, start_stub, mid, end_stub, end]
}

/// One connector per child attachment point, all leaving `start`.
pub fn build_connectors(start: Point, ends: &[Point], style: ConnectorStyle) -> Vec<[Point; 5]> {
    ends.iter()
        .map(|end| build_connector(start, *end, style))
        .collect()
}
