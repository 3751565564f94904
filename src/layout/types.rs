use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest rectangle covering both (min of origins, max of far corners).
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f32 = 1e-3;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }

    pub fn translate_y(&self, dy: f32) -> Rect {
        Rect::new(self.x, self.y + dy, self.width, self.height)
    }

    /// How far `lower` reaches up into this rect's vertical span. Zero when clear.
    pub fn vertical_overlap(&self, lower: &Rect) -> f32 {
        (self.bottom() - lower.y).max(0.0)
    }
}

/// Named points on a node's border, used as connector endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeLocator {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl EdgeLocator {
    pub const ALL: [EdgeLocator; 9] = [
        EdgeLocator::TopLeft,
        EdgeLocator::TopRight,
        EdgeLocator::BottomLeft,
        EdgeLocator::BottomRight,
        EdgeLocator::Top,
        EdgeLocator::Bottom,
        EdgeLocator::Left,
        EdgeLocator::Right,
        EdgeLocator::Center,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub size: f32,
    pub family: String,
}

impl FontSpec {
    pub fn new(size: f32, family: impl Into<String>) -> Self {
        Self {
            size,
            family: family.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// Output of node measurement: box size plus the text box offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeMetrics {
    pub width: f32,
    pub height: f32,
    pub text_offset: Point,
    pub text: TextSize,
}

impl NodeMetrics {
    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

/// One laid-out node. `rect()` always derives from the current `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub title: String,
    /// Dash-joined 1-based sibling indices from the root, e.g. `1-3-2`.
    pub sequence: String,
    pub level: usize,
    /// Originally assigned slot, before any offset correction.
    pub slot: Point,
    pub position: Point,
    pub font: FontSpec,
    /// `None` until the node has been measured.
    pub metrics: Option<NodeMetrics>,
    /// `None` when the palette has no colour for this branch: the node is laid out but not drawn.
    pub fill: Option<String>,
}

impl LayoutNode {
    pub fn rect(&self) -> Option<Rect> {
        self.metrics
            .map(|metrics| Rect::from_origin(self.position, metrics.size()))
    }

    pub fn border_coordinate(&self, locator: EdgeLocator) -> Option<Point> {
        self.rect()
            .map(|rect| super::node_box::border_coordinate(&rect, locator))
    }

    pub fn border_points(&self) -> BTreeMap<EdgeLocator, Point> {
        let Some(rect) = self.rect() else {
            return BTreeMap::new();
        };
        EdgeLocator::ALL
            .iter()
            .map(|locator| (*locator, super::node_box::border_coordinate(&rect, *locator)))
            .collect()
    }

    pub fn is_rendered(&self) -> bool {
        self.fill.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtreePhase {
    /// No children: only reports its own rect.
    Leaf,
    /// Children placed, waiting for every child to report.
    Expanding,
    /// Bounding rects computed and reported to the parent.
    Settled,
    /// An offset was applied and the subtree is being re-derived.
    Correcting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChildAnchor {
    pub id: String,
    pub point: Point,
}

/// Aggregated layout state of one node together with its descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtreeState {
    pub id: String,
    pub phase: SubtreePhase,
    /// LEFT attachment points of the direct children, in first-arrival order.
    pub child_positions: Vec<ChildAnchor>,
    /// RIGHT attachment point of the subtree root.
    pub root_pos: Option<Point>,
    pub children_bounding_rect: Option<Rect>,
    pub subtree_bounding_rect: Option<Rect>,
    /// Cumulative downward correction; never decreases.
    pub pending_offset_y: f32,
}

impl SubtreeState {
    pub fn new(id: impl Into<String>, leaf: bool) -> Self {
        Self {
            id: id.into(),
            phase: if leaf {
                SubtreePhase::Leaf
            } else {
                SubtreePhase::Expanding
            },
            child_positions: Vec::new(),
            root_pos: None,
            children_bounding_rect: None,
            subtree_bounding_rect: None,
            pending_offset_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub parent: String,
    pub child: String,
    pub points: [Point; 5],
}

/// One `update_subtree_offset` call as issued, in call order.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetCorrection {
    pub id: String,
    pub requested: f32,
    /// Distance the subtree actually moved; zero when the request was not larger than the pending offset.
    pub applied: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutWarning {
    MissingBranchColor { id: String, branch: usize },
    CorrectionLimit { id: String, passes: usize },
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutWarning::MissingBranchColor { id, branch } => {
                write!(f, "node '{id}' skipped: no palette colour for branch {branch}")
            }
            LayoutWarning::CorrectionLimit { id, passes } => write!(
                f,
                "children of '{id}' still overlap after {passes} correction passes"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub root: String,
    pub nodes: BTreeMap<String, LayoutNode>,
    pub subtrees: BTreeMap<String, SubtreeState>,
    /// Node ids in pre-order.
    pub order: Vec<String>,
    pub connectors: Vec<Connector>,
    pub corrections: Vec<OffsetCorrection>,
    pub warnings: Vec<LayoutWarning>,
    pub bounds: Rect,
}

impl LayoutResult {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.get(id)
    }

    pub fn subtree(&self, id: &str) -> Option<&SubtreeState> {
        self.subtrees.get(id)
    }

    pub fn corrections_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a OffsetCorrection> + 'a {
        self.corrections.iter().filter(move |c| c.id == id)
    }
}
