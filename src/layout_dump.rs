use crate::layout::{LayoutResult, Rect, SubtreePhase};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub root: String,
    pub bounds: RectDump,
    pub nodes: Vec<NodeDump>,
    pub subtrees: Vec<SubtreeDump>,
    pub connectors: Vec<ConnectorDump>,
    pub corrections: Vec<CorrectionDump>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RectDump {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<Rect> for RectDump {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub title: String,
    pub sequence: String,
    pub level: usize,
    pub x: f32,
    pub y: f32,
    pub slot_y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub font_size: f32,
    pub text_offset: Option<[f32; 2]>,
    pub fill: Option<String>,
    pub hidden: bool,
}

#[derive(Debug, Serialize)]
pub struct SubtreeDump {
    pub id: String,
    pub phase: String,
    pub pending_offset_y: f32,
    pub root_pos: Option<[f32; 2]>,
    pub child_positions: Vec<(String, [f32; 2])>,
    pub children_bounding_rect: Option<RectDump>,
    pub subtree_bounding_rect: Option<RectDump>,
}

#[derive(Debug, Serialize)]
pub struct ConnectorDump {
    pub from: String,
    pub to: String,
    pub points: Vec<[f32; 2]>,
}

#[derive(Debug, Serialize)]
pub struct CorrectionDump {
    pub id: String,
    pub requested: f32,
    pub applied: f32,
}

fn phase_name(phase: SubtreePhase) -> &'static str {
    match phase {
        SubtreePhase::Leaf => "leaf",
        SubtreePhase::Expanding => "expanding",
        SubtreePhase::Settled => "settled",
        SubtreePhase::Correcting => "correcting",
    }
}

impl LayoutDump {
    /// Nodes and subtrees are listed in pre-order.
    pub fn from_result(result: &LayoutResult) -> Self {
        let nodes = result
            .order
            .iter()
            .filter_map(|id| result.node(id))
            .map(|node| NodeDump {
                id: node.id.clone(),
                title: node.title.clone(),
                sequence: node.sequence.clone(),
                level: node.level,
                x: node.position.x,
                y: node.position.y,
                slot_y: node.slot.y,
                width: node.metrics.map(|m| m.width),
                height: node.metrics.map(|m| m.height),
                font_size: node.font.size,
                text_offset: node.metrics.map(|m| [m.text_offset.x, m.text_offset.y]),
                fill: node.fill.clone(),
                hidden: !node.is_rendered(),
            })
            .collect();

        let subtrees = result
            .order
            .iter()
            .filter_map(|id| result.subtree(id))
            .map(|state| SubtreeDump {
                id: state.id.clone(),
                phase: phase_name(state.phase).to_string(),
                pending_offset_y: state.pending_offset_y,
                root_pos: state.root_pos.map(|p| [p.x, p.y]),
                child_positions: state
                    .child_positions
                    .iter()
                    .map(|anchor| (anchor.id.clone(), [anchor.point.x, anchor.point.y]))
                    .collect(),
                children_bounding_rect: state.children_bounding_rect.map(RectDump::from),
                subtree_bounding_rect: state.subtree_bounding_rect.map(RectDump::from),
            })
            .collect();

        let connectors = result
            .connectors
            .iter()
            .map(|connector| ConnectorDump {
                from: connector.parent.clone(),
                to: connector.child.clone(),
                points: connector.points.iter().map(|p| [p.x, p.y]).collect(),
            })
            .collect();

        let corrections = result
            .corrections
            .iter()
            .map(|c| CorrectionDump {
                id: c.id.clone(),
                requested: c.requested,
                applied: c.applied,
            })
            .collect();

        LayoutDump {
            root: result.root.clone(),
            bounds: result.bounds.into(),
            nodes,
            subtrees,
            connectors,
            corrections,
            warnings: result.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

pub fn layout_dump_json(result: &LayoutResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&LayoutDump::from_result(result))?)
}

pub fn write_layout_dump(path: &Path, result: &LayoutResult) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_result(result);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
