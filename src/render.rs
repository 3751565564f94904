use crate::config::{LayoutConfig, RenderConfig};
use crate::layout::{LayoutNode, LayoutResult, Point, Rect};
use crate::theme::Theme;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

const CANVAS_MARGIN: f32 = 20.0;

pub fn render_svg(
    result: &LayoutResult,
    theme: &Theme,
    config: &LayoutConfig,
    render: &RenderConfig,
) -> String {
    let (min_x, min_y, width, height) = canvas_box(&result.bounds, render);
    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{min_x:.2} {min_y:.2} {width:.2} {height:.2}\">",
    );
    let _ = write!(
        svg,
        "<rect x=\"{min_x:.2}\" y=\"{min_y:.2}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        render.background
    );

    for connector in &result.connectors {
        let Some(stroke) = result.node(&connector.child).and_then(|n| n.fill.as_deref()) else {
            continue;
        };
        let d = connector_path(&connector.points, config.connector_tension);
        let _ = write!(
            svg,
            "<path d=\"{d}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{}\" stroke-linecap=\"round\"/>",
            theme.connector_width
        );
    }

    for id in &result.order {
        let Some(node) = result.node(id) else {
            continue;
        };
        svg.push_str(&node_svg(node, theme, config));
    }

    if render.debug_overlay {
        for id in &result.order {
            let Some(state) = result.subtree(id) else {
                continue;
            };
            if let Some(rect) = state.subtree_bounding_rect {
                svg.push_str(&outline_svg(&rect, &theme.debug_subtree_color));
            }
            if let Some(rect) = state.children_bounding_rect {
                svg.push_str(&outline_svg(&rect, &theme.debug_children_color));
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Canvas covering the layout bounds plus a margin, never smaller than the configured size.
fn canvas_box(bounds: &Rect, render: &RenderConfig) -> (f32, f32, f32, f32) {
    let min_x = (bounds.x - CANVAS_MARGIN).min(0.0);
    let min_y = (bounds.y - CANVAS_MARGIN).min(0.0);
    let width = render.width.max(bounds.right() + CANVAS_MARGIN - min_x);
    let height = render.height.max(bounds.bottom() + CANVAS_MARGIN - min_y);
    (min_x, min_y, width, height)
}

fn node_svg(node: &LayoutNode, theme: &Theme, config: &LayoutConfig) -> String {
    let (Some(fill), Some(metrics)) = (node.fill.as_deref(), node.metrics) else {
        return String::new();
    };
    let Point { x, y } = node.position;
    let radius = theme.corner_radius;
    let mut out = format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{radius}\" ry=\"{radius}\" fill=\"{fill}\"/>",
        metrics.width, metrics.height
    );
    // Text box sits at text_offset inside the node and is padded on every side.
    let text_x = x + metrics.text_offset.x + config.node_padding + metrics.text.width / 2.0;
    let text_y = y + metrics.text_offset.y + config.node_padding + metrics.text.height / 2.0;
    let _ = write!(
        out,
        "<text x=\"{text_x:.2}\" y=\"{text_y:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        escape_xml(&node.font.family),
        node.font.size,
        theme.text_color,
        escape_xml(&node.title)
    );
    out
}

fn outline_svg(rect: &Rect, color: &str) -> String {
    format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1\" stroke-dasharray=\"4 3\"/>",
        rect.x, rect.y, rect.width, rect.height
    )
}

/// Control points around `p1` for a cardinal spline of the given tension.
fn tension_controls(p0: Point, p1: Point, p2: Point, tension: f32) -> (Point, Point) {
    let d01 = (p1.x - p0.x).hypot(p1.y - p0.y);
    let d12 = (p2.x - p1.x).hypot(p2.y - p1.y);
    let total = d01 + d12;
    if total == 0.0 {
        return (p1, p1);
    }
    let fa = tension * d01 / total;
    let fb = tension * d12 / total;
    let dx = p2.x - p0.x;
    let dy = p2.y - p0.y;
    (
        Point::new(p1.x - fa * dx, p1.y - fa * dy),
        Point::new(p1.x + fb * dx, p1.y + fb * dy),
    )
}

/// Smooth path through every point: quadratic end segments, cubic in between.
/// Zero tension degrades to a polyline.
fn connector_path(points: &[Point], tension: f32) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };
    let mut d = format!("M {:.2} {:.2}", first.x, first.y);
    if points.len() < 3 || tension <= 0.0 {
        for p in &points[1..] {
            let _ = write!(d, " L {:.2} {:.2}", p.x, p.y);
        }
        return d;
    }

    let controls: Vec<(Point, Point)> = points
        .windows(3)
        .map(|w| tension_controls(w[0], w[1], w[2], tension))
        .collect();
    let (c, p) = (controls[0].0, points[1]);
    let _ = write!(d, " Q {:.2} {:.2} {:.2} {:.2}", c.x, c.y, p.x, p.y);
    for i in 1..controls.len() {
        let a = controls[i - 1].1;
        let b = controls[i].0;
        let p = points[i + 1];
        let _ = write!(
            d,
            " C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
            a.x, a.y, b.x, b.y, p.x, p.y
        );
    }
    let c = controls[controls.len() - 1].1;
    let p = points[points.len() - 1];
    let _ = write!(d, " Q {:.2} {:.2} {:.2} {:.2}", c.x, c.y, p.x, p.y);
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().to_string())
        .unwrap_or_else(|| "Arial".to_string());
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
