use mindmap_layout::layout::{
    EdgeLocator, FontSpec, LayoutEngine, LayoutError, LayoutResult, LayoutWarning, Point,
    TextMeasure, TextSize,
};
use mindmap_layout::{LayoutConfig, Theme, TreeNode, load_tree};

const EPS: f32 = 1e-3;

/// Fixed advance per character so results do not depend on installed fonts.
struct MonoMeasure;

impl TextMeasure for MonoMeasure {
    fn measure_text(&self, text: &str, font: &FontSpec) -> TextSize {
        TextSize {
            width: text.chars().count() as f32 * font.size * 0.6,
            height: font.size * 0.7,
        }
    }
}

fn engine() -> LayoutEngine<MonoMeasure> {
    LayoutEngine::new(Theme::modern(), LayoutConfig::default(), MonoMeasure)
}

fn leaves(prefix: &str, count: usize) -> Vec<TreeNode> {
    (1..=count)
        .map(|i| TreeNode::new(format!("{prefix}{i}"), format!("Topic {prefix}{i}")))
        .collect()
}

/// Deterministic pseudo-random tree with uneven fan-out.
fn ragged_tree(seed: u64, depth: usize) -> TreeNode {
    fn grow(id: String, depth: usize, state: &mut u64) -> TreeNode {
        *state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let fan = if depth == 0 { 0 } else { ((*state >> 33) % 5) as usize };
        let title = format!("Node {id} {}", "x".repeat(((*state >> 40) % 12) as usize));
        let children = (1..=fan)
            .map(|i| grow(format!("{id}.{i}"), depth - 1, state))
            .collect();
        TreeNode::new(id, title).with_children(children)
    }
    let mut state = seed;
    grow("r".to_string(), depth, &mut state)
}

fn assert_no_sibling_overlap(result: &LayoutResult) {
    for id in &result.order {
        let state = result.subtree(id).unwrap();
        let rects: Vec<_> = state
            .child_positions
            .iter()
            .map(|anchor| result.subtree(&anchor.id).unwrap().subtree_bounding_rect.unwrap())
            .collect();
        for pair in rects.windows(2) {
            assert!(
                pair[1].y >= pair[0].bottom() - EPS,
                "children of {id} overlap: {:?} then {:?}",
                pair[0],
                pair[1]
            );
        }
    }
}

fn assert_contained_in_parent_subtree(result: &LayoutResult) {
    for id in &result.order {
        let state = result.subtree(id).unwrap();
        let Some(bounds) = state.subtree_bounding_rect else {
            continue;
        };
        for anchor in &state.child_positions {
            let child = result.node(&anchor.id).unwrap().rect().unwrap();
            assert!(bounds.contains(&child), "{} escapes subtree of {id}", anchor.id);
        }
        assert!(bounds.contains(&result.node(id).unwrap().rect().unwrap()));
    }
}

#[test]
fn single_root_sits_at_default_anchor() {
    let result = engine().layout(TreeNode::new("root", "Central topic")).unwrap();
    assert_eq!(result.node("root").unwrap().position, Point::new(300.0, 300.0));
    assert!(result.connectors.is_empty());
    assert!(result.corrections.is_empty());
    assert_eq!(result.bounds, result.node("root").unwrap().rect().unwrap());
}

#[test]
fn two_children_fan_symmetrically() {
    let result = engine()
        .layout(TreeNode::new("root", "Root").with_children(leaves("c", 2)))
        .unwrap();
    let spacing = LayoutConfig::default().level_spacing(1);
    assert_eq!(result.node("c1").unwrap().position.y, 300.0 - spacing / 2.0);
    assert_eq!(result.node("c2").unwrap().position.y, 300.0 + spacing / 2.0);
    assert_eq!(result.connectors.len(), 2);
    assert!(result.corrections.is_empty());
    for connector in &result.connectors {
        let child = result.node(&connector.child).unwrap();
        assert_eq!(Some(connector.points[4]), child.border_coordinate(EdgeLocator::Left));
    }
}

#[test]
fn expanded_middle_child_pushes_its_followers() {
    let middle = TreeNode::new("m", "Middle").with_children(leaves("g", 7));
    let root = TreeNode::new("root", "Root").with_children(vec![
        TreeNode::new("first", "First"),
        middle,
        TreeNode::new("last", "Last"),
        TreeNode::new("tail", "Tail"),
    ]);
    let result = engine().layout(root).unwrap();

    let last: Vec<_> = result.corrections_for("last").collect();
    assert!(!last.is_empty());
    let tail: Vec<_> = result.corrections_for("tail").collect();
    assert_eq!(last.len(), tail.len());

    // First request for the followers equals the overlap between "first" and "m".
    let first_bottom = result.node("first").unwrap().rect().unwrap().bottom();
    let m_initial_top = result.subtree("m").unwrap().subtree_bounding_rect.unwrap().y
        - result.subtree("m").unwrap().pending_offset_y;
    let overlap = first_bottom - m_initial_top;
    assert!((last[0].requested - overlap).abs() < EPS);
    assert!((tail[0].requested - overlap).abs() < EPS);

    assert_no_sibling_overlap(&result);
    assert_contained_in_parent_subtree(&result);
}

#[test]
fn layout_is_deterministic() {
    let tree = ragged_tree(7, 4);
    let a = engine().layout(tree.clone()).unwrap();
    let b = engine().layout(tree).unwrap();
    assert_eq!(a, b);
}

#[test]
fn ragged_trees_settle_without_overlap() {
    for seed in [1, 2, 3, 42, 1234] {
        let result = engine().layout(ragged_tree(seed, 5)).unwrap();
        assert_no_sibling_overlap(&result);
        assert_contained_in_parent_subtree(&result);
        assert!(result.warnings.is_empty(), "seed {seed}: {:?}", result.warnings);
    }
}

#[test]
fn children_slots_centre_on_parent() {
    let result = engine().layout(ragged_tree(99, 4)).unwrap();
    for id in &result.order {
        let state = result.subtree(id).unwrap();
        let slots: Vec<f32> = state
            .child_positions
            .iter()
            .map(|anchor| result.node(&anchor.id).unwrap().slot.y)
            .collect();
        let (Some(first), Some(last)) = (slots.first(), slots.last()) else {
            continue;
        };
        let parent = result.node(id).unwrap().slot.y;
        assert!(((first + last) / 2.0 - parent).abs() < EPS);
    }
}

#[test]
fn position_tracks_slot_plus_offsets() {
    let result = engine().layout(ragged_tree(5, 4)).unwrap();
    for id in &result.order {
        let node = result.node(id).unwrap();
        let mut offset = 0.0;
        let mut sequence: Vec<&str> = node.sequence.split('-').collect();
        let mut current = id.clone();
        // walk ancestors by matching sequence prefixes
        loop {
            offset += result.subtree(&current).unwrap().pending_offset_y;
            sequence.pop();
            if sequence.is_empty() {
                break;
            }
            let prefix = sequence.join("-");
            current = result
                .order
                .iter()
                .find(|other| result.node(other).unwrap().sequence == prefix)
                .unwrap()
                .clone();
        }
        assert!((node.position.y - (node.slot.y + offset)).abs() < EPS, "{id}");
    }
}

#[test]
fn offset_updates_are_idempotent() {
    let mut engine = engine();
    engine
        .layout(TreeNode::new("root", "Root").with_children(leaves("c", 3)))
        .unwrap();
    let before = engine.result().unwrap();
    let y0 = before.node("c3").unwrap().position.y;
    let rect0 = before.subtree("c3").unwrap().subtree_bounding_rect.unwrap();

    let once = engine.update_subtree_offset("c3", 12.0).unwrap();
    let twice = engine.update_subtree_offset("c3", 12.0).unwrap();
    let smaller = engine.update_subtree_offset("c3", 4.0).unwrap();
    assert_eq!(once.nodes, twice.nodes);
    assert_eq!(once.nodes, smaller.nodes);
    assert_eq!(once.node("c3").unwrap().position.y, y0 + 12.0);

    let larger = engine.update_subtree_offset("c3", 30.0).unwrap();
    assert_eq!(larger.node("c3").unwrap().position.y, y0 + 30.0);
    assert_eq!(
        larger.subtree("c3").unwrap().subtree_bounding_rect.unwrap().y,
        rect0.y + 30.0
    );
    assert_eq!(larger.corrections.len(), 1);
    assert_eq!(larger.corrections[0].applied, 18.0);
}

#[test]
fn drag_moves_only_the_dragged_node() {
    let mut engine = engine();
    let tree = TreeNode::new("root", "Root").with_children(vec![
        TreeNode::new("a", "A").with_children(leaves("a", 2)),
        TreeNode::new("b", "B"),
    ]);
    let before = engine.layout(tree).unwrap();
    let after = engine.apply_drag("a", Point::new(480.0, 150.0)).unwrap();
    assert_eq!(after.node("a").unwrap().position, Point::new(480.0, 150.0));
    assert_eq!(after.node("a1").unwrap().position, before.node("a1").unwrap().position);
    let anchor = after
        .subtree("root")
        .unwrap()
        .child_positions
        .iter()
        .find(|anchor| anchor.id == "a")
        .unwrap();
    assert_eq!(Some(anchor.point), after.node("a").unwrap().border_coordinate(EdgeLocator::Left));
    assert_no_sibling_overlap(&after);
}

#[test]
fn errors_for_bad_commands() {
    let mut engine = engine();
    assert_eq!(
        engine.update_subtree_offset("x", 1.0).unwrap_err(),
        LayoutError::NoLayout
    );
    let dup = TreeNode::new("root", "Root").with_children(vec![
        TreeNode::new("root", "Shadow"),
    ]);
    assert_eq!(
        engine.layout(dup).unwrap_err(),
        LayoutError::DuplicateId("root".to_string())
    );
    engine.layout(TreeNode::new("root", "Root")).unwrap();
    assert_eq!(
        engine.apply_drag("ghost", Point::default()).unwrap_err(),
        LayoutError::UnknownNode("ghost".to_string())
    );
}

#[test]
fn exhausted_palette_hides_deep_nodes_with_warning() {
    let mut engine = LayoutEngine::new(Theme::classic(), LayoutConfig::default(), MonoMeasure);
    let tree = TreeNode::new("root", "Root").with_children(vec![
        TreeNode::new("b1", "One").with_children(leaves("x", 1)),
        TreeNode::new("b2", "Two"),
        TreeNode::new("b3", "Three").with_children(leaves("y", 2)),
    ]);
    let result = engine.layout(tree).unwrap();
    assert_eq!(result.node("root").unwrap().fill.as_deref(), Some("red"));
    assert_eq!(result.node("b1").unwrap().fill.as_deref(), Some("blue"));
    assert_eq!(result.node("x1").unwrap().fill.as_deref(), Some("#4d4dff"));
    assert_eq!(result.node("b3").unwrap().fill.as_deref(), Some("#000229"));
    assert!(!result.node("y1").unwrap().is_rendered());
    assert!(result.node("y1").unwrap().rect().is_some());
    let missing: Vec<_> = result
        .warnings
        .iter()
        .filter(|w| matches!(w, LayoutWarning::MissingBranchColor { branch: 3, .. }))
        .collect();
    assert_eq!(missing.len(), 2);
}

#[test]
fn unparseable_branch_colour_is_used_as_is() {
    let mut theme = Theme::classic();
    theme.palette = vec!["red".to_string(), "#éa".to_string()];
    let mut engine = LayoutEngine::new(theme, LayoutConfig::default(), MonoMeasure);
    let tree = TreeNode::new("root", "Root")
        .with_children(vec![TreeNode::new("a", "A").with_children(leaves("a", 1))]);
    let result = engine.layout(tree).unwrap();
    assert_eq!(result.node("a").unwrap().fill.as_deref(), Some("#éa"));
    assert_eq!(result.node("a1").unwrap().fill.as_deref(), Some("#éa"));
    assert!(result.warnings.is_empty());
}

#[test]
fn hello_box_width_follows_measure() {
    let result = engine().layout(TreeNode::new("root", "Hello")).unwrap();
    let node = result.node("root").unwrap();
    let measured = MonoMeasure.measure_text("Hello", &node.font).width;
    assert_eq!(node.metrics.unwrap().width, 70.0f32.max(measured + 10.0));
}

#[test]
fn loaded_sheets_lay_out_end_to_end() {
    let input = r#"[{"rootTopic": {
        "id": "root", "title": "Trip",
        "children": {"attached": [
            {"id": "p", "title": "Packing", "children": {"attached": [
                {"id": "p1", "title": "Clothes"}, {"id": "p2", "title": "Tickets"}
            ]}},
            {"id": "r", "title": "Route"}
        ]}
    }}]"#;
    let tree = load_tree(input).unwrap();
    let mut engine = engine();
    let result = engine.layout(tree).unwrap();
    assert_eq!(result.order, vec!["root", "p", "p1", "p2", "r"]);
    assert_eq!(result.node("p2").unwrap().sequence, "1-1-2");
    assert_eq!(result.connectors.len(), 4);
    assert_eq!(engine.source_node("p1").map(|n| n.title.as_str()), Some("Clothes"));
}
