use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// One topic of the source outline. Identity (`id`) is fixed once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Children::is_empty")]
    pub children: Children,
}

/// Mirrors the `{ "attached": [...] }` wrapper used by mind-map exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Children {
    #[serde(default)]
    pub attached: Vec<TreeNode>,
}

impl Children {
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

impl TreeNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            children: Children::default(),
        }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children.attached = children;
        self
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children.attached
    }

    pub fn is_leaf(&self) -> bool {
        self.children.attached.is_empty()
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn len(&self) -> usize {
        dfs(self).count()
    }
}

/// Level-order traversal. Calling [`bfs`] again restarts from the root.
pub struct Bfs<'a> {
    queue: VecDeque<&'a TreeNode>,
}

impl<'a> Iterator for Bfs<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.children.attached.iter());
        Some(node)
    }
}

/// Pre-order traversal.
pub struct Dfs<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Dfs<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.attached.iter().rev());
        Some(node)
    }
}

pub fn bfs(root: &TreeNode) -> Bfs<'_> {
    Bfs {
        queue: VecDeque::from([root]),
    }
}

pub fn dfs(root: &TreeNode) -> Dfs<'_> {
    Dfs { stack: vec![root] }
}

pub fn find_by_id<'a, I>(sequence: I, id: &str) -> Option<&'a TreeNode>
where
    I: IntoIterator<Item = &'a TreeNode>,
{
    sequence.into_iter().find(|node| node.id == id)
}

/// Nodes at a 1-based depth (the root is level 1), in level order.
pub fn nodes_by_level(root: &TreeNode, level: usize) -> Vec<&TreeNode> {
    let mut out = Vec::new();
    let mut queue: VecDeque<(&TreeNode, usize)> = VecDeque::from([(root, 1)]);
    while let Some((node, depth)) = queue.pop_front() {
        if depth == level {
            out.push(node);
            continue;
        }
        for child in &node.children.attached {
            queue.push_back((child, depth + 1));
        }
    }
    out
}

/// Longest title (in chars) among the nodes at `level`. Zero when the level is empty.
pub fn level_max_text_length(root: &TreeNode, level: usize) -> usize {
    nodes_by_level(root, level)
        .iter()
        .map(|node| node.title.chars().count())
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("invalid mind-map JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("input has no sheets")]
    NoSheets,
    #[error("input does not contain a root topic")]
    MissingRoot,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTopic {
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    children: Option<RawChildren>,
}

#[derive(Debug, Deserialize)]
struct RawChildren {
    #[serde(default)]
    attached: Vec<RawTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSheet {
    root_topic: RawTopic,
}

/// Loads the already-exported outline shape. Accepts a bare topic, a sheet
/// object with `rootTopic`, or an array of sheets (the first one is used).
pub fn load_tree(input: &str) -> Result<TreeNode, TreeError> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    let raw = match value {
        serde_json::Value::Array(sheets) => {
            let first = sheets.into_iter().next().ok_or(TreeError::NoSheets)?;
            serde_json::from_value::<RawSheet>(first)?.root_topic
        }
        serde_json::Value::Object(ref map) if map.contains_key("rootTopic") => {
            serde_json::from_value::<RawSheet>(value)?.root_topic
        }
        serde_json::Value::Object(ref map) if map.contains_key("title") => {
            serde_json::from_value::<RawTopic>(value)?
        }
        _ => return Err(TreeError::MissingRoot),
    };
    Ok(convert_topic(raw, "1"))
}

fn convert_topic(raw: RawTopic, sequence: &str) -> TreeNode {
    let id = raw.id.unwrap_or_else(|| format!("node-{sequence}"));
    let children = raw
        .children
        .map(|children| children.attached)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, child)| convert_topic(child, &format!("{sequence}-{}", idx + 1)))
        .collect();
    TreeNode {
        id,
        title: raw.title.unwrap_or_default(),
        children: Children { attached: children },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        TreeNode::new("root", "Root").with_children(vec![
            TreeNode::new("a", "Alpha").with_children(vec![
                TreeNode::new("a1", "A one"),
                TreeNode::new("a2", "A two"),
            ]),
            TreeNode::new("b", "Beta").with_children(vec![TreeNode::new("b1", "B one long")]),
        ])
    }

    #[test]
    fn bfs_visits_level_order() {
        let tree = sample();
        let ids: Vec<&str> = bfs(&tree).map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "a", "b", "a1", "a2", "b1"]);
    }

    #[test]
    fn dfs_visits_pre_order() {
        let tree = sample();
        let ids: Vec<&str> = dfs(&tree).map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "a", "a1", "a2", "b", "b1"]);
    }

    #[test]
    fn traversals_restart() {
        let tree = sample();
        assert_eq!(bfs(&tree).count(), 6);
        assert_eq!(bfs(&tree).count(), 6);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn find_by_id_scans_any_order() {
        let tree = sample();
        assert_eq!(find_by_id(dfs(&tree), "b1").map(|n| n.title.as_str()), Some("B one long"));
        assert!(find_by_id(bfs(&tree), "missing").is_none());
    }

    #[test]
    fn level_queries() {
        let tree = sample();
        let level3: Vec<&str> = nodes_by_level(&tree, 3).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(level3, vec!["a1", "a2", "b1"]);
        assert_eq!(level_max_text_length(&tree, 3), "B one long".len());
        assert_eq!(level_max_text_length(&tree, 9), 0);
    }

    #[test]
    fn loads_sheet_array() {
        let input = r#"[{"id":"sheet","class":"sheet","title":"Sheet 1","rootTopic":{
            "id":"r","title":"Central","structureClass":"org.xmind.ui.map.unbalanced",
            "children":{"attached":[{"id":"c1","title":"One"},{"title":"Two"}]}}}]"#;
        let tree = load_tree(input).unwrap();
        assert_eq!(tree.id, "r");
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[1].id, "node-1-2");
    }

    #[test]
    fn loads_bare_topic_and_root_object() {
        let bare = load_tree(r#"{"id":"x","title":"X"}"#).unwrap();
        assert!(bare.is_leaf());
        let wrapped = load_tree(r#"{"rootTopic":{"id":"y","title":"Y"}}"#).unwrap();
        assert_eq!(wrapped.id, "y");
    }

    #[test]
    fn rejects_inputs_without_root() {
        assert!(matches!(load_tree("[]"), Err(TreeError::NoSheets)));
        assert!(matches!(load_tree("42"), Err(TreeError::MissingRoot)));
        assert!(matches!(load_tree("{"), Err(TreeError::Json(_))));
    }
}
