// Marquee - Rental & events marketing site built with Rust
// Copyright (C) 2025 Marquee Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Schema-less content as a tree of text leaves.
//!
//! Page-section content is authored freely, so anything that needs to look
//! inside it (media usage detection in particular) works on this tree
//! rather than on a storage format.

use serde_json::Value;

/// A node of schema-less content. Children keep their order; object keys
/// become labels, array items are unlabelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Leaf(String),
    Node(Vec<(Option<String>, ContentNode)>),
}

impl ContentNode {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ContentNode::Node(Vec::new()),
            Value::Bool(b) => ContentNode::Leaf(b.to_string()),
            Value::Number(n) => ContentNode::Leaf(n.to_string()),
            Value::String(s) => ContentNode::Leaf(s.clone()),
            Value::Array(items) => ContentNode::Node(
                items
                    .iter()
                    .map(|item| (None, ContentNode::from_json(item)))
                    .collect(),
            ),
            Value::Object(map) => ContentNode::Node(
                map.iter()
                    .map(|(key, item)| (Some(key.clone()), ContentNode::from_json(item)))
                    .collect(),
            ),
        }
    }

    /// Depth-first walk over every leaf. The visitor receives the nearest
    /// label (array items inherit their parent's) and the leaf text; the
    /// walk stops as soon as it returns `true`.
    pub fn walk<F>(&self, visit: &mut F) -> bool
    where
        F: FnMut(Option<&str>, &str) -> bool,
    {
        self.walk_labelled(None, visit)
    }

    fn walk_labelled<F>(&self, label: Option<&str>, visit: &mut F) -> bool
    where
        F: FnMut(Option<&str>, &str) -> bool,
    {
        match self {
            ContentNode::Leaf(text) => visit(label, text),
            ContentNode::Node(children) => children.iter().any(|(child_label, child)| {
                let effective = child_label.as_deref().or(label);
                child.walk_labelled(effective, visit)
            }),
        }
    }

    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ContentNode::Leaf(text) => out.push(text.as_str()),
            ContentNode::Node(children) => {
                for (_, child) in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// True when any leaf contains `needle`. An empty needle never matches.
    pub fn contains_text(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return false;
        }
        self.walk(&mut |_, text| text.contains(needle))
    }

    /// True when a leaf under a media-id label parses to `id`
    pub fn contains_media_id(&self, id: i64) -> bool {
        self.walk(&mut |label, text| {
            label.map(is_media_id_label).unwrap_or(false)
                && text.trim().parse::<i64>().map(|v| v == id).unwrap_or(false)
        })
    }
}

/// Labels under which content stores media ids
pub fn is_media_id_label(label: &str) -> bool {
    label == "media_id"
        || label == "media_ids"
        || label.ends_with("_media_id")
        || label.ends_with("_media_ids")
        || label == "mediaId"
        || label.ends_with("MediaId")
        || label == "mediaIds"
        || label.ends_with("MediaIds")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_order_and_labels() {
        let tree = ContentNode::from_json(&json!({"title": "Hello", "items": ["a", 2]}));
        match tree {
            ContentNode::Node(children) => {
                assert_eq!(children.len(), 2);
                assert!(children
                    .iter()
                    .any(|(label, _)| label.as_deref() == Some("items")));
            }
            ContentNode::Leaf(_) => panic!("expected node"),
        }
    }

    #[test]
    fn test_leaves_flatten_all_levels() {
        let tree = ContentNode::from_json(&json!({
            "a": {"b": {"c": ["deep", {"d": "deeper"}]}},
            "flag": true,
            "n": 3,
            "nothing": null
        }));
        let mut leaves = tree.leaves();
        leaves.sort();
        assert_eq!(leaves, vec!["3", "deep", "deeper", "true"]);
    }

    #[test]
    fn test_contains_text_at_depth() {
        let tree = ContentNode::from_json(&json!({
            "slides": [{"caption": "x", "image": {"src": "/storage/media/tent.jpg"}}]
        }));
        assert!(tree.contains_text("media/tent.jpg"));
        assert!(!tree.contains_text("media/other.jpg"));
        assert!(!tree.contains_text(""));
    }

    #[test]
    fn test_contains_media_id_requires_label() {
        let tree = ContentNode::from_json(&json!({"count": 12, "hero_media_id": 7}));
        assert!(tree.contains_media_id(7));
        assert!(!tree.contains_media_id(12));
    }

    #[test]
    fn test_contains_media_id_in_arrays_inherits_label() {
        let tree = ContentNode::from_json(&json!({"gallery_media_ids": [3, "4", 5]}));
        assert!(tree.contains_media_id(4));
        assert!(tree.contains_media_id(5));
        assert!(!tree.contains_media_id(6));
    }

    #[test]
    fn test_contains_media_id_ignores_malformed() {
        let tree = ContentNode::from_json(&json!({"media_id": "not-a-number"}));
        assert!(!tree.contains_media_id(1));
    }

    #[test]
    fn test_walk_short_circuits() {
        let tree = ContentNode::from_json(&json!(["a", "b", "c"]));
        let mut seen = Vec::new();
        let found = tree.walk(&mut |_, text| {
            seen.push(text.to_string());
            text == "b"
        });
        assert!(found);
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_media_id_labels() {
        assert!(is_media_id_label("media_id"));
        assert!(is_media_id_label("background_media_id"));
        assert!(is_media_id_label("heroMediaId"));
        assert!(!is_media_id_label("id"));
        assert!(!is_media_id_label("media"));
    }
}
