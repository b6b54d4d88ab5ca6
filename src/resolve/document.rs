//! Value lookups in YAML and JSON documents
//!
//! Documents are parsed with tree-sitter so scalars are reported exactly as
//! written: `appVersion: 1.20` stays `1.20`.
//!
//! YAML tree structure walked by [`Document::lookup`]:
//! ```text
//! stream
//!   document
//!     block_node
//!       block_mapping
//!         block_mapping_pair        <- "image: ..."
//!           flow_node               <- key: "image"
//!           block_node              <- value
//!             block_sequence
//!               block_sequence_item <- "- v1.2.3"
//!                 flow_node
//!                   plain_scalar    <- TARGET
//! ```

use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

use super::ResolutionError;

/// Aliases nested deeper than this are treated as unresolvable
const MAX_ALIAS_DEPTH: usize = 32;

/// Result of walking a value path
#[derive(Debug, Clone, Copy)]
pub enum Entry<'t> {
    /// The key exists but carries no value
    Empty,
    Node(Node<'t>),
}

/// A parsed YAML (or JSON) file
pub struct Document {
    path: PathBuf,
    source: String,
    tree: Tree,
}

impl Document {
    /// Read and parse the document at `path`
    pub fn load(path: &Path) -> Result<Self, ResolutionError> {
        let source = std::fs::read_to_string(path).map_err(|source| ResolutionError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(path, source)
    }

    /// Parse `source`, reporting errors against `path`
    pub fn parse(path: &Path, source: String) -> Result<Self, ResolutionError> {
        let parse_error = |reason: String| ResolutionError::Parse {
            path: path.to_path_buf(),
            reason,
        };

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_yaml::LANGUAGE.into())
            .map_err(|e| parse_error(format!("failed to load the YAML grammar: {}", e)))?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| parse_error("parser produced no syntax tree".to_string()))?;

        if let Some(node) = first_error(tree.root_node()) {
            let position = node.start_position();
            return Err(parse_error(format!(
                "syntax error at line {}, column {}",
                position.row + 1,
                position.column + 1
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            source,
            tree,
        })
    }

    fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// Content node of the first document in the stream
    fn root(&self) -> Option<Node<'_>> {
        let stream = self.tree.root_node();
        let mut cursor = stream.walk();
        let document = stream
            .named_children(&mut cursor)
            .find(|n| n.kind() == "document")?;

        let mut cursor = document.walk();
        let node = document
            .named_children(&mut cursor)
            .find(|n| matches!(n.kind(), "block_node" | "flow_node"))?;
        Some(node)
    }

    /// Walk a dot-separated path through nested mappings and sequences
    ///
    /// Numeric segments index into sequences. Empty segments are skipped, so an
    /// empty path addresses the document root.
    pub fn lookup(&self, value_path: &str) -> Option<Entry<'_>> {
        let mut current = match self.root() {
            Some(node) => Entry::Node(node),
            None => Entry::Empty,
        };

        for segment in value_path.split('.').filter(|segment| !segment.is_empty()) {
            let Entry::Node(node) = current else {
                return None;
            };
            current = self.child(node, segment)?;
        }

        Some(current)
    }

    fn child<'t>(&'t self, node: Node<'t>, segment: &str) -> Option<Entry<'t>> {
        let node = self.content(node, 0)?;

        match node.kind() {
            "block_mapping" | "flow_mapping" => {
                let mut cursor = node.walk();
                let pair = node
                    .named_children(&mut cursor)
                    .filter(|n| matches!(n.kind(), "block_mapping_pair" | "flow_pair"))
                    .find(|pair| {
                        pair.child_by_field_name("key")
                            .and_then(|key| self.scalar(key))
                            .is_some_and(|key| key == segment)
                    })?;

                Some(match pair.child_by_field_name("value") {
                    Some(value) => Entry::Node(value),
                    None => Entry::Empty,
                })
            }
            "block_sequence" => {
                let index = segment.parse::<usize>().ok()?;
                let mut cursor = node.walk();
                let item = node
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() == "block_sequence_item")
                    .nth(index)?;

                let mut cursor = item.walk();
                let value = item
                    .named_children(&mut cursor)
                    .find(|n| matches!(n.kind(), "block_node" | "flow_node"));
                Some(value.map_or(Entry::Empty, Entry::Node))
            }
            "flow_sequence" => {
                let index = segment.parse::<usize>().ok()?;
                let mut cursor = node.walk();
                let item = node
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() != "comment")
                    .nth(index)?;
                Some(Entry::Node(item))
            }
            _ => None,
        }
    }

    /// The value node inside a `block_node` or `flow_node`, following aliases
    fn content<'t>(&'t self, node: Node<'t>, depth: usize) -> Option<Node<'t>> {
        if !matches!(node.kind(), "block_node" | "flow_node") {
            return Some(node);
        }

        let mut cursor = node.walk();
        let inner = node
            .named_children(&mut cursor)
            .find(|n| !matches!(n.kind(), "tag" | "anchor" | "comment"))?;

        if inner.kind() == "alias" {
            if depth >= MAX_ALIAS_DEPTH {
                return None;
            }
            let name = self.text(inner).trim_start_matches('*');
            let anchored = self.anchored(self.tree.root_node(), name)?;
            return self.content(anchored, depth + 1);
        }

        Some(inner)
    }

    /// Node carrying the anchor `&name`
    fn anchored<'t>(&'t self, node: Node<'t>, name: &str) -> Option<Node<'t>> {
        if node.kind() == "anchor" && self.text(node).trim_start_matches('&') == name {
            return node.parent();
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
        children.into_iter().find_map(|child| self.anchored(child, name))
    }

    /// Plain string form of a scalar node, as written in the source
    ///
    /// Quoted and block scalars are unescaped. Nulls, mappings and sequences
    /// are not scalars.
    pub fn scalar(&self, node: Node<'_>) -> Option<String> {
        let node = self.content(node, 0)?;
        let text = self.text(node);

        match node.kind() {
            "plain_scalar" => {
                let mut cursor = node.walk();
                let is_null = node
                    .named_children(&mut cursor)
                    .any(|n| n.kind() == "null_scalar");
                if is_null {
                    return None;
                }
                // multi-line plain scalars fold into single spaces
                Some(text.lines().map(str::trim).collect::<Vec<_>>().join(" "))
            }
            "double_quote_scalar" | "single_quote_scalar" | "block_scalar" => {
                serde_yaml::from_str::<String>(text).ok()
            }
            _ => None,
        }
    }

    /// Extract the scalar at `value_path`
    pub fn value(&self, value_path: &str) -> Result<String, ResolutionError> {
        let entry = self.lookup(value_path).ok_or_else(|| ResolutionError::NotFound {
            what: format!("value '{}'", value_path),
            location: self.path.display().to_string(),
        })?;

        let value = match entry {
            Entry::Node(node) => self.scalar(node),
            Entry::Empty => None,
        };

        value.ok_or_else(|| ResolutionError::NotAScalar {
            path: self.path.clone(),
            value_path: value_path.to_string(),
        })
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error).or(Some(node))
}

/// Read the scalar at `value_path` from the document at `path`
pub fn read_value(path: &Path, value_path: &str) -> Result<String, ResolutionError> {
    Document::load(path)?.value(value_path)
}
