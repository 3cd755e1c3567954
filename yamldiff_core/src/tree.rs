use std::sync::Arc;
use yamldiff_common::{Location, YamlDiffError};

/// Kind of a parsed node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Mapping,
    Sequence,
    Alias,
}

impl NodeKind {
    /// Human-readable label used in type-change reports
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::Alias => "alias",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Scalar(String),
    /// Key/value pairs in document order
    Mapping(Vec<(Node, Node)>),
    Sequence(Vec<Node>),
    /// Reference to an anchored node, resolved at parse time
    Alias(Arc<Node>),
}

/// One element of a parsed document tree.
///
/// Trees are built once by the parser and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    value: NodeValue,
    location: Location,
}

impl Node {
    pub fn scalar(text: impl Into<String>, location: Location) -> Self {
        Self {
            value: NodeValue::Scalar(text.into()),
            location,
        }
    }

    pub fn mapping(entries: Vec<(Node, Node)>, location: Location) -> Self {
        Self {
            value: NodeValue::Mapping(entries),
            location,
        }
    }

    /// Build a mapping from a flat `key, value, key, value, ...` child list.
    ///
    /// An odd number of children breaks the pairing invariant and is rejected.
    pub fn mapping_from_children(
        children: Vec<Node>,
        location: Location,
    ) -> Result<Self, YamlDiffError> {
        if children.len() % 2 != 0 {
            return Err(YamlDiffError::InvariantViolation(format!(
                "mapping at {} has {} children, expected key/value pairs",
                location,
                children.len()
            )));
        }

        let mut entries = Vec::with_capacity(children.len() / 2);
        let mut iter = children.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            entries.push((key, value));
        }

        Ok(Self::mapping(entries, location))
    }

    pub fn sequence(items: Vec<Node>, location: Location) -> Self {
        Self {
            value: NodeValue::Sequence(items),
            location,
        }
    }

    pub fn alias(target: Arc<Node>, location: Location) -> Self {
        Self {
            value: NodeValue::Alias(target),
            location,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.value {
            NodeValue::Scalar(_) => NodeKind::Scalar,
            NodeValue::Mapping(_) => NodeKind::Mapping,
            NodeValue::Sequence(_) => NodeKind::Sequence,
            NodeValue::Alias(_) => NodeKind::Alias,
        }
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Follow alias references down to the node they point at
    pub fn resolve(&self) -> &Node {
        let mut current = self;
        while let NodeValue::Alias(target) = &current.value {
            current = target.as_ref();
        }
        current
    }

    /// Scalar text, if this node (after alias resolution) is a scalar
    pub fn as_scalar(&self) -> Option<&str> {
        match &self.resolve().value {
            NodeValue::Scalar(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Node, Node)]> {
        match &self.resolve().value {
            NodeValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.resolve().value {
            NodeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a mapping value by its exact key text
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k.as_scalar() == Some(key))
            .map(|(_, v)| v)
    }

    /// Text used to address this node as a mapping key
    pub fn key_text(&self) -> String {
        match self.as_scalar() {
            Some(text) => text.to_string(),
            None => self.summary(),
        }
    }

    /// Compact flow-style rendering of the whole subtree
    pub fn summary(&self) -> String {
        let mut out = String::new();
        write_summary(self.resolve(), &mut out);
        out
    }
}

fn write_summary(node: &Node, out: &mut String) {
    match &node.value {
        NodeValue::Scalar(text) => out.push_str(text),
        NodeValue::Mapping(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_summary(key.resolve(), out);
                out.push_str(": ");
                write_summary(value.resolve(), out);
            }
            out.push('}');
        }
        NodeValue::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_summary(item.resolve(), out);
            }
            out.push(']');
        }
        NodeValue::Alias(target) => write_summary(target.resolve(), out),
    }
}
