use crate::tree::Node;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, ScanError, TScalarStyle};
use yamldiff_common::{Location, YamlDiffError};

/// Expanded node count every document may reach regardless of its size
const MAX_EXPANDED_NODES: usize = 10_000;

/// Beyond the floor, aliases may expand a document to at most this many
/// nodes per parser event
const MAX_EXPANSION_RATIO: usize = 100;

/// Parse the first document of a YAML stream into a located tree.
///
/// Returns `Ok(None)` for an empty stream. Aliases are resolved against
/// their anchors, so every alias node in the tree carries its target.
/// Duplicate scalar keys within one mapping are rejected, and so are
/// documents whose aliases expand far beyond their own size.
pub fn parse_document(source: &str, source_name: &str) -> Result<Option<Node>, YamlDiffError> {
    let mut builder = TreeBuilder::new(source_name);
    let mut parser = Parser::new_from_str(source);
    parser
        .load(&mut builder, true)
        .map_err(|e| scan_error(source_name, &e))?;
    builder.finish()
}

pub fn parse_bytes(bytes: &[u8], source_name: &str) -> Result<Option<Node>, YamlDiffError> {
    let source = std::str::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
        let line_start = valid.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
        let column = String::from_utf8_lossy(&valid[line_start..]).chars().count() + 1;
        YamlDiffError::Parse {
            source_name: source_name.to_string(),
            line,
            column,
            message: "document is not valid UTF-8".to_string(),
        }
    })?;
    parse_document(source, source_name)
}

pub fn parse_file(path: &Path) -> Result<Option<Node>, YamlDiffError> {
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes, &path.display().to_string())
}

fn scan_error(source_name: &str, error: &ScanError) -> YamlDiffError {
    let marker = error.marker();
    YamlDiffError::Parse {
        source_name: source_name.to_string(),
        line: marker.line(),
        column: marker.col() + 1,
        message: error.info().to_string(),
    }
}

/// Identity of a scalar mapping key.
///
/// Plain `1` and quoted `"1"` are different keys, as are differently
/// tagged scalars with the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScalarKey {
    text: String,
    tag: Option<String>,
    quoted: bool,
}

/// Anchored node with the number of nodes it expands to
struct Anchored {
    node: Arc<Node>,
    expanded: usize,
    key: Option<ScalarKey>,
}

/// Collection under construction
enum Frame {
    Sequence {
        anchor: usize,
        location: Location,
        items: Vec<Node>,
        expanded: usize,
    },
    Mapping {
        anchor: usize,
        location: Location,
        children: Vec<Node>,
        keys: HashSet<ScalarKey>,
        expanded: usize,
    },
}

struct TreeBuilder<'a> {
    source_name: &'a str,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Anchored>,
    root: Option<Node>,
    documents: usize,
    /// Node events seen so far
    events: usize,
    /// Nodes seen so far with every alias counted as its full target
    expanded: usize,
    error: Option<YamlDiffError>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source_name: &'a str) -> Self {
        Self {
            source_name,
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            documents: 0,
            events: 0,
            expanded: 0,
            error: None,
        }
    }

    fn finish(self) -> Result<Option<Node>, YamlDiffError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if !self.stack.is_empty() {
            return Err(YamlDiffError::InvariantViolation(format!(
                "{}: {} collection(s) left open at end of stream",
                self.source_name,
                self.stack.len()
            )));
        }
        if self.documents > 1 {
            warn!(
                "{} contains {} documents; only the first is compared",
                self.source_name, self.documents
            );
        }
        debug!(
            "Parsed {} ({} anchors, {} events, {} expanded nodes, empty: {})",
            self.source_name,
            self.anchors.len(),
            self.events,
            self.expanded,
            self.root.is_none()
        );
        Ok(self.root)
    }

    fn handle(&mut self, event: Event, mark: Marker) -> Result<(), YamlDiffError> {
        let location = Location::new(mark.line(), mark.col() + 1);

        match event {
            Event::DocumentStart { .. } => {
                self.documents += 1;
                Ok(())
            }
            Event::Scalar(text, style, anchor, tag) => {
                self.count_node(1, location)?;
                let key = (anchor > 0 || self.at_key_position()).then(|| ScalarKey {
                    text: text.clone(),
                    tag: tag.map(|t| format!("{}{}", t.handle, t.suffix)),
                    quoted: style != TScalarStyle::Plain,
                });
                if let Some(key) = &key {
                    self.check_key(key, location)?;
                }
                self.complete(Node::scalar(text, location), anchor, 1, key)
            }
            Event::Alias(id) => {
                let (target, expanded, key) = match self.anchors.get(&id) {
                    Some(anchored) => (
                        Arc::clone(&anchored.node),
                        anchored.expanded,
                        anchored.key.clone(),
                    ),
                    None => {
                        return Err(self.parse_error(
                            location,
                            "alias refers to an anchor that is not defined yet",
                        ))
                    }
                };
                self.count_node(expanded, location)?;
                if let Some(key) = &key {
                    self.check_key(key, location)?;
                }
                self.complete(Node::alias(target, location), 0, expanded, None)
            }
            Event::SequenceStart(anchor, ..) => {
                self.count_node(1, location)?;
                self.stack.push(Frame::Sequence {
                    anchor,
                    location,
                    items: Vec::new(),
                    expanded: 1,
                });
                Ok(())
            }
            Event::MappingStart(anchor, ..) => {
                self.count_node(1, location)?;
                self.stack.push(Frame::Mapping {
                    anchor,
                    location,
                    children: Vec::new(),
                    keys: HashSet::new(),
                    expanded: 1,
                });
                Ok(())
            }
            Event::SequenceEnd => match self.stack.pop() {
                Some(Frame::Sequence {
                    anchor,
                    location,
                    items,
                    expanded,
                }) => self.complete(Node::sequence(items, location), anchor, expanded, None),
                _ => Err(YamlDiffError::InvariantViolation(format!(
                    "{}: sequence end at {} without a matching start",
                    self.source_name, location
                ))),
            },
            Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Mapping {
                    anchor,
                    location,
                    children,
                    expanded,
                    ..
                }) => {
                    // Block mappings are announced at their first key's
                    // indicator, flow mappings at their opening brace
                    let location = children
                        .first()
                        .map_or(location, |key| location.min(key.location()));
                    let node = Node::mapping_from_children(children, location)?;
                    self.complete(node, anchor, expanded, None)
                }
                _ => Err(YamlDiffError::InvariantViolation(format!(
                    "{}: mapping end at {} without a matching start",
                    self.source_name, location
                ))),
            },
            _ => Ok(()),
        }
    }

    fn complete(
        &mut self,
        node: Node,
        anchor: usize,
        expanded: usize,
        key: Option<ScalarKey>,
    ) -> Result<(), YamlDiffError> {
        if anchor > 0 {
            self.anchors.insert(
                anchor,
                Anchored {
                    node: Arc::new(node.clone()),
                    expanded,
                    key,
                },
            );
        }

        match self.stack.last_mut() {
            Some(Frame::Sequence {
                items,
                expanded: total,
                ..
            }) => {
                items.push(node);
                *total = total.saturating_add(expanded);
            }
            Some(Frame::Mapping {
                children,
                expanded: total,
                ..
            }) => {
                children.push(node);
                *total = total.saturating_add(expanded);
            }
            None => {
                if self.documents <= 1 && self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
        Ok(())
    }

    /// Account for one node event that expands to `expanded` nodes
    fn count_node(&mut self, expanded: usize, location: Location) -> Result<(), YamlDiffError> {
        self.events += 1;
        self.expanded = self.expanded.saturating_add(expanded);

        let limit = MAX_EXPANDED_NODES.max(self.events.saturating_mul(MAX_EXPANSION_RATIO));
        if self.expanded > limit {
            return Err(self.parse_error(
                location,
                &format!(
                    "excessive aliasing: {} nodes expand to more than {}",
                    self.events, limit
                ),
            ));
        }
        Ok(())
    }

    fn at_key_position(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { children, .. }) if children.len() % 2 == 0)
    }

    /// Reject a scalar key already present in the enclosing mapping
    fn check_key(&mut self, key: &ScalarKey, location: Location) -> Result<(), YamlDiffError> {
        let duplicate = match self.stack.last_mut() {
            Some(Frame::Mapping { children, keys, .. }) if children.len() % 2 == 0 => {
                !keys.insert(key.clone())
            }
            _ => false,
        };
        if duplicate {
            return Err(self.parse_error(
                location,
                &format!("duplicate mapping key `{}`", key.text),
            ));
        }
        Ok(())
    }

    fn parse_error(&self, location: Location, message: &str) -> YamlDiffError {
        YamlDiffError::Parse {
            source_name: self.source_name.to_string(),
            line: location.line,
            column: location.column,
            message: message.to_string(),
        }
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.handle(event, mark) {
            self.error = Some(e);
        }
    }
}
