//! Canonical addressing of nodes within a document.
//!
//! Paths are built from mapping-key and sequence-index steps:
//! `spec.containers[0].image`. The root path is the empty string.
//!
//! Keys that would make a path ambiguous (empty, or containing `.`, `[`, `]`,
//! `"` or `\`) are written in bracket-quoted form, `["a.b"]`, with `"` and `\`
//! backslash-escaped. A key literally named `a.b` therefore renders as
//! `["a.b"]` and never collides with key `b` nested under `a`.

/// One step of a traversal position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// Render a full step list into a path string
pub fn render(steps: &[PathStep]) -> String {
    steps.iter().fold(String::new(), |path, step| append(&path, step))
}

pub fn append(parent: &str, step: &PathStep) -> String {
    match step {
        PathStep::Key(key) => append_key(parent, key),
        PathStep::Index(index) => append_index(parent, *index),
    }
}

pub fn append_key(parent: &str, key: &str) -> String {
    if needs_quoting(key) {
        let mut path = String::with_capacity(parent.len() + key.len() + 4);
        path.push_str(parent);
        path.push_str("[\"");
        for ch in key.chars() {
            if ch == '"' || ch == '\\' {
                path.push('\\');
            }
            path.push(ch);
        }
        path.push_str("\"]");
        return path;
    }

    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

pub fn append_index(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']', '"', '\\'])
}
