use crate::collector::DiffCollector;
use crate::comparator::NodeComparator;
use crate::parser::{parse_document, parse_file};
use crate::tree::Node;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};
use yamldiff_common::{CompareOptions, DiffKind, Difference, YamlDiffError};

/// Default number of children a node needs before its branches are
/// compared in parallel
pub const DEFAULT_MIN_FAN_OUT: usize = 32;

/// Result of a YAML document comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YamlDiffResult {
    /// Number of subtrees present only in the new document
    pub added: usize,
    /// Number of subtrees present only in the old document
    pub deleted: usize,
    /// Number of scalar values that differ
    pub modified: usize,
    /// Number of nodes whose kind differs
    pub type_changed: usize,
    /// Differences in traversal order
    pub differences: Vec<Difference>,
}

impl YamlDiffResult {
    pub fn from_collector(collector: DiffCollector) -> Self {
        let mut result = Self::default();
        for difference in collector {
            match difference.kind {
                DiffKind::Added => result.added += 1,
                DiffKind::Deleted => result.deleted += 1,
                DiffKind::Modified => result.modified += 1,
                DiffKind::TypeChanged => result.type_changed += 1,
            }
            result.differences.push(difference);
        }
        result
    }

    pub fn total(&self) -> usize {
        self.differences.len()
    }

    pub fn is_identical(&self) -> bool {
        self.differences.is_empty()
    }
}

/// Engine for comparing YAML documents
pub struct YamlDiffEngine {
    options: CompareOptions,
    min_fan_out: Option<usize>,
}

impl YamlDiffEngine {
    pub fn new() -> Self {
        Self {
            options: CompareOptions::default(),
            min_fan_out: None,
        }
    }

    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    /// Compare wide nodes on worker threads (see [`NodeComparator::with_parallelism`])
    pub fn with_parallelism(mut self, min_fan_out: usize) -> Self {
        self.min_fan_out = Some(min_fan_out);
        self
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    fn comparator(&self) -> NodeComparator {
        let comparator = NodeComparator::new(self.options);
        match self.min_fan_out {
            Some(min) => comparator.with_parallelism(min),
            None => comparator,
        }
    }

    /// Compare two YAML files
    pub fn compare_files(&self, old: &Path, new: &Path) -> Result<YamlDiffResult, YamlDiffError> {
        info!("Comparing {} -> {}", old.display(), new.display());
        let old_root = parse_file(old)?;
        let new_root = parse_file(new)?;
        Ok(self.compare_nodes(old_root.as_ref(), new_root.as_ref()))
    }

    /// Compare two YAML documents held in memory
    pub fn compare_str(&self, old: &str, new: &str) -> Result<YamlDiffResult, YamlDiffError> {
        let old_root = parse_document(old, "old")?;
        let new_root = parse_document(new, "new")?;
        Ok(self.compare_nodes(old_root.as_ref(), new_root.as_ref()))
    }

    /// Compare two already parsed roots; an absent root is an empty document
    pub fn compare_nodes(&self, old: Option<&Node>, new: Option<&Node>) -> YamlDiffResult {
        let started = Instant::now();
        let comparator = self.comparator();
        let collector = comparator.diff(old, new);

        debug!(
            "Found {} differences in {:?} (parallel: {})",
            collector.len(),
            started.elapsed(),
            comparator.min_fan_out().is_some()
        );

        YamlDiffResult::from_collector(collector)
    }
}

impl Default for YamlDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a file path appears to be YAML based on extension
pub fn is_yaml_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(ext.as_str(), "yaml" | "yml")
    } else {
        false
    }
}
