use crate::yaml_diff::YamlDiffResult;
use serde::Serialize;
use yamldiff_common::{DiffKind, Difference};

/// Machine-readable report of one comparison
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub old: String,
    pub new: String,
    pub summary: ReportSummary,
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub added: usize,
    pub deleted: usize,
    pub modified: usize,
    pub type_changed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub kind: DiffKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    pub line: usize,
    pub column: usize,
}

impl From<&Difference> for ReportEntry {
    fn from(difference: &Difference) -> Self {
        Self {
            kind: difference.kind,
            path: difference.path.clone(),
            old_value: difference.old_value.clone(),
            new_value: difference.new_value.clone(),
            line: difference.location.line,
            column: difference.location.column,
        }
    }
}

impl DiffReport {
    pub fn build(old: &str, new: &str, result: &YamlDiffResult) -> Self {
        Self {
            old: old.to_string(),
            new: new.to_string(),
            summary: ReportSummary {
                total: result.total(),
                added: result.added,
                deleted: result.deleted,
                modified: result.modified,
                type_changed: result.type_changed,
            },
            entries: result.differences.iter().map(ReportEntry::from).collect(),
        }
    }
}
