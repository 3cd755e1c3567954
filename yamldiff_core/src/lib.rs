pub mod collector;
pub mod comparator;
pub mod html_report;
pub mod parser;
pub mod path;
pub mod report;
pub mod tree;
pub mod yaml_diff;

pub use collector::DiffCollector;
pub use comparator::NodeComparator;
pub use html_report::HtmlReport;
pub use parser::{parse_bytes, parse_document, parse_file};
pub use path::PathStep;
pub use report::DiffReport;
pub use tree::{Node, NodeKind, NodeValue};
pub use yaml_diff::{is_yaml_file, YamlDiffEngine, YamlDiffResult, DEFAULT_MIN_FAN_OUT};
