use std::fs;
use std::path::Path;
use tracing::info;
use yamldiff_common::{DiffKind, Difference, YamlDiffError};

const STYLE: &str = "\
body { font-family: -apple-system, Segoe UI, sans-serif; margin: 2rem; color: #222; }
h1 { font-size: 1.4rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }
th { background: #f5f5f5; }
code { font-family: SFMono-Regular, Consolas, monospace; white-space: pre-wrap; }
tr.added td.kind { color: #1a7f37; }
tr.deleted td.kind { color: #cf222e; }
tr.modified td.kind, tr.type_changed td.kind { color: #9a6700; }
td.empty { color: #999; }
";

/// Renders a comparison as a standalone HTML page.
///
/// Added entries show only the new side, deleted entries only the old side,
/// modified and type-changed entries show both.
pub struct HtmlReport;

impl HtmlReport {
    pub fn render(old_name: &str, new_name: &str, differences: &[Difference]) -> String {
        let mut html = String::with_capacity(2048 + differences.len() * 256);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<title>YAML diff report</title>\n<style>\n");
        html.push_str(STYLE);
        html.push_str("</style>\n</head>\n<body>\n");

        html.push_str(&format!(
            "<h1>Comparing <code>{}</code> and <code>{}</code></h1>\n",
            escape_html(old_name),
            escape_html(new_name)
        ));
        html.push_str(&format!(
            "<p class=\"summary\">Found {} difference{}</p>\n",
            differences.len(),
            if differences.len() == 1 { "" } else { "s" }
        ));

        if differences.is_empty() {
            html.push_str("<p>The documents are identical.</p>\n");
        } else {
            html.push_str("<table>\n<thead><tr><th>Change</th><th>Path</th><th>Line</th>");
            html.push_str("<th>Old value</th><th>New value</th></tr></thead>\n<tbody>\n");
            for difference in differences {
                html.push_str(&Self::render_row(difference));
            }
            html.push_str("</tbody>\n</table>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_row(difference: &Difference) -> String {
        let kind = difference.kind;
        let old_cell = if kind.has_old() {
            value_cell(difference.old_value.as_deref())
        } else {
            "<td class=\"empty\"></td>".to_string()
        };
        let new_cell = if kind.has_new() {
            value_cell(difference.new_value.as_deref())
        } else {
            "<td class=\"empty\"></td>".to_string()
        };

        format!(
            "<tr class=\"{}\"><td class=\"kind\">{}</td><td><code>{}</code></td><td>{}</td>{}{}</tr>\n",
            kind.label(),
            kind_symbol(kind),
            escape_html(display_path(&difference.path)),
            difference.location.line,
            old_cell,
            new_cell
        )
    }

    /// Render and write the report, creating missing parent directories
    pub fn write(
        output: &Path,
        old_name: &str,
        new_name: &str,
        differences: &[Difference],
    ) -> Result<(), YamlDiffError> {
        if output.as_os_str().is_empty() {
            return Err(YamlDiffError::Report("output path cannot be empty".to_string()));
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(output, Self::render(old_name, new_name, differences))?;
        info!("HTML report written to {}", output.display());
        Ok(())
    }
}

fn kind_symbol(kind: DiffKind) -> &'static str {
    match kind {
        DiffKind::Added => "+ added",
        DiffKind::Deleted => "- deleted",
        DiffKind::Modified => "~ modified",
        DiffKind::TypeChanged => "! type changed",
    }
}

fn value_cell(value: Option<&str>) -> String {
    format!("<td><code>{}</code></td>", escape_html(value.unwrap_or("")))
}

/// The root path is empty; show it as `(root)`
pub fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "(root)"
    } else {
        path
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
