use yamldiff_common::{DiffKind, Difference};
use yamldiff_core::html_report::display_path;
use yamldiff_core::YamlDiffResult;

const RESET: &str = "\x1b[0m";
const COLUMN_WIDTH: usize = 58;

fn color(kind: DiffKind) -> &'static str {
    match kind {
        DiffKind::Added => "\x1b[32m",       // Green
        DiffKind::Deleted => "\x1b[31m",     // Red
        DiffKind::Modified => "\x1b[33m",    // Yellow
        DiffKind::TypeChanged => "\x1b[35m", // Magenta
    }
}

fn symbol(kind: DiffKind) -> char {
    match kind {
        DiffKind::Added => '+',
        DiffKind::Deleted => '-',
        DiffKind::Modified => '~',
        DiffKind::TypeChanged => '!',
    }
}

fn paint(text: &str, kind: DiffKind, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color(kind), text, RESET)
    } else {
        text.to_string()
    }
}

fn entry_text(difference: &Difference, value: &str) -> String {
    format!(
        "{} {} (line {}): {}",
        symbol(difference.kind),
        display_path(&difference.path),
        difference.location.line,
        value
    )
}

/// One line per difference
pub fn render_list(result: &YamlDiffResult, use_color: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "=".repeat(80)));
    out.push_str("Differences\n");
    out.push_str(&format!("{}\n", "=".repeat(80)));

    for difference in &result.differences {
        let old = difference.old_value.as_deref().unwrap_or("");
        let new = difference.new_value.as_deref().unwrap_or("");
        let value = match difference.kind {
            DiffKind::Added => new.to_string(),
            DiffKind::Deleted => old.to_string(),
            DiffKind::Modified | DiffKind::TypeChanged => format!("{} -> {}", old, new),
        };
        out.push_str(&paint(&entry_text(difference, &value), difference.kind, use_color));
        out.push('\n');
    }

    out.push_str(&render_summary(result, use_color));
    out
}

/// Side-by-side view: old values on the left, new values on the right
pub fn render_columns(
    old_name: &str,
    new_name: &str,
    result: &YamlDiffResult,
    use_color: bool,
) -> String {
    let width = COLUMN_WIDTH * 2 + 4;
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "=".repeat(width)));
    out.push_str(&format!(
        "{:<w$} || {:<w$}\n",
        truncate_text(&format!("Old: {}", old_name), COLUMN_WIDTH),
        truncate_text(&format!("New: {}", new_name), COLUMN_WIDTH),
        w = COLUMN_WIDTH
    ));
    out.push_str(&format!("{}\n", "-".repeat(width)));

    for difference in &result.differences {
        let left = match (&difference.old_value, difference.kind.has_old()) {
            (Some(value), true) => entry_text(difference, value),
            _ => String::new(),
        };
        let right = match (&difference.new_value, difference.kind.has_new()) {
            (Some(value), true) => entry_text(difference, value),
            _ => String::new(),
        };

        let left = format!("{:<w$}", truncate_text(&left, COLUMN_WIDTH), w = COLUMN_WIDTH);
        let right = truncate_text(&right, COLUMN_WIDTH);
        out.push_str(&format!(
            "{} || {}\n",
            paint(&left, difference.kind, use_color),
            paint(&right, difference.kind, use_color)
        ));
    }
    out.push_str(&format!("{}\n", "=".repeat(width)));

    out.push_str(&render_summary(result, use_color));
    out
}

fn render_summary(result: &YamlDiffResult, use_color: bool) -> String {
    let mark = |kind: DiffKind| {
        let text = format!("({})", symbol(kind));
        paint(&text, kind, use_color)
    };

    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "=".repeat(80)));
    out.push_str("Summary:\n");
    out.push_str(&format!("  Total differences: {}\n", result.total()));
    out.push_str(&format!("  Added:             {} {}\n", result.added, mark(DiffKind::Added)));
    out.push_str(&format!("  Deleted:           {} {}\n", result.deleted, mark(DiffKind::Deleted)));
    out.push_str(&format!("  Modified:          {} {}\n", result.modified, mark(DiffKind::Modified)));
    out.push_str(&format!(
        "  Type changed:      {} {}\n",
        result.type_changed,
        mark(DiffKind::TypeChanged)
    ));
    out.push_str(&format!("{}\n", "=".repeat(80)));
    out
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    // Keep the start (symbol and path) visible
    let suffix = "...";
    let keep_len = max_len.saturating_sub(suffix.len());

    // Use chars to avoid splitting UTF-8 characters
    let prefix: String = text.chars().take(keep_len).collect();
    format!("{}{}", prefix, suffix)
}
