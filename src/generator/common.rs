//! Common utilities for report generation.

/// Sanitize a string for use in filenames.
///
/// Keeps ascii alphanumerics, collapses whitespace and separators into single
/// dashes, and falls back to `fallback` when nothing printable remains.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !last_dash && !result.is_empty() {
                result.push('-');
                last_dash = true;
            }
        }
    }

    if result.is_empty() {
        return fallback.to_string();
    }

    result.trim_matches('-').to_string()
}

/// Class labels arrive with underscores standing in for spaces.
pub fn display_class_label(label: &str) -> String {
    label.replace('_', " ")
}

/// Directory name for one batch's output, derived from the class label.
pub fn output_dir_name(class_label: &str) -> String {
    format!("{}-report-cards", sanitize_filename(class_label, "class"))
}
