// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input normalization applied before pattern matching.

use unicode_normalization::UnicodeNormalization;

/// Upper bound on accepted prompt length, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 2000;

/// Normalizes user input: NFKC, control characters other than newline and
/// tab removed, whitespace runs collapsed, blank-line runs folded to one,
/// and the result capped at `max_chars` characters.
pub fn sanitize(text: &str, max_chars: usize) -> String {
    let normalized: String = text
        .nfkc()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    let mut lines: Vec<String> = Vec::new();
    for line in normalized.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        let previous_blank = lines.last().is_some_and(|l| l.is_empty());
        if collapsed.is_empty() && (previous_blank || lines.is_empty()) {
            continue;
        }
        lines.push(collapsed);
    }

    let joined = lines.join("\n");
    joined.trim().chars().take(max_chars).collect::<String>().trim_end().to_string()
}
