//! Script body splitting: turn UTF-8 script text into the non-empty,
//! non-comment logical lines that get pushed onto the command stack.
//!
//! A line beginning with `%%` (after trim) is a comment and is dropped.
//! A line ending in `...` (after trim) continues onto the next physical
//! line; continuations are joined with a single space, mirroring the
//! worked example in spec scenario 6 (`\set[a=1] ...` + `value` →
//! `\set[a=1]  value`, note the double space from the trailing `...`
//! being replaced rather than stripped-and-trimmed).

/// Split a script body into the logical command lines the engine should
/// push onto the stack, in source order.
pub fn split_script_body(body: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for raw_line in body.lines() {
        let trimmed = raw_line.trim();

        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }

        let (content, continues) = match trimmed.strip_suffix("...") {
            Some(rest) => (rest.to_string(), true),
            None => (trimmed.to_string(), false),
        };

        pending = Some(match pending.take() {
            Some(prefix) => format!("{prefix} {content}"),
            None => content,
        });

        if !continues {
            if let Some(joined) = pending.take() {
                lines.push(joined);
            }
        }
    }

    // A dangling continuation at end-of-body is pushed as-is.
    if let Some(joined) = pending.take() {
        lines.push(joined);
    }

    lines
}
