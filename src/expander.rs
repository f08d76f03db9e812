//! Expander: recursive `${...}` resolution.
//!
//! Innermost-first expansion over a whole line, implemented as a pure
//! function of `(&str, &VariableStore)`. A single pass (`expand_once`)
//! is a character scan that tracks a stack of open `${` offsets; a `}`
//! that closes the top of the stack resolves that group only if its raw
//! body contains no further `${` - a body that does still has an
//! unresolved nested reference and is left untouched until the next
//! pass, which is what makes the scan innermost-first without ever
//! re-scanning replacement text.

use crate::variables::VariableStore;

/// True iff `s` contains the substring `${`.
pub fn has_variables(s: &str) -> bool {
    s.contains("${")
}

/// Perform exactly one expansion pass over `s`.
pub fn expand_once(s: &str, store: &VariableStore) -> String {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    let mut open_markers: Vec<usize> = Vec::new();
    let mut matches: Vec<(usize, usize, String)> = Vec::new();

    let mut i = 0;
    while i < n {
        if chars[i] == '$' && i + 1 < n && chars[i + 1] == '{' {
            open_markers.push(i);
            i += 2;
            continue;
        }
        if chars[i] == '}' {
            if let Some(marker) = open_markers.pop() {
                let body_start = marker + 2;
                let body: String = chars[body_start..i].iter().collect();
                if !body.contains("${") {
                    matches.push((marker, i + 1, body));
                }
            }
            i += 1;
            continue;
        }
        i += 1;
    }

    if matches.is_empty() {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut cursor = 0;
    for (start, end, body) in matches {
        out.extend(chars[cursor..start].iter());
        out.push_str(&store.get(&body));
        cursor = end;
    }
    out.extend(chars[cursor..n].iter());
    out
}

/// Repeat `expand_once` up to `limit` times or until a fixed point,
/// whichever comes first. On a cycle (no fixed point within `limit`
/// passes) the current partial result is returned; expansion never
/// fails.
pub fn expand_with_limit(s: &str, limit: u32, store: &VariableStore) -> String {
    let mut current = s.to_string();
    for _ in 0..limit {
        let next = expand_once(&current, store);
        if next == current {
            return next;
        }
        current = next;
    }
    current
}

/// Shorthand used before parsing: full expansion plus whether the
/// original string contained any `${` at all.
pub fn interpolate_command_line(s: &str, store: &VariableStore) -> (String, bool) {
    (expand_with_limit(s, 10, store), has_variables(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(pairs: &[(&str, &str)]) -> VariableStore {
        let mut store = VariableStore::new();
        for (k, v) in pairs {
            store.set_system(k, *v);
        }
        store
    }

    #[test]
    fn has_variables_detects_marker() {
        assert!(has_variables("${x}"));
        assert!(!has_variables("plain text"));
    }

    #[test]
    fn expand_once_replaces_innermost_only() {
        let store = store_with(&[("c", "x"), ("b_x", "y"), ("a_y", "final")]);
        let once = expand_once("${a_${b_${c}}}", &store);
        assert_eq!(once, "${a_${b_x}}");
    }

    #[test]
    fn expand_with_limit_reaches_fixed_point() {
        let store = store_with(&[("c", "x"), ("b_x", "y"), ("a_y", "final")]);
        let result = expand_with_limit("${a_${b_${c}}}", 10, &store);
        assert_eq!(result, "final");
    }

    #[test]
    fn undefined_variable_is_empty() {
        let store = VariableStore::new();
        assert_eq!(expand_once("${undefined}", &store), "");
        assert_eq!(expand_with_limit("${a_${undefined}}", 10, &store), "");
    }

    #[test]
    fn malformed_forms() {
        let store = VariableStore::new();
        assert_eq!(expand_once("${}", &store), "");
        assert_eq!(expand_once("${unterminated", &store), "${unterminated");
        assert_eq!(expand_once("stray } here", &store), "stray } here");
    }

    #[test]
    fn cycle_terminates_within_limit() {
        let store = store_with(&[("a", "${b}"), ("b", "${a}")]);
        let result = expand_with_limit("${a}", 10, &store);
        // Implementation-pinned outcome for an unresolvable cycle: with an
        // even iteration cap the oscillation lands back on the `a` form.
        assert_eq!(result, "${a}");
    }

    #[test]
    fn fixed_point_is_idempotent() {
        let store = store_with(&[("x", "value")]);
        let once = expand_with_limit("${x}", 10, &store);
        let twice = expand_with_limit(&once, 10, &store);
        assert_eq!(once, twice);
    }

    #[test]
    fn interpolate_reports_had_vars() {
        let store = store_with(&[("x", "value")]);
        let (result, had_vars) = interpolate_command_line("${x}", &store);
        assert_eq!(result, "value");
        assert!(had_vars);

        let (result, had_vars) = interpolate_command_line("plain", &store);
        assert_eq!(result, "plain");
        assert!(!had_vars);
    }
}
