//! Parser: split one already-expanded line into a command name,
//! bracketed `key=value` options, and a trailing message.
//!
//! ```text
//! line        := spaces? ( "\" name options? space* message? | message )
//! name        := [A-Za-z][A-Za-z0-9_-]*
//! options     := "[" kv ( "," kv )* "]"
//! kv          := key ( "=" value )?
//! key         := [A-Za-z_][A-Za-z0-9_-]*
//! value       := quoted | bareword
//! message     := rest-of-line
//! ```
//!
//! Only truly malformed bracket structures fail to parse; anything else
//! produces *some* parse, falling back to the default command with the
//! original text as the message.

use indexmap::IndexMap;

use crate::command::ParseMode;
use crate::errors::ParseError;

/// The result of parsing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub options: IndexMap<String, String>,
    pub message: String,
    pub raw_text: String,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse `line`, given `mode_of` to decide - once the command name is
/// known - whether its bracket block (if present) is `KeyValue` options
/// or a `Raw` message body, and `default_command` for the name a line
/// with no leading `\` (or a bare `\` with nothing valid after it)
/// routes to (§4.3). Returns `Ok(None)` for a `%%` comment line; `Err`
/// only for unbalanced brackets or an unterminated quote.
pub fn parse_line(
    line: &str,
    default_command: &str,
    mode_of: impl Fn(&str) -> ParseMode,
) -> Result<Option<ParsedCommand>, ParseError> {
    let raw_text = line.to_string();
    let trimmed = line.trim_start();

    if trimmed.starts_with("%%") {
        return Ok(None);
    }

    if let Some(rest) = trimmed.strip_prefix('\\') {
        let mut chars = rest.char_indices().peekable();
        let name_start = match chars.peek() {
            Some((_, c)) if is_name_start(*c) => true,
            _ => false,
        };

        if !name_start {
            // No valid command name after the backslash: fall back to
            // the default command with the whole line as the message.
            return Ok(Some(ParsedCommand {
                name: default_command.to_string(),
                options: IndexMap::new(),
                message: trimmed.to_string(),
                raw_text,
            }));
        }

        let mut name_end = rest.len();
        for (idx, c) in rest.char_indices() {
            if idx == 0 {
                continue;
            }
            if !is_name_char(c) {
                name_end = idx;
                break;
            }
        }
        let name = &rest[..name_end];
        let after_name = &rest[name_end..];

        let mode = mode_of(name);
        let (options, message_source) = match (mode, after_name.starts_with('[')) {
            (ParseMode::KeyValue, true) => {
                let (options, remainder) = parse_bracket(after_name)?;
                (options, remainder)
            }
            (ParseMode::Raw, true) => {
                let (inner, _remainder) = take_balanced_bracket(after_name)?;
                return Ok(Some(ParsedCommand {
                    name: name.to_string(),
                    options: IndexMap::new(),
                    message: inner,
                    raw_text,
                }));
            }
            (_, false) => (IndexMap::new(), after_name),
        };

        let message = message_source.trim_start().to_string();
        return Ok(Some(ParsedCommand {
            name: name.to_string(),
            options,
            message,
            raw_text,
        }));
    }

    // Default command fallback: the whole trimmed line is the message.
    Ok(Some(ParsedCommand {
        name: default_command.to_string(),
        options: IndexMap::new(),
        message: trimmed.to_string(),
        raw_text,
    }))
}

/// Consume a balanced `[...]` block starting at `s[0] == '['`, returning
/// the inner text (unparsed) and the remainder of `s` after the closing
/// bracket.
fn take_balanced_bracket(s: &str) -> Result<(String, &str), ParseError> {
    debug_assert!(s.starts_with('['));
    let chars: Vec<char> = s.chars().collect();
    let mut depth = 0i32;
    let mut in_quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = in_quote {
            if c == '\\' && i + 1 < chars.len() {
                i += 2;
                continue;
            }
            if c == q {
                in_quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' | '"' => in_quote = Some(c),
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let inner: String = chars[1..i].iter().collect();
                    let remainder_start: usize = chars[..i + 1].iter().map(|c| c.len_utf8()).sum();
                    return Ok((inner, &s[remainder_start..]));
                }
            }
            _ => {}
        }
        i += 1;
    }
    if in_quote.is_some() {
        return Err(ParseError::UnterminatedQuote(s.to_string()));
    }
    Err(ParseError::UnbalancedBrackets(s.to_string()))
}

/// Parse a `[k=v, k2="quoted value"]` block into an options map, honoring
/// backslash-escapes inside quoted values. Returns the map and the
/// remainder of the input after the closing bracket.
fn parse_bracket(s: &str) -> Result<(IndexMap<String, String>, &str), ParseError> {
    let (inner, remainder) = take_balanced_bracket(s)?;
    let mut options = IndexMap::new();

    for kv in split_top_level_commas(&inner) {
        let kv = kv.trim();
        if kv.is_empty() {
            continue;
        }
        if let Some(eq) = find_unquoted_equals(kv) {
            let key = kv[..eq].trim();
            let raw_value = kv[eq + 1..].trim();
            let value = unquote_value(raw_value)?;
            options.insert(key.to_string(), value);
        } else {
            options.insert(kv.to_string(), String::new());
        }
    }

    Ok((options, remainder))
}

fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if let Some(q) = in_quote {
            current.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                continue;
            }
            if c == q {
                in_quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                in_quote = Some(c);
                current.push(c);
            }
            ',' => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn find_unquoted_equals(s: &str) -> Option<usize> {
    let mut in_quote: Option<char> = None;
    let mut chars = s.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if let Some(q) = in_quote {
            if c == '\\' {
                chars.next();
                continue;
            }
            if c == q {
                in_quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => in_quote = Some(c),
            '=' => return Some(idx),
            _ => {}
        }
    }
    None
}

fn unquote_value(raw: &str) -> Result<String, ParseError> {
    let mut chars = raw.chars();
    let quote = match chars.clone().next() {
        Some(c @ ('\'' | '"')) => c,
        _ => return Ok(raw.to_string()),
    };
    chars.next();
    let mut out = String::new();
    let mut closed = false;
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }
        if c == quote {
            closed = true;
            break;
        }
        out.push(c);
    }
    if !closed {
        return Err(ParseError::UnterminatedQuote(raw.to_string()));
    }
    Ok(out)
}

/// Re-serialize a parsed command back into `\name[k=v,...] message` form
/// for the round-trip testable property in spec §8.
pub fn serialize(cmd: &ParsedCommand) -> String {
    if cmd.name.is_empty() {
        return cmd.message.clone();
    }
    let mut out = format!("\\{}", cmd.name);
    if !cmd.options.is_empty() {
        out.push('[');
        let pairs: Vec<String> = cmd
            .options
            .iter()
            .map(|(k, v)| if v.is_empty() { k.clone() } else { format!("{}={}", k, v) })
            .collect();
        out.push_str(&pairs.join(","));
        out.push(']');
    }
    if !cmd.message.is_empty() {
        out.push(' ');
        out.push_str(&cmd.message);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(_name: &str) -> ParseMode {
        ParseMode::KeyValue
    }
    fn raw(_name: &str) -> ParseMode {
        ParseMode::Raw
    }

    #[test]
    fn comment_line_yields_none() {
        assert_eq!(parse_line("%% header", "echo", kv).unwrap(), None);
        assert_eq!(parse_line("  %% indented", "echo", kv).unwrap(), None);
    }

    #[test]
    fn default_command_takes_whole_line() {
        let parsed = parse_line("hello world", "echo", kv).unwrap().unwrap();
        assert_eq!(parsed.name, "echo");
        assert_eq!(parsed.message, "hello world");
        assert!(parsed.options.is_empty());
    }

    #[test]
    fn default_command_name_is_configurable() {
        let parsed = parse_line("hello world", "say", kv).unwrap().unwrap();
        assert_eq!(parsed.name, "say");
        assert_eq!(parsed.message, "hello world");
    }

    #[test]
    fn named_command_with_message_only() {
        let parsed = parse_line("\\echo hello world", "echo", kv).unwrap().unwrap();
        assert_eq!(parsed.name, "echo");
        assert_eq!(parsed.message, "hello world");
        assert!(parsed.options.is_empty());
    }

    #[test]
    fn named_command_with_options() {
        let parsed = parse_line("\\set[x=hello]", "echo", kv).unwrap().unwrap();
        assert_eq!(parsed.name, "set");
        assert_eq!(parsed.options.get("x"), Some(&"hello".to_string()));
        assert_eq!(parsed.message, "");
    }

    #[test]
    fn options_with_multiple_keys_and_quotes() {
        let parsed = parse_line("\\set[a=1,b=\"two words\"] trailing", "echo", kv).unwrap().unwrap();
        assert_eq!(parsed.options.get("a"), Some(&"1".to_string()));
        assert_eq!(parsed.options.get("b"), Some(&"two words".to_string()));
        assert_eq!(parsed.message, "trailing");
    }

    #[test]
    fn quoted_value_honors_backslash_escape() {
        let parsed = parse_line("\\set[x=\"a\\\"b\"]", "echo", kv).unwrap().unwrap();
        assert_eq!(parsed.options.get("x"), Some(&"a\"b".to_string()));
    }

    #[test]
    fn unbalanced_bracket_fails() {
        let err = parse_line("\\set[x=1", "echo", kv).unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedBrackets(_)));
    }

    #[test]
    fn unterminated_quote_fails() {
        let err = parse_line("\\set[x=\"unterminated]", "echo", kv).unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedQuote(_)));
    }

    #[test]
    fn raw_mode_takes_bracket_contents_verbatim() {
        let parsed = parse_line("\\eval[a=1,b=2]", "echo", raw).unwrap().unwrap();
        assert_eq!(parsed.name, "eval");
        assert_eq!(parsed.message, "a=1,b=2");
        assert!(parsed.options.is_empty());
    }

    #[test]
    fn backslash_with_no_name_falls_back_to_default() {
        let parsed = parse_line("\\", "echo", kv).unwrap().unwrap();
        assert_eq!(parsed.name, "echo");
        assert_eq!(parsed.message, "\\");
    }

    #[test]
    fn try_target_keeps_leading_backslash_literal() {
        let parsed = parse_line("\\try \\nonexistent-command", "echo", kv).unwrap().unwrap();
        assert_eq!(parsed.name, "try");
        assert_eq!(parsed.message, "\\nonexistent-command");
    }

    #[test]
    fn serialize_round_trips() {
        let parsed = parse_line("\\set[x=hello] trailing msg", "echo", kv).unwrap().unwrap();
        let text = serialize(&parsed);
        let reparsed = parse_line(&text, "echo", kv).unwrap().unwrap();
        assert_eq!(parsed, reparsed);
    }

}
