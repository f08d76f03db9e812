//! Engine configuration, re-read from the Variable Store before each
//! popped stack entry (`echo_commands` tracks `_echo_command`).

/// `{echo_commands, recursion_limit, max_expansion_iterations, macro_expansion, default_command}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub echo_commands: bool,
    pub recursion_limit: u32,
    pub max_expansion_iterations: u32,
    pub macro_expansion: bool,
    /// The command name a line with no leading `\` is routed to (§4.3).
    pub default_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            echo_commands: false,
            recursion_limit: 50,
            max_expansion_iterations: 10,
            macro_expansion: true,
            default_command: "echo".to_string(),
        }
    }
}

/// Parse `_echo_command`-style boolean flags: `"true"`/`"1"`/`"yes"`
/// enable; `"false"`/`"0"`/`"no"`/`""` (and anything else) disable.
pub fn parse_bool_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::default();
        assert!(!config.echo_commands);
        assert_eq!(config.recursion_limit, 50);
        assert_eq!(config.max_expansion_iterations, 10);
        assert!(config.macro_expansion);
        assert_eq!(config.default_command, "echo");
    }

    #[test]
    fn bool_flag_recognizes_truthy_values() {
        assert!(parse_bool_flag("true"));
        assert!(parse_bool_flag("1"));
        assert!(parse_bool_flag("yes"));
        assert!(parse_bool_flag("YES"));
    }

    #[test]
    fn bool_flag_recognizes_falsy_values() {
        assert!(!parse_bool_flag("false"));
        assert!(!parse_bool_flag("0"));
        assert!(!parse_bool_flag("no"));
        assert!(!parse_bool_flag(""));
        assert!(!parse_bool_flag("garbage"));
    }
}
