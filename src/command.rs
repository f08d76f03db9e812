//! The `Command` interface consumed from external collaborators.
//!
//! The core never inspects what a Builtin does; it only needs enough
//! surface to dispatch to it and to decide how to parse its arguments.

use indexmap::IndexMap;

use crate::facade::EngineFacade;

/// How the Parser should treat a command's bracketed argument block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// `[k=v, k2=v2]` is parsed into an options map.
    KeyValue,
    /// Any bracket contents are taken verbatim as the message body;
    /// no key=value parsing is attempted.
    Raw,
}

/// A command implemented in the host process.
///
/// Implementations may call `get`/`set` on the Variable Store and
/// `push` on the command Stack through the injected `EngineFacade`.
pub trait Command {
    fn name(&self) -> &str;

    fn parse_mode(&self) -> ParseMode {
        ParseMode::KeyValue
    }

    /// True when this command does not modify engine state. Read-only
    /// commands do not reset `_status`/`_error` on success.
    fn read_only(&self) -> bool {
        false
    }

    fn execute(
        &self,
        facade: &mut EngineFacade,
        options: &IndexMap<String, String>,
        message: &str,
    ) -> Result<(), String>;

    fn description(&self) -> &str {
        ""
    }

    fn usage(&self) -> &str {
        ""
    }

    fn help_info(&self) -> &str {
        ""
    }
}
