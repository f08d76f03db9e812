//! Engine: the single mutable owner of the Variable Store, the command
//! Stack, the Try/Silent frame stacks, the Builtin registry, and
//! Config. `process_stack` is the `while pop()` main loop of §4.5; it
//! inlines the Command Processor pipeline of §4.6 rather than
//! reintroducing the source's older state-machine design (§9).

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::json;

use crate::command::{Command, ParseMode};
use crate::config::{parse_bool_flag, Config};
use crate::errors::ExecutionError;
use crate::expander::expand_with_limit;
use crate::facade::EngineFacade;
use crate::parser::{parse_line, ParsedCommand};
use crate::registry::BuiltinRegistry;
use crate::resolver::{Resolved, Resolver, ScriptLoader, StdlibTable};
use crate::script::split_script_body;
use crate::stack::{CommandStack, SilentFrame, StackEntry, TryFrame};
use crate::try_silent::{capture_error, handle_silent_command, handle_try_command};
use crate::variables::VariableStore;

/// Callback for diagnostics the core cannot return through a normal
/// `Result` (the `skip_to_try_end` drained-stack case). Defaults to a
/// no-op; a CLI front end wires this to stderr.
pub type Diagnostics = Box<dyn Fn(&str)>;

fn silent_diagnostics() -> Diagnostics {
    Box::new(|_msg: &str| {})
}

/// The engine: owns everything the stack scheduler touches.
pub struct Engine {
    variables: VariableStore,
    stack: CommandStack,
    registry: BuiltinRegistry,
    stdlib: Box<dyn StdlibTable>,
    loader: Box<dyn ScriptLoader>,
    config: Config,
    diagnostics: Diagnostics,
}

impl Engine {
    /// Explicit init step (§9): builtins are gathered up front rather
    /// than relying on package-initialization side effects.
    pub fn new(
        builtins: Vec<Arc<dyn Command>>,
        stdlib: Box<dyn StdlibTable>,
        loader: Box<dyn ScriptLoader>,
        config: Config,
    ) -> Self {
        let mut registry = BuiltinRegistry::new();
        for builtin in builtins {
            registry.register(builtin);
        }
        Engine {
            variables: VariableStore::new(),
            stack: CommandStack::new(),
            registry,
            stdlib,
            loader,
            config,
            diagnostics: silent_diagnostics(),
        }
    }

    pub fn set_diagnostics(&mut self, sink: Diagnostics) {
        self.diagnostics = sink;
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn registry_mut(&mut self) -> &mut BuiltinRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one raw input line to completion. On success the stack is
    /// empty and no Try/Silent frame is open (§3 invariant, testable
    /// property 3).
    pub fn execute(&mut self, input: &str) -> Result<(), ExecutionError> {
        self.stack.push(input);
        self.process_stack()
    }

    fn process_stack(&mut self) -> Result<(), ExecutionError> {
        while let Some(entry) = self.stack.pop() {
            self.refresh_echo_config();

            match entry {
                StackEntry::ErrorBoundaryStart(id) => {
                    self.stack.try_frames.push(TryFrame { id, error_captured: false });
                }
                StackEntry::ErrorBoundaryEnd(id) => {
                    let frame = self.pop_try_frame_checked(&id)?;
                    if !frame.error_captured {
                        self.variables.set_system("_status", "0");
                        self.variables.set_system("_error", "");
                    }
                }
                StackEntry::SilentBoundaryStart(id) => {
                    self.stack.silent_frames.push(SilentFrame { id });
                }
                StackEntry::SilentBoundaryEnd(id) => {
                    self.pop_silent_frame_checked(&id)?;
                }
                StackEntry::Command(raw) => match self.process_command(&raw) {
                    Ok(()) => {}
                    Err(err) => {
                        if !self.stack.try_frames.is_empty() {
                            capture_error(&err.to_string(), &mut self.stack, &mut self.variables);
                            self.skip_to_try_end()?;
                        } else {
                            return Err(err);
                        }
                    }
                },
            }
        }
        Ok(())
    }

    fn refresh_echo_config(&mut self) {
        self.config.echo_commands = parse_bool_flag(&self.variables.get("_echo_command"));
    }

    fn pop_try_frame_checked(&mut self, id: &str) -> Result<TryFrame, ExecutionError> {
        match self.stack.try_frames.pop() {
            Some(frame) if frame.id == id => Ok(frame),
            Some(frame) => Err(ExecutionError::Internal(format!(
                "try frame id mismatch: expected end for '{id}', found open frame '{}'",
                frame.id
            ))),
            None => Err(ExecutionError::Internal(format!(
                "ERROR_BOUNDARY_END:{id} popped with no open try frame"
            ))),
        }
    }

    fn pop_silent_frame_checked(&mut self, id: &str) -> Result<SilentFrame, ExecutionError> {
        match self.stack.silent_frames.pop() {
            Some(frame) if frame.id == id => Ok(frame),
            Some(frame) => Err(ExecutionError::Internal(format!(
                "silent frame id mismatch: expected end for '{id}', found open frame '{}'",
                frame.id
            ))),
            None => Err(ExecutionError::Internal(format!(
                "SILENT_BOUNDARY_END:{id} popped with no open silent frame"
            ))),
        }
    }

    /// Pop entries until the `ERROR_BOUNDARY_END` matching the
    /// innermost open try frame is found, keeping nested try/silent
    /// boundaries encountered along the way consistent. Commands
    /// encountered while skipping are discarded unexecuted. If the
    /// stack drains first, a diagnostic is emitted and the loop simply
    /// ends - this indicates a programming error in whatever pushed the
    /// original boundary.
    fn skip_to_try_end(&mut self) -> Result<(), ExecutionError> {
        let target_id = match self.stack.current_try_id() {
            Some(id) => id.to_string(),
            None => return Ok(()),
        };
        loop {
            match self.stack.pop() {
                Some(StackEntry::ErrorBoundaryStart(id)) => {
                    self.stack.try_frames.push(TryFrame { id, error_captured: false });
                }
                Some(StackEntry::ErrorBoundaryEnd(id)) => {
                    self.pop_try_frame_checked(&id)?;
                    if id == target_id {
                        return Ok(());
                    }
                }
                Some(StackEntry::SilentBoundaryStart(id)) => {
                    self.stack.silent_frames.push(SilentFrame { id });
                }
                Some(StackEntry::SilentBoundaryEnd(id)) => {
                    self.pop_silent_frame_checked(&id)?;
                }
                Some(StackEntry::Command(_)) => {}
                None => {
                    (self.diagnostics)(&format!(
                        "skip_to_try_end: stack drained before matching ERROR_BOUNDARY_END:{target_id}"
                    ));
                    return Ok(());
                }
            }
        }
    }

    /// The Command Processor (§4.6): expand, parse, resolve, dispatch
    /// for one raw stack entry.
    fn process_command(&mut self, raw: &str) -> Result<(), ExecutionError> {
        let interpolated = expand_with_limit(raw, self.config.max_expansion_iterations, &self.variables);

        let parsed = parse_line(&interpolated, &self.config.default_command, |name| self.parse_mode_for(name))?
            .ok_or_else(|| ExecutionError::ParseFailed(format!("no command in '{interpolated}'")))?;

        let resolved = Resolver::new(&self.registry, self.stdlib.as_ref(), self.loader.as_ref())
            .resolve(&parsed.name)?;

        match resolved {
            Resolved::Try => {
                handle_try_command(&parsed.message, &mut self.stack, &mut self.variables);
                Ok(())
            }
            Resolved::Builtin(cmd) => self.dispatch_builtin(cmd, &parsed, &interpolated),
            Resolved::Stdlib { body, .. } => {
                self.dispatch_script(&parsed, &body);
                Ok(())
            }
            Resolved::User { body, .. } => {
                self.dispatch_script(&parsed, &body);
                Ok(())
            }
        }
    }

    fn parse_mode_for(&self, name: &str) -> ParseMode {
        match self.registry.get(name) {
            Some(cmd) => cmd.parse_mode(),
            None => ParseMode::KeyValue,
        }
    }

    fn dispatch_builtin(
        &mut self,
        cmd: Arc<dyn Command>,
        parsed: &ParsedCommand,
        interpolated: &str,
    ) -> Result<(), ExecutionError> {
        if self.config.echo_commands && !self.stack.is_silent() {
            println!("%%> {interpolated}");
        }

        let result = {
            let mut facade = EngineFacade::new(&mut self.variables, &mut self.stack);
            cmd.execute(&mut facade, &parsed.options, &parsed.message)
        };

        match result {
            Ok(()) => {
                if !self.registry.is_read_only(&parsed.name) {
                    self.variables.set_system("_status", "0");
                    self.variables.set_system("_error", "");
                }
                Ok(())
            }
            Err(message) => Err(ExecutionError::ExecutionFailed(message)),
        }
    }

    fn dispatch_script(&mut self, parsed: &ParsedCommand, body: &str) {
        self.bind_script_parameters(parsed);
        let lines = split_script_body(body);
        self.stack.push_lines_in_order(&lines);
    }

    fn bind_script_parameters(&mut self, parsed: &ParsedCommand) {
        self.variables.set_system("_0", parsed.name.clone());
        self.variables.set_system("_1", parsed.message.clone());
        self.variables.set_system("_*", parsed.message.clone());
        self.variables.set_system("_@", serialize_options(&parsed.options));
        for (key, value) in &parsed.options {
            self.variables.bind(key, value.clone());
        }
    }

    /// `silent target` is an ordinary collaborator builtin from the
    /// spec's point of view; the core's actual contribution is the
    /// push/pop machinery it calls into via the facade.
    pub fn push_silent(&mut self, target: &str) {
        handle_silent_command(target, &mut self.stack);
    }
}

fn serialize_options(options: &IndexMap<String, String>) -> String {
    let map: serde_json::Map<String, serde_json::Value> =
        options.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
    serde_json::Value::Object(map).to_string()
}
