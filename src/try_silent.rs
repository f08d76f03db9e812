//! Try/Silent Handlers (§4.7, §4.8): id generation, error capture, and
//! the boundary pushes that the Command Processor delegates to when it
//! dispatches a `Try` resolution or a `silent` builtin.

use crate::errors::strip_known_prefix;
use crate::stack::CommandStack;
use crate::variables::VariableStore;

/// `try_id_<depth>` / `silent_id_<depth>`, unique within one push
/// because depth only grows while the corresponding frame is open.
pub fn next_try_id(stack: &CommandStack) -> String {
    format!("try_id_{}", stack.try_frames.len())
}

pub fn next_silent_id(stack: &CommandStack) -> String {
    format!("silent_id_{}", stack.silent_frames.len())
}

/// `\try target_message`. An empty or whitespace-only target clears the
/// error state directly and returns without opening a boundary.
pub fn handle_try_command(target_message: &str, stack: &mut CommandStack, variables: &mut VariableStore) {
    if target_message.trim().is_empty() {
        variables.set_system("_status", "0");
        variables.set_system("_error", "");
        variables.set_system("_output", "");
        return;
    }
    let id = next_try_id(stack);
    stack.push_try_boundary(&id, target_message);
}

pub fn handle_silent_command(target_message: &str, stack: &mut CommandStack) {
    let id = next_silent_id(stack);
    stack.push_silent_boundary(&id, target_message);
}

/// Capture a propagated error into the current Try Frame: unwrap a
/// single well-known wrapping prefix, write `_status`/`_error` (and
/// their `@` mirrors per §9's Open Question resolution), and mark the
/// frame so the Scheduler does not reset these on the boundary's END.
pub fn capture_error(err: &str, stack: &mut CommandStack, variables: &mut VariableStore) {
    let unwrapped = strip_known_prefix(err);
    variables.set_system("_status", "1");
    variables.set_system("_error", unwrapped.clone());
    variables.set_system("@status", "1");
    variables.set_system("@error", unwrapped);
    if let Some(frame) = stack.try_frames.last_mut() {
        frame.error_captured = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_try_target_clears_error_state_directly() {
        let mut stack = CommandStack::new();
        let mut variables = VariableStore::new();
        variables.set_system("_status", "1");
        variables.set_system("_error", "boom");
        handle_try_command("   ", &mut stack, &mut variables);
        assert_eq!(variables.get("_status"), "0");
        assert_eq!(variables.get("_error"), "");
        assert!(stack.is_empty());
    }

    #[test]
    fn nonempty_try_target_pushes_boundary() {
        let mut stack = CommandStack::new();
        let mut variables = VariableStore::new();
        handle_try_command("\\set[k=v]", &mut stack, &mut variables);
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn capture_error_strips_known_prefix_and_mirrors() {
        let mut stack = CommandStack::new();
        stack.try_frames.push(crate::stack::TryFrame { id: "try_id_0".into(), error_captured: false });
        let mut variables = VariableStore::new();
        capture_error("command not found: nonexistent-command", &mut stack, &mut variables);
        assert_eq!(variables.get("_status"), "1");
        assert_eq!(variables.get("_error"), "command not found: nonexistent-command");
        assert_eq!(variables.get("@status"), "1");
        assert_eq!(variables.get("@error"), "command not found: nonexistent-command");
        assert!(stack.try_frames.last().unwrap().error_captured);
    }

    #[test]
    fn capture_error_unwraps_execution_failed_prefix() {
        let mut stack = CommandStack::new();
        stack.try_frames.push(crate::stack::TryFrame { id: "try_id_0".into(), error_captured: false });
        let mut variables = VariableStore::new();
        capture_error("command execution failed: boom", &mut stack, &mut variables);
        assert_eq!(variables.get("_error"), "boom");
    }

    #[test]
    fn ids_grow_with_depth() {
        let mut stack = CommandStack::new();
        assert_eq!(next_try_id(&stack), "try_id_0");
        stack.try_frames.push(crate::stack::TryFrame { id: "try_id_0".into(), error_captured: false });
        assert_eq!(next_try_id(&stack), "try_id_1");
    }
}
