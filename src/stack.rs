//! Command Stack: an ordered LIFO sequence of `StackEntry` values plus
//! the independent Try Frame and Silent Frame stacks that boundary
//! markers drive.

/// One entry popped off the command stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEntry {
    /// Raw, not-yet-expanded command text.
    Command(String),
    ErrorBoundaryStart(String),
    ErrorBoundaryEnd(String),
    SilentBoundaryStart(String),
    SilentBoundaryEnd(String),
}

const ERROR_START_PREFIX: &str = "ERROR_BOUNDARY_START:";
const ERROR_END_PREFIX: &str = "ERROR_BOUNDARY_END:";
const SILENT_START_PREFIX: &str = "SILENT_BOUNDARY_START:";
const SILENT_END_PREFIX: &str = "SILENT_BOUNDARY_END:";

impl StackEntry {
    /// Classify a raw pushed string into its syntactic shape per §3.
    pub fn classify(raw: &str) -> StackEntry {
        if let Some(id) = raw.strip_prefix(ERROR_START_PREFIX) {
            return StackEntry::ErrorBoundaryStart(id.to_string());
        }
        if let Some(id) = raw.strip_prefix(ERROR_END_PREFIX) {
            return StackEntry::ErrorBoundaryEnd(id.to_string());
        }
        if let Some(id) = raw.strip_prefix(SILENT_START_PREFIX) {
            return StackEntry::SilentBoundaryStart(id.to_string());
        }
        if let Some(id) = raw.strip_prefix(SILENT_END_PREFIX) {
            return StackEntry::SilentBoundaryEnd(id.to_string());
        }
        StackEntry::Command(raw.to_string())
    }

    fn marker_text(&self) -> String {
        match self {
            StackEntry::Command(text) => text.clone(),
            StackEntry::ErrorBoundaryStart(id) => format!("{ERROR_START_PREFIX}{id}"),
            StackEntry::ErrorBoundaryEnd(id) => format!("{ERROR_END_PREFIX}{id}"),
            StackEntry::SilentBoundaryStart(id) => format!("{SILENT_START_PREFIX}{id}"),
            StackEntry::SilentBoundaryEnd(id) => format!("{SILENT_END_PREFIX}{id}"),
        }
    }
}

/// `{id, error_captured}`. Created when an `ERROR_BOUNDARY_START` is
/// popped; destroyed when the matching `END` is popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryFrame {
    pub id: String,
    pub error_captured: bool,
}

/// `{id}`. Same lifecycle as a Try Frame, independent stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilentFrame {
    pub id: String,
}

/// The LIFO command stack plus the Try/Silent frame stacks it drives.
#[derive(Debug, Clone, Default)]
pub struct CommandStack {
    entries: Vec<String>,
    pub try_frames: Vec<TryFrame>,
    pub silent_frames: Vec<SilentFrame>,
}

impl CommandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, raw: impl Into<String>) {
        self.entries.push(raw.into());
    }

    pub fn pop(&mut self) -> Option<StackEntry> {
        self.entries.pop().map(|raw| StackEntry::classify(&raw))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Push, in LIFO order, `END:id`, `target`, `START:id` so the next
    /// three pops yield `START`, `target`, `END`.
    pub fn push_try_boundary(&mut self, id: &str, target: &str) {
        self.push(StackEntry::ErrorBoundaryEnd(id.to_string()).marker_text());
        self.push(target);
        self.push(StackEntry::ErrorBoundaryStart(id.to_string()).marker_text());
    }

    pub fn push_silent_boundary(&mut self, id: &str, target: &str) {
        self.push(StackEntry::SilentBoundaryEnd(id.to_string()).marker_text());
        self.push(target);
        self.push(StackEntry::SilentBoundaryStart(id.to_string()).marker_text());
    }

    /// Push script body lines so that, after splitting, they pop back
    /// off in source order: last line pushed first.
    pub fn push_lines_in_order(&mut self, lines: &[String]) {
        for line in lines.iter().rev() {
            self.push(line.clone());
        }
    }

    pub fn current_try_id(&self) -> Option<&str> {
        self.try_frames.last().map(|f| f.id.as_str())
    }

    pub fn is_silent(&self) -> bool {
        !self.silent_frames.is_empty()
    }
}
