//! Abstraction over debugger capabilities.
//!
//! The scanner and probes never talk to a debugger directly; they
//! consume this interface, which any host debugger (or a recorded
//! session, see [`crate::replay`]) can back. The target process is
//! read-only through this boundary: nothing here may resume or alter
//! the inferior.

use regex::Regex;
use thiserror::Error;

/// Errors reported by a debugger backend.
#[derive(Debug, Error)]
pub enum DebuggerError {
    /// A thread vanished, a frame's block is unavailable, or an
    /// expression failed to evaluate against a particular thread.
    /// Recoverable: the current per-thread scan is abandoned and the
    /// scan continues with the remaining threads.
    #[error("{0}")]
    Transient(String),
    /// No process is being debugged.
    #[error("no process is being debugged")]
    NoProcess,
    /// A symbol the probes depend on is absent from the target (e.g. a
    /// mongod built without the lock manager, or stripped).
    #[error("symbol not found: {0}")]
    MissingSymbol(String),
}

impl DebuggerError {
    pub fn transient(msg: impl Into<String>) -> Self {
        DebuggerError::Transient(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, DebuggerError::Transient(_))
    }
}

/// A thread known to the debugger. `ordinal` is backend-specific (for
/// the replay backend it is the snapshot index; for GDB it would be the
/// thread number). `valid` is the liveness flag at enumeration time;
/// switching to a thread that has since become invalid fails with a
/// transient error.
#[derive(Debug, Clone)]
pub struct ThreadHandle {
    pub ordinal: usize,
    pub lwpid: u64,
    pub valid: bool,
}

/// A stack frame located by [`Debugger::find_frame`]. Index 0 is the
/// newest frame of the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(pub usize);

/// Identity of the currently selected thread.
#[derive(Debug, Clone, Copy)]
pub struct ThreadInfo {
    /// User-space thread id (pthread id).
    pub tid: u64,
    /// OS-level lightweight process id.
    pub lwpid: u64,
}

/// A typed value read from the target process.
///
/// The probes only ever call these accessors; how the value is
/// materialized (lazily through debugger expressions, or eagerly from a
/// snapshot) is the backend's business.
pub trait Value: Clone + Sized {
    /// Access a member field by name.
    fn field(&self, name: &str) -> Result<Self, DebuggerError>;

    /// Dereference a pointer value.
    fn deref(&self) -> Result<Self, DebuggerError>;

    /// Reinterpret the value as a named pointer type.
    fn cast(&self, type_name: &str) -> Result<Self, DebuggerError>;

    /// The value as an address (pointer-width integer).
    fn as_address(&self) -> Result<u64, DebuggerError>;

    /// The value as a signed scalar.
    fn as_int(&self) -> Result<i64, DebuggerError>;
}

/// The debugger capability the scanner consumes.
pub trait Debugger {
    type Value: Value;

    /// Enumerate the threads currently known on the target process.
    /// Order is unspecified but stable within a single call.
    fn threads(&mut self) -> Result<Vec<ThreadHandle>, DebuggerError>;

    /// Make a thread current for subsequent frame and expression
    /// operations.
    fn switch_thread(&mut self, thread: &ThreadHandle) -> Result<(), DebuggerError>;

    /// Identity of the current thread.
    fn current_thread(&self) -> Result<ThreadInfo, DebuggerError>;

    /// Walk the current thread's stack from the newest frame towards
    /// older frames and return the first whose enclosing function name
    /// matches `pattern`, or `None`. Frames without symbolic information
    /// are skipped.
    fn find_frame(&mut self, pattern: &Regex) -> Result<Option<FrameHandle>, DebuggerError>;

    /// Make a frame current for local lookup.
    fn select_frame(&mut self, frame: FrameHandle) -> Result<(), DebuggerError>;

    /// Resolve a local or formal parameter by name in the selected
    /// frame, or `None` if no such symbol exists there.
    fn lookup_local(&self, name: &str) -> Result<Option<Self::Value>, DebuggerError>;

    /// Evaluate a textual expression against the current process state,
    /// in the context of the selected frame.
    fn evaluate(&self, expr: &str) -> Result<Self::Value, DebuggerError>;
}
