//
//   Copyright 2026 Basil Crow
//
//   Licensed under the Apache License, Version 2.0 (the "License");
//   you may not use this file except in compliance with the License.
//   You may obtain a copy of the License at
//
//       http://www.apache.org/licenses/LICENSE-2.0
//
//   Unless required by applicable law or agreed to in writing, software
//   distributed under the License is distributed on an "AS IS" BASIS,
//   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//   See the License for the specific language governing permissions and
//   limitations under the License.
//

//! Lock diagnostics for mongod processes.
//!
//! The core of this crate is a scanner that walks every thread of a
//! stopped mongod process through an abstract debugger capability
//! ([`debugger::Debugger`]), detects threads blocked on `std::mutex` or
//! inside the MongoDB lock manager, and relates waiters, locks, and
//! holders in a directed waits-for graph ([`graph::WaitsForGraph`]).
//! Cycles in that graph are exactly the deadlocks among the scanned
//! threads, so the DOT rendering feeds straight into cycle detection
//! and visualization.
//!
//! The crate never assumes a specific debugger. The bundled
//! [`replay::ReplayDebugger`] backs the capability with a recorded
//! session snapshot; a live GDB or LLDB adaptor would implement the
//! same traits.

use std::io;

// Error handling philosophy: these tools should try to recover from errors and continue to
// produce useful output. Debugging tools, much more so than other tools, are expected to be run
// against processes which are in unusual and bad states. Indeed, this is when they are most
// useful. A thread that vanishes mid-scan or a pointer that fails to dereference costs us one
// line of output, not the whole report. On the other hand, we should feel free to assert that
// some purely internal invariant holds, and panic if it doesn't.

pub mod cli;
pub mod debugger;
pub mod graph;
pub mod identity;
pub mod probe;
pub mod replay;
pub mod scan;

pub use debugger::DebuggerError;
pub use graph::WaitsForGraph;
pub use identity::{Identity, Lock, LockTag, Thread};

/// Unified error type for lockgraph operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error reported by the debugger capability.
    #[error(transparent)]
    Debugger(#[from] DebuggerError),
    /// I/O error writing diagnostic or DOT output.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Error decoding a recorded session snapshot.
    #[error("error reading snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Restore the default SIGPIPE disposition.
///
/// Rust programs start with SIGPIPE ignored, which turns writes to a closed
/// pipe (e.g. `pwaitsfor core.json | head`) into broken-pipe errors the tool
/// would have to unwind through instead of exiting quietly.
pub fn reset_sigpipe() {
    use nix::sys::signal;
    unsafe {
        let _ = signal::signal(signal::Signal::SIGPIPE, signal::SigHandler::SigDfl);
    }
}
