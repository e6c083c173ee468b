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

//! Per-thread probes.
//!
//! Each probe assumes the thread under examination has already been
//! selected as current, inspects its stack for one kind of blocking
//! state, and reports what it finds into the sink: diagnostic text for
//! `show_locks`, graph edges for `waits_for_graph`.

use std::io::Write;

use crate::graph::WaitsForGraph;

pub mod lock_manager;
pub mod mutex;

pub use lock_manager::probe_lock_manager;
pub use mutex::probe_mutex;

/// Where a probe reports its findings.
pub enum ProbeSink<'a> {
    /// One human-readable line per observed relation.
    Diagnostic(&'a mut dyn Write),
    /// Waits-for edges.
    Graph(&'a mut WaitsForGraph),
}

/// What a probe concluded about the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The thread is not in the state this probe detects.
    NotApplicable,
    /// The thread was examined and reported.
    Done,
}
