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

//! Detect threads blocked acquiring a std::mutex.
//!
//! libstdc++'s std::mutex wraps a pthread mutex whose `__owner` field
//! holds the LWP id of the current owner (0 when unlocked). A thread
//! parked in `std::mutex::lock()` is therefore waiting on the mutex
//! named by the method's receiver, and the owner field names the holder.

use std::io::Write;

use log::warn;
use regex::Regex;

use crate::debugger::{Debugger, DebuggerError, Value};
use crate::identity::{Lock, LockTag, Thread};
use crate::probe::{ProbeOutcome, ProbeSink};
use crate::scan::ThreadTable;
use crate::Error;

/// Frame pattern for the blocking lock entry point. Other standard
/// library builds may mangle the method differently; callers can compile
/// and pass their own pattern.
pub const MUTEX_LOCK_PATTERN: &str = r"std::mutex::lock\(\)";

/// Examine the current thread for a std::mutex wait.
///
/// Only the innermost matching frame is considered: a thread blocked on
/// mutex A while transitively holding mutex B still contributes a single
/// waiter edge.
pub fn probe_mutex<D: Debugger>(
    dbg: &mut D,
    table: &ThreadTable,
    pattern: &Regex,
    sink: &mut ProbeSink,
) -> Result<ProbeOutcome, Error> {
    let frame = match dbg.find_frame(pattern)? {
        Some(frame) => frame,
        None => return Ok(ProbeOutcome::NotApplicable),
    };
    dbg.select_frame(frame)?;

    // The implicit receiver is the mutex instance.
    let this = dbg
        .lookup_local("this")?
        .ok_or_else(|| DebuggerError::transient("mutex frame has no 'this'"))?;
    let mutex_addr = this.as_address()?;
    let owner_lwpid = this
        .deref()?
        .field("_M_mutex")?
        .field("__data")?
        .field("__owner")?
        .as_int()? as u64;

    // Unlocked: the thread is racing for the mutex or about to proceed.
    if owner_lwpid == 0 {
        return Ok(ProbeOutcome::NotApplicable);
    }

    let info = dbg.current_thread()?;
    let waiter = Thread::new(info.tid, info.lwpid);
    let lock = Lock::new(mutex_addr, LockTag::Mutex);
    let holder = table.by_lwpid(owner_lwpid);

    match sink {
        ProbeSink::Diagnostic(out) => match holder {
            Some(holder) => writeln!(
                out,
                "{} held by {} waited on by {}",
                lock.label(),
                holder.label(),
                waiter.label()
            )?,
            None => writeln!(
                out,
                "{} held by unknown LWP {} waited on by {}",
                lock.label(),
                owner_lwpid,
                waiter.label()
            )?,
        },
        ProbeSink::Graph(graph) => {
            graph.add_edge(waiter.into(), lock.into());
            match holder {
                Some(holder) => graph.add_edge(lock.into(), holder.into()),
                None => warn!(
                    "{}: owner LWP {} is not a known thread; recording waiter edge only",
                    lock.key(),
                    owner_lwpid
                ),
            }
        }
    }

    Ok(ProbeOutcome::Done)
}
