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

//! Detect threads waiting inside the MongoDB lock manager.
//!
//! A thread executing a `mongo::LockManager::` method has a `resId`
//! formal naming the contended resource. The process-wide lock manager
//! owns one lock head per resource; its granted list is an intrusive
//! singly-linked list of the requests currently holding the resource.
//! Each granted request points to its per-thread Locker, which records
//! the holder's thread id.

use std::borrow::Cow;
use std::io::Write;

use log::warn;
use regex::Regex;

use crate::debugger::{Debugger, DebuggerError, Value};
use crate::identity::{Lock, LockTag, Thread};
use crate::probe::{ProbeOutcome, ProbeSink};
use crate::scan::ThreadTable;
use crate::Error;

/// Frame prefix for lock manager methods.
pub const LOCK_MANAGER_PATTERN: &str = r"mongo::LockManager::";

/// Expression yielding the lock head for the `resId` in scope.
pub const LOCK_HEAD_EXPR: &str =
    "mongo::getGlobalLockManager()->_getBucket(resId)->findOrInsert(resId)";

/// Concrete type of the `locker` back-pointer in a lock request. mongod
/// instantiates a single specialisation; targets built differently need
/// a different cast (see pwaitsfor(1) for the symptoms).
pub const LOCKER_PTR_TYPE: &str = "mongo::LockerImpl<false> *";

// mongo::LockMode enumerator shorthand.
fn lock_mode_name(mode: i64) -> Cow<'static, str> {
    const NAMES: &[&str] = &["NONE", "IS", "IX", "S", "X"];
    match usize::try_from(mode) {
        Ok(i) if i < NAMES.len() => Cow::Borrowed(NAMES[i]),
        _ => Cow::Owned(mode.to_string()),
    }
}

/// Examine the current thread for a lock-manager wait and walk the
/// granted-holders list of the contended resource.
///
/// The granted list is walked in its natural order, so graph edges and
/// diagnostic lines record holders in acquisition order. The list is
/// bounded only by the number of live lockers.
pub fn probe_lock_manager<D: Debugger>(
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

    let info = dbg.current_thread()?;
    let waiter = Thread::new(info.tid, info.lwpid);

    if dbg.lookup_local("resId")?.is_none() {
        return Err(
            DebuggerError::transient("lock manager frame has no 'resId' formal").into(),
        );
    }
    let lock_head = dbg.evaluate(LOCK_HEAD_EXPR)?;
    let lock = Lock::new(lock_head.as_address()?, LockTag::MongoDbLock);

    let granted = lock_head.deref()?.field("grantedList")?;
    let mut request_ptr = granted.field("_front")?;
    while request_ptr.as_address()? != 0 {
        let request = request_ptr.deref()?;
        let locker = request.field("locker")?.cast(LOCKER_PTR_TYPE)?.deref()?;
        let holder_tid = locker.field("_threadId")?.field("_M_thread")?.as_int()? as u64;
        let mode = request.field("mode")?.as_int()?;

        // The holder's LWP id comes from the thread table; holders that
        // were not observed at scan start keep an unknown LWP id.
        let holder = match table.by_tid(holder_tid) {
            Some(holder) => holder,
            None => {
                warn!(
                    "{}: holder thread 0x{:x} is not a known thread",
                    lock.key(),
                    holder_tid
                );
                Thread::with_unknown_lwpid(holder_tid)
            }
        };

        match sink {
            ProbeSink::Diagnostic(out) => writeln!(
                out,
                "{} held by {} (mode {}) waited on by {}",
                lock.label(),
                holder.label(),
                lock_mode_name(mode),
                waiter.label()
            )?,
            ProbeSink::Graph(graph) => {
                graph.add_edge(waiter.into(), lock.into());
                graph.add_edge(lock.into(), holder.into());
            }
        }

        request_ptr = request.field("next")?;
    }

    Ok(ProbeOutcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_mode_names() {
        assert_eq!(lock_mode_name(0), "NONE");
        assert_eq!(lock_mode_name(1), "IS");
        assert_eq!(lock_mode_name(2), "IX");
        assert_eq!(lock_mode_name(3), "S");
        assert_eq!(lock_mode_name(4), "X");
        assert_eq!(lock_mode_name(5), "5");
        assert_eq!(lock_mode_name(-1), "-1");
    }
}
