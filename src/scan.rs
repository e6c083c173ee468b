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

//! The scan orchestrator.
//!
//! Builds the thread table, iterates every thread, runs the mutex probe
//! and then the lock-manager probe with per-thread error isolation, and
//! drives the two user-facing operations: `show_locks` (diagnostic
//! trace) and `waits_for_graph` (DOT output).

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use log::warn;
use regex::Regex;

use crate::debugger::{Debugger, DebuggerError, ThreadHandle};
use crate::graph::WaitsForGraph;
use crate::identity::Thread;
use crate::probe::{self, ProbeSink};
use crate::Error;

/// The set of live threads observed at the start of a scan, indexed both
/// ways: by LWP id (how mutex owner fields name threads) and by thread
/// id (how lock-manager Lockers name them). Immutable once built.
#[derive(Default)]
pub struct ThreadTable {
    by_lwpid: HashMap<u64, Thread>,
    by_tid: HashMap<u64, Thread>,
}

impl ThreadTable {
    /// Enumerate the debugger's threads and record each one's identity.
    /// Threads that vanish while being examined are skipped with a log
    /// line, like everywhere else in the scan.
    pub fn from_debugger<D: Debugger>(dbg: &mut D) -> Result<Self, Error> {
        let mut table = ThreadTable::default();
        for handle in dbg.threads()? {
            if !handle.valid {
                continue;
            }
            if let Err(e) = dbg.switch_thread(&handle) {
                if e.is_transient() {
                    warn!("LWP {}: {}", handle.lwpid, e);
                    continue;
                }
                return Err(e.into());
            }
            let info = match dbg.current_thread() {
                Ok(info) => info,
                Err(e) if e.is_transient() => {
                    warn!("LWP {}: {}", handle.lwpid, e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            table.insert(Thread::new(info.tid, info.lwpid));
        }
        Ok(table)
    }

    fn insert(&mut self, thread: Thread) {
        // Within one scan, lwpid <-> tid is a bijection over the live
        // threads; a duplicate means the target mutated under us.
        let lwpid = thread.lwpid().expect("observed threads have an LWP id");
        if let Some(prev) = self.by_lwpid.insert(lwpid, thread) {
            if prev != thread {
                warn!("LWP {} maps to both {} and {}", lwpid, prev.key(), thread.key());
            }
        }
        if let Some(prev) = self.by_tid.insert(thread.tid(), thread) {
            if prev.lwpid() != Some(lwpid) {
                warn!(
                    "{} maps to both {} and {}",
                    thread.key(),
                    prev.label(),
                    thread.label()
                );
            }
        }
    }

    pub fn by_lwpid(&self, lwpid: u64) -> Option<Thread> {
        self.by_lwpid.get(&lwpid).copied()
    }

    pub fn by_tid(&self, tid: u64) -> Option<Thread> {
        self.by_tid.get(&tid).copied()
    }

    pub fn len(&self) -> usize {
        self.by_lwpid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lwpid.is_empty()
    }
}

/// Frame patterns used by a scan. The defaults match libstdc++ and
/// mongod symbol names; targets with differently-mangled symbols can
/// supply their own.
pub struct ScanPatterns {
    pub mutex: Regex,
    pub lock_manager: Regex,
}

impl Default for ScanPatterns {
    fn default() -> Self {
        ScanPatterns {
            // The patterns are static, so compilation cannot fail.
            mutex: Regex::new(probe::mutex::MUTEX_LOCK_PATTERN).unwrap(),
            lock_manager: Regex::new(probe::lock_manager::LOCK_MANAGER_PATTERN).unwrap(),
        }
    }
}

fn scan_thread<D: Debugger>(
    dbg: &mut D,
    table: &ThreadTable,
    handle: &ThreadHandle,
    patterns: &ScanPatterns,
    sink: &mut ProbeSink,
) -> Result<(), Error> {
    dbg.switch_thread(handle)?;
    probe::probe_mutex(dbg, table, &patterns.mutex, sink)?;
    probe::probe_lock_manager(dbg, table, &patterns.lock_manager, sink)?;
    Ok(())
}

/// Scan every thread, reporting into `sink`. Transient debugger errors
/// abort only the offending thread's scan; anything else is fatal.
fn scan_all<D: Debugger>(
    dbg: &mut D,
    table: &ThreadTable,
    patterns: &ScanPatterns,
    sink: &mut ProbeSink,
) -> Result<(), Error> {
    for handle in dbg.threads()? {
        if !handle.valid {
            continue;
        }
        match scan_thread(dbg, table, &handle, patterns, sink) {
            Ok(()) => {}
            Err(Error::Debugger(DebuggerError::Transient(msg))) => {
                warn!("skipping LWP {}: {}", handle.lwpid, msg);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Print one diagnostic line per observed lock relation. No graph is
/// built.
pub fn show_locks<D: Debugger>(dbg: &mut D, out: &mut dyn Write) -> Result<(), Error> {
    let table = ThreadTable::from_debugger(dbg)?;
    let patterns = ScanPatterns::default();
    scan_all(dbg, &table, &patterns, &mut ProbeSink::Diagnostic(out))
}

/// Scan every thread into a fresh graph and prune nodes that ended up in
/// no waits-for relation.
pub fn build_waits_for_graph<D: Debugger>(dbg: &mut D) -> Result<WaitsForGraph, Error> {
    build_waits_for_graph_with(dbg, &ScanPatterns::default())
}

pub fn build_waits_for_graph_with<D: Debugger>(
    dbg: &mut D,
    patterns: &ScanPatterns,
) -> Result<WaitsForGraph, Error> {
    let table = ThreadTable::from_debugger(dbg)?;
    let mut graph = WaitsForGraph::new();
    scan_all(dbg, &table, patterns, &mut ProbeSink::Graph(&mut graph))?;
    graph.prune_orphans();
    Ok(graph)
}

/// The `waits_for_graph` operation: build, prune, and render.
///
/// DOT goes to `output` if given, otherwise to `out`. An empty graph
/// produces a single diagnostic line and no DOT.
pub fn waits_for_graph<D: Debugger>(
    dbg: &mut D,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let graph = build_waits_for_graph(dbg)?;
    if graph.is_empty() {
        writeln!(out, "lock graph is empty")?;
        return Ok(());
    }
    let dot = graph.to_dot();
    match output {
        Some(path) => fs::write(path, dot)?,
        None => out.write_all(dot.as_bytes())?,
    }
    Ok(())
}
