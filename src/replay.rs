//! Snapshot-backed debugger: replays a recorded session.
//!
//! A snapshot is a JSON document capturing, for every thread, the stack
//! frames together with the locals and expression results the probes
//! read. It plays the same role the coredump backend plays for the
//! /proc-based tools: the same data as a live target, from a file.
//! Snapshots are typically produced by a small capture script run once
//! inside the debugger attached to the hung mongod.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::debugger::{Debugger, DebuggerError, FrameHandle, ThreadHandle, ThreadInfo, Value};
use crate::Error;

fn default_true() -> bool {
    true
}

/// A recorded debugger session over one process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    #[serde(default)]
    pub threads: Vec<ThreadSnapshot>,
    /// Expression results valid on any thread (process-wide globals).
    /// Frame-scoped expressions take precedence.
    #[serde(default)]
    pub expressions: BTreeMap<String, ValueNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    /// User-space thread id (pthread id).
    pub tid: u64,
    /// OS-level lightweight process id.
    pub lwpid: u64,
    #[serde(default = "default_true")]
    pub valid: bool,
    /// Stack frames, newest first.
    #[serde(default)]
    pub frames: Vec<FrameSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Enclosing function name; empty when no symbolic block was
    /// available for the frame.
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub locals: BTreeMap<String, ValueNode>,
    /// Results of expressions evaluated while this frame was selected.
    #[serde(default)]
    pub expressions: BTreeMap<String, ValueNode>,
}

/// A recorded typed value.
///
/// `address` is the value's pointer/scalar form; `int` overrides it for
/// plain integer reads; `fields` and `pointee` carry the recorded
/// structure. Casts are no-ops on replayed values: the snapshot already
/// records the concrete layout the capture script saw after casting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueNode {
    #[serde(default)]
    pub address: u64,
    #[serde(default)]
    pub int: Option<i64>,
    #[serde(default)]
    pub fields: BTreeMap<String, ValueNode>,
    #[serde(default)]
    pub pointee: Option<Box<ValueNode>>,
}

#[derive(Debug, Clone)]
pub struct ReplayValue(ValueNode);

impl Value for ReplayValue {
    fn field(&self, name: &str) -> Result<Self, DebuggerError> {
        self.0
            .fields
            .get(name)
            .cloned()
            .map(ReplayValue)
            .ok_or_else(|| DebuggerError::transient(format!("value has no member '{}'", name)))
    }

    fn deref(&self) -> Result<Self, DebuggerError> {
        match &self.0.pointee {
            Some(p) => Ok(ReplayValue((**p).clone())),
            None => Err(DebuggerError::transient(format!(
                "cannot dereference value at 0x{:x}",
                self.0.address
            ))),
        }
    }

    fn cast(&self, _type_name: &str) -> Result<Self, DebuggerError> {
        Ok(self.clone())
    }

    fn as_address(&self) -> Result<u64, DebuggerError> {
        Ok(self.0.address)
    }

    fn as_int(&self) -> Result<i64, DebuggerError> {
        Ok(self.0.int.unwrap_or(self.0.address as i64))
    }
}

/// A [`Debugger`] backed by a [`ProcessSnapshot`].
pub struct ReplayDebugger {
    snapshot: ProcessSnapshot,
    current: Option<usize>,
    selected: Option<usize>,
}

impl ReplayDebugger {
    pub fn new(snapshot: ProcessSnapshot) -> Self {
        ReplayDebugger {
            snapshot,
            current: None,
            selected: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let snapshot = serde_json::from_reader(BufReader::new(file))?;
        Ok(ReplayDebugger::new(snapshot))
    }

    fn current_snapshot(&self) -> Result<&ThreadSnapshot, DebuggerError> {
        self.current
            .and_then(|i| self.snapshot.threads.get(i))
            .ok_or_else(|| DebuggerError::transient("no thread selected"))
    }

    fn selected_frame(&self) -> Result<&FrameSnapshot, DebuggerError> {
        let thread = self.current_snapshot()?;
        self.selected
            .and_then(|i| thread.frames.get(i))
            .ok_or_else(|| DebuggerError::transient("no frame selected"))
    }
}

impl Debugger for ReplayDebugger {
    type Value = ReplayValue;

    fn threads(&mut self) -> Result<Vec<ThreadHandle>, DebuggerError> {
        Ok(self
            .snapshot
            .threads
            .iter()
            .enumerate()
            .map(|(i, t)| ThreadHandle {
                ordinal: i,
                lwpid: t.lwpid,
                valid: t.valid,
            })
            .collect())
    }

    fn switch_thread(&mut self, thread: &ThreadHandle) -> Result<(), DebuggerError> {
        match self.snapshot.threads.get(thread.ordinal) {
            Some(t) if t.valid => {
                self.current = Some(thread.ordinal);
                self.selected = None;
                Ok(())
            }
            _ => Err(DebuggerError::transient(format!(
                "thread LWP {} has exited",
                thread.lwpid
            ))),
        }
    }

    fn current_thread(&self) -> Result<ThreadInfo, DebuggerError> {
        let t = self.current_snapshot()?;
        Ok(ThreadInfo {
            tid: t.tid,
            lwpid: t.lwpid,
        })
    }

    fn find_frame(&mut self, pattern: &Regex) -> Result<Option<FrameHandle>, DebuggerError> {
        let thread = self.current_snapshot()?;
        for (i, frame) in thread.frames.iter().enumerate() {
            // An empty function name stands for a frame with no
            // symbolic block; skip it like a live backend would.
            if frame.function.is_empty() {
                continue;
            }
            if pattern.is_match(&frame.function) {
                return Ok(Some(FrameHandle(i)));
            }
        }
        Ok(None)
    }

    fn select_frame(&mut self, frame: FrameHandle) -> Result<(), DebuggerError> {
        let thread = self.current_snapshot()?;
        if frame.0 >= thread.frames.len() {
            return Err(DebuggerError::transient(format!(
                "frame #{} is gone",
                frame.0
            )));
        }
        self.selected = Some(frame.0);
        Ok(())
    }

    fn lookup_local(&self, name: &str) -> Result<Option<Self::Value>, DebuggerError> {
        let frame = self.selected_frame()?;
        Ok(frame.locals.get(name).cloned().map(ReplayValue))
    }

    fn evaluate(&self, expr: &str) -> Result<Self::Value, DebuggerError> {
        let frame = self.selected_frame()?;
        if let Some(node) = frame.expressions.get(expr) {
            return Ok(ReplayValue(node.clone()));
        }
        if let Some(node) = self.snapshot.expressions.get(expr) {
            return Ok(ReplayValue(node.clone()));
        }
        Err(DebuggerError::transient(format!(
            "cannot evaluate '{}'",
            expr
        )))
    }
}
