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

//! Identity values for graph nodes: threads and locks.
//!
//! Both are cheap immutable value types created on observation and
//! discarded at the end of a scan. Canonical string keys use a fixed
//! 12-digit hex rendering so that DOT output is stable and diffable
//! across platforms.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A thread observed in the target process.
///
/// Identified by its user-space thread id (the pthread id). The OS-level
/// lightweight process id is auxiliary: it is how the kernel names the
/// thread in mutex owner fields, but it may be unknown for threads we
/// only discover through lock-manager holder lists.
#[derive(Debug, Clone, Copy)]
pub struct Thread {
    tid: u64,
    lwpid: Option<u64>,
}

impl Thread {
    pub fn new(tid: u64, lwpid: u64) -> Self {
        Thread {
            tid,
            lwpid: Some(lwpid),
        }
    }

    /// A thread whose LWP id could not be determined (e.g. a lock holder
    /// that was not in the thread table when the scan started).
    pub fn with_unknown_lwpid(tid: u64) -> Self {
        Thread { tid, lwpid: None }
    }

    pub fn tid(&self) -> u64 {
        self.tid
    }

    pub fn lwpid(&self) -> Option<u64> {
        self.lwpid
    }

    /// Canonical key used for deduplication in the graph.
    pub fn key(&self) -> String {
        format!("Thread 0x{:012x}", self.tid)
    }

    /// Human-readable rendering used for DOT labels and diagnostics.
    pub fn label(&self) -> String {
        match self.lwpid {
            Some(lwpid) => format!("Thread 0x{:012x} (LWP {})", self.tid, lwpid),
            None => format!("Thread 0x{:012x} (LWP ?)", self.tid),
        }
    }
}

// Equality is by thread id only; the lwpid is auxiliary.
impl PartialEq for Thread {
    fn eq(&self, other: &Self) -> bool {
        self.tid == other.tid
    }
}

impl Eq for Thread {}

impl Hash for Thread {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tid.hash(state);
    }
}

impl fmt::Display for Thread {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classification of a synchronization object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockTag {
    /// A std::mutex (pthread mutex underneath).
    Mutex,
    /// A resource tracked by the MongoDB lock manager.
    MongoDbLock,
}

impl fmt::Display for LockTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockTag::Mutex => write!(f, "Mutex"),
            LockTag::MongoDbLock => write!(f, "MongoDB lock"),
        }
    }
}

/// A synchronization object observed in the target process, named by its
/// address. Two locks with the same address are the same lock; within a
/// single scan the tag is determined by the address, so the first
/// observation wins.
#[derive(Debug, Clone, Copy)]
pub struct Lock {
    addr: u64,
    tag: LockTag,
}

impl Lock {
    pub fn new(addr: u64, tag: LockTag) -> Self {
        Lock { addr, tag }
    }

    pub fn addr(&self) -> u64 {
        self.addr
    }

    pub fn tag(&self) -> LockTag {
        self.tag
    }

    /// Canonical key used for deduplication in the graph.
    pub fn key(&self) -> String {
        format!("Lock 0x{:012x}", self.addr)
    }

    /// Human-readable rendering used for DOT labels and diagnostics.
    pub fn label(&self) -> String {
        format!("Lock 0x{:012x} ({})", self.addr, self.tag)
    }
}

// Equality is by address only.
impl PartialEq for Lock {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for Lock {}

impl Hash for Lock {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl fmt::Display for Lock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A graph node identity: either a thread or a lock.
///
/// The set of cases is closed and known, so this is a tagged variant
/// rather than trait polymorphism. The fixed `Thread ` / `Lock ` key
/// prefixes make collisions between the two kinds impossible by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Thread(Thread),
    Lock(Lock),
}

impl Identity {
    pub fn key(&self) -> String {
        match self {
            Identity::Thread(t) => t.key(),
            Identity::Lock(l) => l.key(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Identity::Thread(t) => t.label(),
            Identity::Lock(l) => l.label(),
        }
    }
}

impl From<Thread> for Identity {
    fn from(t: Thread) -> Self {
        Identity::Thread(t)
    }
}

impl From<Lock> for Identity {
    fn from(l: Lock) -> Self {
        Identity::Lock(l)
    }
}
