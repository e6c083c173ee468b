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

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::path::PathBuf;

use lockgraph::probe::lock_manager::LOCK_HEAD_EXPR;
use lockgraph::replay::{FrameSnapshot, ProcessSnapshot, ThreadSnapshot, ValueNode};

// Find an executable produced by the Cargo build
pub fn find_exec(name: &str) -> PathBuf {
    // Find the path where Cargo has placed the executables by looking at this test process's
    // executable, which was also built by Cargo.
    let this_exec = std::env::current_exe().unwrap();
    let exec_dir = this_exec.parent().unwrap().parent().unwrap();

    exec_dir.join(name)
}

pub fn int_value(v: i64) -> ValueNode {
    ValueNode {
        int: Some(v),
        ..Default::default()
    }
}

pub fn pointer_to(addr: u64, pointee: ValueNode) -> ValueNode {
    ValueNode {
        address: addr,
        pointee: Some(Box::new(pointee)),
        ..Default::default()
    }
}

pub fn null_pointer() -> ValueNode {
    ValueNode::default()
}

pub fn struct_value(fields: Vec<(&str, ValueNode)>) -> ValueNode {
    ValueNode {
        fields: fields
            .into_iter()
            .map(|(name, node)| (name.to_string(), node))
            .collect(),
        ..Default::default()
    }
}

pub fn thread(tid: u64, lwpid: u64, frames: Vec<FrameSnapshot>) -> ThreadSnapshot {
    ThreadSnapshot {
        tid,
        lwpid,
        valid: true,
        frames,
    }
}

pub fn snapshot(threads: Vec<ThreadSnapshot>) -> ProcessSnapshot {
    ProcessSnapshot {
        threads,
        ..Default::default()
    }
}

/// A frame that matches neither probe.
pub fn idle_frame() -> FrameSnapshot {
    FrameSnapshot {
        function: "epoll_wait".to_string(),
        ..Default::default()
    }
}

/// A frame for a thread parked in std::mutex::lock() on the mutex at
/// `mutex_addr`, whose pthread owner field holds `owner_lwpid`.
pub fn mutex_wait_frame(mutex_addr: u64, owner_lwpid: u64) -> FrameSnapshot {
    let mutex = struct_value(vec![(
        "_M_mutex",
        struct_value(vec![(
            "__data",
            struct_value(vec![("__owner", int_value(owner_lwpid as i64))]),
        )]),
    )]);
    FrameSnapshot {
        function: "std::mutex::lock()".to_string(),
        locals: [("this".to_string(), pointer_to(mutex_addr, mutex))]
            .into_iter()
            .collect(),
        ..Default::default()
    }
}

fn locker_value(tid: u64) -> ValueNode {
    pointer_to(
        0x9000 + tid,
        struct_value(vec![(
            "_threadId",
            struct_value(vec![("_M_thread", int_value(tid as i64))]),
        )]),
    )
}

/// A frame for a thread waiting inside the MongoDB lock manager on the
/// resource whose lock head is at `head_addr`, with the granted list
/// holding one request per `(tid, mode)` in order.
pub fn lock_manager_frame(head_addr: u64, holders: &[(u64, i64)]) -> FrameSnapshot {
    let mut front = null_pointer();
    for &(tid, mode) in holders.iter().rev() {
        let request = struct_value(vec![
            ("locker", locker_value(tid)),
            ("mode", int_value(mode)),
            ("next", front),
        ]);
        front = pointer_to(0x8000 + tid, request);
    }
    let head = struct_value(vec![("grantedList", struct_value(vec![("_front", front)]))]);
    FrameSnapshot {
        function: "mongo::LockManager::lock(mongo::OperationContext*, mongo::ResourceId, \
                   mongo::LockMode)"
            .to_string(),
        locals: [("resId".to_string(), int_value(head_addr as i64))]
            .into_iter()
            .collect(),
        expressions: [(LOCK_HEAD_EXPR.to_string(), pointer_to(head_addr, head))]
            .into_iter()
            .collect(),
    }
}

/// The two-mutex deadlock scenario: T1 (tid 0x1000, LWP 101) waits on
/// mutex N (0xbb00) held by T2; T2 (tid 0x2000, LWP 102) waits on mutex
/// M (0xaa00) held by T1.
pub fn mutex_cycle_snapshot() -> ProcessSnapshot {
    snapshot(vec![
        thread(0x1000, 101, vec![mutex_wait_frame(0xbb00, 102)]),
        thread(0x2000, 102, vec![mutex_wait_frame(0xaa00, 101)]),
    ])
}
