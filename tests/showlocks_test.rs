mod common;

use lockgraph::replay::ReplayDebugger;
use lockgraph::scan;

use common::*;

fn show_locks_output(dbg: &mut ReplayDebugger) -> String {
    let mut out = Vec::new();
    scan::show_locks(dbg, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn mutex_waits_print_one_line_per_relation() {
    let mut dbg = ReplayDebugger::new(mutex_cycle_snapshot());
    let text = show_locks_output(&mut dbg);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines,
        vec![
            "Lock 0x00000000bb00 (Mutex) held by Thread 0x000000002000 (LWP 102) \
             waited on by Thread 0x000000001000 (LWP 101)",
            "Lock 0x00000000aa00 (Mutex) held by Thread 0x000000001000 (LWP 101) \
             waited on by Thread 0x000000002000 (LWP 102)",
        ]
    );
}

#[test]
fn unknown_mutex_owner_is_reported_by_lwpid() {
    let mut dbg = ReplayDebugger::new(snapshot(vec![thread(
        0x2000,
        102,
        vec![mutex_wait_frame(0xaa00, 999)],
    )]));
    let text = show_locks_output(&mut dbg);

    assert_eq!(
        text,
        "Lock 0x00000000aa00 (Mutex) held by unknown LWP 999 \
         waited on by Thread 0x000000002000 (LWP 102)\n"
    );
}

#[test]
fn lock_manager_waits_print_holder_and_mode() {
    let mut dbg = ReplayDebugger::new(snapshot(vec![
        thread(
            0x3000,
            103,
            vec![lock_manager_frame(0xcc00, &[(0x4000, 4), (0x5000, 1)])],
        ),
        thread(0x4000, 104, vec![idle_frame()]),
        thread(0x5000, 105, vec![idle_frame()]),
    ]));
    let text = show_locks_output(&mut dbg);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines,
        vec![
            "Lock 0x00000000cc00 (MongoDB lock) held by Thread 0x000000004000 (LWP 104) \
             (mode X) waited on by Thread 0x000000003000 (LWP 103)",
            "Lock 0x00000000cc00 (MongoDB lock) held by Thread 0x000000005000 (LWP 105) \
             (mode IS) waited on by Thread 0x000000003000 (LWP 103)",
        ]
    );
}

#[test]
fn idle_process_prints_nothing() {
    let mut dbg = ReplayDebugger::new(snapshot(vec![
        thread(0x1000, 101, vec![idle_frame()]),
        thread(0x2000, 102, vec![]),
    ]));
    assert_eq!(show_locks_output(&mut dbg), "");
}
