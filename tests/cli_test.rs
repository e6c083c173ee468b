mod common;

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use lockgraph::replay::ProcessSnapshot;

use common::*;

fn write_snapshot(name: &str, snapshot: &ProcessSnapshot) -> PathBuf {
    let path = PathBuf::from(format!(
        "/tmp/lockgraph-test-{}-{}.json",
        std::process::id(),
        name
    ));
    fs::write(&path, serde_json::to_vec(snapshot).unwrap()).unwrap();
    path
}

fn run(exec: &str, args: &[&str]) -> std::process::Output {
    Command::new(common::find_exec(exec))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .unwrap()
}

#[test]
fn plocks_prints_lock_relations() {
    let path = write_snapshot("plocks-cycle", &mutex_cycle_snapshot());

    let output = run("plocks", &[path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(
        "Lock 0x00000000bb00 (Mutex) held by Thread 0x000000002000 (LWP 102) \
         waited on by Thread 0x000000001000 (LWP 101)"
    ));
    assert!(stdout.contains(
        "Lock 0x00000000aa00 (Mutex) held by Thread 0x000000001000 (LWP 101) \
         waited on by Thread 0x000000002000 (LWP 102)"
    ));
}

#[test]
fn plocks_rejects_missing_snapshot() {
    let output = run("plocks", &["/nonexistent/snapshot.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("plocks: /nonexistent/snapshot.json"));
}

#[test]
fn pwaitsfor_emits_dot_on_stdout() {
    let path = write_snapshot("pwaitsfor-cycle", &mutex_cycle_snapshot());

    let output = run("pwaitsfor", &[path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("# Legend:\n"));
    assert!(stdout.contains("digraph \"mongod+lock-status\" {"));
    assert!(stdout.contains("\"Thread 0x000000002000\" -> \"Lock 0x00000000aa00\";"));
    assert!(stdout.contains("\"Lock 0x00000000aa00\" -> \"Thread 0x000000001000\";"));
    assert!(stdout.contains("[label=\"Thread 0x000000001000 (LWP 101)\"];"));
}

#[test]
fn pwaitsfor_writes_dot_to_output_file() {
    let path = write_snapshot("pwaitsfor-file", &mutex_cycle_snapshot());
    let dot_path = PathBuf::from(format!("/tmp/lockgraph-test-{}-out.dot", std::process::id()));

    let output = run(
        "pwaitsfor",
        &[path.to_str().unwrap(), dot_path.to_str().unwrap()],
    );
    fs::remove_file(&path).unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let dot = fs::read_to_string(&dot_path).unwrap();
    fs::remove_file(&dot_path).unwrap();
    assert!(dot.contains("\"Thread 0x000000001000\" -> \"Lock 0x00000000bb00\";"));
    assert!(dot.ends_with("}\n"));
}

#[test]
fn pwaitsfor_reports_unresolvable_owner_on_stderr() {
    // The mutex owner LWP 999 is not a live thread; the relation is
    // still recorded and the gap shows up on stderr without RUST_LOG.
    let snap = snapshot(vec![thread(0x2000, 102, vec![mutex_wait_frame(0xaa00, 999)])]);
    let path = write_snapshot("pwaitsfor-stderr", &snap);

    let output = run("pwaitsfor", &[path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"Thread 0x000000002000\" -> \"Lock 0x00000000aa00\";"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("owner LWP 999 is not a known thread"),
        "missing owner warning not on stderr: {}",
        stderr
    );
}

#[test]
fn pwaitsfor_reports_empty_graph() {
    let snap = snapshot(vec![thread(0x1000, 101, vec![idle_frame()])]);
    let path = write_snapshot("pwaitsfor-empty", &snap);

    let output = run("pwaitsfor", &[path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "lock graph is empty\n"
    );
}
