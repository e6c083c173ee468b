use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "plocks",
    version,
    about = "Print held and contended locks in a mongod process",
    long_about = "Examine a recorded debugger session of a mongod process and print one line \
for every observable lock relation: threads blocked in std::mutex::lock() together with the \
owning thread, and threads inside the MongoDB lock manager together with the current holders \
of the contended resource."
)]
pub struct PlocksCli {
    /// Recorded debugger session snapshot (JSON)
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}

#[derive(Parser)]
#[command(
    name = "pwaitsfor",
    version,
    about = "Print a waits-for graph for a mongod process in DOT format",
    long_about = "Examine a recorded debugger session of a mongod process and emit the \
directed waits-for graph relating threads and locks in Graphviz DOT format. An edge from a \
thread to a lock means the thread is waiting to acquire the lock; an edge from a lock to a \
thread means the lock is held by that thread. Cycles are exactly the deadlocks among the \
scanned threads."
)]
pub struct PwaitsforCli {
    /// Recorded debugger session snapshot (JSON)
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Write DOT to this file instead of standard output
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}
