use roff::{bold, roman, Roff};
use std::fs;
use std::path::Path;

struct ManPage<'a> {
    name: &'a str,
    about: &'a str,
    description: &'a str,
    synopsis: &'a str,
    exit_status: &'a str,
    see_also: &'a str,
}

const DEFAULT_EXIT_STATUS: &str =
    "0 on success, non-zero if an error occurs (such as an unreadable snapshot \
     or invalid option). Threads that cannot be examined are reported on \
     standard error and do not affect the exit status.";

fn render_man_page(page: &ManPage, out_dir: &Path) {
    let version = env!("CARGO_PKG_VERSION");
    let upper_name = page.name.to_uppercase();
    let date_version = format!("{} {}", page.name, version);
    let mut roff = Roff::default();
    roff.control("TH", [upper_name.as_str(), "1", date_version.as_str()]);
    roff.control("SH", ["NAME"]);
    roff.text([roman(format!("{} - {}", page.name, page.about))]);
    roff.control("SH", ["SYNOPSIS"]);
    roff.text([bold(page.name), roman(format!(" {}", page.synopsis))]);
    roff.control("SH", ["DESCRIPTION"]);
    roff.text([roman(page.description)]);
    if !page.exit_status.is_empty() {
        roff.control("SH", ["EXIT STATUS"]);
        roff.text([roman(page.exit_status)]);
    }
    if !page.see_also.is_empty() {
        roff.control("SH", ["SEE ALSO"]);
        roff.text([roman(page.see_also)]);
    }
    fs::write(out_dir.join(format!("{}.1", page.name)), roff.to_roff()).unwrap();
}

fn main() {
    let out_dir = Path::new("target/man");
    fs::create_dir_all(out_dir).unwrap();

    render_man_page(
        &ManPage {
            name: "plocks",
            about: "print held and contended locks in a mongod process",
            description: "Examine a recorded debugger session of a mongod process and print one \
                          line for every lock relation that can be observed: threads blocked in \
                          std::mutex::lock() together with the owning thread, and threads inside \
                          the MongoDB lock manager together with the current holders of the \
                          contended resource. Threads that cannot be examined (for example \
                          because they exited while the session was being recorded) are reported \
                          on standard error and skipped.",
            synopsis: "SNAPSHOT",
            exit_status: DEFAULT_EXIT_STATUS,
            see_also: "pwaitsfor(1), gdb(1)",
        },
        out_dir,
    );

    render_man_page(
        &ManPage {
            name: "pwaitsfor",
            about: "print a waits-for graph for a mongod process in DOT format",
            description: "Examine a recorded debugger session of a mongod process and build the \
                          directed waits-for graph relating threads and locks: an edge from a \
                          thread to a lock means the thread is waiting to acquire the lock, and \
                          an edge from a lock to a thread means the lock is currently held by \
                          that thread. Cycles in this graph are exactly the deadlocks among the \
                          scanned threads. The graph is emitted in Graphviz DOT format to \
                          OUTPUT, or to standard output if OUTPUT is omitted. If no waits-for \
                          relation is found, 'lock graph is empty' is printed instead.",
            synopsis: "SNAPSHOT [OUTPUT]",
            exit_status: DEFAULT_EXIT_STATUS,
            see_also: "plocks(1), dot(1), gdb(1)",
        },
        out_dir,
    );

    println!("cargo:rerun-if-changed=build.rs");
}
