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

use std::io::{self, Write};
use std::process::exit;

use clap::Parser;

use lockgraph::cli::PlocksCli;
use lockgraph::replay::ReplayDebugger;
use lockgraph::scan;

fn main() {
    lockgraph::reset_sigpipe();
    // Skipped threads and unresolvable owners are reported at warn.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = PlocksCli::parse();

    let mut dbg = match ReplayDebugger::from_path(&cli.snapshot) {
        Ok(dbg) => dbg,
        Err(e) => {
            eprintln!("plocks: {}: {}", cli.snapshot.display(), e);
            exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = scan::show_locks(&mut dbg, &mut out) {
        eprintln!("plocks: {}", e);
        exit(1);
    }
    if out.flush().is_err() {
        exit(1);
    }
}
