//! `json-mirror`: replay a server-sent event stream into an in-memory tree.
//!
//! Usage:
//!   json-mirror [--changes] [--snapshot] [--config <file.toml>] < events
//!
//! Records (`event: put|patch|keep-alive|cancel|auth_revoked` plus a
//! `data:` line) are read from stdin. One line per tree event is printed;
//! `--snapshot` prints the final tree as JSON. Set `RUST_LOG` for logs.

use std::io;

use json_mirror::cli::{parse_args, run};

fn main() {
    env_logger::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    match run(&args, stdin.lock(), &mut stdout.lock()) {
        Ok(summary) => log::info!(
            "replayed {} records ({} skipped), {} events",
            summary.records,
            summary.skipped,
            summary.events
        ),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
