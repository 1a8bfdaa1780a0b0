//! Command-line runner for the layer boundary lint.
//!
//! `cargo run -p architecture-lint [BACKEND_DIR]`. Without an argument the
//! `backend/` directory is found by walking up from the working directory
//! and then from this crate's manifest directory.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(backend_dir) = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(locate_backend)
    else {
        report("could not find a backend/src directory; pass the backend path explicitly");
        return ExitCode::FAILURE;
    };

    match architecture_lint::lint_backend_sources(&backend_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

fn report(message: &str) {
    let _ = writeln!(io::stderr().lock(), "{message}");
}

fn locate_backend() -> Option<PathBuf> {
    let from_cwd = std::env::current_dir().ok();
    let from_manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    from_cwd
        .as_deref()
        .and_then(backend_above)
        .or_else(|| backend_above(&from_manifest))
}

fn backend_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join("backend"))
        .find(|candidate| candidate.join("src").is_dir())
}
