//! Process termination for [`Fatal`] errors.

use crate::error::Fatal;

/// Exit status for every fatal database error.
pub const EXIT_FAILURE: i32 = 1;

/// Log a fatal error and terminate the process.
///
/// Libraries never call this themselves; a [`Fatal`] is returned like any
/// other error, and it is the binary that decides to stop here. The
/// diagnostic also goes to stderr, so it is seen even with logging off.
pub fn terminate(fatal: Fatal) -> ! {
    let code = fatal.exit_code();
    tracing::error!(step = %*fatal, error = ?fatal, code, "fatal database error");
    eprintln!("{}", diagnostic(&fatal));
    std::process::exit(code)
}

fn diagnostic(fatal: &Fatal) -> String {
    format!("vigil: {}: {fatal:?}", **fatal)
}
