/// Status the interpreter process exits with.
pub type ExitCode = i32;

/// Exit code for end-of-input and the `exit` built-in.
pub const EXIT_SUCCESS: ExitCode = 0;

/// Exit code for an unrecoverable read failure.
pub const EXIT_FAILURE: ExitCode = 1;

/// What the interpreter loop should do after a line has been handled.
///
/// Exactly one outcome is produced per line. Only the `exit` built-in yields
/// [`Outcome::Terminate`]; external programs never stop the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Read another line.
    Continue,
    /// Stop the loop and leave the process with the given status.
    Terminate(ExitCode),
}
