//! A tiny interactive command interpreter.
//!
//! Each line read from the user is split on whitespace into tokens. The first
//! token names either a built-in (`cd`, `help`, `exit`) that runs in-process, or
//! an external program that is resolved through `PATH`, spawned, and waited for.
//! There is no quoting, expansion, redirection or piping: tokens reach the
//! program exactly as typed.
//!
//! The main entry point is [`Interpreter`]. Lines come from any [`LineReader`];
//! [`EditorReader`] offers line editing on a terminal, [`PlainReader`] reads from
//! any buffered stream.

mod builtin;
pub mod command;
mod external;
mod interpreter;
mod lexer;
mod reader;

pub use builtin::{BUILTINS, Builtin};
pub use command::{ExitCode, Outcome};
pub use external::{LaunchError, Termination, find_command_path, launch};
pub use interpreter::Interpreter;
pub use lexer::{DELIMITERS, Tokens, split_into_tokens};
pub use reader::{EditorReader, LineReader, PlainReader};

#[cfg(test)]
pub(crate) mod test_support {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Serializes tests that change or compare the process working directory.
    pub fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn make_unique_temp_dir(tag: &str) -> io::Result<PathBuf> {
        let mut p = env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("tinysh_test_{}_{}_{}", tag, std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }
}
