use crate::command::{EXIT_SUCCESS, Outcome};
use anyhow::{Context, Result, bail};
use std::env;
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Built-ins run in-process without spawning a child. They receive the full
/// token sequence, `args[0]` being the command name itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Help,
    Exit,
}

/// The built-in registry, in registration order.
///
/// Names are unique; `help` enumerates them in this order.
pub const BUILTINS: [Builtin; 3] = [Builtin::Cd, Builtin::Help, Builtin::Exit];

impl Builtin {
    /// Canonical name of the command, e.g. "cd" or "exit".
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Help => "help",
            Builtin::Exit => "exit",
        }
    }

    /// Finds the built-in registered under `name`.
    ///
    /// Matching is exact and case-sensitive; the first registered match wins.
    pub fn lookup(name: &str) -> Option<Builtin> {
        BUILTINS.iter().copied().find(|builtin| builtin.name() == name)
    }

    /// Executes the built-in.
    ///
    /// An `Err` is a diagnostic for the user, not a reason to stop the
    /// interpreter: the caller reports it and keeps reading lines.
    pub fn execute(self, args: &[&str], stdout: &mut dyn Write) -> Result<Outcome> {
        match self {
            Builtin::Cd => cd(args),
            Builtin::Help => help(stdout),
            Builtin::Exit => Ok(Outcome::Terminate(EXIT_SUCCESS)),
        }
    }
}

/// Change the process working directory to `args[1]`.
///
/// Arguments after the target are ignored. Children spawned later inherit the
/// new directory.
fn cd(args: &[&str]) -> Result<Outcome> {
    let Some(target) = args.get(1) else {
        bail!("cd: missing directory argument");
    };

    env::set_current_dir(target).with_context(|| format!("cd: {}", target))?;
    Ok(Outcome::Continue)
}

fn help(stdout: &mut dyn Write) -> Result<Outcome> {
    writeln!(stdout, "tinysh, a minimal command interpreter")?;
    writeln!(stdout, "Type program names and arguments, and hit enter.")?;
    writeln!(stdout, "The following are built in:")?;
    for builtin in BUILTINS {
        writeln!(stdout, "  {}", builtin.name())?;
    }
    writeln!(stdout, "Use the man command for information on other programs.")?;
    stdout.flush()?;
    Ok(Outcome::Continue)
}
