use crate::command::ExitCode;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, trace};

#[cfg(unix)]
const ENOEXEC: i32 = 8;

/// Search path used when the interpreter has no `PATH` in its environment.
pub const DEFAULT_SEARCH_PATH: &str = "/bin:/usr/bin";

/// How a launched child reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The program exited normally with this code.
    Exited(ExitCode),
    /// The program was killed by this signal.
    Signaled(i32),
}

impl Termination {
    fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Termination::Exited(code),
            None => Termination::Signaled(terminating_signal(status)),
        }
    }
}

#[cfg(unix)]
fn terminating_signal(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(-1)
}

#[cfg(not(unix))]
fn terminating_signal(_status: ExitStatus) -> i32 {
    -1
}

/// Reasons a launch ended without the program running to completion.
#[derive(Debug)]
pub enum LaunchError {
    /// The program name did not resolve to an executable; no child was created.
    NotFound(String),
    /// The child could not be created at all, e.g. on resource exhaustion.
    Spawn { program: String, source: io::Error },
    /// The child was created but the program image could not be loaded into it.
    Exec { program: String, source: io::Error },
    /// The argument vector cannot be handed to the OS, e.g. it contains a NUL byte.
    InvalidArgument { program: String, source: io::Error },
    /// Waiting for the child failed.
    Wait { program: String, source: io::Error },
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::NotFound(program) => write!(f, "{}: command not found", program),
            LaunchError::Spawn { program, source } => {
                write!(f, "{}: failed to create process: {}", program, source)
            }
            LaunchError::Exec { program, source } => write!(f, "{}: {}", program, source),
            LaunchError::InvalidArgument { program, source } => {
                write!(f, "{}: invalid argument: {}", program, source)
            }
            LaunchError::Wait { program, source } => {
                write!(f, "{}: failed to wait for process: {}", program, source)
            }
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::NotFound(_) => None,
            LaunchError::Spawn { source, .. }
            | LaunchError::Exec { source, .. }
            | LaunchError::InvalidArgument { source, .. }
            | LaunchError::Wait { source, .. } => Some(source),
        }
    }
}

/// Sorts a `spawn` failure by whose fault it is: the arguments, the program
/// image, or process creation itself.
fn classify_spawn_error(program: &str, source: io::Error) -> LaunchError {
    let program = program.to_string();
    #[cfg(unix)]
    {
        if source.raw_os_error() == Some(ENOEXEC) {
            return LaunchError::Exec { program, source };
        }
    }
    match source.kind() {
        io::ErrorKind::InvalidInput => LaunchError::InvalidArgument { program, source },
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            LaunchError::Exec { program, source }
        }
        _ => LaunchError::Spawn { program, source },
    }
}

/// Launch `argv[0]` with `argv` as its argument vector and block until it terminates.
///
/// `search_paths` is the `PATH`-style list used to resolve a bare program name;
/// `None` falls back to [`DEFAULT_SEARCH_PATH`]. The child inherits stdio, the
/// environment and the working directory. The wait only returns once the child
/// has exited or was killed by a signal; a stopped child keeps the caller blocked.
pub fn launch(argv: &[&str], search_paths: Option<&OsStr>) -> Result<Termination, LaunchError> {
    let Some((&program, args)) = argv.split_first() else {
        return Err(LaunchError::NotFound(String::new()));
    };

    let search_paths = search_paths.unwrap_or(OsStr::new(DEFAULT_SEARCH_PATH));
    let executable = find_command_path(search_paths, Path::new(program))
        .ok_or_else(|| LaunchError::NotFound(program.to_string()))?;
    trace!(program, executable = %executable.display(), "resolved program");

    let mut command = Command::new(&*executable);
    command.args(args);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.arg0(program);
    }

    let mut child = command
        .spawn()
        .map_err(|source| classify_spawn_error(program, source))?;
    debug!(program, pid = child.id(), "spawned child");

    // Child::wait does not ask to be told about stopped children, so it only
    // returns on exit or signal death.
    let status = child.wait().map_err(|source| LaunchError::Wait {
        program: program.to_string(),
        source,
    })?;

    let termination = Termination::from_status(status);
    debug!(program, ?termination, "child terminated");
    Ok(termination)
}

/// Resolve a command path the way `execvp` would.
///
/// Behavior:
/// - Empty name: returns `None`.
/// - Name containing a path separator anywhere (`/bin/sh`, `./foo`, `bin/sh`,
///   `sh/`): used as-is if it is an executable file.
/// - Bare name: each directory in `search_paths` is tried in order and the first
///   executable file wins. An empty entry stands for the current directory and
///   resolves to `./name`, so the result never triggers a second search.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via the search path.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.as_os_str().is_empty() {
        return None;
    }

    // Path::components drops a trailing separator, so look at the raw bytes.
    let has_separator = path
        .as_os_str()
        .as_encoded_bytes()
        .iter()
        .any(|&b| std::path::is_separator(b as char));
    if has_separator {
        find_by_path(path).map(Cow::Borrowed)
    } else {
        find_in_path(search_paths, path.as_os_str()).map(Cow::Owned)
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| {
            if dir.as_os_str().is_empty() {
                Path::new(".").join(cmd)
            } else {
                dir.join(cmd)
            }
        })
        .find(|candidate| is_executable(candidate))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lock_current_dir, make_unique_temp_dir};
    use std::fs;
    use std::fs::File;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    #[cfg(unix)]
    fn make_executable(path: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, body).expect("write script");
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/nowhere"), path).expect("absolute /bin/sh");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_nonexisting() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/nowhere:/bin"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting-program-xyz"));
        assert!(res.is_none());
    }

    #[test]
    fn empty_path_is_none() {
        assert!(find_command_path(osstr("/bin"), Path::new("")).is_none());
    }

    #[test]
    #[cfg(unix)]
    fn non_executable_files_are_skipped() {
        let first = make_unique_temp_dir("path_a").unwrap();
        let second = make_unique_temp_dir("path_b").unwrap();
        File::create(first.join("tool")).unwrap();
        make_executable(&second.join("tool"), "#!/bin/sh\n");

        let joined = std::env::join_paths([&first, &second]).unwrap();
        let found = find_command_path(&joined, Path::new("tool")).map(|p| p.into_owned());

        let _ = fs::remove_dir_all(&first);
        let _ = fs::remove_dir_all(&second);
        assert_eq!(found, Some(second.join("tool")));
    }

    #[test]
    #[cfg(unix)]
    fn directories_are_not_executables() {
        let dir = make_unique_temp_dir("dir_entry").unwrap();
        fs::create_dir(dir.join("sub")).unwrap();
        let found = find_command_path(dir.as_os_str(), Path::new("sub"));
        let _ = fs::remove_dir_all(&dir);
        assert!(found.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn launch_reports_exit_code() {
        let res = launch(&["sh", "-c", "exit 3"], Some(osstr("/bin:/usr/bin")));
        assert_eq!(res.unwrap(), Termination::Exited(3));
    }

    #[test]
    #[cfg(unix)]
    fn launch_passes_full_argument_vector() {
        // $0 is argv[0] as typed, $1 and $2 the remaining tokens.
        let script = r#"test "$0" = sh && test "$1" = a && test "$2" = b && test $# -eq 2"#;
        let res = launch(&["sh", "-c", script, "sh", "a", "b"], Some(osstr("/bin:/usr/bin")));
        assert_eq!(res.unwrap(), Termination::Exited(0));
    }

    #[test]
    #[cfg(unix)]
    fn launch_resolves_through_search_path() {
        let dir = make_unique_temp_dir("search").unwrap();
        make_executable(&dir.join("exit6"), "#!/bin/sh\nexit 6\n");

        let res = launch(&["exit6"], Some(dir.as_os_str()));
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(res.unwrap(), Termination::Exited(6));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn launch_keeps_argv0_as_typed() {
        // "sh" resolves to a full path; the first cmdline entry must still be "sh".
        // A #! script cannot check this, the kernel rewrites its $0.
        let script = r#"test "$(tr '\0' '\n' < /proc/$$/cmdline | head -n 1)" = sh"#;
        let res = launch(&["sh", "-c", script], Some(osstr("/bin:/usr/bin")));
        assert_eq!(res.unwrap(), Termination::Exited(0));
    }

    #[test]
    #[cfg(unix)]
    fn trailing_separator_is_not_a_bare_name() {
        assert!(find_command_path(osstr("/bin:/usr/bin"), Path::new("sh/")).is_none());

        let res = launch(&["sh/", "-c", "exit 5"], Some(osstr("/bin:/usr/bin")));
        assert!(matches!(res, Err(LaunchError::NotFound(ref p)) if p == "sh/"), "{:?}", res);
    }

    #[test]
    #[cfg(unix)]
    fn empty_search_entry_means_current_dir() {
        let _lock = lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let dir = make_unique_temp_dir("cwd_entry").unwrap();
        make_executable(&dir.join("local-prog-xyz"), "#!/bin/sh\nexit 4\n");

        std::env::set_current_dir(&dir).expect("set cwd");
        let found = find_command_path(osstr(":/bin"), Path::new("local-prog-xyz"))
            .map(|p| p.into_owned());
        let res = launch(&["local-prog-xyz"], Some(osstr(":/bin")));
        std::env::set_current_dir(&orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(found, Some(PathBuf::from("./local-prog-xyz")));
        assert_eq!(res.unwrap(), Termination::Exited(4));
    }

    #[test]
    #[cfg(unix)]
    fn nul_byte_in_argument_is_invalid_argument() {
        let res = launch(&["sh", "-c", "exit 0\0oops"], Some(osstr("/bin:/usr/bin")));
        let err = res.unwrap_err();
        assert!(matches!(err, LaunchError::InvalidArgument { .. }), "{:?}", err);
        assert!(err.to_string().starts_with("sh: invalid argument: "), "{}", err);
    }

    #[test]
    #[cfg(unix)]
    fn launch_reports_signal_death() {
        let res = launch(&["sh", "-c", "kill -9 $$"], Some(osstr("/bin:/usr/bin")));
        assert_eq!(res.unwrap(), Termination::Signaled(9));
    }

    #[test]
    #[cfg(unix)]
    fn launch_waits_through_stop_and_continue() {
        // The child stops itself; a background helper resumes it. The wait must
        // not return on the stop.
        let script = "(sleep 1; kill -CONT $$) & kill -STOP $$; exit 7";
        let res = launch(&["sh", "-c", script], Some(osstr("/bin:/usr/bin")));
        assert_eq!(res.unwrap(), Termination::Exited(7));
    }

    #[test]
    fn launch_unknown_program_is_not_found() {
        let err = launch(&["nonexisting-program-xyz", "a"], Some(osstr("/bin"))).unwrap_err();
        assert!(matches!(err, LaunchError::NotFound(ref p) if p == "nonexisting-program-xyz"));
        assert_eq!(err.to_string(), "nonexisting-program-xyz: command not found");
    }

    #[test]
    #[cfg(unix)]
    fn launch_missing_interpreter_is_exec_failure() {
        let dir = make_unique_temp_dir("noexec").unwrap();
        let script = dir.join("orphan");
        make_executable(&script, "#!/nonexistent/interpreter-xyz\n");

        let program = script.to_string_lossy().to_string();
        let res = launch(&[program.as_str()], None);
        let _ = fs::remove_dir_all(&dir);
        assert!(matches!(res, Err(LaunchError::Exec { .. })), "{:?}", res);
    }

    #[test]
    fn launch_empty_argv_is_not_found() {
        assert!(matches!(launch(&[], None), Err(LaunchError::NotFound(_))));
    }
}
