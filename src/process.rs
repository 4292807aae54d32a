//! # Process Execution
//!
//! Every git invocation in groot goes through a [`ProcessRunner`]. Two
//! strategies exist, and the choice is made once per run:
//!
//! - [`PipedRunner`]: plain pipes. stdout/stderr are either inherited or
//!   captured depending on the [`Capture`] setting.
//! - [`PtyRunner`] (unix only): used when groot's own stdout is a terminal.
//!   Invocations asking for [`Mode::Interactive`] get a pseudo-terminal as
//!   stdout, so git keeps its colours and terminal heuristics. The master side
//!   is read until an end-of-output marker printed by a tiny shell wrapper
//!   shows up, which also carries git's exit code.
//!
//! When stdout is not a terminal only the piped strategy exists, so an
//! interactive request quietly degrades to pipes.
//!
//! [`execute`] wraps a runner with the shared policy: the working directory is
//! switched to the repository for the duration of the call (and restored on
//! every exit path), the command and its output are traced at debug level, and
//! exit codes outside the accepted set become [`Error::GitCommand`].

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{quote_argv, Error, Result};

/// Which output streams are captured instead of inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capture {
    /// Both streams go straight to groot's own stdout/stderr.
    #[default]
    None,
    /// stdout is captured, stderr is inherited.
    Stdout,
    /// Both streams are captured.
    All,
}

/// Whether the child should believe it is talking to a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Piped,
    Interactive,
}

/// A fully described command to run.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Directory to run in; `None` keeps the current directory.
    pub dir: Option<PathBuf>,
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    pub capture: Capture,
    pub mode: Mode,
    /// Exit codes treated as success.
    pub accept: Vec<i32>,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dir: None,
            argv: argv.into_iter().map(Into::into).collect(),
            capture: Capture::None,
            mode: Mode::Piped,
            accept: vec![0],
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn capture(mut self, capture: Capture) -> Self {
        self.capture = capture;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn accept(mut self, codes: &[i32]) -> Self {
        self.accept = codes.to_vec();
        self
    }
}

/// What a finished child left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A strategy for spawning a child and collecting its output.
///
/// Implementations only spawn and wait; exit-status policy, directory
/// switching and tracing live in [`execute`].
pub trait ProcessRunner {
    fn spawn(&self, invocation: &Invocation) -> io::Result<CommandOutput>;

    /// Short strategy name, for diagnostics.
    fn name(&self) -> &'static str;
}

/// Pick the runner strategy for this run.
pub fn select_runner(stdout_is_terminal: bool) -> Box<dyn ProcessRunner> {
    #[cfg(unix)]
    if stdout_is_terminal {
        return Box::new(PtyRunner::new());
    }
    #[cfg(not(unix))]
    let _ = stdout_is_terminal;

    Box::new(PipedRunner)
}

/// Environment applied to every child: never start a pager.
fn base_command(program: &str) -> Command {
    let mut command = Command::new(program);
    command.env("PAGER", "").env("GIT_PAGER", "");
    command
}

/// Runs children over plain pipes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipedRunner;

impl ProcessRunner for PipedRunner {
    fn spawn(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let (program, args) = invocation
            .argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;

        let mut command = base_command(program);
        command.args(args).stdin(Stdio::inherit());
        match invocation.capture {
            Capture::None => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            Capture::Stdout => {
                command.stdout(Stdio::piped()).stderr(Stdio::inherit());
            }
            Capture::All => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        let output = command.output()?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }

    fn name(&self) -> &'static str {
        "piped"
    }
}

#[cfg(unix)]
pub use pty::PtyRunner;

#[cfg(unix)]
mod pty {
    use std::fs::File;
    use std::io::{self, BufRead, BufReader, Read, Write};
    use std::process::Stdio;
    use std::thread;

    use nix::pty::{openpty, Winsize};
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    use super::{base_command, Capture, CommandOutput, Invocation, Mode, PipedRunner, ProcessRunner};

    /// Prints `<marker>:<exit code>` once the wrapped command has finished.
    const WRAPPER_SCRIPT: &str = r#""$@"; printf '\n%s:%d\n' "$0" "$?""#;

    /// Runs interactive invocations on a pseudo-terminal.
    pub struct PtyRunner {
        marker: String,
    }

    impl PtyRunner {
        pub fn new() -> Self {
            let salt: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(8)
                .map(char::from)
                .collect();
            Self {
                marker: format!("___EOF-{}-{}___", std::process::id(), salt),
            }
        }

        fn winsize() -> Option<Winsize> {
            let (rows, cols) = console::Term::stdout().size_checked()?;
            Some(Winsize {
                ws_row: rows,
                ws_col: cols,
                ws_xpixel: 0,
                ws_ypixel: 0,
            })
        }

        /// Split one line read from the master side at the marker, if present.
        ///
        /// Returns the bytes that belong to the command's output and the
        /// exit code when the marker was found.
        fn scan_line<'l>(&self, line: &'l [u8]) -> (&'l [u8], Option<i32>) {
            let marker = self.marker.as_bytes();
            let Some(start) = line.windows(marker.len()).position(|w| w == marker) else {
                return (line, None);
            };
            let rest = &line[start + marker.len()..];
            let code = rest
                .strip_prefix(b":")
                .map(|digits| {
                    digits
                        .iter()
                        .take_while(|b| b.is_ascii_digit())
                        .copied()
                        .collect::<Vec<u8>>()
                })
                .and_then(|digits| String::from_utf8(digits).ok())
                .and_then(|digits| digits.parse().ok());
            match code {
                Some(code) => (&line[..start], Some(code)),
                None => (line, None),
            }
        }
    }

    /// Forwards terminal output line by line, holding back each line ending
    /// until the next line arrives. The wrapper prints a newline right before
    /// its marker, so the ending held when the marker shows up is dropped.
    struct Forwarder<W: Write> {
        out: W,
        held: Vec<u8>,
    }

    impl<W: Write> Forwarder<W> {
        fn new(out: W) -> Self {
            Self {
                out,
                held: Vec::new(),
            }
        }

        fn write_line(&mut self, text: &[u8]) -> io::Result<()> {
            let body = text.len() - line_ending(text).len();
            self.out.write_all(&self.held)?;
            self.out.write_all(&text[..body])?;
            self.out.flush()?;
            self.held = text[body..].to_vec();
            Ok(())
        }

        fn write_before_marker(&mut self, text: &[u8]) -> io::Result<()> {
            self.held.clear();
            self.out.write_all(text)?;
            self.out.flush()
        }

        /// Emit the held line ending unless the marker ended the output.
        fn finish(mut self, marker_seen: bool) -> io::Result<()> {
            if !marker_seen {
                self.out.write_all(&self.held)?;
            }
            self.out.flush()
        }
    }

    fn line_ending(text: &[u8]) -> &[u8] {
        if text.ends_with(b"\r\n") {
            &text[text.len() - 2..]
        } else if text.ends_with(b"\n") {
            &text[text.len() - 1..]
        } else {
            &[]
        }
    }

    impl Default for PtyRunner {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ProcessRunner for PtyRunner {
        fn spawn(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
            if invocation.mode == Mode::Piped {
                return PipedRunner.spawn(invocation);
            }
            if invocation.argv.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "empty command line",
                ));
            }

            let winsize = Self::winsize();
            let pty = openpty(winsize.as_ref(), None).map_err(io::Error::from)?;

            let mut command = base_command("sh");
            command
                .arg("-c")
                .arg(WRAPPER_SCRIPT)
                .arg(&self.marker)
                .args(&invocation.argv)
                .stdin(Stdio::inherit())
                .stdout(Stdio::from(pty.slave));
            if invocation.capture == Capture::All {
                command.stderr(Stdio::piped());
            } else {
                command.stderr(Stdio::inherit());
            }

            let mut child = command.spawn()?;
            // Our copy of the slave end must be closed, or reads never see EOF.
            drop(command);

            let stderr_reader = child.stderr.take().map(|mut stderr| {
                thread::spawn(move || {
                    let mut buf = Vec::new();
                    let _ = stderr.read_to_end(&mut buf);
                    buf
                })
            });

            let mut forwarder = (invocation.capture == Capture::None).then(|| Forwarder::new(io::stdout()));
            let mut reader = BufReader::new(File::from(pty.master));
            let mut stdout = Vec::new();
            let mut code = None;
            let mut line = Vec::new();
            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => break,
                    Ok(_) => {}
                    // Linux reports EIO on the master once every slave fd is closed.
                    Err(e) if e.raw_os_error() == Some(nix::libc::EIO) => break,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }

                let (text, found) = self.scan_line(&line);
                match forwarder.as_mut() {
                    Some(forwarder) if found.is_some() => forwarder.write_before_marker(text)?,
                    Some(forwarder) => forwarder.write_line(text)?,
                    None => stdout.extend_from_slice(text),
                }
                if found.is_some() {
                    code = found;
                    break;
                }
            }
            if let Some(forwarder) = forwarder {
                forwarder.finish(code.is_some())?;
            }

            if code.is_some() {
                // The wrapper may still be holding the terminal open.
                let _ = child.kill();
            }
            let status = child.wait()?;
            let code = code.or_else(|| status.code());

            // The wrapper's printf starts with a newline; drop it from the output.
            if stdout.ends_with(b"\r\n") {
                stdout.truncate(stdout.len() - 2);
            } else if stdout.ends_with(b"\n") {
                stdout.truncate(stdout.len() - 1);
            }

            let stderr = stderr_reader
                .and_then(|handle| handle.join().ok())
                .unwrap_or_default();

            Ok(CommandOutput {
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                code,
            })
        }

        fn name(&self) -> &'static str {
            "pty"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_scan_line_without_marker() {
            let runner = PtyRunner::new();
            let (text, code) = runner.scan_line(b"On branch master\r\n");
            assert_eq!(text, b"On branch master\r\n");
            assert_eq!(code, None);
        }

        #[test]
        fn test_scan_line_with_marker() {
            let runner = PtyRunner::new();
            let line = format!("tail{}:3\r\n", runner.marker);
            let (text, code) = runner.scan_line(line.as_bytes());
            assert_eq!(text, b"tail");
            assert_eq!(code, Some(3));
        }

        #[test]
        fn test_forwarder_drops_newline_before_marker() {
            let runner = PtyRunner::new();
            let marker_line = format!("{}:0", runner.marker);
            let mut out = Vec::new();
            let mut forwarder = Forwarder::new(&mut out);
            for line in [&b"one\r\n"[..], b"two\r\n", b"\r\n", marker_line.as_bytes()] {
                let (text, found) = runner.scan_line(line);
                if found.is_some() {
                    forwarder.write_before_marker(text).unwrap();
                } else {
                    forwarder.write_line(text).unwrap();
                }
            }
            forwarder.finish(true).unwrap();
            assert_eq!(out, b"one\r\ntwo\r\n");
        }

        #[test]
        fn test_forwarder_keeps_last_newline_without_marker() {
            let mut out = Vec::new();
            let mut forwarder = Forwarder::new(&mut out);
            forwarder.write_line(b"partial").unwrap();
            forwarder.write_line(b"done\n").unwrap();
            forwarder.finish(false).unwrap();
            assert_eq!(out, b"partialdone\n");
        }

        #[test]
        fn test_markers_are_unique_per_runner() {
            assert_ne!(PtyRunner::new().marker, PtyRunner::new().marker);
        }
    }
}

/// Switches the process working directory and restores it on drop.
///
/// The working directory is process-global, so callers must not run two
/// of these concurrently.
#[derive(Debug)]
pub struct ScopedDir {
    previous: PathBuf,
}

impl ScopedDir {
    pub fn enter(dir: &Path) -> io::Result<Self> {
        let previous = env::current_dir()?;
        env::set_current_dir(dir)?;
        Ok(Self { previous })
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            log::warn!(
                "failed to restore working directory {}: {}",
                self.previous.display(),
                e
            );
        }
    }
}

/// Spawn an invocation without applying the exit-status policy.
///
/// Spawn failures (for example git not being installed) come back as
/// [`Error::GitCommand`] with no exit code.
pub fn spawn(runner: &dyn ProcessRunner, invocation: &Invocation) -> Result<CommandOutput> {
    let where_ = invocation
        .dir
        .as_deref()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| ".".to_string());
    log::debug!("# In {}: {}", where_, quote_argv(&invocation.argv));

    let result = {
        let _cwd = match &invocation.dir {
            Some(dir) => Some(ScopedDir::enter(dir)?),
            None => None,
        };
        runner.spawn(invocation)
    };

    let output = result.map_err(|e| Error::GitCommand {
        path: invocation.dir.clone().unwrap_or_default(),
        argv: invocation.argv.clone(),
        stdout: String::new(),
        stderr: e.to_string(),
        code: None,
    })?;

    if log::log_enabled!(log::Level::Debug) {
        for line in output.stderr.trim_end().lines() {
            log::debug!("EE> {}", line);
        }
        for line in output.stdout.trim_end().lines() {
            log::debug!("--> {}", line);
        }
    }

    Ok(output)
}

/// Fail with [`Error::GitCommand`] unless the exit code is accepted.
pub fn check_status(invocation: &Invocation, output: CommandOutput) -> Result<CommandOutput> {
    match output.code {
        Some(code) if invocation.accept.contains(&code) => Ok(output),
        code => Err(Error::GitCommand {
            path: invocation.dir.clone().unwrap_or_default(),
            argv: invocation.argv.clone(),
            stdout: output.stdout,
            stderr: output.stderr,
            code,
        }),
    }
}

/// Spawn an invocation and apply the exit-status policy.
pub fn execute(runner: &dyn ProcessRunner, invocation: &Invocation) -> Result<CommandOutput> {
    let output = spawn(runner, invocation)?;
    check_status(invocation, output)
}
