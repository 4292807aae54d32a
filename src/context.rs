//! # Run Context
//!
//! One [`Context`] is built per groot invocation and shared (via `Rc`) by the
//! superproject, every repository handle and every protocol. It owns:
//!
//! - the verbosity switches from the command line,
//! - the output configuration (colour, terminal detection),
//! - the effective [`Settings`],
//! - the deferred-log buffer,
//! - the error counter that decides the process exit status,
//! - the progress ticker,
//! - the process-runner strategy selected for this run.
//!
//! ## Deferred logging
//!
//! Banners for submodules are usually logged *deferred*: they sit in a buffer
//! and only reach the screen if something non-deferred follows. A submodule
//! with nothing to report therefore prints nothing at all, and the buffer is
//! discarded before the next one is visited.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Write};

use crate::error::Result;
use crate::output::{self, OutputConfig, Ticker};
use crate::process::{self, CommandOutput, Invocation, ProcessRunner};
use crate::settings::Settings;

/// Verbosity switches from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbosity {
    pub quiet: bool,
    pub verbose: bool,
    pub debug: bool,
}

/// Lines waiting to be printed if, and only if, something else gets printed.
#[derive(Debug, Default)]
pub struct DeferredLog {
    lines: VecDeque<String>,
}

impl DeferredLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    /// Write every pending line to `sink`, oldest first, and empty the buffer.
    pub fn flush_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<()> {
        while let Some(line) = self.lines.pop_front() {
            writeln!(sink, "{}", line)?;
        }
        Ok(())
    }

    pub fn discard(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Shared state for one groot run.
pub struct Context {
    verbosity: Verbosity,
    output: OutputConfig,
    settings: Settings,
    deferred: RefCell<DeferredLog>,
    errors: Cell<usize>,
    ticker: Ticker,
    runner: Box<dyn ProcessRunner>,
    out: RefCell<Box<dyn Write>>,
    err: RefCell<Box<dyn Write>>,
}

impl Context {
    /// Build the context, choosing the runner strategy from the terminal state.
    pub fn new(verbosity: Verbosity, output: OutputConfig, settings: Settings) -> Self {
        let runner = process::select_runner(output.is_terminal);
        let ticker = Ticker::new(output.is_terminal && !verbosity.quiet && !verbosity.verbose);
        log::debug!("# Using the {} process runner", runner.name());

        Self {
            verbosity,
            output,
            settings,
            deferred: RefCell::new(DeferredLog::new()),
            errors: Cell::new(0),
            ticker,
            runner,
            out: RefCell::new(Box::new(io::stdout())),
            err: RefCell::new(Box::new(io::stderr())),
        }
    }

    /// Replace the runner strategy.
    pub fn with_runner(mut self, runner: Box<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Redirect groot's own messages (not git's output) to other writers.
    pub fn with_writers(mut self, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        self.out = RefCell::new(out);
        self.err = RefCell::new(err);
        self
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity.quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity.verbose
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    /// Spawn through the selected runner, without the exit-status policy.
    pub fn spawn(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.ticker
            .suspend(|| process::spawn(self.runner.as_ref(), invocation))
    }

    /// Print a message, flushing any deferred lines in front of it.
    pub fn log(&self, msg: impl AsRef<str>) {
        if self.verbosity.quiet {
            return;
        }
        self.ticker.suspend(|| {
            let mut out = self.out.borrow_mut();
            let _ = self.deferred.borrow_mut().flush_to(&mut **out);
            let _ = writeln!(out, "{}", msg.as_ref());
            let _ = out.flush();
        });
    }

    /// Queue a message that is only printed if something else follows.
    pub fn log_deferred(&self, msg: impl Into<String>) {
        if self.verbosity.quiet {
            return;
        }
        self.deferred.borrow_mut().append(msg);
    }

    /// Print pending deferred lines now.
    pub fn flush(&self) {
        self.ticker.suspend(|| {
            let mut out = self.out.borrow_mut();
            let _ = self.deferred.borrow_mut().flush_to(&mut **out);
            let _ = out.flush();
        });
    }

    /// Drop pending deferred lines.
    pub fn discard(&self) {
        self.deferred.borrow_mut().discard();
    }

    /// Log the `# ---[ path ]---` banner for a repository.
    pub fn banner(&self, path: &str, deferred: bool) {
        let line = output::banner(&self.output, path);
        if deferred {
            self.log_deferred(String::new());
            self.log_deferred(line);
        } else {
            self.log("");
            self.log(line);
        }
    }

    /// Report a warning on stderr. Pending deferred lines go out first.
    pub fn warning(&self, msg: impl AsRef<str>) {
        self.flush();
        let line = output::warning(&self.output, msg.as_ref());
        self.ticker.suspend(|| {
            let mut err = self.err.borrow_mut();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        });
    }

    /// Report an error on stderr and count it toward the exit status.
    pub fn error(&self, msg: impl AsRef<str>) {
        self.errors.set(self.errors.get() + 1);
        self.flush();
        let line = output::error(&self.output, msg.as_ref());
        self.ticker.suspend(|| {
            let mut err = self.err.borrow_mut();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        });
    }

    /// Number of errors reported so far.
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    /// Advance the progress ticker, unless running verbosely.
    pub fn tick(&self, label: &str) {
        if !self.verbosity.verbose {
            self.ticker.tick(label);
        }
    }

    /// Clear the ticker and print whatever is still deferred.
    pub fn finish(&self) {
        self.ticker.clear();
        self.flush();
    }
}
