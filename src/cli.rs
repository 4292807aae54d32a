//! CLI argument parsing and command dispatch

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use groot::context::{Context, Verbosity};
use groot::output::OutputConfig;
use groot::settings::Settings;
use groot::superproject::{self, Superproject};

use crate::commands;

/// groot - run git across a superproject and all of its submodules
#[derive(Parser, Debug)]
#[command(name = "groot")]
#[command(version, about, long_about = None)]
#[command(after_help = "`groot --in <SUBMODULE> <COMMAND..>` runs a git command inside one submodule.")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Options that apply to every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Root of the superproject (default: search upwards from the current directory)
    #[arg(
        short = 'r',
        long = "root",
        visible_alias = "repo",
        global = true,
        value_name = "DIR",
        env = "GROOT_ROOT"
    )]
    pub root: Option<PathBuf>,

    /// Only print what git prints
    #[arg(short, long)]
    pub quiet: bool,

    /// Print every step, including submodules with nothing to report
    #[arg(short, long)]
    pub verbose: bool,

    /// Trace every git command and its output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl GlobalOptions {
    /// Build the run context, reading settings for `root` when one is known.
    pub fn context(&self, root: Option<&Path>) -> Result<Rc<Context>> {
        let settings = Settings::load(root)?;
        let color = match (self.color.as_str(), &settings.color) {
            ("auto", Some(preferred)) => preferred.clone(),
            (flag, _) => flag.to_string(),
        };
        let verbosity = Verbosity {
            quiet: self.quiet,
            verbose: self.verbose || self.debug,
            debug: self.debug,
        };
        Ok(Rc::new(Context::new(
            verbosity,
            OutputConfig::from_env_and_flag(&color),
            settings,
        )))
    }

    /// Find the superproject and build the context around it.
    pub fn superproject(&self) -> Result<Superproject> {
        let root = superproject::locate_root(self.root.as_deref())?;
        log::debug!("# Superproject root: {}", root.display());
        let ctx = self.context(Some(&root))?;
        Ok(Superproject::open(ctx, root))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add paths to the index of the repository owning them
    Add(commands::add::AddArgs),

    /// Run git branch in the root
    Branch(commands::root::RootArgs),

    /// Check out the root and bring submodules onto their preferred branches
    #[command(visible_alias = "co")]
    Checkout(commands::checkout::CheckoutArgs),

    /// Clone a superproject and set up its submodules
    Clone(commands::clone::CloneArgs),

    /// Commit in submodules, then in the root
    Commit(commands::commit::CommitArgs),

    /// Show changes in the root and in every changed submodule
    Diff(commands::diff::DiffArgs),

    /// Run a git command inside one submodule
    In(commands::in_submodule::InArgs),

    /// Describe the superproject and its submodules
    Info(commands::info::InfoArgs),

    /// Turn the current directory into a superproject
    Init(commands::init::InitArgs),

    /// Show logs of the repositories owning the given paths
    Log(commands::log::LogArgs),

    /// Merge a ref in every submodule, then in the root
    Merge(commands::merge::MergeArgs),

    /// Pull every submodule and the root, recording advanced submodules
    Pull(commands::pull::PullArgs),

    /// Push every submodule on a branch, then the root
    Push(commands::push::PushArgs),

    /// Run git reset in the root
    Reset(commands::root::RootArgs),

    /// Create or switch to a branch everywhere
    Start(commands::start::StartArgs),

    /// Stash in every dirty repository, tied together by a shared tag
    Stash(commands::stash::StashArgs),

    /// Show the status of the root and of every submodule with changes
    #[command(visible_aliases = ["st", "stat"])]
    Status(commands::status::StatusArgs),

    /// Run git submodule in the root
    Submodule(commands::root::RootArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.global.log_level, self.global.debug);
        let global = &self.global;

        match self.command {
            Commands::Completions(args) => commands::completions::execute(args),
            Commands::Info(args) => commands::info::execute(args, global),
            Commands::Init(args) => commands::init::execute(args, global),
            Commands::Clone(args) => commands::clone::execute(args, global),
            command => {
                let sp = global.superproject()?;
                let result = dispatch(command, &sp);
                sp.ctx().finish();
                result?;
                finish(sp.ctx())
            }
        }
    }
}

/// Wrap up a run; errors reported along the way fail the process.
pub fn finish(ctx: &Context) -> Result<()> {
    ctx.finish();
    let errors = ctx.error_count();
    if errors > 0 {
        bail!(
            "{} error{} reported, see above",
            errors,
            if errors == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

fn dispatch(command: Commands, sp: &Superproject) -> Result<()> {
    match command {
        Commands::Add(args) => commands::add::execute(args, sp),
        Commands::Branch(args) => commands::root::execute("branch", args, sp),
        Commands::Checkout(args) => commands::checkout::execute(args, sp),
        Commands::Commit(args) => commands::commit::execute(args, sp),
        Commands::Diff(args) => commands::diff::execute(args, sp),
        Commands::In(args) => commands::in_submodule::execute(args, sp),
        Commands::Log(args) => commands::log::execute(args, sp),
        Commands::Merge(args) => commands::merge::execute(args, sp),
        Commands::Pull(args) => commands::pull::execute(args, sp),
        Commands::Push(args) => commands::push::execute(args, sp),
        Commands::Reset(args) => commands::root::execute("reset", args, sp),
        Commands::Start(args) => commands::start::execute(args, sp),
        Commands::Stash(args) => commands::stash::execute(args, sp),
        Commands::Status(args) => commands::status::execute(args, sp),
        Commands::Submodule(args) => commands::root::execute("submodule", args, sp),
        Commands::Completions(_) | Commands::Info(_) | Commands::Init(_) | Commands::Clone(_) => {
            Ok(())
        }
    }
}

/// Initialise `env_logger`; `RUST_LOG` still wins over the flags.
fn init_logging(level: &str, debug: bool) {
    let level = if debug { "debug" } else { level };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

/// Rewrite `groot [opts] --in <submodule> <command..>` into
/// `groot [opts] in <submodule> <command..>`.
///
/// Only an `--in` in front of the command is rewritten.
pub fn rewrite_in_option(argv: Vec<String>) -> Vec<String> {
    const VALUED: [&str; 6] = ["-r", "--root", "--repo", "--color", "--log-level", "--in"];

    let mut i = 1;
    while i < argv.len() {
        let arg = argv[i].as_str();
        if arg == "--in" {
            let mut rewritten = argv[..i].to_vec();
            rewritten.push("in".to_string());
            rewritten.extend(argv[i + 1..].iter().cloned());
            return rewritten;
        }
        if let Some(submodule) = arg.strip_prefix("--in=") {
            let mut rewritten = argv[..i].to_vec();
            rewritten.push("in".to_string());
            rewritten.push(submodule.to_string());
            rewritten.extend(argv[i + 1..].iter().cloned());
            return rewritten;
        }
        if !arg.starts_with('-') {
            break;
        }
        i += if VALUED.contains(&arg) { 2 } else { 1 };
    }
    argv
}
