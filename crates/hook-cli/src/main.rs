mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use hook_core::presence::NotifyMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cchook",
    about = "Status line and lifecycle hooks for the Claude CLI: context budget, presence-aware alerts, formatting, metrics and prompt reminders",
    version,
    propagate_version = true
)]
struct Cli {
    /// Host configuration directory (default: ~/.claude)
    #[arg(long, global = true, env = "CLAUDE_CONFIG_DIR")]
    claude_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Disable ANSI colours (also honours NO_COLOR)
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the status line for the payload on stdin
    Statusline,

    /// Notification hook: alert the user when they appear to be away
    Notify {
        /// Treat the payload as a Stop event (turn finished)
        #[arg(long)]
        stop: bool,
    },

    /// PostToolUse hook: run a formatter on the edited file
    Format,

    /// PostToolUse hook: update the tool-usage counters
    Metrics,

    /// UserPromptSubmit hook: inject workflow guides for trigger words
    Remind,

    /// PostToolUse hook: after plan mode ends, ask for parallel stages
    Parallel,

    /// UserPromptSubmit hook: expand `/git` with the repository state
    GitContext,

    /// Show the effective notification mode, or persist a new one
    Mode {
        /// on, off or auto
        mode: Option<NotifyMode>,
    },

    /// Inspect the hook configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

impl Commands {
    /// Hook subcommands are invoked by the host and must never fail it.
    fn hook_name(&self) -> Option<&'static str> {
        match self {
            Commands::Statusline => Some("statusline"),
            Commands::Notify { .. } => Some("notify"),
            Commands::Format => Some("format"),
            Commands::Metrics => Some("metrics"),
            Commands::Remind => Some("remind"),
            Commands::Parallel => Some("parallel"),
            Commands::GitContext => Some("git-context"),
            Commands::Mode { .. } | Commands::Config { .. } => None,
        }
    }
}

fn color_enabled(no_color_flag: bool) -> bool {
    let env_disabled = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    !(no_color_flag || env_disabled)
}

fn main() {
    let cli = Cli::parse();

    // stdout belongs to the host; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let color = color_enabled(cli.no_color);
    // colored disables itself when stdout is not a tty, which is always the
    // case under the host.
    colored::control::set_override(color);

    let home = root::resolve_home(cli.claude_dir.as_deref());
    let hook_name = cli.command.hook_name();

    let result = match cli.command {
        Commands::Statusline => cmd::statusline::run(&home, cli.json, color),
        Commands::Notify { stop } => cmd::notify::run(&home, stop, cli.json),
        Commands::Format => cmd::format::run(&home, cli.json),
        Commands::Metrics => cmd::metrics::run(&home, cli.json),
        Commands::Remind => cmd::remind::run(&home, cli.json),
        Commands::Parallel => cmd::parallel::run(&home),
        Commands::GitContext => cmd::git_context::run(cli.json),
        Commands::Mode { mode } => cmd::mode::run(&home, mode, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&home, subcommand, cli.json),
    };

    if let Err(e) = result {
        if let Some(hook) = hook_name {
            tracing::warn!(hook, "{e:#}");
            return;
        }
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
