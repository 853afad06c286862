use clap::{Parser, Subcommand};
use colored::control;
use ctx::{Context, RepositoryManager, Settings};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser)]
#[command(name = "ctx")]
#[command(version)]
#[command(about = "Collaborative memory for humans and LLMs, backed by git")]
struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ctx repository and make it active
    New {
        /// Directory to create, relative to the project root
        #[arg(default_value = "context")]
        directory: String,
    },
    /// Show the active repository's branch and pending changes
    Status,
    /// Start exploring a topic on a new branch (git checkout -b <topic>)
    Explore { topic: String },
    /// Commit all pending changes (git add -A && git commit -m <message>)
    Capture { message: String },
    /// Merge an exploration into a target branch, after previewing it
    Integrate {
        exploration: String,

        /// Branch to integrate into (defaults to CTX_DEFAULT_BRANCH or main)
        #[arg(long)]
        target: Option<String>,

        /// Only show what would be integrated
        #[arg(long)]
        preview: bool,

        /// Integrate without asking even if conflicts are predicted
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// List registered ctx repositories
    List,
    /// Make another registered repository active
    Switch { name: String },
    /// Show changes in the working tree or between branches
    Diff {
        /// Diff staged changes
        #[arg(long)]
        staged: bool,

        /// Zero, one or two branches
        branches: Vec<String>,
    },
}

fn main() -> ExitCode {
    let settings = Settings::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.json {
        control::set_override(false);
    }

    let Some(command) = cli.command else {
        println!("ctx v{}", env!("CARGO_PKG_VERSION"));
        println!("Try 'ctx --help' for more information.");
        return ExitCode::SUCCESS;
    };

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: failed to get current directory: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let out = render::Printer::new(cli.json, &settings.default_branch);
    let manager = RepositoryManager::new(Context::discover(&cwd, settings));

    let ok = match command {
        Commands::New { directory } => out.created(manager.create_new(&directory)),
        Commands::Status => out.status(manager.status()),
        Commands::Explore { topic } => out.simple(manager.explore(&topic)),
        Commands::Capture { message } => out.simple(manager.capture(&message)),
        Commands::Integrate {
            exploration,
            target,
            preview,
            yes,
        } => render::integrate(&manager, &out, &exploration, target.as_deref(), preview, yes),
        Commands::List => out.list(manager.list()),
        Commands::Switch { name } => out.simple(manager.switch(&name)),
        Commands::Diff { staged, branches } => out.diff(manager.diff(staged, &branches)),
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
