use std::{io, path::PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use git_sigstash::{
    config::SigstashConfig,
    pipeline::{self, PipelineOptions},
    stream::{Mode, TranscodeStats},
};

/// Move commit signatures into commit messages and back
#[derive(Parser, Debug)]
#[command(name = "git-sigstash", version, about, long_about = None)]
#[command(after_help = "\
Example workflow:
  1. git sigstash store        # signatures -> commit messages
  2. git filter-repo ...       # rewrite history
  3. git sigstash restore      # commit messages -> signatures

Both steps rewrite history; only use them on repositories whose clones you control.")]
struct Cli {
    /// Print progress information
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Move native commit signatures into commit messages
    Store(ModeArgs),
    /// Move signatures stored in commit messages back into native headers
    Restore(ModeArgs),
}

#[derive(Args, Debug)]
struct ModeArgs {
    /// Refs to process (default: --all)
    #[arg(long, num_args = 1..)]
    refs: Vec<String>,

    /// Run in this repository instead of the current directory
    #[arg(short = 'C', long, value_name = "DIR")]
    repo: Option<PathBuf>,

    /// Filter a fast-export stream from stdin to stdout instead of running git
    #[arg(long, conflicts_with_all = ["refs", "repo"])]
    stdio: bool,
}

fn init_tracing(verbose: bool) {
    // RUST_LOG wins when set; otherwise --verbose shows progress at info.
    let default_level = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (mode, args) = match cli.command {
        Command::Store(args) => (Mode::Store, args),
        Command::Restore(args) => (Mode::Restore, args),
    };

    if args.stdio {
        let stats = pipeline::run_stdio(mode, io::stdin().lock(), io::stdout().lock())?;
        tracing::info!(
            "Processed {} commits, {} {} signature(s)",
            stats.commits,
            past_tense(mode),
            stats.signatures
        );
        return Ok(());
    }

    let config = SigstashConfig::load()?;
    let options = PipelineOptions {
        mode,
        refs: args.refs,
        repo: args.repo,
        show_progress: cli.verbose,
    };
    if options.refs.is_empty() {
        tracing::info!("Exporting commits from refs: {}", config.default_refs.join(" "));
    } else {
        tracing::info!("Exporting commits from refs: {}", options.refs.join(" "));
    }

    let stats = pipeline::run(&config, &options)?;
    report(mode, &stats, cli.verbose);
    Ok(())
}

fn past_tense(mode: Mode) -> &'static str {
    match mode {
        Mode::Store => "stored",
        Mode::Restore => "restored",
    }
}

fn report(mode: Mode, stats: &TranscodeStats, verbose: bool) {
    tracing::info!(
        "{} {} signatures",
        match mode {
            Mode::Store => "Stored",
            Mode::Restore => "Restored",
        },
        stats.signatures
    );

    if stats.signatures > 0 {
        println!(
            "Successfully {} {} signature(s)",
            past_tense(mode),
            stats.signatures
        );
    } else if verbose {
        println!("No signatures found to {}", mode);
    }
}
