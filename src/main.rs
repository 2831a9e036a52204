use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use chatloop::RunOptions;

#[derive(Parser, Debug)]
#[command(
    name = "chatloop",
    version,
    about = "Watches desktop chat windows and answers new messages with an LLM"
)]
struct Cli {
    /// Path to config.toml (default: next to the executable, then the working directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Generate replies from transcript files without clicking or typing
    /// (requires capture.source = "transcript")
    #[arg(long)]
    dry_run: bool,
    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
    /// Stop after this many passes over all chats
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    cycles: Option<u64>,
    /// Write the JSONL run log here instead of the data directory
    #[arg(long)]
    run_log: Option<PathBuf>,
    /// Validate configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    chatloop::init_tracing(cli.verbose);

    let opts = RunOptions {
        config_path: cli.config,
        dry_run: cli.dry_run,
        cycles: cli.cycles,
        run_log: cli.run_log,
        check_only: cli.check,
    };

    match chatloop::run(opts).await {
        Ok(summary) => {
            tracing::info!(
                steps = summary.steps,
                cycles = summary.cycles,
                sent = summary.sent,
                skipped = summary.skipped,
                failures = summary.failures,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "chatloop failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["chatloop", "--dry-run", "--cycles", "2", "--config", "bot.toml"]);
        assert!(cli.dry_run);
        assert_eq!(cli.cycles, Some(2));
        assert_eq!(cli.config, Some(PathBuf::from("bot.toml")));
        assert!(Cli::try_parse_from(["chatloop", "--cycles", "0"]).is_err());
    }
}
