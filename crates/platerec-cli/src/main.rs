// crates/platerec-cli/src/main.rs

use clap::{ArgAction, Parser};
use log::LevelFilter;

mod cmd;
mod io;

#[derive(Parser)]
#[command(name = "reconstruct-features", version)]
#[command(
    about = "Reconstruct features to one or more times in accordance with given rotation files.",
    long_about = None,
    after_help = "NOTE: separate the positional prefix from the multi-value options with '--'.\n\
                  For example...\n\n  \
                  reconstruct-features -r rotations1.rot rotations2.rot -m features1.gpml features2.gpml -t 10 -- feature_"
)]
pub struct Cli {
    #[command(flatten)]
    pub reconstruct: cmd::reconstruct::ReconstructArgs,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Explicit log level (off, error, warn, info, debug, trace); overrides -v
    #[arg(long = "log-level", value_name = "level")]
    pub log_level: Option<LevelFilter>,
}

fn init_logging(cli: &Cli) {
    let explicit = cli.log_level.or(match cli.verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    });

    match explicit {
        Some(level) => env_logger::Builder::new().filter_level(level).init(),
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init(),
    }
}

fn main() -> anyhow::Result<()> {
    // Engine check comes before argument parsing.
    let caps = platerec_core::Capabilities::current();
    let checked = cmd::reconstruct::required_engine_version()
        .and_then(|required| cmd::reconstruct::check_engine(&caps, required));
    if let Err(e) = checked {
        eprintln!("{}: Error - {e}", env!("CARGO_BIN_NAME"));
        std::process::exit(1);
    }

    let cli = Cli::parse();
    init_logging(&cli);

    cmd::reconstruct::run(cli.reconstruct)
}
