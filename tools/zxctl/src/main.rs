mod env_utils;
mod logging;
mod port_detect;
mod workflows;
#[cfg(test)]
mod workflows_tests;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use logging::Logger;
use zx_gesture::PipelineMode;

use workflows::{CaptureOptions, LiveOptions, ReplayOptions};

#[derive(Debug, Parser)]
#[command(name = "zxctl")]
#[command(about = "ZX gesture sensor host CLI")]
struct Cli {
    /// TOML config; falls back to ZXCTL_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Motion(LiveArgs),
    Codes(CodesArgs),
    Scroll(LiveArgs),
    Capture(CaptureArgs),
    Replay(ReplayArgs),
    Ports,
}

#[derive(Debug, Args)]
struct LiveArgs {
    #[arg(long)]
    seconds: Option<u64>,
}

#[derive(Debug, Args)]
struct CodesArgs {
    #[arg(long)]
    params: bool,
    #[arg(long)]
    seconds: Option<u64>,
}

#[derive(Debug, Args)]
struct CaptureArgs {
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = 10)]
    seconds: u64,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    dump: PathBuf,
    #[arg(long, value_enum, default_value_t = ReplayMode::Motion)]
    mode: ReplayMode,
    #[arg(long)]
    expect: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReplayMode {
    Motion,
    Codes,
    CodesParams,
    Scroll,
}

impl From<ReplayMode> for PipelineMode {
    fn from(mode: ReplayMode) -> Self {
        match mode {
            ReplayMode::Motion => PipelineMode::Motion,
            ReplayMode::Codes => PipelineMode::Codes,
            ReplayMode::CodesParams => PipelineMode::CodesWithParams,
            ReplayMode::Scroll => PipelineMode::Scroll,
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    Logger::from_env()?.install()?;

    if let Commands::Ports = cli.command {
        return workflows::run_ports();
    }
    let config = env_utils::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Motion(args) => workflows::run_live(LiveOptions {
            mode: PipelineMode::Motion,
            config,
            seconds: args.seconds,
        }),
        Commands::Codes(args) => workflows::run_live(LiveOptions {
            mode: if args.params {
                PipelineMode::CodesWithParams
            } else {
                PipelineMode::Codes
            },
            config,
            seconds: args.seconds,
        }),
        Commands::Scroll(args) => workflows::run_live(LiveOptions {
            mode: PipelineMode::Scroll,
            config,
            seconds: args.seconds,
        }),
        Commands::Capture(args) => workflows::run_capture(CaptureOptions {
            config,
            output_path: args.output,
            seconds: args.seconds,
        })
        .map(|_| ()),
        Commands::Replay(args) => workflows::run_replay(ReplayOptions {
            config,
            dump_path: args.dump,
            mode: args.mode.into(),
            expect_path: args.expect,
        }),
        Commands::Ports => workflows::run_ports(),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
