//! `synckit`: one-way polling directory mirror.

mod console;
mod error;
mod headless;
mod logging;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use synckit_mirror::{
    N_INTERVAL_MS_DEFAULT, RunConfig, Scheduler, SpecSchedulerOptions, format_ignore_list,
    parse_ignore_list,
};
use tracing::info;

use crate::error::Result;
use crate::headless::RootArgs;
use crate::settings::{SETTINGS_FILE_NAME, SettingsStore};

#[derive(Parser, Debug)]
#[command(name = "synckit", version, about = "Mirror a source folder onto a target folder")]
struct Cli {
    /// Settings file holding source, target and ignore list
    #[arg(long, global = true, default_value = SETTINGS_FILE_NAME)]
    settings: PathBuf,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Poll interval in milliseconds (at least 1)
    #[arg(
        long,
        global = true,
        default_value_t = N_INTERVAL_MS_DEFAULT,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval_ms: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive console (default)
    Gui(GuiArgs),
    /// Sync SOURCE onto TARGET every interval until killed
    Nogui(NoguiArgs),
    /// Run one cycle and exit
    Once(OnceArgs),
}

#[derive(Args, Debug, Default)]
struct GuiArgs {
    source: Option<String>,
    target: Option<String>,
    /// Comma separated ignore list, e.g. "[.DS_Store, *.log]"
    ignore: Option<String>,
}

#[derive(Args, Debug)]
struct NoguiArgs {
    source: String,
    target: String,
    /// Comma separated ignore list, e.g. "[.DS_Store, *.log]"
    ignore: Option<String>,
}

#[derive(Args, Debug)]
struct OnceArgs {
    source: Option<String>,
    target: Option<String>,
    /// Comma separated ignore list, e.g. "[.DS_Store, *.log]"
    ignore: Option<String>,

    /// Print the plan without touching the target
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(v) => v,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::setup_logging(cli.log_file.as_deref(), cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut store = SettingsStore::open(&cli.settings)?;
    let options = SpecSchedulerOptions {
        interval: Duration::from_millis(cli.interval_ms),
    };

    match cli.command.unwrap_or(Commands::Gui(GuiArgs::default())) {
        Commands::Gui(args) => run_gui(&mut store, args, options),
        Commands::Nogui(args) => {
            let root_args = RootArgs {
                source: Some(args.source),
                target: Some(args.target),
                ignore: args.ignore,
            };
            let settings = root_args.resolve(&mut store)?;
            headless::run_nogui(settings, options)
        }
        Commands::Once(args) => {
            let root_args = RootArgs {
                source: args.source,
                target: args.target,
                ignore: args.ignore,
            };
            let settings = root_args.resolve(&mut store)?;
            headless::run_once(&settings, args.dry_run)
        }
    }
}

fn run_gui(store: &mut SettingsStore, args: GuiArgs, options: SpecSchedulerOptions) -> Result<()> {
    if let Some(source) = &args.source {
        store.set_source(source)?;
    }
    if let Some(target) = &args.target {
        store.set_target(target)?;
    }
    if let Some(ignore) = &args.ignore {
        store.set_ignore(&format_ignore_list(&parse_ignore_list(ignore)))?;
    }

    let run_config = RunConfig::default();
    let handle = Scheduler::spawn(run_config.clone(), options)?;
    let res_console = console::run_console(store, &run_config);
    handle.shutdown();
    info!("Settings saved to {}", store.path().display());
    res_console
}
