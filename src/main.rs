//! dsb-manager - deploy, run and measure the social network benchmark

use anyhow::{Context as _, Result};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use dsb_manager::config::{CliArgs, ManagerConfig};
use dsb_manager::deploy::{CommandRegistry, Context};
use dsb_manager::utils::{CommandRunner, DryRunRunner, SystemRunner};

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn run() -> Result<()> {
    let args = CliArgs::parse_args();
    setup_logging(args.verbose, args.quiet);

    let config = ManagerConfig::from_cli(&args).context("Configuration error")?;
    debug!("base dir: {}", config.base_dir.display());

    let runner: Box<dyn CommandRunner> = if config.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(SystemRunner)
    };

    // Reject unsupported pairs before the banner
    let registry = CommandRegistry::standard();
    let tag = (&args.command).into();
    registry.resolve(config.target, tag)?;

    info!("----- {} -----", args.command.name().to_uppercase());
    let ctx = Context::new(&config, runner.as_ref());
    registry.dispatch(&ctx, &args.command)?;
    info!("done!");

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
