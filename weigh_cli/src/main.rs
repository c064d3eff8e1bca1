#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod rt;
mod run;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use weigh_config::Config;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{ConfigContext, exit_code_for_error, format_error_json, humanize};
use crate::run::RunOpts;

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hooks: {e}");
    }
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    match cli.cmd {
        Commands::Run {
            duration_ms,
            stats,
            rt,
            rt_prio,
        } => run::run(
            &cfg,
            RunOpts {
                duration_ms,
                stats,
                rt,
                rt_prio,
            },
        ),
        Commands::SelfCheck => run::self_check(&cfg),
        Commands::Health => run::health(&cfg),
    }
}

fn load_config(cli: &Cli) -> eyre::Result<Config> {
    match &cli.config {
        Some(path) => {
            weigh_config::load_file(path).wrap_err_with(|| ConfigContext(Some(path.clone())))
        }
        None => {
            let cfg = Config::default();
            cfg.validate().wrap_err(ConfigContext(None))?;
            Ok(cfg)
        }
    }
}

/// Console logs go to stderr (stdout carries the serial reports). RUST_LOG
/// overrides the level from `--log-level` or `[logging] level`.
fn init_tracing(json: bool, cli_level: Option<&str>, cfg: &Config) -> eyre::Result<()> {
    let level = cli_level
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let file_layer = match &cfg.logging.file {
        Some(file) => {
            let path = std::path::Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
            let appender = match cfg.logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();
    Ok(())
}
