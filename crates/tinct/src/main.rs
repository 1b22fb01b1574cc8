//! tinct daemon binary.
//!
//! Follows every acme window, resolves its language and keeps an
//! acme-styles layer of tree-sitter highlights in step with its body.
//! SIGINT or SIGTERM stops discovery and removes every layer before exit.

mod app;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tinct_session::Daemon;
use tinct_worker::TaskClass;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;

/// Daemon command line arguments.
#[derive(Parser, Debug)]
#[command(name = "tinct")]
#[command(about = "Live tree-sitter syntax highlighting for acme")]
struct Args {
	/// Configuration file (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: PathBuf,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let config = Config::load(&args.config).with_context(|| format!("loading config {}", args.config.display()))?;
	info!(
		config = %args.config.display(),
		acme = %config.acme.root.display(),
		styles = %config.acme.styles_root.display(),
		layer = %config.layer_name,
		"starting tinct"
	);

	let cancel = CancellationToken::new();
	let ctx = app::build_context(&config, cancel.clone())?;

	tinct_worker::spawn(TaskClass::Control, async move {
		match wait_for_signal().await {
			Ok(signal) => {
				info!(signal, "daemon.signal");
				cancel.cancel();
			}
			Err(error) => tracing::warn!(%error, "signal handlers unavailable"),
		}
	});

	Daemon::new(ctx).run().await;
	info!("tinct stopped");
	Ok(())
}

async fn wait_for_signal() -> std::io::Result<&'static str> {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{SignalKind, signal};

		let mut terminate = signal(SignalKind::terminate())?;
		tokio::select! {
			result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
			_ = terminate.recv() => Ok("SIGTERM"),
		}
	}
	#[cfg(not(unix))]
	{
		tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
	}
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("info,tinct=debug")
			} else {
				EnvFilter::new("warn,tinct=info")
			}
		})
	};

	// TINCT_LOG_DIR moves logs off the terminal acme was started from.
	if let Some(log_dir) = std::env::var("TINCT_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("tinct.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_span_events(FmtSpan::CLOSE)
				.with_target(true);

			tracing_subscriber::registry().with(filter()).with(file_layer).init();

			info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
