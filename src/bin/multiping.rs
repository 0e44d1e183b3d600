use anyhow::{Context, Result};
use clap::Parser;
use multiping::monitor::{
    init_logging_with_config, resolve_targets, Config, KeyboardListener, Monitor, StopReason,
    SystemPinger,
};
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() {
    // Parse CLI arguments
    let config = Config::parse();

    // Initialize structured logging with config options
    init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Monitoring failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<()> {
    let interactive = io::stdin().is_terminal();
    let targets = {
        let mut input = io::stdin().lock();
        let mut output = io::stdout();
        resolve_targets(&config, &mut input, &mut output, interactive)?
    };
    info!(targets = targets.len(), "Targets resolved");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let prober = Arc::new(SystemPinger::new(config.timeout()));
    let monitor = Monitor::with_stdout(targets, prober, config.delay)?;
    let listener = KeyboardListener::new();

    let report = runtime.block_on(monitor.run(&listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Without a handler the keyboard listener still reports Ctrl+C
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }))?;

    for failure in &report.failures {
        eprintln!("Worker failure: {}", failure.message);
    }

    match report.reason {
        StopReason::Escape => {
            println!("\nEsc pressed. Stopping monitoring. Goodbye!");
            print!("Press Enter to exit...");
            io::stdout().flush()?;
            let mut line = String::new();
            let _ = io::stdin().read_line(&mut line);
        }
        StopReason::Interrupt => println!("\nStopping monitoring (Ctrl+C detected)."),
        StopReason::Requested => {}
    }

    Ok(())
}
