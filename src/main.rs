//! Jexrun CLI - run Jex transformation scripts against JSON documents.
//!
//! Usage: jexrun <SCRIPT> [-i input.json] [-m meta.json] [-o out.json]
//!                        [-f Json|Pretty|Detailed] [-w]

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use jexrun::cli::Cli;
use jexrun::companion::{resolve_companion, INPUT_SUFFIX};
use jexrun::watcher::{watch, WatchEvent, WatchOptions};
use jexrun::{output, pipeline};

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("✗ {err}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let input = cli
        .input
        .clone()
        .or_else(|| resolve_companion(&cli.script, INPUT_SUFFIX));

    if !cli.script.is_file() {
        // Reported before any pipeline invocation.
        let result = pipeline::missing_script(&cli.script);
        output::emit(&result, cli.format, cli.output.as_deref())?;
        return Ok(output::exit_code(&result));
    }

    if cli.watch {
        return run_watch(cli, input);
    }

    let result = pipeline::run(&cli.script, input.as_deref(), cli.meta.as_deref());
    output::emit(&result, cli.format, cli.output.as_deref())?;
    Ok(output::exit_code(&result))
}

fn run_watch(cli: Cli, input: Option<PathBuf>) -> Result<i32> {
    let options = WatchOptions {
        script: cli.script.clone(),
        input,
        meta: cli.meta.clone(),
        output: cli.output.clone(),
        format: cli.format,
    };

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })?;

    println!("👀 jexrun watch");
    println!("Script: {}", cli.script.display());
    println!("Press Ctrl+C to stop\n");

    watch(options, running, |event| match event {
        WatchEvent::Started { script } => {
            println!("📂 Watching: {script}");
        }
        WatchEvent::Changed { path } => {
            println!("📝 Changed: {path}");
        }
        WatchEvent::RunStarted => {
            println!("🔄 Running...");
        }
        WatchEvent::RunComplete { success, elapsed_ms } => {
            if success {
                println!("✓ Run completed in {elapsed_ms}ms");
            } else {
                println!("⚠ Run failed after {elapsed_ms}ms");
            }
            println!("👀 Watching for changes...");
        }
        WatchEvent::Error { message } => {
            eprintln!("✗ Error: {message}");
        }
        WatchEvent::Shutdown => {
            println!("\n👋 Shutting down...");
        }
    })?;

    Ok(0)
}
