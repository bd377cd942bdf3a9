// src/lib.rs

pub mod cli;
pub mod config;
pub mod decode;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod runner;
pub mod types;
pub mod ui;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Result, anyhow};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, SettingsResolver, load_or_default};
use crate::errors::ExecError;
use crate::exec::{AsyncCallbacks, ExecutionService};
use crate::runner::{CmdOptions, CommandRunner, Tool};
use crate::ui::UiLoop;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the execution service (worker thread + job slot)
/// - the UI task loop (drives async callbacks on this task)
/// - one tool invocation, captured or streamed
///
/// Returns the tool's exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let cfg = Arc::new(load_or_default(&config_path)?);

    let (ui, ui_loop) = ui::channel();
    let service = ExecutionService::start(cfg.queue)?;
    let settings: Arc<dyn SettingsResolver> = cfg.clone();
    let runner = CommandRunner::new(Tool::for_kind(args.tool), service, settings, Arc::new(ui));

    if args.dry_run {
        print_dry_run(&runner, &cfg, &args.args);
        return Ok(0);
    }

    if args.stream {
        run_streamed(runner, ui_loop, args).await
    } else {
        run_captured(runner, args).await
    }
}

async fn run_captured(runner: CommandRunner, args: CliArgs) -> Result<i32> {
    let mut opts = CmdOptions::new();
    if let Some(cwd) = &args.cwd {
        opts = opts.cwd(cwd);
    }

    // The sync path blocks its caller; keep that off the async workers.
    let blocking_runner = runner.clone();
    let output = tokio::task::spawn_blocking(move || blocking_runner.cmd(&args.args, opts))
        .await?
        .map_err(|err| anyhow!(runner.describe_error(&err)))?;

    print!("{}", output.stdout);
    eprint!("{}", output.stderr);
    info!(exit_code = output.exit_code, "command finished");

    Ok(output.exit_code)
}

async fn run_streamed(runner: CommandRunner, mut ui_loop: UiLoop, args: CliArgs) -> Result<i32> {
    let outcome: Arc<Mutex<Option<std::result::Result<i32, ExecError>>>> =
        Arc::new(Mutex::new(None));

    let record = |slot: Arc<Mutex<Option<std::result::Result<i32, ExecError>>>>| {
        move |result: std::result::Result<i32, ExecError>| {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        }
    };
    let on_complete = record(Arc::clone(&outcome));
    let on_error = record(Arc::clone(&outcome));
    let on_exception = record(Arc::clone(&outcome));

    let callbacks = AsyncCallbacks::new()
        .on_data(|line| println!("{line}"))
        .on_complete(move |code| on_complete(Ok(code)))
        .on_error(move |code| on_error(Ok(code)))
        .on_exception(move |err| on_exception(Err(err)));

    let _handle = runner.cmd_async(&args.args, args.cwd.as_deref(), callbacks)?;

    ui_loop
        .run_while(|| {
            outcome
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_none()
        })
        .await;

    let result = outcome
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    match result {
        Some(Ok(code)) => {
            info!(exit_code = code, "streamed command finished");
            Ok(code)
        }
        Some(Err(err)) => Err(anyhow!(runner.describe_error(&err))),
        None => Err(anyhow!("UI loop closed before the command finished")),
    }
}

/// Print the resolved command and the settings that would apply.
fn print_dry_run(runner: &CommandRunner, cfg: &ConfigFile, args: &[String]) {
    println!("vcs-runner dry-run");
    println!("  tool = {}", runner.tool().settings_key);
    println!("  command = {:?}", runner.build_command(args));
    println!("  encoding = {}", cfg.settings.encoding);
    if !cfg.settings.fallback_encodings.is_empty() {
        println!("  fallback_encodings = {:?}", cfg.settings.fallback_encodings);
    }
    if let Some(ref force_path) = cfg.settings.force_path {
        println!("  force_path = {:?}", force_path);
    }
    println!("  queue.submit_timeout = {:?}", cfg.queue.submit_timeout);
    println!("  queue.result_timeout = {:?}", cfg.queue.result_timeout);
    println!(
        "  queue.async_result_timeout = {:?}",
        cfg.queue.async_result_timeout
    );

    debug!("dry-run complete (no execution)");
}
