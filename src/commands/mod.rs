//! Command dispatch and handlers.

pub mod classify;
pub mod generate;
pub mod status;

use std::env;
use std::path::PathBuf;

use crate::cassette::session::RecordingSession;
use crate::cli::Command;
use crate::config::PipelineConfig;
use crate::context::ServiceContext;

/// Dispatch a parsed command to its handler.
///
/// When `PULSE_RECORD` is set to a directory path, all port interactions
/// are recorded to per-port cassette files in that directory.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let config = PipelineConfig::from_env();

    let (ctx, session) = if let Ok(path) = env::var("PULSE_RECORD") {
        let (ctx, session) = ServiceContext::recording_at(PathBuf::from(path))?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(), None)
    };

    let result = dispatch_with_context(command, &ctx, &config);

    // Finish recording after the command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    config: &PipelineConfig,
) -> Result<(), String> {
    match command {
        Command::Classify { week, force } => {
            block_on(classify::run(ctx, config, week.as_deref(), *force))
        }
        Command::Generate { week, force } => {
            block_on(generate::run(ctx, config, week.as_deref(), *force))
        }
        Command::Status => status::run(ctx, config),
    }
}

/// Run a pipeline future to completion on a single-threaded runtime.
/// The whole pipeline is sequential by design; there is nothing to
/// parallelize.
fn block_on<F: std::future::Future<Output = Result<(), String>>>(
    future: F,
) -> Result<(), String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?
        .block_on(future)
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
