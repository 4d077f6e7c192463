// src/output/writer.rs
//! Executes output operations by performing actual I/O.
//!
//! This module is the only place where file and stream writes occur,
//! keeping the rest of the codebase pure and testable.

use super::types::*;
use crate::error::AppError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Pretty JSON with a trailing newline, the relay's output format.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    let mut rendered = serde_json::to_string_pretty(value).map_err(|e| AppError::InternalError {
        message: "Failed to serialize result".to_string(),
        source: Some(Box::new(e)),
    })?;
    rendered.push('\n');
    Ok(rendered)
}

/// Delivers the output plan, performing all I/O operations.
pub fn deliver(plan: OutputPlan) -> OutputReport {
    let mut report = OutputReport::default();

    for operation in plan.operations {
        match execute_operation(&operation) {
            Ok(bytes_written) => {
                report.bytes_written += bytes_written;
                report.completed.push(operation);
            }
            Err(e) => {
                log::error!("Output operation failed: {}", e);
                report.failed.push((operation, e.to_string()));
            }
        }
    }

    log::debug!(
        "Output plan complete: {} succeeded, {} failed, {} bytes",
        report.completed.len(),
        report.failed.len(),
        report.bytes_written
    );
    report
}

fn execute_operation(operation: &DeliveryTarget) -> Result<usize, AppError> {
    match operation {
        DeliveryTarget::WriteFile { path, content } => write_file(path, content),
        DeliveryTarget::PrintToStdout { content } => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(content.len())
        }
        DeliveryTarget::PrintToStderr { content } => {
            let mut stderr = std::io::stderr().lock();
            stderr.write_all(content.as_bytes())?;
            Ok(content.len())
        }
    }
}

/// Writes content to a file.
fn write_file(path: &Path, content: &str) -> Result<usize, AppError> {
    log::debug!("Writing {} bytes to {}", content.len(), path.display());

    // Create parent directories if needed
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, content)?;

    log::info!("Wrote file: {}", path.display());
    Ok(content.len())
}
