// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_relay::output::{deliver, render_json, DeliveryTarget, OutputPlan};
use notion_relay::{run_operation, AppError, CommandLineInput, NotionHttpClient, RelayConfig};
use std::fs;
use std::process::ExitCode;

/// Sets up logging configuration.
///
/// Console logs go to stderr so stdout carries nothing but the JSON result.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notion_relay.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)
        .with_context(|| format!("opening log file {}", log_file_path.display()))?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("console", Box::new(console_appender)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(LevelFilter::Debug),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Resolves configuration, runs the operation and delivers its result.
async fn execute(cli: CommandLineInput) -> Result<(), AppError> {
    let config = RelayConfig::resolve(cli)?;
    log::info!("Running {:?}", config.operation);

    let client = NotionHttpClient::with_settings(&config.api_key, &config.client)?;
    let result = run_operation(&config.operation, &client).await?;

    let rendered = render_json(&result)?;
    let report = deliver(OutputPlan::for_result(rendered, config.output_file.clone()));
    if let Some((_, error)) = report.failed.into_iter().next() {
        return Err(AppError::InternalError {
            message: format!("Failed to deliver result: {}", error),
            source: None,
        });
    }
    if let Some(path) = &config.output_file {
        log::info!("Result saved to {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).context("failed to initialize logging")?;

    match execute(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            log::debug!("Operation failed: {:?}", e);
            let rendered = render_json(&e.to_report())?;
            deliver(OutputPlan::new().with_operation(DeliveryTarget::PrintToStderr {
                content: rendered,
            }));
            Ok(ExitCode::FAILURE)
        }
    }
}
