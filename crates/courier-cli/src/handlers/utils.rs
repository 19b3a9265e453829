//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use courier_core::http::ProgressCallback;
use courier_core::{FileCredentialStore, RequestPipeline, ResponseEnvelope};
use indicatif::ProgressBar;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Credential store backing the CLI
pub fn credential_store(config: &Config) -> Result<Arc<FileCredentialStore>> {
    Ok(Arc::new(FileCredentialStore::new(config.credentials_path()?)))
}

/// Build the request pipeline from the effective configuration
pub fn build_pipeline(config: &Config) -> Result<RequestPipeline> {
    let store = credential_store(config)?;
    Ok(RequestPipeline::new(config.pipeline.clone(), store)?)
}

/// Parse a `--data` argument: inline JSON, or `@path` to read a file
pub fn read_body_arg(data: &str) -> Result<Value> {
    let (content, source) = match data.strip_prefix('@') {
        Some(path) => {
            let path = Path::new(path);
            if !path.exists() {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            (std::fs::read_to_string(path)?, path.display().to_string())
        }
        None => (data.to_string(), "--data".to_string()),
    };

    serde_json::from_str(&content)
        .map_err(|e| Error::invalid_args(format!("{} is not valid JSON: {}", source, e)))
}

/// Cancel `token` when the user presses Ctrl-C.
///
/// The listener exits as soon as the token is cancelled by anyone.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    tracing::info!("Interrupt received, cancelling request");
                    token.cancel();
                }
            }
        }
    })
}

/// Progress callback driving a byte-count bar
pub fn progress_callback(pb: &ProgressBar) -> ProgressCallback {
    let pb = pb.clone();
    Arc::new(move |done, total| {
        if let Some(total) = total {
            pb.set_length(total);
        }
        pb.set_position(done);
    })
}

/// Print the envelope and turn a failure into a CLI error
pub fn report(envelope: &ResponseEnvelope<Value>, output: &mut OutputWriter) -> Result<()> {
    output.envelope(envelope)?;

    match envelope.error_type() {
        None => Ok(()),
        Some(category) => Err(Error::RequestFailed {
            category,
            message: envelope.message().unwrap_or_default().to_string(),
        }),
    }
}
