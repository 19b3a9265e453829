//! Upload command handler

use super::request::describe;
use super::utils::{build_pipeline, cancel_on_ctrl_c, progress_callback, report};
use crate::cli::UploadArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use courier_core::{FileUpload, HttpMethod, ResponseEnvelope};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Handle the upload command
#[instrument(skip_all, fields(path = %args.request.path, files = args.files.len()))]
pub async fn handle_upload(args: UploadArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("upload", &args.request.path);
    let pipeline = build_pipeline(config)?;

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        if !path.exists() {
            return Err(Error::FileNotFound { path: path.clone() });
        }
        let file = FileUpload::from_path(path).await?;
        info!(file = %path.display(), bytes = file.len(), "Attaching file");
        files.push(file);
    }

    let fields: Map<String, Value> = args
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let token = CancellationToken::new();
    let listener = cancel_on_ctrl_c(token.clone());

    let mut request = describe(HttpMethod::Multipart, &args.request)
        .body(Value::Object(fields))
        .files(files)
        .cancellation(token);

    let progress = output.transfer_bar("Uploading");
    if let Some(pb) = &progress {
        request = request.on_send_progress(progress_callback(pb));
    }

    let envelope: ResponseEnvelope<Value> = pipeline.execute(request).await;
    listener.abort();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    report(&envelope, output)
}
