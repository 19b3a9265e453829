//! Request command handler (get, post, put, patch, delete)

use super::utils::{build_pipeline, cancel_on_ctrl_c, progress_callback, read_body_arg, report};
use crate::cli::RequestArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use courier_core::{HttpMethod, RequestDescription, ResponseEnvelope};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Handle a plain JSON request command
#[instrument(skip(args, data, config, output), fields(path = %args.path))]
pub async fn handle_request(
    method: HttpMethod,
    args: RequestArgs,
    data: Option<String>,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("request", &format!("{} {}", method, args.path));
    let pipeline = build_pipeline(config)?;

    let mut request = describe(method, &args);
    if let Some(data) = data {
        request = request.body(read_body_arg(&data)?);
    }

    let token = CancellationToken::new();
    let listener = cancel_on_ctrl_c(token.clone());
    request = request.cancellation(token);

    let progress = if args.progress {
        output.transfer_bar("Downloading")
    } else {
        output.spinner(&format!("{} {}", method, args.path))
    };
    if let (true, Some(pb)) = (args.progress, &progress) {
        request = request.on_receive_progress(progress_callback(pb));
    }

    debug!(request = ?request, "Executing request");
    let envelope: ResponseEnvelope<Value> = pipeline.execute(request).await;
    listener.abort();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    report(&envelope, output)
}

/// Request description carrying the shared query and header arguments
pub(super) fn describe(method: HttpMethod, args: &RequestArgs) -> RequestDescription {
    let mut request = RequestDescription::new(method, args.path.clone());
    for (key, value) in &args.query {
        request = request.query(key.clone(), value.clone());
    }
    for (name, value) in &args.headers {
        request = request.header(name.clone(), value.clone());
    }
    request
}
