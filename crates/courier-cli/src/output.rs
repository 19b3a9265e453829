//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable) with support for
//! response envelopes and transfer progress indicators.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use courier_core::ResponseEnvelope;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::time::Duration;
use tracing::trace;

/// Trait for formatting output with specialized support for envelopes
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a response envelope
    fn format_envelope(&self, envelope: &ResponseEnvelope<Value>) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_envelope(&self, envelope: &ResponseEnvelope<Value>) -> Result<String> {
        match self {
            OutputFormat::Human => format_envelope_human(envelope, false),
            _ => self.format(envelope),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(format: OutputFormat, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color: false,
            show_progress: false,
            quiet,
            writer,
        }
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut redacted = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut redacted);
        trace!(data = %redacted, "Outputting data");

        let formatted = self.format.format(value)?;
        self.finish_block(&formatted)
    }

    /// Write a response envelope in the configured format
    pub fn envelope(&mut self, envelope: &ResponseEnvelope<Value>) -> Result<()> {
        let formatted = match self.format {
            OutputFormat::Human => format_envelope_human(envelope, self.use_color)?,
            format => format.format_envelope(envelope)?,
        };
        self.finish_block(&formatted)
    }

    /// Terminate a formatted block with exactly one newline
    fn finish_block(&mut self, formatted: &str) -> Result<()> {
        if formatted.ends_with('\n') {
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }

    /// Create a byte-count progress bar for transfers
    pub fn transfer_bar(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(0);
        pb.set_style(transfer_progress_style());
        pb.set_message(message.to_string());
        Some(pb)
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Progress bar style for byte transfers
pub fn transfer_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Spinner style for waiting on a response
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Format an envelope for human reading
fn format_envelope_human(envelope: &ResponseEnvelope<Value>, use_color: bool) -> Result<String> {
    let mut output = String::new();
    let status = envelope
        .status_code()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let message = envelope.message().unwrap_or("");

    if envelope.is_success() {
        let line = format!("✓ {} {}", status, message);
        output.push_str(&paint(&line, use_color, true));
        output.push('\n');

        if let Some(data) = envelope.data() {
            output.push('\n');
            output.push_str(&format_data_human(data)?);
            output.push('\n');
        }
    } else {
        let category = envelope
            .error_type()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        let line = format!("✗ {} ({}) {}", category, status, message);
        output.push_str(&paint(&line, use_color, false));
        output.push('\n');

        if let Some(details) = envelope.details() {
            output.push_str("\nDetails:\n");
            output.push_str(&serde_json::to_string_pretty(details)?);
            output.push('\n');
        }
    }

    Ok(output)
}

fn paint(line: &str, use_color: bool, success: bool) -> String {
    match (use_color, success) {
        (false, _) => line.to_string(),
        (true, true) => line.green().to_string(),
        (true, false) => line.red().bold().to_string(),
    }
}

/// Plain strings print as-is, everything else as pretty JSON
fn format_data_human(data: &Value) -> Result<String> {
    match data {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string_pretty(other)?),
    }
}

#[cfg(test)]
mod tests {
    include!("output/tests.rs");
}
