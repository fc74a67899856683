use crate::gateway::{RunError, StackFrame};
use itertools::Itertools;
use serde_json::Value;

pub const PANEL_TITLE: &str = "Error while running model";
const MESSAGE_FALLBACK: &str = "Some unexpected error has occured";

/// Formats run failures into the text of the error panel.
pub struct TraceFormatter;

impl TraceFormatter {
    /// The full panel: title, message, code, details and the call trace.
    pub fn format_run_error(error: &RunError) -> String {
        let header = [
            PANEL_TITLE.to_string(),
            format!("message: {}", Self::message(error)),
            format!("code: {}", Self::code(error)),
            format!("details: {}", Self::details(error)),
            "trace:".to_string(),
        ];
        let frames = error.stack.iter().enumerate().flat_map(|(i, frame)| {
            let trace = frame.trace.clone().filter(|t| !t.is_empty());
            std::iter::once(Self::format_frame(i, frame)).chain(trace)
        });
        header.into_iter().chain(frames).join("\n")
    }

    /// The message, or a generic one when it is missing or empty.
    pub fn message(error: &RunError) -> &str {
        error
            .message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(MESSAGE_FALLBACK)
    }

    pub fn code(error: &RunError) -> &str {
        error.code.as_deref().filter(|c| !c.is_empty()).unwrap_or("-")
    }

    /// Details as compact JSON, `{}` when absent.
    pub fn details(error: &RunError) -> String {
        match &error.details {
            None | Some(Value::Null) => "{}".to_string(),
            Some(details) => details.to_string(),
        }
    }

    /// The header line of one stack frame.
    pub fn format_frame(index: usize, frame: &StackFrame) -> String {
        format!(
            "[{}] chainId: {}, block: {}, slug: {}, version: {}",
            index,
            scalar(&frame.chain_id),
            scalar(&frame.block_number),
            frame.slug,
            frame.version
        )
    }
}

// Strings print without quotes, missing values as nothing.
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
