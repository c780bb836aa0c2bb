//! Decoding chat-completion reply bodies.

use notes_core::{Error, Result};
use serde_json::Value;

/// Extract the text of the first choice from a reply body.
///
/// Checks, in order: the body is JSON, it carries no `error`, it has
/// `choices`, and the first choice has string `message.content`.
pub fn decode_reply(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body).map_err(|e| Error::ResponseFormatError {
        reason: e.to_string(),
        body: body.to_string(),
    })?;

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        return Err(Error::ServiceError {
            error: error.to_string(),
        });
    }

    let Some(choices) = value.get("choices") else {
        return Err(Error::SchemaError {
            body: body.to_string(),
        });
    };

    let content = choices
        .get(0)
        .ok_or("no first choice")
        .and_then(|choice| choice.get("message").ok_or("first choice has no message"))
        .and_then(|message| message.get("content").ok_or("message has no content"))
        .and_then(|content| content.as_str().ok_or("message content is not a string"))
        .map_err(|reason| Error::ExtractionError {
            reason: reason.to_string(),
            body: body.to_string(),
        })?;

    Ok(content.to_string())
}
