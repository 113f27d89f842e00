//! Shape normalization for AtlasCloud-style prediction payloads.
//!
//! Some models answer `{ "code": 200, "data": { ... } }`, others return the
//! prediction object directly. Both the submit path and the poll path go
//! through [`unwrap_envelope`] before looking at any field.

use serde_json::Value;

use crate::types::JobHandle;

/// Returns `raw.data` when it is a JSON object, otherwise `raw` itself.
pub fn unwrap_envelope(raw: &Value) -> &Value {
    match raw.get("data") {
        Some(data) if data.is_object() => data,
        _ => raw,
    }
}

/// First usable image URL, trying `outputs[0]`, then `images[0].url`, then `data[0].url`.
pub fn extract_image_url(payload: &Value) -> Option<String> {
    if let Some(url) = first_item(payload, "outputs")
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
    {
        return Some(url.to_string());
    }

    ["images", "data"].into_iter().find_map(|field| {
        first_item(payload, field)
            .and_then(|item| item.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string)
    })
}

pub fn job_handle(payload: &Value) -> Option<JobHandle> {
    let id = match payload.get("id")? {
        Value::String(id) => id.trim().to_string(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };
    if id.is_empty() {
        return None;
    }
    Some(JobHandle { id })
}

pub fn job_status(payload: &Value) -> Option<&str> {
    payload.get("status").and_then(Value::as_str)
}

/// Human readable reason attached to a failed prediction.
pub fn provider_error_message(payload: &Value) -> String {
    let message = match payload.get("error") {
        Some(Value::String(message)) => Some(message.as_str()),
        Some(Value::Object(obj)) => obj.get("message").and_then(Value::as_str),
        _ => None,
    };
    message
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}

fn first_item<'a>(payload: &'a Value, field: &str) -> Option<&'a Value> {
    payload.get(field)?.as_array()?.first()
}
