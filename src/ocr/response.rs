// Decoding of OCR service responses.
//
// Success:  {"code": 100, "data": [{"text": "...", "score": 0.9, "box": [...]}, ...]}
// No text:  {"code": 101, "data": "No text found in image. Path: ..."}
// Anything else is malformed.

use serde_json::Value;

const CODE_OK: i64 = 100;
const CODE_NO_TEXT: i64 = 101;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrResponse {
    NoText,
    Items(Vec<String>),
    Malformed(String),
}

impl OcrResponse {
    pub fn from_json(body: &Value) -> Self {
        let Some(obj) = body.as_object() else {
            return Self::Malformed(format!("expected a JSON object, got {}", truncate(body)));
        };

        let code = obj.get("code").and_then(Value::as_i64);
        if code == Some(CODE_NO_TEXT) {
            return Self::NoText;
        }

        match obj.get("data") {
            Some(Value::Array(items)) if code == Some(CODE_OK) => Self::Items(
                items
                    .iter()
                    .filter_map(|item| item.get("text").and_then(Value::as_str))
                    .map(|text| text.trim().to_string())
                    .collect(),
            ),
            _ => Self::Malformed(format!("unexpected response shape: {}", truncate(body))),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_json(&value),
            Err(e) => Self::Malformed(format!("invalid JSON: {}", e)),
        }
    }
}

fn truncate(value: &Value) -> String {
    let s = value.to_string();
    if s.chars().count() > 200 {
        let head: String = s.chars().take(200).collect();
        format!("{}...", head)
    } else {
        s
    }
}
