/// Request and response types for the W3C WebDriver protocol
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which element references are serialized.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a07f-4021-8b2a-2aa5d5ae0ff5";

/// Every WebDriver response wraps its payload in `value`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub value: T,
}

/// Error payload of a failed command
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorValue {
    /// Error code, e.g. "no such element"
    pub error: String,

    #[serde(default)]
    pub message: String,
}

/// New session request
#[derive(Debug, Clone, Serialize)]
pub struct NewSessionRequest {
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub always_match: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    pub session_id: String,

    #[serde(default)]
    pub capabilities: Value,
}

/// `/status` payload
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub ready: bool,

    #[serde(default)]
    pub message: String,
}

/// Element lookup request
#[derive(Debug, Clone, Serialize)]
pub struct FindRequest<'a> {
    pub using: &'static str,
    pub value: &'a str,
}

impl<'a> FindRequest<'a> {
    pub const fn css(selector: &'a str) -> Self {
        Self {
            using: "css selector",
            value: selector,
        }
    }
}

/// Element reference as returned by the find commands
#[derive(Debug, Clone, Deserialize)]
pub struct ElementRef {
    #[serde(rename = "element-6066-11e4-a07f-4021-8b2a-2aa5d5ae0ff5")]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWindow {
    pub handle: String,
}

/// Script execution request
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest {
    pub script: &'static str,
    pub args: Vec<Value>,
}

/// JSON form of an element reference, for script arguments.
pub fn element_arg(id: &str) -> Value {
    serde_json::json!({ ELEMENT_KEY: id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ref_deserialization() {
        let json = r#"{"value":{"element-6066-11e4-a07f-4021-8b2a-2aa5d5ae0ff5":"abc"}}"#;
        let parsed: Envelope<ElementRef> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.value.id, "abc");
    }

    #[test]
    fn test_error_value_deserialization() {
        let json = r#"{"value":{"error":"no such element","message":"Unable to locate","stacktrace":""}}"#;
        let parsed: Envelope<ErrorValue> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.value.error, "no such element");
    }

    #[test]
    fn test_new_session_response() {
        let json = r#"{"value":{"sessionId":"s-1","capabilities":{"browserName":"firefox"}}}"#;
        let parsed: Envelope<NewSessionResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.value.session_id, "s-1");
        assert_eq!(parsed.value.capabilities["browserName"], "firefox");
    }
}
