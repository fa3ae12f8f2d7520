use crate::errors::{ToolError, ToolResult};
use crate::services::http::{HttpExchange, HttpMethod, OutboundRequest};
use crate::utils::text::decode_utf8_prefix;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// What was sent (or attempted), including the injected auth header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescription {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub auth_method: &'static str,
}

impl RequestDescription {
    pub fn from_outbound(request: &OutboundRequest, auth_method: &'static str) -> Self {
        Self {
            url: request.url.clone(),
            method: request.method,
            headers: request.headers.clone(),
            body: request.body.clone(),
            auth_method,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDescription {
    pub status_code: u16,
    pub status_text: String,
    /// Milliseconds from dispatch until the body was fully read.
    pub timing: u64,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl ResponseDescription {
    pub fn from_exchange(exchange: HttpExchange, timing: u64) -> Self {
        let body = decode_body(&exchange);
        Self {
            status_code: exchange.status,
            status_text: exchange.status_text,
            timing,
            headers: exchange.headers,
            body,
            truncated: exchange.truncated,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_error: bool,
    pub messages: Vec<String>,
}

impl Validation {
    pub fn for_status(status: u16) -> Self {
        if status >= 400 {
            Self {
                is_error: true,
                messages: vec![format!("Request failed with status {}", status)],
            }
        } else {
            Self {
                is_error: false,
                messages: vec!["Request completed successfully".to_string()],
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransportError {
    pub message: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResultEnvelope {
    Success {
        request: RequestDescription,
        response: ResponseDescription,
        validation: Validation,
    },
    TransportFailure {
        error: TransportError,
        request: RequestDescription,
    },
}

impl ResultEnvelope {
    pub fn success(request: RequestDescription, exchange: HttpExchange, timing: u64) -> Self {
        let validation = Validation::for_status(exchange.status);
        ResultEnvelope::Success {
            request,
            response: ResponseDescription::from_exchange(exchange, timing),
            validation,
        }
    }

    pub fn transport_failure(
        request: RequestDescription,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        ResultEnvelope::TransportFailure {
            error: TransportError {
                message: message.into(),
                code: code.into(),
            },
            request,
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self, ResultEnvelope::TransportFailure { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ResultEnvelope::Success { response, .. } => Some(response.status_code),
            ResultEnvelope::TransportFailure { .. } => None,
        }
    }

    pub fn to_pretty_json(&self) -> ToolResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| {
            ToolError::internal(format!("Failed to serialize result envelope: {}", err))
        })
    }

    /// MCP `tools/call` result. Transport failures are flagged with `isError`;
    /// HTTP error statuses are not, they live in `validation.isError`.
    pub fn into_tool_result(self) -> ToolResult<Value> {
        let text = self.to_pretty_json()?;
        let mut result = serde_json::json!({
            "content": [ { "type": "text", "text": text } ]
        });
        if self.is_transport_failure() {
            if let Some(obj) = result.as_object_mut() {
                obj.insert("isError".to_string(), Value::Bool(true));
            }
        }
        Ok(result)
    }
}

fn decode_body(exchange: &HttpExchange) -> Value {
    let text = decode_utf8_prefix(&exchange.body);
    let is_json = exchange
        .content_type()
        .map(|ct| ct.to_lowercase().contains("json"))
        .unwrap_or(false);
    if is_json && !exchange.truncated && !text.trim().is_empty() {
        if let Ok(parsed) = serde_json::from_str::<Value>(&text) {
            return parsed;
        }
    }
    Value::String(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exchange(status: u16, content_type: &str, body: &str) -> HttpExchange {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        HttpExchange {
            status,
            status_text: "Status".to_string(),
            headers,
            body: body.as_bytes().to_vec(),
            body_total_bytes: body.len() as u64,
            truncated: false,
        }
    }

    fn description() -> RequestDescription {
        RequestDescription {
            url: "http://api.local/users".to_string(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            body: None,
            auth_method: "none",
        }
    }

    #[test]
    fn validation_messages_follow_status() {
        let ok = Validation::for_status(200);
        assert!(!ok.is_error);
        assert_eq!(ok.messages, vec!["Request completed successfully"]);

        let redirect = Validation::for_status(399);
        assert!(!redirect.is_error);

        let missing = Validation::for_status(404);
        assert!(missing.is_error);
        assert_eq!(missing.messages, vec!["Request failed with status 404"]);
    }

    #[test]
    fn success_envelope_has_exact_top_level_fields() {
        let envelope =
            ResultEnvelope::success(description(), exchange(200, "application/json", "{\"id\":1}"), 7);
        let value = serde_json::to_value(&envelope).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["request", "response", "validation"]);
        assert_eq!(value["request"]["method"], "GET");
        assert_eq!(value["request"]["authMethod"], "none");
        assert!(value["request"].get("body").is_none());
        assert_eq!(value["response"]["statusCode"], 200);
        assert_eq!(value["response"]["timing"], 7);
        assert_eq!(value["response"]["body"], json!({"id": 1}));
        assert!(value["response"].get("truncated").is_none());
        assert_eq!(value["validation"]["isError"], false);
    }

    #[test]
    fn transport_failure_envelope_has_error_and_request_only() {
        let envelope = ResultEnvelope::transport_failure(
            description(),
            "connect error: Connection refused",
            "ECONNREFUSED",
        );
        let value = serde_json::to_value(&envelope).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["error", "request"]);
        assert_eq!(value["error"]["code"], "ECONNREFUSED");
        assert!(value.get("response").is_none());
        assert_eq!(envelope.status_code(), None);
    }

    #[test]
    fn tool_result_flags_only_transport_failures() {
        let failed = ResultEnvelope::success(description(), exchange(500, "text/plain", "boom"), 1)
            .into_tool_result()
            .unwrap();
        assert!(failed.get("isError").is_none());
        let text = failed["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("\n  \"validation\""), "text must be pretty-printed");

        let unreachable = ResultEnvelope::transport_failure(description(), "refused", "ECONNREFUSED")
            .into_tool_result()
            .unwrap();
        assert_eq!(unreachable["isError"], true);
        assert_eq!(unreachable["content"][0]["type"], "text");
    }

    #[test]
    fn bodies_fall_back_to_text() {
        let not_json = ResponseDescription::from_exchange(exchange(200, "application/json", "oops{"), 0);
        assert_eq!(not_json.body, json!("oops{"));

        let html = ResponseDescription::from_exchange(exchange(200, "text/html", "<p>hi</p>"), 0);
        assert_eq!(html.body, json!("<p>hi</p>"));

        let empty = ResponseDescription::from_exchange(exchange(204, "application/json", ""), 0);
        assert_eq!(empty.body, json!(""));
    }

    #[test]
    fn truncated_json_is_kept_as_text_and_flagged() {
        let mut partial = exchange(200, "application/json", "{\"items\":[1,2");
        partial.truncated = true;
        partial.body_total_bytes = 64;
        let response = ResponseDescription::from_exchange(partial, 3);
        assert!(response.truncated);
        assert_eq!(response.body, json!("{\"items\":[1,2"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["truncated"], true);
    }
}
