use crate::errors::McpError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Version 2.0 only; ids must be strings, numbers or null.
    pub fn is_well_formed(&self) -> bool {
        self.jsonrpc == "2.0"
            && !self.method.is_empty()
            && matches!(
                self.id,
                None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Number(_))
            )
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: error.code.as_i32(),
                message: error.message,
            }),
        }
    }

    pub fn from_result(id: Value, outcome: Result<Value, McpError>) -> Self {
        match outcome {
            Ok(result) => Self::success(id, result),
            Err(err) => Self::failure(id, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn json_rpc_request_allows_missing_id_for_notifications() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized","params":{}}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(raw).expect("must parse");
        assert!(parsed.is_notification());
        assert_eq!(parsed.method, "notifications/initialized");
    }

    #[test]
    fn json_rpc_request_defaults_params() {
        let raw = r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(raw).expect("must parse");
        assert_eq!(parsed.id, Some(Value::String("a".to_string())));
        assert!(parsed.params.is_null());
    }

    #[test]
    fn well_formedness_checks_version_and_id_type() {
        let ok: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
        assert!(ok.is_well_formed());
        let old: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).unwrap();
        assert!(!old.is_well_formed());
        let object_id: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":{"a":1},"method":"ping"}"#).unwrap();
        assert!(!object_id.is_well_formed());
    }

    #[test]
    fn failure_serializes_code_and_omits_result() {
        let response = JsonRpcResponse::failure(
            Value::from(7),
            McpError::new(ErrorCode::MethodNotFound, "Unknown tool: x"),
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
        assert_eq!(value["id"], 7);
    }
}
