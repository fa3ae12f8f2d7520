use crate::constants::tool::{METHODS, NAME as TOOL_NAME};
use crate::errors::{ToolError, ToolResult};
use crate::services::auth::AuthSelector;
use crate::utils::suggest::suggest;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static INPUT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::json!({
        "type": "object",
        "properties": {
            "method": {
                "type": "string",
                "enum": METHODS,
                "description": "HTTP method to use"
            },
            "endpoint": {
                "type": "string",
                "description": "Endpoint path relative to the base URL, e.g. /users/1. Leading and trailing slashes are normalized."
            },
            "body": {
                "description": "Optional request body. Sent only for POST and PUT; objects and arrays are sent as JSON."
            },
            "headers": {
                "type": "object",
                "additionalProperties": { "type": "string" },
                "description": "Optional request headers. The configured authentication header always takes precedence."
            }
        },
        "required": ["method", "endpoint"]
    })
});

static INPUT_VALIDATOR: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::compile(&INPUT_SCHEMA).expect("test_request input schema must compile")
});

/// The single tool this server exposes. The description reflects the live
/// configuration so the host can see where calls go and how they authenticate.
pub fn tool_definition(base_url: &str, auth: &AuthSelector) -> ToolDef {
    let description = format!(
        "Test a REST API endpoint and get detailed response information. \
         Base URL: {}. Authentication: {}. \
         The endpoint is appended to the base URL after slash normalization. \
         Supported methods: {}. Every HTTP status is returned as a result with status, timing, \
         headers and body; validation.isError is true when the status is 400 or above. \
         Network failures are returned with isError and an error code.",
        base_url,
        auth.summary(),
        METHODS.join(", ")
    );
    ToolDef {
        name: TOOL_NAME.to_string(),
        description,
        input_schema: INPUT_SCHEMA.clone(),
    }
}

pub fn ensure_known_tool(name: &str) -> ToolResult<()> {
    if name == TOOL_NAME {
        return Ok(());
    }
    let mut err = ToolError::not_found(format!("Unknown tool: {}", name));
    if !suggest(name, &[TOOL_NAME], 1).is_empty() {
        err = err.with_hint(format!("Did you mean: {}?", TOOL_NAME));
    } else {
        err = err.with_hint(format!("This server exposes a single tool: {}", TOOL_NAME));
    }
    Err(err)
}

pub fn validate_tool_args(args: &Value) -> ToolResult<()> {
    if let Err(errors) = INPUT_VALIDATOR.validate(args) {
        let rendered: Vec<String> = errors.take(10).map(|err| render_error(args, &err)).collect();
        let mut lines = vec![format!("Invalid arguments for {}", TOOL_NAME)];
        lines.extend(rendered.iter().map(|line| format!("- {}", line)));
        return Err(ToolError::invalid_params(lines.join("\n"))
            .with_hint("Required: method (GET|POST|PUT|DELETE) and endpoint (string).")
            .with_details(serde_json::json!({ "errors": rendered })));
    }
    Ok(())
}

const ARGUMENT_KEYS: &[&str] = &["method", "endpoint", "body", "headers"];

/// Keys the tool does not understand, each with a close match when one exists.
/// They are tolerated; callers only log them.
pub fn unknown_argument_keys(args: &Value) -> Vec<(String, Option<String>)> {
    let Some(map) = args.as_object() else {
        return Vec::new();
    };
    map.keys()
        .filter(|key| !ARGUMENT_KEYS.contains(&key.as_str()))
        .map(|key| (key.clone(), suggest(key, ARGUMENT_KEYS, 1).into_iter().next()))
        .collect()
}

fn render_error(args: &Value, err: &jsonschema::ValidationError<'_>) -> String {
    let instance_path = if err.instance_path.to_string().is_empty() {
        "(root)".to_string()
    } else {
        err.instance_path.to_string()
    };
    match &err.kind {
        jsonschema::error::ValidationErrorKind::Enum { .. } => {
            let received = value_at(args, &err.instance_path.to_string());
            let received_str = received.as_str().unwrap_or("");
            let mut line = format!(
                "{}: expected one of {}, got {}",
                instance_path,
                METHODS.join(", "),
                received
            );
            if let Some(candidate) = suggest(received_str, METHODS, 1).first() {
                line.push_str(&format!(" (did you mean {}?)", candidate));
            }
            line
        }
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("{}: missing required field '{}'", instance_path, prop)
        }
        jsonschema::error::ValidationErrorKind::Type { kind } => {
            format!("{}: expected {}", instance_path, format_type_kind(kind))
        }
        _ => format!("{}: {}", instance_path, err),
    }
}

fn format_type_kind(kind: &jsonschema::error::TypeKind) -> String {
    match kind {
        jsonschema::error::TypeKind::Single(primitive) => primitive.to_string(),
        jsonschema::error::TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            if list.is_empty() {
                "unknown".to_string()
            } else {
                list.join(" | ")
            }
        }
    }
}

fn value_at<'a>(root: &'a Value, instance_path: &str) -> &'a Value {
    let mut current = root;
    for segment in instance_path.trim_start_matches('/').split('/') {
        if segment.is_empty() {
            continue;
        }
        current = match current {
            Value::Object(map) => map.get(segment).unwrap_or(&Value::Null),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx))
                .unwrap_or(&Value::Null),
            _ => &Value::Null,
        };
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolErrorKind;
    use crate::services::config::CredentialSlots;
    use serde_json::json;

    #[test]
    fn definition_embeds_base_url_and_auth_summary() {
        let auth = AuthSelector::new(&CredentialSlots {
            bearer_token: Some("t0ken".to_string()),
            ..CredentialSlots::default()
        });
        let tool = tool_definition("https://api.local/v2", &auth);
        assert_eq!(tool.name, "test_request");
        assert!(tool.description.contains("https://api.local/v2"));
        assert!(tool.description.contains("Bearer token authentication"));
        assert!(!tool.description.contains("t0ken"));
        assert_eq!(tool.input_schema["required"], json!(["method", "endpoint"]));
        assert_eq!(
            tool.input_schema["properties"]["method"]["enum"],
            json!(["GET", "POST", "PUT", "DELETE"])
        );
    }

    #[test]
    fn valid_arguments_pass() {
        assert!(validate_tool_args(&json!({"method": "GET", "endpoint": "/users"})).is_ok());
        assert!(validate_tool_args(&json!({
            "method": "POST",
            "endpoint": "users",
            "body": {"name": "x"},
            "headers": {"X-Trace": "1"}
        }))
        .is_ok());
    }

    #[test]
    fn patch_is_rejected_with_enum_message() {
        let err = validate_tool_args(&json!({"method": "PATCH", "endpoint": "/users"}))
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidParams);
        assert!(err.message.contains("/method: expected one of GET, POST, PUT, DELETE"));
    }

    #[test]
    fn non_object_payloads_and_wrong_types_are_rejected() {
        for args in [
            json!(null),
            json!("GET /users"),
            json!({"method": "GET", "endpoint": 42}),
            json!({"method": "GET"}),
            json!({"method": "GET", "endpoint": "/x", "headers": {"X-Count": 3}}),
            json!({"method": "GET", "endpoint": "/x", "headers": ["a"]}),
        ] {
            let err = validate_tool_args(&args).unwrap_err();
            assert_eq!(err.kind, ToolErrorKind::InvalidParams, "{}", args);
        }
    }

    #[test]
    fn unknown_fields_are_tolerated_and_suggested() {
        let args = json!({"method": "GET", "endpoint": "/x", "header": {}, "timeout": 5});
        assert!(validate_tool_args(&args).is_ok());
        let unknown = unknown_argument_keys(&args);
        assert_eq!(
            unknown,
            vec![
                ("header".to_string(), Some("headers".to_string())),
                ("timeout".to_string(), None),
            ]
        );
        assert!(unknown_argument_keys(&json!({"method": "GET", "endpoint": "/"})).is_empty());
    }

    #[test]
    fn unknown_tool_names_are_not_found() {
        assert!(ensure_known_tool("test_request").is_ok());
        let err = ensure_known_tool("test-request").unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::NotFound);
        assert_eq!(err.hint.as_deref(), Some("Did you mean: test_request?"));
    }
}
