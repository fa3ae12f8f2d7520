use crate::app::App;
use crate::errors::{ToolError, ToolResult};
use crate::utils::redact::redact_headers;
use serde::Serialize;
use serde_json::Value;

pub const CONFIG_URI: &str = "rest-api://config";
pub const RESPONSE_FORMAT_URI: &str = "rest-api://response-format";

const RESPONSE_FORMAT_DOC: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/docs/response-format.md"));

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDef {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

pub fn list_resources() -> Vec<ResourceDef> {
    vec![
        ResourceDef {
            uri: CONFIG_URI,
            name: "Active configuration",
            description: "Base URL, authentication mode and transport settings (secrets redacted)",
            mime_type: "application/json",
        },
        ResourceDef {
            uri: RESPONSE_FORMAT_URI,
            name: "Response format",
            description: "Shape of the test_request result envelope",
            mime_type: "text/markdown",
        },
    ]
}

fn config_snapshot(app: &App) -> Value {
    let extra: Vec<String> = app.auth.header_name().map(str::to_string).into_iter().collect();
    serde_json::json!({
        "baseUrl": app.config.base_url,
        "authMethod": app.auth.method_label(),
        "auth": app.auth.summary(),
        "sslVerify": app.config.ssl_verify,
        "responseSizeLimit": app.config.response_size_limit,
        "timeoutMs": app.config.timeout.map(|t| t.as_millis() as u64),
        "defaultHeaders": redact_headers(&app.config.default_headers, &extra),
    })
}

pub fn read_resource(app: &App, uri: &str) -> ToolResult<Value> {
    let (mime_type, text) = match uri {
        CONFIG_URI => (
            "application/json",
            serde_json::to_string_pretty(&config_snapshot(app))?,
        ),
        RESPONSE_FORMAT_URI => ("text/markdown", RESPONSE_FORMAT_DOC.to_string()),
        _ => {
            return Err(ToolError::invalid_params(format!("Unknown resource: {}", uri))
                .with_hint(format!("Available: {}, {}", CONFIG_URI, RESPONSE_FORMAT_URI)))
        }
    };
    Ok(serde_json::json!({
        "contents": [ { "uri": uri, "mimeType": mime_type, "text": text } ]
    }))
}
