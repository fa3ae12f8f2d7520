use crate::constants::http::{CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::constants::limits::LOG_BODY_PREVIEW_BYTES;
use crate::errors::{ToolError, ToolResult};
use crate::mcp::catalog::{unknown_argument_keys, validate_tool_args};
use crate::mcp::envelope::{RequestDescription, ResultEnvelope};
use crate::services::auth::AuthSelector;
use crate::services::config::BridgeConfig;
use crate::services::http::{
    has_header, set_header, HttpFailure, HttpMethod, HttpTransport, OutboundRequest,
};
use crate::services::logger::Logger;
use crate::utils::redact::{redact_headers, redact_text};
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Canonical form of a caller-supplied path: exactly one leading slash and no
/// trailing slash, except for the root itself.
pub fn normalize_endpoint(endpoint: &str) -> String {
    format!("/{}", endpoint.trim_matches('/'))
}

/// A validated `test_request` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub method: HttpMethod,
    pub endpoint: String,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl InvocationRequest {
    /// Validates raw tool arguments. `null` for `body` or `headers` counts as absent.
    pub fn from_args(args: &Value) -> ToolResult<Self> {
        let args = drop_null_optionals(args);
        validate_tool_args(&args)?;

        let method = args
            .get("method")
            .and_then(Value::as_str)
            .and_then(HttpMethod::parse)
            .ok_or_else(|| ToolError::invalid_params("method must be one of GET, POST, PUT, DELETE"))?;
        let endpoint = args
            .get("endpoint")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_params("endpoint must be a string"))?
            .to_string();
        let mut headers = BTreeMap::new();
        if let Some(map) = args.get("headers").and_then(Value::as_object) {
            for (name, value) in map {
                let value = value.as_str().ok_or_else(|| {
                    ToolError::invalid_params(format!("headers.{} must be a string", name))
                })?;
                headers.insert(name.clone(), value.to_string());
            }
        }
        Ok(Self {
            method,
            endpoint,
            body: args.get("body").cloned(),
            headers,
        })
    }
}

fn drop_null_optionals(args: &Value) -> Value {
    match args {
        Value::Object(map) => {
            let mut out = map.clone();
            for key in ["body", "headers"] {
                if out.get(key).map(Value::is_null).unwrap_or(false) {
                    out.remove(key);
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Executes one `test_request` call end to end:
/// validate, normalize, authenticate, dispatch, build the envelope.
#[derive(Clone)]
pub struct EndpointInvoker {
    logger: Logger,
    config: Arc<BridgeConfig>,
    auth: Arc<AuthSelector>,
    transport: Arc<dyn HttpTransport>,
}

impl EndpointInvoker {
    pub fn new(
        logger: Logger,
        config: Arc<BridgeConfig>,
        auth: Arc<AuthSelector>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            logger: logger.child("invoker"),
            config,
            auth,
            transport,
        }
    }

    pub fn build_request(&self, invocation: &InvocationRequest) -> ToolResult<OutboundRequest> {
        let endpoint = normalize_endpoint(&invocation.endpoint);
        let url = format!("{}{}", self.config.base_url, endpoint);

        let mut headers = BTreeMap::new();
        for (name, value) in &self.config.default_headers {
            set_header(&mut headers, name, value);
        }
        for (name, value) in &invocation.headers {
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ToolError::invalid_params(format!("Invalid header name: {}", name))
            })?;
            HeaderValue::from_str(value).map_err(|_| {
                ToolError::invalid_params(format!("Invalid value for header {}", name))
            })?;
            set_header(&mut headers, name, value);
        }

        let body = if invocation.method.carries_body() {
            invocation.body.clone().filter(|b| !b.is_null())
        } else {
            None
        };
        if let Some(body) = body.as_ref() {
            if (body.is_object() || body.is_array()) && !has_header(&headers, CONTENT_TYPE) {
                set_header(&mut headers, CONTENT_TYPE, JSON_CONTENT_TYPE);
            }
        }

        if let Some((name, value)) = self.auth.auth_header() {
            set_header(&mut headers, &name, &value);
        }

        Ok(OutboundRequest {
            method: invocation.method,
            url,
            headers,
            body,
        })
    }

    pub async fn invoke(&self, args: &Value) -> ToolResult<ResultEnvelope> {
        let invocation = InvocationRequest::from_args(args)?;
        let unknown: Vec<String> = unknown_argument_keys(args)
            .into_iter()
            .map(|(key, close)| match close {
                Some(close) => format!("{} (did you mean {}?)", key, close),
                None => key,
            })
            .collect();
        if !unknown.is_empty() {
            self.logger.debug(
                "ignoring unknown arguments",
                Some(&serde_json::json!({ "keys": unknown })),
            );
        }
        let request = self.build_request(&invocation)?;
        let description = RequestDescription::from_outbound(&request, self.auth.method_label());

        let call_id = uuid::Uuid::new_v4().to_string();
        let secrets = self.auth.secret_values();
        let extra_headers: Vec<String> = self.auth.header_name().map(str::to_string).into_iter().collect();
        self.logger.debug(
            "dispatch",
            Some(&serde_json::json!({
                "call_id": call_id,
                "method": request.method.as_str(),
                "url": redact_text(&request.url, usize::MAX, &secrets),
                "headers": redact_headers(&request.headers, &extra_headers),
            })),
        );

        let started = Instant::now();
        match self.transport.send(&request).await {
            Ok(exchange) => {
                let timing = started.elapsed().as_millis() as u64;
                self.logger.info(
                    "completed",
                    Some(&serde_json::json!({
                        "call_id": call_id,
                        "method": request.method.as_str(),
                        "url": redact_text(&request.url, usize::MAX, &secrets),
                        "status": exchange.status,
                        "timing_ms": timing,
                        "body_bytes": exchange.body_total_bytes,
                    })),
                );
                if exchange.truncated {
                    self.logger.debug(
                        "response body truncated",
                        Some(&serde_json::json!({
                            "call_id": call_id,
                            "captured": exchange.body.len(),
                            "total": exchange.body_total_bytes,
                            "preview": redact_text(
                                &String::from_utf8_lossy(&exchange.body),
                                LOG_BODY_PREVIEW_BYTES,
                                &secrets,
                            ),
                        })),
                    );
                }
                Ok(ResultEnvelope::success(description, exchange, timing))
            }
            Err(HttpFailure::Transport { message, code }) => {
                self.logger.warn(
                    "transport failure",
                    Some(&serde_json::json!({
                        "call_id": call_id,
                        "url": redact_text(&request.url, usize::MAX, &secrets),
                        "code": code,
                        "message": redact_text(&message, usize::MAX, &secrets),
                    })),
                );
                Ok(ResultEnvelope::transport_failure(description, message, code))
            }
            Err(HttpFailure::Fault(message)) => Err(ToolError::internal(message)
                .with_details(serde_json::json!({ "call_id": call_id }))),
        }
    }
}
