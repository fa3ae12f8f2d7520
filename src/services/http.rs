use crate::constants::{http::USER_AGENT, limits::MAX_REDIRECTS};
use crate::errors::{ToolError, ToolResult};
use crate::services::config::BridgeConfig;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Exact, case-sensitive match against the supported verbs.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }

    fn to_reqwest(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// A fully constructed request, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

/// A completed HTTP exchange, whatever the status code.
#[derive(Debug, Clone)]
pub struct HttpExchange {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub body_total_bytes: u64,
    pub truncated: bool,
}

impl HttpExchange {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum HttpFailure {
    /// Network-level failure: the exchange never completed.
    #[error("{message}")]
    Transport { message: String, code: &'static str },
    /// Anything the transport cannot classify as a network failure.
    #[error("{0}")]
    Fault(String),
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<HttpExchange, HttpFailure>;
}

/// Renders a body for the wire: structured values as JSON, strings verbatim.
pub fn encode_body(body: &Value) -> Vec<u8> {
    match body {
        Value::String(text) => text.as_bytes().to_vec(),
        other => other.to_string().into_bytes(),
    }
}

/// Case-insensitive header upsert; the incoming spelling of the name wins.
pub fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: &str) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

pub fn has_header(headers: &BTreeMap<String, String>, name: &str) -> bool {
    headers.keys().any(|existing| existing.eq_ignore_ascii_case(name))
}

/// reqwest-backed transport. Status codes are never turned into errors here;
/// only failures to complete the exchange are.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    max_capture_bytes: usize,
}

impl ReqwestTransport {
    pub fn new(config: &BridgeConfig) -> ToolResult<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));
        if !config.ssl_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self {
            client,
            max_capture_bytes: config.response_size_limit,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<HttpExchange, HttpFailure> {
        let headers = headers_to_headermap(&request.headers)?;
        let mut req = self
            .client
            .request(request.method.to_reqwest(), request.url.as_str())
            .headers(headers);
        if let Some(body) = request.body.as_ref() {
            req = req.body(encode_body(body));
        }

        let response = req.send().await.map_err(classify_reqwest_error)?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let headers = headers_to_map(response.headers());

        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        let mut body_total_bytes: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify_reqwest_error)?;
            body_total_bytes += chunk.len() as u64;
            let room = self.max_capture_bytes.saturating_sub(body.len());
            if room > 0 {
                body.extend_from_slice(&chunk[..room.min(chunk.len())]);
            }
        }

        Ok(HttpExchange {
            status: status.as_u16(),
            status_text,
            headers,
            truncated: body_total_bytes > body.len() as u64,
            body,
            body_total_bytes,
        })
    }
}

fn headers_to_headermap(headers: &BTreeMap<String, String>) -> Result<HeaderMap, HttpFailure> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| HttpFailure::Fault(format!("Invalid header name: {}", key)))?;
        let val = HeaderValue::from_str(value)
            .map_err(|_| HttpFailure::Fault(format!("Invalid value for header {}", key)))?;
        map.insert(name, val);
    }
    Ok(map)
}

fn headers_to_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in headers {
        let text = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(key.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&text);
            })
            .or_insert(text);
    }
    map
}

fn error_chain_message(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

fn find_io_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a std::io::Error> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(cause) = current {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        current = cause.source();
    }
    None
}

pub(crate) fn classify_reqwest_error(err: reqwest::Error) -> HttpFailure {
    let message = error_chain_message(&err);
    if err.is_builder() {
        return HttpFailure::Fault(message);
    }
    let code = if err.is_timeout() {
        "ETIMEDOUT"
    } else if err.is_redirect() {
        "ERR_FR_TOO_MANY_REDIRECTS"
    } else if err.is_body() || err.is_decode() {
        "ERR_BAD_RESPONSE"
    } else if err.is_connect() || err.is_request() {
        classify_network_cause(&err, &message, err.is_connect())
    } else {
        return HttpFailure::Fault(message);
    };
    HttpFailure::Transport { message, code }
}

fn classify_network_cause(
    err: &(dyn StdError + 'static),
    message: &str,
    during_connect: bool,
) -> &'static str {
    if let Some(io) = find_io_error(err) {
        match io.kind() {
            std::io::ErrorKind::ConnectionRefused => return "ECONNREFUSED",
            std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
                return "ECONNRESET"
            }
            std::io::ErrorKind::TimedOut => return "ETIMEDOUT",
            _ => {}
        }
    }
    let lowered = message.to_lowercase();
    if lowered.contains("dns error") || lowered.contains("failed to lookup address") {
        return "ENOTFOUND";
    }
    if lowered.contains("connection refused") {
        return "ECONNREFUSED";
    }
    if during_connect {
        "ECONNECT"
    } else {
        "ERR_NETWORK"
    }
}
