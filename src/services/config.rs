use crate::constants::{env, limits, protocols::ALLOWED_HTTP};
use crate::errors::{ToolError, ToolResult};
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Raw credential slots as found in the environment. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSlots {
    pub basic_username: Option<String>,
    pub basic_password: Option<String>,
    pub bearer_token: Option<String>,
    pub api_key_header_name: Option<String>,
    pub api_key_value: Option<String>,
}

/// Process-wide configuration snapshot, taken once at startup.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_url: String,
    pub credentials: CredentialSlots,
    pub ssl_verify: bool,
    pub response_size_limit: usize,
    pub timeout: Option<Duration>,
    pub default_headers: BTreeMap<String, String>,
}

impl BridgeConfig {
    pub fn new(base_url: &str) -> ToolResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            credentials: CredentialSlots::default(),
            ssl_verify: true,
            response_size_limit: limits::DEFAULT_RESPONSE_SIZE_LIMIT,
            timeout: None,
            default_headers: BTreeMap::new(),
        })
    }

    pub fn with_credentials(mut self, credentials: CredentialSlots) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn from_env() -> ToolResult<Self> {
        let vars: Vec<(String, String)> = std::env::vars().collect();
        Self::from_vars(vars)
    }

    /// Builds the config from an explicit variable list, so callers can test
    /// without touching the process environment.
    pub fn from_vars<I>(vars: I) -> ToolResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        let lookup = |key: &str| -> Option<String> {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = lookup(env::BASE_URL).ok_or_else(|| {
            ToolError::config(format!("{} environment variable is required", env::BASE_URL))
                .with_hint("Set it to the API root, e.g. https://api.example.com/v1")
        })?;

        let credentials = CredentialSlots {
            basic_username: lookup(env::BASIC_USERNAME),
            basic_password: lookup(env::BASIC_PASSWORD),
            bearer_token: lookup(env::BEARER),
            api_key_header_name: lookup(env::APIKEY_HEADER_NAME),
            api_key_value: lookup(env::APIKEY_VALUE),
        };
        if let Some(name) = credentials.api_key_header_name.as_deref() {
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ToolError::config(format!(
                    "{} is not a valid HTTP header name: {}",
                    env::APIKEY_HEADER_NAME,
                    name
                ))
            })?;
        }

        for (key, value) in [
            (env::BEARER, &credentials.bearer_token),
            (env::APIKEY_VALUE, &credentials.api_key_value),
        ] {
            if let Some(value) = value.as_deref() {
                ensure_header_safe(key, value)?;
            }
        }
        if credentials
            .basic_username
            .as_deref()
            .is_some_and(|name| name.contains(':'))
        {
            return Err(ToolError::config(format!(
                "{} must not contain ':'",
                env::BASIC_USERNAME
            )));
        }

        let ssl_verify = match lookup(env::SSL_VERIFY) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ToolError::config(format!(
                    "{} must be true or false, got '{}'",
                    env::SSL_VERIFY,
                    raw
                ))
            })?,
            None => true,
        };

        let response_size_limit = match lookup(env::RESPONSE_SIZE_LIMIT) {
            Some(raw) => parse_positive(env::RESPONSE_SIZE_LIMIT, &raw)? as usize,
            None => limits::DEFAULT_RESPONSE_SIZE_LIMIT,
        };

        let timeout = lookup(env::TIMEOUT_MS)
            .map(|raw| parse_positive(env::TIMEOUT_MS, &raw))
            .transpose()?
            .map(Duration::from_millis);

        let mut default_headers = BTreeMap::new();
        for (key, value) in vars.iter() {
            let Some(name) = key.strip_prefix(env::HEADER_PREFIX) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ToolError::config(format!("{} has an invalid header name", key)))?;
            HeaderValue::from_str(value)
                .map_err(|_| ToolError::config(format!("{} has an invalid header value", key)))?;
            default_headers.insert(name.to_string(), value.clone());
        }

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            credentials,
            ssl_verify,
            response_size_limit,
            timeout,
            default_headers,
        })
    }
}

/// Secrets end up in a header on every call; never echo them in the error.
fn ensure_header_safe(key: &str, value: &str) -> ToolResult<()> {
    HeaderValue::from_str(value).map(|_| ()).map_err(|_| {
        ToolError::config(format!(
            "{} contains characters that are not allowed in an HTTP header",
            key
        ))
    })
}

fn normalize_base_url(raw: &str) -> ToolResult<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|err| {
        ToolError::config(format!("{} is not a valid URL: {}", env::BASE_URL, err))
    })?;
    if !scheme_allowed(parsed.scheme()) {
        return Err(ToolError::config(format!(
            "{} must use http or https",
            env::BASE_URL
        )));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ToolError::config(format!(
            "{} must not contain a query string or fragment",
            env::BASE_URL
        ))
        .with_hint("Endpoints are appended to the base URL; pass query parameters in the endpoint"));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn scheme_allowed(scheme: &str) -> bool {
    ALLOWED_HTTP
        .iter()
        .any(|allowed| allowed.trim_end_matches(':') == scheme)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_positive(label: &str, raw: &str) -> ToolResult<u64> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ToolError::config(format!(
            "{} must be a positive integer, got '{}'",
            label, raw
        ))),
    }
}
