pub mod server {
    pub const NAME: &str = "rest-mcp";
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
}

pub mod tool {
    pub const NAME: &str = "test_request";
    pub const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];
}

pub mod env {
    pub const BASE_URL: &str = "REST_BASE_URL";
    pub const BASIC_USERNAME: &str = "AUTH_BASIC_USERNAME";
    pub const BASIC_PASSWORD: &str = "AUTH_BASIC_PASSWORD";
    pub const BEARER: &str = "AUTH_BEARER";
    pub const APIKEY_HEADER_NAME: &str = "AUTH_APIKEY_HEADER_NAME";
    pub const APIKEY_VALUE: &str = "AUTH_APIKEY_VALUE";
    pub const SSL_VERIFY: &str = "REST_ENABLE_SSL_VERIFY";
    pub const RESPONSE_SIZE_LIMIT: &str = "REST_RESPONSE_SIZE_LIMIT";
    pub const TIMEOUT_MS: &str = "REST_TIMEOUT_MS";
    pub const HEADER_PREFIX: &str = "HEADER_";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}

pub mod limits {
    pub const DEFAULT_RESPONSE_SIZE_LIMIT: usize = 10_000;
    pub const MAX_REDIRECTS: usize = 10;
    pub const LOG_BODY_PREVIEW_BYTES: usize = 256;
}

pub mod protocols {
    pub const ALLOWED_HTTP: &[&str] = &["http:", "https:"];
}

pub mod http {
    pub const USER_AGENT: &str = concat!("rest-mcp/", env!("CARGO_PKG_VERSION"));
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const JSON_CONTENT_TYPE: &str = "application/json";
}
