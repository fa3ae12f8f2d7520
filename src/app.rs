use crate::errors::ToolResult;
use crate::managers::endpoint::EndpointInvoker;
use crate::mcp::catalog::{tool_definition, ToolDef};
use crate::services::auth::AuthSelector;
use crate::services::config::BridgeConfig;
use crate::services::http::{HttpTransport, ReqwestTransport};
use crate::services::logger::Logger;
use std::sync::Arc;

/// Everything a call handler needs, built once at startup and shared read-only.
pub struct App {
    pub logger: Logger,
    pub config: Arc<BridgeConfig>,
    pub auth: Arc<AuthSelector>,
    pub invoker: Arc<EndpointInvoker>,
}

impl App {
    pub fn initialize() -> ToolResult<Self> {
        let logger = Logger::new("rest-mcp");
        let config = BridgeConfig::from_env()?;
        Self::from_config(config, logger)
    }

    pub fn from_config(config: BridgeConfig, logger: Logger) -> ToolResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, transport, logger))
    }

    pub fn with_transport(
        config: BridgeConfig,
        transport: Arc<dyn HttpTransport>,
        logger: Logger,
    ) -> Self {
        let auth = Arc::new(AuthSelector::new(&config.credentials));
        let config = Arc::new(config);

        logger.info(
            "configured",
            Some(&serde_json::json!({
                "base_url": config.base_url,
                "auth": auth.method_label(),
                "ssl_verify": config.ssl_verify,
                "response_size_limit": config.response_size_limit,
                "timeout_ms": config.timeout.map(|t| t.as_millis() as u64),
                "default_headers": config.default_headers.keys().collect::<Vec<_>>(),
            })),
        );
        if !auth.shadowed_modes().is_empty() {
            logger.debug(
                "multiple credential sets configured; lower-precedence ones are ignored",
                Some(&serde_json::json!({
                    "active": auth.method_label(),
                    "ignored": auth.shadowed_modes(),
                })),
            );
        }

        let invoker = Arc::new(EndpointInvoker::new(
            logger.clone(),
            config.clone(),
            auth.clone(),
            transport,
        ));

        Self {
            logger,
            config,
            auth,
            invoker,
        }
    }

    pub fn tool(&self) -> ToolDef {
        tool_definition(&self.config.base_url, &self.auth)
    }
}
