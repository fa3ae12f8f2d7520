use crate::constants::http::AUTHORIZATION;
use crate::services::config::CredentialSlots;
use base64::Engine;

/// The single credential scheme applied to every outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
    ApiKey { header_name: String, value: String },
}

impl AuthMode {
    pub fn label(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::Basic { .. } => "basic",
            AuthMode::Bearer { .. } => "bearer",
            AuthMode::ApiKey { .. } => "apikey",
        }
    }
}

/// Resolves the active [`AuthMode`] once from the configured credential slots.
///
/// Precedence is Basic, then Bearer, then API key. A pair only counts when both
/// halves are present; lower-precedence sets are ignored when a higher one is complete.
#[derive(Debug, Clone)]
pub struct AuthSelector {
    mode: AuthMode,
    shadowed: Vec<&'static str>,
}

impl AuthSelector {
    pub fn new(slots: &CredentialSlots) -> Self {
        let basic = match (&slots.basic_username, &slots.basic_password) {
            (Some(username), Some(password)) => Some(AuthMode::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };
        let bearer = slots.bearer_token.as_ref().map(|token| AuthMode::Bearer {
            token: token.clone(),
        });
        let api_key = match (&slots.api_key_header_name, &slots.api_key_value) {
            (Some(header_name), Some(value)) => Some(AuthMode::ApiKey {
                header_name: header_name.clone(),
                value: value.clone(),
            }),
            _ => None,
        };

        let mut candidates = [basic, bearer, api_key].into_iter().flatten();
        let mode = candidates.next().unwrap_or(AuthMode::None);
        let shadowed = candidates.map(|m| m.label()).collect();
        Self { mode, shadowed }
    }

    pub fn active_mode(&self) -> &AuthMode {
        &self.mode
    }

    pub fn method_label(&self) -> &'static str {
        self.mode.label()
    }

    /// Complete credential sets that lost to a higher-precedence one.
    pub fn shadowed_modes(&self) -> &[&'static str] {
        &self.shadowed
    }

    pub fn auth_header(&self) -> Option<(String, String)> {
        match &self.mode {
            AuthMode::None => None,
            AuthMode::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                Some((AUTHORIZATION.to_string(), format!("Basic {}", encoded)))
            }
            AuthMode::Bearer { token } => {
                Some((AUTHORIZATION.to_string(), format!("Bearer {}", token)))
            }
            AuthMode::ApiKey { header_name, value } => Some((header_name.clone(), value.clone())),
        }
    }

    /// Human-readable description without secret material.
    pub fn summary(&self) -> String {
        match &self.mode {
            AuthMode::None => "No authentication configured".to_string(),
            AuthMode::Basic { username, .. } => {
                format!("Basic authentication (username: {})", username)
            }
            AuthMode::Bearer { .. } => "Bearer token authentication".to_string(),
            AuthMode::ApiKey { header_name, .. } => {
                format!("API key authentication (header: {})", header_name)
            }
        }
    }

    /// Literal secret values, used to scrub log output.
    pub fn secret_values(&self) -> Vec<String> {
        match &self.mode {
            AuthMode::None => Vec::new(),
            AuthMode::Basic { password, .. } => vec![password.clone()],
            AuthMode::Bearer { token } => vec![token.clone()],
            AuthMode::ApiKey { value, .. } => vec![value.clone()],
        }
    }

    pub fn header_name(&self) -> Option<&str> {
        match &self.mode {
            AuthMode::None => None,
            AuthMode::Basic { .. } | AuthMode::Bearer { .. } => Some(AUTHORIZATION),
            AuthMode::ApiKey { header_name, .. } => Some(header_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(
        basic: Option<(&str, &str)>,
        bearer: Option<&str>,
        api_key: Option<(&str, &str)>,
    ) -> CredentialSlots {
        CredentialSlots {
            basic_username: basic.map(|(u, _)| u.to_string()),
            basic_password: basic.map(|(_, p)| p.to_string()),
            bearer_token: bearer.map(str::to_string),
            api_key_header_name: api_key.map(|(n, _)| n.to_string()),
            api_key_value: api_key.map(|(_, v)| v.to_string()),
        }
    }

    #[test]
    fn no_credentials_selects_none() {
        let selector = AuthSelector::new(&CredentialSlots::default());
        assert_eq!(selector.active_mode(), &AuthMode::None);
        assert_eq!(selector.method_label(), "none");
        assert!(selector.auth_header().is_none());
    }

    #[test]
    fn basic_header_is_base64_of_user_colon_password() {
        let selector = AuthSelector::new(&slots(Some(("aladdin", "opensesame")), None, None));
        assert_eq!(selector.method_label(), "basic");
        assert_eq!(
            selector.auth_header(),
            Some((
                "Authorization".to_string(),
                "Basic YWxhZGRpbjpvcGVuc2VzYW1l".to_string()
            ))
        );
    }

    #[test]
    fn bearer_header_prefixes_token() {
        let selector = AuthSelector::new(&slots(None, Some("tok-1"), None));
        assert_eq!(
            selector.auth_header(),
            Some(("Authorization".to_string(), "Bearer tok-1".to_string()))
        );
    }

    #[test]
    fn api_key_uses_configured_header_name_and_raw_value() {
        let selector = AuthSelector::new(&slots(None, None, Some(("X-API-Key", "k-42"))));
        assert_eq!(selector.method_label(), "apikey");
        assert_eq!(
            selector.auth_header(),
            Some(("X-API-Key".to_string(), "k-42".to_string()))
        );
    }

    #[test]
    fn precedence_is_basic_then_bearer_then_api_key() {
        let all = AuthSelector::new(&slots(Some(("u", "p")), Some("t"), Some(("X-Key", "v"))));
        assert_eq!(all.method_label(), "basic");
        assert_eq!(all.shadowed_modes(), &["bearer", "apikey"]);

        let bearer_and_key = AuthSelector::new(&slots(None, Some("t"), Some(("X-Key", "v"))));
        assert_eq!(bearer_and_key.method_label(), "bearer");
        assert_eq!(bearer_and_key.shadowed_modes(), &["apikey"]);
    }

    #[test]
    fn basic_and_bearer_together_never_send_bearer() {
        let selector = AuthSelector::new(&slots(Some(("u", "p")), Some("t"), None));
        let (_, value) = selector.auth_header().expect("auth header");
        assert!(value.starts_with("Basic "));
    }

    #[test]
    fn partial_pairs_do_not_activate() {
        let username_only = CredentialSlots {
            basic_username: Some("alice".to_string()),
            ..CredentialSlots::default()
        };
        assert_eq!(AuthSelector::new(&username_only).method_label(), "none");

        let partial_basic_with_bearer = CredentialSlots {
            basic_password: Some("secret".to_string()),
            bearer_token: Some("t".to_string()),
            ..CredentialSlots::default()
        };
        assert_eq!(
            AuthSelector::new(&partial_basic_with_bearer).method_label(),
            "bearer"
        );

        let key_value_only = CredentialSlots {
            api_key_value: Some("v".to_string()),
            ..CredentialSlots::default()
        };
        assert_eq!(AuthSelector::new(&key_value_only).method_label(), "none");
    }

    #[test]
    fn summary_never_leaks_secrets() {
        for selector in [
            AuthSelector::new(&slots(Some(("alice", "pw-123")), None, None)),
            AuthSelector::new(&slots(None, Some("tok-secret"), None)),
            AuthSelector::new(&slots(None, None, Some(("X-Key", "key-secret")))),
        ] {
            let summary = selector.summary();
            for secret in selector.secret_values() {
                assert!(!summary.contains(&secret));
            }
        }
    }
}
