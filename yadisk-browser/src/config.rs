use yadisk_core::{ImplicitGrant, OAuthError, YadiskClient, YadiskError};

const DEFAULT_CLIENT_ID: &str = "808109afb46b43d4a2ab57464feafd0a";
const DEFAULT_REDIRECT_URL: &str = "http://localhost:3001/";
const DEFAULT_LIST_LIMIT: u32 = 10_000;
const DEFAULT_KEYRING_SERVICE: &str = "com.yadisk.browser";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    pub client_id: String,
    pub redirect_url: String,
    pub api_base_url: Option<String>,
    pub oauth_base_url: Option<String>,
    pub list_limit: u32,
    pub keyring_service: String,
    /// Token taken from the environment; bypasses the stored one.
    pub token: Option<String>,
}

impl BrowserConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            client_id: non_empty("YADISK_CLIENT_ID")
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            redirect_url: non_empty("YADISK_REDIRECT_URL")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string()),
            api_base_url: non_empty("YADISK_API_URL"),
            oauth_base_url: non_empty("YADISK_OAUTH_URL"),
            list_limit: read_u32(non_empty("YADISK_LIST_LIMIT"), DEFAULT_LIST_LIMIT),
            keyring_service: non_empty("YADISK_KEYRING_SERVICE")
                .unwrap_or_else(|| DEFAULT_KEYRING_SERVICE.to_string()),
            token: non_empty("YADISK_TOKEN"),
        }
    }

    pub fn api_client(&self, token: &str) -> Result<YadiskClient, YadiskError> {
        match &self.api_base_url {
            Some(url) => YadiskClient::with_base_url(url, token),
            None => YadiskClient::new(token),
        }
    }

    pub fn implicit_grant(&self) -> Result<ImplicitGrant, OAuthError> {
        match &self.oauth_base_url {
            Some(url) => ImplicitGrant::with_base_url(url, self.client_id.clone()),
            None => ImplicitGrant::new(self.client_id.clone()),
        }
    }
}

fn read_u32(value: Option<String>, default: u32) -> u32 {
    value
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> BrowserConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BrowserConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(config.redirect_url, "http://localhost:3001/");
        assert_eq!(config.list_limit, 10_000);
        assert_eq!(config.api_base_url, None);
        assert_eq!(config.keyring_service, "com.yadisk.browser");
        assert_eq!(config.token, None);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("YADISK_CLIENT_ID", "cid"),
            ("YADISK_API_URL", "http://127.0.0.1:8080"),
            ("YADISK_LIST_LIMIT", "50"),
            ("YADISK_TOKEN", "env-token"),
            ("YADISK_KEYRING_SERVICE", "org.example.disk"),
        ]);
        assert_eq!(config.client_id, "cid");
        assert_eq!(config.api_base_url.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(config.list_limit, 50);
        assert_eq!(config.token.as_deref(), Some("env-token"));
        assert_eq!(config.keyring_service, "org.example.disk");
    }

    #[test]
    fn invalid_or_blank_values_fall_back() {
        let config = config_from(&[
            ("YADISK_LIST_LIMIT", "0"),
            ("YADISK_TOKEN", "  "),
            ("YADISK_REDIRECT_URL", ""),
        ]);
        assert_eq!(config.list_limit, DEFAULT_LIST_LIMIT);
        assert_eq!(config.token, None);
        assert_eq!(config.redirect_url, DEFAULT_REDIRECT_URL);
    }

    #[test]
    fn implicit_grant_uses_configured_client() {
        let config = config_from(&[("YADISK_OAUTH_URL", "https://oauth.example")]);
        let url = config
            .implicit_grant()
            .unwrap()
            .authorize_url(&config.redirect_url)
            .unwrap();
        assert_eq!(url.host_str(), Some("oauth.example"));
        assert!(url.query().unwrap_or_default().contains(DEFAULT_CLIENT_ID));
    }
}
