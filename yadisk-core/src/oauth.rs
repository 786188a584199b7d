use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://oauth.yandex.ru";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),
}

/// Implicit grant: the service redirects back with the token in the URL fragment.
#[derive(Debug, Clone)]
pub struct ImplicitGrant {
    base_url: Url,
    client_id: String,
}

impl ImplicitGrant {
    pub fn new(client_id: impl Into<String>) -> Result<Self, OAuthError> {
        Self::with_base_url(DEFAULT_BASE_URL, client_id)
    }

    pub fn with_base_url(base_url: &str, client_id: impl Into<String>) -> Result<Self, OAuthError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            client_id: client_id.into(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn authorize_url(&self, redirect_uri: &str) -> Result<Url, OAuthError> {
        let mut url = self.base_url.join("/authorize")?;
        url.query_pairs_mut()
            .append_pair("response_type", "token")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri);
        Ok(url)
    }
}

/// Extracts `access_token` from a redirect fragment such as
/// `#access_token=abc&token_type=bearer&expires_in=31536000`. The value is
/// taken as sent, without form decoding.
pub fn access_token_from_fragment(fragment: &str) -> Option<String> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    fragment.split('&').find_map(|pair| {
        pair.strip_prefix("access_token=")
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}
