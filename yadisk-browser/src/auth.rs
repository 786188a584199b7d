use std::fmt;

use url::Url;
use yadisk_core::access_token_from_fragment;

use crate::storage::{KeyValueStore, StorageError};

pub const TOKEN_KEY: &str = "token";

/// Opaque bearer credential. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Redirect,
    Stored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResolution {
    Present {
        token: BearerToken,
        source: TokenSource,
        /// The redirect location with its fragment removed, when one was given.
        location: Option<Url>,
    },
    Absent,
}

impl AuthResolution {
    pub fn token(&self) -> Option<&BearerToken> {
        match self {
            AuthResolution::Present { token, .. } => Some(token),
            AuthResolution::Absent => None,
        }
    }
}

/// Decides which token, if any, the session starts with. A token in the
/// location fragment wins and is persisted; otherwise a stored one is used.
/// Meant to run once per session start.
pub fn resolve_session<S>(location: Option<&Url>, store: &S) -> Result<AuthResolution, StorageError>
where
    S: KeyValueStore + ?Sized,
{
    if let Some(location) = location
        && let Some(token) = location.fragment().and_then(access_token_from_fragment)
    {
        store.set(TOKEN_KEY, &token)?;
        tracing::info!("access token captured from redirect location");
        return Ok(AuthResolution::Present {
            token: BearerToken::new(token),
            source: TokenSource::Redirect,
            location: Some(strip_fragment(location)),
        });
    }

    match store.get(TOKEN_KEY)? {
        Some(token) if !token.is_empty() => Ok(AuthResolution::Present {
            token: BearerToken::new(token),
            source: TokenSource::Stored,
            location: location.map(strip_fragment),
        }),
        _ => Ok(AuthResolution::Absent),
    }
}

pub fn sign_out<S>(store: &S) -> Result<(), StorageError>
where
    S: KeyValueStore + ?Sized,
{
    store.remove(TOKEN_KEY)
}

fn strip_fragment(location: &Url) -> Url {
    let mut clean = location.clone();
    clean.set_fragment(None);
    clean
}
