mod client;
mod oauth;

pub use client::{Resource, ResourceList, ResourceType, TransferLink, YadiskClient, YadiskError};
pub use oauth::{ImplicitGrant, OAuthError, access_token_from_fragment};
