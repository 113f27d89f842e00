mod auth;
mod config;
mod env;
mod http;

pub(crate) use auth::BearerAuth;
pub use auth::{DEFAULT_API_KEY_ENV, resolve_api_key};
pub use config::{PollConfig, ProviderAuth, ProviderConfig};
pub use env::{Env, parse_dotenv};
pub(crate) use http::build_http_client;

#[cfg(test)]
mod tests;
