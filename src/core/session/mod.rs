pub mod auth_ports;
pub mod identity_service;
pub mod session_models;
pub mod token_service;

pub use auth_ports::{ApiClientConfigurator, AuthError, IdentityProvider, TokenGrant};
pub use identity_service::IdentityService;
pub use session_models::{AccessToken, Identity, SessionHandle};
pub use token_service::{TokenError, TokenService};
