mod device_flow;
mod discovery;
mod drive_client;
mod letters_backend;
mod service_account;

pub use device_flow::{
    ConsentPrompt, ConsentPrompter, DeviceCodeGrant, GoogleIdentityProvider, OAuthEndpoints,
};
pub use discovery::DiscoveryClient;
pub use drive_client::GoogleDriveClient;
pub use letters_backend::{LettersBackendClient, DEFAULT_LETTERS_BACKEND_URL};
pub use service_account::ServiceAccountGrant;
