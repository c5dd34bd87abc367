pub mod draft_models;
pub mod draft_service;
pub mod draft_store;

pub use draft_service::DraftService;
pub use draft_store::{LocalStorage, StorageError};
