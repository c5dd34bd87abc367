pub mod letter_models;
pub mod letter_ports;
pub mod letter_service;

pub use letter_models::LetterRef;
pub use letter_ports::{DriveApi, LetterError, LetterIndex};
pub use letter_service::LetterService;
