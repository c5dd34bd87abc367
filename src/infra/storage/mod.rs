mod in_memory;
mod json_local_storage;

pub use in_memory::InMemoryLocalStorage;
pub use json_local_storage::JsonLocalStorage;
