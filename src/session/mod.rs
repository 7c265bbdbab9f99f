mod file_store;
pub mod keys;
mod keyring_store;
mod storage;
mod store;

pub use file_store::FileSessionStore;
pub use keyring_store::KeyringSessionStore;
pub use storage::{Profile, Session, SessionStorage};
pub use store::{MemorySessionStore, SessionStore, StoreError};
