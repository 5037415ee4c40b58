pub mod auth_client;
pub mod executor;
pub mod profiles;
pub mod session_store;

pub use auth_client::AuthClient;
pub use executor::{Executor, PreparedRequest, RawReply};
pub use profiles::ProfileRepository;
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
