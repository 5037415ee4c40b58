pub mod auth;
pub mod profile;
pub mod response;

pub use auth::{
    AuthData, AuthResponse, Session, SessionData, SessionResponse, SignInCredentials,
    SignOutResponse, SignUpCredentials, User, UserData, UserResponse,
};
pub use profile::{
    AppRole, NewProfile, NotificationPreferences, Profile, ProfilePreferences, ProfileUpdate,
};
pub use response::{ErrorInfo, QueryResult};
