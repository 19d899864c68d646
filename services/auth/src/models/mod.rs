//! Authentication service models

pub mod user;

// Re-export for convenience
pub use user::{
    AuthResponse, EMAIL_PROVIDER, LoginCredentials, NewUser, SignupRequest, User, UserProfile,
};
