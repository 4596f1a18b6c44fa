//! Data models for Bookly

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, NewBook};
pub use user::{LoginUser, RegisterUser, User, UserClaims};
