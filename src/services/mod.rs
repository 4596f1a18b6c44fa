//! Business logic services

pub mod auth;
pub mod books;
pub mod deleter;
pub mod users;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Storage};

use deleter::DeletionNotifier;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub users: users::UsersService,
    pub books: books::BooksService,
}

impl Services {
    /// Create all services over the given storage. Book removals are queued
    /// through `deletions`.
    pub fn new(
        storage: Arc<dyn Storage>,
        auth_config: &AuthConfig,
        deletions: DeletionNotifier,
    ) -> Self {
        let auth = auth::AuthService::new(auth_config);
        Self {
            users: users::UsersService::new(storage.clone(), auth.clone()),
            books: books::BooksService::new(storage, deletions),
            auth,
        }
    }
}
