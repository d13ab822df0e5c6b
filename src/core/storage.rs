//! Durable storage for the bearer token.
//!
//! The token is the only piece of session state that survives a reload.
//! The profile is always re-derived from the API.

use std::cell::RefCell;

use crate::config::TOKEN_STORAGE_KEY;
use crate::core::error::StorageError;
use crate::utils::dom;

/// Read/write access to the persisted token.
pub trait TokenStore {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> Result<(), StorageError>;
    fn remove(&self) -> Result<(), StorageError>;
}

/// Token kept in `window.localStorage`.
#[derive(Debug, Clone, Copy)]
pub struct LocalTokenStore {
    key: &'static str,
}

impl LocalTokenStore {
    pub fn new() -> Self {
        Self {
            key: TOKEN_STORAGE_KEY,
        }
    }
}

impl Default for LocalTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for LocalTokenStore {
    fn get(&self) -> Option<String> {
        let storage = dom::local_storage()?;
        storage
            .get_item(self.key)
            .ok()?
            .filter(|token| !token.is_empty())
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        let storage = dom::local_storage().ok_or(StorageError::Unavailable)?;
        storage
            .set_item(self.key, token)
            .map_err(|_| StorageError::WriteFailed)
    }

    fn remove(&self) -> Result<(), StorageError> {
        let storage = dom::local_storage().ok_or(StorageError::Unavailable)?;
        storage
            .remove_item(self.key)
            .map_err(|_| StorageError::RemoveFailed)
    }
}

/// Process-local token store, used off the browser and in tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RefCell<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token, as if left over from a previous visit.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RefCell::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.token.borrow_mut() = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        self.token.borrow_mut().take();
        Ok(())
    }
}
