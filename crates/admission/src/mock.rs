//! Mock key collaborators for unit testing
//!
//! Lets tests pin the generated key or force generation to fail without
//! touching the system RNG.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::keys::{KeyError, KeyGenerator};

/// Key generator returning a canned result and counting its calls
#[derive(Debug, Clone)]
pub struct MockKeyGenerator {
    result: Result<String, String>,
    calls: Arc<AtomicUsize>,
}

impl MockKeyGenerator {
    /// Generator that always yields `key`
    pub fn returning(key: impl Into<String>) -> Self {
        Self {
            result: Ok(key.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Generator that always fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times a key was requested (shared between clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeyGenerator for MockKeyGenerator {
    fn generate_public_key(&self) -> Result<String, KeyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(KeyError::Generation)
    }
}
