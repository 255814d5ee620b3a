use std::sync::{Arc, RwLock};

/// Source of the current auth token, if any.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<P: TokenProvider + ?Sized> TokenProvider for Arc<P> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }
}

/// A token fixed at construction, e.g. read from `API_TOKEN`.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Shared, settable token slot.
///
/// Clones share the same slot: whoever logs in calls [`set`](Self::set) and
/// every client holding a clone sees the new token on its next request.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(token.into());
    }

    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }
}

impl TokenProvider for TokenStore {
    fn token(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
