use std::sync::{Arc, PoisonError, RwLock};

/// Shared piece of UI state that a mutation captures and may roll back
/// alongside its collection (current selection, navigation, ...).
#[derive(Debug, Default)]
pub struct StateCell<S> {
    inner: Arc<RwLock<S>>,
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Clone> StateCell<S> {
    pub fn new(value: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub fn get(&self) -> S {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, value: S) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}
