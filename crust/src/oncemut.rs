use spin::{Mutex, MutexGuard, Once};

/// A mutex whose contents are produced after boot.
///
/// Statics in the kernel often guard hardware that cannot be touched until
/// some earlier service ran. `OnceMutex` separates "exists" from
/// "initialized" so the static can be declared `const` and filled in later.
pub struct OnceMutex<T> {
    inner: Once<Mutex<T>>,
}

impl<T> OnceMutex<T> {
    /// An empty slot. Accessing it before [`OnceMutex::init`] panics.
    pub const fn uninitialized() -> Self {
        Self { inner: Once::new() }
    }

    /// Fills the slot. Later calls are ignored.
    pub fn init(&self, value: T) {
        self.inner.call_once(|| Mutex::new(value));
    }

    /// Locks the contents.
    ///
    /// # Panics
    /// Panics if the slot was never initialized.
    #[track_caller]
    pub fn get(&self) -> MutexGuard<'_, T> {
        self.inner
            .get()
            .expect("OnceMutex accessed before init")
            .lock()
    }

    /// Locks the contents if initialized and not already held.
    pub fn try_get(&self) -> Option<MutexGuard<'_, T>> {
        self.inner.get()?.try_lock()
    }

    /// True once [`OnceMutex::init`] has run.
    pub fn is_initialized(&self) -> bool {
        self.inner.is_completed()
    }

    /// True while some caller holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.get().is_some_and(|m| m.is_locked())
    }
}

impl<T> core::fmt::Debug for OnceMutex<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OnceMutex")
            .field("is_initialized", &self.is_initialized())
            .field("is_locked", &self.is_locked())
            .finish()
    }
}
