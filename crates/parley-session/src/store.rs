use parley_client::{AccountClient, HistoryClient, Result};
use parley_types::{ChatSession, User};

/// Process-wide cache of the thread list and the signed-in profile
///
/// Survives switching between threads. Anything that changes the set of
/// threads on the backend either patches the cache or marks it stale so the
/// next read refetches.
#[derive(Debug, Default)]
pub struct ThreadStore {
    threads: Option<Vec<ChatSession>>,
    profile: Option<Option<User>>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached thread list, `None` when stale
    pub fn cached(&self) -> Option<&[ChatSession]> {
        self.threads.as_deref()
    }

    pub fn is_stale(&self) -> bool {
        self.threads.is_none()
    }

    /// Drop the thread list so the next read refetches
    pub fn invalidate(&mut self) {
        self.threads = None;
    }

    /// Forget everything, e.g. after the user changes
    pub fn clear(&mut self) {
        self.threads = None;
        self.profile = None;
    }

    /// Refetch the thread list unconditionally
    pub async fn refresh<C>(&mut self, client: &C) -> Result<&[ChatSession]>
    where
        C: HistoryClient + ?Sized,
    {
        let threads = client.list_threads().await?;
        tracing::debug!(count = threads.len(), "thread list refreshed");
        Ok(self.threads.insert(threads).as_slice())
    }

    /// Thread list, fetched only when stale
    pub async fn threads<C>(&mut self, client: &C) -> Result<&[ChatSession]>
    where
        C: HistoryClient + ?Sized,
    {
        if self.threads.is_none() {
            return self.refresh(client).await;
        }
        Ok(self.threads.as_deref().unwrap_or_default())
    }

    /// Patch a title in place; returns whether the thread was cached
    pub fn rename(&mut self, thread_id: &str, title: &str) -> bool {
        match self.find_mut(thread_id) {
            Some(thread) => {
                thread.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Drop a thread from the cached list
    pub fn remove(&mut self, thread_id: &str) -> Option<ChatSession> {
        let threads = self.threads.as_mut()?;
        let index = threads.iter().position(|t| t.id == thread_id)?;
        Some(threads.remove(index))
    }

    pub fn find(&self, thread_id: &str) -> Option<&ChatSession> {
        self.threads.as_ref()?.iter().find(|t| t.id == thread_id)
    }

    fn find_mut(&mut self, thread_id: &str) -> Option<&mut ChatSession> {
        self.threads.as_mut()?.iter_mut().find(|t| t.id == thread_id)
    }

    /// Cached profile: outer `None` means never fetched
    pub fn cached_profile(&self) -> Option<Option<&User>> {
        self.profile.as_ref().map(Option::as_ref)
    }

    pub fn set_profile(&mut self, user: Option<User>) {
        self.profile = Some(user);
    }

    /// Signed-in user, fetched once and then served from cache
    pub async fn profile<C>(&mut self, client: &C) -> Result<Option<&User>>
    where
        C: AccountClient + ?Sized,
    {
        if self.profile.is_none() {
            let user = client.get_profile().await?;
            self.profile = Some(user);
        }
        Ok(self.profile.as_ref().and_then(Option::as_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> ThreadStore {
        let mut store = ThreadStore::new();
        store.threads = Some(vec![
            ChatSession::new("t1", "First"),
            ChatSession::new("t2", "Second"),
        ]);
        store
    }

    #[test]
    fn test_new_store_is_stale() {
        let store = ThreadStore::new();
        assert!(store.is_stale());
        assert!(store.cached().is_none());
        assert!(store.cached_profile().is_none());
    }

    #[test]
    fn test_rename_patches_cached_title() {
        let mut store = seeded();

        assert!(store.rename("t2", "Renamed"));
        assert!(!store.rename("missing", "x"));

        assert_eq!(store.find("t2").map(|t| t.title.as_str()), Some("Renamed"));
    }

    #[test]
    fn test_remove_thread() {
        let mut store = seeded();

        let removed = store.remove("t1");

        assert_eq!(removed.map(|t| t.id), Some("t1".to_string()));
        assert_eq!(store.cached().map(|t| t.len()), Some(1));
        assert!(store.remove("t1").is_none());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut store = seeded();
        store.set_profile(None);

        store.invalidate();
        assert!(store.is_stale());
        assert_eq!(store.cached_profile(), Some(None));

        store.clear();
        assert!(store.cached_profile().is_none());
    }
}
