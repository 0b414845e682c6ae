use std::{
    collections::HashSet,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Duration, Instant},
};

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::crm::UserDirectory;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

// ============== Username Normalization ==============

/// Strip one leading `@` and lowercase.
///
/// Applied to the queried username and to every directory entry alike.
pub fn normalize_username(raw: &str) -> String {
    raw.strip_prefix('@').unwrap_or(raw).to_lowercase()
}

// ============== Allow-list Cache ==============

#[derive(Debug, Default)]
struct Snapshot {
    users: HashSet<String>,
    refreshed_at: Option<Instant>,
}

/// Usernames allowed to use the bot, pulled from the CRM user directory.
///
/// The set is refreshed lazily: a query that arrives more than `interval`
/// after the last successful refresh fetches the directory first. Any refresh
/// failure empties the set (fail-closed) and leaves the timestamp alone, so
/// the next query tries again.
pub struct AllowList {
    directory: Arc<dyn UserDirectory>,
    interval: Duration,
    state: RwLock<Snapshot>,
    // Single flight: at most one directory call at a time.
    refresh_lock: Mutex<()>,
}

impl AllowList {
    pub fn new(directory: Arc<dyn UserDirectory>, interval: Duration) -> Self {
        Self {
            directory,
            interval,
            state: RwLock::new(Snapshot::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn is_authorized(&self, username: Option<&str>) -> bool {
        self.is_authorized_at(username, Instant::now()).await
    }

    pub async fn is_authorized_at(&self, username: Option<&str>, now: Instant) -> bool {
        if self.is_stale(now) {
            self.refresh_if_stale(now).await;
        }

        let Some(raw) = username.filter(|u| !u.is_empty()) else {
            warn!("user without a username tried to access the bot");
            return false;
        };

        let normalized = normalize_username(raw);
        if normalized.is_empty() {
            return false;
        }

        let state = self.read();
        if state.users.is_empty() {
            warn!(username = raw, "allow-list is empty; access denied");
            return false;
        }

        let allowed = state.users.contains(&normalized);
        if allowed {
            debug!(username = raw, "authorized");
        } else {
            warn!(username = raw, normalized = %normalized, "not in allow-list");
        }
        allowed
    }

    pub async fn refresh(&self) {
        self.refresh_at(Instant::now()).await;
    }

    pub async fn refresh_at(&self, now: Instant) {
        let _guard = self.refresh_lock.lock().await;
        self.fetch(now).await;
    }

    /// Number of cached usernames.
    pub fn len(&self) -> usize {
        self.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted copy of the normalized set.
    pub fn snapshot(&self) -> Vec<String> {
        let mut users: Vec<String> = self.read().users.iter().cloned().collect();
        users.sort();
        users
    }

    fn is_stale(&self, now: Instant) -> bool {
        match self.read().refreshed_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) > self.interval,
        }
    }

    async fn refresh_if_stale(&self, now: Instant) {
        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited for the lock.
        if !self.is_stale(now) {
            return;
        }
        self.fetch(now).await;
    }

    // Caller holds `refresh_lock`.
    async fn fetch(&self, now: Instant) {
        match self.directory.allowed_users().await {
            Ok(resp) => match resp.allowed_users {
                Some(list) => {
                    let users: HashSet<String> = list
                        .iter()
                        .map(|u| normalize_username(u))
                        .filter(|u| !u.is_empty())
                        .collect();
                    info!(count = users.len(), "allow-list refreshed from CRM");
                    let mut state = self.write();
                    state.users = users;
                    state.refreshed_at = Some(now);
                }
                None => {
                    warn!("CRM returned no allow-list; access denied for everyone");
                    self.write().users.clear();
                }
            },
            Err(e) => {
                error!(error = %e, "allow-list refresh failed; access denied for everyone");
                self.write().users.clear();
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crm::models::AllowedUsersResponse, errors::Error, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeDirectory {
        users: std::sync::Mutex<Option<Vec<String>>>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeDirectory {
        fn with(users: &[&str]) -> Arc<Self> {
            let d = Self::default();
            *d.users.lock().unwrap() = Some(users.iter().map(|s| s.to_string()).collect());
            Arc::new(d)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn allowed_users(&self) -> Result<AllowedUsersResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Api {
                    status: 503,
                    body: "down".to_string(),
                });
            }
            let allowed_users = self.users.lock().unwrap().clone();
            Ok(AllowedUsersResponse {
                count: allowed_users.as_ref().map_or(0, |u| u.len() as i64),
                allowed_users,
            })
        }
    }

    const MIN: Duration = Duration::from_secs(60);

    #[test]
    fn normalization_strips_one_at_and_lowercases() {
        assert_eq!(normalize_username("@Alice"), "alice");
        assert_eq!(normalize_username("ALICE"), "alice");
        assert_eq!(normalize_username("@@alice"), "@alice");
        assert_eq!(normalize_username("@"), "");
    }

    #[tokio::test]
    async fn username_forms_are_equivalent() {
        let dir = FakeDirectory::with(&["@Alice", "bob"]);
        let list = AllowList::new(dir, DEFAULT_REFRESH_INTERVAL);
        let now = Instant::now();

        for u in ["alice", "@alice", "ALICE", "@ALICE", "Bob", "@bob", "BOB"] {
            assert!(list.is_authorized_at(Some(u), now).await, "{u}");
        }
        assert!(!list.is_authorized_at(Some("carol"), now).await);
        assert!(!list.is_authorized_at(Some("@@alice"), now).await);
    }

    #[tokio::test]
    async fn missing_or_empty_username_is_denied() {
        let dir = FakeDirectory::with(&["alice", ""]);
        let list = AllowList::new(dir, DEFAULT_REFRESH_INTERVAL);
        let now = Instant::now();

        assert!(!list.is_authorized_at(None, now).await);
        assert!(!list.is_authorized_at(Some(""), now).await);
        assert!(!list.is_authorized_at(Some("@"), now).await);
        assert_eq!(list.snapshot(), vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn empty_directory_denies_everyone() {
        let dir = FakeDirectory::with(&[]);
        let list = AllowList::new(dir, DEFAULT_REFRESH_INTERVAL);
        assert!(!list.is_authorized(Some("alice")).await);
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn served_from_memory_within_interval() {
        let dir = FakeDirectory::with(&["alice"]);
        let list = AllowList::new(dir.clone(), 5 * MIN);
        let start = Instant::now();

        assert!(list.is_authorized_at(Some("alice"), start).await);
        assert!(list.is_authorized_at(Some("alice"), start + MIN).await);
        assert!(!list.is_authorized_at(Some("bob"), start + 5 * MIN).await);
        assert_eq!(dir.calls(), 1);

        *dir.users.lock().unwrap() = Some(vec!["bob".to_string()]);
        assert!(list.is_authorized_at(Some("bob"), start + 6 * MIN).await);
        assert!(!list.is_authorized_at(Some("alice"), start + 6 * MIN).await);
        assert_eq!(dir.calls(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_fails_closed_and_retries() {
        let dir = FakeDirectory::with(&["alice"]);
        let list = AllowList::new(dir.clone(), 5 * MIN);
        let start = Instant::now();
        assert!(list.is_authorized_at(Some("alice"), start).await);

        dir.fail.store(true, Ordering::SeqCst);
        let later = start + 6 * MIN;
        assert!(!list.is_authorized_at(Some("alice"), later).await);
        assert!(list.is_empty());

        // Timestamp not advanced by the failure: the next query fetches again.
        dir.fail.store(false, Ordering::SeqCst);
        assert!(list.is_authorized_at(Some("alice"), later).await);
        assert_eq!(dir.calls(), 3);
    }

    #[tokio::test]
    async fn null_list_clears_cache() {
        let dir = FakeDirectory::with(&["alice"]);
        let list = AllowList::new(dir.clone(), 5 * MIN);
        let start = Instant::now();
        assert!(list.is_authorized_at(Some("alice"), start).await);

        *dir.users.lock().unwrap() = None;
        list.refresh_at(start + MIN).await;
        assert!(!list.is_authorized_at(Some("alice"), start + MIN).await);
    }

    #[tokio::test]
    async fn concurrent_stale_queries_fetch_once() {
        let dir = FakeDirectory::with(&["alice"]);
        let list = AllowList::new(dir.clone(), 5 * MIN);
        let now = Instant::now();

        let (a, b, c) = tokio::join!(
            list.is_authorized_at(Some("alice"), now),
            list.is_authorized_at(Some("@Alice"), now),
            list.is_authorized_at(Some("mallory"), now),
        );
        assert!(a && b && !c);
        assert_eq!(dir.calls(), 1);
    }
}
