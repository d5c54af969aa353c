//! Application state shared by the clock loop and the HTTP API.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::attendance::AttendanceEvent;
use crate::roster::{AccountError, Directory, Role, StaffMember};

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub directory: Directory,
    /// Newest first.
    pub events: Vec<AttendanceEvent>,
}

impl AppState {
    pub fn new(directory: Directory) -> Self {
        Self {
            directory,
            events: Vec::new(),
        }
    }
}

/// Replace the event with the same id, or put a new one at the front.
pub fn upsert_event(state: AppState, event: AttendanceEvent) -> AppState {
    let mut events = state.events;
    match events.iter().position(|e| e.id == event.id) {
        Some(index) => {
            debug!("Replacing record {} (pending: {})", event.id, event.pending);
            events[index] = event;
        }
        None => {
            debug!("Adding record {} for {}", event.id, event.staff_name);
            events.insert(0, event);
        }
    }
    AppState { events, ..state }
}

#[derive(Clone, Default)]
pub struct StateHandle {
    inner: Arc<Mutex<AppState>>,
}

impl StateHandle {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn snapshot(&self) -> AppState {
        self.inner.lock().await.clone()
    }

    pub async fn upsert(&self, event: AttendanceEvent) {
        let mut state = self.inner.lock().await;
        let current = std::mem::take(&mut *state);
        *state = upsert_event(current, event);
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<StaffMember, AccountError> {
        self.inner.lock().await.directory.login(username, password)
    }

    /// Credentials of a staff member allowed to clock in or out.
    pub async fn clocking_member(
        &self,
        username: &str,
        password: &str,
    ) -> Result<StaffMember, AccountError> {
        self.inner
            .lock()
            .await
            .directory
            .authorize(username, password, Role::Staff, "clock in or out")
    }

    pub async fn register_admin(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<StaffMember, AccountError> {
        let mut state = self.inner.lock().await;
        state.directory.register_admin(username, password, display_name)
    }

    /// Add a staff member on behalf of the admin identified by
    /// `admin_username` / `admin_password`.
    pub async fn add_staff(
        &self,
        admin_username: &str,
        admin_password: &str,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<StaffMember, AccountError> {
        let mut state = self.inner.lock().await;
        state
            .directory
            .authorize(admin_username, admin_password, Role::Admin, "add staff")?;
        state.directory.add_staff(username, password, display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AttendanceKind;
    use chrono::Utc;

    fn event(name: &str) -> AttendanceEvent {
        AttendanceEvent::provisional(name, AttendanceKind::ClockIn, String::new(), Utc::now())
    }

    #[test]
    fn test_upsert_prepends_new_events() {
        let first = event("Alex Chen");
        let second = event("Sarah Jones");

        let state = upsert_event(AppState::default(), first.clone());
        let state = upsert_event(state, second.clone());

        assert_eq!(state.events.len(), 2);
        assert_eq!(state.events[0].id, second.id);
        assert_eq!(state.events[1].id, first.id);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let first = event("Alex Chen");
        let second = event("Sarah Jones");
        let state = upsert_event(AppState::default(), first.clone());
        let state = upsert_event(state, second.clone());

        let state = upsert_event(state, first.clone().enriched("Hi".to_string(), None));

        assert_eq!(state.events.len(), 2);
        assert_eq!(state.events[1].id, first.id);
        assert!(!state.events[1].pending);
        assert_eq!(state.events[0].id, second.id);
    }

    #[tokio::test]
    async fn test_only_staff_can_clock() {
        let handle = StateHandle::new(AppState::new(Directory::with_defaults()));

        assert_eq!(
            handle.clocking_member("staff", "wrong").await.unwrap_err(),
            AccountError::InvalidCredentials
        );
        assert!(matches!(
            handle.clocking_member("admin", "admin").await,
            Err(AccountError::NotPermitted(_))
        ));
        let member = handle.clocking_member("staff", "staff").await.unwrap();
        assert_eq!(member.display_name, "Alex Chen");
    }

    #[tokio::test]
    async fn test_add_staff_requires_admin() {
        let handle = StateHandle::new(AppState::new(Directory::with_defaults()));

        assert!(matches!(
            handle
                .add_staff("staff", "staff", "sam", "pw", "Sam Ortiz")
                .await,
            Err(AccountError::NotPermitted(_))
        ));
        assert_eq!(
            handle
                .add_staff("admin", "nope", "sam", "pw", "Sam Ortiz")
                .await
                .unwrap_err(),
            AccountError::InvalidCredentials
        );
        assert_eq!(handle.snapshot().await.directory.staff().len(), 1);

        let sam = handle
            .add_staff("admin", "admin", "sam", "pw", "Sam Ortiz")
            .await
            .unwrap();
        assert_eq!(sam.role, Role::Staff);
        assert_eq!(handle.snapshot().await.directory.staff().len(), 2);
    }

    #[tokio::test]
    async fn test_registered_admin_can_add_staff() {
        let handle = StateHandle::new(AppState::new(Directory::with_defaults()));
        let boss = handle.register_admin("boss", "pw", "The Boss").await.unwrap();
        assert_eq!(boss.role, Role::Admin);

        handle
            .add_staff("boss", "pw", "mike", "pw", "Mike Ross")
            .await
            .unwrap();
        assert!(handle.login("mike", "pw").await.is_ok());
    }
}
