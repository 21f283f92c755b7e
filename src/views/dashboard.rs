//! Dashboard View
//!
//! Read-only view of the status document. Holds one live subscription for as
//! long as it is mounted and republishes derived metrics on every snapshot.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::status_key;
use crate::auth::User;
use crate::model::HospitalStatus;
use crate::store::{DocumentStore, Subscription};

/// Shown when the document has never been written
pub const NEVER_UPDATED: &str = "Never";

/// Local state of a mounted dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    /// Last decoded document, `None` until one exists
    pub status: Option<HospitalStatus>,
    pub loading: bool,
}

impl DashboardState {
    fn loading() -> Self {
        Self {
            status: None,
            loading: true,
        }
    }

    /// Metrics derived from the current state, zeroed without a document
    pub fn metrics(&self) -> DashboardMetrics {
        let Some(status) = &self.status else {
            return DashboardMetrics {
                total_blood_units: 0,
                oxygen_cylinders: 0,
                total_beds: 0,
                icu_beds: 0,
                general_beds: 0,
                doctors_available: 0,
                blood_units: Vec::new(),
                last_updated: NEVER_UPDATED.to_string(),
            };
        };

        DashboardMetrics {
            total_blood_units: status.total_blood_units(),
            oxygen_cylinders: status.oxygen_cylinders,
            total_beds: status.total_beds(),
            icu_beds: status.icu_beds,
            general_beds: status.general_beds,
            doctors_available: status.doctors_available,
            blood_units: status
                .blood_units
                .iter()
                .map(|(t, units)| BloodUnitCount {
                    blood_type: t.as_str().to_string(),
                    units,
                })
                .collect(),
            last_updated: format_last_updated(status.last_updated),
        }
    }
}

/// What the dashboard displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub total_blood_units: i64,
    pub oxygen_cylinders: i64,
    pub total_beds: i64,
    pub icu_beds: i64,
    pub general_beds: i64,
    pub doctors_available: i64,
    /// Per-type breakdown in display order, empty without a document
    pub blood_units: Vec<BloodUnitCount>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BloodUnitCount {
    pub blood_type: String,
    pub units: i64,
}

/// Local-time display of the last update, or "Never"
pub fn format_last_updated(last_updated: Option<DateTime<Utc>>) -> String {
    match last_updated {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => NEVER_UPDATED.to_string(),
    }
}

/// Dashboard header line for the signed-in user
pub fn greeting(user: &User) -> String {
    format!("Welcome back, {}", user.display_name())
}

/// A mounted dashboard
pub struct DashboardView {
    state: watch::Receiver<DashboardState>,
    task: Option<JoinHandle<()>>,
}

impl DashboardView {
    /// Open the subscription and start following the status document
    pub async fn mount(store: Arc<dyn DocumentStore>) -> Self {
        let (tx, rx) = watch::channel(DashboardState::loading());

        let task = match store.subscribe(&status_key()).await {
            Ok(subscription) => Some(tokio::spawn(follow(subscription, tx))),
            Err(e) => {
                tracing::error!(error = %e, "Error fetching hospital data");
                tx.send_modify(|s| s.loading = false);
                None
            }
        };

        Self { state: rx, task }
    }

    /// Current state
    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every state change until unmount
    pub fn watch(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    /// Wait for the next state change. Returns false once unmounted or the
    /// subscription has ended.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    /// Release the subscription
    pub async fn unmount(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        tracing::debug!("Dashboard unmounted");
    }
}

impl Drop for DashboardView {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn follow(mut subscription: Subscription, tx: watch::Sender<DashboardState>) {
    loop {
        match subscription.next().await {
            Ok(snapshot) => {
                let decoded = snapshot
                    .data
                    .as_ref()
                    .map(HospitalStatus::from_document)
                    .transpose();

                match decoded {
                    Ok(status) => tx.send_modify(|s| {
                        // A missing document keeps whatever was shown before
                        if status.is_some() {
                            s.status = status;
                        }
                        s.loading = false;
                    }),
                    Err(e) => {
                        tracing::error!(error = %e, version = snapshot.version, "Error decoding hospital data");
                        tx.send_modify(|s| s.loading = false);
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching hospital data");
                tx.send_modify(|s| s.loading = false);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BloodType;
    use crate::store::{DocumentWrite, SqliteDocumentStore};
    use crate::views::testing::FailingStore;
    use serde_json::json;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(SqliteDocumentStore::open_in_memory().unwrap())
    }

    async fn write(store: &Arc<dyn DocumentStore>, value: serde_json::Value) {
        let body = value.as_object().cloned().unwrap();
        store
            .set(
                &status_key(),
                DocumentWrite::new(body).server_timestamp("lastUpdated"),
            )
            .await
            .unwrap();
    }

    async fn settled(view: &mut DashboardView) -> DashboardState {
        while view.state().loading {
            assert!(view.changed().await);
        }
        view.state()
    }

    #[tokio::test]
    async fn test_no_document_shows_zero_and_never() {
        let store = store();
        let mut view = DashboardView::mount(Arc::clone(&store)).await;

        let state = settled(&mut view).await;
        assert!(state.status.is_none());

        let metrics = state.metrics();
        assert_eq!(metrics.total_blood_units, 0);
        assert_eq!(metrics.total_beds, 0);
        assert_eq!(metrics.oxygen_cylinders, 0);
        assert_eq!(metrics.doctors_available, 0);
        assert!(metrics.blood_units.is_empty());
        assert_eq!(metrics.last_updated, "Never");

        view.unmount().await;
    }

    #[tokio::test]
    async fn test_metrics_follow_updates() {
        let store = store();
        let mut view = DashboardView::mount(Arc::clone(&store)).await;
        settled(&mut view).await;

        write(
            &store,
            json!({
                "bloodUnits": {"A+": 5, "A-": 1, "B+": 2, "B-": 0, "O+": 7, "O-": 3, "AB+": 1, "AB-": 4},
                "oxygenCylinders": 12,
                "icuBeds": 6,
                "generalBeds": 40,
                "doctorsAvailable": 9
            }),
        )
        .await;

        assert!(view.changed().await);
        let state = view.state();
        let metrics = state.metrics();
        assert_eq!(metrics.total_blood_units, 23);
        assert_eq!(metrics.total_beds, 46);
        assert_eq!(metrics.oxygen_cylinders, 12);
        assert_eq!(metrics.doctors_available, 9);
        assert_eq!(metrics.blood_units.len(), 8);
        assert_eq!(metrics.blood_units[0].blood_type, "A+");
        assert_eq!(metrics.blood_units[0].units, 5);
        assert_ne!(metrics.last_updated, "Never");
        assert_eq!(
            state.status.unwrap().blood_units.get(BloodType::AbNegative),
            4
        );
    }

    #[tokio::test]
    async fn test_one_subscription_per_mount_released_on_unmount() {
        let store = store();
        let key = status_key();

        let first = DashboardView::mount(Arc::clone(&store)).await;
        let second = DashboardView::mount(Arc::clone(&store)).await;
        assert_eq!(store.active_subscriptions(&key), 2);

        first.unmount().await;
        assert_eq!(store.active_subscriptions(&key), 1);

        drop(second);
        tokio::task::yield_now().await;
        // Aborted tasks drop their subscription once the runtime reaps them
        for _ in 0..100 {
            if store.active_subscriptions(&key) == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(store.active_subscriptions(&key), 0);
    }

    #[tokio::test]
    async fn test_no_updates_after_unmount() {
        let store = store();
        let mut view = DashboardView::mount(Arc::clone(&store)).await;
        settled(&mut view).await;

        let mut observer = view.watch();
        observer.borrow_and_update();
        view.unmount().await;

        write(&store, json!({"icuBeds": 3})).await;

        // Sender is gone: no further change can be observed
        assert!(observer.changed().await.is_err());
        assert!(observer.borrow().status.is_none());
    }

    #[tokio::test]
    async fn test_subscription_error_clears_loading() {
        let store: Arc<dyn DocumentStore> = Arc::new(FailingStore);
        let view = DashboardView::mount(store).await;

        let state = view.state();
        assert!(!state.loading);
        assert_eq!(state.metrics().last_updated, "Never");
    }

    #[tokio::test]
    async fn test_empty_document_reads_as_zeros() {
        let store = store();
        store
            .set(&status_key(), DocumentWrite::new(serde_json::Map::new()))
            .await
            .unwrap();

        let mut view = DashboardView::mount(Arc::clone(&store)).await;
        let state = settled(&mut view).await;
        assert!(!state.loading);
        assert_eq!(state.status, Some(HospitalStatus::default()));
        assert_eq!(state.metrics().total_beds, 0);
        assert_eq!(state.metrics().blood_units.len(), 8);
    }

    #[test]
    fn test_greeting() {
        assert_eq!(
            greeting(&User::new("charge.nurse@hospital.org")),
            "Welcome back, charge.nurse"
        );
    }

    #[test]
    fn test_format_last_updated() {
        assert_eq!(format_last_updated(None), "Never");
        let ts = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let formatted = format_last_updated(Some(ts));
        assert_eq!(formatted.len(), "2026-01-02 03:04:05".len());
    }
}
