//! Resources View
//!
//! Editable form over the status document. The form hydrates from the live
//! subscription; a submit writes the whole form back with a server-assigned
//! `lastUpdated`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{status_key, Notification, ViewError};
use crate::model::{ModelError, ResourceField, ResourceForm, LAST_UPDATED_FIELD};
use crate::store::{DocumentSnapshot, DocumentStore, DocumentWrite, Precondition, Subscription};

/// How a submit treats writes made since the form was hydrated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Overwrite unconditionally
    #[default]
    LastWriteWins,
    /// Fail if the document moved past the hydrated version
    RejectStale,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::LastWriteWins => f.write_str("last_write_wins"),
            ConflictPolicy::RejectStale => f.write_str("reject_stale"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last_write_wins" => Ok(ConflictPolicy::LastWriteWins),
            "reject_stale" => Ok(ConflictPolicy::RejectStale),
            other => Err(format!("unknown conflict policy: {}", other)),
        }
    }
}

impl ConflictPolicy {
    /// Write precondition for a form hydrated at `base_version`
    pub fn precondition(&self, base_version: u64) -> Precondition {
        match self {
            ConflictPolicy::LastWriteWins => Precondition::None,
            ConflictPolicy::RejectStale => Precondition::Version(base_version),
        }
    }
}

pub const SUCCESS_TITLE: &str = "Success";
pub const SUCCESS_DESCRIPTION: &str = "Hospital resources updated successfully";
pub const FAILURE_TITLE: &str = "Error";
pub const FAILURE_DESCRIPTION: &str = "Failed to update resources";

/// Notification for the outcome of a status write
pub fn submit_notification<T>(result: &Result<T, ViewError>) -> Notification {
    match result {
        Ok(_) => Notification::success(SUCCESS_TITLE, SUCCESS_DESCRIPTION),
        Err(_) => Notification::error(FAILURE_TITLE, FAILURE_DESCRIPTION),
    }
}

/// Replace the status document with the form values.
///
/// `lastUpdated` is always assigned by the store.
pub async fn write_status(
    store: &dyn DocumentStore,
    form: &ResourceForm,
    precondition: Precondition,
) -> Result<DocumentSnapshot, ViewError> {
    let mut write = DocumentWrite::new(form.to_document()?).server_timestamp(LAST_UPDATED_FIELD);
    write.precondition = precondition;

    let snapshot = store.set(&status_key(), write).await?;
    tracing::info!(version = snapshot.version, "Hospital resources updated");
    Ok(snapshot)
}

/// Local state of a mounted resources form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourcesState {
    pub form: ResourceForm,
    pub submitting: bool,
    /// Version of the last snapshot the form hydrated from (0 = none)
    pub base_version: u64,
}

/// A mounted resources form
pub struct ResourcesView {
    store: Arc<dyn DocumentStore>,
    policy: ConflictPolicy,
    state: Arc<watch::Sender<ResourcesState>>,
    task: Option<JoinHandle<()>>,
}

impl ResourcesView {
    /// Open the subscription and start hydrating the form
    pub async fn mount(store: Arc<dyn DocumentStore>, policy: ConflictPolicy) -> Self {
        let state = Arc::new(watch::Sender::new(ResourcesState::default()));

        let task = match store.subscribe(&status_key()).await {
            Ok(subscription) => Some(tokio::spawn(hydrate(subscription, Arc::clone(&state)))),
            Err(e) => {
                tracing::error!(error = %e, "Error subscribing to hospital data");
                None
            }
        };

        Self {
            store,
            policy,
            state,
            task,
        }
    }

    pub fn state(&self) -> ResourcesState {
        self.state.borrow().clone()
    }

    pub fn form(&self) -> ResourceForm {
        self.state.borrow().form.clone()
    }

    /// A receiver that observes every state change until unmount
    pub fn watch(&self) -> watch::Receiver<ResourcesState> {
        self.state.subscribe()
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Set one field from raw input
    pub fn edit(&self, field: ResourceField, input: &str) {
        self.state
            .send_modify(|s| s.form = s.form.with_input(field, input));
    }

    /// Set one field addressed by path, e.g. `bloodUnits.O-`
    pub fn edit_path(&self, path: &str, input: &str) -> Result<(), ModelError> {
        let field = path.parse()?;
        self.edit(field, input);
        Ok(())
    }

    /// Write the form to the status document.
    ///
    /// Returns `None` if a submit is already in flight.
    pub async fn submit(&self) -> Option<Notification> {
        let mut pending = None;
        self.state.send_if_modified(|s| {
            if s.submitting {
                return false;
            }
            s.submitting = true;
            pending = Some((s.form.clone(), s.base_version));
            true
        });
        let (form, base_version) = pending?;

        let result = write_status(
            self.store.as_ref(),
            &form,
            self.policy.precondition(base_version),
        )
        .await;

        self.state.send_modify(|s| {
            s.submitting = false;
            if let Ok(snapshot) = &result {
                s.base_version = s.base_version.max(snapshot.version);
            }
        });

        if let Err(e) = &result {
            tracing::error!(error = %e, "Error updating resources");
        }
        Some(submit_notification(&result))
    }

    /// Release the subscription
    pub async fn unmount(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        tracing::debug!("Resources unmounted");
    }
}

impl Drop for ResourcesView {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn hydrate(mut subscription: Subscription, state: Arc<watch::Sender<ResourcesState>>) {
    loop {
        let snapshot = match subscription.next().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching hospital data");
                break;
            }
        };

        // Missing document: keep the local form as it is
        let Some(data) = snapshot.data.as_ref() else {
            continue;
        };

        state.send_modify(|s| match s.form.hydrate(data) {
            Ok(form) => {
                s.form = form;
                s.base_version = snapshot.version;
            }
            Err(e) => {
                tracing::error!(error = %e, version = snapshot.version, "Error decoding hospital data");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BloodType, HospitalStatus};
    use crate::store::SqliteDocumentStore;
    use crate::views::testing::FailingStore;
    use crate::views::NotificationVariant;
    use serde_json::json;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(SqliteDocumentStore::open_in_memory().unwrap())
    }

    async fn seed(store: &Arc<dyn DocumentStore>, value: serde_json::Value) -> u64 {
        let body = value.as_object().cloned().unwrap();
        store
            .set(
                &status_key(),
                DocumentWrite::new(body).server_timestamp(LAST_UPDATED_FIELD),
            )
            .await
            .unwrap()
            .version
    }

    async fn wait_for_version(view: &ResourcesView, version: u64) {
        let mut rx = view.watch();
        while rx.borrow_and_update().base_version < version {
            rx.changed().await.unwrap();
        }
    }

    async fn stored(store: &Arc<dyn DocumentStore>) -> serde_json::Value {
        store.get(&status_key()).await.unwrap().data.unwrap()
    }

    #[tokio::test]
    async fn test_initial_form_is_zero() {
        let view = ResourcesView::mount(store(), ConflictPolicy::default()).await;
        let state = view.state();
        assert_eq!(state.form, ResourceForm::default());
        assert!(!state.submitting);
        for field in ResourceField::all() {
            assert_eq!(state.form.get(field), 0);
        }
    }

    #[tokio::test]
    async fn test_hydrates_from_document() {
        let store = store();
        let version = seed(
            &store,
            json!({
                "bloodUnits": {"A+": 10, "O-": 2},
                "oxygenCylinders": 5,
                "icuBeds": 3,
                "generalBeds": 20,
                "doctorsAvailable": 4
            }),
        )
        .await;

        let view = ResourcesView::mount(Arc::clone(&store), ConflictPolicy::default()).await;
        wait_for_version(&view, version).await;

        let form = view.form();
        assert_eq!(form.blood_units.get(BloodType::APositive), 10);
        assert_eq!(form.blood_units.get(BloodType::ONegative), 2);
        assert_eq!(form.blood_units.get(BloodType::BPositive), 0);
        assert_eq!(form.oxygen_cylinders, 5);
        assert_eq!(form.general_beds, 20);
    }

    #[tokio::test]
    async fn test_edit_coerces_input() {
        let view = ResourcesView::mount(store(), ConflictPolicy::default()).await;

        view.edit(ResourceField::IcuBeds, "12");
        view.edit(ResourceField::GeneralBeds, "abc");
        view.edit(ResourceField::OxygenCylinders, "-3");
        view.edit_path("bloodUnits.AB+", "7 units").unwrap();

        let form = view.form();
        assert_eq!(form.icu_beds, 12);
        assert_eq!(form.general_beds, 0);
        assert_eq!(form.oxygen_cylinders, -3);
        assert_eq!(form.blood_units.get(BloodType::AbPositive), 7);

        assert!(matches!(
            view.edit_path("ventilators", "1"),
            Err(ModelError::UnknownField(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_writes_full_form_with_timestamp() {
        let store = store();
        let version = seed(&store, json!({"icuBeds": 1, "extraField": true})).await;

        let view = ResourcesView::mount(Arc::clone(&store), ConflictPolicy::default()).await;
        wait_for_version(&view, version).await;

        view.edit(ResourceField::IcuBeds, "8");
        view.edit(ResourceField::BloodUnits(BloodType::ONegative), "4");

        let notification = view.submit().await.unwrap();
        assert_eq!(notification.title, "Success");
        assert_eq!(notification.description, "Hospital resources updated successfully");
        assert_eq!(notification.variant, NotificationVariant::Default);
        assert!(!view.state().submitting);

        let data = stored(&store).await;
        assert_eq!(data["icuBeds"], 8);
        assert_eq!(data["bloodUnits"]["O-"], 4);
        assert_eq!(data["bloodUnits"].as_object().unwrap().len(), 8);
        assert!(data.get("extraField").is_none());
        assert!(data["lastUpdated"].is_string());

        let status = HospitalStatus::from_document(&data).unwrap();
        assert!(status.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_submit_failure_notifies_and_keeps_form() {
        let view = ResourcesView::mount(Arc::new(FailingStore), ConflictPolicy::default()).await;
        view.edit(ResourceField::DoctorsAvailable, "6");

        let notification = view.submit().await.unwrap();
        assert_eq!(notification.title, "Error");
        assert_eq!(notification.description, "Failed to update resources");
        assert!(notification.is_error());

        let state = view.state();
        assert!(!state.submitting);
        assert_eq!(state.form.doctors_available, 6);
    }

    #[tokio::test]
    async fn test_other_writer_overwrites_form() {
        let store = store();
        let view = ResourcesView::mount(Arc::clone(&store), ConflictPolicy::default()).await;
        view.edit(ResourceField::IcuBeds, "99");

        let version = seed(&store, json!({"icuBeds": 2, "bloodUnits": {"B+": 3}})).await;
        wait_for_version(&view, version).await;

        let form = view.form();
        assert_eq!(form.icu_beds, 2);
        assert_eq!(form.blood_units.get(BloodType::BPositive), 3);
    }

    #[tokio::test]
    async fn test_document_without_blood_units_keeps_local_counts() {
        let store = store();
        let view = ResourcesView::mount(Arc::clone(&store), ConflictPolicy::default()).await;
        view.edit(ResourceField::BloodUnits(BloodType::APositive), "11");

        let version = seed(&store, json!({"icuBeds": 5})).await;
        wait_for_version(&view, version).await;

        let form = view.form();
        assert_eq!(form.icu_beds, 5);
        assert_eq!(form.blood_units.get(BloodType::APositive), 11);
    }

    #[tokio::test]
    async fn test_reject_stale_policy() {
        let store = store();
        let version = seed(&store, json!({"icuBeds": 1})).await;

        let mut view = ResourcesView::mount(Arc::clone(&store), ConflictPolicy::RejectStale).await;
        wait_for_version(&view, version).await;

        // Submitting from a fresh form succeeds and advances the base version
        view.edit(ResourceField::IcuBeds, "2");
        assert!(!view.submit().await.unwrap().is_error());
        assert_eq!(view.state().base_version, version + 1);

        // Stop hydration so the next external write goes unseen
        if let Some(task) = view.task.take() {
            task.abort();
            let _ = task.await;
        }
        seed(&store, json!({"icuBeds": 30})).await;

        view.edit(ResourceField::IcuBeds, "3");
        let notification = view.submit().await.unwrap();
        assert!(notification.is_error());
        assert_eq!(notification.description, "Failed to update resources");
        assert_eq!(stored(&store).await["icuBeds"], 30);
        assert_eq!(view.form().icu_beds, 3);
    }

    #[tokio::test]
    async fn test_reject_stale_conflict_fails_write() {
        let store = store();
        seed(&store, json!({"icuBeds": 1})).await;

        let form = ResourceForm::default().with_input(ResourceField::IcuBeds, "4");
        let result = write_status(
            store.as_ref(),
            &form,
            ConflictPolicy::RejectStale.precondition(0),
        )
        .await;

        assert!(matches!(result, Err(ViewError::Store(_))));
        assert!(submit_notification(&result).is_error());
        assert_eq!(stored(&store).await["icuBeds"], 1);
    }

    #[tokio::test]
    async fn test_last_write_wins_ignores_version() {
        let store = store();
        seed(&store, json!({"icuBeds": 1})).await;

        let form = ResourceForm::default().with_input(ResourceField::IcuBeds, "4");
        let snapshot = write_status(
            store.as_ref(),
            &form,
            ConflictPolicy::LastWriteWins.precondition(0),
        )
        .await
        .unwrap();

        assert_eq!(snapshot.version, 2);
        assert_eq!(stored(&store).await["icuBeds"], 4);
    }

    #[tokio::test]
    async fn test_unmount_releases_subscription() {
        let store = store();
        let view = ResourcesView::mount(Arc::clone(&store), ConflictPolicy::default()).await;
        assert_eq!(store.active_subscriptions(&status_key()), 1);

        view.unmount().await;
        assert_eq!(store.active_subscriptions(&status_key()), 0);
    }

    #[test]
    fn test_conflict_policy_parse() {
        assert_eq!(
            "reject_stale".parse::<ConflictPolicy>().unwrap(),
            ConflictPolicy::RejectStale
        );
        assert_eq!(
            " LAST_WRITE_WINS ".parse::<ConflictPolicy>().unwrap(),
            ConflictPolicy::LastWriteWins
        );
        assert!("optimistic".parse::<ConflictPolicy>().is_err());
        assert_eq!(ConflictPolicy::RejectStale.to_string(), "reject_stale");
    }
}
