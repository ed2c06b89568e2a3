//! Resource controller, generic over resource kind
//!
//! A kind supplies its endpoints, payload types and labels; the controller
//! owns the shared flow: validate payment, call, notify, refresh the list.
//! The view is only ever updated from a completed backend response.

use crate::http::{ApiClient, ApiRequest};
use crate::notify::{Notification, Notifier};
use crate::poller::Refresh;
use crate::session::{send_authorized, SessionStore};
use crate::view::{Renderable, ViewSynchronizer};
use async_trait::async_trait;
use cloudpanel_common::{Error, PaymentInfo, Result, UNKNOWN_STATUS};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Endpoints and payload shapes of one resource kind
pub trait ResourceKind: Send + Sync + 'static {
    type Record: Renderable + DeserializeOwned + Serialize + Clone + Send + Sync + 'static;
    type Create: Serialize + Send + Sync;
    type Status: DeserializeOwned + Send;

    /// Name used in user-facing messages
    const LABEL: &'static str;
    const LIST_PATH: &'static str;
    const CREATE_PATH: &'static str;

    fn delete_path(id: u64) -> String;
    fn delete_body(id: u64, payment: &PaymentInfo) -> Result<serde_json::Value>;
    fn create_payment(request: &Self::Create) -> &PaymentInfo;

    /// Id chosen by the client when creating, if the kind has one
    fn created_id(_request: &Self::Create) -> Option<u64> {
        None
    }

    /// Status endpoint, for kinds that expose one
    fn status_path(_id: u64) -> Option<String> {
        None
    }

    fn status_text(_status: &Self::Status) -> Option<String> {
        None
    }
}

/// Create/list/delete for one resource kind
pub struct ResourceController<K: ResourceKind> {
    api: ApiClient,
    session: SessionStore,
    view: Arc<ViewSynchronizer>,
    notifier: Arc<dyn Notifier>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> ResourceController<K> {
    pub fn new(api: ApiClient, session: SessionStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            session,
            view: Arc::new(ViewSynchronizer::new()),
            notifier,
            _kind: PhantomData,
        }
    }

    pub fn view(&self) -> &Arc<ViewSynchronizer> {
        &self.view
    }

    pub(crate) async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        send_authorized(&self.api, &self.session, request).await
    }

    pub(crate) fn succeed(&self, message: String) {
        self.notifier.notify(Notification::success(message));
    }

    /// Report a failure and hand it back to the caller
    pub(crate) fn fail<T>(&self, err: Error, fallback: &str) -> Result<T> {
        self.notifier
            .notify(Notification::error(err.user_message(fallback)));
        Err(err)
    }

    /// Fetch the list and show it
    pub async fn list(&self) -> Result<Vec<K::Record>> {
        let ticket = self.view.begin_list();
        match self.call::<Vec<K::Record>>(ApiRequest::get(K::LIST_PATH)).await {
            Ok(records) => {
                debug!("Fetched {} {} record(s)", records.len(), K::LABEL);
                self.view.apply_list(ticket, &records);
                Ok(records)
            }
            Err(e) => self.fail(e, &format!("Failed to fetch {} list", K::LABEL)),
        }
    }

    /// Create a resource, then refresh the list
    pub async fn create(&self, body: K::Create) -> Result<serde_json::Value> {
        let fallback = format!("Error creating {}", K::LABEL);

        if let Err(e) = K::create_payment(&body).ensure_complete() {
            return self.fail(e.into(), &fallback);
        }
        let request = match ApiRequest::post(K::CREATE_PATH).json(&body) {
            Ok(request) => request,
            Err(e) => return self.fail(e, &fallback),
        };

        let created = match self.call::<serde_json::Value>(request).await {
            Ok(created) => created,
            Err(e) => return self.fail(e, &fallback),
        };

        info!("{} created", K::LABEL);
        self.succeed(format!("{} created successfully!", K::LABEL));

        if let Some(id) = K::created_id(&body) {
            if let Some(path) = K::status_path(id) {
                if let Err(e) = self.fetch_status(id, path).await {
                    warn!("Could not fetch status of new {} {}: {}", K::LABEL, id, e);
                }
            }
        }

        // Failures are already reported by list()
        let _ = self.list().await;
        Ok(created)
    }

    /// Delete a resource, then refresh the list
    pub async fn delete(&self, id: u64, payment: &PaymentInfo) -> Result<serde_json::Value> {
        let fallback = format!("Error deleting {}", K::LABEL);

        if let Err(e) = payment.ensure_complete() {
            return self.fail(e.into(), &fallback);
        }
        let request = match K::delete_body(id, payment)
            .and_then(|body| ApiRequest::delete(K::delete_path(id)).json(&body))
        {
            Ok(request) => request,
            Err(e) => return self.fail(e, &fallback),
        };

        let confirmation = match self.call::<serde_json::Value>(request).await {
            Ok(confirmation) => confirmation,
            Err(e) => return self.fail(e, &fallback),
        };

        info!("{} {} deleted", K::LABEL, id);
        self.succeed(format!("{} deleted successfully!", K::LABEL));

        let _ = self.list().await;
        Ok(confirmation)
    }

    /// Fetch one status and feed the view's status machine; never notifies
    pub(crate) async fn fetch_status(&self, id: u64, path: String) -> Result<K::Status> {
        self.view.begin_status(id);
        match self.call::<K::Status>(ApiRequest::get(path)).await {
            Ok(status) => {
                let text = K::status_text(&status).unwrap_or_else(|| UNKNOWN_STATUS.to_string());
                self.view.status_succeeded(id, &text);
                Ok(status)
            }
            Err(e) => {
                self.view
                    .status_failed(id, &e.user_message("Error getting status"));
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<K: ResourceKind> Refresh for ResourceController<K> {
    async fn refresh(&self) -> Result<()> {
        self.list().await.map(|_| ())
    }

    fn label(&self) -> &str {
        K::LIST_PATH
    }
}
