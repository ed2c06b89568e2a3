//! Wires the client together from configuration

use crate::auth::AuthClient;
use crate::contact::ContactClient;
use crate::http::ApiClient;
use crate::notify::Notifier;
use crate::poller::{PollHandle, Poller};
use crate::service::ServiceController;
use crate::session::SessionStore;
use crate::vm::{StatusSweep, VmController};
use cloudpanel_common::{ClientConfig, KeyValueStore, Result, SqliteStore};
use std::sync::Arc;
use tracing::info;

/// Everything a host UI needs to drive the control panel
pub struct Panel {
    config: ClientConfig,
    api: ApiClient,
    session: SessionStore,
    auth: AuthClient,
    contact: ContactClient,
    vms: Arc<VmController>,
    services: Arc<ServiceController>,
    sweep: Arc<StatusSweep>,
}

impl Panel {
    /// Open with the reqwest transport and the on-disk session store
    pub fn open(config: ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let api = ApiClient::from_config(&config)?;
        let storage = SqliteStore::open(config.session_db_path())?;
        Self::with_parts(config, api, Arc::new(storage), notifier)
    }

    pub fn with_parts(
        config: ClientConfig,
        api: ApiClient,
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let session = SessionStore::load(storage)?;
        let auth = AuthClient::new(api.clone(), session.clone(), notifier.clone());
        let contact = ContactClient::new(api.clone(), notifier.clone());
        let vms = Arc::new(VmController::new(
            api.clone(),
            session.clone(),
            notifier.clone(),
        ));
        let services = Arc::new(ServiceController::new(api.clone(), session.clone(), notifier));
        let sweep = Arc::new(StatusSweep(vms.clone()));

        info!("CloudPanel client ready (API: {})", api.base_url());
        Ok(Self {
            config,
            api,
            session,
            auth,
            contact,
            vms,
            services,
            sweep,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn contact(&self) -> &ContactClient {
        &self.contact
    }

    pub fn vms(&self) -> &Arc<VmController> {
        &self.vms
    }

    pub fn services(&self) -> &Arc<ServiceController> {
        &self.services
    }

    /// Refresh the VM list every poll interval
    pub fn poll_vms(&self) -> PollHandle {
        Poller::new(&self.vms, self.config.poll_interval()).start()
    }

    pub fn poll_services(&self) -> PollHandle {
        Poller::new(&self.services, self.config.poll_interval()).start()
    }

    /// Refresh each displayed VM's status every poll interval
    pub fn poll_vm_statuses(&self) -> PollHandle {
        Poller::new(&self.sweep, self.config.poll_interval()).start()
    }
}
