//! Virtual machines

use crate::poller::Refresh;
use crate::resource::{ResourceController, ResourceKind};
use crate::view::{Fragment, Renderable};
use async_trait::async_trait;
use cloudpanel_common::{CreateVmRequest, PaymentInfo, Result, VirtualMachine, VmStatusReport};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct VmKind;

impl ResourceKind for VmKind {
    type Record = VirtualMachine;
    type Create = CreateVmRequest;
    type Status = VmStatusReport;

    const LABEL: &'static str = "VM";
    const LIST_PATH: &'static str = "/vm-list";
    const CREATE_PATH: &'static str = "/create-vm";

    fn delete_path(id: u64) -> String {
        format!("/delete-vm/{}", id)
    }

    fn delete_body(_id: u64, payment: &PaymentInfo) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(payment)?)
    }

    fn create_payment(request: &CreateVmRequest) -> &PaymentInfo {
        &request.payment_info
    }

    fn created_id(request: &CreateVmRequest) -> Option<u64> {
        Some(u64::from(request.vmid))
    }

    fn status_path(id: u64) -> Option<String> {
        Some(format!("/vm-status/{}", id))
    }

    fn status_text(status: &VmStatusReport) -> Option<String> {
        status.status.clone()
    }
}

impl Renderable for VirtualMachine {
    fn id(&self) -> u64 {
        u64::from(self.vmid)
    }

    fn fragment(&self) -> Fragment {
        let mut details = vec![format!("ID: {}", self.vmid)];
        if let Some(memory) = self.memory {
            details.push(format!("Memory: {} MB", memory));
        }
        if let Some(cores) = self.cores {
            details.push(format!("Cores: {}", cores));
        }
        Fragment::new(self.id(), self.name.clone(), self.status.clone()).with_details(details)
    }
}

pub type VmController = ResourceController<VmKind>;

impl ResourceController<VmKind> {
    /// Fetch the status of one VM, reporting failures
    pub async fn get_status(&self, vmid: u32) -> Result<VmStatusReport> {
        let id = u64::from(vmid);
        let path = format!("/vm-status/{}", vmid);
        match self.fetch_status(id, path).await {
            Ok(report) => Ok(report),
            Err(e) => self.fail(e, "Error getting VM status"),
        }
    }

    /// Re-fetch the status of every displayed VM, one after another
    ///
    /// Failures are logged and leave the stale status on screen.
    pub async fn refresh_statuses(&self) -> Result<()> {
        let ids = self.view().ids();
        debug!("Refreshing status of {} VM(s)", ids.len());
        for id in ids {
            if let Err(e) = self.fetch_status(id, format!("/vm-status/{}", id)).await {
                warn!("Error updating VM {} status: {}", id, e);
            }
        }
        Ok(())
    }
}

/// Periodic per-VM status refresh
pub struct StatusSweep(pub Arc<VmController>);

#[async_trait]
impl Refresh for StatusSweep {
    async fn refresh(&self) -> Result<()> {
        self.0.refresh_statuses().await
    }

    fn label(&self) -> &str {
        "VM status sweep"
    }
}
