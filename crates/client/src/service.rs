//! Service offerings

use crate::http::ApiRequest;
use crate::resource::{ResourceController, ResourceKind};
use crate::view::{Fragment, Renderable};
use cloudpanel_common::{
    CreateServiceRequest, DeleteServiceRequest, PaymentInfo, Result, Service, ServicePatch,
    ValidationError,
};
use tracing::info;

pub struct ServiceKind;

impl ResourceKind for ServiceKind {
    type Record = Service;
    type Create = CreateServiceRequest;
    type Status = serde_json::Value;

    const LABEL: &'static str = "Service";
    const LIST_PATH: &'static str = "/service-list";
    const CREATE_PATH: &'static str = "/create-service";

    fn delete_path(id: u64) -> String {
        format!("/delete-service/{}", id)
    }

    fn delete_body(id: u64, payment: &PaymentInfo) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(DeleteServiceRequest {
            service_id: id,
            payment_info: payment.clone(),
        })?)
    }

    fn create_payment(request: &CreateServiceRequest) -> &PaymentInfo {
        &request.payment_info
    }
}

impl Renderable for Service {
    fn id(&self) -> u64 {
        self.id
    }

    fn fragment(&self) -> Fragment {
        let mut details = Vec::new();
        if !self.description.is_empty() {
            details.push(self.description.clone());
        }
        details.push(format!("Price: ₹{:.2}", self.price));
        if !self.features.is_empty() {
            details.push(format!("Features: {}", self.features.join(", ")));
        }
        Fragment::new(self.id, self.name.clone(), self.status.clone()).with_details(details)
    }
}

pub type ServiceController = ResourceController<ServiceKind>;

impl ResourceController<ServiceKind> {
    /// Apply a partial update, then refresh the list
    pub async fn update(&self, id: u64, patch: &ServicePatch) -> Result<Service> {
        let fallback = "Error updating Service";

        if patch.is_empty() {
            return self.fail(ValidationError::EmptyPatch.into(), fallback);
        }
        let request = match ApiRequest::put(format!("/update-service/{}", id)).json(patch) {
            Ok(request) => request,
            Err(e) => return self.fail(e, fallback),
        };

        let updated = match self.call::<Service>(request).await {
            Ok(updated) => updated,
            Err(e) => return self.fail(e, fallback),
        };

        info!("Service {} updated", id);
        self.succeed("Service updated successfully!".to_string());

        let _ = self.list().await;
        Ok(updated)
    }
}
