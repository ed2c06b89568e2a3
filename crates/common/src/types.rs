//! Core types for CloudPanel
//!
//! These mirror the JSON payloads exchanged with the backend. Fields the
//! backend may omit are optional on decode.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Currency attached to every payment
pub const PAYMENT_CURRENCY: &str = "INR";

/// Payment method attached to every payment
pub const PAYMENT_METHOD: &str = "UPI";

/// Status shown for records whose payload carried none
pub const UNKNOWN_STATUS: &str = "unknown";

fn unknown_status() -> String {
    UNKNOWN_STATUS.to_string()
}

fn default_currency() -> String {
    PAYMENT_CURRENCY.to_string()
}

fn default_payment_method() -> String {
    PAYMENT_METHOD.to_string()
}

/// Payment metadata attached to billable operations.
///
/// Only presence is checked client-side; correctness belongs to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub upi_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

impl PaymentInfo {
    pub fn upi(upi_id: impl Into<String>, amount: f64) -> Self {
        Self {
            upi_id: upi_id.into(),
            amount,
            currency: default_currency(),
            payment_method: default_payment_method(),
        }
    }

    /// Reject payments with missing required fields.
    pub fn ensure_complete(&self) -> Result<(), ValidationError> {
        if self.upi_id.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "upi_id" });
        }
        if !self.amount.is_finite() {
            return Err(ValidationError::InvalidNumber {
                field: "amount",
                value: self.amount.to_string(),
            });
        }
        if self.currency.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "currency" });
        }
        if self.payment_method.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "payment_method",
            });
        }
        Ok(())
    }
}

/// Virtual machine as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub vmid: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default = "unknown_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// Body of `POST /create-vm`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateVmRequest {
    pub name: String,
    pub vmid: u32,
    pub memory: u64,
    pub cores: u32,
    pub storage: String,
    pub iso: String,
    pub network: String,
    pub payment_info: PaymentInfo,
}

/// Payload of `GET /vm-status/{vmid}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmStatusReport {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mem: Option<f64>,
    #[serde(default)]
    pub cpu: Option<f64>,
}

impl VmStatusReport {
    /// Human readable status lines, `N/A` for anything the backend left out.
    pub fn lines(&self) -> Vec<String> {
        fn or_na<T: ToString>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        }

        vec![
            format!("Name: {}", or_na(&self.name)),
            format!("Status: {}", or_na(&self.status)),
            format!("Memory: {} MB", or_na(&self.mem)),
            format!("CPU: {}%", or_na(&self.cpu)),
        ]
    }
}

/// Service offering as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "unknown_status")]
    pub status: String,
}

/// Body of `POST /create-service`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub features: Vec<String>,
    pub payment_info: PaymentInfo,
}

/// Body of `PUT /update-service/{id}`; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl ServicePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.features.is_none()
    }
}

/// Body of `DELETE /delete-service/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteServiceRequest {
    pub service_id: u64,
    pub payment_info: PaymentInfo,
}

/// Cached profile of the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Anything else the backend sent about the user
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            extra: Default::default(),
        }
    }
}

/// Reply of `POST /login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Reply of `GET /verify-session`
#[derive(Debug, Clone, Deserialize)]
pub struct VerifySessionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Body of `POST /contact`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Reply of `POST /contact`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactResponse {
    #[serde(default)]
    pub message: Option<String>,
}
