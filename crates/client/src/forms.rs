//! Form input handling
//!
//! Every form arrives as raw text. Parsing turns it into a request value or a
//! [`ValidationError`]; nothing here touches the network.

use crate::auth::Credentials;
use cloudpanel_common::{
    ContactMessage, CreateServiceRequest, CreateVmRequest, PaymentInfo, ServicePatch,
    ValidationError,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

type Parsed<T> = std::result::Result<T, ValidationError>;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Loose address check: something@something.tld, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn required(field: &'static str, value: &str) -> Parsed<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(value.to_string())
}

fn number<T: FromStr>(field: &'static str, value: &str) -> Parsed<T> {
    let value = required(field, value)?;
    value
        .parse()
        .map_err(|_| ValidationError::InvalidNumber { field, value })
}

fn positive<T: FromStr + PartialOrd + Default>(field: &'static str, value: &str) -> Parsed<T> {
    let parsed: T = number(field, value)?;
    if parsed <= T::default() {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(parsed)
}

fn decimal(field: &'static str, value: &str) -> Parsed<f64> {
    let parsed: f64 = number(field, value)?;
    if !parsed.is_finite() {
        return Err(ValidationError::InvalidNumber {
            field,
            value: value.trim().to_string(),
        });
    }
    Ok(parsed)
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Comma or newline separated list; blank items are dropped
pub fn parse_features(value: &str) -> Vec<String> {
    value
        .split([',', '\n'])
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn payment(upi_id: &str, amount: &str) -> Parsed<PaymentInfo> {
    Ok(PaymentInfo::upi(
        required("UPI ID", upi_id)?,
        decimal("Amount", amount)?,
    ))
}

/// VM creation form
#[derive(Debug, Clone, Default)]
pub struct VmCreateForm {
    pub name: String,
    pub vmid: String,
    pub memory: String,
    pub cores: String,
    pub storage: String,
    pub iso: String,
    pub network: String,
    pub upi_id: String,
    pub amount: String,
}

impl VmCreateForm {
    pub fn parse(&self) -> Parsed<CreateVmRequest> {
        Ok(CreateVmRequest {
            name: required("VM name", &self.name)?,
            vmid: number("VM ID", &self.vmid)?,
            memory: positive("Memory", &self.memory)?,
            cores: positive("Cores", &self.cores)?,
            storage: self.storage.trim().to_string(),
            iso: self.iso.trim().to_string(),
            network: self.network.trim().to_string(),
            payment_info: payment(&self.upi_id, &self.amount)?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct VmStatusForm {
    pub vmid: String,
}

impl VmStatusForm {
    pub fn parse(&self) -> Parsed<u32> {
        number("VM ID", &self.vmid)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VmDeleteForm {
    pub vmid: String,
    pub upi_id: String,
    pub amount: String,
}

impl VmDeleteForm {
    pub fn parse(&self) -> Parsed<(u32, PaymentInfo)> {
        Ok((
            number("VM ID", &self.vmid)?,
            payment(&self.upi_id, &self.amount)?,
        ))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceCreateForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub features: String,
    pub upi_id: String,
    pub amount: String,
}

impl ServiceCreateForm {
    pub fn parse(&self) -> Parsed<CreateServiceRequest> {
        Ok(CreateServiceRequest {
            name: required("Service name", &self.name)?,
            description: self.description.trim().to_string(),
            price: decimal("Price", &self.price)?,
            features: parse_features(&self.features),
            payment_info: payment(&self.upi_id, &self.amount)?,
        })
    }
}

/// Service update form; blank fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct ServiceUpdateForm {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub features: String,
}

impl ServiceUpdateForm {
    pub fn parse(&self) -> Parsed<(u64, ServicePatch)> {
        let id = number("Service ID", &self.id)?;
        let price = match optional(&self.price) {
            Some(price) => Some(decimal("Price", &price)?),
            None => None,
        };
        let patch = ServicePatch {
            name: optional(&self.name),
            description: optional(&self.description),
            price,
            features: optional(&self.features).map(|f| parse_features(&f)),
        };
        if patch.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        Ok((id, patch))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceDeleteForm {
    pub id: String,
    pub upi_id: String,
    pub amount: String,
}

impl ServiceDeleteForm {
    pub fn parse(&self) -> Parsed<(u64, PaymentInfo)> {
        Ok((
            number("Service ID", &self.id)?,
            payment(&self.upi_id, &self.amount)?,
        ))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn parse(&self) -> Parsed<Credentials> {
        let username = required("Username", &self.username)?;
        if self.password.is_empty() {
            return Err(ValidationError::MissingField { field: "Password" });
        }
        Ok(Credentials {
            username,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn parse(&self) -> Parsed<ContactMessage> {
        let name = required("Name", &self.name)?;
        let email = required("Email", &self.email)?;
        let message = required("Message", &self.message)?;
        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(ContactMessage {
            name,
            email,
            subject: self.subject.trim().to_string(),
            message,
        })
    }
}
