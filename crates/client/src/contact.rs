//! Contact form submission

use crate::http::{ApiClient, ApiRequest};
use crate::notify::{Notification, Notifier};
use cloudpanel_common::{ContactMessage, ContactResponse, Result};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ContactClient {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl ContactClient {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Send a message to the operators
    pub async fn submit(&self, message: &ContactMessage) -> Result<String> {
        let outcome = match ApiRequest::post("/contact").json(message) {
            Ok(request) => self.api.send::<Option<ContactResponse>>(request).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(response) => {
                let text = response
                    .and_then(|r| r.message)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Message sent successfully!".to_string());
                info!("Contact message from {} delivered", message.email);
                self.notifier.notify(Notification::success(text.clone()));
                Ok(text)
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::error(e.user_message("Failed to send message")));
                Err(e)
            }
        }
    }
}
