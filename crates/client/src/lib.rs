//! CloudPanel client
//!
//! Request orchestration for the CloudPanel REST API: a typed HTTP wrapper,
//! the durable auth session, controllers for virtual machines and service
//! offerings, and the view state a host UI renders from.

pub mod auth;
pub mod contact;
pub mod forms;
pub mod http;
pub mod notify;
pub mod panel;
pub mod poller;
pub mod resource;
pub mod service;
pub mod session;
pub mod view;
pub mod vm;

#[cfg(test)]
mod testing;

pub use auth::{AuthBanner, AuthClient, Credentials};
pub use contact::ContactClient;
pub use http::{ApiClient, ApiRequest, RawResponse, ReqwestTransport, Transport};
pub use notify::{LogNotifier, Notification, NotificationCenter, NotificationKind, Notifier};
pub use panel::Panel;
pub use poller::{PollHandle, Poller, Refresh};
pub use resource::{ResourceController, ResourceKind};
pub use service::{ServiceController, ServiceKind};
pub use session::{send_authorized, Session, SessionStore};
pub use view::{DisplayStatus, Fragment, Renderable, ViewSynchronizer};
pub use vm::{StatusSweep, VmController, VmKind};
