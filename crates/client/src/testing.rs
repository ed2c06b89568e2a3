//! Scripted transport for unit tests

use crate::http::{ApiRequest, RawResponse, RequestBody, Transport};
use async_trait::async_trait;
use cloudpanel_common::{Error, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;

enum Reply {
    Respond(u16, String),
    Fail(String),
    Gated(oneshot::Receiver<(u16, String)>),
}

/// A request as the transport saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

/// Replies are queued per method and path and consumed in order
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<(String, String), VecDeque<Reply>>>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: &str, path: &str, reply: Reply) {
        self.replies
            .lock()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn reply(&self, method: &str, path: &str, status: u16, body: serde_json::Value) {
        self.push(method, path, Reply::Respond(status, body.to_string()));
    }

    pub fn reply_raw(&self, method: &str, path: &str, status: u16, body: &str) {
        self.push(method, path, Reply::Respond(status, body.to_string()));
    }

    pub fn fail(&self, method: &str, path: &str, message: &str) {
        self.push(method, path, Reply::Fail(message.to_string()));
    }

    /// Queue a reply that is only delivered once the returned sender fires
    pub fn gated(&self, method: &str, path: &str) -> oneshot::Sender<(u16, String)> {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Reply::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, _url: &str, request: &ApiRequest) -> Result<RawResponse> {
        let method = request.method.as_str().to_string();
        self.log.lock().push(RecordedRequest {
            method: method.clone(),
            path: request.path.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            bearer: request.bearer.clone(),
        });

        let reply = self
            .replies
            .lock()
            .get_mut(&(method.clone(), request.path.clone()))
            .and_then(|queue| queue.pop_front());

        let (status, body) = match reply {
            Some(Reply::Respond(status, body)) => (status, body),
            Some(Reply::Fail(message)) => return Err(Error::Transport(message)),
            Some(Reply::Gated(rx)) => rx
                .await
                .map_err(|_| Error::Transport("gate dropped".to_string()))?,
            None => {
                return Err(Error::Transport(format!(
                    "no scripted reply for {} {}",
                    method, request.path
                )))
            }
        };

        Ok(RawResponse {
            status,
            body: body.into_bytes(),
        })
    }
}
