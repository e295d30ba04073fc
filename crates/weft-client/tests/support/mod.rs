//! Shared test doubles for the engine's collaborator seams.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use weft_client::{
    Bridge, Credentials, EventHandler, HostError, PageMeta, Transport, TransportError,
};
use weft_core::{LoginId, RemoteEvent, UserId, UserInfo};
use weft_proto::{
    MarkOptimisticMessageFailed, RemoteTask, ReplaceOptimisticMessage, Table, TransportEvent,
};

/// Scripted reply to one `execute_tasks` call.
pub enum TaskReply {
    /// Return this table verbatim.
    Table(Table),
    /// Fail the call.
    Err(TransportError),
    /// Confirm the batch's send task with this final message id, echoing
    /// the OTID the pipeline chose.
    ConfirmSend(String),
    /// Reject the batch's send task with this reason, echoing the OTID.
    RejectSend(String),
}

/// Scriptable transport double recording every task submission.
pub struct MockTransport {
    pub page: Mutex<(PageMeta, Table)>,
    pub task_batches: Mutex<Vec<Vec<RemoteTask>>>,
    pub replies: Mutex<VecDeque<TaskReply>>,
    pub ready_results: Mutex<VecDeque<Result<(), TransportError>>>,
    pub handler: Mutex<Option<EventHandler>>,
    pub connected: Mutex<bool>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            page: Mutex::new((PageMeta { viewer_id: 42 }, Table::default())),
            task_batches: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            ready_results: Mutex::new(VecDeque::new()),
            handler: Mutex::new(None),
            connected: Mutex::new(false),
        })
    }

    pub fn set_page(&self, table: Table) {
        self.page.lock().unwrap().1 = table;
    }

    pub fn push_reply(&self, reply: TaskReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_ready(&self, result: Result<(), TransportError>) {
        self.ready_results.lock().unwrap().push_back(result);
    }

    pub fn batches(&self) -> Vec<Vec<RemoteTask>> {
        self.task_batches.lock().unwrap().clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }

    /// Deliver one event through the installed callback, awaiting the
    /// handler future the way the real transport does.
    pub async fn emit(&self, event: TransportEvent) {
        let future = {
            let guard = self.handler.lock().unwrap();
            let handler = guard.as_ref().expect("event handler not installed");
            handler(event)
        };
        future.await;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        *self.connected.lock().unwrap() = true;
        Ok(())
    }

    async fn disconnect(&self) {
        *self.connected.lock().unwrap() = false;
    }

    fn set_event_handler(&self, handler: EventHandler) {
        *self.handler.lock().unwrap() = Some(handler);
    }

    async fn load_messages_page(&self) -> Result<(PageMeta, Table), TransportError> {
        Ok(self.page.lock().unwrap().clone())
    }

    async fn execute_tasks(&self, tasks: &[RemoteTask]) -> Result<Table, TransportError> {
        self.task_batches.lock().unwrap().push(tasks.to_vec());
        let otid = tasks.iter().find_map(RemoteTask::otid_str).unwrap_or_default();
        match self.replies.lock().unwrap().pop_front() {
            None => Ok(Table::default()),
            Some(TaskReply::Table(table)) => Ok(table),
            Some(TaskReply::Err(err)) => Err(err),
            Some(TaskReply::ConfirmSend(message_id)) => Ok(Table {
                replace_optimistic_message: vec![ReplaceOptimisticMessage {
                    offline_threading_id: otid,
                    message_id,
                }],
                ..Table::default()
            }),
            Some(TaskReply::RejectSend(message)) => Ok(Table {
                mark_optimistic_message_failed: vec![MarkOptimisticMessageFailed {
                    otid,
                    message,
                }],
                ..Table::default()
            }),
        }
    }

    async fn wait_until_can_send(&self, _timeout: Duration) -> Result<(), TransportError> {
        self.ready_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    fn credentials(&self) -> Credentials {
        Credentials { session_token: "session-token".to_string() }
    }
}

/// Bridge double recording everything the engine hands to the host.
#[derive(Default)]
pub struct RecordingBridge {
    pub events: Mutex<Vec<(LoginId, RemoteEvent)>>,
    pub ghost_updates: Mutex<Vec<(UserId, UserInfo)>>,
    pub credentials: Mutex<Vec<(LoginId, Credentials)>>,
    pub connected: Mutex<Vec<LoginId>>,
    pub fail_credentials: Mutex<bool>,
}

impl RecordingBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RemoteEvent> {
        self.events.lock().unwrap().iter().map(|(_, event)| event.clone()).collect()
    }

    pub fn ghost_updates(&self) -> Vec<(UserId, UserInfo)> {
        self.ghost_updates.lock().unwrap().clone()
    }

    pub fn fail_credential_writes(&self) {
        *self.fail_credentials.lock().unwrap() = true;
    }
}

#[async_trait]
impl Bridge for RecordingBridge {
    async fn queue_remote_event(&self, login: &LoginId, event: RemoteEvent) {
        self.events.lock().unwrap().push((login.clone(), event));
    }

    async fn update_ghost(&self, user: &UserId, info: UserInfo) -> Result<(), HostError> {
        self.ghost_updates.lock().unwrap().push((user.clone(), info));
        Ok(())
    }

    async fn persist_credentials(
        &self,
        login: &LoginId,
        credentials: &Credentials,
    ) -> Result<(), HostError> {
        if *self.fail_credentials.lock().unwrap() {
            return Err(HostError { reason: "credential store unavailable".to_string() });
        }
        self.credentials.lock().unwrap().push((login.clone(), credentials.clone()));
        Ok(())
    }

    async fn mark_connected(&self, login: &LoginId) {
        self.connected.lock().unwrap().push(login.clone());
    }
}
