//! Test support utilities shared across unit and integration tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use thiserror::Error;

use crate::lifecycle::{DeleteAck, ResourceClient, StatusReading};

/// Error returned by scripted doubles when a failure was queued or the script
/// ran dry.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("scripted failure: {0}")]
pub struct ScriptedFailure(pub String);

/// Scripted status source for driving a verifier without network calls.
///
/// Responses are returned in FIFO order. Once the queue is empty the last
/// response is repeated, so a script of `["creating", "available"]` keeps
/// reporting `available` forever.
#[derive(Clone, Debug, Default)]
pub struct StatusScript {
    responses: Rc<RefCell<VecDeque<Result<String, String>>>>,
    last: Rc<RefCell<Option<Result<String, String>>>>,
    calls: Rc<Cell<u32>>,
    subjects: Rc<RefCell<Vec<String>>>,
}

impl StatusScript {
    /// Creates an empty script; polling it fails until a response is queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a script that returns each status once, repeating the last.
    #[must_use]
    pub fn with_statuses<I, T>(statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let script = Self::new();
        for status in statuses {
            script.push_status(status);
        }
        script
    }

    /// Queues a successful poll.
    pub fn push_status(&self, status: impl Into<String>) {
        self.responses.borrow_mut().push_back(Ok(status.into()));
    }

    /// Queues a failed poll.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.responses.borrow_mut().push_back(Err(message.into()));
    }

    /// Number of polls made so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    /// Subject ids passed to [`StatusScript::poll`], in call order.
    #[must_use]
    pub fn subjects(&self) -> Vec<String> {
        self.subjects.borrow().clone()
    }

    /// Returns the next scripted response for `subject_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptedFailure`] when a failure was queued or nothing was
    /// ever queued.
    pub fn poll(&self, subject_id: &str) -> Result<String, ScriptedFailure> {
        self.calls.set(self.calls.get().saturating_add(1));
        self.subjects.borrow_mut().push(subject_id.to_owned());
        let next = self.responses.borrow_mut().pop_front();
        let response = match next {
            Some(response) => {
                *self.last.borrow_mut() = Some(response.clone());
                response
            }
            None => self
                .last
                .borrow()
                .clone()
                .unwrap_or_else(|| Err(String::from("no scripted status available"))),
        };
        response.map_err(ScriptedFailure)
    }
}

/// Records a single call made through [`ScriptedClient`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientCall {
    /// `create` was called with this request.
    Create(String),
    /// `status` was called for this id.
    Status(String),
    /// `delete` was called for this id.
    Delete(String),
}

/// One scripted reply to a status request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScriptedStatus {
    /// The resource exists with this status.
    Present(String),
    /// The resource no longer exists.
    Gone,
    /// The request failed.
    Failure(String),
}

impl From<&str> for ScriptedStatus {
    fn from(value: &str) -> Self {
        Self::Present(value.to_owned())
    }
}

#[derive(Debug, Default)]
struct ClientScript {
    creates: VecDeque<Result<String, String>>,
    statuses: VecDeque<ScriptedStatus>,
    last_status: Option<ScriptedStatus>,
    deletes: VecDeque<Result<DeleteAck, String>>,
    calls: Vec<ClientCall>,
    created: u32,
}

/// Scripted [`ResourceClient`] that records every call.
///
/// Creation returns ids `res-1`, `res-2`, ... unless a reply was queued.
/// Status replies are consumed in FIFO order across all ids and the last one
/// repeats once the queue is empty. Deletes are accepted unless a reply was
/// queued.
#[derive(Clone, Debug, Default)]
pub struct ScriptedClient {
    script: Rc<RefCell<ClientScript>>,
}

impl ScriptedClient {
    /// Creates a client with no queued replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues status replies.
    pub fn push_statuses<I, T>(&self, statuses: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<ScriptedStatus>,
    {
        self.script
            .borrow_mut()
            .statuses
            .extend(statuses.into_iter().map(Into::into));
    }

    /// Queues a failed creation.
    pub fn push_create_failure(&self, message: impl Into<String>) {
        self.script
            .borrow_mut()
            .creates
            .push_back(Err(message.into()));
    }

    /// Queues a delete reply.
    pub fn push_delete(&self, reply: Result<DeleteAck, String>) {
        self.script.borrow_mut().deletes.push_back(reply);
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ClientCall> {
        self.script.borrow().calls.clone()
    }

    /// Ids passed to `delete`, in call order.
    #[must_use]
    pub fn deleted_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ClientCall::Delete(id) => Some(id),
                ClientCall::Create(_) | ClientCall::Status(_) => None,
            })
            .collect()
    }
}

impl ResourceClient for ScriptedClient {
    type Request = String;
    type Error = ScriptedFailure;

    fn create(&self, request: &Self::Request) -> Result<String, Self::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(ClientCall::Create(request.clone()));
        if let Some(reply) = script.creates.pop_front() {
            return reply.map_err(ScriptedFailure);
        }
        script.created = script.created.saturating_add(1);
        Ok(format!("res-{}", script.created))
    }

    fn status(&self, id: &str) -> Result<StatusReading, Self::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(ClientCall::Status(id.to_owned()));
        let reply = match script.statuses.pop_front() {
            Some(reply) => {
                script.last_status = Some(reply.clone());
                reply
            }
            None => script
                .last_status
                .clone()
                .unwrap_or_else(|| ScriptedStatus::Failure(String::from("no scripted status"))),
        };
        match reply {
            ScriptedStatus::Present(status) => Ok(StatusReading::Present(status)),
            ScriptedStatus::Gone => Ok(StatusReading::Gone),
            ScriptedStatus::Failure(message) => Err(ScriptedFailure(message)),
        }
    }

    fn delete(&self, id: &str) -> Result<DeleteAck, Self::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(ClientCall::Delete(id.to_owned()));
        script
            .deletes
            .pop_front()
            .unwrap_or(Ok(DeleteAck::Accepted))
            .map_err(ScriptedFailure)
    }
}
