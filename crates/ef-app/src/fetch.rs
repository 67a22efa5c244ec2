//! Single in-flight request tracking.
//!
//! A [`FetchSlot`] hands out a [`Ticket`] per request. Only the latest ticket
//! may land a result; anything else is stale and dropped. Failures keep the
//! previously loaded data. [`FetchWorker`] runs the request on a background
//! thread and reports back over a channel.

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct FetchSlot<T> {
    issued: u64,
    in_flight: Option<Ticket>,
    data: Option<T>,
    error: Option<String>,
}

impl<T> Default for FetchSlot<T> {
    fn default() -> Self {
        Self {
            issued: 0,
            in_flight: None,
            data: None,
            error: None,
        }
    }
}

impl<T> FetchSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding any in flight.
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.in_flight = Some(ticket);
        self.error = None;
        ticket
    }

    /// Start over after a failure.
    pub fn retry(&mut self) -> Ticket {
        self.begin()
    }

    /// Drop interest in the current request; its result will be discarded.
    pub fn cancel(&mut self) {
        self.in_flight = None;
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Land a result. Returns `false` when the ticket is stale.
    pub fn complete(&mut self, ticket: Ticket, result: AppResult<T>) -> bool {
        if self.in_flight != Some(ticket) {
            tracing::debug!(?ticket, "discarding stale response");
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "fetch failed");
                self.error = Some(err.to_string());
            }
        }
        true
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn take_data(&mut self) -> Option<T> {
        self.data.take()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug)]
pub enum WorkerMessage<T> {
    Complete { ticket: Ticket, value: T },
    Error { ticket: Ticket, error: AppError },
}

impl<T> WorkerMessage<T> {
    pub fn ticket(&self) -> Ticket {
        match self {
            WorkerMessage::Complete { ticket, .. } | WorkerMessage::Error { ticket, .. } => *ticket,
        }
    }

    /// Hand the message to its slot. Returns whether it was applied.
    pub fn deliver(self, slot: &mut FetchSlot<T>) -> bool {
        match self {
            WorkerMessage::Complete { ticket, value } => slot.complete(ticket, Ok(value)),
            WorkerMessage::Error { ticket, error } => slot.complete(ticket, Err(error)),
        }
    }
}

pub struct FetchWorker<T> {
    pub rx: Receiver<WorkerMessage<T>>,
    _handle: JoinHandle<()>,
}

impl<T: Send + 'static> FetchWorker<T> {
    pub fn start<F>(ticket: Ticket, job: F) -> Self
    where
        F: FnOnce() -> AppResult<T> + Send + 'static,
    {
        let (tx, rx) = channel();
        let handle = thread::spawn(move || Self::run(ticket, job, &tx));
        Self {
            rx,
            _handle: handle,
        }
    }

    fn run<F>(ticket: Ticket, job: F, tx: &Sender<WorkerMessage<T>>)
    where
        F: FnOnce() -> AppResult<T>,
    {
        let message = match job() {
            Ok(value) => WorkerMessage::Complete { ticket, value },
            Err(error) => WorkerMessage::Error { ticket, error },
        };
        // the receiver may be gone if the view was torn down
        let _ = tx.send(message);
    }

    pub fn try_recv(&self) -> Option<WorkerMessage<T>> {
        self.rx.try_recv().ok()
    }

    /// Block until the job reports or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> AppResult<WorkerMessage<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Ok(message),
            Err(RecvTimeoutError::Timeout) => Err(AppError::Fetch(format!(
                "no response after {:.1}s",
                timeout.as_secs_f64()
            ))),
            Err(RecvTimeoutError::Disconnected) => {
                Err(AppError::Fetch("fetch worker exited".to_string()))
            }
        }
    }
}
