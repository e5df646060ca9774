//! Turning password failures into user prompts and retrying with the answer.
//!
//! [`PasswordFlow`] wraps any PDF-touching operation. When the operation fails with
//! [`ExtractError::PasswordRequired`] or [`ExtractError::IncorrectPassword`], the flow sends a
//! [`PasswordRequest`] to whoever drains the paired [`PasswordQueue`] and suspends until that
//! request is answered. A submitted password re-runs the operation; a cancellation aborts
//! with [`ExtractError::Cancelled`]. Prompts for different documents never overlap: the second
//! waits until the first document is resolved.

use std::collections::HashMap;

use async_channel::{Receiver, Sender};
use async_lock::Mutex;

use crate::error::{ExtractError, Result};
use crate::source::DocumentKey;

/// Why the user is being asked for a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordIssue {
    /// No password has been tried yet.
    Required,
    /// The last submitted password was rejected.
    Incorrect,
}

/// Pending prompt for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordAttempt {
    /// Document being unlocked.
    pub document: DocumentKey,
    /// Label to show the user, usually the file name.
    pub label: String,
    /// Outcome of the previous try.
    pub last_error: PasswordIssue,
    /// Passwords submitted so far for this document.
    pub attempts: usize,
}

/// The user's answer to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordResponse {
    /// Try this password.
    Submit(String),
    /// Abort the whole run.
    Cancel,
}

/// Observable state of a [`PasswordFlow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordState {
    /// No prompt is active.
    Idle,
    /// Waiting for the user to answer a prompt.
    AwaitingPassword(PasswordAttempt),
    /// The last prompted document was unlocked.
    Resolved(DocumentKey),
}

/// A prompt awaiting an answer from the host.
#[derive(Debug)]
pub struct PasswordRequest {
    /// What is being asked.
    pub attempt: PasswordAttempt,
    response_tx: Sender<PasswordResponse>,
}

impl PasswordRequest {
    /// Answer the prompt without blocking.
    ///
    /// # Errors
    ///
    /// Fails if the waiting operation has gone away.
    pub fn respond(
        self,
        response: PasswordResponse,
    ) -> std::result::Result<(), async_channel::TrySendError<PasswordResponse>> {
        self.response_tx.try_send(response)
    }

    /// Submit a password.
    ///
    /// # Errors
    ///
    /// Fails if the waiting operation has gone away.
    pub fn submit(
        self,
        password: impl Into<String>,
    ) -> std::result::Result<(), async_channel::TrySendError<PasswordResponse>> {
        self.respond(PasswordResponse::Submit(password.into()))
    }

    /// Cancel the run.
    ///
    /// # Errors
    ///
    /// Fails if the waiting operation has gone away.
    pub fn cancel(self) -> std::result::Result<(), async_channel::TrySendError<PasswordResponse>> {
        self.respond(PasswordResponse::Cancel)
    }
}

/// Host side: receives prompts one at a time.
#[derive(Debug)]
pub struct PasswordQueue {
    rx: Receiver<PasswordRequest>,
}

impl PasswordQueue {
    /// Await the next prompt. `None` once the flow is dropped.
    pub async fn next(&self) -> Option<PasswordRequest> {
        self.rx.recv().await.ok()
    }

    /// Returns true if no prompt is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Pipeline side: retries operations with passwords obtained from the host.
#[derive(Debug)]
pub struct PasswordFlow {
    tx: Sender<PasswordRequest>,
    prompt: Mutex<()>,
    state: Mutex<PasswordState>,
    cache: Mutex<HashMap<DocumentKey, String>>,
}

/// Create a flow and the queue its prompts arrive on.
#[must_use]
pub fn channel() -> (PasswordFlow, PasswordQueue) {
    let (tx, rx) = async_channel::unbounded();
    (
        PasswordFlow {
            tx,
            prompt: Mutex::new(()),
            state: Mutex::new(PasswordState::Idle),
            cache: Mutex::new(HashMap::new()),
        },
        PasswordQueue { rx },
    )
}

impl PasswordFlow {
    /// Current state.
    pub async fn state(&self) -> PasswordState {
        self.state.lock().await.clone()
    }

    /// Password that unlocked `document` earlier in this session.
    pub async fn cached(&self, document: &DocumentKey) -> Option<String> {
        self.cache.lock().await.get(document).cloned()
    }

    /// Run `op`, prompting for a password whenever it fails with a password error.
    ///
    /// `op` receives the password to try, starting with the cached one (if any). There is
    /// no retry limit. A password that works is cached for the rest of the session.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Cancelled`] when the user cancels, the original password
    /// error when nobody is listening on the queue, and any other error from `op` as-is.
    pub async fn run<T, F>(&self, document: &DocumentKey, label: &str, mut op: F) -> Result<T>
    where
        F: AsyncFnMut(Option<String>) -> Result<T>,
    {
        let mut password = self.cached(document).await;
        let mut prompt_guard = None;
        let mut attempts = 0;

        loop {
            let err = match op(password.clone()).await {
                Ok(value) => {
                    if prompt_guard.is_some() {
                        if let Some(password) = password {
                            self.cache
                                .lock()
                                .await
                                .entry(document.clone())
                                .or_insert(password);
                        }
                        *self.state.lock().await = PasswordState::Resolved(document.clone());
                        tracing::info!(document = label, attempts, "password accepted");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_recoverable() => err,
                Err(err) => {
                    if prompt_guard.is_some() {
                        *self.state.lock().await = PasswordState::Idle;
                    }
                    return Err(err);
                }
            };

            if prompt_guard.is_none() {
                prompt_guard = Some(self.prompt.lock().await);
            }

            let attempt = PasswordAttempt {
                document: document.clone(),
                label: label.to_string(),
                last_error: match err {
                    ExtractError::IncorrectPassword { .. } => PasswordIssue::Incorrect,
                    _ => PasswordIssue::Required,
                },
                attempts,
            };
            *self.state.lock().await = PasswordState::AwaitingPassword(attempt.clone());
            tracing::info!(document = label, issue = ?attempt.last_error, "awaiting password");

            let Some(response) = self.ask(attempt).await else {
                *self.state.lock().await = PasswordState::Idle;
                tracing::warn!(document = label, "no password prompt is attached");
                return Err(err);
            };
            match response {
                PasswordResponse::Submit(submitted) => {
                    attempts += 1;
                    password = Some(submitted);
                }
                PasswordResponse::Cancel => {
                    *self.state.lock().await = PasswordState::Idle;
                    tracing::info!(document = label, "password prompt cancelled");
                    return Err(ExtractError::Cancelled);
                }
            }
        }
    }

    /// `None` when the queue is gone; a dropped request counts as a cancellation.
    async fn ask(&self, attempt: PasswordAttempt) -> Option<PasswordResponse> {
        let (response_tx, response_rx) = async_channel::bounded(1);
        self.tx
            .send(PasswordRequest {
                attempt,
                response_tx,
            })
            .await
            .ok()?;
        Some(
            response_rx
                .recv()
                .await
                .unwrap_or(PasswordResponse::Cancel),
        )
    }
}
