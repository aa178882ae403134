//! Tokio driver for one admin session.
//!
//! [`AdminSession::start`] subscribes to the admin channel, loads the first
//! page, then spawns two tasks: the realtime task (connect, forward events, reconnect with backoff) and the
//! session loop that feeds every [`Input`] through [`AdminView::apply`] and
//! runs the returned [`Command`]s. Commands run concurrently, so a slow
//! fetch never blocks a newer one; the view's request ids decide which
//! result lands. Each new view is published through a `watch` channel.

use std::sync::Arc;

use intake_core::query::SubmissionListParams;
use intake_core::submission::SubmissionStatus;
use intake_core::types::DbId;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::AdminApiClient;
use crate::error::SyncError;
use crate::realtime::{reconnect_loop, RealtimeConnection, RealtimeListener, ReconnectConfig};
use crate::state::{AdminView, Command, Input};

/// Starts admin sessions against one API deployment.
pub struct AdminSession {
    api: Arc<AdminApiClient>,
    listener: RealtimeListener,
    reconnect: ReconnectConfig,
}

/// Control surface of a running session.
pub struct SessionHandle {
    inputs: mpsc::UnboundedSender<Input>,
    snapshots: watch::Receiver<AdminView>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl AdminSession {
    /// `api` must already be signed in.
    pub fn new(api: AdminApiClient, listener: RealtimeListener) -> Self {
        Self {
            api: Arc::new(api),
            listener,
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn with_reconnect(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = config;
        self
    }

    /// Subscribe, fetch the first page with `params`, and start the session
    /// tasks.
    ///
    /// The subscription is made before the fetch so that no event committed
    /// after the page was read can be lost. Fails only if the first page
    /// cannot be loaded. A realtime outage is retried in the background, and
    /// the view goes stale once it recovers.
    pub async fn start(self, params: SubmissionListParams) -> Result<SessionHandle, SyncError> {
        let connection = match self.listener.connect(&self.api).await {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::warn!(error = %e, "Realtime unavailable, retrying");
                None
            }
        };

        let page = self.api.list_submissions(&params).await?;
        tracing::info!(
            total = page.pagination.total_count,
            "Admin session loaded first page"
        );

        let view = AdminView::new(params, page);
        let (snapshot_tx, snapshots) = watch::channel(view.clone());
        let (inputs, input_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let realtime = tokio::spawn(run_realtime(
            connection,
            self.listener,
            Arc::clone(&self.api),
            self.reconnect,
            inputs.clone(),
            cancel.clone(),
        ));
        let session = tokio::spawn(run_session(
            view,
            self.api,
            input_rx,
            inputs.clone(),
            snapshot_tx,
            cancel.clone(),
        ));

        Ok(SessionHandle {
            inputs,
            snapshots,
            cancel,
            tasks: vec![realtime, session],
        })
    }
}

impl SessionHandle {
    /// Feed an input to the session. Returns `false` once it has stopped.
    pub fn send(&self, input: Input) -> bool {
        self.inputs.send(input).is_ok()
    }

    pub fn refresh(&self) -> bool {
        self.send(Input::RefreshRequested)
    }

    pub fn change_status(&self, id: DbId, status: SubmissionStatus) -> bool {
        self.send(Input::StatusChangeRequested { id, status })
    }

    /// The latest published view.
    pub fn snapshot(&self) -> AdminView {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified on every new view.
    pub fn subscribe(&self) -> watch::Receiver<AdminView> {
        self.snapshots.clone()
    }

    /// Stop both tasks and wait for them.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
        tracing::info!("Admin session stopped");
    }
}

/// Apply inputs and run commands until cancelled.
async fn run_session(
    mut view: AdminView,
    api: Arc<AdminApiClient>,
    mut input_rx: mpsc::UnboundedReceiver<Input>,
    inputs: mpsc::UnboundedSender<Input>,
    snapshots: watch::Sender<AdminView>,
    cancel: CancellationToken,
) {
    loop {
        let input = tokio::select! {
            _ = cancel.cancelled() => break,
            next = input_rx.recv() => match next {
                Some(input) => input,
                None => break,
            },
        };

        let commands = view.apply(input);
        snapshots.send_replace(view.clone());

        for command in commands {
            tokio::spawn(run_command(command, Arc::clone(&api), inputs.clone()));
        }
    }
}

/// Run one command and report its result back as an input.
async fn run_command(
    command: Command,
    api: Arc<AdminApiClient>,
    inputs: mpsc::UnboundedSender<Input>,
) {
    let input = match command {
        Command::FetchList { request_id, params } => Input::ListLoaded {
            request_id,
            result: api
                .list_submissions(&params)
                .await
                .map_err(|e| e.to_string()),
        },
        Command::FetchDetail { request_id, id } => Input::DetailLoaded {
            request_id,
            result: api.get_submission(id).await.map_err(|e| e.to_string()),
        },
        Command::UpdateStatus { id, status } => Input::StatusChangeCompleted {
            id,
            result: api
                .update_status(id, status)
                .await
                .map_err(|e| e.to_string()),
        },
    };
    // The session may have stopped meanwhile.
    let _ = inputs.send(input);
}

/// Keep the realtime socket subscribed and forward its events.
///
/// `initial` is the connection made before the first page was fetched. When
/// there is none, or after any drop, the session is told it reconnected,
/// since events may have been missed while no socket was subscribed.
async fn run_realtime(
    initial: Option<RealtimeConnection>,
    listener: RealtimeListener,
    api: Arc<AdminApiClient>,
    reconnect: ReconnectConfig,
    inputs: mpsc::UnboundedSender<Input>,
    cancel: CancellationToken,
) {
    let mut connection = match initial {
        Some(conn) => conn,
        None => match reconnect_loop(&listener, &api, &reconnect, &cancel).await {
            Some(conn) => {
                if inputs.send(Input::Reconnected).is_err() {
                    return;
                }
                conn
            }
            None => return,
        },
    };

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = connection.next_event() => next,
        };

        match next {
            Ok(Some(event)) => {
                tracing::debug!(
                    event = event.name(),
                    submission_id = event.submission_id(),
                    "Realtime event"
                );
                if inputs.send(Input::Event(event)).is_err() {
                    return;
                }
                continue;
            }
            Ok(None) => {
                tracing::info!(socket_id = %connection.socket_id, "Realtime socket closed");
            }
            Err(e) => {
                tracing::warn!(
                    socket_id = %connection.socket_id,
                    error = %e,
                    "Realtime socket failed"
                );
            }
        }

        match reconnect_loop(&listener, &api, &reconnect, &cancel).await {
            Some(conn) => {
                connection = conn;
                if inputs.send(Input::Reconnected).is_err() {
                    return;
                }
            }
            None => return,
        }
    }
}
