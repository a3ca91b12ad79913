// Live panel loop: registers presence for a page, keeps it alive with
// heartbeats, refreshes snapshots on push notifications (or by polling when
// push is unavailable), expires highlights, and leaves on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use pagepresence_common::types::Element;

use crate::config::{PanelConfig, ViewMode};
use crate::controller::{PanelController, PanelView, SelectionSink};
use crate::store::{
    HeartbeatOutcome, LeaveRequest, PresenceChange, PresenceService, RegisterRequest, Registration,
};

const COMMAND_CHANNEL_CAPACITY: usize = 32;
/// Sleep target when no timer is pending; the branch is disabled anyway.
const IDLE_SLEEP: Duration = Duration::from_secs(24 * 60 * 60);

/// Who the panel registers as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    pub token: Option<String>,
    /// Display id resolved on the client, used when the token does not
    /// resolve.
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    SetElements(Vec<Element>),
    Toggle(String),
    Select(String),
    SetView(ViewMode),
}

// ── Panel loop ──────────────────────────────────────────────────────

/// Runs the panel loop for one page. Returns a watch receiver for the
/// rendered view and a handle for commands and shutdown.
pub fn start_panel<S: PresenceService, K: SelectionSink>(
    config: PanelConfig,
    page_id: impl Into<String>,
    session: SessionInfo,
    service: S,
    sink: K,
) -> (watch::Receiver<PanelView>, PanelHandle<S>) {
    let controller = PanelController::new(&config);
    let (view_tx, view_rx) = watch::channel(PanelView::placeholder(config.default_view));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

    let inner = Arc::new(PanelInner {
        config,
        page_id: page_id.into(),
        session,
        service,
        registration: Mutex::new(None),
    });

    let inner_clone = inner.clone();
    let task = tokio::spawn(async move {
        panel_loop(inner_clone, controller, sink, command_rx, shutdown_rx, view_tx).await;
    });

    (view_rx, PanelHandle { task, shutdown_tx, commands: command_tx, inner })
}

/// Handle for the panel background task.
pub struct PanelHandle<S: PresenceService> {
    task: tokio::task::JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    commands: mpsc::Sender<PanelCommand>,
    inner: Arc<PanelInner<S>>,
}

impl<S: PresenceService> PanelHandle<S> {
    pub async fn send(&self, command: PanelCommand) {
        if self.commands.send(command).await.is_err() {
            debug!(page = %self.inner.page_id, "panel loop gone, command dropped");
        }
    }

    pub async fn set_elements(&self, elements: Vec<Element>) {
        self.send(PanelCommand::SetElements(elements)).await;
    }

    pub async fn toggle(&self, node_id: impl Into<String>) {
        self.send(PanelCommand::Toggle(node_id.into())).await;
    }

    pub async fn select(&self, element_id: impl Into<String>) {
        self.send(PanelCommand::Select(element_id.into())).await;
    }

    pub async fn set_view(&self, mode: ViewMode) {
        self.send(PanelCommand::SetView(mode)).await;
    }

    /// Stop the loop, then leave the page (best effort).
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(page = %self.inner.page_id, error = %e, "panel loop ended abnormally");
        }

        let Some(registration) = self.inner.registration.lock().await.take() else {
            debug!(page = %self.inner.page_id, "not registered, nothing to leave");
            return;
        };
        let request = LeaveRequest {
            token: self.inner.session.token.clone(),
            client_user_id: Some(registration.display_name),
        };
        match self.inner.service.leave(&self.inner.page_id, request).await {
            Ok(()) => info!(page = %self.inner.page_id, "left page on shutdown"),
            Err(e) => {
                warn!(page = %self.inner.page_id, error = %e, "failed to leave page on shutdown")
            }
        }
    }
}

struct PanelInner<S: PresenceService> {
    config: PanelConfig,
    page_id: String,
    session: SessionInfo,
    service: S,
    registration: Mutex<Option<Registration>>,
}

impl<S: PresenceService> PanelInner<S> {
    async fn register(&self, controller: &mut PanelController) {
        let request = RegisterRequest {
            token: self.session.token.clone(),
            client_user_id: self.session.user_id.clone(),
            target_element_id: controller.selected_target().map(str::to_string),
        };
        match self.service.register(&self.page_id, request).await {
            Ok(registration) => {
                info!(page = %self.page_id, identity = %registration.identity, "presence registered");
                controller.set_own_color(registration.color.clone());
                *self.registration.lock().await = Some(registration);
            }
            Err(e) => warn!(page = %self.page_id, error = %e, "presence registration failed"),
        }
    }

    async fn heartbeat(&self, controller: &mut PanelController) {
        let identity = self.registration.lock().await.as_ref().map(|r| r.identity.clone());
        let Some(identity) = identity else {
            self.register(controller).await;
            return;
        };

        match self.service.heartbeat(&self.page_id, &identity, controller.selected_target()).await {
            Ok(HeartbeatOutcome::Refreshed) => debug!(page = %self.page_id, "heartbeat sent"),
            Ok(HeartbeatOutcome::Unknown) => {
                debug!(page = %self.page_id, "presence row missing, registering again");
                self.register(controller).await;
            }
            Err(e) => warn!(page = %self.page_id, error = %e, "heartbeat failed"),
        }
    }

    async fn refresh(&self, controller: &mut PanelController) {
        match self.service.list(&self.page_id).await {
            Ok(snapshot) => controller.apply_snapshot(snapshot, Instant::now()),
            Err(e) => warn!(page = %self.page_id, error = %e, "presence list failed"),
        }
    }
}

/// Next push notification, or never when push is unavailable.
async fn next_change(
    changes: &mut Option<broadcast::Receiver<PresenceChange>>,
) -> Result<PresenceChange, broadcast::error::RecvError> {
    match changes {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

fn interval_after(period: Duration) -> time::Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn panel_loop<S: PresenceService, K: SelectionSink>(
    inner: Arc<PanelInner<S>>,
    mut controller: PanelController,
    sink: K,
    mut commands: mpsc::Receiver<PanelCommand>,
    mut shutdown_rx: watch::Receiver<bool>,
    view_tx: watch::Sender<PanelView>,
) {
    let mut changes = inner.service.subscribe();
    if changes.is_none() {
        warn!(page = %inner.page_id, "push delivery unavailable, polling");
    }

    inner.register(&mut controller).await;
    inner.refresh(&mut controller).await;
    view_tx.send_replace(controller.render(Instant::now()));

    let mut heartbeat = interval_after(inner.config.heartbeat_interval());
    let mut poll = interval_after(inner.config.poll_interval());

    loop {
        let deadline = controller.next_deadline();
        let polling = changes.is_none();

        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!(page = %inner.page_id, "panel loop shutting down");
                break;
            }
            Some(command) = commands.recv() => match command {
                PanelCommand::SetElements(elements) => controller.set_elements(elements),
                PanelCommand::Toggle(node_id) => controller.toggle(&node_id),
                PanelCommand::Select(element_id) => controller.select(&element_id, &sink),
                PanelCommand::SetView(mode) => controller.set_view(mode),
            },
            _ = heartbeat.tick() => inner.heartbeat(&mut controller).await,
            change = next_change(&mut changes) => match change {
                Ok(change) if change.page_id == inner.page_id => inner.refresh(&mut controller).await,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(page = %inner.page_id, skipped, "presence notifications lagged");
                    inner.refresh(&mut controller).await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!(page = %inner.page_id, "push delivery closed, polling");
                    changes = None;
                    poll.reset();
                    continue;
                }
            },
            _ = poll.tick(), if polling => inner.refresh(&mut controller).await,
            _ = time::sleep_until(deadline.unwrap_or_else(|| Instant::now() + IDLE_SLEEP)), if deadline.is_some() => {
                controller.tick(Instant::now());
            }
        }

        view_tx.send_replace(controller.render(Instant::now()));
    }

    controller.cancel_timers();
}

// ── Tests ───────────────────────────────────────────────────────────
