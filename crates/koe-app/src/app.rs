// Application orchestrator: owns the composer and board state, turns user
// commands into service calls, and folds their results back into UI updates.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use koe_client::{
    CommentService, HttpCommentService, MemoryCommentService, NewComment, ServiceError,
};
use koe_core::comment::{CommentId, VisibilityFilter};
use koe_core::config::{Config, ServiceConfig, ServiceMode};
use koe_core::protocol::{
    CallFailure, ConnectionStatus, Notice, ServiceEvent, UiUpdate, UserCommand,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::composer::Composer;
use crate::task::TaskSlot;

/// Build the `CommentService` selected by `config.mode`.
pub fn build_service(config: &ServiceConfig) -> Result<Arc<dyn CommentService>, ServiceError> {
    match config.mode {
        ServiceMode::Http => {
            info!("Using comment service at {}", config.base_url);
            Ok(Arc::new(HttpCommentService::from_config(config)?))
        }
        ServiceMode::Memory => {
            info!("Using in-memory comment store");
            Ok(Arc::new(MemoryCommentService::new()))
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub config: Config,
    pub composer: Composer,
    pub board: Board,
    pub connection_status: ConnectionStatus,
    service: Arc<dyn CommentService>,
    /// Sender handed to spawned service tasks.
    svc_tx: mpsc::Sender<ServiceEvent>,
    extract_task: TaskSlot,
    submit_task: TaskSlot,
    list_task: TaskSlot,
    health_task: TaskSlot,
    /// One slot per comment with a toggle in flight. Slots are removed once
    /// their result is accepted.
    visibility_tasks: HashMap<CommentId, TaskSlot>,
    /// Highest generation handed to any visibility slot, so a recreated slot
    /// never reuses a generation still travelling on the channel.
    visibility_generation: u64,
}

impl AppState {
    pub fn new(
        config: Config,
        service: Arc<dyn CommentService>,
        svc_tx: mpsc::Sender<ServiceEvent>,
    ) -> Self {
        let board = Board::new(config.board.initial_filter());
        AppState {
            config,
            composer: Composer::new(),
            board,
            connection_status: ConnectionStatus::Unknown,
            service,
            svc_tx,
            extract_task: TaskSlot::default(),
            submit_task: TaskSlot::default(),
            list_task: TaskSlot::default(),
            health_task: TaskSlot::default(),
            visibility_tasks: HashMap::new(),
            visibility_generation: 0,
        }
    }

    /// Start key point extraction for `content`. Returns false when the
    /// composer refuses (blank draft or a request already in flight).
    pub fn request_extraction(&mut self, content: &str) -> bool {
        let Some(content) = self.composer.begin_extraction(content) else {
            return false;
        };

        let service = Arc::clone(&self.service);
        let tx = self.svc_tx.clone();
        let generation = self.extract_task.spawn(move |generation| async move {
            let result = report(service.extract(&content).await);
            let _ = tx.send(ServiceEvent::Extracted { result, generation }).await;
        });
        info!("Requested key point extraction (gen: {})", generation);
        true
    }

    /// Publish `content`. Only allowed once key points are ready.
    pub fn request_submission(&mut self, content: &str) -> bool {
        let Some(content) = self.composer.begin_submission(content) else {
            return false;
        };

        let mut comment = NewComment::new(content);
        if self.config.composer.send_key_points {
            comment = comment.with_key_points(self.composer.extracted_points().to_vec());
        }

        let service = Arc::clone(&self.service);
        let tx = self.svc_tx.clone();
        let generation = self.submit_task.spawn(move |generation| async move {
            let result = report(service.create_comment(&comment).await);
            let _ = tx.send(ServiceEvent::Submitted { result, generation }).await;
        });
        info!("Submitting comment (gen: {})", generation);
        true
    }

    /// Fetch the list for the current filter, aborting any fetch in flight.
    pub fn load_comments(&mut self) {
        let filter = self.board.filter();
        let service = Arc::clone(&self.service);
        let tx = self.svc_tx.clone();
        let generation = self.list_task.spawn(move |generation| async move {
            let result = report(service.list_comments(filter).await);
            let _ = tx
                .send(ServiceEvent::Listed {
                    filter,
                    result,
                    generation,
                })
                .await;
        });
        debug!("Loading comments with {:?} (gen: {})", filter, generation);
    }

    /// Flip the board filter and refetch once. Returns the new filter.
    pub fn toggle_filter(&mut self) -> VisibilityFilter {
        let filter = self.board.toggle_filter();
        info!("Visibility filter set to {:?}", filter);
        self.load_comments();
        filter
    }

    /// Ask the store to flip visibility of the comment displayed at `index`.
    pub fn request_visibility(&mut self, index: usize) -> bool {
        let Some((id, is_public)) = self.board.visibility_target(index) else {
            return false;
        };

        let service = Arc::clone(&self.service);
        let tx = self.svc_tx.clone();
        let last = self.visibility_generation;
        let slot = self
            .visibility_tasks
            .entry(id)
            .or_insert_with(|| TaskSlot::starting_after(last));
        let generation = slot.spawn(move |generation| async move {
            let result = report(service.set_visibility(id, is_public).await);
            let _ = tx
                .send(ServiceEvent::VisibilityChanged {
                    id,
                    is_public,
                    result,
                    generation,
                })
                .await;
        });
        self.visibility_generation = self.visibility_generation.max(generation);
        info!(
            "Setting comment {} public={} (gen: {})",
            id, is_public, generation
        );
        true
    }

    /// Check that the service answers at all.
    pub fn probe_health(&mut self) {
        let service = Arc::clone(&self.service);
        let tx = self.svc_tx.clone();
        let generation = self.health_task.spawn(move |generation| async move {
            let result = report(service.health().await);
            let _ = tx.send(ServiceEvent::Health { result, generation }).await;
        });
        debug!("Probing comment service health (gen: {})", generation);
    }

    /// Abort every in-flight call.
    pub fn cancel_all(&mut self) {
        let mut cancelled = 0;
        for slot in [
            &mut self.extract_task,
            &mut self.submit_task,
            &mut self.list_task,
            &mut self.health_task,
        ] {
            cancelled += usize::from(slot.cancel());
        }
        for slot in self.visibility_tasks.values_mut() {
            cancelled += usize::from(slot.cancel());
        }
        if cancelled > 0 {
            info!("Cancelled {} in-flight service calls", cancelled);
        }
    }
}

/// Log a failed call and reduce it to what the event handlers act on.
fn report<T>(result: Result<T, ServiceError>) -> Result<T, CallFailure> {
    result.map_err(|e| {
        warn!("{}", e);
        CallFailure::from(&e)
    })
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Publishes the initial composer and filter state, probes the service, and
/// loads the board. Then listens on two channels using `tokio::select!`:
/// 1. User commands from the TUI
/// 2. Completions of spawned service calls
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut svc_rx: mpsc::Receiver<ServiceEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let _ = ui_tx.send(UiUpdate::Filter(state.board.filter())).await;
    let _ = ui_tx
        .send(UiUpdate::Composer(state.composer.snapshot()))
        .await;
    state.probe_health();
    state.load_comments();

    loop {
        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Service call completions ---
            // `state` holds a sender, so this channel never closes while the
            // loop runs.
            Some(event) = svc_rx.recv() => {
                handle_service_event(&mut state, event, &ui_tx).await;
            }
        }
    }

    // Cleanup
    state.cancel_all();
    info!("Application event loop exiting");
    Ok(())
}

async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Extract { content } => {
            if state.request_extraction(&content) {
                send_composer(state, ui_tx).await;
            } else {
                debug!(
                    "Extraction not started (phase: {:?})",
                    state.composer.phase()
                );
            }
        }
        UserCommand::Submit { content } => {
            if state.request_submission(&content) {
                send_composer(state, ui_tx).await;
            } else {
                debug!(
                    "Submission not started (phase: {:?})",
                    state.composer.phase()
                );
            }
        }
        UserCommand::ToggleFilter => {
            let filter = state.toggle_filter();
            let _ = ui_tx.send(UiUpdate::Filter(filter)).await;
        }
        UserCommand::ToggleVisibility { index } => {
            if !state.request_visibility(index) {
                debug!("No comment at index {}", index);
            }
        }
        UserCommand::Refresh => {
            info!("Refreshing comments");
            state.load_comments();
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

async fn handle_service_event(
    state: &mut AppState,
    event: ServiceEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match event {
        ServiceEvent::Extracted { result, generation } => {
            if !state.extract_task.finish(generation) {
                debug!("Discarding stale extraction result (gen: {})", generation);
                return;
            }
            observe(state, result.as_ref().err(), ui_tx).await;
            match result {
                Ok(points) => {
                    info!("Extracted {} key points", points.len());
                    let empty = points.is_empty();
                    state.composer.extraction_succeeded(points);
                    if empty {
                        notify(ui_tx, Notice::info("No key points found")).await;
                    }
                }
                Err(failure) => {
                    state.composer.extraction_failed();
                    notify(ui_tx, Notice::error(failure.message)).await;
                }
            }
            send_composer(state, ui_tx).await;
        }

        ServiceEvent::Submitted { result, generation } => {
            if !state.submit_task.finish(generation) {
                debug!("Discarding stale submission result (gen: {})", generation);
                return;
            }
            observe(state, result.as_ref().err(), ui_tx).await;
            match result {
                Ok(()) => {
                    info!("Comment submitted");
                    state.composer.submission_succeeded();
                    let _ = ui_tx.send(UiUpdate::DraftCleared).await;
                    send_composer(state, ui_tx).await;
                    notify(ui_tx, Notice::info("Comment submitted")).await;
                    state.load_comments();
                }
                Err(failure) => {
                    state.composer.submission_failed();
                    send_composer(state, ui_tx).await;
                    notify(ui_tx, Notice::error(failure.message)).await;
                }
            }
        }

        ServiceEvent::Listed {
            filter,
            result,
            generation,
        } => {
            if !state.list_task.finish(generation) {
                debug!("Discarding stale comment list (gen: {})", generation);
                return;
            }
            observe(state, result.as_ref().err(), ui_tx).await;
            match result {
                Ok(comments) => {
                    let refreshed_at = Local::now();
                    if !state.board.replace(filter, comments, refreshed_at) {
                        debug!("Discarding comment list fetched with {:?}", filter);
                        return;
                    }
                    debug!("Loaded {} comments", state.board.comments().len());
                    let _ = ui_tx
                        .send(UiUpdate::Comments {
                            comments: state.board.comments().to_vec(),
                            filter,
                            refreshed_at,
                        })
                        .await;
                }
                Err(failure) => {
                    notify(ui_tx, Notice::error(failure.message)).await;
                }
            }
        }

        ServiceEvent::VisibilityChanged {
            id,
            is_public,
            result,
            generation,
        } => {
            let current = state
                .visibility_tasks
                .get_mut(&id)
                .is_some_and(|slot| slot.finish(generation));
            if !current {
                debug!(
                    "Discarding stale visibility result for comment {} (gen: {})",
                    id, generation
                );
                return;
            }
            state.visibility_tasks.remove(&id);
            observe(state, result.as_ref().err(), ui_tx).await;
            match result {
                Ok(()) => {
                    info!("Comment {} is now public={}", id, is_public);
                    state.load_comments();
                }
                Err(failure) => {
                    notify(ui_tx, Notice::error(failure.message)).await;
                }
            }
        }

        ServiceEvent::Health { result, generation } => {
            if !state.health_task.finish(generation) {
                debug!("Discarding stale health result (gen: {})", generation);
                return;
            }
            observe(state, result.as_ref().err(), ui_tx).await;
            if let Err(failure) = result {
                notify(ui_tx, Notice::error(failure.message)).await;
            }
        }
    }
}

/// Update the connection indicator from the outcome of a call. A request the
/// service rejected still proves it is reachable.
async fn observe(
    state: &mut AppState,
    failure: Option<&CallFailure>,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let status = match failure {
        Some(f) if f.unreachable => ConnectionStatus::Unreachable,
        _ => ConnectionStatus::Connected,
    };
    if status != state.connection_status {
        info!("Comment service status: {:?}", status);
        state.connection_status = status;
        let _ = ui_tx.send(UiUpdate::ConnectionStatus(status)).await;
    }
}

async fn send_composer(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let _ = ui_tx
        .send(UiUpdate::Composer(state.composer.snapshot()))
        .await;
}

async fn notify(ui_tx: &mpsc::Sender<UiUpdate>, notice: Notice) {
    let _ = ui_tx.send(UiUpdate::Notice(notice)).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
