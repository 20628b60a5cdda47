//! Incremental watch orchestration for Routegen.
//!
//! The watch primitive itself is an external collaborator: the host feeds
//! `add`/`change`/`delete` events in through `notify`. One worker thread
//! drains the event queue, coalesces structural events behind a sliding
//! quiet period, and regenerates single files immediately. An in-flight
//! pass is never preempted; debouncing only prevents scheduling overlap.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::mapper::{RouteRole, RouteTreeEntry};
use crate::sync::RouteCompiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WatchEventKind {
    Add,
    Change,
    Delete,
}

impl WatchEventKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "add" => Some(Self::Add),
            "change" => Some(Self::Change),
            "delete" | "unlink" => Some(Self::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Regenerating,
}

/// What one event asks of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    /// Debounced full reconciliation pass.
    ScheduleFull,
    /// Immediate regeneration of one file's artifact(s).
    RegenerateNow(PathBuf),
    Ignore,
}

/// Structural events reshape the tree (or a shared shell) and need a full
/// pass; a content change on a single non-structural file does not affect
/// layout-chain membership and regenerates just that file. Layout content
/// changes are scoped by `RouteCompiler::regenerate_file` to the routes
/// whose chain contains the layout.
pub fn plan_action(routes_root: &Path, event: &WatchEvent) -> EventAction {
    let Some(entry) = RouteTreeEntry::from_paths(routes_root, &event.path) else {
        return EventAction::Ignore;
    };
    match event.kind {
        WatchEventKind::Add | WatchEventKind::Delete => EventAction::ScheduleFull,
        WatchEventKind::Change => match entry.role {
            RouteRole::Special => EventAction::ScheduleFull,
            RouteRole::Other => EventAction::Ignore,
            _ => EventAction::RegenerateNow(event.path.clone()),
        },
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════════

pub struct WatchOrchestrator {
    sender: Sender<WatchEvent>,
    state: Arc<Mutex<OrchestratorState>>,
}

impl WatchOrchestrator {
    /// Run the startup reconciliation pass on the worker thread, then keep
    /// draining events until the host process exits. There is no terminal
    /// state and no cancellation.
    pub fn start(compiler: Arc<RouteCompiler>) -> Self {
        let (sender, receiver) = channel();
        let state = Arc::new(Mutex::new(OrchestratorState::Regenerating));
        let worker_state = Arc::clone(&state);
        thread::spawn(move || run_loop(compiler, receiver, worker_state));
        Self { sender, state }
    }

    /// Feed one event from the host's watch primitive.
    pub fn notify(&self, event: WatchEvent) {
        // A send failure means the worker is gone with the process.
        let _ = self.sender.send(event);
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.lock().unwrap()
    }
}

fn run_loop(
    compiler: Arc<RouteCompiler>,
    receiver: Receiver<WatchEvent>,
    state: Arc<Mutex<OrchestratorState>>,
) {
    let window = Duration::from_millis(u64::from(compiler.config().debounce_ms));
    let routes_root = compiler.config().routes_root().to_path_buf();

    compiler.full_sync();
    *state.lock().unwrap() = OrchestratorState::Idle;

    // Sliding deadline: every structural event pushes it out again, so a
    // burst of events collapses into one pass once the tree goes quiet.
    let mut deadline: Option<Instant> = None;

    loop {
        let received = match deadline {
            Some(at) => receiver.recv_timeout(at.saturating_duration_since(Instant::now())),
            None => receiver
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(event) => {
                if event.kind != WatchEventKind::Add {
                    compiler.cache().invalidate(&event.path);
                }
                match plan_action(&routes_root, &event) {
                    EventAction::ScheduleFull => {
                        deadline = Some(Instant::now() + window);
                    }
                    EventAction::RegenerateNow(path) => {
                        *state.lock().unwrap() = OrchestratorState::Regenerating;
                        compiler.regenerate_file(&path);
                        *state.lock().unwrap() = OrchestratorState::Idle;
                    }
                    EventAction::Ignore => {}
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if deadline.is_some_and(|at| Instant::now() >= at) {
                    deadline = None;
                    *state.lock().unwrap() = OrchestratorState::Regenerating;
                    compiler.full_sync();
                    *state.lock().unwrap() = OrchestratorState::Idle;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
