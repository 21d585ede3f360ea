//! Widget runtime.
//!
//! One task per widget session multiplexes the configuration change feed,
//! the single armed deadline, and presentation commands into the engine.
//! Arming a new deadline replaces the previous sleep, so at most one is
//! ever pending; dropping the task drops the subscription guard and any
//! armed deadline with it.

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep, sleep_until};

use super::engine::{AdvanceOutcome, PopupEngine, Reschedule};
use crate::presentation::PopupView;
use crate::session::{ClientStore, resolve_tenant};
use crate::store::{ChangeKind, ChangeReceiver, ConfigChange, ConfigStore, ResponseSink, Subscription};
use crate::error::Result;

/// Input from the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCommand {
    /// Record a rating
    SetRating(u8),
    /// Replace the review text
    SetReview(String),
    /// Advance to the next step (or submit from the last one)
    Advance,
    /// Tear the widget down
    Shutdown,
}

/// Output for the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// Popup became visible
    Presented(PopupView),
    /// Visible dialog changed (rating, review or step)
    Updated(PopupView),
    /// Popup left the screen without a submission
    Dismissed,
    /// Review was submitted (popup already hidden)
    Submitted,
}

/// Handle to a running widget session.
pub struct WidgetHandle {
    commands: mpsc::UnboundedSender<WidgetCommand>,
    events: mpsc::UnboundedReceiver<WidgetEvent>,
    task: JoinHandle<()>,
}

impl WidgetHandle {
    /// Record a rating.
    pub fn set_rating(&self, rating: u8) {
        let _ = self.commands.send(WidgetCommand::SetRating(rating));
    }

    /// Replace the review text.
    pub fn set_review(&self, review: impl Into<String>) {
        let _ = self.commands.send(WidgetCommand::SetReview(review.into()));
    }

    /// Advance to the next step.
    pub fn advance(&self) {
        let _ = self.commands.send(WidgetCommand::Advance);
    }

    /// Ask the session to tear down.
    pub fn shutdown(&self) {
        let _ = self.commands.send(WidgetCommand::Shutdown);
    }

    /// Wait for the next surface event.
    pub async fn next_event(&mut self) -> Option<WidgetEvent> {
        self.events.recv().await
    }

    /// Poll for a surface event without waiting.
    pub fn try_next_event(&mut self) -> Option<WidgetEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the session task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }

    /// Abort the session task outright.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Activate a widget session.
///
/// Resolves the tenant identifier from durable storage; with none present
/// the widget is dormant and `Ok(None)` is returned (terminal for this
/// session). Otherwise the change feed is opened, the landing instant is
/// captured, and the session task starts.
pub async fn activate<C, R, S>(
    store: Arc<C>,
    sink: Arc<R>,
    durable: &dyn ClientStore,
    session: S,
) -> Result<Option<WidgetHandle>>
where
    C: ConfigStore + 'static,
    R: ResponseSink + 'static,
    S: ClientStore + 'static,
{
    let Some(tenant) = resolve_tenant(durable)? else {
        log::info!("No tenant identifier in durable storage, widget dormant");
        return Ok(None);
    };

    let landed_at = Instant::now();
    let (changes, subscription) = store.subscribe(&tenant).await?;
    let engine = PopupEngine::new(tenant, session, landed_at);

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(run_session(
        engine,
        changes,
        subscription,
        command_rx,
        event_tx,
        sink,
    ));

    Ok(Some(WidgetHandle {
        commands: command_tx,
        events: event_rx,
        task,
    }))
}

/// Await the armed deadline, or park forever when none is armed.
async fn armed_deadline(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn run_session<R, S>(
    mut engine: PopupEngine<S>,
    mut changes: ChangeReceiver,
    subscription: Subscription,
    mut commands: mpsc::UnboundedReceiver<WidgetCommand>,
    events: mpsc::UnboundedSender<WidgetEvent>,
    sink: Arc<R>,
) where
    R: ResponseSink + 'static,
    S: ClientStore,
{
    // Held for the whole session; dropping it on any exit path cancels
    // the change feed.
    let _subscription = subscription;

    // The single pending deadline. Re-assigning drops (cancels) the
    // previous sleep, so a superseded deadline can never fire.
    let mut deadline: Option<Pin<Box<Sleep>>> = None;
    let mut feed_open = true;

    loop {
        tokio::select! {
            maybe_change = changes.recv(), if feed_open => {
                match maybe_change {
                    Some(change) => {
                        handle_change(&mut engine, change, &mut deadline, &events);
                    }
                    None => {
                        // Feed ended; deadlines and commands stay live,
                        // reconnection is the store's concern.
                        log::warn!("Configuration change feed closed");
                        feed_open = false;
                    }
                }
            }
            () = armed_deadline(&mut deadline) => {
                deadline = None;
                let outcome = engine.deadline_fired(Instant::now());
                if outcome.shown() {
                    emit_presented(&engine, &events);
                }
            }
            maybe_command = commands.recv() => {
                match maybe_command {
                    Some(WidgetCommand::Shutdown) | None => break,
                    Some(command) => {
                        handle_command(&mut engine, command, &mut deadline, &events, &sink);
                    }
                }
            }
        }
    }

    log::debug!("Widget session for tenant {} finished", engine.tenant());
}

fn handle_change<S: ClientStore>(
    engine: &mut PopupEngine<S>,
    change: ConfigChange,
    deadline: &mut Option<Pin<Box<Sleep>>>,
    events: &mpsc::UnboundedSender<WidgetEvent>,
) {
    match change.kind {
        ChangeKind::Added | ChangeKind::Modified => {
            let Some(record) = change.record else {
                log::warn!("Change event without a record, treating as absent");
                hide(engine, events);
                return;
            };
            if let Err(e) = record.validate() {
                // Malformed records behave like absent configuration.
                log::warn!("Ignoring invalid configuration: {}", e);
                hide(engine, events);
                return;
            }
            match engine.apply_config(record, Instant::now()) {
                Reschedule::Armed(target) => {
                    *deadline = Some(Box::pin(sleep_until(target)));
                }
                Reschedule::Fired(outcome) => {
                    *deadline = None;
                    if outcome.shown() {
                        emit_presented(engine, events);
                    }
                }
            }
        }
        ChangeKind::Removed => {
            hide(engine, events);
        }
    }
}

fn handle_command<R, S>(
    engine: &mut PopupEngine<S>,
    command: WidgetCommand,
    deadline: &mut Option<Pin<Box<Sleep>>>,
    events: &mpsc::UnboundedSender<WidgetEvent>,
    sink: &Arc<R>,
) where
    R: ResponseSink + 'static,
    S: ClientStore,
{
    match command {
        WidgetCommand::SetRating(rating) => {
            engine.set_rating(rating);
            emit_updated(engine, events);
        }
        WidgetCommand::SetReview(review) => {
            engine.set_review(review);
            emit_updated(engine, events);
        }
        WidgetCommand::Advance => match engine.advance(Instant::now()) {
            AdvanceOutcome::MovedToReview => emit_updated(engine, events),
            AdvanceOutcome::Submitted {
                record,
                next_deadline,
            } => {
                let _ = events.send(WidgetEvent::Submitted);
                *deadline = Some(Box::pin(sleep_until(next_deadline)));

                // Popup is already hidden optimistically; a failed append
                // is logged and accepted, never retried or surfaced.
                let sink = sink.clone();
                tokio::spawn(async move {
                    if let Err(e) = sink.append(record).await {
                        log::error!("Failed to append response: {}", e);
                    }
                });
            }
            AdvanceOutcome::Rejected | AdvanceOutcome::NotVisible => {}
        },
        // Shutdown never reaches here; the session loop breaks on it.
        WidgetCommand::Shutdown => {}
    }
}

fn hide<S: ClientStore>(engine: &mut PopupEngine<S>, events: &mpsc::UnboundedSender<WidgetEvent>) {
    let was_visible = engine.visible();
    engine.config_removed();
    if was_visible {
        let _ = events.send(WidgetEvent::Dismissed);
    }
}

fn emit_presented<S: ClientStore>(
    engine: &PopupEngine<S>,
    events: &mpsc::UnboundedSender<WidgetEvent>,
) {
    if let Some(view) = engine.view() {
        let _ = events.send(WidgetEvent::Presented(view));
    }
}

fn emit_updated<S: ClientStore>(
    engine: &PopupEngine<S>,
    events: &mpsc::UnboundedSender<WidgetEvent>,
) {
    if let Some(view) = engine.view() {
        let _ = events.send(WidgetEvent::Updated(view));
    }
}
