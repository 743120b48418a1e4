//! Background holder of the ticket list.
//!
//! Refetches the list through a repository whenever a ticket is created or
//! updated without error, on explicit request, and optionally on a fixed
//! interval. Consumers read the latest state from a watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Interval;

use super::{LiveUpdates, Update, UpdateSubscriber, UpdateType};
use crate::data::TicketShortDescription;
use crate::repository::RemoteRepository;
use crate::response::ResponseError;

/// Latest known ticket list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketListState {
    pub tickets: Vec<TicketShortDescription>,
    /// Error of the most recent refresh; the previous list is kept.
    pub error: Option<ResponseError>,
    pub refreshes: u64,
}

impl TicketListState {
    pub fn unread_count(&self) -> usize {
        self.tickets.iter().filter(|t| !t.is_read).count()
    }
}

enum Command {
    Refresh,
    Stop,
}

/// Turns ticket updates into refresh commands.
struct RefreshTrigger {
    commands: mpsc::Sender<Command>,
}

impl UpdateSubscriber for RefreshTrigger {
    fn on_update(&self, update: &Update) {
        if update.has_error() {
            return;
        }
        // A full channel already holds a pending refresh.
        let _ = self.commands.try_send(Command::Refresh);
    }

    fn update_types(&self) -> Option<Vec<UpdateType>> {
        Some(vec![UpdateType::TicketCreated, UpdateType::TicketUpdated])
    }
}

/// Handle to a running [`TicketListWatcher`].
#[derive(Clone)]
pub struct TicketListHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<TicketListState>,
}

impl TicketListHandle {
    pub fn state(&self) -> TicketListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TicketListState> {
        self.state.clone()
    }

    pub async fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh).await;
    }

    /// Ask the watcher to stop. It unsubscribes from live updates on exit.
    pub async fn stop(&self) {
        let _ = self.commands.send(Command::Stop).await;
    }
}

pub struct TicketListWatcher {
    repository: Arc<dyn RemoteRepository>,
    updates: Arc<LiveUpdates>,
    subscriber: Arc<dyn UpdateSubscriber>,
    commands: mpsc::Receiver<Command>,
    state: watch::Sender<TicketListState>,
    poll_interval: Option<Duration>,
}

impl TicketListWatcher {
    /// Create the watcher and register it for ticket updates.
    pub fn new(
        repository: Arc<dyn RemoteRepository>,
        updates: Arc<LiveUpdates>,
        poll_interval: Option<Duration>,
    ) -> (Self, TicketListHandle) {
        let (tx, rx) = mpsc::channel(8);
        let (state, state_rx) = watch::channel(TicketListState::default());
        let subscriber: Arc<dyn UpdateSubscriber> = Arc::new(RefreshTrigger {
            commands: tx.clone(),
        });
        updates.subscribe(subscriber.clone());
        let watcher = Self {
            repository,
            updates,
            subscriber,
            commands: rx,
            state,
            poll_interval,
        };
        let handle = TicketListHandle {
            commands: tx,
            state: state_rx,
        };
        (watcher, handle)
    }

    /// Create the watcher and run it on a new tokio task.
    pub fn spawn(
        repository: Arc<dyn RemoteRepository>,
        updates: Arc<LiveUpdates>,
        poll_interval: Option<Duration>,
    ) -> TicketListHandle {
        let (watcher, handle) = Self::new(repository, updates, poll_interval);
        tokio::spawn(watcher.run());
        handle
    }

    /// Main run loop: an initial fetch, then one fetch per trigger or tick.
    pub async fn run(mut self) {
        let mut ticker = self.poll_interval.map(tokio::time::interval);
        if let Some(ticker) = ticker.as_mut() {
            // The first tick fires immediately and the initial fetch covers it.
            ticker.tick().await;
        }
        log::info!("Ticket list watcher started");
        self.refresh().await;

        loop {
            tokio::select! {
                _ = tick(&mut ticker) => {
                    self.refresh().await;
                }
                command = self.commands.recv() => match command {
                    Some(Command::Refresh) => self.refresh().await,
                    Some(Command::Stop) | None => break,
                },
            }
        }

        self.updates.unsubscribe(&self.subscriber);
        log::info!("Ticket list watcher stopped");
    }

    async fn refresh(&mut self) {
        let result = self.repository.get_tickets().await;
        self.state.send_modify(|state| {
            state.refreshes += 1;
            match result {
                Ok(tickets) => {
                    log::debug!("Ticket list refreshed ({} tickets)", tickets.len());
                    state.tickets = tickets;
                    state.error = None;
                }
                Err(e) => {
                    log::warn!("Ticket list refresh failed: {}", e);
                    state.error = Some(e);
                }
            }
        });
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
