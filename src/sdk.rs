//! The service desk facade.
//!
//! One [`ServiceDesk`] is built per application and owns every shared
//! component: the repositories, the request worker behind them, live updates
//! and local storage. Components are handed out as `Arc`s; there is no global
//! instance.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::api::{ApiClient, ServiceDeskApi};
use crate::config::{ConfigError, SdkConfig};
use crate::data::{
    Comment, CommentId, LocalDataProvider, Ticket, TicketDescription, TicketId,
    TicketShortDescription,
};
use crate::files::{FileResolver, LocalFileResolver};
use crate::repository::web::ClientIdentity;
use crate::repository::{CentralRepository, RemoteRepository, WebRepository};
use crate::response::{Response, ResponseError};
use crate::storage::{DraftRepository, PreferenceOfflineRepository, PreferenceStore, StorageError};
use crate::updates::{LiveUpdates, TicketListHandle, TicketListWatcher, Update, UpdateType};
use crate::upload::SharedHooks;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Entry point of the SDK.
pub struct ServiceDesk {
    identity: ClientIdentity,
    repository: Arc<CentralRepository>,
    updates: Arc<LiveUpdates>,
    drafts: DraftRepository,
    local_data: LocalDataProvider,
}

impl ServiceDesk {
    /// Build the SDK against the HTTP API and the local filesystem. Must be
    /// called from within a tokio runtime.
    pub fn init(config: &SdkConfig) -> Result<Self, SdkError> {
        config.validate()?;
        let store = Arc::new(PreferenceStore::open(config.preferences_path())?);
        let identity = ClientIdentity {
            app_id: config.app_id.clone(),
            user_id: store.user_id()?,
            user_name: config.user_name.clone(),
        };
        log::info!(
            "Service desk initialized for app {} at {}",
            identity.app_id,
            config.base_url
        );
        Ok(Self::with_parts(
            identity,
            Arc::new(ApiClient::from_config(config)),
            Arc::new(LocalFileResolver::new()),
            store,
        ))
    }

    /// Build the SDK from explicit components.
    pub fn with_parts(
        identity: ClientIdentity,
        api: Arc<dyn ServiceDeskApi>,
        resolver: Arc<dyn FileResolver>,
        store: Arc<PreferenceStore>,
    ) -> Self {
        let web = Arc::new(WebRepository::new(api, resolver.clone(), identity.clone()));
        let offline = Arc::new(PreferenceOfflineRepository::new(store.clone()));
        let repository = Arc::new(CentralRepository::new(web, offline, resolver.clone()));
        Self {
            local_data: LocalDataProvider::new(identity.user_name.clone(), resolver),
            drafts: DraftRepository::new(store),
            updates: Arc::new(LiveUpdates::new()),
            repository,
            identity,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn repository(&self) -> Arc<CentralRepository> {
        self.repository.clone()
    }

    pub fn updates(&self) -> Arc<LiveUpdates> {
        self.updates.clone()
    }

    pub fn drafts(&self) -> &DraftRepository {
        &self.drafts
    }

    pub fn local_data(&self) -> &LocalDataProvider {
        &self.local_data
    }

    pub async fn get_feed(&self) -> Response<Vec<Comment>> {
        self.repository.get_feed().await
    }

    pub async fn get_tickets(&self) -> Response<Vec<TicketShortDescription>> {
        self.repository.get_tickets().await
    }

    pub async fn get_ticket(&self, ticket_id: TicketId) -> Response<Ticket> {
        self.repository.get_ticket(ticket_id).await
    }

    /// Create a ticket and announce it as [`UpdateType::TicketCreated`].
    pub async fn create_ticket(
        &self,
        description: TicketDescription,
        hooks: Option<SharedHooks>,
    ) -> Response<TicketId> {
        let result = self.repository.create_ticket(description, hooks).await;
        let update = match &result {
            Ok(ticket_id) => Update::new(UpdateType::TicketCreated).with_ticket(*ticket_id),
            Err(e) => Update::new(UpdateType::TicketCreated).with_error(e.clone()),
        };
        self.updates.publish(update);
        result
    }

    /// Post a comment to a ticket and announce it as
    /// [`UpdateType::CommentAdded`].
    pub async fn add_comment(
        &self,
        ticket_id: TicketId,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId> {
        let result = self.repository.add_comment(ticket_id, comment, hooks).await;
        self.publish_comment(Some(ticket_id), &result);
        result
    }

    pub async fn add_feed_comment(
        &self,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId> {
        let result = self.repository.add_feed_comment(comment, hooks).await;
        self.publish_comment(None, &result);
        result
    }

    /// Register the device push token. Blank values are rejected before any
    /// request is made.
    pub async fn set_push_token(&self, token: &str) -> Response<()> {
        if token.trim().is_empty() {
            return Err(ResponseError::api("Token is empty"));
        }
        if self.identity.app_id.trim().is_empty() {
            return Err(ResponseError::api("App id is empty"));
        }
        if self.identity.user_id.trim().is_empty() {
            return Err(ResponseError::api("User id is empty"));
        }
        self.repository.set_push_token(token).await
    }

    /// Forward a push notification payload to live update subscribers.
    pub fn on_push_message(&self, payload: &str) -> bool {
        self.updates.on_push_message(payload)
    }

    /// Start a background holder of the ticket list.
    pub fn watch_tickets(&self, poll_interval: Option<Duration>) -> TicketListHandle {
        TicketListWatcher::spawn(self.repository.clone(), self.updates.clone(), poll_interval)
    }

    fn publish_comment(&self, ticket_id: Option<TicketId>, result: &Response<CommentId>) {
        let mut update = Update::new(UpdateType::CommentAdded);
        update.ticket_id = ticket_id;
        if let Err(e) = result {
            update.error = Some(e.clone());
        }
        self.updates.publish(update);
    }
}
