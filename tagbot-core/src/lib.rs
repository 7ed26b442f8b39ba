use std::sync::Arc;

use twilight_http::Client;

use tagbot_database::tags::TagRepository;
use tagbot_utils::{
    inflight::InFlightSet,
    messenger::{HttpMessenger, Messenger},
    permissions::PermissionHandler,
    reactions::ReactionHub,
};

/// Environment-driven bot configuration.
pub mod config;

/// Shared application context passed into command handlers.
///
/// Cheap to clone because it only stores reference-counted shared state.
#[derive(Clone)]
pub struct Context {
    pub http: Arc<Client>,
    pub messenger: Arc<dyn Messenger>,
    pub tags: Arc<dyn TagRepository>,
    pub permissions: Arc<dyn PermissionHandler>,
    /// Reaction-add events fanned out from the gateway loop.
    pub reactions: ReactionHub,
    /// Names of tags currently awaiting a transfer confirmation.
    pub transfers: InFlightSet,
}

impl Context {
    /// Create a new application context that talks to Discord through `http`.
    pub fn new(
        http: Arc<Client>,
        tags: Arc<dyn TagRepository>,
        permissions: Arc<dyn PermissionHandler>,
    ) -> Self {
        let messenger = Arc::new(HttpMessenger::new(Arc::clone(&http)));

        Self {
            http,
            messenger,
            tags,
            permissions,
            reactions: ReactionHub::default(),
            transfers: InFlightSet::new(),
        }
    }

    /// Replace the outbound messaging capability.
    pub fn with_messenger(mut self, messenger: Arc<dyn Messenger>) -> Self {
        self.messenger = messenger;
        self
    }
}
