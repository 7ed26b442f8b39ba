//! Reaction-add fan-out from the gateway loop to waiting command handlers.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use twilight_model::{
    channel::message::EmojiReactionType,
    gateway::GatewayReaction,
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker, UserMarker},
    },
};

/// Emoji used to approve a confirmation prompt.
pub const APPROVE_EMOJI: &str = "\u{2705}";
/// Emoji used to deny a confirmation prompt.
pub const DENY_EMOJI: &str = "\u{274C}";

const DEFAULT_CAPACITY: usize = 256;

/// The two answers a confirmation prompt recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationReaction {
    Approve,
    Deny,
}

impl ConfirmationReaction {
    /// Reactions in the order they are attached to a prompt.
    pub const ALL: [Self; 2] = [Self::Approve, Self::Deny];

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Approve => APPROVE_EMOJI,
            Self::Deny => DENY_EMOJI,
        }
    }

    pub fn from_emoji(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reaction| reaction.emoji() == name)
    }
}

/// A reaction added to a message, reduced to what handlers filter on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionEvent {
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
    pub user_id: Id<UserMarker>,
    /// Unicode emoji, or the custom emoji's name (empty when unnamed).
    pub emoji: String,
    /// Reaction was added by a bot account, including this bot itself.
    pub from_bot: bool,
}

impl ReactionEvent {
    pub fn from_gateway(reaction: &GatewayReaction) -> Self {
        let emoji = match &reaction.emoji {
            EmojiReactionType::Unicode { name } => name.clone(),
            EmojiReactionType::Custom { name, .. } => name.clone().unwrap_or_default(),
        };

        Self {
            channel_id: reaction.channel_id,
            message_id: reaction.message_id,
            user_id: reaction.user_id,
            emoji,
            from_bot: reaction
                .member
                .as_ref()
                .is_some_and(|member| member.user.bot),
        }
    }
}

/// Broadcast hub fed by the gateway loop with every reaction-add event.
///
/// Cheap to clone; clones publish into the same channel.
#[derive(Clone, Debug)]
pub struct ReactionHub {
    sender: broadcast::Sender<ReactionEvent>,
}

impl Default for ReactionHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ReactionHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Deliver an event to every live subscription. Dropped when nobody listens.
    pub fn publish(&self, event: ReactionEvent) {
        let _ = self.sender.send(event);
    }

    /// Start receiving events published from now on.
    pub fn subscribe(&self) -> ReactionSubscription {
        ReactionSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live view of the reaction stream, consumed by a single wait.
#[derive(Debug)]
pub struct ReactionSubscription {
    receiver: broadcast::Receiver<ReactionEvent>,
}

impl ReactionSubscription {
    /// Wait for the first reaction on `message_id` by `confirmer` that is a
    /// recognized [`ConfirmationReaction`].
    ///
    /// Every other event is skipped, and so is anything a bot reacted with:
    /// the bot's own seed reactions must never answer its prompt. Returns `None` when `timeout` elapses or
    /// the hub is gone. The subscription ends when this returns.
    pub async fn first_confirmation(
        mut self,
        message_id: Id<MessageMarker>,
        confirmer: Id<UserMarker>,
        timeout: Duration,
    ) -> Option<ConfirmationReaction> {
        let wait = async {
            loop {
                let event = match self.receiver.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, message_id = message_id.get(), "reaction subscription lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => return None,
                };

                if event.from_bot || event.message_id != message_id || event.user_id != confirmer {
                    continue;
                }

                if let Some(reaction) = ConfirmationReaction::from_emoji(&event.emoji) {
                    return Some(reaction);
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(answer) => answer,
            Err(_) => {
                debug!(message_id = message_id.get(), "confirmation wait timed out");
                None
            }
        }
    }
}
