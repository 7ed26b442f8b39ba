//! Recording fakes for exercising command handlers without Discord.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use twilight_http::Client;
use twilight_model::{
    channel::message::embed::Embed,
    guild::Permissions,
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker, UserMarker},
    },
};

use tagbot_core::Context;
use tagbot_database::tags::{MemoryTagRepository, TagEntry};
use tagbot_utils::{
    messenger::Messenger,
    permissions::{GuildPermissionHandler, Member},
};

/// One outbound operation observed by [`RecordingMessenger`].
#[derive(Clone, Debug)]
pub enum Call {
    Send {
        message_id: Id<MessageMarker>,
        mention: Option<Id<UserMarker>>,
        embed: Embed,
    },
    AddReaction {
        message_id: Id<MessageMarker>,
        emoji: String,
    },
    ClearReactions {
        message_id: Id<MessageMarker>,
    },
    EditEmbed {
        message_id: Id<MessageMarker>,
        embed: Embed,
    },
}

#[derive(Default)]
pub struct RecordingMessenger {
    calls: Mutex<Vec<Call>>,
    next_message_id: AtomicU64,
    clear_delay: Mutex<Option<Duration>>,
    clears_fail: AtomicBool,
}

impl RecordingMessenger {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Make every `clear_reactions` call take `delay` before it is recorded.
    pub fn delay_clears(&self, delay: Duration) {
        *self.clear_delay.lock().expect("delay lock") = Some(delay);
    }

    /// Make every `clear_reactions` call fail, as Discord does without `MANAGE_MESSAGES`.
    pub fn fail_clears(&self) {
        self.clears_fail.store(true, Ordering::SeqCst);
    }

    /// Embeds sent as new messages, in order.
    pub fn sent(&self) -> Vec<(Id<MessageMarker>, Option<Id<UserMarker>>, Embed)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send {
                    message_id,
                    mention,
                    embed,
                } => Some((message_id, mention, embed)),
                _ => None,
            })
            .collect()
    }

    pub fn reactions_on(&self, message: Id<MessageMarker>) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AddReaction { message_id, emoji } if message_id == message => Some(emoji),
                _ => None,
            })
            .collect()
    }

    pub fn edits_of(&self, message: Id<MessageMarker>) -> Vec<Embed> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::EditEmbed { message_id, embed } if message_id == message => Some(embed),
                _ => None,
            })
            .collect()
    }

    pub fn was_cleared(&self, message: Id<MessageMarker>) -> bool {
        self.calls().iter().any(
            |call| matches!(call, Call::ClearReactions { message_id } if *message_id == message),
        )
    }

    /// Yield until a prompt with both reactions is up, returning its ID.
    pub async fn wait_for_prompt(&self) -> Id<MessageMarker> {
        for _ in 0..1_000 {
            let prompt = self
                .sent()
                .into_iter()
                .find(|(_, mention, _)| mention.is_some())
                .map(|(message_id, _, _)| message_id);

            if let Some(message_id) = prompt
                && self.reactions_on(message_id).len() == 2
            {
                return message_id;
            }

            tokio::task::yield_now().await;
        }

        panic!("confirmation prompt never appeared: {:?}", self.calls());
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn allocate_message_id(&self) -> Id<MessageMarker> {
        Id::new(1_000 + self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_embed(
        &self,
        _channel_id: Id<ChannelMarker>,
        embed: Embed,
    ) -> anyhow::Result<Id<MessageMarker>> {
        let message_id = self.allocate_message_id();
        self.record(Call::Send {
            message_id,
            mention: None,
            embed,
        });
        Ok(message_id)
    }

    async fn send_embed_with_mention(
        &self,
        _channel_id: Id<ChannelMarker>,
        mention: Id<UserMarker>,
        embed: Embed,
    ) -> anyhow::Result<Id<MessageMarker>> {
        let message_id = self.allocate_message_id();
        self.record(Call::Send {
            message_id,
            mention: Some(mention),
            embed,
        });
        Ok(message_id)
    }

    async fn add_reaction(
        &self,
        _channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        emoji: &str,
    ) -> anyhow::Result<()> {
        self.record(Call::AddReaction {
            message_id,
            emoji: emoji.to_owned(),
        });
        Ok(())
    }

    async fn clear_reactions(
        &self,
        _channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> anyhow::Result<()> {
        let delay = *self.clear_delay.lock().expect("delay lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.clears_fail.load(Ordering::SeqCst) {
            anyhow::bail!("Missing Permissions");
        }

        self.record(Call::ClearReactions { message_id });
        Ok(())
    }

    async fn edit_embed(
        &self,
        _channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        embed: Embed,
    ) -> anyhow::Result<()> {
        self.record(Call::EditEmbed { message_id, embed });
        Ok(())
    }
}

/// Context wired to a recording messenger and an in-memory tag store.
pub fn test_context() -> (Context, Arc<RecordingMessenger>, Arc<MemoryTagRepository>) {
    let messenger = Arc::new(RecordingMessenger::default());
    let tags = Arc::new(MemoryTagRepository::new());
    let http = Arc::new(Client::new(String::from("test-token")));

    let ctx = Context::new(
        http,
        tags.clone(),
        Arc::new(GuildPermissionHandler::default()),
    )
    .with_messenger(messenger.clone());

    (ctx, messenger, tags)
}

pub fn member(user: u64, permissions: Permissions) -> Member {
    Member {
        user_id: Id::new(user),
        guild_id: Id::new(1),
        permissions,
    }
}

pub fn tag(name: &str, author: u64, text: &str) -> TagEntry {
    TagEntry {
        name: name.to_owned(),
        author_id: Id::new(author),
        text: text.to_owned(),
        created_at: 1_700_000_000,
    }
}
