use std::sync::Arc;

use async_trait::async_trait;
use twilight_http::{Client, request::channel::reaction::RequestReactionType};
use twilight_model::{
    channel::message::embed::Embed,
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker, UserMarker},
    },
};

/// Outbound chat operations needed by command handlers.
///
/// Implemented over the Discord REST client in production and by recording
/// fakes in tests.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post an embed and return the created message's ID.
    async fn send_embed(
        &self,
        channel_id: Id<ChannelMarker>,
        embed: Embed,
    ) -> anyhow::Result<Id<MessageMarker>>;

    /// Post an embed with a user mention as message content.
    async fn send_embed_with_mention(
        &self,
        channel_id: Id<ChannelMarker>,
        mention: Id<UserMarker>,
        embed: Embed,
    ) -> anyhow::Result<Id<MessageMarker>>;

    /// Add a unicode reaction as the bot.
    async fn add_reaction(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        emoji: &str,
    ) -> anyhow::Result<()>;

    /// Remove every reaction on a message.
    async fn clear_reactions(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> anyhow::Result<()>;

    /// Replace the embeds of a previously sent message.
    async fn edit_embed(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        embed: Embed,
    ) -> anyhow::Result<()>;
}

/// [`Messenger`] backed by the shared twilight HTTP client.
#[derive(Clone)]
pub struct HttpMessenger {
    http: Arc<Client>,
}

impl HttpMessenger {
    pub fn new(http: Arc<Client>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Messenger for HttpMessenger {
    async fn send_embed(
        &self,
        channel_id: Id<ChannelMarker>,
        embed: Embed,
    ) -> anyhow::Result<Id<MessageMarker>> {
        let message = self
            .http
            .create_message(channel_id)
            .embeds(&[embed])
            .await?
            .model()
            .await?;

        Ok(message.id)
    }

    async fn send_embed_with_mention(
        &self,
        channel_id: Id<ChannelMarker>,
        mention: Id<UserMarker>,
        embed: Embed,
    ) -> anyhow::Result<Id<MessageMarker>> {
        let content = format!("<@{}>", mention.get());
        let message = self
            .http
            .create_message(channel_id)
            .content(&content)
            .embeds(&[embed])
            .await?
            .model()
            .await?;

        Ok(message.id)
    }

    async fn add_reaction(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        emoji: &str,
    ) -> anyhow::Result<()> {
        let reaction = RequestReactionType::Unicode { name: emoji };
        self.http
            .create_reaction(channel_id, message_id, &reaction)
            .await?;

        Ok(())
    }

    async fn clear_reactions(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> anyhow::Result<()> {
        self.http
            .delete_all_reactions(channel_id, message_id)
            .await?;

        Ok(())
    }

    async fn edit_embed(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        embed: Embed,
    ) -> anyhow::Result<()> {
        self.http
            .update_message(channel_id, message_id)
            .embeds(Some(&[embed]))
            .await?;

        Ok(())
    }
}
