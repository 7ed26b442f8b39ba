use tracing::info;
use twilight_model::id::{Id, marker::ChannelMarker};

use crate::{CommandMeta, Invocation};
use crate::tag::embeds::{tag_created_embed, tag_exists_embed, tag_too_long_embed, usage_embed};
use tagbot_core::Context;
use tagbot_database::tags::TagEntry;
use tagbot_utils::{parse::normalize_tag_name, permissions::Member, time::now_unix_secs};

pub const META: CommandMeta = CommandMeta::new(
    "create",
    "Create a new tag owned by you.",
    "tags",
    "!create <name> <text>",
);

/// Longest accepted tag name, in characters.
pub const MAX_NAME_CHARS: usize = 32;
/// Longest accepted tag text, in characters.
pub const MAX_TEXT_CHARS: usize = 2_000;

pub async fn run(ctx: &Context, invocation: &Invocation, member: &Member) -> anyhow::Result<()> {
    let (Some(name), Some(text)) = (
        invocation.arg1().and_then(normalize_tag_name),
        invocation.arg_tail(),
    ) else {
        ctx.messenger
            .send_embed(invocation.channel_id, usage_embed(META.usage)?)
            .await?;
        return Ok(());
    };

    create(ctx, invocation.channel_id, member, name, text).await
}

async fn create(
    ctx: &Context,
    channel_id: Id<ChannelMarker>,
    member: &Member,
    name: String,
    text: &str,
) -> anyhow::Result<()> {
    if name.chars().count() > MAX_NAME_CHARS {
        ctx.messenger
            .send_embed(channel_id, usage_embed(META.usage)?)
            .await?;
        return Ok(());
    }

    if text.chars().count() > MAX_TEXT_CHARS {
        ctx.messenger
            .send_embed(channel_id, tag_too_long_embed(MAX_TEXT_CHARS)?)
            .await?;
        return Ok(());
    }

    let tag = TagEntry {
        name,
        author_id: member.user_id,
        text: text.to_owned(),
        created_at: now_unix_secs(),
    };

    let embed = if ctx.tags.insert(&tag).await? {
        info!(tag = %tag.name, author = member.user_id.get(), "tag created");
        tag_created_embed(&tag.name)?
    } else {
        tag_exists_embed(&tag.name)?
    };
    ctx.messenger.send_embed(channel_id, embed).await?;

    Ok(())
}
