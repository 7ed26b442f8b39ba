use crate::tag::embeds::{tag_history_embed, tag_not_found_embed, usage_embed};
use crate::{CommandMeta, Invocation};
use tagbot_core::Context;
use tagbot_utils::{parse::normalize_tag_name, permissions::PermissionLevel};

pub const META: CommandMeta = CommandMeta::new(
    "taghistory",
    "Show the full change history of a tag.",
    "tags",
    "!taghistory <name>",
)
.with_permission(PermissionLevel::Moderator);

pub async fn run(ctx: &Context, invocation: &Invocation) -> anyhow::Result<()> {
    let Some(name) = invocation.arg1().and_then(normalize_tag_name) else {
        ctx.messenger
            .send_embed(invocation.channel_id, usage_embed(META.usage)?)
            .await?;
        return Ok(());
    };

    // History outlives the tag, so a deleted tag's log is still shown.
    let changes = ctx.tags.changes(&name).await?;
    if changes.is_empty() && ctx.tags.find(&name).await?.is_none() {
        ctx.messenger
            .send_embed(invocation.channel_id, tag_not_found_embed(&name)?)
            .await?;
        return Ok(());
    }

    let embed = tag_history_embed(&name, &changes)?;
    ctx.messenger.send_embed(invocation.channel_id, embed).await?;

    Ok(())
}
