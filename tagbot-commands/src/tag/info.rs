use crate::{CommandMeta, Invocation};
use crate::tag::embeds::{tag_info_embed, tag_not_found_embed, usage_embed};
use tagbot_core::Context;
use tagbot_utils::parse::normalize_tag_name;

pub const META: CommandMeta = CommandMeta::new(
    "taginfo",
    "Show who owns a tag and how it changed.",
    "tags",
    "!taginfo <name>",
);

pub async fn run(ctx: &Context, invocation: &Invocation) -> anyhow::Result<()> {
    let Some(name) = invocation.arg1().and_then(normalize_tag_name) else {
        ctx.messenger
            .send_embed(invocation.channel_id, usage_embed(META.usage)?)
            .await?;
        return Ok(());
    };

    let Some(tag) = ctx.tags.find(&name).await? else {
        ctx.messenger
            .send_embed(invocation.channel_id, tag_not_found_embed(&name)?)
            .await?;
        return Ok(());
    };

    let changes = ctx.tags.changes(&tag.name).await?;
    let embed = tag_info_embed(&tag, &changes)?;
    ctx.messenger.send_embed(invocation.channel_id, embed).await?;

    Ok(())
}
