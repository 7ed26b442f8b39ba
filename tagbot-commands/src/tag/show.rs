use crate::{CommandMeta, Invocation};
use crate::tag::embeds::{tag_embed, tag_not_found_embed, usage_embed};
use tagbot_core::Context;
use tagbot_utils::parse::normalize_tag_name;

pub const META: CommandMeta = CommandMeta::new("tag", "Show a tag.", "tags", "!tag <name>");

/// Post the text of a tag.
pub async fn run(ctx: &Context, invocation: &Invocation) -> anyhow::Result<()> {
    let Some(name) = invocation.arg1().and_then(normalize_tag_name) else {
        ctx.messenger
            .send_embed(invocation.channel_id, usage_embed(META.usage)?)
            .await?;
        return Ok(());
    };

    let embed = match ctx.tags.find(&name).await? {
        Some(tag) => tag_embed(&tag)?,
        None => tag_not_found_embed(&name)?,
    };
    ctx.messenger.send_embed(invocation.channel_id, embed).await?;

    Ok(())
}
