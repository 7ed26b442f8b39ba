//! Enforcement of [`CommandMeta::permission`] before a command body runs.

use tracing::debug;
use twilight_model::{
    channel::message::embed::Embed,
    id::{Id, marker::ChannelMarker},
};

use crate::CommandMeta;
use tagbot_core::Context;
use tagbot_utils::{
    embed::error_embed,
    permissions::{Member, PermissionHandler, PermissionLevel},
};

/// Check that `member` covers the level `meta` requires.
///
/// On denial a missing-permission embed is sent to `channel_id` and `false`
/// is returned. A guarded command must always have a resolved member, so a
/// missing one is an error rather than a denial.
pub async fn guard(
    ctx: &Context,
    meta: &CommandMeta,
    channel_id: Id<ChannelMarker>,
    member: Option<&Member>,
) -> anyhow::Result<bool> {
    let Some(member) = member else {
        anyhow::bail!("missing member for guarded command `{}`", meta.name);
    };

    let required = meta.permission();
    if ctx.permissions.is_covered(member, required) {
        return Ok(true);
    }

    debug!(
        command = meta.name,
        user_id = member.user_id.get(),
        %required,
        "member lacks command permission"
    );
    let embed = missing_permission_embed(required)?;
    ctx.messenger.send_embed(channel_id, embed).await?;

    Ok(false)
}

/// The permission check of [`guard`] as a plain predicate, with no reply.
pub fn as_precondition(
    handler: &dyn PermissionHandler,
) -> impl Fn(&Member, &CommandMeta) -> bool + '_ {
    move |member, meta| handler.is_covered(member, meta.permission())
}

fn missing_permission_embed(required: PermissionLevel) -> anyhow::Result<Embed> {
    error_embed(
        "Missing permission",
        format!("You need the `{required}` permission to use this command."),
    )
}
