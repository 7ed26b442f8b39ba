pub mod create;
pub mod delete;
pub mod embeds;
pub mod history;
pub mod info;
pub mod show;
pub mod transfer;

use tagbot_core::Context;
use tagbot_utils::permissions::{Member, PermissionLevel};

/// Whether `member` may delete or hand over tags they did not author.
pub(crate) fn has_delete_permission(ctx: &Context, member: &Member) -> bool {
    ctx.permissions
        .is_covered(member, PermissionLevel::Moderator)
}
