use tracing::info;
use twilight_model::id::{Id, marker::ChannelMarker};

use crate::{CommandMeta, Invocation};
use crate::tag::{
    embeds::{
        already_transferring_embed, delete_not_author_embed, tag_deleted_embed,
        tag_not_found_embed, usage_embed,
    },
    has_delete_permission,
};
use tagbot_core::Context;
use tagbot_utils::{parse::normalize_tag_name, permissions::Member};

pub const META: CommandMeta = CommandMeta::new(
    "delete",
    "Delete a tag you own (moderators may delete any tag).",
    "tags",
    "!delete <name>",
);

pub async fn run(ctx: &Context, invocation: &Invocation, member: &Member) -> anyhow::Result<()> {
    let Some(name) = invocation.arg1().and_then(normalize_tag_name) else {
        ctx.messenger
            .send_embed(invocation.channel_id, usage_embed(META.usage)?)
            .await?;
        return Ok(());
    };

    delete(ctx, invocation.channel_id, member, &name).await
}

async fn delete(
    ctx: &Context,
    channel_id: Id<ChannelMarker>,
    member: &Member,
    name: &str,
) -> anyhow::Result<()> {
    let Some(tag) = ctx.tags.find(name).await? else {
        ctx.messenger
            .send_embed(channel_id, tag_not_found_embed(name)?)
            .await?;
        return Ok(());
    };

    if tag.author_id != member.user_id && !has_delete_permission(ctx, member) {
        ctx.messenger
            .send_embed(channel_id, delete_not_author_embed()?)
            .await?;
        return Ok(());
    }

    // Holding the in-flight entry keeps a transfer from starting mid-delete.
    let Some(in_flight) = ctx.transfers.try_acquire(&tag.name) else {
        ctx.messenger
            .send_embed(channel_id, already_transferring_embed()?)
            .await?;
        return Ok(());
    };

    let embed = if ctx.tags.delete(&tag.name).await? {
        info!(tag = %tag.name, deleted_by = member.user_id.get(), "tag deleted");
        tag_deleted_embed(&tag.name)?
    } else {
        tag_not_found_embed(&tag.name)?
    };
    in_flight.release();

    ctx.messenger.send_embed(channel_id, embed).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use twilight_model::guild::Permissions;

    use super::*;
    use crate::testing::{member, tag, test_context};
    use tagbot_database::tags::TagRepository as _;

    #[tokio::test]
    async fn author_can_delete() {
        let (ctx, messenger, tags) = test_context();
        tags.save(&tag("rules", 5, "be nice")).await.expect("seed");

        delete(&ctx, Id::new(1), &member(5, Permissions::empty()), "rules")
            .await
            .expect("delete runs");

        assert_eq!(tags.find("rules").await.expect("find"), None);
        assert_eq!(messenger.sent()[0].2.title.as_deref(), Some("Tag deleted"));
        assert!(ctx.transfers.is_empty());
    }

    #[tokio::test]
    async fn moderators_can_delete_foreign_tags_but_others_cannot() {
        let (ctx, messenger, tags) = test_context();
        tags.save(&tag("rules", 5, "be nice")).await.expect("seed");

        delete(&ctx, Id::new(1), &member(6, Permissions::empty()), "rules")
            .await
            .expect("delete runs");
        assert!(tags.find("rules").await.expect("find").is_some());
        assert_eq!(
            messenger.sent()[0].2.title.as_deref(),
            Some("You are not the author.")
        );

        delete(&ctx, Id::new(1), &member(7, Permissions::MANAGE_MESSAGES), "rules")
            .await
            .expect("delete runs");
        assert_eq!(tags.find("rules").await.expect("find"), None);
    }

    #[tokio::test]
    async fn tags_mid_transfer_cannot_be_deleted() {
        let (ctx, messenger, tags) = test_context();
        tags.save(&tag("rules", 5, "be nice")).await.expect("seed");
        let _transfer = ctx.transfers.try_acquire("rules").expect("acquire");

        delete(&ctx, Id::new(1), &member(5, Permissions::empty()), "rules")
            .await
            .expect("delete runs");

        assert!(tags.find("rules").await.expect("find").is_some());
        assert_eq!(
            messenger.sent()[0].2.title.as_deref(),
            Some("Already being transferred!")
        );
    }
}
