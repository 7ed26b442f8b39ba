//! `!transfer`: hand a tag over to another member once they confirm by reaction.

use std::{sync::Arc, time::Duration};

use tracing::{info, warn};
use twilight_model::{
    channel::message::embed::Embed,
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker, UserMarker},
    },
};

use crate::tag::{
    embeds::{
        already_transferring_embed, bot_transfer_embed, not_author_embed, self_transfer_embed,
        tag_not_found_embed, transfer_cancelled_embed, transfer_prompt_embed,
        transfer_success_embed, usage_embed,
    },
    has_delete_permission,
};
use crate::{CommandMeta, Invocation};
use tagbot_core::Context;
use tagbot_database::tags::{TagChange, TagEntry};
use tagbot_utils::{
    messenger::Messenger,
    parse::{normalize_tag_name, parse_target_user_id, split_first_token},
    permissions::Member,
    reactions::ConfirmationReaction,
    time::now_unix_secs,
};

pub const META: CommandMeta = CommandMeta::new(
    "transfer",
    "Transfer one of your tags to another member.",
    "tags",
    "!transfer <tag> <@new-owner>",
);

/// How long the new owner has to answer the confirmation prompt.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(45);

/// A transfer that has passed argument parsing and tag lookup.
#[derive(Clone, Debug)]
pub struct TransferRequest {
    /// Snapshot of the tag as it was looked up.
    pub tag: TagEntry,
    pub caller: Member,
    pub new_owner: Id<UserMarker>,
    /// The new owner is a bot account, which can never confirm.
    pub new_owner_is_bot: bool,
    pub channel_id: Id<ChannelMarker>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    NotAuthor,
    SelfTransfer,
    BotTarget,
    AlreadyTransferring,
    Confirmed,
    Cancelled,
    TimedOut,
}

pub async fn run(ctx: &Context, invocation: &Invocation, member: &Member) -> anyhow::Result<()> {
    let channel_id = invocation.channel_id;
    let raw_owner = invocation
        .arg_tail()
        .and_then(|tail| split_first_token(tail).0);
    let (Some(name), Some(new_owner)) = (
        invocation.arg1().and_then(normalize_tag_name),
        raw_owner.and_then(parse_target_user_id),
    ) else {
        ctx.messenger
            .send_embed(channel_id, usage_embed(META.usage)?)
            .await?;
        return Ok(());
    };

    let Some(tag) = ctx.tags.find(&name).await? else {
        ctx.messenger
            .send_embed(channel_id, tag_not_found_embed(&name)?)
            .await?;
        return Ok(());
    };

    let request = TransferRequest {
        tag,
        caller: member.clone(),
        new_owner,
        new_owner_is_bot: invocation.mentioned_bots.contains(&new_owner),
        channel_id,
    };
    transfer(ctx, request).await?;

    Ok(())
}

/// Validate a transfer, ask the new owner to confirm, and apply the answer.
///
/// Only one transfer per tag name can wait for confirmation at a time. The
/// tag's in-flight entry is released on every path out of this function,
/// errors included.
pub async fn transfer(ctx: &Context, request: TransferRequest) -> anyhow::Result<TransferOutcome> {
    let TransferRequest {
        tag,
        caller,
        new_owner,
        new_owner_is_bot,
        channel_id,
    } = request;

    if tag.author_id != caller.user_id && !has_delete_permission(ctx, &caller) {
        ctx.messenger
            .send_embed(channel_id, not_author_embed()?)
            .await?;
        return Ok(TransferOutcome::NotAuthor);
    }

    if new_owner == caller.user_id {
        ctx.messenger
            .send_embed(channel_id, self_transfer_embed()?)
            .await?;
        return Ok(TransferOutcome::SelfTransfer);
    }

    if new_owner_is_bot {
        ctx.messenger
            .send_embed(channel_id, bot_transfer_embed()?)
            .await?;
        return Ok(TransferOutcome::BotTarget);
    }

    let Some(in_flight) = ctx.transfers.try_acquire(&tag.name) else {
        ctx.messenger
            .send_embed(channel_id, already_transferring_embed()?)
            .await?;
        return Ok(TransferOutcome::AlreadyTransferring);
    };

    // Subscribe before the prompt exists so no early answer is missed.
    let subscription = ctx.reactions.subscribe();
    let prompt = transfer_prompt_embed(
        &tag.name,
        caller.user_id,
        new_owner,
        CONFIRMATION_TIMEOUT.as_secs(),
    )?;
    let message_id = ctx
        .messenger
        .send_embed_with_mention(channel_id, new_owner, prompt)
        .await?;

    for reaction in ConfirmationReaction::ALL {
        ctx.messenger
            .add_reaction(channel_id, message_id, reaction.emoji())
            .await?;
    }

    let answer = subscription
        .first_confirmation(message_id, new_owner, CONFIRMATION_TIMEOUT)
        .await;
    let cancelled = transfer_cancelled_embed(&tag.name, caller.user_id, new_owner)?;

    let outcome = match answer {
        Some(ConfirmationReaction::Deny) => {
            clear_prompt_reactions(ctx.messenger.as_ref(), channel_id, message_id).await;
            ctx.messenger
                .edit_embed(channel_id, message_id, cancelled)
                .await?;
            TransferOutcome::Cancelled
        }
        Some(ConfirmationReaction::Approve) => {
            clear_prompt_reactions(ctx.messenger.as_ref(), channel_id, message_id).await;

            let updated = tag.with_author(new_owner);
            ctx.tags.save(&updated).await?;
            let changes =
                TagChange::between(&tag, &updated, Some(caller.user_id), now_unix_secs());
            ctx.tags.record_changes(&changes).await?;

            let success = transfer_success_embed(&tag.name, caller.user_id, new_owner)?;
            ctx.messenger
                .edit_embed(channel_id, message_id, success)
                .await?;
            TransferOutcome::Confirmed
        }
        None => {
            spawn_expired_prompt_cleanup(
                Arc::clone(&ctx.messenger),
                channel_id,
                message_id,
                cancelled,
            );
            TransferOutcome::TimedOut
        }
    };

    info!(
        tag = %tag.name,
        caller = caller.user_id.get(),
        new_owner = new_owner.get(),
        ?outcome,
        "tag transfer finished"
    );
    in_flight.release();

    Ok(outcome)
}

/// Remove the answer reactions from a resolved prompt.
///
/// Needs `MANAGE_MESSAGES` in the channel. Without it the prompt keeps its
/// reactions, which never blocks the outcome.
async fn clear_prompt_reactions(
    messenger: &dyn Messenger,
    channel_id: Id<ChannelMarker>,
    message_id: Id<MessageMarker>,
) {
    if let Err(source) = messenger.clear_reactions(channel_id, message_id).await {
        warn!(?source, message_id = message_id.get(), "failed to clear transfer prompt reactions");
    }
}

/// Strip the reactions from an expired prompt and mark it cancelled.
///
/// Runs detached; the caller does not wait for it, so failures are only logged.
fn spawn_expired_prompt_cleanup(
    messenger: Arc<dyn Messenger>,
    channel_id: Id<ChannelMarker>,
    message_id: Id<MessageMarker>,
    cancelled: Embed,
) {
    tokio::spawn(async move {
        clear_prompt_reactions(messenger.as_ref(), channel_id, message_id).await;

        if let Err(source) = messenger.edit_embed(channel_id, message_id, cancelled).await {
            warn!(?source, message_id = message_id.get(), "failed to mark transfer prompt expired");
        }
    });
}
