//! Embed templates for tag commands. Pure view helpers, no HTTP.

use twilight_model::{
    channel::message::embed::Embed,
    id::{Id, marker::UserMarker},
};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

use tagbot_database::tags::{TagChange, TagEntry, TagField};
use tagbot_utils::{
    embed::{
        DEFAULT_EMBED_COLOR, error_embed, info_embed, prompt_embed, sanitize_mentions,
        success_embed,
    },
    reactions::{APPROVE_EMOJI, DENY_EMOJI},
};

const HISTORY_PREVIEW: usize = 5;
const HISTORY_FULL: usize = 25;

fn mention(user_id: Id<UserMarker>) -> String {
    format!("<@{}>", user_id.get())
}

/// A user-chosen tag name, quoted and with mentions defused.
fn quoted(name: &str) -> String {
    format!("\"{}\"", sanitize_mentions(name))
}

pub fn usage_embed(usage: &str) -> anyhow::Result<Embed> {
    info_embed("Usage", format!("`{usage}`"))
}

pub fn tag_not_found_embed(name: &str) -> anyhow::Result<Embed> {
    error_embed(
        "Tag not found",
        format!("There is no tag named {}.", quoted(name)),
    )
}

pub fn not_author_embed() -> anyhow::Result<Embed> {
    error_embed(
        "You are not the author.",
        "You can't transfer this tag because you didn't create it!",
    )
}

pub fn self_transfer_embed() -> anyhow::Result<Embed> {
    error_embed("Not possible!", "You can't transfer a tag to yourself!")
}

pub fn bot_transfer_embed() -> anyhow::Result<Embed> {
    error_embed("Not possible!", "Bots can't own tags!")
}

pub fn already_transferring_embed() -> anyhow::Result<Embed> {
    error_embed(
        "Already being transferred!",
        "This tag is being transferred right now! Please wait until that is finished.",
    )
}

pub fn transfer_prompt_embed(
    name: &str,
    from: Id<UserMarker>,
    to: Id<UserMarker>,
    timeout_secs: u64,
) -> anyhow::Result<Embed> {
    let description = format!(
        "{to}, please confirm the transfer of the tag {name} from {from} to {to}.\n\n\
         React with {APPROVE_EMOJI} to accept or {DENY_EMOJI} to decline.",
        to = mention(to),
        from = mention(from),
        name = quoted(name),
    );
    let footer = format!("This request expires in {timeout_secs} seconds.");

    prompt_embed(description, Some(&footer))
}

pub fn transfer_cancelled_embed(
    name: &str,
    from: Id<UserMarker>,
    to: Id<UserMarker>,
) -> anyhow::Result<Embed> {
    error_embed(
        "Declined",
        format!(
            "The transfer of the tag {} from {} to {} was cancelled!",
            quoted(name),
            mention(from),
            mention(to)
        ),
    )
}

pub fn transfer_success_embed(
    name: &str,
    from: Id<UserMarker>,
    to: Id<UserMarker>,
) -> anyhow::Result<Embed> {
    success_embed(
        "Transfer successful!",
        format!(
            "The tag {} was transferred from {} to {}!",
            quoted(name),
            mention(from),
            mention(to)
        ),
    )
}

pub fn tag_embed(tag: &TagEntry) -> anyhow::Result<Embed> {
    info_embed(&sanitize_mentions(&tag.name), tag.text.clone())
}

pub fn tag_created_embed(name: &str) -> anyhow::Result<Embed> {
    success_embed("Tag created", format!("The tag {} was created.", quoted(name)))
}

pub fn tag_exists_embed(name: &str) -> anyhow::Result<Embed> {
    error_embed(
        "Tag already exists",
        format!("A tag named {} already exists.", quoted(name)),
    )
}

pub fn tag_too_long_embed(max_chars: usize) -> anyhow::Result<Embed> {
    error_embed(
        "Tag too long",
        format!("Tag text can be at most {max_chars} characters."),
    )
}

pub fn tag_deleted_embed(name: &str) -> anyhow::Result<Embed> {
    success_embed("Tag deleted", format!("The tag {} was deleted.", quoted(name)))
}

pub fn delete_not_author_embed() -> anyhow::Result<Embed> {
    error_embed(
        "You are not the author.",
        "You can't delete this tag because you didn't create it!",
    )
}

/// Owner, creation time, and the latest history entries of a tag.
pub fn tag_info_embed(tag: &TagEntry, changes: &[TagChange]) -> anyhow::Result<Embed> {
    let history = if changes.is_empty() {
        "No changes recorded.".to_owned()
    } else {
        let start = changes.len().saturating_sub(HISTORY_PREVIEW);
        changes[start..]
            .iter()
            .rev()
            .map(history_line)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = EmbedBuilder::new()
        .title(format!("Tag {}", quoted(&tag.name)))
        .color(DEFAULT_EMBED_COLOR)
        .field(
            EmbedFieldBuilder::new("Owner", mention(tag.author_id))
                .inline()
                .build(),
        )
        .field(
            EmbedFieldBuilder::new("Created", format!("<t:{}:F>", tag.created_at))
                .inline()
                .build(),
        )
        .field(
            EmbedFieldBuilder::new(format!("History ({} change(s))", changes.len()), history)
                .build(),
        )
        .validate()?
        .build();

    Ok(embed)
}

/// Every recorded change of a tag, newest first, capped to fit one embed.
pub fn tag_history_embed(name: &str, changes: &[TagChange]) -> anyhow::Result<Embed> {
    let mut lines = changes
        .iter()
        .rev()
        .take(HISTORY_FULL)
        .map(history_line)
        .collect::<Vec<_>>();

    if lines.is_empty() {
        lines.push("No changes recorded.".to_owned());
    } else if changes.len() > HISTORY_FULL {
        lines.push(format!("... and {} older change(s)", changes.len() - HISTORY_FULL));
    }

    info_embed(&format!("History of {}", quoted(name)), lines.join("\n"))
}

fn history_line(change: &TagChange) -> String {
    let editor = change
        .editor_id
        .map(mention)
        .unwrap_or_else(|| "unknown".to_owned());

    match change.field {
        TagField::Author => format!(
            "<t:{}:R> owner <@{}> \u{2192} <@{}> by {editor}",
            change.changed_at, change.old_value, change.new_value
        ),
        TagField::Text => format!("<t:{}:R> text edited by {editor}", change.changed_at),
    }
}
