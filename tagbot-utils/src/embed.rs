use twilight_model::channel::message::embed::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0x90_54_30;
/// Color for rejection and cancellation notices.
pub const ERROR_EMBED_COLOR: u32 = 0xED_42_45;
/// Color for completed actions.
pub const SUCCESS_EMBED_COLOR: u32 = 0x57_F2_87;

/// Build a titled error embed.
pub fn error_embed(title: &str, description: impl Into<String>) -> anyhow::Result<Embed> {
    titled_embed(ERROR_EMBED_COLOR, title, description)
}

/// Build a titled success embed.
pub fn success_embed(title: &str, description: impl Into<String>) -> anyhow::Result<Embed> {
    titled_embed(SUCCESS_EMBED_COLOR, title, description)
}

/// Build a titled embed in the default color.
pub fn info_embed(title: &str, description: impl Into<String>) -> anyhow::Result<Embed> {
    titled_embed(DEFAULT_EMBED_COLOR, title, description)
}

/// Build a description-only embed in the default color with an optional footer.
pub fn prompt_embed(description: impl Into<String>, footer_note: Option<&str>) -> anyhow::Result<Embed> {
    let builder = EmbedBuilder::new()
        .color(DEFAULT_EMBED_COLOR)
        .description(description);

    let embed = match footer_note {
        Some(note) if !note.is_empty() => {
            let footer = EmbedFooterBuilder::new(note).build();
            builder.footer(footer).validate()?.build()
        }
        _ => builder.validate()?.build(),
    };

    Ok(embed)
}

fn titled_embed(color: u32, title: &str, description: impl Into<String>) -> anyhow::Result<Embed> {
    let embed = EmbedBuilder::new()
        .title(title)
        .color(color)
        .description(description)
        .validate()?
        .build();

    Ok(embed)
}

/// Neutralize user mentions in user-provided text before echoing it.
pub fn sanitize_mentions(text: &str) -> String {
    text.replace('@', "@\u{200B}")
}
