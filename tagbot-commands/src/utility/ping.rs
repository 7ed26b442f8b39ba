use crate::{CommandMeta, Invocation};
use tagbot_core::Context;

pub const META: CommandMeta = CommandMeta::new("ping", "Replies with Pong!", "utility", "!ping");

/// Send a simple connectivity response.
pub async fn run(ctx: &Context, invocation: &Invocation) -> anyhow::Result<()> {
    let http = &ctx.http;
    http.create_message(invocation.channel_id).content("Pong!").await?;

    Ok(())
}
