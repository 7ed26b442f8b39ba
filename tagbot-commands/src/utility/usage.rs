use crate::{COMMANDS, CommandMeta, Invocation, guard::as_precondition};
use tagbot_core::Context;
use tagbot_utils::{
    COMMAND_PREFIX,
    permissions::{Member, PermissionLevel},
};

pub const META: CommandMeta = CommandMeta::new(
    "usage",
    "Show usage syntax for a specific command.",
    "utility",
    "!usage <command>",
);

/// Show usage for a specific command.
///
/// Purpose:
/// - provide a focused syntax lookup per command, including who may run it
///   and whether the caller can.
///
/// Inputs:
/// - required command name: `!usage <command>`.
///
/// Error behavior:
/// - missing argument returns this command's usage.
/// - unknown command returns a short not-found message.
pub async fn run(ctx: &Context, invocation: &Invocation, member: &Member) -> anyhow::Result<()> {
    let http = &ctx.http;
    let Some(raw_name) = invocation.arg1() else {
        let usage = format!("Usage: `{}`", META.usage);
        http.create_message(invocation.channel_id)
            .content(&usage)
            .await?;
        return Ok(());
    };

    let allowed = as_precondition(ctx.permissions.as_ref());
    let out = usage_text(raw_name, |command| allowed(member, command));
    http.create_message(invocation.channel_id)
        .content(&out)
        .await?;

    Ok(())
}

fn usage_text(raw_name: &str, can_run: impl Fn(&CommandMeta) -> bool) -> String {
    let lookup = raw_name
        .trim()
        .trim_start_matches(COMMAND_PREFIX)
        .to_ascii_lowercase();

    let Some(command) = COMMANDS.iter().find(|command| command.name == lookup) else {
        return format!("Unknown command: `{}`", lookup);
    };

    match (command.permission(), can_run(command)) {
        (PermissionLevel::All, _) => format!("Usage: `{}`", command.usage),
        (level, true) => format!("Usage: `{}` (requires `{}`)", command.usage, level),
        (level, false) => format!(
            "Usage: `{}` (requires `{}`, which you do not have)",
            command.usage, level
        ),
    }
}
