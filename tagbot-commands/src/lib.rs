pub mod guard;
pub mod tag;
pub mod utility;

#[cfg(test)]
mod testing;

use tracing::debug;
use twilight_model::{
    gateway::payload::incoming::{MessageCreate, ReactionAdd},
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker, UserMarker},
    },
};

use tagbot_core::Context;
use tagbot_utils::{
    COMMAND_PREFIX,
    embed::error_embed,
    permissions::{Member, PermissionLevel, resolve_message_member},
    reactions::ReactionEvent,
};

/// Static description of a command, including the permission level it requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
    permission: PermissionLevel,
}

impl CommandMeta {
    /// A command anyone may run.
    pub const fn new(
        name: &'static str,
        desc: &'static str,
        category: &'static str,
        usage: &'static str,
    ) -> Self {
        Self {
            name,
            desc,
            category,
            usage,
            permission: PermissionLevel::All,
        }
    }

    /// Require `permission` to run this command, replacing any earlier level.
    pub const fn with_permission(self, permission: PermissionLevel) -> Self {
        Self { permission, ..self }
    }

    /// Level required to run this command; [`PermissionLevel::All`] unless set.
    pub const fn permission(&self) -> PermissionLevel {
        self.permission
    }
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::ping::META,
    utility::usage::META,
    tag::show::META,
    tag::info::META,
    tag::history::META,
    tag::create::META,
    tag::delete::META,
    tag::transfer::META,
    // Add new commands here
];

/// Look up a registered command by its (lowercase) name.
pub fn find_command(name: &str) -> Option<&'static CommandMeta> {
    COMMANDS.iter().find(|command| command.name == name)
}

/// A prefix command pulled out of a message, with the arguments split off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub channel_id: Id<ChannelMarker>,
    pub guild_id: Option<Id<GuildMarker>>,
    /// Lowercased command name, without the prefix.
    pub command: String,
    pub arg1: Option<String>,
    pub arg_tail: Option<String>,
    /// Mentioned users that are bot accounts.
    pub mentioned_bots: Vec<Id<UserMarker>>,
}

impl Invocation {
    /// Parse `msg` as a prefix command. `None` when it is not one.
    pub fn from_message(msg: &MessageCreate) -> Option<Self> {
        let (command, arg1, arg_tail) = split_command(&msg.content)?;

        Some(Self {
            channel_id: msg.channel_id,
            guild_id: msg.guild_id,
            command,
            arg1,
            arg_tail,
            mentioned_bots: msg
                .mentions
                .iter()
                .filter(|mention| mention.bot)
                .map(|mention| mention.id)
                .collect(),
        })
    }

    pub fn arg1(&self) -> Option<&str> {
        self.arg1.as_deref()
    }

    pub fn arg_tail(&self) -> Option<&str> {
        self.arg_tail.as_deref()
    }
}

fn split_command(content: &str) -> Option<(String, Option<String>, Option<String>)> {
    let content = content.trim();

    if !content.starts_with(COMMAND_PREFIX) {
        return None;
    }

    let content = content.trim_start_matches(COMMAND_PREFIX).trim();
    let mut command_and_rest = content.splitn(2, char::is_whitespace);
    let cmd = command_and_rest.next().unwrap_or("").to_ascii_lowercase();
    let rest = command_and_rest
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let (arg1, arg_tail) = match rest {
        Some(value) => {
            let mut args = value.splitn(2, char::is_whitespace);
            let first = args
                .next()
                .filter(|arg| !arg.is_empty())
                .map(ToOwned::to_owned);
            let tail = args
                .next()
                .map(str::trim)
                .filter(|remaining| !remaining.is_empty())
                .map(ToOwned::to_owned);

            (first, tail)
        }
        None => (None, None),
    };

    Some((cmd, arg1, arg_tail))
}

pub async fn handle_message(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    if msg.author.bot {
        return Ok(());
    }

    let Some(invocation) = Invocation::from_message(&msg) else {
        return Ok(());
    };

    let Some(meta) = find_command(&invocation.command) else {
        return Ok(());
    };

    let member = match invocation.guild_id {
        Some(_) => resolve_message_member(&ctx.http, &msg).await?,
        None => None,
    };

    dispatch(&ctx, meta, &invocation, member).await
}

/// Run a known command for its resolved caller.
///
/// Commands are guild-only. The guard runs before the body, and a denied
/// caller never reaches it.
pub async fn dispatch(
    ctx: &Context,
    meta: &CommandMeta,
    invocation: &Invocation,
    member: Option<Member>,
) -> anyhow::Result<()> {
    if invocation.guild_id.is_none() {
        let embed = error_embed("Servers only", "This command only works in servers.")?;
        ctx.messenger.send_embed(invocation.channel_id, embed).await?;
        return Ok(());
    }

    if !guard::guard(ctx, meta, invocation.channel_id, member.as_ref()).await? {
        debug!(command = meta.name, "command denied");
        return Ok(());
    }

    let Some(member) = member else {
        anyhow::bail!("command `{}` passed its guard without a member", meta.name);
    };

    match meta.name {
        "ping" => utility::ping::run(ctx, invocation).await?,
        "usage" => utility::usage::run(ctx, invocation, &member).await?,

        "tag" => tag::show::run(ctx, invocation).await?,
        "taginfo" => tag::info::run(ctx, invocation).await?,
        "taghistory" => tag::history::run(ctx, invocation).await?,
        "create" => tag::create::run(ctx, invocation, &member).await?,
        "delete" => tag::delete::run(ctx, invocation, &member).await?,
        "transfer" => tag::transfer::run(ctx, invocation, &member).await?,
        // Add new commands here
        _ => {}
    }

    Ok(())
}

/// Forward a gateway reaction-add to handlers waiting on reactions.
pub fn handle_reaction(ctx: &Context, reaction: &ReactionAdd) {
    ctx.reactions.publish(ReactionEvent::from_gateway(&reaction.0));
}

#[cfg(test)]
mod tests {
    use twilight_model::guild::Permissions;

    use super::*;
    use crate::testing::{member, tag, test_context};
    use tagbot_database::tags::{TagChange, TagRepository as _};

    fn invocation(command: &str, arg1: Option<&str>, guild: bool) -> Invocation {
        Invocation {
            channel_id: Id::new(1),
            guild_id: guild.then(|| Id::new(1)),
            command: command.to_owned(),
            arg1: arg1.map(ToOwned::to_owned),
            arg_tail: None,
            mentioned_bots: Vec::new(),
        }
    }

    #[test]
    fn permission_defaults_to_all_and_can_be_overwritten() {
        const PLAIN: CommandMeta = CommandMeta::new("x", "d", "c", "!x");
        const OWNER_ONLY: CommandMeta = PLAIN
            .with_permission(PermissionLevel::Moderator)
            .with_permission(PermissionLevel::BotOwner);

        assert_eq!(PLAIN.permission(), PermissionLevel::All);
        assert_eq!(OWNER_ONLY.permission(), PermissionLevel::BotOwner);
        assert_eq!(OWNER_ONLY.name, PLAIN.name);
    }

    #[test]
    fn command_names_are_unique_and_lowercase() {
        for (index, command) in COMMANDS.iter().enumerate() {
            assert_eq!(command.name, command.name.to_ascii_lowercase());
            assert!(
                COMMANDS[index + 1..]
                    .iter()
                    .all(|other| other.name != command.name),
                "duplicate command `{}`",
                command.name
            );
        }
    }

    #[test]
    fn finds_registered_commands() {
        assert_eq!(find_command("transfer"), Some(&tag::transfer::META));
        assert_eq!(find_command("nope"), None);
        assert_eq!(
            find_command("taghistory").map(CommandMeta::permission),
            Some(PermissionLevel::Moderator)
        );
    }

    #[test]
    fn splits_prefix_commands() {
        assert_eq!(
            split_command("  !Transfer rules   <@20>  "),
            Some((
                "transfer".to_owned(),
                Some("rules".to_owned()),
                Some("<@20>".to_owned())
            ))
        );
        assert_eq!(split_command("!ping"), Some(("ping".to_owned(), None, None)));
        assert_eq!(split_command("hello !ping"), None);
    }

    #[tokio::test]
    async fn commands_outside_guilds_are_refused_before_the_body() {
        let (ctx, messenger, tags) = test_context();
        tags.save(&tag("rules", 10, "be nice")).await.expect("seed");

        let result = dispatch(
            &ctx,
            &tag::show::META,
            &invocation("tag", Some("rules"), false),
            None,
        )
        .await;

        assert!(result.is_ok());
        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2.title.as_deref(), Some("Servers only"));
    }

    #[tokio::test]
    async fn denied_caller_never_reaches_the_body() {
        let (ctx, messenger, tags) = test_context();
        tags.save(&tag("rules", 10, "be nice")).await.expect("seed");

        dispatch(
            &ctx,
            &tag::history::META,
            &invocation("taghistory", Some("rules"), true),
            Some(member(10, Permissions::empty())),
        )
        .await
        .expect("dispatch");

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2.title.as_deref(), Some("Missing permission"));
    }

    #[tokio::test]
    async fn covered_caller_runs_the_body() {
        let (ctx, messenger, tags) = test_context();
        let original = tag("rules", 10, "be nice");
        tags.save(&original).await.expect("seed");
        let changes = TagChange::between(
            &original,
            &original.with_author(Id::new(20)),
            Some(Id::new(10)),
            1_700_000_100,
        );
        tags.record_changes(&changes).await.expect("history");

        dispatch(
            &ctx,
            &tag::history::META,
            &invocation("taghistory", Some("rules"), true),
            Some(member(30, Permissions::MANAGE_MESSAGES)),
        )
        .await
        .expect("dispatch");

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2.title.as_deref(), Some("History of \"rules\""));
    }

    #[tokio::test]
    async fn guild_command_without_a_member_is_an_error() {
        let (ctx, messenger, _) = test_context();

        let result = dispatch(
            &ctx,
            &tag::show::META,
            &invocation("tag", Some("rules"), true),
            None,
        )
        .await;

        assert!(result.is_err());
        assert!(messenger.calls().is_empty());
    }
}
