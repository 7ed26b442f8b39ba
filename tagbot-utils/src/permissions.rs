use std::{collections::HashSet, fmt};

use twilight_http::Client;
use twilight_model::{
    gateway::payload::incoming::MessageCreate,
    guild::Permissions,
    id::{
        Id,
        marker::{GuildMarker, RoleMarker, UserMarker},
    },
};

/// Privilege tier required to run a command.
///
/// Variants are ordered from least to most privileged, so
/// `member_level >= required` reads as "covers".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    #[default]
    All,
    Moderator,
    Admin,
    BotOwner,
}

impl PermissionLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Moderator => "MODERATOR",
            Self::Admin => "ADMIN",
            Self::BotOwner => "BOT_OWNER",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The invoking guild member of a command, with resolved guild permissions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub user_id: Id<UserMarker>,
    pub guild_id: Id<GuildMarker>,
    pub permissions: Permissions,
}

/// Decides whether a member's privileges cover a required level.
pub trait PermissionHandler: Send + Sync {
    fn is_covered(&self, member: &Member, level: PermissionLevel) -> bool;
}

/// Maps guild permissions and configured bot owners onto [`PermissionLevel`].
#[derive(Clone, Debug, Default)]
pub struct GuildPermissionHandler {
    owners: HashSet<Id<UserMarker>>,
}

impl GuildPermissionHandler {
    pub fn new(owners: impl IntoIterator<Item = Id<UserMarker>>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
        }
    }

    /// Highest level the member holds.
    pub fn level_of(&self, member: &Member) -> PermissionLevel {
        if self.owners.contains(&member.user_id) {
            PermissionLevel::BotOwner
        } else if member.permissions.contains(Permissions::ADMINISTRATOR) {
            PermissionLevel::Admin
        } else if member.permissions.contains(Permissions::MANAGE_MESSAGES) {
            PermissionLevel::Moderator
        } else {
            PermissionLevel::All
        }
    }
}

impl PermissionHandler for GuildPermissionHandler {
    fn is_covered(&self, member: &Member, level: PermissionLevel) -> bool {
        self.level_of(member) >= level
    }
}

/// Resolve the invoking author's effective guild permissions for a message command.
///
/// Returns `Ok(None)` when the message is not from a guild context.
pub async fn resolve_message_author_permissions(
    http: &Client,
    msg: &MessageCreate,
) -> anyhow::Result<Option<Permissions>> {
    if let Some(perms) = msg.member.as_ref().and_then(|m| m.permissions) {
        return Ok(Some(perms));
    }

    let Some(guild_id) = msg.guild_id else {
        return Ok(None);
    };

    let guild = http.guild(guild_id).await?.model().await?;
    let member = http
        .guild_member(guild_id, msg.author.id)
        .await?
        .model()
        .await?;

    let roles = guild.roles.iter().map(|role| (role.id, role.permissions));
    let resolved = member_permissions(
        guild_id,
        guild.owner_id,
        msg.author.id,
        &member.roles,
        roles,
    );

    Ok(Some(resolved))
}

/// Fold a member's guild permissions from `@everyone` and their roles.
///
/// The guild owner holds every permission regardless of roles.
pub fn member_permissions(
    guild_id: Id<GuildMarker>,
    owner_id: Id<UserMarker>,
    user_id: Id<UserMarker>,
    member_roles: &[Id<RoleMarker>],
    guild_roles: impl IntoIterator<Item = (Id<RoleMarker>, Permissions)>,
) -> Permissions {
    if user_id == owner_id {
        return Permissions::all();
    }

    guild_roles
        .into_iter()
        .filter(|(role_id, _)| *role_id == guild_id.cast() || member_roles.contains(role_id))
        .fold(Permissions::empty(), |resolved, (_, permissions)| {
            resolved | permissions
        })
}

/// Resolve the invoking author of a message command as a [`Member`].
///
/// Returns `Ok(None)` when the message is outside a guild context.
pub async fn resolve_message_member(
    http: &Client,
    msg: &MessageCreate,
) -> anyhow::Result<Option<Member>> {
    let Some(guild_id) = msg.guild_id else {
        return Ok(None);
    };

    let Some(permissions) = resolve_message_author_permissions(http, msg).await? else {
        return Ok(None);
    };

    Ok(Some(Member {
        user_id: msg.author.id,
        guild_id,
        permissions,
    }))
}
