/// Generic embed builders shared across commands.
pub mod embed;
/// Mutual-exclusion record of names currently being processed.
pub mod inflight;
/// Outbound messaging capability used by command handlers.
pub mod messenger;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Pure parser helpers.
pub mod parse;
/// Permission levels and the guild permission handler.
pub mod permissions;
/// Reaction-add fan-out and single-shot confirmation waits.
pub mod reactions;
/// Shared time helpers.
pub mod time;
