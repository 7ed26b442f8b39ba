use twilight_model::id::{Id, marker::UserMarker};

/// Parse a target user from a raw argument (`<@id>`, `<@!id>`, or raw ID).
pub fn parse_target_user_id(raw: &str) -> Option<Id<UserMarker>> {
    let trimmed = raw.trim();

    let numeric = if trimmed.starts_with("<@") && trimmed.ends_with('>') {
        let without_wrappers = trimmed.strip_prefix("<@")?.strip_suffix('>')?;
        without_wrappers
            .strip_prefix('!')
            .unwrap_or(without_wrappers)
    } else {
        trimmed
    };

    let id = numeric.parse::<u64>().ok()?;

    Id::new_checked(id)
}

/// Normalize a tag name for lookup and storage.
///
/// Returns `None` for empty names and names containing whitespace or mention syntax.
pub fn normalize_tag_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) || name.starts_with("<@") {
        return None;
    }

    Some(name.to_lowercase())
}

/// Split an argument tail into its first token and the trimmed remainder.
pub fn split_first_token(raw: &str) -> (Option<&str>, Option<&str>) {
    let mut parts = raw.trim().splitn(2, char::is_whitespace);
    let first = parts.next().filter(|value| !value.is_empty());
    let rest = parts
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    (first, rest)
}
