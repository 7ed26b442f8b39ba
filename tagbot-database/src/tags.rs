use std::collections::HashMap;

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::sync::RwLock;
use twilight_model::id::{Id, marker::UserMarker};

use crate::Database;

/// A named, user-authored text snippet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagEntry {
    /// Normalized, unique tag name.
    pub name: String,
    /// Owning user.
    pub author_id: Id<UserMarker>,
    pub text: String,
    /// Unix seconds.
    pub created_at: u64,
}

impl TagEntry {
    /// Copy of this tag owned by `author_id`; every other field is kept.
    pub fn with_author(&self, author_id: Id<UserMarker>) -> Self {
        Self {
            author_id,
            ..self.clone()
        }
    }
}

/// Tag field tracked by the change history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagField {
    Author,
    Text,
}

impl TagField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Text => "text",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "author" => Some(Self::Author),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// One changed field of a tag, with who changed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagChange {
    pub tag_name: String,
    pub editor_id: Option<Id<UserMarker>>,
    pub field: TagField,
    pub old_value: String,
    pub new_value: String,
    pub changed_at: u64,
}

impl TagChange {
    /// History entries for every field that differs between `old` and `new`.
    pub fn between(
        old: &TagEntry,
        new: &TagEntry,
        editor_id: Option<Id<UserMarker>>,
        changed_at: u64,
    ) -> Vec<TagChange> {
        let mut changes = Vec::new();
        let mut push = |field: TagField, old_value: String, new_value: String| {
            changes.push(TagChange {
                tag_name: old.name.clone(),
                editor_id,
                field,
                old_value,
                new_value,
                changed_at,
            });
        };

        if old.author_id != new.author_id {
            push(
                TagField::Author,
                old.author_id.get().to_string(),
                new.author_id.get().to_string(),
            );
        }

        if old.text != new.text {
            push(TagField::Text, old.text.clone(), new.text.clone());
        }

        changes
    }
}

/// Persistence for tags and their change history.
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find(&self, name: &str) -> anyhow::Result<Option<TagEntry>>;

    /// Store a new tag. Returns `false` when the name is already taken.
    async fn insert(&self, tag: &TagEntry) -> anyhow::Result<bool>;

    /// Create or overwrite the tag with the same name.
    async fn save(&self, tag: &TagEntry) -> anyhow::Result<()>;

    /// Returns `false` when no such tag existed.
    async fn delete(&self, name: &str) -> anyhow::Result<bool>;

    async fn record_changes(&self, changes: &[TagChange]) -> anyhow::Result<()>;

    /// Change history of a tag, oldest first.
    async fn changes(&self, name: &str) -> anyhow::Result<Vec<TagChange>>;
}

/// Postgres-backed [`TagRepository`].
#[derive(Clone)]
pub struct PgTagRepository {
    db: Database,
}

impl PgTagRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[derive(sqlx::FromRow)]
struct TagRow {
    name: String,
    author_id: i64,
    text: String,
    created_at: i64,
}

impl TryFrom<TagRow> for TagEntry {
    type Error = anyhow::Error;

    fn try_from(row: TagRow) -> anyhow::Result<Self> {
        Ok(Self {
            author_id: user_id_from_db(row.author_id)
                .with_context(|| format!("tag `{}` has an invalid author", row.name))?,
            name: row.name,
            text: row.text,
            created_at: u64::try_from(row.created_at).unwrap_or_default(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct TagChangeRow {
    tag_name: String,
    editor_id: Option<i64>,
    field: String,
    old_value: String,
    new_value: String,
    changed_at: i64,
}

impl TryFrom<TagChangeRow> for TagChange {
    type Error = anyhow::Error;

    fn try_from(row: TagChangeRow) -> anyhow::Result<Self> {
        let field = TagField::parse(&row.field)
            .with_context(|| format!("unknown tag change field `{}`", row.field))?;
        let editor_id = row.editor_id.map(user_id_from_db).transpose()?;

        Ok(Self {
            tag_name: row.tag_name,
            editor_id,
            field,
            old_value: row.old_value,
            new_value: row.new_value,
            changed_at: u64::try_from(row.changed_at).unwrap_or_default(),
        })
    }
}

fn user_id_from_db(raw: i64) -> anyhow::Result<Id<UserMarker>> {
    u64::try_from(raw)
        .ok()
        .and_then(Id::new_checked)
        .with_context(|| format!("invalid user id {raw}"))
}

fn user_id_to_db(id: Id<UserMarker>) -> i64 {
    id.get() as i64
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn find(&self, name: &str) -> anyhow::Result<Option<TagEntry>> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT name, author_id, text, created_at FROM tags WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(TagEntry::try_from).transpose()
    }

    async fn insert(&self, tag: &TagEntry) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO tags (name, author_id, text, created_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(&tag.name)
        .bind(user_id_to_db(tag.author_id))
        .bind(&tag.text)
        .bind(tag.created_at as i64)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn save(&self, tag: &TagEntry) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO tags (name, author_id, text, created_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (name) DO UPDATE SET author_id = EXCLUDED.author_id, text = EXCLUDED.text",
        )
        .bind(&tag.name)
        .bind(user_id_to_db(tag.author_id))
        .bind(&tag.text)
        .bind(tag.created_at as i64)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn delete(&self, name: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE name = $1")
            .bind(name)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_changes(&self, changes: &[TagChange]) -> anyhow::Result<()> {
        let mut tx = self.db.pool().begin().await?;

        for change in changes {
            sqlx::query(
                "INSERT INTO tag_changes (tag_name, editor_id, field, old_value, new_value, changed_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&change.tag_name)
            .bind(change.editor_id.map(user_id_to_db))
            .bind(change.field.as_str())
            .bind(&change.old_value)
            .bind(&change.new_value)
            .bind(change.changed_at as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn changes(&self, name: &str) -> anyhow::Result<Vec<TagChange>> {
        let rows = sqlx::query_as::<_, TagChangeRow>(
            "SELECT tag_name, editor_id, field, old_value, new_value, changed_at \
             FROM tag_changes WHERE tag_name = $1 ORDER BY changed_at, id",
        )
        .bind(name)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(TagChange::try_from).collect()
    }
}

/// Process-local [`TagRepository`]; contents are lost on restart.
#[derive(Default)]
pub struct MemoryTagRepository {
    tags: RwLock<HashMap<String, TagEntry>>,
    changes: RwLock<Vec<TagChange>>,
}

impl MemoryTagRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TagRepository for MemoryTagRepository {
    async fn find(&self, name: &str) -> anyhow::Result<Option<TagEntry>> {
        Ok(self.tags.read().await.get(name).cloned())
    }

    async fn insert(&self, tag: &TagEntry) -> anyhow::Result<bool> {
        let mut tags = self.tags.write().await;
        if tags.contains_key(&tag.name) {
            return Ok(false);
        }

        tags.insert(tag.name.clone(), tag.clone());
        Ok(true)
    }

    async fn save(&self, tag: &TagEntry) -> anyhow::Result<()> {
        let mut tags = self.tags.write().await;
        match tags.get_mut(&tag.name) {
            // Creation time belongs to the first save, as with the upsert above.
            Some(existing) => {
                existing.author_id = tag.author_id;
                existing.text = tag.text.clone();
            }
            None => {
                tags.insert(tag.name.clone(), tag.clone());
            }
        }

        Ok(())
    }

    async fn delete(&self, name: &str) -> anyhow::Result<bool> {
        Ok(self.tags.write().await.remove(name).is_some())
    }

    async fn record_changes(&self, changes: &[TagChange]) -> anyhow::Result<()> {
        self.changes.write().await.extend_from_slice(changes);
        Ok(())
    }

    async fn changes(&self, name: &str) -> anyhow::Result<Vec<TagChange>> {
        let mut entries = self
            .changes
            .read()
            .await
            .iter()
            .filter(|change| change.tag_name == name)
            .cloned()
            .collect::<Vec<_>>();

        entries.sort_by_key(|change| change.changed_at);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(author: u64, text: &str) -> TagEntry {
        TagEntry {
            name: "rules".to_owned(),
            author_id: Id::new(author),
            text: text.to_owned(),
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn with_author_only_changes_the_owner() {
        let original = tag(1, "be nice");
        let moved = original.with_author(Id::new(2));

        assert_eq!(moved.author_id, Id::new(2));
        assert_eq!(moved.name, original.name);
        assert_eq!(moved.text, original.text);
        assert_eq!(moved.created_at, original.created_at);
    }

    #[test]
    fn change_diff_lists_each_changed_field() {
        let old = tag(1, "be nice");
        let new = TagEntry {
            text: "be kind".to_owned(),
            ..old.with_author(Id::new(2))
        };

        let changes = TagChange::between(&old, &new, Some(Id::new(1)), 10);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, TagField::Author);
        assert_eq!(changes[0].old_value, "1");
        assert_eq!(changes[0].new_value, "2");
        assert_eq!(changes[1].field, TagField::Text);
        assert!(changes.iter().all(|change| change.editor_id == Some(Id::new(1))));
    }

    #[test]
    fn identical_records_produce_no_history() {
        let old = tag(1, "be nice");
        assert!(TagChange::between(&old, &old.clone(), None, 10).is_empty());
    }

    #[tokio::test]
    async fn memory_repository_rejects_duplicate_inserts() {
        let repo = MemoryTagRepository::new();

        assert!(repo.insert(&tag(1, "be nice")).await.expect("insert"));
        assert!(!repo.insert(&tag(2, "other")).await.expect("insert"));
        assert_eq!(
            repo.find("rules").await.expect("find"),
            Some(tag(1, "be nice"))
        );
    }

    #[tokio::test]
    async fn memory_repository_save_overwrites_and_delete_removes() {
        let repo = MemoryTagRepository::new();
        repo.save(&tag(1, "be nice")).await.expect("save");
        repo.save(&tag(2, "be nice")).await.expect("save");

        let stored = repo.find("rules").await.expect("find").expect("present");
        assert_eq!(stored.author_id, Id::new(2));

        assert!(repo.delete("rules").await.expect("delete"));
        assert!(!repo.delete("rules").await.expect("delete"));
        assert_eq!(repo.find("rules").await.expect("find"), None);
    }

    #[tokio::test]
    async fn memory_repository_filters_history_by_tag() {
        let repo = MemoryTagRepository::new();
        let old = tag(1, "be nice");
        let mut other = tag(1, "x");
        other.name = "faq".to_owned();

        repo.record_changes(&TagChange::between(&old, &old.with_author(Id::new(2)), None, 5))
            .await
            .expect("record");
        repo.record_changes(&TagChange::between(&other, &other.with_author(Id::new(3)), None, 6))
            .await
            .expect("record");

        let history = repo.changes("rules").await.expect("changes");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].new_value, "2");
    }
}
