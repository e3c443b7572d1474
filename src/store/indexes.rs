//! Per-category index files.
//!
//! Each `categories/<category>.json` holds a denormalized listing of the
//! articles in that category, `{id, slug, title, publishedAt}`, sorted
//! newest first. The file is rewritten in full on every save that touches the
//! category.

use std::io;
use std::path::Path;

use tokio::fs;
use tracing::{debug, instrument, warn};

use super::ArticleStore;
use crate::error::Result;
use crate::models::{Article, Category, CategoryIndexEntry};
use crate::utils::write_replacing;

/// Insert `entry`, replacing any entry with the same id, and re-sort newest first.
pub fn upsert_entry(entries: &mut Vec<CategoryIndexEntry>, entry: CategoryIndexEntry) {
    match entries.iter_mut().find(|e| e.id == entry.id) {
        Some(existing) => *existing = entry,
        None => entries.push(entry),
    }
    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

async fn read_index(path: &Path) -> Result<Vec<CategoryIndexEntry>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

impl ArticleStore {
    /// The index listing for `category`, newest first. Empty if the category
    /// has never been written.
    #[instrument(level = "debug", skip(self))]
    pub async fn category_index(&self, category: Category) -> Result<Vec<CategoryIndexEntry>> {
        read_index(&self.index_path(category))
            .await
            .inspect_err(|e| warn!(%category, error = %e, "Failed to read category index"))
    }

    /// Upsert the index entry for a saved article.
    #[instrument(level = "debug", skip_all, fields(category = %article.category))]
    pub(crate) async fn update_category_index(&self, article: &Article) -> Result<()> {
        let Some(entry) = article.index_entry() else {
            return Ok(());
        };

        let _guard = self.index_lock(article.category).lock().await;
        fs::create_dir_all(self.categories_dir()).await?;

        let path = self.index_path(article.category);
        let mut entries = read_index(&path).await?;
        upsert_entry(&mut entries, entry);
        write_replacing(&path, &serde_json::to_vec_pretty(&entries)?).await?;

        debug!(path = %path.display(), entries = entries.len(), "Updated category index");
        Ok(())
    }

    /// Drop the entry for `id` from `category`'s index, if present.
    pub(crate) async fn remove_from_category_index(&self, category: Category, id: &str) -> Result<()> {
        let _guard = self.index_lock(category).lock().await;

        let path = self.index_path(category);
        let mut entries = read_index(&path).await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() != before {
            write_replacing(&path, &serde_json::to_vec_pretty(&entries)?).await?;
            debug!(%category, id, "Removed stale category index entry");
        }
        Ok(())
    }
}
