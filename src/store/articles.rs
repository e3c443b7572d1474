//! Saving and reading article files.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use chrono::Utc;
use futures::future::try_join_all;
use itertools::Itertools;
use tokio::fs;
use tracing::{error, info, instrument, warn};

use super::{ArticleStore, Lookup};
use crate::error::{Error, Result};
use crate::models::{Article, Category};
use crate::utils::write_replacing;

/// Ids double as file names, so only plain tokens are accepted.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn read_article(path: &Path) -> Result<Article> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

impl ArticleStore {
    /// Next id: the current epoch milliseconds, bumped past the last id this
    /// store issued so saves in the same millisecond stay distinct.
    fn next_id(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let prev = match self.last_id.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        }) {
            Ok(prev) | Err(prev) => prev,
        };
        now.max(prev + 1).to_string()
    }

    /// Persist an article and refresh its category index entry.
    ///
    /// Assigns an id if the article has none and stamps `updatedAt`. Saving
    /// an article whose id already exists overwrites the file and replaces
    /// its index entry; if the category changed, the entry moves.
    ///
    /// # Errors
    ///
    /// Any failure writing the article file or the index file. The two
    /// writes are not transactional: if the index write fails, the article
    /// file stays on disk.
    #[instrument(level = "info", skip_all, fields(category = %article.category, title = %article.title))]
    pub async fn save(&self, mut article: Article) -> Result<Article> {
        let id = match &article.id {
            Some(id) if is_valid_id(id) => id.clone(),
            Some(id) => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("article id `{id}` is not a plain file name"),
                )));
            }
            None => {
                let id = self.next_id();
                article.id = Some(id.clone());
                id
            }
        };
        article.updated_at = Some(Utc::now());

        if let Lookup::Found(previous) = self.get_by_id(&id).await {
            if previous.category != article.category {
                self.remove_from_category_index(previous.category, &id).await?;
            }
        }

        fs::create_dir_all(self.articles_dir()).await?;
        let path = self.article_path(&id);
        write_replacing(&path, &serde_json::to_vec_pretty(&article)?).await?;

        self.update_category_index(&article).await?;

        info!(id = %id, slug = %article.slug, path = %path.display(), "Saved article");
        Ok(article)
    }

    /// Read one article by id.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Lookup<Article> {
        if !is_valid_id(id) {
            return Lookup::NotFound;
        }
        let path = self.article_path(id);
        match read_article(&path).await {
            Ok(article) => Lookup::Found(article),
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Lookup::NotFound,
            Err(e) => {
                warn!(id, path = %path.display(), error = %e, "Failed to read article");
                Lookup::Unreadable(e)
            }
        }
    }

    /// First article (newest first) whose slug matches.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Lookup<Article> {
        match self.get_all().await {
            Ok(articles) => articles
                .into_iter()
                .find(|a| a.slug == slug)
                .map_or(Lookup::NotFound, Lookup::Found),
            Err(e) => Lookup::Unreadable(e),
        }
    }

    /// Every stored article, newest first.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any article file cannot be read or parsed. A
    /// missing articles directory is an empty set, not an error.
    pub async fn get_all(&self) -> Result<Vec<Article>> {
        self.load_all()
            .await
            .inspect_err(|e| error!(dir = %self.articles_dir().display(), error = %e, "Failed to load articles"))
    }

    async fn load_all(&self) -> Result<Vec<Article>> {
        let dir = self.articles_dir();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths: Vec<PathBuf> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }

        let articles = try_join_all(paths.iter().map(|p| read_article(p))).await?;
        Ok(articles
            .into_iter()
            .sorted_by(|a, b| b.published_at.cmp(&a.published_at))
            .collect())
    }

    /// Articles in `category`, newest first.
    pub async fn get_by_category(&self, category: Category) -> Result<Vec<Article>> {
        let mut articles = self.get_all().await?;
        articles.retain(|a| a.category == category);
        Ok(articles)
    }

    /// The newest article of each category (in [`Category::ALL`] order),
    /// padded with the newest remaining articles, at most `limit` in total.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_featured(&self, limit: usize) -> Result<Vec<Article>> {
        let all = self.get_all().await?;

        let mut featured: Vec<Article> = Category::ALL
            .iter()
            .filter_map(|c| all.iter().find(|a| a.category == *c).cloned())
            .collect();

        if featured.len() < limit {
            let missing = limit - featured.len();
            let filler: Vec<Article> = all
                .iter()
                .filter(|a| !featured.iter().any(|f| f.id == a.id))
                .take(missing)
                .cloned()
                .collect();
            featured.extend(filler);
        }

        featured.truncate(limit);
        Ok(featured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeneratedArticle;
    use chrono::{DateTime, Duration, TimeZone};
    use std::sync::Arc;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, hour, 0, 0).unwrap()
    }

    fn article(title: &str, category: Category, published_at: DateTime<Utc>) -> Article {
        Article::from_generated(
            GeneratedArticle {
                title: title.to_string(),
                content: "<p>Body</p>".to_string(),
                ..GeneratedArticle::default()
            },
            category,
            published_at,
        )
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_save_writes_article_and_index_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());

        let saved = store
            .save(article("The Best Serum!!", Category::Beauty, at(9)))
            .await
            .unwrap();
        let id = saved.id.clone().unwrap();

        assert_eq!(saved.slug, "the-best-serum");
        assert!(saved.updated_at.is_some());
        assert!(store.articles_dir().join(format!("{id}.json")).is_file());

        let index = store.category_index(Category::Beauty).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].id, id);
        assert_eq!(index[0].slug, "the-best-serum");
        assert_eq!(index[0].published_at, saved.published_at);

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(store.categories_dir().join("beauty.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(raw[0]["slug"], "the-best-serum");
        assert!(raw[0].get("publishedAt").is_some());
    }

    #[tokio::test]
    async fn test_save_is_idempotent_on_id() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());

        let mut saved = store
            .save(article("Morning Yoga", Category::Fitness, at(7)))
            .await
            .unwrap();
        let first_update = saved.updated_at.unwrap();

        saved.title = "Morning Yoga, Revisited".to_string();
        let resaved = store.save(saved.clone()).await.unwrap();

        assert_eq!(resaved.id, saved.id);
        assert!(resaved.updated_at.unwrap() >= first_update);
        assert_eq!(file_count(&store.articles_dir()), 1);

        let index = store.category_index(Category::Fitness).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].title, "Morning Yoga, Revisited");

        let stored = store.get_by_id(saved.id.as_deref().unwrap()).await.found().unwrap();
        assert_eq!(stored.title, "Morning Yoga, Revisited");
    }

    #[tokio::test]
    async fn test_resave_with_new_category_moves_index_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());

        let mut saved = store
            .save(article("Sleep Better", Category::Lifestyle, at(7)))
            .await
            .unwrap();
        saved.category = Category::Wellness;
        store.save(saved).await.unwrap();

        assert!(store.category_index(Category::Lifestyle).await.unwrap().is_empty());
        assert_eq!(store.category_index(Category::Wellness).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_path_like_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());
        let mut bad = article("Escape", Category::Beauty, at(7));
        bad.id = Some("../escape".to_string());
        assert!(store.save(bad).await.is_err());
        assert!(!tmp.path().join("escape.json").exists());
    }

    #[tokio::test]
    async fn test_ids_are_distinct_within_a_millisecond() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());
        let ids: Vec<i64> = (0..50).map(|_| store.next_id().parse().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_get_by_id_distinguishes_missing_and_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());

        assert!(store.get_by_id("12345").await.is_not_found());
        assert!(store.get_by_id("../../etc/passwd").await.is_not_found());

        std::fs::create_dir_all(store.articles_dir()).unwrap();
        std::fs::write(store.articles_dir().join("999.json"), "{broken").unwrap();
        assert!(matches!(store.get_by_id("999").await, Lookup::Unreadable(_)));
    }

    #[tokio::test]
    async fn test_get_all_sorts_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());
        for (title, hour) in [("Noon", 12), ("Dawn", 5), ("Night", 22), ("Morning", 9)] {
            store.save(article(title, Category::Wellness, at(hour))).await.unwrap();
        }

        let titles: Vec<_> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, ["Night", "Noon", "Morning", "Dawn"]);
    }

    #[tokio::test]
    async fn test_get_all_without_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("missing"));
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_fails_whole_batch_on_bad_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());
        store.save(article("Fine", Category::Beauty, at(8))).await.unwrap();
        std::fs::write(store.articles_dir().join("1.json"), "not json").unwrap();

        assert!(store.get_all().await.is_err());
        assert!(matches!(store.get_by_slug("fine").await, Lookup::Unreadable(_)));
    }

    #[tokio::test]
    async fn test_get_by_slug_returns_newest_match() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());
        store.save(article("Same Title", Category::Beauty, at(8))).await.unwrap();
        let newer = store
            .save(article("Same Title", Category::Fitness, at(10)))
            .await
            .unwrap();

        let found = store.get_by_slug("same-title").await.found().unwrap();
        assert_eq!(found.id, newer.id);
        assert!(store.get_by_slug("nope").await.is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_category_filters() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());
        store.save(article("A", Category::Beauty, at(8))).await.unwrap();
        store.save(article("B", Category::Fitness, at(9))).await.unwrap();
        store.save(article("C", Category::Beauty, at(10))).await.unwrap();

        let beauty: Vec<_> = store
            .get_by_category(Category::Beauty)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(beauty, ["C", "A"]);
    }

    #[tokio::test]
    async fn test_featured_takes_one_per_category() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());
        let base = at(0);
        for (i, category) in Category::ALL.iter().enumerate() {
            for n in 0..3 {
                let published = base + Duration::minutes((i * 10 + n) as i64);
                store
                    .save(article(&format!("{category} {n}"), *category, published))
                    .await
                    .unwrap();
            }
        }

        let featured = store.get_featured(4).await.unwrap();
        let picked: Vec<_> = featured.iter().map(|a| (a.category, a.title.as_str())).collect();
        assert_eq!(
            picked,
            [
                (Category::Lifestyle, "lifestyle 2"),
                (Category::Beauty, "beauty 2"),
                (Category::Fitness, "fitness 2"),
                (Category::Wellness, "wellness 2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_featured_pads_with_recent_articles() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path());
        store.save(article("Beauty old", Category::Beauty, at(1))).await.unwrap();
        store.save(article("Beauty new", Category::Beauty, at(5))).await.unwrap();
        store.save(article("Beauty mid", Category::Beauty, at(3))).await.unwrap();
        store.save(article("Fitness only", Category::Fitness, at(2))).await.unwrap();

        let titles: Vec<_> = store
            .get_featured(4)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, ["Beauty new", "Fitness only", "Beauty mid", "Beauty old"]);

        assert_eq!(store.get_featured(1).await.unwrap()[0].title, "Beauty new");
        assert!(store.get_featured(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_saves_keep_every_index_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(ArticleStore::new(tmp.path()));

        let handles: Vec<_> = (0..16)
            .map(|n| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .save(article(&format!("Tip {n}"), Category::Lifestyle, at(n % 24)))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.category_index(Category::Lifestyle).await.unwrap().len(), 16);
        assert_eq!(store.get_all().await.unwrap().len(), 16);
    }
}
