//! Flat-file article storage.
//!
//! # Layout
//!
//! ```text
//! data_dir/
//! ├── articles/
//! │   ├── 1746532800000.json   # one full article per file, named by id
//! │   └── 1746536400000.json
//! └── categories/
//!     ├── beauty.json          # [{id, slug, title, publishedAt}], newest first
//!     └── wellness.json
//! ```
//!
//! # Submodules
//!
//! - [`articles`]: Saving and reading article files
//! - [`indexes`]: Maintaining the per-category index files
//!
//! # Failure semantics
//!
//! Writes propagate errors. Single-record reads return a [`Lookup`] that
//! keeps "not there" apart from "there but unreadable"; listings return a
//! [`Result`](crate::error::Result) and fail as a whole if any file in the
//! batch cannot be read. Read failures are logged before they are returned.
//!
//! # Concurrency
//!
//! Index updates are read-modify-write, so they run under a per-category
//! async mutex. Two saves in the same process never drop each other's index
//! entries. Nothing coordinates separate processes sharing a data directory.

pub mod articles;
pub mod indexes;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicI64;

use tokio::sync::Mutex;

use crate::error::Error;
use crate::models::Category;

/// Outcome of reading a single record.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    /// The record exists but could not be read or parsed.
    Unreadable(Error),
}

impl<T> Lookup<T> {
    /// Collapse to an `Option`, treating unreadable data as absent.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound | Lookup::Unreadable(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Lookup::NotFound)
    }
}

/// Article files plus per-category index files under one data directory.
#[derive(Debug)]
pub struct ArticleStore {
    root: PathBuf,
    /// Last id handed out, in epoch milliseconds.
    last_id: AtomicI64,
    index_locks: [Mutex<()>; Category::ALL.len()],
}

impl ArticleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last_id: AtomicI64::new(0),
            index_locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn articles_dir(&self) -> PathBuf {
        self.root.join("articles")
    }

    pub fn categories_dir(&self) -> PathBuf {
        self.root.join("categories")
    }

    fn article_path(&self, id: &str) -> PathBuf {
        self.articles_dir().join(format!("{id}.json"))
    }

    fn index_path(&self, category: Category) -> PathBuf {
        self.categories_dir().join(format!("{category}.json"))
    }

    fn index_lock(&self, category: Category) -> &Mutex<()> {
        &self.index_locks[category.index()]
    }
}
