//! Data models for generated blog articles and their on-disk projections.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Category`]: The closed set of blog sections
//! - [`GenerationParams`]: What the topic selector hands to the generation client
//! - [`GeneratedArticle`]: The JSON document the language model returns
//! - [`Article`]: A generated article plus identity and publication metadata
//! - [`CategoryIndexEntry`]: One row of a per-category listing file
//!
//! Persisted models serialize with camelCase keys so files written by earlier
//! deployments of the blog stay readable.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::utils::create_slug;

/// Default reader profile embedded in every generation prompt.
pub const DEFAULT_TARGET_AUDIENCE: &str = "women interested in lifestyle, beauty, and fitness";

/// Default article length when the caller does not pick one.
pub const DEFAULT_WORD_COUNT: u32 = 1000;

/// A blog section.
///
/// The set is closed; [`Category::ALL`] fixes the order used by bulk runs and
/// by the featured-article selection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Lifestyle,
    Beauty,
    Fitness,
    Wellness,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Lifestyle,
        Category::Beauty,
        Category::Fitness,
        Category::Wellness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Lifestyle => "lifestyle",
            Category::Beauty => "beauty",
            Category::Fitness => "fitness",
            Category::Wellness => "wellness",
        }
    }

    /// Position of the category in [`Category::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

/// Input to the generation client.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub category: Category,
    pub topic: Option<String>,
    pub target_audience: String,
    pub word_count: u32,
    pub keywords: Vec<String>,
    pub include_product_recommendations: bool,
}

impl GenerationParams {
    /// Parameters with every optional field at its default.
    pub fn new(category: Category) -> Self {
        Self {
            category,
            topic: None,
            target_audience: DEFAULT_TARGET_AUDIENCE.to_string(),
            word_count: DEFAULT_WORD_COUNT,
            keywords: Vec::new(),
            include_product_recommendations: true,
        }
    }
}

/// A product the model suggests linking from the article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedProduct {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Older records and model replies call this `amazonUrl`.
    #[serde(default, alias = "amazonUrl")]
    pub url: String,
}

/// The article body as returned by the language model.
///
/// Fields the model leaves out deserialize to empty values; nothing else is
/// checked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedArticle {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub seo_title: String,
    pub seo_description: String,
    pub suggested_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_products: Option<Vec<SuggestedProduct>>,
}

/// A persisted blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Millisecond timestamp string, assigned by the store on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub slug: String,
    pub category: Category,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub seo_description: String,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_products: Option<Vec<SuggestedProduct>>,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Wrap a generated article for `category`, deriving its slug from the
    /// title and stamping it as published at `published_at`.
    pub fn from_generated(
        generated: GeneratedArticle,
        category: Category,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            slug: create_slug(&generated.title),
            category,
            title: generated.title,
            content: generated.content,
            excerpt: generated.excerpt,
            seo_title: generated.seo_title,
            seo_description: generated.seo_description,
            suggested_tags: generated.suggested_tags,
            suggested_products: generated.suggested_products,
            published_at,
            updated_at: None,
        }
    }

    pub fn index_entry(&self) -> Option<CategoryIndexEntry> {
        self.id.as_ref().map(|id| CategoryIndexEntry {
            id: id.clone(),
            slug: self.slug.clone(),
            title: self.title.clone(),
            published_at: self.published_at,
        })
    }
}

/// One row of `categories/<category>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIndexEntry {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}
