//! Topic and keyword selection.
//!
//! Each category has a fixed list of topics and SEO keywords. A pipeline run
//! samples one topic, three to five distinct keywords and a word count, and
//! always asks for product recommendations.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::models::{Category, GenerationParams};

const MIN_KEYWORDS: usize = 3;
const MAX_KEYWORDS: usize = 5;
const MIN_WORDS: u32 = 1000;
const MAX_WORDS: u32 = 1500;

const LIFESTYLE_TOPICS: &[&str] = &[
    "Work-life balance for busy women",
    "Home organization tips for small spaces",
    "Self-care routines for working professionals",
    "Budget-friendly home decor ideas",
    "Sustainable living practices for beginners",
    "Relationship advice for modern women",
    "Time management strategies for moms",
    "Travel essentials for solo female travelers",
];

const BEAUTY_TOPICS: &[&str] = &[
    "Skincare routines for different skin types",
    "Natural makeup looks for everyday wear",
    "Hair care tips for damaged hair",
    "Budget-friendly beauty products that actually work",
    "Anti-aging skincare ingredients to look for",
    "Seasonal makeup trends",
    "DIY beauty treatments using kitchen ingredients",
    "Nighttime beauty routines for glowing skin",
];

const FITNESS_TOPICS: &[&str] = &[
    "Quick home workouts for busy schedules",
    "Beginner's guide to strength training",
    "Yoga poses for stress relief",
    "Low-impact exercises for joint health",
    "Nutrition tips for active women",
    "How to stay motivated with your fitness routine",
    "Building a balanced workout schedule",
    "Fitness myths debunked",
];

const WELLNESS_TOPICS: &[&str] = &[
    "Meditation techniques for beginners",
    "Improving sleep quality naturally",
    "Stress management strategies",
    "Mindfulness practices for daily life",
    "Building healthy habits that stick",
    "Mental health self-care tips",
    "Creating a balanced diet plan",
    "Digital detox strategies for modern life",
];

const LIFESTYLE_KEYWORDS: &[&str] = &[
    "women lifestyle",
    "work life balance",
    "home organization",
    "self-care",
    "home decor",
];

const BEAUTY_KEYWORDS: &[&str] = &[
    "women beauty tips",
    "skincare routine",
    "natural makeup",
    "hair care",
    "beauty products",
];

const FITNESS_KEYWORDS: &[&str] = &[
    "women fitness",
    "home workouts",
    "strength training",
    "yoga",
    "exercise routine",
];

const WELLNESS_KEYWORDS: &[&str] = &[
    "women wellness",
    "meditation",
    "sleep quality",
    "stress management",
    "mindfulness",
];

pub fn topics(category: Category) -> &'static [&'static str] {
    match category {
        Category::Lifestyle => LIFESTYLE_TOPICS,
        Category::Beauty => BEAUTY_TOPICS,
        Category::Fitness => FITNESS_TOPICS,
        Category::Wellness => WELLNESS_TOPICS,
    }
}

pub fn keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::Lifestyle => LIFESTYLE_KEYWORDS,
        Category::Beauty => BEAUTY_KEYWORDS,
        Category::Fitness => FITNESS_KEYWORDS,
        Category::Wellness => WELLNESS_KEYWORDS,
    }
}

/// Uniformly pick one of the four categories.
pub fn random_category<R: Rng + ?Sized>(rng: &mut R) -> Category {
    Category::ALL[rng.random_range(0..Category::ALL.len())]
}

/// Sample generation parameters for `category`.
///
/// Keywords are drawn one at a time and duplicates are rejected until the
/// target count (3 to 5, capped at the table size) is reached.
pub fn select_params<R: Rng + ?Sized>(category: Category, rng: &mut R) -> GenerationParams {
    let topic = topics(category).choose(rng).map(|t| t.to_string());

    let pool = keywords(category);
    let wanted = rng.random_range(MIN_KEYWORDS..=MAX_KEYWORDS).min(pool.len());
    let mut selected: Vec<String> = Vec::with_capacity(wanted);
    while selected.len() < wanted {
        let Some(keyword) = pool.choose(rng) else {
            break;
        };
        if !selected.iter().any(|k| k == keyword) {
            selected.push(keyword.to_string());
        }
    }

    GenerationParams {
        topic,
        keywords: selected,
        word_count: rng.random_range(MIN_WORDS..=MAX_WORDS),
        include_product_recommendations: true,
        ..GenerationParams::new(category)
    }
}
