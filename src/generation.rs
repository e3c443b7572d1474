//! Article generation with a deterministic fallback.
//!
//! [`Generator`] turns [`GenerationParams`] into a prompt, sends it through
//! an [`AskAsync`] transport and parses the reply as a [`GeneratedArticle`].
//! Any failure along the way (transport error, rejected request, empty or
//! malformed reply) is logged and replaced by [`fallback_article`], so
//! [`Generator::generate`] cannot fail. Callers cannot tell a real article
//! from a fallback by its shape.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;

use itertools::Itertools;
use tracing::{info, instrument, warn};

use crate::api::{AskAsync, ChatRequest};
use crate::models::{GeneratedArticle, GenerationParams, SuggestedProduct};
use crate::utils::{looks_truncated, truncate_for_log, upcase};

/// System role text sent with every request.
pub const SYSTEM_PROMPT: &str = "You are an expert content creator specializing in women's \
lifestyle, beauty, fitness, and wellness topics. Your content is engaging, informative, and \
optimized for search engines.";

/// Build the user prompt for one article.
pub fn build_prompt(params: &GenerationParams) -> String {
    let category = params.category.as_str();
    let subject = params.topic.as_deref().unwrap_or(category);
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Generate a high-quality, SEO-optimized blog article for women about {subject}.\n"
    );
    let _ = writeln!(prompt, "Category: {category}");
    if let Some(topic) = &params.topic {
        let _ = writeln!(prompt, "Topic: {topic}");
    }
    let _ = writeln!(prompt, "Target Audience: {}", params.target_audience);
    let _ = writeln!(prompt, "Target Word Count: {} words", params.word_count);
    if !params.keywords.is_empty() {
        let _ = writeln!(
            prompt,
            "Keywords to include: {}",
            params.keywords.iter().join(", ")
        );
    }

    prompt.push_str(
        "\nThe article should be informative, engaging, and written in a conversational tone.\n\
         Include a compelling title, introduction, several subheadings, and a conclusion.\n",
    );
    if params.include_product_recommendations {
        prompt.push_str(
            "\nInclude 3-5 product recommendations related to the article topic that could be sold on Amazon.\n",
        );
    }

    prompt.push_str(
        "\nFormat the response as a JSON object with the following structure:\n\
         {\n\
         \x20 \"title\": \"Article title\",\n\
         \x20 \"content\": \"Full article content with HTML formatting\",\n\
         \x20 \"excerpt\": \"A brief 2-3 sentence summary of the article\",\n\
         \x20 \"seoTitle\": \"SEO-optimized title (max 60 characters)\",\n\
         \x20 \"seoDescription\": \"SEO-optimized meta description (max 160 characters)\",\n\
         \x20 \"suggestedTags\": [\"tag1\", \"tag2\", \"tag3\"]",
    );
    if params.include_product_recommendations {
        prompt.push_str(
            ",\n\
             \x20 \"suggestedProducts\": [\n\
             \x20   {\"name\": \"Product name\", \"description\": \"Brief product description\", \"url\": \"amazon.com/product-link\"}\n\
             \x20 ]",
        );
    }
    prompt.push_str("\n}\n");
    prompt
}

/// The placeholder article substituted when generation fails.
pub fn fallback_article(params: &GenerationParams) -> GeneratedArticle {
    let category = params.category.as_str();
    let title_case = upcase(category);

    GeneratedArticle {
        title: format!("Sample {title_case} Article"),
        content: format!(
            "<h1>Sample Article Content for {category}</h1><p>This is a placeholder article for development and testing purposes.</p>"
        ),
        excerpt: format!("This is a sample excerpt for a {category} article."),
        seo_title: format!("{title_case} Tips and Advice | GlowUp Blog"),
        seo_description: format!(
            "Discover the latest {category} tips and advice for women on the GlowUp Blog."
        ),
        suggested_tags: vec![category.to_string(), "women".to_string(), "tips".to_string()],
        suggested_products: params.include_product_recommendations.then(|| {
            vec![SuggestedProduct {
                name: "Sample Product".to_string(),
                description: "This is a sample product recommendation.".to_string(),
                url: "https://amazon.com/sample".to_string(),
            }]
        }),
    }
}

/// Generation client: prompt in, article out, never an error.
#[derive(Clone)]
pub struct Generator {
    transport: Arc<dyn AskAsync>,
}

impl Generator {
    pub fn new(transport: Arc<dyn AskAsync>) -> Self {
        Self { transport }
    }

    #[instrument(level = "info", skip_all, fields(category = %params.category))]
    pub async fn generate(&self, params: &GenerationParams) -> GeneratedArticle {
        let t0 = Instant::now();
        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(params),
        };

        let reply = match self.transport.ask(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, elapsed_ms = t0.elapsed().as_millis() as u64, "Generation failed; using fallback article");
                return fallback_article(params);
            }
        };

        match serde_json::from_str::<GeneratedArticle>(&reply) {
            Ok(article) => {
                info!(
                    title = %article.title,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Generated article"
                );
                article
            }
            Err(e) => {
                if looks_truncated(&e) {
                    warn!(error = %e, "Model reply was cut off; using fallback article");
                } else {
                    warn!(
                        error = %e,
                        response_preview = %truncate_for_log(&reply, 300),
                        "Model returned non-conforming JSON; using fallback article"
                    );
                }
                fallback_article(params)
            }
        }
    }
}
