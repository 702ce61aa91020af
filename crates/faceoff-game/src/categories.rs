//! Category labels: the pluggable source, its static fallback, and a
//! retrying wrapper that never fails.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Built-in labels used when no generator is configured or it fails.
pub const FALLBACK_CATEGORIES: &[&str] = &[
    "Actor",
    "Actress",
    "Adjective",
    "African Animal",
    "Airline",
    "Alcoholic Drink",
    "Animal",
    "Appliance",
    "Apparel",
    "Architectural Style",
    "Art Movement",
    "Astronomical Object",
    "Athlete",
    "Author",
    "Automobile",
    "Beverage",
    "Body Part",
    "Book",
    "Brand",
    "Candy",
    "Cartoon Character",
    "Celebrity",
    "Cereal",
    "Cheese",
    "Chewing Gum",
    "Child's Toy",
    "City",
    "Clothing Item",
    "Color",
    "Comic Strip",
    "Company",
    "Computer Game",
    "Country",
    "Dessert",
    "Dog Breed",
    "Drink",
    "Element",
    "Famous Athlete",
    "Famous Chef",
    "Famous Person",
    "Fictional Character",
    "Film",
    "Flower",
    "Food",
    "Fruit",
    "Game",
    "Gemstone",
    "Hair Style",
    "Holiday",
    "Ice Cream Flavor",
];

/// Generic phrases of which at most one generated label is kept.
const GENERIC_BASES: &[&str] = &[
    "board game",
    "video game",
    "card game",
    "pizza",
    "coffee",
    "chocolate",
    "car brand",
    "phone brand",
    "computer brand",
];

/// Errors a category source may report. Callers are expected to fall back
/// rather than propagate them to players.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("category source unavailable: {0}")]
    Unavailable(String),

    #[error("category source returned malformed data: {0}")]
    Malformed(String),
}

/// Produces category labels for a new deck.
///
/// May return fewer labels than asked for; the deck factory fills the gap
/// from its fallback pool.
pub trait CategorySource: Send + Sync + 'static {
    /// Returns up to `count` labels.
    fn generate(
        &self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<String>, CategoryError>> + Send;
}

// ---------------------------------------------------------------------------
// StaticCategories
// ---------------------------------------------------------------------------

/// Samples labels from a fixed pool without repeats until the pool is
/// exhausted.
#[derive(Debug, Clone)]
pub struct StaticCategories {
    pool: Vec<String>,
}

impl StaticCategories {
    /// Uses [`FALLBACK_CATEGORIES`].
    pub fn new() -> Self {
        Self {
            pool: FALLBACK_CATEGORIES.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Uses a custom pool. An empty pool falls back to the built-in one.
    pub fn with_pool(pool: Vec<String>) -> Self {
        if pool.is_empty() {
            return Self::new();
        }
        Self { pool }
    }

    fn sample(&self, count: usize) -> Vec<String> {
        let mut rng = rand::rng();
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            let mut round = self.pool.clone();
            round.shuffle(&mut rng);
            let take = count - out.len();
            out.extend(round.into_iter().take(take));
        }
        out
    }
}

impl Default for StaticCategories {
    fn default() -> Self {
        Self::new()
    }
}

impl CategorySource for StaticCategories {
    fn generate(
        &self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<String>, CategoryError>> + Send {
        let labels = self.sample(count);
        async move { Ok(labels) }
    }
}

// ---------------------------------------------------------------------------
// ResilientCategories
// ---------------------------------------------------------------------------

/// Retry policy for [`ResilientCategories`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    /// Attempts before falling back to the static pool.
    pub max_attempts: u32,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

/// Wraps a source with over-generation, de-duplication, bounded retries
/// and a static fallback. Never returns an error.
#[derive(Debug, Clone)]
pub struct ResilientCategories<S> {
    inner: S,
    fallback: StaticCategories,
    config: CategoryConfig,
}

impl<S: CategorySource> ResilientCategories<S> {
    pub fn new(inner: S, config: CategoryConfig) -> Self {
        Self {
            inner,
            fallback: StaticCategories::new(),
            config,
        }
    }

    /// Replaces the pool used when every attempt fails.
    pub fn with_fallback(mut self, fallback: StaticCategories) -> Self {
        self.fallback = fallback;
        self
    }

    /// Asks for 15% more than needed (at least 10 more) so de-duplication
    /// still leaves enough.
    fn request_size(count: usize) -> usize {
        count + (count * 15 / 100).max(10)
    }
}

impl<S: CategorySource> CategorySource for ResilientCategories<S> {
    async fn generate(&self, count: usize) -> Result<Vec<String>, CategoryError> {
        let request = Self::request_size(count);
        for attempt in 1..=self.config.max_attempts {
            let result =
                tokio::time::timeout(self.config.attempt_timeout, self.inner.generate(request))
                    .await;
            match result {
                Ok(Ok(labels)) => {
                    let mut unique = dedupe_categories(labels);
                    if unique.is_empty() {
                        tracing::warn!(attempt, "category source returned no usable labels");
                        continue;
                    }
                    unique.truncate(count);
                    tracing::debug!(attempt, requested = count, got = unique.len(), "categories generated");
                    return Ok(unique);
                }
                Ok(Err(e)) => {
                    tracing::warn!(attempt, error = %e, "category generation failed");
                }
                Err(_) => {
                    tracing::warn!(
                        attempt,
                        timeout_ms = self.config.attempt_timeout.as_millis() as u64,
                        "category generation timed out"
                    );
                }
            }
        }
        tracing::warn!(count, "falling back to static categories");
        self.fallback.generate(count).await
    }
}

/// Cleans generated labels: collapses whitespace, drops empties and
/// case-insensitive duplicates, and keeps at most one label per generic
/// base phrase ("pizza", "board game", ...).
pub fn dedupe_categories(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut seen_bases = HashSet::new();
    let mut out = Vec::new();

    for raw in labels {
        let label = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if label.is_empty() {
            continue;
        }
        let key = label.to_lowercase();
        if !seen.insert(key.clone()) {
            continue;
        }
        if let Some(base) = GENERIC_BASES.iter().find(|base| key.contains(*base)) {
            if !seen_bases.insert(*base) {
                continue;
            }
        }
        out.push(label);
    }
    out
}
