//! Deck building.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::{Card, DeckConfig, FALLBACK_CATEGORIES, Shape};

/// Builds shuffled decks: a fixed number of cards per regular shape plus a
/// fixed number of wild cards.
#[derive(Debug, Clone)]
pub struct DeckFactory {
    config: DeckConfig,
    fallback: Vec<String>,
}

impl DeckFactory {
    pub fn new(config: DeckConfig) -> Self {
        Self {
            config,
            fallback: FALLBACK_CATEGORIES.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Replaces the label pool used to fill slots the category source left
    /// empty. An empty pool is ignored.
    pub fn with_fallback(mut self, pool: Vec<String>) -> Self {
        if !pool.is_empty() {
            self.fallback = pool;
        }
        self
    }

    /// How many category labels a deck consumes.
    pub fn regular_card_count(&self) -> usize {
        self.config.regular_count()
    }

    /// Builds and shuffles a full deck.
    ///
    /// `categories` is whatever the category source produced; it may be
    /// short or empty. `player_count` does not change the deck size.
    pub fn build_deck<R: Rng + ?Sized>(
        &self,
        player_count: usize,
        categories: &[String],
        rng: &mut R,
    ) -> Vec<Card> {
        let labels = self.fill_labels(categories, rng);
        let mut deck = Vec::with_capacity(self.config.total_count());

        let slots = self
            .config
            .shapes
            .iter()
            .flat_map(|shape| std::iter::repeat_n(*shape, self.config.cards_per_shape));
        for (shape, label) in slots.zip(labels) {
            deck.push(Card::regular(shape, label));
        }

        for _ in 0..self.config.wild_cards {
            let mut picks = Shape::REGULAR.choose_multiple(rng, 2).copied();
            if let (Some(a), Some(b)) = (picks.next(), picks.next()) {
                deck.push(Card::wild([a, b]));
            }
        }

        deck.shuffle(rng);
        tracing::debug!(player_count, cards = deck.len(), "deck built");
        deck
    }

    /// Returns exactly `regular_card_count()` labels: the supplied ones
    /// first, then unused fallback labels, then repeats of the fallback
    /// pool.
    fn fill_labels<R: Rng + ?Sized>(&self, categories: &[String], rng: &mut R) -> Vec<String> {
        let needed = self.regular_card_count();
        let mut labels: Vec<String> = categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .take(needed)
            .map(str::to_owned)
            .collect();

        if labels.len() < needed {
            let used: HashSet<String> = labels.iter().map(|l| l.to_lowercase()).collect();
            let mut fresh: Vec<&String> = self
                .fallback
                .iter()
                .filter(|l| !used.contains(&l.to_lowercase()))
                .collect();
            fresh.shuffle(rng);
            let take = needed - labels.len();
            labels.extend(fresh.into_iter().take(take).cloned());
        }

        while labels.len() < needed && !self.fallback.is_empty() {
            let mut round = self.fallback.clone();
            round.shuffle(rng);
            let take = needed - labels.len();
            labels.extend(round.into_iter().take(take));
        }

        labels
    }
}

impl Default for DeckFactory {
    fn default() -> Self {
        Self::new(DeckConfig::default())
    }
}
