//! Game and deck configuration.

use serde::{Deserialize, Serialize};

use crate::Shape;

// ---------------------------------------------------------------------------
// DeckConfig
// ---------------------------------------------------------------------------

/// How many cards a freshly built deck holds.
///
/// Fixed per shape, independent of player count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckConfig {
    /// Shapes regular cards are printed with. All eight by default; a
    /// narrower set makes matches more frequent.
    #[serde(default = "all_regular_shapes")]
    pub shapes: Vec<Shape>,
    /// Regular cards printed for each shape in `shapes`.
    pub cards_per_shape: usize,
    /// Wild cards added on top of the regular ones.
    pub wild_cards: usize,
}

impl DeckConfig {
    /// Number of regular (non-wild) cards, i.e. category labels needed.
    pub fn regular_count(&self) -> usize {
        self.cards_per_shape * self.shapes.len()
    }

    /// Total number of cards in one deck.
    pub fn total_count(&self) -> usize {
        self.regular_count() + self.wild_cards
    }
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            shapes: all_regular_shapes(),
            cards_per_shape: 13,
            wild_cards: 4,
        }
    }
}

fn all_regular_shapes() -> Vec<Shape> {
    Shape::REGULAR.to_vec()
}

// ---------------------------------------------------------------------------
// WildMatching
// ---------------------------------------------------------------------------

/// Whether the active wild card takes part in match detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WildMatching {
    /// Only identical shapes match.
    Ignore,
    /// While a wild linking X and Y is active, a visible X also matches a
    /// visible Y.
    #[default]
    Bridge,
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Rules knobs for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub deck: DeckConfig,
    /// Points for winning a faceoff.
    pub faceoff_points: u32,
    /// Points for a valid submitted answer.
    pub answer_points: u32,
    /// Minimum trimmed length of a valid answer, in characters.
    pub min_answer_length: usize,
    pub wild_matching: WildMatching,
    /// How many times an empty deck is rebuilt before a flip ends the game.
    pub max_deck_refills: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            deck: DeckConfig::default(),
            faceoff_points: 1,
            answer_points: 1,
            min_answer_length: 2,
            wild_matching: WildMatching::default(),
            max_deck_refills: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_config_default_counts() {
        let config = DeckConfig::default();
        assert_eq!(config.regular_count(), 104);
        assert_eq!(config.total_count(), 108);
    }

    #[test]
    fn test_deck_config_narrow_shapes() {
        let config = DeckConfig {
            shapes: vec![Shape::Circle],
            cards_per_shape: 4,
            wild_cards: 0,
        };
        assert_eq!(config.regular_count(), 4);
        assert_eq!(config.total_count(), 4);
    }

    #[test]
    fn test_deck_config_shapes_default_when_omitted() {
        let config: DeckConfig =
            serde_json::from_str(r#"{"cardsPerShape":2,"wildCards":1}"#).unwrap();
        assert_eq!(config.shapes, Shape::REGULAR.to_vec());
        assert_eq!(config.total_count(), 17);
    }

    #[test]
    fn test_game_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.faceoff_points, 1);
        assert_eq!(config.min_answer_length, 2);
        assert_eq!(config.wild_matching, WildMatching::Bridge);
        assert_eq!(config.max_deck_refills, 1);
    }
}
