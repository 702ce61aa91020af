//! Match detection after a flip.

use faceoff_protocol::PlayerId;
use serde::Serialize;

use crate::{Card, GamePlayer, Shape, WildMatching};

/// How two visible cards matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Same shape.
    Exact,
    /// Different shapes linked by the active wild card.
    Wild,
}

/// The opponent a faceoff is opened against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub index: usize,
    pub player_id: PlayerId,
    pub card: Card,
    pub kind: MatchKind,
}

/// Result of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    /// First match in player order, if any.
    pub first: Option<Match>,
    /// Further matches found in the same scan. These do not start a
    /// faceoff and are not queued.
    pub ignored: Vec<PlayerId>,
}

/// Scans other players' visible cards against the flipper's.
#[derive(Debug, Clone, Copy)]
pub struct MatchDetector {
    wild_matching: WildMatching,
}

impl MatchDetector {
    pub fn new(wild_matching: WildMatching) -> Self {
        Self { wild_matching }
    }

    /// Compares the top card of `players[flipper]` with every other
    /// player's top card, in list order.
    ///
    /// Empty stacks and pending wild cards never match. `active_wild` only
    /// matters under [`WildMatching::Bridge`].
    pub fn detect(
        &self,
        players: &[GamePlayer],
        flipper: usize,
        active_wild: Option<&Card>,
    ) -> MatchReport {
        let mut report = MatchReport::default();
        let Some(shape) = players
            .get(flipper)
            .and_then(GamePlayer::top_card)
            .and_then(Card::matching_shape)
        else {
            return report;
        };

        for (index, player) in players.iter().enumerate() {
            if index == flipper {
                continue;
            }
            let Some(card) = player.top_card() else {
                continue;
            };
            let Some(other) = card.matching_shape() else {
                continue;
            };

            let kind = if other == shape {
                MatchKind::Exact
            } else if self.bridges(active_wild, shape, other) {
                MatchKind::Wild
            } else {
                continue;
            };

            if report.first.is_none() {
                report.first = Some(Match {
                    index,
                    player_id: player.id,
                    card: card.clone(),
                    kind,
                });
            } else {
                report.ignored.push(player.id);
            }
        }
        report
    }

    fn bridges(&self, active_wild: Option<&Card>, a: Shape, b: Shape) -> bool {
        match (self.wild_matching, active_wild) {
            (WildMatching::Bridge, Some(wild)) => wild.links(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_with(cards: &[Card]) -> GamePlayer {
        let mut player = GamePlayer::new(PlayerId::new(), "p", false);
        for card in cards {
            player.personal_stack.push(card.clone());
        }
        player
    }

    fn circle() -> Card {
        Card::regular(Shape::Circle, "Fruit")
    }

    // =====================================================================
    // Exact matches
    // =====================================================================

    #[test]
    fn test_detect_exact_match() {
        let players = vec![player_with(&[circle()]), player_with(&[circle()])];
        let report = MatchDetector::new(WildMatching::Ignore).detect(&players, 0, None);
        let first = report.first.expect("match");
        assert_eq!(first.index, 1);
        assert_eq!(first.kind, MatchKind::Exact);
        assert!(report.ignored.is_empty());
    }

    #[test]
    fn test_detect_no_match_for_different_shapes() {
        let players = vec![
            player_with(&[circle()]),
            player_with(&[Card::regular(Shape::Square, "Dog")]),
        ];
        let report = MatchDetector::new(WildMatching::Bridge).detect(&players, 0, None);
        assert!(report.first.is_none());
    }

    #[test]
    fn test_detect_first_in_list_order_wins() {
        let players = vec![
            player_with(&[circle()]),
            player_with(&[circle()]),
            player_with(&[Card::regular(Shape::Plus, "x")]),
            player_with(&[circle()]),
        ];
        // The scan starts at the list head, not after the flipper.
        let report = MatchDetector::new(WildMatching::Ignore).detect(&players, 3, None);
        assert_eq!(report.first.expect("match").index, 0);
        assert_eq!(report.ignored, vec![players[1].id]);
    }

    // =====================================================================
    // Exclusions
    // =====================================================================

    #[test]
    fn test_detect_skips_empty_stacks_and_flipper() {
        let players = vec![player_with(&[]), player_with(&[circle()])];
        let report = MatchDetector::new(WildMatching::Ignore).detect(&players, 1, None);
        assert!(report.first.is_none());
    }

    #[test]
    fn test_detect_pending_wild_never_matches() {
        let wild = Card::wild([Shape::Circle, Shape::Square]);
        let players = vec![player_with(&[circle()]), player_with(&[circle(), wild])];
        let report = MatchDetector::new(WildMatching::Bridge).detect(&players, 0, None);
        assert!(report.first.is_none());

        // A flipper whose top is a pending wild matches nobody either.
        let report = MatchDetector::new(WildMatching::Bridge).detect(&players, 1, None);
        assert!(report.first.is_none());
    }

    // =====================================================================
    // Active wild
    // =====================================================================

    #[test]
    fn test_detect_bridge_links_wild_shapes() {
        let wild = Card::wild([Shape::Circle, Shape::Square]);
        let players = vec![
            player_with(&[circle()]),
            player_with(&[Card::regular(Shape::Square, "Dog")]),
        ];
        let report = MatchDetector::new(WildMatching::Bridge).detect(&players, 0, Some(&wild));
        assert_eq!(report.first.expect("match").kind, MatchKind::Wild);
    }

    #[test]
    fn test_detect_ignore_mode_disregards_active_wild() {
        let wild = Card::wild([Shape::Circle, Shape::Square]);
        let players = vec![
            player_with(&[circle()]),
            player_with(&[Card::regular(Shape::Square, "Dog")]),
        ];
        let report = MatchDetector::new(WildMatching::Ignore).detect(&players, 0, Some(&wild));
        assert!(report.first.is_none());
    }

    #[test]
    fn test_detect_bridge_requires_both_shapes_linked() {
        let wild = Card::wild([Shape::Circle, Shape::Plus]);
        let players = vec![
            player_with(&[circle()]),
            player_with(&[Card::regular(Shape::Square, "Dog")]),
        ];
        let report = MatchDetector::new(WildMatching::Bridge).detect(&players, 0, Some(&wild));
        assert!(report.first.is_none());
    }
}
