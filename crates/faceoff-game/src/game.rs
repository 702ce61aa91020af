//! The per-room game model: players, stacks, faceoff, history.

use std::time::{SystemTime, UNIX_EPOCH};

use faceoff_protocol::{PlayerId, RoomCode};
use serde::{Deserialize, Serialize, Serializer};

use crate::{Card, CardStack, MatchKind, Shape};

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// ```text
/// Waiting → Active ⇄ Faceoff
///             ↓
///         Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Active,
    Faceoff,
    Completed,
}

impl GameStatus {
    /// Returns `true` while flips or answers are still meaningful.
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::Active | Self::Faceoff)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Faceoff => write!(f, "faceoff"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// GamePlayer
// ---------------------------------------------------------------------------

/// A seat in the game. Copied from the room at start; later room changes
/// do not touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePlayer {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub score: u32,
    pub personal_stack: CardStack,
    pub has_flipped_this_turn: bool,
}

impl GamePlayer {
    pub fn new(id: PlayerId, name: impl Into<String>, is_host: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_host,
            score: 0,
            personal_stack: CardStack::new(),
            has_flipped_this_turn: false,
        }
    }

    /// The visible card on this player's stack.
    pub fn top_card(&self) -> Option<&Card> {
        self.personal_stack.peek()
    }
}

// ---------------------------------------------------------------------------
// Faceoff
// ---------------------------------------------------------------------------

/// Two players whose visible cards match. Player A is the one who flipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Faceoff {
    pub player_a_id: PlayerId,
    pub player_b_id: PlayerId,
    /// The flipper's shape.
    pub shape: Shape,
    pub player_a_card: Card,
    pub player_b_card: Card,
    /// Exact shapes, or linked through the active wild card.
    pub kind: MatchKind,
    pub timestamp: u64,
}

impl Faceoff {
    /// Returns the other participant, or `None` if `player` is not in
    /// this faceoff.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if player == self.player_a_id {
            Some(self.player_b_id)
        } else if player == self.player_b_id {
            Some(self.player_a_id)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// Ranking by score, highest first; ties keep turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalScores {
    pub rankings: Vec<ScoreEntry>,
    pub winner: Option<ScoreEntry>,
}

impl FinalScores {
    pub(crate) fn rank(players: &[GamePlayer]) -> Self {
        let mut rankings: Vec<ScoreEntry> = players
            .iter()
            .map(|p| ScoreEntry {
                player_id: p.id,
                name: p.name.clone(),
                score: p.score,
            })
            .collect();
        // `sort_by` is stable, so equal scores keep turn order.
        rankings.sort_by(|a, b| b.score.cmp(&a.score));
        let winner = rankings.first().cloned();
        Self { rankings, winner }
    }
}

// ---------------------------------------------------------------------------
// GameEvent
// ---------------------------------------------------------------------------

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Requested,
    DeckExhausted,
}

/// What happened, with the details that matter for each kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GameEventKind {
    GameStarted {
        player_count: usize,
        deck_size: usize,
    },
    WildCardDrawn {
        card: Card,
    },
    WildCardActivated {
        card: Card,
        discarded: Option<Card>,
    },
    CardFlipped {
        card: Card,
    },
    FaceoffStarted {
        opponent_id: PlayerId,
        shape: Shape,
        kind: MatchKind,
        ignored_matches: usize,
    },
    TurnChanged {
        from_index: usize,
        to_index: usize,
        next_player_id: PlayerId,
    },
    AnswerSubmitted {
        answer: String,
        category: String,
        is_valid: bool,
    },
    FaceoffResolved {
        winner_id: PlayerId,
        loser_id: PlayerId,
        transferred_card: Card,
        winner_score: u32,
    },
    DeckRefilled {
        deck_size: usize,
        refills: u32,
    },
    GameEnded {
        winner_id: Option<PlayerId>,
        reason: EndReason,
    },
}

/// An append-only audit entry. For observability only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    #[serde(flatten)]
    pub kind: GameEventKind,
    pub player_id: Option<PlayerId>,
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// History entries included in a serialized snapshot, newest last.
pub const HISTORY_SNAPSHOT_LEN: usize = 50;

fn stack_len<S: Serializer>(stack: &CardStack, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(stack.len() as u64)
}

fn recent_history<S: Serializer>(history: &[GameEvent], serializer: S) -> Result<S::Ok, S::Error> {
    let skip = history.len().saturating_sub(HISTORY_SNAPSHOT_LEN);
    serializer.collect_seq(&history[skip..])
}

/// Full state of one room's game.
///
/// Serializes as the snapshot broadcast to clients. The shared deck is
/// reported as `deckSize` only, and `history` as its last
/// [`HISTORY_SNAPSHOT_LEN`] entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub room_code: RoomCode,
    pub status: GameStatus,
    pub players: Vec<GamePlayer>,
    #[serde(rename = "deckSize", serialize_with = "stack_len")]
    pub shared_deck: CardStack,
    pub current_faceoff: Option<Faceoff>,
    pub current_wild_card: Option<Card>,
    pub turn_index: usize,
    pub current_player_id: PlayerId,
    #[serde(serialize_with = "recent_history")]
    pub history: Vec<GameEvent>,
    pub deck_refills: u32,
    pub started_at: u64,
    pub ended_at: Option<u64>,
    pub final_scores: Option<FinalScores>,
    /// Labels fetched at start, reused when the deck is rebuilt.
    #[serde(skip)]
    pub(crate) category_pool: Vec<String>,
}

impl Game {
    pub fn player(&self, id: PlayerId) -> Option<&GamePlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Cards in all personal stacks plus the shared deck. The active wild
    /// card is not counted.
    pub fn cards_in_play(&self) -> usize {
        self.shared_deck.len()
            + self
                .players
                .iter()
                .map(|p| p.personal_stack.len())
                .sum::<usize>()
    }

    pub(crate) fn record(&mut self, kind: GameEventKind, player_id: Option<PlayerId>) {
        self.history.push(GameEvent {
            kind,
            player_id,
            timestamp: now_millis(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, score: u32) -> GamePlayer {
        let mut p = GamePlayer::new(PlayerId::new(), name, false);
        p.score = score;
        p
    }

    #[test]
    fn test_final_scores_rank_descending_stable() {
        let players = vec![player("a", 1), player("b", 3), player("c", 1), player("d", 3)];
        let scores = FinalScores::rank(&players);
        let names: Vec<_> = scores.rankings.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
        assert_eq!(scores.winner.unwrap().name, "b");
    }

    #[test]
    fn test_final_scores_empty() {
        let scores = FinalScores::rank(&[]);
        assert!(scores.winner.is_none());
    }

    #[test]
    fn test_faceoff_opponent_of() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        let faceoff = Faceoff {
            player_a_id: a,
            player_b_id: b,
            shape: Shape::Circle,
            player_a_card: Card::regular(Shape::Circle, "x"),
            player_b_card: Card::regular(Shape::Circle, "y"),
            kind: MatchKind::Exact,
            timestamp: 0,
        };
        assert_eq!(faceoff.opponent_of(a), Some(b));
        assert_eq!(faceoff.opponent_of(b), Some(a));
        assert_eq!(faceoff.opponent_of(PlayerId::new()), None);
    }

    #[test]
    fn test_game_event_wire_format() {
        let event = GameEvent {
            kind: GameEventKind::DeckRefilled {
                deck_size: 108,
                refills: 1,
            },
            player_id: None,
            timestamp: 42,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "deck_refilled");
        assert_eq!(json["data"]["deckSize"], 108);
        assert_eq!(json["timestamp"], 42);
    }

    #[test]
    fn test_snapshot_history_keeps_newest_entries() {
        let mut machine = crate::GameMachine::new(crate::GameConfig::default());
        let code = RoomCode::parse("ABC123").unwrap();
        let mut game = machine
            .start(code, vec![player("a", 0), player("b", 0)], Vec::new())
            .unwrap();
        for refills in 0..(HISTORY_SNAPSHOT_LEN as u32 * 2) {
            game.record(
                GameEventKind::DeckRefilled {
                    deck_size: 1,
                    refills,
                },
                None,
            );
        }
        let total = game.history.len();

        let json = serde_json::to_value(&game).unwrap();
        let sent = json["history"].as_array().unwrap();
        assert_eq!(sent.len(), HISTORY_SNAPSHOT_LEN);
        assert_eq!(sent.last().unwrap()["data"]["refills"], HISTORY_SNAPSHOT_LEN * 2 - 1);
        assert_eq!(game.history.len(), total);
    }

    #[test]
    fn test_game_status_in_progress() {
        assert!(GameStatus::Active.is_in_progress());
        assert!(GameStatus::Faceoff.is_in_progress());
        assert!(!GameStatus::Waiting.is_in_progress());
        assert!(!GameStatus::Completed.is_in_progress());
    }
}
