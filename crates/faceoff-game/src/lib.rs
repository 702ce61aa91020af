//! # faceoff-game
//!
//! The rules of Faceoff, independent of networking.
//!
//! - [`DeckFactory`] builds shuffled decks of shaped, labelled cards.
//! - [`CategorySource`] supplies the labels; [`StaticCategories`] works
//!   offline and [`ResilientCategories`] wraps any source with retries.
//! - [`GameMachine`] applies start, flip, answer, resolve and end to a
//!   [`Game`], using [`MatchDetector`] after every flip.
//!
//! Nothing here is shared between rooms. A room owns one `Game` and one
//! `GameMachine` and calls them from a single task.

mod card;
mod categories;
mod config;
mod deck;
mod error;
mod game;
mod machine;
mod matching;

pub use card::{Card, CardId, CardStack, Shape, WILD_CARD_LABEL};
pub use categories::{
    CategoryConfig, CategoryError, CategorySource, FALLBACK_CATEGORIES, ResilientCategories,
    StaticCategories, dedupe_categories,
};
pub use config::{DeckConfig, GameConfig, WildMatching};
pub use deck::DeckFactory;
pub use error::GameError;
pub use game::{
    EndReason, Faceoff, FinalScores, Game, GameEvent, GameEventKind, GamePlayer, GameStatus,
    HISTORY_SNAPSHOT_LEN, ScoreEntry,
};
pub use machine::{AnswerOutcome, FaceoffResolution, FlipOutcome, GameMachine};
pub use matching::{Match, MatchDetector, MatchKind, MatchReport};
