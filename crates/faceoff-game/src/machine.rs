//! The turn state machine.
//!
//! `GameMachine` owns the rules and the random source; `Game` owns the
//! state. Every operation either applies completely or returns an error
//! with the game unchanged.

use faceoff_protocol::{PlayerId, RoomCode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::now_millis;
use crate::{
    Card, DeckFactory, EndReason, Faceoff, FinalScores, Game, GameConfig, GameError,
    GameEventKind, GamePlayer, GameStatus, MatchDetector,
};

/// What a flip did.
#[derive(Debug, Clone)]
pub enum FlipOutcome {
    /// A wild card was drawn and is now pending on the player's stack. The
    /// turn is not used up.
    WildDrawn {
        card: Card,
        /// A previously pending wild activated by this flip.
        activated: Option<Card>,
    },
    /// A regular card was drawn.
    Flipped {
        card: Card,
        activated: Option<Card>,
        /// Set when the flip opened a faceoff; the turn then stays put.
        faceoff: Option<Faceoff>,
        next_player_id: PlayerId,
    },
    /// The deck ran out for good and the game is over.
    GameEnded(FinalScores),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub player_id: PlayerId,
    pub is_valid: bool,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceoffResolution {
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub transferred_card: Card,
    pub winner_score: u32,
    pub next_player_id: PlayerId,
}

/// Applies game operations. One per room.
pub struct GameMachine<R = StdRng> {
    config: GameConfig,
    factory: DeckFactory,
    detector: MatchDetector,
    rng: R,
}

impl GameMachine<StdRng> {
    /// Creates a machine seeded from the OS.
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> GameMachine<R> {
    /// Creates a machine with an explicit random source, e.g. a seeded
    /// `StdRng` in tests.
    pub fn with_rng(config: GameConfig, rng: R) -> Self {
        Self {
            factory: DeckFactory::new(config.deck.clone()),
            detector: MatchDetector::new(config.wild_matching),
            config,
            rng,
        }
    }

    /// How many category labels to ask the category source for.
    pub fn categories_needed(&self) -> usize {
        self.factory.regular_card_count()
    }

    // -----------------------------------------------------------------------
    // start
    // -----------------------------------------------------------------------

    /// Creates a game for `players` in their given order. The first player
    /// takes the first turn.
    pub fn start(
        &mut self,
        room_code: RoomCode,
        mut players: Vec<GamePlayer>,
        categories: Vec<String>,
    ) -> Result<Game, GameError> {
        let Some(first) = players.first().map(|p| p.id) else {
            return Err(GameError::NoPlayers);
        };
        for player in &mut players {
            player.has_flipped_this_turn = false;
        }

        let deck = self
            .factory
            .build_deck(players.len(), &categories, &mut self.rng);
        let deck_size = deck.len();
        let player_count = players.len();

        let mut game = Game {
            room_code,
            status: GameStatus::Active,
            players,
            shared_deck: deck.into_iter().collect(),
            current_faceoff: None,
            current_wild_card: None,
            turn_index: 0,
            current_player_id: first,
            history: Vec::new(),
            deck_refills: 0,
            started_at: now_millis(),
            ended_at: None,
            final_scores: None,
            category_pool: categories,
        };
        game.record(
            GameEventKind::GameStarted {
                player_count,
                deck_size,
            },
            None,
        );

        tracing::info!(room_code = %game.room_code, players = player_count, deck_size, "game started");
        Ok(game)
    }

    // -----------------------------------------------------------------------
    // flip_card
    // -----------------------------------------------------------------------

    /// Flips the top card of the shared deck onto `player_id`'s stack.
    pub fn flip_card(
        &mut self,
        game: &mut Game,
        player_id: PlayerId,
    ) -> Result<FlipOutcome, GameError> {
        let index = game
            .player_index(player_id)
            .ok_or(GameError::PlayerNotFound(player_id))?;
        let is_current = index == game.turn_index;
        if is_current && game.players[index].has_flipped_this_turn {
            return Err(GameError::AlreadyFlipped);
        }
        if !is_current || game.status != GameStatus::Active {
            return Err(GameError::NotYourTurn);
        }

        if game.shared_deck.is_empty() && game.deck_refills < self.config.max_deck_refills {
            self.refill_deck(game);
        }
        if game.shared_deck.is_empty() {
            let scores = self.finish(game, EndReason::DeckExhausted);
            return Ok(FlipOutcome::GameEnded(scores));
        }

        let activated = Self::activate_pending_wild(game, index);

        let Some(card) = game.shared_deck.pop() else {
            let scores = self.finish(game, EndReason::DeckExhausted);
            return Ok(FlipOutcome::GameEnded(scores));
        };

        if card.is_wild {
            game.players[index].personal_stack.push(card.clone());
            game.record(
                GameEventKind::WildCardDrawn { card: card.clone() },
                Some(player_id),
            );
            tracing::debug!(room_code = %game.room_code, %player_id, "wild card drawn");
            return Ok(FlipOutcome::WildDrawn { card, activated });
        }

        let player = &mut game.players[index];
        player.personal_stack.push(card.clone());
        player.has_flipped_this_turn = true;
        game.record(
            GameEventKind::CardFlipped { card: card.clone() },
            Some(player_id),
        );

        let report = self
            .detector
            .detect(&game.players, index, game.current_wild_card.as_ref());

        let faceoff = match report.first {
            Some(found) => {
                if !report.ignored.is_empty() {
                    tracing::debug!(
                        room_code = %game.room_code,
                        ignored = ?report.ignored,
                        "additional matches ignored"
                    );
                }
                let faceoff = Faceoff {
                    player_a_id: player_id,
                    player_b_id: found.player_id,
                    shape: card.shape,
                    player_a_card: card.clone(),
                    player_b_card: found.card,
                    kind: found.kind,
                    timestamp: now_millis(),
                };
                game.status = GameStatus::Faceoff;
                game.current_faceoff = Some(faceoff.clone());
                game.record(
                    GameEventKind::FaceoffStarted {
                        opponent_id: found.player_id,
                        shape: card.shape,
                        kind: found.kind,
                        ignored_matches: report.ignored.len(),
                    },
                    Some(player_id),
                );
                tracing::info!(
                    room_code = %game.room_code,
                    player_a = %player_id,
                    player_b = %found.player_id,
                    shape = %card.shape,
                    "faceoff started"
                );
                Some(faceoff)
            }
            None => {
                Self::advance_turn(game);
                None
            }
        };

        Ok(FlipOutcome::Flipped {
            card,
            activated,
            faceoff,
            next_player_id: game.current_player_id,
        })
    }

    /// Moves a pending wild off the top of the player's stack into the
    /// active slot. The previous active wild is dropped.
    fn activate_pending_wild(game: &mut Game, index: usize) -> Option<Card> {
        let player = &mut game.players[index];
        if !player.top_card().is_some_and(|card| card.is_wild) {
            return None;
        }
        let wild = player.personal_stack.pop()?;
        let player_id = player.id;

        let discarded = game.current_wild_card.replace(wild.clone());
        game.record(
            GameEventKind::WildCardActivated {
                card: wild.clone(),
                discarded,
            },
            Some(player_id),
        );
        tracing::debug!(room_code = %game.room_code, %player_id, "wild card activated");
        Some(wild)
    }

    fn refill_deck(&mut self, game: &mut Game) {
        let deck = self
            .factory
            .build_deck(game.players.len(), &game.category_pool, &mut self.rng);
        game.shared_deck = deck.into_iter().collect();
        game.deck_refills += 1;
        let deck_size = game.shared_deck.len();
        game.record(
            GameEventKind::DeckRefilled {
                deck_size,
                refills: game.deck_refills,
            },
            None,
        );
        tracing::info!(room_code = %game.room_code, deck_size, refills = game.deck_refills, "deck refilled");
    }

    /// Passes the turn to the next player in list order. Only the new
    /// current player's flag is cleared.
    fn advance_turn(game: &mut Game) {
        let from = game.turn_index;
        let to = (from + 1) % game.players.len();
        let next = &mut game.players[to];
        next.has_flipped_this_turn = false;
        let next_id = next.id;

        game.turn_index = to;
        game.current_player_id = next_id;
        game.record(
            GameEventKind::TurnChanged {
                from_index: from,
                to_index: to,
                next_player_id: next_id,
            },
            None,
        );
    }

    // -----------------------------------------------------------------------
    // submit_answer
    // -----------------------------------------------------------------------

    /// Scores an answer. Any player may answer at any time while the game
    /// is running; only the length is checked.
    pub fn submit_answer(
        &mut self,
        game: &mut Game,
        player_id: PlayerId,
        answer: &str,
        category: &str,
    ) -> Result<AnswerOutcome, GameError> {
        if !game.status.is_in_progress() {
            return Err(GameError::GameNotInProgress);
        }
        let index = game
            .player_index(player_id)
            .ok_or(GameError::PlayerNotFound(player_id))?;

        let min_len = self.config.min_answer_length.max(1);
        let is_valid = answer.trim().chars().count() >= min_len;
        let player = &mut game.players[index];
        if is_valid {
            player.score += self.config.answer_points;
        }
        let score = player.score;

        game.record(
            GameEventKind::AnswerSubmitted {
                answer: answer.to_owned(),
                category: category.to_owned(),
                is_valid,
            },
            Some(player_id),
        );
        tracing::debug!(room_code = %game.room_code, %player_id, is_valid, "answer submitted");

        Ok(AnswerOutcome {
            player_id,
            is_valid,
            score,
        })
    }

    // -----------------------------------------------------------------------
    // resolve_faceoff
    // -----------------------------------------------------------------------

    /// Ends the active faceoff with `loser_id` giving their top card to the
    /// other participant. Always passes the turn on.
    pub fn resolve_faceoff(
        &mut self,
        game: &mut Game,
        loser_id: PlayerId,
    ) -> Result<FaceoffResolution, GameError> {
        let faceoff = game
            .current_faceoff
            .as_ref()
            .ok_or(GameError::NoActiveFaceoff)?;
        let loser_index = game
            .player_index(loser_id)
            .ok_or(GameError::PlayerNotFound(loser_id))?;
        let winner_id = faceoff
            .opponent_of(loser_id)
            .ok_or(GameError::NotInFaceoff(loser_id))?;
        let winner_index = game
            .player_index(winner_id)
            .ok_or(GameError::PlayerNotFound(winner_id))?;

        let Some(card) = game.players[loser_index].personal_stack.pop() else {
            return Err(GameError::EmptyStack(loser_id));
        };
        game.players[loser_index].has_flipped_this_turn = false;

        let winner = &mut game.players[winner_index];
        winner.personal_stack.push(card.clone());
        winner.score += self.config.faceoff_points;
        winner.has_flipped_this_turn = false;
        let winner_score = winner.score;

        game.current_faceoff = None;
        game.status = GameStatus::Active;
        game.record(
            GameEventKind::FaceoffResolved {
                winner_id,
                loser_id,
                transferred_card: card.clone(),
                winner_score,
            },
            Some(winner_id),
        );
        tracing::info!(
            room_code = %game.room_code,
            winner = %winner_id,
            loser = %loser_id,
            winner_score,
            "faceoff resolved"
        );

        Self::advance_turn(game);

        Ok(FaceoffResolution {
            winner_id,
            loser_id,
            transferred_card: card,
            winner_score,
            next_player_id: game.current_player_id,
        })
    }

    // -----------------------------------------------------------------------
    // end_game
    // -----------------------------------------------------------------------

    /// Ends the game and ranks the players.
    pub fn end_game(&mut self, game: &mut Game) -> Result<FinalScores, GameError> {
        if game.status == GameStatus::Completed {
            return Err(GameError::GameOver);
        }
        Ok(self.finish(game, EndReason::Requested))
    }

    fn finish(&self, game: &mut Game, reason: EndReason) -> FinalScores {
        let scores = FinalScores::rank(&game.players);
        game.status = GameStatus::Completed;
        game.current_faceoff = None;
        game.ended_at = Some(now_millis());
        game.final_scores = Some(scores.clone());

        let winner_id = scores.winner.as_ref().map(|w| w.player_id);
        game.record(GameEventKind::GameEnded { winner_id, reason }, None);
        tracing::info!(room_code = %game.room_code, ?reason, winner = ?winner_id, "game ended");
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CardStack, Shape};

    fn machine() -> GameMachine {
        GameMachine::with_rng(GameConfig::default(), StdRng::seed_from_u64(1))
    }

    fn room() -> RoomCode {
        RoomCode::parse("ABC123").unwrap()
    }

    fn players(names: &[&str]) -> Vec<GamePlayer> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| GamePlayer::new(PlayerId::new(), *name, i == 0))
            .collect()
    }

    /// Replaces the deck so the next draws are `cards`, first item first.
    fn force_draws(game: &mut Game, cards: Vec<Card>) {
        game.shared_deck = cards.into_iter().rev().collect::<CardStack>();
    }

    // =====================================================================
    // start
    // =====================================================================

    #[test]
    fn test_start_sets_first_player_current() {
        let mut machine = machine();
        let roster = players(&["alice", "bob"]);
        let alice = roster[0].id;
        let game = machine.start(room(), roster, Vec::new()).unwrap();

        assert_eq!(game.status, GameStatus::Active);
        assert_eq!(game.turn_index, 0);
        assert_eq!(game.current_player_id, alice);
        assert_eq!(game.shared_deck.len(), 108);
        assert!(matches!(
            game.history[0].kind,
            GameEventKind::GameStarted { player_count: 2, deck_size: 108 }
        ));
    }

    #[test]
    fn test_start_without_players_fails() {
        let mut machine = machine();
        let err = machine.start(room(), Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, GameError::NoPlayers));
    }

    // =====================================================================
    // flip_card errors
    // =====================================================================

    #[test]
    fn test_flip_unknown_player() {
        let mut machine = machine();
        let mut game = machine.start(room(), players(&["a", "b"]), Vec::new()).unwrap();
        let err = machine.flip_card(&mut game, PlayerId::new()).unwrap_err();
        assert!(matches!(err, GameError::PlayerNotFound(_)));
    }

    #[test]
    fn test_flip_out_of_turn() {
        let mut machine = machine();
        let mut game = machine.start(room(), players(&["a", "b"]), Vec::new()).unwrap();
        let bob = game.players[1].id;
        let before = game.shared_deck.len();
        let err = machine.flip_card(&mut game, bob).unwrap_err();
        assert!(matches!(err, GameError::NotYourTurn));
        assert_eq!(game.shared_deck.len(), before);
    }

    // =====================================================================
    // submit_answer
    // =====================================================================

    #[test]
    fn test_submit_answer_validates_length_only() {
        let mut machine = machine();
        let mut game = machine.start(room(), players(&["a", "b"]), Vec::new()).unwrap();
        let bob = game.players[1].id;

        let short = machine.submit_answer(&mut game, bob, "  x ", "Fruit").unwrap();
        assert!(!short.is_valid);
        assert_eq!(short.score, 0);

        let ok = machine.submit_answer(&mut game, bob, " kiwi ", "Fruit").unwrap();
        assert!(ok.is_valid);
        assert_eq!(ok.score, 1);
    }

    #[test]
    fn test_submit_answer_after_end_fails() {
        let mut machine = machine();
        let mut game = machine.start(room(), players(&["a"]), Vec::new()).unwrap();
        let a = game.players[0].id;
        machine.end_game(&mut game).unwrap();
        let err = machine.submit_answer(&mut game, a, "kiwi", "Fruit").unwrap_err();
        assert!(matches!(err, GameError::GameNotInProgress));
    }

    // =====================================================================
    // resolve_faceoff errors
    // =====================================================================

    #[test]
    fn test_resolve_without_faceoff() {
        let mut machine = machine();
        let mut game = machine.start(room(), players(&["a", "b"]), Vec::new()).unwrap();
        let b = game.players[1].id;
        let err = machine.resolve_faceoff(&mut game, b).unwrap_err();
        assert!(matches!(err, GameError::NoActiveFaceoff));
    }

    #[test]
    fn test_resolve_rejects_bystander() {
        let mut machine = machine();
        let mut game = machine
            .start(room(), players(&["a", "b", "c"]), Vec::new())
            .unwrap();
        let (a, c) = (game.players[0].id, game.players[2].id);
        game.players[1]
            .personal_stack
            .push(Card::regular(Shape::Circle, "Fruit"));
        force_draws(&mut game, vec![Card::regular(Shape::Circle, "Dog")]);
        machine.flip_card(&mut game, a).unwrap();
        assert_eq!(game.status, GameStatus::Faceoff);

        let err = machine.resolve_faceoff(&mut game, c).unwrap_err();
        assert!(matches!(err, GameError::NotInFaceoff(id) if id == c));
        assert_eq!(game.status, GameStatus::Faceoff);
    }

    // =====================================================================
    // end_game
    // =====================================================================

    #[test]
    fn test_end_game_twice_fails() {
        let mut machine = machine();
        let mut game = machine.start(room(), players(&["a", "b"]), Vec::new()).unwrap();
        game.players[1].score = 2;
        let scores = machine.end_game(&mut game).unwrap();
        assert_eq!(scores.winner.unwrap().player_id, game.players[1].id);
        assert_eq!(game.status, GameStatus::Completed);
        assert!(game.ended_at.is_some());

        let err = machine.end_game(&mut game).unwrap_err();
        assert!(matches!(err, GameError::GameOver));
    }
}
