//! End-to-end rule scenarios against `GameMachine`.
//!
//! Draws are forced by replacing the shared deck with known cards.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use faceoff_game::*;
use faceoff_protocol::{PlayerId, RoomCode};
use rand::SeedableRng;
use rand::rngs::StdRng;

// =========================================================================
// Helpers
// =========================================================================

fn machine_with(config: GameConfig) -> GameMachine {
    GameMachine::with_rng(config, StdRng::seed_from_u64(42))
}

fn machine() -> GameMachine {
    machine_with(GameConfig::default())
}

fn start(machine: &mut GameMachine, names: &[&str]) -> Game {
    let roster = names
        .iter()
        .enumerate()
        .map(|(i, name)| GamePlayer::new(PlayerId::new(), *name, i == 0))
        .collect();
    machine
        .start(RoomCode::parse("GAME01").unwrap(), roster, Vec::new())
        .unwrap()
}

/// The next draws will be `cards`, in order.
fn force_draws(game: &mut Game, cards: Vec<Card>) {
    game.shared_deck = cards.into_iter().rev().collect();
}

fn card(shape: Shape) -> Card {
    Card::regular(shape, "Test")
}

fn contains_card(game: &Game, id: CardId) -> bool {
    game.shared_deck.iter().any(|c| c.id == id)
        || game
            .players
            .iter()
            .any(|p| p.personal_stack.iter().any(|c| c.id == id))
}

// =========================================================================
// Turns
// =========================================================================

#[test]
fn test_basic_turn_advances_to_next_player() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Alice", "Bob"]);
    let (alice, bob) = (game.players[0].id, game.players[1].id);
    assert_eq!(game.status, GameStatus::Active);
    assert_eq!(game.current_player_id, alice);

    force_draws(&mut game, vec![card(Shape::Circle), card(Shape::Square)]);

    let outcome = machine.flip_card(&mut game, alice).unwrap();
    let FlipOutcome::Flipped {
        faceoff,
        next_player_id,
        ..
    } = outcome
    else {
        panic!("expected a regular flip");
    };
    assert!(faceoff.is_none());
    assert_eq!(next_player_id, bob);
    assert_eq!(game.current_player_id, bob);
    assert_eq!(game.turn_index, 1);
    // Alice keeps her flag until her turn comes round again.
    assert!(game.players[0].has_flipped_this_turn);
    assert!(!game.players[1].has_flipped_this_turn);

    machine.flip_card(&mut game, bob).unwrap();
    assert_eq!(game.current_player_id, alice);
    assert!(!game.players[0].has_flipped_this_turn);
}

#[test]
fn test_turn_wraps_from_last_to_first() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["A", "B", "C"]);
    let ids: Vec<_> = game.players.iter().map(|p| p.id).collect();
    force_draws(
        &mut game,
        vec![card(Shape::Circle), card(Shape::Square), card(Shape::Plus)],
    );

    for id in &ids {
        machine.flip_card(&mut game, *id).unwrap();
    }
    assert_eq!(game.current_player_id, ids[0]);
    assert_eq!(game.turn_index, 0);
}

#[test]
fn test_second_flip_same_turn_is_rejected_without_mutation() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Alice", "Bob"]);
    let alice = game.players[0].id;
    game.players[1].personal_stack.push(card(Shape::Circle));
    force_draws(&mut game, vec![card(Shape::Circle), card(Shape::Square)]);

    machine.flip_card(&mut game, alice).unwrap();
    assert_eq!(game.status, GameStatus::Faceoff);

    let deck_before = game.shared_deck.len();
    let history_before = game.history.len();
    let err = machine.flip_card(&mut game, alice).unwrap_err();
    assert!(matches!(err, GameError::AlreadyFlipped));
    assert_eq!(game.shared_deck.len(), deck_before);
    assert_eq!(game.history.len(), history_before);
    assert_eq!(game.players[0].personal_stack.len(), 1);
}

// =========================================================================
// Faceoffs
// =========================================================================

#[test]
fn test_faceoff_detect_and_resolve() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Alice", "Bob"]);
    let (alice, bob) = (game.players[0].id, game.players[1].id);
    let bobs_card = card(Shape::Circle);
    game.players[1].personal_stack.push(bobs_card.clone());
    force_draws(&mut game, vec![card(Shape::Circle)]);

    let FlipOutcome::Flipped { faceoff, .. } = machine.flip_card(&mut game, alice).unwrap() else {
        panic!("expected a regular flip");
    };
    let faceoff = faceoff.expect("faceoff");
    assert_eq!(faceoff.player_a_id, alice);
    assert_eq!(faceoff.player_b_id, bob);
    assert_eq!(faceoff.shape, Shape::Circle);
    assert_eq!(faceoff.kind, MatchKind::Exact);
    assert_eq!(game.status, GameStatus::Faceoff);
    assert_eq!(game.current_faceoff.as_ref(), Some(&faceoff));
    // The turn stays with the flipper while the faceoff is open.
    assert_eq!(game.current_player_id, alice);

    let total_before = game.cards_in_play();
    let resolution = machine.resolve_faceoff(&mut game, bob).unwrap();

    assert_eq!(resolution.winner_id, alice);
    assert_eq!(resolution.transferred_card.id, bobs_card.id);
    assert_eq!(resolution.winner_score, 1);
    assert_eq!(resolution.next_player_id, bob);
    assert_eq!(game.cards_in_play(), total_before);
    assert_eq!(game.players[0].top_card().map(|c| c.id), Some(bobs_card.id));
    assert!(game.players[1].personal_stack.is_empty());
    assert_eq!(game.players[0].score, 1);
    assert_eq!(game.status, GameStatus::Active);
    assert!(game.current_faceoff.is_none());
    assert_eq!(game.current_player_id, bob);
    assert!(!game.players[0].has_flipped_this_turn);
    assert!(!game.players[1].has_flipped_this_turn);
}

#[test]
fn test_faceoff_flipper_can_lose() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Alice", "Bob", "Carol"]);
    let (alice, carol) = (game.players[0].id, game.players[2].id);
    game.players[2].personal_stack.push(card(Shape::Dots));
    force_draws(&mut game, vec![card(Shape::Dots)]);

    machine.flip_card(&mut game, alice).unwrap();
    let resolution = machine.resolve_faceoff(&mut game, alice).unwrap();

    assert_eq!(resolution.winner_id, carol);
    assert_eq!(game.players[2].personal_stack.len(), 2);
    assert_eq!(game.players[2].score, 1);
    // Resolution always passes the turn on from the flipper.
    assert_eq!(game.current_player_id, game.players[1].id);
}

#[test]
fn test_multi_match_uses_first_in_list_order() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Alice", "Bob", "Carol"]);
    let (alice, bob) = (game.players[0].id, game.players[1].id);
    game.players[1].personal_stack.push(card(Shape::Waves));
    game.players[2].personal_stack.push(card(Shape::Waves));
    force_draws(&mut game, vec![card(Shape::Waves)]);

    machine.flip_card(&mut game, alice).unwrap();

    let faceoff = game.current_faceoff.as_ref().expect("faceoff");
    assert_eq!(faceoff.player_b_id, bob);
    let started = game
        .history
        .iter()
        .find_map(|e| match &e.kind {
            GameEventKind::FaceoffStarted {
                ignored_matches, ..
            } => Some(*ignored_matches),
            _ => None,
        })
        .expect("faceoff_started event");
    assert_eq!(started, 1);
}

// =========================================================================
// Wild cards
// =========================================================================

#[test]
fn test_wild_draw_does_not_use_turn() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Alice", "Bob"]);
    let alice = game.players[0].id;
    let wild = Card::wild([Shape::Circle, Shape::Dots]);
    force_draws(&mut game, vec![wild.clone(), card(Shape::Square)]);

    let outcome = machine.flip_card(&mut game, alice).unwrap();
    assert!(matches!(outcome, FlipOutcome::WildDrawn { ref card, activated: None } if card.id == wild.id));
    assert_eq!(game.current_player_id, alice);
    assert!(!game.players[0].has_flipped_this_turn);
    assert_eq!(game.players[0].top_card().map(|c| c.id), Some(wild.id));

    let FlipOutcome::Flipped { activated, .. } = machine.flip_card(&mut game, alice).unwrap() else {
        panic!("expected a regular flip");
    };
    assert_eq!(activated.map(|c| c.id), Some(wild.id));
    assert_eq!(game.current_wild_card.as_ref().map(|c| c.id), Some(wild.id));
    assert_eq!(game.players[0].personal_stack.len(), 1);
    assert_eq!(game.players[0].top_card().map(|c| c.shape), Some(Shape::Square));
}

#[test]
fn test_second_wild_discards_first() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Alice", "Bob"]);
    let (alice, bob) = (game.players[0].id, game.players[1].id);
    let first = Card::wild([Shape::Circle, Shape::Dots]);
    let second = Card::wild([Shape::Waves, Shape::Diamond]);
    force_draws(
        &mut game,
        vec![
            first.clone(),
            card(Shape::Square),
            card(Shape::Plus),
            second.clone(),
            card(Shape::Equals),
        ],
    );

    machine.flip_card(&mut game, alice).unwrap();
    machine.flip_card(&mut game, alice).unwrap();
    machine.flip_card(&mut game, bob).unwrap();
    machine.flip_card(&mut game, alice).unwrap();
    machine.flip_card(&mut game, alice).unwrap();

    assert_eq!(game.current_wild_card.as_ref().map(|c| c.id), Some(second.id));
    assert!(!contains_card(&game, first.id));
    assert!(!contains_card(&game, second.id));

    let discarded = game
        .history
        .iter()
        .filter_map(|e| match &e.kind {
            GameEventKind::WildCardActivated { discarded, .. } => discarded.as_ref(),
            _ => None,
        })
        .map(|c| c.id)
        .collect::<Vec<_>>();
    assert_eq!(discarded, vec![first.id]);
}

#[test]
fn test_pending_wild_never_matches() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Alice", "Bob"]);
    let alice = game.players[0].id;
    game.players[1]
        .personal_stack
        .push(Card::wild([Shape::Circle, Shape::Square]));
    force_draws(&mut game, vec![card(Shape::Circle)]);

    machine.flip_card(&mut game, alice).unwrap();
    assert_eq!(game.status, GameStatus::Active);
    assert!(game.current_faceoff.is_none());
}

#[test]
fn test_active_wild_bridges_shapes_by_default() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Alice", "Bob"]);
    let alice = game.players[0].id;
    game.current_wild_card = Some(Card::wild([Shape::Circle, Shape::Square]));
    game.players[1].personal_stack.push(card(Shape::Square));
    force_draws(&mut game, vec![card(Shape::Circle)]);

    machine.flip_card(&mut game, alice).unwrap();
    let faceoff = game.current_faceoff.as_ref().expect("faceoff");
    assert_eq!(faceoff.kind, MatchKind::Wild);
    assert_eq!(faceoff.shape, Shape::Circle);
}

#[test]
fn test_active_wild_ignored_when_configured() {
    let mut machine = machine_with(GameConfig {
        wild_matching: WildMatching::Ignore,
        ..GameConfig::default()
    });
    let mut game = start(&mut machine, &["Alice", "Bob"]);
    let alice = game.players[0].id;
    game.current_wild_card = Some(Card::wild([Shape::Circle, Shape::Square]));
    game.players[1].personal_stack.push(card(Shape::Square));
    force_draws(&mut game, vec![card(Shape::Circle)]);

    machine.flip_card(&mut game, alice).unwrap();
    assert!(game.current_faceoff.is_none());
    assert_eq!(game.current_player_id, game.players[1].id);
}

// =========================================================================
// Deck exhaustion
// =========================================================================

#[test]
fn test_empty_deck_refills_then_ends_game() {
    let mut machine = machine();
    let mut game = start(&mut machine, &["Solo"]);
    let solo = game.players[0].id;
    game.players[0].score = 3;

    force_draws(&mut game, Vec::new());
    let outcome = machine.flip_card(&mut game, solo).unwrap();
    assert!(!matches!(outcome, FlipOutcome::GameEnded(_)));
    assert_eq!(game.deck_refills, 1);
    assert_eq!(game.shared_deck.len(), 107);

    // Whatever was drawn, solo is current again with a fresh flag.
    assert_eq!(game.current_player_id, solo);
    let pending = Card::wild([Shape::Plus, Shape::Equals]);
    game.players[0].personal_stack.push(pending.clone());
    let wild_before = game.current_wild_card.clone();

    force_draws(&mut game, Vec::new());
    let FlipOutcome::GameEnded(scores) = machine.flip_card(&mut game, solo).unwrap() else {
        panic!("expected the game to end");
    };
    assert_eq!(scores.winner.as_ref().map(|w| w.score), Some(3));
    assert_eq!(game.status, GameStatus::Completed);
    assert_eq!(game.final_scores.as_ref(), Some(&scores));
    // No draw, no activation.
    assert_eq!(game.players[0].top_card().map(|c| c.id), Some(pending.id));
    assert_eq!(game.current_wild_card, wild_before);
    assert!(matches!(
        game.history.last().map(|e| &e.kind),
        Some(GameEventKind::GameEnded {
            reason: EndReason::DeckExhausted,
            ..
        })
    ));

    let err = machine.flip_card(&mut game, solo).unwrap_err();
    assert!(matches!(err, GameError::NotYourTurn));
}

// =========================================================================
// Category sources
// =========================================================================

struct FailingSource {
    calls: Arc<AtomicU32>,
}

impl CategorySource for FailingSource {
    async fn generate(&self, _count: usize) -> Result<Vec<String>, CategoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CategoryError::Unavailable("offline".into()))
    }
}

struct SilentSource;

impl CategorySource for SilentSource {
    async fn generate(&self, _count: usize) -> Result<Vec<String>, CategoryError> {
        std::future::pending().await
    }
}

struct NoisySource;

impl CategorySource for NoisySource {
    async fn generate(&self, _count: usize) -> Result<Vec<String>, CategoryError> {
        Ok(vec![
            "River".to_string(),
            "river".to_string(),
            "Board Game".to_string(),
            "Strategy Board Game".to_string(),
            "Mountain".to_string(),
        ])
    }
}

#[tokio::test]
async fn test_resilient_categories_retries_then_falls_back() {
    let calls = Arc::new(AtomicU32::new(0));
    let source = ResilientCategories::new(
        FailingSource {
            calls: Arc::clone(&calls),
        },
        CategoryConfig::default(),
    );

    let labels = source.generate(20).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(labels.len(), 20);
    assert!(
        labels
            .iter()
            .all(|l| FALLBACK_CATEGORIES.contains(&l.as_str()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_resilient_categories_times_out_silent_source() {
    let config = CategoryConfig {
        max_attempts: 2,
        attempt_timeout: Duration::from_secs(5),
    };
    let source = ResilientCategories::new(SilentSource, config)
        .with_fallback(StaticCategories::with_pool(vec!["Fallback".into()]));

    let started = tokio::time::Instant::now();
    let labels = source.generate(3).await.unwrap();
    assert_eq!(labels, vec!["Fallback", "Fallback", "Fallback"]);
    assert!(started.elapsed() >= Duration::from_secs(10));
}

#[tokio::test]
async fn test_resilient_categories_dedupes_and_may_return_short() {
    let source = ResilientCategories::new(NoisySource, CategoryConfig::default());
    let labels = source.generate(10).await.unwrap();
    assert_eq!(labels, vec!["River", "Board Game", "Mountain"]);

    // The deck factory still fills a full deck from a short list.
    let deck = DeckFactory::default().build_deck(2, &labels, &mut StdRng::seed_from_u64(9));
    assert_eq!(deck.len(), 108);
}
