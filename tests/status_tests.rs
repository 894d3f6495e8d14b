//! Game-record behavior: undo/redo cursor semantics, draw detection, and
//! the game-over scenarios.

use palisade::game::{Game, GameStatus};
use palisade::moves::attacks::attack_tables;
use palisade::notation::parse_uci;

fn make(game: &mut Game, token: &str) {
    let tables = attack_tables();
    let mut scratch = game.board().clone();
    let mv = parse_uci(&mut scratch, tables, token).expect(token);
    game.make(mv);
}

#[test]
fn stalemate_is_recognized() {
    let tables = attack_tables();
    let mut game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(game.status(tables), GameStatus::Stalemate);
}

#[test]
fn checkmate_is_recognized() {
    let tables = attack_tables();
    // back-rank mate delivered
    let mut game = Game::from_fen("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1").unwrap();
    assert_eq!(game.status(tables), GameStatus::Checkmate);
}

/// Scenario: knights shuffle out and back twice; the start position has
/// then occurred three times and the threefold detector fires.
#[test]
fn threefold_repetition_detected() {
    let tables = attack_tables();
    let mut game = Game::new();
    let loop_once = ["b1c3", "b8c6", "c3b1", "c6b8"];

    for token in loop_once {
        make(&mut game, token);
    }
    assert_eq!(game.repetition_count(), 2);
    assert!(!game.is_threefold());
    assert_eq!(game.status(tables), GameStatus::InPlay);

    for token in loop_once {
        make(&mut game, token);
    }
    assert_eq!(game.repetition_count(), 3);
    assert!(game.is_threefold());
    assert_eq!(game.status(tables), GameStatus::DrawThreefold);
}

#[test]
fn repetition_threshold_is_configurable() {
    let mut game = Game::new();
    game.set_repetition_threshold(5);
    for _ in 0..2 {
        for token in ["b1c3", "b8c6", "c3b1", "c6b8"] {
            make(&mut game, token);
        }
    }
    assert_eq!(game.repetition_count(), 3);
    assert!(!game.is_threefold());
}

/// An irreversible move fences the repetition window: positions on the far
/// side of a pawn move no longer count.
#[test]
fn repetition_window_stops_at_irreversible_moves() {
    let mut game = Game::new();
    for token in ["b1c3", "b8c6", "c3b1", "c6b8"] {
        make(&mut game, token);
    }
    assert_eq!(game.repetition_count(), 2);

    make(&mut game, "e2e4");
    make(&mut game, "e7e5");
    for token in ["b1c3", "b8c6", "c3b1", "c6b8"] {
        make(&mut game, token);
    }
    // the pre-pawn-push repetitions are unreachable now
    assert_eq!(game.repetition_count(), 2);
}

/// Scenario: one hundred reversible plies trip the fifty-move rule.
#[test]
fn fifty_move_rule_triggers_after_hundred_plies() {
    let mut game = Game::new();
    let cycle = ["b1c3", "b8c6", "c3b1", "c6b8"];
    for i in 0..100 {
        make(&mut game, cycle[i % 4]);
    }
    assert_eq!(game.halfmove_clock(), 100);
    assert!(game.is_fifty_move());
}

#[test]
fn fifty_move_status_without_repetition() {
    let tables = attack_tables();
    // clock one ply short; a quiet rook lift completes it
    let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
    make(&mut game, "a1a4");
    assert_eq!(game.halfmove_clock(), 100);
    assert_eq!(game.status(tables), GameStatus::DrawFiftyMove);
}

#[test]
fn insufficient_material_status() {
    let tables = attack_tables();
    let mut game = Game::from_fen("8/8/4k3/8/8/3BK3/8/8 w - - 0 1").unwrap();
    assert_eq!(game.status(tables), GameStatus::DrawInsufficient);
}

#[test]
fn undo_redo_moves_the_cursor() {
    let mut game = Game::new();
    make(&mut game, "e2e4");
    make(&mut game, "e7e5");
    let after_two = game.to_fen();

    assert!(game.undo().is_some());
    assert_eq!(game.cursor(), 1);
    assert!(game.undo().is_some());
    assert_eq!(game.cursor(), 0);
    assert_eq!(game.board(), &palisade::board::Board::new());
    assert!(game.undo().is_none());

    assert!(game.redo().is_some());
    assert!(game.redo().is_some());
    assert_eq!(game.to_fen(), after_two);
    assert!(game.redo().is_none());
}

/// Making a new move after an undo discards the redo tail.
#[test]
fn new_move_truncates_redo_tail() {
    let mut game = Game::new();
    make(&mut game, "e2e4");
    make(&mut game, "e7e5");
    game.undo();

    make(&mut game, "c7c5");
    assert_eq!(game.cursor(), 2);
    assert!(game.redo().is_none());
    assert_eq!(game.applied()[1].to_uci(), "c7c5");
}

#[test]
fn fullmove_number_counts_from_base() {
    let mut game = Game::new();
    assert_eq!(game.fullmove_number(), 1);
    make(&mut game, "e2e4");
    assert_eq!(game.fullmove_number(), 1);
    make(&mut game, "e7e5");
    assert_eq!(game.fullmove_number(), 2);

    // black to move in the base position
    let mut game = Game::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 30").unwrap();
    make(&mut game, "e8d8");
    assert_eq!(game.fullmove_number(), 31);
}
