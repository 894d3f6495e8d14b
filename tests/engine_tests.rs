//! Facade flow: the command surface a UI or console collaborator drives.

use std::time::Duration;

use palisade::board::Color;
use palisade::engine::{Engine, Player, SearchSummary, TimeControl};
use palisade::error::EngineError;
use palisade::game::GameStatus;
use palisade::search::SearchLimits;

fn engine() -> Engine {
    Engine::with_table_size(1 << 20).unwrap()
}

#[test]
fn make_undo_redo_through_the_facade() {
    let mut engine = engine();
    engine.make_move("e2e4").unwrap();
    engine.make_move("e5").unwrap(); // SAN works too
    assert_eq!(engine.game().cursor(), 2);

    assert!(engine.undo_move().is_some());
    assert!(engine.undo_move().is_some());
    assert!(engine.undo_move().is_none());
    assert!(engine.redo_move().is_some());
    assert_eq!(engine.game().cursor(), 1);
}

#[test]
fn illegal_and_malformed_moves_surface_errors() {
    let mut engine = engine();
    match engine.make_move("e2e5") {
        Err(EngineError::IllegalMove(_)) => {}
        other => panic!("expected IllegalMove, got {other:?}"),
    }
    match engine.make_move("Qxf7") {
        Err(EngineError::IllegalMove(_)) => {}
        other => panic!("expected IllegalMove, got {other:?}"),
    }
    match engine.make_move("zzz") {
        Err(EngineError::Parse { .. }) => {}
        other => panic!("expected Parse, got {other:?}"),
    }
    // the record did not move
    assert_eq!(engine.game().cursor(), 0);
}

#[test]
fn load_fen_with_moves_installs_the_position() {
    let mut engine = engine();
    engine
        .load_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            &["e2e4", "c7c5", "Nf3"],
        )
        .unwrap();
    assert_eq!(
        engine.fen(),
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
    );
    assert!(engine.load_fen("not a fen", &[]).is_err());
}

#[test]
fn play_move_returns_a_legal_move() {
    let mut engine = engine();
    let outcome = engine.search_with(
        &SearchLimits {
            depth: Some(4),
            ..Default::default()
        },
        None,
    );
    let best = outcome.best.expect("start position has moves");
    // the returned move must be playable as-is
    engine.make_move(&best.to_uci()).unwrap();
}

#[test]
fn play_move_on_finished_game_returns_none() {
    let mut engine = engine();
    engine
        .load_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", &[])
        .unwrap();
    assert_eq!(engine.status(), GameStatus::Stalemate);
    let outcome = engine.play_move(None);
    assert!(outcome.best.is_none());
}

#[test]
fn cancel_hook_discards_the_search() {
    let mut engine = engine();
    let mut cancel = || true;
    let outcome = engine.search_with(
        &SearchLimits {
            depth: Some(64),
            ..Default::default()
        },
        Some(&mut cancel),
    );
    assert!(outcome.best.is_none());
}

#[test]
fn summary_reports_mate_scores_in_moves() {
    let mut engine = engine();
    engine
        .load_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", &[])
        .unwrap();
    let outcome = engine.search_with(
        &SearchLimits {
            depth: Some(4),
            ..Default::default()
        },
        None,
    );
    let summary = SearchSummary::from_report(&outcome.report);
    assert_eq!(summary.mate_in, Some(1));
    assert_eq!(summary.pv.first().map(String::as_str), Some("a1a8"));
}

#[test]
fn levels_clamp_and_players_dispatch() {
    let mut engine = engine();
    engine.set_level(99);
    assert_eq!(engine.level(), 10);
    engine.set_level(0);
    assert_eq!(engine.level(), 1);

    // default seats: human white, engine black
    assert!(!engine.engine_to_move());
    engine.make_move("e2e4").unwrap();
    assert!(engine.engine_to_move());

    engine.set_player(
        Color::Black,
        Player::Human {
            name: "opponent".into(),
        },
    );
    assert!(!engine.engine_to_move());
}

#[test]
fn clocks_follow_time_control() {
    let mut engine = engine();
    engine.set_time_control(TimeControl {
        base: Duration::from_secs(60),
        increment: Duration::from_secs(1),
    });
    assert_eq!(engine.clock(Color::White), Duration::from_secs(60));

    let outcome = engine.play_move(None);
    assert!(outcome.best.is_some());
    // elapsed time came off the mover's clock, increment went back on
    let white = engine.clock(Color::White);
    assert!(white <= Duration::from_secs(61));
    assert!(white > Duration::from_secs(30));
    assert_eq!(engine.clock(Color::Black), Duration::from_secs(60));
}

#[test]
fn new_game_resets_everything() {
    let mut engine = engine();
    engine.make_move("e2e4").unwrap();
    engine.new_game();
    assert_eq!(engine.game().cursor(), 0);
    assert_eq!(
        engine.fen(),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
}

#[test]
fn set_break_accepts_a_variation() {
    let mut engine = engine();
    engine.set_break(&["e2e4", "e7e5", "g1f3"]).unwrap();
    // searching still works with the hook armed
    let outcome = engine.search_with(
        &SearchLimits {
            depth: Some(3),
            ..Default::default()
        },
        None,
    );
    assert!(outcome.best.is_some());
    assert!(engine.set_break(&["e2e5"]).is_err());
}

#[test]
fn movetext_journals_the_game() {
    let mut engine = engine();
    for token in ["e2e4", "e7e5", "g1f3", "b8c6"] {
        engine.make_move(token).unwrap();
    }
    assert_eq!(engine.movetext(), "1. e4 e5 2. Nf3 Nc6");
}
