//! Hash and phase maintenance: the incrementally kept values must always
//! equal a from-scratch recomputation, and identical positions reached by
//! different move orders must hash identically.

use std::str::FromStr;

use palisade::board::Board;
use palisade::moves::attacks::attack_tables;
use palisade::moves::execute::{make_move, undo_move};
use palisade::moves::movegen::generate_legal;
use palisade::moves::types::MoveList;
use palisade::notation::parse_uci;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Walk pseudo-random games and verify the incremental hash and phase at
/// every position along the way.
#[test]
fn incremental_hash_and_phase_match_recomputation() {
    let tables = attack_tables();

    for seed in 0..8u64 {
        let mut board = Board::new();
        let mut rng = splitmix64(seed);
        let mut applied = Vec::new();

        for _ in 0..60 {
            let mut moves = MoveList::new();
            let mut scratch = MoveList::new();
            generate_legal(&mut board, tables, &mut moves, &mut scratch);
            if moves.is_empty() {
                break;
            }
            rng = splitmix64(rng);
            let mut mv = moves[(rng % moves.len() as u64) as usize];
            make_move(&mut board, &mut mv);
            applied.push(mv);

            assert_eq!(board.zobrist, board.compute_zobrist_full(), "hash drifted");
            assert_eq!(board.phase, board.compute_phase_full(), "phase drifted");
        }

        // unwinding the whole game restores the start position exactly
        for mv in applied.into_iter().rev() {
            undo_move(&mut board, mv);
            assert_eq!(board.zobrist, board.compute_zobrist_full());
        }
        assert_eq!(board, Board::new());
    }
}

/// Transpositions hash equal: knight development in either order reaches
/// the same position and the same hash.
#[test]
fn transpositions_collide_on_purpose() {
    let tables = attack_tables();

    let play = |tokens: &[&str]| -> Board {
        let mut board = Board::new();
        for token in tokens {
            let mut mv = parse_uci(&mut board, tables, token).unwrap();
            make_move(&mut board, &mut mv);
        }
        board
    };

    let a = play(&["b1c3", "g8f6", "g1f3", "b8c6"]);
    let b = play(&["g1f3", "b8c6", "b1c3", "g8f6"]);
    assert_eq!(a, b);
    assert_eq!(a.zobrist, b.zobrist);
}

/// The en-passant file keys only apply while the target is set.
#[test]
fn en_passant_hash_is_transient() {
    let tables = attack_tables();
    let mut board = Board::new();

    let mut push = parse_uci(&mut board, tables, "e2e4").unwrap();
    make_move(&mut board, &mut push);
    let with_ep = board.zobrist;
    assert!(board.en_passant.is_some());

    let mut reply = parse_uci(&mut board, tables, "g8f6").unwrap();
    make_move(&mut board, &mut reply);
    assert!(board.en_passant.is_none());

    undo_move(&mut board, reply);
    assert_eq!(board.zobrist, with_ep);
}

/// Side to move is part of position identity.
#[test]
fn side_to_move_changes_hash() {
    let white = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let black = Board::from_str("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
    assert_ne!(white.zobrist, black.zobrist);
}

/// Castling rights are part of position identity.
#[test]
fn castling_rights_change_hash() {
    let all = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let none = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
    let some = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1").unwrap();
    assert_ne!(all.zobrist, none.zobrist);
    assert_ne!(all.zobrist, some.zobrist);
    assert_ne!(none.zobrist, some.zobrist);
}
