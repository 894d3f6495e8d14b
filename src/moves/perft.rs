//! Perft: count the leaf nodes of the exact-depth legal move tree. The
//! canonical move-generator correctness check, plus the divide variant for
//! chasing down a miscount.

use tracing::instrument;

use crate::board::Board;
use crate::moves::attacks::AttackTables;
use crate::moves::execute::{make_move, undo_move};
use crate::moves::movegen::{GenMode, generate_pseudo_legal};
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, MoveList};

fn perft_inner(board: &mut Board, tables: &AttackTables, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    generate_pseudo_legal(board, tables, GenMode::All, &mut moves);

    let mover = board.side_to_move;
    let mut nodes = 0;
    for i in 0..moves.len() {
        let mut mv = moves[i];
        make_move(board, &mut mv);
        if !in_check(board, mover, tables) {
            nodes += perft_inner(board, tables, depth - 1);
        }
        undo_move(board, mv);
    }
    nodes
}

#[instrument(level = "debug", skip(board, tables))]
pub fn perft(board: &mut Board, tables: &AttackTables, depth: u32) -> u64 {
    perft_inner(board, tables, depth)
}

/// Per-root-move node counts, sorted by coordinate notation for stable
/// comparison against other engines' divide output.
pub fn perft_divide(
    board: &mut Board,
    tables: &AttackTables,
    depth: u32,
) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }

    let mut moves = MoveList::new();
    generate_pseudo_legal(board, tables, GenMode::All, &mut moves);

    let mover = board.side_to_move;
    let mut out = Vec::new();
    for i in 0..moves.len() {
        let mut mv = moves[i];
        make_move(board, &mut mv);
        if !in_check(board, mover, tables) {
            out.push((mv, perft_inner(board, tables, depth - 1)));
        }
        undo_move(board, mv);
    }
    out.sort_by_key(|(mv, _)| mv.to_uci());
    out
}
