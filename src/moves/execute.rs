//! Destructive make and bit-exact undo. The applied move is the only undo
//! storage: make packs the prior castling/en-passant state and the captured
//! kind into the move word, and undo consumes them. Hash, phase, occupancy
//! and the mailbox are maintained in lockstep by the board's piece
//! primitives.

use crate::board::castle_bits::*;
use crate::board::{Board, Color, Piece, PieceKind};
use crate::hash::zobrist::{xor_castling_rights_delta, zobrist_keys};
use crate::moves::types::Move;
use crate::square::Square;

/// Rook relocation for a castle, keyed by the king's destination square.
#[inline(always)]
fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to.index() {
        6 => (Square::from_index(7), Square::from_index(5)), // white O-O
        2 => (Square::from_index(0), Square::from_index(3)), // white O-O-O
        62 => (Square::from_index(63), Square::from_index(61)), // black O-O
        58 => (Square::from_index(56), Square::from_index(59)), // black O-O-O
        _ => unreachable!("not a castle destination"),
    }
}

/// Castling right forfeited when this side's rook moves from, or is
/// captured on, the given square.
#[inline(always)]
fn rook_right(color: Color, sq: Square) -> u8 {
    match (color, sq.index()) {
        (Color::White, 0) => CASTLE_WQ,
        (Color::White, 7) => CASTLE_WK,
        (Color::Black, 56) => CASTLE_BQ,
        (Color::Black, 63) => CASTLE_BK,
        _ => 0,
    }
}

/// Apply a move. Writes the undo payload (captured kind, prior castling
/// rights, prior en-passant state) into `mv`; the caller must keep that
/// exact value to undo. The moving piece must agree with the from-square
/// (checked in debug builds; the facade validates untrusted moves against
/// the legal-move set before they get here).
pub fn make_move(board: &mut Board, mv: &mut Move) {
    let keys = zobrist_keys();
    let piece = mv.piece();
    let color = piece.color();
    let from = mv.from();
    let to = mv.to();

    debug_assert_eq!(color, board.side_to_move, "move for the wrong side");
    debug_assert_eq!(
        board.piece_on(from),
        piece,
        "moving piece disagrees with from-square"
    );

    mv.set_prior_state(board.castling_rights, board.en_passant);

    // captured piece; on en passant it does not sit on the to-square
    let ep_capture = piece.kind() == PieceKind::Pawn
        && board.en_passant == Some(to)
        && from.file() != to.file();
    let (captured, cap_sq) = if ep_capture {
        (PieceKind::Pawn, Square::new(from.rank(), to.file()))
    } else {
        (board.kind_on(to), to)
    };
    mv.set_captured(captured);

    if let Some(ep) = board.en_passant {
        board.zobrist ^= keys.ep_file[ep.file() as usize];
    }
    board.en_passant = None;

    let old_rights = board.castling_rights;
    let mut forfeit = 0u8;

    if captured != PieceKind::None {
        board.lift_piece(Piece::new(color.opposite(), captured), cap_sq);
        if captured == PieceKind::Rook {
            forfeit |= rook_right(color.opposite(), cap_sq);
        }
    }

    board.lift_piece(piece, from);
    match mv.promotion() {
        PieceKind::None => board.put_piece(piece, to),
        promo => board.put_piece(Piece::new(color, promo), to),
    }

    match piece.kind() {
        PieceKind::Pawn => {
            if mv.is_double_push() {
                let ep_sq = Square::from_index((from.index() as i8 + color.forward()) as u8);
                board.en_passant = Some(ep_sq);
                board.zobrist ^= keys.ep_file[ep_sq.file() as usize];
            }
        }
        PieceKind::King => {
            forfeit |= match color {
                Color::White => CASTLE_WK | CASTLE_WQ,
                Color::Black => CASTLE_BK | CASTLE_BQ,
            };
            if mv.is_castle() {
                let (rook_from, rook_to) = castle_rook_squares(to);
                let rook = Piece::new(color, PieceKind::Rook);
                board.lift_piece(rook, rook_from);
                board.put_piece(rook, rook_to);
            }
        }
        PieceKind::Rook => forfeit |= rook_right(color, from),
        _ => {}
    }

    let new_rights = old_rights & !forfeit;
    if new_rights != old_rights {
        board.castling_rights = new_rights;
        xor_castling_rights_delta(&mut board.zobrist, keys, old_rights, new_rights);
    }

    board.side_to_move = color.opposite();
    board.zobrist ^= keys.side_to_move;

    board.debug_validate();
}

/// Exact inverse of `make_move`, consuming the undo payload the make wrote.
pub fn undo_move(board: &mut Board, mv: Move) {
    let keys = zobrist_keys();
    let piece = mv.piece();
    let mover = piece.color();
    let from = mv.from();
    let to = mv.to();

    debug_assert_eq!(board.side_to_move, mover.opposite());

    board.side_to_move = mover;
    board.zobrist ^= keys.side_to_move;

    if let Some(ep) = board.en_passant {
        board.zobrist ^= keys.ep_file[ep.file() as usize];
    }
    let prior_ep = mv.prior_en_passant(mover);
    board.en_passant = prior_ep;
    if let Some(ep) = prior_ep {
        board.zobrist ^= keys.ep_file[ep.file() as usize];
    }

    let current = board.castling_rights;
    let prior = mv.prior_castling();
    if current != prior {
        xor_castling_rights_delta(&mut board.zobrist, keys, current, prior);
        board.castling_rights = prior;
    }

    match mv.promotion() {
        PieceKind::None => board.lift_piece(piece, to),
        promo => board.lift_piece(Piece::new(mover, promo), to),
    }
    board.put_piece(piece, from);

    if mv.is_castle() {
        let (rook_from, rook_to) = castle_rook_squares(to);
        let rook = Piece::new(mover, PieceKind::Rook);
        board.lift_piece(rook, rook_to);
        board.put_piece(rook, rook_from);
    }

    let captured = mv.captured();
    if captured != PieceKind::None {
        let cap_sq = if mv.is_en_passant(prior_ep) {
            Square::new(from.rank(), to.file())
        } else {
            to
        };
        board.put_piece(Piece::new(mover.opposite(), captured), cap_sq);
    }

    board.debug_validate();
}

/// Whether a pseudo-legal move leaves the mover's king safe, by applying
/// and reverting it.
pub fn is_legal_move(
    board: &mut Board,
    tables: &crate::moves::attacks::AttackTables,
    mv: Move,
) -> bool {
    let mover = board.side_to_move;
    let mut applied = mv;
    make_move(board, &mut applied);
    let legal = !crate::moves::square_control::in_check(board, mover, tables);
    undo_move(board, applied);
    legal
}

/// Undo token for a null move; everything else about the position is
/// untouched by the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullUndo {
    prev_en_passant: Option<Square>,
}

/// Give the move away: flip side to move and clear the en-passant target.
/// Used only by null-move pruning; never legal in a real game.
pub fn make_null(board: &mut Board) -> NullUndo {
    let keys = zobrist_keys();
    let undo = NullUndo {
        prev_en_passant: board.en_passant,
    };
    if let Some(ep) = board.en_passant {
        board.zobrist ^= keys.ep_file[ep.file() as usize];
    }
    board.en_passant = None;
    board.side_to_move = board.side_to_move.opposite();
    board.zobrist ^= keys.side_to_move;
    undo
}

pub fn undo_null(board: &mut Board, undo: NullUndo) {
    let keys = zobrist_keys();
    board.side_to_move = board.side_to_move.opposite();
    board.zobrist ^= keys.side_to_move;
    board.en_passant = undo.prev_en_passant;
    if let Some(ep) = board.en_passant {
        board.zobrist ^= keys.ep_file[ep.file() as usize];
    }
}
