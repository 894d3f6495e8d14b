//! The game-record layer: a base position plus the ordered list of applied
//! moves, with an undo/redo cursor, clock bookkeeping and draw detection.
//!
//! Undone moves stay in the tail so they can be redone; making a new move
//! after an undo truncates the tail. The halfmove clock is never stored: it
//! is recomputed from the record (seeded by the FEN clock), so undo/redo can
//! never desynchronize it.

use serde::Serialize;

use crate::board::{Board, Color, FenClocks, PieceKind, START_FEN};
use crate::error::EngineError;
use crate::moves::attacks::AttackTables;
use crate::moves::execute::{make_move, undo_move};
use crate::moves::movegen::generate_legal;
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, MoveList};
use crate::square::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameStatus {
    InPlay,
    Checkmate,
    Stalemate,
    DrawThreefold,
    DrawFiftyMove,
    DrawInsufficient,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::InPlay
    }

    /// PGN result token for the finished game, `*` while in play.
    pub fn result_token(self, loser: Color) -> &'static str {
        match self {
            GameStatus::InPlay => "*",
            GameStatus::Checkmate => match loser {
                Color::White => "0-1",
                Color::Black => "1-0",
            },
            _ => "1/2-1/2",
        }
    }
}

pub struct Game {
    board: Board,
    /// Applied moves followed by the undone tail.
    moves: Vec<Move>,
    /// Number of currently applied moves; the record's cursor.
    cursor: usize,
    base_fen: String,
    base_clocks: FenClocks,
    base_side: Color,
    repetition_threshold: u32,
}

impl Game {
    pub fn new() -> Self {
        Game::from_fen(START_FEN).expect("start position is valid")
    }

    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let mut board = Board::new_empty();
        let clocks = board.set_fen(fen)?;
        Ok(Game {
            base_side: board.side_to_move,
            base_fen: fen.trim().to_string(),
            board,
            moves: Vec::new(),
            cursor: 0,
            base_clocks: clocks,
            repetition_threshold: 3,
        })
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The applied part of the record.
    #[inline]
    pub fn applied(&self) -> &[Move] {
        &self.moves[..self.cursor]
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn base_fen(&self) -> &str {
        &self.base_fen
    }

    pub fn set_repetition_threshold(&mut self, threshold: u32) {
        self.repetition_threshold = threshold.max(2);
    }

    /// Apply a move and advance the cursor, discarding any undone tail.
    /// The caller is responsible for only passing legal moves.
    pub fn make(&mut self, mut mv: Move) {
        self.moves.truncate(self.cursor);
        make_move(&mut self.board, &mut mv);
        self.moves.push(mv);
        self.cursor += 1;
    }

    /// Retreat the cursor one ply, keeping the tail for redo.
    pub fn undo(&mut self) -> Option<Move> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        let mv = self.moves[self.cursor];
        undo_move(&mut self.board, mv);
        Some(mv)
    }

    /// Re-apply the next undone move, if any.
    pub fn redo(&mut self) -> Option<Move> {
        if self.cursor == self.moves.len() {
            return None;
        }
        let mut mv = self.moves[self.cursor];
        make_move(&mut self.board, &mut mv);
        self.moves[self.cursor] = mv;
        self.cursor += 1;
        Some(mv)
    }

    /// Plies since the most recent pawn move, capture or castle; seeded by
    /// the FEN halfmove clock when no irreversible move is on the record.
    pub fn halfmove_clock(&self) -> u32 {
        let mut clock = 0u32;
        for mv in self.applied().iter().rev() {
            if mv.is_irreversible() {
                return clock;
            }
            clock += 1;
        }
        self.base_clocks.halfmove + clock
    }

    pub fn fullmove_number(&self) -> u32 {
        let plies = self.cursor as u32;
        match self.base_side {
            Color::White => self.base_clocks.fullmove + plies / 2,
            Color::Black => self.base_clocks.fullmove + plies.div_ceil(2),
        }
    }

    pub fn to_fen(&self) -> String {
        self.board
            .to_fen_with(self.halfmove_clock(), self.fullmove_number())
    }

    /// How many times the current position has occurred in the applied
    /// record, the current occurrence included. Walks backward with real
    /// undos (pairs of plies, stopping at the last irreversible move) and
    /// replays the moves afterwards, so only positions actually on the
    /// record count.
    pub fn repetition_count(&mut self) -> u32 {
        let current = self.board.zobrist;
        let mut count = 1u32;
        let mut undone = 0usize;

        while undone < self.cursor {
            let mv = self.moves[self.cursor - 1 - undone];
            if mv.is_irreversible() {
                break;
            }
            undo_move(&mut self.board, mv);
            undone += 1;
            if undone % 2 == 0 && self.board.zobrist == current {
                count += 1;
            }
        }

        for i in (self.cursor - undone)..self.cursor {
            let mut mv = self.moves[i];
            make_move(&mut self.board, &mut mv);
            self.moves[i] = mv;
        }

        count
    }

    /// Hashes of the ancestor positions reachable by undoing back to the
    /// last irreversible move, most recent first. The search seeds its
    /// repetition detection with these.
    pub fn history_hashes(&mut self) -> Vec<u64> {
        let mut hashes = Vec::new();
        let mut undone = 0usize;

        while undone < self.cursor {
            let mv = self.moves[self.cursor - 1 - undone];
            if mv.is_irreversible() {
                break;
            }
            undo_move(&mut self.board, mv);
            undone += 1;
            hashes.push(self.board.zobrist);
        }

        for i in (self.cursor - undone)..self.cursor {
            let mut mv = self.moves[i];
            make_move(&mut self.board, &mut mv);
            self.moves[i] = mv;
        }

        hashes
    }

    pub fn is_threefold(&mut self) -> bool {
        self.repetition_count() >= self.repetition_threshold
    }

    pub fn is_fifty_move(&self) -> bool {
        self.halfmove_clock() >= 100
    }

    /// Game-over detection for the current position.
    pub fn status(&mut self, tables: &AttackTables) -> GameStatus {
        let mut legal = MoveList::new();
        let mut scratch = MoveList::new();
        generate_legal(&mut self.board, tables, &mut legal, &mut scratch);
        if legal.is_empty() {
            return if in_check(&self.board, self.board.side_to_move, tables) {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            };
        }

        if insufficient_material(&self.board) {
            return GameStatus::DrawInsufficient;
        }
        if self.is_threefold() {
            return GameStatus::DrawThreefold;
        }
        if self.is_fifty_move() {
            return GameStatus::DrawFiftyMove;
        }
        GameStatus::InPlay
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

/// Dead-position test. Recognized never-mate material: bare kings, a lone
/// minor piece, and bishop versus bishop on the same color complex.
pub fn insufficient_material(board: &Board) -> bool {
    for color in [Color::White, Color::Black] {
        if board.pieces(color, PieceKind::Pawn) != 0
            || board.pieces(color, PieceKind::Rook) != 0
            || board.pieces(color, PieceKind::Queen) != 0
        {
            return false;
        }
    }

    let minors = |color: Color| {
        board.pieces(color, PieceKind::Knight).count_ones()
            + board.pieces(color, PieceKind::Bishop).count_ones()
    };
    let white_minors = minors(Color::White);
    let black_minors = minors(Color::Black);
    if white_minors > 1 || black_minors > 1 {
        return false;
    }
    if white_minors + black_minors <= 1 {
        return true;
    }

    // one minor each: drawn only for same-complex bishops
    let wb = board.pieces(Color::White, PieceKind::Bishop);
    let bb = board.pieces(Color::Black, PieceKind::Bishop);
    if wb != 0 && bb != 0 {
        let complex = |bb: u64| {
            let sq = Square::from_index(bb.trailing_zeros() as u8);
            (sq.rank() + sq.file()) & 1
        };
        return complex(wb) == complex(bb);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn insufficient_material_cases() {
        let yes = [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",       // K vs K
            "4k3/8/8/8/8/8/8/3NK3 w - - 0 1",      // K+N vs K
            "4k3/8/8/8/8/8/8/3BK3 w - - 0 1",      // K+B vs K
            "3bk3/8/8/8/8/8/8/2B1K3 w - - 0 1",    // same-complex bishops
        ];
        for fen in yes {
            assert!(insufficient_material(&Board::from_str(fen).unwrap()), "{fen}");
        }
        let no = [
            "4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1",    // two bishops
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",     // a pawn
            "2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1",   // opposite-complex bishops
            "3nk3/8/8/8/8/8/8/3NK3 w - - 0 1",     // knight vs knight
            "4k3/8/8/8/8/8/8/3RK3 w - - 0 1",      // a rook
        ];
        for fen in no {
            assert!(!insufficient_material(&Board::from_str(fen).unwrap()), "{fen}");
        }
    }
}
