//! Staged move picker: an ordered list of buckets, each producing its next
//! candidate lazily. The search pulls moves one at a time; when an early
//! move causes a beta cutoff, later buckets are never generated, let alone
//! scored.
//!
//! Bucket order: table move, noisy moves (scored by the negated fast
//! evaluation after the capture), killers, then quiets by history score.
//! Only legal moves are yielded.

use arrayvec::ArrayVec;

use crate::bitboard::BitboardExt;
use crate::board::{Board, Color, PieceKind};
use crate::moves::attacks::AttackTables;
use crate::moves::execute::{is_legal_move, make_move, undo_move};
use crate::moves::movegen::{GenMode, generate_pseudo_legal};
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::eval::presort_eval;
use crate::square::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    TtMove,
    GenerateNoisy,
    Noisy,
    Killer1,
    Killer2,
    GenerateQuiets,
    Quiets,
    Done,
}

pub struct MovePicker {
    stage: Stage,
    tt_digest: u16,
    killers: [Option<Move>; 2],
    captures_only: bool,

    noisy: ArrayVec<Move, 128>,
    noisy_scores: ArrayVec<i32, 128>,
    noisy_idx: usize,
    quiets: ArrayVec<Move, 256>,
    quiet_scores: ArrayVec<i32, 256>,
    quiet_idx: usize,
}

impl MovePicker {
    /// `tt_digest` is the table move for this position (0 when absent);
    /// `captures_only` restricts the picker to the noisy bucket for
    /// quiescence.
    pub fn new(tt_digest: u16, killers: [Option<Move>; 2], captures_only: bool) -> Self {
        MovePicker {
            stage: Stage::TtMove,
            tt_digest,
            killers,
            captures_only,
            noisy: ArrayVec::new(),
            noisy_scores: ArrayVec::new(),
            noisy_idx: 0,
            quiets: ArrayVec::new(),
            quiet_scores: ArrayVec::new(),
            quiet_idx: 0,
        }
    }

    #[inline]
    fn is_tt_move(&self, mv: Move) -> bool {
        self.tt_digest != 0 && mv.digest() == self.tt_digest
    }

    #[inline]
    fn is_killer(&self, mv: Move) -> bool {
        self.killers
            .iter()
            .any(|k| k.is_some_and(|k| k.same_move(mv)))
    }

    fn generate_noisy(&mut self, board: &mut Board, tables: &AttackTables, ctx: &SearchContext) {
        let mut generated: ArrayVec<Move, 128> = ArrayVec::new();
        generate_pseudo_legal(board, tables, GenMode::Noisy, &mut generated);

        for mv in generated {
            if self.is_tt_move(mv) {
                continue;
            }
            // order by how the position scores for us once the capture is
            // on the board
            let mut applied = mv;
            make_move(board, &mut applied);
            let score = -presort_eval(board, tables, &ctx.weights, ctx.jitter_seed, Some(applied));
            undo_move(board, applied);

            self.noisy.push(mv);
            self.noisy_scores.push(score);
        }
    }

    fn generate_quiets(&mut self, board: &Board, tables: &AttackTables, ctx: &SearchContext) {
        generate_pseudo_legal(board, tables, GenMode::Quiet, &mut self.quiets);
        for mv in &self.quiets {
            self.quiet_scores.push(ctx.history_score(*mv));
        }
    }

    /// Selection-sort step: swap the best remaining entry to the cursor.
    fn pick_best(
        moves: &mut ArrayVec<Move, 128>,
        scores: &mut ArrayVec<i32, 128>,
        idx: &mut usize,
    ) -> Option<Move> {
        if *idx >= moves.len() {
            return None;
        }
        let mut best = *idx;
        for i in (*idx + 1)..moves.len() {
            if scores[i] > scores[best] {
                best = i;
            }
        }
        moves.swap(*idx, best);
        scores.swap(*idx, best);
        let mv = moves[*idx];
        *idx += 1;
        Some(mv)
    }

    fn pick_best_quiet(&mut self) -> Option<Move> {
        if self.quiet_idx >= self.quiets.len() {
            return None;
        }
        let mut best = self.quiet_idx;
        for i in (self.quiet_idx + 1)..self.quiets.len() {
            if self.quiet_scores[i] > self.quiet_scores[best] {
                best = i;
            }
        }
        self.quiets.swap(self.quiet_idx, best);
        self.quiet_scores.swap(self.quiet_idx, best);
        let mv = self.quiets[self.quiet_idx];
        self.quiet_idx += 1;
        Some(mv)
    }

    /// The next legal move in bucket order, or `None` when exhausted.
    pub fn next(
        &mut self,
        board: &mut Board,
        tables: &AttackTables,
        ctx: &SearchContext,
    ) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = Stage::GenerateNoisy;
                    if let Some(mv) = reconstruct(board, tables, self.tt_digest)
                        && (!self.captures_only || mv.is_capture() || mv.is_promotion())
                        && is_legal_move(board, tables, mv)
                    {
                        return Some(mv);
                    }
                }

                Stage::GenerateNoisy => {
                    self.generate_noisy(board, tables, ctx);
                    self.stage = Stage::Noisy;
                }

                Stage::Noisy => {
                    while let Some(mv) = Self::pick_best(
                        &mut self.noisy,
                        &mut self.noisy_scores,
                        &mut self.noisy_idx,
                    ) {
                        if is_legal_move(board, tables, mv) {
                            return Some(mv);
                        }
                    }
                    self.stage = if self.captures_only {
                        Stage::Done
                    } else {
                        Stage::Killer1
                    };
                }

                Stage::Killer1 | Stage::Killer2 => {
                    let slot = if self.stage == Stage::Killer1 { 0 } else { 1 };
                    self.stage = if slot == 0 {
                        Stage::Killer2
                    } else {
                        Stage::GenerateQuiets
                    };
                    if let Some(killer) = self.killers[slot]
                        && !self.is_tt_move(killer)
                        && (slot == 0
                            || self.killers[0].is_none_or(|k| !k.same_move(killer)))
                        && let Some(mv) = reconstruct(board, tables, killer.digest())
                        && !mv.is_capture()
                        && !mv.is_promotion()
                        && is_legal_move(board, tables, mv)
                    {
                        return Some(mv);
                    }
                }

                Stage::GenerateQuiets => {
                    self.generate_quiets(board, tables, ctx);
                    self.stage = Stage::Quiets;
                }

                Stage::Quiets => {
                    while let Some(mv) = self.pick_best_quiet() {
                        if self.is_tt_move(mv) || self.is_killer(mv) {
                            continue;
                        }
                        if is_legal_move(board, tables, mv) {
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::Done;
                }

                Stage::Done => return None,
            }
        }
    }
}

/// Rebuild a full move from a 15-bit digest against the current position,
/// verifying it is something the generator could have produced. Returns
/// `None` for moves that are stale or corrupted relative to this board.
pub fn reconstruct(board: &Board, tables: &AttackTables, digest: u16) -> Option<Move> {
    if digest == 0 {
        return None;
    }
    let from = Square::from_index((digest & 0x3F) as u8);
    let to = Square::from_index(((digest >> 6) & 0x3F) as u8);
    let promo = PieceKind::from_u8(((digest >> 12) & 7) as u8);

    let piece = board.piece_on(from);
    if piece.is_none() || piece.color() != board.side_to_move {
        return None;
    }
    let color = piece.color();
    if board.occupancy(color).has(to) {
        return None;
    }
    if board.pieces(color.opposite(), PieceKind::King).has(to) {
        return None;
    }
    if promo != PieceKind::None && piece.kind() != PieceKind::Pawn {
        return None;
    }

    let occupied = board.occupied();
    let victim = board.kind_on(to);

    match piece.kind() {
        PieceKind::Pawn => {
            let on_promo_rank = to.rank() == color.promotion_rank();
            if on_promo_rank != (promo != PieceKind::None) {
                return None;
            }
            let delta = to.index() as i8 - from.index() as i8;
            let forward = color.forward();

            if delta == forward {
                if victim != PieceKind::None {
                    return None;
                }
            } else if delta == 2 * forward {
                let start_rank = match color {
                    Color::White => 1,
                    Color::Black => 6,
                };
                if from.rank() != start_rank || victim != PieceKind::None {
                    return None;
                }
                let mid = Square::from_index((from.index() as i8 + forward) as u8);
                if !board.empty_squares().has(mid) {
                    return None;
                }
            } else if tables.pawn_attacks(color, from).has(to) {
                if victim == PieceKind::None && board.en_passant != Some(to) {
                    return None;
                }
            } else {
                return None;
            }
        }
        PieceKind::Knight => {
            if !tables.knight(from).has(to) {
                return None;
            }
        }
        PieceKind::Bishop => {
            if !tables.bishop_attacks(from, occupied).has(to) {
                return None;
            }
        }
        PieceKind::Rook => {
            if !tables.rook_attacks(from, occupied).has(to) {
                return None;
            }
        }
        PieceKind::Queen => {
            if !tables.queen_attacks(from, occupied).has(to) {
                return None;
            }
        }
        PieceKind::King => {
            let castle = (from.file() as i8 - to.file() as i8).abs() == 2;
            if castle {
                if !castle_reconstructable(board, tables, color, to) {
                    return None;
                }
            } else if !tables.king(from).has(to) {
                return None;
            }
        }
        PieceKind::None => unreachable!("piece.is_none() already filtered out empty squares"),
    }

    let mut mv = if promo != PieceKind::None {
        Move::new_promotion(from, to, piece, promo)
    } else {
        Move::new(from, to, piece)
    };
    if victim != PieceKind::None {
        mv.set_captured(victim);
    } else if piece.kind() == PieceKind::Pawn
        && board.en_passant == Some(to)
        && from.file() != to.file()
    {
        mv.set_captured(PieceKind::Pawn);
    }
    Some(mv)
}

fn castle_reconstructable(
    board: &Board,
    tables: &AttackTables,
    color: Color,
    king_to: Square,
) -> bool {
    use crate::moves::square_control::is_square_attacked;

    let rank = color.home_rank();
    if king_to.rank() != rank {
        return false;
    }
    let kingside = king_to.file() == 6;
    if !kingside && king_to.file() != 2 {
        return false;
    }
    let held = if kingside {
        board.has_kingside_castle(color)
    } else {
        board.has_queenside_castle(color)
    };
    if !held {
        return false;
    }
    let (empty_files, pass_file): (&[u8], u8) = if kingside {
        (&[5, 6], 5)
    } else {
        (&[1, 2, 3], 3)
    };
    for &f in empty_files {
        if !board.empty_squares().has(Square::new(rank, f)) {
            return false;
        }
    }
    let opponent = color.opposite();
    !is_square_attacked(board, Square::new(rank, 4), opponent, tables)
        && !is_square_attacked(board, Square::new(rank, pass_file), opponent, tables)
}
