//! Static evaluation: tapered material and piece-square tables, mobility,
//! pawn structure, tempo, and a bounded deterministic jitter. Scores are in
//! centipawns from the side-to-move's perspective.
//!
//! The fast pre-sort variant drops the slow terms and adds an attack/defend
//! heuristic on the previous move; it is only ever used to order candidate
//! moves, never as a final answer.

use crate::bitboard::{BitIter, BitboardExt};
use crate::board::{
    Board, Color, PHASE_ENDGAME, PHASE_MAX, PHASE_MID, PHASE_OPENING, PieceKind,
};
use crate::moves::attacks::{AttackTables, Direction};
use crate::moves::movegen::count_pseudo_legal;
use crate::moves::square_control::lowest_attacker;
use crate::moves::types::Move;
use crate::search::psqt::{Phase, psqt};

/// Value of having the move, scaled down as the game simplifies.
const TEMPO: i32 = 33;
const PASSED_PAWN_BONUS: i32 = 5;

/// Term coefficients over a common scale; a weight of `EVAL_SCALE` means
/// the term counts at face value. The jitter range is in centipawns and
/// applies unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalWeights {
    pub material: i32,
    pub mobility: i32,
    pub king_safety: i32,
    pub pawn_structure: i32,
    pub tempo: i32,
    /// Jitter half-range in centipawns; 0 disables the term.
    pub random: i32,
}

pub const EVAL_SCALE: i32 = 10;

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            material: EVAL_SCALE,
            mobility: EVAL_SCALE,
            king_safety: EVAL_SCALE,
            pawn_structure: EVAL_SCALE,
            tempo: EVAL_SCALE,
            random: 0,
        }
    }
}

/// Linear interpolation of a value known at two phase boundaries.
#[inline]
fn interpolate(phase: i32, lo: i32, hi: i32, value_at_hi: i32, value_at_lo: i32) -> i32 {
    debug_assert!(lo < hi && (lo..=hi).contains(&phase));
    (value_at_hi * (phase - lo) + value_at_lo * (hi - phase)) / (hi - lo)
}

/// Per-color piece-square sum for one phase table.
fn psqt_sum(board: &Board, phase: Phase, color: Color) -> i32 {
    let set = psqt();
    let mut sum = 0;
    for kind in [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ] {
        for sq in BitIter(board.pieces(color, kind)) {
            let idx = match color {
                Color::White => sq.index(),
                Color::Black => sq.flip().index(),
            };
            sum += set.value(phase, kind, idx as usize);
        }
    }
    sum
}

/// Material-plus-square evaluation from the side-to-move's perspective,
/// interpolated over the game phase. Pure table lookups at the phase
/// extremes; the two interior bands blend adjacent tables linearly.
pub fn material_psqt(board: &Board) -> i32 {
    let us = board.side_to_move;
    let them = us.opposite();
    let phase = board.phase.min(PHASE_MAX);

    let diff = |p: Phase| psqt_sum(board, p, us) - psqt_sum(board, p, them);

    if phase >= PHASE_OPENING {
        diff(Phase::Opening)
    } else if phase <= PHASE_ENDGAME {
        diff(Phase::Endgame)
    } else if phase >= PHASE_MID {
        interpolate(
            phase,
            PHASE_MID,
            PHASE_OPENING,
            diff(Phase::Opening),
            diff(Phase::Middlegame),
        )
    } else {
        interpolate(
            phase,
            PHASE_ENDGAME,
            PHASE_MID,
            diff(Phase::Middlegame),
            diff(Phase::Endgame),
        )
    }
}

/// Pawn-structure terms for one color: doubled and isolated pawns count
/// against, passed pawns count for.
fn pawn_structure(board: &Board, tables: &AttackTables, color: Color) -> i32 {
    let own = board.pieces(color, PieceKind::Pawn);
    let theirs = board.pieces(color.opposite(), PieceKind::Pawn);
    let mut score = 0;

    for file in 0..8u8 {
        let file_bb = u64::file_of(file);
        let on_file = (own & file_bb).count_ones() as i32;
        if on_file > 1 {
            score -= on_file - 1;
        }
        if on_file > 0 {
            let west = if file > 0 { u64::file_of(file - 1) } else { 0 };
            let east = if file < 7 { u64::file_of(file + 1) } else { 0 };
            if own & (west | east) == 0 {
                score -= 1;
            }
        }
    }

    let ahead = match color {
        Color::White => Direction::North,
        Color::Black => Direction::South,
    };
    for sq in BitIter(own) {
        if tables.ray(sq, ahead) & own == 0 && tables.passed_alley(color, sq) & theirs == 0 {
            score += PASSED_PAWN_BONUS;
        }
    }

    score
}

/// King safety. Stub kept as an explicit term so the weight plumbing and
/// the evaluation shape stay stable when a real implementation lands.
fn king_safety(_board: &Board, _color: Color) -> i32 {
    0
}

fn tempo(board: &Board) -> i32 {
    if board.phase >= PHASE_OPENING {
        TEMPO
    } else if board.phase > PHASE_MID {
        TEMPO / 2
    } else {
        0
    }
}

/// Bounded pseudo-random increment, stable for a given position and search:
/// reproducible within a search, varied across searches.
#[inline]
fn jitter(board: &Board, seed: u64, range: i32) -> i32 {
    if range == 0 {
        return 0;
    }
    let mixed = board.zobrist ^ seed;
    (mixed % (2 * range as u64 + 1)) as i32 - range
}

/// Full static evaluation from the side-to-move's perspective.
pub fn static_eval(
    board: &Board,
    tables: &AttackTables,
    weights: &EvalWeights,
    jitter_seed: u64,
) -> i32 {
    let us = board.side_to_move;
    let them = us.opposite();

    let material = material_psqt(board);
    let mobility = count_pseudo_legal(board, tables, us) as i32
        - count_pseudo_legal(board, tables, them) as i32;
    let safety = king_safety(board, us) - king_safety(board, them);
    let pawns = pawn_structure(board, tables, us) - pawn_structure(board, tables, them);

    let weighted = weights.material * material
        + weights.mobility * mobility
        + weights.king_safety * safety
        + weights.pawn_structure * pawns
        + weights.tempo * tempo(board);

    (weighted + EVAL_SCALE / 2) / EVAL_SCALE + jitter(board, jitter_seed, weights.random)
}

/// If the previous move landed on a square we attack with something cheaper
/// than the piece that moved there, or on an attacked and undefended square,
/// credit us with that piece. Crude, but it steers move ordering toward
/// refutations of hung pieces.
fn attack_defend(board: &Board, tables: &AttackTables, prev: Move) -> i32 {
    let sq = prev.to();
    let landed = board.kind_on(sq);
    if landed == PieceKind::None {
        return 0;
    }
    let us = board.side_to_move;
    let attacker = lowest_attacker(board, sq, us, tables);
    if attacker == PieceKind::None {
        return 0;
    }
    if attacker.value() < landed.value() {
        return landed.value();
    }
    if lowest_attacker(board, sq, us.opposite(), tables) == PieceKind::None {
        return landed.value();
    }
    0
}

/// Cut-down evaluation for ordering candidate moves before recursion:
/// material/PSQT plus the attack-defend heuristic. Never used as the final
/// score of a position.
pub fn presort_eval(
    board: &Board,
    tables: &AttackTables,
    weights: &EvalWeights,
    jitter_seed: u64,
    prev: Option<Move>,
) -> i32 {
    let mut material = material_psqt(board);
    if let Some(mv) = prev {
        material += attack_defend(board, tables, mv);
    }

    let weighted = weights.material * material + weights.tempo * tempo(board);
    (weighted + EVAL_SCALE / 2) / EVAL_SCALE + jitter(board, jitter_seed, weights.random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::attacks::attack_tables;
    use std::str::FromStr;

    #[test]
    fn startpos_is_near_balanced() {
        let t = attack_tables();
        let b = Board::new();
        let w = EvalWeights::default();
        let score = static_eval(&b, t, &w, 0);
        // side to move keeps the tempo bonus
        assert!(score.abs() <= 2 * TEMPO, "got {score}");
    }

    #[test]
    fn material_advantage_shows_up() {
        let t = attack_tables();
        let w = EvalWeights::default();
        // white is a queen up
        let b = Board::from_str("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert!(static_eval(&b, t, &w, 0) > 700);
        // same position from black's perspective
        let b = Board::from_str("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
        assert!(static_eval(&b, t, &w, 0) < -700);
    }

    #[test]
    fn jitter_is_bounded_and_deterministic() {
        let b = Board::new();
        for seed in [1u64, 99, 0xABCDEF] {
            let j = jitter(&b, seed, 8);
            assert!((-8..=8).contains(&j));
            assert_eq!(j, jitter(&b, seed, 8));
        }
        assert_eq!(jitter(&b, 12345, 0), 0);
    }

    #[test]
    fn passed_pawn_recognized() {
        let t = attack_tables();
        // white pawn on e5 faces no black pawns at all: passed
        let b = Board::from_str("4k3/8/8/4P3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(pawn_structure(&b, t, Color::White), PASSED_PAWN_BONUS - 1);
        // blocked alley: black pawn on d6 covers e5's alley
        let b = Board::from_str("4k3/8/3p4/4P3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(pawn_structure(&b, t, Color::White), -1);
    }

    #[test]
    fn doubled_and_isolated_pawns_penalized() {
        let t = attack_tables();
        // doubled isolated e-pawns, no opposition ahead: both passed? the
        // front one is; the rear one is blocked by its own pawn
        let b = Board::from_str("4k3/8/8/4P3/4P3/8/8/4K3 w - - 0 1").unwrap();
        // doubled: -1, isolated: -1, one passed: +5
        assert_eq!(pawn_structure(&b, t, Color::White), 3);
    }

    #[test]
    fn tempo_fades_out_of_the_opening() {
        let opening = Board::new();
        assert_eq!(tempo(&opening), TEMPO);
        let endgame = Board::from_str("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert_eq!(tempo(&endgame), 0);
    }
}
