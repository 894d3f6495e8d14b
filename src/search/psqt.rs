//! Piece-square tables, one set per game phase. Entries are deltas in
//! centipawns from white's point of view with a1 first; black positions
//! index through the vertical flip. Base material values are folded in when
//! the combined tables are built, so evaluation is one lookup per piece.

use once_cell::sync::OnceCell;

use crate::board::PieceKind;

/// Phase index into the table set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Phase {
    Opening = 0,
    Middlegame = 1,
    Endgame = 2,
}

/// Base piece values per phase: pawn, knight, bishop, rook, queen, king.
const BASE: [[i32; 6]; 3] = [
    [100, 300, 310, 500, 900, 0],
    [100, 305, 315, 500, 900, 0],
    [120, 290, 310, 520, 910, 0],
];

#[rustfmt::skip]
const PAWN_OPENING: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      2,   4,   4, -12, -12,   4,   4,   2,
      2,  -2,  -4,   0,   0,  -4,  -2,   2,
      0,   0,   0,  16,  16,   0,   0,   0,
      4,   4,   8,  20,  20,   8,   4,   4,
      8,   8,  12,  24,  24,  12,   8,   8,
     20,  20,  20,  28,  28,  20,  20,  20,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const PAWN_MIDDLE: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      2,   2,   2,  -8,  -8,   2,   2,   2,
      2,  -2,  -2,   4,   4,  -2,  -2,   2,
      0,   0,   4,  14,  14,   4,   0,   0,
      6,   6,  10,  18,  18,  10,   6,   6,
     14,  14,  18,  24,  24,  18,  14,  14,
     30,  30,  32,  36,  36,  32,  30,  30,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const PAWN_END: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,
      4,   4,   4,   4,   4,   4,   4,   4,
     10,  10,  10,  10,  10,  10,  10,  10,
     20,  20,  20,  20,  20,  20,  20,  20,
     36,  36,  36,  36,  36,  36,  36,  36,
     60,  60,  60,  60,  60,  60,  60,  60,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_OPENING: [i32; 64] = [
    -40, -24, -16, -12, -12, -16, -24, -40,
    -24,  -8,   0,   4,   4,   0,  -8, -24,
    -16,   4,   8,  12,  12,   8,   4, -16,
    -12,   4,  12,  16,  16,  12,   4, -12,
    -12,   4,  12,  16,  16,  12,   4, -12,
    -16,   4,   8,  12,  12,   8,   4, -16,
    -24,  -8,   0,   4,   4,   0,  -8, -24,
    -40, -24, -16, -12, -12, -16, -24, -40,
];

const KNIGHT_MIDDLE: [i32; 64] = KNIGHT_OPENING;

#[rustfmt::skip]
const KNIGHT_END: [i32; 64] = [
    -32, -20, -12,  -8,  -8, -12, -20, -32,
    -20,  -8,   0,   4,   4,   0,  -8, -20,
    -12,   0,   8,  10,  10,   8,   0, -12,
     -8,   4,  10,  14,  14,  10,   4,  -8,
     -8,   4,  10,  14,  14,  10,   4,  -8,
    -12,   0,   8,  10,  10,   8,   0, -12,
    -20,  -8,   0,   4,   4,   0,  -8, -20,
    -32, -20, -12,  -8,  -8, -12, -20, -32,
];

#[rustfmt::skip]
const BISHOP_OPENING: [i32; 64] = [
    -12,  -8,  -8,  -4,  -4,  -8,  -8, -12,
     -4,   8,   4,   4,   4,   4,   8,  -4,
     -4,   6,   6,   8,   8,   6,   6,  -4,
     -4,   0,   8,  10,  10,   8,   0,  -4,
     -4,   4,   8,  10,  10,   8,   4,  -4,
     -4,   0,   4,   8,   8,   4,   0,  -4,
     -4,   0,   0,   0,   0,   0,   0,  -4,
    -12,  -8,  -8,  -4,  -4,  -8,  -8, -12,
];

const BISHOP_MIDDLE: [i32; 64] = BISHOP_OPENING;

#[rustfmt::skip]
const BISHOP_END: [i32; 64] = [
     -8,  -4,  -4,  -2,  -2,  -4,  -4,  -8,
     -4,   2,   2,   4,   4,   2,   2,  -4,
     -4,   2,   6,   8,   8,   6,   2,  -4,
     -2,   4,   8,  10,  10,   8,   4,  -2,
     -2,   4,   8,  10,  10,   8,   4,  -2,
     -4,   2,   6,   8,   8,   6,   2,  -4,
     -4,   2,   2,   4,   4,   2,   2,  -4,
     -8,  -4,  -4,  -2,  -2,  -4,  -4,  -8,
];

#[rustfmt::skip]
const ROOK_OPENING: [i32; 64] = [
      0,   0,   4,   8,   8,   4,   0,   0,
     -4,   0,   0,   0,   0,   0,   0,  -4,
     -4,   0,   0,   0,   0,   0,   0,  -4,
     -4,   0,   0,   0,   0,   0,   0,  -4,
     -4,   0,   0,   0,   0,   0,   0,  -4,
     -4,   0,   0,   0,   0,   0,   0,  -4,
      8,  12,  12,  12,  12,  12,  12,   8,
      4,   4,   4,   4,   4,   4,   4,   4,
];

const ROOK_MIDDLE: [i32; 64] = ROOK_OPENING;

#[rustfmt::skip]
const ROOK_END: [i32; 64] = [
      0,   0,   2,   4,   4,   2,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,
      6,   8,   8,   8,   8,   8,   8,   6,
      2,   2,   2,   2,   2,   2,   2,   2,
];

#[rustfmt::skip]
const QUEEN_OPENING: [i32; 64] = [
    -12,  -8,  -8,  -4,  -4,  -8,  -8, -12,
     -8,   0,   4,   0,   0,   0,   0,  -8,
     -8,   4,   4,   4,   4,   4,   0,  -8,
     -4,   0,   4,   4,   4,   4,   0,  -4,
      0,   0,   4,   4,   4,   4,   0,  -4,
     -8,   4,   4,   4,   4,   4,   0,  -8,
     -8,   0,   4,   0,   0,   0,   0,  -8,
    -12,  -8,  -8,  -4,  -4,  -8,  -8, -12,
];

const QUEEN_MIDDLE: [i32; 64] = QUEEN_OPENING;

#[rustfmt::skip]
const QUEEN_END: [i32; 64] = [
     -8,  -6,  -4,  -2,  -2,  -4,  -6,  -8,
     -6,  -2,   0,   2,   2,   0,  -2,  -6,
     -4,   0,   4,   6,   6,   4,   0,  -4,
     -2,   2,   6,   8,   8,   6,   2,  -2,
     -2,   2,   6,   8,   8,   6,   2,  -2,
     -4,   0,   4,   6,   6,   4,   0,  -4,
     -6,  -2,   0,   2,   2,   0,  -2,  -6,
     -8,  -6,  -4,  -2,  -2,  -4,  -6,  -8,
];

#[rustfmt::skip]
const KING_OPENING: [i32; 64] = [
     16,  24,  12,   0,   0,  12,  24,  16,
     12,  12,   0, -12, -12,   0,  12,  12,
    -12, -16, -20, -24, -24, -20, -16, -12,
    -20, -24, -28, -36, -36, -28, -24, -20,
    -28, -32, -36, -44, -44, -36, -32, -28,
    -36, -40, -44, -48, -48, -44, -40, -36,
    -40, -44, -48, -52, -52, -48, -44, -40,
    -48, -48, -52, -56, -56, -52, -48, -48,
];

#[rustfmt::skip]
const KING_MIDDLE: [i32; 64] = [
     12,  16,   8,  -4,  -4,   8,  16,  12,
      8,   8,  -4, -12, -12,  -4,   8,   8,
    -12, -16, -20, -24, -24, -20, -16, -12,
    -20, -24, -28, -32, -32, -28, -24, -20,
    -24, -28, -32, -36, -36, -32, -28, -24,
    -28, -32, -36, -40, -40, -36, -32, -28,
    -32, -36, -40, -44, -44, -40, -36, -32,
    -40, -40, -44, -48, -48, -44, -40, -40,
];

#[rustfmt::skip]
const KING_END: [i32; 64] = [
    -36, -24, -16, -12, -12, -16, -24, -36,
    -24,  -8,   0,   4,   4,   0,  -8, -24,
    -16,   0,  12,  16,  16,  12,   0, -16,
    -12,   4,  16,  24,  24,  16,   4, -12,
    -12,   4,  16,  24,  24,  16,   4, -12,
    -16,   0,  12,  16,  16,  12,   0, -16,
    -24,  -8,   0,   4,   4,   0,  -8, -24,
    -36, -24, -16, -12, -12, -16, -24, -36,
];

const DELTAS: [[&[i32; 64]; 6]; 3] = [
    [
        &PAWN_OPENING,
        &KNIGHT_OPENING,
        &BISHOP_OPENING,
        &ROOK_OPENING,
        &QUEEN_OPENING,
        &KING_OPENING,
    ],
    [
        &PAWN_MIDDLE,
        &KNIGHT_MIDDLE,
        &BISHOP_MIDDLE,
        &ROOK_MIDDLE,
        &QUEEN_MIDDLE,
        &KING_MIDDLE,
    ],
    [
        &PAWN_END,
        &KNIGHT_END,
        &BISHOP_END,
        &ROOK_END,
        &QUEEN_END,
        &KING_END,
    ],
];

/// Combined base + delta tables, `[phase][kind][square]`. The
/// `PieceKind::None` slot stays zero so a packed kind can index directly.
pub struct PsqtSet {
    tables: [[[i32; 64]; 7]; 3],
}

impl PsqtSet {
    fn build() -> Self {
        let mut set = PsqtSet {
            tables: [[[0; 64]; 7]; 3],
        };
        for phase in 0..3 {
            for kind in 0..6 {
                for sq in 0..64 {
                    set.tables[phase][kind + 1][sq] = BASE[phase][kind] + DELTAS[phase][kind][sq];
                }
            }
        }
        set
    }

    #[inline(always)]
    pub fn value(&self, phase: Phase, kind: PieceKind, sq_index: usize) -> i32 {
        self.tables[phase as usize][kind as usize][sq_index]
    }
}

pub fn psqt() -> &'static PsqtSet {
    static SET: OnceCell<PsqtSet> = OnceCell::new();
    SET.get_or_init(PsqtSet::build)
}
