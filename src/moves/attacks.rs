//! Precomputed attack tables: king and knight masks, sliding rays for the
//! eight compass directions, pawn attack masks and passed-pawn alleys.
//! Built once at process start and handed around by reference.

use once_cell::sync::OnceCell;

use crate::bitboard::BitboardExt;
use crate::board::Color;
use crate::square::Square;

/// Compass directions. The four reverse directions occupy indices 0-3 and
/// the four forward directions 4-7, so "scan from the low end or the high
/// end of the ray" is a single comparison on the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Direction {
    SouthWest = 0,
    South = 1,
    SouthEast = 2,
    West = 3,
    East = 4,
    NorthWest = 5,
    North = 6,
    NorthEast = 7,
}

pub const DIRECTIONS: [Direction; 8] = [
    Direction::SouthWest,
    Direction::South,
    Direction::SouthEast,
    Direction::West,
    Direction::East,
    Direction::NorthWest,
    Direction::North,
    Direction::NorthEast,
];

pub const ORTHOGONALS: [Direction; 4] = [
    Direction::South,
    Direction::West,
    Direction::East,
    Direction::North,
];

pub const DIAGONALS: [Direction; 4] = [
    Direction::SouthWest,
    Direction::SouthEast,
    Direction::NorthWest,
    Direction::NorthEast,
];

impl Direction {
    #[inline(always)]
    pub const fn is_forward(self) -> bool {
        self as usize >= Direction::East as usize
    }

    pub const fn delta(self) -> (i8, i8) {
        match self {
            Direction::SouthWest => (-1, -1),
            Direction::South => (0, -1),
            Direction::SouthEast => (1, -1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
            Direction::NorthWest => (-1, 1),
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
        }
    }
}

pub struct AttackTables {
    king: [u64; 64],
    knight: [u64; 64],
    /// Squares attacked along each direction from each square on an empty
    /// board, excluding the origin.
    rays: [[u64; 8]; 64],
    /// Squares a pawn of the given color attacks from each square.
    pawn: [[u64; 64]; 2],
    /// Passed-pawn alley: the pawn's file plus both adjacent files, from the
    /// square toward the promotion rank, origin rank excluded.
    alley: [[u64; 64]; 2],
}

impl AttackTables {
    fn build() -> Self {
        let mut t = AttackTables {
            king: [0; 64],
            knight: [0; 64],
            rays: [[0; 8]; 64],
            pawn: [[0; 64]; 2],
            alley: [[0; 64]; 2],
        };

        const KNIGHT_DELTAS: [(i8, i8); 8] = [
            (1, 2),
            (2, 1),
            (2, -1),
            (1, -2),
            (-1, -2),
            (-2, -1),
            (-2, 1),
            (-1, 2),
        ];

        for i in 0..64u8 {
            let sq = Square::from_index(i);

            for dir in DIRECTIONS {
                let (df, dr) = dir.delta();
                if let Some(step) = sq.offset(df, dr) {
                    t.king[i as usize] |= step.bb();
                    let mut walk = step;
                    loop {
                        t.rays[i as usize][dir as usize] |= walk.bb();
                        match walk.offset(df, dr) {
                            Some(next) => walk = next,
                            None => break,
                        }
                    }
                }
            }

            for (df, dr) in KNIGHT_DELTAS {
                if let Some(to) = sq.offset(df, dr) {
                    t.knight[i as usize] |= to.bb();
                }
            }

            for (color, dr) in [(Color::White, 1i8), (Color::Black, -1i8)] {
                for df in [-1i8, 1] {
                    if let Some(to) = sq.offset(df, dr) {
                        t.pawn[color as usize][i as usize] |= to.bb();
                    }
                }
                let mut alley = 0u64;
                for df in [-1i8, 0, 1] {
                    let mut walk = sq.offset(df, dr);
                    while let Some(s) = walk {
                        alley |= s.bb();
                        walk = s.offset(0, dr);
                    }
                }
                t.alley[color as usize][i as usize] = alley;
            }
        }

        t
    }

    #[inline(always)]
    pub fn king(&self, sq: Square) -> u64 {
        self.king[sq.index() as usize]
    }

    #[inline(always)]
    pub fn knight(&self, sq: Square) -> u64 {
        self.knight[sq.index() as usize]
    }

    #[inline(always)]
    pub fn ray(&self, sq: Square, dir: Direction) -> u64 {
        self.rays[sq.index() as usize][dir as usize]
    }

    #[inline(always)]
    pub fn pawn_attacks(&self, color: Color, sq: Square) -> u64 {
        self.pawn[color as usize][sq.index() as usize]
    }

    #[inline(always)]
    pub fn passed_alley(&self, color: Color, sq: Square) -> u64 {
        self.alley[color as usize][sq.index() as usize]
    }

    /// Attacks along one direction with blockers: `ray(sq) ^ ray(blocker)`
    /// where the blocker is the first occupied square along the ray. The
    /// blocker square itself is included (it may be a capture). Sentinel
    /// bits at the board ends guarantee a blocker always exists.
    #[inline(always)]
    pub fn slide(&self, sq: Square, dir: Direction, occupied: u64) -> u64 {
        let ray = self.ray(sq, dir);
        let blockers = ray & occupied;
        let first = if dir.is_forward() {
            (blockers | 1u64 << 63).lsb()
        } else {
            (blockers | 1u64).msb()
        };
        ray ^ self.ray(Square::from_index(first), dir)
    }

    #[inline(always)]
    pub fn rook_attacks(&self, sq: Square, occupied: u64) -> u64 {
        ORTHOGONALS
            .iter()
            .fold(0, |acc, &d| acc | self.slide(sq, d, occupied))
    }

    #[inline(always)]
    pub fn bishop_attacks(&self, sq: Square, occupied: u64) -> u64 {
        DIAGONALS
            .iter()
            .fold(0, |acc, &d| acc | self.slide(sq, d, occupied))
    }

    #[inline(always)]
    pub fn queen_attacks(&self, sq: Square, occupied: u64) -> u64 {
        self.rook_attacks(sq, occupied) | self.bishop_attacks(sq, occupied)
    }
}

/// Global tables, built on first use.
pub fn attack_tables() -> &'static AttackTables {
    static TABLES: OnceCell<AttackTables> = OnceCell::new();
    TABLES.get_or_init(AttackTables::build)
}
