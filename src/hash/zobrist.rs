use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::board::castle_bits::*;

#[cfg(feature = "deterministic_zobrist")]
const ZOBRIST_SEED: u64 = 0x9E37_79B9_AAAC_5C87;

fn make_zobrist_rng() -> StdRng {
    #[cfg(feature = "deterministic_zobrist")]
    {
        StdRng::seed_from_u64(ZOBRIST_SEED)
    }
    #[cfg(not(feature = "deterministic_zobrist"))]
    {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    }
}

/// The per-feature random keys a position hash is XORed together from.
/// Initialized once at process start and never mutated afterwards.
pub struct ZobristKeys {
    /// [color][kind - 1][square] with {White=0, Black=1} and kinds pawn..king.
    pub piece: [[[u64; 64]; 6]; 2],
    /// XORed in when black is to move.
    pub side_to_move: u64,
    /// One key per castling-rights bit, [WK, WQ, BK, BQ].
    pub castling: [u64; 4],
    /// One key per en-passant file, a..h.
    pub ep_file: [u64; 8],
}

/// XOR the hash delta for a castling-rights transition `old -> new`.
#[inline]
pub fn xor_castling_rights_delta(hash: &mut u64, keys: &ZobristKeys, old: u8, new: u8) {
    let d = old ^ new;
    if d & CASTLE_WK != 0 {
        *hash ^= keys.castling[0];
    }
    if d & CASTLE_WQ != 0 {
        *hash ^= keys.castling[1];
    }
    if d & CASTLE_BK != 0 {
        *hash ^= keys.castling[2];
    }
    if d & CASTLE_BQ != 0 {
        *hash ^= keys.castling[3];
    }
}

/// Global keys, generated on first use.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_keys(make_zobrist_rng()))
}

fn generate_keys(mut rng: StdRng) -> ZobristKeys {
    #[inline]
    fn non_zero(r: &mut StdRng) -> u64 {
        // zero keys would make features invisible to the hash
        let mut v = r.next_u64();
        while v == 0 {
            v = r.next_u64();
        }
        v
    }

    let mut keys = ZobristKeys {
        piece: [[[0u64; 64]; 6]; 2],
        side_to_move: 0,
        castling: [0u64; 4],
        ep_file: [0u64; 8],
    };

    for color in 0..2 {
        for kind in 0..6 {
            for sq in 0..64 {
                keys.piece[color][kind][sq] = non_zero(&mut rng);
            }
        }
    }
    for i in 0..4 {
        keys.castling[i] = non_zero(&mut rng);
    }
    for f in 0..8 {
        keys.ep_file[f] = non_zero(&mut rng);
    }
    keys.side_to_move = non_zero(&mut rng);

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct_and_nonzero() {
        let keys = zobrist_keys();
        assert_ne!(keys.side_to_move, 0);
        for c in 0..2 {
            for k in 0..6 {
                for sq in 0..64 {
                    assert_ne!(keys.piece[c][k][sq], 0);
                }
            }
        }
        // spot check: castling keys pairwise distinct
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert_ne!(keys.castling[i], keys.castling[j]);
            }
        }
    }

    #[test]
    fn castling_delta_is_involution() {
        let keys = zobrist_keys();
        let mut h = 0xDEAD_BEEFu64;
        let orig = h;
        xor_castling_rights_delta(&mut h, keys, CASTLE_ALL, CASTLE_WK);
        assert_ne!(h, orig);
        xor_castling_rights_delta(&mut h, keys, CASTLE_WK, CASTLE_ALL);
        assert_eq!(h, orig);
    }
}
