pub mod zobrist;

pub use zobrist::{ZobristKeys, xor_castling_rights_delta, zobrist_keys};
