//! FEN import/export. Six whitespace-separated fields: placement,
//! side-to-move, castling rights, en-passant target, halfmove clock,
//! fullmove number.

use crate::board::castle_bits::*;
use crate::board::{Board, Color, Piece, PieceKind};
use crate::error::EngineError;
use crate::square::Square;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Halfmove clock and fullmove number carried by a FEN string. The board
/// itself does not track clocks; the game record owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenClocks {
    pub halfmove: u32,
    pub fullmove: u32,
}

fn piece_from_char(c: char) -> Option<Piece> {
    let color = if c.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let kind = match c.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };
    Some(Piece::new(color, kind))
}

fn piece_to_char(pc: Piece) -> char {
    let letter = pc.kind().letter();
    match pc.color() {
        Color::White => letter,
        Color::Black => letter.to_ascii_lowercase(),
    }
}

/// Fields of a FEN string with the byte offset each one starts at, so parse
/// errors can point at the offending character.
fn fields(fen: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::with_capacity(6);
    let mut start = None;
    for (i, c) in fen.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, &fen[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, &fen[s..]));
    }
    out
}

impl Board {
    /// Install a position from a FEN string, replacing the current contents.
    /// Returns the clock fields for the caller (the game record) to keep.
    pub fn set_fen(&mut self, fen: &str) -> Result<FenClocks, EngineError> {
        let fields = fields(fen);
        if fields.len() < 4 {
            return Err(EngineError::parse(
                fen.len(),
                "FEN needs at least placement, side, castling and en-passant fields",
            ));
        }

        let mut board = Board::new_empty();

        // 1. placement, ranks 8 down to 1
        let (off, placement) = fields[0];
        let mut rank: i8 = 7;
        let mut file: i8 = 0;
        for (i, c) in placement.char_indices() {
            let at = off + i;
            match c {
                '/' => {
                    if file != 8 {
                        return Err(EngineError::parse(at, "rank has fewer than 8 squares"));
                    }
                    rank -= 1;
                    file = 0;
                    if rank < 0 {
                        return Err(EngineError::parse(at, "too many ranks"));
                    }
                }
                '1'..='8' => {
                    file += c as i8 - b'0' as i8;
                    if file > 8 {
                        return Err(EngineError::parse(at, "rank overflows 8 squares"));
                    }
                }
                _ => {
                    let pc = piece_from_char(c)
                        .ok_or_else(|| EngineError::parse(at, "unknown piece letter"))?;
                    if file >= 8 {
                        return Err(EngineError::parse(at, "rank overflows 8 squares"));
                    }
                    board.put_piece(pc, Square::new(rank as u8, file as u8));
                    file += 1;
                }
            }
        }
        if rank != 0 || file != 8 {
            return Err(EngineError::parse(off + placement.len(), "incomplete placement"));
        }

        // 2. side to move
        let (off, side) = fields[1];
        board.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(EngineError::parse(off, "side to move must be w or b")),
        };

        // 3. castling rights
        let (off, castling) = fields[2];
        if castling != "-" {
            for (i, c) in castling.char_indices() {
                let flag = match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(EngineError::parse(off + i, "bad castling flag")),
                };
                if board.castling_rights & flag != 0 {
                    return Err(EngineError::parse(off + i, "duplicate castling flag"));
                }
                board.castling_rights |= flag;
            }
        }

        // 4. en-passant target
        let (off, ep) = fields[3];
        if ep != "-" {
            let sq: Square = ep
                .parse()
                .map_err(|_| EngineError::parse(off, "bad en-passant square"))?;
            board.en_passant = Some(sq);
        }

        // 5-6. clocks; optional, defaulting like most tools do
        let halfmove = match fields.get(4) {
            Some(&(off, text)) => text
                .parse::<u32>()
                .map_err(|_| EngineError::parse(off, "bad halfmove clock"))?,
            None => 0,
        };
        let fullmove = match fields.get(5) {
            Some(&(off, text)) => {
                let n = text
                    .parse::<u32>()
                    .map_err(|_| EngineError::parse(off, "bad fullmove number"))?;
                if n == 0 {
                    return Err(EngineError::parse(off, "fullmove number starts at 1"));
                }
                n
            }
            None => 1,
        };

        board.zobrist = board.compute_zobrist_full();
        board.validate()?;

        *self = board;
        Ok(FenClocks { halfmove, fullmove })
    }

    /// Emit the position with explicit clock fields.
    pub fn to_fen_with(&self, halfmove: u32, fullmove: u32) -> String {
        let mut out = String::with_capacity(90);

        for rank in (0..8).rev() {
            let mut run = 0;
            for file in 0..8 {
                let pc = self.piece_on(Square::new(rank, file));
                if pc.is_none() {
                    run += 1;
                } else {
                    if run > 0 {
                        out.push((b'0' + run) as char);
                        run = 0;
                    }
                    out.push(piece_to_char(pc));
                }
            }
            if run > 0 {
                out.push((b'0' + run) as char);
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        if self.castling_rights == 0 {
            out.push('-');
        } else {
            for (flag, c) in [
                (CASTLE_WK, 'K'),
                (CASTLE_WQ, 'Q'),
                (CASTLE_BK, 'k'),
                (CASTLE_BQ, 'q'),
            ] {
                if self.castling_rights & flag != 0 {
                    out.push(c);
                }
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", halfmove, fullmove));
        out
    }

    /// Emit the position with zeroed clocks; the game record supplies real
    /// clocks when they matter.
    pub fn to_fen(&self) -> String {
        self.to_fen_with(0, 1)
    }
}
