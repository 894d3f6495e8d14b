//! Move notation: SAN and UCI coordinate forms, consumed from the outside
//! world and produced for it. The parsers never guess: a token that does not
//! resolve to exactly one legal move is an error.

use crate::board::{Board, PieceKind};
use crate::error::EngineError;
use crate::game::Game;
use crate::moves::attacks::AttackTables;
use crate::moves::execute::{make_move, undo_move};
use crate::moves::movegen::generate_legal;
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, MoveList};
use crate::square::Square;

pub const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

fn legal_moves(board: &mut Board, tables: &AttackTables) -> MoveList {
    let mut moves = MoveList::new();
    let mut scratch = MoveList::new();
    generate_legal(board, tables, &mut moves, &mut scratch);
    moves
}

fn kind_from_letter(c: char) -> Option<PieceKind> {
    match c {
        'N' => Some(PieceKind::Knight),
        'B' => Some(PieceKind::Bishop),
        'R' => Some(PieceKind::Rook),
        'Q' => Some(PieceKind::Queen),
        'K' => Some(PieceKind::King),
        _ => None,
    }
}

/// Parse a UCI coordinate move (`e2e4`, `e7e8q`) against the current legal
/// moves. `0000` parses to the nil move.
pub fn parse_uci(
    board: &mut Board,
    tables: &AttackTables,
    text: &str,
) -> Result<Move, EngineError> {
    if text == "0000" {
        return Ok(Move::NIL);
    }
    if text.len() < 4 || text.len() > 5 {
        return Err(EngineError::parse(0, "expected a coordinate move like e2e4"));
    }

    let from: Square = text[0..2]
        .parse()
        .map_err(|_| EngineError::parse(0, "bad from-square"))?;
    let to: Square = text[2..4]
        .parse()
        .map_err(|_| EngineError::parse(2, "bad to-square"))?;
    let promo = match text.as_bytes().get(4) {
        None => PieceKind::None,
        Some(&c) => match c.to_ascii_lowercase() {
            b'q' => PieceKind::Queen,
            b'r' => PieceKind::Rook,
            b'b' => PieceKind::Bishop,
            b'n' => PieceKind::Knight,
            _ => return Err(EngineError::parse(4, "bad promotion letter")),
        },
    };

    legal_moves(board, tables)
        .iter()
        .find(|m| m.from() == from && m.to() == to && m.promotion() == promo)
        .copied()
        .ok_or_else(|| EngineError::IllegalMove(text.to_string()))
}

/// Parse a SAN token (`Nf3`, `exd5`, `Rad1`, `e8=Q+`, `O-O`, `exd6 e.p.`)
/// against the current legal moves.
pub fn parse_san(
    board: &mut Board,
    tables: &AttackTables,
    text: &str,
) -> Result<Move, EngineError> {
    let original = text;
    if RESULT_TOKENS.contains(&text) {
        return Err(EngineError::parse(0, "result token, not a move"));
    }

    // suffixes carry no move information
    let mut body = text.trim();
    for suffix in [" e.p.", "e.p."] {
        if let Some(stripped) = body.strip_suffix(suffix) {
            body = stripped.trim_end();
        }
    }
    body = body.trim_end_matches(['+', '#', '!', '?']);
    if body.is_empty() {
        return Err(EngineError::parse(0, "empty move"));
    }

    let legal = legal_moves(board, tables);

    if body == "O-O" || body == "0-0" {
        return legal
            .iter()
            .find(|m| m.is_castle() && m.to().file() == 6)
            .copied()
            .ok_or_else(|| EngineError::IllegalMove(original.to_string()));
    }
    if body == "O-O-O" || body == "0-0-0" {
        return legal
            .iter()
            .find(|m| m.is_castle() && m.to().file() == 2)
            .copied()
            .ok_or_else(|| EngineError::IllegalMove(original.to_string()));
    }

    let mut chars: Vec<char> = body.chars().collect();

    // promotion: '=' and a piece letter at the tail
    let mut promo = PieceKind::None;
    if chars.len() >= 2 && chars[chars.len() - 2] == '=' {
        promo = kind_from_letter(chars[chars.len() - 1])
            .ok_or_else(|| EngineError::parse(body.len() - 1, "bad promotion piece"))?;
        if promo == PieceKind::King {
            return Err(EngineError::parse(body.len() - 1, "cannot promote to king"));
        }
        chars.truncate(chars.len() - 2);
    }

    if chars.len() < 2 {
        return Err(EngineError::parse(0, "truncated move"));
    }
    let dest_text: String = chars[chars.len() - 2..].iter().collect();
    let dest: Square = dest_text
        .parse()
        .map_err(|_| EngineError::parse(chars.len() - 2, "bad destination square"))?;
    chars.truncate(chars.len() - 2);

    // leading piece letter; pawns are implicit
    let mut kind = PieceKind::Pawn;
    if let Some(&first) = chars.first()
        && let Some(k) = kind_from_letter(first)
    {
        kind = k;
        chars.remove(0);
    }

    // the middle may hold a capture mark and a file/rank/square disambiguator
    let is_capture_marked = chars.last() == Some(&'x');
    if is_capture_marked {
        chars.pop();
    }
    let mut want_file: Option<u8> = None;
    let mut want_rank: Option<u8> = None;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            'a'..='h' if want_file.is_none() => want_file = Some(c as u8 - b'a'),
            '1'..='8' if want_rank.is_none() => want_rank = Some(c as u8 - b'1'),
            _ => return Err(EngineError::parse(i, "bad disambiguator")),
        }
    }

    let candidates: Vec<Move> = legal
        .iter()
        .filter(|m| {
            m.piece().kind() == kind
                && m.to() == dest
                && m.promotion() == promo
                && want_file.is_none_or(|f| m.from().file() == f)
                && want_rank.is_none_or(|r| m.from().rank() == r)
                && (!is_capture_marked || m.is_capture())
                // a bare pawn move like "e4" is a push; captures must name
                // the origin file
                && (kind != PieceKind::Pawn || want_file.is_some() || !m.is_capture())
        })
        .copied()
        .collect();

    match candidates.len() {
        0 => Err(EngineError::IllegalMove(original.to_string())),
        1 => Ok(candidates[0]),
        _ => Err(EngineError::parse(0, "ambiguous move")),
    }
}

/// Render a legal move in SAN with minimal disambiguation and a check or
/// mate suffix.
pub fn to_san(board: &mut Board, tables: &AttackTables, mv: Move) -> String {
    let mut out = String::new();

    if mv.is_castle() {
        out.push_str(if mv.to().file() == 6 { "O-O" } else { "O-O-O" });
    } else {
        let kind = mv.piece().kind();
        if kind == PieceKind::Pawn {
            if mv.is_capture() {
                out.push((b'a' + mv.from().file()) as char);
            }
        } else {
            out.push(kind.letter());

            // minimal disambiguation: omit if unique, else file, else rank,
            // else both
            let rivals: Vec<Move> = legal_moves(board, tables)
                .iter()
                .filter(|m| {
                    m.piece().kind() == kind && m.to() == mv.to() && !m.same_move(mv)
                })
                .copied()
                .collect();
            if !rivals.is_empty() {
                let file_unique = rivals.iter().all(|m| m.from().file() != mv.from().file());
                let rank_unique = rivals.iter().all(|m| m.from().rank() != mv.from().rank());
                if file_unique {
                    out.push((b'a' + mv.from().file()) as char);
                } else if rank_unique {
                    out.push((b'1' + mv.from().rank()) as char);
                } else {
                    out.push_str(&mv.from().to_string());
                }
            }
        }

        if mv.is_capture() {
            out.push('x');
        }
        out.push_str(&mv.to().to_string());
        if mv.is_promotion() {
            out.push('=');
            out.push(mv.promotion().letter());
        }
    }

    // suffix needs the post-move position
    let mut applied = mv;
    make_move(board, &mut applied);
    let opponent = board.side_to_move;
    if in_check(board, opponent, tables) {
        let any_reply = !legal_moves(board, tables).is_empty();
        out.push(if any_reply { '+' } else { '#' });
    }
    undo_move(board, applied);

    out
}

/// SAN movetext for the applied record, with move numbers and no headers —
/// the core of a PGN journal.
pub fn game_movetext(game: &Game, tables: &AttackTables) -> String {
    let mut board = Board::new_empty();
    board
        .set_fen(game.base_fen())
        .expect("game base position is valid");

    let mut out = String::new();
    let mut fullmove = {
        // re-derive the base fullmove number from the base FEN
        game.base_fen()
            .split_whitespace()
            .nth(5)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(1)
    };

    for (i, &mv) in game.applied().iter().enumerate() {
        let white_to_move = board.side_to_move == crate::board::Color::White;
        if white_to_move {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&format!("{}.", fullmove));
            out.push(' ');
        } else {
            if i == 0 {
                out.push_str(&format!("{}...", fullmove));
            }
            out.push(' ');
        }
        out.push_str(&to_san(&mut board, tables, mv));
        let mut applied = mv;
        make_move(&mut board, &mut applied);
        if !white_to_move {
            fullmove += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::attacks::attack_tables;
    use std::str::FromStr;

    #[test]
    fn uci_round_trip_on_startpos() {
        let t = attack_tables();
        let mut b = Board::new();
        let mv = parse_uci(&mut b, t, "e2e4").unwrap();
        assert_eq!(mv.to_uci(), "e2e4");
        assert!(parse_uci(&mut b, t, "e2e5").is_err());
        assert!(matches!(
            parse_uci(&mut b, t, "z2e4"),
            Err(EngineError::Parse { .. })
        ));
    }

    #[test]
    fn san_basics() {
        let t = attack_tables();
        let mut b = Board::new();
        assert_eq!(parse_san(&mut b, t, "Nf3").unwrap().to_uci(), "g1f3");
        assert_eq!(parse_san(&mut b, t, "e4").unwrap().to_uci(), "e2e4");
        assert!(parse_san(&mut b, t, "Ne4").is_err());
    }

    #[test]
    fn san_disambiguation_by_file() {
        let t = attack_tables();
        // rooks on a1 and h1 both reach d1
        let mut b = Board::from_str("4k3/8/8/8/8/8/4K3/R6R w - - 0 1").unwrap();
        let mv = parse_san(&mut b, t, "Rad1").unwrap();
        assert_eq!(mv.to_uci(), "a1d1");
        // producing the SAN adds the file disambiguator back
        assert_eq!(to_san(&mut b, t, mv), "Rad1");
        // bare "Rd1" is ambiguous
        assert!(matches!(
            parse_san(&mut b, t, "Rd1"),
            Err(EngineError::Parse { .. })
        ));
    }

    #[test]
    fn san_capture_and_promotion() {
        let t = attack_tables();
        let mut b = Board::from_str("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mv = parse_san(&mut b, t, "axb8=Q+").unwrap();
        assert_eq!(mv.to_uci(), "a7b8q");
        assert_eq!(mv.promotion(), PieceKind::Queen);
        let rendered = to_san(&mut b, t, mv);
        assert_eq!(rendered, "axb8=Q+");
    }

    #[test]
    fn san_castles() {
        let t = attack_tables();
        let mut b =
            Board::from_str("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let ks = parse_san(&mut b, t, "O-O").unwrap();
        assert_eq!(ks.to_uci(), "e1g1");
        assert_eq!(to_san(&mut b, t, ks), "O-O");
        let qs = parse_san(&mut b, t, "O-O-O").unwrap();
        assert_eq!(qs.to_uci(), "e1c1");
    }

    #[test]
    fn san_mate_suffix() {
        let t = attack_tables();
        // back-rank mate in one: Ra8#
        let mut b = Board::from_str("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mv = parse_san(&mut b, t, "Ra8").unwrap();
        assert_eq!(to_san(&mut b, t, mv), "Ra8#");
    }

    #[test]
    fn en_passant_suffix_accepted() {
        let t = attack_tables();
        let mut b = Board::from_str("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let mv = parse_san(&mut b, t, "exd6 e.p.").unwrap();
        assert_eq!(mv.to_uci(), "e5d6");
        assert_eq!(mv.captured(), PieceKind::Pawn);
    }
}
