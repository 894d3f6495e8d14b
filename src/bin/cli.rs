//! Console front end: a thin transport over the engine facade. Speaks
//! enough of the UCI dialect for GUIs and test harnesses, plus a few
//! direct commands (make/undo/redo/perft/save) for driving games by hand.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use palisade::board::Color;
use palisade::engine::{Engine, SearchSummary, TimeControl};
use palisade::logger::init_logging;
use palisade::moves::attacks::attack_tables;
use palisade::moves::execute::{make_move, undo_move};
use palisade::moves::movegen::{GenMode, generate_pseudo_legal};
use palisade::moves::perft::perft;
use palisade::moves::square_control::in_check;
use palisade::moves::types::MoveList;
use palisade::search::SearchLimits;

fn main() {
    init_logging("logs/palisade.log", "info");

    let mut engine = match Engine::new() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("fatal: {e}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "uci" => {
                println!("id name palisade");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" | "new" => engine.new_game(),
            "position" => {
                if let Err(e) = handle_position(&mut engine, &parts) {
                    eprintln!("error: {e}");
                }
            }
            "go" => handle_go(&mut engine, &parts),
            "make" | "move" => {
                if parts.len() < 2 {
                    eprintln!("usage: make <move>");
                    continue;
                }
                match engine.make_move(parts[1]) {
                    Ok(mv) => println!("played {mv} ({:?})", engine.status()),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "undo" => {
                if engine.undo_move().is_none() {
                    eprintln!("nothing to undo");
                }
            }
            "redo" => {
                if engine.redo_move().is_none() {
                    eprintln!("nothing to redo");
                }
            }
            "level" => {
                if let Some(n) = parts.get(1).and_then(|s| s.parse::<u8>().ok()) {
                    engine.set_level(n);
                } else {
                    eprintln!("usage: level <1-10>");
                }
            }
            "clock" => {
                // clock <base-seconds> [increment-seconds]
                let base = parts.get(1).and_then(|s| s.parse::<u64>().ok());
                if let Some(base) = base {
                    let inc = parts.get(2).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
                    engine.set_time_control(TimeControl {
                        base: Duration::from_secs(base),
                        increment: Duration::from_secs(inc),
                    });
                } else {
                    eprintln!("usage: clock <base-seconds> [increment-seconds]");
                }
            }
            "fen" => println!("{}", engine.fen()),
            "d" | "display" => display_board(&engine),
            "status" => println!("{:?}", engine.status()),
            "perft" => {
                let depth = parts.get(1).and_then(|s| s.parse::<u32>().ok()).unwrap_or(5);
                run_perft(&mut engine, depth);
            }
            "save" => {
                let path = parts.get(1).copied().unwrap_or("game.pgn");
                match std::fs::File::create(path)
                    .and_then(|mut f| writeln!(f, "{}", engine.movetext()))
                {
                    Ok(()) => println!("saved {path}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "quit" | "exit" => break,
            other => eprintln!("unknown command: {other}"),
        }
    }
}

fn handle_position(engine: &mut Engine, parts: &[&str]) -> Result<(), palisade::error::EngineError> {
    let moves_at = parts.iter().position(|&p| p == "moves");
    let moves: Vec<&str> = match moves_at {
        Some(i) => parts[i + 1..].to_vec(),
        None => Vec::new(),
    };

    match parts.get(1) {
        Some(&"startpos") => {
            engine.load_fen(palisade::board::START_FEN, &moves)?;
        }
        Some(&"fen") => {
            let end = moves_at.unwrap_or(parts.len());
            let fen = parts[2..end].join(" ");
            engine.load_fen(&fen, &moves)?;
        }
        _ => eprintln!("usage: position startpos|fen <fen> [moves ...]"),
    }
    Ok(())
}

fn handle_go(engine: &mut Engine, parts: &[&str]) {
    let mut limits = SearchLimits::default();
    let mut use_plain_play = true;

    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut winc: u64 = 0;
    let mut binc: u64 = 0;

    let mut i = 1;
    while i < parts.len() {
        let value = parts.get(i + 1).and_then(|s| s.parse::<u64>().ok());
        match parts[i] {
            "depth" => {
                limits.depth = value.map(|v| (v as i32).min(Engine::max_depth()));
                use_plain_play = false;
                i += 2;
            }
            "movetime" => {
                limits.movetime = value.map(Duration::from_millis);
                use_plain_play = false;
                i += 2;
            }
            "nodes" => {
                limits.nodes = value;
                use_plain_play = false;
                i += 2;
            }
            "wtime" => {
                wtime = value;
                use_plain_play = false;
                i += 2;
            }
            "btime" => {
                btime = value;
                use_plain_play = false;
                i += 2;
            }
            "winc" => {
                winc = value.unwrap_or(0);
                i += 2;
            }
            "binc" => {
                binc = value.unwrap_or(0);
                i += 2;
            }
            "infinite" => {
                use_plain_play = false;
                i += 1;
            }
            _ => i += 1,
        }
    }

    let outcome = if use_plain_play {
        engine.play_move(None)
    } else {
        let (clock, inc) = match engine.board().side_to_move {
            Color::White => (wtime, winc),
            Color::Black => (btime, binc),
        };
        limits.clock = clock.map(Duration::from_millis);
        limits.increment = Duration::from_millis(inc);
        engine.search_with(&limits, None)
    };

    let summary = SearchSummary::from_report(&outcome.report);
    let score = match summary.mate_in {
        Some(m) => format!("mate {m}"),
        None => format!("cp {}", summary.score_cp),
    };
    println!(
        "info depth {} score {} nodes {} time {} pv {}",
        summary.depth,
        score,
        summary.nodes,
        summary.elapsed_ms,
        summary.pv.join(" ")
    );
    match outcome.best {
        Some(mv) => println!("bestmove {}", mv.to_uci()),
        None => println!("bestmove 0000"),
    }
}

fn display_board(engine: &Engine) {
    let board = engine.board();
    for rank in (0..8u8).rev() {
        let mut row = format!("{} ", rank + 1);
        for file in 0..8u8 {
            let pc = board.piece_on(palisade::square::Square::new(rank, file));
            let c = if pc.is_none() {
                '.'
            } else {
                let letter = pc.kind().letter();
                match pc.color() {
                    Color::White => letter,
                    Color::Black => letter.to_ascii_lowercase(),
                }
            };
            row.push(c);
            row.push(' ');
        }
        println!("{row}");
    }
    println!("  a b c d e f g h");
    println!("{}", engine.fen());
}

/// Perft with a per-root-move progress bar; the counts come from the same
/// generator the search uses.
fn run_perft(engine: &mut Engine, depth: u32) {
    let tables = attack_tables();
    let mut board = engine.board().clone();

    if depth == 0 {
        println!("nodes 1");
        return;
    }

    let mut roots = MoveList::new();
    generate_pseudo_legal(&board, tables, GenMode::All, &mut roots);

    let bar = ProgressBar::new(roots.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}").expect("static template"),
    );

    let start = std::time::Instant::now();
    let mover = board.side_to_move;
    let mut total = 0u64;
    for i in 0..roots.len() {
        let mut mv = roots[i];
        make_move(&mut board, &mut mv);
        if !in_check(&board, mover, tables) {
            let nodes = perft(&mut board, tables, depth - 1);
            total += nodes;
            bar.set_message(format!("{} {}", mv.to_uci(), nodes));
        }
        undo_move(&mut board, mv);
        bar.inc(1);
    }
    bar.finish_and_clear();

    let secs = start.elapsed().as_secs_f64().max(1e-9);
    println!(
        "nodes {total} time {:.3}s nps {}",
        secs,
        (total as f64 / secs) as u64
    );
}
