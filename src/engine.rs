//! The engine facade: the command surface UI and console collaborators
//! drive. Owns the game record, the transposition table and the search
//! configuration; everything flows in through these methods and out as
//! moves, reports and statuses.

use std::time::Duration;

use rand::RngCore;
use serde::Serialize;

use crate::board::{Board, Color};
use crate::error::EngineError;
use crate::game::{Game, GameStatus};
use crate::moves::attacks::{AttackTables, attack_tables};
use crate::moves::types::{Move, MoveList};
use crate::notation;
use crate::search::eval::EvalWeights;
use crate::search::search::{
    SearchLimits, SearchOptions, SearchReport, iterate,
};
use crate::search::tt::{SCORE_MATE, TranspositionTable, is_mate_score};
use crate::search::{MAX_PLY, SearchContext};

/// Default transposition-table size.
const DEFAULT_TT_BYTES: usize = 64 << 20;

/// Per-move time caps for levels 1..=10.
const LEVEL_MOVETIME_MS: [u64; 10] =
    [500, 1_000, 2_000, 5_000, 10_000, 15_000, 30_000, 60_000, 120_000, 300_000];

/// Who produces moves for a side. The engine case carries its strength
/// setting; the human case is driven from outside through `make_move`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Player {
    Human { name: String },
    Engine { level: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeControl {
    pub base: Duration,
    pub increment: Duration,
}

/// Search result in a transport-friendly shape.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub depth: i32,
    pub score_cp: i32,
    /// Full moves to mate when the score is a mate score.
    pub mate_in: Option<i32>,
    pub nodes: u64,
    pub elapsed_ms: u128,
    pub pv: Vec<String>,
}

impl SearchSummary {
    pub fn from_report(report: &SearchReport) -> Self {
        let mate_in = if is_mate_score(report.score) {
            let moves = (SCORE_MATE - report.score.abs() + 1) / 2;
            Some(if report.score > 0 { moves } else { -moves })
        } else {
            None
        };
        SearchSummary {
            depth: report.depth,
            score_cp: report.score,
            mate_in,
            nodes: report.nodes,
            elapsed_ms: report.elapsed.as_millis(),
            pv: report.pv.iter().map(|m| m.to_uci()).collect(),
        }
    }
}

/// Outcome of asking the engine to move. `best` is `None` when the game is
/// over or the host canceled the search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: Option<Move>,
    pub report: SearchReport,
}

pub struct Engine {
    game: Game,
    tables: &'static AttackTables,
    tt: TranspositionTable,
    ctx: SearchContext,
    options: SearchOptions,
    players: [Player; 2],
    level: u8,
    time_control: Option<TimeControl>,
    clocks: [Duration; 2],
}

impl Engine {
    pub fn new() -> Result<Self, EngineError> {
        Engine::with_table_size(DEFAULT_TT_BYTES)
    }

    pub fn with_table_size(tt_bytes: usize) -> Result<Self, EngineError> {
        Ok(Engine {
            game: Game::new(),
            tables: attack_tables(),
            tt: TranspositionTable::new(tt_bytes)?,
            ctx: SearchContext::new(),
            options: SearchOptions::default(),
            players: [
                Player::Human {
                    name: "Player".to_string(),
                },
                Player::Engine { level: 5 },
            ],
            level: 5,
            time_control: None,
            clocks: [Duration::ZERO; 2],
        })
    }

    /// Reset to the start position, clear the table and the clocks.
    pub fn new_game(&mut self) {
        self.game = Game::new();
        self.tt.clear();
        if let Some(tc) = self.time_control {
            self.clocks = [tc.base; 2];
        }
    }

    /// Install a position from FEN, optionally followed by applied moves
    /// (UCI or SAN tokens).
    pub fn load_fen(&mut self, fen: &str, moves: &[&str]) -> Result<(), EngineError> {
        let mut game = Game::from_fen(fen)?;
        for token in moves {
            let mut scratch = game.board().clone();
            let mv = parse_move(&mut scratch, self.tables, token)?;
            game.make(mv);
        }
        self.game = game;
        self.tt.clear();
        Ok(())
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn board(&self) -> &Board {
        self.game.board()
    }

    pub fn fen(&self) -> String {
        self.game.to_fen()
    }

    pub fn status(&mut self) -> GameStatus {
        self.game.status(self.tables)
    }

    /// Apply a move given in UCI or SAN notation. Parse failures and moves
    /// outside the legal set surface as errors; the game record advances
    /// only on success.
    pub fn make_move(&mut self, text: &str) -> Result<Move, EngineError> {
        let mut scratch = self.game.board().clone();
        let mv = parse_move(&mut scratch, self.tables, text)?;
        self.game.make(mv);
        Ok(mv)
    }

    pub fn undo_move(&mut self) -> Option<Move> {
        self.game.undo()
    }

    pub fn redo_move(&mut self) -> Option<Move> {
        self.game.redo()
    }

    pub fn set_level(&mut self, level: u8) {
        self.level = level.clamp(1, 10);
        for player in self.players.iter_mut() {
            if let Player::Engine { level } = player {
                *level = self.level;
            }
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn set_player(&mut self, color: Color, player: Player) {
        self.players[color as usize] = player;
    }

    pub fn player(&self, color: Color) -> &Player {
        &self.players[color as usize]
    }

    /// Whether the side to move is driven by the engine rather than an
    /// outside human.
    pub fn engine_to_move(&self) -> bool {
        matches!(
            self.players[self.board().side_to_move as usize],
            Player::Engine { .. }
        )
    }

    pub fn set_time_control(&mut self, control: TimeControl) {
        self.time_control = Some(control);
        self.clocks = [control.base; 2];
    }

    pub fn set_clock(&mut self, color: Color, remaining: Duration) {
        self.clocks[color as usize] = remaining;
    }

    pub fn clock(&self, color: Color) -> Duration {
        self.clocks[color as usize]
    }

    pub fn set_options(&mut self, options: SearchOptions) {
        self.options = options;
    }

    /// Evaluation jitter half-range in centipawns; 0 makes the engine
    /// fully deterministic.
    pub fn set_jitter(&mut self, range: i32) {
        self.ctx.weights.random = range.max(0);
    }

    pub fn set_eval_weights(&mut self, weights: EvalWeights) {
        self.ctx.weights = weights;
    }

    /// Debugging hook: arm a variation (moves from the current position);
    /// the search logs when it enters that exact line.
    pub fn set_break(&mut self, line: &[&str]) -> Result<(), EngineError> {
        let mut board = self.game.board().clone();
        let mut digests = Vec::with_capacity(line.len());
        for token in line {
            let mv = parse_move(&mut board, self.tables, token)?;
            digests.push(mv.digest());
            let mut applied = mv;
            crate::moves::execute::make_move(&mut board, &mut applied);
        }
        self.ctx.break_line = if digests.is_empty() {
            None
        } else {
            Some(digests)
        };
        Ok(())
    }

    /// Budget for a normal game move under the current level and clock.
    fn plan_limits(&self) -> SearchLimits {
        let level_cap =
            Duration::from_millis(LEVEL_MOVETIME_MS[(self.level - 1) as usize]);
        let clock = self.time_control.map(|_| self.clocks[self.board().side_to_move as usize]);
        SearchLimits {
            depth: None,
            movetime: None,
            clock,
            increment: self.time_control.map_or(Duration::ZERO, |tc| tc.increment),
            level_cap: Some(level_cap),
            nodes: None,
        }
    }

    /// Ask the engine for a move under the configured budget. The game
    /// record is not advanced; the caller decides whether to play the
    /// returned move.
    pub fn play_move(
        &mut self,
        yield_hook: Option<&mut dyn FnMut() -> bool>,
    ) -> SearchOutcome {
        let limits = self.plan_limits();
        self.search_with(&limits, yield_hook)
    }

    /// Like `play_move` but with an explicit budget (depth, movetime or
    /// node count); the console's `go` command.
    pub fn search_with(
        &mut self,
        limits: &SearchLimits,
        yield_hook: Option<&mut dyn FnMut() -> bool>,
    ) -> SearchOutcome {
        if self.game.status(self.tables).is_over() {
            return SearchOutcome {
                best: None,
                report: SearchReport {
                    best: None,
                    score: 0,
                    depth: 0,
                    nodes: 0,
                    elapsed: Duration::ZERO,
                    pv: Vec::new(),
                    interrupt: None,
                },
            };
        }

        let seed = if self.ctx.weights.random > 0 {
            rand::rng().next_u64()
        } else {
            0
        };
        let game_hashes = self.game.history_hashes();
        let fifty = self.game.halfmove_clock();
        self.ctx.begin_search(game_hashes, fifty, seed);

        let mover = self.board().side_to_move;
        let mut board = self.board().clone();
        let report = iterate(
            &mut board,
            self.tables,
            &mut self.tt,
            &mut self.ctx,
            self.options,
            limits,
            yield_hook,
        );

        if self.time_control.is_some() {
            let clock = &mut self.clocks[mover as usize];
            *clock = clock.saturating_sub(report.elapsed);
            if let Some(tc) = self.time_control {
                *clock += tc.increment;
            }
        }

        SearchOutcome {
            best: report.best,
            report,
        }
    }

    pub fn tt_stats(&self) -> crate::search::tt::TtStats {
        self.tt.stats
    }

    /// The applied record as SAN movetext, for journaling the game as PGN.
    pub fn movetext(&self) -> String {
        notation::game_movetext(&self.game, self.tables)
    }

    /// Depth cap sanity for explicit-budget callers.
    pub fn max_depth() -> i32 {
        (MAX_PLY - 2) as i32
    }
}

/// Accept either coordinate or SAN notation for a single move.
fn parse_move(
    board: &mut Board,
    tables: &AttackTables,
    text: &str,
) -> Result<Move, EngineError> {
    let looks_uci = text.len() >= 4
        && text.as_bytes()[0].is_ascii_lowercase()
        && text.as_bytes()[1].is_ascii_digit()
        && text.as_bytes()[2].is_ascii_lowercase()
        && text.as_bytes()[3].is_ascii_digit();
    let mv = if looks_uci {
        notation::parse_uci(board, tables, text)?
    } else {
        notation::parse_san(board, tables, text)?
    };
    if mv.is_nil() {
        return Err(EngineError::IllegalMove(text.to_string()));
    }
    // belt and braces: the parsers only return members of the legal set
    let mut legal = MoveList::new();
    let mut scratch = MoveList::new();
    crate::moves::movegen::generate_legal(board, tables, &mut legal, &mut scratch);
    if !legal.iter().any(|l| l.same_move(mv)) {
        return Err(EngineError::IllegalMove(text.to_string()));
    }
    Ok(mv)
}
