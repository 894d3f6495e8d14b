//! Iterative-deepening negamax with alpha-beta pruning, aspiration windows,
//! principal-variation search, quiescence, and cooperative time management.
//!
//! The engine runs on one thread. Every ~512 nodes the search yields to a
//! host-supplied callback which may raise the one-way cancel flag; the
//! search then unwinds through ordinary returns and the root folds the
//! interruption into a best-move-or-none result.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::board::Board;
use crate::moves::attacks::AttackTables;
use crate::moves::execute::{make_move, make_null, undo_move, undo_null};
use crate::moves::square_control::in_check;
use crate::moves::types::Move;
use crate::search::context::{MAX_PLY, SearchContext};
use crate::search::eval::{presort_eval, static_eval};
use crate::search::picker::{MovePicker, reconstruct};
use crate::search::tt::{
    Bound, SCORE_DRAW, SCORE_INF, SCORE_MATE, is_mate_score, mate_distance, TranspositionTable,
};

/// How often the search yields to the host, in nodes.
const YIELD_INTERVAL: u64 = 512;
/// Initial aspiration half-window in centipawns.
const ASPIRATION_WINDOW: i32 = 20;
/// Quiescence may run at most this many plies past the main horizon.
const QUIESCE_CAP: i32 = 32;
/// Margin for the optional frontier futility prune.
const FUTILITY_MARGIN: i32 = 150;
/// Keep this much clock in hand against flagging.
const FLAG_MARGIN: Duration = Duration::from_millis(500);

/// Optional search extensions. Disabling them never changes correctness,
/// only effort.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub null_move: bool,
    pub futility: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            null_move: true,
            futility: false,
        }
    }
}

/// Raw search budget as the facade hands it over.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub depth: Option<i32>,
    pub movetime: Option<Duration>,
    /// Remaining clock for the side to move.
    pub clock: Option<Duration>,
    pub increment: Duration,
    /// Per-level cap on the soft deadline.
    pub level_cap: Option<Duration>,
    pub nodes: Option<u64>,
}

/// Why the search stopped before finishing on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Host cancel: discard everything, return no move.
    Canceled,
    /// Deadline: keep the last completed iteration's move.
    TimedOut,
}

/// Deadlines derived from the limits and the material left on the board.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeBudget {
    /// Per-move target; iterations stop once it has passed.
    pub soft: Option<Duration>,
    /// Hard ceiling: the clock minus a safety margin.
    pub flag: Option<Duration>,
    pub nodes: Option<u64>,
}

impl TimeBudget {
    /// Plan the per-move deadline. With a live clock, the budget is the
    /// remaining time divided by a moves-remaining estimate interpolated
    /// over total material (10 moves near the endgame, 50 at full board),
    /// plus the increment when it fits, capped by the level preset.
    pub fn plan(limits: &SearchLimits, material_total: i32) -> TimeBudget {
        let mut budget = TimeBudget {
            nodes: limits.nodes,
            ..TimeBudget::default()
        };

        if let Some(movetime) = limits.movetime {
            budget.soft = Some(movetime);
            return budget;
        }

        if let Some(clock) = limits.clock {
            budget.flag = Some(clock.saturating_sub(FLAG_MARGIN));

            let material = material_total.clamp(200, 7800);
            let moves_left = (50 - 10) * (material - 200) / (7800 - 200) + 10;
            let mut soft = clock / moves_left as u32;
            if soft + limits.increment < clock {
                soft += limits.increment;
            }
            if let Some(cap) = limits.level_cap {
                soft = soft.min(cap);
            }
            budget.soft = Some(soft);
        } else {
            budget.soft = limits.level_cap;
        }

        budget
    }
}

/// Tracks elapsed time against the budget and hosts the yield callback.
/// The interrupt flag is one-way: once raised the search only unwinds.
pub struct TimeManager<'a> {
    start: Instant,
    budget: TimeBudget,
    hook: Option<&'a mut dyn FnMut() -> bool>,
    pub interrupt: Option<Interrupt>,
    /// Whether a completed iteration's move exists to fall back on.
    pub has_root_best: bool,
}

impl<'a> TimeManager<'a> {
    pub fn new(budget: TimeBudget, hook: Option<&'a mut dyn FnMut() -> bool>) -> Self {
        TimeManager {
            start: Instant::now(),
            budget,
            hook,
            interrupt: None,
            has_root_best: false,
        }
    }

    #[inline(always)]
    pub fn stopped(&self) -> bool {
        self.interrupt.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// The periodic yield point. Runs the host callback, then the deadline
    /// checks; overshooting the soft deadline by half, or coming within the
    /// flag margin, forces a timeout once a fallback move exists.
    pub fn tick(&mut self, nodes: u64) {
        if self.interrupt.is_some() {
            return;
        }
        if let Some(hook) = self.hook.as_mut()
            && hook()
        {
            self.interrupt = Some(Interrupt::Canceled);
            return;
        }
        if let Some(max_nodes) = self.budget.nodes
            && nodes >= max_nodes
            && self.has_root_best
        {
            self.interrupt = Some(Interrupt::TimedOut);
            return;
        }
        if !self.has_root_best {
            return;
        }
        let elapsed = self.start.elapsed();
        if let Some(soft) = self.budget.soft
            && elapsed > soft + soft / 2
        {
            self.interrupt = Some(Interrupt::TimedOut);
            return;
        }
        if let Some(flag) = self.budget.flag
            && elapsed >= flag
        {
            self.interrupt = Some(Interrupt::TimedOut);
        }
    }

    /// Between iterations: start another depth only while the soft deadline
    /// has not passed.
    pub fn may_deepen(&self) -> bool {
        match self.budget.soft {
            Some(soft) => self.start.elapsed() < soft,
            None => true,
        }
    }
}

/// Alpha-beta window. Negation flips it for the negamax recursion; the
/// widen operations implement aspiration-window recovery: double the window
/// on a miss until it is big, then give up and open that side to infinity.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub alpha: i32,
    pub beta: i32,
}

impl Window {
    pub fn full() -> Window {
        Window {
            alpha: -SCORE_INF,
            beta: SCORE_INF,
        }
    }

    pub fn aspiration(score: i32, half_width: i32) -> Window {
        Window {
            alpha: (score - half_width).max(-SCORE_INF),
            beta: (score + half_width).min(SCORE_INF),
        }
    }

    /// Failed low: widen alpha downwards, and pull beta in since we are
    /// unlikely to fail high next try.
    pub fn widen_low(&mut self) {
        let width = self.beta - self.alpha;
        self.beta -= width / 2;
        self.alpha = if width > 200 {
            -SCORE_INF
        } else {
            (self.alpha - width).max(-SCORE_INF)
        };
        debug_assert!(self.alpha < self.beta);
    }

    /// Failed high: the mirror image.
    pub fn widen_high(&mut self) {
        let width = self.beta - self.alpha;
        self.alpha += width / 2;
        self.beta = if width > 200 {
            SCORE_INF
        } else {
            (self.beta + width).min(SCORE_INF)
        };
        debug_assert!(self.alpha < self.beta);
    }
}

/// Everything the facade needs back from one search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub best: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
    pub interrupt: Option<Interrupt>,
}

/// Repetition along the current search line or the applied game record.
/// Hashes can only match with the same side to move, so stepping the path
/// in single plies is safe but pointless; pairs suffice.
fn is_repetition(ctx: &SearchContext, hash: u64, ply: usize) -> bool {
    let reach = ctx.fifty[ply] as usize;
    let mut back = 2;
    while back <= ply && back <= reach {
        if ctx.path_hashes[ply - back] == hash {
            return true;
        }
        back += 2;
    }
    ctx.game_hashes.contains(&hash)
}

struct Searcher<'a, 'b> {
    tables: &'a AttackTables,
    tt: &'a mut TranspositionTable,
    ctx: &'a mut SearchContext,
    time: TimeManager<'b>,
    options: SearchOptions,
}

impl Searcher<'_, '_> {
    /// Recursive negamax. `limit` is the current depth horizon measured in
    /// plies from root; it shrinks when a forced mate is found so siblings
    /// do not search past the mate distance.
    #[allow(clippy::too_many_arguments)]
    fn alpha_beta(
        &mut self,
        board: &mut Board,
        mut alpha: i32,
        beta: i32,
        ply: usize,
        mut limit: i32,
    ) -> (i32, Option<Move>) {
        self.ctx.nodes += 1;
        if self.ctx.nodes % YIELD_INTERVAL == 0 {
            self.time.tick(self.ctx.nodes);
        }
        if self.time.stopped() {
            return (0, None);
        }

        self.ctx.path_hashes[ply] = board.zobrist;
        if self.ctx.at_break_line(ply) {
            debug!(target: "search", ply, fen = %board.to_fen(), "break line reached");
        }

        if ply > 0 {
            if self.ctx.fifty[ply] >= 100 {
                return (SCORE_DRAW, None);
            }
            if is_repetition(self.ctx, board.zobrist, ply) {
                return (SCORE_DRAW, None);
            }
        }

        if ply as i32 >= limit {
            return (self.quiescence(board, alpha, beta, ply, 0), None);
        }

        let remaining = (limit - ply as i32).clamp(0, 127) as u8;
        let hash = board.zobrist;

        // transposition probe: a deep-enough hit can answer the node; any
        // hit seeds move ordering
        let mut tt_digest = 0u16;
        if let Some(hit) = self.tt.probe(hash, remaining) {
            tt_digest = hit.move_digest();
            if ply > 0 {
                let score = hit.score(ply as i32);
                match hit.bound() {
                    Bound::Exact => return (score, None),
                    Bound::Lower if score >= beta => return (score, None),
                    Bound::Upper if score <= alpha => return (score, None),
                    _ => {}
                }
            }
        } else if let Some(hit) = self.tt.probe(hash, 0) {
            tt_digest = hit.move_digest();
        }

        let checked = in_check(board, board.side_to_move, self.tables);

        // null move: hand the opponent a free shot with a reduced window;
        // if even that fails high we can cut. Worthless in positions where
        // every move loses ground, so keep material on the board.
        if self.options.null_move
            && ply > 0
            && !checked
            && remaining >= 3
            && beta < SCORE_INF
            && board.has_major_pieces(board.side_to_move)
        {
            let reduction = if remaining > 6 { 3 } else { 2 };
            let undo = make_null(board);
            self.ctx.fifty[ply + 1] = self.ctx.fifty[ply] + 1;
            let (value, _) =
                self.alpha_beta(board, -beta, -beta + 1, ply + 1, limit - reduction);
            undo_null(board, undo);
            let score = -value;
            if !self.time.stopped() && score >= beta && !is_mate_score(score) {
                return (beta, None);
            }
        }

        // frontier futility: when the static score is hopeless, quiet moves
        // one ply from the horizon cannot save the node
        let futile = self.options.futility
            && remaining == 1
            && !checked
            && presort_eval(
                board,
                self.tables,
                &self.ctx.weights,
                self.ctx.jitter_seed,
                None,
            ) + FUTILITY_MARGIN
                <= alpha;

        let mut picker = MovePicker::new(tt_digest, self.ctx.killers[ply], false);
        let original_alpha = alpha;
        let mut best_score = -SCORE_INF;
        let mut best_move: Option<Move> = None;
        let mut searched = 0usize;

        while let Some(mv) = picker.next(board, self.tables, self.ctx) {
            if futile && searched > 0 && !mv.is_capture() && !mv.is_promotion() {
                searched += 1;
                continue;
            }

            self.ctx.path_moves[ply] = mv.digest();
            self.ctx.fifty[ply + 1] = if mv.is_irreversible() {
                0
            } else {
                self.ctx.fifty[ply] + 1
            };

            let mut applied = mv;
            make_move(board, &mut applied);

            // first move gets the full window; the rest get a zero-window
            // probe, re-searched only when they beat alpha
            let score = if searched == 0 {
                -self.alpha_beta(board, -beta, -alpha, ply + 1, limit).0
            } else {
                let probe = -self
                    .alpha_beta(board, -alpha - 1, -alpha, ply + 1, limit)
                    .0;
                if probe > alpha && beta - alpha > 1 && !self.time.stopped() {
                    -self.alpha_beta(board, -beta, -alpha, ply + 1, limit).0
                } else {
                    probe
                }
            };

            undo_move(board, applied);
            searched += 1;

            if self.time.stopped() {
                return (0, None);
            }

            if score > best_score {
                best_score = score;
                best_move = Some(applied);
            }
            if score > alpha {
                alpha = score;
                // a forced mate bounds how deep anything else can matter
                if is_mate_score(score) && score > 0 {
                    limit = limit.min(mate_distance(score));
                }
            }
            if score >= beta {
                self.tt
                    .save(hash, applied.digest(), score, ply as i32, remaining, Bound::Lower);
                if !applied.is_capture() {
                    self.ctx.update_killer(ply, applied);
                    self.ctx.update_history(applied, remaining as i32);
                }
                return (score, Some(applied));
            }
        }

        if searched == 0 {
            // no legal move: mate if attacked, otherwise stalemate
            return if checked {
                (-(SCORE_MATE - ply as i32), None)
            } else {
                (SCORE_DRAW, None)
            };
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        let digest = best_move.map_or(0, |m| m.digest());
        self.tt
            .save(hash, digest, best_score, ply as i32, remaining, bound);

        (best_score, best_move)
    }

    /// Noisy-only search below the horizon. Stand-pat is the value of not
    /// capturing: the side to move may decline, so it is a tight lower
    /// bound.
    fn quiescence(&mut self, board: &mut Board, mut alpha: i32, beta: i32, ply: usize, qdepth: i32) -> i32 {
        self.ctx.nodes += 1;
        if self.ctx.nodes % YIELD_INTERVAL == 0 {
            self.time.tick(self.ctx.nodes);
        }
        if self.time.stopped() {
            return 0;
        }

        let hash = board.zobrist;
        if let Some(hit) = self.tt.probe(hash, 0) {
            let score = hit.score(ply as i32);
            match hit.bound() {
                Bound::Exact => return score,
                Bound::Lower if score >= beta => return score,
                Bound::Upper if score <= alpha => return score,
                _ => {}
            }
        }

        let stand_pat = static_eval(board, self.tables, &self.ctx.weights, self.ctx.jitter_seed);
        if stand_pat >= beta {
            self.tt.save(hash, 0, stand_pat, ply as i32, 0, Bound::Lower);
            return stand_pat;
        }
        let original_alpha = alpha;
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        let mut best_score = stand_pat;
        let mut best_move: Option<Move> = None;

        // captures are finite, but promotions and mutual captures can spin
        // out; a hard cap bounds the tail
        if qdepth >= QUIESCE_CAP || ply >= MAX_PLY - 1 {
            return stand_pat;
        }

        let mut picker = MovePicker::new(0, [None; 2], true);
        while let Some(mv) = picker.next(board, self.tables, self.ctx) {
            let mut applied = mv;
            make_move(board, &mut applied);
            let score = -self.quiescence(board, -beta, -alpha, ply + 1, qdepth + 1);
            undo_move(board, applied);

            if self.time.stopped() {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(applied);
            }
            if score > alpha {
                alpha = score;
            }
            if score >= beta {
                self.tt
                    .save(hash, applied.digest(), score, ply as i32, 0, Bound::Lower);
                return score;
            }
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        let digest = best_move.map_or(0, |m| m.digest());
        self.tt.save(hash, digest, best_score, ply as i32, 0, bound);
        best_score
    }
}

/// Walk the table's exact entries from the current position to recover the
/// principal variation. The visited flag on each entry breaks move cycles;
/// all marks are cleared and all moves undone before returning.
pub fn extract_pv(
    board: &mut Board,
    tables: &AttackTables,
    tt: &mut TranspositionTable,
    max_len: usize,
) -> Vec<Move> {
    use crate::moves::execute::is_legal_move;

    let mut pv: Vec<Move> = Vec::new();
    let mut marked: Vec<u64> = Vec::new();

    while pv.len() < max_len {
        let Some(entry) = tt.probe(board.zobrist, 0) else {
            break;
        };
        if entry.visited() || entry.move_digest() == 0 {
            break;
        }
        let Some(mv) = reconstruct(board, tables, entry.move_digest()) else {
            break;
        };
        if !is_legal_move(board, tables, mv) {
            break;
        }
        tt.mark_visited(board.zobrist, true);
        marked.push(board.zobrist);

        let mut applied = mv;
        make_move(board, &mut applied);
        pv.push(applied);
    }

    for &mv in pv.iter().rev() {
        undo_move(board, mv);
    }
    for hash in marked {
        tt.mark_visited(hash, false);
    }
    pv
}

/// Iterative-deepening driver: run depths 2, 3, ... inside aspiration
/// windows, committing a best move after each completed depth, until the
/// budget runs out, a mate is found, or the host cancels.
#[allow(clippy::too_many_arguments)]
pub fn iterate(
    board: &mut Board,
    tables: &AttackTables,
    tt: &mut TranspositionTable,
    ctx: &mut SearchContext,
    options: SearchOptions,
    limits: &SearchLimits,
    hook: Option<&mut dyn FnMut() -> bool>,
) -> SearchReport {
    tt.new_search();

    let budget = TimeBudget::plan(limits, board.material_total());
    let time = TimeManager::new(budget, hook);
    let max_depth = limits.depth.unwrap_or((MAX_PLY - 2) as i32).max(1);

    let mut searcher = Searcher {
        tables,
        tt: &mut *tt,
        ctx: &mut *ctx,
        time,
        options,
    };

    let mut best: Option<(Move, i32)> = None;
    let mut window = Window::full();
    let mut depth = 2.min(max_depth);
    let mut completed_depth = 0;

    loop {
        let (score, mv) = searcher.alpha_beta(board, window.alpha, window.beta, 0, depth);

        if let Some(interrupt) = searcher.time.interrupt {
            if interrupt == Interrupt::Canceled {
                best = None;
            }
            break;
        }

        if score <= window.alpha {
            window.widen_low();
            continue;
        }
        if score >= window.beta {
            window.widen_high();
            continue;
        }

        let Some(mv) = mv else {
            // no legal move at the root; nothing to search
            break;
        };
        best = Some((mv, score));
        completed_depth = depth;
        searcher.time.has_root_best = true;
        searcher.ctx.decay_history();

        debug!(
            target: "search",
            depth,
            score,
            nodes = searcher.ctx.nodes,
            best = %mv,
            "iteration complete"
        );

        if is_mate_score(score) {
            break;
        }
        if depth >= max_depth {
            break;
        }
        if !searcher.time.may_deepen() {
            break;
        }
        window = Window::aspiration(score, ASPIRATION_WINDOW);
        depth += 1;
    }

    let interrupt = searcher.time.interrupt;
    let elapsed = searcher.time.elapsed();
    let nodes = searcher.ctx.nodes;

    let pv = match best {
        Some((mv, _)) => {
            let mut pv = extract_pv(board, tables, tt, completed_depth.max(1) as usize);
            if pv.is_empty() || !pv[0].same_move(mv) {
                pv = vec![mv];
            }
            pv
        }
        None => Vec::new(),
    };

    SearchReport {
        best: best.map(|(mv, _)| mv),
        score: best.map_or(0, |(_, s)| s),
        depth: completed_depth,
        nodes,
        elapsed,
        pv,
        interrupt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_widens_then_gives_up() {
        let mut w = Window::aspiration(100, 20);
        assert_eq!((w.alpha, w.beta), (80, 120));
        w.widen_low();
        assert_eq!(w.beta, 100);
        assert_eq!(w.alpha, 40);

        // repeated misses double the window until it opens to infinity
        let mut rounds = 0;
        while w.alpha > -SCORE_INF {
            w.widen_low();
            rounds += 1;
            assert!(rounds < 8, "window never gave up");
        }
        assert!(w.alpha < w.beta);

        let mut w = Window::aspiration(0, 20);
        let mut rounds = 0;
        while w.beta < SCORE_INF {
            w.widen_high();
            rounds += 1;
            assert!(rounds < 8, "window never gave up");
        }
        assert!(w.alpha < w.beta);
    }

    #[test]
    fn budget_plan_interpolates_moves_remaining() {
        // full board: 50 moves to plan for
        let limits = SearchLimits {
            clock: Some(Duration::from_secs(500)),
            ..Default::default()
        };
        let budget = TimeBudget::plan(&limits, 7800);
        assert_eq!(budget.soft, Some(Duration::from_secs(10)));

        // bare-ish board: 10 moves to plan for
        let budget = TimeBudget::plan(&limits, 200);
        assert_eq!(budget.soft, Some(Duration::from_secs(50)));

        let budget = TimeBudget::plan(&limits, 0);
        assert_eq!(budget.soft, Some(Duration::from_secs(50)));
    }

    #[test]
    fn movetime_overrides_clock_planning() {
        let limits = SearchLimits {
            movetime: Some(Duration::from_millis(1500)),
            clock: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        let budget = TimeBudget::plan(&limits, 7800);
        assert_eq!(budget.soft, Some(Duration::from_millis(1500)));
        assert_eq!(budget.flag, None);
    }

    #[test]
    fn cancel_hook_raises_one_way_flag() {
        // cancel exactly on the first yield; later calls say "keep going"
        let mut calls = 0u32;
        let mut hook = move || {
            calls += 1;
            calls == 1
        };
        let mut time = TimeManager::new(TimeBudget::default(), Some(&mut hook));
        time.tick(YIELD_INTERVAL);
        assert_eq!(time.interrupt, Some(Interrupt::Canceled));
        // the flag is one-way: it survives a hook that no longer cancels
        time.tick(2 * YIELD_INTERVAL);
        assert_eq!(time.interrupt, Some(Interrupt::Canceled));
    }
}
