use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::board::{Move, Position};
use crate::evaluation::evaluate;
use crate::movegen::{order_captures, order_moves};
use crate::time::TimeManager;
use crate::tt::{TTFlag, TranspositionTable};
use crate::types::{Score, SearchResult, DEFAULT_HASH_MB, HISTORY_MAX, MAX_PLY, SCORE_INFINITY, SCORE_MATE};

/// Mutable search state shared across recursion, and across `go` commands within one UCI
/// session — the transposition table and history heuristics persist between searches and are
/// only cleared by `ucinewgame`, not by `reset()`.
pub struct SearchState {
    pub nodes: u64,
    pub start_time: Instant,
    pub stop: Arc<AtomicBool>,
    pub time_manager: TimeManager,
    pub killers: [[Option<Move>; 2]; MAX_PLY],
    pub history: [[Score; 64]; 6],
    pub tt: TranspositionTable,
    pub root_best_move: Option<Move>,
    /// suppresses the `info ...` lines printed during iterative deepening. UCI output is the
    /// protocol wire, so anything driving a search outside of `uci::run` (benches, tests) wants
    /// this on to avoid polluting stdout or skewing timings with I/O.
    pub silent: bool,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            nodes: 0,
            start_time: Instant::now(),
            stop: Arc::new(AtomicBool::new(false)),
            time_manager: TimeManager::unbounded(),
            killers: [[None; 2]; MAX_PLY],
            history: [[0; 64]; 6],
            tt: TranspositionTable::new(DEFAULT_HASH_MB),
            root_best_move: None,
            silent: false,
        }
    }

    /// Reset per-search state ahead of a new `go` command. Does NOT touch the transposition
    /// table — that persists across searches within a game and is cleared only by
    /// `ucinewgame`.
    pub fn reset(&mut self) {
        self.nodes = 0;
        self.stop.store(false, Ordering::SeqCst);
        self.killers = [[None; 2]; MAX_PLY];
        self.history = [[0; 64]; 6];
        self.start_time = Instant::now();
        self.root_best_move = None;
    }

    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = TranspositionTable::new(mb);
    }

    fn check_time(&self) {
        if self.time_manager.is_timeout() {
            self.stop.store(true, Ordering::Relaxed);
        }
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the principal variation by following the TT best-move chain from `pos`, applying and
/// undoing moves on a scratch clone so the caller's position is left untouched.
fn extract_pv(pos: &Position, tt: &TranspositionTable, max_moves: usize) -> Vec<Move> {
    let mut pv = Vec::new();
    let mut scratch = pos.clone();
    let mut seen: Vec<u64> = Vec::new();

    for _ in 0..max_moves {
        let hash = scratch.hash();
        if seen.contains(&hash) {
            break;
        }
        seen.push(hash);

        let Some(entry) = tt.probe(hash) else { break };
        let Some(mv) = entry.best_move else { break };
        if !scratch.is_legal(mv) {
            break;
        }
        pv.push(mv);
        scratch.apply_move(mv);
    }

    pv
}

/// Format a score for UCI output (centipawns or mate-in-N).
pub fn format_score(score: Score) -> String {
    if score.abs() > SCORE_MATE - 100 {
        let mate_ply = SCORE_MATE - score.abs();
        let mate_moves = (mate_ply + 1) / 2;
        if score > 0 {
            format!("score mate {}", mate_moves)
        } else {
            format!("score mate -{}", mate_moves)
        }
    } else {
        format!("score cp {}", score)
    }
}

/// Iterative deepening search from `pos`. Mutates `pos` during search but always leaves it
/// restored to its original state on return.
pub fn search(pos: &mut Position, state: &mut SearchState, max_depth: u8) -> SearchResult {
    // negamax reaches ply == depth - 1 while depth > 0 (quiescence takes over and self-guards
    // from there), so depth must not exceed MAX_PLY or `state.killers[ply]` indexes out of
    // bounds. `go depth N` is u8 and can request up to 255.
    let max_depth = max_depth.min(MAX_PLY as u8);

    let mut best_move: Option<Move> = None;
    let mut best_score: Score = -SCORE_INFINITY;

    for depth in 1..=max_depth {
        let iteration_start = Instant::now();
        state.nodes = 0;
        state.root_best_move = None;
        let score = negamax(pos, state, depth, 0, -SCORE_INFINITY, SCORE_INFINITY, true);

        if state.is_stopped() {
            if best_move.is_none() {
                best_move = state.root_best_move;
            }
            break;
        }

        best_score = score;
        if let Some(mv) = state.root_best_move {
            best_move = Some(mv);
        }

        let elapsed_ms = state.start_time.elapsed().as_millis().max(1) as u64;
        tracing::debug!(depth, nodes = state.nodes, score = best_score, elapsed_ms, "completed iteration");

        if !state.silent {
            let nps = state.nodes * 1000 / elapsed_ms;
            let pv = extract_pv(pos, &state.tt, depth as usize);
            let pv_str: String = pv.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(" ");
            let score_str = format_score(best_score);
            println!(
                "info depth {} {} nodes {} time {} nps {} pv {}",
                depth, score_str, state.nodes, elapsed_ms, nps, pv_str
            );
        }

        let iteration_ms = iteration_start.elapsed().as_millis() as u64;
        if !state.time_manager.has_time_for_next_iteration(iteration_ms) {
            break;
        }

        // forced mate found: no point searching deeper than the mate itself
        if best_score.abs() > SCORE_MATE - 100 {
            break;
        }
    }

    SearchResult { best_move, score: best_score, depth: max_depth, nodes: state.nodes }
}

/// Negamax with alpha-beta pruning, transposition table, null-move pruning, and late move
/// reductions.
fn negamax(
    pos: &mut Position,
    state: &mut SearchState,
    depth: u8,
    ply: usize,
    mut alpha: Score,
    beta: Score,
    can_null: bool,
) -> Score {
    state.nodes += 1;
    if state.nodes & 1023 == 0 {
        state.check_time();
    }
    if state.is_stopped() {
        return 0;
    }

    if ply > 0 && pos.is_repetition(3) {
        return 0;
    }

    if depth == 0 {
        return quiescence(pos, state, ply, alpha, beta);
    }

    let hash = pos.hash();
    let mut hash_move: Option<Move> = None;

    if let Some(entry) = pos_tt_probe(state, hash) {
        hash_move = entry.best_move;
        if entry.depth >= depth {
            if let Some(score) = TranspositionTable::retrieve_score(entry, ply, alpha, beta) {
                return score;
            }
        }
    }

    let in_check = pos.in_check();

    // null move pruning: "if I skip my turn and still beat beta, my real position must be even
    // better." Skipped in check (can't pass while in check), near the root, at shallow depth,
    // and in pawn-and-king-only endgames where zugzwang makes the assumption unsound.
    if can_null && !in_check && depth >= 3 && ply > 0 && pos.has_non_pawn_material(pos.side_to_move()) && pos.apply_null_move()
    {
        let score = -negamax(pos, state, depth - 3, ply + 1, -beta, -beta + 1, false);
        pos.undo_null_move();

        if state.is_stopped() {
            return 0;
        }
        if score >= beta {
            return beta;
        }
    }

    let moves = order_moves(pos, hash_move, &state.killers[ply], &state.history);

    if moves.is_empty() {
        return if in_check { -SCORE_MATE + ply as Score } else { 0 };
    }

    let mut best_score = -SCORE_INFINITY;
    let mut best_move: Option<Move> = None;
    let original_alpha = alpha;

    for (move_num, scored_move) in moves.iter().enumerate() {
        let mv = scored_move.mv;
        let is_capture = mv.is_capture();

        pos.apply_move(mv);
        let gives_check = pos.in_check();

        // LMR: reduce depth for late, quiet, non-check moves — they are unlikely to be best, so
        // search them shallowly first and only re-search at full depth if they beat alpha.
        let do_lmr = move_num >= 3
            && depth >= 3
            && !is_capture
            && !in_check
            && !gives_check
            && Some(mv) != state.killers[ply][0]
            && Some(mv) != state.killers[ply][1];

        let score = if do_lmr {
            let reduced = -negamax(pos, state, depth - 2, ply + 1, -alpha - 1, -alpha, true);
            if reduced > alpha {
                -negamax(pos, state, depth - 1, ply + 1, -beta, -alpha, true)
            } else {
                reduced
            }
        } else {
            -negamax(pos, state, depth - 1, ply + 1, -beta, -alpha, true)
        };

        pos.undo_move();

        if state.is_stopped() {
            return best_score;
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            if ply == 0 {
                state.root_best_move = Some(mv);
            }
        }

        if score > alpha {
            alpha = score;
        }

        if alpha >= beta {
            tracing::trace!(ply, move_num, mv = %mv, "beta cutoff");
            if !is_capture && ply < MAX_PLY {
                state.killers[ply][1] = state.killers[ply][0];
                state.killers[ply][0] = Some(mv);

                let pi = mv.moving().to_index();
                let to = mv.to().to_index();
                state.history[pi][to] += (depth as Score) * (depth as Score);
                if state.history[pi][to] > HISTORY_MAX {
                    state.history[pi][to] = HISTORY_MAX;
                }
            }
            break;
        }
    }

    let flag = if best_score >= beta {
        TTFlag::LowerBound
    } else if best_score <= original_alpha {
        TTFlag::UpperBound
    } else {
        TTFlag::Exact
    };

    state.tt.store(hash, depth, best_score, flag, best_move, ply);

    best_score
}

fn pos_tt_probe(state: &SearchState, hash: u64) -> Option<crate::tt::TTEntry> {
    state.tt.probe(hash).copied()
}

/// Quiescence search: explores captures (and all moves when in check) to avoid evaluating a
/// position mid-exchange.
fn quiescence(pos: &mut Position, state: &mut SearchState, ply: usize, mut alpha: Score, beta: Score) -> Score {
    state.nodes += 1;

    if ply >= MAX_PLY {
        return evaluate(pos);
    }

    if ply > 0 && pos.is_repetition(3) {
        return 0;
    }

    let in_check = pos.in_check();

    if in_check {
        // standing pat is illegal while in check; every legal move must be searched
        let killers = state.killers[ply];
        let moves = order_moves(pos, None, &killers, &state.history);

        if moves.is_empty() {
            return -SCORE_MATE + ply as Score;
        }

        let mut best_score: Score = -SCORE_INFINITY;
        for scored_move in &moves {
            pos.apply_move(scored_move.mv);
            let score = -quiescence(pos, state, ply + 1, -beta, -alpha);
            pos.undo_move();

            if state.is_stopped() {
                return best_score;
            }
            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                return best_score;
            }
        }

        return best_score;
    }

    let stand_pat = evaluate(pos);
    let mut best_score = stand_pat;

    if stand_pat >= beta {
        return best_score;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let captures = order_captures(pos);

    for scored_move in &captures {
        pos.apply_move(scored_move.mv);
        let score = -quiescence(pos, state, ply + 1, -beta, -alpha);
        pos.undo_move();

        if state.is_stopped() {
            return best_score;
        }
        if score > best_score {
            best_score = score;
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            return best_score;
        }
    }

    best_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn init() {
        crate::board::init();
    }

    fn silent_state() -> SearchState {
        let mut s = SearchState::new();
        s.silent = true;
        s
    }

    #[test]
    fn test_search_finds_move() {
        init();
        let mut pos = Position::default();
        let mut state = silent_state();
        let result = search(&mut pos, &mut state, 3);
        assert!(result.best_move.is_some());
    }

    #[test]
    fn test_search_finds_mate_in_one() {
        init();
        let mut pos =
            Position::from_str("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4").unwrap();
        let mut state = silent_state();
        let result = search(&mut pos, &mut state, 2);
        let best = result.best_move.unwrap();
        assert_eq!(best.to_string(), "h5f7", "expected Qxf7# but got {}", best);
    }

    #[test]
    fn test_search_avoids_giving_material() {
        init();
        let mut pos = Position::default();
        let mut state = silent_state();
        let result = search(&mut pos, &mut state, 4);
        assert!(result.best_move.is_some());
        assert!(result.nodes > 0);
    }

    #[test]
    fn test_checkmate_score() {
        init();
        let mut pos =
            Position::from_str("rnbqkbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        let mut state = silent_state();
        let score = negamax(&mut pos, &mut state, 1, 0, -SCORE_INFINITY, SCORE_INFINITY, true);
        assert!(score < -SCORE_MATE + 200, "checkmate score should be very negative, got {}", score);
    }

    #[test]
    fn test_tt_reduces_nodes_on_second_search() {
        init();
        let mut pos = Position::default();
        let mut state = silent_state();

        search(&mut pos, &mut state, 4);
        let nodes_first = state.nodes;

        state.reset();
        search(&mut pos, &mut state, 4);
        let nodes_second = state.nodes;

        assert!(
            nodes_second <= nodes_first,
            "second search ({} nodes) should use <= first ({} nodes) with a warm TT",
            nodes_second,
            nodes_first
        );
    }

    #[test]
    fn test_reset_does_not_clear_tt() {
        init();
        let mut pos = Position::default();
        let mut state = silent_state();
        search(&mut pos, &mut state, 3);
        assert!(state.tt.probe(pos.hash()).is_some());
        state.reset();
        assert!(state.tt.probe(pos.hash()).is_some(), "reset() must not clear the transposition table");
    }

    #[test]
    fn test_draw_detection_repetition() {
        init();
        let mut pos = Position::default();
        let g1 = crate::board::Square::new(6);
        let f3 = crate::board::Square::new(21);
        let g8 = crate::board::Square::new(62);
        let f6 = crate::board::Square::new(45);
        for _ in 0..2 {
            pos.apply_move(Move::quiet(g1, f3, crate::board::Piece::Knight));
            pos.apply_move(Move::quiet(g8, f6, crate::board::Piece::Knight));
            pos.apply_move(Move::quiet(f3, g1, crate::board::Piece::Knight));
            pos.apply_move(Move::quiet(f6, g8, crate::board::Piece::Knight));
        }
        let mut state = silent_state();
        let score = negamax(&mut pos, &mut state, 3, 1, -SCORE_INFINITY, SCORE_INFINITY, true);
        assert_eq!(score, 0, "threefold repetition should score as a draw, got {}", score);
    }

    #[test]
    fn test_quiescence_in_check_finds_mate() {
        init();
        let mut pos =
            Position::from_str("rnbqkbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        let mut state = silent_state();
        let score = quiescence(&mut pos, &mut state, 0, -SCORE_INFINITY, SCORE_INFINITY);
        assert!(score < -SCORE_MATE + 200, "checkmate in qsearch should return a mate score, got {}", score);
    }

    #[test]
    fn test_stop_preserves_best_move() {
        init();
        let mut pos = Position::default();
        let mut state = silent_state();
        state.time_manager = TimeManager::fixed(0);
        let result = search(&mut pos, &mut state, 20);
        assert!(result.best_move.is_some(), "should find a move even when stopped almost immediately");
    }

    #[test]
    fn test_pv_extraction() {
        init();
        let mut pos = Position::default();
        let mut state = silent_state();
        search(&mut pos, &mut state, 4);
        let pv = extract_pv(&pos, &state.tt, 4);
        assert!(!pv.is_empty(), "PV should contain at least one move after search");
    }

    #[test]
    fn test_mate_score_format() {
        assert_eq!(format_score(SCORE_MATE - 1), "score mate 1");
        assert_eq!(format_score(SCORE_MATE - 3), "score mate 2");
        assert_eq!(format_score(-(SCORE_MATE - 1)), "score mate -1");
        assert_eq!(format_score(-(SCORE_MATE - 3)), "score mate -2");
        assert_eq!(format_score(100), "score cp 100");
        assert_eq!(format_score(-50), "score cp -50");
    }
}
