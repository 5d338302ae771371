use std::time::Instant;

/// weight assigned to each move count (0-indexed, clamped to the last entry past move 37),
/// used to shape how much of the remaining clock is spent on the next move. Flat by design —
/// the source this was modeled on allocates evenly across the average 38-move game rather than
/// favoring the opening or the endgame.
const MOVE_WEIGHTS: [f64; 38] = [1.0; 38];

fn move_weights_total() -> f64 {
    MOVE_WEIGHTS.iter().sum()
}

/// Allocates a per-move time budget from the clock reported by the UCI `go` command, and
/// answers the two questions search needs during iterative deepening: has the current search
/// run out of time, and is there enough time left to trust another iteration.
pub struct TimeManager {
    start: Instant,
    move_time_ms: u64,
}

impl TimeManager {
    /// `remaining_ms`/`increment_ms` are the side to move's clock; `move_count` is the number of
    /// full moves played so far, used to index into `MOVE_WEIGHTS`.
    pub fn new(remaining_ms: u64, increment_ms: u64, move_count: u32) -> Self {
        let weight_idx = (move_count as usize).min(MOVE_WEIGHTS.len() - 1);
        let weight = MOVE_WEIGHTS[weight_idx] / move_weights_total();

        let remaining = remaining_ms as f64;
        let increment = increment_ms as f64;
        let move_time = remaining.min(0.5 * increment + 2.0 * remaining * weight);

        Self { start: Instant::now(), move_time_ms: move_time.max(0.0) as u64 }
    }

    /// A move-time-only budget (UCI `go movetime N`), bypassing the clock formula entirely.
    pub fn fixed(move_time_ms: u64) -> Self {
        Self { start: Instant::now(), move_time_ms }
    }

    /// No deadline at all — used for `go infinite` and fixed-depth searches.
    pub fn unbounded() -> Self {
        Self { start: Instant::now(), move_time_ms: 0 }
    }

    pub fn move_time_ms(&self) -> u64 {
        self.move_time_ms
    }

    /// Whether the allocated move time has elapsed. Leaves a cushion so the engine reports
    /// `bestmove` before a GUI-side clock would consider it overdue.
    pub fn is_timeout(&self) -> bool {
        if self.move_time_ms == 0 {
            return false;
        }
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        elapsed_ms + 100 >= self.move_time_ms
    }

    /// Whether to start another iterative-deepening iteration, given how long the last one took.
    /// Declines if the remaining time is under 5x the last iteration's duration — a rough but
    /// effective guard against starting an iteration that blows the budget halfway through.
    pub fn has_time_for_next_iteration(&self, last_iteration_ms: u64) -> bool {
        if self.move_time_ms == 0 {
            return true;
        }
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let remaining_ms = self.move_time_ms.saturating_sub(elapsed_ms);
        remaining_ms > 5 * last_iteration_ms.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_move_time_respected() {
        let tm = TimeManager::fixed(5000);
        assert_eq!(tm.move_time_ms(), 5000);
    }

    #[test]
    fn test_unbounded_never_times_out() {
        let tm = TimeManager::unbounded();
        assert!(!tm.is_timeout());
        assert!(tm.has_time_for_next_iteration(u64::MAX));
    }

    #[test]
    fn test_allocation_never_exceeds_remaining_clock() {
        let tm = TimeManager::new(1000, 0, 0);
        assert!(tm.move_time_ms() <= 1000);
    }

    #[test]
    fn test_increment_increases_allocation() {
        let no_inc = TimeManager::new(60_000, 0, 10);
        let with_inc = TimeManager::new(60_000, 2000, 10);
        assert!(with_inc.move_time_ms() > no_inc.move_time_ms());
    }

    #[test]
    fn test_late_move_count_clamped_to_last_weight() {
        let at_bound = TimeManager::new(60_000, 0, 37);
        let past_bound = TimeManager::new(60_000, 0, 200);
        assert_eq!(at_bound.move_time_ms(), past_bound.move_time_ms());
    }

    #[test]
    fn test_has_time_for_next_iteration_declines_when_close() {
        let tm = TimeManager::fixed(1000);
        // last iteration took as long as the entire budget -> 5x that can't possibly fit
        assert!(!tm.has_time_for_next_iteration(1000));
    }
}
