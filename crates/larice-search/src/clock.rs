//! Adaptive per-move deadline controller.
//!
//! Converts clock state (remaining time, increment, mode) and live search
//! telemetry into a deadline, arms a one-shot expiry timer, and answers
//! "has the budget expired" / "how much budget remains". One instance per
//! ongoing move, updated by whichever thread aggregates telemetry; nothing
//! here fails; out-of-range inputs are clamped, not rejected.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use larice_core::Color;

use crate::options::Options;
use crate::timer::ExpiryTimer;

/// Search depth below which the ideal slice is not yet trusted.
const MINIMUM_DEPTH: u32 = 3;

/// Deadline when no clock information is available at all.
const FALLBACK_DEADLINE_MS: i64 = 5000;

/// Qualitative signal: is the search converging on a better answer?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trend {
    Improving,
    #[default]
    NotImproving,
}

/// Telemetry the search loop reports between iterations.
#[derive(Debug, Clone, Default)]
pub struct SearchProgress {
    /// Deepest completed iteration.
    pub depth: u32,
    /// Whether recent iterations are improving the best line.
    pub trend: Trend,
    /// Magnitude of the trend signal, 0.0 to 1.0.
    pub trend_degree: f32,
}

/// Per-move time allocation.
pub struct Clock {
    options: Arc<Options>,
    active: bool,
    times: [Option<i64>; Color::COUNT],
    increments: [Option<i64>; Color::COUNT],
    move_time: Option<i64>,
    infinite: bool,
    on_the_clock: Color,
    started: Instant,
    /// Milliseconds from `started`; `None` = unbounded.
    deadline: Option<i64>,
    /// Smoothed headroom for hard positions. Tracked across recalculations
    /// within one move; currently not folded into the deadline itself.
    trend_factor: i64,
    material_score: i32,
    progress: SearchProgress,
    timer: ExpiryTimer,
}

impl Clock {
    /// Create an inactive clock reading `MoveOverhead` from `options`.
    pub fn new(options: Arc<Options>) -> Clock {
        Clock {
            options,
            active: false,
            times: [None; Color::COUNT],
            increments: [None; Color::COUNT],
            move_time: None,
            infinite: false,
            on_the_clock: Color::White,
            started: Instant::now(),
            deadline: None,
            trend_factor: 0,
            material_score: 0,
            progress: SearchProgress::default(),
            timer: ExpiryTimer::new(),
        }
    }

    /// Return the remaining time for a side, if tracked.
    pub fn time(&self, army: Color) -> Option<i64> {
        self.times[army.index()]
    }

    /// Set the remaining time for a side, in milliseconds.
    pub fn set_time(&mut self, army: Color, ms: i64) {
        self.times[army.index()] = Some(ms);
    }

    /// Return the increment for a side, if tracked.
    pub fn increment(&self, army: Color) -> Option<i64> {
        self.increments[army.index()]
    }

    /// Set the increment for a side, in milliseconds.
    pub fn set_increment(&mut self, army: Color, ms: i64) {
        self.increments[army.index()] = Some(ms);
    }

    /// Switch fixed move-time mode on, in milliseconds.
    pub fn set_move_time(&mut self, ms: i64) {
        self.move_time = Some(ms);
    }

    /// Switch unbounded ("infinite") mode on or off.
    pub fn set_infinite(&mut self, infinite: bool) {
        self.infinite = infinite;
    }

    /// Feed the material score driving the remaining-game estimate.
    pub fn set_material_score(&mut self, score: i32) {
        self.material_score = score;
    }

    /// Return whether a deadline is currently being enforced.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start timing a move for `army`.
    ///
    /// Resets telemetry, restarts the elapsed timer, and computes a
    /// conservative initial deadline. Overwrites all prior deadline state.
    pub fn start_deadline(&mut self, army: Color) {
        self.active = true;
        self.progress = SearchProgress::default();
        self.on_the_clock = army;
        self.started = Instant::now();
        self.timer.cancel();
        self.calculate_deadline(false);
    }

    /// Recompute the deadline from fresh search telemetry.
    pub fn update_deadline(&mut self, progress: &SearchProgress, is_partial: bool) {
        self.progress = progress.clone();
        self.calculate_deadline(is_partial);
    }

    /// Milliseconds since the deadline was started.
    pub fn elapsed(&self) -> i64 {
        self.started.elapsed().as_millis() as i64
    }

    /// Return whether the budget has expired. Always `false` when unbounded.
    pub fn has_expired(&self) -> bool {
        match self.deadline {
            Some(deadline) => self.elapsed() > deadline,
            None => false,
        }
    }

    /// Milliseconds until the deadline, or `None` when unbounded.
    /// May go negative once the deadline has passed.
    pub fn time_to_deadline(&self) -> Option<i64> {
        self.deadline.map(|deadline| deadline - self.elapsed())
    }

    /// Return the smoothed trend factor.
    pub fn trend_factor(&self) -> i64 {
        self.trend_factor
    }

    /// Return whether the remaining budget has dipped under `MoveOverhead`,
    /// not enough room to safely start another unit of work.
    pub fn less_than_move_overhead(&self) -> bool {
        match self.time_to_deadline() {
            Some(remaining) => remaining < self.options.move_overhead(),
            None => false,
        }
    }

    /// Return whether more than `MoveOverhead` has already elapsed.
    pub fn past_move_overhead(&self) -> bool {
        self.elapsed() > self.options.move_overhead()
    }

    /// Register for the advisory expiry notification.
    pub fn subscribe(&self) -> mpsc::Receiver<()> {
        self.timer.subscribe()
    }

    /// Expected half-moves until the end of the game, from material.
    ///
    /// Heuristic from http://facta.junis.ni.ac.rs/acar/acar200901/acar2009-07.pdf
    fn expected_half_moves_till_eog(&self) -> i64 {
        let score = i64::from(self.material_score);
        let expected = if score < 20 {
            score + 10
        } else if score <= 60 {
            (0.375 * score as f64).round() as i64 + 22
        } else {
            (1.25 * score as f64).round() as i64 - 30
        };
        expected.max(1)
    }

    fn calculate_deadline(&mut self, _is_partial: bool) {
        if self.infinite {
            self.deadline = None;
            self.timer.cancel();
            trace!("deadline unbounded");
            return;
        }

        let overhead = self.options.move_overhead();
        let time = self.time(self.on_the_clock);
        let increment = self.increment(self.on_the_clock).unwrap_or(0);

        // Trend smoothing: headroom grows while the search is not improving,
        // bounded per update by a quarter of the safe remaining time, and
        // decays once it improves. Observable via trend_factor(); not folded
        // into the deadline below.
        let safe_remaining = time.map_or(0, |t| t - overhead);
        let adjustment =
            ((safe_remaining as f64 / 4.0) * f64::from(self.progress.trend_degree)).round() as i64;
        match self.progress.trend {
            Trend::NotImproving => self.trend_factor += adjustment,
            Trend::Improving => self.trend_factor /= 2,
        }
        self.trend_factor = self.trend_factor.max(0);

        let deadline = if let Some(move_time) = self.move_time {
            move_time - overhead
        } else if let Some(time) = time {
            let maximum = time - overhead;
            if self.progress.depth >= MINIMUM_DEPTH {
                let ideal = easing_curve(
                    time as f64 / self.expected_half_moves_till_eog() as f64 + increment as f64,
                )
                .round() as i64;
                maximum.min(ideal)
            } else {
                maximum
            }
        } else {
            FALLBACK_DEADLINE_MS
        };

        let deadline = deadline.max(0);
        self.deadline = Some(deadline);

        let remaining = (deadline - self.elapsed()).max(0);
        self.timer.arm(Duration::from_millis(remaining as u64));
        debug!(deadline, remaining, trend_factor = self.trend_factor, "deadline calculated");
    }
}

/// Identity by default; the experimental curve redistributes the slice
/// toward the middlegame.
#[cfg(not(feature = "experimental-easing"))]
#[inline]
fn easing_curve(x: f64) -> f64 {
    x
}

#[cfg(feature = "experimental-easing")]
#[inline]
fn easing_curve(x: f64) -> f64 {
    (std::f64::consts::PI * x).sin() * 0.5 + 0.5
}

#[cfg(test)]
mod tests {
    use super::{Clock, SearchProgress, Trend, FALLBACK_DEADLINE_MS};
    use crate::options::Options;
    use larice_core::Color;
    use std::sync::Arc;
    use std::time::Duration;

    fn clock_with_overhead(ms: i64) -> Clock {
        let options = Arc::new(Options::new());
        options.set_move_overhead(ms);
        Clock::new(options)
    }

    fn progress(depth: u32, trend: Trend, degree: f32) -> SearchProgress {
        SearchProgress {
            depth,
            trend,
            trend_degree: degree,
        }
    }

    #[test]
    fn inactive_clock_reports_no_deadline() {
        let clock = clock_with_overhead(100);
        assert!(!clock.is_active());
        assert!(!clock.has_expired());
        assert_eq!(clock.time_to_deadline(), None);
        assert!(!clock.less_than_move_overhead());
    }

    #[test]
    fn infinite_mode_is_unbounded() {
        let mut clock = clock_with_overhead(100);
        clock.set_infinite(true);
        clock.set_time(Color::White, 60_000);
        clock.start_deadline(Color::White);

        assert!(clock.is_active());
        assert_eq!(clock.time_to_deadline(), None);
        assert!(!clock.has_expired());
    }

    #[test]
    fn end_to_end_scenario_sixty_seconds_material_ten() {
        // 60000 ms remaining, no increment, depth threshold met, material 10:
        // expected half-moves = 10 + 10 = 20, ideal = 60000/20 = 3000,
        // deadline = min(60000 - 100, 3000) = 3000.
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::White, 60_000);
        clock.set_increment(Color::White, 0);
        clock.set_material_score(10);
        clock.start_deadline(Color::White);
        clock.update_deadline(&progress(3, Trend::NotImproving, 0.0), false);

        assert_eq!(clock.deadline, Some(3000));
    }

    #[test]
    fn below_minimum_depth_uses_the_full_safe_budget() {
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::Black, 60_000);
        clock.set_material_score(10);
        clock.start_deadline(Color::Black);

        // Telemetry reset on start: depth 0 < 3, so no ideal slice yet.
        assert_eq!(clock.deadline, Some(59_900));
    }

    #[test]
    fn increment_widens_the_ideal_slice() {
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::White, 60_000);
        clock.set_increment(Color::White, 2_000);
        clock.set_material_score(10);
        clock.start_deadline(Color::White);
        clock.update_deadline(&progress(5, Trend::NotImproving, 0.0), false);

        // ideal = 60000/20 + 2000 = 5000
        assert_eq!(clock.deadline, Some(5000));
    }

    #[test]
    fn move_time_overrides_everything() {
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::White, 60_000);
        clock.set_move_time(2_500);
        clock.set_material_score(10);
        clock.start_deadline(Color::White);
        clock.update_deadline(&progress(10, Trend::NotImproving, 0.0), false);

        assert_eq!(clock.deadline, Some(2_400));
    }

    #[test]
    fn untracked_clock_falls_back_to_fixed_deadline() {
        let mut clock = clock_with_overhead(100);
        clock.start_deadline(Color::White);
        assert_eq!(clock.deadline, Some(FALLBACK_DEADLINE_MS));
    }

    #[test]
    fn deadline_is_floored_at_zero() {
        let mut clock = clock_with_overhead(500);
        clock.set_move_time(100); // 100 - 500 overhead would go negative
        clock.start_deadline(Color::White);
        assert_eq!(clock.deadline, Some(0));
        assert!(clock.less_than_move_overhead());
    }

    #[test]
    fn trend_factor_grows_while_not_improving() {
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::White, 60_000);
        clock.start_deadline(Color::White);
        assert_eq!(clock.trend_factor(), 0);

        clock.update_deadline(&progress(4, Trend::NotImproving, 0.5), false);
        let first = clock.trend_factor();
        // (59900 / 4) * 0.5 rounded
        assert_eq!(first, 7_488);

        clock.update_deadline(&progress(5, Trend::NotImproving, 0.5), false);
        assert_eq!(clock.trend_factor(), 2 * first);
    }

    #[test]
    fn improving_trend_never_raises_the_factor() {
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::White, 60_000);
        clock.start_deadline(Color::White);

        clock.update_deadline(&progress(4, Trend::NotImproving, 0.8), false);
        let grown = clock.trend_factor();
        assert!(grown > 0);

        clock.update_deadline(&progress(5, Trend::Improving, 0.8), false);
        assert_eq!(clock.trend_factor(), grown / 2);

        clock.update_deadline(&progress(6, Trend::Improving, 0.8), false);
        assert_eq!(clock.trend_factor(), grown / 4);
    }

    #[test]
    fn trend_factor_is_floored_at_zero() {
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::White, 60_000);
        clock.start_deadline(Color::White);
        for _ in 0..10 {
            clock.update_deadline(&progress(5, Trend::Improving, 1.0), false);
        }
        assert_eq!(clock.trend_factor(), 0);
    }

    #[test]
    fn trend_factor_does_not_change_the_deadline() {
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::White, 60_000);
        clock.set_material_score(10);
        clock.start_deadline(Color::White);

        clock.update_deadline(&progress(5, Trend::NotImproving, 1.0), false);
        assert!(clock.trend_factor() > 0);
        // Deliberately unapplied: the deadline is still the plain ideal.
        assert_eq!(clock.deadline, Some(3000));
    }

    #[test]
    fn start_deadline_resets_telemetry() {
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::White, 60_000);
        clock.set_material_score(10);
        clock.start_deadline(Color::White);
        clock.update_deadline(&progress(9, Trend::NotImproving, 0.0), false);
        assert_eq!(clock.deadline, Some(3000));

        // Restart: depth drops back to 0, so the ideal slice is off again.
        clock.start_deadline(Color::White);
        assert_eq!(clock.deadline, Some(59_900));
    }

    #[test]
    fn expected_half_moves_branches() {
        let mut clock = clock_with_overhead(0);
        clock.set_material_score(10);
        assert_eq!(clock.expected_half_moves_till_eog(), 20);
        clock.set_material_score(0);
        assert_eq!(clock.expected_half_moves_till_eog(), 10);
        clock.set_material_score(40);
        assert_eq!(clock.expected_half_moves_till_eog(), 37); // 15 + 22
        clock.set_material_score(80);
        assert_eq!(clock.expected_half_moves_till_eog(), 70); // 100 - 30
    }

    #[test]
    fn per_army_times_are_independent() {
        let mut clock = clock_with_overhead(100);
        clock.set_time(Color::White, 60_000);
        clock.set_time(Color::Black, 5_000);
        clock.set_material_score(10);

        clock.start_deadline(Color::Black);
        clock.update_deadline(&progress(5, Trend::NotImproving, 0.0), false);
        // Black: ideal = 5000/20 = 250, maximum = 4900
        assert_eq!(clock.deadline, Some(250));
        assert_eq!(clock.time(Color::White), Some(60_000));
        assert_eq!(clock.increment(Color::Black), None);
    }

    #[test]
    fn expiry_notification_fires() {
        let mut clock = clock_with_overhead(0);
        let expiry = clock.subscribe();
        clock.set_move_time(20);
        clock.start_deadline(Color::White);
        expiry
            .recv_timeout(Duration::from_secs(2))
            .expect("expiry notification should fire after the deadline");
        assert!(clock.has_expired() || clock.time_to_deadline() == Some(0));
    }

    #[test]
    fn has_expired_flips_after_the_deadline() {
        let mut clock = clock_with_overhead(0);
        clock.set_move_time(10);
        clock.start_deadline(Color::White);
        assert!(!clock.has_expired() || clock.elapsed() > 10);
        std::thread::sleep(Duration::from_millis(30));
        assert!(clock.has_expired());
        assert!(clock.past_move_overhead());
    }
}
