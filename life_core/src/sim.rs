// sim.rs - Simulation clock: run/pause scheduling and board mutations

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rand::thread_rng;
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::error::GridResult;
use crate::grid::Grid;
use crate::patterns::{self, Pattern};

/// Construction-time parameters for a simulation session.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub rows: usize,
    pub cols: usize,
    /// Cell density used by randomize
    pub alive_probability: f64,
    pub initial_interval_ms: u64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    /// Amount one speed-adjustment step moves the interval
    pub interval_step_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rows: 50,
            cols: 50,
            alive_probability: 0.2,
            initial_interval_ms: 1000,
            min_interval_ms: 100,
            max_interval_ms: 5000,
            interval_step_ms: 100,
        }
    }
}

/// The simulation clock and the single owner of the current board.
///
/// The latest [`Grid`] lives in a watch channel: mutations and ticks
/// publish new snapshots into it, and observers subscribe for change
/// notifications. While running, a tick task sleeps for the configured
/// interval, re-checks the running flag, then reads the latest board,
/// computes its successor and publishes it. Stopping only clears the
/// flag; the already-queued tick still fires and retires itself without
/// acting.
///
/// A user edit landing between a tick's read and its publish is
/// overwritten last-write-wins. That window is deliberate; no lock
/// spans it.
pub struct Simulation {
    shared: Arc<Shared>,
    handle: Handle,
}

struct Shared {
    config: SimConfig,
    grid_tx: watch::Sender<Grid>,
    running: AtomicBool,
    interval_ms: AtomicU64,
    // Bumped on every start; a tick task retires when its epoch is stale.
    epoch: AtomicU64,
    generation: AtomicU64,
}

impl Simulation {
    /// Creates a stopped simulation with an all-dead board.
    ///
    /// Captures the current tokio runtime handle for the tick task, so
    /// this must be called from within a runtime.
    pub fn new(config: SimConfig) -> Self {
        assert!(
            config.min_interval_ms <= config.max_interval_ms,
            "interval bounds are inverted"
        );
        let interval = config
            .initial_interval_ms
            .clamp(config.min_interval_ms, config.max_interval_ms);
        let (grid_tx, _) = watch::channel(Grid::empty(config.rows, config.cols));
        Self {
            shared: Arc::new(Shared {
                config,
                grid_tx,
                running: AtomicBool::new(false),
                interval_ms: AtomicU64::new(interval),
                epoch: AtomicU64::new(0),
                generation: AtomicU64::new(0),
            }),
            handle: Handle::current(),
        }
    }

    /// Starts the tick loop. No-op if already running.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!(
            "simulation started (interval {} ms)",
            self.shared.interval_ms.load(Ordering::SeqCst)
        );
        let shared = Arc::clone(&self.shared);
        self.handle.spawn(async move { shared.tick_loop(epoch).await });
    }

    /// Clears the running flag. The next queued tick observes it and
    /// ends the loop without computing or publishing a generation.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            log::info!("simulation stopped");
        }
    }

    /// Stores the interval, clamped to the configured bounds. Takes
    /// effect when the next tick is armed; a pending timer is not
    /// rescheduled.
    pub fn set_interval_ms(&self, ms: u64) {
        let cfg = &self.shared.config;
        let clamped = ms.clamp(cfg.min_interval_ms, cfg.max_interval_ms);
        self.shared.interval_ms.store(clamped, Ordering::SeqCst);
        log::debug!("tick interval set to {} ms", clamped);
    }

    /// Slows the clock down by one step, clamped at the upper bound.
    pub fn increase_interval(&self) {
        let current = self.shared.interval_ms.load(Ordering::SeqCst);
        self.set_interval_ms(current.saturating_add(self.shared.config.interval_step_ms));
    }

    /// Speeds the clock up by one step, clamped at the lower bound.
    pub fn decrease_interval(&self) {
        let current = self.shared.interval_ms.load(Ordering::SeqCst);
        self.set_interval_ms(current.saturating_sub(self.shared.config.interval_step_ms));
    }

    /// Flips one cell and publishes the edited board.
    pub fn toggle_cell(&self, row: usize, col: usize) -> GridResult<()> {
        let next = self.shared.grid_tx.borrow().toggled(row, col)?;
        self.shared.grid_tx.send_replace(next);
        Ok(())
    }

    /// Replaces the board with an all-dead one.
    pub fn clear(&self) {
        let cfg = &self.shared.config;
        self.shared.grid_tx.send_replace(Grid::empty(cfg.rows, cfg.cols));
        self.shared.generation.store(0, Ordering::SeqCst);
        log::debug!("board cleared");
    }

    /// Replaces the board with an independently random one at the
    /// configured density.
    pub fn randomize(&self) {
        let cfg = &self.shared.config;
        let board = Grid::random(cfg.rows, cfg.cols, cfg.alive_probability, &mut thread_rng());
        log::debug!("board randomized ({} cells alive)", board.alive_count());
        self.shared.grid_tx.send_replace(board);
        self.shared.generation.store(0, Ordering::SeqCst);
    }

    /// Replaces the board with a preset pattern.
    pub fn apply_pattern(&self, pattern: &Pattern) {
        let next = patterns::apply_pattern(&self.shared.grid_tx.borrow(), pattern);
        self.shared.grid_tx.send_replace(next);
        self.shared.generation.store(0, Ordering::SeqCst);
        log::debug!("pattern applied: {}", pattern.name);
    }

    /// The latest published board.
    pub fn snapshot(&self) -> Grid {
        self.shared.grid_tx.borrow().clone()
    }

    /// A receiver that observes every published board.
    pub fn subscribe(&self) -> watch::Receiver<Grid> {
        self.shared.grid_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn interval_ms(&self) -> u64 {
        self.shared.interval_ms.load(Ordering::SeqCst)
    }

    /// Generations computed since the last clear/randomize/pattern.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &SimConfig {
        &self.shared.config
    }
}

impl Shared {
    async fn tick_loop(self: Arc<Self>, epoch: u64) {
        loop {
            let delay = Duration::from_millis(self.interval_ms.load(Ordering::SeqCst));
            tokio::time::sleep(delay).await;

            // A queued tick fires, checks the flag, and only then acts.
            // The epoch check retires a stale loop after a stop/start
            // pair so at most one loop ever ticks.
            if !self.running.load(Ordering::SeqCst)
                || self.epoch.load(Ordering::SeqCst) != epoch
            {
                return;
            }

            let next = self.grid_tx.borrow().step();
            self.grid_tx.send_replace(next);
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            log::trace!("tick: generation {}", generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn test_config() -> SimConfig {
        SimConfig {
            rows: 25,
            cols: 25,
            ..SimConfig::default()
        }
    }

    fn place_blinker(sim: &Simulation) {
        sim.toggle_cell(12, 11).unwrap();
        sim.toggle_cell(12, 12).unwrap();
        sim.toggle_cell(12, 13).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_tick_leaves_board_unchanged() {
        let sim = Simulation::new(test_config());
        place_blinker(&sim);
        let before = sim.snapshot();

        sim.start();
        sim.stop();
        sleep(Duration::from_secs(30)).await;

        assert_eq!(sim.snapshot(), before);
        assert_eq!(sim.generation(), 0);
        assert!(!sim.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn running_clock_advances_one_generation_per_interval() {
        let sim = Simulation::new(test_config());
        place_blinker(&sim);

        sim.start();
        sleep(Duration::from_millis(1050)).await;
        assert_eq!(sim.generation(), 1);
        // The blinker flipped from horizontal to vertical
        assert!(sim.snapshot().is_alive(11, 12));
        assert!(sim.snapshot().is_alive(13, 12));
        assert!(!sim.snapshot().is_alive(12, 11));

        sleep(Duration::from_millis(1000)).await;
        assert_eq!(sim.generation(), 2);
        assert!(sim.snapshot().is_alive(12, 11));
        sim.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_takes_effect_at_the_next_tick_boundary() {
        let sim = Simulation::new(test_config());
        place_blinker(&sim);

        sim.start();
        sleep(Duration::from_millis(1050)).await;
        assert_eq!(sim.generation(), 1);

        sim.stop();
        let frozen = sim.snapshot();
        sleep(Duration::from_secs(60)).await;
        assert_eq!(sim.snapshot(), frozen);
        assert_eq!(sim.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_does_not_double_tick() {
        let sim = Simulation::new(test_config());
        place_blinker(&sim);

        sim.start();
        sim.start();
        sleep(Duration::from_millis(1050)).await;
        assert_eq!(sim.generation(), 1);
        sim.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_within_one_interval_leaves_a_single_loop() {
        let sim = Simulation::new(test_config());
        place_blinker(&sim);

        sim.start();
        sim.stop();
        sim.start();
        // Three intervals: exactly three generations, not six.
        sleep(Duration::from_millis(3050)).await;
        assert_eq!(sim.generation(), 3);
        sim.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn edits_while_running_feed_the_next_generation() {
        let sim = Simulation::new(test_config());
        sim.start();
        sleep(Duration::from_millis(1050)).await;
        // Board is still empty, the tick published another empty board
        assert_eq!(sim.snapshot().alive_count(), 0);

        place_blinker(&sim);
        sleep(Duration::from_millis(1000)).await;
        // The next tick read the edited board and stepped it
        assert!(sim.snapshot().is_alive(11, 12));
        assert!(sim.snapshot().is_alive(13, 12));
        sim.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_takes_effect_on_the_next_armed_tick() {
        let sim = Simulation::new(test_config());
        place_blinker(&sim);

        sim.start();
        sim.set_interval_ms(200);
        // The pending timer was armed at 1000 ms and is not rescheduled
        sleep(Duration::from_millis(950)).await;
        assert_eq!(sim.generation(), 0);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(sim.generation(), 1);
        // From here ticks arrive every 200 ms
        sleep(Duration::from_millis(450)).await;
        assert_eq!(sim.generation(), 3);
        sim.stop();
    }

    #[tokio::test]
    async fn interval_clamps_at_both_bounds() {
        let sim = Simulation::new(test_config());
        assert_eq!(sim.interval_ms(), 1000);

        sim.set_interval_ms(4900);
        sim.increase_interval();
        assert_eq!(sim.interval_ms(), 5000);
        sim.increase_interval();
        assert_eq!(sim.interval_ms(), 5000);

        sim.set_interval_ms(150);
        sim.decrease_interval();
        assert_eq!(sim.interval_ms(), 100);
        sim.decrease_interval();
        assert_eq!(sim.interval_ms(), 100);

        sim.set_interval_ms(999_999);
        assert_eq!(sim.interval_ms(), 5000);
        sim.set_interval_ms(0);
        assert_eq!(sim.interval_ms(), 100);
    }

    #[tokio::test]
    async fn toggle_out_of_bounds_surfaces_the_error() {
        let sim = Simulation::new(test_config());
        assert!(sim.toggle_cell(25, 0).is_err());
        assert!(sim.toggle_cell(0, 25).is_err());
        assert_eq!(sim.snapshot().alive_count(), 0);
    }

    #[tokio::test]
    async fn clear_and_randomize_reset_the_generation_counter() {
        let sim = Simulation::new(test_config());
        place_blinker(&sim);
        sim.shared.generation.store(7, Ordering::SeqCst);

        sim.clear();
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.snapshot().alive_count(), 0);

        sim.shared.generation.store(7, Ordering::SeqCst);
        sim.randomize();
        assert_eq!(sim.generation(), 0);
        let board = sim.snapshot();
        assert_eq!(board.rows(), 25);
        assert_eq!(board.cols(), 25);
    }

    #[tokio::test]
    async fn subscribers_observe_every_publish() {
        let sim = Simulation::new(test_config());
        let mut rx = sim.subscribe();
        assert!(!rx.has_changed().unwrap());

        sim.toggle_cell(3, 4).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_alive(3, 4));

        sim.clear();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().alive_count(), 0);
    }
}
