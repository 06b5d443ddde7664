//! Look-ahead motion planner.
//!
//! Line motions are queued as [`PlanBlock`]s in a fixed ring. Each time a
//! block is added, the entry speeds of the blocks not yet known to be
//! optimal are re-planned so the machine runs as fast as its acceleration
//! and cornering limits allow and can always stop at the end of the queue.
//!
//! The [`Planner`] owns the ring and is [split](Planner::split) into a
//! [`Producer`] for the command side and a [`Consumer`] for the step
//! executor. The two communicate only through atomics.
//!
//! ```rust
//! use motion_planner::planner::{PlanLineData, Planner};
//! use motion_planner::config::PlannerSettings;
//!
//! let mut planner = Planner::new(PlannerSettings::default());
//! let (mut producer, mut consumer) = planner.split();
//!
//! producer.buffer_line(&[10.0, 0.0, 0.0, 0.0], &PlanLineData::feed(300.0))?;
//! producer.buffer_line(&[10.0, 10.0, 0.0, 0.0], &PlanLineData::feed(300.0))?;
//!
//! let block = consumer.current_block().unwrap();
//! assert_eq!(block.entry_speed_sqr(), 0.0);
//! consumer.discard_current_block();
//! # Ok::<(), motion_planner::error::PlanError>(())
//! ```

mod block;
mod consumer;
mod junction;
mod producer;
mod recalc;
mod ring;
mod state;

pub use block::{Condition, ConditionFlag, PlanBlock, PlanLineData, SpindleDirection};
pub use consumer::Consumer;
pub use junction::{limit_by_axis_maximum, max_junction_speed_sqr, unit_vector};
pub use producer::{HoldPoint, Producer};
pub use recalc::compute_profile_nominal_speed;
pub use ring::{next_block_index, prev_block_index};
pub use state::{
    Overrides, PlannerState, DEFAULT_FEED_OVERRIDE, DEFAULT_RAPID_OVERRIDE, MAX_FEED_OVERRIDE,
    MIN_FEED_OVERRIDE, RAPID_OVERRIDE_LOW, RAPID_OVERRIDE_MEDIUM,
};

use crate::config::{validate_config, MachineConfig, PlannerSettings};
use crate::error::Result;

use ring::BlockBuffer;

/// Ring capacity. One slot always stays free to tell full from empty.
#[cfg(not(feature = "line-numbers"))]
pub const BLOCK_BUFFER_SIZE: usize = 16;
/// Ring capacity. One slot always stays free to tell full from empty.
#[cfg(feature = "line-numbers")]
pub const BLOCK_BUFFER_SIZE: usize = 15;

/// Slowest junction speed, in mm/min. 0 means sharp corners stop.
pub const MINIMUM_JUNCTION_SPEED: f32 = 0.0;

/// Slowest nominal speed a block can be given, in mm/min.
pub const MINIMUM_FEED_RATE: f32 = 1.0;

/// Stands in for "no limit".
pub const SOME_LARGE_VALUE: f32 = 1.0e38;

/// Look-ahead planner: block ring, planner state and settings.
pub struct Planner {
    buffer: BlockBuffer,
    state: PlannerState,
    settings: PlannerSettings,
}

impl Planner {
    /// Create an empty planner at the origin.
    pub fn new(settings: PlannerSettings) -> Self {
        Self {
            buffer: BlockBuffer::new(),
            state: PlannerState::default(),
            settings,
        }
    }

    /// Validate `config` and create a planner from it.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`](crate::error::ConfigError) found.
    pub fn from_config(config: &MachineConfig) -> Result<Self> {
        validate_config(config)?;
        Ok(Self::new(PlannerSettings::from_config(config)))
    }

    /// Split into the producer and consumer handles.
    ///
    /// Both borrow the planner, so resets and settings changes can only
    /// happen once both are dropped.
    pub fn split(&mut self) -> (Producer<'_>, Consumer<'_>) {
        let (producer_ring, consumer_ring) = self.buffer.split();
        (
            Producer::new(producer_ring, &mut self.state, &self.settings),
            Consumer::new(consumer_ring),
        )
    }

    /// Empty the buffer and reset the planner state: position back to the
    /// origin, no junction history, overrides at 100%.
    pub fn reset_all(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::debug!("planner: reset");
        self.state.reset();
        self.buffer.reset();
    }

    /// Empty the buffer, keeping the planner state.
    pub fn reset_buffer(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::debug!("planner: buffer reset");
        self.buffer.reset();
    }

    /// Planner state.
    #[inline]
    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    /// Settings in use.
    #[inline]
    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Replace the settings. Blocks already queued keep the limits they
    /// were planned with.
    pub fn set_settings(&mut self, settings: PlannerSettings) {
        self.settings = settings;
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerSettings::default())
    }
}

impl core::fmt::Debug for Planner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Planner")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PlannerSettings {
        PlannerSettings::default()
    }

    #[test]
    fn test_first_block_starts_from_rest() {
        let mut planner = Planner::new(settings());
        let (mut tx, rx) = planner.split();

        tx.buffer_line(&[10.0, 0.0, 0.0, 0.0], &PlanLineData::feed(300.0))
            .unwrap();

        let block = rx.current_block().unwrap();
        assert_eq!(block.entry_speed_sqr(), 0.0);
        assert_eq!(block.max_junction_speed_sqr(), 0.0);
        assert_eq!(block.step_event_count(), 2500);
        assert!((block.millimeters() - 10.0).abs() < 1e-4);
        assert_eq!(rx.exec_block_exit_speed_sqr(), 0.0);
    }

    #[test]
    fn test_zero_length_move_rejected() {
        let mut planner = Planner::new(settings());
        let (mut tx, _rx) = planner.split();

        // Less than half a step at 250 steps/mm.
        let err = tx
            .buffer_line(&[0.001, 0.0, 0.0, 0.0], &PlanLineData::feed(300.0))
            .unwrap_err();
        assert_eq!(err, crate::error::PlanError::EmptyBlock);
        assert_eq!(tx.block_buffer_count(), 0);
        assert_eq!(tx.position(), &[0; crate::N_AXIS]);
    }

    #[test]
    fn test_target_beyond_step_range_rejected() {
        let mut planner = Planner::new(settings());
        let (mut tx, _rx) = planner.split();

        // 2e9 steps at 250 steps/mm, still an i32.
        tx.buffer_line(&[8.0e6, 0.0, 0.0, 0.0], &PlanLineData::rapid())
            .unwrap();
        let err = tx
            .buffer_line(&[-8.0e6, 0.0, 0.0, 0.0], &PlanLineData::rapid())
            .unwrap_err();
        assert_eq!(err, crate::error::PlanError::TargetOutOfRange);
        assert_eq!(tx.block_buffer_count(), 1);
        assert_eq!(tx.position()[crate::X_AXIS], 2_000_000_000);
    }

    #[test]
    fn test_direction_bits() {
        let mut planner = Planner::new(settings());
        let (mut tx, rx) = planner.split();

        tx.buffer_line(&[-1.0, 2.0, -3.0, 0.0], &PlanLineData::feed(300.0))
            .unwrap();
        let block = rx.current_block().unwrap();
        assert!(block.is_reverse(crate::X_AXIS));
        assert!(!block.is_reverse(crate::Y_AXIS));
        assert!(block.is_reverse(crate::Z_AXIS));
        assert_eq!(block.steps(), &[250, 500, 750, 0]);
    }

    #[test]
    fn test_reset_all_clears_state() {
        let mut planner = Planner::new(settings());
        {
            let (mut tx, _rx) = planner.split();
            tx.buffer_line(&[5.0, 0.0, 0.0, 0.0], &PlanLineData::feed(300.0))
                .unwrap();
            tx.set_feed_override(50);
        }
        planner.reset_all();

        assert_eq!(planner.state().position(), &[0; crate::N_AXIS]);
        assert_eq!(planner.state().overrides(), Overrides::default());
        let (tx, rx) = planner.split();
        assert!(tx.is_empty());
        assert!(rx.current_block().is_none());
    }

    #[test]
    fn test_reset_buffer_keeps_position() {
        let mut planner = Planner::new(settings());
        {
            let (mut tx, _rx) = planner.split();
            tx.buffer_line(&[5.0, 0.0, 0.0, 0.0], &PlanLineData::feed(300.0))
                .unwrap();
        }
        planner.reset_buffer();

        assert_eq!(planner.state().position(), &[1250, 0, 0, 0]);
        let (tx, _rx) = planner.split();
        assert_eq!(tx.block_buffer_available(), BLOCK_BUFFER_SIZE - 1);
    }
}
