//! Consumer handle: the step-generation side of the planner.

use crate::motion::BlockProfile;

use super::block::PlanBlock;
use super::ring::ConsumerRing;

/// Consumer side of a split [`Planner`](super::Planner).
///
/// Reads the executing block, frees it when done, and picks up the reserved
/// system-motion block. Every method is wait-free, so this handle can live
/// in an interrupt handler.
pub struct Consumer<'a> {
    ring: ConsumerRing<'a>,
}

impl<'a> Consumer<'a> {
    pub(crate) fn new(ring: ConsumerRing<'a>) -> Self {
        Self { ring }
    }

    /// The block being executed, or `None` when nothing is queued.
    #[inline]
    pub fn current_block(&self) -> Option<&PlanBlock> {
        self.ring.current()
    }

    /// Free the executing block. No-op when nothing is queued.
    pub fn discard_current_block(&mut self) {
        if self.ring.discard() {
            #[cfg(feature = "defmt")]
            defmt::trace!("planner: block discarded, tail now {}", self.ring.tail());
        }
    }

    /// The pending system-motion block, if any.
    #[inline]
    pub fn system_motion_block(&self) -> Option<&PlanBlock> {
        self.ring.system()
    }

    /// Release the system-motion slot so another system move can be queued.
    pub fn discard_system_motion_block(&mut self) {
        self.ring.release_system();
    }

    /// Speed² the executing block must end at: the entry speed² of the
    /// block after it, or 0 if it is the last one.
    #[inline]
    pub fn exec_block_exit_speed_sqr(&self) -> f32 {
        self.ring
            .after_current()
            .map_or(0.0, |block| block.entry_speed_sqr())
    }

    /// Number of free slots.
    #[inline]
    pub fn block_buffer_available(&self) -> usize {
        self.ring.available()
    }

    /// True when nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.current().is_none()
    }

    /// Record how much of the executing block is left.
    ///
    /// The next replan (after a hold, or when a new block is queued) treats
    /// the block as this long.
    pub fn set_exec_block_remaining(&self, millimeters: f32) {
        if let Some(block) = self.ring.current() {
            block.millimeters.store(millimeters);
        }
    }

    /// True once after the producer changed the executing block's exit
    /// speed. Rebuild the current profile when it returns `true`.
    #[inline]
    pub fn take_plan_update(&mut self) -> bool {
        self.ring.take_plan_updated()
    }

    /// Profile of the executing block with its current entry and exit
    /// speeds.
    pub fn current_profile(&self) -> Option<BlockProfile> {
        let block = self.ring.current()?;
        Some(BlockProfile::new(
            block.entry_speed_sqr(),
            self.exec_block_exit_speed_sqr(),
            block.nominal_speed(),
            block.acceleration(),
            block.millimeters(),
        ))
    }

    /// Profile of the pending system-motion block. Starts and ends at rest.
    pub fn system_motion_profile(&self) -> Option<BlockProfile> {
        let block = self.ring.system()?;
        Some(BlockProfile::new(
            0.0,
            0.0,
            block.nominal_speed(),
            block.acceleration(),
            block.millimeters(),
        ))
    }
}
