//! Producer handle: queues line motions and keeps the plan optimal.

use crate::config::PlannerSettings;
use crate::error::PlanError;
use crate::N_AXIS;

use super::block::{AtomicF32, ConditionFlag, PlanBlock, PlanLineData};
use super::junction::{limit_by_axis_maximum, max_junction_speed_sqr, unit_vector};
use super::recalc::{compute_profile_nominal_speed, compute_profile_parameters, recalculate};
use super::ring::{next_block_index, ProducerRing};
use super::state::{
    Overrides, PlannerState, DEFAULT_RAPID_OVERRIDE, MAX_FEED_OVERRIDE, MIN_FEED_OVERRIDE,
    RAPID_OVERRIDE_LOW,
};
use super::SOME_LARGE_VALUE;

/// Where execution stopped inside the executing block during a feed hold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HoldPoint {
    /// Distance still to travel in the executing block, in mm.
    pub remaining_millimeters: f32,
    /// Speed the block resumes from, in mm/min. Usually 0 after a hold.
    pub speed: f32,
}

impl HoldPoint {
    /// Resume from a standstill with `remaining_millimeters` left to go.
    pub fn at_rest(remaining_millimeters: f32) -> Self {
        Self {
            remaining_millimeters,
            speed: 0.0,
        }
    }
}

/// Producer side of a split [`Planner`](super::Planner).
///
/// Lives in the command-interpreter context. Owns the planner state and the
/// `head`/`planned` cursors; never blocks.
pub struct Producer<'a> {
    ring: ProducerRing<'a>,
    state: &'a mut PlannerState,
    settings: &'a PlannerSettings,
}

impl<'a> Producer<'a> {
    pub(crate) fn new(
        ring: ProducerRing<'a>,
        state: &'a mut PlannerState,
        settings: &'a PlannerSettings,
    ) -> Self {
        Self {
            ring,
            state,
            settings,
        }
    }

    /// Queue a linear motion to the absolute `target` (mm).
    ///
    /// On success exactly one block becomes visible to the consumer and the
    /// plan is re-optimized. System motion blocks go to the reserved system
    /// slot instead: they start and end at rest and leave the planner
    /// position and junction history untouched.
    ///
    /// # Errors
    ///
    /// - [`PlanError::BufferFull`] if there is no free slot (or the system
    ///   slot is still held by the consumer).
    /// - [`PlanError::EmptyBlock`] if the target rounds to the current
    ///   position on every axis.
    /// - [`PlanError::TargetOutOfRange`] if an axis would move more steps
    ///   than fit in an `i32`.
    ///
    /// Either way nothing is changed.
    pub fn buffer_line(
        &mut self,
        target: &[f32; N_AXIS],
        pl_data: &PlanLineData,
    ) -> Result<(), PlanError> {
        let system_motion = pl_data.condition.contains(ConditionFlag::SystemMotion);
        let full = if system_motion {
            self.ring.system_held()
        } else {
            self.ring.is_full()
        };
        if full {
            #[cfg(feature = "defmt")]
            defmt::debug!("planner: buffer full, block rejected");
            return Err(PlanError::BufferFull);
        }

        let target_steps = self.settings.mm_to_steps(target);
        let mut steps = [0u32; N_AXIS];
        let mut step_event_count = 0;
        let mut direction_bits = 0u8;
        let mut unit_vec = [0.0f32; N_AXIS];

        for idx in 0..N_AXIS {
            let Some(delta) = target_steps[idx].checked_sub(self.state.position[idx]) else {
                #[cfg(feature = "defmt")]
                defmt::debug!("planner: target out of step range on axis {}", idx);
                return Err(PlanError::TargetOutOfRange);
            };
            steps[idx] = delta.unsigned_abs();
            if steps[idx] > step_event_count {
                step_event_count = steps[idx];
            }
            unit_vec[idx] = delta as f32 / self.settings.steps_per_mm[idx].value();
            if delta < 0 {
                direction_bits |= 1 << idx;
            }
        }

        if step_event_count == 0 {
            #[cfg(feature = "defmt")]
            defmt::trace!("planner: zero-length block skipped");
            return Err(PlanError::EmptyBlock);
        }

        let millimeters = unit_vector(&mut unit_vec);
        let acceleration = limit_by_axis_maximum(&self.settings.acceleration, &unit_vec);
        let rapid_rate = limit_by_axis_maximum(&self.settings.max_rate, &unit_vec);

        let condition = pl_data.condition;
        let programmed_rate = if condition.contains(ConditionFlag::RapidMotion) {
            rapid_rate
        } else if condition.contains(ConditionFlag::InverseTime) {
            pl_data.feed_rate * millimeters
        } else {
            pl_data.feed_rate
        };

        // Starting from rest: nothing queued ahead, or a system move that
        // always runs on its own.
        let max_junction_speed_sqr = if system_motion || self.ring.is_empty() {
            0.0
        } else {
            max_junction_speed_sqr(
                &self.state.previous_unit_vec,
                &unit_vec,
                &self.settings.acceleration,
                self.settings.junction_deviation,
            )
        };

        let block = PlanBlock {
            steps,
            step_event_count,
            direction_bits,
            condition,
            #[cfg(feature = "line-numbers")]
            line_number: pl_data.line_number,
            acceleration,
            max_junction_speed_sqr,
            rapid_rate,
            programmed_rate,
            millimeters: AtomicF32::new(millimeters),
            entry_speed_sqr: AtomicF32::zero(),
            max_entry_speed_sqr: AtomicF32::zero(),
            nominal_speed: AtomicF32::zero(),
        };

        let nominal_speed = compute_profile_nominal_speed(&block, &self.state.overrides);

        if system_motion {
            compute_profile_parameters(&block, nominal_speed, nominal_speed);
            // Checked above; only `&mut self` could have changed it.
            let pushed = self.ring.push_system(block);
            debug_assert!(pushed);
            return Ok(());
        }

        // Entry speed stays 0 until the recalculation below: until now the
        // block before this one was planned to stop.
        compute_profile_parameters(&block, nominal_speed, self.state.previous_nominal_speed);

        let pushed = self.ring.push(block);
        debug_assert!(pushed);

        self.state.previous_nominal_speed = nominal_speed;
        self.state.previous_unit_vec = unit_vec;
        self.state.position = target_steps;

        self.recalculate();
        Ok(())
    }

    /// Re-run the look-ahead from the `planned` boundary to the newest
    /// block. Running it twice in a row changes nothing.
    pub fn recalculate(&mut self) {
        if recalculate(&mut self.ring) {
            self.ring.notify_plan_updated();
        }
    }

    /// True when no further block can be queued.
    #[inline]
    pub fn check_full_buffer(&self) -> bool {
        self.ring.is_full()
    }

    /// Number of free slots.
    #[inline]
    pub fn block_buffer_available(&self) -> usize {
        self.ring.available()
    }

    /// Number of queued blocks, including the executing one.
    #[inline]
    pub fn block_buffer_count(&self) -> usize {
        super::BLOCK_BUFFER_SIZE - 1 - self.ring.available()
    }

    /// True when nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Index of the executing (oldest) block.
    #[inline]
    pub fn tail(&self) -> usize {
        self.ring.tail()
    }

    /// Index of the next free slot.
    #[inline]
    pub fn head(&self) -> usize {
        self.ring.head()
    }

    /// Index of the first block that may still be re-planned. Always in
    /// `[tail, head]`.
    #[inline]
    pub fn planned(&self) -> usize {
        self.ring.planned()
    }

    /// A queued block by ring index.
    ///
    /// Returns `None` for indices outside `[tail, head)`.
    pub fn block(&self, index: usize) -> Option<&PlanBlock> {
        let mut i = self.ring.tail();
        let head = self.ring.head();
        while i != head {
            if i == index {
                return Some(self.ring.block(i));
            }
            i = next_block_index(i);
        }
        None
    }

    /// Queued blocks, oldest first.
    pub fn blocks(&self) -> impl Iterator<Item = &PlanBlock> + '_ {
        let head = self.ring.head();
        let mut index = self.ring.tail();
        core::iter::from_fn(move || {
            if index == head {
                return None;
            }
            let block = self.ring.block(index);
            index = next_block_index(index);
            Some(block)
        })
    }

    /// Nominal speed of `block` in mm/min under the current overrides.
    #[inline]
    pub fn compute_profile_nominal_speed(&self, block: &PlanBlock) -> f32 {
        compute_profile_nominal_speed(block, &self.state.overrides)
    }

    /// Recompute nominal speeds and entry limits of every queued block, then
    /// re-plan the whole buffer from `tail`.
    ///
    /// Call after anything that changes nominal speeds, such as overrides.
    pub fn update_velocity_profile_parameters(&mut self) {
        let mut prev_nominal_speed = SOME_LARGE_VALUE;
        let mut have_blocks = false;
        for block in self.blocks() {
            let nominal_speed = compute_profile_nominal_speed(block, &self.state.overrides);
            compute_profile_parameters(block, nominal_speed, prev_nominal_speed);
            prev_nominal_speed = nominal_speed;
            have_blocks = true;
        }
        if have_blocks {
            self.state.previous_nominal_speed = prev_nominal_speed;
        }

        self.ring.invalidate_planned();
        self.recalculate();
    }

    /// Active overrides.
    #[inline]
    pub fn overrides(&self) -> Overrides {
        self.state.overrides
    }

    /// Set the feed override in percent, clamped to 10..=200, and re-plan
    /// if it changed.
    pub fn set_feed_override(&mut self, percent: u8) {
        let percent = percent.clamp(MIN_FEED_OVERRIDE, MAX_FEED_OVERRIDE);
        if percent != self.state.overrides.feed {
            #[cfg(feature = "defmt")]
            defmt::info!("planner: feed override {}%", percent);
            self.state.overrides.feed = percent;
            self.update_velocity_profile_parameters();
        }
    }

    /// Set the rapid override in percent, clamped to 25..=100, and re-plan
    /// if it changed.
    pub fn set_rapid_override(&mut self, percent: u8) {
        let percent = percent.clamp(RAPID_OVERRIDE_LOW, DEFAULT_RAPID_OVERRIDE);
        if percent != self.state.overrides.rapid {
            #[cfg(feature = "defmt")]
            defmt::info!("planner: rapid override {}%", percent);
            self.state.overrides.rapid = percent;
            self.update_velocity_profile_parameters();
        }
    }

    /// Overwrite the planner position with the machine's actual position,
    /// in steps. Used after homing or a reset, when nothing is queued.
    pub fn sync_position(&mut self, machine_position: &[i32; N_AXIS]) {
        #[cfg(feature = "defmt")]
        defmt::trace!("planner: position synced to {}", machine_position);
        self.state.position = *machine_position;
    }

    /// Planner position in steps.
    #[inline]
    pub fn position(&self) -> &[i32; N_AXIS] {
        &self.state.position
    }

    /// Planner position in mm.
    pub fn planner_mpos(&self, target: &mut [f32; N_AXIS]) {
        *target = self.settings.steps_to_mm(&self.state.position);
    }

    /// Re-plan after a feed hold.
    ///
    /// The executing block is cut down to what is left of it and resumes at
    /// `hold.speed`; the whole buffer is then re-planned from there.
    pub fn cycle_reinitialize(&mut self, hold: HoldPoint) {
        #[cfg(feature = "defmt")]
        defmt::debug!("planner: reinitializing cycle from {}", hold);
        if !self.ring.is_empty() {
            let block = self.ring.block(self.ring.tail());
            block.millimeters.store(hold.remaining_millimeters);
            block.entry_speed_sqr.store(hold.speed * hold.speed);
        }
        self.ring.invalidate_planned();
        self.recalculate();
    }

    /// Planner state, for inspection.
    #[inline]
    pub fn state(&self) -> &PlannerState {
        self.state
    }

    /// Settings the planner computes with.
    #[inline]
    pub fn settings(&self) -> &PlannerSettings {
        self.settings
    }
}
