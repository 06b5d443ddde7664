//! Look-ahead velocity profile optimization.
//!
//! Entry speeds are planned with two linear passes over the blocks that are
//! not yet known to be optimal:
//!
//! 1. **Reverse pass**, newest block back to `planned`: each block may enter
//!    no faster than it can decelerate from, over its own length, to the
//!    next block's entry speed. The newest block plans to a full stop since
//!    nothing is known beyond it yet.
//! 2. **Forward pass**, `planned` to newest: each block may enter no faster
//!    than the previous block can accelerate to over its length.
//!
//! A block whose entry speed comes out of the forward pass acceleration
//! limited, or equal to its maximum, cannot be improved by anything queued
//! later, so `planned` moves up to it. In steady state each new block only
//! touches the few blocks since the last such boundary.
//!
//! Everything is in speed² so the per-block update is one multiply-add:
//! `v² = u² + 2·a·d`.

use super::block::{ConditionFlag, PlanBlock};
use super::ring::{next_block_index, prev_block_index, ProducerRing};
use super::state::Overrides;
use super::MINIMUM_FEED_RATE;

/// Nominal (cruise) speed of `block` in mm/min with `overrides` applied.
///
/// Rapids scale by the rapid override. Feed moves scale by the feed
/// override unless flagged override-exempt, then are capped at the block's
/// axis-limited rapid rate. Never below [`MINIMUM_FEED_RATE`].
pub fn compute_profile_nominal_speed(block: &PlanBlock, overrides: &Overrides) -> f32 {
    let mut nominal_speed = block.programmed_rate;
    if block.condition.contains(ConditionFlag::RapidMotion) {
        nominal_speed *= overrides.rapid_factor();
    } else {
        if !block.condition.contains(ConditionFlag::NoFeedOverride) {
            nominal_speed *= overrides.feed_factor();
        }
        if nominal_speed > block.rapid_rate {
            nominal_speed = block.rapid_rate;
        }
    }
    if nominal_speed > MINIMUM_FEED_RATE {
        nominal_speed
    } else {
        MINIMUM_FEED_RATE
    }
}

/// Set the block's maximum entry speed² from its own and the previous
/// block's nominal speed and its junction limit.
pub(crate) fn compute_profile_parameters(block: &PlanBlock, nominal_speed: f32, prev_nominal_speed: f32) {
    let slower = if nominal_speed > prev_nominal_speed {
        prev_nominal_speed
    } else {
        nominal_speed
    };
    let mut max_entry_speed_sqr = slower * slower;
    if max_entry_speed_sqr > block.max_junction_speed_sqr {
        max_entry_speed_sqr = block.max_junction_speed_sqr;
    }
    block.nominal_speed.store(nominal_speed);
    block.max_entry_speed_sqr.store(max_entry_speed_sqr);
}

/// Speed² a block may enter at and still slow to `exit_speed_sqr` by its
/// end.
#[inline]
pub(crate) fn decel_limited_speed_sqr(exit_speed_sqr: f32, acceleration: f32, millimeters: f32) -> f32 {
    exit_speed_sqr + 2.0 * acceleration * millimeters
}

/// Re-plan entry speeds from `planned` to the newest block.
///
/// Returns `true` if the entry speed of the block after `tail`, i.e. the
/// exit speed of the executing block, changed.
pub(crate) fn recalculate(ring: &mut ProducerRing<'_>) -> bool {
    let head = ring.head();
    let tail = ring.tail();
    let mut planned = ring.planned();

    if planned == head {
        return false;
    }

    let exec_next = next_block_index(tail);
    let exit_before = (exec_next != head).then(|| ring.block(exec_next).entry_speed_sqr());

    let mut block_index = prev_block_index(head);
    if block_index == planned {
        return false;
    }

    // Newest block: plan to a full stop.
    let newest = ring.block(block_index);
    newest.entry_speed_sqr.store(f32::min(
        newest.max_entry_speed_sqr(),
        decel_limited_speed_sqr(0.0, newest.acceleration, newest.millimeters()),
    ));

    // Reverse pass.
    let mut next_entry_speed_sqr = newest.entry_speed_sqr();
    block_index = prev_block_index(block_index);
    // A block at its maximum becomes `planned` in the forward pass, so in
    // steady state none lies in here.
    while block_index != planned {
        let current = ring.block(block_index);
        let entry_speed_sqr = f32::min(
            current.max_entry_speed_sqr(),
            decel_limited_speed_sqr(
                next_entry_speed_sqr,
                current.acceleration,
                current.millimeters(),
            ),
        );
        current.entry_speed_sqr.store(entry_speed_sqr);
        next_entry_speed_sqr = entry_speed_sqr;
        block_index = prev_block_index(block_index);
    }

    // Forward pass.
    let mut current_index = planned;
    block_index = next_block_index(planned);
    while block_index != head {
        let current = ring.block(current_index);
        let next = ring.block(block_index);

        if current.entry_speed_sqr() < next.entry_speed_sqr() {
            let entry_speed_sqr = current.accelerated_speed_sqr(current.entry_speed_sqr());
            // Full acceleration across `current`: nothing before `next`
            // can change any more.
            if entry_speed_sqr < next.entry_speed_sqr() {
                next.entry_speed_sqr.store(entry_speed_sqr);
                planned = block_index;
            }
        }

        // Bracketed by a maximum entry speed: also optimal up to here.
        if next.entry_speed_sqr() == next.max_entry_speed_sqr() {
            planned = block_index;
        }

        current_index = block_index;
        block_index = next_block_index(block_index);
    }

    ring.advance_planned_to(planned);

    let exit_after = (exec_next != head).then(|| ring.block(exec_next).entry_speed_sqr());
    exit_before != exit_after
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::block::Condition;

    fn feed_block(programmed_rate: f32, rapid_rate: f32, condition: Condition) -> PlanBlock {
        let mut block = PlanBlock::empty();
        block.programmed_rate = programmed_rate;
        block.rapid_rate = rapid_rate;
        block.condition = condition;
        block
    }

    #[test]
    fn test_nominal_speed_applies_feed_override() {
        let block = feed_block(400.0, 1000.0, Condition::empty());
        let overrides = Overrides { feed: 150, rapid: 100 };
        assert!((compute_profile_nominal_speed(&block, &overrides) - 600.0).abs() < 1e-3);
    }

    #[test]
    fn test_nominal_speed_capped_at_rapid_rate() {
        let block = feed_block(900.0, 500.0, Condition::empty());
        let overrides = Overrides { feed: 200, rapid: 100 };
        assert!((compute_profile_nominal_speed(&block, &overrides) - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_no_feed_override_flag() {
        let block = feed_block(400.0, 1000.0, ConditionFlag::NoFeedOverride.into());
        let overrides = Overrides { feed: 10, rapid: 100 };
        assert!((compute_profile_nominal_speed(&block, &overrides) - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_rapid_uses_rapid_override() {
        let block = feed_block(800.0, 800.0, ConditionFlag::RapidMotion.into());
        let overrides = Overrides { feed: 200, rapid: 25 };
        assert!((compute_profile_nominal_speed(&block, &overrides) - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_nominal_speed_floor() {
        let block = feed_block(0.0, 500.0, Condition::empty());
        assert_eq!(
            compute_profile_nominal_speed(&block, &Overrides::default()),
            MINIMUM_FEED_RATE
        );
    }

    #[test]
    fn test_profile_parameters_take_slower_neighbour() {
        let mut block = PlanBlock::empty();
        block.max_junction_speed_sqr = 1.0e9;

        compute_profile_parameters(&block, 300.0, 200.0);
        assert_eq!(block.max_entry_speed_sqr(), 200.0 * 200.0);
        assert_eq!(block.nominal_speed(), 300.0);

        compute_profile_parameters(&block, 100.0, 200.0);
        assert_eq!(block.max_entry_speed_sqr(), 100.0 * 100.0);
    }

    #[test]
    fn test_profile_parameters_respect_junction() {
        let mut block = PlanBlock::empty();
        block.max_junction_speed_sqr = 50.0;
        compute_profile_parameters(&block, 300.0, 300.0);
        assert_eq!(block.max_entry_speed_sqr(), 50.0);
    }

    #[test]
    fn test_decel_limited_speed() {
        // 2·a·d = 2 · 36000 · 10
        assert_eq!(decel_limited_speed_sqr(100.0, 36_000.0, 10.0), 720_100.0);
    }
}
