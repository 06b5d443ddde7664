//! Motion blocks and the metadata that comes with each line motion.

use core::fmt;
use core::ops::BitOr;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::N_AXIS;

/// An `f32` that can be shared between the producer and the consumer.
///
/// Stored as raw bits in an `AtomicU32`; only load and store are needed,
/// so this works on cores without compare-and-swap.
pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// 0.0 has an all-zero bit pattern.
    pub(crate) const fn zero() -> Self {
        Self(AtomicU32::new(0))
    }

    pub(crate) fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub(crate) fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed)
    }
}

impl fmt::Debug for AtomicF32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.load(), f)
    }
}

/// A single block condition flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConditionFlag {
    /// Move at the axis-limited rapid rate, ignoring the programmed feed.
    RapidMotion = 1 << 0,
    /// Homing/parking move; bypasses the block buffer and planner state.
    SystemMotion = 1 << 1,
    /// Feed override does not apply (e.g. threading, probing).
    NoFeedOverride = 1 << 2,
    /// Feed rate is in inverse time (1/min): the move takes `1/feed` minutes.
    InverseTime = 1 << 3,
    /// Spindle turns clockwise during this block.
    SpindleCw = 1 << 4,
    /// Spindle turns counter-clockwise during this block.
    SpindleCcw = 1 << 5,
    /// Flood coolant on.
    CoolantFlood = 1 << 6,
    /// Mist coolant on.
    CoolantMist = 1 << 7,
}

/// Spindle rotation direction for [`Condition::with_spindle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpindleDirection {
    /// Clockwise (M3).
    Cw,
    /// Counter-clockwise (M4).
    Ccw,
}

/// Set of [`ConditionFlag`]s attached to a block.
///
/// Can only be built from named flags, so no undefined bit is ever set.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Condition(u8);

impl Condition {
    /// No flags set.
    pub const EMPTY: Self = Self(0);

    /// Create an empty condition set.
    #[inline]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Return a copy with `flag` set.
    #[inline]
    pub const fn with(self, flag: ConditionFlag) -> Self {
        Self(self.0 | flag as u8)
    }

    /// Return a copy with `flag` cleared.
    #[inline]
    pub const fn without(self, flag: ConditionFlag) -> Self {
        Self(self.0 & !(flag as u8))
    }

    /// Check whether `flag` is set.
    #[inline]
    pub const fn contains(self, flag: ConditionFlag) -> bool {
        self.0 & flag as u8 != 0
    }

    /// Set `flag`.
    #[inline]
    pub fn insert(&mut self, flag: ConditionFlag) {
        *self = self.with(flag);
    }

    /// Clear `flag`.
    #[inline]
    pub fn remove(&mut self, flag: ConditionFlag) {
        *self = self.without(flag);
    }

    /// Return a copy with the spindle state replaced; `None` turns it off.
    ///
    /// CW and CCW are never both set through this method.
    pub const fn with_spindle(self, direction: Option<SpindleDirection>) -> Self {
        let cleared = self
            .without(ConditionFlag::SpindleCw)
            .without(ConditionFlag::SpindleCcw);
        match direction {
            Some(SpindleDirection::Cw) => cleared.with(ConditionFlag::SpindleCw),
            Some(SpindleDirection::Ccw) => cleared.with(ConditionFlag::SpindleCcw),
            None => cleared,
        }
    }

    /// Raw bit representation.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True when no flag is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if the block runs at the rapid rate.
    #[inline]
    pub const fn is_rapid(self) -> bool {
        self.contains(ConditionFlag::RapidMotion)
    }

    /// True if the block bypasses the block buffer.
    #[inline]
    pub const fn is_system_motion(self) -> bool {
        self.contains(ConditionFlag::SystemMotion)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ConditionFlag, &str); 8] = [
            (ConditionFlag::RapidMotion, "RAPID_MOTION"),
            (ConditionFlag::SystemMotion, "SYSTEM_MOTION"),
            (ConditionFlag::NoFeedOverride, "NO_FEED_OVERRIDE"),
            (ConditionFlag::InverseTime, "INVERSE_TIME"),
            (ConditionFlag::SpindleCw, "SPINDLE_CW"),
            (ConditionFlag::SpindleCcw, "SPINDLE_CCW"),
            (ConditionFlag::CoolantFlood, "COOLANT_FLOOD"),
            (ConditionFlag::CoolantMist, "COOLANT_MIST"),
        ];
        let mut set = f.debug_set();
        for (flag, name) in NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{}", name));
            }
        }
        set.finish()
    }
}

impl From<ConditionFlag> for Condition {
    fn from(flag: ConditionFlag) -> Self {
        Self::EMPTY.with(flag)
    }
}

impl BitOr for ConditionFlag {
    type Output = Condition;

    fn bitor(self, rhs: Self) -> Self::Output {
        Condition::from(self).with(rhs)
    }
}

impl BitOr<ConditionFlag> for Condition {
    type Output = Condition;

    fn bitor(self, rhs: ConditionFlag) -> Self::Output {
        self.with(rhs)
    }
}

impl BitOr for Condition {
    type Output = Condition;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Feed and mode data for one line motion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlanLineData {
    /// Programmed feed rate in mm/min, or 1/min in inverse-time mode.
    /// Ignored for rapid motion.
    pub feed_rate: f32,

    /// Block condition flags.
    pub condition: Condition,

    /// Program line number, reported back while the block executes.
    #[cfg(feature = "line-numbers")]
    pub line_number: i32,
}

impl PlanLineData {
    /// Feed move at `feed_rate` mm/min.
    pub fn feed(feed_rate: f32) -> Self {
        Self {
            feed_rate,
            ..Self::default()
        }
    }

    /// Rapid move at the axis-limited maximum rate.
    pub fn rapid() -> Self {
        Self {
            condition: ConditionFlag::RapidMotion.into(),
            ..Self::default()
        }
    }

    /// Return a copy with `flag` added to the condition set.
    pub fn with(mut self, flag: ConditionFlag) -> Self {
        self.condition.insert(flag);
        self
    }

    /// Return a copy tagged with a program line number.
    #[cfg(feature = "line-numbers")]
    pub fn with_line_number(mut self, line_number: i32) -> Self {
        self.line_number = line_number;
        self
    }
}

/// One linear motion in the planner buffer.
///
/// Geometry and limits are fixed when the block is queued. The three speed
/// and distance cells keep changing afterwards: the planner rewrites the
/// entry speeds as it looks ahead, and the executor shortens the remaining
/// distance while the block runs. Speeds are in mm/min and stored squared.
#[derive(Debug)]
pub struct PlanBlock {
    pub(crate) steps: [u32; N_AXIS],
    pub(crate) step_event_count: u32,
    pub(crate) direction_bits: u8,
    pub(crate) condition: Condition,
    #[cfg(feature = "line-numbers")]
    pub(crate) line_number: i32,

    pub(crate) acceleration: f32,
    pub(crate) max_junction_speed_sqr: f32,
    pub(crate) rapid_rate: f32,
    pub(crate) programmed_rate: f32,

    pub(crate) millimeters: AtomicF32,
    pub(crate) entry_speed_sqr: AtomicF32,
    pub(crate) max_entry_speed_sqr: AtomicF32,
    pub(crate) nominal_speed: AtomicF32,
}

impl PlanBlock {
    /// An all-zero block, used to fill unused slots.
    pub(crate) const fn empty() -> Self {
        Self {
            steps: [0; N_AXIS],
            step_event_count: 0,
            direction_bits: 0,
            condition: Condition::EMPTY,
            #[cfg(feature = "line-numbers")]
            line_number: 0,
            acceleration: 0.0,
            max_junction_speed_sqr: 0.0,
            rapid_rate: 0.0,
            programmed_rate: 0.0,
            millimeters: AtomicF32::zero(),
            entry_speed_sqr: AtomicF32::zero(),
            max_entry_speed_sqr: AtomicF32::zero(),
            nominal_speed: AtomicF32::zero(),
        }
    }

    /// Step count on each axis.
    #[inline]
    pub fn steps(&self) -> &[u32; N_AXIS] {
        &self.steps
    }

    /// Largest per-axis step count; the number of step events to execute.
    #[inline]
    pub fn step_event_count(&self) -> u32 {
        self.step_event_count
    }

    /// Direction bits: bit `i` set means axis `i` moves in the negative
    /// direction.
    #[inline]
    pub fn direction_bits(&self) -> u8 {
        self.direction_bits
    }

    /// Whether `axis` moves in the negative direction.
    #[inline]
    pub fn is_reverse(&self, axis: usize) -> bool {
        self.direction_bits & (1 << axis) != 0
    }

    /// Block condition flags.
    #[inline]
    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// Program line number the block came from.
    #[cfg(feature = "line-numbers")]
    #[inline]
    pub fn line_number(&self) -> i32 {
        self.line_number
    }

    /// Acceleration along the block direction, in mm/min², limited so that
    /// no axis exceeds its own maximum.
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Junction speed² limit from the direction change at the block entry.
    #[inline]
    pub fn max_junction_speed_sqr(&self) -> f32 {
        self.max_junction_speed_sqr
    }

    /// Axis-limited maximum rate along the block direction, in mm/min.
    #[inline]
    pub fn rapid_rate(&self) -> f32 {
        self.rapid_rate
    }

    /// Requested rate in mm/min before overrides.
    #[inline]
    pub fn programmed_rate(&self) -> f32 {
        self.programmed_rate
    }

    /// Distance left to travel, in mm.
    #[inline]
    pub fn millimeters(&self) -> f32 {
        self.millimeters.load()
    }

    /// Planned entry speed², (mm/min)².
    #[inline]
    pub fn entry_speed_sqr(&self) -> f32 {
        self.entry_speed_sqr.load()
    }

    /// Upper bound on the entry speed², from the junction and the nominal
    /// speeds on both sides of it.
    #[inline]
    pub fn max_entry_speed_sqr(&self) -> f32 {
        self.max_entry_speed_sqr.load()
    }

    /// Cruise speed in mm/min with the current overrides applied.
    #[inline]
    pub fn nominal_speed(&self) -> f32 {
        self.nominal_speed.load()
    }

    /// Speed² reachable at the end of this block when entering at
    /// `entry_speed_sqr` and accelerating over its full length.
    #[inline]
    pub fn accelerated_speed_sqr(&self, entry_speed_sqr: f32) -> f32 {
        entry_speed_sqr + 2.0 * self.acceleration * self.millimeters()
    }
}
