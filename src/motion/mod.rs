//! Motion module for motion-planner.
//!
//! Turns planned blocks into per-block speed profiles for the step executor.

mod profile;

pub use profile::{BlockProfile, MotionPhase, ProfileShape};
