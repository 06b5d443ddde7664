//! Machine configuration - root configuration structure.

use serde::Deserialize;

use super::axis::AxisConfig;
use super::units::{Millimeters, MmPerMin, MmPerSec2, StepsPerMm};
use crate::N_AXIS;

/// Root configuration structure from TOML.
///
/// Holds exactly one `[[axis]]` table per machine axis, in axis order.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineConfig {
    /// How far the tool may stray from the programmed corner while
    /// cornering at speed.
    #[serde(rename = "junction_deviation_mm", default = "default_junction_deviation")]
    pub junction_deviation: Millimeters,

    /// Axis configurations, indexed by axis number.
    #[serde(rename = "axis")]
    pub axes: [AxisConfig; N_AXIS],
}

fn default_junction_deviation() -> Millimeters {
    Millimeters(0.01)
}

impl MachineConfig {
    /// Get an axis configuration by name.
    pub fn axis(&self, name: &str) -> Option<&AxisConfig> {
        self.axes.iter().find(|a| a.name.as_str() == name)
    }

    /// Get the index of a named axis.
    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|a| a.name.as_str() == name)
    }

    /// List all axis names in axis order.
    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|a| a.name.as_str())
    }
}

impl Default for MachineConfig {
    /// Stock settings of a small three-axis mill with an auxiliary axis.
    fn default() -> Self {
        let axis = |name| AxisConfig::new(name, StepsPerMm::default(), MmPerMin(500.0), MmPerSec2(10.0));
        Self {
            junction_deviation: default_junction_deviation(),
            axes: [axis("X"), axis("Y"), axis("Z"), axis("E")],
        }
    }
}
