//! Grid snapping rules for editor input.

use serde::{Deserialize, Serialize};

/// Editor snapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapSettings {
    /// When false, values are rounded to two decimals instead.
    pub enabled: bool,
    /// Grid cell size in map units. Must be positive.
    pub grid_size: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            grid_size: 1.0,
        }
    }
}

impl SnapSettings {
    /// Snaps a top-left coordinate.
    pub fn position(&self, value: f64) -> f64 {
        if self.enabled {
            snap_position(value, self.grid_size)
        } else {
            round_to_hundredths(value)
        }
    }

    /// Snaps a width or height.
    pub fn size(&self, value: f64) -> f64 {
        if self.enabled {
            snap_size(value, self.grid_size)
        } else {
            round_to_hundredths(value)
        }
    }
}

/// Floors a position to the grid.
pub fn snap_position(value: f64, grid_size: f64) -> f64 {
    (value / grid_size).floor() * grid_size
}

/// Rounds a size to the nearest grid multiple, never below one cell.
pub fn snap_size(value: f64, grid_size: f64) -> f64 {
    ((value / grid_size).round() * grid_size).max(grid_size)
}

/// Rounds to two decimal places.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{round_to_hundredths, snap_position, snap_size, SnapSettings};

    #[test]
    fn position_floors_and_size_rounds_with_minimum() {
        assert_eq!(snap_position(7.9, 2.0), 6.0);
        assert_eq!(snap_position(-0.5, 1.0), -1.0);
        assert_eq!(snap_size(4.9, 2.0), 4.0);
        assert_eq!(snap_size(5.0, 2.0), 6.0);
        assert_eq!(snap_size(0.3, 2.0), 2.0);
    }

    #[test]
    fn disabled_snapping_rounds_to_hundredths() {
        let settings = SnapSettings {
            enabled: false,
            grid_size: 5.0,
        };
        assert_eq!(settings.position(3.14159), 3.14);
        assert_eq!(settings.size(0.456), 0.46);
        assert_eq!(round_to_hundredths(2.0), 2.0);
    }
}
