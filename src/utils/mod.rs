//! Common utilities and helpers

pub mod path;

/// Utility functions for SignClip
pub struct Utils;

impl Utils {
    /// Percentage of `part` in `total`, zero when nothing is counted
    pub fn percentage(part: u64, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            part as f64 / total as f64 * 100.0
        }
    }
}
