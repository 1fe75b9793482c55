// can-sockopt/src/config.rs
//
// Configuration of the CAN_RAW option layer.
//
// This file is part of the Rust 'can-sockopt' library.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Option layer configuration.

use crate::constants::CAN_RAW_FILTER_MAX;

/// Limits applied when decoding option values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOptConfig {
    /// The maximum number of filters accepted in one CAN_RAW_FILTER call.
    pub filter_max: usize,
}

impl RawOptConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of filters per CAN_RAW_FILTER call.
    pub fn with_filter_max(mut self, filter_max: usize) -> Self {
        self.filter_max = filter_max;
        self
    }
}

impl Default for RawOptConfig {
    fn default() -> Self {
        Self {
            filter_max: CAN_RAW_FILTER_MAX,
        }
    }
}
