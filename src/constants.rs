// can-sockopt/src/constants.rs
//
// CAN_RAW protocol constants and the error class mask.
//
// This file is part of the Rust 'can-sockopt' library.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Constants for the CAN_RAW option level.
//!
//! The option identifiers and frame sizes come straight from the libc
//! bindings of the Linux headers, so that values handed over by an
//! application match what it would pass to `setsockopt(2)`.

use bitflags::bitflags;
use libc::can_err_mask_t;

pub use libc::{
    CANFD_MTU, CAN_EFF_FLAG, CAN_ERR_MASK, CAN_INV_FILTER, CAN_MTU, CAN_RAW, CAN_RAW_ERR_FILTER,
    CAN_RAW_FD_FRAMES, CAN_RAW_FILTER, CAN_RAW_JOIN_FILTERS, CAN_RAW_LOOPBACK,
    CAN_RAW_RECV_OWN_MSGS, SOL_CAN_BASE, SOL_CAN_RAW,
};

/// Upper bound on the number of filters in one CAN_RAW_FILTER call.
///
/// From `linux/can/raw.h`.
pub const CAN_RAW_FILTER_MAX: usize = 512;

/// An error mask that will cause the socket to report all errors
pub const ERR_MASK_ALL: u32 = CAN_ERR_MASK;

/// An error mask that will cause the socket to silently drop all errors
pub const ERR_MASK_NONE: u32 = 0;

bitflags! {
    /// The error classes that can be selected with CAN_RAW_ERR_FILTER.
    ///
    /// These are the bits of the CAN ID of an error frame, as defined in
    /// `linux/can/error.h`.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ErrorClass: can_err_mask_t {
        /// TX timeout (by netdevice driver)
        const TX_TIMEOUT = 0x0000_0001;
        /// Lost arbitration
        const LOST_ARBITRATION = 0x0000_0002;
        /// Controller problems
        const CONTROLLER = 0x0000_0004;
        /// Protocol violations
        const PROTOCOL = 0x0000_0008;
        /// Transceiver status
        const TRANSCEIVER = 0x0000_0010;
        /// Received no ACK on transmission
        const NO_ACK = 0x0000_0020;
        /// Bus off
        const BUS_OFF = 0x0000_0040;
        /// Bus error (may flood!)
        const BUS_ERROR = 0x0000_0080;
        /// Controller restarted
        const RESTARTED = 0x0000_0100;
        /// TX error counter / RX error counter available
        const COUNTERS = 0x0000_0200;
    }
}

impl ErrorClass {
    /// Creates a class mask from a raw error mask.
    ///
    /// Bits outside of `CAN_ERR_MASK` are dropped, bits inside it are kept
    /// even when they don't name a known class.
    pub fn from_mask(mask: u32) -> Self {
        Self::from_bits_retain(mask & CAN_ERR_MASK)
    }
}
