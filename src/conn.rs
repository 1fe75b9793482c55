// can-sockopt/src/conn.rs
//
// Per-socket CAN_RAW protocol state.
//
// This file is part of the Rust 'can-sockopt' library.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! The CAN_RAW connection.

use crate::{
    constants::{ErrorClass, CANFD_MTU, CAN_MTU},
    filter::CanFilter,
    option::CanRawOption,
};

/// The CAN_RAW protocol state of one socket.
///
/// A new connection starts out like a freshly opened Linux raw CAN socket:
/// a single filter that accepts every frame, no error frames, loopback on,
/// and everything else off.
///
/// The state can only be changed through the option applier, which holds
/// the socket exclusively while doing so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanConnection {
    filters: Vec<CanFilter>,
    err_mask: ErrorClass,
    loopback: bool,
    recv_own_msgs: bool,
    fd_frames: bool,
    join_filters: bool,
}

impl CanConnection {
    /// Creates the state for a newly opened socket.
    pub fn new() -> Self {
        Self::default()
    }

    /// The installed ID filters.
    pub fn filters(&self) -> &[CanFilter] {
        &self.filters
    }

    /// The error classes delivered to the socket.
    pub fn err_mask(&self) -> ErrorClass {
        self.err_mask
    }

    /// Whether sent frames are looped back to other local sockets.
    pub fn loopback(&self) -> bool {
        self.loopback
    }

    /// Whether the socket receives the frames it sent itself.
    pub fn recv_own_msgs(&self) -> bool {
        self.recv_own_msgs
    }

    /// Whether CAN FD frames may be sent and received.
    pub fn fd_frames(&self) -> bool {
        self.fd_frames
    }

    /// Whether a frame must match all filters instead of any one.
    pub fn join_filters(&self) -> bool {
        self.join_filters
    }

    /// The largest frame the socket transfers.
    pub fn mtu(&self) -> usize {
        if self.fd_frames {
            CANFD_MTU
        } else {
            CAN_MTU
        }
    }

    /// Stores a validated option value.
    pub(crate) fn store(&mut self, opt: CanRawOption) {
        use CanRawOption::*;
        match opt {
            Filter(filters) => self.filters = filters,
            ErrFilter(mask) => self.err_mask = mask,
            Loopback(on) => self.loopback = on,
            RecvOwnMsgs(on) => self.recv_own_msgs = on,
            FdFrames(on) => self.fd_frames = on,
            JoinFilters(on) => self.join_filters = on,
        }
    }
}

impl Default for CanConnection {
    fn default() -> Self {
        Self {
            filters: vec![CanFilter::accept_all()],
            err_mask: ErrorClass::empty(),
            loopback: true,
            recv_own_msgs: false,
            fd_frames: false,
            join_filters: false,
        }
    }
}
