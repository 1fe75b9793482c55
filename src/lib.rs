// can-sockopt/src/lib.rs
//
// The main lib file for the Rust CAN socket option library.
//
// This file is part of the Rust 'can-sockopt' library.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! CAN_RAW socket options for a network stack.
//!
//! A raw CAN socket lets an application see the unprocessed frames on a
//! CAN bus. How those frames are selected and delivered is tuned through
//! socket options at the `SOL_CAN_RAW` level:
//!
//! - `CAN_RAW_FILTER` - the list of (id, mask) filters a frame must pass
//! - `CAN_RAW_ERR_FILTER` - which error classes arrive as error frames
//! - `CAN_RAW_LOOPBACK` - whether sent frames are looped back locally
//! - `CAN_RAW_RECV_OWN_MSGS` - whether the sender gets its own frames
//! - `CAN_RAW_FD_FRAMES` - whether CAN FD frames are allowed
//! - `CAN_RAW_JOIN_FILTERS` - whether all filters, rather than any, must
//!   match
//!
//! This crate is the stack side of those options. It checks the socket,
//! decodes and validates the application's value buffer into a
//! [`CanRawOption`], and stores it in the socket's [`CanConnection`].
//! Filter lists are handed to the driver through a [`FilterSink`], which
//! does the actual matching of frames.
//!
//! Every failure maps to a POSIX errno, so that the socket call can return
//! it to the application directly:
//!
//! ```
//! use can_sockopt::{CanSocket, NullSink, OptionApplier, SockOptError, CAN_RAW_LOOPBACK};
//!
//! let mut applier = OptionApplier::new(NullSink);
//! let mut sock = CanSocket::raw();
//!
//! applier.apply(&mut sock, CAN_RAW_LOOPBACK, &0i32.to_ne_bytes()).unwrap();
//! assert!(!sock.connection().loopback());
//!
//! let res = applier.apply(&mut sock, CAN_RAW_LOOPBACK, &[0]);
//! assert_eq!(res, Err(SockOptError::InvalidArgument));
//! assert_eq!(res.unwrap_err().return_code(), -libc::EINVAL);
//! ```

// clippy: do not warn about things like "SocketCAN" inside the docs
#![allow(clippy::doc_markdown)]
#![deny(
    missing_docs,
    missing_debug_implementations,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

pub mod config;
pub use config::RawOptConfig;

pub mod conn;
pub use conn::CanConnection;

pub mod constants;
pub use constants::{
    ErrorClass, CAN_RAW_ERR_FILTER, CAN_RAW_FD_FRAMES, CAN_RAW_FILTER, CAN_RAW_FILTER_MAX,
    CAN_RAW_JOIN_FILTERS, CAN_RAW_LOOPBACK, CAN_RAW_RECV_OWN_MSGS, ERR_MASK_ALL, ERR_MASK_NONE,
    SOL_CAN_RAW,
};

pub mod errors;
pub use errors::{to_return_code, Result, SockOptError};

pub mod filter;
pub use filter::{CanFilter, FILTER_RECORD_SIZE};

pub mod option;
pub use option::{CanRawOption, OptionName};

pub mod socket;
pub use socket::{
    BoundSocket, CanSocket, FilterSink, NullSink, OptionApplier, SocketHandle, SocketOptions,
    SocketRegistry, SocketType,
};
