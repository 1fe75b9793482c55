// can-sockopt/src/errors.rs
//
// Errors for the CAN_RAW socket option layer.
//
// This file is part of the Rust 'can-sockopt' library.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Socket option errors.
//!
//! Every failure of the option layer maps onto a POSIX errno value, so that
//! the socket call above can hand the negated code straight back to the
//! application:
//!
//! ```text
//! NotConnected      => ENOTCONN     (not a raw CAN socket)
//! InvalidArgument   => EINVAL       (bad value size/shape, too many filters)
//! UnsupportedOption => ENOPROTOOPT  (unknown CAN_RAW option)
//! OutOfRange        => ERANGE       (read-back buffer too small)
//! BadDescriptor     => EBADF        (no socket for the handle)
//! ```

use libc::{c_int, EBADF, EINVAL, ENOPROTOOPT, ENOTCONN, ERANGE};
use std::io;
use thiserror::Error;

/// A result type for socket option calls.
pub type Result<T> = std::result::Result<T, SockOptError>;

/// An error applying or reading a CAN_RAW socket option.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockOptError {
    /// The socket is not a raw CAN socket
    #[error("Not a RAW CAN socket")]
    NotConnected,
    /// The option value has the wrong size or shape
    #[error("Invalid option value")]
    InvalidArgument,
    /// The option is not part of the CAN_RAW set
    #[error("Unrecognized CAN option: {0}")]
    UnsupportedOption(c_int),
    /// The buffer is too small to hold the option value
    #[error("Buffer too small, {needed} bytes required")]
    OutOfRange {
        /// The number of bytes the value needs
        needed: usize,
    },
    /// No socket is registered for the handle
    #[error("Bad socket descriptor")]
    BadDescriptor,
}

impl SockOptError {
    /// Gets the (positive) errno value for the error.
    pub fn errno(&self) -> c_int {
        use SockOptError::*;
        match *self {
            NotConnected => ENOTCONN,
            InvalidArgument => EINVAL,
            UnsupportedOption(_) => ENOPROTOOPT,
            OutOfRange { .. } => ERANGE,
            BadDescriptor => EBADF,
        }
    }

    /// Gets the negated errno, as returned from the socket call.
    #[inline]
    pub fn return_code(&self) -> c_int {
        -self.errno()
    }
}

impl From<SockOptError> for io::Error {
    fn from(err: SockOptError) -> Self {
        io::Error::from_raw_os_error(err.errno())
    }
}

/// Converts an option result into the integer a socket call returns.
///
/// This is `0` on success or a negated errno on failure.
pub fn to_return_code(res: Result<()>) -> c_int {
    match res {
        Ok(()) => 0,
        Err(err) => err.return_code(),
    }
}
