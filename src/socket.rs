// can-sockopt/src/socket.rs
//
// Applies CAN_RAW socket options to raw CAN sockets.
//
// This file is part of the Rust 'can-sockopt' library.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Raw CAN sockets and the option applier.
//!
//! The [`OptionApplier`] is the piece of the network stack that services
//! `setsockopt(2)` and `getsockopt(2)` at the `SOL_CAN_RAW` level. For each
//! call it:
//!
//! 1. Resolves the option name, failing with `ENOPROTOOPT` if it's not a
//!    CAN_RAW option.
//! 2. Checks that the socket is a raw socket, failing with `ENOTCONN`
//!    otherwise.
//! 3. Decodes and validates the value buffer, failing with `EINVAL` if it
//!    has the wrong shape.
//! 4. Hands new filter lists to the driver through a [`FilterSink`], then
//!    stores the value in the socket's [`CanConnection`].
//!
//! A failed call leaves the connection exactly as it was.

use crate::{
    config::RawOptConfig,
    conn::CanConnection,
    constants::{ErrorClass, ERR_MASK_ALL, ERR_MASK_NONE},
    errors::to_return_code,
    filter::{encode_filters, CanFilter},
    option::{encode_flag, CanRawOption, OptionName},
    Result, SockOptError,
};
use itertools::Itertools;
use libc::{c_int, SOCK_DGRAM, SOCK_RAW, SOCK_SEQPACKET, SOCK_STREAM};
use std::collections::HashMap;

// ===== SocketType =====

/// The type a socket was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    /// SOCK_STREAM
    Stream,
    /// SOCK_DGRAM
    Dgram,
    /// SOCK_RAW
    Raw,
    /// SOCK_SEQPACKET
    SeqPacket,
    /// Any other type
    Other(c_int),
}

impl From<c_int> for SocketType {
    fn from(ty: c_int) -> Self {
        use SocketType::*;
        match ty {
            SOCK_STREAM => Stream,
            SOCK_DGRAM => Dgram,
            SOCK_RAW => Raw,
            SOCK_SEQPACKET => SeqPacket,
            n => Other(n),
        }
    }
}

impl From<SocketType> for c_int {
    fn from(ty: SocketType) -> Self {
        use SocketType::*;
        match ty {
            Stream => SOCK_STREAM,
            Dgram => SOCK_DGRAM,
            Raw => SOCK_RAW,
            SeqPacket => SOCK_SEQPACKET,
            Other(n) => n,
        }
    }
}

// ===== CanSocket =====

/// A CAN socket as seen by the option layer.
///
/// The socket owns its protocol state, so every option call reaches the
/// connection through the socket it was made on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanSocket {
    sock_type: SocketType,
    conn: CanConnection,
}

impl CanSocket {
    /// Creates a socket of the given type with a fresh connection.
    pub fn new<T: Into<SocketType>>(sock_type: T) -> Self {
        Self {
            sock_type: sock_type.into(),
            conn: CanConnection::new(),
        }
    }

    /// Creates a raw CAN socket.
    pub fn raw() -> Self {
        Self::new(SocketType::Raw)
    }

    /// The type the socket was opened with.
    pub fn sock_type(&self) -> SocketType {
        self.sock_type
    }

    /// The CAN_RAW protocol state.
    pub fn connection(&self) -> &CanConnection {
        &self.conn
    }

    fn check_raw(&self) -> Result<()> {
        if self.sock_type != SocketType::Raw {
            log::error!("Not a RAW CAN socket: {:?}", self.sock_type);
            return Err(SockOptError::NotConnected);
        }
        Ok(())
    }

    /// Reads an option value back into `buf`.
    ///
    /// On success returns the number of bytes written. Scalar values are
    /// truncated to the size of the buffer. The filter list is never
    /// truncated; a buffer too small for it fails with `OutOfRange`, which
    /// carries the required size. With no filters installed nothing is
    /// written.
    pub fn get_option(&self, option: c_int, buf: &mut [u8]) -> Result<usize> {
        let name = resolve_name(option)?;
        self.check_raw()?;

        let value = match name {
            OptionName::Filter => encode_filters(self.conn.filters()),
            OptionName::ErrFilter => self.conn.err_mask().bits().to_ne_bytes().to_vec(),
            OptionName::Loopback => encode_flag(self.conn.loopback()).to_vec(),
            OptionName::RecvOwnMsgs => encode_flag(self.conn.recv_own_msgs()).to_vec(),
            OptionName::FdFrames => encode_flag(self.conn.fd_frames()).to_vec(),
            OptionName::JoinFilters => encode_flag(self.conn.join_filters()).to_vec(),
        };

        if name == OptionName::Filter && buf.len() < value.len() {
            log::debug!(
                "{} needs {} bytes, buffer has {}",
                name,
                value.len(),
                buf.len()
            );
            return Err(SockOptError::OutOfRange {
                needed: value.len(),
            });
        }

        let n = value.len().min(buf.len());
        buf[..n].copy_from_slice(&value[..n]);
        Ok(n)
    }
}

fn resolve_name(option: c_int) -> Result<OptionName> {
    OptionName::try_from(option).map_err(|err| {
        log::error!("Unrecognized CAN option: {}", option);
        err
    })
}

// ===== Collaborators =====

/// The driver side of the CAN_RAW_FILTER option.
///
/// A sink receives each validated filter list before it replaces the one
/// in the connection, and does the actual frame matching. The connection
/// is passed in its state before the change. If the sink fails, the error
/// is returned to the caller and the connection keeps its old filters.
pub trait FilterSink {
    /// Installs a new (possibly empty) filter list for the connection.
    fn install_filters(&mut self, conn: &CanConnection, filters: &[CanFilter]) -> Result<()>;
}

impl<F> FilterSink for F
where
    F: FnMut(&CanConnection, &[CanFilter]) -> Result<()>,
{
    fn install_filters(&mut self, conn: &CanConnection, filters: &[CanFilter]) -> Result<()> {
        self(conn, filters)
    }
}

/// A filter sink for sockets that have no driver attached.
///
/// Every filter list is accepted as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FilterSink for NullSink {
    fn install_filters(&mut self, _conn: &CanConnection, _filters: &[CanFilter]) -> Result<()> {
        Ok(())
    }
}

/// A handle to a socket, as given out by the socket layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketHandle(pub c_int);

impl From<c_int> for SocketHandle {
    fn from(fd: c_int) -> Self {
        Self(fd)
    }
}

/// Lookup of sockets by handle.
///
/// Sockets are created and destroyed by the socket layer; the option layer
/// only looks them up.
pub trait SocketRegistry {
    /// Gets the socket for a handle.
    fn socket(&self, handle: SocketHandle) -> Option<&CanSocket>;

    /// Gets the socket for a handle for modification.
    fn socket_mut(&mut self, handle: SocketHandle) -> Option<&mut CanSocket>;

    /// Gets the CAN_RAW state of the socket for a handle.
    fn connection(&self, handle: SocketHandle) -> Option<&CanConnection> {
        self.socket(handle).map(CanSocket::connection)
    }
}

impl SocketRegistry for HashMap<SocketHandle, CanSocket> {
    fn socket(&self, handle: SocketHandle) -> Option<&CanSocket> {
        self.get(&handle)
    }

    fn socket_mut(&mut self, handle: SocketHandle) -> Option<&mut CanSocket> {
        self.get_mut(&handle)
    }
}

// ===== OptionApplier =====

/// Validates and applies CAN_RAW options.
#[derive(Debug)]
pub struct OptionApplier<S> {
    config: RawOptConfig,
    sink: S,
}

impl<S: FilterSink> OptionApplier<S> {
    /// Creates an applier with the default configuration.
    pub fn new(sink: S) -> Self {
        Self::with_config(RawOptConfig::default(), sink)
    }

    /// Creates an applier with the given configuration.
    pub fn with_config(config: RawOptConfig, sink: S) -> Self {
        Self { config, sink }
    }

    /// The configuration in use.
    pub fn config(&self) -> &RawOptConfig {
        &self.config
    }

    /// Gets a reference to the filter sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Gets a mutable reference to the filter sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Applies a raw option value to the socket.
    ///
    /// An unknown option fails with `UnsupportedOption` whatever the type
    /// of the socket. A known option on a socket that isn't raw fails with
    /// `NotConnected`, and a value of the wrong shape with
    /// `InvalidArgument`.
    pub fn apply(&mut self, sock: &mut CanSocket, option: c_int, value: &[u8]) -> Result<()> {
        let name = resolve_name(option)?;
        sock.check_raw()?;
        let opt = CanRawOption::decode(name, value, &self.config)?;
        self.install(sock, opt)
    }

    /// Applies an already decoded option to the socket.
    ///
    /// This performs the same checks as [`apply`](Self::apply), including
    /// the limit on the number of filters.
    ///
    /// Error masks are cut down to `CAN_ERR_MASK` as they are when decoded.
    pub fn apply_option(&mut self, sock: &mut CanSocket, opt: CanRawOption) -> Result<()> {
        sock.check_raw()?;
        let opt = match opt {
            CanRawOption::Filter(filters) if filters.len() > self.config.filter_max => {
                log::debug!(
                    "Too many CAN filters: {} > {}",
                    filters.len(),
                    self.config.filter_max
                );
                return Err(SockOptError::InvalidArgument);
            }
            CanRawOption::ErrFilter(mask) => {
                CanRawOption::ErrFilter(ErrorClass::from_mask(mask.bits()))
            }
            opt => opt,
        };
        self.install(sock, opt)
    }

    fn install(&mut self, sock: &mut CanSocket, opt: CanRawOption) -> Result<()> {
        if let CanRawOption::Filter(ref filters) = opt {
            self.sink.install_filters(&sock.conn, filters)?;
            log::trace!(
                "CAN filters: [{}]",
                filters.iter().map(|f| format!("{:X}", f)).join(", ")
            );
        }
        log::debug!("Applied {:?}", opt);
        sock.conn.store(opt);
        Ok(())
    }

    /// Applies a raw option to the socket with the given handle.
    ///
    /// Returns `0` on success, or a negated errno. A handle without a
    /// socket gives `-EBADF`.
    pub fn setsockopt<R>(
        &mut self,
        registry: &mut R,
        handle: SocketHandle,
        option: c_int,
        value: &[u8],
    ) -> c_int
    where
        R: SocketRegistry + ?Sized,
    {
        let res = match registry.socket_mut(handle) {
            Some(sock) => self.apply(sock, option, value),
            None => Err(SockOptError::BadDescriptor),
        };
        to_return_code(res)
    }

    /// Reads a raw option of the socket with the given handle into `buf`.
    ///
    /// Returns the number of bytes written, or a negated errno.
    pub fn getsockopt<R>(
        &self,
        registry: &R,
        handle: SocketHandle,
        option: c_int,
        buf: &mut [u8],
    ) -> c_int
    where
        R: SocketRegistry + ?Sized,
    {
        let res = registry
            .socket(handle)
            .ok_or(SockOptError::BadDescriptor)
            .and_then(|sock| sock.get_option(option, buf));

        match res {
            Ok(n) => c_int::try_from(n).unwrap_or(c_int::MAX),
            Err(err) => err.return_code(),
        }
    }

    /// Binds the applier to a socket, for setting options with the typed
    /// [`SocketOptions`] calls.
    pub fn bind<'a>(&'a mut self, sock: &'a mut CanSocket) -> BoundSocket<'a, S> {
        BoundSocket {
            applier: self,
            sock,
        }
    }
}

// ===== SocketOptions =====

/// Typed calls for setting CAN_RAW options.
///
/// Each call encodes its value the way an application would for
/// `setsockopt(2)` and passes it through
/// [`set_socket_option`](Self::set_socket_option), so the same
/// validation applies.
pub trait SocketOptions {
    /// Sets a raw option on the socket.
    fn set_socket_option(&mut self, name: c_int, value: &[u8]) -> Result<()>;

    /// Sets CAN ID filters on the socket.
    ///
    /// CAN frames are matched against these filters, only matching frames
    /// are delivered to the socket.
    fn set_filters<F>(&mut self, filters: &[F]) -> Result<()>
    where
        F: Into<CanFilter> + Copy,
    {
        let filters: Vec<CanFilter> = filters.iter().map(|f| (*f).into()).collect();
        self.set_socket_option(OptionName::Filter.as_raw(), &encode_filters(&filters))
    }

    /// Disable reception of CAN frames.
    ///
    /// Sets a completely empty filter; disabling all CAN frame reception.
    fn set_filter_drop_all(&mut self) -> Result<()> {
        self.set_socket_option(OptionName::Filter.as_raw(), &[])
    }

    /// Accept all frames, disabling any kind of filtering.
    fn set_filter_accept_all(&mut self) -> Result<()> {
        self.set_filters(&[CanFilter::accept_all()])
    }

    /// Sets the error mask on the socket.
    ///
    /// By default (`ERR_MASK_NONE`) no error conditions are reported as
    /// special error frames by the socket.
    fn set_error_filter(&mut self, mask: u32) -> Result<()> {
        self.set_socket_option(OptionName::ErrFilter.as_raw(), &mask.to_ne_bytes())
    }

    /// Sets the error mask on the socket to reject all errors.
    #[inline(always)]
    fn set_error_filter_drop_all(&mut self) -> Result<()> {
        self.set_error_filter(ERR_MASK_NONE)
    }

    /// Sets the error mask on the socket to accept all errors.
    #[inline(always)]
    fn set_error_filter_accept_all(&mut self) -> Result<()> {
        self.set_error_filter(ERR_MASK_ALL)
    }

    /// Enable or disable loopback.
    fn set_loopback(&mut self, enabled: bool) -> Result<()> {
        self.set_socket_option(OptionName::Loopback.as_raw(), &encode_flag(enabled))
    }

    /// Enable or disable receiving of own frames.
    fn set_recv_own_msgs(&mut self, enabled: bool) -> Result<()> {
        self.set_socket_option(OptionName::RecvOwnMsgs.as_raw(), &encode_flag(enabled))
    }

    /// Enable or disable CAN FD frames.
    fn set_fd_frames(&mut self, enabled: bool) -> Result<()> {
        self.set_socket_option(OptionName::FdFrames.as_raw(), &encode_flag(enabled))
    }

    /// Enable or disable join filters.
    ///
    /// By default a frame is accepted if it matches any of the filters. If
    /// join filters is enabled, a frame has to match _all_ filters.
    fn set_join_filters(&mut self, enabled: bool) -> Result<()> {
        self.set_socket_option(OptionName::JoinFilters.as_raw(), &encode_flag(enabled))
    }
}

/// A socket paired with the applier that sets its options.
#[derive(Debug)]
pub struct BoundSocket<'a, S> {
    applier: &'a mut OptionApplier<S>,
    sock: &'a mut CanSocket,
}

impl<S> BoundSocket<'_, S> {
    /// The socket the options are set on.
    pub fn socket(&self) -> &CanSocket {
        &*self.sock
    }
}

impl<S: FilterSink> SocketOptions for BoundSocket<'_, S> {
    fn set_socket_option(&mut self, name: c_int, value: &[u8]) -> Result<()> {
        self.applier.apply(&mut *self.sock, name, value)
    }
}

/////////////////////////////////////////////////////////////////////////////
