// can-sockopt/src/option.rs
//
// The CAN_RAW socket options and their value encodings.
//
// This file is part of the Rust 'can-sockopt' library.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! CAN_RAW socket options.
//!
//! An application hands an option to the socket layer as an integer name
//! and an untyped value buffer. This module turns the pair into a
//! [`CanRawOption`], validating the buffer against the shape the option
//! expects:
//!
//! ```text
//! CAN_RAW_FILTER         can_filter[N]    N * 8 bytes, N <= filter_max
//! CAN_RAW_ERR_FILTER     can_err_mask_t   exactly 4 bytes
//! CAN_RAW_LOOPBACK       int              exactly sizeof(int)
//! CAN_RAW_RECV_OWN_MSGS  int              exactly sizeof(int)
//! CAN_RAW_FD_FRAMES      int              exactly sizeof(int)
//! CAN_RAW_JOIN_FILTERS   int              exactly sizeof(int)
//! ```

use crate::{
    config::RawOptConfig,
    constants::{
        ErrorClass, CAN_RAW_ERR_FILTER, CAN_RAW_FD_FRAMES, CAN_RAW_FILTER, CAN_RAW_JOIN_FILTERS,
        CAN_RAW_LOOPBACK, CAN_RAW_RECV_OWN_MSGS,
    },
    filter::{decode_filters, encode_filters, CanFilter},
    Result, SockOptError,
};
use libc::{c_int, can_err_mask_t};
use std::{fmt, mem::size_of};

/// Size of the value of a boolean option.
pub const FLAG_SIZE: usize = size_of::<c_int>();

/// Size of the value of the error filter option.
pub const ERR_MASK_SIZE: usize = size_of::<can_err_mask_t>();

// ===== OptionName =====

/// The name of a CAN_RAW socket option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionName {
    /// CAN_RAW_FILTER: the list of ID filters
    Filter,
    /// CAN_RAW_ERR_FILTER: the error class mask
    ErrFilter,
    /// CAN_RAW_LOOPBACK: local loopback of sent frames
    Loopback,
    /// CAN_RAW_RECV_OWN_MSGS: receive the socket's own frames
    RecvOwnMsgs,
    /// CAN_RAW_FD_FRAMES: allow CAN FD frames
    FdFrames,
    /// CAN_RAW_JOIN_FILTERS: all filters must match
    JoinFilters,
}

impl OptionName {
    /// The numeric option name, as used with `setsockopt(2)`.
    pub fn as_raw(&self) -> c_int {
        use OptionName::*;
        match *self {
            Filter => CAN_RAW_FILTER,
            ErrFilter => CAN_RAW_ERR_FILTER,
            Loopback => CAN_RAW_LOOPBACK,
            RecvOwnMsgs => CAN_RAW_RECV_OWN_MSGS,
            FdFrames => CAN_RAW_FD_FRAMES,
            JoinFilters => CAN_RAW_JOIN_FILTERS,
        }
    }
}

impl TryFrom<c_int> for OptionName {
    type Error = SockOptError;

    fn try_from(name: c_int) -> Result<Self> {
        use OptionName::*;
        Ok(match name {
            CAN_RAW_FILTER => Filter,
            CAN_RAW_ERR_FILTER => ErrFilter,
            CAN_RAW_LOOPBACK => Loopback,
            CAN_RAW_RECV_OWN_MSGS => RecvOwnMsgs,
            CAN_RAW_FD_FRAMES => FdFrames,
            CAN_RAW_JOIN_FILTERS => JoinFilters,
            _ => return Err(SockOptError::UnsupportedOption(name)),
        })
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use OptionName::*;
        let name = match *self {
            Filter => "CAN_RAW_FILTER",
            ErrFilter => "CAN_RAW_ERR_FILTER",
            Loopback => "CAN_RAW_LOOPBACK",
            RecvOwnMsgs => "CAN_RAW_RECV_OWN_MSGS",
            FdFrames => "CAN_RAW_FD_FRAMES",
            JoinFilters => "CAN_RAW_JOIN_FILTERS",
        };
        f.write_str(name)
    }
}

// ===== CanRawOption =====

/// A CAN_RAW socket option with its validated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanRawOption {
    /// Replace the ID filters. An empty list receives no data frames.
    Filter(Vec<CanFilter>),
    /// Select the error classes delivered as error frames.
    ErrFilter(ErrorClass),
    /// Enable or disable local loopback.
    Loopback(bool),
    /// Enable or disable reception of the socket's own frames.
    RecvOwnMsgs(bool),
    /// Enable or disable CAN FD frames.
    FdFrames(bool),
    /// Enable or disable joining (AND-ing) of the filters.
    JoinFilters(bool),
}

impl CanRawOption {
    /// Decodes the value buffer for the named option.
    ///
    /// Fails with `InvalidArgument` if the buffer does not have the shape
    /// the option requires.
    pub fn decode(name: OptionName, value: &[u8], config: &RawOptConfig) -> Result<Self> {
        use OptionName::*;
        Ok(match name {
            Filter => Self::Filter(decode_filters(value, config.filter_max)?),
            ErrFilter => Self::ErrFilter(ErrorClass::from_mask(decode_err_mask(value)?)),
            Loopback => Self::Loopback(decode_flag(name, value)?),
            RecvOwnMsgs => Self::RecvOwnMsgs(decode_flag(name, value)?),
            FdFrames => Self::FdFrames(decode_flag(name, value)?),
            JoinFilters => Self::JoinFilters(decode_flag(name, value)?),
        })
    }

    /// Decodes a raw option name and value buffer.
    ///
    /// An unknown name fails with `UnsupportedOption`.
    pub fn from_raw(name: c_int, value: &[u8], config: &RawOptConfig) -> Result<Self> {
        Self::decode(OptionName::try_from(name)?, value, config)
    }

    /// The name of the option.
    pub fn name(&self) -> OptionName {
        use CanRawOption::*;
        match *self {
            Filter(_) => OptionName::Filter,
            ErrFilter(_) => OptionName::ErrFilter,
            Loopback(_) => OptionName::Loopback,
            RecvOwnMsgs(_) => OptionName::RecvOwnMsgs,
            FdFrames(_) => OptionName::FdFrames,
            JoinFilters(_) => OptionName::JoinFilters,
        }
    }

    /// Encodes the value as the buffer an application passes to
    /// `setsockopt(2)`.
    pub fn encode(&self) -> Vec<u8> {
        use CanRawOption::*;
        match self {
            Filter(filters) => encode_filters(filters),
            ErrFilter(mask) => mask.bits().to_ne_bytes().to_vec(),
            Loopback(on) | RecvOwnMsgs(on) | FdFrames(on) | JoinFilters(on) => {
                encode_flag(*on).to_vec()
            }
        }
    }
}

/// Encodes a boolean option value as a C `int`.
#[inline]
pub fn encode_flag(on: bool) -> [u8; FLAG_SIZE] {
    c_int::from(on).to_ne_bytes()
}

fn decode_flag(name: OptionName, value: &[u8]) -> Result<bool> {
    let buf: [u8; FLAG_SIZE] = value.try_into().map_err(|_| {
        log::debug!(
            "{} value is {} bytes, expected {}",
            name,
            value.len(),
            FLAG_SIZE
        );
        SockOptError::InvalidArgument
    })?;
    Ok(c_int::from_ne_bytes(buf) != 0)
}

fn decode_err_mask(value: &[u8]) -> Result<can_err_mask_t> {
    let buf: [u8; ERR_MASK_SIZE] = value.try_into().map_err(|_| {
        log::debug!(
            "CAN_RAW_ERR_FILTER value is {} bytes, expected {}",
            value.len(),
            ERR_MASK_SIZE
        );
        SockOptError::InvalidArgument
    })?;
    Ok(can_err_mask_t::from_ne_bytes(buf))
}

/////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::{CAN_ERR_MASK, ERR_MASK_ALL};

    const NAMES: [OptionName; 6] = [
        OptionName::Filter,
        OptionName::ErrFilter,
        OptionName::Loopback,
        OptionName::RecvOwnMsgs,
        OptionName::FdFrames,
        OptionName::JoinFilters,
    ];

    #[test]
    fn test_option_names() {
        for name in NAMES {
            assert_eq!(OptionName::try_from(name.as_raw()), Ok(name));
        }
        assert_eq!(
            OptionName::try_from(0),
            Err(SockOptError::UnsupportedOption(0))
        );
        assert_eq!(
            OptionName::try_from(99),
            Err(SockOptError::UnsupportedOption(99))
        );
        assert_eq!(OptionName::FdFrames.to_string(), "CAN_RAW_FD_FRAMES");
    }

    #[test]
    fn test_decode_flags() {
        let cfg = RawOptConfig::default();

        let opt = CanRawOption::decode(OptionName::Loopback, &encode_flag(false), &cfg).unwrap();
        assert_eq!(opt, CanRawOption::Loopback(false));

        // Any non-zero int enables the option
        let opt =
            CanRawOption::decode(OptionName::JoinFilters, &7i32.to_ne_bytes(), &cfg).unwrap();
        assert_eq!(opt, CanRawOption::JoinFilters(true));

        let opt = CanRawOption::decode(OptionName::FdFrames, &encode_flag(true), &cfg).unwrap();
        assert_eq!(opt.name(), OptionName::FdFrames);
    }

    #[test]
    fn test_decode_flag_bad_size() {
        let cfg = RawOptConfig::default();

        for name in [
            OptionName::Loopback,
            OptionName::RecvOwnMsgs,
            OptionName::FdFrames,
            OptionName::JoinFilters,
        ] {
            for value in [&[][..], &[1][..], &[1, 0][..], &[1, 0, 0, 0, 0][..]] {
                assert_eq!(
                    CanRawOption::decode(name, value, &cfg),
                    Err(SockOptError::InvalidArgument)
                );
            }
        }
    }

    #[test]
    fn test_decode_err_filter() {
        let cfg = RawOptConfig::default();

        let opt =
            CanRawOption::decode(OptionName::ErrFilter, &ERR_MASK_ALL.to_ne_bytes(), &cfg).unwrap();
        assert_eq!(opt, CanRawOption::ErrFilter(ErrorClass::from_mask(CAN_ERR_MASK)));

        let opt =
            CanRawOption::decode(OptionName::ErrFilter, &u32::MAX.to_ne_bytes(), &cfg).unwrap();
        assert_eq!(opt, CanRawOption::ErrFilter(ErrorClass::from_mask(CAN_ERR_MASK)));

        assert_eq!(
            CanRawOption::decode(OptionName::ErrFilter, &[0, 0], &cfg),
            Err(SockOptError::InvalidArgument)
        );
    }

    #[test]
    fn test_decode_filter_limit() {
        let cfg = RawOptConfig::default().with_filter_max(2);
        let value = encode_filters(&[CanFilter::accept_all(); 3]);

        assert_eq!(
            CanRawOption::decode(OptionName::Filter, &value, &cfg),
            Err(SockOptError::InvalidArgument)
        );
        assert_eq!(
            CanRawOption::decode(OptionName::Filter, &value[..16], &cfg),
            Ok(CanRawOption::Filter(vec![CanFilter::accept_all(); 2]))
        );
    }

    #[test]
    fn test_from_raw_unknown() {
        let cfg = RawOptConfig::default();
        assert_eq!(
            CanRawOption::from_raw(1000, &encode_flag(true), &cfg),
            Err(SockOptError::UnsupportedOption(1000))
        );
    }

    #[test]
    fn test_encode() {
        assert_eq!(CanRawOption::RecvOwnMsgs(true).encode(), 1i32.to_ne_bytes());
        assert_eq!(CanRawOption::Filter(vec![]).encode(), Vec::<u8>::new());
        assert_eq!(
            CanRawOption::ErrFilter(ErrorClass::BUS_OFF).encode(),
            0x40u32.to_ne_bytes()
        );
    }
}
