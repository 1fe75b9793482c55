// can-sockopt/src/filter.rs
//
// CAN ID filters and the CAN_RAW_FILTER record array.
//
// This file is part of the Rust 'can-sockopt' library.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! CAN ID filters.
//!
//! The value of the CAN_RAW_FILTER option is an array of `can_filter`
//! records, each an (id, mask) pair of native-endian 32-bit words:
//!
//! ```text
//! +--------+--------+--------+--------+ ...
//! | can_id |can_mask| can_id |can_mask|
//! +--------+--------+--------+--------+ ...
//!  \--- filter 0 ---/ \--- filter 1 ---/
//! ```
//!
//! The array may be empty, which installs no filters at all.

use crate::{
    constants::{CAN_EFF_FLAG, CAN_INV_FILTER},
    Result, SockOptError,
};
use embedded_can::Id;
use libc::canid_t;
use std::{fmt, mem::size_of};

/// The size, in bytes, of a single filter record.
pub const FILTER_RECORD_SIZE: usize = size_of::<libc::can_filter>();

/// Gets the canid_t value from an Id.
/// If it's an extended ID, the CAN_EFF_FLAG bit is also set.
pub fn id_to_canid_t(id: impl Into<Id>) -> canid_t {
    match id.into() {
        Id::Standard(id) => id.as_raw() as canid_t,
        Id::Extended(id) => id.as_raw() | CAN_EFF_FLAG,
    }
}

// ===== CanFilter =====

/// The CAN filter defines which ID's can be accepted on a socket.
///
/// Each filter contains an internal id and mask. Packets are considered to
/// be matched by a filter if `received_id & mask == filter_id & mask` holds
/// true. The match is inverted when the `CAN_INV_FILTER` bit is set in the
/// id. Matching itself is done by the driver the filters are handed to.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct CanFilter(libc::can_filter);

impl CanFilter {
    /// Construct a new CAN filter.
    pub fn new(id: canid_t, mask: canid_t) -> Self {
        Self(libc::can_filter {
            can_id: id,
            can_mask: mask,
        })
    }

    /// Construct a new inverted CAN filter.
    pub fn new_inverted(id: canid_t, mask: canid_t) -> Self {
        Self::new(id | CAN_INV_FILTER, mask)
    }

    /// Construct a filter from a standard or extended identifier.
    pub fn from_id(id: impl Into<Id>, mask: canid_t) -> Self {
        Self::new(id_to_canid_t(id), mask)
    }

    /// A filter that accepts every frame.
    pub fn accept_all() -> Self {
        Self::new(0, 0)
    }

    /// The id word, including the flag bits.
    #[inline]
    pub fn id(&self) -> canid_t {
        self.0.can_id
    }

    /// The mask word.
    #[inline]
    pub fn mask(&self) -> canid_t {
        self.0.can_mask
    }

    /// Whether the filter rejects the frames it matches.
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.0.can_id & CAN_INV_FILTER != 0
    }

    fn read_from(rec: &[u8]) -> Self {
        let mut id = [0u8; 4];
        let mut mask = [0u8; 4];
        id.copy_from_slice(&rec[..4]);
        mask.copy_from_slice(&rec[4..FILTER_RECORD_SIZE]);
        Self::new(canid_t::from_ne_bytes(id), canid_t::from_ne_bytes(mask))
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0.can_id.to_ne_bytes());
        buf.extend_from_slice(&self.0.can_mask.to_ne_bytes());
    }
}

impl Default for CanFilter {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl From<libc::can_filter> for CanFilter {
    fn from(filt: libc::can_filter) -> Self {
        Self(filt)
    }
}

impl From<(u32, u32)> for CanFilter {
    fn from(filt: (u32, u32)) -> Self {
        CanFilter::new(filt.0, filt.1)
    }
}

impl AsRef<libc::can_filter> for CanFilter {
    fn as_ref(&self) -> &libc::can_filter {
        &self.0
    }
}

impl fmt::UpperHex for CanFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}/{:08X}", self.0.can_id, self.0.can_mask)
    }
}

// ===== Record array =====

/// Decodes a CAN_RAW_FILTER value into a list of filters.
///
/// The length of `value` must be a whole number of filter records, and
/// the number of records may not exceed `max`. Either violation fails with
/// `InvalidArgument` before anything is decoded.
pub fn decode_filters(value: &[u8], max: usize) -> Result<Vec<CanFilter>> {
    if value.len() % FILTER_RECORD_SIZE != 0 {
        log::debug!(
            "CAN filter length {} is not a multiple of {}",
            value.len(),
            FILTER_RECORD_SIZE
        );
        return Err(SockOptError::InvalidArgument);
    }

    let count = value.len() / FILTER_RECORD_SIZE;
    if count > max {
        log::debug!("Too many CAN filters: {} > {}", count, max);
        return Err(SockOptError::InvalidArgument);
    }

    Ok(value
        .chunks_exact(FILTER_RECORD_SIZE)
        .map(CanFilter::read_from)
        .collect())
}

/// Encodes a list of filters as a CAN_RAW_FILTER value.
pub fn encode_filters(filters: &[CanFilter]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(filters.len() * FILTER_RECORD_SIZE);
    for filter in filters {
        filter.write_to(&mut buf);
    }
    buf
}

/////////////////////////////////////////////////////////////////////////////
