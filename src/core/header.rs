//! # CSP Header Codec
//!
//! Extracts the routing fields of a CubeSat Space Protocol header from a raw frame.
//!
//! Two header layouts are in use on CSP buses, both big-endian:
//! ```text
//! v1 (32 bit): pri:2 | src:5  | dst:5  | dport:6 | sport:6 | flags:8
//! v2 (48 bit): pri:2 | dst:14 | src:14 | dport:6 | sport:6 | flags:6
//! ```
//!
//! Decoding is pure. The capture tap only calls it for frames that passed the
//! minimum-length check; a frame that is long enough for the tap but still shorter
//! than the selected header (5 bytes under v2) is rejected here.

use std::fmt;

use crate::error::{ProxyError, Result};

const V1_HEADER_LEN: usize = 4;
const V2_HEADER_LEN: usize = 6;

/// CSP header layout version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CspVersion {
    V1,
    V2,
}

impl CspVersion {
    pub fn header_len(self) -> usize {
        match self {
            CspVersion::V1 => V1_HEADER_LEN,
            CspVersion::V2 => V2_HEADER_LEN,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            CspVersion::V1 => 1,
            CspVersion::V2 => 2,
        }
    }
}

impl TryFrom<u8> for CspVersion {
    type Error = ProxyError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(CspVersion::V1),
            2 => Ok(CspVersion::V2),
            other => Err(ProxyError::UnsupportedVersion(other)),
        }
    }
}

/// Decoded CSP header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CspHeader {
    pub pri: u8,
    pub src: u16,
    pub dst: u16,
    pub dport: u8,
    pub sport: u8,
    pub flags: u8,
    /// Payload bytes following the header
    pub length: u16,
}

impl CspHeader {
    /// Encode the header fields for `version`. Fields wider than the layout allows
    /// are masked.
    pub fn to_bytes(&self, version: CspVersion) -> Vec<u8> {
        match version {
            CspVersion::V1 => {
                let id: u32 = ((self.pri as u32 & 0x3) << 30)
                    | ((self.src as u32 & 0x1F) << 25)
                    | ((self.dst as u32 & 0x1F) << 20)
                    | ((self.dport as u32 & 0x3F) << 14)
                    | ((self.sport as u32 & 0x3F) << 8)
                    | (self.flags as u32);
                id.to_be_bytes().to_vec()
            }
            CspVersion::V2 => {
                let id: u64 = ((self.pri as u64 & 0x3) << 46)
                    | ((self.dst as u64 & 0x3FFF) << 32)
                    | ((self.src as u64 & 0x3FFF) << 18)
                    | ((self.dport as u64 & 0x3F) << 12)
                    | ((self.sport as u64 & 0x3F) << 6)
                    | (self.flags as u64 & 0x3F);
                id.to_be_bytes()[2..].to_vec()
            }
        }
    }
}

impl fmt::Display for CspHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet: Src {}, Dst {}, Dport {}, Sport {}, Pri {}, Flags 0x{:02X}, Size {}",
            self.src, self.dst, self.dport, self.sport, self.pri, self.flags, self.length
        )
    }
}

/// Something that can pull a [`CspHeader`] out of a raw frame.
///
/// Implementations must be pure: no I/O, no state changes.
pub trait HeaderCodec: Send + Sync {
    fn version(&self) -> CspVersion;

    fn decode(&self, frame: &[u8]) -> Result<CspHeader>;
}

/// Built-in codec for CSP v1 and v2 headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CspCodec {
    version: CspVersion,
}

impl CspCodec {
    pub fn new(version: CspVersion) -> Self {
        Self { version }
    }
}

impl HeaderCodec for CspCodec {
    fn version(&self) -> CspVersion {
        self.version
    }

    fn decode(&self, frame: &[u8]) -> Result<CspHeader> {
        let header_len = self.version.header_len();
        if frame.len() < header_len {
            return Err(ProxyError::FrameTooShort(frame.len()));
        }
        let length = u16::try_from(frame.len() - header_len).unwrap_or(u16::MAX);

        let header = match self.version {
            CspVersion::V1 => {
                let id = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
                CspHeader {
                    pri: ((id >> 30) & 0x3) as u8,
                    src: ((id >> 25) & 0x1F) as u16,
                    dst: ((id >> 20) & 0x1F) as u16,
                    dport: ((id >> 14) & 0x3F) as u8,
                    sport: ((id >> 8) & 0x3F) as u8,
                    flags: (id & 0xFF) as u8,
                    length,
                }
            }
            CspVersion::V2 => {
                let id = u64::from_be_bytes([
                    0, 0, frame[0], frame[1], frame[2], frame[3], frame[4], frame[5],
                ]);
                CspHeader {
                    pri: ((id >> 46) & 0x3) as u8,
                    dst: ((id >> 32) & 0x3FFF) as u16,
                    src: ((id >> 18) & 0x3FFF) as u16,
                    dport: ((id >> 12) & 0x3F) as u8,
                    sport: ((id >> 6) & 0x3F) as u8,
                    flags: (id & 0x3F) as u8,
                    length,
                }
            }
        };

        Ok(header)
    }
}

/// Codec for a version tag as given on the command line.
pub fn codec_for(tag: u8) -> Result<Box<dyn HeaderCodec>> {
    let version = CspVersion::try_from(tag)?;
    Ok(Box::new(CspCodec::new(version)))
}
