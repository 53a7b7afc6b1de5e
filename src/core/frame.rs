use bytes::Bytes;

use crate::config::MIN_FRAME_LEN;

/// One encapsulated CSP packet as received from the bus.
///
/// Frames are never shared between the relay and the tap; every subscriber
/// gets its own copy from the transport. Cloning only bumps a refcount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Too short to hold any CSP header.
    #[inline]
    pub fn is_runt(&self) -> bool {
        self.data.len() < MIN_FRAME_LEN
    }

    #[inline]
    pub fn exceeds(&self, max_frame_size: usize) -> bool {
        self.data.len() > max_frame_size
    }

    /// Space separated hex bytes, 16 per line.
    pub fn hex_dump(&self) -> String {
        self.data
            .chunks(16)
            .enumerate()
            .map(|(i, chunk)| {
                let bytes: String = chunk.iter().map(|b| format!(" {b:02x}")).collect();
                format!("{:04x}:{bytes}", i * 16)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Bytes> for Frame {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

impl From<Vec<u8>> for Frame {
    fn from(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }
}

impl From<&'static [u8]> for Frame {
    fn from(data: &'static [u8]) -> Self {
        Self {
            data: Bytes::from_static(data),
        }
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
