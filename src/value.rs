//! The value envelope stored against every key.
//!
//! Each stored value carries two optional payloads: an opaque typed handle
//! (a reference to a host value, possibly absent) and a byte slice
//! (possibly absent). Either, both, or neither may be set. The cache never
//! interprets either payload except for the int64 helper path, which
//! simply reads/writes 8 little-endian bytes into the `bytes` payload.

use std::any::Any;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};

/// An opaque, type-erased handle to a host value.
pub type Opaque = Arc<dyn Any + Send + Sync>;

/// Value envelope stored in a bucket slot.
///
/// Deliberately a pair of optional fields rather than one untyped slot —
/// the cache still never interprets either field, it just stops
/// pretending an absent handle is a present nil one.
#[derive(Clone, Default)]
pub struct Payload {
    pub opaque: Option<Opaque>,
    pub bytes: Option<Vec<u8>>,
}

impl Payload {
    /// Wraps an opaque handle with no byte payload.
    pub fn from_opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            opaque: Some(Arc::new(value)),
            bytes: None,
        }
    }

    /// Wraps a byte buffer with no opaque handle.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            opaque: None,
            bytes: Some(bytes),
        }
    }

    /// Encodes an int64 as 8 little-endian bytes.
    pub fn from_int64(n: i64) -> Self {
        let mut buf = [0u8; 8];
        LittleEndian::write_i64(&mut buf, n);
        Self::from_bytes(buf.to_vec())
    }

    /// Decodes an int64 from the byte payload. Requires at least 8 stored
    /// bytes; reports not-found otherwise.
    pub fn as_int64(&self) -> Option<i64> {
        let bytes = self.bytes.as_ref()?;
        if bytes.len() < 8 {
            return None;
        }
        Some(LittleEndian::read_i64(&bytes[..8]))
    }

    /// Attempts to downcast the opaque handle to a concrete type.
    pub fn downcast_opaque<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.opaque.clone()?.downcast::<T>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_round_trips_through_bytes() {
        for n in [0i64, 1, -1, i64::MIN, i64::MAX, 42] {
            let p = Payload::from_int64(n);
            assert_eq!(p.as_int64(), Some(n));
        }
    }

    #[test]
    fn int64_decode_requires_at_least_eight_bytes() {
        let p = Payload::from_bytes(vec![1, 2, 3]);
        assert_eq!(p.as_int64(), None);
    }

    #[test]
    fn int64_decode_on_bytesless_payload_is_none() {
        let p = Payload::default();
        assert_eq!(p.as_int64(), None);
    }

    #[test]
    fn opaque_round_trips_through_downcast() {
        let p = Payload::from_opaque(String::from("hello"));
        assert_eq!(p.downcast_opaque::<String>().as_deref(), Some(&String::from("hello")));
        assert!(p.downcast_opaque::<i32>().is_none());
    }

    #[test]
    fn both_payloads_can_be_set_simultaneously() {
        let mut p = Payload::from_bytes(vec![1, 2, 3]);
        p.opaque = Some(Arc::new(7i32));
        assert!(p.bytes.is_some());
        assert!(p.opaque.is_some());
    }
}
