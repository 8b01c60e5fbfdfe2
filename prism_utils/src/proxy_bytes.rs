use bytemuck::Pod;
use smallvec::SmallVec;
use static_assertions::const_assert;

/// Inline capacity of a component proxy blob, fixed per build.
///
/// Proxies larger than this still work but spill to the heap, which costs an
/// allocation per component per frame.
pub const MAX_INLINE_PROXY_BYTE_SIZE: usize = 512;

const_assert!(MAX_INLINE_PROXY_BYTE_SIZE >= 64);

/// Byte buffer holding one component's render proxy snapshot.
///
/// Stays inline up to [`MAX_INLINE_PROXY_BYTE_SIZE`] bytes and falls back to
/// a heap allocation beyond that.
#[derive(Clone, Debug, Default)]
pub struct ProxyBytes {
    bytes: SmallVec<[u8; MAX_INLINE_PROXY_BYTE_SIZE]>,
}

impl ProxyBytes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the buffer with the raw bytes of a single POD value.
    pub fn write_pod<T: Pod>(&mut self, value: &T) {
        self.bytes.clear();
        self.bytes.extend_from_slice(bytemuck::bytes_of(value));
    }

    /// Reads the buffer back as a single POD value.
    ///
    /// Returns `None` when the buffer length does not match `T`. The value is
    /// copied out, so the buffer's byte alignment does not matter.
    pub fn read_pod<T: Pod>(&self) -> Option<T> {
        if self.bytes.len() != size_of::<T>() {
            return None;
        }
        Some(bytemuck::pod_read_unaligned(&self.bytes))
    }

    /// Overwrites the buffer with arbitrary raw bytes.
    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.bytes.clear();
        self.bytes.extend_from_slice(bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Whether the blob outgrew the inline budget and lives on the heap.
    pub fn spilled(&self) -> bool {
        self.bytes.spilled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    struct Snapshot {
        strength: f32,
        seed: u32,
    }

    #[test]
    fn pod_roundtrip() {
        let mut bytes = ProxyBytes::new();
        bytes.write_pod(&Snapshot {
            strength: 0.5,
            seed: 7,
        });

        assert_eq!(bytes.len(), size_of::<Snapshot>());
        assert_eq!(
            bytes.read_pod::<Snapshot>(),
            Some(Snapshot {
                strength: 0.5,
                seed: 7,
            })
        );
    }

    #[test]
    fn size_mismatch_reads_nothing() {
        let mut bytes = ProxyBytes::new();
        bytes.write_slice(&[1, 2, 3]);

        assert_eq!(bytes.read_pod::<Snapshot>(), None);
    }

    #[test]
    fn spills_past_inline_budget() {
        let mut bytes = ProxyBytes::new();
        bytes.write_slice(&[0u8; MAX_INLINE_PROXY_BYTE_SIZE]);
        assert!(!bytes.spilled());

        bytes.write_slice(&[0u8; MAX_INLINE_PROXY_BYTE_SIZE + 1]);
        assert!(bytes.spilled());
    }

    #[test]
    fn rewrite_replaces_previous_blob() {
        let mut bytes = ProxyBytes::new();
        bytes.write_slice(&[9u8; 32]);
        bytes.write_pod(&Snapshot {
            strength: 1.0,
            seed: 1,
        });

        assert_eq!(bytes.len(), size_of::<Snapshot>());
    }
}
