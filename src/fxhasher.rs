//! Implements the Fx hash algorithm used as the default hasher for bucket
//! addressing.  The bucket index derived from a key is persisted (records sit
//! at offsets computed from it) so the hash of a key MUST be identical across
//! processes and program runs.  This hasher always mixes 64 bit words in
//! little endian order and so produces the same digest on every platform.

use std::hash::{BuildHasherDefault, Hasher};

const SEED: u64 = 0x51_7c_c1_b7_27_22_0a_95;

/// A speedy, stable hash algorithm (the Fx hash used by the Rust compiler for
/// its internal tables).  Not collision resistant against adversarial keys,
/// which is fine for bucket addressing.
#[derive(Debug, Default)]
pub struct FxHasher {
    hash: u64,
}

impl FxHasher {
    #[inline]
    fn add_to_hash(&mut self, word: u64) {
        self.hash = (self.hash.rotate_left(5) ^ word).wrapping_mul(SEED);
    }
}

impl Hasher for FxHasher {
    fn write(&mut self, mut bytes: &[u8]) {
        while bytes.len() >= 8 {
            let mut buf = [0_u8; 8];
            buf.copy_from_slice(&bytes[..8]);
            self.add_to_hash(u64::from_le_bytes(buf));
            bytes = &bytes[8..];
        }
        if bytes.len() >= 4 {
            let mut buf = [0_u8; 4];
            buf.copy_from_slice(&bytes[..4]);
            self.add_to_hash(u32::from_le_bytes(buf) as u64);
            bytes = &bytes[4..];
        }
        if bytes.len() >= 2 {
            let mut buf = [0_u8; 2];
            buf.copy_from_slice(&bytes[..2]);
            self.add_to_hash(u16::from_le_bytes(buf) as u64);
            bytes = &bytes[2..];
        }
        if let Some(byte) = bytes.first() {
            self.add_to_hash(*byte as u64);
        }
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.add_to_hash(i as u64);
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.add_to_hash(i as u64);
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.add_to_hash(i as u64);
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.add_to_hash(i);
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        // Always mix as 64 bits to keep digests stable across platforms.
        self.add_to_hash(i as u64);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }
}

/// A [`std::hash::BuildHasher`] for the stable Fx hash.
pub type BuildFxHasher = BuildHasherDefault<FxHasher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_across_instances() {
        let mut a = FxHasher::default();
        a.write(b"some key");
        let mut b = FxHasher::default();
        b.write(b"some key");
        assert_eq!(a.finish(), b.finish());

        let mut c = FxHasher::default();
        c.write(b"some other key");
        assert_ne!(a.finish(), c.finish());
    }

    #[test]
    fn test_chunked_writes_mix_everything() {
        // 15 bytes exercises the 8/4/2/1 tails.
        let mut a = FxHasher::default();
        a.write(b"fifteen bytes!!");
        let mut b = FxHasher::default();
        b.write(b"fifteen bytes!?");
        assert_ne!(a.finish(), b.finish());
    }
}
