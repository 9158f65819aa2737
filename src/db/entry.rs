//! The fixed width record stored in bucket slots.

/// Usable key bytes in a record.  The slot reserves one extra byte so a full
/// length key still carries its zero terminator.
pub const KEY_CAPACITY: usize = 20;
/// Usable value bytes in a record.
pub const VALUE_CAPACITY: usize = 50;

pub(crate) const KEY_SIZE: usize = KEY_CAPACITY + 1;
pub(crate) const VALUE_SIZE: usize = VALUE_CAPACITY + 1;
/// Bytes used by one record slot on disk.
pub(crate) const ENTRY_SIZE: usize = KEY_SIZE + VALUE_SIZE;

/// One record slot: zero padded key and value buffers stored contiguously.
/// A slot is empty (never written or tombstoned) iff its first key byte is
/// zero, so clearing a record only has to zero that one byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    key: [u8; KEY_SIZE],
    value: [u8; VALUE_SIZE],
}

/// Slice off the zero padding.
fn trim(buffer: &[u8]) -> &[u8] {
    let end = buffer.iter().position(|b| *b == 0).unwrap_or(buffer.len());
    &buffer[..end]
}

impl Entry {
    /// Build an entry from key and value bytes.  Lengths must already be
    /// validated against the capacities.
    pub fn new(key: &[u8], value: &[u8]) -> Self {
        let mut entry = Self {
            key: [0; KEY_SIZE],
            value: [0; VALUE_SIZE],
        };
        entry.key[..key.len()].copy_from_slice(key);
        entry.value[..value.len()].copy_from_slice(value);
        entry
    }

    /// Decode an entry from an ENTRY_SIZE byte slot.
    pub fn from_bytes(buffer: &[u8]) -> Self {
        let mut entry = Self {
            key: [0; KEY_SIZE],
            value: [0; VALUE_SIZE],
        };
        entry.key.copy_from_slice(&buffer[..KEY_SIZE]);
        entry.value.copy_from_slice(&buffer[KEY_SIZE..ENTRY_SIZE]);
        entry
    }

    /// Encode the entry for its slot.
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut buffer = [0_u8; ENTRY_SIZE];
        buffer[..KEY_SIZE].copy_from_slice(&self.key);
        buffer[KEY_SIZE..].copy_from_slice(&self.value);
        buffer
    }

    /// The key bytes without padding.
    pub fn key(&self) -> &[u8] {
        trim(&self.key)
    }

    /// The value bytes without padding.
    pub fn value(&self) -> &[u8] {
        trim(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let entry = Entry::new(b"a key", b"a value");
        let bytes = entry.to_bytes();
        assert_eq!(bytes.len(), 72);
        let loaded = Entry::from_bytes(&bytes);
        assert_eq!(loaded, entry);
        assert_eq!(loaded.key(), b"a key");
        assert_eq!(loaded.value(), b"a value");
    }

    #[test]
    fn test_full_capacity() {
        let key = [b'k'; KEY_CAPACITY];
        let value = [b'v'; VALUE_CAPACITY];
        let entry = Entry::new(&key, &value);
        let bytes = entry.to_bytes();
        // The terminator survives even at full capacity.
        assert_eq!(bytes[KEY_CAPACITY], 0);
        assert_eq!(bytes[ENTRY_SIZE - 1], 0);
        let loaded = Entry::from_bytes(&bytes);
        assert_eq!(loaded.key(), &key[..]);
        assert_eq!(loaded.value(), &value[..]);
    }

    #[test]
    fn test_empty_value() {
        let entry = Entry::new(b"key", b"");
        assert_eq!(entry.value(), b"");
        // Emptiness of a slot is keyed on the key byte alone.
        assert_ne!(entry.to_bytes()[0], 0);
    }
}
