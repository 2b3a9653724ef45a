//! 160-bit routing keys and the hash/armour primitives that produce them.
//!
//! A `Key` is the coordinate a path name (or a node's identity string)
//! occupies on the ring. Keys are compared as unsigned big-endian
//! integers, which is what lets a ring express ranges as a simple
//! `start_key <= k <= stop_key` (or, for the wrap-around range, the
//! complement of that).

use sha1::{Digest, Sha1};
use std::fmt;

/// Width of a key in bytes (SHA-1 digest length).
pub const KEY_LEN: usize = 20;

/// A 160-bit routing coordinate.
///
/// Ordering is unsigned big-endian byte comparison, which matches
/// `Ord`'s derived lexicographic order on `[u8; 20]` directly — no
/// custom `Ord` impl needed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    pub const ZERO: Key = Key([0u8; KEY_LEN]);
    pub const MAX: Key = Key([0xffu8; KEY_LEN]);

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Key(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Hash arbitrary bytes (a path name, a node identity string, ...)
    /// into a `Key` via SHA-1.
    pub fn hash(data: &[u8]) -> Key {
        let mut hasher = Sha1::new();
        hasher.update(data);
        let digest = hasher.finalize();
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&digest);
        Key(bytes)
    }

    /// Render as lowercase hex, matching the original's `magma_armour_hash`.
    pub fn armour(&self) -> String {
        let mut out = String::with_capacity(KEY_LEN * 2);
        for byte in &self.0 {
            out.push_str(&format!("{:02x}", byte));
        }
        out
    }

    /// Hash and armour in one step — the `magma_fd.key` derivation from
    /// a `commit_url`.
    pub fn armour_of(data: &[u8]) -> String {
        Key::hash(data).armour()
    }

    /// The next key in big-endian order, wrapping from `MAX` to `ZERO`.
    pub fn succ(&self) -> Key {
        let mut bytes = self.0;
        for byte in bytes.iter_mut().rev() {
            if *byte == 0xff {
                *byte = 0;
            } else {
                *byte += 1;
                return Key(bytes);
            }
        }
        Key(bytes)
    }

    /// The previous key in big-endian order, wrapping from `ZERO` to `MAX`.
    pub fn pred(&self) -> Key {
        let mut bytes = self.0;
        for byte in bytes.iter_mut().rev() {
            if *byte == 0x00 {
                *byte = 0xff;
            } else {
                *byte -= 1;
                return Key(bytes);
            }
        }
        Key(bytes)
    }

    /// True if `self` lies within the cyclic range `[start, stop]`.
    ///
    /// When `start <= stop` this is a plain closed interval test. When
    /// `start > stop` the range wraps around `Key::MAX` back to
    /// `Key::ZERO`, which is how the single node owning the wrap-around
    /// segment of the ring is addressed.
    pub fn in_range(&self, start: Key, stop: Key) -> bool {
        if start <= stop {
            *self >= start && *self <= stop
        } else {
            *self >= start || *self <= stop
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.armour())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.armour())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(Key::hash(b"/foo/bar"), Key::hash(b"/foo/bar"));
    }

    #[test]
    fn hash_distinguishes_inputs() {
        assert_ne!(Key::hash(b"/foo/bar"), Key::hash(b"/foo/baz"));
    }

    #[test]
    fn armour_is_lowercase_hex_of_expected_length() {
        let armoured = Key::hash(b"/foo/bar").armour();
        assert_eq!(armoured.len(), KEY_LEN * 2);
        assert!(armoured.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn in_range_plain_interval() {
        let start = Key::from_bytes([0x10; KEY_LEN]);
        let stop = Key::from_bytes([0x20; KEY_LEN]);
        let inside = Key::from_bytes([0x15; KEY_LEN]);
        let outside = Key::from_bytes([0x30; KEY_LEN]);
        assert!(inside.in_range(start, stop));
        assert!(!outside.in_range(start, stop));
        assert!(start.in_range(start, stop));
        assert!(stop.in_range(start, stop));
    }

    #[test]
    fn in_range_wrap_around() {
        let start = Key::from_bytes([0xf0; KEY_LEN]);
        let stop = Key::from_bytes([0x10; KEY_LEN]);
        let near_max = Key::from_bytes([0xf5; KEY_LEN]);
        let near_zero = Key::from_bytes([0x05; KEY_LEN]);
        let middle = Key::from_bytes([0x50; KEY_LEN]);
        assert!(near_max.in_range(start, stop));
        assert!(near_zero.in_range(start, stop));
        assert!(!middle.in_range(start, stop));
    }

    #[test]
    fn succ_and_pred_wrap_at_the_boundaries() {
        assert_eq!(Key::MAX.succ(), Key::ZERO);
        assert_eq!(Key::ZERO.pred(), Key::MAX);
        let k = Key::from_bytes([0x10; KEY_LEN]);
        assert_eq!(k.succ().pred(), k);
        assert_eq!(k.pred().succ(), k);
    }

    #[test]
    fn succ_carries_across_byte_boundary() {
        let mut bytes = [0u8; KEY_LEN];
        bytes[KEY_LEN - 1] = 0xff;
        let k = Key::from_bytes(bytes);
        let mut expected = [0u8; KEY_LEN];
        expected[KEY_LEN - 2] = 0x01;
        assert_eq!(k.succ(), Key::from_bytes(expected));
    }

    #[test]
    fn ordering_is_unsigned_big_endian() {
        let small = Key::from_bytes([0x00, 0xff, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let big = Key::from_bytes([0x01, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(small < big);
    }
}
