use sha1::{Digest, Sha1};

use crate::utils::types::RingId;

/// Bitmask selecting the low `m` bits of an identifier.
pub fn ring_mask(m: u32) -> RingId {
    if m >= 64 {
        RingId::MAX
    } else {
        (1u64 << m) - 1
    }
}

/// Maps an endpoint or key to its position on the ring:
/// the big-endian SHA-1 digest interpreted as an integer, modulo `2^m`.
///
/// For `m <= 64` the residue is fully determined by the last eight
/// digest bytes, so the 160-bit value never needs to be materialized.
pub fn hash(key: &str, m: u32) -> RingId {
    let digest = Sha1::digest(key.as_bytes());
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&digest[12..20]);
    u64::from_be_bytes(tail) & ring_mask(m)
}

/// True iff `x` lies in the clockwise arc `(a, b]`.
///
/// When `a == b` the arc covers the whole ring except `a` itself.
pub fn in_open_closed(x: RingId, a: RingId, b: RingId) -> bool {
    if a < b {
        x > a && x <= b
    } else if a > b {
        x > a || x <= b
    } else {
        x != a
    }
}

/// True iff `x` lies strictly inside the clockwise arc `(a, b)`.
pub fn in_open_open(x: RingId, a: RingId, b: RingId) -> bool {
    if a < b {
        x > a && x < b
    } else if a > b {
        x > a || x < b
    } else {
        x != a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_sha1_mod_ring_size() {
        // int(SHA1("127.0.0.1:5000")) = ...aeedcddf07dd1b1d (low 64 bits)
        assert_eq!(hash("127.0.0.1:5000", 64), 12604957289873218333);
        assert_eq!(hash("127.0.0.1:5000", 16), 6941);
        assert_eq!(hash("127.0.0.1:5000", 6), 29);
        assert_eq!(hash("x", 64), 4274308586929922162);
        assert_eq!(hash("x", 6), 50);
        assert_eq!(hash("chord", 16), 55557);
    }

    #[test]
    fn hash_is_bounded_by_ring_size() {
        for m in [1, 3, 6, 16, 63, 64] {
            assert!(hash("some-key", m) <= ring_mask(m));
        }
    }

    #[test]
    fn open_closed_without_wrap() {
        assert!(in_open_closed(5, 2, 8));
        assert!(in_open_closed(8, 2, 8));
        assert!(!in_open_closed(2, 2, 8));
        assert!(!in_open_closed(9, 2, 8));
    }

    #[test]
    fn open_closed_with_wrap() {
        assert!(in_open_closed(60, 55, 10));
        assert!(in_open_closed(3, 55, 10));
        assert!(in_open_closed(10, 55, 10));
        assert!(!in_open_closed(55, 55, 10));
        assert!(!in_open_closed(30, 55, 10));
    }

    #[test]
    fn open_closed_degenerate_arc_covers_all_but_endpoint() {
        for x in 0..64u64 {
            assert_eq!(in_open_closed(x, 29, 29), x != 29);
        }
    }

    #[test]
    fn open_open_without_wrap() {
        assert!(in_open_open(5, 2, 8));
        assert!(!in_open_open(8, 2, 8));
        assert!(!in_open_open(2, 2, 8));
    }

    #[test]
    fn open_open_with_wrap() {
        assert!(in_open_open(60, 55, 10));
        assert!(in_open_open(3, 55, 10));
        assert!(!in_open_open(10, 55, 10));
        assert!(!in_open_open(55, 55, 10));
    }

    #[test]
    fn open_open_degenerate_arc_excludes_endpoint_only() {
        assert!(in_open_open(1, 29, 29));
        assert!(!in_open_open(29, 29, 29));
    }
}
