//! Small nucleotide helpers shared by the bias metrics.

/// Reverse complement of `bases`; non-ACGT symbols (including `N`) become `N`.
/// Case is not preserved.
#[must_use]
pub fn reverse_complement(bases: &[u8]) -> Vec<u8> {
    bases.iter().rev().map(|&b| complement(b)).collect()
}

#[inline]
fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        _ => b'N',
    }
}

/// GC content of `window` as an integer percentage in `0..=100`.
///
/// Only called bases (`ACGT`, any case) count towards the denominator. Returns
/// `None` when fewer than half the window is called.
#[must_use]
pub fn gc_percent(window: &[u8]) -> Option<usize> {
    let mut gc = 0usize;
    let mut called = 0usize;
    for base in window {
        match base.to_ascii_uppercase() {
            b'G' | b'C' => {
                gc += 1;
                called += 1;
            }
            b'A' | b'T' => called += 1,
            _ => {}
        }
    }

    if called == 0 || called * 2 < window.len() {
        return None;
    }

    // Round half up without going through floating point
    Some((gc * 200 + called) / (called * 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"AACGTN"), b"NACGTT".to_vec());
        assert_eq!(reverse_complement(b"acgt"), b"ACGT".to_vec());
        assert!(reverse_complement(b"").is_empty());
    }

    #[test]
    fn test_gc_percent() {
        assert_eq!(gc_percent(b"GGCC"), Some(100));
        assert_eq!(gc_percent(b"AATT"), Some(0));
        assert_eq!(gc_percent(b"ACGT"), Some(50));
        assert_eq!(gc_percent(b"acgt"), Some(50));
        // 1 of 3 called bases => 33.3% rounds to 33
        assert_eq!(gc_percent(b"GAAN"), Some(33));
        // 2 of 3 => 66.7% rounds to 67
        assert_eq!(gc_percent(b"GGAN"), Some(67));
    }

    #[test]
    fn test_gc_percent_mostly_n() {
        assert_eq!(gc_percent(b"NNNG"), None);
        assert_eq!(gc_percent(b"NNGG"), Some(100));
        assert_eq!(gc_percent(b""), None);
    }
}
