//! Constant-time comparison.

use subtle::ConstantTimeEq;

/// Compare two byte strings in time independent of their contents.
///
/// Lengths are compared first; a length mismatch returns early, which only
/// discloses what the canonical digest length already makes public.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
