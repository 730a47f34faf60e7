//! Round boundary arithmetic
//!
//! A round is a half-open window of `round_size` consecutive heights. The
//! first round is clamped so it never starts below the caller's height
//! threshold, which is why both functions take `threshold`.

use std::cmp;

/// First height of the round containing `height`, clamped up to `threshold`.
pub fn round_start(height: u32, round_size: u16, threshold: u32) -> u32 {
    let size = u32::from(round_size);
    cmp::max(threshold, height - height % size)
}

/// Last height of the round containing `height`, or the tip height when
/// `height` sits in the tip's (still unfinished) round.
pub fn round_end(height: u32, tip_height: u32, round_size: u16, threshold: u32) -> u32 {
    if height >= tip_height
        || round_start(height, round_size, threshold) == round_start(tip_height, round_size, threshold)
    {
        return tip_height;
    }

    round_start(height, round_size, threshold) + u32::from(round_size) - 1
}
