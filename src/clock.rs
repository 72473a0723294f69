// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use crate::error::RateError;

/// Bits below the whole-sample point that are shifted away before the
/// kernel-phase computation. Keeps long runs drift-free.
pub(crate) const PRE_SHIFT: u32 = 32;

/// Total fractional width of the fixed-point time format.
pub(crate) const TIME_BITS: u32 = PRE_SHIFT + 20;

/// One whole output sample in fixed-point time units.
pub(crate) const TIME_UNIT: u64 = 1 << TIME_BITS;

/// Sub-sample fraction bits that survive the pre-shift.
pub(crate) const FRAC_BITS: u32 = TIME_BITS - PRE_SHIFT;

/// Maximum supported input-clock : output-sample ratio.
pub(crate) const MAX_RATIO: u64 = 1 << 20;

/// Smallest representable rate factor, corresponding to `MAX_RATIO`.
const MIN_FACTOR: u64 = TIME_UNIT / MAX_RATIO;

/// Fixed-point clock translating input-clock ticks into output-sample time.
///
/// `factor` is the output time advanced per input tick; `offset` is the
/// output time already consumed. Finished samples are whole `TIME_UNIT`s of
/// `offset`.
#[derive(Debug, Clone)]
pub(crate) struct Clock {
    factor: u64,
    offset: u64,
}

impl Clock {
    pub(crate) fn new() -> Self {
        let mut clock = Clock {
            factor: MIN_FACTOR,
            offset: 0,
        };
        clock.reset();
        clock
    }

    /// Computes the rate factor as `ceil(TIME_UNIT * sample_rate / clock_rate)`.
    ///
    /// The ceiling guarantees the clock never stalls short of a whole sample
    /// on fractional underflow. The rounding rule is pinned: multiply then
    /// divide in f64, then `ceil`, so the factor is reproducible across
    /// platforms with IEEE doubles.
    pub(crate) fn set_rates(&mut self, clock_rate: f64, sample_rate: f64) -> Result<(), RateError> {
        if !(clock_rate.is_finite() && sample_rate.is_finite())
            || clock_rate <= 0.0
            || sample_rate <= 0.0
        {
            return Err(RateError::InvalidRates(clock_rate, sample_rate));
        }

        let factor = (TIME_UNIT as f64 * sample_rate / clock_rate).ceil();
        if factor < MIN_FACTOR as f64 {
            return Err(RateError::RatioExceeded {
                clock_rate,
                sample_rate,
            });
        }

        self.factor = factor as u64;
        Ok(())
    }

    /// Re-centers consumed time to half a tick so the first kernel window
    /// is not applied right at the buffer's edge.
    pub(crate) fn reset(&mut self) {
        self.offset = self.factor / 2;
    }

    /// Declares that `ticks` of input time have elapsed with no further
    /// deltas, making the covered output samples extractable.
    ///
    /// A single frame must stay within the fixed-point window: `ticks`
    /// times the factor has to fit the time accumulator, which at equal
    /// rates bounds a frame to roughly 4000 output samples. Longer spans
    /// are fed as multiple frames.
    pub(crate) fn end_frame(&mut self, ticks: u32) {
        debug_assert!(
            u64::from(ticks)
                .checked_mul(self.factor)
                .and_then(|advance| advance.checked_add(self.offset))
                .is_some(),
            "frame of {} ticks overflows the fixed-point clock",
            ticks
        );
        self.offset = self
            .offset
            .wrapping_add(u64::from(ticks).wrapping_mul(self.factor));
    }

    /// Number of input ticks that must elapse before `samples` finished
    /// output samples become available.
    pub(crate) fn clocks_needed(&self, samples: usize) -> u64 {
        let needed = samples as u128 * u128::from(TIME_UNIT);
        let offset = u128::from(self.offset);
        if needed < offset {
            return 0;
        }
        (needed - offset).div_ceil(u128::from(self.factor)) as u64
    }

    /// Number of whole output samples covered by consumed time.
    pub(crate) fn samples_available(&self) -> usize {
        (self.offset >> TIME_BITS) as usize
    }

    /// Fixed-point output position of a tick within the current frame,
    /// with `FRAC_BITS` of sub-sample precision remaining.
    pub(crate) fn position(&self, time: u32) -> u64 {
        (u64::from(time) * self.factor + self.offset) >> PRE_SHIFT
    }

    /// Rewinds consumed time after `count` samples were extracted.
    pub(crate) fn consume(&mut self, count: usize) {
        self.offset -= count as u64 * TIME_UNIT;
    }
}
