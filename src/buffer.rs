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
use tracing::debug;

use crate::clock::{Clock, FRAC_BITS};
use crate::error::RateError;
use crate::kernel::{DELTA_BITS, DELTA_UNIT, KERNELS, KERNEL_WIDTH, PHASE_COUNT, PHASE_SHIFT};
use crate::simd;

/// Shift of the single-pole bass (DC-blocking) leak in the readout
/// integrator. Coupled to `DELTA_BITS`; not independently tunable.
const BASS_SHIFT: u32 = 9;

/// Headroom for one extra frame boundary beyond the kernel spread.
const END_FRAME_EXTRA: usize = 2;

/// Extra storage past `capacity`: the widest kernel spread plus frame slack.
const BUF_EXTRA: usize = KERNEL_WIDTH + END_FRAME_EXTRA;

/// Band-limited resampling buffer for a single channel.
///
/// Deltas tagged with input-clock times are splatted into the buffer
/// through a phase-indexed band-limiting kernel; [`BlipBuffer::end_frame`]
/// advances the fixed-point clock, and [`BlipBuffer::read_samples`] runs
/// the finished span through a leaky integrator to produce 16-bit PCM.
///
/// The caller owns the sequencing discipline: deltas for a frame must be
/// added before the matching `end_frame`, and a delta timestamp past the
/// declared frame length is a contract violation (asserted in debug
/// builds, numerically undefined in release).
#[derive(Debug, Clone)]
pub struct BlipBuffer {
    clock: Clock,
    integrator: i32,
    samples: Vec<i32>,
    size: usize,
}

impl BlipBuffer {
    /// Creates a buffer able to hold `capacity` finished output samples
    /// before extraction is required.
    pub fn new(capacity: usize) -> Self {
        BlipBuffer {
            clock: Clock::new(),
            integrator: 0,
            samples: vec![0; capacity + BUF_EXTRA],
            size: capacity,
        }
    }

    /// Configures the input clock rate and output sample rate, both in Hz.
    ///
    /// Legal mid-stream; already-buffered samples are unaffected, the new
    /// ratio applies to subsequently added deltas. Construction centers
    /// the clock on the default ratio, so call [`BlipBuffer::clear`] after
    /// the first configuration to center the kernel window on the real one.
    pub fn set_rates(&mut self, clock_rate: f64, sample_rate: f64) -> Result<(), RateError> {
        self.clock.set_rates(clock_rate, sample_rate)?;
        debug!(clock_rate, sample_rate, "configured resampling ratio");
        Ok(())
    }

    /// Resets to the post-construction state, keeping the configured rates.
    pub fn clear(&mut self) {
        self.clock.reset();
        self.integrator = 0;
        self.samples.fill(0);
    }

    /// Accumulates a signed amplitude change at `time` input-clock ticks
    /// past the last frame boundary. A zero delta is a no-op.
    pub fn add_delta(&mut self, time: u32, delta: i32) {
        if delta == 0 {
            return;
        }

        let fixed = self.clock.position(time);
        let phase = (fixed >> PHASE_SHIFT) as usize & (PHASE_COUNT - 1);
        let interp = (fixed >> (PHASE_SHIFT - DELTA_BITS)) as i32 & (DELTA_UNIT - 1);
        let pos = (fixed >> FRAC_BITS) as usize;

        debug_assert!(
            pos + KERNEL_WIDTH <= self.samples.len(),
            "delta at time {} lands outside the buffered window",
            time
        );

        // Split the delta between this phase's kernel and the next one so
        // the effective kernel is linearly interpolated to the exact
        // sub-phase timing. The truncating shift matches the kernel scale.
        let blend = delta.wrapping_mul(interp) >> DELTA_BITS;
        let kernel = &KERNELS[phase];
        simd::accumulate_kernel(
            &mut self.samples[pos..pos + KERNEL_WIDTH],
            &kernel.step,
            &kernel.next,
            delta - blend,
            blend,
        );
    }

    /// Declares that `ticks` of input time have elapsed with no further
    /// deltas, making the covered output samples available for extraction.
    ///
    /// A single frame must fit both the buffer capacity and the
    /// fixed-point clock's headroom (about 4000 output samples' worth of
    /// ticks); feed longer spans as multiple frames, draining in between.
    /// [`BlipBuffer::clocks_needed`] sizes a frame against the capacity.
    pub fn end_frame(&mut self, ticks: u32) {
        self.clock.end_frame(ticks);
        debug_assert!(
            self.clock.samples_available() <= self.size,
            "frame of {} ticks overflows the buffer capacity",
            ticks
        );
    }

    /// Number of finished output samples ready to read.
    pub fn samples_available(&self) -> usize {
        self.clock.samples_available()
    }

    /// Number of input ticks that must elapse before `samples` finished
    /// output samples become available. Useful for sizing a frame so it
    /// cannot outgrow the buffer capacity.
    pub fn clocks_needed(&self, samples: usize) -> u64 {
        self.clock.clocks_needed(samples)
    }

    /// Fills `out` with up to `samples_available()` finished samples and
    /// returns the count written. A short read is not an error.
    pub fn read_samples(&mut self, out: &mut [i16]) -> usize {
        let count = out.len().min(self.samples_available());
        if count == 0 {
            return 0;
        }

        // Leaky integration: accumulated deltas sum into the band-limited
        // step response while the BASS_SHIFT term bleeds off DC.
        let mut sum = self.integrator;
        for (slot, sample) in self.samples[..count].iter().zip(out[..count].iter_mut()) {
            let clamped = (sum >> DELTA_BITS).clamp(i32::from(i16::MIN), i32::from(i16::MAX));
            *sample = clamped as i16;
            sum = sum.wrapping_add(*slot);
            sum = sum.wrapping_sub(clamped << (DELTA_BITS - BASS_SHIFT));
        }
        self.integrator = sum;

        self.remove_samples(count);
        count
    }

    /// Compacts the buffer after `count` samples were consumed: shifts the
    /// remaining window down, re-zeroes the vacated tail so later deltas
    /// accumulate from zero, and rewinds the clock.
    fn remove_samples(&mut self, count: usize) {
        let remain = self.samples_available() + BUF_EXTRA - count;
        self.clock.consume(count);

        self.samples.copy_within(count..count + remain, 0);
        self.samples[remain..remain + count].fill(0);
    }
}
