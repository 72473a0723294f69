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
use crate::buffer::BlipBuffer;
use crate::error::RateError;

/// Nominal input ticks fed per frame before draining: 50 ms at 44.1 kHz.
const BATCH_TICKS: u64 = 2205;

/// Hard cap on output samples pending in one frame. The fixed-point clock
/// wraps past roughly 4096 samples of accumulated time, so frames stay
/// comfortably inside that window regardless of capacity.
const MAX_BATCH_SAMPLES: usize = 4000;

/// Convenience layer that resamples a raw signed 16-bit PCM stream.
///
/// The buffer itself consumes amplitude *deltas*; this wrapper carries the
/// differentiation latch across calls, so a long stream can be fed in
/// arbitrary slices and still produce output identical to a single push.
/// Each internal batch is closed with an `end_frame` and drained to the
/// sink before the next begins, so the owned buffer never overflows.
#[derive(Debug)]
pub struct StreamResampler {
    buffer: BlipBuffer,
    latch: i32,
    scratch: Vec<i16>,
}

impl StreamResampler {
    /// Creates a resampler whose owned buffer holds `capacity` finished
    /// samples. Batches shrink automatically when the configured ratio
    /// produces output faster than input, so `capacity` only needs to
    /// cover the output of a single input tick (4096 handles any
    /// representable ratio short of pathological upsampling).
    pub fn new(capacity: usize) -> Self {
        StreamResampler {
            buffer: BlipBuffer::new(capacity),
            latch: 0,
            scratch: vec![0; capacity],
        }
    }

    /// Configures the input and output sample rates, both in Hz, and
    /// resets the stream state so the clock is centered on the new ratio.
    /// A freshly configured resampler therefore behaves identically to a
    /// cleared one.
    pub fn set_rates(&mut self, input_rate: f64, output_rate: f64) -> Result<(), RateError> {
        self.buffer.set_rates(input_rate, output_rate)?;
        self.clear();
        Ok(())
    }

    /// Resets the buffer and the differentiation latch, keeping the rates.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.latch = 0;
    }

    /// Feeds input samples, invoking `sink` with every span of finished
    /// output samples as they become available.
    pub fn push(&mut self, input: &[i16], mut sink: impl FnMut(&[i16])) {
        let mut remaining = input;
        while !remaining.is_empty() {
            // Upsampling ratios fill the buffer in fewer ticks than the
            // nominal batch, so each frame is also bounded by how many
            // ticks fit before the pending output outgrows the capacity.
            let target = self.scratch.len().min(MAX_BATCH_SAMPLES);
            let room = self
                .buffer
                .clocks_needed(target + 1)
                .saturating_sub(1)
                .max(1);
            let take = (remaining.len() as u64).min(BATCH_TICKS).min(room) as usize;
            let (batch, rest) = remaining.split_at(take);
            remaining = rest;

            for (tick, &sample) in batch.iter().enumerate() {
                let sample = i32::from(sample);
                self.buffer.add_delta(tick as u32, sample - self.latch);
                self.latch = sample;
            }
            self.buffer.end_frame(batch.len() as u32);
            self.drain(&mut sink);
        }
    }

    /// Drains whatever is still available without feeding more input.
    /// Useful at end of stream when the final batch left a partial sample.
    pub fn finish(&mut self, mut sink: impl FnMut(&[i16])) {
        self.drain(&mut sink);
    }

    fn drain(&mut self, sink: &mut impl FnMut(&[i16])) {
        loop {
            let n = self.buffer.read_samples(&mut self.scratch);
            if n == 0 {
                return;
            }
            sink(&self.scratch[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn one_second_tone(rate: u32) -> Vec<i16> {
        (0..rate)
            .map(|i| (8000.0 * (2.0 * PI * 440.0 * f64::from(i) / f64::from(rate)).sin()) as i16)
            .collect()
    }

    fn resample_all(resampler: &mut StreamResampler, input: &[i16]) -> Vec<i16> {
        let mut out = Vec::new();
        resampler.push(input, |chunk| out.extend_from_slice(chunk));
        resampler.finish(|chunk| out.extend_from_slice(chunk));
        out
    }

    #[test]
    fn test_one_second_halved_yields_exact_count() {
        let tone = one_second_tone(44100);
        let mut resampler = StreamResampler::new(4096);
        resampler.set_rates(44100.0, 22050.0).unwrap();

        let out = resample_all(&mut resampler, &tone);
        assert_eq!(out.len(), 22050);
    }

    #[test]
    fn test_handheld_dmg_rate_yields_exact_count() {
        // 2097152 Hz core clock divided down to ~18396 Hz sample output.
        let tone = one_second_tone(44100);
        let mut resampler = StreamResampler::new(4096);
        resampler.set_rates(44100.0, 2097152.0 / 114.0).unwrap();

        let out = resample_all(&mut resampler, &tone);
        assert_eq!(out.len(), 18396);
    }

    #[test]
    fn test_output_is_independent_of_push_slicing() {
        let tone = one_second_tone(44100);

        let mut whole = StreamResampler::new(4096);
        whole.set_rates(44100.0, 22050.0).unwrap();
        let expected = resample_all(&mut whole, &tone);

        let mut sliced = StreamResampler::new(4096);
        sliced.set_rates(44100.0, 22050.0).unwrap();
        let mut out = Vec::new();
        for piece in tone.chunks(701) {
            sliced.push(piece, |chunk| out.extend_from_slice(chunk));
        }
        sliced.finish(|chunk| out.extend_from_slice(chunk));

        assert_eq!(expected, out);
    }

    #[test]
    fn test_clear_resets_latch() {
        let mut resampler = StreamResampler::new(4096);
        resampler.set_rates(44100.0, 44100.0).unwrap();

        let plateau = vec![12000i16; 500];
        let first = resample_all(&mut resampler, &plateau);
        assert!(first.iter().any(|&s| s != 0));

        resampler.clear();
        let second = resample_all(&mut resampler, &plateau);

        // Without the latch reset the second run would see no leading step,
        // and without the clock reset it would start from a shifted phase.
        assert_eq!(first, second);
    }

    #[test]
    fn test_upsampling_drains_within_capacity() {
        // Doubling the rate makes a nominal batch worth almost twice the
        // buffer capacity; the adaptive batch bound must keep every frame
        // inside it while still producing the exact doubled count.
        let tone = one_second_tone(22050);
        let mut resampler = StreamResampler::new(4096);
        resampler.set_rates(22050.0, 44100.0).unwrap();

        let out = resample_all(&mut resampler, &tone);
        assert_eq!(out.len(), 44101);
    }

    #[test]
    fn test_silence_resamples_to_silence() {
        let silence = vec![0i16; 44100];
        let mut resampler = StreamResampler::new(4096);
        resampler.set_rates(44100.0, 22050.0).unwrap();

        let out = resample_all(&mut resampler, &silence);
        assert_eq!(out.len(), 22050);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_wav_round_trip_of_resampled_tone() {
        let tone = one_second_tone(44100);
        let mut resampler = StreamResampler::new(4096);
        resampler.set_rates(44100.0, 22050.0).unwrap();
        let out = resample_all(&mut resampler, &tone);

        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("tone_22050.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("failed to create wav");
        for &sample in &out {
            writer.write_sample(sample).expect("failed to write sample");
        }
        writer.finalize().expect("failed to finalize wav");

        let mut reader = hound::WavReader::open(&path).expect("failed to open wav");
        let read_back: Vec<i16> = reader
            .samples::<i16>()
            .map(|s| s.expect("failed to read sample"))
            .collect();
        assert_eq!(read_back, out);
    }
}
