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

//! Band-limited sample synthesis buffer.
//!
//! Converts sparse, clock-tagged amplitude deltas into an anti-aliased
//! 16-bit PCM stream at an independently chosen output sample rate. Events
//! are spread across neighboring output samples with a precomputed
//! band-limited step kernel, so no post-hoc resampling filter is needed.
//!
//! The typical loop is: report deltas with [`BlipBuffer::add_delta`], close
//! out a span of input time with [`BlipBuffer::end_frame`], then pull
//! finished samples with [`BlipBuffer::read_samples`]. For callers that have
//! a raw PCM stream rather than deltas, [`StreamResampler`] handles the
//! differentiation and batching.

mod clock;
mod kernel;
mod simd;

pub mod buffer;
pub mod error;
pub mod stream;

pub use buffer::BlipBuffer;
pub use error::RateError;
pub use stream::StreamResampler;
