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
// SIMD kernel accumulation for the delta splat hot path.
// Maintains compatibility with non-SIMD platforms through runtime feature detection.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use crate::kernel::KERNEL_WIDTH;

/// Accumulates `step * base + next * blend` elementwise into a 16-slot
/// window of the sample buffer. This runs once per audio event, so the tap
/// count is fixed and the whole update is a handful of vector ops.
///
/// All paths use wrapping integer arithmetic, so the scalar fallback is
/// bit-identical to the vector lanes even when a caller drives the
/// accumulator past i32 range.
pub(crate) fn accumulate_kernel(
    out: &mut [i32],
    step: &[i32; KERNEL_WIDTH],
    next: &[i32; KERNEL_WIDTH],
    base: i32,
    blend: i32,
) {
    assert_eq!(out.len(), KERNEL_WIDTH);

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe {
                accumulate_kernel_avx2(out, step, next, base, blend);
                return;
            }
        }
        if is_x86_feature_detected!("sse4.1") {
            unsafe {
                accumulate_kernel_sse4(out, step, next, base, blend);
                return;
            }
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if is_aarch64_feature_detected!("neon") {
            unsafe {
                accumulate_kernel_neon(out, step, next, base, blend);
                return;
            }
        }
    }

    accumulate_kernel_scalar(out, step, next, base, blend);
}

// ============================================================================
// AVX2 Implementation
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn accumulate_kernel_avx2(
    out: &mut [i32],
    step: &[i32; KERNEL_WIDTH],
    next: &[i32; KERNEL_WIDTH],
    base: i32,
    blend: i32,
) {
    let base_vec = _mm256_set1_epi32(base);
    let blend_vec = _mm256_set1_epi32(blend);

    // Two 8-lane halves cover the full 16-tap kernel.
    for offset in [0usize, 8] {
        let out_ptr = out.as_mut_ptr().add(offset) as *mut __m256i;
        let step_vec = _mm256_loadu_si256(step.as_ptr().add(offset) as *const __m256i);
        let next_vec = _mm256_loadu_si256(next.as_ptr().add(offset) as *const __m256i);
        let acc = _mm256_loadu_si256(out_ptr as *const __m256i);

        let contribution = _mm256_add_epi32(
            _mm256_mullo_epi32(step_vec, base_vec),
            _mm256_mullo_epi32(next_vec, blend_vec),
        );
        _mm256_storeu_si256(out_ptr, _mm256_add_epi32(acc, contribution));
    }
}

// ============================================================================
// SSE4.1 Implementation
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse4.1")]
unsafe fn accumulate_kernel_sse4(
    out: &mut [i32],
    step: &[i32; KERNEL_WIDTH],
    next: &[i32; KERNEL_WIDTH],
    base: i32,
    blend: i32,
) {
    let base_vec = _mm_set1_epi32(base);
    let blend_vec = _mm_set1_epi32(blend);

    for offset in [0usize, 4, 8, 12] {
        let out_ptr = out.as_mut_ptr().add(offset) as *mut __m128i;
        let step_vec = _mm_loadu_si128(step.as_ptr().add(offset) as *const __m128i);
        let next_vec = _mm_loadu_si128(next.as_ptr().add(offset) as *const __m128i);
        let acc = _mm_loadu_si128(out_ptr as *const __m128i);

        let contribution = _mm_add_epi32(
            _mm_mullo_epi32(step_vec, base_vec),
            _mm_mullo_epi32(next_vec, blend_vec),
        );
        _mm_storeu_si128(out_ptr, _mm_add_epi32(acc, contribution));
    }
}

// ============================================================================
// ARM NEON Implementation
// ============================================================================

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn accumulate_kernel_neon(
    out: &mut [i32],
    step: &[i32; KERNEL_WIDTH],
    next: &[i32; KERNEL_WIDTH],
    base: i32,
    blend: i32,
) {
    let base_vec = vdupq_n_s32(base);
    let blend_vec = vdupq_n_s32(blend);

    for offset in [0usize, 4, 8, 12] {
        let out_ptr = out.as_mut_ptr().add(offset);
        let step_vec = vld1q_s32(step.as_ptr().add(offset));
        let next_vec = vld1q_s32(next.as_ptr().add(offset));

        let mut acc = vld1q_s32(out_ptr);
        acc = vmlaq_s32(acc, step_vec, base_vec);
        acc = vmlaq_s32(acc, next_vec, blend_vec);
        vst1q_s32(out_ptr, acc);
    }
}

// ============================================================================
// Scalar Fallback Implementation
// ============================================================================

fn accumulate_kernel_scalar(
    out: &mut [i32],
    step: &[i32; KERNEL_WIDTH],
    next: &[i32; KERNEL_WIDTH],
    base: i32,
    blend: i32,
) {
    for i in 0..KERNEL_WIDTH {
        out[i] = out[i]
            .wrapping_add(step[i].wrapping_mul(base))
            .wrapping_add(next[i].wrapping_mul(blend));
    }
}
