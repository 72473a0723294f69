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
use lazy_static::lazy_static;

use crate::clock;

/// Sub-sample phase resolution of the kernel table.
pub(crate) const PHASE_BITS: u32 = 5;
pub(crate) const PHASE_COUNT: usize = 1 << PHASE_BITS;

/// Taps on each side of an impulse.
pub(crate) const HALF_WIDTH: usize = 8;

/// Full applied kernel width in output samples.
pub(crate) const KERNEL_WIDTH: usize = 2 * HALF_WIDTH;

/// Fixed-point scale of the kernel coefficients. A unit step of amplitude
/// `DELTA_UNIT` integrates back to a unit step after readout.
pub(crate) const DELTA_BITS: u32 = 15;
pub(crate) const DELTA_UNIT: i32 = 1 << DELTA_BITS;

/// Shift extracting the kernel phase from a fixed-point sample position.
pub(crate) const PHASE_SHIFT: u32 = clock::FRAC_BITS - PHASE_BITS;

/// Band-limited step response sampled at 32 uniformly spaced sub-sample
/// phases, 8 taps per phase. Row 32 is row 0 time-reversed, which lets the
/// same storage serve the rising half (read forward) and the falling half
/// (read backward) of the kernel. These coefficients are the published
/// blip_buf step table; they must not be re-derived, since downstream
/// output is pinned bit-for-bit against them.
const BL_STEP: [[i16; HALF_WIDTH]; PHASE_COUNT + 1] = [
    [43, -115, 350, -488, 1136, -914, 5861, 21022],
    [44, -118, 348, -473, 1076, -799, 5274, 21001],
    [45, -121, 344, -454, 1011, -677, 4706, 20936],
    [46, -122, 336, -431, 942, -549, 4156, 20829],
    [47, -123, 327, -404, 868, -418, 3629, 20679],
    [47, -122, 316, -375, 792, -285, 3124, 20488],
    [47, -120, 303, -344, 714, -151, 2644, 20256],
    [46, -117, 289, -310, 634, -17, 2188, 19985],
    [46, -114, 273, -275, 553, 117, 1758, 19675],
    [44, -108, 255, -237, 471, 247, 1356, 19327],
    [43, -103, 237, -199, 390, 373, 981, 18944],
    [42, -98, 218, -160, 310, 495, 633, 18527],
    [40, -91, 198, -121, 231, 611, 314, 18078],
    [38, -84, 178, -81, 153, 722, 22, 17599],
    [36, -76, 157, -43, 80, 824, -241, 17092],
    [34, -68, 135, -3, 8, 919, -476, 16558],
    [32, -61, 115, 34, -60, 1006, -683, 16001],
    [29, -52, 94, 70, -123, 1083, -862, 15422],
    [27, -44, 73, 106, -184, 1152, -1015, 14824],
    [25, -36, 53, 139, -239, 1211, -1142, 14210],
    [22, -27, 34, 170, -290, 1261, -1244, 13582],
    [20, -20, 16, 199, -335, 1301, -1322, 12942],
    [18, -12, -3, 226, -375, 1331, -1376, 12293],
    [15, -4, -19, 250, -410, 1351, -1408, 11638],
    [13, 3, -35, 272, -439, 1361, -1419, 10979],
    [11, 9, -49, 292, -464, 1362, -1410, 10319],
    [9, 16, -63, 309, -483, 1354, -1383, 9660],
    [7, 22, -75, 322, -496, 1337, -1339, 9005],
    [6, 26, -85, 333, -504, 1312, -1280, 8355],
    [4, 31, -94, 341, -507, 1278, -1205, 7713],
    [3, 35, -102, 347, -506, 1238, -1119, 7082],
    [1, 40, -110, 350, -499, 1190, -1021, 6464],
    [0, 43, -115, 350, -488, 1136, -914, 5861],
];

/// One phase's fully applied kernel: the forward half and the mirrored
/// complement packed into a single 16-tap vector so the splat is one
/// contiguous multiply-add. `next` is the same packing for the adjacent
/// phase, used to linearly blend between phases.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PhaseKernel {
    pub(crate) step: [i32; KERNEL_WIDTH],
    pub(crate) next: [i32; KERNEL_WIDTH],
}

lazy_static! {
    /// Process-wide kernel table, built once on first use.
    pub(crate) static ref KERNELS: [PhaseKernel; PHASE_COUNT] = build_kernels();
}

/// Packs phase `p`: the forward taps of row `p` followed by the reversed
/// taps of the complementary row `PHASE_COUNT - p`.
fn pack_phase(p: usize) -> [i32; KERNEL_WIDTH] {
    let forward = &BL_STEP[p];
    let mirrored = &BL_STEP[PHASE_COUNT - p];

    let mut taps = [0i32; KERNEL_WIDTH];
    for i in 0..HALF_WIDTH {
        taps[i] = i32::from(forward[i]);
        taps[HALF_WIDTH + i] = i32::from(mirrored[HALF_WIDTH - 1 - i]);
    }
    taps
}

fn build_kernels() -> [PhaseKernel; PHASE_COUNT] {
    let mut kernels = [PhaseKernel {
        step: [0; KERNEL_WIDTH],
        next: [0; KERNEL_WIDTH],
    }; PHASE_COUNT];

    for (phase, kernel) in kernels.iter_mut().enumerate() {
        kernel.step = pack_phase(phase);
        kernel.next = pack_phase(phase + 1);
    }
    kernels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_wraps_to_phase_zero() {
        // The 33rd row exists so phase PHASE_COUNT-1 has a `next` half to
        // read: it is the phase-0 row advanced by one whole sample.
        assert_eq!(BL_STEP[PHASE_COUNT][0], 0);
        assert_eq!(BL_STEP[PHASE_COUNT][1..], BL_STEP[0][..HALF_WIDTH - 1]);
    }

    #[test]
    fn test_phase_zero_kernel_is_symmetric() {
        // Exactly on a sample boundary the step response must be an even
        // function of time, so the packed kernel mirrors around its peak.
        let k = &KERNELS[0].step;
        for i in 0..KERNEL_WIDTH - 1 {
            assert_eq!(k[i], k[KERNEL_WIDTH - 2 - i], "tap {}", i);
        }
        assert_eq!(k[KERNEL_WIDTH - 1], 0);
    }

    #[test]
    fn test_every_phase_has_unit_dc_gain() {
        // Each packed 16-tap kernel must sum to exactly DELTA_UNIT, or a
        // constant input would pick up a phase-dependent amplitude error.
        for (phase, kernel) in KERNELS.iter().enumerate() {
            let step_sum: i32 = kernel.step.iter().sum();
            let next_sum: i32 = kernel.next.iter().sum();
            assert_eq!(step_sum, DELTA_UNIT, "phase {} step kernel", phase);
            assert_eq!(next_sum, DELTA_UNIT, "phase {} next kernel", phase);
        }
    }

    #[test]
    fn test_next_kernel_is_adjacent_phase() {
        for phase in 0..PHASE_COUNT - 1 {
            assert_eq!(KERNELS[phase].next, KERNELS[phase + 1].step);
        }
    }

    #[test]
    fn test_phase_zero_packing() {
        let k = &KERNELS[0];
        assert_eq!(k.step[0], 43);
        assert_eq!(k.step[HALF_WIDTH - 1], 21022);
        // Mirrored complement of phase 0 is row 32 reversed: the falling
        // half starts where the rising half peaked.
        assert_eq!(k.step[HALF_WIDTH], 5861);
        assert_eq!(k.step[KERNEL_WIDTH - 1], 0);
    }
}
