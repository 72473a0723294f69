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

/// Typed error for rate configuration so callers can distinguish nonsense
/// input from ratios the fixed-point clock cannot represent.
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("Rates must be positive and finite: clock {0} Hz, samples {1} Hz")]
    InvalidRates(f64, f64),

    #[error("Clock rate {clock_rate} Hz exceeds the supported 1048576:1 ratio against sample rate {sample_rate} Hz")]
    RatioExceeded { clock_rate: f64, sample_rate: f64 },
}
