//! Conversions between the units users type and the units the hub expects.
//!
//! Brightness is handled in two domains: the hub's raw `0..=255` scale and
//! the `1..=99` percent scale users work with. Relative steps happen on the
//! percent scale and are converted back to raw afterwards.

use crate::error::Error;
use crate::error::Result;

pub const PERCENT_MIN: u8 = 1;
pub const PERCENT_MAX: u8 = 99;

pub const KELVIN_MIN: u32 = 1000;
pub const KELVIN_MAX: u32 = 10000;

pub const MIRED_MIN: u32 = 153;
pub const MIRED_MAX: u32 = 500;

/// Raw brightness to a percentage, clamped to `1..=99`.
pub fn raw_to_percent(raw: u64) -> u8 {
    let percent = (raw as f64 * 100.0 / 255.0).round();
    percent.clamp(PERCENT_MIN as f64, PERCENT_MAX as f64) as u8
}

/// A percentage to raw brightness, clamped to `1..=255`.
pub fn percent_to_raw(percent: u8) -> u8 {
    let raw = (percent as f64 * 255.0 / 100.0).round();
    raw.clamp(1.0, 255.0) as u8
}

/// The next multiple of ten above `percent`, at most 99.
pub fn step_up(percent: u8) -> u8 {
    let next = (percent / 10 + 1).saturating_mul(10);
    next.min(PERCENT_MAX)
}

/// The previous multiple of ten below `percent`, at least 1.
pub fn step_down(percent: u8) -> u8 {
    let prev = if percent % 10 == 0 {
        percent.saturating_sub(10)
    } else {
        percent / 10 * 10
    };
    prev.max(PERCENT_MIN)
}

pub fn kelvin_to_mired(kelvin: u32) -> u32 {
    (1_000_000.0 / kelvin as f64).round() as u32
}

pub fn mired_in_range(mired: u32) -> bool {
    (MIRED_MIN..=MIRED_MAX).contains(&mired)
}

/// Validate a Kelvin value and convert it to mireds the hub accepts.
pub fn color_temp_from_kelvin(kelvin: u32) -> Result<u32> {
    if !(KELVIN_MIN..=KELVIN_MAX).contains(&kelvin) {
        return Err(Error::invalid(
            "color temperature",
            format!("{kelvin}K is outside {KELVIN_MIN}-{KELVIN_MAX}K"),
        ));
    }
    let mired = kelvin_to_mired(kelvin);
    if !mired_in_range(mired) {
        return Err(Error::invalid(
            "color temperature",
            format!("{kelvin}K is {mired} mireds, outside {MIRED_MIN}-{MIRED_MAX}"),
        ));
    }
    Ok(mired)
}

/// Parse `"r,g,b"` with each channel in `0..=255`.
pub fn parse_rgb(s: &str) -> Result<[u8; 3]> {
    let malformed = || Error::invalid("color", format!("{s:?} is not in R,G,B format"));

    let mut channels = [0u8; 3];
    let mut parts = s.split(',');
    for channel in channels.iter_mut() {
        let part = parts.next().ok_or_else(malformed)?;
        *channel = part.trim().parse().map_err(|_| {
            Error::invalid("color", format!("channel {part:?} must be 0-255"))
        })?;
    }
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok(channels)
}

/// Volume percentage as the two-decimal fraction the hub expects.
pub fn volume_level(percent: u8) -> Result<String> {
    if percent > 100 {
        return Err(Error::invalid("volume", format!("{percent} must be 0-100")));
    }
    Ok(format!("{:.2}", percent as f64 / 100.0))
}
