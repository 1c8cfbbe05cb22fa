//! This module renders SRT text.
//! It holds the block model and the `HH:MM:SS,mmm` timestamp formatting.

/// Represents a single SRT block (index, time range, text lines).
#[derive(Debug, Clone, PartialEq)]
pub struct SrtBlock {
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: Vec<String>,
}

/// Convert fractional seconds to whole milliseconds.
/// Rounding happens on the total so that 1.9996 s becomes 2,000 rather
/// than 1,1000. Negative values clamp to zero.
pub fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// Format SRT blocks to text.
/// Each block is written sequentially and followed by a blank line.
pub fn format(blocks: &[SrtBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            block.index,
            format_time(block.start_ms),
            format_time(block.end_ms),
            block.text.join("\n")
        ));
    }
    out
}

/// Format milliseconds as `HH:MM:SS,mmm`.
pub fn format_time(ms: u64) -> String {
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1000;
    let ms = ms % 1000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}
