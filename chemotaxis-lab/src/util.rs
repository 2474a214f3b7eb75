use anyhow::{anyhow, Context, Result};

/// Accepts decimal or `0x`-prefixed hex; surrounding whitespace is ignored.
pub fn parse_seed(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    let (digits, radix) = match trimmed.get(..2) {
        Some("0x" | "0X") => (&trimmed[2..], 16),
        _ => (trimmed, 10),
    };
    if digits.is_empty() {
        return Err(anyhow!("seed '{text}' has no digits"));
    }
    u32::from_str_radix(digits, radix).with_context(|| format!("invalid seed '{trimmed}'"))
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("{seed:#010x}")
}

/// Spreads `count` seeds from `base` with the golden-ratio increment.
pub fn generate_seeds(base: u32, count: usize) -> Vec<u32> {
    (0..count as u32)
        .map(|i| base.wrapping_add(i.wrapping_mul(0x9E37_79B9)))
        .collect()
}
