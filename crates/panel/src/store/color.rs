// Deterministic per-identity marker colors.

/// Marker palette; an identity always maps to the same entry.
pub const COLOR_PALETTE: [&str; 12] = [
    "#E53935", "#D81B60", "#8E24AA", "#5E35B1", "#3949AB", "#1E88E5", "#00ACC1", "#00897B",
    "#43A047", "#7CB342", "#C0CA33", "#FDD835",
];

/// Pick a palette color from a 32-bit rolling hash (`h * 31 + unit`) over the
/// identity's UTF-16 code units.
pub fn assign_color(identity: &str) -> &'static str {
    let hash = identity
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit)));
    COLOR_PALETTE[(hash.unsigned_abs() % COLOR_PALETTE.len() as u32) as usize]
}
