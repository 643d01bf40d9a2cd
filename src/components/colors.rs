use image::Rgba;

/// Swatches offered by the color picker.
pub const PALETTE: [&str; 5] = ["#ff0000", "#00ff00", "#0000ff", "#ffff00", "#000000"];

/// Default "on" color of a new session.
pub const DEFAULT_ON_COLOR: &str = "#ffff00";

/// Parse a `#RRGGBB` string into `[r, g, b]`.
///
/// Anything that is not exactly 7 bytes long decodes to black.  Each channel
/// is read from its two bytes as a lenient hex prefix (see [`parse_channel`]);
/// the leading character is not inspected.
pub fn decode_color(hex: &str) -> [u8; 3] {
    let bytes = hex.as_bytes();
    if bytes.len() != 7 {
        return [0, 0, 0];
    }
    [
        parse_channel(&bytes[1..3]),
        parse_channel(&bytes[3..5]),
        parse_channel(&bytes[5..7]),
    ]
}

/// Lenient hex channel: optional leading whitespace and sign, then as many
/// hex digits as are present.  `"1z"` is 1, `"z1"` is 0, negatives clamp to 0.
fn parse_channel(digits: &[u8]) -> u8 {
    let skip = digits.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let (negative, rest) = match &digits[skip..] {
        [b'-', tail @ ..] => (true, tail),
        [b'+', tail @ ..] => (false, tail),
        other => (false, other),
    };
    let value = rest
        .iter()
        .map_while(|b| (*b as char).to_digit(16))
        .fold(0u32, |acc, d| acc * 16 + d);
    if negative { 0 } else { value.min(255) as u8 }
}

/// Format `[r, g, b]` as lowercase `#rrggbb`.
pub fn encode_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// The fully opaque "on" pixel for a hex color.
pub fn on_pixel(hex: &str) -> Rgba<u8> {
    let [r, g, b] = decode_color(hex);
    Rgba([r, g, b, 255])
}

/// True when `hex` decodes without falling back (7 bytes, `#`, six hex digits).
pub fn is_valid_color(hex: &str) -> bool {
    let bytes = hex.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
}
