//! CSS-style color strings.

use image::Rgba;

use photomark_common::{PhotomarkError, PhotomarkResult};

/// Parse `#RGB`, `#RRGGBB`, `#RRGGBBAA`, `rgb(r, g, b)` or
/// `rgba(r, g, b, a)` and multiply its alpha by `opacity`.
pub fn parse_color(input: &str, opacity: f32) -> PhotomarkResult<Rgba<u8>> {
    let s = input.trim();
    let invalid = || PhotomarkError::processing(format!("Invalid color: {input:?}"));

    let [r, g, b, a] = if let Some(hex) = s.strip_prefix('#') {
        parse_hex(hex).ok_or_else(invalid)?
    } else if let Some(args) = function_args(s, "rgba") {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(invalid());
        }
        let alpha: f32 = parts[3].parse().map_err(|_| invalid())?;
        [
            channel(parts[0]).ok_or_else(invalid)?,
            channel(parts[1]).ok_or_else(invalid)?,
            channel(parts[2]).ok_or_else(invalid)?,
            unit_to_byte(alpha),
        ]
    } else if let Some(args) = function_args(s, "rgb") {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        [
            channel(parts[0]).ok_or_else(invalid)?,
            channel(parts[1]).ok_or_else(invalid)?,
            channel(parts[2]).ok_or_else(invalid)?,
            255,
        ]
    } else {
        return Err(invalid());
    };

    let alpha = (a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    Ok(Rgba([r, g, b, alpha]))
}

fn function_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

    match hex.len() {
        3 => Some([nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17, 255]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

fn channel(s: &str) -> Option<u8> {
    s.parse::<u16>().ok().map(|v| v.min(255) as u8)
}

fn unit_to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
