//! Absolute CSS lengths converted to PDF user units (points).

const PX_TO_PT: f32 = 0.75;
const IN_TO_PT: f32 = 72.0;
const CM_TO_PT: f32 = 72.0 / 2.54;
const MM_TO_PT: f32 = 72.0 / 25.4;
const PC_TO_PT: f32 = 12.0;

/// Parses a number with an optional absolute unit (`px`, `pt`, `pc`, `in`, `cm`, `mm`).
/// Unitless values are user units. Relative units such as `em` or `%` are unparsed.
pub fn parse_absolute_length(input: &str) -> Option<f32> {
    let s = input.trim();
    let split = number_prefix_len(s)?;
    let (number, unit) = s.split_at(split);
    let value = number.parse::<f32>().ok()?;
    if !value.is_finite() {
        return None;
    }
    let factor = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "pt" => 1.0,
        "px" => PX_TO_PT,
        "pc" => PC_TO_PT,
        "in" => IN_TO_PT,
        "cm" => CM_TO_PT,
        "mm" => MM_TO_PT,
        _ => return None,
    };
    Some(value * factor)
}

/// Parses a plain number, or `fallback` when the attribute is missing or malformed.
pub(crate) fn length_or(input: Option<&str>, fallback: f32) -> f32 {
    input.and_then(parse_absolute_length).unwrap_or(fallback)
}

/// Extent of an outermost viewport in its own user units. Unitless and `pt`
/// lengths already are user units; any other absolute unit counts CSS pixels.
pub(crate) fn viewport_user_extent(input: &str) -> Option<f32> {
    let s = input.trim();
    let split = number_prefix_len(s)?;
    let points = parse_absolute_length(s)?;
    match s[split..].trim().to_ascii_lowercase().as_str() {
        "" | "pt" => Some(points),
        _ => Some(points / PX_TO_PT),
    }
}

// Length of the leading real-number token, `None` when there is none.
fn number_prefix_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
        i += 1;
    }
    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        // "2em" is a number followed by a unit, not an exponent.
        if j > exp_start {
            i = j;
        }
    }
    Some(i)
}
