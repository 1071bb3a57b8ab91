//! Number and vector formatting used by the string builtins

use core_types::Vec3;

/// `ftos`: whole numbers print without decimals, anything else with one
///
/// # Example
///
/// ```
/// use builtins::format::float_to_string;
///
/// assert_eq!(float_to_string(42.0), "42");
/// assert_eq!(float_to_string(0.3), "  0.3");
/// ```
pub fn float_to_string(value: f32) -> String {
    if value.is_finite() && value == value.trunc() && value.abs() < i32::MAX as f32 {
        format!("{}", value as i32)
    } else {
        format!("{:5.1}", value)
    }
}

/// `vtos`: `'x y z'` with one decimal per component
pub fn vector_to_string(v: Vec3) -> String {
    let [x, y, z] = v.0;
    format!("'{:5.1} {:5.1} {:5.1}'", x, y, z)
}

/// `etos`: `entity N`
pub fn entity_to_string(ent: i32) -> String {
    format!("entity {}", ent)
}

/// `stof`: the longest leading decimal number, 0 when there is none
pub fn string_to_float(text: &str) -> f32 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let number = &s[..end];
    if number.len() == digits_start || number[digits_start..] == *"." {
        return 0.0;
    }
    number.parse().unwrap_or(0.0)
}
