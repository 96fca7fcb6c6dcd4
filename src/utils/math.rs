//! Small vector helpers layered on top of `glam`.

use glam::DVec2;

/// Lengths below this are treated as a zero vector by [`normalize_or_x`].
pub const NORMALIZE_EPSILON: f64 = 1e-6;

/// Unit vector along `v`, or `+X` when `v` is too short to carry a direction.
#[inline]
pub fn normalize_or_x(v: DVec2) -> DVec2 {
    let len = v.length();
    if len < NORMALIZE_EPSILON {
        return DVec2::X;
    }
    v / len
}

/// Wraps `value` into `[0, length)`.
#[inline]
pub fn wrap_periodic(value: f64, length: f64) -> f64 {
    if value >= 0.0 && value < length {
        return value;
    }
    let wrapped = value.rem_euclid(length);
    // rem_euclid of a tiny negative number may round up to `length`.
    if wrapped >= length {
        0.0
    } else {
        wrapped
    }
}

/// Rescales `v` to `max_len` when it is longer, keeping its direction.
#[inline]
pub fn clamp_length(v: DVec2, max_len: f64) -> DVec2 {
    if v.length_squared() > max_len * max_len {
        normalize_or_x(v) * max_len
    } else {
        v
    }
}
