use serde::{Deserialize, Serialize};

/// How out-of-range coordinates are resolved when sampling or padding.
///
/// - `Replicate`: repeat the edge element (`aaa|abcd|ddd`)
/// - `Reflect101`: mirror around the edge element without repeating it (`dcb|abcd|cba`)
/// - `Constant(v)`: read `v` outside the array
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BorderMode {
    #[default]
    Replicate,
    Reflect101,
    Constant(f32),
}

/// Maps a possibly out-of-range index into `[0, len)`.
///
/// Returns `None` for `Constant` outside the range (and for `len == 0`),
/// meaning the caller should use the constant value.
pub fn map_index(i: isize, len: usize, mode: BorderMode) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if i >= 0 && (i as usize) < len {
        return Some(i as usize);
    }
    match mode {
        BorderMode::Constant(_) => None,
        BorderMode::Replicate => Some(if i < 0 { 0 } else { len - 1 }),
        BorderMode::Reflect101 => {
            if len == 1 {
                return Some(0);
            }
            let period = (2 * len - 2) as isize;
            let r = i.rem_euclid(period) as usize;
            Some(if r < len { r } else { 2 * len - 2 - r })
        }
    }
}

impl BorderMode {
    /// Value used where `map_index` returns `None`.
    pub(crate) fn fill_value(self) -> f32 {
        match self {
            BorderMode::Constant(v) => v,
            _ => 0.0,
        }
    }
}
