//! Axis arithmetic shared by 2D grid backends.

use crate::edge::EdgeBehavior;

/// Resolve a single axis value under the given edge behaviour.
/// Returns `None` for an absorbed out-of-bounds value.
pub(crate) fn resolve_axis(val: i64, len: u32, edge: EdgeBehavior) -> Option<i32> {
    let n = i64::from(len);
    if val >= 0 && val < n {
        return Some(val as i32);
    }
    match edge {
        EdgeBehavior::Absorb => None,
        EdgeBehavior::Wrap => Some(val.rem_euclid(n) as i32),
    }
}

/// 1D distance along a single axis, accounting for wrap.
pub(crate) fn axis_distance(a: i32, b: i32, len: u32, edge: EdgeBehavior) -> f64 {
    let diff = (a - b).unsigned_abs();
    match edge {
        EdgeBehavior::Wrap => diff.min(len - diff) as f64,
        EdgeBehavior::Absorb => diff as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_in_bounds_is_identity() {
        assert_eq!(resolve_axis(3, 5, EdgeBehavior::Absorb), Some(3));
        assert_eq!(resolve_axis(3, 5, EdgeBehavior::Wrap), Some(3));
    }

    #[test]
    fn resolve_out_of_bounds() {
        assert_eq!(resolve_axis(-1, 5, EdgeBehavior::Absorb), None);
        assert_eq!(resolve_axis(-1, 5, EdgeBehavior::Wrap), Some(4));
        assert_eq!(resolve_axis(7, 5, EdgeBehavior::Wrap), Some(2));
        assert_eq!(resolve_axis(-12, 5, EdgeBehavior::Wrap), Some(3));
    }

    #[test]
    fn wrap_distance_takes_short_way() {
        assert_eq!(axis_distance(0, 9, 10, EdgeBehavior::Wrap), 1.0);
        assert_eq!(axis_distance(0, 9, 10, EdgeBehavior::Absorb), 9.0);
    }
}
