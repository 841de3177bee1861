//! Edge behaviour for neighbour lookups on a bounded grid.

/// How a neighbour lookup treats coordinates past the domain edge.
///
/// This only controls *topology* for stencil evaluation (gradients,
/// diffusion). Physical wall conditions such as bounce-back are owned by
/// the solvers themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeBehavior {
    /// Out-of-bounds neighbour maps to the boundary cell (self-loop).
    Clamp,
    /// Out-of-bounds neighbour wraps to the opposite side (periodic).
    Wrap,
    /// Out-of-bounds neighbour is omitted.
    Absorb,
}

/// Resolve a single axis coordinate under the given edge behaviour.
///
/// Returns `None` only for [`EdgeBehavior::Absorb`] out of range.
pub fn resolve_axis(val: i64, len: usize, edge: EdgeBehavior) -> Option<usize> {
    let len_i = len as i64;
    if (0..len_i).contains(&val) {
        return Some(val as usize);
    }
    match edge {
        EdgeBehavior::Absorb => None,
        EdgeBehavior::Clamp => Some(val.clamp(0, len_i - 1) as usize),
        EdgeBehavior::Wrap => Some(val.rem_euclid(len_i) as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_bounds_is_identity() {
        assert_eq!(resolve_axis(2, 5, EdgeBehavior::Absorb), Some(2));
        assert_eq!(resolve_axis(0, 5, EdgeBehavior::Wrap), Some(0));
    }

    #[test]
    fn absorb_drops_out_of_bounds() {
        assert_eq!(resolve_axis(-1, 5, EdgeBehavior::Absorb), None);
        assert_eq!(resolve_axis(5, 5, EdgeBehavior::Absorb), None);
    }

    #[test]
    fn clamp_pins_to_edge() {
        assert_eq!(resolve_axis(-1, 5, EdgeBehavior::Clamp), Some(0));
        assert_eq!(resolve_axis(7, 5, EdgeBehavior::Clamp), Some(4));
    }

    #[test]
    fn wrap_is_periodic() {
        assert_eq!(resolve_axis(-1, 5, EdgeBehavior::Wrap), Some(4));
        assert_eq!(resolve_axis(5, 5, EdgeBehavior::Wrap), Some(0));
        assert_eq!(resolve_axis(-7, 5, EdgeBehavior::Wrap), Some(3));
    }
}
