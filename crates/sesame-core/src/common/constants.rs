//! Physical constants and grid conventions shared by the analysis kernels.

/// Atomic mass unit in grams.
pub const ATOMIC_MASS_UNIT_G: f64 = 1.66054e-24;

/// Average atomic mass used when a material does not provide a usable `abar`.
pub const FALLBACK_ABAR: f64 = 10.0;

/// Grid entries at or below this value are placeholders, not physical points.
pub const PLACEHOLDER_THRESHOLD: f64 = 1.0e-10;

/// A grid axis needs strictly more valid entries than this to be usable.
pub const MIN_USABLE_AXIS_POINTS: usize = 5;

/// Allowed deviation of the element fraction sum from one.
pub const FRACTION_SUM_TOLERANCE: f64 = 1.0e-6;

/// Scale from CGS pressure (dyn/cm²) to GPa, and from erg/g to MJ/kg.
pub const CGS_TO_GIGA: f64 = 1.0e-10;

pub const fn is_valid_grid_value(value: f64) -> bool {
    value > PLACEHOLDER_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::{
        ATOMIC_MASS_UNIT_G, CGS_TO_GIGA, FALLBACK_ABAR, PLACEHOLDER_THRESHOLD,
        is_valid_grid_value,
    };

    #[test]
    fn placeholder_boundary_is_exclusive() {
        assert!(!is_valid_grid_value(PLACEHOLDER_THRESHOLD));
        assert!(!is_valid_grid_value(0.0));
        assert!(!is_valid_grid_value(-1.0));
        assert!(!is_valid_grid_value(f64::NAN));
        assert!(is_valid_grid_value(2.0e-10));
        assert!(is_valid_grid_value(1.0e-9));
        assert!(!is_valid_grid_value(1.0e-12));
    }

    #[test]
    fn constants_remain_finite_and_positive() {
        for value in [ATOMIC_MASS_UNIT_G, FALLBACK_ABAR, CGS_TO_GIGA] {
            assert!(value.is_finite());
            assert!(value > 0.0);
        }
    }
}
