// Re-export parry and rapier for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;
#[cfg(feature = "f64")]
pub use rapier3d_f64 as rapier3d;

#[cfg(feature = "f32")]
pub use parry3d;
#[cfg(feature = "f32")]
pub use rapier3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Componentwise limit under which two face normals are taken to cancel out.
///
/// Seam detection sums the normals of two candidate faces and treats the pair
/// as facing each other when every component of the sum is within this limit.
/// f32 builds need a looser limit than f64 ones. `RBFRACTURE_TOLERANCE` at
/// build time or [`set_tolerance`] before the first build replaces the default.
static NORMAL_TOLERANCE: OnceLock<Real> = OnceLock::new();

#[inline]
const fn default_tolerance() -> Real {
    #[cfg(feature = "f32")]
    {
        1e-4
    }
    #[cfg(feature = "f64")]
    {
        1e-6
    }
}

/// The normal cancellation limit, fixed on first use.
pub fn tolerance() -> Real {
    *NORMAL_TOLERANCE.get_or_init(|| {
        option_env!("RBFRACTURE_TOLERANCE")
            .and_then(|raw| Real::from_str(raw).ok())
            .map_or(default_tolerance(), |value| value.max(Real::EPSILON))
    })
}

/// Override the normal cancellation limit. Ignored once [`tolerance`] has
/// been read or a value was already set.
pub fn set_tolerance(value: Real) {
    let _ = NORMAL_TOLERANCE.set(value.max(Real::EPSILON));
}

/// Weld distance used on the disposable output copy before proximity checks.
pub const AUTOMERGE_DIST: Real = 0.00001;

/// Componentwise comparison with an inclusive limit.
#[inline]
pub fn compare_v3(a: &nalgebra::Vector3<Real>, b: &nalgebra::Vector3<Real>, limit: Real) -> bool {
    (a.x - b.x).abs() <= limit && (a.y - b.y).abs() <= limit && (a.z - b.z).abs() <= limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn compare_is_inclusive() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(1.5, 2.0, 3.0);
        assert!(compare_v3(&a, &b, 0.5));
        assert!(!compare_v3(&a, &b, 0.25));
    }

    #[test]
    fn tolerance_is_positive() {
        assert!(tolerance() > 0.0);
    }

    #[test]
    fn tolerance_is_fixed_after_first_read() {
        let first = tolerance();
        set_tolerance(first * 1000.0);
        assert_eq!(tolerance(), first);
    }
}
