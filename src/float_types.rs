//! Floating point width selection and the numeric constants shared by the
//! whole crate.

/// Classification tolerance for plane/point tests.
///
/// An absolute tolerance, not scale-relative: meshes much larger or smaller
/// than unit scale may need a different value to avoid slivers (too small)
/// or collapsed faces (too large).
pub const EPSILON: Real = 1e-5;

#[cfg(feature = "f64")]
pub type Real = f64;
#[cfg(feature = "f64")]
pub const PI: Real = core::f64::consts::PI;
#[cfg(feature = "f64")]
pub const TAU: Real = core::f64::consts::TAU;
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;

#[cfg(all(feature = "f32", not(feature = "f64")))]
pub type Real = f32;
#[cfg(all(feature = "f32", not(feature = "f64")))]
pub const PI: Real = core::f32::consts::PI;
#[cfg(all(feature = "f32", not(feature = "f64")))]
pub const TAU: Real = core::f32::consts::TAU;
#[cfg(all(feature = "f32", not(feature = "f64")))]
pub use parry3d;
