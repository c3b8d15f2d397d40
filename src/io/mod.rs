//! Mesh file import and export.
//!
//! Formats are behind cargo feature flags. Errors surface as
//! [`FractureError::Io`](crate::errors::FractureError::Io).

#[cfg(feature = "stl-io")]
pub mod stl;
