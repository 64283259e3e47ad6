//! Backend implementations without delegation
//!
//! Concrete backend types with direct implementations. No Box, no dyn,
//! just simple types with compile-time dispatch.

pub mod avx2;
pub mod scalar;

pub use avx2::Avx2Backend;
pub use scalar::ScalarBackend;
