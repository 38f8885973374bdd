//! Tools for building and canonicalizing matrix product representations of
//! one-dimensional quantum spin chains.
//!
//! Two independent components are provided:
//!
//! - [`chain`]: chains of rank-3 site tensors (matrix product states) with
//!   left-/right-normalization sweeps based on sequential thin singular value
//!   decompositions;
//! - [`mpo`] and [`models`]: chains of rank-4 operator tensors (matrix
//!   product operators) encoding nearest-neighbor spin-chain Hamiltonians
//!   (XY, Heisenberg with a Zeeman term, AKLT), together with brute-force
//!   dense constructors used to validate them for small chain lengths.

use num_complex::{ ComplexFloat, Complex };
use num_traits::{ Float, Zero };

pub mod chain;
pub mod mpo;
pub mod models;

/// Extension trait for [`ComplexFloat`].
pub trait ComplexFloatExt: ComplexFloat {
    /// Return the imaginary unit, *i*.
    fn i() -> Self;

    /// Convert from `Self::Real`.
    ///
    /// Should adhere to the usual relationship between ordinary complex and
    /// real numbers, i.e. the result should have imaginary part equal to zero.
    fn from_real(x: Self::Real) -> Self;

    /// Construct from real and imaginary components.
    fn from_components(re: Self::Real, im: Self::Real) -> Self;
}

impl<T> ComplexFloatExt for Complex<T>
where
    Complex<T>: ComplexFloat<Real = T>,
    T: Zero + Float,
{
    fn i() -> Self { Complex::i() }

    fn from_real(x: Self::Real) -> Self {
        Self { re: x, im: <Self::Real as Zero>::zero() }
    }

    fn from_components(re: Self::Real, im: Self::Real) -> Self {
        Self { re, im }
    }
}
