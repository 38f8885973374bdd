//! Spin operators and nearest-neighbor spin-chain Hamiltonians.
//!
//! Each model is provided in two forms that must agree for every chain length
//! `n ≥ 2` and all parameter values:
//!
//! - an MPO constructor (`*_mpo`) built with
//!   [`Mpo::nearest_neighbor`][crate::mpo::Mpo::nearest_neighbor], with the
//!   fixed operator bond dimension noted per model;
//! - a brute-force dense constructor (`*_dense`) that sums Kronecker products
//!   over the full *d*<sup>*n*</sup>-dimensional Hilbert space.
//!
//! The dense form exists only to validate the MPO by direct comparison at
//! small `n`; the agreement between the two is checked in this module's tests
//! and in the `mpo_testing` binary.
//!
//! All models are written in terms of the ladder operators S⁺, S⁻ and S^z, so
//! every tensor is real-valued even for a complex element type. Basis states
//! are ordered from highest to lowest spin-*z* weight.

use ndarray as nd;
use num_complex::{ ComplexFloat, Complex64 as C64 };
use num_traits::{ Float, One, Zero };
use once_cell::sync::Lazy;
use crate::{
    ComplexFloatExt,
    mpo::{ Mpo, MpoResult },
};

fn real<R: Float>(x: f64) -> R { R::from(x).unwrap() }

/// Construct the spin-*z* operator for physical dimension `d = 2s + 1`.
pub fn spin_z<A>(d: usize) -> nd::Array2<A>
where A: ComplexFloat + ComplexFloatExt
{
    let s = (d as f64 - 1.0) / 2.0;
    nd::Array2::from_shape_fn((d, d), |(a, b)| {
        if a == b {
            A::from_real(real(s - a as f64))
        } else {
            A::zero()
        }
    })
}

/// Construct the spin raising operator S⁺ for physical dimension `d = 2s + 1`,
/// with matrix elements
/// ⟨*m* + 1∣S⁺∣*m*⟩ = √(*s*(*s* + 1) − *m*(*m* + 1)).
pub fn spin_raise<A>(d: usize) -> nd::Array2<A>
where A: ComplexFloat + ComplexFloatExt
{
    let s = (d as f64 - 1.0) / 2.0;
    nd::Array2::from_shape_fn((d, d), |(a, b)| {
        if b == a + 1 {
            let m = s - b as f64;
            A::from_real(real((s * (s + 1.0) - m * (m + 1.0)).sqrt()))
        } else {
            A::zero()
        }
    })
}

/// Construct the spin lowering operator S⁻ for physical dimension
/// `d = 2s + 1`, with matrix elements
/// ⟨*m* − 1∣S⁻∣*m*⟩ = √(*s*(*s* + 1) − *m*(*m* − 1)).
pub fn spin_lower<A>(d: usize) -> nd::Array2<A>
where A: ComplexFloat + ComplexFloatExt
{
    let s = (d as f64 - 1.0) / 2.0;
    nd::Array2::from_shape_fn((d, d), |(a, b)| {
        if a == b + 1 {
            let m = s - b as f64;
            A::from_real(real((s * (s + 1.0) - m * (m - 1.0)).sqrt()))
        } else {
            A::zero()
        }
    })
}

/// Construct the `d`-dimensional identity.
pub fn identity<A>(d: usize) -> nd::Array2<A>
where A: ComplexFloat
{
    nd::Array2::from_shape_fn(
        (d, d),
        |(a, b)| if a == b { A::one() } else { A::zero() },
    )
}

/// Lazy-static version of [`spin_z`] for spin 1/2 and a [`Complex64`][C64]
/// element type.
pub static SZ_HALF: Lazy<nd::Array2<C64>> = Lazy::new(|| spin_z(2));

/// Lazy-static version of [`spin_raise`] for spin 1/2 and a [`Complex64`][C64]
/// element type.
pub static SP_HALF: Lazy<nd::Array2<C64>> = Lazy::new(|| spin_raise(2));

/// Lazy-static version of [`spin_lower`] for spin 1/2 and a [`Complex64`][C64]
/// element type.
pub static SM_HALF: Lazy<nd::Array2<C64>> = Lazy::new(|| spin_lower(2));

/// Lazy-static version of [`spin_z`] for spin 1 and a [`Complex64`][C64]
/// element type.
pub static SZ_ONE: Lazy<nd::Array2<C64>> = Lazy::new(|| spin_z(3));

/// Lazy-static version of [`spin_raise`] for spin 1 and a [`Complex64`][C64]
/// element type.
pub static SP_ONE: Lazy<nd::Array2<C64>> = Lazy::new(|| spin_raise(3));

/// Lazy-static version of [`spin_lower`] for spin 1 and a [`Complex64`][C64]
/// element type.
pub static SM_ONE: Lazy<nd::Array2<C64>> = Lazy::new(|| spin_lower(3));

/// Kronecker product of two matrices, with `a`'s indices most significant.
pub fn kron<A>(a: &nd::Array2<A>, b: &nd::Array2<A>) -> nd::Array2<A>
where A: ComplexFloat
{
    let (ra, ca) = a.dim();
    let (rb, cb) = b.dim();
    nd::Array2::from_shape_fn((ra * rb, ca * cb), |(i, j)| {
        a[[i / rb, j / cb]] * b[[i % rb, j % cb]]
    })
}

// single-site term plus two-site terms (A_t, B_t, c_t) defining a
// nearest-neighbor model
type Terms<A> = (nd::Array2<A>, Vec<(nd::Array2<A>, nd::Array2<A>, A)>);

fn xy_terms<A>(d: usize, j: A::Real) -> Terms<A>
where A: ComplexFloat + ComplexFloatExt
{
    let sp = spin_raise::<A>(d);
    let sm = spin_lower::<A>(d);
    let jhalf = A::from_real(j * real(0.5));
    let terms = vec![
        (sp.clone(), sm.clone(), jhalf),
        (sm, sp, jhalf),
    ];
    (nd::Array2::zeros((d, d)), terms)
}

fn heisenberg_terms<A>(d: usize, j: A::Real, h: A::Real) -> Terms<A>
where A: ComplexFloat + ComplexFloatExt
{
    let sp = spin_raise::<A>(d);
    let sm = spin_lower::<A>(d);
    let sz = spin_z::<A>(d);
    let jhalf = A::from_real(j * real(0.5));
    let onsite = sz.mapv(|o| -o * A::from_real(h));
    let terms = vec![
        (sp.clone(), sm.clone(), jhalf),
        (sm, sp, jhalf),
        (sz.clone(), sz, A::from_real(j)),
    ];
    (onsite, terms)
}

fn aklt_terms<A>() -> Terms<A>
where A: ComplexFloat + ComplexFloatExt + 'static
{
    let sp = spin_raise::<A>(3);
    let sm = spin_lower::<A>(3);
    let sz = spin_z::<A>(3);
    // S·S = Σ_a c_a A_a ⊗ B_a in the ladder-operator basis
    let dot: [(&nd::Array2<A>, &nd::Array2<A>, f64); 3] = [
        (&sp, &sm, 0.5),
        (&sm, &sp, 0.5),
        (&sz, &sz, 1.0),
    ];
    let mut terms: Vec<(nd::Array2<A>, nd::Array2<A>, A)>
        = Vec::with_capacity(12);
    for (a, b, c) in dot.iter() {
        terms.push(((*a).clone(), (*b).clone(), A::from_real(real(*c))));
    }
    // (S·S)² = Σ_{a,b} c_a c_b (A_a A_b) ⊗ (B_a B_b)
    for (a1, b1, c1) in dot.iter() {
        for (a2, b2, c2) in dot.iter() {
            terms.push((
                a1.dot(*a2),
                b1.dot(*b2),
                A::from_real(real(c1 * c2 / 3.0)),
            ));
        }
    }
    (nd::Array2::zeros((3, 3)), terms)
}

// H = Σ_i onsite_i + Σ_i Σ_t c_t A_t^(i) B_t^(i+1) on the full Hilbert space
fn dense_nn<A>(
    n: usize,
    d: usize,
    onsite: &nd::Array2<A>,
    terms: &[(nd::Array2<A>, nd::Array2<A>, A)],
) -> nd::Array2<A>
where A: ComplexFloat + 'static
{
    let dim = d.pow(n as u32);
    let mut ham: nd::Array2<A> = nd::Array2::zeros((dim, dim));
    for i in 0..n {
        let mut term = onsite.clone();
        if i > 0 {
            term = kron(&identity::<A>(d.pow(i as u32)), &term);
        }
        if i < n - 1 {
            term = kron(&term, &identity::<A>(d.pow((n - 1 - i) as u32)));
        }
        ham = ham + &term;
    }
    for i in 0..n - 1 {
        for (a, b, c) in terms.iter() {
            let mut term = kron(a, b);
            term.map_inplace(|x| { *x = *c * *x; });
            if i > 0 {
                term = kron(&identity::<A>(d.pow(i as u32)), &term);
            }
            if i < n - 2 {
                term = kron(&term, &identity::<A>(d.pow((n - 2 - i) as u32)));
            }
            ham = ham + &term;
        }
    }
    ham
}

/// Construct the MPO of the XY chain on `n` sites of physical dimension `d`,
///
/// > *H* = *J* Σ<sub>*i*</sub> (
/// > S⁺<sub>*i*</sub> S⁻<sub>*i* + 1</sub> +
/// > S⁻<sub>*i*</sub> S⁺<sub>*i* + 1</sub> ) / 2.
///
/// The operator bond dimension is 4. Fails if `n < 2` or `d == 0`.
pub fn xy_mpo<A>(n: usize, d: usize, j: A::Real) -> MpoResult<Mpo<A>>
where A: ComplexFloat + ComplexFloatExt
{
    let (onsite, terms) = xy_terms::<A>(d, j);
    Mpo::nearest_neighbor(n, &onsite, &terms)
}

/// Brute-force dense counterpart of [`xy_mpo`] on the full Hilbert space.
///
/// Exponential in `n`; intended only for validating the MPO at small sizes.
pub fn xy_dense<A>(n: usize, d: usize, j: A::Real) -> nd::Array2<A>
where A: ComplexFloat + ComplexFloatExt + 'static
{
    let (onsite, terms) = xy_terms::<A>(d, j);
    dense_nn(n, d, &onsite, &terms)
}

/// Construct the MPO of the Heisenberg chain in a longitudinal field on `n`
/// sites of physical dimension `d`,
///
/// > *H* = *J* Σ<sub>*i*</sub> \[ (
/// > S⁺<sub>*i*</sub> S⁻<sub>*i* + 1</sub> +
/// > S⁻<sub>*i*</sub> S⁺<sub>*i* + 1</sub> ) / 2 +
/// > S^z<sub>*i*</sub> S^z<sub>*i* + 1</sub> \]
/// > − *h* Σ<sub>*i*</sub> S^z<sub>*i*</sub>.
///
/// The operator bond dimension is 5. Fails if `n < 2` or `d == 0`.
pub fn heisenberg_mpo<A>(n: usize, d: usize, j: A::Real, h: A::Real)
    -> MpoResult<Mpo<A>>
where A: ComplexFloat + ComplexFloatExt
{
    let (onsite, terms) = heisenberg_terms::<A>(d, j, h);
    Mpo::nearest_neighbor(n, &onsite, &terms)
}

/// Brute-force dense counterpart of [`heisenberg_mpo`] on the full Hilbert
/// space.
///
/// Exponential in `n`; intended only for validating the MPO at small sizes.
pub fn heisenberg_dense<A>(n: usize, d: usize, j: A::Real, h: A::Real)
    -> nd::Array2<A>
where A: ComplexFloat + ComplexFloatExt + 'static
{
    let (onsite, terms) = heisenberg_terms::<A>(d, j, h);
    dense_nn(n, d, &onsite, &terms)
}

/// Construct the MPO of the spin-1 AKLT chain on `n` sites,
///
/// > *H* = Σ<sub>*i*</sub> \[
/// > **S**<sub>*i*</sub> · **S**<sub>*i* + 1</sub> +
/// > ( **S**<sub>*i*</sub> · **S**<sub>*i* + 1</sub> )² / 3 \].
///
/// The quadratic term expands into 9 two-site products of ladder operators,
/// so the operator bond dimension is 14. Fails if `n < 2`.
pub fn aklt_mpo<A>(n: usize) -> MpoResult<Mpo<A>>
where A: ComplexFloat + ComplexFloatExt + 'static
{
    let (onsite, terms) = aklt_terms::<A>();
    Mpo::nearest_neighbor(n, &onsite, &terms)
}

/// Brute-force dense counterpart of [`aklt_mpo`] on the full Hilbert space.
///
/// Exponential in `n`; intended only for validating the MPO at small sizes.
pub fn aklt_dense<A>(n: usize) -> nd::Array2<A>
where A: ComplexFloat + ComplexFloatExt + 'static
{
    let (onsite, terms) = aklt_terms::<A>();
    dense_nn(n, 3, &onsite, &terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_abs_diff(a: &nd::Array2<C64>, b: &nd::Array2<C64>) -> f64 {
        a.iter().zip(b)
            .map(|(ak, bk)| (ak - bk).norm())
            .fold(0.0, f64::max)
    }

    fn commutator(a: &nd::Array2<C64>, b: &nd::Array2<C64>)
        -> nd::Array2<C64>
    {
        a.dot(b) - b.dot(a)
    }

    #[test]
    fn spin_algebra() {
        for d in 2..=4 {
            let sp: nd::Array2<C64> = spin_raise(d);
            let sm: nd::Array2<C64> = spin_lower(d);
            let sz: nd::Array2<C64> = spin_z(d);
            // [Sz, S±] = ±S±, [S+, S-] = 2 Sz
            assert!(max_abs_diff(&commutator(&sz, &sp), &sp) < 1e-14);
            assert!(
                max_abs_diff(&commutator(&sz, &sm), &sm.mapv(|x| -x)) < 1e-14
            );
            assert!(
                max_abs_diff(
                    &commutator(&sp, &sm),
                    &sz.mapv(|x| x * C64::from(2.0)),
                ) < 1e-14
            );
        }
    }

    #[test]
    fn xy_mpo_matches_dense() {
        let mpo = xy_mpo::<C64>(5, 2, 1.0).unwrap();
        assert_eq!(mpo.bond_dims(), vec![4, 4, 4, 4]);
        let dense = xy_dense::<C64>(5, 2, 1.0);
        assert_eq!(dense.shape(), [32, 32]);
        // all entries are exact half-integers, so the match is exact
        assert_eq!(max_abs_diff(&mpo.contract_dense(), &dense), 0.0);
    }

    #[test]
    fn heisenberg_mpo_matches_dense() {
        let (j, h) = (0.8375, -0.2921);
        let mpo = heisenberg_mpo::<C64>(5, 3, j, h).unwrap();
        assert_eq!(mpo.bond_dims(), vec![5, 5, 5, 5]);
        let dense = heisenberg_dense::<C64>(5, 3, j, h);
        assert_eq!(dense.shape(), [243, 243]);
        assert!(max_abs_diff(&mpo.contract_dense(), &dense) < 1e-12);
    }

    #[test]
    fn heisenberg_spin_half_small() {
        let (j, h) = (1.0, 0.5);
        let mpo = heisenberg_mpo::<C64>(3, 2, j, h).unwrap();
        let dense = heisenberg_dense::<C64>(3, 2, j, h);
        assert!(max_abs_diff(&mpo.contract_dense(), &dense) < 1e-13);
    }

    #[test]
    fn aklt_mpo_matches_dense() {
        let mpo = aklt_mpo::<C64>(5).unwrap();
        assert_eq!(mpo.bond_dims(), vec![14, 14, 14, 14]);
        let dense = aklt_dense::<C64>(5);
        assert_eq!(dense.shape(), [243, 243]);
        assert!(max_abs_diff(&mpo.contract_dense(), &dense) < 1e-12);
    }

    #[test]
    fn dense_hamiltonians_hermitian() {
        let ham = heisenberg_dense::<C64>(4, 3, 0.75, 0.1);
        let hc = ham.t().mapv(|x| x.conj());
        assert!(max_abs_diff(&ham, &hc) < 1e-13);

        let ham = aklt_dense::<C64>(4);
        let hc = ham.t().mapv(|x| x.conj());
        assert!(max_abs_diff(&ham, &hc) < 1e-13);
    }
}
