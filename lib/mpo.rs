//! Chains of rank-4 operator tensors (matrix product operators) for operators
//! on the full product space of a spin chain.
//!
//! Each site tensor carries a left operator bond index, an outgoing physical
//! index, a right operator bond index, and an incoming physical index, in that
//! axis order. Contracting all sites in sequence over adjacent operator bonds
//! and reshaping reproduces the dense operator matrix on the
//! *d*<sup>*n*</sup>-dimensional Hilbert space; that equivalence (checked
//! against the brute-force constructors in [`models`][crate::models]) is the
//! sole correctness criterion for a builder.
//!
//! The [`nearest_neighbor`][Mpo::nearest_neighbor] builder covers every model
//! in this crate: Hamiltonians of the form
//!
//! > *H* = Σ<sub>*i*</sub> *O*<sup>(*i*)</sup>
//! > + Σ<sub>*i*</sub> Σ<sub>*t*</sub>
//! > *c*<sub>*t*</sub> *A*<sub>*t*</sub><sup>(*i*)</sup>
//! > *B*<sub>*t*</sub><sup>(*i* + 1)</sup>
//!
//! are encoded with operator bond dimension `T + 2` for `T` two-site terms,
//! with the first and last sites sliced to the nontrivial row and column of
//! the bulk tensor.

use std::ops::Add;
use itertools::Itertools;
use ndarray as nd;
use num_complex::ComplexFloat;
use num_traits::{ One, Zero };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MpoError {
    /// Returned when attempting to create an MPO for fewer than two sites.
    #[error("error in MPO creation: need at least 2 sites, got {0}")]
    TooShort(usize),

    /// Returned when a site tensor has an axis of zero length.
    #[error("error in MPO creation: zero-sized axis on the tensor at site {0}")]
    ZeroDimAxis(usize),

    /// Returned when an outward-facing operator bond is not one-dimensional.
    #[error("error in MPO creation: outer operator bond at site {site} has dimension {dim}, expected 1")]
    OuterBond { site: usize, dim: usize },

    /// Returned when the operator bond dimensions of adjacent site tensors
    /// disagree.
    #[error("error in MPO creation: operator bond mismatch at site {site}: left bond dimension {left} does not match right bond dimension {right} of the preceding site")]
    BondMismatch { site: usize, left: usize, right: usize },

    /// Returned when the outgoing and incoming physical legs of a site tensor
    /// have different dimensions.
    #[error("error in MPO creation: physical legs at site {site} have dimensions {out} and {input}, expected equal")]
    PhysMismatch { site: usize, out: usize, input: usize },

    /// Returned when a local operator passed to a builder is not square with
    /// the physical dimension shared by the other operators.
    #[error("error in MPO construction: local operator is not square with dimension {0}")]
    OperatorIncompatibleShape(usize),
}
use MpoError::*;
pub type MpoResult<T> = Result<T, MpoError>;

/// A chain of rank-4 operator tensors representing an operator on the full
/// product space of `n ≥ 2` sites.
///
/// Site tensor `k` has axis signature `[ w{k - 1}, s{k}, w{k}, s'{k} ]`, where
/// `w{j}` is an operator bond index, `s{j}` the outgoing physical index, and
/// `s'{j}` the incoming physical index. Outer operator bond dimensions are
/// held fixed at 1. Construction verifies the bond structure, so contraction
/// is infallible.
#[derive(Clone, Debug, PartialEq)]
pub struct Mpo<A>
where A: ComplexFloat
{
    // Number of sites.
    pub(crate) n: usize, // ≥ 2
    // Operator tensors; length n.
    pub(crate) data: Vec<nd::Array4<A>>,
}

impl<A> Mpo<A>
where A: ComplexFloat
{
    /// Create a new MPO from raw operator tensors.
    ///
    /// Fails if fewer than two tensors are provided, any tensor has a
    /// zero-sized axis, the outgoing and incoming physical legs of a site
    /// disagree, either outer operator bond has dimension other than 1, or
    /// the operator bond dimensions of adjacent tensors disagree.
    pub fn new<I>(tensors: I) -> MpoResult<Self>
    where I: IntoIterator<Item = nd::Array4<A>>
    {
        let data: Vec<nd::Array4<A>> = tensors.into_iter().collect();
        let n = data.len();
        if n < 2 { return Err(TooShort(n)); }
        for (k, g) in data.iter().enumerate() {
            let sh = g.shape();
            if sh.iter().any(|dim| *dim == 0) { return Err(ZeroDimAxis(k)); }
            if sh[1] != sh[3] {
                return Err(PhysMismatch { site: k, out: sh[1], input: sh[3] });
            }
        }
        let w0 = data[0].shape()[0];
        if w0 != 1 { return Err(OuterBond { site: 0, dim: w0 }); }
        let wn = data[n - 1].shape()[2];
        if wn != 1 { return Err(OuterBond { site: n - 1, dim: wn }); }
        for (k, (gl, gr)) in data.iter().tuple_windows().enumerate() {
            let right = gl.shape()[2];
            let left = gr.shape()[0];
            if left != right {
                return Err(BondMismatch { site: k + 1, left, right });
            }
        }
        Ok(Self { n, data })
    }

    /// Construct the MPO of a sum of identical local terms,
    /// *H* = Σ<sub>*i*</sub> *O*<sup>(*i*)</sup>
    /// + Σ<sub>*i*</sub> Σ<sub>*t*</sub> *c*<sub>*t*</sub>
    /// *A*<sub>*t*</sub><sup>(*i*)</sup> *B*<sub>*t*</sub><sup>(*i* + 1)</sup>,
    /// where the two-site terms `(A_t, B_t, c_t)` act on every pair of
    /// adjacent sites and the single-site term `O` (`onsite`) acts on every
    /// site.
    ///
    /// The operator bond dimension is `terms.len() + 2`.
    ///
    /// Fails if `n < 2` or if any operator is not square with the dimension
    /// of `onsite`.
    pub fn nearest_neighbor(
        n: usize,
        onsite: &nd::Array2<A>,
        terms: &[(nd::Array2<A>, nd::Array2<A>, A)],
    ) -> MpoResult<Self> {
        if n < 2 { return Err(TooShort(n)); }
        let d = onsite.shape()[0];
        if d == 0 || onsite.shape() != [d, d] {
            return Err(OperatorIncompatibleShape(d));
        }
        for (a, b, _) in terms.iter() {
            if a.shape() != [d, d] || b.shape() != [d, d] {
                return Err(OperatorIncompatibleShape(d));
            }
        }
        let w = terms.len() + 2;
        let mut bulk: nd::Array4<A> = nd::Array4::zeros((w, d, w, d));
        for s in 0..d {
            bulk[[0, s, 0, s]] = A::one();
            bulk[[w - 1, s, w - 1, s]] = A::one();
        }
        for ((s, sp), o) in onsite.indexed_iter() {
            bulk[[0, s, w - 1, sp]] = *o;
        }
        for (j, (a, b, c)) in terms.iter().enumerate() {
            for ((s, sp), av) in a.indexed_iter() {
                bulk[[0, s, j + 1, sp]] = *av;
            }
            for ((s, sp), bv) in b.indexed_iter() {
                bulk[[j + 1, s, w - 1, sp]] = *c * *bv;
            }
        }
        let first = bulk.slice(nd::s![..1, .., .., ..]).to_owned();
        let last = bulk.slice(nd::s![.., .., w - 1..w, ..]).to_owned();
        let mut data: Vec<nd::Array4<A>> = Vec::with_capacity(n);
        data.push(first);
        for _ in 1..n - 1 { data.push(bulk.clone()); }
        data.push(last);
        Self::new(data)
    }

    /// Return the number of sites.
    pub fn n(&self) -> usize { self.n }

    /// Return a reference to all operator tensors.
    pub fn tensors(&self) -> &[nd::Array4<A>] { &self.data }

    /// Unwrap `self` into the bare operator tensors.
    pub fn into_tensors(self) -> Vec<nd::Array4<A>> { self.data }

    /// Return the physical dimension of each site.
    pub fn phys_dims(&self) -> Vec<usize> {
        self.data.iter().map(|g| g.shape()[1]).collect()
    }

    /// Return the dimension of each of the `n - 1` interior operator bonds.
    pub fn bond_dims(&self) -> Vec<usize> {
        self.data.iter().take(self.n - 1).map(|g| g.shape()[2]).collect()
    }
}

impl<A> Mpo<A>
where A: ComplexFloat + 'static
{
    /// Contract the MPO into the dense operator matrix on the full product
    /// space, with earlier sites' physical indices most significant.
    ///
    /// The result is square with dimension Π<sub>*k*</sub> *d*<sub>*k*</sub>;
    /// this is exponential in `n` and intended for validation at small sizes.
    pub fn contract_dense(&self) -> nd::Array2<A> {
        // running contraction with axis signature [ w{k}, out, in ], where the
        // physical legs of sites 0..=k are fused into `out` and `in`
        let g0 = &self.data[0];
        let sh0 = g0.shape().to_vec();
        let mut acc: nd::Array3<A> = nd::Array3::from_shape_fn(
            (sh0[2], sh0[1], sh0[3]),
            |(b, s, t)| g0[[0, s, b, t]],
        );
        for g in self.data.iter().skip(1) {
            let sh = g.shape().to_vec();
            let o = acc.shape()[1];
            let i = acc.shape()[2];
            let next = nd::Array3::from_shape_fn(
                (sh[2], o * sh[1], i * sh[3]),
                |(b2, os, it)| {
                    let p = os / sh[1];
                    let s = os % sh[1];
                    let q = it / sh[3];
                    let t = it % sh[3];
                    (0..sh[0])
                        .map(|b| acc[[b, p, q]] * g[[b, s, b2, t]])
                        .fold(A::zero(), A::add)
                },
            );
            acc = next;
        }
        acc.index_axis(nd::Axis(0), 0).to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64 as C64;
    use crate::models::{ identity, kron, spin_z };

    fn max_abs_diff(a: &nd::Array2<C64>, b: &nd::Array2<C64>) -> f64 {
        a.iter().zip(b)
            .map(|(ak, bk)| (ak - bk).norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn nearest_neighbor_shapes() {
        let sz: nd::Array2<C64> = spin_z(2);
        let onsite: nd::Array2<C64> = nd::Array2::zeros((2, 2));
        let terms = vec![(sz.clone(), sz.clone(), C64::from(1.0))];
        let mpo = Mpo::nearest_neighbor(4, &onsite, &terms).unwrap();
        assert_eq!(mpo.n(), 4);
        assert_eq!(mpo.bond_dims(), vec![3, 3, 3]);
        assert_eq!(mpo.tensors()[0].shape(), [1, 2, 3, 2]);
        assert_eq!(mpo.tensors()[1].shape(), [3, 2, 3, 2]);
        assert_eq!(mpo.tensors()[3].shape(), [3, 2, 1, 2]);
    }

    #[test]
    fn nearest_neighbor_two_sites() {
        // H = c Sz ⊗ Sz + O ⊗ I + I ⊗ O, directly comparable by hand
        let sz: nd::Array2<C64> = spin_z(2);
        let id: nd::Array2<C64> = identity(2);
        let onsite = sz.mapv(|o| o * C64::from(0.25));
        let c = C64::from(-1.5);
        let terms = vec![(sz.clone(), sz.clone(), c)];
        let mpo = Mpo::nearest_neighbor(2, &onsite, &terms).unwrap();
        let expected
            = kron(&sz, &sz).mapv(|x| x * c)
            + kron(&onsite, &id)
            + kron(&id, &onsite);
        assert_eq!(max_abs_diff(&mpo.contract_dense(), &expected), 0.0);
    }

    #[test]
    fn too_short() {
        let onsite: nd::Array2<C64> = nd::Array2::zeros((2, 2));
        assert!(matches!(
            Mpo::nearest_neighbor(1, &onsite, &[]),
            Err(TooShort(1)),
        ));
    }

    #[test]
    fn creation_errors() {
        let g0 = nd::Array4::<C64>::zeros((1, 2, 3, 2));
        let g1 = nd::Array4::<C64>::zeros((4, 2, 1, 2));
        assert!(matches!(
            Mpo::new([g0, g1]),
            Err(BondMismatch { site: 1, left: 4, right: 3 }),
        ));

        let g0 = nd::Array4::<C64>::zeros((1, 2, 3, 3));
        let g1 = nd::Array4::<C64>::zeros((3, 2, 1, 2));
        assert!(matches!(
            Mpo::new([g0, g1]),
            Err(PhysMismatch { site: 0, out: 2, input: 3 }),
        ));

        let g0 = nd::Array4::<C64>::zeros((2, 2, 3, 2));
        let g1 = nd::Array4::<C64>::zeros((3, 2, 1, 2));
        assert!(matches!(
            Mpo::new([g0, g1]),
            Err(OuterBond { site: 0, dim: 2 }),
        ));
    }
}
