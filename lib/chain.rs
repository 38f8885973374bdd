//! Chains of rank-3 site tensors (matrix product states) and their canonical
//! forms.
//!
//! An *N*-site chain represents an *N*-index tensor as a product of rank-3
//! site tensors, each carrying a left bond index, a physical index, and a
//! right bond index. Adjacent sites share a bond index, and the outer bonds at
//! both ends of the chain are held at dimension 1.
//!
//! ```text
//!       .-bond 0-.        .-bond 1-.       .-bond n-2-.
//!       V        V        V        V       V          V
//! G[0] ---------- G[1] ---------- ... ---------------- G[n-1]
//!  |               |                                     |
//!  | <- physical   | <- physical                         | <- physical
//!       index 0         index 1                               index n-1
//! ```
//!
//! A chain is brought to canonical form by sweeping across the sites and
//! factoring each tensor with a thin singular value decomposition: the
//! orthogonal factor stays at the site and the residual (singular values times
//! the remaining factor) is pushed into the neighbor. After a left-to-right
//! sweep every site except the last satisfies the left-orthogonality condition
//!
//! > Σ<sub>*u*,*s*</sub>
//! > *G*<sub>*k*</sub>\[*u*, *s*, *v*\]<sup>\*</sup>
//! > *G*<sub>*k*</sub>\[*u*, *s*, *w*\]
//! > = *δ*<sub>*v*,*w*</sub>
//!
//! and the trailing norm of the original chain has been absorbed into the last
//! site; a right-to-left sweep is the mirror image. Rank-deficient bonds are
//! truncated by the thin decomposition along the way, so composing both sweeps
//! also shrinks every bond to its necessary dimension.
//!
//! # Example
//!
//! ```
//! use num_complex::Complex64 as C64;
//! use rand::{ SeedableRng, rngs::StdRng };
//! use spin_chain::chain::Chain;
//!
//! let mut rng = StdRng::seed_from_u64(10546);
//! // 8 spin-1/2 sites, nominal bond dimension 6
//! let chain: Chain<C64> = Chain::random(8, 2, 6, None, &mut rng).unwrap();
//!
//! let canon = chain.canonicalized().normalized();
//! assert!((canon.norm() - 1.0).abs() < 1e-12);
//! ```

use std::{ fmt, ops::Add };
use itertools::Itertools;
use ndarray as nd;
use ndarray_linalg::SVDInto;
use num_complex::ComplexFloat;
use num_traits::{ Float, One, Zero };
use rand::{
    Rng,
    distributions::{ Distribution, Standard },
};
use thiserror::Error;
use crate::ComplexFloatExt;

#[derive(Debug, Error)]
pub enum ChainError {
    /// Returned when attempting to create a new chain with no sites.
    #[error("error in chain creation: cannot create for an empty system")]
    EmptySystem,

    /// Returned when a site tensor has an axis of zero length.
    #[error("error in chain creation: zero-sized axis on the tensor at site {0}")]
    ZeroDimAxis(usize),

    /// Returned when an outward-facing boundary bond is not one-dimensional.
    #[error("error in chain creation: outer bond at site {site} has dimension {dim}, expected 1")]
    OuterBond { site: usize, dim: usize },

    /// Returned when the bond dimensions of adjacent site tensors disagree.
    #[error("error in chain creation: bond mismatch at site {site}: left bond dimension {left} does not match right bond dimension {right} of the preceding site")]
    BondMismatch { site: usize, left: usize, right: usize },
}
use ChainError::*;
pub type ChainResult<T> = Result<T, ChainError>;

/// A chain of rank-3 site tensors representing an *N*-index tensor.
///
/// All constructors verify the bond structure up front (matching bond
/// dimensions between neighbors, trivial outer bonds, no zero-sized axes), so
/// the canonicalization sweeps themselves are infallible. Sweeps return a new,
/// independently owned chain and never mutate `self`.
#[derive(Clone, PartialEq)]
pub struct Chain<A>
where A: ComplexFloat
{
    // Number of sites.
    pub(crate) n: usize, // ≥ 1
    // Site tensors. Array `k` has axis signature
    //   [ u{k - 1}, s{k}, u{k} ]
    // where `u{j}` is a bond index and `s{j}` is a physical index.
    // Outer bond dimensions are held fixed with
    //   dim(u{-1}) == dim(u{n - 1}) == 1
    pub(crate) data: Vec<nd::Array3<A>>, // length n
    // Relative cutoff for singular values.
    pub(crate) eps: A::Real,
}

impl<A> fmt::Debug for Chain<A>
where
    A: ComplexFloat + fmt::Debug,
    A::Real: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("n", &self.n)
            .field("data", &self.data)
            .field("eps", &self.eps)
            .finish()
    }
}

impl<A> Chain<A>
where A: ComplexFloat
{
    /// Create a new chain from raw site tensors.
    ///
    /// Optionally provide a global relative cutoff threshold for singular
    /// values, which defaults to machine epsilon.
    ///
    /// Fails if no tensors are provided, any tensor has a zero-sized axis,
    /// either outer bond has dimension other than 1, or the bond dimensions of
    /// adjacent tensors disagree.
    pub fn new<I>(tensors: I, eps: Option<A::Real>) -> ChainResult<Self>
    where I: IntoIterator<Item = nd::Array3<A>>
    {
        let eps = Float::abs(eps.unwrap_or_else(A::Real::epsilon));
        let data: Vec<nd::Array3<A>> = tensors.into_iter().collect();
        if data.is_empty() { return Err(EmptySystem); }
        let n = data.len();
        for (k, g) in data.iter().enumerate() {
            if g.shape().iter().any(|dim| *dim == 0) {
                return Err(ZeroDimAxis(k));
            }
        }
        let d0 = data[0].shape()[0];
        if d0 != 1 { return Err(OuterBond { site: 0, dim: d0 }); }
        let dn = data[n - 1].shape()[2];
        if dn != 1 { return Err(OuterBond { site: n - 1, dim: dn }); }
        for (k, (gl, gr)) in data.iter().tuple_windows().enumerate() {
            let right = gl.shape()[2];
            let left = gr.shape()[0];
            if left != right {
                return Err(BondMismatch { site: k + 1, left, right });
            }
        }
        Ok(Self { n, data, eps })
    }

    /// Return the number of sites.
    pub fn n(&self) -> usize { self.n }

    /// Return the singular value cutoff threshold.
    pub fn eps(&self) -> A::Real { self.eps }

    /// Return a reference to all site tensors.
    pub fn tensors(&self) -> &[nd::Array3<A>] { &self.data }

    /// Unwrap `self` into the bare site tensors.
    pub fn into_tensors(self) -> Vec<nd::Array3<A>> { self.data }

    /// Return the physical dimension of each site.
    pub fn phys_dims(&self) -> Vec<usize> {
        self.data.iter().map(|g| g.shape()[1]).collect()
    }

    /// Return the dimension of each of the `n - 1` interior bonds.
    pub fn bond_dims(&self) -> Vec<usize> {
        self.data.iter().take(self.n - 1).map(|g| g.shape()[2]).collect()
    }
}

impl<A> Chain<A>
where
    A: ComplexFloat + ComplexFloatExt,
    Standard: Distribution<A::Real>,
{
    /// Initialize to a chain of `n` sites of physical dimension `d` with
    /// random complex entries.
    ///
    /// The `k`-th interior bond has dimension
    /// min(`chi`, `d`<sup>`k + 1`</sup>, `d`<sup>`n - 1 - k`</sup>), i.e. the
    /// nominal bond dimension `chi` capped by the dimension reachable from the
    /// nearer chain end. Optionally provide a global relative cutoff threshold
    /// for singular values, which defaults to machine epsilon.
    ///
    /// Fails if `n`, `d`, or `chi` is zero.
    pub fn random<R>(
        n: usize,
        d: usize,
        chi: usize,
        eps: Option<A::Real>,
        rng: &mut R,
    ) -> ChainResult<Self>
    where R: Rng + ?Sized
    {
        let eps = Float::abs(eps.unwrap_or_else(A::Real::epsilon));
        if n == 0 { return Err(EmptySystem); }
        if d == 0 || chi == 0 { return Err(ZeroDimAxis(0)); }
        let onehalf: A::Real = Float::recip(A::Real::one() + A::Real::one());
        // dimension of the bond to the right of site k, k in 0..n-1
        let bond = |k: usize| -> usize {
            let depth = (k + 1).min(n - 1 - k);
            let mut b: usize = 1;
            for _ in 0..depth {
                b = b.saturating_mul(d);
                if b >= chi { return chi; }
            }
            b
        };
        let data: Vec<nd::Array3<A>>
            = (0..n)
            .map(|k| {
                let dl = if k == 0 { 1 } else { bond(k - 1) };
                let dr = if k == n - 1 { 1 } else { bond(k) };
                nd::Array3::from_shape_simple_fn((dl, d, dr), || {
                    A::from_components(
                        rng.gen::<A::Real>() - onehalf,
                        rng.gen::<A::Real>() - onehalf,
                    )
                })
            })
            .collect();
        Ok(Self { n, data, eps })
    }
}

impl<A> Chain<A>
where A: ComplexFloat + 'static
{
    /// Compute the Frobenius norm of the represented tensor.
    ///
    /// This is evaluated by transfer-matrix accumulation along the chain, so
    /// the cost is polynomial in the bond dimensions rather than exponential
    /// in `n`.
    pub fn norm(&self) -> A::Real {
        let mut acc: nd::Array2<A> = nd::Array2::ones((1, 1));
        for g in self.data.iter() {
            let sh = g.shape().to_vec();
            let next = nd::Array2::from_shape_fn((sh[2], sh[2]), |(v, w)| {
                (0..sh[0]).cartesian_product(0..sh[0])
                    .cartesian_product(0..sh[1])
                    .map(|((a, b), s)| {
                        acc[[a, b]] * g[[a, s, v]].conj() * g[[b, s, w]]
                    })
                    .fold(A::zero(), A::add)
            });
            acc = next;
        }
        Float::sqrt(acc[[0, 0]].re())
    }

    /// Contract the chain into a dense vector over the full product space,
    /// with earlier sites' physical indices most significant.
    ///
    /// The result has length Π<sub>*k*</sub> *d*<sub>*k*</sub>; this is
    /// exponential in `n` and intended for validation at small sizes.
    pub fn contract_vector(&self) -> nd::Array1<A> {
        let mut acc: nd::Array2<A> = nd::Array2::ones((1, 1));
        for g in self.data.iter() {
            let sh = g.shape().to_vec();
            let p = acc.shape()[0];
            let gmat = g.view().into_shape((sh[0], sh[1] * sh[2])).unwrap();
            acc = acc.dot(&gmat).into_shape((p * sh[1], sh[2])).unwrap();
        }
        let len = acc.len();
        acc.into_shape(len).unwrap()
    }

    /// Maximum absolute deviation from the identity of the left-orthogonality
    /// contraction at site `k`, i.e. of
    /// Σ<sub>*u*,*s*</sub> *G*\[*u*, *s*, *v*\]<sup>\*</sup> *G*\[*u*, *s*, *w*\]
    /// from *δ*<sub>*v*,*w*</sub>.
    ///
    /// Returns `None` if `k` is out of bounds.
    pub fn left_ortho_error(&self, k: usize) -> Option<A::Real> {
        let g = self.data.get(k)?;
        let sh = g.shape().to_vec();
        let err = (0..sh[2]).cartesian_product(0..sh[2])
            .map(|(v, w)| {
                let o: A
                    = (0..sh[0]).cartesian_product(0..sh[1])
                    .map(|(u, s)| g[[u, s, v]].conj() * g[[u, s, w]])
                    .fold(A::zero(), A::add);
                ComplexFloat::abs(if v == w { o - A::one() } else { o })
            })
            .fold(A::Real::zero(), A::Real::max);
        Some(err)
    }

    /// Maximum absolute deviation from the identity of the right-orthogonality
    /// contraction at site `k`, i.e. of
    /// Σ<sub>*s*,*u*</sub> *G*\[*v*, *s*, *u*\] *G*\[*w*, *s*, *u*\]<sup>\*</sup>
    /// from *δ*<sub>*v*,*w*</sub>.
    ///
    /// Returns `None` if `k` is out of bounds.
    pub fn right_ortho_error(&self, k: usize) -> Option<A::Real> {
        let g = self.data.get(k)?;
        let sh = g.shape().to_vec();
        let err = (0..sh[0]).cartesian_product(0..sh[0])
            .map(|(v, w)| {
                let o: A
                    = (0..sh[1]).cartesian_product(0..sh[2])
                    .map(|(s, u)| g[[v, s, u]] * g[[w, s, u]].conj())
                    .fold(A::zero(), A::add);
                ComplexFloat::abs(if v == w { o - A::one() } else { o })
            })
            .fold(A::Real::zero(), A::Real::max);
        Some(err)
    }
}

struct Svd<A: ComplexFloat> {
    u: nd::Array2<A>,
    s: Vec<A::Real>,
    vh: nd::Array2<A>,
    rank: usize,
}

// Thin SVD, truncated where the singular values fall below `eps` relative to
// the L2 norm of the spectrum. The rank never drops below 1 so that zero
// matrices stay representable.
fn do_svd_trunc<A>(q: nd::Array2<A>, eps: A::Real) -> Svd<A>
where
    A: ComplexFloat,
    nd::Array2<A>: SVDInto<U = nd::Array2<A>, Sigma = nd::Array1<A::Real>, VT = nd::Array2<A>>,
{
    let (Some(u), s, Some(mut vh)) = q.svd_into(true, true).unwrap()
        else { unreachable!() };
    let norm: A::Real = Float::sqrt(
        s.iter()
            .map(|sj| Float::powi(*sj, 2))
            .fold(A::Real::zero(), A::Real::add)
    );
    let rank
        = s.iter().take_while(|sj| **sj > eps * norm).count()
        .max(1);
    let rankslice = nd::Slice::new(0, Some(rank as isize), 1);
    vh.slice_axis_inplace(nd::Axis(0), rankslice);
    let u = u.slice(nd::s![.., ..rank]).to_owned();
    let s: Vec<A::Real> = s.into_iter().take(rank).collect();
    Svd { u, s, vh, rank }
}

impl<A> Chain<A>
where
    A: ComplexFloat + ComplexFloatExt + 'static,
    nd::Array2<A>: SVDInto<U = nd::Array2<A>, Sigma = nd::Array1<A::Real>, VT = nd::Array2<A>>,
{
    /// Return a new chain representing the same tensor in which every site
    /// except the last is left-orthogonal.
    ///
    /// Sweeping from the first site to the second-to-last, each tensor is
    /// reshaped to a `(Dl * d, Dr)` matrix and factored with a thin SVD; the
    /// orthogonal factor `U` becomes the new site tensor and the residual
    /// `diag(S) · Vᴴ` is contracted into the left bond of the next site. The
    /// last site absorbs the trailing norm, so the represented tensor is
    /// unchanged up to the truncation of numerically zero singular values.
    /// Only right-bond dimensions can shrink, each to at most
    /// min(`Dl * d`, `Dr`) of the running matrix.
    pub fn left_normalized(&self) -> Self {
        let mut data: Vec<nd::Array3<A>> = Vec::with_capacity(self.n);
        let mut carry: Option<nd::Array2<A>> = None;
        for (k, g) in self.data.iter().enumerate() {
            let sh = g.shape().to_vec();
            let g: nd::Array3<A> = match carry.take() {
                Some(r) => {
                    let rdim = r.shape()[0];
                    let gmat
                        = g.view().into_shape((sh[0], sh[1] * sh[2])).unwrap();
                    r.dot(&gmat).into_shape((rdim, sh[1], sh[2])).unwrap()
                },
                None => g.clone(),
            };
            if k < self.n - 1 {
                let dl = g.shape()[0];
                let q = g.into_shape((dl * sh[1], sh[2])).unwrap();
                let Svd { u, s, vh, rank } = do_svd_trunc(q, self.eps);
                data.push(u.into_shape((dl, sh[1], rank)).unwrap());
                let mut r = vh;
                r.axis_iter_mut(nd::Axis(0))
                    .zip(&s)
                    .for_each(|(mut rv, sv)| {
                        rv.map_inplace(|rj| { *rj = *rj * A::from_real(*sv); });
                    });
                carry = Some(r);
            } else {
                data.push(g);
            }
        }
        Self { n: self.n, data, eps: self.eps }
    }

    /// Return a new chain representing the same tensor in which every site
    /// except the first is right-orthogonal.
    ///
    /// The mirror image of [`Self::left_normalized`]: sweeping from the last
    /// site to the second, each tensor is reshaped to a `(Dl, d * Dr)` matrix
    /// and factored with a thin SVD; `Vᴴ` becomes the new site tensor and the
    /// residual `U · diag(S)` is contracted into the right bond of the
    /// preceding site. The first site absorbs the trailing norm.
    pub fn right_normalized(&self) -> Self {
        let mut data: Vec<nd::Array3<A>> = Vec::with_capacity(self.n);
        let mut carry: Option<nd::Array2<A>> = None;
        for (k, g) in self.data.iter().enumerate().rev() {
            let sh = g.shape().to_vec();
            let g: nd::Array3<A> = match carry.take() {
                Some(l) => {
                    let ldim = l.shape()[1];
                    let gmat
                        = g.view().into_shape((sh[0] * sh[1], sh[2])).unwrap();
                    gmat.dot(&l).into_shape((sh[0], sh[1], ldim)).unwrap()
                },
                None => g.clone(),
            };
            if k > 0 {
                let dr = g.shape()[2];
                let q = g.into_shape((sh[0], sh[1] * dr)).unwrap();
                let Svd { u, s, vh, rank } = do_svd_trunc(q, self.eps);
                data.push(vh.into_shape((rank, sh[1], dr)).unwrap());
                let mut l = u;
                l.axis_iter_mut(nd::Axis(1))
                    .zip(&s)
                    .for_each(|(mut lv, sv)| {
                        lv.map_inplace(|lj| { *lj = *lj * A::from_real(*sv); });
                    });
                carry = Some(l);
            } else {
                data.push(g);
            }
        }
        data.reverse();
        Self { n: self.n, data, eps: self.eps }
    }

    /// Return a new chain representing the same tensor with every bond
    /// truncated to its necessary dimension.
    ///
    /// This is a left-to-right sweep followed by a right-to-left sweep; the
    /// composed truncation caps the `k`-th bond at
    /// min(*d*<sup>*k* + 1</sup>, *d*<sup>*n* − 1 − *k*</sup>) as well as its
    /// original dimension. The global norm is preserved; use
    /// [`Self::normalized`] to pin it to 1.
    pub fn canonicalized(&self) -> Self {
        self.left_normalized().right_normalized()
    }

    /// Rescale the chain so that the represented tensor has unit Frobenius
    /// norm.
    ///
    /// The scale factor is divided out of the first site tensor. Chains of
    /// zero norm are returned unchanged.
    pub fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > A::Real::zero() {
            let renorm = A::from_real(norm);
            self.data[0].map_inplace(|g| { *g = *g / renorm; });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64 as C64;
    use rand::{ SeedableRng, rngs::StdRng };

    fn max_abs_diff(a: &nd::Array1<C64>, b: &nd::Array1<C64>) -> f64 {
        a.iter().zip(b)
            .map(|(ak, bk)| (ak - bk).norm())
            .fold(0.0, f64::max)
    }

    fn random_chain(n: usize, d: usize, chi: usize, seed: u64) -> Chain<C64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Chain::random(n, d, chi, None, &mut rng).unwrap()
    }

    #[test]
    fn left_orthogonality() {
        let chain = random_chain(7, 2, 8, 10546);
        let left = chain.left_normalized();
        for k in 0..left.n() - 1 {
            assert!(left.left_ortho_error(k).unwrap() < 1e-10);
        }
    }

    #[test]
    fn right_orthogonality() {
        let chain = random_chain(7, 3, 6, 10547);
        let right = chain.right_normalized();
        for k in 1..right.n() {
            assert!(right.right_ortho_error(k).unwrap() < 1e-10);
        }
    }

    #[test]
    fn sweeps_preserve_state() {
        let chain = random_chain(6, 2, 6, 10548);
        let state = chain.contract_vector();
        let tol = 1e-10 * chain.norm();
        assert!(max_abs_diff(&state, &chain.left_normalized().contract_vector()) < tol);
        assert!(max_abs_diff(&state, &chain.right_normalized().contract_vector()) < tol);
        assert!(max_abs_diff(&state, &chain.canonicalized().contract_vector()) < tol);
        // the input chain is untouched
        assert_eq!(state, chain.contract_vector());
    }

    #[test]
    fn norm_preserved_and_normalized() {
        let chain = random_chain(6, 3, 5, 10549);
        let norm = chain.norm();
        assert!((chain.canonicalized().norm() - norm).abs() < 1e-10 * norm);
        let unit = chain.canonicalized().normalized();
        assert!((unit.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bond_dims_truncated() {
        // interior bonds padded well beyond what the boundaries can support
        let mut rng = StdRng::seed_from_u64(10550);
        let n: usize = 6;
        let d: usize = 2;
        let chi: usize = 10;
        let tensors: Vec<nd::Array3<C64>>
            = (0..n)
            .map(|k| {
                let dl = if k == 0 { 1 } else { chi };
                let dr = if k == n - 1 { 1 } else { chi };
                nd::Array3::from_shape_simple_fn((dl, d, dr), || {
                    C64::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5)
                })
            })
            .collect();
        let chain = Chain::new(tensors, None).unwrap();
        let state = chain.contract_vector();
        let canon = chain.canonicalized();
        for (k, b) in canon.bond_dims().into_iter().enumerate() {
            let cap = chi
                .min(d.pow((k + 1) as u32))
                .min(d.pow((n - 1 - k) as u32));
            assert!(b <= cap, "bond {} has dimension {} > cap {}", k, b, cap);
        }
        let tol = 1e-10 * chain.norm();
        assert!(max_abs_diff(&state, &canon.contract_vector()) < tol);
    }

    #[test]
    fn left_normalize_idempotent() {
        let chain = random_chain(6, 2, 8, 10551);
        let once = chain.left_normalized();
        let twice = once.left_normalized();
        assert_eq!(once.bond_dims(), twice.bond_dims());
        for k in 0..twice.n() - 1 {
            assert!(twice.left_ortho_error(k).unwrap() < 1e-10);
        }
        let tol = 1e-10 * chain.norm();
        assert!(
            max_abs_diff(&once.contract_vector(), &twice.contract_vector())
                < tol
        );
    }

    #[test]
    fn single_site_chain() {
        let g = nd::Array3::from_shape_simple_fn((1, 2, 1), || C64::new(0.5, -0.5));
        let chain = Chain::new([g], None).unwrap();
        let left = chain.left_normalized();
        assert_eq!(left.n(), 1);
        assert_eq!(
            max_abs_diff(&chain.contract_vector(), &left.contract_vector()),
            0.0,
        );
    }

    #[test]
    fn creation_errors() {
        let empty: Vec<nd::Array3<C64>> = Vec::new();
        assert!(matches!(Chain::new(empty, None), Err(EmptySystem)));

        let g0 = nd::Array3::<C64>::zeros((1, 2, 3));
        let g1 = nd::Array3::<C64>::zeros((4, 2, 1));
        assert!(matches!(
            Chain::new([g0, g1], None),
            Err(BondMismatch { site: 1, left: 4, right: 3 }),
        ));

        let g0 = nd::Array3::<C64>::zeros((1, 0, 1));
        assert!(matches!(Chain::new([g0], None), Err(ZeroDimAxis(0))));

        let g0 = nd::Array3::<C64>::zeros((2, 2, 1));
        assert!(matches!(
            Chain::new([g0], None),
            Err(OuterBond { site: 0, dim: 2 }),
        ));
    }
}
