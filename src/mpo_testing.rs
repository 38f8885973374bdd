use ndarray as nd;
use num_complex::Complex64 as C64;
use spin_chain::models::{
    aklt_dense,
    aklt_mpo,
    heisenberg_dense,
    heisenberg_mpo,
    xy_dense,
    xy_mpo,
};
use spin_chain::mpo::Mpo;

const N: usize = 5;
const J: f64 = 0.8375;
const H: f64 = -0.2921;
const TOL: f64 = 1e-12;

fn max_abs_diff(a: &nd::Array2<C64>, b: &nd::Array2<C64>) -> f64 {
    a.iter().zip(b)
        .map(|(ak, bk)| (ak - bk).norm())
        .fold(0.0, f64::max)
}

fn check(label: &str, mpo: &Mpo<C64>, dense: &nd::Array2<C64>) {
    let diff = max_abs_diff(&mpo.contract_dense(), dense);
    println!(
        "{}: {} sites, operator bond dims {:?}, dense dim {}, max |Δ| = {:.3e}",
        label, mpo.n(), mpo.bond_dims(), dense.shape()[0], diff,
    );
    if diff > TOL {
        eprintln!(
            "warning: {} MPO deviates from the dense Hamiltonian by {:.3e} \
            (tolerance {:.1e})",
            label, diff, TOL,
        );
    }
}

fn main() {
    let xy = xy_mpo::<C64>(N, 2, 1.0).unwrap();
    check("xy", &xy, &xy_dense::<C64>(N, 2, 1.0));

    let heis = heisenberg_mpo::<C64>(N, 3, J, H).unwrap();
    check("heisenberg", &heis, &heisenberg_dense::<C64>(N, 3, J, H));

    let aklt = aklt_mpo::<C64>(N).unwrap();
    check("aklt", &aklt, &aklt_dense::<C64>(N));
}
