use num_complex::Complex64 as C64;
use rand::{ SeedableRng, rngs::StdRng };
use spin_chain::chain::Chain;

const N: usize = 12;
const D: usize = 2;
const CHI: usize = 16;
const SEED: u64 = 10546;

fn main() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let chain: Chain<C64>
        = Chain::random(N, D, CHI, None, &mut rng).unwrap();
    println!("random chain: {} sites, d = {}, chi = {}", chain.n(), D, CHI);
    println!("  bond dims: {:?}", chain.bond_dims());
    println!("  norm: {:.6}", chain.norm());

    let left = chain.left_normalized();
    println!("after left sweep:");
    println!("  bond dims: {:?}", left.bond_dims());
    for k in 0..left.n() - 1 {
        println!(
            "  site {:2}: left-orthogonality deviation {:.3e}",
            k, left.left_ortho_error(k).unwrap(),
        );
    }
    println!("  norm: {:.6}", left.norm());

    let right = chain.right_normalized();
    println!("after right sweep:");
    println!("  bond dims: {:?}", right.bond_dims());
    for k in 1..right.n() {
        println!(
            "  site {:2}: right-orthogonality deviation {:.3e}",
            k, right.right_ortho_error(k).unwrap(),
        );
    }

    let canon = chain.canonicalized().normalized();
    println!("after both sweeps + normalization:");
    println!("  bond dims: {:?}", canon.bond_dims());
    println!("  norm: {:.16}", canon.norm());
}
