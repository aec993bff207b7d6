// Encoding & signing benchmarks for the IFC operator core.
//
// Covers payment sealing and hashing, commitment signing, light transaction
// signing, and slice verification at various tree depths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ifc_protocol::crypto::hash::{keccak256, merkle_parent, H256};
use ifc_protocol::crypto::{recover_address, sign_digest, Credential, IfcKeypair, SealingKeypair};
use ifc_protocol::light_tx::LightTransactionFactory;
use ifc_protocol::payment::{encode_and_hash, PaymentSigner, RawPayment};
use ifc_protocol::stage::compute_root;

fn sample_payment() -> RawPayment {
    RawPayment::new(
        "0x00000000000000000000000000000000000000aa",
        "0x00000000000000000000000000000000000000bb",
        1_000_000,
        42,
        7,
        &SealingKeypair::generate().public_key_bytes(),
        &SealingKeypair::generate().public_key_bytes(),
    )
}

fn bench_encode_and_hash(c: &mut Criterion) {
    let raw = sample_payment();

    c.bench_function("payment/encode_and_hash", |b| {
        b.iter(|| encode_and_hash(&raw).unwrap());
    });
}

fn bench_sign_commitment(c: &mut Criterion) {
    let raw = sample_payment();
    let signer = PaymentSigner::new(Credential::new(IfcKeypair::generate()));

    c.bench_function("payment/sign_commitment", |b| {
        b.iter(|| signer.sign_commitment(&raw, 7).unwrap());
    });
}

fn bench_sign_and_recover(c: &mut Criterion) {
    let keypair = IfcKeypair::generate();
    let digest = keccak256(b"stage 7 payment 42");
    let signature = sign_digest(&keypair, &digest).unwrap();

    c.bench_function("secp256k1/sign_digest", |b| {
        b.iter(|| sign_digest(&keypair, &digest).unwrap());
    });
    c.bench_function("secp256k1/recover_address", |b| {
        b.iter(|| recover_address(&digest, &signature).unwrap());
    });
}

fn bench_light_tx_withdrawal(c: &mut Criterion) {
    let factory = LightTransactionFactory::new(Credential::new(IfcKeypair::generate()));

    c.bench_function("light_tx/propose_withdrawal", |b| {
        b.iter(|| factory.propose_withdrawal(None, 500).unwrap());
    });
}

fn bench_slice_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage/compute_root");

    for depth in [4usize, 16, 32] {
        let leaf = keccak256(b"leaf");
        let slice: Vec<H256> = (0..depth)
            .map(|i| keccak256(format!("sibling-{i}").as_bytes()))
            .collect();
        let index = (1u64 << depth.min(63)) - 1;

        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &slice, |b, slice| {
            b.iter(|| compute_root(&leaf, index, slice));
        });
    }

    group.finish();
}

fn bench_merkle_parent(c: &mut Criterion) {
    let left = keccak256(b"left");
    let right = keccak256(b"right");

    c.bench_function("keccak256/merkle_parent", |b| {
        b.iter(|| merkle_parent(&left, &right));
    });
}

criterion_group!(
    benches,
    bench_encode_and_hash,
    bench_sign_commitment,
    bench_sign_and_recover,
    bench_light_tx_withdrawal,
    bench_slice_verification,
    bench_merkle_parent,
);
criterion_main!(benches);
