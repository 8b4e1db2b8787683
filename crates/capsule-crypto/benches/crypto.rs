use capsule_crypto::{
    cipher::encrypt_bytes, derive_key, CapsuleCrypto, CryptoParams, DerivedKey, KdfParams,
    PlainFile, KEY_SIZE,
};
use secrecy::SecretString;

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [10_000, 100_000])]
fn bench_derive_key(bencher: divan::Bencher, iterations: u32) {
    let password = SecretString::from("bench-password");
    let salt = [0xABu8; 16];
    let params = KdfParams { iterations };
    bencher.bench(|| {
        derive_key(
            divan::black_box(&password),
            divan::black_box(&salt),
            &params,
        )
        .unwrap()
    });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt_bytes(bencher: divan::Bencher, size: usize) {
    let key = DerivedKey::from_bytes([0x42u8; KEY_SIZE]);
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| encrypt_bytes(divan::black_box(&data), divan::black_box(&key)));
}

#[divan::bench(args = [1048576, 4194305])]
fn bench_encrypt_file(bencher: divan::Bencher, size: usize) {
    let crypto = CapsuleCrypto::new(CryptoParams {
        kdf: KdfParams { iterations: 1 },
        ..CryptoParams::default()
    })
    .unwrap();
    let password = SecretString::from("bench-password");
    let file = PlainFile::new("bench.bin", "application/octet-stream", make_data(size));
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            crypto
                .encrypt_file(divan::black_box(&file), &password, |_| {})
                .unwrap()
        });
}

fn main() {
    divan::main();
}
