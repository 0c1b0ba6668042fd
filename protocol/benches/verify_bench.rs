// Presentation verification benchmarks for the present-proof engine.
//
// Covers presentation signing, single-presentation verification, and the
// verifier over attachment lists of growing size.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use presentproof_protocol::credential::VerifiablePresentation;
use presentproof_protocol::crypto::Keypair;
use presentproof_protocol::identity::{Did, DidDocument, InMemoryResolver};
use presentproof_protocol::presentproof::{verify_presentation, Attachment};

const HOLDER: &str = "did:example:holder";

/// A resolver that knows the holder, and the holder's keypair.
fn setup() -> (Arc<InMemoryResolver>, Keypair) {
    let keypair = Keypair::from_seed(&[0x5Au8; 32]);
    let did: Did = HOLDER.parse().expect("valid DID");
    let resolver = Arc::new(InMemoryResolver::new());
    resolver
        .register(DidDocument::for_key(&did, &keypair.public_key()))
        .expect("valid document");
    (resolver, keypair)
}

fn signed_presentation(keypair: &Keypair) -> VerifiablePresentation {
    let mut vp = VerifiablePresentation::new(
        HOLDER,
        vec![json!({
            "type": ["VerifiableCredential", "UniversityDegreeCredential"],
            "credentialSubject": {"id": HOLDER, "degree": {"name": "BSc"}}
        })],
    );
    vp.sign(keypair, &format!("{HOLDER}#key-1"), Some("challenge".into()))
        .expect("signing");
    vp
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime")
}

fn bench_sign_presentation(c: &mut Criterion) {
    let (_, keypair) = setup();

    c.bench_function("presentation/sign", |b| {
        b.iter(|| signed_presentation(&keypair));
    });
}

fn bench_parse_and_verify(c: &mut Criterion) {
    let (resolver, keypair) = setup();
    let raw = serde_json::to_vec(&signed_presentation(&keypair)).expect("serialize");
    let rt = runtime();

    c.bench_function("presentation/parse_and_verify", |b| {
        b.iter(|| {
            rt.block_on(VerifiablePresentation::parse_and_verify(&raw, resolver.as_ref()))
                .expect("valid presentation")
        });
    });
}

fn bench_verify_attachments(c: &mut Criterion) {
    let (resolver, keypair) = setup();
    let rt = runtime();
    let mut group = c.benchmark_group("verifier/attachments");

    for size in [1usize, 4, 16] {
        let attachments: Vec<Attachment> = (0..size)
            .map(|_| Attachment::from_presentation(&signed_presentation(&keypair)).expect("encode"))
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &attachments, |b, atts| {
            b.iter(|| {
                rt.block_on(verify_presentation(resolver.as_ref(), atts))
                    .expect("all attachments verify")
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sign_presentation,
    bench_parse_and_verify,
    bench_verify_attachments,
);
criterion_main!(benches);
