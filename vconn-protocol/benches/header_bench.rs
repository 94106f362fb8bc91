use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vconn_protocol::sequence::{circular_distance, is_more_recent, wrap};
use vconn_protocol::{
    encode_ack_bitfield, AckHeader, ProtocolConfig, SequenceHistory, SequenceSpace,
    VirtualConnection,
};

fn bench_prepare_header(c: &mut Criterion) {
    let mut conn = VirtualConnection::new(
        "127.0.0.1:9000".parse().unwrap(),
        ProtocolConfig::default(),
    );
    for seq in 0..256 {
        conn.consume_header(AckHeader::new(seq, 0, 0));
    }

    c.bench_function("prepare_header_full_history", |b| {
        b.iter(|| {
            let header = conn.prepare_header();
            black_box(header);
        });
    });
}

fn bench_consume_header(c: &mut Criterion) {
    let mut conn = VirtualConnection::new(
        "127.0.0.1:9000".parse().unwrap(),
        ProtocolConfig::default(),
    );
    let mut seq = 0u32;

    c.bench_function("consume_header", |b| {
        b.iter(|| {
            conn.consume_header(black_box(AckHeader::new(seq, 0, 0)));
            seq = (seq + 1) % 4096;
        });
    });
}

fn bench_encode_bitfield(c: &mut Criterion) {
    let space = SequenceSpace::default();
    let mut history = SequenceHistory::new(256);
    for seq in (0..512).step_by(2) {
        history.push(seq);
    }

    c.bench_function("encode_ack_bitfield", |b| {
        b.iter(|| {
            let bits = encode_ack_bitfield(space, 32, black_box(510), &history);
            black_box(bits);
        });
    });
}

fn bench_header_serialize(c: &mut Criterion) {
    let header = AckHeader::new(1000, 999, 0xDEAD_BEEF);
    let bytes = header.to_bytes();

    let mut group = c.benchmark_group("header");
    group.bench_function("serialize", |b| {
        b.iter(|| black_box(black_box(&header).to_bytes()));
    });
    group.bench_function("deserialize", |b| {
        b.iter(|| black_box(AckHeader::from_bytes(black_box(&bytes)).unwrap()));
    });
    group.finish();
}

fn bench_sequence_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequence_number");

    group.bench_function("wrap", |b| {
        b.iter(|| black_box(wrap(black_box(-31), black_box(10), 4096)));
    });

    group.bench_function("distance", |b| {
        b.iter(|| black_box(circular_distance(black_box(4090), black_box(10), 4096)));
    });

    group.bench_function("more_recent", |b| {
        b.iter(|| black_box(is_more_recent(black_box(10), black_box(4090), 4096)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_prepare_header,
    bench_consume_header,
    bench_encode_bitfield,
    bench_header_serialize,
    bench_sequence_ops
);
criterion_main!(benches);
