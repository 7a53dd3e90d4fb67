use criterion::{black_box, criterion_group, criterion_main, Criterion};
use osr_reader::codec::decode_event_text;
use osr_reader::events::parse_events;
use osr_reader::{decode, GameMode, Mod, Mods};
use std::io::Cursor;

fn event_text(rows: usize) -> String {
    let mut text = String::with_capacity(rows * 20);
    for i in 0..rows {
        text.push_str(&format!("16|{}.5|{}.25|{},", i % 512, i % 384, i % 16));
    }
    text.push_str("-12345|0|0|4242,");
    text
}

fn lzma(text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    lzma_rs::lzma_compress(&mut Cursor::new(text.as_bytes()), &mut out).unwrap();
    out
}

fn replay_bytes(block: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8];
    out.extend_from_slice(&20_210_101i32.to_le_bytes());
    for s in ["1f7b8c2d9a3e4f5061728394a5b6c7d8", "bench", "0a1b2c3d4e5f60718293a4b5c6d7e8f9"] {
        out.push(0x0B);
        out.push(s.len() as u8);
        out.extend_from_slice(s.as_bytes());
    }
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(&1_000_000i32.to_le_bytes());
    out.extend_from_slice(&500i16.to_le_bytes());
    out.push(0);
    out.extend_from_slice(&Mod::HardRock.bits().to_le_bytes());
    out.push(0);
    out.extend_from_slice(&637_022_016_000_000_000i64.to_le_bytes());
    out.extend_from_slice(&(block.len() as i32).to_le_bytes());
    out.extend_from_slice(block);
    out.extend_from_slice(&1i64.to_le_bytes());
    out
}

fn bench_decode(c: &mut Criterion) {
    let text  = event_text(20_000);
    let block = lzma(&text);
    let bytes = replay_bytes(&block);
    let hr    = Mods::from(Mod::HardRock);

    c.bench_function("decompress_20k_events", |b| b.iter(|| decode_event_text(black_box(&block))));
    c.bench_function("parse_20k_events", |b| {
        b.iter(|| parse_events(black_box(&text[..text.len() - 1]), GameMode::Standard, hr, true))
    });
    c.bench_function("decode_replay_20k_events", |b| b.iter(|| decode(black_box(&bytes))));
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
