use std::io::{Cursor, Read};
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rdeflate::{Container, Level};

/// Build a corpus that looks like real-world text: long runs, occasional
/// repeats, not pure incompressible noise.
fn corpus() -> Vec<u8>
{
    let paragraph = b"the quick brown fox jumps over the lazy dog. ".repeat(64);
    let mut data = Vec::new();
    for i in 0..400
    {
        data.extend_from_slice(&paragraph);
        if i % 7 == 0
        {
            data.extend_from_slice(b"a slightly different sentence breaks up the run. ");
        }
    }
    data
}

fn compress_with_rdeflate(data: &[u8]) -> Vec<u8>
{
    let mut out = Vec::new();
    rdeflate::compress(data, &mut out, Container::Zlib, Level::DEFAULT).unwrap();
    out
}

fn decode_flate2(bytes: &[u8]) -> Vec<u8>
{
    let mut writer = Vec::new();
    let mut deflater = flate2::read::ZlibDecoder::new(Cursor::new(bytes));
    deflater.read_to_end(&mut writer).unwrap();
    writer
}

fn decode_rdeflate(bytes: &[u8]) -> Vec<u8>
{
    let mut out = Vec::new();
    rdeflate::decompress(bytes, &mut out, Container::Zlib).unwrap();
    out
}

fn decode_test(c: &mut Criterion)
{
    let raw = corpus();
    let compressed = compress_with_rdeflate(&raw);

    let mut group = c.benchmark_group("ZLIB decoding");
    group.throughput(Throughput::Bytes(raw.len() as u64));

    group.bench_function("flate2-[zlib-ng]", |b| b.iter(|| black_box(decode_flate2(compressed.as_slice()))));

    group.bench_function("rdeflate", |b| b.iter(|| black_box(decode_rdeflate(compressed.as_slice()))));
}

criterion_group!(name=benches;
      config={
      let c = Criterion::default();
        c.measurement_time(Duration::from_secs(10))
      };
    targets=decode_test);

criterion_main!(benches);
