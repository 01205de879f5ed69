//! Black-box scenarios against the public API, not the internal bit-level
//! plumbing already exercised by the unit tests next to each module.

use rdeflate::{compress, decompress, Container, InflateError, Level};

#[test]
fn gzip_wrapping_has_the_expected_header_and_footer()
{
    let mut compressed = Vec::new();
    compress(&b"Hello world\n"[..], &mut compressed, Container::Gzip, Level::DEFAULT).unwrap();

    // ID1 ID2 CM FLG MTIME(4) XFL OS
    assert_eq!(&compressed[0..10], &[0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03]);

    let footer = &compressed[compressed.len() - 8..];
    assert_eq!(&footer[0..4], &[0xd5, 0xe0, 0x39, 0xb7]); // CRC-32, little-endian
    assert_eq!(&footer[4..8], &12_u32.to_le_bytes()); // ISIZE

    let mut out = Vec::new();
    decompress(&compressed[..], &mut out, Container::Gzip).unwrap();
    assert_eq!(out, b"Hello world\n");
}

#[test]
fn zlib_wrapping_has_the_expected_header_and_footer()
{
    let mut compressed = Vec::new();
    compress(&b"Hello world\n"[..], &mut compressed, Container::Zlib, Level::DEFAULT).unwrap();

    assert_eq!(compressed[0], 0x78);
    assert_eq!(u16::from_be_bytes([compressed[0], compressed[1]]) % 31, 0);

    let footer = &compressed[compressed.len() - 4..];
    assert_eq!(footer, &[0x1c, 0xf2, 0x04, 0x47]); // ADLER-32, big-endian

    let mut out = Vec::new();
    decompress(&compressed[..], &mut out, Container::Zlib).unwrap();
    assert_eq!(out, b"Hello world\n");
}

#[test]
fn corrupted_back_reference_is_rejected()
{
    use rdeflate::Inflate;

    // A fixed-Huffman block whose only symbol is a length/distance pair
    // pointing 1 byte back, with nothing written yet.
    let mut w = rdeflate_test_support::BitWriter::new();
    w.write_bits(1, 1); // final block
    w.write_bits(0b01, 2); // BTYPE = fixed Huffman
    w.write_huffman_code(1, 7); // litlen symbol 257: length base 3, 0 extra bits
    w.write_huffman_code(0, 5); // dist symbol 0: distance base 1, 0 extra bits
    let bytes = w.finish();

    let err = Inflate::new(&bytes).decode_all().unwrap_err();
    assert_eq!(err, InflateError::CorruptedStream("back-reference distance exceeds bytes written so far"));
}

#[test]
fn truncated_compressed_stream_is_rejected_not_garbage()
{
    let payload = b"the quick brown fox jumps over the lazy dog ".repeat(32);
    let mut compressed = Vec::new();
    compress(&payload[..], &mut compressed, Container::Raw, Level::DEFAULT).unwrap();

    let truncated = &compressed[..compressed.len() / 2];
    let mut out = Vec::new();
    let err = decompress(&truncated[..], &mut out, Container::Raw).unwrap_err();
    assert_eq!(err, InflateError::UnexpectedEndOfStream);
}

#[test]
fn huffman_only_round_trips_every_container()
{
    let payload = b"aaaaaaaaaa bbbbbbbbbb cccccccccc".to_vec();
    for container in [Container::Raw, Container::Zlib, Container::Gzip]
    {
        let mut compressor = rdeflate::huffman_only_compressor(Vec::new(), container).unwrap();
        compressor.write(&payload).unwrap();
        let compressed = compressor.close().unwrap();

        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, container).unwrap();
        assert_eq!(out, payload);
    }
}

#[test]
fn flush_any_number_of_times_does_not_change_the_decoded_output()
{
    let mut compressed = Vec::new();
    {
        let mut compressor = rdeflate::compressor(&mut compressed, Container::Raw, Level::DEFAULT).unwrap();
        compressor.write(b"hello").unwrap();
        compressor.flush().unwrap();
        compressor.flush().unwrap();
        compressor.write(b" world").unwrap();
        compressor.close().unwrap();
    }
    let mut out = Vec::new();
    decompress(&compressed[..], &mut out, Container::Raw).unwrap();
    assert_eq!(out, b"hello world");
}

#[test]
fn round_trips_at_every_level_and_container()
{
    let payload = b"she sells sea shells by the sea shore, surely the shells are seashells".repeat(8);
    for level in [0_u8, 1, 4, 6, 9]
    {
        for container in [Container::Raw, Container::Zlib, Container::Gzip]
        {
            let mut compressed = Vec::new();
            compress(&payload[..], &mut compressed, container, Level::new(level)).unwrap();
            let mut out = Vec::new();
            decompress(&compressed[..], &mut out, container).unwrap();
            assert_eq!(out, payload, "level {level} container {container:?}");
        }
    }
}

mod rdeflate_test_support
{
    // Minimal re-creation of the crate's internal BitWriter interface used
    // only to hand-assemble a malformed fixed-Huffman block for the
    // corrupted-back-reference scenario; the real type is not public.
    pub struct BitWriter
    {
        bytes: Vec<u8>,
        bitbuf: u32,
        bitcount: u32
    }

    impl BitWriter
    {
        pub fn new() -> Self
        {
            BitWriter { bytes: Vec::new(), bitbuf: 0, bitcount: 0 }
        }

        pub fn write_bits(&mut self, value: u32, len: u32)
        {
            self.bitbuf |= value << self.bitcount;
            self.bitcount += len;
            while self.bitcount >= 8
            {
                self.bytes.push((self.bitbuf & 0xff) as u8);
                self.bitbuf >>= 8;
                self.bitcount -= 8;
            }
        }

        pub fn write_huffman_code(&mut self, code: u16, len: u8)
        {
            let mut reversed: u32 = 0;
            for i in 0..len
            {
                if code & (1 << i) != 0
                {
                    reversed |= 1 << (len - 1 - i);
                }
            }
            self.write_bits(reversed as u32, len as u32);
        }

        pub fn finish(mut self) -> Vec<u8>
        {
            if self.bitcount > 0
            {
                self.bytes.push((self.bitbuf & 0xff) as u8);
            }
            self.bytes
        }
    }
}
