//! A pure-Rust DEFLATE codec: RFC 1951 compression/decompression plus the
//! RFC 1950 (zlib) and RFC 1952 (gzip) container formats built on top of
//! it.

use std::io::{Read, Write};

mod bitreader;
mod bitwriter;
mod blockwriter;
mod circularbuffer;
mod constants;
mod container;
mod deflate;
pub mod errors;
mod hashchain;
mod huffman;
mod huffman_decode;
mod inflate;
mod matchfinder;
mod token;
mod tokenizer;
mod window;

pub use container::Container;
pub use deflate::{compress, compressor, huffman_only_compressor, Compressor, Level};
pub use errors::{DeflateError, InflateError};
pub use inflate::Inflate;
pub use token::Token;

/// A streaming decoder over an in-memory compressed buffer, already
/// stripped of its container framing. Re-exported for callers that want
/// the raw DEFLATE bitstream decoder directly.
pub type Decompressor<'src> = Inflate<'src>;

/// Build a streaming decoder for a `container`-wrapped compressed buffer,
/// validating (but not yet verifying the footer of) the header.
pub fn decompressor(data: &[u8], container: Container) -> Result<Inflate<'_>, InflateError>
{
    let body = container::read_header(data, container)?;
    let footer_len = container::footer_len(container);
    let stream = body.get(..body.len().saturating_sub(footer_len)).ok_or(InflateError::UnexpectedEndOfStream)?;
    Ok(Inflate::new(stream))
}

/// Decode an entire `container`-wrapped compressed stream read from
/// `reader`, writing the decompressed bytes to `writer` and validating the
/// container footer (CRC-32/ADLER-32/ISIZE) once decoding completes.
pub fn decompress<R: Read, W: Write>(mut reader: R, mut writer: W, container: Container) -> Result<(), InflateError>
{
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let body = container::read_header(&data, container)?;
    let footer_len = container::footer_len(container);
    if body.len() < footer_len
    {
        return Err(InflateError::UnexpectedEndOfStream);
    }
    let (stream, footer) = body.split_at(body.len() - footer_len);

    let decoded = Inflate::new(stream).decode_all()?;
    writer.write_all(&decoded)?;
    container::verify_footer(footer, container, &decoded)?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn end_to_end_hello_world_raw()
    {
        let mut compressed = Vec::new();
        compress(&b"Hello world\n"[..], &mut compressed, Container::Raw, Level::DEFAULT).unwrap();
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, Container::Raw).unwrap();
        assert_eq!(out, b"Hello world\n");
    }

    #[test]
    fn end_to_end_hello_world_gzip_and_zlib()
    {
        for container in [Container::Gzip, Container::Zlib]
        {
            let mut compressed = Vec::new();
            compress(&b"Hello world\n"[..], &mut compressed, container, Level::DEFAULT).unwrap();
            let mut out = Vec::new();
            decompress(&compressed[..], &mut out, container).unwrap();
            assert_eq!(out, b"Hello world\n");
        }
    }

    #[test]
    fn hello_world_wire_bytes_match_the_known_encoding()
    {
        // "Hello world\n" doesn't compress (14 Huffman-coded bytes would be
        // larger than the 12-byte input), so the real encoder picks a
        // stored block, matching this exact literal encoding.
        let expected: &[u8] =
            &[0x01, 0x0c, 0x00, 0xf3, 0xff, 0x48, 0x65, 0x6c, 0x6c, 0x6f, 0x20, 0x77, 0x6f, 0x72, 0x6c, 0x64, 0x0a];
        let mut compressed = Vec::new();
        compress(&b"Hello world\n"[..], &mut compressed, Container::Raw, Level::DEFAULT).unwrap();
        assert_eq!(compressed, expected);
    }
}
