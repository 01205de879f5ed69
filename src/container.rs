//! Container framing: gzip (RFC 1952), zlib (RFC 1950), and the bare
//! DEFLATE stream with no wrapper at all.

use crate::errors::InflateError;

const GZIP_ID1: u8 = 0x1f;
const GZIP_ID2: u8 = 0x8b;
const GZIP_CM_DEFLATE: u8 = 8;
const GZIP_FLG_FTEXT: u8 = 1 << 0;
const GZIP_FLG_FHCRC: u8 = 1 << 1;
const GZIP_FLG_FEXTRA: u8 = 1 << 2;
const GZIP_FLG_FNAME: u8 = 1 << 3;
const GZIP_FLG_FCOMMENT: u8 = 1 << 4;

/// Which outer wrapper (if any) surrounds the raw DEFLATE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container
{
    Raw,
    Zlib,
    Gzip
}

/// Write a container header for `container` onto `out`, returning nothing
/// (raw has no header at all).
pub fn write_header(out: &mut Vec<u8>, container: Container)
{
    match container
    {
        Container::Raw => {}
        Container::Zlib =>
        {
            // CMF: CM=8 (deflate), CINFO=7 (32K window). FLG: FLEVEL=2
            // (default), no preset dictionary, FCHECK makes the 16-bit
            // big-endian value a multiple of 31.
            let cmf: u8 = 0x78;
            let mut flg: u16 = 0x00;
            flg |= 2 << 6;
            let header = ((cmf as u16) << 8) | flg;
            let check = 31 - (header % 31);
            let flg = (flg + if check == 31 { 0 } else { check }) as u8;
            out.push(cmf);
            out.push(flg);
        }
        Container::Gzip =>
        {
            out.push(GZIP_ID1);
            out.push(GZIP_ID2);
            out.push(GZIP_CM_DEFLATE);
            out.push(0); // FLG
            out.extend_from_slice(&[0, 0, 0, 0]); // MTIME unknown
            out.push(0); // XFL
            out.push(3); // OS: Unix
        }
    }
}

/// Write the container footer (checksum + any trailing length field) for
/// `container`, given the uncompressed payload that was just framed.
pub fn write_footer(out: &mut Vec<u8>, container: Container, payload: &[u8])
{
    match container
    {
        Container::Raw => {}
        Container::Zlib =>
        {
            #[cfg(feature = "zlib")]
            {
                let adler = simd_adler32::adler32(payload);
                out.extend_from_slice(&adler.to_be_bytes());
            }
            #[cfg(not(feature = "zlib"))]
            {
                let _ = payload;
            }
        }
        Container::Gzip =>
        {
            #[cfg(feature = "gzip")]
            {
                let crc = crc32fast::hash(payload);
                out.extend_from_slice(&crc.to_le_bytes());
                out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            }
            #[cfg(not(feature = "gzip"))]
            {
                let _ = payload;
            }
        }
    }
}

/// Strip and validate a container header, returning the remaining bytes
/// (the raw DEFLATE stream plus trailing footer, for the caller to
/// separate once the payload length is known).
pub fn read_header<'a>(data: &'a [u8], container: Container) -> Result<&'a [u8], InflateError>
{
    match container
    {
        Container::Raw => Ok(data),
        Container::Zlib =>
        {
            if data.len() < 2
            {
                return Err(InflateError::UnexpectedEndOfStream);
            }
            let cmf = data[0];
            let flg = data[1];
            if cmf & 0x0f != GZIP_CM_DEFLATE
            {
                return Err(InflateError::BadContainerHeader("unsupported zlib compression method"));
            }
            if ((cmf as u16) << 8 | flg as u16) % 31 != 0
            {
                return Err(InflateError::BadContainerHeader("zlib header check bits are invalid"));
            }
            if flg & 0x20 != 0
            {
                return Err(InflateError::BadContainerHeader("zlib preset dictionaries are not supported"));
            }
            Ok(&data[2..])
        }
        Container::Gzip =>
        {
            if data.len() < 10
            {
                return Err(InflateError::UnexpectedEndOfStream);
            }
            if data[0] != GZIP_ID1 || data[1] != GZIP_ID2
            {
                return Err(InflateError::BadContainerHeader("not a gzip stream"));
            }
            if data[2] != GZIP_CM_DEFLATE
            {
                return Err(InflateError::BadContainerHeader("unsupported gzip compression method"));
            }
            let flg = data[3];
            let mut pos = 10;
            if flg & GZIP_FLG_FEXTRA != 0
            {
                if pos + 2 > data.len()
                {
                    return Err(InflateError::UnexpectedEndOfStream);
                }
                let xlen = u16::from_le_bytes([data[pos], data[pos + 1]]) as usize;
                pos += 2 + xlen;
            }
            if flg & GZIP_FLG_FNAME != 0
            {
                pos += skip_cstring(data, pos)?;
            }
            if flg & GZIP_FLG_FCOMMENT != 0
            {
                pos += skip_cstring(data, pos)?;
            }
            if flg & GZIP_FLG_FHCRC != 0
            {
                pos += 2;
            }
            let _ = GZIP_FLG_FTEXT;
            if pos > data.len()
            {
                return Err(InflateError::UnexpectedEndOfStream);
            }
            Ok(&data[pos..])
        }
    }
}

fn skip_cstring(data: &[u8], start: usize) -> Result<usize, InflateError>
{
    let rest = data.get(start..).ok_or(InflateError::UnexpectedEndOfStream)?;
    let len = rest.iter().position(|&b| b == 0).ok_or(InflateError::UnexpectedEndOfStream)? + 1;
    Ok(len)
}

/// Validate a container's trailing footer against the decoded payload.
/// `after_stream` is whatever bytes followed the raw DEFLATE stream.
pub fn verify_footer(after_stream: &[u8], container: Container, payload: &[u8]) -> Result<(), InflateError>
{
    match container
    {
        Container::Raw => Ok(()),
        Container::Zlib =>
        {
            if after_stream.len() < 4
            {
                return Err(InflateError::UnexpectedEndOfStream);
            }
            let expected = u32::from_be_bytes(after_stream[..4].try_into().unwrap());
            #[cfg(feature = "zlib")]
            {
                let actual = simd_adler32::adler32(payload);
                if actual != expected
                {
                    return Err(InflateError::BadContainerFooter("zlib ADLER-32 checksum mismatch"));
                }
            }
            #[cfg(not(feature = "zlib"))]
            {
                let _ = (payload, expected);
            }
            Ok(())
        }
        Container::Gzip =>
        {
            if after_stream.len() < 8
            {
                return Err(InflateError::UnexpectedEndOfStream);
            }
            let expected_crc = u32::from_le_bytes(after_stream[..4].try_into().unwrap());
            let expected_isize = u32::from_le_bytes(after_stream[4..8].try_into().unwrap());
            if payload.len() as u32 != expected_isize
            {
                return Err(InflateError::BadContainerFooter("gzip ISIZE does not match decoded length"));
            }
            #[cfg(feature = "gzip")]
            {
                let actual = crc32fast::hash(payload);
                if actual != expected_crc
                {
                    return Err(InflateError::BadContainerFooter("gzip CRC-32 checksum mismatch"));
                }
            }
            #[cfg(not(feature = "gzip"))]
            {
                let _ = expected_crc;
            }
            Ok(())
        }
    }
}

pub fn footer_len(container: Container) -> usize
{
    match container
    {
        Container::Raw => 0,
        Container::Zlib => 4,
        Container::Gzip => 8
    }
}

/// Running checksum state for a streaming compressor, fed incrementally as
/// input arrives rather than hashed once over a fully-buffered payload.
pub enum Checksum
{
    None,
    #[cfg(feature = "zlib")]
    Adler(simd_adler32::Adler32),
    #[cfg(feature = "gzip")]
    Crc(crc32fast::Hasher)
}

impl Checksum
{
    pub fn for_container(container: Container) -> Self
    {
        match container
        {
            Container::Raw => Checksum::None,
            #[cfg(feature = "zlib")]
            Container::Zlib => Checksum::Adler(simd_adler32::Adler32::new()),
            #[cfg(not(feature = "zlib"))]
            Container::Zlib => Checksum::None,
            #[cfg(feature = "gzip")]
            Container::Gzip => Checksum::Crc(crc32fast::Hasher::new()),
            #[cfg(not(feature = "gzip"))]
            Container::Gzip => Checksum::None
        }
    }

    pub fn update(&mut self, data: &[u8])
    {
        match self
        {
            Checksum::None => {}
            #[cfg(feature = "zlib")]
            Checksum::Adler(h) =>
            {
                use std::hash::Hasher;
                h.write(data);
            }
            #[cfg(feature = "gzip")]
            Checksum::Crc(h) => h.update(data)
        }
    }

    /// Consume the running checksum and append the container's footer
    /// bytes (if any) to `out`. `total_len` is the number of uncompressed
    /// bytes seen, needed for gzip's trailing ISIZE field.
    pub fn write_footer(self, out: &mut Vec<u8>, container: Container, total_len: u32)
    {
        match container
        {
            Container::Raw => {}
            Container::Zlib =>
            {
                let adler = match self
                {
                    #[cfg(feature = "zlib")]
                    Checksum::Adler(h) =>
                    {
                        use std::hash::Hasher;
                        h.finish() as u32
                    }
                    _ => 0
                };
                out.extend_from_slice(&adler.to_be_bytes());
            }
            Container::Gzip =>
            {
                let crc = match self
                {
                    #[cfg(feature = "gzip")]
                    Checksum::Crc(h) => h.finalize(),
                    _ => 0
                };
                out.extend_from_slice(&crc.to_le_bytes());
                out.extend_from_slice(&total_len.to_le_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn zlib_header_is_a_multiple_of_31()
    {
        let mut out = Vec::new();
        write_header(&mut out, Container::Zlib);
        let value = ((out[0] as u16) << 8) | out[1] as u16;
        assert_eq!(value % 31, 0);
    }

    #[test]
    fn gzip_header_round_trips()
    {
        let mut out = Vec::new();
        write_header(&mut out, Container::Gzip);
        let rest = read_header(&out, Container::Gzip).unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn gzip_skips_optional_fields()
    {
        let mut data = vec![GZIP_ID1, GZIP_ID2, GZIP_CM_DEFLATE, GZIP_FLG_FNAME, 0, 0, 0, 0, 0, 0xff];
        data.extend_from_slice(b"file.txt\0");
        data.push(0xAB); // start of the actual deflate stream
        let rest = read_header(&data, Container::Gzip).unwrap();
        assert_eq!(rest, &[0xAB]);
    }
}
