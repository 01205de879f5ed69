use std::fmt::{Debug, Display, Formatter};

/// Failure reasons returned by [`crate::inflate::Inflate`] and the one-shot
/// `decompress_*` functions.
///
/// Decoder failures are fatal for the stream: no recovery is attempted
/// mid-block, and the decoder must not hand back any byte whose
/// provenance was already known to be invalid.
#[derive(Clone, PartialEq, Eq)]
pub enum InflateError
{
    /// Input ended before a block or field could be fully read.
    UnexpectedEndOfStream,
    /// Reserved `BTYPE` 11, a stored-block `LEN`/`NLEN` mismatch, an
    /// invalid or oversubscribed/undersubscribed Huffman code tree, or a
    /// back-reference whose distance exceeds the bytes written so far.
    CorruptedStream(&'static str),
    /// Wrong gzip magic/method, or an invalid zlib `FCHECK`.
    BadContainerHeader(&'static str),
    /// CRC-32, ADLER-32 or ISIZE mismatch at the end of the stream.
    BadContainerFooter(&'static str),
    /// The underlying reader returned an I/O error.
    ReadFailed(String)
}

impl Display for InflateError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            Self::UnexpectedEndOfStream => write!(f, "unexpected end of stream"),
            Self::CorruptedStream(reason) => write!(f, "corrupted stream: {reason}"),
            Self::BadContainerHeader(reason) => write!(f, "bad container header: {reason}"),
            Self::BadContainerFooter(reason) => write!(f, "bad container footer: {reason}"),
            Self::ReadFailed(reason) => write!(f, "read failed: {reason}")
        }
    }
}

impl Debug for InflateError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        Display::fmt(self, f)
    }
}

impl std::error::Error for InflateError {}

impl From<std::io::Error> for InflateError
{
    fn from(value: std::io::Error) -> Self
    {
        InflateError::ReadFailed(value.to_string())
    }
}

/// Failure reasons returned by the compressor.
///
/// Almost always an I/O error: the encoder never attempts to continue
/// after a write failure and never produces structurally invalid output
/// on its own.
#[derive(Clone, PartialEq, Eq)]
pub enum DeflateError
{
    /// The underlying writer returned an I/O error.
    WriteFailed(String),
    /// `write` (or `flush`) was called after `close`.
    AlreadyClosed
}

impl Display for DeflateError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            Self::WriteFailed(reason) => write!(f, "write failed: {reason}"),
            Self::AlreadyClosed => write!(f, "compressor already closed")
        }
    }
}

impl Debug for DeflateError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        Display::fmt(self, f)
    }
}

impl std::error::Error for DeflateError {}

impl From<std::io::Error> for DeflateError
{
    fn from(value: std::io::Error) -> Self
    {
        DeflateError::WriteFailed(value.to_string())
    }
}
