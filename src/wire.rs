//! Wire types and the byte-stream abstractions the codec reads/writes through.

use std::io::Read;

use crate::error::{Error, Result};
use crate::varint;

/// Below-4096-byte threshold for eagerly buffering a substream read off a
/// sink/source stream, rather than handing back a live bounded view over
/// the underlying reader. Reduces per-field syscalls for small fields.
const EAGER_SUBSTREAM_LIMIT: usize = 4096;

/// The ten wire types. The low bit of the nibble marks a length-delimited
/// (composite) value; everything else is fixed-width or payload-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    /// Zig-zag signed varint.
    Vint,
    /// Single raw byte.
    Bits8,
    /// 4 little-endian bytes.
    Bits32,
    /// 8 little-endian bytes, signed integer.
    Bits64Long,
    /// 8 little-endian bytes, IEEE-754 double.
    Bits64Float,
    /// No payload; the tag alone carries meaning.
    Enum,
    /// Length-prefixed, ordered heterogeneous items.
    Tuple,
    /// Length-prefixed raw bytes.
    Bytes,
    /// Length-prefixed, ordered homogeneous items.
    Htuple,
    /// Length-prefixed key/value pairs.
    Assoc,
}

impl WireType {
    /// Decodes the low nibble of a prefix varint.
    pub fn from_nibble(b: u64) -> Option<Self> {
        match b {
            0 => Some(WireType::Vint),
            2 => Some(WireType::Bits8),
            4 => Some(WireType::Bits32),
            6 => Some(WireType::Bits64Long),
            8 => Some(WireType::Bits64Float),
            10 => Some(WireType::Enum),
            1 => Some(WireType::Tuple),
            3 => Some(WireType::Bytes),
            5 => Some(WireType::Htuple),
            7 => Some(WireType::Assoc),
            _ => None,
        }
    }

    /// The low nibble this wire type encodes as.
    pub fn to_nibble(self) -> u64 {
        match self {
            WireType::Vint => 0,
            WireType::Bits8 => 2,
            WireType::Bits32 => 4,
            WireType::Bits64Long => 6,
            WireType::Bits64Float => 8,
            WireType::Enum => 10,
            WireType::Tuple => 1,
            WireType::Bytes => 3,
            WireType::Htuple => 5,
            WireType::Assoc => 7,
        }
    }

    /// True if values of this wire type are length-delimited (low bit set).
    pub fn is_delimited(self) -> bool {
        self.to_nibble() & 1 == 1
    }
}

/// Splits a decoded prefix varint into its wire type and user tag.
pub fn decompose_prefix(prefix: u64) -> Result<(WireType, u64)> {
    let nibble = prefix & 0xF;
    let tag = prefix >> 4;
    let wire_type = WireType::from_nibble(nibble).ok_or(Error::UnexpectedWireType {
        found: WireType::Enum,
        tag,
    })?;
    Ok((wire_type, tag))
}

/// Composes a prefix varint from a wire type and user tag.
pub fn compose_prefix(wire_type: WireType, tag: u64) -> u64 {
    (tag << 4) | wire_type.to_nibble()
}

/// Shared read surface for in-memory and sink-backed streams.
///
/// `Sub<'s>` is the type returned by [`get_substream`](WireRead::get_substream):
/// a zero-copy slice view for [`Reader`], a bounded or eagerly-buffered view
/// for [`SourceStream`]. Modeled as a generic associated type the same way
/// the grounding crate's writer trait carries a per-context target type.
pub trait WireRead {
    /// The substream type yielded by `get_substream`.
    type Sub<'s>: WireRead
    where
        Self: 's;

    /// Reads and returns a single byte, or `UnexpectedEof`.
    fn read_byte(&mut self) -> Result<u8>;

    /// Reads exactly `n` bytes, appending them to `buf`.
    fn read_into(&mut self, n: usize, buf: &mut Vec<u8>) -> Result<()>;

    /// Advances past `n` bytes without retaining them.
    fn skip(&mut self, n: usize) -> Result<()>;

    /// Derives a substream bounded to exactly `n` bytes, advancing past them.
    fn get_substream(&mut self, n: usize) -> Result<Self::Sub<'_>>;
}

/// A read cursor over a borrowed byte slice. Substream derivation is
/// zero-copy: the child cursor borrows the same backing slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    slice: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a cursor at the start of `slice`.
    pub fn new(slice: &'a [u8]) -> Self {
        Self { slice, pos: 0 }
    }

    /// Current cursor offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.slice.len() - self.pos
    }

    /// A snapshot of the unconsumed tail.
    pub fn as_slice(&self) -> &'a [u8] {
        &self.slice[self.pos..]
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.pos + n > self.slice.len() {
            Err(Error::UnexpectedEof)
        } else {
            Ok(())
        }
    }
}

impl<'a> WireRead for Reader<'a> {
    type Sub<'s>
        = Reader<'a>
    where
        Self: 's;

    fn read_byte(&mut self) -> Result<u8> {
        self.need(1)?;
        let b = self.slice[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_into(&mut self, n: usize, buf: &mut Vec<u8>) -> Result<()> {
        self.need(n)?;
        buf.extend_from_slice(&self.slice[self.pos..self.pos + n]);
        self.pos += n;
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.need(n)?;
        self.pos += n;
        Ok(())
    }

    fn get_substream(&mut self, n: usize) -> Result<Reader<'a>> {
        self.need(n)?;
        let sub = Reader {
            slice: &self.slice[self.pos..self.pos + n],
            pos: 0,
        };
        self.pos += n;
        Ok(sub)
    }
}

/// An owned byte-vector cursor, used when a sink/source stream must
/// eagerly buffer a small substream rather than borrow the live source.
#[derive(Debug, Clone)]
pub struct OwnedReader {
    buf: Vec<u8>,
    pos: usize,
}

impl OwnedReader {
    fn need(&self, n: usize) -> Result<()> {
        if self.pos + n > self.buf.len() {
            Err(Error::UnexpectedEof)
        } else {
            Ok(())
        }
    }
}

impl WireRead for OwnedReader {
    type Sub<'s>
        = Reader<'s>
    where
        Self: 's;

    fn read_byte(&mut self) -> Result<u8> {
        self.need(1)?;
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_into(&mut self, n: usize, buf: &mut Vec<u8>) -> Result<()> {
        self.need(n)?;
        buf.extend_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.need(n)?;
        self.pos += n;
        Ok(())
    }

    fn get_substream(&mut self, n: usize) -> Result<Reader<'_>> {
        self.need(n)?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(Reader::new(slice))
    }
}

/// Wraps a caller-provided [`std::io::Read`] as a wire stream. Reads pull
/// from the underlying source on demand; there is no internal read-ahead
/// beyond what `get_substream` buffers for its eager path.
pub struct SourceStream<R: Read> {
    source: R,
}

impl<R: Read> SourceStream<R> {
    /// Wraps `source` as a wire stream.
    pub fn new(source: R) -> Self {
        Self { source }
    }

    fn read_exact_into(&mut self, n: usize, buf: &mut Vec<u8>) -> Result<()> {
        let start = buf.len();
        buf.resize(start + n, 0);
        match self.source.read_exact(&mut buf[start..]) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::UnexpectedEof),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl<R: Read> WireRead for SourceStream<R> {
    type Sub<'s>
        = Substream<'s, R>
    where
        Self: 's;

    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = Vec::with_capacity(1);
        self.read_exact_into(1, &mut buf)?;
        Ok(buf[0])
    }

    fn read_into(&mut self, n: usize, buf: &mut Vec<u8>) -> Result<()> {
        self.read_exact_into(n, buf)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        let mut scratch = Vec::new();
        self.read_exact_into(n, &mut scratch)
    }

    fn get_substream(&mut self, n: usize) -> Result<Substream<'_, R>> {
        if n < EAGER_SUBSTREAM_LIMIT {
            let mut buf = Vec::with_capacity(n);
            self.read_exact_into(n, &mut buf)?;
            Ok(Substream::Buffered(OwnedReader { buf, pos: 0 }))
        } else {
            Ok(Substream::Live(BoundedLive {
                inner: self,
                remaining: n,
            }))
        }
    }
}

/// The substream a [`SourceStream`] yields: an eagerly-buffered owned
/// view, a live bounded view over the still-borrowed source, or a
/// zero-copy slice carved out of an already-buffered view.
pub enum Substream<'s, R: Read> {
    /// Eagerly buffered (used when the substream is small, or when a
    /// further substream is carved out of a live view).
    Buffered(OwnedReader),
    /// Bounded live view over the source (used for large substreams).
    Live(BoundedLive<'s, R>),
    /// A further substream of an already-buffered view, borrowing
    /// straight from its backing buffer.
    Slice(Reader<'s>),
}

impl<'s, R: Read> WireRead for Substream<'s, R> {
    type Sub<'t>
        = Substream<'t, R>
    where
        Self: 't;

    fn read_byte(&mut self) -> Result<u8> {
        match self {
            Substream::Buffered(r) => r.read_byte(),
            Substream::Live(r) => r.read_byte(),
            Substream::Slice(r) => r.read_byte(),
        }
    }

    fn read_into(&mut self, n: usize, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Substream::Buffered(r) => r.read_into(n, buf),
            Substream::Live(r) => r.read_into(n, buf),
            Substream::Slice(r) => r.read_into(n, buf),
        }
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        match self {
            Substream::Buffered(r) => r.skip(n),
            Substream::Live(r) => r.skip(n),
            Substream::Slice(r) => r.skip(n),
        }
    }

    fn get_substream(&mut self, n: usize) -> Result<Substream<'_, R>> {
        match self {
            // A nested substream of an already-buffered view stays
            // zero-copy over the buffer we already own.
            Substream::Buffered(r) => Ok(Substream::Slice(r.get_substream(n)?)),
            // A nested substream of a zero-copy slice is itself zero-copy.
            Substream::Slice(r) => Ok(Substream::Slice(r.get_substream(n)?)),
            // A nested substream of a still-live view has nothing local to
            // borrow from, so it is buffered eagerly, exactly like the
            // top-level `SourceStream::get_substream` path.
            Substream::Live(r) => {
                let mut buf = Vec::with_capacity(n);
                r.read_into(n, &mut buf)?;
                Ok(Substream::Buffered(OwnedReader { buf, pos: 0 }))
            }
        }
    }
}

/// A bounded, borrowing view over the remaining `remaining` bytes of a
/// live [`SourceStream`]. Reads past `remaining` fail even if the
/// underlying source has more data.
pub struct BoundedLive<'s, R: Read> {
    inner: &'s mut SourceStream<R>,
    remaining: usize,
}

impl<'s, R: Read> BoundedLive<'s, R> {
    fn need(&self, n: usize) -> Result<()> {
        if n > self.remaining {
            Err(Error::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.need(1)?;
        let b = self.inner.read_byte()?;
        self.remaining -= 1;
        Ok(b)
    }

    fn read_into(&mut self, n: usize, buf: &mut Vec<u8>) -> Result<()> {
        self.need(n)?;
        self.inner.read_into(n, buf)?;
        self.remaining -= n;
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.need(n)?;
        self.inner.skip(n)?;
        self.remaining -= n;
        Ok(())
    }
}

/// A growable write buffer. Scratch buffers used to measure a composite
/// payload's length before emitting it are plain `Writer`s, scoped to the
/// write call that created them.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates an empty writer with room for at least `cap` bytes.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    /// Appends a single byte.
    pub fn write_byte(&mut self, b: u8) {
        self.buf.push(b);
    }

    /// Appends raw bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends an unsigned varint.
    pub fn write_varint(&mut self, u: u64) {
        varint::encode_unsigned(u, &mut self.buf);
    }

    /// Appends a zig-zag-encoded signed varint.
    pub fn write_svarint(&mut self, n: i64) {
        varint::encode_signed(n, &mut self.buf);
    }

    /// A view of everything written so far.
    pub fn snapshot(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Writes the accumulated bytes to `sink` in one call.
    pub fn write_to(&self, sink: &mut impl std::io::Write) -> Result<()> {
        sink.write_all(&self.buf)?;
        Ok(())
    }
}
