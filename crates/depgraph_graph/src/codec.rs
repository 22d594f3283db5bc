//! Binary encoding of graph elements with tag-dispatched kinds.
//!
//! Framing (kind tags, counts, strings, raw 64-bit values) is fixed-width
//! little-endian. Each element kind's payload is its native encoding: a
//! serde struct written with bincode and prefixed by its byte length.
//!
//! Heterogeneous element families (usages, metadata, nodes) map every
//! concrete kind to a stable one-byte tag through an explicit [`KindTag`]
//! registry, so persisted graphs decode identically across builds.

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GraphError, GraphResult};

/// A closed registry of concrete kinds within one element family.
pub trait KindTag: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Family name used in diagnostics (e.g. "usage").
    const FAMILY: &'static str;

    /// The stable wire tag for this kind.
    fn tag(self) -> u8;

    /// Looks up the kind registered under `tag`.
    fn from_tag(tag: u8) -> Option<Self>;
}

/// A polymorphic element that can be written and read by kind.
pub trait GraphElement: Sized {
    /// The kind registry of this element family.
    type Kind: KindTag;

    /// Returns the concrete kind of this element.
    fn kind(&self) -> Self::Kind;

    /// Writes the element body (without its kind tag).
    fn write_payload<W: ElementWriter>(&self, out: &mut W) -> GraphResult<()>;

    /// Reads the body of an element already known to be of `kind`.
    fn read_payload<R: ElementReader>(kind: Self::Kind, input: &mut R) -> GraphResult<Self>;
}

/// Sink for encoded graph data.
pub trait ElementWriter {
    /// Writes a single byte.
    fn write_u8(&mut self, value: u8);

    /// Writes a 4-byte integer.
    fn write_i32(&mut self, value: i32);

    /// Writes an 8-byte integer with no variable-length encoding.
    fn write_raw_i64(&mut self, value: i64);

    /// Writes `bytes` verbatim.
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Writes a collection size as a 4-byte integer.
    fn write_count(&mut self, count: usize) -> GraphResult<()> {
        let count = i32::try_from(count).map_err(|_| GraphError::Serialization {
            reason: format!("count {count} exceeds i32 range"),
        })?;
        self.write_i32(count);
        Ok(())
    }

    /// Writes a length-prefixed UTF-8 string.
    fn write_str(&mut self, value: &str) -> GraphResult<()> {
        self.write_count(value.len())?;
        self.write_bytes(value.as_bytes());
        Ok(())
    }

    /// Writes a presence byte followed by the string when present.
    fn write_opt_str(&mut self, value: Option<&str>) -> GraphResult<()> {
        match value {
            Some(s) => {
                self.write_u8(1);
                self.write_str(s)
            }
            None => {
                self.write_u8(0);
                Ok(())
            }
        }
    }

    /// Writes a serde value as a length-prefixed bincode payload.
    fn write_serde<T: Serialize>(&mut self, value: &T) -> GraphResult<()> {
        let bytes = bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(
            |e| GraphError::Serialization {
                reason: e.to_string(),
            },
        )?;
        self.write_count(bytes.len())?;
        self.write_bytes(&bytes);
        Ok(())
    }

    /// Writes a homogeneous group: kind tag, count, then each payload.
    fn write_group<'e, E, I>(&mut self, kind: E::Kind, elements: I) -> GraphResult<()>
    where
        Self: Sized,
        E: GraphElement + 'e,
        I: ExactSizeIterator<Item = &'e E>,
    {
        self.write_u8(kind.tag());
        self.write_count(elements.len())?;
        for element in elements {
            debug_assert_eq!(element.kind(), kind);
            element.write_payload(self)?;
        }
        Ok(())
    }

    /// Writes one element preceded by its own kind tag.
    fn write_element<E: GraphElement>(&mut self, element: &E) -> GraphResult<()>
    where
        Self: Sized,
    {
        self.write_u8(element.kind().tag());
        element.write_payload(self)
    }
}

/// Source of encoded graph data.
pub trait ElementReader {
    /// Reads a single byte.
    fn read_u8(&mut self) -> GraphResult<u8>;

    /// Reads a 4-byte integer.
    fn read_i32(&mut self) -> GraphResult<i32>;

    /// Reads an 8-byte integer.
    fn read_raw_i64(&mut self) -> GraphResult<i64>;

    /// Reads exactly `len` bytes.
    fn read_bytes(&mut self, len: usize) -> GraphResult<&[u8]>;

    /// Reads a collection size, rejecting negative values.
    fn read_count(&mut self) -> GraphResult<usize> {
        let raw = self.read_i32()?;
        usize::try_from(raw).map_err(|_| GraphError::corrupt(format!("negative count {raw}")))
    }

    /// Reads a length-prefixed UTF-8 string.
    fn read_str(&mut self) -> GraphResult<String> {
        let len = self.read_count()?;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| GraphError::corrupt(format!("invalid UTF-8 in string: {e}")))
    }

    /// Reads an optional string written by [`ElementWriter::write_opt_str`].
    fn read_opt_str(&mut self) -> GraphResult<Option<String>> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => self.read_str().map(Some),
            other => Err(GraphError::corrupt(format!(
                "invalid presence marker {other}"
            ))),
        }
    }

    /// Reads a length-prefixed bincode payload.
    fn read_serde<T: DeserializeOwned>(&mut self) -> GraphResult<T> {
        let len = self.read_count()?;
        let bytes = self.read_bytes(len)?;
        let (value, used) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| GraphError::corrupt(e.to_string()))?;
        if used != len {
            return Err(GraphError::corrupt(format!(
                "payload declared {len} bytes but decoded {used}"
            )));
        }
        Ok(value)
    }

    /// Reads a kind tag and resolves it through the registry of `K`.
    fn read_kind<K: KindTag>(&mut self) -> GraphResult<K> {
        let tag = self.read_u8()?;
        K::from_tag(tag).ok_or_else(|| GraphError::unknown_tag(K::FAMILY, tag))
    }

    /// Reads one group written by [`ElementWriter::write_group`] into `sink`.
    fn read_group_into<E: GraphElement>(&mut self, sink: &mut Vec<E>) -> GraphResult<()>
    where
        Self: Sized,
    {
        let kind = self.read_kind::<E::Kind>()?;
        let count = self.read_count()?;
        for _ in 0..count {
            sink.push(E::read_payload(kind, self)?);
        }
        Ok(())
    }

    /// Reads one element written by [`ElementWriter::write_element`].
    fn read_element<E: GraphElement>(&mut self) -> GraphResult<E>
    where
        Self: Sized,
    {
        let kind = self.read_kind::<E::Kind>()?;
        E::read_payload(kind, self)
    }
}

/// In-memory [`ElementWriter`].
#[derive(Debug, Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl ElementWriter for BinaryWriter {
    fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn write_raw_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// [`ElementReader`] over a byte slice.
#[derive(Debug)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fails unless every byte has been consumed.
    pub fn finish(&self) -> GraphResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(GraphError::corrupt(format!("{n} trailing bytes"))),
        }
    }

    fn take(&mut self, len: usize) -> GraphResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(GraphError::corrupt(format!(
                "unexpected end of input at offset {}: need {len} bytes, have {}",
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> GraphResult<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

impl ElementReader for BinaryReader<'_> {
    fn read_u8(&mut self) -> GraphResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    fn read_i32(&mut self) -> GraphResult<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    fn read_raw_i64(&mut self) -> GraphResult<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    fn read_bytes(&mut self, len: usize) -> GraphResult<&[u8]> {
        self.take(len)
    }
}
