//! Primitive encoding/decoding: LEB128 varints, zigzag signed varints,
//! length-prefixed strings and little-endian floats.

use crate::error::CodecError;
use crate::limits::MAX_VARINT_BYTES;

// =============================================================================
// DECODING
// =============================================================================

/// Bounds-checked cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, CodecError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(CodecError::UnexpectedEof { context })?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(CodecError::UnexpectedEof { context })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Reads an unsigned varint (LEB128).
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64, CodecError> {
        let mut result: u64 = 0;
        let mut shift = 0;

        for _ in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte(context)?;
            let value = (byte & 0x7F) as u64;

            if shift == 63 && value > 1 {
                return Err(CodecError::VarintOverflow);
            }
            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }

        Err(CodecError::VarintTooLong)
    }

    /// Reads a zigzag-encoded signed varint.
    pub fn read_signed_varint(&mut self, context: &'static str) -> Result<i64, CodecError> {
        Ok(zigzag_decode(self.read_varint(context)?))
    }

    /// Reads a varint used as a length or count, enforcing `max`.
    pub fn read_len(&mut self, max: usize, field: &'static str) -> Result<usize, CodecError> {
        let raw = self.read_varint(field)?;
        let len = usize::try_from(raw).unwrap_or(usize::MAX);
        if len > max {
            return Err(CodecError::LengthExceedsLimit { field, len, max });
        }
        Ok(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self, max_len: usize, field: &'static str) -> Result<String, CodecError> {
        let len = self.read_len(max_len, field)?;
        let bytes = self.read_bytes(len, field)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidUtf8 { field })
    }

    /// Reads a count-prefixed list of strings.
    pub fn read_string_vec(
        &mut self,
        max_items: usize,
        max_len: usize,
        field: &'static str,
    ) -> Result<Vec<String>, CodecError> {
        let count = self.read_len(max_items, field)?;
        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            items.push(self.read_string(max_len, field)?);
        }
        Ok(items)
    }

    /// Reads a little-endian f64, rejecting NaN.
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, CodecError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.read_bytes(8, context)?);
        let value = f64::from_le_bytes(raw);
        if value.is_nan() {
            return Err(CodecError::FloatIsNan);
        }
        Ok(value)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Growable output buffer.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned varint (LEB128).
    pub fn write_varint(&mut self, mut value: u64) {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }

    pub fn write_signed_varint(&mut self, value: i64) {
        self.write_varint(zigzag_encode(value));
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_varint(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn write_string_vec(&mut self, items: &[String]) {
        self.write_varint(items.len() as u64);
        for item in items {
            self.write_string(item);
        }
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }
}

// =============================================================================
// ZIGZAG ENCODING
// =============================================================================

/// Maps signed integers onto unsigned ones so small magnitudes stay short:
/// 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...
#[inline]
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_values() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        for v in [0i64, 1, -1, i64::MAX, i64::MIN] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }

    #[test]
    fn varint_boundaries() {
        for v in [0u64, 127, 128, 16383, 16384, u64::MAX] {
            let mut writer = Writer::new();
            writer.write_varint(v);
            let mut reader = Reader::new(writer.as_bytes());
            assert_eq!(reader.read_varint("test").unwrap(), v);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn varint_too_long() {
        let data = [0x80u8; 11];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_varint("test"), Err(CodecError::VarintTooLong));
    }

    #[test]
    fn varint_overflow() {
        let mut data = [0xFFu8; 10];
        data[9] = 0x02;
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_varint("test"), Err(CodecError::VarintOverflow));
    }

    #[test]
    fn string_length_limit() {
        let mut writer = Writer::new();
        writer.write_varint(1000);
        writer.write_bytes(&[b'a'; 1000]);
        let mut reader = Reader::new(writer.as_bytes());
        assert!(matches!(
            reader.read_string(100, "test"),
            Err(CodecError::LengthExceedsLimit { max: 100, .. })
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut writer = Writer::new();
        writer.write_varint(2);
        writer.write_bytes(&[0xC3, 0x28]);
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(
            reader.read_string(10, "name"),
            Err(CodecError::InvalidUtf8 { field: "name" })
        );
    }

    #[test]
    fn eof_reported_with_context() {
        let mut reader = Reader::new(&[1, 2]);
        assert_eq!(
            reader.read_bytes(3, "payload"),
            Err(CodecError::UnexpectedEof { context: "payload" })
        );
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn nan_rejected() {
        let mut writer = Writer::new();
        writer.write_f64(f64::NAN);
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_f64("test"), Err(CodecError::FloatIsNan));
    }
}
