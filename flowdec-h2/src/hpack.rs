//! HPACK header block decoding (RFC 7541).
//!
//! Decode-only: a passive observer never emits header blocks, so there is
//! no encoder here. The decoder carries the connection-scoped dynamic
//! table; both directions of a capture must be replayed through one
//! instance in arrival order.

use std::collections::VecDeque;

use crate::error::H2Error;
use crate::huffman;

/// Default SETTINGS_HEADER_TABLE_SIZE (RFC 7540 Section 6.5.2).
pub const DEFAULT_MAX_TABLE_SIZE: usize = 4096;

/// A single decoded header name-value pair. Values are bytes: HPACK does
/// not require header values to be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl HeaderField {
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Size of this header field for dynamic table accounting
    /// (RFC 7541 Section 4.1): len(name) + len(value) + 32.
    fn size(&self) -> usize {
        self.name.len() + self.value.len() + 32
    }
}

/// Decode an HPACK prefix integer (RFC 7541 Section 5.1).
/// Returns the value and the number of bytes consumed.
fn decode_prefix_int(buf: &[u8], prefix_bits: u8) -> Option<(u64, usize)> {
    if buf.is_empty() {
        return None;
    }
    let max = (1u64 << prefix_bits) - 1;
    let value = u64::from(buf[0]) & max;
    if value < max {
        return Some((value, 1));
    }
    let mut value = max;
    let mut shift = 0u32;
    for (i, &b) in buf[1..].iter().enumerate() {
        value += u64::from(b & 0x7f) << shift;
        shift += 7;
        if b & 0x80 == 0 {
            return Some((value, i + 2));
        }
        if shift > 56 {
            return None; // overflow protection
        }
    }
    None // incomplete
}

/// Decode a string literal (Huffman or raw).
fn decode_string_literal(buf: &[u8]) -> Result<(Vec<u8>, usize), H2Error> {
    if buf.is_empty() {
        return Err(H2Error::CompressionError);
    }
    let huffman_coded = buf[0] & 0x80 != 0;
    let (str_len, n) = decode_prefix_int(buf, 7).ok_or(H2Error::CompressionError)?;
    let str_len = str_len as usize;
    let total = n + str_len;
    if buf.len() < total {
        return Err(H2Error::CompressionError);
    }
    let data = &buf[n..total];
    let value = if huffman_coded {
        huffman::decode(data)?
    } else {
        data.to_vec()
    };
    Ok((value, total))
}

// -- Static table (RFC 7541 Appendix A) --

/// HPACK static table entries: (name, value). 61 entries indexed 1..61.
const STATIC_TABLE: &[(&[u8], &[u8])] = &[
    (b":authority", b""),                   // 1
    (b":method", b"GET"),                   // 2
    (b":method", b"POST"),                  // 3
    (b":path", b"/"),                       // 4
    (b":path", b"/index.html"),             // 5
    (b":scheme", b"http"),                  // 6
    (b":scheme", b"https"),                 // 7
    (b":status", b"200"),                   // 8
    (b":status", b"204"),                   // 9
    (b":status", b"206"),                   // 10
    (b":status", b"304"),                   // 11
    (b":status", b"400"),                   // 12
    (b":status", b"404"),                   // 13
    (b":status", b"500"),                   // 14
    (b"accept-charset", b""),               // 15
    (b"accept-encoding", b"gzip, deflate"), // 16
    (b"accept-language", b""),              // 17
    (b"accept-ranges", b""),                // 18
    (b"accept", b""),                       // 19
    (b"access-control-allow-origin", b""),  // 20
    (b"age", b""),                          // 21
    (b"allow", b""),                        // 22
    (b"authorization", b""),                // 23
    (b"cache-control", b""),                // 24
    (b"content-disposition", b""),          // 25
    (b"content-encoding", b""),             // 26
    (b"content-language", b""),             // 27
    (b"content-length", b""),               // 28
    (b"content-location", b""),             // 29
    (b"content-range", b""),                // 30
    (b"content-type", b""),                 // 31
    (b"cookie", b""),                       // 32
    (b"date", b""),                         // 33
    (b"etag", b""),                         // 34
    (b"expect", b""),                       // 35
    (b"expires", b""),                      // 36
    (b"from", b""),                         // 37
    (b"host", b""),                         // 38
    (b"if-match", b""),                     // 39
    (b"if-modified-since", b""),            // 40
    (b"if-none-match", b""),                // 41
    (b"if-range", b""),                     // 42
    (b"if-unmodified-since", b""),          // 43
    (b"last-modified", b""),                // 44
    (b"link", b""),                         // 45
    (b"location", b""),                     // 46
    (b"max-forwards", b""),                 // 47
    (b"proxy-authenticate", b""),           // 48
    (b"proxy-authorization", b""),          // 49
    (b"range", b""),                        // 50
    (b"referer", b""),                      // 51
    (b"refresh", b""),                      // 52
    (b"retry-after", b""),                  // 53
    (b"server", b""),                       // 54
    (b"set-cookie", b""),                   // 55
    (b"strict-transport-security", b""),    // 56
    (b"transfer-encoding", b""),            // 57
    (b"user-agent", b""),                   // 58
    (b"vary", b""),                         // 59
    (b"via", b""),                          // 60
    (b"www-authenticate", b""),             // 61
];

// -- Dynamic table --

/// HPACK dynamic table (RFC 7541 Section 2.3.2), newest entry first.
struct DynamicTable {
    entries: VecDeque<HeaderField>,
    size: usize,
    max_size: usize,
}

impl DynamicTable {
    fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            size: 0,
            max_size,
        }
    }

    fn get(&self, index: usize) -> Option<&HeaderField> {
        self.entries.get(index)
    }

    fn insert(&mut self, field: HeaderField) {
        let entry_size = field.size();
        // Evict from the oldest end to make room (RFC 7541 Section 4.4).
        while self.size + entry_size > self.max_size && !self.entries.is_empty() {
            if let Some(evicted) = self.entries.pop_back() {
                self.size -= evicted.size();
            }
        }
        // An entry larger than the table clears it and is not stored.
        if entry_size > self.max_size {
            self.entries.clear();
            self.size = 0;
            return;
        }
        self.entries.push_front(field);
        self.size += entry_size;
    }

    fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.size > self.max_size && !self.entries.is_empty() {
            if let Some(evicted) = self.entries.pop_back() {
                self.size -= evicted.size();
            }
        }
    }
}

// -- Decoder --

/// HPACK decoder with a connection-scoped dynamic table.
pub struct Decoder {
    dynamic_table: DynamicTable,
    max_table_size: usize,
}

impl Decoder {
    pub fn new(max_table_size: usize) -> Self {
        Self {
            dynamic_table: DynamicTable::new(max_table_size),
            max_table_size,
        }
    }

    /// Decode an HPACK header block into a list of fields.
    pub fn decode(&mut self, buf: &[u8]) -> Result<Vec<HeaderField>, H2Error> {
        let mut headers = Vec::new();
        let mut pos = 0;

        while pos < buf.len() {
            let first = buf[pos];

            if first & 0x80 != 0 {
                // Indexed header field (Section 6.1): 1xxxxxxx.
                let (index, n) =
                    decode_prefix_int(&buf[pos..], 7).ok_or(H2Error::CompressionError)?;
                pos += n;
                headers.push(self.get_indexed(index as usize)?);
            } else if first & 0x40 != 0 {
                // Literal with incremental indexing (Section 6.2.1): 01xxxxxx.
                let (name, value, n) = self.decode_literal(&buf[pos..], 6)?;
                pos += n;
                let field = HeaderField { name, value };
                self.dynamic_table.insert(field.clone());
                headers.push(field);
            } else if first & 0x20 != 0 {
                // Dynamic table size update (Section 6.3): 001xxxxx.
                let (new_size, n) =
                    decode_prefix_int(&buf[pos..], 5).ok_or(H2Error::CompressionError)?;
                pos += n;
                let new_size = new_size as usize;
                if new_size > self.max_table_size {
                    return Err(H2Error::CompressionError);
                }
                self.dynamic_table.set_max_size(new_size);
            } else {
                // Literal never indexed (Section 6.2.3, 0001xxxx) and
                // literal without indexing (Section 6.2.2, 0000xxxx):
                // identical on the decode side except that neither touches
                // the dynamic table.
                let (name, value, n) = self.decode_literal(&buf[pos..], 4)?;
                pos += n;
                headers.push(HeaderField { name, value });
            }
        }

        Ok(headers)
    }

    /// Decode a literal representation: indexed-or-literal name followed
    /// by a literal value. Returns (name, value, bytes consumed).
    fn decode_literal(
        &self,
        buf: &[u8],
        prefix_bits: u8,
    ) -> Result<(Vec<u8>, Vec<u8>, usize), H2Error> {
        let (name_index, mut pos) =
            decode_prefix_int(buf, prefix_bits).ok_or(H2Error::CompressionError)?;
        let name = if name_index > 0 {
            self.get_name(name_index as usize)?
        } else {
            let (name, consumed) = decode_string_literal(&buf[pos..])?;
            pos += consumed;
            name
        };
        let (value, consumed) = decode_string_literal(&buf[pos..])?;
        pos += consumed;
        Ok((name, value, pos))
    }

    /// Look up an indexed header field (static or dynamic).
    fn get_indexed(&self, index: usize) -> Result<HeaderField, H2Error> {
        if index == 0 {
            return Err(H2Error::CompressionError);
        }
        if index <= STATIC_TABLE.len() {
            let (name, value) = STATIC_TABLE[index - 1];
            Ok(HeaderField::new(name, value))
        } else {
            self.dynamic_table
                .get(index - STATIC_TABLE.len() - 1)
                .cloned()
                .ok_or(H2Error::CompressionError)
        }
    }

    /// Look up only the name from an indexed entry.
    fn get_name(&self, index: usize) -> Result<Vec<u8>, H2Error> {
        if index == 0 {
            return Err(H2Error::CompressionError);
        }
        if index <= STATIC_TABLE.len() {
            Ok(STATIC_TABLE[index - 1].0.to_vec())
        } else {
            self.dynamic_table
                .get(index - STATIC_TABLE.len() - 1)
                .map(|h| h.name.clone())
                .ok_or(H2Error::CompressionError)
        }
    }
}
