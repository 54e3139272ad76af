//! Schema-free protobuf wire-format rendering.
//!
//! Renders tag/value structure from raw wire bytes without a schema:
//! varints show their decoded value, length-delimited fields are probed
//! as nested messages, then UTF-8 text, then hex. Heuristic output for
//! humans; not a stable format.

/// Hard recursion limit for the nested-message probe.
const MAX_DEPTH: usize = 8;

/// Wire types (protobuf encoding spec).
const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

/// Render a wire-format message. Fails on structurally invalid input
/// (bad tag, truncated field); the caller reports the error alongside
/// the raw frame.
pub fn render_message(data: &[u8]) -> Result<String, String> {
    let mut out = String::from("message:");
    render_fields(data, 1, &mut out)?;
    Ok(out)
}

fn render_fields(mut data: &[u8], depth: usize, out: &mut String) -> Result<(), String> {
    while !data.is_empty() {
        let (key, n) = read_varint(data).ok_or("truncated field key")?;
        data = &data[n..];
        let field = key >> 3;
        let wire_type = (key & 0x7) as u8;
        if field == 0 {
            return Err("field number 0 is invalid".into());
        }

        let indent = "    ".repeat(depth);
        match wire_type {
            WIRE_VARINT => {
                let (value, n) = read_varint(data).ok_or("truncated varint")?;
                data = &data[n..];
                out.push_str(&format!("\n{indent}{field} <varint> = {value}"));
            }
            WIRE_FIXED64 => {
                if data.len() < 8 {
                    return Err("truncated 64-bit field".into());
                }
                let value = u64::from_le_bytes(data[..8].try_into().unwrap());
                data = &data[8..];
                out.push_str(&format!("\n{indent}{field} <64bit> = 0x{value:016x}"));
            }
            WIRE_LEN => {
                let (len, n) = read_varint(data).ok_or("truncated length prefix")?;
                data = &data[n..];
                let len = usize::try_from(len).map_err(|_| "length overflow".to_string())?;
                if data.len() < len {
                    return Err("length-delimited field exceeds message".into());
                }
                let chunk = &data[..len];
                data = &data[len..];
                render_len_delimited(field, chunk, depth, out);
            }
            WIRE_FIXED32 => {
                if data.len() < 4 {
                    return Err("truncated 32-bit field".into());
                }
                let value = u32::from_le_bytes(data[..4].try_into().unwrap());
                data = &data[4..];
                out.push_str(&format!("\n{indent}{field} <32bit> = 0x{value:08x}"));
            }
            other => return Err(format!("unsupported wire type {other}")),
        }
    }
    Ok(())
}

/// Probe order for a length-delimited chunk: nested message, UTF-8
/// string, raw hex.
fn render_len_delimited(field: u64, chunk: &[u8], depth: usize, out: &mut String) {
    let indent = "    ".repeat(depth);

    if !chunk.is_empty() && depth < MAX_DEPTH {
        let mut nested = String::new();
        if render_fields(chunk, depth + 1, &mut nested).is_ok() {
            out.push_str(&format!("\n{indent}{field} <message>:{nested}"));
            return;
        }
    }

    match std::str::from_utf8(chunk) {
        Ok(text) if text.chars().all(|c| !c.is_control() || c == '\n' || c == '\t') => {
            out.push_str(&format!("\n{indent}{field} <chunk> = {text:?}"));
        }
        _ => {
            let hex: String = chunk.iter().map(|b| format!("{b:02x}")).collect();
            out.push_str(&format!("\n{indent}{field} <chunk> = 0x{hex}"));
        }
    }
}

/// Read a base-128 varint. Returns the value and bytes consumed.
fn read_varint(data: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &b) in data.iter().enumerate() {
        if i >= 10 {
            return None; // longer than any valid 64-bit varint
        }
        value |= u64::from(b & 0x7f) << (7 * i as u32);
        if b & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_field() {
        // field 1, varint 150 (the canonical protobuf example).
        let data = [0x08, 0x96, 0x01];
        assert_eq!(render_message(&data).unwrap(), "message:\n    1 <varint> = 150");
    }

    #[test]
    fn string_field() {
        // field 2, "testing".
        let data = [0x12, 0x07, b't', b'e', b's', b't', b'i', b'n', b'g'];
        assert_eq!(
            render_message(&data).unwrap(),
            "message:\n    2 <chunk> = \"testing\""
        );
    }

    #[test]
    fn nested_message() {
        // field 3 wrapping (field 1, varint 1).
        let data = [0x1a, 0x02, 0x08, 0x01];
        assert_eq!(
            render_message(&data).unwrap(),
            "message:\n    3 <message>:\n        1 <varint> = 1"
        );
    }

    #[test]
    fn fixed_width_fields() {
        let mut data = vec![0x0d]; // field 1, 32-bit
        data.extend_from_slice(&0x01020304u32.to_le_bytes());
        data.push(0x11); // field 2, 64-bit
        data.extend_from_slice(&0x0a0b0c0d0e0f1011u64.to_le_bytes());
        let rendered = render_message(&data).unwrap();
        assert!(rendered.contains("1 <32bit> = 0x01020304"));
        assert!(rendered.contains("2 <64bit> = 0x0a0b0c0d0e0f1011"));
    }

    #[test]
    fn binary_chunk_renders_hex() {
        let data = [0x12, 0x03, 0xff, 0x00, 0x80];
        assert_eq!(
            render_message(&data).unwrap(),
            "message:\n    2 <chunk> = 0xff0080"
        );
    }

    #[test]
    fn truncated_input_fails() {
        assert!(render_message(&[0x12, 0x10, 0x01]).is_err());
        assert!(render_message(&[0x08]).is_err());
    }

    #[test]
    fn empty_message_is_bare() {
        assert_eq!(render_message(&[]).unwrap(), "message:");
    }
}
