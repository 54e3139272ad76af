//! One-line text rendering of decoded frames for the traffic UI.
//!
//! The exact format is not a wire contract; it only has to stay readable
//! and stable enough for humans diffing two captures.

use crate::error::H2Error;
use crate::frame::{Frame, FLAG_ACK, FLAG_END_HEADERS, FLAG_END_STREAM, FLAG_PADDED, FLAG_PRIORITY};
use crate::hpack;
use crate::settings::setting_name;

/// Render one frame as a display line (no trailing newline).
///
/// HEADERS and PUSH_PROMISE blocks are decompressed through `hpack`; a
/// compression failure here loses the connection's header state and must
/// end decoding.
pub fn render_frame(frame: &Frame, hpack: &mut hpack::Decoder) -> Result<String, H2Error> {
    let line = match frame {
        Frame::Data {
            stream_id,
            flags,
            payload,
        } => format!(
            "{} {}",
            meta("DATA", *stream_id, data_flags(*flags)),
            fmt_bytes(payload)
        ),
        Frame::Headers {
            stream_id,
            flags,
            block,
            ..
        } => {
            let fields = hpack.decode(block)?;
            render_headers(*stream_id, *flags, &fields)
        }
        Frame::Priority {
            stream_id,
            priority,
        } => format!(
            "PRIORITY(stream_id={stream_id}): dependency={} weight={}{}",
            priority.dependency,
            priority.weight,
            if priority.exclusive { " exclusive" } else { "" }
        ),
        Frame::RstStream {
            stream_id,
            error_code,
        } => format!("RST_STREAM(stream_id={stream_id}): {error_code:?}"),
        Frame::Settings { flags, pairs } => {
            let mut rendered: Vec<String> = Vec::with_capacity(pairs.len());
            for (id, value) in pairs {
                match setting_name(*id) {
                    Some(name) => rendered.push(format!("{name}: {value}")),
                    None => rendered.push(format!("{id}: {value}")),
                }
            }
            format!(
                "{} {{{}}}",
                meta("SETTINGS", 0, ack_flags(*flags)),
                rendered.join(", ")
            )
        }
        Frame::PushPromise {
            stream_id,
            flags,
            promised_stream_id,
            block,
        } => {
            let fields = hpack.decode(block)?;
            format!(
                "{} promised_stream_id={} {}",
                meta("PUSH_PROMISE", *stream_id, headers_flags(*flags)),
                promised_stream_id,
                fmt_fields(&fields)
            )
        }
        Frame::Ping { flags, opaque } => format!(
            "{} {}",
            meta("PING", 0, ack_flags(*flags)),
            fmt_bytes(opaque)
        ),
        Frame::GoAway {
            last_stream_id,
            error_code,
            debug_data,
        } => format!(
            "GOAWAY(last_stream_id={last_stream_id}): {error_code:?} {}",
            fmt_bytes(debug_data)
        ),
        Frame::WindowUpdate {
            stream_id,
            increment,
        } => format!("WINDOW_UPDATE(stream_id={stream_id}): increment={increment}"),
        Frame::Continuation {
            stream_id, block, ..
        } => {
            let fields = hpack.decode(block)?;
            format!("CONTINUATION(stream_id={stream_id}): {}", fmt_fields(&fields))
        }
        Frame::Unknown {
            frame_type,
            flags,
            stream_id,
            payload,
        } => format!(
            "UNKNOWN(type=0x{frame_type:02x}, stream_id={stream_id}, flags=0x{flags:02x}): {}",
            fmt_bytes(payload)
        ),
    };
    Ok(line)
}

/// Render a HEADERS line from already-decoded fields. Exposed so callers
/// that decode the block themselves (for classification) can produce the
/// same line without running HPACK twice.
pub fn render_headers(stream_id: u32, flags: u8, fields: &[hpack::HeaderField]) -> String {
    format!(
        "{} {}",
        meta("HEADERS", stream_id, headers_flags(flags)),
        fmt_fields(fields)
    )
}

fn meta(name: &str, stream_id: u32, flags: Vec<&'static str>) -> String {
    format!("{name}(stream_id={stream_id}, flags={})", flags.join("|"))
}

fn data_flags(flags: u8) -> Vec<&'static str> {
    let mut out = Vec::new();
    if flags & FLAG_END_STREAM != 0 {
        out.push("END_STREAM");
    }
    if flags & FLAG_PADDED != 0 {
        out.push("PADDED");
    }
    out
}

fn headers_flags(flags: u8) -> Vec<&'static str> {
    let mut out = Vec::new();
    if flags & FLAG_END_STREAM != 0 {
        out.push("END_STREAM");
    }
    if flags & FLAG_END_HEADERS != 0 {
        out.push("END_HEADERS");
    }
    if flags & FLAG_PADDED != 0 {
        out.push("PADDED");
    }
    if flags & FLAG_PRIORITY != 0 {
        out.push("PRIORITY");
    }
    out
}

fn ack_flags(flags: u8) -> Vec<&'static str> {
    if flags & FLAG_ACK != 0 {
        vec!["ACK"]
    } else {
        Vec::new()
    }
}

/// Render decoded header fields as `[name: value, ...]`.
pub fn fmt_fields(fields: &[hpack::HeaderField]) -> String {
    let rendered: Vec<String> = fields
        .iter()
        .map(|f| {
            format!(
                "{}: {}",
                String::from_utf8_lossy(&f.name),
                String::from_utf8_lossy(&f.value)
            )
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

/// Render payload bytes as a printable literal: ASCII stays as-is,
/// everything else becomes `\xNN`.
pub fn fmt_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() + 3);
    out.push_str("b\"");
    for &b in data {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(b as char),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpack::Decoder;

    #[test]
    fn render_data() {
        let mut hp = Decoder::new(4096);
        let frame = Frame::Data {
            stream_id: 1,
            flags: FLAG_END_STREAM,
            payload: b"hi\x00".to_vec(),
        };
        assert_eq!(
            render_frame(&frame, &mut hp).unwrap(),
            "DATA(stream_id=1, flags=END_STREAM) b\"hi\\x00\""
        );
    }

    #[test]
    fn render_headers_decodes_block() {
        let mut hp = Decoder::new(4096);
        let frame = Frame::Headers {
            stream_id: 3,
            flags: FLAG_END_HEADERS,
            block: vec![0x82, 0x84], // :method GET, :path /
            priority: None,
        };
        assert_eq!(
            render_frame(&frame, &mut hp).unwrap(),
            "HEADERS(stream_id=3, flags=END_HEADERS) [:method: GET, :path: /]"
        );
    }

    #[test]
    fn render_settings_names_known_ids() {
        let mut hp = Decoder::new(4096);
        let frame = Frame::Settings {
            flags: 0,
            pairs: vec![(5, 32768), (0x42, 7)],
        };
        assert_eq!(
            render_frame(&frame, &mut hp).unwrap(),
            "SETTINGS(stream_id=0, flags=) {MAX_FRAME_SIZE: 32768, 66: 7}"
        );
    }

    #[test]
    fn render_bad_header_block_is_error() {
        let mut hp = Decoder::new(4096);
        let frame = Frame::Headers {
            stream_id: 1,
            flags: 0,
            block: vec![0x80], // index 0 is invalid
            priority: None,
        };
        assert!(render_frame(&frame, &mut hp).is_err());
    }

    #[test]
    fn fmt_bytes_escapes() {
        assert_eq!(fmt_bytes(b"a\"b\\c\n"), "b\"a\\\"b\\\\c\\n\"");
    }
}
