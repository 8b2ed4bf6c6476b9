use crate::form::{FormEvent, FormView};
use crate::host::HostAction;
use crate::trace::RawTrace;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

pub const DEFAULT_HOST_TO_FORM_CAP: usize = 1_048_576;
/// Outbound default. A rendered view can echo most of an inbound payload, so
/// this stays well above the inbound default.
pub const DEFAULT_FORM_TO_HOST_CAP: usize = 4 * DEFAULT_HOST_TO_FORM_CAP;
/// Error messages may quote user input; longer ones are cut here.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Form(FormView),
    WaitingAnimation { text: String, delay_ms: u64 },
    DoneAnimation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t")]
pub enum FormEnvelope {
    #[serde(rename = "ready")]
    Ready { sid: String },
    #[serde(rename = "rendered")]
    Rendered {
        sid: String,
        form_id: String,
        view: View,
    },
    #[serde(rename = "resume")]
    Resume {
        sid: String,
        form_id: String,
        action: HostAction,
    },
    #[serde(rename = "error")]
    Error {
        sid: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        form_id: Option<String>,
        code: String,
        message: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "t")]
pub enum HostEnvelope {
    #[serde(rename = "render")]
    Render {
        sid: String,
        form_id: String,
        trace: RawTrace,
    },
    #[serde(rename = "event")]
    Event {
        sid: String,
        form_id: String,
        event: FormEvent,
    },
}

impl HostEnvelope {
    pub fn sid(&self) -> &str {
        match self {
            HostEnvelope::Render { sid, .. } | HostEnvelope::Event { sid, .. } => sid,
        }
    }

    pub fn form_id(&self) -> &str {
        match self {
            HostEnvelope::Render { form_id, .. } | HostEnvelope::Event { form_id, .. } => form_id,
        }
    }
}

pub fn ready_envelope(sid: String) -> FormEnvelope {
    FormEnvelope::Ready { sid }
}

pub fn error_envelope(
    sid: String,
    form_id: Option<String>,
    code: &str,
    message: impl Into<String>,
) -> FormEnvelope {
    let mut message: String = message.into();
    if let Some((cut, _)) = message.char_indices().nth(MAX_ERROR_MESSAGE_CHARS) {
        message.truncate(cut);
        message.push_str("...");
    }

    FormEnvelope::Error {
        sid,
        form_id,
        code: code.to_string(),
        message,
    }
}

pub fn write_envelope(
    writer: &mut impl Write,
    envelope: &FormEnvelope,
    max_payload: usize,
) -> io::Result<()> {
    let payload = encode_form_envelope(envelope)?;
    write_encoded(writer, &payload, max_payload)
}

/// Writes an already encoded envelope as one frame and flushes.
pub fn write_encoded(writer: &mut impl Write, payload: &[u8], max_payload: usize) -> io::Result<()> {
    write_frame(writer, payload, max_payload)?;
    writer.flush()
}

/// Next raw frame, or `None` once the host closes the stream.
pub fn next_frame(reader: &mut impl Read, max_payload: usize) -> io::Result<Option<Vec<u8>>> {
    match read_frame(reader, max_payload) {
        Ok(payload) => Ok(Some(payload)),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(err) => Err(err),
    }
}

pub fn encode_form_envelope(envelope: &FormEnvelope) -> io::Result<Vec<u8>> {
    serde_json::to_vec(envelope).map_err(|err| invalid_data(err.to_string()))
}

pub fn decode_host_envelope(payload: &[u8]) -> io::Result<HostEnvelope> {
    serde_json::from_slice(payload).map_err(|err| invalid_data(err.to_string()))
}

/// Checks `len` against `max_payload` and the 4-byte prefix range.
pub fn frame_len(len: usize, max_payload: usize) -> io::Result<u32> {
    if len > max_payload {
        return Err(invalid_data(format!("frame too large: {len} > {max_payload}")));
    }
    u32::try_from(len).map_err(|_| invalid_data(format!("frame length {len} exceeds u32")))
}

fn read_frame(reader: &mut impl Read, max_payload: usize) -> io::Result<Vec<u8>> {
    let mut prefix = [0_u8; 4];
    reader.read_exact(&mut prefix)?;
    let len = frame_len(u32::from_be_bytes(prefix) as usize, max_payload)?;

    let mut body = vec![0_u8; len as usize];
    reader.read_exact(&mut body)?;
    Ok(body)
}

fn write_frame(writer: &mut impl Write, body: &[u8], max_payload: usize) -> io::Result<()> {
    let len = frame_len(body.len(), max_payload)?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(body)
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Cursor;

    #[test]
    fn written_envelope_reads_back_as_one_frame() {
        let mut out = Vec::new();
        write_envelope(&mut out, &ready_envelope("S1".to_string()), DEFAULT_FORM_TO_HOST_CAP)
            .expect("write ready");

        let mut cursor = Cursor::new(out);
        let frame = next_frame(&mut cursor, DEFAULT_FORM_TO_HOST_CAP)
            .expect("frame read")
            .expect("one frame");
        let value: Value = serde_json::from_slice(&frame).expect("json body");
        assert_eq!(value, serde_json::json!({ "t": "ready", "sid": "S1" }));

        assert!(next_frame(&mut cursor, DEFAULT_FORM_TO_HOST_CAP).expect("clean eof").is_none());
    }

    #[test]
    fn truncated_frame_is_treated_as_end_of_stream() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 5, b'a', b'b']);
        assert!(next_frame(&mut cursor, DEFAULT_HOST_TO_FORM_CAP)
            .expect("eof")
            .is_none());
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let len = (DEFAULT_HOST_TO_FORM_CAP as u32) + 1;
        let mut cursor = Cursor::new(len.to_be_bytes().to_vec());
        let err = next_frame(&mut cursor, DEFAULT_HOST_TO_FORM_CAP).expect_err("expected too large");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn length_prefix_is_big_endian() {
        let mut out = Vec::new();
        write_frame(&mut out, b"abc", DEFAULT_FORM_TO_HOST_CAP).expect("frame write");
        assert_eq!(&out[0..4], &[0, 0, 0, 3]);
    }

    #[test]
    fn outbound_cap_is_a_parameter() {
        let mut out = Vec::new();
        let envelope = ready_envelope("S1".to_string());
        let len = encode_form_envelope(&envelope).expect("encode ready").len();

        let err = write_envelope(&mut out, &envelope, len - 1).expect_err("expected too large");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(out.is_empty());

        write_envelope(&mut out, &envelope, len).expect("fits exactly");
        assert_eq!(out.len(), len + 4);
    }

    #[test]
    fn long_error_messages_are_cut() {
        let FormEnvelope::Error { message, .. } =
            error_envelope("S1".to_string(), None, "invalid_input", "é".repeat(5000))
        else {
            panic!("expected error envelope");
        };
        assert_eq!(message.chars().count(), MAX_ERROR_MESSAGE_CHARS + 3);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn decodes_render_envelope_with_string_payload() {
        let payload = br#"{"t":"render","sid":"S1","form_id":"f1","trace":{"type":"order_form_with_wrapping","payload":"{\"lb_quantity\":\"Aantal\"}"}}"#;

        match decode_host_envelope(payload).expect("decode render") {
            HostEnvelope::Render { sid, form_id, trace } => {
                assert_eq!(sid, "S1");
                assert_eq!(form_id, "f1");
                assert_eq!(trace.kind, "order_form_with_wrapping");
                assert!(trace.payload.is_string());
            }
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn decodes_event_envelope() {
        let payload = br#"{"t":"event","sid":"S1","form_id":"f1","event":{"kind":"select_color","value":"Red"}}"#;
        let decoded = decode_host_envelope(payload).expect("decode event");

        assert_eq!(decoded.form_id(), "f1");
        match decoded {
            HostEnvelope::Event { event, .. } => {
                assert_eq!(event, FormEvent::SelectColor { value: "Red".to_string() });
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn encodes_resume_envelope() {
        let encoded = encode_form_envelope(&FormEnvelope::Resume {
            sid: "S1".to_string(),
            form_id: "f1".to_string(),
            action: HostAction::Continue,
        })
        .expect("encode resume");

        let value: Value = serde_json::from_slice(&encoded).expect("parse encoded json");
        assert_eq!(value["t"], "resume");
        assert_eq!(value["form_id"], "f1");
        assert_eq!(value["action"]["type"], "continue");
    }

    #[test]
    fn error_envelope_omits_missing_form_id() {
        let encoded = encode_form_envelope(&error_envelope(
            "S1".to_string(),
            None,
            "invalid_envelope",
            "bad json",
        ))
        .expect("encode error");

        let value: Value = serde_json::from_slice(&encoded).expect("parse encoded json");
        assert_eq!(value["code"], "invalid_envelope");
        assert!(value.get("form_id").is_none());
    }
}
