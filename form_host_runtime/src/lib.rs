pub mod config;
pub mod decode;
pub mod error;
pub mod form;
pub mod host;
pub mod options;
pub mod payload;
pub mod personal;
pub mod protocol;
pub mod selection;
pub mod submit;
pub mod trace;

use crate::error::{FormError, HostError};
use crate::form::FormSession;
use crate::host::{Host, HostAction};
use crate::protocol::{
    FormEnvelope, HostEnvelope, View, decode_host_envelope, encode_form_envelope, error_envelope,
    next_frame, ready_envelope, write_encoded, write_envelope,
};
use crate::trace::TraceKind;
use std::collections::HashMap;
use std::io::{self, Read, Write};

pub use crate::config::HostConfig;
pub use crate::decode::{Decoded, decode_payload};
pub use crate::error::{BuildIssue, DataIntegrityError, DecodeError, SelectionError, SubmitError};
pub use crate::options::{FormKind, OptionSpace};
pub use crate::selection::SelectionState;
pub use crate::submit::{DeclinedWrapping, OutboundPayload, assemble};
pub use serde_json;

pub fn run(config: &HostConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with(config, stdin.lock(), stdout.lock())?;
    Ok(())
}

/// Serves envelopes from `reader` until the host closes it. Per-form problems
/// are answered with error envelopes; only I/O failures end the loop early.
pub fn run_with<R: Read, W: Write>(config: &HostConfig, mut reader: R, mut writer: W) -> io::Result<()> {
    let mut runtime = FormRuntime::new(config.clone());

    write_envelope(
        &mut writer,
        &ready_envelope(config.sid.clone()),
        config.max_outbound_frame,
    )?;
    log::info!("form host ready (sid={})", config.sid);

    while let Some(frame) = next_frame(&mut reader, config.max_inbound_frame)? {
        match decode_host_envelope(&frame) {
            Ok(envelope) => runtime.handle(envelope, &mut writer)?,
            Err(err) => {
                log::error!("invalid envelope: {err}");
                write_envelope(
                    &mut writer,
                    &error_envelope(config.sid.clone(), None, "invalid_envelope", err.to_string()),
                    config.max_outbound_frame,
                )?;
            }
        }
    }

    log::info!("host closed the stream; {} form(s) seen", runtime.sessions.len());
    Ok(())
}

pub struct FormRuntime {
    config: HostConfig,
    sessions: HashMap<String, FormSession>,
}

impl FormRuntime {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
        }
    }

    pub fn session(&self, form_id: &str) -> Option<&FormSession> {
        self.sessions.get(form_id)
    }

    pub fn handle(&mut self, envelope: HostEnvelope, writer: &mut impl Write) -> io::Result<()> {
        if envelope.sid() != self.config.sid {
            let message = format!(
                "sid mismatch: got {}, serving {}",
                envelope.sid(),
                self.config.sid
            );
            log::warn!("{message}");
            return self.send_error(writer, Some(envelope.form_id()), "sid_mismatch", message);
        }

        match envelope {
            HostEnvelope::Render { form_id, trace, .. } => {
                let Some(kind) = TraceKind::detect(&trace) else {
                    log::warn!("no form matches trace type `{}`", trace.kind);
                    return self.send_error(
                        writer,
                        Some(&form_id),
                        "unsupported_trace",
                        format!("no form matches trace type `{}`", trace.kind),
                    );
                };
                self.render(form_id, kind, trace.payload(), writer)
            }
            HostEnvelope::Event { form_id, event, .. } => {
                let Some(session) = self.sessions.get_mut(&form_id) else {
                    return self.send_error(
                        writer,
                        Some(&form_id),
                        "unknown_form",
                        format!("no form rendered as `{form_id}`"),
                    );
                };

                let mut host = FrameHost {
                    writer: &mut *writer,
                    sid: &self.config.sid,
                    form_id: &form_id,
                    max_payload: self.config.max_outbound_frame,
                };

                match session.handle(event, &mut host) {
                    Ok(()) => Ok(()),
                    Err(FormError::Host(HostError::Io(err))) => Err(err),
                    Err(err) => {
                        log::warn!("form {form_id}: {err}");
                        self.send_error(writer, Some(&form_id), err.code(), err.to_string())
                    }
                }
            }
        }
    }

    fn render(
        &mut self,
        form_id: String,
        kind: TraceKind,
        payload: Option<&serde_json::Value>,
        writer: &mut impl Write,
    ) -> io::Result<()> {
        let sid = self.config.sid.clone();
        let max_payload = self.config.max_outbound_frame;

        let (view, session) = match kind {
            TraceKind::Form { form } => {
                let mut session = FormSession::new(form, self.config.declined_wrapping);
                match session.render(payload) {
                    Ok(view) => (View::Form(view), Some(session)),
                    Err(err) => {
                        return self.send_error(writer, Some(&form_id), err.code(), err.to_string());
                    }
                }
            }
            TraceKind::WaitingAnimation { text, delay_ms } => {
                (View::WaitingAnimation { text, delay_ms }, None)
            }
            TraceKind::DoneAnimation => (View::DoneAnimation, None),
        };

        let frame = encode_form_envelope(&FormEnvelope::Rendered {
            sid: sid.clone(),
            form_id: form_id.clone(),
            view,
        })?;
        if frame.len() > max_payload {
            let message = format!("rendered view is {} bytes, limit is {max_payload}", frame.len());
            log::error!("form {form_id} not rendered: {message}");
            return self.send_error(writer, Some(&form_id), "view_too_large", message);
        }
        write_encoded(writer, &frame, max_payload)?;

        match session {
            Some(session) => {
                if self.sessions.insert(form_id.clone(), session).is_some() {
                    log::info!("form {form_id} re-rendered; previous selection discarded");
                }
            }
            None => FrameHost {
                writer,
                sid: &sid,
                form_id: &form_id,
                max_payload,
            }
            .resume(HostAction::Continue)?,
        }

        Ok(())
    }

    fn send_error(
        &self,
        writer: &mut impl Write,
        form_id: Option<&str>,
        code: &str,
        message: String,
    ) -> io::Result<()> {
        write_envelope(
            writer,
            &error_envelope(
                self.config.sid.clone(),
                form_id.map(str::to_string),
                code,
                message,
            ),
            self.config.max_outbound_frame,
        )
    }
}

/// Resumes the conversation by writing a `resume` envelope for one form.
struct FrameHost<'a, W: Write> {
    writer: W,
    sid: &'a str,
    form_id: &'a str,
    max_payload: usize,
}

impl<W: Write> Host for FrameHost<'_, W> {
    fn resume(&mut self, action: HostAction) -> Result<(), HostError> {
        let frame = encode_form_envelope(&FormEnvelope::Resume {
            sid: self.sid.to_string(),
            form_id: self.form_id.to_string(),
            action,
        })?;
        if frame.len() > self.max_payload {
            return Err(HostError::FrameTooLarge {
                len: frame.len(),
                max: self.max_payload,
            });
        }
        write_encoded(&mut self.writer, &frame, self.max_payload)?;
        Ok(())
    }
}
