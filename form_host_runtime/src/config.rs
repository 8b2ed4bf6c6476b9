use crate::protocol::{DEFAULT_FORM_TO_HOST_CAP, DEFAULT_HOST_TO_FORM_CAP};
use crate::submit::DeclinedWrapping;

pub const SID_VAR: &str = "FORM_HOST_SID";
pub const MAX_INBOUND_FRAME_VAR: &str = "FORM_HOST_MAX_INBOUND_FRAME";
pub const MAX_OUTBOUND_FRAME_VAR: &str = "FORM_HOST_MAX_OUTBOUND_FRAME";
pub const WRAPPING_DECLINED_VAR: &str = "FORM_HOST_WRAPPING_DECLINED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub sid: String,
    pub max_inbound_frame: usize,
    pub max_outbound_frame: usize,
    pub declined_wrapping: DeclinedWrapping,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sid: "S1".to_string(),
            max_inbound_frame: DEFAULT_HOST_TO_FORM_CAP,
            max_outbound_frame: DEFAULT_FORM_TO_HOST_CAP,
            declined_wrapping: DeclinedWrapping::default(),
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let sid = lookup(SID_VAR)
            .filter(|sid| !sid.is_empty())
            .unwrap_or(defaults.sid);

        let max_inbound_frame = frame_cap(&lookup, MAX_INBOUND_FRAME_VAR)
            .unwrap_or(defaults.max_inbound_frame);
        let max_outbound_frame = frame_cap(&lookup, MAX_OUTBOUND_FRAME_VAR)
            .unwrap_or(defaults.max_outbound_frame);

        let declined_wrapping = match lookup(WRAPPING_DECLINED_VAR) {
            Some(raw) => DeclinedWrapping::parse(&raw).unwrap_or_else(|| {
                log::warn!("ignoring {WRAPPING_DECLINED_VAR}={raw}; expected `false` or `omit`");
                defaults.declined_wrapping
            }),
            None => defaults.declined_wrapping,
        };

        Self {
            sid,
            max_inbound_frame,
            max_outbound_frame,
            declined_wrapping,
        }
    }
}

fn frame_cap(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
}
