//! Camera error kind (spec.md §7 "Camera").

#[derive(Debug, Clone, thiserror::Error)]
#[error("{domain}: {message} (code {code})")]
pub struct CameraError {
    pub domain: String,
    pub code: i32,
    pub message: String,
}

impl CameraError {
    pub fn new(domain: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self { domain: domain.into(), code, message: message.into() }
    }

    pub fn unknown_property(name: &str) -> Self {
        Self::new("camera", 1, format!("no such property: {name}"))
    }

    pub fn out_of_range(name: &str, value: &str) -> Self {
        Self::new("camera", 2, format!("value '{value}' out of range for property '{name}'"))
    }

    pub fn not_recording(op: &str) -> Self {
        Self::new("camera", 3, format!("cannot {op}: not recording"))
    }

    pub fn already_recording(op: &str) -> Self {
        Self::new("camera", 4, format!("cannot {op}: already recording"))
    }

    pub fn grab_failed(reason: impl Into<String>) -> Self {
        Self::new("camera", 7, reason.into())
    }
}
