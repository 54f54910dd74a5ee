// SPDX-License-Identifier: GPL-3.0-only

//! Error taxonomy shared by location, camera and compositing code
//!
//! Platform failures are translated into [`ErrorKind`] exactly once, at the
//! point where they leave a platform collaborator. Everything above that
//! boundary works with [`ErrorDescriptor`] and never inspects message text.

use crate::config::Locale;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using ErrorDescriptor
pub type CaptureResult<T> = Result<T, ErrorDescriptor>;

/// Closed classification of everything that can go wrong while acquiring a
/// position, a camera stream or an annotated photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The user or the platform refused access
    PermissionDenied,
    /// No camera device exists
    DeviceNotFound,
    /// The camera is held by another application
    DeviceBusy,
    /// The requested stream constraints cannot be met
    ConstraintUnsatisfiable,
    /// A bounded wait expired
    Timeout,
    /// The resource exists but cannot currently produce data (e.g. no GPS signal)
    Unavailable,
    /// The execution context is neither encrypted nor local
    ContextInsecure,
    /// The platform lacks the capability entirely
    Unsupported,
    /// Anything else; the platform message is preserved
    Unknown,
    /// A capture is already in flight on this pipeline
    Busy,
    /// The caller abandoned the capture
    Cancelled,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 11] = [
        ErrorKind::PermissionDenied,
        ErrorKind::DeviceNotFound,
        ErrorKind::DeviceBusy,
        ErrorKind::ConstraintUnsatisfiable,
        ErrorKind::Timeout,
        ErrorKind::Unavailable,
        ErrorKind::ContextInsecure,
        ErrorKind::Unsupported,
        ErrorKind::Unknown,
        ErrorKind::Busy,
        ErrorKind::Cancelled,
    ];

    /// Whether the failure needs the user to change something before a retry
    /// can succeed. These are surfaced, never retried silently.
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            ErrorKind::PermissionDenied
                | ErrorKind::DeviceNotFound
                | ErrorKind::DeviceBusy
                | ErrorKind::ContextInsecure
                | ErrorKind::Unsupported
        )
    }

    /// Human-readable remediation hint for the UI layer
    pub fn remediation(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::ZhCn => match self {
                ErrorKind::PermissionDenied => {
                    "请在浏览器设置中允许摄像头和位置权限，然后刷新页面重试。"
                }
                ErrorKind::DeviceNotFound => "未找到摄像头设备。请确保设备已连接摄像头。",
                ErrorKind::DeviceBusy => "摄像头被其他应用占用。请关闭其他使用摄像头的应用后重试。",
                ErrorKind::ConstraintUnsatisfiable => "摄像头不支持请求的设置。",
                ErrorKind::Timeout => "操作超时，请重试。",
                ErrorKind::Unavailable => "位置信息不可用，请移动到信号更好的地方后重试。",
                ErrorKind::ContextInsecure => "摄像头功能需要在 HTTPS 环境下运行。",
                ErrorKind::Unsupported => "您的浏览器不支持此功能，请使用现代浏览器。",
                ErrorKind::Unknown => "发生未知错误，请重试。",
                ErrorKind::Busy => "正在处理上一张照片，请稍候。",
                ErrorKind::Cancelled => "拍照已取消。",
            },
            Locale::En => match self {
                ErrorKind::PermissionDenied => {
                    "Allow camera and location access in the browser settings, then reload."
                }
                ErrorKind::DeviceNotFound => "No camera was found. Connect a camera and retry.",
                ErrorKind::DeviceBusy => {
                    "The camera is used by another application. Close it and retry."
                }
                ErrorKind::ConstraintUnsatisfiable => {
                    "The camera does not support the requested settings."
                }
                ErrorKind::Timeout => "The operation timed out. Please retry.",
                ErrorKind::Unavailable => {
                    "Position is unavailable. Move somewhere with better signal and retry."
                }
                ErrorKind::ContextInsecure => "Camera access requires an HTTPS connection.",
                ErrorKind::Unsupported => "This browser does not support the feature.",
                ErrorKind::Unknown => "An unknown error occurred. Please retry.",
                ErrorKind::Busy => "A photo is still being processed.",
                ErrorKind::Cancelled => "The capture was cancelled.",
            },
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::DeviceNotFound => "device not found",
            ErrorKind::DeviceBusy => "device busy",
            ErrorKind::ConstraintUnsatisfiable => "constraint unsatisfiable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::ContextInsecure => "insecure context",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Unknown => "unknown",
            ErrorKind::Busy => "busy",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Classified failure handed to the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorDescriptor {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "capture cancelled by caller")
    }

    pub fn busy() -> Self {
        Self::new(ErrorKind::Busy, "a capture is already in progress")
    }
}

/// Raw failure reported by a platform media service
///
/// `name` follows the DOMException vocabulary used by browser media APIs
/// (`NotAllowedError`, `OverconstrainedError`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct PlatformMediaError {
    pub name: String,
    pub message: String,
}

impl PlatformMediaError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn not_allowed() -> Self {
        Self::new("NotAllowedError", "Permission denied")
    }

    pub fn not_found() -> Self {
        Self::new("NotFoundError", "Requested device not found")
    }

    pub fn not_readable() -> Self {
        Self::new("NotReadableError", "Could not start video source")
    }

    pub fn overconstrained(constraint: &str) -> Self {
        Self::new(
            "OverconstrainedError",
            format!("Constraint {} cannot be satisfied", constraint),
        )
    }

    /// Translate into the shared taxonomy
    pub fn classify(&self) -> ErrorKind {
        match self.name.as_str() {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                ErrorKind::PermissionDenied
            }
            "NotFoundError" | "DevicesNotFoundError" => ErrorKind::DeviceNotFound,
            "NotReadableError" | "TrackStartError" => ErrorKind::DeviceBusy,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                ErrorKind::ConstraintUnsatisfiable
            }
            "TypeError" => ErrorKind::Unsupported,
            _ => ErrorKind::Unknown,
        }
    }
}

impl From<PlatformMediaError> for ErrorDescriptor {
    fn from(err: PlatformMediaError) -> Self {
        let kind = err.classify();
        let message = if kind == ErrorKind::Unknown {
            err.to_string()
        } else {
            err.message
        };
        ErrorDescriptor::new(kind, message)
    }
}

/// Raw failure reported by a platform location service
///
/// Codes follow the W3C `GeolocationPositionError` numbering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("location error {code}: {message}")]
pub struct PlatformLocationError {
    pub code: u16,
    pub message: String,
}

impl PlatformLocationError {
    pub const PERMISSION_DENIED: u16 = 1;
    pub const POSITION_UNAVAILABLE: u16 = 2;
    pub const TIMEOUT: u16 = 3;

    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Translate into the shared taxonomy
    pub fn classify(&self) -> ErrorKind {
        match self.code {
            Self::PERMISSION_DENIED => ErrorKind::PermissionDenied,
            Self::POSITION_UNAVAILABLE => ErrorKind::Unavailable,
            Self::TIMEOUT => ErrorKind::Timeout,
            _ => ErrorKind::Unknown,
        }
    }
}

impl From<PlatformLocationError> for ErrorDescriptor {
    fn from(err: PlatformLocationError) -> Self {
        let kind = err.classify();
        let message = match kind {
            ErrorKind::Unknown if err.message.is_empty() => "unknown location error".to_string(),
            _ => err.message,
        };
        ErrorDescriptor::new(kind, message)
    }
}
