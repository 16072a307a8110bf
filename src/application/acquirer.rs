//! Capture device acquisition and failure classification

use crate::domain::error::CaptureError;

use super::ports::{
    AudioConstraints, AudioStream, CaptureSupport, MediaDevices, PlatformError,
    PlatformErrorKind,
};

/// Acquires input streams through the host with permissive constraints
pub struct DeviceAcquirer<D: MediaDevices> {
    devices: D,
}

impl<D: MediaDevices> DeviceAcquirer<D> {
    /// Create an acquirer over a host
    pub fn new(devices: D) -> Self {
        Self { devices }
    }

    /// Get the underlying host
    pub fn devices(&self) -> &D {
        &self.devices
    }

    /// Acquire a stream, classifying any failure.
    ///
    /// The returned guard stops the stream's tracks exactly once,
    /// either through [`AcquiredStream::release`] or on drop.
    pub async fn acquire(&self) -> Result<AcquiredStream<D::Stream>, CaptureError> {
        match self.devices.support() {
            CaptureSupport::Available => {}
            CaptureSupport::Unsupported => return Err(CaptureError::UnsupportedPlatform),
            CaptureSupport::InsecureContext => return Err(CaptureError::InsecureContext),
        }

        let stream = self
            .devices
            .get_user_media(&AudioConstraints::permissive())
            .await
            .map_err(|e| classify(&e))?;

        Ok(AcquiredStream::new(stream))
    }
}

/// Map a raw host error onto the capture taxonomy.
///
/// The structured kind wins. Message matching only applies to kinds the
/// host uses as catch-alls, and anything unmatched stays `Unknown`.
pub fn classify(error: &PlatformError) -> CaptureError {
    match error.kind {
        PlatformErrorKind::NotAllowed => CaptureError::PermissionDenied,
        PlatformErrorKind::NotFound | PlatformErrorKind::Overconstrained => {
            CaptureError::DeviceNotFound
        }
        PlatformErrorKind::NotReadable => CaptureError::DeviceBusy,
        PlatformErrorKind::Security => CaptureError::InsecureContext,
        PlatformErrorKind::Abort | PlatformErrorKind::Other => classify_message(&error.message),
    }
}

/// Best-effort classification from message text
fn classify_message(message: &str) -> CaptureError {
    const PERMISSION: &[&str] = &["permission", "not allowed", "denied"];
    const NOT_FOUND: &[&str] = &[
        "not found",
        "no device",
        "no such device",
        "no input device",
        "not available",
    ];
    const BUSY: &[&str] = &["busy", "in use", "could not start", "not readable"];
    const SECURE: &[&str] = &["secure context", "https", "insecure"];

    let lower = message.to_lowercase();
    let matches = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if matches(PERMISSION) {
        CaptureError::PermissionDenied
    } else if matches(SECURE) {
        CaptureError::InsecureContext
    } else if matches(BUSY) {
        CaptureError::DeviceBusy
    } else if matches(NOT_FOUND) {
        CaptureError::DeviceNotFound
    } else {
        CaptureError::Unknown(message.to_string())
    }
}

/// Owned stream that is released exactly once
pub struct AcquiredStream<S: AudioStream> {
    stream: S,
    released: bool,
}

impl<S: AudioStream> AcquiredStream<S> {
    fn new(stream: S) -> Self {
        Self {
            stream,
            released: false,
        }
    }

    /// Borrow the stream for pipeline construction
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Check whether the device is still held
    pub fn is_held(&self) -> bool {
        !self.released
    }

    /// Stop the stream's tracks. Later calls do nothing.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stream.stop_tracks();
        }
    }
}

impl<S: AudioStream> Drop for AcquiredStream<S> {
    fn drop(&mut self) {
        self.release();
    }
}
