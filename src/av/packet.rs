use bytes::Bytes;
use std::time::Duration;

use super::{CodecConfig, CodecType};

/// One encoded frame (video) or sample block (audio) as delivered by the
/// capture/encoding side.
///
/// Timestamps are offsets on the encoder's clock; `None` marks an invalid
/// timestamp. `timestamp` is the reference instant PES timestamps are
/// measured from.
#[derive(Debug, Clone)]
pub struct AccessUnit {
    pub codec: CodecType,
    pub data: Bytes,
    pub pts: Option<Duration>,
    pub dts: Option<Duration>,
    pub timestamp: Duration,
    pub config: Option<CodecConfig>,
    pub random_access: bool,
}

impl AccessUnit {
    pub fn new(codec: CodecType, data: impl Into<Bytes>) -> Self {
        Self {
            codec,
            data: data.into(),
            pts: None,
            dts: None,
            timestamp: Duration::ZERO,
            config: None,
            random_access: false,
        }
    }

    pub fn video(data: impl Into<Bytes>) -> Self {
        Self::new(CodecType::H264, data)
    }

    pub fn audio(data: impl Into<Bytes>) -> Self {
        Self::new(CodecType::AAC, data)
    }

    pub fn with_pts(mut self, pts: Duration) -> Self {
        self.pts = Some(pts);
        self
    }

    pub fn with_dts(mut self, dts: Duration) -> Self {
        self.dts = Some(dts);
        self
    }

    pub fn with_timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_random_access(mut self, random_access: bool) -> Self {
        self.random_access = random_access;
        self
    }

    /// DTS when valid, otherwise PTS.
    pub fn decode_time(&self) -> Option<Duration> {
        self.dts.or(self.pts)
    }
}
