use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, TsError};
use crate::format::ts::types::{DEFAULT_AUDIO_PID, DEFAULT_PMT_PID, DEFAULT_VIDEO_PID};

lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::load());
}

/// Which elementary streams a program is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedMedia {
    Video,
    Audio,
    Both,
}

impl ExpectedMedia {
    pub fn video(self) -> bool {
        matches!(self, ExpectedMedia::Video | ExpectedMedia::Both)
    }

    pub fn audio(self) -> bool {
        matches!(self, ExpectedMedia::Audio | ExpectedMedia::Both)
    }
}

impl std::str::FromStr for ExpectedMedia {
    type Err = TsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(ExpectedMedia::Video),
            "audio" => Ok(ExpectedMedia::Audio),
            "both" | "video,audio" | "audio,video" => Ok(ExpectedMedia::Both),
            other => Err(TsError::InvalidData(format!(
                "unknown expected media: {}",
                other
            ))),
        }
    }
}

/// Writer settings shared by every program in the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub video_pid: u16,
    pub audio_pid: u16,
    pub pmt_pid: u16,
    pub pcr_interval: Duration,
    pub psi_interval: Duration,
    pub expected_media: ExpectedMedia,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_pid: DEFAULT_VIDEO_PID,
            audio_pid: DEFAULT_AUDIO_PID,
            pmt_pid: DEFAULT_PMT_PID,
            pcr_interval: Duration::from_millis(20),
            psi_interval: Duration::from_secs(2),
            expected_media: ExpectedMedia::Both,
        }
    }
}

impl Config {
    /// Builds the configuration from defaults, then the environment, then
    /// the first config file found in the working directory.
    pub fn load() -> Self {
        let mut config = Config::default();

        for (key, var) in [
            ("video_pid", "TSMUX_VIDEO_PID"),
            ("audio_pid", "TSMUX_AUDIO_PID"),
            ("pmt_pid", "TSMUX_PMT_PID"),
            ("pcr_interval_ms", "TSMUX_PCR_INTERVAL_MS"),
            ("psi_interval_ms", "TSMUX_PSI_INTERVAL_MS"),
            ("expected_media", "TSMUX_EXPECTED_MEDIA"),
        ] {
            if let Ok(value) = env::var(var) {
                if let Err(e) = config.apply(key, &value) {
                    log::warn!("ignoring {}={:?}: {}", var, value, e);
                }
            }
        }

        let config_paths = ["./tsmux.toml", "./config.toml"];
        for path in &config_paths {
            if let Ok(content) = fs::read_to_string(path) {
                config.apply_str(&content);
                break;
            }
        }

        config
    }

    /// Applies `key = value` lines, skipping comments and unknown keys.
    pub fn apply_str(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if let Err(e) = self.apply(key.trim(), value) {
                log::warn!("ignoring config line {:?}: {}", line, e);
            }
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "video_pid" => self.video_pid = parse_pid(value)?,
            "audio_pid" => self.audio_pid = parse_pid(value)?,
            "pmt_pid" => self.pmt_pid = parse_pid(value)?,
            "pcr_interval_ms" => self.pcr_interval = Duration::from_millis(value.parse()?),
            "psi_interval_ms" => self.psi_interval = Duration::from_millis(value.parse()?),
            "expected_media" => self.expected_media = value.parse()?,
            _ => {}
        }
        Ok(())
    }

    pub fn reload() {
        let new_config = Config::load();
        *CONFIG.write() = new_config;
    }
}

fn parse_pid(value: &str) -> Result<u16> {
    let pid = match value.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16)?,
        None => value.parse::<u16>()?,
    };
    if pid > 0x1fff {
        return Err(TsError::InvalidData(format!("PID {} exceeds 13 bits", pid)));
    }
    Ok(pid)
}

/// Returns a snapshot of the process-wide configuration
pub fn current() -> Config {
    CONFIG.read().clone()
}

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        let template = r#"# TSMUX Configuration
video_pid = 256
audio_pid = 257
pmt_pid = 4095
pcr_interval_ms = 20
psi_interval_ms = 2000
expected_media = "both"
"#;
        fs::write(path, template)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_str_overrides_defaults() {
        let mut config = Config::default();
        config.apply_str(
            "# comment\nvideo_pid = 0x200\naudio_pid = \"513\"\npcr_interval_ms = 40\nexpected_media = 'video'\nunknown = 1\n",
        );

        assert_eq!(config.video_pid, 0x200);
        assert_eq!(config.audio_pid, 513);
        assert_eq!(config.pmt_pid, DEFAULT_PMT_PID);
        assert_eq!(config.pcr_interval, Duration::from_millis(40));
        assert_eq!(config.expected_media, ExpectedMedia::Video);
    }

    #[test]
    fn test_invalid_values_are_skipped() {
        let mut config = Config::default();
        config.apply_str("video_pid = 9000\naudio_pid = abc\nexpected_media = radio\n");

        assert_eq!(config.video_pid, DEFAULT_VIDEO_PID);
        assert_eq!(config.audio_pid, DEFAULT_AUDIO_PID);
        assert_eq!(config.expected_media, ExpectedMedia::Both);
    }

    #[test]
    fn test_expected_media_flags() {
        assert!(ExpectedMedia::Both.video() && ExpectedMedia::Both.audio());
        assert!(!ExpectedMedia::Audio.video());
        assert!(!ExpectedMedia::Video.audio());
    }
}
