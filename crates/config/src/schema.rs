/// Config schema for the face-swap plugin: trigger phrase, remote service, media fetching.
use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceSwapConfig {
    /// Exact message text (after trimming) that starts a face-swap conversation.
    pub trigger_prefix: String,
    pub beart: BeArtConfig,
    pub media: MediaConfig,
}

impl Default for FaceSwapConfig {
    fn default() -> Self {
        Self {
            trigger_prefix: "换脸".into(),
            beart: BeArtConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

/// Remote BeArt face-swap service.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeArtConfig {
    /// Scheme and host of the API, without a trailing path.
    pub base_url: String,
    /// Value of the `product-code` header sent on every request.
    pub product_code: String,
    /// Value of the `product-serial` header sent on job creation.
    #[serde(serialize_with = "serialize_secret")]
    pub product_serial: Secret<String>,
    /// Upload timeout for `create-job`.
    pub create_timeout_secs: u64,
    /// Per-attempt timeout for `get-job`.
    pub poll_timeout_secs: u64,
    pub poll_max_attempts: u32,
    /// Pause between two "still processing" answers, in seconds.
    pub poll_interval_secs: u64,
}

impl BeArtConfig {
    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl std::fmt::Debug for BeArtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeArtConfig")
            .field("base_url", &self.base_url)
            .field("product_code", &self.product_code)
            .field("product_serial", &"[REDACTED]")
            .field("poll_max_attempts", &self.poll_max_attempts)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for BeArtConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.beart.ai".into(),
            product_code: "067003".into(),
            product_serial: Secret::new("7ccd9ec0944184501659484ed36d6550".into()),
            create_timeout_secs: 30,
            poll_timeout_secs: 15,
            poll_max_attempts: 30,
            poll_interval_secs: 2,
        }
    }
}

/// Fetching inbound images that arrive as URLs or lazy attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub download_timeout_secs: u64,
    /// Grace period after asking the host to materialize an attachment.
    pub prepare_wait_ms: u64,
}

impl MediaConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn prepare_wait(&self) -> Duration {
        Duration::from_millis(self.prepare_wait_ms)
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: 30,
            prepare_wait_ms: 1000,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let cfg = FaceSwapConfig::default();
        assert_eq!(cfg.trigger_prefix, "换脸");
        assert_eq!(cfg.beart.product_code, "067003");
        assert_eq!(cfg.beart.create_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.beart.poll_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.beart.poll_max_attempts, 30);
        assert_eq!(cfg.beart.poll_interval(), Duration::from_secs(2));
        assert_eq!(cfg.media.prepare_wait(), Duration::from_millis(1000));
    }

    #[test]
    fn deserialize_only_trigger() {
        let cfg: FaceSwapConfig = serde_json::from_str(r#"{"trigger_prefix": "swap"}"#).unwrap();
        assert_eq!(cfg.trigger_prefix, "swap");
        assert_eq!(cfg.beart.base_url, "https://api.beart.ai");
    }

    #[test]
    fn deserialize_nested_overrides() {
        let json = r#"{
            "beart": {"base_url": "http://localhost:9000", "poll_interval_secs": 0},
            "media": {"prepare_wait_ms": 5}
        }"#;
        let cfg: FaceSwapConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.trigger_prefix, "换脸");
        assert_eq!(cfg.beart.base_url, "http://localhost:9000");
        assert_eq!(cfg.beart.poll_interval(), Duration::ZERO);
        assert_eq!(cfg.beart.poll_max_attempts, 30);
        assert_eq!(cfg.media.prepare_wait_ms, 5);
    }

    #[test]
    fn debug_redacts_serial() {
        let cfg = BeArtConfig::default();
        let out = format!("{cfg:?}");
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("7ccd9ec0944184501659484ed36d6550"));
    }

    #[test]
    fn serial_survives_roundtrip() {
        let json = serde_json::to_string(&FaceSwapConfig::default()).unwrap();
        let cfg: FaceSwapConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(
            cfg.beart.product_serial.expose_secret(),
            "7ccd9ec0944184501659484ed36d6550"
        );
    }
}
