//! Resolver configuration.
//!
//! Every field has a default, so a JSON file only needs the settings it
//! changes. [`XrefBuilder`] covers the same ground in code.

use crate::error::{XrefError, XrefResult};
use crate::identity::{ALIAS_FILE_NAME, BAD_NAMES_FILE_NAME, DEFAULT_MAX_ATTEMPTS};
use crate::names::GaiaRelease;
use crate::params::normalize::{DEFAULT_DROPPED_FIELDS, DR2_PARALLAX_OFFSET_MAS};
use crate::remote::{RateLimitConfig, GAIA_TAP_URL, SIMBAD_TAP_URL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XrefConfig {
    pub reference_dir: PathBuf,

    pub alias_file: String,

    pub bad_names_file: String,

    /// Query the remote even for names on the bad-name list.
    pub check_bad_names: bool,

    /// Skip every rate-limit pause.
    pub fast: bool,

    pub rate_limit: RateLimitConfig,

    /// Gaia data release numbers to serve.
    pub gaia_releases: Vec<u8>,

    /// Release number → parallax zero-point offset in mas.
    pub parallax_offsets_mas: BTreeMap<u8, f64>,

    /// Raw fields left out of normalized parameters.
    pub dropped_fields: Vec<String>,

    pub max_resolve_attempts: usize,

    pub simbad_url: String,

    pub gaia_url: String,

    pub http_timeout_secs: u64,

    pub gaia_poll_interval_ms: u64,
}

impl Default for XrefConfig {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from("reference_data"),
            alias_file: ALIAS_FILE_NAME.to_string(),
            bad_names_file: BAD_NAMES_FILE_NAME.to_string(),
            check_bad_names: false,
            fast: false,
            rate_limit: RateLimitConfig::default(),
            gaia_releases: GaiaRelease::ALL.iter().map(GaiaRelease::number).collect(),
            parallax_offsets_mas: BTreeMap::from([(2, DR2_PARALLAX_OFFSET_MAS)]),
            dropped_fields: DEFAULT_DROPPED_FIELDS.iter().map(|f| f.to_string()).collect(),
            max_resolve_attempts: DEFAULT_MAX_ATTEMPTS,
            simbad_url: SIMBAD_TAP_URL.to_string(),
            gaia_url: GAIA_TAP_URL.to_string(),
            http_timeout_secs: 60,
            gaia_poll_interval_ms: 1000,
        }
    }
}

impl XrefConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> XrefResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| XrefError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn builder() -> XrefBuilder {
        XrefBuilder::new()
    }

    pub fn validate(&self) -> XrefResult<()> {
        self.releases()?;
        for number in self.parallax_offsets_mas.keys() {
            GaiaRelease::from_number(*number)?;
        }
        if self.max_resolve_attempts == 0 {
            return Err(XrefError::Config(
                "max_resolve_attempts must be at least 1".to_string(),
            ));
        }
        if self.alias_file.trim().is_empty() {
            return Err(XrefError::Config("alias_file must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn alias_path(&self) -> PathBuf {
        self.reference_dir.join(&self.alias_file)
    }

    pub fn bad_names_path(&self) -> PathBuf {
        self.reference_dir.join(&self.bad_names_file)
    }

    pub fn param_path(&self, release: GaiaRelease) -> PathBuf {
        self.reference_dir.join(release.ref_file_name())
    }

    /// Served releases, deduplicated and in release order.
    pub fn releases(&self) -> XrefResult<Vec<GaiaRelease>> {
        let mut releases = self
            .gaia_releases
            .iter()
            .map(|&n| GaiaRelease::from_number(n))
            .collect::<XrefResult<Vec<_>>>()?;
        releases.sort();
        releases.dedup();
        Ok(releases)
    }

    /// Rate limits in force, honoring `fast`.
    pub fn effective_rate_limit(&self) -> RateLimitConfig {
        if self.fast {
            RateLimitConfig::unlimited()
        } else {
            self.rate_limit
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn gaia_poll_interval(&self) -> Duration {
        Duration::from_millis(self.gaia_poll_interval_ms)
    }
}

pub struct XrefBuilder {
    config: XrefConfig,
}

impl XrefBuilder {
    pub fn new() -> Self {
        Self {
            config: XrefConfig::default(),
        }
    }

    pub fn with_reference_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.reference_dir = dir.into();
        self
    }

    pub fn with_alias_file(mut self, name: impl Into<String>) -> Self {
        self.config.alias_file = name.into();
        self
    }

    pub fn with_bad_names_file(mut self, name: impl Into<String>) -> Self {
        self.config.bad_names_file = name.into();
        self
    }

    pub fn with_check_bad_names(mut self, check: bool) -> Self {
        self.config.check_bad_names = check;
        self
    }

    pub fn fast(mut self) -> Self {
        self.config.fast = true;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = rate_limit;
        self
    }

    pub fn with_releases(mut self, releases: &[GaiaRelease]) -> Self {
        self.config.gaia_releases = releases.iter().map(GaiaRelease::number).collect();
        self
    }

    pub fn with_parallax_offset(mut self, release: GaiaRelease, offset_mas: f64) -> Self {
        self.config
            .parallax_offsets_mas
            .insert(release.number(), offset_mas);
        self
    }

    pub fn with_max_resolve_attempts(mut self, attempts: usize) -> Self {
        self.config.max_resolve_attempts = attempts;
        self
    }

    pub fn with_simbad_url(mut self, url: impl Into<String>) -> Self {
        self.config.simbad_url = url.into();
        self
    }

    pub fn with_gaia_url(mut self, url: impl Into<String>) -> Self {
        self.config.gaia_url = url.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout_secs = timeout.as_secs();
        self
    }

    pub fn build(self) -> XrefResult<XrefConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for XrefBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = XrefConfig::default();
        assert_eq!(config.alias_path(), Path::new("reference_data/simbad_ref_data.txt"));
        assert_eq!(
            config.param_path(GaiaRelease::Dr2),
            Path::new("reference_data/GaiaDR2_ref.csv")
        );
        assert_eq!(config.releases().unwrap(), GaiaRelease::ALL.to_vec());
        assert_eq!(config.parallax_offsets_mas.get(&2), Some(&0.029));
        assert_eq!(config.max_resolve_attempts, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fast_mode_disables_pauses() {
        let config = XrefConfig::builder().fast().build().unwrap();
        assert_eq!(config.effective_rate_limit(), RateLimitConfig::unlimited());
        assert_eq!(
            XrefConfig::default().effective_rate_limit(),
            RateLimitConfig::default()
        );
    }

    #[test]
    fn test_builder() {
        let config = XrefBuilder::new()
            .with_reference_dir("/data/ref")
            .with_releases(&[GaiaRelease::Dr3, GaiaRelease::Dr2, GaiaRelease::Dr3])
            .with_parallax_offset(GaiaRelease::Dr3, 0.017)
            .with_check_bad_names(true)
            .build()
            .unwrap();
        assert_eq!(config.reference_dir, PathBuf::from("/data/ref"));
        assert_eq!(
            config.releases().unwrap(),
            vec![GaiaRelease::Dr2, GaiaRelease::Dr3]
        );
        assert_eq!(config.parallax_offsets_mas.get(&3), Some(&0.017));
        assert!(config.check_bad_names);
    }

    #[test]
    fn test_builder_rejects_zero_attempts() {
        assert!(XrefBuilder::new().with_max_resolve_attempts(0).build().is_err());
    }

    #[test]
    fn test_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xref.json");
        fs::write(
            &path,
            r#"{"reference_dir": "/srv/ref", "gaia_releases": [2], "rate_limit": {"small_delay_ms": 50}}"#,
        )
        .unwrap();
        let config = XrefConfig::from_json_file(&path).unwrap();
        assert_eq!(config.reference_dir, PathBuf::from("/srv/ref"));
        assert_eq!(config.releases().unwrap(), vec![GaiaRelease::Dr2]);
        assert_eq!(config.rate_limit.small_delay_ms, 50);
        assert_eq!(config.rate_limit.big_delay_every, 50);
        assert_eq!(config.alias_file, ALIAS_FILE_NAME);
    }

    #[test]
    fn test_json_unknown_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xref.json");
        fs::write(&path, r#"{"gaia_releases": [4]}"#).unwrap();
        assert!(matches!(
            XrefConfig::from_json_file(&path),
            Err(XrefError::Config(_))
        ));
    }
}
