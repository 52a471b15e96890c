//! Gaia archive parameter client.
//!
//! Each batch of source ids becomes one asynchronous TAP job: submit, poll
//! the job phase until it completes, then download the CSV result. Masked
//! values arrive as empty cells and are left out of the row.
//!
//! [`GaiaClient::cone`] runs the same kind of job for every source inside a
//! circle on the sky.

use super::rate_limit::{RateLimitConfig, RateLimiter};
use super::{user_agent, ParamQuery};
use crate::config::XrefConfig;
use crate::error::{XrefError, XrefResult};
use crate::names::GaiaRelease;
use crate::params::ParamRow;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const GAIA_TAP_URL: &str = "https://gea.esac.esa.int/tap-server/tap";

/// Largest number of source ids sent in one job.
pub const MAX_BATCH: usize = 500;

const SERVICE: &str = "Gaia archive";

const DR1_COLUMNS: &[&str] = &[
    "source_id",
    "ra",
    "ra_error",
    "dec",
    "dec_error",
    "ref_epoch",
    "parallax",
    "parallax_error",
    "pmra",
    "pmra_error",
    "pmdec",
    "pmdec_error",
    "duplicated_source",
    "phot_g_mean_flux",
    "phot_g_mean_flux_error",
    "phot_g_mean_mag",
];

const DR2_COLUMNS: &[&str] = &[
    "source_id",
    "ra",
    "ra_error",
    "dec",
    "dec_error",
    "ref_epoch",
    "parallax",
    "parallax_error",
    "pmra",
    "pmra_error",
    "pmdec",
    "pmdec_error",
    "duplicated_source",
    "phot_g_mean_flux",
    "phot_g_mean_flux_error",
    "phot_g_mean_mag",
    "radial_velocity",
    "radial_velocity_error",
    "teff_val",
];

const DR3_COLUMNS: &[&str] = &[
    "source_id",
    "ra",
    "ra_error",
    "dec",
    "dec_error",
    "ref_epoch",
    "parallax",
    "parallax_error",
    "pmra",
    "pmra_error",
    "pmdec",
    "pmdec_error",
    "duplicated_source",
    "phot_g_mean_flux",
    "phot_g_mean_flux_error",
    "phot_g_mean_mag",
    "radial_velocity",
    "radial_velocity_error",
    "teff_gspphot",
];

/// Columns requested from `release`'s source table.
pub fn columns(release: GaiaRelease) -> &'static [&'static str] {
    match release {
        GaiaRelease::Dr1 => DR1_COLUMNS,
        GaiaRelease::Dr2 => DR2_COLUMNS,
        GaiaRelease::Dr3 => DR3_COLUMNS,
    }
}

pub struct GaiaClient {
    base_url: String,
    client: Client,
    limiter: RateLimiter,
    poll_interval: Duration,
    max_polls: u32,
    jobs: u64,
}

impl GaiaClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        rate_limit: RateLimitConfig,
    ) -> XrefResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| {
                XrefError::remote(SERVICE, "setup", format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            limiter: RateLimiter::new(rate_limit),
            poll_interval: Duration::from_secs(1),
            max_polls: 3600,
            jobs: 0,
        })
    }

    pub fn from_config(config: &XrefConfig) -> XrefResult<Self> {
        Ok(Self::new(
            config.gaia_url.clone(),
            config.http_timeout(),
            config.effective_rate_limit(),
        )?
        .with_poll_interval(config.gaia_poll_interval()))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    /// Jobs submitted so far.
    pub fn jobs(&self) -> u64 {
        self.jobs
    }

    fn source_query(release: GaiaRelease, ids: &[&str]) -> String {
        format!(
            "SELECT {} FROM {} WHERE source_id IN ({})",
            columns(release).join(", "),
            release.source_table(),
            ids.join(", ")
        )
    }

    fn cone_query(release: GaiaRelease, ra_deg: f64, dec_deg: f64, radius_deg: f64) -> String {
        format!(
            "SELECT {} FROM {} WHERE CONTAINS(POINT('ICRS', ra, dec), \
             CIRCLE('ICRS', {}, {}, {})) = 1",
            columns(release).join(", "),
            release.source_table(),
            ra_deg,
            dec_deg,
            radius_deg
        )
    }

    /// Every `release` source within `radius_deg` of the ICRS position
    /// (`ra_deg`, `dec_deg`), keyed by source id.
    pub fn cone(
        &mut self,
        release: GaiaRelease,
        ra_deg: f64,
        dec_deg: f64,
        radius_deg: f64,
    ) -> XrefResult<BTreeMap<String, ParamRow>> {
        if !ra_deg.is_finite() || !(-90.0..=90.0).contains(&dec_deg) {
            return Err(XrefError::InvalidQuery(format!(
                "position ({}, {}) is not on the sky",
                ra_deg, dec_deg
            )));
        }
        if !(radius_deg > 0.0 && radius_deg <= 180.0) {
            return Err(XrefError::InvalidQuery(format!(
                "cone radius {} deg must be in (0, 180]",
                radius_deg
            )));
        }
        let ra_deg = ra_deg.rem_euclid(360.0);
        info!(release = %release, ra_deg, dec_deg, radius_deg, "submitting Gaia cone search");
        self.run_job(release, &Self::cone_query(release, ra_deg, dec_deg, radius_deg))
    }

    fn run_job(
        &mut self,
        release: GaiaRelease,
        query: &str,
    ) -> XrefResult<BTreeMap<String, ParamRow>> {
        let job_url = self.submit(query)?;
        self.wait_for_completion(&job_url)?;
        let body = self.get_text(&format!("{}/results/result", job_url), "result")?;
        let rows = parse_sources(&body)?;
        debug!(release = %release, rows = rows.len(), "Gaia archive job finished");
        Ok(rows)
    }

    /// Starts a job and returns its URL. The service answers with a redirect
    /// to the job resource, which the client follows.
    fn submit(&mut self, query: &str) -> XrefResult<String> {
        let url = format!("{}/async", self.base_url.trim_end_matches('/'));
        let sent = self
            .client
            .post(&url)
            .form(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "csv"),
                ("PHASE", "RUN"),
                ("QUERY", query),
            ])
            .send();
        self.limiter.pause();
        self.jobs += 1;

        let response = sent.map_err(|e| {
            XrefError::remote(SERVICE, "submit", format!("Network request failed: {}", e))
        })?;
        if !response.status().is_success() {
            return Err(XrefError::remote(
                SERVICE,
                "submit",
                format!("HTTP request failed with status: {}", response.status()),
            ));
        }
        let job_url = response.url().as_str().trim_end_matches('/').to_string();
        if job_url == url {
            return Err(XrefError::remote(
                SERVICE,
                "submit",
                "Service did not redirect to a job resource",
            ));
        }
        Ok(job_url)
    }

    fn wait_for_completion(&mut self, job_url: &str) -> XrefResult<()> {
        let phase_url = format!("{}/phase", job_url);
        for _ in 0..self.max_polls {
            let phase = self.get_text(&phase_url, "poll")?;
            match phase.trim() {
                "COMPLETED" => return Ok(()),
                "ERROR" | "ABORTED" => {
                    return Err(XrefError::remote(
                        SERVICE,
                        "poll",
                        format!("Job {} ended in phase {}", job_url, phase.trim()),
                    ));
                }
                other => {
                    debug!(job = job_url, phase = other, "waiting for Gaia archive job");
                    if !self.poll_interval.is_zero() {
                        thread::sleep(self.poll_interval);
                    }
                }
            }
        }
        Err(XrefError::remote(
            SERVICE,
            "poll",
            format!("Job {} still running after {} polls", job_url, self.max_polls),
        ))
    }

    fn get_text(&self, url: &str, operation: &str) -> XrefResult<String> {
        let response = self.client.get(url).send().map_err(|e| {
            XrefError::remote(SERVICE, operation, format!("Network request failed: {}", e))
        })?;
        if !response.status().is_success() {
            return Err(XrefError::remote(
                SERVICE,
                operation,
                format!("HTTP request failed with status: {}", response.status()),
            ));
        }
        response.text().map_err(|e| {
            XrefError::remote(SERVICE, operation, format!("Failed to read response: {}", e))
        })
    }
}

impl ParamQuery for GaiaClient {
    fn query_params(
        &mut self,
        release: GaiaRelease,
        ids: &[String],
    ) -> XrefResult<BTreeMap<String, ParamRow>> {
        let mut numeric = Vec::with_capacity(ids.len());
        for id in ids {
            if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
                numeric.push(id.as_str());
            } else {
                warn!(release = %release, id = %id, "skipping non-numeric Gaia source id");
            }
        }

        let mut rows = BTreeMap::new();
        for batch in numeric.chunks(MAX_BATCH) {
            info!(release = %release, ids = batch.len(), "submitting Gaia archive job");
            rows.extend(self.run_job(release, &Self::source_query(release, batch))?);
        }
        Ok(rows)
    }
}

/// Splits a job result into rows keyed by `source_id`.
fn parse_sources(body: &str) -> XrefResult<BTreeMap<String, ParamRow>> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let headers = reader.headers()?.clone();
    let id_column = headers
        .iter()
        .position(|h| h.trim() == "source_id")
        .ok_or_else(|| {
            XrefError::remote(SERVICE, "result", "Result has no source_id column")
        })?;

    let mut rows = BTreeMap::new();
    for record in reader.records() {
        let record = record?;
        let Some(id) = record.get(id_column).map(str::trim).filter(|id| !id.is_empty()) else {
            continue;
        };
        let row: ParamRow = headers
            .iter()
            .zip(record.iter())
            .map(|(field, value)| (field.trim(), value.trim()))
            .filter(|(_, value)| !value.is_empty() && *value != "--")
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect();
        rows.insert(id.to_string(), row);
    }
    Ok(rows)
}
