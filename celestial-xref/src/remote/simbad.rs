//! SIMBAD cross-identification client.
//!
//! One synchronous TAP query per name: every identifier sharing an object
//! with the requested one, returned as CSV. [`SimbadClient::position`] looks
//! up the ICRS position of a name the same way.

use super::rate_limit::{RateLimitConfig, RateLimiter};
use super::{user_agent, AliasQuery};
use crate::config::XrefConfig;
use crate::error::{XrefError, XrefResult};
use crate::names::StarName;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};

pub const SIMBAD_TAP_URL: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap";

const SERVICE: &str = "SIMBAD";

/// ICRS position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPosition {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

pub struct SimbadClient {
    base_url: String,
    client: Client,
    limiter: RateLimiter,
}

impl SimbadClient {
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
        })
    }

    pub fn from_config(config: &XrefConfig) -> XrefResult<Self> {
        Self::new(
            config.simbad_url.clone(),
            config.http_timeout(),
            config.effective_rate_limit(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests sent so far.
    pub fn requests(&self) -> u64 {
        self.limiter.requests()
    }

    fn identifier_query(name: &StarName) -> String {
        format!(
            "SELECT id2.id FROM ident AS id1 JOIN ident AS id2 USING(oidref) WHERE id1.id = '{}'",
            name.to_string().replace('\'', "''")
        )
    }

    fn position_query(name: &StarName) -> String {
        format!(
            "SELECT basic.ra, basic.dec FROM basic JOIN ident ON ident.oidref = basic.oid \
             WHERE ident.id = '{}'",
            name.to_string().replace('\'', "''")
        )
    }

    /// Position of the object called `name`. `None` if SIMBAD does not know
    /// the name or holds no coordinates for it.
    pub fn position(&mut self, name: &StarName) -> XrefResult<Option<SkyPosition>> {
        info!(name = %name, "querying SIMBAD for coordinates");
        let body = self.fetch(&Self::position_query(name))?;
        parse_position(&body)
    }

    fn fetch(&mut self, query: &str) -> XrefResult<String> {
        let url = format!("{}/sync", self.base_url.trim_end_matches('/'));
        let sent = self
            .client
            .get(&url)
            .query(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "csv"),
                ("QUERY", query),
            ])
            .send();
        self.limiter.pause();

        let response = sent.map_err(|e| {
            XrefError::remote(SERVICE, "query", format!("Network request failed: {}", e))
        })?;
        if !response.status().is_success() {
            return Err(XrefError::remote(
                SERVICE,
                "query",
                format!("HTTP request failed with status: {}", response.status()),
            ));
        }
        response.text().map_err(|e| {
            XrefError::remote(SERVICE, "query", format!("Failed to read response: {}", e))
        })
    }
}

impl AliasQuery for SimbadClient {
    fn query_aliases(&mut self, name: &StarName) -> XrefResult<Vec<Vec<String>>> {
        info!(name = %name, "querying SIMBAD for identifiers");
        let body = self.fetch(&Self::identifier_query(name))?;
        let identifiers = parse_identifiers(&body)?;
        debug!(name = %name, count = identifiers.len(), "SIMBAD identifiers received");
        if identifiers.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![identifiers])
        }
    }
}

/// Reads the `id` column of a TAP CSV response, or the first column if no
/// header is named `id`.
fn parse_identifiers(body: &str) -> XrefResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());
    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("id"))
        .unwrap_or(0);
    let mut identifiers = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(id) = record.get(column).map(str::trim).filter(|id| !id.is_empty()) {
            identifiers.push(id.to_string());
        }
    }
    Ok(identifiers)
}

/// Reads the first row of a `ra,dec` TAP CSV response.
fn parse_position(body: &str) -> XrefResult<Option<SkyPosition>> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let headers = reader.headers()?.clone();
    let column = |wanted: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                XrefError::remote(SERVICE, "position", format!("Result has no {} column", wanted))
            })
    };
    let (ra_column, dec_column) = (column("ra")?, column("dec")?);

    let Some(record) = reader.records().next().transpose()? else {
        return Ok(None);
    };
    let angle = |index: usize| -> XrefResult<Option<f64>> {
        match record.get(index).map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
                XrefError::remote(SERVICE, "position", format!("Invalid angle '{}'", text))
            }),
        }
    };
    match (angle(ra_column)?, angle(dec_column)?) {
        (Some(ra_deg), Some(dec_deg)) => Ok(Some(SkyPosition { ra_deg, dec_deg })),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: &str) -> SimbadClient {
        SimbadClient::new(url, Duration::from_secs(5), RateLimitConfig::unlimited()).unwrap()
    }

    #[test]
    fn test_parse_identifiers() {
        let body = "id\n\"HD 1234\"\n\"TYC 999-1-1\"\n\"\"\n\"Gaia DR2 55\"\n";
        assert_eq!(
            parse_identifiers(body).unwrap(),
            vec!["HD 1234", "TYC 999-1-1", "Gaia DR2 55"]
        );
    }

    #[test]
    fn test_parse_identifiers_empty_result() {
        assert!(parse_identifiers("id\n").unwrap().is_empty());
    }

    #[test]
    fn test_query_escapes_quotes() {
        let name = StarName::parse("NAME Barnard's Star").unwrap();
        let query = SimbadClient::identifier_query(&name);
        assert!(query.ends_with("WHERE id1.id = 'NAME Barnard''s Star'"));
    }

    #[test]
    fn test_query_aliases_over_http() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/sync")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("LANG".into(), "ADQL".into()),
                Matcher::UrlEncoded("FORMAT".into(), "csv".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "text/csv")
            .with_body("id\nHD 1234\nHIP 42\n")
            .create();

        let mut simbad = client(&server.url());
        let found = simbad
            .query_aliases(&StarName::parse("HD 1234").unwrap())
            .unwrap();
        assert_eq!(found, vec![vec!["HD 1234".to_string(), "HIP 42".to_string()]]);
        assert_eq!(simbad.requests(), 1);
        mock.assert();
    }

    #[test]
    fn test_unknown_name_is_empty() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/sync")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("id\n")
            .create();

        let mut simbad = client(&server.url());
        let found = simbad
            .query_aliases(&StarName::parse("HD 999999").unwrap())
            .unwrap();
        assert!(found.is_empty());
        mock.assert();
    }

    #[test]
    fn test_parse_position() {
        let found = parse_position("ra,dec\n219.90205833,-60.83399269\n").unwrap();
        assert_eq!(
            found,
            Some(SkyPosition {
                ra_deg: 219.90205833,
                dec_deg: -60.83399269
            })
        );
        assert_eq!(parse_position("ra,dec\n").unwrap(), None);
        assert_eq!(parse_position("ra,dec\n,\n").unwrap(), None);
        assert!(parse_position("ra,dec\nabc,1\n").is_err());
        assert!(parse_position("id\nHD 1\n").is_err());
    }

    #[test]
    fn test_position_over_http() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/sync")
            .match_query(Matcher::UrlEncoded(
                "QUERY".into(),
                SimbadClient::position_query(&StarName::parse("HIP 71683").unwrap()),
            ))
            .with_status(200)
            .with_body("ra,dec\n219.90205833,-60.83399269\n")
            .create();

        let mut simbad = client(&server.url());
        let position = simbad
            .position(&StarName::parse("HIP 71683").unwrap())
            .unwrap()
            .unwrap();
        assert!((position.ra_deg - 219.902).abs() < 1e-3);
        assert!((position.dec_deg + 60.834).abs() < 1e-3);
        mock.assert();
    }

    #[test]
    fn test_http_error_is_recoverable() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/sync")
            .match_query(Matcher::Any)
            .with_status(503)
            .create();

        let mut simbad = client(&server.url());
        let err = simbad
            .query_aliases(&StarName::parse("HD 1").unwrap())
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("HTTP request failed"));
        mock.assert();
    }
}
