//! Raw Gaia rows → uniform [`ParamSet`]s.
//!
//! - `parallax` gets the release's zero-point offset, then `dist` (pc) is
//!   derived from the corrected value when it is positive
//! - `<field>_error` becomes the error of `<field>` from the same
//!   measurement, converted to the field's unit when the two differ
//! - units come from a fixed table, the reference names the release
//! - bookkeeping fields are dropped

use super::row::ParamRow;
use super::value::{ParamRecord, ParamSet, ParamValue};
use crate::config::XrefConfig;
use crate::error::XrefResult;
use crate::names::GaiaRelease;
use std::collections::{BTreeMap, BTreeSet};

/// Fields carried for bookkeeping only.
pub const DEFAULT_DROPPED_FIELDS: &[&str] =
    &["ra", "dec", "ref_epoch", "duplicated_source", "source_id"];

/// Zero-point parallax offset for DR2, in mas.
pub const DR2_PARALLAX_OFFSET_MAS: f64 = 0.029;

const ERROR_SUFFIX: &str = "_error";

/// Unit of a raw Gaia field.
pub fn field_units(field: &str) -> Option<&'static str> {
    let units = match field {
        "ra" | "dec" => "degrees",
        "ra_error" | "dec_error" => "mas",
        "ref_epoch" => "Julian Years",
        "parallax" | "parallax_error" => "mas",
        "pmra" | "pmra_error" | "pmdec" | "pmdec_error" => "mas/year",
        "phot_g_mean_flux" | "phot_g_mean_flux_error" => "e-/s",
        "phot_g_mean_mag" => "mag",
        "radial_velocity" | "radial_velocity_error" => "km/s",
        "teff_val" | "teff_gspphot" => "K",
        "dist" | "dist_error" => "[pc]",
        _ => return None,
    };
    Some(units)
}

fn milliarcseconds_per(unit: &str) -> Option<f64> {
    match unit {
        "mas" => Some(1.0),
        "arcsec" => Some(1.0e3),
        "degrees" => Some(3.6e6),
        _ => None,
    }
}

/// Converts between angular units. `None` if either unit is not angular.
pub fn convert_angle(value: f64, from: &str, to: &str) -> Option<f64> {
    if from == to {
        return Some(value);
    }
    Some(value * milliarcseconds_per(from)? / milliarcseconds_per(to)?)
}

fn output_name(field: &str) -> &str {
    match field {
        "teff_val" | "teff_gspphot" => "teff",
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    parallax_offsets: BTreeMap<GaiaRelease, f64>,
    dropped: BTreeSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            parallax_offsets: BTreeMap::from([(GaiaRelease::Dr2, DR2_PARALLAX_OFFSET_MAS)]),
            dropped: DEFAULT_DROPPED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &XrefConfig) -> XrefResult<Self> {
        let mut normalizer = Self::new().with_dropped_fields(config.dropped_fields.iter().cloned());
        normalizer.parallax_offsets.clear();
        for (&number, &offset) in &config.parallax_offsets_mas {
            normalizer.parallax_offsets.insert(GaiaRelease::from_number(number)?, offset);
        }
        Ok(normalizer)
    }

    pub fn with_parallax_offset(mut self, release: GaiaRelease, offset_mas: f64) -> Self {
        self.parallax_offsets.insert(release, offset_mas);
        self
    }

    pub fn with_dropped_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dropped = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Offset added to `release` parallaxes, in mas.
    pub fn parallax_offset(&self, release: GaiaRelease) -> f64 {
        self.parallax_offsets.get(&release).copied().unwrap_or(0.0)
    }

    /// Parameters from every measurement of one source.
    pub fn normalize_all(&self, release: GaiaRelease, rows: &[ParamRow]) -> ParamSet {
        let mut params = ParamSet::new();
        for row in rows {
            params.union(&self.normalize(release, row));
        }
        params
    }

    /// Parameters from a single measurement.
    pub fn normalize(&self, release: GaiaRelease, row: &ParamRow) -> ParamSet {
        let reference = release.reference();
        let mut params = ParamSet::new();

        for (field, raw) in row.iter() {
            if field.ends_with(ERROR_SUFFIX) || self.dropped.contains(field) {
                continue;
            }

            let mut value = ParamValue::parse(raw);
            if field == "parallax" {
                if let Some(parallax) = value.as_f64() {
                    let corrected = parallax + self.parallax_offset(release);
                    value = ParamValue::Float(corrected);
                    if corrected > 0.0 {
                        let mut dist =
                            ParamRecord::new(1000.0 / corrected).with_reference(reference.clone());
                        if let Some(units) = field_units("dist") {
                            dist = dist.with_units(units);
                        }
                        params.insert("dist", dist);
                    }
                }
            }

            let mut record = ParamRecord::new(value).with_reference(reference.clone());
            if let Some(error) = row.get(&format!("{}{}", field, ERROR_SUFFIX)) {
                record.error = Some(convert_error(field, error));
            }
            if let Some(units) = field_units(field) {
                record = record.with_units(units);
            }
            params.insert(output_name(field), record);
        }
        params
    }
}

fn convert_error(field: &str, raw: &str) -> ParamValue {
    let error = ParamValue::parse(raw);
    let error_field = format!("{}{}", field, ERROR_SUFFIX);
    match (field_units(&error_field), field_units(field), error.as_f64()) {
        (Some(from), Some(to), Some(e)) if from != to => convert_angle(e, from, to)
            .map(ParamValue::Float)
            .unwrap_or(error),
        _ => error,
    }
}
