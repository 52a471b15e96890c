//! Accepted catalog types and the Gaia data releases.
//!
//! [`CatalogType`] is a closed set. Its declaration order is the preference
//! ordering used to pick a star's canonical name, so the derived `Ord` is
//! load-bearing: do not reorder variants casually.

use crate::error::{XrefError, XrefResult};
use std::fmt;
use std::str::FromStr;

/// A catalog a star identifier can belong to, in canonical-name preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CatalogType {
    Hip,
    Hd,
    Hr,
    Gj,
    Bd,
    Cd,
    Tyc,
    TwoMass,
    GaiaDr3,
    GaiaDr2,
    GaiaDr1,
    Wds,
    Kepler,
    K2,
    Tres,
    Xo,
    Hats,
    Ogle,
    Bps,
    Ngc,
    Ids,
    Star,
    DoubleStar,
    VariableStar,
    Name,
}

impl CatalogType {
    /// Every accepted type, in preference order.
    pub const ALL: [CatalogType; 25] = [
        Self::Hip,
        Self::Hd,
        Self::Hr,
        Self::Gj,
        Self::Bd,
        Self::Cd,
        Self::Tyc,
        Self::TwoMass,
        Self::GaiaDr3,
        Self::GaiaDr2,
        Self::GaiaDr1,
        Self::Wds,
        Self::Kepler,
        Self::K2,
        Self::Tres,
        Self::Xo,
        Self::Hats,
        Self::Ogle,
        Self::Bps,
        Self::Ngc,
        Self::Ids,
        Self::Star,
        Self::DoubleStar,
        Self::VariableStar,
        Self::Name,
    ];

    /// Lowercase key used in configuration and structured input, e.g. `"gaia dr2"`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Hip => "hip",
            Self::Hd => "hd",
            Self::Hr => "hr",
            Self::Gj => "gj",
            Self::Bd => "bd",
            Self::Cd => "cd",
            Self::Tyc => "tyc",
            Self::TwoMass => "2mass",
            Self::GaiaDr3 => "gaia dr3",
            Self::GaiaDr2 => "gaia dr2",
            Self::GaiaDr1 => "gaia dr1",
            Self::Wds => "wds",
            Self::Kepler => "kepler",
            Self::K2 => "k2",
            Self::Tres => "tres",
            Self::Xo => "xo",
            Self::Hats => "hats",
            Self::Ogle => "ogle",
            Self::Bps => "bps",
            Self::Ngc => "ngc",
            Self::Ids => "ids",
            Self::Star => "*",
            Self::DoubleStar => "**",
            Self::VariableStar => "v*",
            Self::Name => "name",
        }
    }

    /// Display tag as the cross-identification catalog writes it.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Hip => "HIP",
            Self::Hd => "HD",
            Self::Hr => "HR",
            Self::Gj => "GJ",
            Self::Bd => "BD",
            Self::Cd => "CD",
            Self::Tyc => "TYC",
            Self::TwoMass => "2MASS",
            Self::GaiaDr3 => "Gaia DR3",
            Self::GaiaDr2 => "Gaia DR2",
            Self::GaiaDr1 => "Gaia DR1",
            Self::Wds => "WDS",
            Self::Kepler => "Kepler",
            Self::K2 => "K2",
            Self::Tres => "TrES",
            Self::Xo => "XO",
            Self::Hats => "HATS",
            Self::Ogle => "OGLE",
            Self::Bps => "BPS",
            Self::Ngc => "NGC",
            Self::Ids => "IDS",
            Self::Star => "*",
            Self::DoubleStar => "**",
            Self::VariableStar => "V*",
            Self::Name => "NAME",
        }
    }

    /// Text between the tag and the identifier.
    ///
    /// Durchmusterung zones carry their sign directly (`BD+43 44`) and the
    /// transit surveys are hyphenated (`Kepler-22`).
    pub fn separator(&self) -> &'static str {
        match self {
            Self::Bd | Self::Cd => "",
            Self::Kepler | Self::K2 | Self::Tres | Self::Xo | Self::Hats | Self::Ogle => "-",
            _ => " ",
        }
    }

    /// Whether `rest`, the text after this type's tag and separator, can
    /// begin an identifier. Unseparated tags need a zone sign or a digit so
    /// that `BDS 7045` is not read as a Durchmusterung name.
    pub(crate) fn starts_id(&self, rest: &str) -> bool {
        if !self.separator().is_empty() {
            return true;
        }
        match rest.trim_start().chars().next() {
            Some(c) => c == '+' || c == '-' || c.is_ascii_digit(),
            None => true,
        }
    }

    /// The Gaia release this catalog type identifies, if any.
    pub fn gaia_release(&self) -> Option<GaiaRelease> {
        match self {
            Self::GaiaDr1 => Some(GaiaRelease::Dr1),
            Self::GaiaDr2 => Some(GaiaRelease::Dr2),
            Self::GaiaDr3 => Some(GaiaRelease::Dr3),
            _ => None,
        }
    }

    /// Types ordered by descending tag length, the order name parsing tries them in.
    pub(crate) fn by_tag_length() -> Vec<CatalogType> {
        let mut types = Self::ALL.to_vec();
        types.sort_by(|a, b| {
            let total = |t: &CatalogType| t.tag().len() + t.separator().len();
            total(b).cmp(&total(a)).then(a.cmp(b))
        });
        types
    }
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CatalogType {
    type Err = XrefError;

    fn from_str(s: &str) -> XrefResult<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.key() == wanted)
            .ok_or_else(|| XrefError::unknown_catalog_type(s))
    }
}

/// A Gaia data release served by a parameter cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GaiaRelease {
    Dr1,
    Dr2,
    Dr3,
}

impl GaiaRelease {
    pub const ALL: [GaiaRelease; 3] = [Self::Dr1, Self::Dr2, Self::Dr3];

    pub fn number(&self) -> u8 {
        match self {
            Self::Dr1 => 1,
            Self::Dr2 => 2,
            Self::Dr3 => 3,
        }
    }

    pub fn from_number(number: u8) -> XrefResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.number() == number)
            .ok_or_else(|| XrefError::Config(format!("unsupported Gaia data release {}", number)))
    }

    pub fn catalog_type(&self) -> CatalogType {
        match self {
            Self::Dr1 => CatalogType::GaiaDr1,
            Self::Dr2 => CatalogType::GaiaDr2,
            Self::Dr3 => CatalogType::GaiaDr3,
        }
    }

    /// Reference string attached to every parameter taken from this release.
    pub fn reference(&self) -> String {
        format!("Gaia Data Release {}", self.number())
    }

    /// Name of this release's parameter reference file.
    pub fn ref_file_name(&self) -> String {
        format!("GaiaDR{}_ref.csv", self.number())
    }

    /// Source table on the Gaia archive.
    pub fn source_table(&self) -> String {
        format!("gaiadr{}.gaia_source", self.number())
    }
}

impl fmt::Display for GaiaRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DR{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_order_matches_all() {
        let mut sorted = CatalogType::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, CatalogType::ALL.to_vec());
        assert!(CatalogType::Hip < CatalogType::Hd);
        assert!(CatalogType::GaiaDr3 < CatalogType::GaiaDr2);
        assert!(CatalogType::Name > CatalogType::Star);
    }

    #[test]
    fn test_keys_round_trip() {
        for t in CatalogType::ALL {
            assert_eq!(t.key().parse::<CatalogType>().unwrap(), t);
        }
        assert_eq!("Gaia DR2".parse::<CatalogType>().unwrap(), CatalogType::GaiaDr2);
    }

    #[test]
    fn test_unknown_key() {
        let err = "ucac4".parse::<CatalogType>().unwrap_err();
        assert!(matches!(err, XrefError::UnknownCatalogType { .. }));
    }

    #[test]
    fn test_longest_tags_tried_first() {
        let order = CatalogType::by_tag_length();
        let pos = |t| order.iter().position(|x| *x == t).unwrap();
        assert!(pos(CatalogType::DoubleStar) < pos(CatalogType::Star));
        assert!(pos(CatalogType::GaiaDr2) < pos(CatalogType::Hd));
        assert!(pos(CatalogType::Kepler) < pos(CatalogType::K2));
    }

    #[test]
    fn test_gaia_release_mapping() {
        for release in GaiaRelease::ALL {
            assert_eq!(release.catalog_type().gaia_release(), Some(release));
        }
        assert_eq!(CatalogType::Hd.gaia_release(), None);
        assert_eq!(GaiaRelease::from_number(2).unwrap(), GaiaRelease::Dr2);
        assert!(GaiaRelease::from_number(7).is_err());
    }

    #[test]
    fn test_release_strings() {
        assert_eq!(GaiaRelease::Dr2.reference(), "Gaia Data Release 2");
        assert_eq!(GaiaRelease::Dr1.ref_file_name(), "GaiaDR1_ref.csv");
        assert_eq!(GaiaRelease::Dr3.source_table(), "gaiadr3.gaia_source");
    }
}
