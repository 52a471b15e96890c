//! A single `(catalog type, identifier)` pair and its text forms.
//!
//! The text form is `<tag><separator><id>`, for example `HD 1234`,
//! `BD+43 44`, `Gaia DR2 55` or `Kepler-22`. Parsing is case-insensitive on
//! the tag and collapses runs of whitespace inside the identifier, so every
//! spelling of one alias maps to the same [`StarName`].

use super::catalog::CatalogType;
use crate::error::{XrefError, XrefResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StarName {
    pub catalog: CatalogType,
    pub id: String,
}

impl StarName {
    /// Builds a name from an already split pair, normalizing the identifier.
    pub fn new(catalog: CatalogType, id: impl AsRef<str>) -> XrefResult<Self> {
        let id = normalize_id(id.as_ref());
        if id.is_empty() {
            return Err(XrefError::malformed_name(
                format!("{}{}", catalog.tag(), catalog.separator()),
                "missing identifier",
            ));
        }
        Ok(Self { catalog, id })
    }

    /// Parses the full text form, e.g. `"HIP 71683"`.
    pub fn parse(text: &str) -> XrefResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(XrefError::malformed_name(text, "empty name"));
        }
        for catalog in CatalogType::by_tag_length() {
            let prefix = format!("{}{}", catalog.tag(), catalog.separator());
            let matches = trimmed
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(&prefix));
            if matches && catalog.starts_id(&trimmed[prefix.len()..]) {
                return Self::new(catalog, &trimmed[prefix.len()..]);
            }
        }
        if trimmed.contains(|c: char| c.is_whitespace() || c == '-' || c == '+') {
            Err(XrefError::unknown_catalog_type(trimmed))
        } else {
            Err(XrefError::malformed_name(trimmed, "no catalog tag"))
        }
    }

    /// Path- and URL-safe form used as the stable handle for a star.
    pub fn handle(&self) -> String {
        self.to_string()
            .replace(' ', "_")
            .replace('*', "star")
            .replace('+', "plus")
            .replace("2MASS", "TWOMASS")
    }

    /// Inverts [`handle`](Self::handle).
    ///
    /// Best effort: an identifier that itself contains `star` or `plus` does
    /// not survive the round trip.
    pub fn from_handle(handle: &str) -> XrefResult<Self> {
        let text = handle
            .replace("TWOMASS", "2MASS")
            .replace("star", "*")
            .replace('_', " ")
            .replace("plus", "+");
        Self::parse(&text)
    }
}

impl fmt::Display for StarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.catalog.tag(),
            self.catalog.separator(),
            self.id
        )
    }
}

impl FromStr for StarName {
    type Err = XrefError;

    fn from_str(s: &str) -> XrefResult<Self> {
        Self::parse(s)
    }
}

fn normalize_id(id: &str) -> String {
    id.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Anything a caller may hand the resolvers as a star name.
///
/// Raw strings, structured `(type, id)` pairs and ready-made [`StarName`]s all
/// normalize through the same path.
pub trait IntoStarName {
    fn into_star_name(self) -> XrefResult<StarName>;
}

impl IntoStarName for StarName {
    fn into_star_name(self) -> XrefResult<StarName> {
        Ok(self)
    }
}

impl IntoStarName for &StarName {
    fn into_star_name(self) -> XrefResult<StarName> {
        Ok(self.clone())
    }
}

impl IntoStarName for &str {
    fn into_star_name(self) -> XrefResult<StarName> {
        StarName::parse(self)
    }
}

impl IntoStarName for String {
    fn into_star_name(self) -> XrefResult<StarName> {
        StarName::parse(&self)
    }
}

impl IntoStarName for &String {
    fn into_star_name(self) -> XrefResult<StarName> {
        StarName::parse(self)
    }
}

impl<S: AsRef<str>> IntoStarName for (CatalogType, S) {
    fn into_star_name(self) -> XrefResult<StarName> {
        StarName::new(self.0, self.1)
    }
}

impl<S: AsRef<str>> IntoStarName for (&str, S) {
    fn into_star_name(self) -> XrefResult<StarName> {
        StarName::new(self.0.parse()?, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> StarName {
        StarName::parse(text).unwrap()
    }

    #[test]
    fn test_parse_common_catalogs() {
        assert_eq!(name("HD 1234"), StarName::new(CatalogType::Hd, "1234").unwrap());
        assert_eq!(name("hip 71683").catalog, CatalogType::Hip);
        assert_eq!(name("Gaia DR2 5853498713190525696").id, "5853498713190525696");
        assert_eq!(name("TYC 9007-5849-1").id, "9007-5849-1");
        assert_eq!(name("2MASS J14392944-6050023").catalog, CatalogType::TwoMass);
    }

    #[test]
    fn test_parse_unspaced_and_hyphenated() {
        let bd = name("BD+43 44");
        assert_eq!(bd.catalog, CatalogType::Bd);
        assert_eq!(bd.id, "+43 44");
        let kepler = name("Kepler-22");
        assert_eq!(kepler.catalog, CatalogType::Kepler);
        assert_eq!(kepler.id, "22");
        assert_eq!(name("K2-18").catalog, CatalogType::K2);
    }

    #[test]
    fn test_unseparated_tag_needs_zone_or_number() {
        assert_eq!(name("CD-38 245").catalog, CatalogType::Cd);
        assert_eq!(name("BD 12 3").id, "12 3");
        assert!(matches!(
            StarName::parse("BDS 7045"),
            Err(XrefError::UnknownCatalogType { .. })
        ));
        assert!(matches!(
            StarName::parse("CDFS 123"),
            Err(XrefError::UnknownCatalogType { .. })
        ));
        assert!(matches!(
            StarName::parse("BD"),
            Err(XrefError::MalformedName { .. })
        ));
    }

    #[test]
    fn test_parse_star_prefixes() {
        assert_eq!(name("* alf Cen").catalog, CatalogType::Star);
        assert_eq!(name("** STF 2272").catalog, CatalogType::DoubleStar);
        assert_eq!(name("V* V645 Cen").catalog, CatalogType::VariableStar);
        assert_eq!(name("NAME Proxima Centauri").id, "Proxima Centauri");
    }

    #[test]
    fn test_whitespace_normalized() {
        assert_eq!(name("  HD    1234 "), name("HD 1234"));
        assert_eq!(name("* alf   Cen").id, "alf Cen");
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["HD 1234", "BD+43 44", "Kepler-22", "Gaia DR3 42", "* alf Cen"] {
            assert_eq!(name(text).to_string(), text);
        }
    }

    #[test]
    fn test_unknown_and_malformed() {
        assert!(matches!(
            StarName::parse("UCAC4 123-456"),
            Err(XrefError::UnknownCatalogType { .. })
        ));
        assert!(matches!(
            StarName::parse("foo"),
            Err(XrefError::MalformedName { .. })
        ));
        assert!(matches!(
            StarName::parse("HD "),
            Err(XrefError::MalformedName { .. })
        ));
        assert!(matches!(StarName::parse(""), Err(XrefError::MalformedName { .. })));
    }

    #[test]
    fn test_handle() {
        assert_eq!(name("HD 1234").handle(), "HD_1234");
        assert_eq!(name("BD+43 44").handle(), "BDplus43_44");
        assert_eq!(name("2MASS J1439-6050").handle(), "TWOMASS_J1439-6050");
        assert_eq!(name("* alf Cen").handle(), "star_alf_Cen");
        assert_eq!(StarName::from_handle("BDplus43_44").unwrap(), name("BD+43 44"));
        assert_eq!(
            StarName::from_handle("TWOMASS_J1439-6050").unwrap(),
            name("2MASS J1439-6050")
        );
    }

    #[test]
    fn test_into_star_name_inputs_agree() {
        let expected = name("HD 1234");
        assert_eq!("HD 1234".into_star_name().unwrap(), expected);
        assert_eq!(String::from("hd 1234").into_star_name().unwrap(), expected);
        assert_eq!((CatalogType::Hd, "1234").into_star_name().unwrap(), expected);
        assert_eq!(("hd", "1234").into_star_name().unwrap(), expected);
        assert_eq!((&expected).into_star_name().unwrap(), expected);
        assert!(("ucac4", "1").into_star_name().is_err());
    }
}
