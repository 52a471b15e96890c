//! Positional lookups: SIMBAD coordinates and Gaia cone searches.

use crate::cli::{ConeArgs, PositionArgs};
use celestial_xref::{GaiaClient, GaiaRelease, SimbadClient, StarName, XrefConfig};

pub fn position(args: &PositionArgs, config: &XrefConfig) -> anyhow::Result<()> {
    let mut simbad = SimbadClient::from_config(config)?;
    for name in &args.names {
        let star = StarName::parse(name)?;
        match simbad.position(&star)? {
            Some(position) => println!(
                "{:<32} {:>12.6} {:>+12.6}",
                star.to_string(),
                position.ra_deg,
                position.dec_deg
            ),
            None => println!("{:<32} (no coordinates)", star.to_string()),
        }
    }
    Ok(())
}

pub fn cone(args: &ConeArgs, config: &XrefConfig) -> anyhow::Result<()> {
    let release = GaiaRelease::from_number(args.release)?;
    let mut gaia = GaiaClient::from_config(config)?;
    let sources = gaia.cone(release, args.ra, args.dec, args.radius)?;

    println!(
        "{} sources within {} deg of ({}, {})",
        sources.len(),
        args.radius,
        args.ra,
        args.dec
    );
    for (id, row) in &sources {
        println!(
            "  {} {}{}  ra {}  dec {}  parallax {}",
            release.catalog_type().tag(),
            release.catalog_type().separator(),
            id,
            row.get("ra").unwrap_or("-"),
            row.get("dec").unwrap_or("-"),
            row.get("parallax").unwrap_or("-")
        );
    }
    Ok(())
}
