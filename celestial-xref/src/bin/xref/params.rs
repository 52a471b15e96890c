//! Gaia parameter subcommands.

use crate::cli::{BatchUpdateArgs, ParamsArgs};
use celestial_xref::{GaiaRelease, ParamResolver, XrefConfig};
use std::time::Instant;

pub fn run(args: &ParamsArgs, config: &XrefConfig) -> anyhow::Result<()> {
    let mut resolver = ParamResolver::from_config(config)?;

    for name in &args.names {
        println!("{}", name);
        if args.raw {
            let rows = resolver.get_rows(name.as_str())?;
            if rows.is_empty() {
                println!("  (no Gaia aliases)");
            }
            for (gaia_name, measurements) in &rows {
                println!("  {}", gaia_name);
                if measurements.is_empty() {
                    println!("    (no data)");
                }
                for (i, row) in measurements.iter().enumerate() {
                    if measurements.len() > 1 {
                        println!("    measurement {}", i + 1);
                    }
                    for (field, value) in row.iter() {
                        println!("    {:<24} {}", field, value);
                    }
                }
            }
        } else {
            let params = resolver.get_params(name.as_str())?;
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
    }
    Ok(())
}

pub fn batch_update(args: &BatchUpdateArgs, config: &XrefConfig) -> anyhow::Result<()> {
    let release = GaiaRelease::from_number(args.release)?;
    let mut resolver = ParamResolver::from_config(config)?;
    if resolver.cache(release).is_none() {
        anyhow::bail!("Gaia {} is not among the configured releases", release);
    }

    let start = Instant::now();
    let added = if args.ids.is_empty() {
        resolver.batch_update_known(release)?
    } else {
        resolver.batch_update(release, &args.ids)?
    };

    println!("Batch update complete ({})", release);
    println!("  Ids added:  {}", added);
    if let Some(cache) = resolver.cache(release) {
        println!("  Cached:     {}", cache.len());
        println!("  Empty:      {}", cache.empty_count());
        println!("  File:       {:?}", cache.path());
    }
    println!("  Time:       {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
