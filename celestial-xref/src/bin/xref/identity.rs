//! Name resolution subcommands.

use crate::cli::{AliasesArgs, ResolveArgs};
use celestial_xref::{AliasSet, IdentityResolver, StarName, XrefConfig};

pub fn resolve(args: &ResolveArgs, config: &XrefConfig) -> anyhow::Result<()> {
    let mut config = config.clone();
    config.check_bad_names |= args.check_bad_names;
    let mut resolver = IdentityResolver::from_config(&config)?;

    for name in &args.names {
        let aliases = resolver.resolve(name.as_str())?;
        print_aliases(name, &aliases)?;
    }
    eprintln!("SIMBAD queries: {}", resolver.remote_queries());
    Ok(())
}

pub fn aliases(args: &AliasesArgs, config: &XrefConfig) -> anyhow::Result<()> {
    let partial = args
        .aliases
        .iter()
        .map(|alias| StarName::parse(alias))
        .collect::<Result<AliasSet, _>>()?;
    let mut resolver = IdentityResolver::from_config(config)?;
    let aliases = resolver.resolve_aliases(&partial)?;
    print_aliases(&partial.to_string(), &aliases)?;
    eprintln!("SIMBAD queries: {}", resolver.remote_queries());
    Ok(())
}

fn print_aliases(query: &str, aliases: &AliasSet) -> anyhow::Result<()> {
    println!("{}", query);
    println!("  canonical: {}", aliases.canonical_name()?);
    println!("  handle:    {}", aliases.handle()?);
    for alias in aliases.names() {
        println!("  {}", alias);
    }
    Ok(())
}
