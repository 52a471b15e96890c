//! Reference file maintenance: rebuild and stats.

use celestial_xref::{AliasStore, CatalogType, ParamCache, XrefConfig};

pub fn rebuild(config: &XrefConfig) -> anyhow::Result<()> {
    let mut store = AliasStore::open(config.alias_path())?;
    let before = store.len();
    store.save()?;
    println!("{:?}", store.path());
    println!("  Records:  {} -> {}", before, store.len());
    println!("  Merged:   {}", store.last_merge_count());

    for release in config.releases()? {
        let mut cache = ParamCache::with_path(release, config.param_path(release));
        cache.load()?;
        if cache.is_empty() && !cache.path().exists() {
            continue;
        }
        let before = cache.len();
        cache.save()?;
        println!("{:?}", cache.path());
        println!("  Entries:  {} -> {}", before, cache.len());
        println!("  Merged:   {}", cache.last_merge_count());
    }
    Ok(())
}

pub fn stats(config: &XrefConfig) -> anyhow::Result<()> {
    let mut store = AliasStore::open(config.alias_path())?;
    let index_size = store.rebuild_index()?.len();
    let pending = store.last_merge_count();

    println!("Alias reference: {:?}", store.path());
    println!("  Stars:           {}", store.len());
    println!("  Aliases:         {}", index_size);
    if pending > 0 {
        println!("  Pending merges:  {} (run `xref rebuild`)", pending);
    }
    let singletons = store.records().iter().filter(|s| s.len() == 1).count();
    println!("  Unresolved:      {}", singletons);
    for catalog in CatalogType::ALL {
        let ids = store.known_ids(catalog)?;
        if !ids.is_empty() {
            println!("  {:<16} {}", catalog.tag(), ids.len());
        }
    }

    for release in config.releases()? {
        let mut cache = ParamCache::with_path(release, config.param_path(release));
        cache.load()?;
        println!("Gaia {} parameters: {:?}", release, cache.path());
        println!("  Entries:         {}", cache.len());
        println!("  Empty:           {}", cache.empty_count());
    }
    Ok(())
}
