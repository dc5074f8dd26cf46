use anyhow::Result;

use crate::api::{CdmApi, Format};
use crate::collection::scrape_collection;
use crate::config::ScraperConfig;
use crate::layout;
use crate::parse;
use crate::sink::Sink;
use crate::stats::ScrapeStats;

/// Scrapes the given collections one after the other.
pub fn scrape_collections<A, S, I>(
    config: &ScraperConfig,
    api: &A,
    sink: &S,
    aliases: I,
) -> Result<ScrapeStats>
where
    A: CdmApi,
    S: Sink,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut total = ScrapeStats::default();
    for alias in aliases {
        let alias = alias.as_ref();
        match scrape_collection(config, api, sink, alias) {
            Ok(stats) => total += stats,
            Err(e) => {
                log::error!("{alias} stopped: {e:#}");
                return Err(e.context(format!("Couldn't scrape collection {alias}")));
            }
        }
    }
    Ok(total)
}

/// Scrapes every collection the server lists, except `config.exclude`.
///
/// The collection list is kept as `Collections_List.xml` at the repository
/// root and only fetched when missing.
pub fn scrape_repository<A, S>(config: &ScraperConfig, api: &A, sink: &S) -> Result<ScrapeStats>
where
    A: CdmApi,
    S: Sink,
{
    let aliases = repository_aliases(config, api, sink)?;
    log::info!("{} collections to scrape", aliases.len());
    scrape_collections(config, api, sink, aliases)
}

/// Aliases of the repository's collections, minus the excluded ones.
pub fn repository_aliases<A, S>(config: &ScraperConfig, api: &A, sink: &S) -> Result<Vec<String>>
where
    A: CdmApi,
    S: Sink,
{
    sink.create_dir(&config.repo_dir)?;
    let path = config
        .repo_dir
        .join(layout::file_name(layout::COLLECTIONS_LIST, Format::Xml.ext()));

    let list = if path.is_file() {
        fs_err::read_to_string(&path)?
    } else {
        let list = api.collections()?;
        sink.write_text(
            &config.repo_dir,
            layout::COLLECTIONS_LIST,
            Format::Xml.ext(),
            &list,
        )?;
        log::info!("{} written", path.display());
        list
    };

    Ok(parse::collection_aliases(&list)?
        .into_iter()
        .filter(|alias| !config.exclude.contains(alias))
        .collect())
}
