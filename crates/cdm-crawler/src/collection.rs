use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;

use crate::api::{CdmApi, Format};
use crate::config::{OnError, ScraperConfig};
use crate::fetch::{skip_or_fail, Fetcher};
use crate::layout;
use crate::parse;
use crate::probe::{self, Lookup};
use crate::sink::Sink;
use crate::snapshot::{ArtifactCache, Snapshot};
use crate::stats::{Outcome, ScrapeStats};
use crate::walker::TreeWalker;

/// Mirrors one collection below `config.repo_dir/<alias>`, fetching only
/// what is missing.
///
/// Steps run in order: collection level metadata, paginated root listings,
/// directory snapshot, root objects, compound children. Running it again after
/// an interruption fills the remaining gaps.
pub fn scrape_collection<A, S>(
    config: &ScraperConfig,
    api: &A,
    sink: &S,
    alias: &str,
) -> Result<ScrapeStats>
where
    A: CdmApi,
    S: Sink,
{
    log::info!("starting {alias}");
    let alias_dir = config.repo_dir.join(alias);
    sink.create_dir(&alias_dir)?;

    let mut stats = ScrapeStats::default();
    let live = LiveDir {
        config,
        sink,
        alias,
        path: &alias_dir,
    };
    collection_metadata(&live, api, &mut stats)?;
    root_listings(&live, api, &mut stats)?;

    let snapshot = Snapshot::capture(&alias_dir)?;
    log::debug!("{alias} snapshot of {} files", snapshot.len());
    let records = root_records(config, alias, &alias_dir, &mut stats)?;

    let cache = ArtifactCache::new(snapshot, config.snapshot);
    let fetcher = Fetcher::new(config, api, sink, alias, cache);
    let mut walker = TreeWalker::new(fetcher, alias_dir);
    walker.root_objects(&records)?;
    walker.compound_objects()?;
    stats += walker.into_stats();

    log::info!("finished {alias}: {stats}");
    Ok(stats)
}

/// Start positions of the root listing pages of a collection holding `total`
/// records, clamped to `max_start`.
pub fn listing_starts(total: usize, chunk_size: usize, max_start: usize) -> Vec<usize> {
    let chunk_size = chunk_size.max(1);
    let num_chunks = total.div_ceil(chunk_size);
    let reachable = (max_start / chunk_size).saturating_add(1);
    let mut starts = Vec::with_capacity(num_chunks.min(reachable));
    for num in 0..num_chunks {
        let start = num
            .saturating_mul(chunk_size)
            .saturating_add(1)
            .min(max_start);
        if starts.last() != Some(&start) {
            starts.push(start);
        }
        if start == max_start {
            break;
        }
    }
    starts
}

fn collection_metadata<A, S>(dir: &LiveDir<'_, S>, api: &A, stats: &mut ScrapeStats) -> Result<()>
where
    A: CdmApi,
    S: Sink,
{
    let alias = dir.alias;
    stats.record(dir.fetch_if_absent(layout::COLLECTION_TOTAL_RECS, Format::Xml, || {
        api.collection_total_recs(alias)
    })?);
    stats.record(dir.fetch_if_absent(layout::COLLECTION_METADATA, Format::Xml, || {
        api.collection_metadata(alias)
    })?);
    for format in [Format::Json, Format::Xml] {
        stats.record(dir.fetch_if_absent(layout::COLLECTION_FIELDS, format, || {
            api.collection_fields(alias, format)
        })?);
    }
    Ok(())
}

fn root_listings<A, S>(dir: &LiveDir<'_, S>, api: &A, stats: &mut ScrapeStats) -> Result<()>
where
    A: CdmApi,
    S: Sink,
{
    let (config, alias) = (dir.config, dir.alias);
    let name = layout::file_name(layout::COLLECTION_TOTAL_RECS, Format::Xml.ext());
    let total_recs = dir.path.join(&name);
    let total = match fs_err::read_to_string(&total_recs)
        .map_err(anyhow::Error::from)
        .and_then(|xml| parse::total_recs(&xml))
    {
        Ok(total) => total,
        Err(e) => {
            return skip_or_fail(config.on_xml_error, alias, &name, e, stats);
        }
    };

    for start in listing_starts(total, config.chunk_size, config.max_start) {
        let stem = layout::listing_stem(start);
        for format in [Format::Json, Format::Xml] {
            stats.record(dir.fetch_if_absent(&stem, format, || {
                api.records(alias, start, config.chunk_size, format)
            })?);
        }
    }
    Ok(())
}

/// A collection directory checked live, for the artifacts fetched before the
/// snapshot is taken.
struct LiveDir<'a, S> {
    config: &'a ScraperConfig,
    sink: &'a S,
    alias: &'a str,
    path: &'a Path,
}

impl<'a, S: Sink> LiveDir<'a, S> {
    fn fetch_if_absent<F>(&self, stem: &str, format: Format, fetch: F) -> Result<Outcome>
    where
        F: FnOnce() -> Result<String>,
    {
        let alias = self.alias;
        let name = layout::file_name(stem, format.ext());
        if self.path.join(&name).is_file() {
            return Ok(Outcome::Cached);
        }

        let text = match fetch() {
            Ok(text) => text,
            Err(e) => {
                return match self.config.on_dl_error {
                    OnError::SkipAndLog => {
                        log::warn!("{alias} {name} skipped, download got: {e}");
                        Ok(Outcome::Failed)
                    }
                    OnError::Fail => Err(e.context(format!("Couldn't download {alias} {name}"))),
                }
            }
        };

        match probe::lookup(&text, format) {
            Lookup::NotFound => {
                log::warn!("{alias} {name} is 404");
                Ok(Outcome::NotFound)
            }
            Lookup::Found => {
                self.sink.write_text(self.path, stem, format.ext(), &text)?;
                log::info!("{alias} {name} written");
                Ok(Outcome::Written)
            }
        }
    }
}

/// Primary records of every root listing on disk, first occurrence wins.
fn root_records(
    config: &ScraperConfig,
    alias: &str,
    alias_dir: &Path,
    stats: &mut ScrapeStats,
) -> Result<Vec<(String, String)>> {
    let pattern = format!(
        "{}/{}*.xml",
        glob::Pattern::escape(&alias_dir.to_string_lossy()),
        layout::LISTING_PREFIX
    );

    let mut listings = vec![];
    for path in glob::glob(&pattern)? {
        let path = path?;
        let start = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix(layout::LISTING_PREFIX))
            .and_then(|start| start.parse::<usize>().ok());
        if let Some(start) = start {
            listings.push((start, path));
        }
    }
    listings.sort();

    let mut seen = HashSet::new();
    let mut records = vec![];
    for (_, path) in listings {
        let parsed = fs_err::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|xml| parse::records(&xml));
        match parsed {
            Ok(found) => records.extend(
                found
                    .into_iter()
                    .filter(|(pointer, _)| seen.insert(pointer.clone())),
            ),
            Err(e) => {
                let what = path.display().to_string();
                skip_or_fail(config.on_xml_error, alias, &what, e, stats)?;
            }
        }
    }
    Ok(records)
}
