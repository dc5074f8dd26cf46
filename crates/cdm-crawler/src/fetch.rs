use std::path::Path;

use anyhow::Result;

use crate::api::CdmApi;
use crate::config::{OnError, ScraperConfig};
use crate::layout::{self, MetadataArtifact, ObjectKind};
use crate::probe::{self, Lookup, Payload};
use crate::sink::Sink;
use crate::snapshot::ArtifactCache;
use crate::stats::{Outcome, ScrapeStats};

/// Fetches whatever artifact of a collection is not on disk yet.
///
/// Presence is decided by the injected [`ArtifactCache`], the filesystem is
/// never listed again. Writes only ever add files.
pub struct Fetcher<'a, A, S> {
    config: &'a ScraperConfig,
    api: &'a A,
    sink: &'a S,
    alias: &'a str,
    cache: ArtifactCache,
    stats: ScrapeStats,
}

impl<'a, A, S> Fetcher<'a, A, S>
where
    A: CdmApi,
    S: Sink,
{
    pub fn new(
        config: &'a ScraperConfig,
        api: &'a A,
        sink: &'a S,
        alias: &'a str,
        cache: ArtifactCache,
    ) -> Self {
        Self {
            config,
            api,
            sink,
            alias,
            cache,
            stats: ScrapeStats::default(),
        }
    }

    pub fn alias(&self) -> &str {
        self.alias
    }

    pub fn into_stats(self) -> ScrapeStats {
        self.stats
    }

    /// Ensures the metadata artifacts of `kind` exist for `pointer` in `dir`.
    ///
    /// A not-found answer is recorded and skipped, it never aborts the run.
    pub fn ensure_metadata(&mut self, dir: &Path, pointer: &str, kind: ObjectKind) -> Result<()> {
        for &artifact in kind.metadata() {
            let outcome = self.ensure_artifact(dir, pointer, artifact)?;
            self.stats.record(outcome);
        }
        Ok(())
    }

    fn ensure_artifact(
        &mut self,
        dir: &Path,
        pointer: &str,
        artifact: MetadataArtifact,
    ) -> Result<Outcome> {
        let name = artifact.file_name(pointer);
        if self.cache.contains(dir, &name) {
            return Ok(Outcome::Cached);
        }

        let text = match artifact.fetch(self.api, self.alias, pointer) {
            Ok(text) => text,
            Err(e) => {
                return match self.config.on_dl_error {
                    OnError::SkipAndLog => {
                        log::warn!("{} {name} skipped, {artifact} download got: {e}", self.alias);
                        Ok(Outcome::Failed)
                    }
                    OnError::Fail => Err(e.context(format!(
                        "Couldn't download {artifact} of {}/{pointer}",
                        self.alias
                    ))),
                }
            }
        };

        match probe::lookup(&text, artifact.format()) {
            Lookup::NotFound => {
                log::warn!("{} {name} is 404", self.alias);
                Ok(Outcome::NotFound)
            }
            Lookup::Found => {
                self.sink
                    .write_text(dir, &artifact.stem(pointer), artifact.format().ext(), &text)?;
                log::info!("{} {name} written", self.alias);
                self.cache.record_write(dir, name);
                Ok(Outcome::Written)
            }
        }
    }

    /// Ensures `<pointer>.<filetype>` exists in `dir`. Download failures are
    /// logged and skipped.
    pub fn ensure_binary(&mut self, dir: &Path, pointer: &str, filetype: &str) -> Result<Outcome> {
        let name = layout::binary_file_name(pointer, filetype);
        let lowercase = layout::binary_file_name(pointer, &filetype.to_lowercase());
        let outcome = if self.cache.contains(dir, &name) || self.cache.contains(dir, &lowercase) {
            Outcome::Cached
        } else {
            match self.api.binary(self.alias, pointer) {
                Ok(bytes) => {
                    self.sink.write_binary(dir, pointer, filetype, &bytes)?;
                    log::info!("{} {name} written", self.alias);
                    self.cache.record_write(dir, name);
                    Outcome::Written
                }
                Err(e) => {
                    log::warn!("{} {pointer} binary download failed: {e}", self.alias);
                    Outcome::Failed
                }
            }
        };
        self.stats.record(outcome);
        Ok(outcome)
    }

    /// Ensures the binary hiding at the root of a PDF-page compound is in
    /// `dir`, next to the compound's index file `anchor`.
    ///
    /// Replies that decode as text are error documents and are discarded.
    pub fn ensure_hidden_binary(
        &mut self,
        dir: &Path,
        anchor: &str,
        pointer: &str,
        filetype: &str,
    ) -> Result<Outcome> {
        let name = layout::binary_file_name(pointer, filetype);
        let outcome = if self.cache.has_sibling(dir, anchor, &name) {
            Outcome::Cached
        } else {
            match self.api.binary(self.alias, pointer) {
                Ok(bytes) => match probe::payload(&bytes) {
                    Payload::Binary => {
                        self.sink.write_binary(dir, pointer, filetype, &bytes)?;
                        log::info!("{} {name} root hidden binary written", self.alias);
                        self.cache.record_write(dir, name);
                        Outcome::Written
                    }
                    Payload::Text => {
                        log::warn!("{} {name} discarded, got text instead of a binary", self.alias);
                        Outcome::Failed
                    }
                },
                Err(e) => {
                    log::warn!("{} {pointer} hidden binary download failed: {e}", self.alias);
                    Outcome::Failed
                }
            }
        };
        self.stats.record(outcome);
        Ok(outcome)
    }

    pub fn create_dir(&self, dir: &Path) -> Result<()> {
        self.sink.create_dir(dir)
    }

    /// Applies the `on_xml_error` policy to a local artifact that couldn't be
    /// read.
    pub fn unreadable(&mut self, what: &str, e: anyhow::Error) -> Result<()> {
        skip_or_fail(
            self.config.on_xml_error,
            self.alias,
            what,
            e,
            &mut self.stats,
        )
    }

    pub fn skip(&mut self, what: &str, e: anyhow::Error) {
        log::warn!("{} skipping {what} got: {e}", self.alias);
        self.stats.record(Outcome::Failed);
    }
}

pub(crate) fn skip_or_fail(
    policy: OnError,
    alias: &str,
    what: &str,
    e: anyhow::Error,
    stats: &mut ScrapeStats,
) -> Result<()> {
    match policy {
        OnError::SkipAndLog => {
            log::warn!("{alias} skipping {what} got: {e}");
            stats.record(Outcome::Failed);
            Ok(())
        }
        OnError::Fail => Err(e.context(format!("Couldn't process {what} of {alias}"))),
    }
}
