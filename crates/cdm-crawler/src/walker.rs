use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::api::CdmApi;
use crate::fetch::Fetcher;
use crate::layout::{self, MetadataArtifact, ObjectKind};
use crate::parse;
use crate::sink::Sink;
use crate::stats::ScrapeStats;

/// Walks the objects of one collection, once its root listings and snapshot
/// are in place.
///
/// Simple objects land in the collection directory. Compound objects keep
/// their metadata in `Cpd/` and their children in `Cpd/<parent_pointer>/`.
pub struct TreeWalker<'a, A, S> {
    fetcher: Fetcher<'a, A, S>,
    alias_dir: PathBuf,
    compound_parents: Vec<String>,
}

impl<'a, A, S> TreeWalker<'a, A, S>
where
    A: CdmApi,
    S: Sink,
{
    pub fn new(fetcher: Fetcher<'a, A, S>, alias_dir: PathBuf) -> Self {
        Self {
            fetcher,
            alias_dir,
            compound_parents: vec![],
        }
    }

    pub fn into_stats(self) -> ScrapeStats {
        self.fetcher.into_stats()
    }

    fn cpd_dir(&self) -> PathBuf {
        self.alias_dir.join(layout::CPD_DIR)
    }

    pub fn root_objects(&mut self, records: &[(String, String)]) -> Result<()> {
        for (pointer, filetype) in records {
            self.root_object(pointer, filetype)?;
        }
        Ok(())
    }

    pub fn root_object(&mut self, pointer: &str, filetype: &str) -> Result<()> {
        match ObjectKind::from_filetype(filetype) {
            ObjectKind::Compound => {
                let cpd_dir = self.cpd_dir();
                self.fetcher.create_dir(&cpd_dir)?;
                self.fetcher
                    .ensure_metadata(&cpd_dir, pointer, ObjectKind::Compound)?;
                self.compound_parents.push(pointer.to_string());
            }
            ObjectKind::Simple => {
                let alias_dir = self.alias_dir.clone();
                self.fetcher
                    .ensure_metadata(&alias_dir, pointer, ObjectKind::Simple)?;
                self.fetcher.ensure_binary(&alias_dir, pointer, filetype)?;
            }
        }
        Ok(())
    }

    /// Expands every compound object met by [`TreeWalker::root_objects`].
    pub fn compound_objects(&mut self) -> Result<()> {
        for parent in std::mem::take(&mut self.compound_parents) {
            self.compound_object(&parent)?;
        }
        Ok(())
    }

    fn compound_object(&mut self, parent: &str) -> Result<()> {
        let cpd_dir = self.cpd_dir();
        let child_dir = cpd_dir.join(parent);
        self.fetcher.create_dir(&child_dir)?;

        let index_name = MetadataArtifact::CompoundIndex.file_name(parent);
        let index_path = cpd_dir.join(&index_name);
        // Checked on disk, not through the cache, since the index is read below
        if !index_path.is_file() {
            log::warn!("{} {parent} has no compound index", self.fetcher.alias());
            return Ok(());
        }
        let index = match read_xml(&index_path).and_then(|xml| parse::compound_index(&xml)) {
            Ok(index) => index,
            Err(e) => return self.fetcher.unreadable(&index_name, e),
        };

        if index.children.is_empty() {
            log::warn!("{} {parent} no children to this compound", self.fetcher.alias());
            return Ok(());
        }

        // The declared children are pages of a single PDF stored at the root
        if index.pdf_pages {
            return self.hidden_pdf(parent, &index_name);
        }

        for child in &index.children {
            self.child_object(&child_dir, child)?;
        }
        Ok(())
    }

    fn child_object(&mut self, child_dir: &Path, child: &str) -> Result<()> {
        self.fetcher
            .ensure_metadata(child_dir, child, ObjectKind::Simple)?;

        let metadata_path = child_dir.join(MetadataArtifact::ItemXml.file_name(child));
        match read_xml(&metadata_path).and_then(|xml| parse::original_filetype(&xml)) {
            Ok(filetype) => {
                self.fetcher.ensure_binary(child_dir, child, &filetype)?;
            }
            Err(e) => {
                let what = format!("binary of {}", metadata_path.display());
                self.fetcher.skip(&what, e);
            }
        }
        Ok(())
    }

    fn hidden_pdf(&mut self, parent: &str, index_name: &str) -> Result<()> {
        let cpd_dir = self.cpd_dir();
        let root_name = MetadataArtifact::ItemXml.file_name(parent);
        let root_path = cpd_dir.join(&root_name);
        // Same as the compound index, the root metadata has to be readable
        if !root_path.is_file() {
            log::warn!(
                "{} {parent} has no root metadata to find its hidden binary",
                self.fetcher.alias()
            );
            return Ok(());
        }

        let (pointer, filetype) =
            match read_xml(&root_path).and_then(|xml| parse::hidden_binary(&xml, parent)) {
                Ok(found) => found,
                Err(e) => return self.fetcher.unreadable(&root_name, e),
            };
        self.fetcher
            .ensure_hidden_binary(&cpd_dir, index_name, &pointer, &filetype)?;
        Ok(())
    }
}

fn read_xml(path: &Path) -> Result<String> {
    Ok(fs_err::read_to_string(path)?)
}
