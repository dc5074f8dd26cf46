//! On-disk naming of every artifact in the mirror.
//!
//! ```text
//! <repo_dir>/Collections_List.xml
//! <repo_dir>/<alias>/Collection_{Metadata,TotalRecs,Fields}.{xml,json}
//! <repo_dir>/<alias>/Elems_in_Collection_<start>.{xml,json}
//! <repo_dir>/<alias>/<pointer>.{xml,json,<filetype>}
//! <repo_dir>/<alias>/<pointer>_parent.{xml,json}
//! <repo_dir>/<alias>/Cpd/<pointer>.{xml,json} and <pointer>_cpd.xml
//! <repo_dir>/<alias>/Cpd/<parent_pointer>/<child_pointer>.{xml,json,<filetype>}
//! ```

use std::fmt;

use crate::api::{CdmApi, Format};

pub const COLLECTIONS_LIST: &str = "Collections_List"; // xml
pub const COLLECTION_TOTAL_RECS: &str = "Collection_TotalRecs"; // xml
pub const COLLECTION_METADATA: &str = "Collection_Metadata"; // xml
pub const COLLECTION_FIELDS: &str = "Collection_Fields"; // xml + json
pub const LISTING_PREFIX: &str = "Elems_in_Collection_"; // xml + json
pub const CPD_DIR: &str = "Cpd";

pub fn listing_stem(start: usize) -> String {
    format!("{LISTING_PREFIX}{start}")
}

pub fn file_name(stem: &str, ext: &str) -> String {
    format!("{stem}.{ext}")
}

pub fn binary_file_name(pointer: &str, filetype: &str) -> String {
    file_name(pointer, filetype)
}

/// Whether a root object owns children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Simple,
    Compound,
}

impl ObjectKind {
    pub fn from_filetype(filetype: &str) -> Self {
        if filetype.eq_ignore_ascii_case("cpd") {
            Self::Compound
        } else {
            Self::Simple
        }
    }

    pub fn metadata(self) -> &'static [MetadataArtifact] {
        use MetadataArtifact::*;
        match self {
            Self::Simple => &[ItemXml, ItemJson, ParentXml, ParentJson],
            Self::Compound => &[ItemXml, ItemJson, ParentXml, ParentJson, CompoundIndex],
        }
    }
}

/// The text artifacts kept for every object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataArtifact {
    ItemXml,
    ItemJson,
    ParentXml,
    ParentJson,
    CompoundIndex,
}

impl MetadataArtifact {
    pub fn format(self) -> Format {
        match self {
            Self::ItemJson | Self::ParentJson => Format::Json,
            Self::ItemXml | Self::ParentXml | Self::CompoundIndex => Format::Xml,
        }
    }

    pub fn stem(self, pointer: &str) -> String {
        match self {
            Self::ItemXml | Self::ItemJson => pointer.to_string(),
            Self::ParentXml | Self::ParentJson => format!("{pointer}_parent"),
            Self::CompoundIndex => format!("{pointer}_cpd"),
        }
    }

    pub fn file_name(self, pointer: &str) -> String {
        file_name(&self.stem(pointer), self.format().ext())
    }

    pub fn fetch<A: CdmApi>(self, api: &A, alias: &str, pointer: &str) -> anyhow::Result<String> {
        match self {
            Self::ItemXml | Self::ItemJson => api.item_info(alias, pointer, self.format()),
            Self::ParentXml | Self::ParentJson => api.parent_info(alias, pointer, self.format()),
            Self::CompoundIndex => api.compound_info(alias, pointer),
        }
    }
}

impl fmt::Display for MetadataArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ItemXml => "item xml",
            Self::ItemJson => "item json",
            Self::ParentXml => "parent xml",
            Self::ParentJson => "parent json",
            Self::CompoundIndex => "compound index",
        };
        f.write_str(name)
    }
}
