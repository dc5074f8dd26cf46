#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use cdm_crawler::anyhow::{anyhow, Result};
use cdm_crawler::{CdmApi, Format, ScraperConfig};

pub const NOT_FOUND_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<error><code>-2</code><message>Requested item not found</message><restrictionCode>-1</restrictionCode></error>"#;

pub const NOT_FOUND_JSON: &str =
    r#"{"code":"-2","message":"Requested item not found","restrictionCode":"-1"}"#;

pub const JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0x4a, 0x46];

pub const PDF: &[u8] = &[0x25, 0x50, 0x44, 0x46, 0x2d, 0x31, 0x0a, 0xe2, 0xe3, 0xcf, 0xd3];

/// In-memory ContentDM server answering like the real web services.
#[derive(Default)]
pub struct MockApi {
    total: usize,
    records: Vec<(String, String)>,
    items: HashMap<String, String>,
    compounds: HashMap<String, String>,
    binaries: HashMap<String, Vec<u8>>,
    aliases: Vec<String>,
    broken: HashSet<String>,
    calls: RefCell<Vec<String>>,
}

impl MockApi {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(mut self, pointer: &str, filetype: &str) -> Self {
        self.records.push((pointer.into(), filetype.into()));
        self
    }

    /// Item metadata with `find` as its ContentDM file name.
    pub fn item(self, pointer: &str, find: Option<&str>) -> Self {
        let find = find
            .map(|f| format!("<find>{f}</find>"))
            .unwrap_or_default();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <xml><title>Item {pointer}</title><format></format>{find}<dmrecord>{pointer}</dmrecord></xml>"
        );
        self.item_xml(pointer, &xml)
    }

    pub fn item_xml(mut self, pointer: &str, xml: &str) -> Self {
        self.items.insert(pointer.into(), xml.into());
        self
    }

    /// Compound index whose pages are named `<child>.<page_ext>`.
    pub fn compound(self, pointer: &str, children: &[&str], page_ext: &str) -> Self {
        let pages = children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                format!(
                    "<page><pagetitle>Page {}</pagetitle><pagefile>{child}.{page_ext}</pagefile><pageptr>{child}</pageptr></page>",
                    i + 1
                )
            })
            .collect::<String>();
        let xml = format!("<cpd><type>Document</type>{pages}</cpd>");
        self.compound_xml(pointer, &xml)
    }

    pub fn compound_xml(mut self, pointer: &str, xml: &str) -> Self {
        self.compounds.insert(pointer.into(), xml.into());
        self
    }

    pub fn binary(mut self, pointer: &str, bytes: &[u8]) -> Self {
        self.binaries.insert(pointer.into(), bytes.to_vec());
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Metadata downloads of `pointer` fail at the transport level.
    pub fn broken(mut self, pointer: &str) -> Self {
        self.broken.insert(pointer.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn not_found(format: Format) -> String {
        match format {
            Format::Xml => NOT_FOUND_XML.to_string(),
            Format::Json => NOT_FOUND_JSON.to_string(),
        }
    }
}

impl CdmApi for MockApi {
    fn collections(&self) -> Result<String> {
        self.log("collections".into());
        let aliases = self
            .aliases
            .iter()
            .map(|a| format!("<collection><alias>{a}</alias><name>{a}</name></collection>"))
            .collect::<String>();
        Ok(format!("<collections>{aliases}</collections>"))
    }

    fn collection_metadata(&self, alias: &str) -> Result<String> {
        self.log(format!("collection_metadata:{alias}"));
        Ok(format!("<xml><name>{alias}</name></xml>"))
    }

    fn collection_total_recs(&self, alias: &str) -> Result<String> {
        self.log(format!("total_recs:{alias}"));
        Ok(format!(
            "<totalrecs><suggestedtopic/><total>{}</total></totalrecs>",
            self.total
        ))
    }

    fn collection_fields(&self, alias: &str, format: Format) -> Result<String> {
        self.log(format!("fields:{alias}:{format}"));
        Ok(match format {
            Format::Xml => "<fields><field><name>Title</name><nick>title</nick></field></fields>".into(),
            Format::Json => r#"[{"name":"Title","nick":"title"}]"#.into(),
        })
    }

    fn records(&self, alias: &str, start: usize, max_recs: usize, format: Format) -> Result<String> {
        self.log(format!("records:{alias}:{start}:{format}"));
        let page = self
            .records
            .iter()
            .skip(start - 1)
            .take(max_recs)
            .collect::<Vec<_>>();
        Ok(match format {
            Format::Xml => {
                let records = page
                    .iter()
                    .map(|(p, ft)| {
                        format!(
                            "<record><collection>/{alias}</collection><pointer>{p}</pointer><filetype>{ft}</filetype><parentobject>-1</parentobject><dmrecord>{p}</dmrecord></record>"
                        )
                    })
                    .collect::<String>();
                format!(
                    "<results><pager><start>{start}</start><maxrecs>{max_recs}</maxrecs><total>{}</total></pager><records>{records}</records></results>",
                    self.total
                )
            }
            Format::Json => {
                let records = page
                    .iter()
                    .map(|(p, ft)| format!(r#"{{"pointer":"{p}","filetype":"{ft}"}}"#))
                    .collect::<Vec<_>>()
                    .join(",");
                format!(r#"{{"records":[{records}]}}"#)
            }
        })
    }

    fn item_info(&self, alias: &str, pointer: &str, format: Format) -> Result<String> {
        self.log(format!("item:{alias}:{pointer}:{format}"));
        if self.broken.contains(pointer) {
            return Err(anyhow!("connection reset by peer"));
        }
        Ok(match (self.items.get(pointer), format) {
            (Some(xml), Format::Xml) => xml.clone(),
            (Some(_), Format::Json) => format!(r#"{{"title":"Item {pointer}","dmrecord":"{pointer}"}}"#),
            (None, format) => Self::not_found(format),
        })
    }

    fn parent_info(&self, alias: &str, pointer: &str, format: Format) -> Result<String> {
        self.log(format!("parent:{alias}:{pointer}:{format}"));
        if self.broken.contains(pointer) {
            return Err(anyhow!("connection reset by peer"));
        }
        Ok(match (self.items.contains_key(pointer), format) {
            (true, Format::Xml) => "<parent>-1</parent>".into(),
            (true, Format::Json) => r#"{"parent":-1}"#.into(),
            (false, format) => Self::not_found(format),
        })
    }

    fn compound_info(&self, alias: &str, pointer: &str) -> Result<String> {
        self.log(format!("compound:{alias}:{pointer}"));
        Ok(self
            .compounds
            .get(pointer)
            .cloned()
            .unwrap_or_else(|| NOT_FOUND_XML.to_string()))
    }

    fn binary(&self, alias: &str, pointer: &str) -> Result<Vec<u8>> {
        self.log(format!("binary:{alias}:{pointer}"));
        self.binaries
            .get(pointer)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP status client error (404 Not Found)"))
    }
}

pub fn config(root: &Path) -> ScraperConfig {
    ScraperConfig {
        repo_dir: root.to_path_buf(),
        ..Default::default()
    }
}

/// Every file below `root` with its content, sorted by relative path.
pub fn tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = vec![];
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let content = fs::read(&path).unwrap();
                files.push((path.strip_prefix(root).unwrap().to_path_buf(), content));
            }
        }
    }
    files.sort();
    files
}

pub fn names_in(dir: &Path) -> Vec<String> {
    let mut names = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    names
}
