//! Readers for the ContentDM XML documents the walker relies on.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use lazy_static::lazy_static;
use sxd_document::{parser, Package};
use sxd_xpath::nodeset::Node;
use sxd_xpath::Value;

lazy_static! {
    static ref XP_FACTORY: sxd_xpath::Factory = sxd_xpath::Factory::new();
}

/// Marker carried by the `pagefile` of pages cut out of a single PDF.
pub const PDF_PAGE_MARKER: &str = "pdfpage";

/// Filetype assumed for a hidden PDF whose metadata declares no format.
pub const DEFAULT_HIDDEN_FORMAT: &str = "pdf";

fn evaluate<'d, N>(node: N, xpath: &str) -> Result<Value<'d>>
where
    N: Into<Node<'d>>,
{
    let xpath = XP_FACTORY
        .build(xpath)?
        .ok_or_else(|| anyhow!("Missing XPath"))?;
    let context = sxd_xpath::Context::new();
    xpath
        .evaluate(&context, node)
        .map_err(|e| anyhow!("Couldn't evaluate {xpath:?} got: {e}"))
}

fn parse_xml(xml: &str) -> Result<Package> {
    parser::parse(xml).map_err(|e| anyhow!("Couldn't parse XML got: {e}"))
}

fn string_at<'d, N>(node: N, xpath: &str) -> Result<String>
where
    N: Into<Node<'d>>,
{
    Ok(evaluate(node, &format!("string({xpath})"))?
        .string()
        .trim()
        .to_string())
}

fn strings_at<'d, N>(node: N, xpath: &str) -> Result<Vec<String>>
where
    N: Into<Node<'d>>,
{
    match evaluate(node, xpath)? {
        Value::Nodeset(nodes) => Ok(nodes
            .document_order()
            .into_iter()
            .map(|node| node.string_value().trim().to_string())
            .collect()),
        other => bail!("Expected a node-set for {xpath} got: {other:?}"),
    }
}

/// Text of the `message` child of the document element, if any.
pub fn root_message(xml: &str) -> Option<String> {
    let package = parse_xml(xml).ok()?;
    let document = package.as_document();
    string_at(document.root(), "/*/message")
        .ok()
        .filter(|m| !m.is_empty())
}

/// Declared record count of a `Collection_TotalRecs` document.
pub fn total_recs(xml: &str) -> Result<usize> {
    let package = parse_xml(xml)?;
    let document = package.as_document();
    let total = string_at(document.root(), "(//total)[1]")?;
    total
        .parse()
        .with_context(|| format!("Invalid record total: {total:?}"))
}

/// `(pointer, filetype)` of every primary record of a root listing.
///
/// The pointer is `dmrecord`, else `pointer`. Records left without pointer or
/// filetype are derivatives and are dropped. Filetypes are lowercased.
pub fn records(xml: &str) -> Result<Vec<(String, String)>> {
    let package = parse_xml(xml)?;
    let document = package.as_document();

    let nodes = match evaluate(document.root(), "//record")? {
        Value::Nodeset(nodes) => nodes.document_order(),
        _ => return Ok(vec![]),
    };

    let mut records = Vec::with_capacity(nodes.len());
    for node in nodes {
        let mut pointer = string_at(node, "dmrecord")?;
        if pointer.is_empty() {
            pointer = string_at(node, "pointer")?;
        }
        let filetype = string_at(node, "filetype")?.to_lowercase();
        if !pointer.is_empty() && !filetype.is_empty() {
            records.push((pointer, filetype));
        }
    }
    Ok(records)
}

/// Aliases of a `Collections_List` document, without their slashes.
pub fn collection_aliases(xml: &str) -> Result<Vec<String>> {
    let package = parse_xml(xml)?;
    let document = package.as_document();
    Ok(strings_at(document.root(), "//alias")?
        .into_iter()
        .map(|alias| alias.trim_matches('/').to_string())
        .filter(|alias| !alias.is_empty())
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundIndex {
    /// Child pointers in declared order
    pub children: Vec<String>,
    /// Children are pages of one PDF rather than objects of their own
    pub pdf_pages: bool,
}

pub fn compound_index(xml: &str) -> Result<CompoundIndex> {
    let package = parse_xml(xml)?;
    let document = package.as_document();
    let children = strings_at(document.root(), "//pageptr")?
        .into_iter()
        .filter(|child| !child.is_empty())
        .collect::<Vec<_>>();
    let pdf_pages = !children.is_empty()
        && string_at(document.root(), "(//pageptr)[1]/../pagefile[1]")?.contains(PDF_PAGE_MARKER);
    Ok(CompoundIndex {
        children,
        pdf_pages,
    })
}

/// Filetype of an object's original binary, taken from the extension of the
/// `find` (ContentDM file name) field of its metadata.
pub fn original_filetype(xml: &str) -> Result<String> {
    let package = parse_xml(xml)?;
    let document = package.as_document();
    let find = string_at(document.root(), "/*/find")?;
    if find.is_empty() {
        bail!("No original file name");
    }
    Path::new(&find)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| anyhow!("No extension in original file name {find:?}"))
}

/// `(pointer, filetype)` of the binary hidden at the root of a compound
/// object, read from the compound's own metadata.
pub fn hidden_binary(xml: &str, compound_pointer: &str) -> Result<(String, String)> {
    let package = parse_xml(xml)?;
    let document = package.as_document();

    let mut pointer = string_at(document.root(), "(//dmrecord)[1]")?;
    if pointer.is_empty() {
        pointer = string_at(document.root(), "(//pointer)[1]")?;
    }
    if pointer.is_empty() {
        pointer = compound_pointer.to_string();
    }

    let mut filetype = string_at(document.root(), "(//format)[1]")?.to_lowercase();
    if filetype.is_empty() {
        filetype = DEFAULT_HIDDEN_FORMAT.to_string();
    }

    Ok((pointer, filetype))
}
