use std::fmt;
use std::io::prelude::*;
use std::time::Duration;

use anyhow::{bail, Result};
use flate2::read::GzDecoder;
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::config::ScraperConfig;

/// Serialization requested from the ContentDM web services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Xml,
    Json,
}

impl Format {
    pub fn ext(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

/// The remote calls a collection harvest depends on.
///
/// Text calls return the raw response body, including ContentDM's
/// "Requested item not found" payloads, and fail on any other error status.
/// Only [`CdmApi::binary`] reports a missing object as an error.
pub trait CdmApi {
    fn collections(&self) -> Result<String>;

    fn collection_metadata(&self, alias: &str) -> Result<String>;

    fn collection_total_recs(&self, alias: &str) -> Result<String>;

    fn collection_fields(&self, alias: &str, format: Format) -> Result<String>;

    fn records(&self, alias: &str, start: usize, max_recs: usize, format: Format)
        -> Result<String>;

    fn item_info(&self, alias: &str, pointer: &str, format: Format) -> Result<String>;

    fn parent_info(&self, alias: &str, pointer: &str, format: Format) -> Result<String>;

    fn compound_info(&self, alias: &str, pointer: &str) -> Result<String>;

    fn binary(&self, alias: &str, pointer: &str) -> Result<Vec<u8>>;
}

/// Blocking client for a ContentDM server's `dmwebservices` endpoint.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    server: String,
    fields: String,
}

impl HttpApi {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        if config.server.is_empty() {
            bail!("Missing ContentDM server url");
        }
        let client = ClientBuilder::new()
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .timeout(config.timeout.map(Duration::from_secs))
            .build()?;
        Ok(Self {
            client,
            server: config.server.trim_end_matches('/').to_string(),
            fields: config.listing_fields.join("!"),
        })
    }

    fn query(&self, q: &str) -> Result<String> {
        let url = format!("{}/dmwebservices/index.php?q={q}", self.server);
        log::debug!("GET {url}");
        download_text(&self.client, &url)
    }
}

impl CdmApi for HttpApi {
    fn collections(&self) -> Result<String> {
        self.query("dmGetCollectionList/xml")
    }

    fn collection_metadata(&self, alias: &str) -> Result<String> {
        self.query(&format!("dmGetCollectionParameters/{alias}/xml"))
    }

    fn collection_total_recs(&self, alias: &str) -> Result<String> {
        self.query(&format!("dmQueryTotalRecs/{alias}/xml"))
    }

    fn collection_fields(&self, alias: &str, format: Format) -> Result<String> {
        self.query(&format!("dmGetCollectionFieldInfo/{alias}/{format}"))
    }

    fn records(
        &self,
        alias: &str,
        start: usize,
        max_recs: usize,
        format: Format,
    ) -> Result<String> {
        let fields = &self.fields;
        self.query(&format!(
            "dmQuery/{alias}/0/{fields}/nosort/{max_recs}/{start}/1/0/0/0/0/0/{format}"
        ))
    }

    fn item_info(&self, alias: &str, pointer: &str, format: Format) -> Result<String> {
        self.query(&format!("dmGetItemInfo/{alias}/{pointer}/{format}"))
    }

    fn parent_info(&self, alias: &str, pointer: &str, format: Format) -> Result<String> {
        self.query(&format!("GetParent/{alias}/{pointer}/{format}"))
    }

    fn compound_info(&self, alias: &str, pointer: &str) -> Result<String> {
        self.query(&format!("dmGetCompoundObjectInfo/{alias}/{pointer}/xml"))
    }

    fn binary(&self, alias: &str, pointer: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/utils/getfile/collection/{alias}/id/{pointer}/filename/{pointer}",
            self.server
        );
        log::debug!("GET {url}");
        let resp = self.client.get(&url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }
}

// A 404 body is kept since it carries ContentDM's not-found document, any other
// failure status is an error.
fn download_text(client: &Client, url: &str) -> Result<String> {
    let resp = client.get(url).send()?;
    let resp = if resp.status() == StatusCode::NOT_FOUND {
        resp
    } else {
        resp.error_for_status()?
    };

    let gzipped = matches!(
        resp.headers().get(CONTENT_TYPE),
        Some(c) if c == "application/x-gzip" || c == "application/gzip"
    );

    let page = if gzipped {
        let compressed = resp.bytes()?;
        let mut gz = GzDecoder::new(&compressed[..]);
        let mut page = String::new();
        gz.read_to_string(&mut page)?;
        page
    } else {
        resp.text()?
    };

    Ok(page)
}
