//! Where marker coordinates come from
//!
//! A marker document is either a JSON array of coordinates or a JSON object
//! keyed by marker id. Local files may be gzipped.

use crate::error::{WayfinderError, WayfinderResult};
use crate::types::Coordinate;
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug, PartialEq)]
pub enum MarkerSource {
    File(PathBuf),
    Http(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MarkerDocument {
    List(Vec<Coordinate>),
    // BTreeMap keeps the keyed form in a stable order
    Keyed(BTreeMap<String, Coordinate>),
}

impl MarkerDocument {
    fn into_coordinates(self) -> Vec<Coordinate> {
        match self {
            MarkerDocument::List(list) => list,
            MarkerDocument::Keyed(map) => map.into_values().collect(),
        }
    }
}

impl MarkerSource {
    /// `http://` and `https://` are fetched over the network, anything else is a path
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            MarkerSource::Http(trimmed.to_string())
        } else {
            MarkerSource::File(PathBuf::from(trimmed))
        }
    }

    /// Load the whole marker list.
    ///
    /// Only returns once the document is complete; an empty document is an
    /// empty list.
    pub async fn fetch(&self) -> WayfinderResult<Vec<Coordinate>> {
        let coordinates = match self {
            MarkerSource::File(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || load_file(&path))
                    .await
                    .map_err(|e| WayfinderError::MarkerSource(format!("loader task failed: {}", e)))??
            }
            MarkerSource::Http(url) => fetch_http(url).await?,
        };

        for (i, coordinate) in coordinates.iter().enumerate() {
            coordinate.validate().map_err(|e| {
                WayfinderError::MarkerSource(format!("marker {} is invalid: {}", i, e))
            })?;
        }

        log::info!("Loaded {} markers from {}", coordinates.len(), self);
        Ok(coordinates)
    }
}

impl std::fmt::Display for MarkerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerSource::File(path) => write!(f, "{}", path.display()),
            MarkerSource::Http(url) => write!(f, "{}", url),
        }
    }
}

fn load_file(path: &Path) -> WayfinderResult<Vec<Coordinate>> {
    let file = File::open(path)
        .map_err(|e| WayfinderError::MarkerSource(format!("{}: {}", path.display(), e)))?;

    let reader: Box<dyn Read> = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    parse_document(reader)
        .map_err(|e| WayfinderError::MarkerSource(format!("{}: {}", path.display(), e)))
}

fn parse_document<R: Read>(mut reader: R) -> Result<Vec<Coordinate>, String> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw).map_err(|e| e.to_string())?;
    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(Vec::new());
    }

    serde_json::from_str::<MarkerDocument>(&raw)
        .map(MarkerDocument::into_coordinates)
        .map_err(|e| format!("not a marker document: {}", e))
}

async fn fetch_http(url: &str) -> WayfinderResult<Vec<Coordinate>> {
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| WayfinderError::MarkerSource(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| WayfinderError::MarkerSource(format!("{}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(WayfinderError::MarkerSource(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| WayfinderError::MarkerSource(format!("{}: {}", url, e)))?;

    parse_document(body.as_bytes()).map_err(|e| WayfinderError::MarkerSource(format!("{}: {}", url, e)))
}
