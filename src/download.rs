//! Conditional feed download over HTTP.
//!
//! The remote zip is fetched with `If-None-Match`/`If-Modified-Since`
//! headers built from a small JSON sidecar persisted next to the
//! extracted tables, so an unchanged feed costs one 304 round trip
//! instead of a full download.

use crate::Error;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

const METADATA_FILE: &str = ".gtfsmetadata";

#[derive(Debug, Default, Serialize, Deserialize)]
struct FeedMetadata {
    etag: Option<String>,
    last_modified: Option<String>,
}

impl FeedMetadata {
    fn load(dir: &Path) -> Self {
        File::open(dir.join(METADATA_FILE))
            .ok()
            .and_then(|f| serde_json::from_reader(f).ok())
            .unwrap_or_default()
    }

    fn store(&self, dir: &Path) -> Result<(), Error> {
        let file = File::create(dir.join(METADATA_FILE))?;
        serde_json::to_writer(file, self)?;
        Ok(())
    }
}

/// Downloads and extracts a feed zip into `output_dir`.
///
/// Returns `Ok(None)` when the server answers 304 Not Modified for the
/// stored validators; `force` skips the conditional check. Any other
/// non-success status is an error.
pub fn download_feed(url: &str, output_dir: &Path, force: bool) -> Result<Option<PathBuf>, Error> {
    std::fs::create_dir_all(output_dir)?;
    let metadata = FeedMetadata::load(output_dir);

    let client = reqwest::blocking::Client::new();
    let mut request = client.get(url);
    if !force {
        if let Some(etag) = &metadata.etag {
            request = request.header(reqwest::header::IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &metadata.last_modified {
            request = request.header(reqwest::header::IF_MODIFIED_SINCE, last_modified);
        }
    }

    let response = request.send()?;
    if response.status() == reqwest::StatusCode::NOT_MODIFIED {
        info!("remote feed unchanged, keeping {}", output_dir.display());
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(Error::DownloadStatus(response.status().as_u16()));
    }

    let header = |name: reqwest::header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let fresh = FeedMetadata {
        etag: header(reqwest::header::ETAG),
        last_modified: header(reqwest::header::LAST_MODIFIED),
    };

    let body = response.bytes()?;
    debug!("downloaded {} bytes from {url}", body.len());
    extract_zip(Cursor::new(body), output_dir)?;
    fresh.store(output_dir)?;
    info!("feed extracted to {}", output_dir.display());
    Ok(Some(output_dir.to_path_buf()))
}

/// Extracts every table file flat into `output_dir`, ignoring any
/// directory structure inside the archive.
fn extract_zip<R: Read + std::io::Seek>(reader: R, output_dir: &Path) -> Result<(), Error> {
    let mut archive = zip::ZipArchive::new(reader)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = match Path::new(entry.name()).file_name() {
            Some(n) => n.to_owned(),
            None => continue,
        };
        let mut out = File::create(output_dir.join(&name))?;
        std::io::copy(&mut entry, &mut out)?;
        debug!("extracted {}", name.to_string_lossy());
    }
    Ok(())
}
