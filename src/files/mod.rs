//! Static file serving for file-server mode.
//!
//! Maps request paths to files under a root directory. Path resolution is
//! traversal-safe: percent-encoded segments are decoded first, then any
//! `..`, absolute, or otherwise suspect component rejects the request with
//! 404. Directories serve their `index.html` when present. All failures,
//! including I/O errors that are not plain not-found, answer 404 — the
//! details go to the journal, not to the client.

use std::path::{Component, Path, PathBuf};

use crate::http::{Method, Response, StatusCode};
use crate::journal::Journal;

const NOT_FOUND_BODY: &str = "404 page not found";

/// Serves one request from the tree rooted at `root`.
///
/// `path` is the request path without the query string, still
/// percent-encoded. `HEAD` requests get the same status and headers as `GET`
/// with the body omitted.
pub async fn serve(root: &Path, method: &Method, path: &str, journal: &Journal) -> Response {
    let Some(relative) = sanitize_path(path) else {
        return not_found();
    };

    let mut full_path = root.join(relative);

    match tokio::fs::metadata(&full_path).await {
        Ok(meta) if meta.is_dir() => {
            full_path.push("index.html");
        }
        Ok(_) => {}
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                journal.error(&format_args!(
                    "error stat file {}, {e}",
                    full_path.display()
                ));
            }
            return not_found();
        }
    }

    let bytes = match tokio::fs::read(&full_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                journal.error(&format_args!(
                    "error read file {}, {e}",
                    full_path.display()
                ));
            }
            return not_found();
        }
    };

    let mime = mime_guess::from_path(&full_path).first_or_octet_stream();
    let response = Response::new(StatusCode::OK).header("Content-Type", mime.essence_str());

    if *method == Method::Head {
        response
    } else {
        response.body_bytes(bytes)
    }
}

fn not_found() -> Response {
    Response::new(StatusCode::NOT_FOUND)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(NOT_FOUND_BODY)
}

/// Decodes and normalizes a request path into a root-relative path.
///
/// Returns `None` for anything that could escape the root: parent
/// references, absolute components, or malformed percent-encoding.
/// Empty and `.` segments are dropped, so `/`, `//` and `/./` all resolve
/// to the root itself.
fn sanitize_path(path: &str) -> Option<PathBuf> {
    let decoded = percent_decode(path)?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        // Re-check through Path components: a decoded segment may smuggle
        // separators or parent references (e.g. "%2e%2e").
        for component in Path::new(segment).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                _ => return None,
            }
        }
    }
    Some(relative)
}

/// Minimal percent-decoding over a UTF-8 path. Returns `None` on malformed
/// escapes or when the decoded bytes are not valid UTF-8.
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3)?;
                let high = (hex[0] as char).to_digit(16)?;
                let low = (hex[1] as char).to_digit(16)?;
                out.push((high * 16 + low) as u8);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}
