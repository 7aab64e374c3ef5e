//! Shared fixtures: release archives built in memory and a scripted transport.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use futures_util::StreamExt;
use futures_util::stream;
use pawnup_toolchain::error::BoxError;
use pawnup_toolchain::{Download, FetchError, Transport};
use url::Url;
use zip::write::SimpleFileOptions;

pub const VERSION: &str = "3.10.10";
pub const COMPILER: &[u8] = b"\x7fELF pawncc compiler binary";
pub const LIBRARY: &[u8] = b"\x7fELF libpawnc shared library";

/// A scripted reply for one file name.
#[derive(Clone)]
pub enum Reply {
    /// Serve these bytes with a correct Content-Length.
    Archive(Vec<u8>),
    /// Answer with this HTTP status.
    Status(u16),
    /// Send these bytes, then fail the stream.
    BreakAfter(Vec<u8>),
    /// Send these bytes, then stall forever.
    StallAfter(Vec<u8>),
}

#[derive(Default)]
struct State {
    replies: Mutex<HashMap<String, Reply>>,
    requests: AtomicUsize,
}

/// In-memory transport keyed by the last URL path segment.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<State>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, filename: &str, reply: Reply) {
        self.state
            .replies
            .lock()
            .expect("Should lock replies")
            .insert(filename.to_string(), reply);
    }

    /// Number of requests opened so far.
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    async fn open(&self, url: &Url) -> Result<Download, FetchError> {
        self.state.requests.fetch_add(1, Ordering::SeqCst);
        let filename = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();
        let reply = self
            .state
            .replies
            .lock()
            .expect("Should lock replies")
            .get(&filename)
            .cloned();

        let not_found = || FetchError::Status {
            url: url.to_string(),
            status: 404,
        };
        let download = match reply.ok_or_else(not_found)? {
            Reply::Status(status) => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            Reply::Archive(bytes) => Download {
                content_length: Some(bytes.len() as u64),
                body: stream::iter(chunks(bytes)).boxed(),
            },
            Reply::BreakAfter(head) => Download {
                content_length: None,
                body: stream::iter(chunks(head))
                    .chain(stream::once(async {
                        Err::<Bytes, BoxError>("connection reset by peer".into())
                    }))
                    .boxed(),
            },
            Reply::StallAfter(head) => Download {
                content_length: None,
                body: stream::iter(chunks(head)).chain(stream::pending()).boxed(),
            },
        };
        Ok(download)
    }
}

fn chunks(bytes: Vec<u8>) -> Vec<Result<Bytes, BoxError>> {
    bytes
        .chunks(1024)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}

/// The Linux release tarball, optionally without the shared library.
pub fn linux_release(version: &str, with_library: bool) -> Vec<u8> {
    let root = format!("pawnc-{version}-linux");
    let mut files = vec![(format!("{root}/bin/pawncc"), COMPILER, 0o755)];
    if with_library {
        files.push((format!("{root}/lib/libpawnc.so"), LIBRARY, 0o644));
    }
    files.push((format!("{root}/include/core.inc"), b"native print();", 0o644));

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, contents, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents)
            .expect("Should append file");
    }
    builder
        .into_inner()
        .expect("Should finish tar")
        .finish()
        .expect("Should finish gzip")
}

/// A zip release for `platform` ("darwin" or "windows").
pub fn zip_release(platform: &str, version: &str) -> Vec<u8> {
    let root = format!("pawnc-{version}-{platform}");
    let files: Vec<(String, &[u8], u32)> = if platform == "windows" {
        vec![
            (format!("{root}/bin/pawncc.exe"), COMPILER, 0o755),
            (format!("{root}/bin/pawnc.dll"), LIBRARY, 0o644),
        ]
    } else {
        vec![
            (format!("{root}/bin/pawncc"), COMPILER, 0o755),
            (format!("{root}/lib/libpawnc.dylib"), LIBRARY, 0o644),
        ]
    };

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents, mode) in files {
        writer
            .start_file(name, SimpleFileOptions::default().unix_permissions(mode))
            .expect("Should start file");
        writer.write_all(contents).expect("Should write file");
    }
    writer.finish().expect("Should finish zip").into_inner()
}

/// Relative paths and contents of every file under `dir`, sorted.
pub fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        for entry in std::fs::read_dir(dir).expect("Should read dir") {
            let path = entry.expect("Should read entry").path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let relative = path
                    .strip_prefix(base)
                    .expect("Should be under base")
                    .to_string_lossy()
                    .replace('\\', "/");
                out.push((relative, std::fs::read(&path).expect("Should read file")));
            }
        }
    }

    let mut out = Vec::new();
    if dir.exists() {
        walk(dir, dir, &mut out);
    }
    out.sort();
    out
}

/// Names of files in `dir`, including hidden ones.
pub fn file_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| {
            e.expect("Should read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
