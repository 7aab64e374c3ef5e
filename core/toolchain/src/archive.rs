//! Archive extraction for compiler distributions.
//!
//! Extraction is selective: only the members named in a path map are written,
//! each to its own install path, with unix permission bits carried over from
//! the archive entry. Every mapped member is located and checked before the
//! first file is written, so an archive that lacks one of them leaves the
//! destination untouched.
//!
//! Entry names are compared after normalization in both formats: `\` becomes
//! `/`, and leading `./` and trailing `/` are dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use serde::Serialize;
use tar::Archive;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

use crate::error::{BoxError, ExtractError};

/// Permissions for members whose archive entry carries none.
#[cfg_attr(not(unix), allow(dead_code))]
const DEFAULT_FILE_MODE: u32 = 0o644;

/// One archive member and the install path it is written to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PathMapping {
    /// Member path inside the archive, `/`-separated.
    pub member: String,
    /// Install path relative to the destination directory.
    pub install: PathBuf,
}

impl PathMapping {
    /// Creates a mapping from `member` to `install`.
    pub fn new(member: impl Into<String>, install: impl Into<PathBuf>) -> Self {
        Self {
            member: member.into(),
            install: install.into(),
        }
    }
}

/// Archive container formats used by distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArchiveFormat {
    /// A zip archive.
    #[serde(rename = "zip")]
    Zip,
    /// A gzip-compressed tarball.
    #[serde(rename = "tar.gz")]
    TarGzip,
}

impl ArchiveFormat {
    /// Returns the conventional file extension, without a leading dot.
    #[must_use = "returns the format name without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGzip => "tar.gz",
        }
    }

    /// Guesses the format from a file name's extension.
    #[must_use]
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGzip)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Writes every member in `path_map` from `archive` into `dest`.
    ///
    /// Intermediate directories are created as needed and existing files at
    /// an install path are replaced. Returns the installed paths in
    /// `path_map` order.
    ///
    /// This performs blocking I/O; from async code use [`extract_blocking`].
    ///
    /// # Errors
    ///
    /// - [`ExtractError::OpenArchive`] if `archive` cannot be opened.
    /// - [`ExtractError::MalformedArchive`] if it cannot be decoded.
    /// - [`ExtractError::MissingMember`] or [`ExtractError::NotAFile`] naming the
    ///   first mapped member that is absent or not a regular file. Nothing has
    ///   been written in these cases.
    /// - [`ExtractError::ReadMember`] or [`ExtractError::WriteDestination`]
    ///   naming the member being installed when the failure happened.
    /// - [`ExtractError::Cancelled`] if `cancel` fires between members.
    pub fn extract(
        self,
        archive: &Path,
        dest: &Path,
        path_map: &[PathMapping],
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>, ExtractError> {
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        for mapping in path_map {
            check_install_path(mapping, dest)?;
        }

        tracing::debug!(
            archive = %archive.display(),
            dest = %dest.display(),
            format = self.as_str(),
            members = path_map.len(),
            "extracting archive"
        );

        match self {
            Self::Zip => extract_zip(archive, dest, path_map, cancel)?,
            Self::TarGzip => extract_tar_gz(archive, dest, path_map, cancel)?,
        }

        Ok(path_map.iter().map(|m| dest.join(&m.install)).collect())
    }
}

/// Runs [`ArchiveFormat::extract`] on the blocking thread pool.
///
/// # Errors
///
/// Same as [`ArchiveFormat::extract`]. A runtime shutdown while the task is
/// queued is reported as [`ExtractError::Cancelled`].
pub async fn extract_blocking(
    format: ArchiveFormat,
    archive: PathBuf,
    dest: PathBuf,
    path_map: Vec<PathMapping>,
    cancel: CancellationToken,
) -> Result<Vec<PathBuf>, ExtractError> {
    let task =
        tokio::task::spawn_blocking(move || format.extract(&archive, &dest, &path_map, &cancel));
    match task.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(ExtractError::Cancelled),
    }
}

fn extract_zip(
    archive_path: &Path,
    dest: &Path,
    path_map: &[PathMapping],
    cancel: &CancellationToken,
) -> Result<(), ExtractError> {
    let file = open_archive(archive_path)?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|e| malformed(archive_path, e))?;

    let mut indices = Vec::with_capacity(path_map.len());
    for mapping in path_map {
        let index = zip_index(&archive, &mapping.member)
            .ok_or_else(|| missing(archive_path, &mapping.member))?;
        let entry = archive
            .by_index(index)
            .map_err(|e| malformed(archive_path, e))?;
        if !entry.is_file() {
            return Err(ExtractError::NotAFile {
                member: mapping.member.clone(),
            });
        }
        indices.push(index);
    }

    for (mapping, index) in path_map.iter().zip(indices) {
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        let mut entry = archive
            .by_index(index)
            .map_err(|e| malformed(archive_path, e))?;
        let mode = entry.unix_mode();
        write_member(&mut entry, mapping, dest, mode)?;
    }

    Ok(())
}

fn extract_tar_gz(
    archive_path: &Path,
    dest: &Path,
    path_map: &[PathMapping],
    cancel: &CancellationToken,
) -> Result<(), ExtractError> {
    let wanted: HashMap<&str, &PathMapping> = path_map
        .iter()
        .map(|m| (m.member.as_str(), m))
        .collect();

    // Tarballs have no index: scan once to check every member, then again to write.
    let mut found: HashMap<&str, bool> = HashMap::new();
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(open_archive(archive_path)?)));
    for entry in archive
        .entries()
        .map_err(|e| malformed(archive_path, e))?
    {
        let entry = entry.map_err(|e| malformed(archive_path, e))?;
        let name = member_name(&String::from_utf8_lossy(&entry.path_bytes()));
        if let Some((member, _)) = wanted.get_key_value(name.as_str()) {
            found.insert(*member, entry.header().entry_type().is_file());
        }
    }

    for mapping in path_map {
        match found.get(mapping.member.as_str()) {
            None => return Err(missing(archive_path, &mapping.member)),
            Some(false) => {
                return Err(ExtractError::NotAFile {
                    member: mapping.member.clone(),
                });
            }
            Some(true) => {}
        }
    }

    let mut archive = Archive::new(GzDecoder::new(BufReader::new(open_archive(archive_path)?)));
    for entry in archive
        .entries()
        .map_err(|e| malformed(archive_path, e))?
    {
        let mut entry = entry.map_err(|e| malformed(archive_path, e))?;
        let name = member_name(&String::from_utf8_lossy(&entry.path_bytes()));
        let Some(mapping) = wanted.get(name.as_str()) else {
            continue;
        };
        if !entry.header().entry_type().is_file() {
            continue;
        }
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        let mode = entry.header().mode().ok();
        write_member(&mut entry, mapping, dest, mode)?;
    }

    Ok(())
}

/// Finds `member` in a zip archive, by exact name first and then by
/// normalized name.
fn zip_index(archive: &zip::ZipArchive<BufReader<File>>, member: &str) -> Option<usize> {
    archive.index_for_name(member).or_else(|| {
        (0..archive.len()).find(|&index| {
            archive
                .name_for_index(index)
                .is_some_and(|name| member_name(name) == member)
        })
    })
}

/// Normalizes an archive entry path for comparison with mapped member names.
fn member_name(raw: &str) -> String {
    let name = raw.replace('\\', "/");
    let mut name = name.as_str();
    while let Some(stripped) = name.strip_prefix("./") {
        name = stripped;
    }
    name.trim_end_matches('/').to_string()
}

/// Streams one member into a temporary file beside its install path, then
/// renames it into place.
fn write_member(
    reader: &mut impl Read,
    mapping: &PathMapping,
    dest: &Path,
    mode: Option<u32>,
) -> Result<(), ExtractError> {
    let target = dest.join(&mapping.install);
    let write_err = |source: std::io::Error| ExtractError::WriteDestination {
        member: mapping.member.clone(),
        destination: target.clone(),
        source,
    };

    let parent = target.parent().unwrap_or(dest);
    std::fs::create_dir_all(parent).map_err(write_err)?;
    let mut staged = NamedTempFile::new_in(parent).map_err(write_err)?;

    let mut buffer = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ExtractError::ReadMember {
                    member: mapping.member.clone(),
                    source,
                });
            }
        };
        staged.write_all(&buffer[..n]).map_err(write_err)?;
    }

    apply_mode(staged.as_file(), mode).map_err(write_err)?;
    staged.persist(&target).map_err(|e| write_err(e.error))?;

    tracing::debug!(member = %mapping.member, path = %target.display(), "installed member");
    Ok(())
}

#[cfg(unix)]
fn apply_mode(file: &File, mode: Option<u32>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match mode.map(|m| m & 0o777) {
        Some(m) if m != 0 => m,
        _ => DEFAULT_FILE_MODE,
    };
    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn apply_mode(_file: &File, _mode: Option<u32>) -> std::io::Result<()> {
    Ok(())
}

/// Rejects install paths that would escape the destination directory.
fn check_install_path(mapping: &PathMapping, dest: &Path) -> Result<(), ExtractError> {
    let escapes = mapping.install.as_os_str().is_empty()
        || mapping.install.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(ExtractError::WriteDestination {
            member: mapping.member.clone(),
            destination: dest.join(&mapping.install),
            source: std::io::Error::new(
                ErrorKind::InvalidInput,
                "install path must be relative and stay inside the destination",
            ),
        });
    }
    Ok(())
}

fn open_archive(path: &Path) -> Result<File, ExtractError> {
    File::open(path).map_err(|source| ExtractError::OpenArchive {
        archive: path.to_path_buf(),
        source,
    })
}

fn malformed(archive: &Path, source: impl Into<BoxError>) -> ExtractError {
    ExtractError::MalformedArchive {
        archive: archive.to_path_buf(),
        source: source.into(),
    }
}

fn missing(archive: &Path, member: &str) -> ExtractError {
    ExtractError::MissingMember {
        archive: archive.to_path_buf(),
        member: member.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{tar_gz_bytes, zip_bytes};

    const COMPILER: &[u8] = b"#!/bin/sh\necho pawncc\n";
    const LIBRARY: &[u8] = b"\x7fELF shared object";

    fn pawn_map(root: &str, lib: &str) -> Vec<PathMapping> {
        vec![
            PathMapping::new(format!("{root}/bin/pawncc"), "pawncc"),
            PathMapping::new(format!("{root}/lib/{lib}"), lib),
        ]
    }

    fn write_archive(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).expect("Should write archive");
        path
    }

    #[test]
    fn extract_zip_installs_mapped_members_only() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = zip_bytes(
            &[
                ("pawnc-3.10.10-darwin/bin/pawncc", COMPILER, 0o755),
                ("pawnc-3.10.10-darwin/lib/libpawnc.dylib", LIBRARY, 0o644),
                ("pawnc-3.10.10-darwin/include/core.inc", b"native", 0o644),
            ],
            &["pawnc-3.10.10-darwin/"],
        );
        let archive = write_archive(temp.path(), "a.zip", &bytes);
        let dest = temp.path().join("out");

        let installed = ArchiveFormat::Zip
            .extract(
                &archive,
                &dest,
                &pawn_map("pawnc-3.10.10-darwin", "libpawnc.dylib"),
                &CancellationToken::new(),
            )
            .expect("Should extract");

        assert_eq!(installed, vec![dest.join("pawncc"), dest.join("libpawnc.dylib")]);
        assert_eq!(std::fs::read(dest.join("pawncc")).expect("Should read"), COMPILER);
        assert_eq!(
            std::fs::read(dest.join("libpawnc.dylib")).expect("Should read"),
            LIBRARY
        );
        assert!(!dest.join("core.inc").exists());
        assert!(!dest.join("pawnc-3.10.10-darwin").exists());
    }

    #[test]
    fn extract_tar_gz_installs_mapped_members_only() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = tar_gz_bytes(
            &[
                ("pawnc-3.10.10-linux/bin/pawncc", COMPILER, 0o755),
                ("pawnc-3.10.10-linux/lib/libpawnc.so", LIBRARY, 0o644),
                ("pawnc-3.10.10-linux/bin/pawndisasm", b"other", 0o755),
            ],
            &["pawnc-3.10.10-linux/", "pawnc-3.10.10-linux/bin/"],
        );
        let archive = write_archive(temp.path(), "a.tar.gz", &bytes);
        let dest = temp.path().join("out");

        ArchiveFormat::TarGzip
            .extract(
                &archive,
                &dest,
                &pawn_map("pawnc-3.10.10-linux", "libpawnc.so"),
                &CancellationToken::new(),
            )
            .expect("Should extract");

        assert_eq!(std::fs::read(dest.join("pawncc")).expect("Should read"), COMPILER);
        assert_eq!(std::fs::read(dest.join("libpawnc.so")).expect("Should read"), LIBRARY);
        assert!(!dest.join("pawndisasm").exists());
    }

    #[test]
    fn install_paths_may_be_nested() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = zip_bytes(&[("root/bin/pawnc.dll", LIBRARY, 0o644)], &[]);
        let archive = write_archive(temp.path(), "a.zip", &bytes);
        let dest = temp.path().join("out");

        ArchiveFormat::Zip
            .extract(
                &archive,
                &dest,
                &[PathMapping::new("root/bin/pawnc.dll", "lib/x/pawnc.dll")],
                &CancellationToken::new(),
            )
            .expect("Should extract");

        assert!(dest.join("lib/x/pawnc.dll").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn executable_bits_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("Should create temp dir");
        let files = [
            ("root/bin/pawncc", COMPILER, 0o755),
            ("root/lib/libpawnc.so", LIBRARY, 0o644),
        ];
        let map = pawn_map("root", "libpawnc.so");

        for (format, bytes) in [
            (ArchiveFormat::Zip, zip_bytes(&files, &[])),
            (ArchiveFormat::TarGzip, tar_gz_bytes(&files, &[])),
        ] {
            let archive = write_archive(temp.path(), format.as_str(), &bytes);
            let dest = temp.path().join(format!("out-{}", format.as_str()));
            format
                .extract(&archive, &dest, &map, &CancellationToken::new())
                .expect("Should extract");

            let mode = |name: &str| {
                std::fs::metadata(dest.join(name))
                    .expect("Should stat")
                    .permissions()
                    .mode()
                    & 0o777
            };
            assert_eq!(mode("pawncc"), 0o755, "{format:?}");
            assert_eq!(mode("libpawnc.so"), 0o644, "{format:?}");
        }
    }

    #[test]
    fn existing_files_are_replaced() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = tar_gz_bytes(&[("root/bin/pawncc", COMPILER, 0o755)], &[]);
        let archive = write_archive(temp.path(), "a.tar.gz", &bytes);
        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).expect("Should create dest");
        std::fs::write(dest.join("pawncc"), b"stale").expect("Should write stale file");

        ArchiveFormat::TarGzip
            .extract(
                &archive,
                &dest,
                &[PathMapping::new("root/bin/pawncc", "pawncc")],
                &CancellationToken::new(),
            )
            .expect("Should extract");

        assert_eq!(std::fs::read(dest.join("pawncc")).expect("Should read"), COMPILER);
    }

    #[test]
    fn missing_member_is_named_and_nothing_is_written() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let files = [("root/bin/pawncc", COMPILER, 0o755)];
        let map = pawn_map("root", "libpawnc.so");

        for (format, bytes) in [
            (ArchiveFormat::Zip, zip_bytes(&files, &[])),
            (ArchiveFormat::TarGzip, tar_gz_bytes(&files, &[])),
        ] {
            let archive = write_archive(temp.path(), format.as_str(), &bytes);
            let dest = temp.path().join(format!("out-{}", format.as_str()));

            let err = format
                .extract(&archive, &dest, &map, &CancellationToken::new())
                .unwrap_err();

            assert!(
                matches!(err, ExtractError::MissingMember { ref member, .. } if member == "root/lib/libpawnc.so"),
                "{format:?}: {err:?}"
            );
            assert!(err.is_archive_fault());
            assert!(!dest.exists(), "{format:?} wrote into the destination");
        }
    }

    #[test]
    fn directory_member_is_not_a_file() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = tar_gz_bytes(&[], &["root/bin"]);
        let archive = write_archive(temp.path(), "a.tar.gz", &bytes);

        let err = ArchiveFormat::TarGzip
            .extract(
                &archive,
                &temp.path().join("out"),
                &[PathMapping::new("root/bin", "bin")],
                &CancellationToken::new(),
            )
            .unwrap_err();

        assert!(matches!(err, ExtractError::NotAFile { ref member } if member == "root/bin"));
    }

    #[test]
    fn dot_slash_prefixed_tar_members_match() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = tar_gz_bytes(&[("./root/bin/pawncc", COMPILER, 0o755)], &[]);
        let archive = write_archive(temp.path(), "a.tar.gz", &bytes);
        let dest = temp.path().join("out");

        ArchiveFormat::TarGzip
            .extract(
                &archive,
                &dest,
                &[PathMapping::new("root/bin/pawncc", "pawncc")],
                &CancellationToken::new(),
            )
            .expect("Should extract");

        assert!(dest.join("pawncc").is_file());
    }

    #[test]
    fn dot_slash_prefixed_zip_members_match() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = zip_bytes(
            &[
                ("./root/bin/pawncc", COMPILER, 0o755),
                ("root/lib/libpawnc.so", LIBRARY, 0o644),
            ],
            &[],
        );
        let archive = write_archive(temp.path(), "a.zip", &bytes);
        let dest = temp.path().join("out");

        ArchiveFormat::Zip
            .extract(
                &archive,
                &dest,
                &pawn_map("root", "libpawnc.so"),
                &CancellationToken::new(),
            )
            .expect("Should extract");

        assert_eq!(std::fs::read(dest.join("pawncc")).expect("Should read"), COMPILER);
        assert_eq!(
            std::fs::read(dest.join("libpawnc.so")).expect("Should read"),
            LIBRARY
        );
    }

    #[test]
    fn member_names_are_normalized() {
        assert_eq!(member_name("./root/bin/pawncc"), "root/bin/pawncc");
        assert_eq!(member_name("././root\\bin\\pawncc"), "root/bin/pawncc");
        assert_eq!(member_name("root/bin/"), "root/bin");
    }

    #[test]
    fn garbage_is_a_malformed_archive() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive = write_archive(temp.path(), "bad", b"<html>Not Found</html>");
        let map = [PathMapping::new("root/bin/pawncc", "pawncc")];

        for format in [ArchiveFormat::Zip, ArchiveFormat::TarGzip] {
            let err = format
                .extract(&archive, &temp.path().join("out"), &map, &CancellationToken::new())
                .unwrap_err();
            assert!(
                matches!(err, ExtractError::MalformedArchive { .. }),
                "{format:?}: {err:?}"
            );
            assert!(err.is_archive_fault());
        }
    }

    #[test]
    fn truncated_tar_gz_is_an_archive_fault() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let big: Vec<u8> = (0..64 * 1024).map(|i| (i * 7 % 251) as u8).collect();
        let bytes = tar_gz_bytes(&[("root/bin/pawncc", &big, 0o755)], &[]);
        let archive = write_archive(temp.path(), "a.tar.gz", &bytes[..bytes.len() / 2]);

        let err = ArchiveFormat::TarGzip
            .extract(
                &archive,
                &temp.path().join("out"),
                &[PathMapping::new("root/bin/pawncc", "pawncc")],
                &CancellationToken::new(),
            )
            .unwrap_err();

        assert!(err.is_archive_fault(), "{err:?}");
    }

    #[test]
    fn missing_archive_file_is_not_an_archive_fault() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let err = ArchiveFormat::Zip
            .extract(
                &temp.path().join("absent.zip"),
                &temp.path().join("out"),
                &[PathMapping::new("a", "a")],
                &CancellationToken::new(),
            )
            .unwrap_err();

        assert!(matches!(err, ExtractError::OpenArchive { .. }));
        assert!(!err.is_archive_fault());
    }

    #[test]
    fn escaping_install_path_is_rejected() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = zip_bytes(&[("root/bin/pawncc", COMPILER, 0o755)], &[]);
        let archive = write_archive(temp.path(), "a.zip", &bytes);

        let err = ArchiveFormat::Zip
            .extract(
                &archive,
                &temp.path().join("out"),
                &[PathMapping::new("root/bin/pawncc", "../pawncc")],
                &CancellationToken::new(),
            )
            .unwrap_err();

        assert!(matches!(err, ExtractError::WriteDestination { .. }));
        assert!(!temp.path().join("pawncc").exists());
    }

    #[test]
    fn cancelled_token_stops_before_writing() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = zip_bytes(&[("root/bin/pawncc", COMPILER, 0o755)], &[]);
        let archive = write_archive(temp.path(), "a.zip", &bytes);
        let dest = temp.path().join("out");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = ArchiveFormat::Zip
            .extract(
                &archive,
                &dest,
                &[PathMapping::new("root/bin/pawncc", "pawncc")],
                &cancel,
            )
            .unwrap_err();

        assert!(matches!(err, ExtractError::Cancelled));
        assert!(!dest.join("pawncc").exists());
    }

    #[tokio::test]
    async fn extract_blocking_runs_off_the_runtime() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let bytes = tar_gz_bytes(&[("root/bin/pawncc", COMPILER, 0o755)], &[]);
        let archive = write_archive(temp.path(), "a.tar.gz", &bytes);
        let dest = temp.path().join("out");

        let installed = extract_blocking(
            ArchiveFormat::TarGzip,
            archive,
            dest.clone(),
            vec![PathMapping::new("root/bin/pawncc", "pawncc")],
            CancellationToken::new(),
        )
        .await
        .expect("Should extract");

        assert_eq!(installed, vec![dest.join("pawncc")]);
    }

    #[test]
    fn format_from_filename() {
        assert_eq!(
            ArchiveFormat::from_filename("pawnc-3.10.10-linux.tar.gz"),
            Some(ArchiveFormat::TarGzip)
        );
        assert_eq!(
            ArchiveFormat::from_filename("pawnc-3.10.10-windows.ZIP"),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(ArchiveFormat::from_filename("pawncc.exe"), None);
    }
}
