//! In-memory archive builders shared by unit tests.

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::Builder;
use zip::write::SimpleFileOptions;

/// A file to place in a test archive: member name, contents, unix mode.
pub(crate) type Member<'a> = (&'a str, &'a [u8], u32);

/// Builds a zip archive holding `files` and the directories in `dirs`.
pub(crate) fn zip_bytes(files: &[Member<'_>], dirs: &[&str]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for dir in dirs {
        writer
            .add_directory(*dir, SimpleFileOptions::default())
            .expect("Should add directory");
    }
    for (name, contents, mode) in files {
        let options = SimpleFileOptions::default().unix_permissions(*mode);
        writer.start_file(*name, options).expect("Should start file");
        writer.write_all(contents).expect("Should write file");
    }
    writer.finish().expect("Should finish zip").into_inner()
}

/// Builds a gzip-compressed tar archive holding `files` and the directories in `dirs`.
pub(crate) fn tar_gz_bytes(files: &[Member<'_>], dirs: &[&str]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    for dir in dirs {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, *dir, std::io::empty())
            .expect("Should append directory");
    }

    for (name, contents, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, *name, *contents)
            .expect("Should append file");
    }

    builder
        .into_inner()
        .expect("Should finish tar")
        .finish()
        .expect("Should finish gzip")
}
