//! Archive fixtures shared by the unit tests.

use std::sync::Arc;

use tar::{Builder, EntryType, Header};

use crate::fs::TarFs;
use crate::io::MemoryReader;

pub(crate) const MTIME: u64 = 1_600_000_000;

/// One member of a fixture archive. Names are written into the header
/// verbatim, so `./foo` stays `./foo`.
pub(crate) enum Member<'a> {
    File(&'a str, &'a [u8]),
    Dir(&'a str),
    Symlink(&'a str, &'a str),
    /// Arbitrary type flag byte and content
    Raw(&'a str, u8, &'a [u8]),
}

pub(crate) fn archive(members: &[Member]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());

    for member in members {
        let mut header = Header::new_ustar();
        let (path, flag, mode, data): (&str, u8, u32, &[u8]) = match *member {
            Member::File(path, data) => (path, EntryType::Regular.as_byte(), 0o644, data),
            Member::Dir(path) => (path, EntryType::Directory.as_byte(), 0o750, b""),
            Member::Symlink(path, target) => {
                header.set_link_name(target).unwrap();
                (path, EntryType::Symlink.as_byte(), 0o777, b"")
            }
            Member::Raw(path, flag, data) => (path, flag, 0o644, data),
        };

        header.as_mut_bytes()[..path.len()].copy_from_slice(path.as_bytes());
        header.as_mut_bytes()[156] = flag;
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_mtime(MTIME);
        header.set_cksum();
        builder.append(&header, data).unwrap();
    }

    builder.into_inner().unwrap()
}

/// Encode one PAX record, `"<len> <key>=<value>\n"` where `len` counts itself.
pub(crate) fn pax_record(key: &str, value: &str) -> Vec<u8> {
    let body = key.len() + value.len() + 3;
    let mut len = body + body.to_string().len();
    if len.to_string().len() != body.to_string().len() {
        len = body + len.to_string().len();
    }
    format!("{len} {key}={value}\n").into_bytes()
}

/// Files only; every directory has to be synthesized. Each file holds its
/// own base name as content.
pub(crate) fn sample_archive() -> Vec<u8> {
    archive(&[
        Member::File("foo", b"foo"),
        Member::File("bar", b"bar"),
        Member::File("dir1/file11", b"file11"),
        Member::File("dir1/file12", b"file12"),
        Member::File("dir1/dir11/file111", b"file111"),
        Member::File("dir2/dir21/file211", b"file211"),
        Member::File("dir2/dir21/file212", b"file212"),
    ])
}

/// The same tree as [`sample_archive`], written the way `tar -C dir .` does.
pub(crate) fn dot_dir_archive() -> Vec<u8> {
    archive(&[
        Member::Dir("./"),
        Member::File("./bar", b"bar"),
        Member::File("./foo", b"foo"),
        Member::Dir("./dir1/"),
        Member::Dir("./dir1/dir11/"),
        Member::File("./dir1/dir11/file111", b"file111"),
        Member::File("./dir1/file11", b"file11"),
        Member::File("./dir1/file12", b"file12"),
        Member::Dir("./dir2/"),
        Member::Dir("./dir2/dir21/"),
        Member::File("./dir2/dir21/file211", b"file211"),
        Member::File("./dir2/dir21/file212", b"file212"),
    ])
}

pub(crate) async fn open(data: Vec<u8>) -> TarFs<MemoryReader> {
    TarFs::new(Arc::new(MemoryReader::new(data))).await.unwrap()
}

pub(crate) async fn sample_fs() -> TarFs<MemoryReader> {
    open(sample_archive()).await
}
