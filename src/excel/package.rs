//! Zip container for the xlsx package.
//!
//! Parts are read on demand; the save path iterates the source archive and
//! raw-copies every untouched entry without recompression, writing replaced
//! parts in place, dropping removed parts, and appending new ones. The
//! calculation chain is always dropped: its entries go stale once sheets are
//! added or replaced, and consumers rebuild it.

use crate::error::{FormpressError, FormpressResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

const CALC_CHAIN: &str = "xl/calcChain.xml";

#[derive(Debug)]
pub struct Package {
    src: PathBuf,
    source_names: Vec<String>,
    replaced: BTreeMap<String, Vec<u8>>,
    added: BTreeMap<String, Vec<u8>>,
    removed: BTreeSet<String>,
}

impl Package {
    /// Open a package file, scanning its entry names. The archive handle is
    /// scoped to each read; nothing stays open between calls.
    pub fn open(path: &Path) -> FormpressResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FormpressError::NotFound(path.to_path_buf()),
            _ => FormpressError::Io(e),
        })?;
        let archive = ZipArchive::new(file)?;
        let source_names = archive.file_names().map(str::to_owned).collect();
        Ok(Self {
            src: path.to_path_buf(),
            source_names,
            replaced: BTreeMap::new(),
            added: BTreeMap::new(),
            removed: BTreeSet::new(),
        })
    }

    pub fn has(&self, name: &str) -> bool {
        if self.removed.contains(name) {
            return false;
        }
        self.added.contains_key(name)
            || self.replaced.contains_key(name)
            || self.source_names.iter().any(|n| n == name)
    }

    /// Whether the part exists in the source archive (regardless of pending
    /// edits).
    pub fn in_source(&self, name: &str) -> bool {
        self.source_names.iter().any(|n| n == name)
    }

    /// Read a part, preferring pending in-memory content.
    pub fn read(&self, name: &str) -> FormpressResult<Vec<u8>> {
        if self.removed.contains(name) {
            return Err(FormpressError::MissingPart(name.to_string()));
        }
        if let Some(bytes) = self.added.get(name).or_else(|| self.replaced.get(name)) {
            return Ok(bytes.clone());
        }
        let mut archive = ZipArchive::new(File::open(&self.src)?)?;
        let mut part = archive
            .by_name(name)
            .map_err(|_| FormpressError::MissingPart(name.to_string()))?;
        let mut buf = Vec::with_capacity(part.size() as usize);
        part.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Replace an existing part's content for the next save.
    pub fn replace(&mut self, name: &str, bytes: Vec<u8>) {
        self.removed.remove(name);
        if self.added.contains_key(name) {
            self.added.insert(name.to_string(), bytes);
        } else {
            self.replaced.insert(name.to_string(), bytes);
        }
    }

    /// Stage a brand-new part.
    pub fn add(&mut self, name: &str, bytes: Vec<u8>) {
        self.removed.remove(name);
        if self.in_source(name) {
            self.replaced.insert(name.to_string(), bytes);
        } else {
            self.added.insert(name.to_string(), bytes);
        }
    }

    /// Drop a part from the next save.
    pub fn remove(&mut self, name: &str) {
        self.added.remove(name);
        self.replaced.remove(name);
        if self.in_source(name) {
            self.removed.insert(name.to_string());
        }
    }

    /// Write the assembled package to `dest`.
    pub fn save(&self, dest: &Path) -> FormpressResult<()> {
        let mut zin = ZipArchive::new(File::open(&self.src)?)?;
        let mut zout = ZipWriter::new(File::create(dest)?);

        let opt: FileOptions<'_, ()> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(1));

        for i in 0..zin.len() {
            let entry = zin.by_index_raw(i)?;
            let name = entry.name().to_owned();
            if self.removed.contains(&name) || name == CALC_CHAIN {
                continue;
            }
            if let Some(content) = self.replaced.get(&name) {
                zout.start_file(name, opt)?;
                zout.write_all(content)?;
            } else {
                zout.raw_copy_file(entry)?;
            }
        }

        for (name, content) in &self.added {
            zout.start_file(name.clone(), opt)?;
            zout.write_all(content)?;
        }

        zout.finish()?;
        Ok(())
    }
}
