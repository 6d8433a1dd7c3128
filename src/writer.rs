//! Persisting cut sets.
//!
//! Every sub-volume of a cut set is saved as a header and data file pair
//! named after the sub-volume. The header is the parent's header text with
//! its three dimension lines rewritten, and the data file is the encoded
//! sub-volume in the parent's pack format. Both files of a sub-volume are
//! first written to temporary files in the destination directory, then
//! renamed into place, so that a failed sub-volume leaves no file behind.

use crate::error::{Result, ScanError};
use crate::header::rewrite_dimensions;
use crate::object::{ScanImage, ScanObject, SubVolume};
use crate::typedef::DataType;
use crate::util::header_path_for;
use crate::volume::codec::{self, CodecOptions, DEFAULT_CHUNK_SIZE};
use byteordered::Endianness;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Options and flags which can be used to configure how cuts are saved.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    destination: PathBuf,
    chunk_size: usize,
    endianness: Endianness,
    overwrite: bool,
}

/// The files written for one sub-volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCut {
    /// The rewritten header.
    pub header_path: PathBuf,
    /// The encoded voxels.
    pub data_path: PathBuf,
    /// Size of the data file in bytes.
    pub data_len: u64,
}

impl WriterOptions {
    /// Save into the `destination` directory, which is created if missing.
    pub fn new<P: Into<PathBuf>>(destination: P) -> WriterOptions {
        WriterOptions {
            destination: destination.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            endianness: Endianness::Little,
            overwrite: false,
        }
    }

    /// Maximum number of bytes written to a data file at once.
    pub fn chunk_size(&mut self, chunk_size: usize) -> &mut Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Byte order of multi-byte voxels.
    pub fn endianness(&mut self, endianness: Endianness) -> &mut Self {
        self.endianness = endianness;
        self
    }

    /// Whether existing files at the destination may be replaced.
    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    /// The destination directory.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    fn paths_of(&self, child: &SubVolume) -> (PathBuf, PathBuf) {
        let data_path = self.destination.join(child.filename());
        (header_path_for(&data_path), data_path)
    }

    /// List the files a save of the image's cuts would replace.
    ///
    /// # Errors
    ///
    /// - `ScanError::NotCut` if the image was not cut.
    pub fn conflicts(&self, image: &ScanImage) -> Result<Vec<PathBuf>> {
        let cuts = image.require_cuts()?;
        let mut found = Vec::new();
        for child in cuts {
            let (header_path, data_path) = self.paths_of(child);
            for path in vec![header_path, data_path] {
                if path.exists() {
                    found.push(path);
                }
            }
        }
        Ok(found)
    }

    /// Save every sub-volume of the image's cut set, in child order.
    ///
    /// # Errors
    ///
    /// - `ScanError::NotCut` if the image was not cut.
    /// - `ScanError::DestinationExists` listing the files which would be
    ///   replaced, unless overwriting was allowed. Nothing is written.
    /// - `ScanError::ZeroScaleFactor` if a scaled sub-volume cannot be
    ///   converted back. Nothing is written.
    /// - `ScanError::PartialSave` if a sub-volume fails after others were
    ///   saved. The files of the saved sub-volumes are listed and left in
    ///   place; the failed sub-volume has no file at the destination.
    pub fn write_cuts(&self, image: &ScanImage) -> Result<Vec<SavedCut>> {
        let cuts = image.require_cuts()?;
        if !self.overwrite {
            let conflicts = self.conflicts(image)?;
            if !conflicts.is_empty() {
                return Err(ScanError::DestinationExists(conflicts));
            }
        }
        let data_type = image.parameters().data_type()?;
        for child in cuts {
            codec::check_invertible(child.volume()?)?;
        }
        fs::create_dir_all(&self.destination)?;

        let mut saved = Vec::with_capacity(cuts.len());
        let mut written = Vec::new();
        for child in cuts {
            match self.write_child(image.header_text(), child, data_type, &mut written) {
                Ok(s) => saved.push(s),
                Err(e) if written.is_empty() => return Err(e),
                Err(e) => return Err(ScanError::PartialSave(written, Box::new(e))),
            }
        }
        Ok(saved)
    }

    /// Write one child. Both files are fully written under temporary
    /// names before either is moved into place, and a data file already
    /// moved is removed again if its header cannot follow.
    fn write_child(
        &self,
        template: &str,
        child: &SubVolume,
        data_type: DataType,
        written: &mut Vec<PathBuf>,
    ) -> Result<SavedCut> {
        let volume = child.volume()?;
        let (x, y, z) = volume.dimensions();
        let (header_path, data_path) = self.paths_of(child);

        let mut data_tmp = NamedTempFile::new_in(&self.destination)?;
        let options = CodecOptions {
            chunk_size: self.chunk_size,
            endianness: self.endianness,
        };
        let data_len = codec::encode(BufWriter::new(data_tmp.as_file_mut()), volume, data_type, options)?;
        data_tmp.as_file().sync_all()?;

        let mut header_tmp = NamedTempFile::new_in(&self.destination)?;
        header_tmp.write_all(rewrite_dimensions(template, x, y, z).as_bytes())?;
        header_tmp.as_file().sync_all()?;

        let _ = data_tmp.persist(&data_path).map_err(|e| e.error)?;
        if let Err(e) = header_tmp.persist(&header_path) {
            let _ = fs::remove_file(&data_path);
            return Err(e.error.into());
        }
        written.push(header_path.clone());
        written.push(data_path.clone());

        log::info!("Saved {} ({} bytes)", data_path.display(), data_len);
        Ok(SavedCut {
            header_path,
            data_path,
            data_len,
        })
    }
}
