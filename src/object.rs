//! Module for handling and retrieving complete scan objects.
//!
//! A scan object ties together a parsed header and its decoded volume,
//! which lives in a scratch file. [`ScanImage`] is the root object
//! read from a header and data file pair, while [`SubVolume`] is a child
//! produced by cutting a root object. Both implement [`ScanObject`].
//!
//! [`ScanImage`]: ./struct.ScanImage.html
//! [`SubVolume`]: ./struct.SubVolume.html
//! [`ScanObject`]: ./trait.ScanObject.html

use crate::axis::IntoAxis;
use crate::cut::CutSet;
use crate::error::{Result, ScanError};
use crate::header::Parameters;
use crate::typedef::Modality;
use crate::util::{file_name_of, header_path_for, subject_id_from};
use crate::volume::codec::{self, CodecOptions, DecodeRequest, DEFAULT_CHUNK_SIZE};
use crate::volume::scratch::ScratchSpace;
use crate::volume::Volume;
use byteordered::Endianness;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Trait type for the entities holding a scan volume: root images as well
/// as the sub-volumes cut out of them.
pub trait ScanObject {
    /// The file name of the data file this object stands for.
    fn filename(&self) -> &str;

    /// The header parameters this object was read with.
    fn parameters(&self) -> &Parameters;

    /// Obtain a reference to the object's volume.
    ///
    /// # Errors
    ///
    /// - `ScanError::NoVolumeData` if no volume was decoded yet.
    fn volume(&self) -> Result<&Volume>;

    /// Obtain a mutable reference to the object's volume.
    fn volume_mut(&mut self) -> Result<&mut Volume>;

    /// The scanner modality.
    fn modality(&self) -> Modality {
        self.parameters().modality
    }

    /// Spatial dimensions `(x, y, z)` of the held volume.
    fn dimensions(&self) -> Result<(usize, usize, usize)> {
        Ok(self.volume()?.dimensions())
    }

    /// Extent `(rows, columns)` of the held volume seen along `axis`.
    fn view_bounds<A: IntoAxis>(&self, axis: A) -> Result<(usize, usize)>
    where
        Self: Sized,
    {
        self.volume()?.view_bounds(axis)
    }

    /// Rotate the held volume about `axis`.
    fn rotate_on_axis<A: IntoAxis>(&mut self, axis: A) -> Result<()>
    where
        Self: Sized,
    {
        self.volume_mut()?.rotate_on_axis(axis)
    }
}

/// Options and flags which can be used to configure how a scan is read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderOptions {
    chunk_size: usize,
    endianness: Endianness,
    scratch_dir: Option<PathBuf>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            endianness: Endianness::Little,
            scratch_dir: None,
        }
    }
}

impl ReaderOptions {
    /// Creates a blank new set of options ready for configuration.
    pub fn new() -> ReaderOptions {
        ReaderOptions::default()
    }

    /// Maximum number of bytes read from the data file at once.
    pub fn chunk_size(&mut self, chunk_size: usize) -> &mut Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Byte order of multi-byte voxels in the data file.
    pub fn endianness(&mut self, endianness: Endianness) -> &mut Self {
        self.endianness = endianness;
        self
    }

    /// Directory in which scratch files are created. If not set, each root
    /// image creates a private temporary directory, removed along with it.
    pub fn scratch_dir<P: Into<PathBuf>>(&mut self, dir: P) -> &mut Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Read the header of a scan. The header is expected next to the data
    /// file, with `.hdr` appended to the data file's name. The volume is
    /// not decoded until [`ScanImage::decode`] is called.
    ///
    /// [`ScanImage::decode`]: ./struct.ScanImage.html#method.decode
    pub fn read_file<P: AsRef<Path>>(&self, data_path: P, modality: Modality) -> Result<ScanImage> {
        let header_path = header_path_for(&data_path);
        self.read_file_pair(header_path, data_path, modality)
    }

    /// Read the header of a scan from a separate header path, which is
    /// useful when file names are not conventional.
    ///
    /// # Errors
    ///
    /// - `ScanError::MissingKeywords` naming every required keyword the
    ///   header lacks.
    /// - `ScanError::UnknownDataType` if the pack format is not supported.
    pub fn read_file_pair<P, Q>(
        &self,
        header_path: P,
        data_path: Q,
        modality: Modality,
    ) -> Result<ScanImage>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let header_text = fs::read_to_string(&header_path)?;
        let params = Parameters::parse(&header_text, modality)?;
        let _ = params.data_type()?;

        let scratch = match &self.scratch_dir {
            Some(dir) => ScratchSpace::in_dir(dir)?,
            None => ScratchSpace::private()?,
        };
        let filename = file_name_of(&data_path);
        log::info!(
            "Loaded {} header {}: {}x{}x{}, {} frame(s)",
            modality.name(),
            header_path.as_ref().display(),
            params.x_dimension,
            params.y_dimension,
            params.z_dimension,
            params.total_frames
        );

        Ok(ScanImage {
            data_path: data_path.as_ref().to_owned(),
            header_path: header_path.as_ref().to_owned(),
            subject_id: subject_id_from(&filename),
            filename,
            header_text,
            params: Arc::new(params),
            codec: CodecOptions {
                chunk_size: self.chunk_size,
                endianness: self.endianness,
            },
            volume: None,
            cuts: None,
            scratch,
        })
    }
}

/// A root scan image, read from a header and data file pair.
#[derive(Debug)]
pub struct ScanImage {
    data_path: PathBuf,
    header_path: PathBuf,
    filename: String,
    subject_id: String,
    header_text: String,
    params: Arc<Parameters>,
    codec: CodecOptions,
    volume: Option<Volume>,
    cuts: Option<CutSet>,
    scratch: ScratchSpace,
}

impl ScanImage {
    /// Path to the data file.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Path to the header file.
    pub fn header_path(&self) -> &Path {
        &self.header_path
    }

    /// The header text as read, used as the template of saved cuts.
    pub fn header_text(&self) -> &str {
        &self.header_text
    }

    /// Identifier of the scanned subject, derived from the file name.
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Replace the subject identifier.
    pub fn set_subject_id<S: Into<String>>(&mut self, subject_id: S) {
        self.subject_id = subject_id.into();
    }

    /// Byte level settings this image was read with.
    pub fn codec_options(&self) -> CodecOptions {
        self.codec
    }

    /// Directory holding the scratch files of this image and its cuts.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Location of the scratch file staging the decoded volume.
    pub fn scratch_path(&self) -> Option<&Path> {
        self.volume.as_ref().map(Volume::scratch_path)
    }

    /// Whether a volume was decoded.
    pub fn is_decoded(&self) -> bool {
        self.volume.is_some()
    }

    /// Decode a window of the data file, replacing any previously decoded
    /// volume. Existing cuts are discarded. On failure, the image keeps its
    /// previous volume and cuts.
    pub fn decode(&mut self, request: &DecodeRequest) -> Result<&Volume> {
        let mut volume = codec::decode(
            &self.data_path,
            &self.params,
            request,
            self.codec,
            &self.scratch,
            &self.filename,
        )?;
        volume.commit(self.volume.as_mut())?;
        self.cuts = None;
        self.volume = None;
        Ok(&*self.volume.get_or_insert(volume))
    }

    /// Decode the whole data file with scaling applied.
    pub fn decode_all(&mut self) -> Result<&Volume> {
        self.decode(&DecodeRequest::default())
    }

    /// The live cut set, if the image was cut.
    pub fn cuts(&self) -> Option<&CutSet> {
        self.cuts.as_ref()
    }

    /// The live cut set.
    ///
    /// # Errors
    ///
    /// - `ScanError::NotCut` if the image was not cut.
    pub fn require_cuts(&self) -> Result<&CutSet> {
        self.cuts.as_ref().ok_or(ScanError::NotCut)
    }

    /// Discard the live cut set and its scratch files.
    pub fn clear_cuts(&mut self) {
        self.cuts = None;
    }

    /// Install a new cut set of staged children. On failure, the previous
    /// cut set stays in place.
    pub(crate) fn replace_cuts(&mut self, mut cuts: CutSet) -> Result<&CutSet> {
        cuts.commit(self.cuts.as_mut())?;
        self.cuts = None;
        Ok(self.cuts.get_or_insert(cuts))
    }

    pub(crate) fn shared_parameters(&self) -> Arc<Parameters> {
        Arc::clone(&self.params)
    }

    pub(crate) fn scratch_space(&self) -> &ScratchSpace {
        &self.scratch
    }
}

impl ScanObject for ScanImage {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn volume(&self) -> Result<&Volume> {
        self.volume.as_ref().ok_or(ScanError::NoVolumeData)
    }

    fn volume_mut(&mut self) -> Result<&mut Volume> {
        self.volume.as_mut().ok_or(ScanError::NoVolumeData)
    }
}

/// A block of a root image produced by a cut. It owns an independent copy
/// of its voxels in its own scratch file, and shares the parent's header
/// parameters.
#[derive(Debug)]
pub struct SubVolume {
    filename: String,
    params: Arc<Parameters>,
    volume: Volume,
}

impl SubVolume {
    pub(crate) fn new(filename: String, params: Arc<Parameters>, volume: Volume) -> SubVolume {
        SubVolume {
            filename,
            params,
            volume,
        }
    }

    /// Location of the scratch file holding this sub-volume.
    pub fn scratch_path(&self) -> &Path {
        self.volume.scratch_path()
    }

    pub(crate) fn check_commit(&self, replacing: Option<&SubVolume>) -> Result<()> {
        self.volume.check_commit(replacing.map(|c| &c.volume))
    }

    pub(crate) fn commit(&mut self, replacing: Option<&mut SubVolume>) -> Result<()> {
        self.volume.commit(replacing.map(|c| &mut c.volume))
    }

    /// Move the volume out of the sub-volume.
    pub fn into_volume(self) -> Volume {
        self.volume
    }
}

impl ScanObject for SubVolume {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn volume(&self) -> Result<&Volume> {
        Ok(&self.volume)
    }

    fn volume_mut(&mut self) -> Result<&mut Volume> {
        Ok(&mut self.volume)
    }
}
