//! Chunked decoding and encoding of raw data files.
//!
//! Data files hold packed voxels without any structure of their own:
//! frames follow each other, and each frame is stored plane by plane, row
//! by row. Reads and writes go through a byte buffer of at most
//! `chunk_size` bytes, so that only the decoded volume itself is resident
//! in full.

use super::element::{decode_into, encode_into};
use super::range::{IndexRange, IndexSelection};
use super::scratch::ScratchSpace;
use super::Volume;
use crate::error::{Result, ScanError};
use crate::header::Parameters;
use crate::typedef::DataType;
use byteordered::Endianness;
use std::cmp;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Default upper bound of bytes moved per read or write call.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000_000;

/// Byte level settings shared by decoding and encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Maximum number of bytes per read or write.
    pub chunk_size: usize,
    /// Byte order of multi-byte voxels.
    pub endianness: Endianness,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            endianness: Endianness::Little,
        }
    }
}

impl CodecOptions {
    /// Chunk length in bytes, a positive multiple of the element size.
    fn chunk_bytes(&self, data_type: DataType) -> usize {
        let bpp = data_type.size_of();
        cmp::max(self.chunk_size / bpp * bpp, bpp)
    }
}

/// The window of a data file to decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeRequest {
    /// Planes to read, all by default.
    pub planes: IndexSelection,
    /// Frames to read, all by default.
    pub frames: IndexSelection,
    /// Keep the raw stored values instead of applying the scale factors.
    pub unscaled: bool,
}

/// Scale factors of the frames in `frames`.
pub(crate) fn scale_factors_for(params: &Parameters, frames: IndexRange) -> Result<Vec<f64>> {
    params
        .scale_factor
        .get(frames.first()..=frames.last())
        .map(<[f64]>::to_vec)
        .ok_or_else(|| {
            ScanError::InvalidHeaderValue(
                "scale_factor",
                format!("no scale factor for frames {}", frames),
            )
        })
}

/// Decode a window of the data file at `path` into a volume. Voxels are
/// read straight into a new, uncommitted scratch file for the entity
/// `name`, and scaled there unless the request says otherwise. Nothing is
/// allocated before the window is found to be valid.
///
/// # Errors
///
/// - `ScanError::UnknownDataType` if the header declares an unsupported
///   pack format.
/// - `ScanError::MalformedRange` or `ScanError::RangeOutOfBounds` if a
///   selection cannot be normalized.
/// - `ScanError::TruncatedData` if the file ends before the last voxel of
///   the window.
pub fn decode<P: AsRef<Path>>(
    path: P,
    params: &Parameters,
    request: &DecodeRequest,
    options: CodecOptions,
    scratch: &ScratchSpace,
    name: &str,
) -> Result<Volume> {
    let path = path.as_ref();
    let data_type = params.data_type()?;
    let bpp = data_type.size_of();
    let (x, y, z) = params.dimensions();
    let (planes, plane_warning) = request.planes.normalize("plane", z)?;
    let (frames, frame_warning) = request.frames.normalize("frame", params.total_frames)?;
    let warnings: Vec<_> = plane_warning.into_iter().chain(frame_warning).collect();

    let volume_len = (x * y * z) as u64;
    let plane_len = x * y;
    let matsize = plane_len * planes.len();
    let offset_of =
        |f: usize| bpp as u64 * (f as u64 * volume_len + (planes.first() * plane_len) as u64);

    let mut file = File::open(path)?;
    let expected = offset_of(frames.last()) + (matsize * bpp) as u64;
    let actual = file.metadata()?.len();
    if actual < expected {
        return Err(ScanError::TruncatedData(path.to_owned(), expected, actual));
    }

    let chunk = cmp::min(options.chunk_bytes(data_type), matsize * bpp);
    let chunks_per_frame = (matsize * bpp + chunk - 1) / chunk;
    log::info!(
        "Decoding {}: {}x{}x{} voxels, planes {}, frames {}, {} chunk(s)",
        path.display(),
        x,
        y,
        z,
        planes,
        frames,
        chunks_per_frame * frames.len()
    );

    let scale_factors = scale_factors_for(params, frames)?;
    let mut staging = scratch.allocate(name, matsize * frames.len())?;
    {
        let buf = staging.as_mut_slice();
        let mut raw = vec![0u8; chunk];
        for (i, f) in frames.iter().enumerate() {
            let _ = file.seek(SeekFrom::Start(offset_of(f)))?;
            let dst = &mut buf[i * matsize..(i + 1) * matsize];
            read_chunked(&mut file, data_type, dst, &mut raw, options.endianness)?;
            if !request.unscaled {
                let sf = scale_factors[i] as f32;
                for v in dst.iter_mut() {
                    *v *= sf;
                }
            }
        }
    }

    let mut volume = Volume::from_staging(
        staging,
        (frames.len(), planes.len(), y, x),
        planes,
        frames,
        !request.unscaled,
        scale_factors,
    )?;
    volume.warnings = warnings;
    Ok(volume)
}

fn read_chunked<R: Read>(
    src: &mut R,
    data_type: DataType,
    dst: &mut [f32],
    raw: &mut [u8],
    endianness: Endianness,
) -> Result<()> {
    let bpp = data_type.size_of();
    let mut left = dst.len() * bpp;
    for out in dst.chunks_mut(raw.len() / bpp) {
        let bytes = &mut raw[..out.len() * bpp];
        src.read_exact(bytes)?;
        decode_into(data_type, bytes, out, endianness)?;
        left -= bytes.len();
        log::debug!("Read {} bytes, {} left in frame", bytes.len(), left);
    }
    Ok(())
}

/// Ensure that the scale factors of a scaled volume can be divided by.
///
/// # Errors
///
/// - `ScanError::ZeroScaleFactor` naming the first frame whose factor is
///   zero or not finite.
pub fn check_invertible(volume: &Volume) -> Result<()> {
    if !volume.is_scaled() {
        return Ok(());
    }
    match volume
        .scale_factors()
        .iter()
        .position(|&sf| sf == 0. || !sf.is_finite())
    {
        Some(i) => Err(ScanError::ZeroScaleFactor(volume.frame_range().first() + i)),
        None => Ok(()),
    }
}

/// Encode a volume into `dst`, frame after frame, in the same layout
/// [`decode`] reads. Scaled volumes are divided by their scale factors
/// first. Returns the number of bytes written.
///
/// # Errors
///
/// - `ScanError::ZeroScaleFactor` if a scaled volume has a scale factor
///   which cannot be inverted. Nothing is written in that case.
///
/// [`decode`]: ./fn.decode.html
pub fn encode<W: Write>(
    mut dst: W,
    volume: &Volume,
    data_type: DataType,
    options: CodecOptions,
) -> Result<u64> {
    check_invertible(volume)?;
    let divisors: Vec<f32> = if volume.is_scaled() {
        volume.scale_factors().iter().map(|&sf| sf as f32).collect()
    } else {
        vec![1.; volume.nframes()]
    };

    let chunk_len = options.chunk_bytes(data_type) / data_type.size_of();
    let mut buf = Vec::with_capacity(chunk_len * data_type.size_of());
    let mut written = 0u64;
    for (frame, &sf) in volume.frames().zip(&divisors) {
        let mut values = frame.iter().map(|&v| v / sf);
        loop {
            buf.clear();
            encode_into(data_type, values.by_ref().take(chunk_len), &mut buf, options.endianness)?;
            if buf.is_empty() {
                break;
            }
            dst.write_all(&buf)?;
            written += buf.len() as u64;
            log::debug!("Wrote {} bytes", buf.len());
        }
    }
    dst.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedef::Modality;
    use std::io::Cursor;

    fn params(data_type: i64, x: usize, y: usize, z: usize, frames: usize) -> Parameters {
        let mut text = format!(
            "data_type {}\nx_dimension {}\ny_dimension {}\nz_dimension {}\n\
             total_frames {}\npixel_size 1\ncalibration_factor 1\n",
            data_type, x, y, z, frames
        );
        for f in 0..frames {
            text.push_str(&format!("frame {}\nscale_factor {}\nframe_duration 1\n", f, f + 1));
        }
        Parameters::parse(&text, Modality::Ct).unwrap()
    }

    #[test]
    fn chunk_bytes_is_element_aligned() {
        let o = CodecOptions {
            chunk_size: 7,
            endianness: Endianness::Little,
        };
        assert_eq!(o.chunk_bytes(DataType::Int16), 6);
        assert_eq!(o.chunk_bytes(DataType::Int32), 4);
        let o = CodecOptions {
            chunk_size: 1,
            ..o
        };
        assert_eq!(o.chunk_bytes(DataType::Float32), 4);
    }

    #[test]
    fn read_chunked_matches_single_read() {
        let raw: Vec<u8> = (0..40u8).collect();
        let mut whole = vec![0f32; 20];
        let mut chunked = vec![0f32; 20];
        let mut big = vec![0u8; 40];
        let mut small = vec![0u8; 6];
        read_chunked(&mut Cursor::new(&raw), DataType::Int16, &mut whole, &mut big, Endianness::Big)
            .unwrap();
        read_chunked(&mut Cursor::new(&raw), DataType::Int16, &mut chunked, &mut small, Endianness::Big)
            .unwrap();
        assert_eq!(whole, chunked);
        assert_eq!(whole[0], 1.);
    }

    #[test]
    fn zero_scale_factor_writes_nothing() {
        let mut p = params(2, 2, 2, 1, 2);
        p.scale_factor = vec![1., 0.];
        let data = ndarray::Array4::zeros((1, 2, 2, 2));
        let range = IndexRange::new(0, 1).unwrap();
        let space = ScratchSpace::private().unwrap();
        let planes = IndexRange::new(0, 0).unwrap();
        let v = Volume::stage(&space, "v.img", &data, planes, range, true, p.scale_factor.clone())
            .unwrap();
        let mut out = Vec::new();
        match encode(&mut out, &v, DataType::Int16, CodecOptions::default()) {
            Err(ScanError::ZeroScaleFactor(1)) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn scale_factor_window() {
        let p = params(2, 2, 2, 1, 3);
        assert_eq!(
            scale_factors_for(&p, IndexRange::new(1, 2).unwrap()).unwrap(),
            vec![2., 3.]
        );
        assert!(scale_factors_for(&p, IndexRange::new(2, 3).unwrap()).is_err());
    }
}
