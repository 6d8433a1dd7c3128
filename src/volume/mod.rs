//! This module defines the voxel volume of a scan, together with the
//! reading machinery that produces it from a data file.
//!
//! A [`Volume`] is a 4-dimensional `f32` array in `(plane, y, x, frame)`
//! order, plus the plane and frame windows it was decoded from and its
//! scale state. The geometric primitives (rotation, collapse, slicing and
//! frame extraction) all work on this canonical order.
//!
//! [`Volume`]: ./struct.Volume.html

pub mod codec;
pub mod element;
pub mod range;
pub mod scratch;

pub use self::codec::{CodecOptions, DecodeRequest, DEFAULT_CHUNK_SIZE};
pub use self::range::{IndexRange, IndexSelection, RangeWarning};

use self::scratch::{ScratchFile, ScratchSpace};
use crate::axis::{split_on_axis, CollapseMethod, IntoAxis, SpatialAxis};
use crate::error::{Result, ScanError};
use ndarray::{s, Array3, Array4, ArrayBase, ArrayD, ArrayView3, ArrayView4, Axis, Data};
use ndarray::{ErrorKind, Ix4, ShapeError};
use std::ops::Range;
use std::path::Path;

/// Axis of the frames in the volume array.
pub const FRAME_AXIS: Axis = Axis(3);

/// A decoded scan volume.
///
/// The voxels live in the volume's scratch file, frame after frame, in the
/// layout of the data file. [`data`](#method.data) presents them in
/// canonical order without copying, and rotations only change how they
/// are presented.
#[derive(Debug)]
pub struct Volume {
    staging: ScratchFile,
    /// Stored shape, `(frames, planes, y, x)`.
    dim: (usize, usize, usize, usize),
    flipped: [bool; 3],
    plane_range: IndexRange,
    frame_range: IndexRange,
    scaled: bool,
    scale_factors: Vec<f64>,
    warnings: Vec<RangeWarning>,
}

impl Volume {
    /// Copy a `(plane, y, x, frame)` array into a new scratch file of
    /// `scratch`, named after the entity `name`, and wrap it as a volume.
    ///
    /// # Errors
    ///
    /// - `ScanError::IncompatibleShape` if the number of planes or frames
    ///   of `data` does not match the windows, or if there is not one
    ///   scale factor per frame.
    pub fn stage<S>(
        scratch: &ScratchSpace,
        name: &str,
        data: &ArrayBase<S, Ix4>,
        plane_range: IndexRange,
        frame_range: IndexRange,
        scaled: bool,
        scale_factors: Vec<f64>,
    ) -> Result<Volume>
    where
        S: Data<Elem = f32>,
    {
        let (z, y, x, nf) = data.dim();
        let mut staging = scratch.allocate(name, data.len())?;
        staging.store(data.view().permuted_axes([3, 0, 1, 2]).iter())?;
        Volume::from_staging(
            staging,
            (nf, z, y, x),
            plane_range,
            frame_range,
            scaled,
            scale_factors,
        )
    }

    /// Wrap a scratch file holding `dim = (frames, planes, y, x)` voxels
    /// in data file order.
    pub(crate) fn from_staging(
        staging: ScratchFile,
        dim: (usize, usize, usize, usize),
        plane_range: IndexRange,
        frame_range: IndexRange,
        scaled: bool,
        scale_factors: Vec<f64>,
    ) -> Result<Volume> {
        let (nf, z, y, x) = dim;
        if z != plane_range.len()
            || nf != frame_range.len()
            || scale_factors.len() != nf
            || staging.len() != nf * z * y * x
        {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }
        Ok(Volume {
            staging,
            dim,
            flipped: [false; 3],
            plane_range,
            frame_range,
            scaled,
            scale_factors,
            warnings: Vec::new(),
        })
    }

    /// The voxel array, in `(plane, y, x, frame)` order.
    pub fn data(&self) -> ArrayView4<f32> {
        let mut view = ArrayView4::from_shape(self.dim, self.staging.as_slice())
            .expect("Inconsistent scratch file size")
            .permuted_axes([1, 2, 3, 0]);
        for axis in SpatialAxis::ALL.iter() {
            if self.flipped[axis.index()] {
                view.invert_axis((*axis).into());
            }
        }
        view
    }

    /// Copy the voxel array out of the volume.
    pub fn to_array(&self) -> Array4<f32> {
        self.data().to_owned()
    }

    /// Location of the scratch file holding the voxels.
    pub fn scratch_path(&self) -> &Path {
        self.staging.path()
    }

    /// The spatial dimensions as `(x, y, z)`.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        let (_, z, y, x) = self.dim;
        (x, y, z)
    }

    /// Number of frames held.
    pub fn nframes(&self) -> usize {
        self.dim.0
    }

    /// Planes of the data file held by this volume.
    pub fn plane_range(&self) -> IndexRange {
        self.plane_range
    }

    /// Frames of the data file held by this volume.
    pub fn frame_range(&self) -> IndexRange {
        self.frame_range
    }

    /// Whether more than one plane is held.
    pub fn is_multi_plane(&self) -> bool {
        self.plane_range.is_multi()
    }

    /// Whether more than one frame is held.
    pub fn is_multi_frame(&self) -> bool {
        self.frame_range.is_multi()
    }

    /// Whether the voxels were multiplied by their frame's scale factor.
    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    /// Scale factors of the held frames, in frame order.
    pub fn scale_factors(&self) -> &[f64] {
        &self.scale_factors
    }

    /// Ranges which were clamped when decoding this volume.
    pub fn warnings(&self) -> &[RangeWarning] {
        &self.warnings
    }

    /// Extent `(rows, columns)` of the image seen along `axis`.
    pub fn view_bounds<A: IntoAxis>(&self, axis: A) -> Result<(usize, usize)> {
        Ok(axis.into_axis()?.view_bounds(self.dimensions()))
    }

    /// Rotate the volume about `axis` by reversing both other spatial
    /// axes.
    pub fn rotate_on_axis<A: IntoAxis>(&mut self, axis: A) -> Result<()> {
        let axis = axis.into_axis()?;
        for other in axis.others().iter() {
            self.flipped[other.index()] ^= true;
        }
        Ok(())
    }

    /// Reduce along a spatial axis. With a frame, only that frame is
    /// reduced and a 2-D image is returned; without one, the whole buffer
    /// is reduced and the frame axis is kept.
    pub fn collapse_frame<A: IntoAxis>(
        &self,
        axis: A,
        frame: Option<usize>,
        method: CollapseMethod,
    ) -> Result<ArrayD<f32>> {
        let axis = Axis::from(axis.into_axis()?);
        match frame {
            Some(n) => Ok(method.reduce(&self.get_frame(n)?, axis).into_dyn()),
            None => Ok(method.reduce(&self.data(), axis).into_dyn()),
        }
    }

    /// Reduce across all held frames.
    pub fn collapse_over_frames(&self, method: CollapseMethod) -> Array3<f32> {
        method.reduce(&self.data(), FRAME_AXIS)
    }

    /// Retrieve frame `n` of the data file, which must be held.
    ///
    /// # Errors
    ///
    /// - `ScanError::FrameOutOfRange` if `n` is outside the frame window.
    pub fn get_frame(&self, n: usize) -> Result<ArrayView3<f32>> {
        if !self.frame_range.contains(n) {
            return Err(ScanError::FrameOutOfRange(
                n,
                self.frame_range.first(),
                self.frame_range.last(),
            ));
        }
        Ok(self.data().index_axis_move(FRAME_AXIS, n - self.frame_range.first()))
    }

    /// All held frames in order. The iterator is lazy and can be restarted
    /// by calling this method again.
    pub fn frames(&self) -> impl Iterator<Item = ArrayView3<'_, f32>> {
        let data = self.data();
        (0..self.nframes()).map(move |i| data.index_axis_move(FRAME_AXIS, i))
    }

    /// The slices of the volume along a spatial axis, in index order, with
    /// the frame axis kept.
    pub fn split_on_axis<A: IntoAxis>(
        &self,
        axis: A,
    ) -> Result<impl Iterator<Item = ArrayView3<'_, f32>>> {
        split_on_axis(self.data(), axis)
    }

    /// The slice at `index` along a spatial axis.
    ///
    /// # Errors
    ///
    /// - `ScanError::RangeOutOfBounds` if `index` is past the axis length.
    pub fn slice<A: IntoAxis>(&self, axis: A, index: usize) -> Result<ArrayView3<f32>> {
        let axis = axis.into_axis()?;
        let data = self.data();
        let len = data.len_of(axis.into());
        if index >= len {
            return Err(ScanError::RangeOutOfBounds(axis_label(axis), index, len));
        }
        Ok(data.index_axis_move(axis.into(), index))
    }

    /// Copy out the block of rows and columns into a new volume holding
    /// the same planes, frames and scale state, staged for the entity
    /// `name`.
    pub(crate) fn extract(
        &self,
        rows: Range<usize>,
        cols: Range<usize>,
        scratch: &ScratchSpace,
        name: &str,
    ) -> Result<Volume> {
        Volume::stage(
            scratch,
            name,
            &self.data().slice_move(s![.., rows, cols, ..]),
            self.plane_range,
            self.frame_range,
            self.scaled,
            self.scale_factors.clone(),
        )
    }

    /// Give the scratch file its final name, taking over the file of
    /// `replacing` if it is the same entity.
    pub(crate) fn commit(&mut self, replacing: Option<&mut Volume>) -> Result<()> {
        self.staging.commit(replacing.map(|v| &mut v.staging))
    }

    pub(crate) fn check_commit(&self, replacing: Option<&Volume>) -> Result<()> {
        self.staging.check_commit(replacing.map(|v| &v.staging))
    }
}

impl PartialEq for Volume {
    fn eq(&self, other: &Volume) -> bool {
        self.plane_range == other.plane_range
            && self.frame_range == other.frame_range
            && self.scaled == other.scaled
            && self.scale_factors == other.scale_factors
            && self.warnings == other.warnings
            && self.data() == other.data()
    }
}

fn axis_label(axis: SpatialAxis) -> &'static str {
    match axis {
        SpatialAxis::Z => "plane",
        SpatialAxis::Y => "row",
        SpatialAxis::X => "column",
    }
}
