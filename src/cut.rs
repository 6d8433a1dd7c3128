//! The cut engine, which partitions a decoded image into sub-volumes.
//!
//! A cut splits the rows and columns of every plane and frame at a center
//! point `(cx, cy)`: column `cx` is the first column of the right half,
//! and row `cy` the first row of the top half. Each block is copied out
//! into a new [`SubVolume`], so children never alias the parent's buffer.
//!
//! # Example
//!
//! ```no_run
//! use petcut::{Cutter, Modality, ReaderOptions, Topology};
//! # use petcut::Result;
//!
//! # fn run() -> Result<()> {
//! let mut image = ReaderOptions::new().read_file("m1_fdg_scan_em1.pet.img", Modality::Pet)?;
//! let _ = image.decode_all()?;
//! let mut cutter = Cutter::new();
//! cutter.set_center(64, 64);
//! let cuts = cutter.cut(&mut image, Some(Topology::Cross))?;
//! assert_eq!(cuts.len(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! [`SubVolume`]: ../object/struct.SubVolume.html

use crate::axis::{IntoAxis, SpatialAxis};
use crate::error::{Result, ScanError};
use crate::object::{ScanImage, ScanObject, SubVolume};
use crate::util::sub_volume_name;
use std::fmt;
use std::ops::Range;
use std::slice;
use std::str::FromStr;

/// Shape of the partition applied by a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Left and right halves, split at `cx`.
    Vertical,
    /// Top and bottom halves, split at `cy`.
    Horizontal,
    /// Top half, bottom-left and bottom-right quadrants.
    DownT,
    /// Top-left and top-right quadrants, bottom half.
    UpT,
    /// The four quadrants.
    Cross,
}

impl Default for Topology {
    fn default() -> Self {
        Topology::Vertical
    }
}

impl Topology {
    /// All topologies.
    pub const ALL: [Topology; 5] = [
        Topology::Vertical,
        Topology::Horizontal,
        Topology::DownT,
        Topology::UpT,
        Topology::Cross,
    ];

    /// The topology's name.
    pub fn name(self) -> &'static str {
        match self {
            Topology::Vertical => "vertical",
            Topology::Horizontal => "horizontal",
            Topology::DownT => "down_T",
            Topology::UpT => "up_T",
            Topology::Cross => "cross",
        }
    }

    /// Number of sub-volumes produced.
    pub fn child_count(self) -> usize {
        match self {
            Topology::Vertical | Topology::Horizontal => 2,
            Topology::DownT | Topology::UpT => 3,
            Topology::Cross => 4,
        }
    }

    /// Whether the cut can be made while viewing along `axis`.
    pub fn allows_view(self, axis: SpatialAxis) -> bool {
        match self {
            Topology::Vertical => true,
            Topology::Horizontal => axis != SpatialAxis::Y,
            Topology::DownT | Topology::UpT | Topology::Cross => axis == SpatialAxis::Z,
        }
    }

    fn splits_columns(self) -> bool {
        self != Topology::Horizontal
    }

    fn splits_rows(self) -> bool {
        self != Topology::Vertical
    }

    /// The `(rows, columns)` blocks of each child, in child order, for an
    /// image of `x` columns and `y` rows.
    fn blocks(self, (cx, cy): (usize, usize), x: usize, y: usize) -> Vec<(Range<usize>, Range<usize>)> {
        let (top, bottom) = (cy..y, 0..cy);
        let (left, right) = (0..cx, cx..x);
        match self {
            Topology::Vertical => vec![(0..y, left), (0..y, right)],
            Topology::Horizontal => vec![(top, 0..x), (bottom, 0..x)],
            Topology::DownT => vec![(top, 0..x), (bottom.clone(), left), (bottom, right)],
            Topology::UpT => vec![(top.clone(), left), (top, right), (bottom, 0..x)],
            Topology::Cross => vec![
                (top.clone(), left.clone()),
                (top, right.clone()),
                (bottom.clone(), left),
                (bottom, right),
            ],
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topology {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Topology> {
        Topology::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| ScanError::InvalidTopology(s.to_string()))
    }
}

/// The live result of a cut: the sub-volumes in child order.
#[derive(Debug)]
pub struct CutSet {
    topology: Topology,
    center: (usize, usize),
    children: Vec<SubVolume>,
}

impl CutSet {
    /// The topology the set was cut with.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// The `(cx, cy)` center the set was cut at.
    pub fn center(&self) -> (usize, usize) {
        self.center
    }

    /// Number of sub-volumes.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the set holds no sub-volume.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The sub-volumes, in child order.
    pub fn children(&self) -> &[SubVolume] {
        &self.children
    }

    /// Iterate over the sub-volumes.
    pub fn iter(&self) -> slice::Iter<SubVolume> {
        self.children.iter()
    }

    /// Iterate mutably over the sub-volumes, e.g. to rotate them.
    pub fn iter_mut(&mut self) -> slice::IterMut<SubVolume> {
        self.children.iter_mut()
    }

    /// Give the children's scratch files their final names, taking over
    /// the files of the same children in `previous`. Every child is checked
    /// before any file is moved.
    pub(crate) fn commit(&mut self, mut previous: Option<&mut CutSet>) -> Result<()> {
        for child in &self.children {
            let old = previous.as_deref().and_then(|p| p.child_named(child.filename()));
            child.check_commit(old)?;
        }
        for child in &mut self.children {
            let old = previous
                .as_deref_mut()
                .and_then(|p| p.children.iter_mut().find(|c| c.filename() == child.filename()));
            child.commit(old)?;
        }
        Ok(())
    }

    fn child_named(&self, name: &str) -> Option<&SubVolume> {
        self.children.iter().find(|c| c.filename() == name)
    }
}

impl<'a> IntoIterator for &'a CutSet {
    type Item = &'a SubVolume;
    type IntoIter = slice::Iter<'a, SubVolume>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

/// Cut engine state: the cut center, the selected topology and the axis
/// the image is viewed along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cutter {
    center: Option<(usize, usize)>,
    topology: Topology,
    view: SpatialAxis,
}

impl Default for Cutter {
    fn default() -> Self {
        Cutter {
            center: None,
            topology: Topology::default(),
            view: SpatialAxis::Z,
        }
    }
}

impl Cutter {
    /// A cutter at the image center, with the vertical topology, viewing
    /// along `z`.
    pub fn new() -> Cutter {
        Cutter::default()
    }

    /// Cut at column `cx` and row `cy`.
    pub fn set_center(&mut self, cx: usize, cy: usize) -> &mut Self {
        self.center = Some((cx, cy));
        self
    }

    /// Go back to cutting at the image center.
    pub fn reset_center(&mut self) -> &mut Self {
        self.center = None;
        self
    }

    /// Select the topology used when none is given to [`cut`](#method.cut).
    pub fn set_topology(&mut self, topology: Topology) -> &mut Self {
        self.topology = topology;
        self
    }

    /// The selected topology.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Select the axis the image is viewed along.
    pub fn set_view_axis<A: IntoAxis>(&mut self, axis: A) -> Result<&mut Self> {
        self.view = axis.into_axis()?;
        Ok(self)
    }

    /// The axis the image is viewed along.
    pub fn view_axis(&self) -> SpatialAxis {
        self.view
    }

    /// The center used for an image of `x` columns and `y` rows: the one
    /// set, or half of each extent.
    pub fn center_for(&self, x: usize, y: usize) -> (usize, usize) {
        self.center.unwrap_or((x / 2, y / 2))
    }

    /// Partition the decoded volume of `image`, replacing its previous cut
    /// set. If `topology` is given and the cut succeeds, it also becomes the
    /// selected topology. A failed cut leaves the image and the cutter as
    /// they were.
    ///
    /// # Errors
    ///
    /// - `ScanError::IllegalViewAxis` if the topology cannot be cut in the
    ///   current view.
    /// - `ScanError::NoVolumeData` if the image was not decoded.
    /// - `ScanError::InvalidCutCoordinates` if a split coordinate is not
    ///   strictly inside the image.
    pub fn cut<'a>(
        &mut self,
        image: &'a mut ScanImage,
        topology: Option<Topology>,
    ) -> Result<&'a CutSet> {
        let topology = topology.unwrap_or(self.topology);
        if !topology.allows_view(self.view) {
            return Err(ScanError::IllegalViewAxis(topology.name(), self.view.name()));
        }

        let (x, y, _) = image.dimensions()?;
        let (cx, cy) = self.center_for(x, y);
        let bad_x = topology.splits_columns() && (cx == 0 || cx >= x);
        let bad_y = topology.splits_rows() && (cy == 0 || cy >= y);
        if bad_x || bad_y {
            return Err(ScanError::InvalidCutCoordinates(cx, cy, x, y));
        }

        let children = {
            let volume = image.volume()?;
            let params = image.shared_parameters();
            let mut children = Vec::with_capacity(topology.child_count());
            for (i, (rows, cols)) in topology.blocks((cx, cy), x, y).into_iter().enumerate() {
                let name = sub_volume_name(image.filename(), i + 1);
                let block = volume.extract(rows, cols, image.scratch_space(), &name)?;
                children.push(SubVolume::new(name, params.clone(), block));
            }
            children
        };
        log::info!(
            "Cut {} at ({}, {}) into {} sub-volume(s)",
            image.filename(),
            cx,
            cy,
            children.len()
        );

        let cuts = image.replace_cuts(CutSet {
            topology,
            center: (cx, cy),
            children,
        })?;
        self.topology = topology;
        Ok(cuts)
    }
}
