//! Spatial axis naming and the dimensionality reducing primitives.
//!
//! Volumes are kept in `(plane, row, column, frame)` order, hence the
//! canonical mapping `z -> 0`, `y -> 1`, `x -> 2`. Frames live in axis 3,
//! which is not a spatial axis and is handled by the frame specific
//! operations of [`Volume`].
//!
//! [`Volume`]: ../volume/struct.Volume.html

use crate::error::{Result, ScanError};
use ndarray::{Array, ArrayBase, ArrayView, Axis, Data, Dimension, RemoveAxis};
use std::fmt;
use std::str::FromStr;

/// One of the three spatial axes of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialAxis {
    /// Planes, index 0.
    Z = 0,
    /// Rows, index 1.
    Y = 1,
    /// Columns, index 2.
    X = 2,
}

impl SpatialAxis {
    /// All axes, in index order.
    pub const ALL: [SpatialAxis; 3] = [SpatialAxis::Z, SpatialAxis::Y, SpatialAxis::X];

    /// The array axis index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The axis name as a character.
    pub fn name(self) -> char {
        match self {
            SpatialAxis::Z => 'z',
            SpatialAxis::Y => 'y',
            SpatialAxis::X => 'x',
        }
    }

    /// Validate an array axis index.
    pub fn from_index(index: usize) -> Result<SpatialAxis> {
        match index {
            0 => Ok(SpatialAxis::Z),
            1 => Ok(SpatialAxis::Y),
            2 => Ok(SpatialAxis::X),
            _ => Err(ScanError::InvalidAxis(index.to_string())),
        }
    }

    /// The two spatial axes other than this one, in index order.
    pub fn others(self) -> [SpatialAxis; 2] {
        match self {
            SpatialAxis::Z => [SpatialAxis::Y, SpatialAxis::X],
            SpatialAxis::Y => [SpatialAxis::Z, SpatialAxis::X],
            SpatialAxis::X => [SpatialAxis::Z, SpatialAxis::Y],
        }
    }

    /// Extent `(rows, columns)` of the image seen when collapsing a volume
    /// of the given `(x, y, z)` dimensions along this axis.
    pub fn view_bounds(self, (x, y, z): (usize, usize, usize)) -> (usize, usize) {
        match self {
            SpatialAxis::Z => (y, x),
            SpatialAxis::Y => (x, z),
            SpatialAxis::X => (z, y),
        }
    }
}

impl fmt::Display for SpatialAxis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SpatialAxis {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<SpatialAxis> {
        match s {
            "z" | "0" => Ok(SpatialAxis::Z),
            "y" | "1" => Ok(SpatialAxis::Y),
            "x" | "2" => Ok(SpatialAxis::X),
            _ => Err(ScanError::InvalidAxis(s.to_string())),
        }
    }
}

impl From<SpatialAxis> for Axis {
    fn from(a: SpatialAxis) -> Axis {
        Axis(a.index())
    }
}

/// Conversion of user supplied axis names or indices into a validated
/// [`SpatialAxis`](enum.SpatialAxis.html).
pub trait IntoAxis {
    /// Validate and normalize the axis.
    fn into_axis(self) -> Result<SpatialAxis>;
}

impl IntoAxis for SpatialAxis {
    fn into_axis(self) -> Result<SpatialAxis> {
        Ok(self)
    }
}

impl IntoAxis for usize {
    fn into_axis(self) -> Result<SpatialAxis> {
        SpatialAxis::from_index(self)
    }
}

impl IntoAxis for char {
    fn into_axis(self) -> Result<SpatialAxis> {
        let mut buf = [0; 4];
        self.encode_utf8(&mut buf).parse()
    }
}

impl<'a> IntoAxis for &'a str {
    fn into_axis(self) -> Result<SpatialAxis> {
        self.parse()
    }
}

/// Normalize an axis name or index, as in `get_axis("x") == 2`.
pub fn get_axis<A: IntoAxis>(axis: A) -> Result<usize> {
    axis.into_axis().map(SpatialAxis::index)
}

/// Reduction applied when collapsing an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollapseMethod {
    /// Sum of the values along the axis.
    Sum,
    /// Arithmetic mean of the values along the axis.
    Mean,
    /// Maximum value along the axis.
    Max,
}

impl Default for CollapseMethod {
    fn default() -> Self {
        CollapseMethod::Sum
    }
}

impl FromStr for CollapseMethod {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<CollapseMethod> {
        match s {
            "sum" => Ok(CollapseMethod::Sum),
            "mean" => Ok(CollapseMethod::Mean),
            "max" => Ok(CollapseMethod::Max),
            _ => Err(ScanError::InvalidCollapseMethod(s.to_string())),
        }
    }
}

impl CollapseMethod {
    /// Reduce `matrix` along `axis`, removing that axis.
    pub fn reduce<S, D>(self, matrix: &ArrayBase<S, D>, axis: Axis) -> Array<f32, D::Smaller>
    where
        S: Data<Elem = f32>,
        D: Dimension + RemoveAxis,
    {
        match self {
            CollapseMethod::Sum => matrix.sum_axis(axis),
            CollapseMethod::Mean => {
                let n = matrix.len_of(axis) as f32;
                matrix.sum_axis(axis).mapv_into(|v| v / n)
            }
            CollapseMethod::Max => {
                matrix.fold_axis(axis, f32::NEG_INFINITY, |&m, &v| m.max(v))
            }
        }
    }
}

/// Decompose `matrix` into the ordered sequence of its slices along a
/// spatial axis, each with that axis removed. The sequence is lazy and
/// can be restarted by calling this function again.
///
/// # Errors
///
/// - `ScanError::InvalidAxis` if the axis is invalid or does not exist in
///   `matrix`.
pub fn split_on_axis<'a, D, A>(
    matrix: ArrayView<'a, f32, D>,
    axis: A,
) -> Result<impl Iterator<Item = ArrayView<'a, f32, D::Smaller>>>
where
    D: Dimension + RemoveAxis,
    A: IntoAxis,
{
    let axis = axis.into_axis()?;
    if axis.index() >= matrix.ndim() {
        return Err(ScanError::InvalidAxis(axis.to_string()));
    }
    let axis = Axis::from(axis);
    let len = matrix.len_of(axis);
    Ok((0..len).map(move |i| matrix.clone().index_axis_move(axis, i)))
}
