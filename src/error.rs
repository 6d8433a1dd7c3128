//! Types for error handling go here.
use ndarray::ShapeError;
use std::io::Error as IOError;
use std::path::PathBuf;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum ScanError {
        /// One or more required header keywords had no value after a full
        /// scan of the header.
        MissingKeywords(keywords: Vec<String>) {
            display("Failed to parse parameters: {}", keywords.join(", "))
        }
        /// A header keyword was found, but its value could not be
        /// interpreted as the expected kind.
        InvalidHeaderValue(keyword: &'static str, value: String) {
            display("Invalid value `{}` for header keyword `{}`", value, keyword)
        }
        /// The `data_type` code is not one of the supported pack formats.
        UnknownDataType(code: i64) {
            display("Unknown data_type code: {}", code)
        }
        /// A plane or frame range was given with an unusable number of
        /// bounds, or with bounds in decreasing order.
        MalformedRange(bounds: Vec<usize>) {
            display("Malformed index range: {:?}", bounds)
        }
        /// A range starts past the last valid index and cannot be clamped.
        RangeOutOfBounds(what: &'static str, index: usize, len: usize) {
            display("{} index {} is out of bounds (the file has {})", what, index, len)
        }
        /// The data file ends before the bytes described by the header.
        TruncatedData(path: PathBuf, expected: u64, actual: u64) {
            display("Data file {} is truncated: expected at least {} bytes, found {}",
                path.display(), expected, actual)
        }
        /// The given axis is not one of `x`, `y`, `z`, `0`, `1` or `2`,
        /// or does not exist in the given array.
        InvalidAxis(axis: String) {
            display("Invalid axis input: {}; use one of x, y, z, 0, 1, 2", axis)
        }
        /// The collapse method is not one of `sum`, `mean` or `max`.
        InvalidCollapseMethod(method: String) {
            display("Unrecognized collapse method: {}", method)
        }
        /// The cut topology name is not recognized.
        InvalidTopology(name: String) {
            display("Unrecognized cut topology: {}", name)
        }
        /// The topology cannot be applied while viewing along this axis.
        IllegalViewAxis(topology: &'static str, axis: char) {
            display("Topology {} cannot be cut in the {}-axis view", topology, axis)
        }
        /// The cut coordinates do not fall strictly inside the volume.
        InvalidCutCoordinates(cx: usize, cy: usize, x_dim: usize, y_dim: usize) {
            display("Cut coordinates ({}, {}) are outside of the {}x{} image", cx, cy, x_dim, y_dim)
        }
        /// The volume was not decoded yet.
        NoVolumeData {
            display("No volume data available; decode the volume first")
        }
        /// An operation that requires a cut was called before cutting.
        NotCut {
            display("The image has not been cut")
        }
        /// A frame outside of the loaded frame window was requested.
        FrameOutOfRange(frame: usize, first: usize, last: usize) {
            display("Frame {} is not in the loaded range [{}, {}]", frame, first, last)
        }
        /// A scale factor of zero (or a non-finite one) cannot be inverted
        /// when encoding scaled data.
        ZeroScaleFactor(frame: usize) {
            display("Scale factor of frame {} cannot be inverted", frame)
        }
        /// Files already exist at the save destination.
        DestinationExists(paths: Vec<PathBuf>) {
            display("{} file(s) already exist at the destination", paths.len())
        }
        /// Saving a cut set failed after some children were already written.
        PartialSave(written: Vec<PathBuf>, cause: Box<ScanError>) {
            display("Save failed after writing {} file(s): {}", written.len(), cause)
        }
        /// The scratch file of an entity is held by another entity, e.g.
        /// an image of the same name sharing the scratch directory.
        ScratchConflict(path: PathBuf) {
            display("Scratch file {} is in use", path.display())
        }
        /// The voxel buffer does not match the expected shape.
        IncompatibleShape(err: ShapeError) {
            from()
            source(err)
            display("Incompatible volume shape: {}", err)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
            display("I/O error: {}", err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, ScanError>;
