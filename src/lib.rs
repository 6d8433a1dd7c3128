//! Reader, writer and cutter for multi-subject microPET/CT scans.
//!
//! A scan is a pair of files: a textual header of `keyword value` lines and
//! a raw data file of packed voxels. This crate parses the header into
//! typed [`Parameters`], decodes windows of the data file into a 4-D
//! [`Volume`] with bounded memory use, offers the geometric primitives
//! needed to inspect a volume, and cuts volumes holding several subjects
//! into one sub-volume per subject, which can then be saved as new file
//! pairs.
//!
//! # Example
//!
//! ```no_run
//! use petcut::{Cutter, Modality, ReaderOptions, Topology, WriterOptions};
//! # use petcut::Result;
//!
//! # fn run() -> Result<()> {
//! let mut image = ReaderOptions::new().read_file("m1_fdg_scan_em1.pet.img", Modality::Pet)?;
//! let _ = image.decode_all()?;
//! let _ = Cutter::new().cut(&mut image, Some(Topology::Vertical))?;
//! let saved = WriterOptions::new("cuts").write_cuts(&image)?;
//! assert_eq!(saved.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! [`Parameters`]: ./header/struct.Parameters.html
//! [`Volume`]: ./volume/struct.Volume.html
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate num_derive;

pub mod axis;
pub mod cut;
pub mod error;
pub mod header;
pub mod object;
pub mod typedef;
pub mod volume;
pub mod writer;
mod util;

pub use crate::axis::{get_axis, CollapseMethod, SpatialAxis};
pub use crate::cut::{CutSet, Cutter, Topology};
pub use crate::error::{Result, ScanError};
pub use crate::header::Parameters;
pub use crate::object::{ReaderOptions, ScanImage, ScanObject, SubVolume};
pub use crate::typedef::{DataType, Modality};
pub use crate::volume::{DecodeRequest, IndexSelection, Volume};
pub use crate::writer::{SavedCut, WriterOptions};
pub use byteordered::Endianness;
