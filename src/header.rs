//! This module defines the textual scan header: a line oriented list of
//! `keyword value` pairs, of which only the keywords required by the
//! scan's [`Modality`] are interpreted.
//!
//! Parsing is driven by static field descriptors. Each required keyword is
//! looked up as a literal prefix of the trimmed header lines. Single valued
//! fields take the first matching line, while per-frame fields collect one
//! value from every matching line, in header order.
//!
//! # Example
//!
//! ```
//! use petcut::{Modality, Parameters};
//! # use petcut::Result;
//!
//! # fn run() -> Result<()> {
//! let text = "data_type 2\n\
//!             x_dimension 4\n\
//!             y_dimension 4\n\
//!             z_dimension 2\n\
//!             total_frames 1\n\
//!             pixel_size 0.4\n\
//!             calibration_factor 1.0\n\
//!             frame 0\n\
//!             scale_factor 0.5\n\
//!             frame_duration 60\n";
//! let params = Parameters::parse(text, Modality::Ct)?;
//! assert_eq!(params.x_dimension, 4);
//! assert_eq!(params.scale_factor, vec![0.5]);
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! [`Modality`]: ../typedef/enum.Modality.html

use crate::error::{Result, ScanError};
use crate::typedef::{DataType, Modality};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fs;
use std::path::Path;

/// Numeric interpretation of a header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Parsed as a signed integer.
    Integer,
    /// Parsed as a double precision float.
    Float,
}

/// How many values a header field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// One value, taken from the first matching line.
    Single,
    /// One value per frame, appended from every matching line.
    PerFrame,
}

/// Static description of a required header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The keyword, matched as a literal prefix of a trimmed line.
    pub name: &'static str,
    /// How the value token is parsed.
    pub kind: FieldKind,
    /// Whether the field is per frame.
    pub cardinality: Cardinality,
}

const fn single(name: &'static str, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind,
        cardinality: Cardinality::Single,
    }
}

const fn per_frame(name: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind: FieldKind::Float,
        cardinality: Cardinality::PerFrame,
    }
}

/// Fields required in PET headers.
pub const PET_FIELDS: &[FieldDescriptor] = &[
    single("axial_blocks", FieldKind::Float),
    single("axial_crystals_per_block", FieldKind::Float),
    single("axial_crystal_pitch", FieldKind::Float),
    single("data_type", FieldKind::Integer),
    single("z_dimension", FieldKind::Integer),
    single("x_dimension", FieldKind::Integer),
    single("y_dimension", FieldKind::Integer),
    single("pixel_size", FieldKind::Float),
    single("total_frames", FieldKind::Integer),
    single("calibration_factor", FieldKind::Float),
    per_frame("scale_factor"),
    single("isotope_branching_fraction", FieldKind::Float),
    per_frame("frame_duration"),
];

/// Fields required in CT headers.
pub const CT_FIELDS: &[FieldDescriptor] = &[
    single("data_type", FieldKind::Integer),
    single("z_dimension", FieldKind::Integer),
    single("x_dimension", FieldKind::Integer),
    single("y_dimension", FieldKind::Integer),
    single("pixel_size", FieldKind::Float),
    single("total_frames", FieldKind::Integer),
    single("calibration_factor", FieldKind::Float),
    per_frame("scale_factor"),
    per_frame("frame_duration"),
];

/// The keywords holding the spatial dimensions of a volume.
pub const DIMENSION_KEYWORDS: [&str; 3] = ["x_dimension", "y_dimension", "z_dimension"];

/// A value resolved from the header.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A single integer.
    Integer(i64),
    /// A single float.
    Float(f64),
    /// One float per matching line.
    PerFrame(Vec<f64>),
}

/// The raw outcome of scanning a header against a set of descriptors.
/// Every descriptor given to [`parse_fields`] is guaranteed to be present.
///
/// [`parse_fields`]: ./fn.parse_fields.html
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderFields {
    values: BTreeMap<&'static str, ParamValue>,
}

impl HeaderFields {
    /// Retrieve a resolved value by keyword.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Number of resolved keywords.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no keyword was resolved.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn integer(&self, name: &'static str) -> Result<i64> {
        match self.values.get(name) {
            Some(ParamValue::Integer(v)) => Ok(*v),
            Some(ParamValue::Float(v)) => Err(ScanError::InvalidHeaderValue(name, v.to_string())),
            Some(ParamValue::PerFrame(v)) => Err(ScanError::InvalidHeaderValue(name, format!("{:?}", v))),
            None => Err(ScanError::MissingKeywords(vec![name.to_string()])),
        }
    }

    fn dimension(&self, name: &'static str) -> Result<usize> {
        let v = self.integer(name)?;
        match usize::try_from(v) {
            Ok(d) if d > 0 => Ok(d),
            _ => Err(ScanError::InvalidHeaderValue(name, v.to_string())),
        }
    }

    fn float(&self, name: &'static str) -> Result<f64> {
        match self.values.get(name) {
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(ParamValue::Integer(v)) => Ok(*v as f64),
            Some(ParamValue::PerFrame(v)) => Err(ScanError::InvalidHeaderValue(name, format!("{:?}", v))),
            None => Err(ScanError::MissingKeywords(vec![name.to_string()])),
        }
    }

    fn per_frame(&self, name: &'static str) -> Result<Vec<f64>> {
        match self.values.get(name) {
            Some(ParamValue::PerFrame(v)) => Ok(v.clone()),
            Some(ParamValue::Float(v)) => Ok(vec![*v]),
            Some(ParamValue::Integer(v)) => Ok(vec![*v as f64]),
            None => Err(ScanError::MissingKeywords(vec![name.to_string()])),
        }
    }
}

/// Scan the header text for every field in `fields`.
///
/// A line contributes to a field when its trimmed text starts with the
/// field's keyword and carries a second whitespace separated token. Lines
/// without that token are skipped. Once all lines were scanned, every field
/// left without a value is reported at once.
///
/// # Errors
///
/// - `ScanError::MissingKeywords` naming all unresolved fields.
/// - `ScanError::InvalidHeaderValue` if a value token does not parse as
///   the field's kind.
pub fn parse_fields(text: &str, fields: &[FieldDescriptor]) -> Result<HeaderFields> {
    let mut values = BTreeMap::new();

    for field in fields {
        for line in text.lines() {
            let line = line.trim();
            if !line.starts_with(field.name) {
                continue;
            }
            let token = match line.split_whitespace().nth(1) {
                Some(t) => t,
                None => continue,
            };
            match field.cardinality {
                Cardinality::PerFrame => {
                    let v = parse_float(field.name, token)?;
                    let entry = values
                        .entry(field.name)
                        .or_insert_with(|| ParamValue::PerFrame(Vec::new()));
                    if let ParamValue::PerFrame(seq) = entry {
                        seq.push(v);
                    }
                }
                Cardinality::Single => {
                    let v = match field.kind {
                        FieldKind::Integer => ParamValue::Integer(parse_integer(field.name, token)?),
                        FieldKind::Float => ParamValue::Float(parse_float(field.name, token)?),
                    };
                    let _ = values.insert(field.name, v);
                    break;
                }
            }
        }
    }

    let missing: Vec<String> = fields
        .iter()
        .filter(|f| !values.contains_key(f.name))
        .map(|f| f.name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ScanError::MissingKeywords(missing));
    }

    Ok(HeaderFields { values })
}

fn parse_integer(name: &'static str, token: &str) -> Result<i64> {
    token
        .parse()
        .map_err(|_| ScanError::InvalidHeaderValue(name, token.to_string()))
}

fn parse_float(name: &'static str, token: &str) -> Result<f64> {
    token
        .parse()
        .map_err(|_| ScanError::InvalidHeaderValue(name, token.to_string()))
}

/// Crystal geometry and isotope calibration, only present in PET headers.
#[derive(Debug, Clone, PartialEq)]
pub struct PetParameters {
    /// Number of detector blocks along the scanner axis.
    pub axial_blocks: f64,
    /// Crystals per block along the scanner axis.
    pub axial_crystals_per_block: f64,
    /// Axial distance between crystals.
    pub axial_crystal_pitch: f64,
    /// Branching fraction of the isotope.
    pub isotope_branching_fraction: f64,
}

impl PetParameters {
    /// Axial field of view covered by the detector ring.
    pub fn axial_fov(&self) -> f64 {
        self.axial_blocks * self.axial_crystals_per_block * self.axial_crystal_pitch
            + self.axial_crystal_pitch
    }
}

/// The typed parameter record of a scan header.
///
/// Instances are produced by [`Parameters::parse`] and are not meant to be
/// modified afterwards; scan entities only hand out shared references.
///
/// [`Parameters::parse`]: #method.parse
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// The modality the header was parsed for.
    pub modality: Modality,
    /// Raw pack format code, see [`data_type`](#method.data_type).
    pub data_type: i64,
    /// Columns per plane.
    pub x_dimension: usize,
    /// Rows per plane.
    pub y_dimension: usize,
    /// Number of planes.
    pub z_dimension: usize,
    /// Number of frames.
    pub total_frames: usize,
    /// Transaxial pixel size.
    pub pixel_size: f64,
    /// Calibration factor.
    pub calibration_factor: f64,
    /// One multiplicative scale factor per frame.
    pub scale_factor: Vec<f64>,
    /// One duration per frame.
    pub frame_duration: Vec<f64>,
    /// PET specific fields, `None` for CT.
    pub pet: Option<PetParameters>,
}

impl Parameters {
    /// Parse the header text with the field set of the given modality.
    pub fn parse(text: &str, modality: Modality) -> Result<Parameters> {
        let fields = parse_fields(text, modality.fields())?;
        Parameters::from_fields(modality, &fields)
    }

    /// Read and parse a header file.
    pub fn from_file<P: AsRef<Path>>(path: P, modality: Modality) -> Result<Parameters> {
        let text = fs::read_to_string(path)?;
        Parameters::parse(&text, modality)
    }

    /// Build the typed record out of resolved header fields.
    pub fn from_fields(modality: Modality, fields: &HeaderFields) -> Result<Parameters> {
        let pet = match modality {
            Modality::Pet => Some(PetParameters {
                axial_blocks: fields.float("axial_blocks")?,
                axial_crystals_per_block: fields.float("axial_crystals_per_block")?,
                axial_crystal_pitch: fields.float("axial_crystal_pitch")?,
                isotope_branching_fraction: fields.float("isotope_branching_fraction")?,
            }),
            Modality::Ct => None,
        };

        let params = Parameters {
            modality,
            data_type: fields.integer("data_type")?,
            x_dimension: fields.dimension("x_dimension")?,
            y_dimension: fields.dimension("y_dimension")?,
            z_dimension: fields.dimension("z_dimension")?,
            total_frames: fields.dimension("total_frames")?,
            pixel_size: fields.float("pixel_size")?,
            calibration_factor: fields.float("calibration_factor")?,
            scale_factor: fields.per_frame("scale_factor")?,
            frame_duration: fields.per_frame("frame_duration")?,
            pet,
        };

        if params.scale_factor.len() < params.total_frames {
            return Err(ScanError::InvalidHeaderValue(
                "scale_factor",
                format!(
                    "{} values for {} frames",
                    params.scale_factor.len(),
                    params.total_frames
                ),
            ));
        }
        Ok(params)
    }

    /// Get the pack format as a validated enum.
    pub fn data_type(&self) -> Result<DataType> {
        DataType::from_code(self.data_type)
    }

    /// The spatial dimensions as `(x, y, z)`.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.x_dimension, self.y_dimension, self.z_dimension)
    }

    /// Number of voxels in a single frame.
    pub fn frame_len(&self) -> usize {
        self.x_dimension * self.y_dimension * self.z_dimension
    }

    /// Axial thickness of a plane. Only defined for PET.
    pub fn plane_thickness(&self) -> Option<f64> {
        self.pet
            .as_ref()
            .map(|p| p.axial_fov() / self.z_dimension as f64)
    }

    /// Ratio between the plane thickness and the transaxial pixel size.
    /// Only defined for PET.
    pub fn aspect(&self) -> Option<f64> {
        self.plane_thickness().map(|t| t / self.pixel_size)
    }

    /// Per-frame scale factors converted to calibrated activity units.
    /// Only defined for PET.
    pub fn calibrated_scale_factors(&self) -> Option<Vec<f64>> {
        self.pet.as_ref().map(|p| {
            let k = self.calibration_factor / p.isotope_branching_fraction;
            self.scale_factor.iter().map(|s| s * k).collect()
        })
    }
}

/// Rewrite a header, replacing the first line matching each override
/// keyword with `keyword value`. All other lines, including their line
/// endings, are preserved as they are.
pub fn serialize_header<V: ToString>(original: &str, overrides: &[(&str, V)]) -> String {
    let mut lines: Vec<String> = original.split('\n').map(String::from).collect();
    for (keyword, value) in overrides {
        let found = lines
            .iter_mut()
            .find(|line| line.trim().starts_with(keyword));
        match found {
            Some(line) => {
                let cr = if line.ends_with('\r') { "\r" } else { "" };
                *line = format!("{} {}{}", keyword, value.to_string(), cr);
            }
            None => log::warn!("Header has no `{}` line to rewrite", keyword),
        }
    }
    lines.join("\n")
}

/// Rewrite the three dimension lines of a header.
pub fn rewrite_dimensions(original: &str, x: usize, y: usize, z: usize) -> String {
    let [kx, ky, kz] = DIMENSION_KEYWORDS;
    serialize_header(original, &[(kx, x), (ky, y), (kz, z)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CT_HEADER: &str = "# header file for a CT scan\n\
        data_type 2\n\
        z_dimension 3\n\
        x_dimension 8\n\
        y_dimension 6\n\
        pixel_size 0.1\n\
        total_frames 2\n\
        calibration_factor 1.5\n\
        frame 0\n\
        scale_factor 0.25\n\
        frame_duration 30\n\
        frame 1\n\
        scale_factor 0.5\n\
        frame_duration 60\n";

    #[test]
    fn parse_ct_fields() {
        let p = Parameters::parse(CT_HEADER, Modality::Ct).unwrap();
        assert_eq!(p.data_type().unwrap(), DataType::Int16);
        assert_eq!(p.dimensions(), (8, 6, 3));
        assert_eq!(p.total_frames, 2);
        assert_eq!(p.scale_factor, vec![0.25, 0.5]);
        assert_eq!(p.frame_duration, vec![30., 60.]);
        assert_eq!(p.pet, None);
        assert_eq!(p.aspect(), None);
    }

    #[test]
    fn first_match_wins_for_single_fields() {
        let text = format!("{}x_dimension 99\n", CT_HEADER);
        let p = Parameters::parse(&text, Modality::Ct).unwrap();
        assert_eq!(p.x_dimension, 8);
    }

    #[test]
    fn line_without_value_is_skipped() {
        let text = CT_HEADER.replace("pixel_size 0.1", "pixel_size");
        match Parameters::parse(&text, Modality::Ct) {
            Err(ScanError::MissingKeywords(k)) => assert_eq!(k, vec!["pixel_size".to_string()]),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn bad_value_is_reported() {
        let text = CT_HEADER.replace("total_frames 2", "total_frames two");
        match Parameters::parse(&text, Modality::Ct) {
            Err(ScanError::InvalidHeaderValue(k, v)) => {
                assert_eq!(k, "total_frames");
                assert_eq!(v, "two");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn not_enough_scale_factors() {
        let text = CT_HEADER.replace("total_frames 2", "total_frames 3");
        assert!(Parameters::parse(&text, Modality::Ct).is_err());
    }

    #[test]
    fn serialize_keeps_carriage_returns() {
        let text = "a 1\r\nx_dimension 128\r\nb 2\r\n";
        let out = serialize_header(text, &[("x_dimension", 64)]);
        assert_eq!(out, "a 1\r\nx_dimension 64\r\nb 2\r\n");
    }

    #[test]
    fn serialize_ignores_absent_keyword() {
        let text = "a 1\nb 2";
        assert_eq!(serialize_header(text, &[("z_dimension", 1)]), text);
    }
}
