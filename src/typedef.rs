//! This module contains the enumerated types used by scan headers.
//! Primitive header codes can be converted to these types through
//! `FromPrimitive`, which is also how the validated accessors of
//! [`Parameters`] are implemented.
//!
//! [`Parameters`]: ../header/struct.Parameters.html

use crate::error::{ScanError, Result};
use crate::header::{FieldDescriptor, CT_FIELDS, PET_FIELDS};
use num_traits::FromPrimitive;

/// Pack format of the voxels in a data file, as given by the header's
/// `data_type` keyword.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum DataType {
    /// unsigned char.
    Uint8 = 1,
    /// signed short.
    Int16 = 2,
    /// signed int.
    Int32 = 3,
    /// 32 bit float.
    Float32 = 4,
}

impl DataType {
    /// Validate a raw `data_type` header code.
    pub fn from_code(code: i64) -> Result<DataType> {
        FromPrimitive::from_i64(code).ok_or(ScanError::UnknownDataType(code))
    }

    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(self) -> usize {
        match self {
            DataType::Uint8 => 1,
            DataType::Int16 => 2,
            DataType::Int32 | DataType::Float32 => 4,
        }
    }

    /// Whether values of this type must be rounded to integers on encoding.
    pub fn is_integral(self) -> bool {
        self != DataType::Float32
    }
}

/// The scanner modality, which determines the set of header keywords that
/// must be present.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Modality {
    /// Positron emission tomography, with crystal geometry and isotope
    /// calibration keywords.
    Pet,
    /// Computed tomography, with the reduced keyword set.
    Ct,
}

impl Modality {
    /// The header fields required by this modality.
    pub fn fields(self) -> &'static [FieldDescriptor] {
        match self {
            Modality::Pet => PET_FIELDS,
            Modality::Ct => CT_FIELDS,
        }
    }

    /// Short lowercase name of the modality.
    pub fn name(self) -> &'static str {
        match self {
            Modality::Pet => "pet",
            Modality::Ct => "ct",
        }
    }
}
