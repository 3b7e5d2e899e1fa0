use crate::prelude::*;

/// The 27 static CANopen data types (CiA 301 Table 44).
///
/// Numeric values match the object dictionary `DataType` codes carried on
/// the wire in EDS/DCF files and object 0x1000-family entries.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DataType {
    Unknown = 0x0,
    Boolean = 0x1,
    Integer8 = 0x2,
    Integer16 = 0x3,
    Integer32 = 0x4,
    Unsigned8 = 0x5,
    Unsigned16 = 0x6,
    Unsigned32 = 0x7,
    Real32 = 0x8,
    VisibleString = 0x9,
    OctetString = 0xA,
    UnicodeString = 0xB,
    TimeOfDay = 0xC,
    TimeDifference = 0xD,
    Domain = 0xF,
    Integer24 = 0x10,
    Real64 = 0x11,
    Integer40 = 0x12,
    Integer48 = 0x13,
    Integer56 = 0x14,
    Integer64 = 0x15,
    Unsigned24 = 0x16,
    Unsigned40 = 0x18,
    Unsigned48 = 0x19,
    Unsigned56 = 0x1A,
    Unsigned64 = 0x1B,
}

impl DataType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0x0 => DataType::Unknown,
            0x1 => DataType::Boolean,
            0x2 => DataType::Integer8,
            0x3 => DataType::Integer16,
            0x4 => DataType::Integer32,
            0x5 => DataType::Unsigned8,
            0x6 => DataType::Unsigned16,
            0x7 => DataType::Unsigned32,
            0x8 => DataType::Real32,
            0x9 => DataType::VisibleString,
            0xA => DataType::OctetString,
            0xB => DataType::UnicodeString,
            0xC => DataType::TimeOfDay,
            0xD => DataType::TimeDifference,
            0xF => DataType::Domain,
            0x10 => DataType::Integer24,
            0x11 => DataType::Real64,
            0x12 => DataType::Integer40,
            0x13 => DataType::Integer48,
            0x14 => DataType::Integer56,
            0x15 => DataType::Integer64,
            0x16 => DataType::Unsigned24,
            0x18 => DataType::Unsigned40,
            0x19 => DataType::Unsigned48,
            0x1A => DataType::Unsigned56,
            0x1B => DataType::Unsigned64,
            _ => DataType::Unknown,
        }
    }

    /// Encoded size in bytes, or `None` for the variable-length types
    /// (strings and domain accept any length, per §4.8).
    pub fn fixed_size(&self) -> Option<usize> {
        match *self {
            DataType::Unknown => None,
            DataType::Boolean => Some(1),
            DataType::Integer8 | DataType::Unsigned8 => Some(1),
            DataType::Integer16 | DataType::Unsigned16 => Some(2),
            DataType::Integer24 | DataType::Unsigned24 => Some(3),
            DataType::Integer32 | DataType::Unsigned32 | DataType::Real32 => Some(4),
            DataType::Integer40 | DataType::Unsigned40 => Some(5),
            DataType::Integer48
            | DataType::Unsigned48
            | DataType::TimeOfDay
            | DataType::TimeDifference => Some(6),
            DataType::Integer56 | DataType::Unsigned56 => Some(7),
            DataType::Integer64 | DataType::Unsigned64 | DataType::Real64 => Some(8),
            DataType::VisibleString
            | DataType::OctetString
            | DataType::UnicodeString
            | DataType::Domain => None,
        }
    }

    /// PDO mapping requires a fixed byte length to compute bit offsets.
    pub fn is_fixed_length(&self) -> bool {
        self.fixed_size().is_some()
    }

    pub fn size(&self) -> usize {
        self.fixed_size().unwrap_or(0)
    }

    pub fn default_value(&self) -> Vec<u8> {
        vec![0u8; self.size()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_code() {
        let codes = [
            0x0, 0x1, 0x2, 0x3, 0x4, 0x5, 0x6, 0x7, 0x8, 0x9, 0xA, 0xB, 0xC, 0xD, 0xF, 0x10, 0x11,
            0x12, 0x13, 0x14, 0x15, 0x16, 0x18, 0x19, 0x1A, 0x1B,
        ];
        for &code in &codes {
            assert_ne!(DataType::from_u32(code), DataType::Unknown, "code {:#x}", code);
        }
    }

    #[test]
    fn unknown_code_maps_to_unknown() {
        assert_eq!(DataType::from_u32(0xDEAD), DataType::Unknown);
    }

    #[test]
    fn strings_and_domain_have_no_fixed_size() {
        assert_eq!(DataType::VisibleString.fixed_size(), None);
        assert_eq!(DataType::OctetString.fixed_size(), None);
        assert_eq!(DataType::UnicodeString.fixed_size(), None);
        assert_eq!(DataType::Domain.fixed_size(), None);
        assert!(!DataType::VisibleString.is_fixed_length());
    }

    #[test]
    fn time_types_are_six_bytes() {
        assert_eq!(DataType::TimeOfDay.size(), 6);
        assert_eq!(DataType::TimeDifference.size(), 6);
    }

    #[test]
    fn integer24_is_three_bytes() {
        assert_eq!(DataType::Integer24.size(), 3);
        assert_eq!(DataType::Unsigned24.size(), 3);
    }
}
