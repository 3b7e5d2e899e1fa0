//! Concise-DCF binary format (CiA 302-4 / DS306): the compact binary
//! encoding an SDO `download_dcf` transfers to apply a whole device
//! configuration in one shot, instead of one SDO per sub-entry.
//!
//! Wire layout, all integers little-endian:
//! ```text
//! u32        number_of_entries
//! repeated number_of_entries times:
//!     u16    index
//!     u8     sub_index
//!     u32    size
//!     [u8; size]  data
//! ```

use crate::error::AbortCode;
use crate::object_directory::Device;
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DcfEntry {
    pub index: u16,
    pub sub_index: u8,
    pub data: Vec<u8>,
}

/// Parses a concise-DCF byte buffer into its entries. Fails on truncation
/// with `DataTypeMismatchLengthMismatch`; this mirrors the abort code an
/// SDO block-download CRC/size mismatch would itself report.
pub fn parse(bytes: &[u8]) -> Result<Vec<DcfEntry>, AbortCode> {
    let mut cursor = 0usize;
    let take = |cursor: &mut usize, n: usize| -> Result<&[u8], AbortCode> {
        if *cursor + n > bytes.len() {
            return Err(AbortCode::DataTypeMismatchLengthMismatch);
        }
        let slice = &bytes[*cursor..*cursor + n];
        *cursor += n;
        Ok(slice)
    };

    let count = u32::from_le_bytes(take(&mut cursor, 4)?.try_into().unwrap());
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let index = u16::from_le_bytes(take(&mut cursor, 2)?.try_into().unwrap());
        let sub_index = take(&mut cursor, 1)?[0];
        let size = u32::from_le_bytes(take(&mut cursor, 4)?.try_into().unwrap()) as usize;
        let data = take(&mut cursor, size)?.to_vec();
        entries.push(DcfEntry { index, sub_index, data });
    }
    Ok(entries)
}

/// Serializes entries into concise-DCF bytes, in the order given.
pub fn write(entries: &[DcfEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        out.extend_from_slice(&entry.index.to_le_bytes());
        out.push(entry.sub_index);
        out.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&entry.data);
    }
    out
}

/// Result of applying a concise-DCF: how many entries committed before the
/// first failure, and what that failure was (if any).
#[derive(Debug, PartialEq)]
pub struct ApplyReport {
    pub applied: usize,
    pub failed: Option<(u16, u8, AbortCode)>,
}

/// Applies each entry to `device` in order. On the first failing entry,
/// stops and reports it — already-applied entries are **not** rolled back.
/// This is the Open-Question resolution for concise-DCF apply semantics:
/// best-effort, first-failure reporting, no transactional rollback, which
/// matches how a single real SDO `download_dcf` session behaves (the
/// client would see one abort and have to decide what to do next; there is
/// no protocol-level "undo" for subs already written).
pub fn apply(device: &mut Device, entries: &[DcfEntry]) -> ApplyReport {
    for (applied, entry) in entries.iter().enumerate() {
        if let Err(code) = device.set_value(entry.index, entry.sub_index, &entry.data, true) {
            return ApplyReport {
                applied,
                failed: Some((entry.index, entry.sub_index, code)),
            };
        }
    }
    ApplyReport {
        applied: entries.len(),
        failed: None,
    }
}

/// Reads back every currently-writable entry named by `wanted` as a
/// concise-DCF buffer, for building a backup/restore snapshot.
pub fn read_dcf(device: &mut Device, wanted: &[(u16, u8)]) -> Vec<u8> {
    let mut entries = Vec::new();
    for &(index, sub_index) in wanted {
        if let Ok(var) = device.get_variable(index, sub_index) {
            entries.push(DcfEntry {
                index,
                sub_index,
                data: var.default_value().as_slice().to_vec(),
            });
        }
    }
    write(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_entries() {
        let entries = vec![
            DcfEntry { index: 0x1017, sub_index: 0, data: vec![0xE8, 0x03] },
            DcfEntry { index: 0x6000, sub_index: 1, data: vec![0x01] },
        ];
        let bytes = write(&entries);
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn parse_rejects_truncated_buffer() {
        let bytes = [2, 0, 0, 0, 0x17, 0x10];
        assert_eq!(parse(&bytes), Err(AbortCode::DataTypeMismatchLengthMismatch));
    }

    #[test]
    fn apply_stops_at_first_failure_without_rollback() {
        let eds = "\
[1017]
ParameterName=Producer heartbeat time
ObjectType=0x7
DataType=0x6
AccessType=rw
DefaultValue=0
";
        let mut device = Device::new(0x01, eds).unwrap();
        let entries = vec![
            DcfEntry { index: 0x1017, sub_index: 0, data: 500u16.to_le_bytes().to_vec() },
            DcfEntry { index: 0x9999, sub_index: 0, data: vec![1] },
            DcfEntry { index: 0x1017, sub_index: 0, data: 999u16.to_le_bytes().to_vec() },
        ];
        let report = apply(&mut device, &entries);
        assert_eq!(report.applied, 1);
        assert_eq!(report.failed.unwrap().0, 0x9999);
        // First write committed even though a later one failed.
        assert_eq!(device.get_variable(0x1017, 0).unwrap().default_value().as_slice(), &500u16.to_le_bytes());
    }
}
