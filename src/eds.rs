//! EDS (Electronic Data Sheet) text loading.
//!
//! The ini-format parsing itself lives in `object_directory::Device`
//! (`process_section`/`load_from_content`), since the tree and its loader
//! share enough (compact sub-object expansion, `$NODEID` substitution)
//! that splitting them apart would just mean passing the half-built tree
//! back and forth. This module is the public entry point a driver reaches
//! for, so that entry point isn't a method tucked inside `object_directory`.

use crate::object_directory::Device;
use crate::prelude::*;

/// Builds a `Device` from the full text of an EDS file for `node_id`.
pub fn load(node_id: u8, eds_content: &str) -> Result<Device, String> {
    Device::new(node_id, eds_content)
}

/// Applies additional EDS text (e.g. a manufacturer-specific fragment) onto
/// an already-built `Device`, such as loading a DCD on top of the base EDS.
pub fn apply(device: &mut Device, eds_content: &str) -> Result<(), String> {
    device.load_from_content(eds_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_eds() {
        let eds = "\
[1000]
ParameterName=Device type
ObjectType=0x7
DataType=0x7
AccessType=ro
DefaultValue=0
";
        let device = load(0x01, eds).unwrap();
        assert_eq!(device.node_id(), 0x01);
        assert!(device.contains_index(0x1000));
    }
}
