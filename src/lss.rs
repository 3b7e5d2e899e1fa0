//! LSS (Layer Setting Services, CiA 305): out-of-band node-id and bit-timing
//! configuration over the fixed COB-ID pair `constant::LSS_REQUEST_COB_ID` /
//! `constant::LSS_RESPONSE_COB_ID`, used before a node has settled on its
//! final address.

use crate::prelude::*;

pub const CS_SWITCH_MODE_GLOBAL: u8 = 0x04;
pub const CS_SWITCH_MODE_VENDOR_ID: u8 = 0x40;
pub const CS_SWITCH_MODE_PRODUCT_CODE: u8 = 0x41;
pub const CS_SWITCH_MODE_REVISION: u8 = 0x42;
pub const CS_SWITCH_MODE_SERIAL: u8 = 0x43;
pub const CS_SWITCH_MODE_SELECTIVE_RESPONSE: u8 = 0x44;
pub const CS_CONFIGURE_NODE_ID: u8 = 0x11;
pub const CS_CONFIGURE_BIT_TIMING: u8 = 0x13;
pub const CS_ACTIVATE_BIT_TIMING: u8 = 0x15;
pub const CS_STORE_CONFIGURATION: u8 = 0x17;
pub const CS_INQUIRE_VENDOR_ID: u8 = 0x5A;
pub const CS_INQUIRE_PRODUCT_CODE: u8 = 0x5B;
pub const CS_INQUIRE_REVISION: u8 = 0x5C;
pub const CS_INQUIRE_SERIAL: u8 = 0x5D;
pub const CS_INQUIRE_NODE_ID: u8 = 0x5E;
pub const CS_FASTSCAN: u8 = 0x51;
pub const CS_FASTSCAN_ACK: u8 = 0x4F;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum LssState {
    Waiting,
    Configuration,
}

/// The four identity fields the LSS selective-switch and fastscan
/// procedures address a slave by (CiA 305 §6.3), instead of its node-id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LssIdentity {
    pub vendor_id: u32,
    pub product_code: u32,
    pub revision_number: u32,
    pub serial_number: u32,
}

impl LssIdentity {
    fn field(&self, which: u8) -> Option<u32> {
        match which {
            0 => Some(self.vendor_id),
            1 => Some(self.product_code),
            2 => Some(self.revision_number),
            3 => Some(self.serial_number),
            _ => None,
        }
    }
}

/// LSS slave state machine. Every slave listens on the fixed LSS COB-ID pair
/// regardless of its configured node-id, so this has no node-id of its own
/// until `configure_node_id` + `store_configuration` + a reset commit one.
pub struct LssSlave {
    identity: LssIdentity,
    state: LssState,
    pending_node_id: Option<u8>,
    selective_match: [bool; 4],
}

impl LssSlave {
    pub fn new(identity: LssIdentity) -> Self {
        Self {
            identity,
            state: LssState::Waiting,
            pending_node_id: None,
            selective_match: [false; 4],
        }
    }

    pub fn state(&self) -> LssState {
        self.state
    }

    /// The node-id requested by a prior `configure_node_id` that hasn't yet
    /// been committed by `store_configuration` and a reset.
    pub fn pending_node_id(&self) -> Option<u8> {
        self.pending_node_id
    }

    /// Clears a committed pending node-id once the driver has applied it
    /// (via `Device::rebind_node_id` and a reset).
    pub fn clear_pending_node_id(&mut self) {
        self.pending_node_id = None;
    }

    /// Feeds one 8-byte LSS request frame. `current_node_id` is read for the
    /// "inquire node-id" service only; this type doesn't own it since
    /// `Node` is the source of truth. Returns the response frame due, if
    /// any — several services (activate bit timing, a fastscan non-match)
    /// have no response.
    pub fn process_request(&mut self, data: &[u8; 8], current_node_id: u8) -> Option<[u8; 8]> {
        let cs = data[0];
        match cs {
            CS_SWITCH_MODE_GLOBAL => {
                self.state = if data[1] == 1 { LssState::Configuration } else { LssState::Waiting };
                self.selective_match = [false; 4];
                None
            }
            CS_SWITCH_MODE_VENDOR_ID
            | CS_SWITCH_MODE_PRODUCT_CODE
            | CS_SWITCH_MODE_REVISION
            | CS_SWITCH_MODE_SERIAL => {
                let which = (cs - CS_SWITCH_MODE_VENDOR_ID) as usize;
                let received = u32::from_le_bytes(data[1..5].try_into().unwrap());
                self.selective_match[which] = self.identity.field(which as u8) == Some(received);
                if which == 3 && self.selective_match.iter().all(|&m| m) {
                    self.state = LssState::Configuration;
                    let mut resp = [0u8; 8];
                    resp[0] = CS_SWITCH_MODE_SELECTIVE_RESPONSE;
                    return Some(resp);
                }
                None
            }
            CS_CONFIGURE_NODE_ID if self.state == LssState::Configuration => {
                let new_id = data[1];
                let error = u8::from(!(1..=127).contains(&new_id));
                if error == 0 {
                    self.pending_node_id = Some(new_id);
                }
                let mut resp = [0u8; 8];
                resp[0] = CS_CONFIGURE_NODE_ID;
                resp[1] = error;
                Some(resp)
            }
            CS_CONFIGURE_BIT_TIMING if self.state == LssState::Configuration => {
                let mut resp = [0u8; 8];
                resp[0] = CS_CONFIGURE_BIT_TIMING;
                Some(resp)
            }
            CS_ACTIVATE_BIT_TIMING if self.state == LssState::Configuration => None,
            CS_STORE_CONFIGURATION if self.state == LssState::Configuration => {
                let mut resp = [0u8; 8];
                resp[0] = CS_STORE_CONFIGURATION;
                Some(resp)
            }
            CS_INQUIRE_VENDOR_ID
            | CS_INQUIRE_PRODUCT_CODE
            | CS_INQUIRE_REVISION
            | CS_INQUIRE_SERIAL
                if self.state == LssState::Configuration =>
            {
                let which = match cs {
                    CS_INQUIRE_VENDOR_ID => 0,
                    CS_INQUIRE_PRODUCT_CODE => 1,
                    CS_INQUIRE_REVISION => 2,
                    _ => 3,
                };
                let value = self.identity.field(which).unwrap();
                let mut resp = [0u8; 8];
                resp[0] = cs;
                resp[1..5].copy_from_slice(&value.to_le_bytes());
                Some(resp)
            }
            CS_INQUIRE_NODE_ID if self.state == LssState::Configuration => {
                let mut resp = [0u8; 8];
                resp[0] = CS_INQUIRE_NODE_ID;
                resp[1] = current_node_id;
                Some(resp)
            }
            CS_FASTSCAN => self.process_fastscan(data),
            _ => None,
        }
    }

    /// Fastscan (CiA 305 §6.3.5): the master narrows the field of candidate
    /// slaves down one bit at a time by broadcasting a candidate value and a
    /// bit position; a slave answers only if its own identity field's bits
    /// from that position upward still match. `LSSSub`/`LSSNext` step the
    /// search across the four identity fields in order; matching through
    /// bit 0 of the last field (serial number) ends the scan with exactly
    /// one slave selected into the configuration state.
    fn process_fastscan(&mut self, data: &[u8; 8]) -> Option<[u8; 8]> {
        let id_number = u32::from_le_bytes(data[1..5].try_into().unwrap());
        let bit_check = data[5];
        let lss_sub = data[6];
        let lss_next = data[7];

        let field = self.identity.field(lss_sub)?;
        let mask: u32 = if bit_check >= 32 { 0 } else { !0u32 << bit_check };
        if (field & mask) != (id_number & mask) {
            return None;
        }

        if bit_check == 0 && lss_sub == 3 && lss_next == 3 {
            self.state = LssState::Configuration;
        }

        let mut resp = [0u8; 8];
        resp[0] = CS_FASTSCAN_ACK;
        Some(resp)
    }
}

/// LSS master-side helpers: request-frame builders and response parsers,
/// for a driver acting as the network's configuration tool instead of (or
/// in addition to) a node.
pub struct LssMaster;

impl LssMaster {
    pub fn switch_mode_global(configuration: bool) -> [u8; 8] {
        let mut frame = [0u8; 8];
        frame[0] = CS_SWITCH_MODE_GLOBAL;
        frame[1] = configuration as u8;
        frame
    }

    pub fn switch_mode_selective(identity: LssIdentity) -> [[u8; 8]; 4] {
        [
            Self::field_frame(CS_SWITCH_MODE_VENDOR_ID, identity.vendor_id),
            Self::field_frame(CS_SWITCH_MODE_PRODUCT_CODE, identity.product_code),
            Self::field_frame(CS_SWITCH_MODE_REVISION, identity.revision_number),
            Self::field_frame(CS_SWITCH_MODE_SERIAL, identity.serial_number),
        ]
    }

    fn field_frame(cs: u8, value: u32) -> [u8; 8] {
        let mut frame = [0u8; 8];
        frame[0] = cs;
        frame[1..5].copy_from_slice(&value.to_le_bytes());
        frame
    }

    pub fn configure_node_id(new_node_id: u8) -> [u8; 8] {
        let mut frame = [0u8; 8];
        frame[0] = CS_CONFIGURE_NODE_ID;
        frame[1] = new_node_id;
        frame
    }

    pub fn store_configuration() -> [u8; 8] {
        let mut frame = [0u8; 8];
        frame[0] = CS_STORE_CONFIGURATION;
        frame
    }

    /// `Some(error_code)` if `response`'s command specifier matches `cs`
    /// (a configure/store acknowledgement), `None` if it's unrelated.
    pub fn parse_ack(cs: u8, response: &[u8; 8]) -> Option<u8> {
        if response[0] == cs {
            Some(response[1])
        } else {
            None
        }
    }
}
