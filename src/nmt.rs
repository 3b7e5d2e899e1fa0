//! NMT (Network Management, CiA 301 §7.2.8 / CiA 302-2): node state machine,
//! the master->slave command set, heartbeat production/consumption and
//! classic node guarding.
//!
//! `Node<CAN>` owns the state and wires frames into here; the bookkeeping
//! that doesn't need the object directory or CAN network lives in this
//! module's own types so it can be tested without a `Node`.

use crate::prelude::*;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum NodeState {
    Init,
    PreOperational,
    Operational,
    Stopped,
}

impl NodeState {
    pub fn heartbeat_code(&self) -> u8 {
        match *self {
            NodeState::Init => 0,
            NodeState::PreOperational => 127,
            NodeState::Operational => 5,
            NodeState::Stopped => 4,
        }
    }
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum NodeEvent {
    RegularTimerEvent = 1,
    NodeStart,
    Unused = 0xFF,
}

/// The single-byte command specifier a master sends on COB-ID 0 (broadcast)
/// or targeted at one node-id, per CiA 301 Table 67.
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum NmtCommand {
    Start,
    Stop,
    EnterPreOperational,
    ResetNode,
    ResetCommunication,
}

impl NmtCommand {
    pub fn from_cs(cs: u8) -> Option<Self> {
        match cs {
            1 => Some(NmtCommand::Start),
            2 => Some(NmtCommand::Stop),
            0x80 => Some(NmtCommand::EnterPreOperational),
            0x81 => Some(NmtCommand::ResetNode),
            0x82 => Some(NmtCommand::ResetCommunication),
            _ => None,
        }
    }

    pub fn cs(&self) -> u8 {
        match *self {
            NmtCommand::Start => 1,
            NmtCommand::Stop => 2,
            NmtCommand::EnterPreOperational => 0x80,
            NmtCommand::ResetNode => 0x81,
            NmtCommand::ResetCommunication => 0x82,
        }
    }
}

/// Classic node guarding (CiA 301 §7.2.8.3, obsolescent but still deployed
/// alongside heartbeat on some masters). The master polls this node's
/// guarding COB-ID (0x700 + node-id) with a remote frame; the slave answers
/// with its state byte, toggling bit 7 on each successive answer so the
/// master can detect a duplicated or dropped response.
#[derive(Debug, Clone, Copy)]
pub struct NodeGuard {
    toggle: bool,
}

impl NodeGuard {
    pub fn new() -> Self {
        Self { toggle: false }
    }

    /// Builds the next guard response byte for `state`, flipping the toggle
    /// bit for the following call.
    pub fn response_byte(&mut self, state: NodeState) -> u8 {
        let byte = state.heartbeat_code() | if self.toggle { 0x80 } else { 0 };
        self.toggle = !self.toggle;
        byte
    }
}

impl Default for NodeGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Heartbeat consumer (CiA 301 §7.2.8.3.2): tracks whether a remote node's
/// heartbeat arrived within its configured consumer time. One instance per
/// monitored node-id, driven by `on_heartbeat`/`check` from the main tick.
#[derive(Debug, Clone)]
pub struct HeartbeatConsumer {
    node_id: u8,
    consumer_time_ms: u32,
    elapsed_ms: u32,
    seen_once: bool,
    alive: bool,
}

impl HeartbeatConsumer {
    pub fn new(node_id: u8, consumer_time_ms: u32) -> Self {
        Self {
            node_id,
            consumer_time_ms,
            elapsed_ms: 0,
            seen_once: false,
            alive: true,
        }
    }

    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Call when a heartbeat (or boot-up) frame from this node-id arrives.
    pub fn on_heartbeat(&mut self) {
        self.elapsed_ms = 0;
        self.seen_once = true;
        self.alive = true;
    }

    /// Advances the elapsed timer by `delta_ms`; returns `true` the instant
    /// this call causes the node to transition from alive to timed out.
    pub fn tick(&mut self, delta_ms: u32) -> bool {
        if self.consumer_time_ms == 0 || !self.seen_once {
            return false;
        }
        self.elapsed_ms += delta_ms;
        if self.alive && self.elapsed_ms > self.consumer_time_ms {
            self.alive = false;
            return true;
        }
        false
    }
}

/// A configured slave's expected identity (object 0x1F84..0x1F88), used by
/// `BootSlave::verify_identity` to check the slave actually answering is the
/// one the master expects at that node-id. `None` fields skip that check,
/// matching how those sub-objects are individually optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectedIdentity {
    pub device_type: Option<u32>,
    pub vendor_id: Option<u32>,
    pub product_code: Option<u32>,
    pub revision_number: Option<u32>,
    pub serial_number: Option<u32>,
}

/// Boot-slave failure, reported as the single-character code CiA 302-2
/// assigns it.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum BootError {
    DeviceTypeMismatch,
    VendorIdMismatch,
    ProductCodeMismatch,
    RevisionMismatch,
    SerialMismatch,
    HeartbeatMissing,
    NodeIdMismatch,
    BootUpNotReceived,
}

impl BootError {
    pub fn code(&self) -> char {
        match *self {
            BootError::DeviceTypeMismatch => 'A',
            BootError::VendorIdMismatch => 'B',
            BootError::ProductCodeMismatch => 'M',
            BootError::RevisionMismatch => 'N',
            BootError::SerialMismatch => 'O',
            BootError::NodeIdMismatch => 'D',
            BootError::BootUpNotReceived => 'L',
            BootError::HeartbeatMissing => 'C',
        }
    }
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum BootSlaveState {
    AwaitingBootUp,
    VerifyingIdentity,
    DownloadingDcf,
    ConfiguringHeartbeat,
    Starting,
    Operational,
    Failed(BootError),
}

/// The master-side boot-slave procedure (CiA 302-2 §7), driven externally:
/// the driver reads 0x1000/0x1018 off the slave via its own `sdo_client::SdoClient`
/// and feeds the result to `verify_identity`; this type only sequences the
/// nested states and renders the outcome as CiA 302-2's single-letter code.
/// It does not itself issue SDO requests or own a CAN network, consistent
/// with `LssMaster`/`SdoClient`'s frame-in/frame-out shape.
#[derive(Debug, Clone, Copy)]
pub struct BootSlave {
    node_id: u8,
    state: BootSlaveState,
    expected: ExpectedIdentity,
}

impl BootSlave {
    pub fn new(node_id: u8, expected: ExpectedIdentity) -> Self {
        Self { node_id, state: BootSlaveState::AwaitingBootUp, expected }
    }

    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    pub fn state(&self) -> BootSlaveState {
        self.state
    }

    /// Call on receiving this node's boot-up frame (id=0x700+node_id, data=[0]).
    pub fn on_boot_up(&mut self) {
        if self.state == BootSlaveState::AwaitingBootUp {
            self.state = BootSlaveState::VerifyingIdentity;
        }
    }

    /// Call if no boot-up frame arrives within the configured boot-up timeout.
    pub fn on_boot_up_timeout(&mut self) {
        if self.state == BootSlaveState::AwaitingBootUp {
            self.state = BootSlaveState::Failed(BootError::BootUpNotReceived);
        }
    }

    /// Feeds identity read back from 0x1000 (device type) and 0x1018 subs 1-4
    /// (vendor id, product code, revision, serial). Advances to
    /// `DownloadingDcf` on a match, or `Failed` on the first mismatch found,
    /// checked in the field order CiA 302-2 lists its error codes.
    pub fn verify_identity(
        &mut self,
        device_type: u32,
        vendor_id: u32,
        product_code: u32,
        revision_number: u32,
        serial_number: u32,
    ) -> Result<(), BootError> {
        if self.state != BootSlaveState::VerifyingIdentity {
            return Err(BootError::NodeIdMismatch);
        }
        let checks = [
            (self.expected.device_type, device_type, BootError::DeviceTypeMismatch),
            (self.expected.vendor_id, vendor_id, BootError::VendorIdMismatch),
            (self.expected.product_code, product_code, BootError::ProductCodeMismatch),
            (self.expected.revision_number, revision_number, BootError::RevisionMismatch),
            (self.expected.serial_number, serial_number, BootError::SerialMismatch),
        ];
        for (expected, actual, err) in checks {
            if let Some(expected) = expected {
                if expected != actual {
                    self.state = BootSlaveState::Failed(err);
                    return Err(err);
                }
            }
        }
        self.state = BootSlaveState::DownloadingDcf;
        Ok(())
    }

    /// Call once the slave's concise-DCF (0x1F22) has been downloaded.
    pub fn dcf_downloaded(&mut self) {
        if self.state == BootSlaveState::DownloadingDcf {
            self.state = BootSlaveState::ConfiguringHeartbeat;
        }
    }

    /// Call once the slave's heartbeat producer time (0x1017) has been configured.
    pub fn heartbeat_configured(&mut self) {
        if self.state == BootSlaveState::ConfiguringHeartbeat {
            self.state = BootSlaveState::Starting;
        }
    }

    /// Call after sending the NMT start command for this node.
    pub fn started(&mut self) {
        if self.state == BootSlaveState::Starting {
            self.state = BootSlaveState::Operational;
        }
    }

    /// Call if this slave's heartbeat consumer times out before boot
    /// completes (i.e. the slave stopped responding mid-procedure).
    pub fn on_heartbeat_lost(&mut self) {
        if !matches!(self.state, BootSlaveState::Operational | BootSlaveState::Failed(_)) {
            self.state = BootSlaveState::Failed(BootError::HeartbeatMissing);
        }
    }
}
