use core::ops::RangeInclusive;
use embedded_can::{nb::Can, Frame};
use crate::emergency::{EmergencyErrorCode, ErrorRegister};

use crate::constant::{LSS_REQUEST_COB_ID, LSS_RESPONSE_COB_ID};
use crate::lss::{LssIdentity, LssSlave};
use crate::nmt::{HeartbeatConsumer, NmtCommand, NodeGuard};
pub use crate::nmt::{NodeEvent, NodeState};
use crate::object_directory::ObjectDirectory;
use crate::pdo::PdoObjects;
use crate::prelude::*;
use crate::redundancy::RedundancyManager;
use crate::sdo_server::SdoServerSession;
use crate::util::{create_frame, get_cob_id};
use crate::{error, info};
use crate::error::ErrorCode;

/// The implementation of Node here is not thread-safe. This implementation is
/// intended for MCU environments, where we aim for ease of use and real-time
/// performance in a single-chip environment. We have run tests on x86 as well,
/// but without enabling multi-threading.
///
/// For a thread-safe implementation, using mutexes to protect objects like
/// the Object Dictionary (OD) would be too coarse-grained. Protecting at the
/// Variable level might not incur significant performance loss due to critical
/// sections, but it still wouldn't be considered thread-safe. To achieve true
/// thread safety, we might need to replace data structures in the OD, such as
/// Map, with atomic (preferably lock-free) ones. However, currently in the
/// Rust embedded environment, there are no sufficiently mature libraries for
/// this, and we do not wish to introduce the standard (std) library, as it
/// would compromise our library's current usability in embedded environments.
pub struct Node<CAN> where CAN: Can, CAN::Frame: Frame + Debug {
    pub(crate) node_id: u8,
    pub(crate) can_network: CAN,
    pub(crate) object_directory: ObjectDirectory,
    backup_od: ObjectDirectory,
    pub(crate) pdo_objects: PdoObjects,

    // SDO specific data below:
    /// One session per client request COB-ID, so concurrent clients don't
    /// clobber each other's in-flight segmented/block transfer state.
    pub(crate) sdo_sessions: HashMap<u16, SdoServerSession>,
    pub(crate) crc_enabled: bool,

    pub(crate) sync_count: u32,
    pub(crate) event_count: u32,
    pub(crate) state: NodeState,
    pub(crate) error_count: u8,
    pub(crate) heartbeats: u32,
    pub(crate) heartbeats_timer: u32,
    pub(crate) node_guard: NodeGuard,
    pub(crate) now_ms: u64,
    pub(crate) lss_slave: LssSlave,
    pub(crate) heartbeat_consumers: Vec<HeartbeatConsumer>,
    pub(crate) redundancy: Option<RedundancyManager>,
}

impl<CAN> Node<CAN> where CAN: Can, CAN::Frame: Frame + Debug {
    pub fn new(
        node_id: u8,
        eds_content: &str,
        can_network: CAN,
    ) -> Result<Self, ErrorCode> {
        let mut object_directory = ObjectDirectory::new(node_id, eds_content)?;
        let backup_od = object_directory.snapshot();
        let pdo_objects = PdoObjects::new();
        let identity = LssIdentity {
            vendor_id: object_directory.get_variable(0x1018, 1).map(|v| v.default_value().to()).unwrap_or(0),
            product_code: object_directory.get_variable(0x1018, 2).map(|v| v.default_value().to()).unwrap_or(0),
            revision_number: object_directory.get_variable(0x1018, 3).map(|v| v.default_value().to()).unwrap_or(0),
            serial_number: object_directory.get_variable(0x1018, 4).map(|v| v.default_value().to()).unwrap_or(0),
        };
        let mut node = Node {
            node_id,
            can_network,
            object_directory,
            backup_od,
            pdo_objects,
            sdo_sessions: HashMap::new(),
            crc_enabled: true,
            sync_count: 0,
            event_count: 0,
            state: NodeState::Init,
            error_count: 0,
            heartbeats: 0,
            heartbeats_timer: 0,
            node_guard: NodeGuard::new(),
            now_ms: 0,
            lss_slave: LssSlave::new(identity),
            heartbeat_consumers: Vec::new(),
            redundancy: None,
        };
        node.update_pdo_params()?;
        Ok(node)
    }

    pub fn pdo_objects(&mut self) -> &mut PdoObjects {
        &mut self.pdo_objects
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Advances the node's notion of the current time. The driver calls
    /// this once per main-loop iteration before `process_one_frame`, in
    /// whatever timebase it also drives a `TimerWheel` with; only inhibit-time
    /// PDO gating currently reads it.
    pub fn tick(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    /// Registers a heartbeat consumer for `node_id` (object 0x1016's array).
    /// Call once per monitored remote node after construction.
    pub fn add_heartbeat_consumer(&mut self, node_id: u8, consumer_time_ms: u32) {
        self.heartbeat_consumers.push(HeartbeatConsumer::new(node_id, consumer_time_ms));
    }

    /// Enables the optional bus-A/B redundancy manager, switching the active
    /// bus after `threshold` consecutive missed heartbeats on it.
    pub fn enable_redundancy(&mut self, threshold: u32) {
        self.redundancy = Some(RedundancyManager::new(threshold));
    }

    /// The currently active bus, if redundancy is enabled.
    pub fn active_bus(&self) -> Option<crate::redundancy::Bus> {
        self.redundancy.as_ref().map(|r| r.active())
    }
}

impl<CAN: Can> Node<CAN> where CAN::Frame: Frame + Debug {
    pub(crate) fn update_pdo_params(&mut self) -> Result<(), ErrorCode> {
        for i in (0x1400..0x1C00).step_by(0x200) {
            for j in 0..4 {
                let idx = i + j;

                if let Ok(var) = self.object_directory.get_variable(idx, 0) {
                    let var_clone = var.clone();
                    let len: u8 = var_clone.default_value().to();
                    for k in 1..=len {
                        if let Ok(sub_var) = self.object_directory.get_variable(idx, k) {
                            let sub_var_clone = sub_var.clone();
                            self.update(&sub_var_clone)?;
                        }
                    };
                    self.update(&var_clone)?;
                };

                let mut len = 0u8;
                let mut k = 0u8;

                while k <= len {
                    if let Ok(var) = self.object_directory.get_variable(idx, k) {
                        let var_clone = var.clone();
                        self.update(&var_clone)?;
                        if k == 0 { len = var_clone.default_value().to(); }
                    }
                    k += 1;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn filter_frame(&self, frame: &CAN::Frame) -> bool {
        if let Some(cob_id) = get_cob_id(frame) {
            if cob_id & 0x7F == self.node_id as u16 {
                return false;
            }
        }
        true
    }

    fn reset_object_directory_range(&mut self, range: RangeInclusive<u16>, full_range: bool) -> bool {
        let indexes_to_reset: Vec<u16> = if full_range {
            self.object_directory.indexes()
        } else {
            self.object_directory
                .indexes()
                .into_iter()
                .filter(|index| range.contains(index))
                .collect()
        };

        // Replace the objects at these indexes with their backed-up originals.
        for index in indexes_to_reset {
            self.object_directory.remove_object(index);
            if let Some(backup_object) = self.backup_od.get_object(index).cloned() {
                self.object_directory.insert_object(index, backup_object);
            }
        }

        self.object_directory.prune_dangling_names();
        true
    }

    /// Rebuilds communication specific fields for the object directory.
    pub(crate) fn reset_communication(&mut self) -> bool {
        self.reset_object_directory_range(0x1000..=0x1FFF, false)
    }

    /// Rebuilds application specific fields for the object directory.
    pub(crate) fn reset_application(&mut self) -> bool {
        self.reset_object_directory_range(0x6000..=0x9FFF, false)
    }

    /// Rebuilds the whole object directory
    pub(crate) fn reset(&mut self) -> bool {
        self.reset_object_directory_range(0x1000..=0x9FFF, true)
    }

    fn process_nmt_frame(&mut self, frame: &CAN::Frame) {
        if frame.dlc() != 2 {
            return;
        }
        let (cs, nid) = (frame.data()[0], frame.data()[1]);
        info!("process_nmt_frame 1: cs = {:#x}, nid = {}", cs, nid);
        if nid != 0 && nid != self.node_id {
            return;
        }
        let command = match NmtCommand::from_cs(cs) {
            Some(c) => c,
            None => return,
        };
        match command {
            NmtCommand::Start => {
                info!("NMT: change state to OPERATIONAL");
                self.state = NodeState::Operational;
                self.trigger_event(NodeEvent::NodeStart);
            }
            NmtCommand::Stop => if self.state != NodeState::Init {
                info!("NMT: change state to STOPPED");
                self.state = NodeState::Stopped;
            },
            NmtCommand::EnterPreOperational => {
                info!("NMT: change state to PRE-OPERATIONAL");
                self.state = NodeState::PreOperational;
            }
            NmtCommand::ResetNode => {
                info!("NMT: change state to INIT, will reset the whole system");
                self.state = NodeState::Init;
                self.reset();
                self.apply_pending_lss_node_id();
            }
            NmtCommand::ResetCommunication => {
                info!("NMT: change state to INIT, will reset the communication");
                self.state = NodeState::Init;
                self.reset_communication();
                self.apply_pending_lss_node_id();
            }
        }
    }

    /// Commits a node-id staged by LSS `configure_node_id` (CiA 305 §6.3.2):
    /// only takes effect across a communication/node reset, per spec.
    fn apply_pending_lss_node_id(&mut self) {
        if let Some(new_node_id) = self.lss_slave.pending_node_id() {
            self.node_id = new_node_id;
            self.object_directory.rebind_node_id(new_node_id);
            self.lss_slave.clear_pending_node_id();
        }
    }

    /// Responds to a node-guarding remote frame addressed to this node's
    /// guarding COB-ID (0x700 + node-id) with the toggled state byte.
    fn process_node_guard_frame(&mut self) {
        let byte = self.node_guard.response_byte(self.state);
        match create_frame(0x700 + self.node_id as u16, &[byte]) {
            Ok(frame) => self.transmit(&frame),
            Err(ec) => error!("Errors in creating node guard response frame: {:?}", ec),
        }
    }

    fn process_rpdo_frame(&mut self, frame: &CAN::Frame) {
        let result = (|frame: &CAN::Frame| -> Result<(), ErrorCode>{
            let cob_id = get_cob_id(frame).ok_or(ErrorCode::NoCobIdInFrame)?;
            let rpdo = self.pdo_objects.get_mut_rpdo_with_cob_id(cob_id)?;
            if frame.data().len() != ((rpdo.total_length() + 7) / 8) as usize {
                // trigger emergency
                let bytes = cob_id.to_le_bytes();
                return self.trigger_emergency(
                    EmergencyErrorCode::PdoNotProcessed, ErrorRegister::GenericError, &bytes)
            }
            rpdo.set_cached_data(frame.data());
            Ok(())
        })(frame);
        match result {
            Ok(_) => {}
            Err(ec) => {
                error!("Errors in processing a RPDO frame: {:x?}, err: {:x?}", frame, ec);
            }
        }
    }

    pub fn transmit(&mut self, frame: &CAN::Frame) {
        match self.can_network.transmit(frame) {
            Ok(_) => {
                info!("Sent frame {:x?}", frame);
            }
            Err(err) => {
                error!("Errors in transmit frame {:x?}, err: {:?}", frame, err);
            }
        }
    }

    pub fn init(&mut self) -> Result<(), ErrorCode> {
        // TODO(zephyr): this is informal, let's figure out a formal way later or just remove this.
        let ready_frame = create_frame(0x234, &[1, 2, 3, 5])?;
        self.transmit(&ready_frame);
        Ok(())
    }

    // Need to be non-blocking.
    pub fn process_one_frame(&mut self) {
        let frame = match self.can_network.receive() {
            Ok(f) => f,
            Err(nb::Error::WouldBlock) => return,  // try next time
            Err(nb::Error::Other(err)) => {
                info!("Errors in reading CAN frame, {:?}", err);
                return
            }
        };
        info!("got frame: {:?}", frame);
        if let Some(cob_id) = get_cob_id(&frame) {
            if let Some(redundancy) = self.redundancy.as_mut() {
                redundancy.on_frame_received();
            }
            if frame.is_remote_frame() && cob_id == 0x700 + self.node_id as u16 {
                self.process_node_guard_frame();
                return;
            }
            if cob_id & 0xFF80 == 0x700 {
                self.process_heartbeat_frame(cob_id - 0x700);
            }
            if cob_id == LSS_REQUEST_COB_ID {
                self.process_lss_frame(&frame);
                return;
            }
            match cob_id & 0xFF80 {
                0x000 => self.process_nmt_frame(&frame),
                0x200..=0x500 => self.process_rpdo_frame(&frame),
                0x080 => self.process_sync_frame(),
                0x600 => self.process_sdo_frame(&frame),
                _ => {},
            }
        }
    }

    /// Feeds an observed heartbeat/boot-up frame from `node_id` to any
    /// registered consumer for it.
    fn process_heartbeat_frame(&mut self, node_id: u16) {
        if node_id > 0x7F {
            return;
        }
        for consumer in self.heartbeat_consumers.iter_mut() {
            if consumer.node_id() == node_id as u8 {
                consumer.on_heartbeat();
            }
        }
    }

    /// Advances every registered heartbeat consumer by `delta_ms`. The
    /// driver calls this from the same loop that calls `tick`.
    pub fn tick_heartbeat_consumers(&mut self, delta_ms: u32) {
        for consumer in self.heartbeat_consumers.iter_mut() {
            if consumer.tick(delta_ms) {
                if let Some(redundancy) = self.redundancy.as_mut() {
                    redundancy.on_heartbeat_missed();
                }
            }
        }
    }

    fn process_lss_frame(&mut self, frame: &CAN::Frame) {
        if frame.dlc() != 8 {
            return;
        }
        let mut data = [0u8; 8];
        data.copy_from_slice(&frame.data()[..8]);
        if let Some(resp) = self.lss_slave.process_request(&data, self.node_id) {
            match create_frame(LSS_RESPONSE_COB_ID, &resp) {
                Ok(frame) => self.transmit(&frame),
                Err(ec) => error!("Errors in creating LSS response frame: {:?}", ec),
            }
        }
    }

    fn call_tpdo(&mut self, is_sync: bool, event: NodeEvent, count: u32) {
        match self.transmit_pdo_messages(is_sync, event, count) {
            Ok(_) => {}
            Err(err) => { error!("Errors in transmit PDO message: {:x?}", err); }
        }
    }

    pub fn trigger_event(&mut self, event: NodeEvent) {
        if event == NodeEvent::NodeStart {
            self.event_count = 0;
            self.sync_count = 0;
            self.error_count = 0;
            self.heartbeats = 0;
            self.call_tpdo(false, event, self.event_count);
        }
    }

    fn process_sync_frame(&mut self) {
        if self.state == NodeState::Operational {
            self.sync_count += 1;
            self.save_rpdo_messages(true, NodeEvent::Unused, self.sync_count);
            self.call_tpdo(true, NodeEvent::Unused, self.sync_count);
        }
    }

    pub fn event_timer_callback(&mut self) {
        // info!("event_timer_callback 0, state = {:?}", self.state);
        if self.heartbeats_timer > 0 {
            self.heartbeats += 1;
            if self.heartbeats % self.heartbeats_timer == 0 {
                match create_frame(0x700 + self.node_id as u16, &[self.state.heartbeat_code()]) {
                    Ok(frame) => { self.transmit(&frame) }
                    Err(ec) => {
                        error!("Errors in creating heartbeat CAN frame: error_code = {:?}", ec);
                    }
                }
            }
        }

        if self.state == NodeState::Operational {
            self.event_count += 1;
            self.save_rpdo_messages(false, NodeEvent::RegularTimerEvent, self.event_count);
            self.call_tpdo(false, NodeEvent::RegularTimerEvent, self.event_count);
        }
    }
}
