mod testing;

use embedded_can::Frame;

use canopen_rust::node::{Node, NodeState};
use canopen_rust::redundancy::Bus;
use testing::mock_driver::{cob_id, remote_frame, standard_frame, MockCan};

const MINIMAL_EDS: &str = "\
[1000]
ParameterName=Device type
ObjectType=0x7
DataType=0x7
AccessType=ro
DefaultValue=0

[1017]
ParameterName=Producer heartbeat time
ObjectType=0x7
DataType=0x6
AccessType=rw
DefaultValue=0

[1018]
ParameterName=Identity object
ObjectType=0x9
SubNumber=5

[1018sub0]
ParameterName=Number of entries
ObjectType=0x7
DataType=0x5
AccessType=ro
DefaultValue=4

[1018sub1]
ParameterName=Vendor-ID
ObjectType=0x7
DataType=0x7
AccessType=ro
DefaultValue=0x1001

[1018sub2]
ParameterName=Product code
ObjectType=0x7
DataType=0x7
AccessType=ro
DefaultValue=0x2002

[1018sub3]
ParameterName=Revision number
ObjectType=0x7
DataType=0x7
AccessType=ro
DefaultValue=0x3003

[1018sub4]
ParameterName=Serial number
ObjectType=0x7
DataType=0x7
AccessType=ro
DefaultValue=0x4004
";

const NODE_ID: u8 = 2;

fn new_node() -> (Node<MockCan>, MockCan) {
    let driver = MockCan::new();
    let node = Node::new(NODE_ID, MINIMAL_EDS, driver.clone()).expect("failed to build node");
    (node, driver)
}

#[test]
fn nmt_start_moves_node_to_operational() {
    let (mut node, driver) = new_node();
    assert_eq!(node.state(), NodeState::Init);

    driver.push_inbound(standard_frame(0x000, &[0x01, NODE_ID]));
    node.process_one_frame();

    assert_eq!(node.state(), NodeState::Operational);
}

#[test]
fn nmt_command_for_other_node_is_ignored() {
    let (mut node, driver) = new_node();

    driver.push_inbound(standard_frame(0x000, &[0x01, NODE_ID + 1]));
    node.process_one_frame();

    assert_eq!(node.state(), NodeState::Init);
}

#[test]
fn nmt_stop_then_reset_node_returns_to_init() {
    let (mut node, driver) = new_node();

    driver.push_inbound(standard_frame(0x000, &[0x01, 0]));
    node.process_one_frame();
    assert_eq!(node.state(), NodeState::Operational);

    driver.push_inbound(standard_frame(0x000, &[0x02, 0]));
    node.process_one_frame();
    assert_eq!(node.state(), NodeState::Stopped);

    driver.push_inbound(standard_frame(0x000, &[0x81, 0]));
    node.process_one_frame();
    assert_eq!(node.state(), NodeState::Init);
}

#[test]
fn node_guard_rtr_gets_toggled_response() {
    let (mut node, driver) = new_node();

    driver.push_inbound(remote_frame(0x700 + NODE_ID as u16));
    node.process_one_frame();

    let resp = driver.take_sent().expect("expected a node guard response frame");
    assert_eq!(cob_id(&resp), 0x700 + NODE_ID as u16);
    assert_eq!(resp.data()[0] & 0x7F, NodeState::Init.heartbeat_code());
}

#[test]
fn expedited_sdo_upload_returns_default_value() {
    let (mut node, driver) = new_node();

    // ccs = 2 (initiate upload), index 0x1017, sub-index 0.
    driver.push_inbound(standard_frame(0x600 + NODE_ID as u16, &[0x40, 0x17, 0x10, 0x00, 0, 0, 0, 0]));
    node.process_one_frame();

    let resp = driver.take_sent().expect("expected an SDO upload response");
    assert_eq!(cob_id(&resp), 0x580 + NODE_ID as u16);
    // expedited, 2 bytes of data -> n = 4 - 2 = 2
    assert_eq!(resp.data()[0], 0x43 | (2 << 2));
    assert_eq!(resp.data()[1], 0x17);
    assert_eq!(resp.data()[2], 0x10);
    assert_eq!(&resp.data()[4..6], &[0, 0]);
}

#[test]
fn sdo_upload_of_unknown_index_aborts() {
    let (mut node, driver) = new_node();

    driver.push_inbound(standard_frame(0x600 + NODE_ID as u16, &[0x40, 0xAB, 0x20, 0x00, 0, 0, 0, 0]));
    node.process_one_frame();

    let resp = driver.take_sent().expect("expected an SDO abort frame");
    assert_eq!(cob_id(&resp), 0x580 + NODE_ID as u16);
    assert_eq!(resp.data()[0], 0x80);
}

#[test]
fn missed_heartbeat_switches_the_active_bus() {
    let (mut node, driver) = new_node();
    node.add_heartbeat_consumer(NODE_ID + 1, 100);
    node.enable_redundancy(1);
    assert_eq!(node.active_bus(), Some(Bus::A));

    driver.push_inbound(standard_frame(0x700 + (NODE_ID + 1) as u16, &[0x05]));
    node.process_one_frame();

    // one tick past the consumer time trips the alive->timed-out transition,
    // which counts as the one consecutive miss the threshold-of-1 needs.
    node.tick_heartbeat_consumers(150);
    assert_eq!(node.active_bus(), Some(Bus::B));
}

#[test]
fn lss_switch_mode_global_then_configure_node_id() {
    let (mut node, driver) = new_node();

    // switch to configuration mode (cs = 0x04, mode = 1)
    driver.push_inbound(standard_frame(0x7E5, &[0x04, 0x01, 0, 0, 0, 0, 0, 0]));
    node.process_one_frame();
    assert!(driver.take_sent().is_none(), "switch mode global has no response");

    // configure node-id to 9 (cs = 0x11)
    driver.push_inbound(standard_frame(0x7E5, &[0x11, 9, 0, 0, 0, 0, 0, 0]));
    node.process_one_frame();

    let resp = driver.take_sent().expect("expected an LSS configure-node-id response");
    assert_eq!(cob_id(&resp), 0x7E4);
    assert_eq!(resp.data()[0], 0x11);
    assert_eq!(resp.data()[1], 0);

    // staged node-id only takes effect across a reset.
    assert_eq!(node.node_id(), NODE_ID);
    driver.push_inbound(standard_frame(0x000, &[0x81, 0]));
    node.process_one_frame();
    assert_eq!(node.node_id(), 9);
}
