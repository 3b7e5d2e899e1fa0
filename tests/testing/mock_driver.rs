//! In-memory CAN driver for integration tests: no vcan/socketcan interface
//! needed. Each `MockCan` instance shares its inbox/sent queues (via `Rc`)
//! with whatever handle the test kept, so the test can inject inbound
//! frames and inspect what `Node` transmitted without a real bus.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use embedded_can::nb::Can;
use embedded_can::{Frame, Id, StandardId};

#[derive(Clone)]
pub struct MockFrame {
    id: Id,
    data: Vec<u8>,
    remote: bool,
}

impl Frame for MockFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Some(MockFrame { id: id.into(), data: data.to_vec(), remote: false })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        Some(MockFrame { id: id.into(), data: vec![0u8; dlc], remote: true })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.data.len()
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for MockFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cob_id = match self.id {
            Id::Standard(id) => id.as_raw() as u32,
            Id::Extended(id) => id.as_raw(),
        };
        write!(f, "MockFrame {{ id: {:#x}, remote: {}, data: {:02x?} }}", cob_id, self.remote, self.data)
    }
}

pub fn standard_frame(cob_id: u16, data: &[u8]) -> MockFrame {
    MockFrame { id: Id::Standard(StandardId::new(cob_id).unwrap()), data: data.to_vec(), remote: false }
}

pub fn remote_frame(cob_id: u16) -> MockFrame {
    MockFrame { id: Id::Standard(StandardId::new(cob_id).unwrap()), data: Vec::new(), remote: true }
}

pub fn cob_id(frame: &MockFrame) -> u16 {
    match frame.id {
        Id::Standard(id) => id.as_raw(),
        Id::Extended(id) => id.as_raw() as u16,
    }
}

/// A `Can` implementation over two `Rc<RefCell<VecDeque>>` queues. Cloning
/// a `MockCan` shares the same underlying queues, so a test keeps one clone
/// to drive the bus while handing another to `Node::new`.
#[derive(Clone)]
pub struct MockCan {
    inbox: Rc<RefCell<VecDeque<MockFrame>>>,
    sent: Rc<RefCell<VecDeque<MockFrame>>>,
}

impl MockCan {
    pub fn new() -> Self {
        Self {
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            sent: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn push_inbound(&self, frame: MockFrame) {
        self.inbox.borrow_mut().push_back(frame);
    }

    pub fn take_sent(&self) -> Option<MockFrame> {
        self.sent.borrow_mut().pop_front()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl Default for MockCan {
    fn default() -> Self {
        Self::new()
    }
}

impl Can for MockCan {
    type Frame = MockFrame;
    type Error = core::convert::Infallible;

    fn transmit(&mut self, frame: &MockFrame) -> nb::Result<Option<MockFrame>, Self::Error> {
        self.sent.borrow_mut().push_back(frame.clone());
        Ok(None)
    }

    fn receive(&mut self) -> nb::Result<MockFrame, Self::Error> {
        self.inbox.borrow_mut().pop_front().ok_or(nb::Error::WouldBlock)
    }
}
