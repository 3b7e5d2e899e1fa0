use embedded_can::Frame;

use crate::prelude::*;
use crate::util;

/// A single registered interest in incoming frames: frames whose standard
/// ID matches `pattern` once masked by `mask` are handed to `handler`.
///
/// Mirrors the `(CanFilter, Subscription)` shape used by async CAN routers,
/// but without a channel: the handler runs synchronously on the thread that
/// calls [`Router::dispatch`], matching this stack's single-threaded,
/// cooperative scheduling model.
struct Receiver<F> {
    pattern: u16,
    mask: u16,
    handler: Box<dyn FnMut(&F)>,
}

impl<F> Receiver<F> {
    fn matches(&self, cob_id: u16) -> bool {
        (cob_id & self.mask) == (self.pattern & self.mask)
    }
}

/// Dispatches incoming CAN frames to registered handlers, in registration
/// order, by `(pattern, mask)` match against the frame's standard ID.
///
/// One `Router` serves one CAN bus. A `Node` with two buses (see
/// `redundancy.rs`) owns two routers.
pub struct Router<F> {
    receivers: Vec<Receiver<F>>,
}

impl<F: Frame> Default for Router<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Frame> Router<F> {
    pub fn new() -> Self {
        Self {
            receivers: Vec::new(),
        }
    }

    /// Registers a handler for frames whose id satisfies
    /// `id & mask == pattern & mask`. Returns a token that can be used with
    /// [`Router::unregister`].
    pub fn register(&mut self, pattern: u16, mask: u16, handler: Box<dyn FnMut(&F)>) -> usize {
        self.receivers.push(Receiver { pattern, mask, handler });
        self.receivers.len() - 1
    }

    /// Registers a handler that matches exactly one COB-ID.
    pub fn register_exact(&mut self, cob_id: u16, handler: Box<dyn FnMut(&F)>) -> usize {
        self.register(cob_id, 0xFFFF, handler)
    }

    /// Removes a previously registered handler by its token. No-op if the
    /// token is out of range (already unregistered).
    pub fn unregister(&mut self, token: usize) {
        if token < self.receivers.len() {
            self.receivers.remove(token);
        }
    }

    /// Delivers `frame` to every handler whose filter matches, in
    /// registration order. A frame with no standard 11-bit ID (extended or
    /// remote-frame placeholder types we don't expect on a CANopen bus) is
    /// silently dropped, matching `util::get_cob_id`'s extended-id handling.
    pub fn dispatch(&mut self, frame: &F) {
        let cob_id = match util::get_cob_id(frame) {
            Some(id) => id,
            None => return,
        };
        for receiver in self.receivers.iter_mut() {
            if receiver.matches(cob_id) {
                (receiver.handler)(frame);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}
