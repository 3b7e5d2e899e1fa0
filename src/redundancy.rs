//! Bus redundancy manager: an optional bus-A/bus-B toggle that switches the
//! active CAN bus after too many consecutive missed heartbeats on it.
//! Shares the "track consecutive misses, then act" shape `nmt::HeartbeatConsumer`
//! uses for heartbeat monitoring, applied at bus granularity instead of per
//! remote node.

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Bus {
    A,
    B,
}

impl Bus {
    fn other(self) -> Bus {
        match self {
            Bus::A => Bus::B,
            Bus::B => Bus::A,
        }
    }
}

/// Switches `active()` from one bus to the other once `threshold`
/// consecutive heartbeats have been missed on the current one. A single
/// frame of any kind resets the miss counter, since CANopen only reasons
/// about bus health via the heartbeat/node-guard cadence.
pub struct RedundancyManager {
    active: Bus,
    threshold: u32,
    consecutive_misses: u32,
    switch_count: u32,
}

impl RedundancyManager {
    pub fn new(threshold: u32) -> Self {
        Self {
            active: Bus::A,
            threshold,
            consecutive_misses: 0,
            switch_count: 0,
        }
    }

    pub fn active(&self) -> Bus {
        self.active
    }

    pub fn switch_count(&self) -> u32 {
        self.switch_count
    }

    /// Call when any frame arrives on the active bus.
    pub fn on_frame_received(&mut self) {
        self.consecutive_misses = 0;
    }

    /// Call once per expected heartbeat interval that produced no frame.
    /// Returns `true` if this call caused a bus switch.
    pub fn on_heartbeat_missed(&mut self) -> bool {
        self.consecutive_misses += 1;
        if self.threshold > 0 && self.consecutive_misses >= self.threshold {
            self.active = self.active.other();
            self.consecutive_misses = 0;
            self.switch_count += 1;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_on_active_bus_below_threshold() {
        let mut mgr = RedundancyManager::new(3);
        assert!(!mgr.on_heartbeat_missed());
        assert!(!mgr.on_heartbeat_missed());
        assert_eq!(mgr.active(), Bus::A);
    }

    #[test]
    fn switches_bus_after_threshold_misses() {
        let mut mgr = RedundancyManager::new(3);
        mgr.on_heartbeat_missed();
        mgr.on_heartbeat_missed();
        assert!(mgr.on_heartbeat_missed());
        assert_eq!(mgr.active(), Bus::B);
        assert_eq!(mgr.switch_count(), 1);
    }

    #[test]
    fn a_received_frame_resets_the_miss_counter() {
        let mut mgr = RedundancyManager::new(3);
        mgr.on_heartbeat_missed();
        mgr.on_heartbeat_missed();
        mgr.on_frame_received();
        assert!(!mgr.on_heartbeat_missed());
        assert_eq!(mgr.active(), Bus::A);
    }

    #[test]
    fn zero_threshold_disables_switching() {
        let mut mgr = RedundancyManager::new(0);
        for _ in 0..10 {
            assert!(!mgr.on_heartbeat_missed());
        }
        assert_eq!(mgr.active(), Bus::A);
    }
}
