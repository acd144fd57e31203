//! Connection and association state tracked across commands and events.

use crate::classify::Outcome;

/// Connection id value meaning "no connection".
pub const INVALID_CID: u8 = 0xFF;

/// Association flag, reset flag and the most recent TCP and UDP connection
/// ids.
///
/// Connection ids are the raw ASCII characters the module uses (`'0'`..`'f'`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    associated: bool,
    reset_detected: bool,
    tcp_cid: u8,
    udp_cid: u8,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub const fn new() -> Self {
        Self {
            associated: false,
            reset_detected: false,
            tcp_cid: INVALID_CID,
            udp_cid: INVALID_CID,
        }
    }

    pub fn is_associated(&self) -> bool {
        self.associated
    }

    pub fn set_associated(&mut self) {
        self.associated = true;
    }

    pub fn clear_associated(&mut self) {
        self.associated = false;
    }

    pub fn is_reset_detected(&self) -> bool {
        self.reset_detected
    }

    pub fn set_reset_detected(&mut self) {
        self.reset_detected = true;
    }

    pub fn clear_reset_detected(&mut self) {
        self.reset_detected = false;
    }

    pub fn tcp_cid(&self) -> Option<u8> {
        valid(self.tcp_cid)
    }

    pub fn udp_cid(&self) -> Option<u8> {
        valid(self.udp_cid)
    }

    /// Store the TCP connection id. Saving [`INVALID_CID`] clears the slot.
    pub fn save_tcp_cid(&mut self, cid: u8) {
        self.tcp_cid = cid;
    }

    /// Store the UDP connection id. Saving [`INVALID_CID`] clears the slot.
    pub fn save_udp_cid(&mut self, cid: u8) {
        self.udp_cid = cid;
    }

    pub fn clear_tcp_cid(&mut self) {
        self.tcp_cid = INVALID_CID;
    }

    pub fn clear_udp_cid(&mut self) {
        self.udp_cid = INVALID_CID;
    }

    pub fn clear_all_cids(&mut self) {
        self.clear_tcp_cid();
        self.clear_udp_cid();
    }

    /// Forget a single connection id, whichever slot holds it.
    pub fn forget_cid(&mut self, cid: u8) {
        if self.tcp_cid == cid {
            self.clear_tcp_cid();
        }
        if self.udp_cid == cid {
            self.clear_udp_cid();
        }
    }

    /// Apply the state change implied by a classified outcome.
    pub fn observe(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::DisassociationEvent => {
                debug!("Disassociated from network");
                self.clear_associated();
                self.clear_all_cids();
            }
            Outcome::AppReset | Outcome::UnexpectedWarmBoot | Outcome::WelcomeMessage => {
                warn!("Module reset detected: {:?}", outcome);
                self.clear_associated();
                self.set_reset_detected();
                self.clear_all_cids();
            }
            Outcome::Disconnect | Outcome::ErrorSocketFail => {
                debug!("Connections dropped: {:?}", outcome);
                self.clear_all_cids();
            }
            _ => {}
        }
    }
}

fn valid(cid: u8) -> Option<u8> {
    (cid != INVALID_CID).then_some(cid)
}
