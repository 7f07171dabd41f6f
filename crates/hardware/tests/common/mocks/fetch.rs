use pipecore::core::units::{FetchRequest, FetchStatus, FetchUnit};

use super::bus::SharedBus;

/// Single-word fetch unit: presents the next word one cycle after a redirect and
/// immediately after a word is accepted, unless the bus is locked.
#[derive(Debug)]
pub struct MockFetch {
    bus: SharedBus,
    pc: u32,
    status: FetchStatus,
}

impl MockFetch {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            bus,
            pc: 0,
            status: FetchStatus::default(),
        }
    }

    fn fill(&mut self) {
        let mut bus = self.bus.borrow_mut();
        let cycle = bus.cycle;
        bus.fetches.push(cycle);
        self.status = match bus.read(self.pc) {
            Some(insn) => FetchStatus {
                valid: true,
                insn,
                pc: self.pc,
                illegal: false,
            },
            None => FetchStatus {
                valid: true,
                insn: 0,
                pc: self.pc,
                illegal: true,
            },
        };
    }
}

impl FetchUnit for MockFetch {
    fn status(&self) -> FetchStatus {
        self.status
    }

    fn clock(&mut self, req: &FetchRequest) {
        if req.clear_cache {
            self.bus.borrow_mut().cache_clears += 1;
        }
        if let Some(target) = req.redirect {
            self.pc = target;
            self.status = FetchStatus::default();
            return;
        }
        if req.accept && self.status.valid {
            self.pc = self.pc.wrapping_add(4);
            self.status = FetchStatus::default();
        }
        if !self.status.valid && !req.bus_lock {
            self.fill();
        }
    }
}
