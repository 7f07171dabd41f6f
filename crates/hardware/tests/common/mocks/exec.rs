use std::cell::Cell;
use std::rc::Rc;

use mockall::mock;
use pipecore::common::constants::{CC_C, CC_N, CC_Z};
use pipecore::core::units::{ExecRequest, ExecStatus, ExecUnit};

use crate::common::builder::instruction::alu;

/// Computes `(result, flags)` or `None` for a faulting operation.
pub type Compute = fn(u8, u32, u32) -> Option<(u32, u8)>;

mock! {
    pub Exec {}
    impl ExecUnit for Exec {
        fn status(&self) -> ExecStatus;
        fn clock(&mut self, req: &ExecRequest);
    }
}

/// Non-pipelined execution unit with a fixed latency.
#[derive(Debug)]
pub struct LatencyUnit {
    latency: u32,
    compute: Compute,
    current: Option<(u32, ExecStatus)>,
    status: ExecStatus,
    starts: Rc<Cell<u32>>,
}

impl LatencyUnit {
    pub fn new(latency: u32, compute: Compute) -> Self {
        Self {
            latency: latency.max(1),
            compute,
            current: None,
            status: ExecStatus::default(),
            starts: Rc::new(Cell::new(0)),
        }
    }

    pub fn alu(latency: u32) -> Self {
        Self::new(latency, alu_op)
    }

    pub fn divide(latency: u32) -> Self {
        Self::new(latency, div_op)
    }

    pub fn fpu(latency: u32) -> Self {
        Self::new(latency, fpu_op)
    }

    /// Counter of accepted start pulses.
    pub fn starts(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.starts)
    }
}

impl ExecUnit for LatencyUnit {
    fn status(&self) -> ExecStatus {
        self.status
    }

    fn clock(&mut self, req: &ExecRequest) {
        self.status = ExecStatus::default();
        if req.start {
            self.starts.set(self.starts.get() + 1);
            let out = match (self.compute)(req.opcode, req.a, req.b) {
                Some((result, flags)) => ExecStatus {
                    valid: true,
                    result,
                    flags,
                    ..ExecStatus::default()
                },
                None => ExecStatus {
                    valid: true,
                    error: true,
                    ..ExecStatus::default()
                },
            };
            self.current = Some((self.latency, out));
        }
        if let Some((remaining, out)) = self.current.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.status = *out;
                self.current = None;
            }
        }
        self.status.busy = self.current.is_some();
    }
}

fn flags_of(result: u32, carry: bool) -> u8 {
    let mut f = 0;
    if result == 0 {
        f |= CC_Z;
    }
    if result & 0x8000_0000 != 0 {
        f |= CC_N;
    }
    if carry {
        f |= CC_C;
    }
    f as u8
}

fn alu_op(opcode: u8, a: u32, b: u32) -> Option<(u32, u8)> {
    match opcode {
        alu::ADD => {
            let (r, carry) = a.overflowing_add(b);
            Some((r, flags_of(r, carry)))
        }
        alu::MOV => Some((b, flags_of(b, false))),
        _ => None,
    }
}

fn div_op(_opcode: u8, a: u32, b: u32) -> Option<(u32, u8)> {
    let r = a.checked_div(b)?;
    Some((r, flags_of(r, false)))
}

fn fpu_op(_opcode: u8, a: u32, b: u32) -> Option<(u32, u8)> {
    let r = f32::from_bits(a) + f32::from_bits(b);
    if r.is_nan() {
        None
    } else {
        Some((r.to_bits(), 0))
    }
}
