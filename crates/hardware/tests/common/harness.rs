use pipecore::common::constants::DEFAULT_RESET_ADDRESS;
use pipecore::common::error::CoreError;
use pipecore::common::reg::RegId;
use pipecore::config::Config;
use pipecore::core::arch::mode::Mode;
use pipecore::core::control::debug::DebugCommand;
use pipecore::core::units::{ExecUnit, Units};
use pipecore::{Core, CoreInputs, CoreOutputs};

use crate::common::mocks::bus::{Bus, SharedBus};
use crate::common::mocks::decoder::ToyDecoder;
use crate::common::mocks::exec::LatencyUnit;
use crate::common::mocks::fetch::MockFetch;
use crate::common::mocks::memory::MockMemory;

/// Supervisor reset vector and start of RAM.
pub const RESET: u32 = DEFAULT_RESET_ADDRESS;
/// Where user programs are placed.
pub const USER_BASE: u32 = RESET + 0x400;
/// Start of the data area.
pub const DATA_BASE: u32 = RESET + 0x800;
/// RAM size in words.
pub const RAM_WORDS: usize = 1024;

/// Fluent construction of a [`TestContext`].
pub struct ContextBuilder {
    config: Config,
    segments: Vec<(u32, Vec<u32>)>,
    alu_latency: u32,
    memory_latency: u32,
    divide: Option<Box<dyn ExecUnit>>,
    fpu: Option<Box<dyn ExecUnit>>,
    default_units: bool,
}

impl ContextBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Places `words` at `addr`.
    pub fn at(mut self, addr: u32, words: &[u32]) -> Self {
        self.segments.push((addr, words.to_vec()));
        self
    }

    /// Places `words` at the reset vector.
    pub fn program(self, words: &[u32]) -> Self {
        self.at(RESET, words)
    }

    pub fn alu_latency(mut self, cycles: u32) -> Self {
        self.alu_latency = cycles;
        self
    }

    pub fn memory_latency(mut self, cycles: u32) -> Self {
        self.memory_latency = cycles;
        self
    }

    pub fn divide_unit(mut self, unit: Box<dyn ExecUnit>) -> Self {
        self.divide = Some(unit);
        self
    }

    pub fn fpu_unit(mut self, unit: Box<dyn ExecUnit>) -> Self {
        self.fpu = Some(unit);
        self
    }

    /// Supply only the units given explicitly, even if the configuration enables more.
    pub fn explicit_units(mut self) -> Self {
        self.default_units = false;
        self
    }

    pub fn try_build(mut self) -> Result<TestContext, CoreError> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let bus = Bus::shared(RESET, RAM_WORDS);
        for (addr, words) in &self.segments {
            bus.borrow_mut().load(*addr, words);
        }

        let features = self.config.features;
        if self.default_units {
            if features.divide && self.divide.is_none() {
                self.divide = Some(Box::new(LatencyUnit::divide(4)));
            }
            if features.fpu && self.fpu.is_none() {
                self.fpu = Some(Box::new(LatencyUnit::fpu(3)));
            }
        }

        let units = Units {
            decoder: Box::new(ToyDecoder),
            fetch: Box::new(MockFetch::new(bus.clone())),
            alu: Box::new(LatencyUnit::alu(self.alu_latency)),
            memory: Box::new(MockMemory::new(
                bus.clone(),
                self.memory_latency,
                features.pipelined_memory,
            )),
            divide: self.divide,
            fpu: self.fpu,
        };
        let core = Core::new(self.config, units)?;
        Ok(TestContext {
            core,
            bus,
            outputs: Vec::new(),
            modes: Vec::new(),
        })
    }

    pub fn build(self) -> TestContext {
        self.try_build().expect("core construction failed")
    }
}

/// A core wired to mock units, with a record of every cycle's outputs.
pub struct TestContext {
    pub core: Core,
    pub bus: SharedBus,
    /// Outputs of every tick so far.
    pub outputs: Vec<CoreOutputs>,
    /// Mode after every tick so far.
    pub modes: Vec<Mode>,
}

impl TestContext {
    pub fn builder() -> ContextBuilder {
        ContextBuilder {
            config: Config::default(),
            segments: Vec::new(),
            alu_latency: 1,
            memory_latency: 2,
            divide: None,
            fpu: None,
            default_units: true,
        }
    }

    /// Default configuration with `program` at the reset vector.
    pub fn new(program: &[u32]) -> Self {
        Self::builder().program(program).build()
    }

    pub fn try_tick(&mut self, inputs: CoreInputs) -> Result<CoreOutputs, CoreError> {
        self.bus.borrow_mut().cycle = self.outputs.len() as u64;
        let out = self.core.tick(&inputs)?;
        self.outputs.push(out);
        self.modes.push(self.core.mode());
        Ok(out)
    }

    pub fn tick_with(&mut self, inputs: CoreInputs) -> CoreOutputs {
        self.try_tick(inputs).expect("tick failed")
    }

    pub fn tick(&mut self) -> CoreOutputs {
        self.tick_with(CoreInputs::default())
    }

    pub fn run(&mut self, cycles: usize) {
        for _ in 0..cycles {
            let _ = self.tick();
        }
    }

    /// Ticks with `inputs` until `done` holds, returning the number of cycles taken.
    pub fn run_until(
        &mut self,
        max: usize,
        inputs: CoreInputs,
        mut done: impl FnMut(&Core, &CoreOutputs) -> bool,
    ) -> Option<usize> {
        for n in 1..=max {
            let out = self.tick_with(inputs);
            if done(&self.core, &out) {
                return Some(n);
            }
        }
        None
    }

    /// Runs until the core reports itself halted (break, supervisor fault).
    pub fn run_to_halt(&mut self, max: usize) -> usize {
        self.run_until(max, CoreInputs::default(), |_, out| out.halted)
            .unwrap_or_else(|| panic!("core did not halt within {max} cycles"))
    }

    /// Asserts the debug halt until the core is fully halted.
    pub fn halt(&mut self) {
        let halt = CoreInputs {
            halt: true,
            ..CoreInputs::default()
        };
        let _ = self
            .run_until(200, halt, |_, out| out.halted)
            .expect("core did not halt");
    }

    /// Halts and writes a register through the debug port.
    pub fn poke(&mut self, reg: RegId, value: u32) {
        self.halt();
        let _ = self.tick_with(CoreInputs {
            halt: true,
            debug: Some(DebugCommand::Write(reg, value)),
            ..CoreInputs::default()
        });
    }

    /// Reads a register through the debug port while halted.
    pub fn peek(&mut self, reg: RegId) -> u32 {
        let out = self.tick_with(CoreInputs {
            halt: true,
            debug: Some(DebugCommand::Read(reg)),
            ..CoreInputs::default()
        });
        out.debug.expect("no debug response").value
    }

    /// Register `n` of `mode` from the architectural state.
    pub fn reg(&self, mode: Mode, n: u8) -> u32 {
        self.core.state().read(RegId::of(mode, n))
    }

    pub fn mem(&self, addr: u32) -> u32 {
        self.bus.borrow().read(addr).expect("address outside RAM")
    }

    /// Number of recorded cycles that reported a pipeline clear.
    pub fn clears(&self) -> usize {
        self.outputs.iter().filter(|o| o.cleared).count()
    }
}
