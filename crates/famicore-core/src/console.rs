//! Console: the bus scheduler tying CPU, PPU and DMA together.
//!
//! One [`Console::step`] is one CPU instruction's worth of progress (or
//! one whole OAM DMA stall block). The model is "execute, then catch up
//! the PPU": the instruction's memory accesses happen first, then the PPU
//! ticks three dots per consumed CPU cycle, then the NMI line is sampled
//! and a rising edge is latched into the CPU for service at the next
//! instruction boundary.

use famicore_cpu::{Cpu, CpuBus, OPCODE_TABLE};
use famicore_ppu::FRAME_SIZE;

use crate::bus::NesBus;
use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::trace::{ExecutionLog, TraceEntry};
use crate::CoreError;

/// CPU register snapshot (inspection hook).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSnapshot {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer.
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Status byte.
    pub status: u8,
    /// CPU-local cycle counter.
    pub cycles: u64,
}

/// PPU position snapshot (inspection hook).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpuSnapshot {
    /// Current scanline (0-261).
    pub scanline: u16,
    /// Current dot (0-340).
    pub dot: u16,
    /// Completed-frame counter.
    pub frame: u64,
    /// Total dots ticked since reset.
    pub dots: u64,
}

/// NES console core: CPU + PPU + bus/scheduler.
pub struct Console {
    cpu: Cpu,
    bus: NesBus,
    log: ExecutionLog,
    /// NMI line level at the last sample point.
    nmi_line: bool,
}

impl Console {
    /// Create a console with nothing attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: NesBus::new(),
            log: ExecutionLog::new(),
            nmi_line: false,
        }
    }

    /// Attach a cartridge.
    pub fn load_cartridge(&mut self, cartridge: Box<dyn Cartridge>) {
        self.bus.set_cartridge(cartridge);
    }

    /// Attach the port-1 controller.
    pub fn set_controller1(&mut self, controller: Box<dyn Controller>) {
        self.bus.set_controller1(controller);
    }

    /// Attach the port-2 controller.
    pub fn set_controller2(&mut self, controller: Box<dyn Controller>) {
        self.bus.set_controller2(controller);
    }

    /// Warm reset.
    ///
    /// Loads the CPU PC from $FFFC/$FFFD through the memory map, zeroes
    /// the cycle and frame counters, deactivates DMA. RAM and OAM keep
    /// their contents. Takes no observable cycles.
    ///
    /// # Errors
    ///
    /// [`CoreError::CartridgeMissing`] when no cartridge is attached (the
    /// reset vector would float).
    pub fn reset(&mut self) -> Result<(), CoreError> {
        if !self.bus.has_cartridge() {
            return Err(CoreError::CartridgeMissing);
        }
        self.bus.reset();
        self.bus.ppu.reset();
        self.cpu.reset(&mut self.bus);
        self.nmi_line = false;
        self.log.clear();
        Ok(())
    }

    /// One CPU instruction's worth of progress, or one DMA stall block.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cpu`] when the CPU traps on a halt opcode.
    pub fn step(&mut self) -> Result<(), CoreError> {
        // A latched DMA consumes its whole stall before the CPU runs
        // again; the PPU keeps ticking 3:1 throughout.
        if let Some(dma) = self.bus.take_dma() {
            let stall = 513 + u64::from(dma.penalty);
            let base = u16::from(dma.page) << 8;
            for offset in 0..=255u16 {
                let value = self.bus.dma_read(base | offset);
                self.bus.ppu.write_oam_dma(value);
            }
            self.bus.add_cycles(stall);
            self.bus.tick_ppu(stall);
            self.poll_nmi();
            return Ok(());
        }

        let pre = self.log.is_enabled().then(|| {
            let opcode = self.bus.peek(self.cpu.pc);
            (self.cpu.pc, opcode, self.cpu.a, self.cpu.x, self.cpu.y, self.cpu.sp)
        });
        let pre_status = self.cpu.status.bits();

        let cycles = self.cpu.step(&mut self.bus)?;
        self.bus.add_cycles(u64::from(cycles));
        self.bus.tick_ppu(u64::from(cycles));
        self.poll_nmi();

        if let Some((pc, opcode, a, x, y, sp)) = pre {
            self.log.push(TraceEntry {
                pc,
                opcode,
                mnemonic: OPCODE_TABLE[opcode as usize].mnemonic,
                a,
                x,
                y,
                sp,
                status: pre_status,
                cpu_cycles: self.bus.cycles(),
                ppu_dots: self.bus.ppu.dots(),
            });
        }
        Ok(())
    }

    /// Step until at least `n` more CPU cycles have elapsed.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Console::step`].
    pub fn run_cycles(&mut self, n: u64) -> Result<(), CoreError> {
        let target = self.bus.cycles() + n;
        while self.bus.cycles() < target {
            self.step()?;
        }
        Ok(())
    }

    /// Step until the frame counter increments.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Console::step`].
    pub fn run_frame(&mut self) -> Result<(), CoreError> {
        let start = self.bus.ppu.frame();
        while self.bus.ppu.frame() == start {
            self.step()?;
        }
        Ok(())
    }

    /// Sample the PPU NMI line; a rising edge latches an NMI in the CPU.
    fn poll_nmi(&mut self) {
        let line = self.bus.ppu.nmi_line();
        if line && !self.nmi_line {
            self.cpu.trigger_nmi();
        }
        self.nmi_line = line;
    }

    // =========================================================================
    // Counters and inspection hooks
    // =========================================================================

    /// Authoritative CPU cycle count since reset.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.bus.cycles()
    }

    /// Completed frames since reset (increments at the pre-render to
    /// scanline-0 wrap).
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.bus.ppu.frame()
    }

    /// Whether OAM DMA is stalling the CPU.
    #[must_use]
    pub fn dma_active(&self) -> bool {
        self.bus.dma_active()
    }

    /// Framebuffer view: 256x240 packed `0xAARRGGBB`, alpha opaque.
    /// Stable between frames; copy it out to hold it across one.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        let framebuffer = self.bus.ppu.framebuffer();
        debug_assert_eq!(framebuffer.len(), FRAME_SIZE);
        framebuffer
    }

    /// CPU register snapshot.
    #[must_use]
    pub fn cpu_state(&self) -> CpuSnapshot {
        CpuSnapshot {
            a: self.cpu.a,
            x: self.cpu.x,
            y: self.cpu.y,
            sp: self.cpu.sp,
            pc: self.cpu.pc,
            status: self.cpu.status.bits(),
            cycles: self.cpu.cycles(),
        }
    }

    /// PPU position snapshot.
    #[must_use]
    pub fn ppu_state(&self) -> PpuSnapshot {
        PpuSnapshot {
            scanline: self.bus.ppu.scanline(),
            dot: self.bus.ppu.dot(),
            frame: self.bus.ppu.frame(),
            dots: self.bus.ppu.dots(),
        }
    }

    /// Toggle the execution log.
    pub fn set_trace_enabled(&mut self, enabled: bool) {
        self.log.set_enabled(enabled);
    }

    /// The execution log.
    #[must_use]
    pub fn execution_log(&self) -> &ExecutionLog {
        &self.log
    }

    /// Side-effect-free memory read (debuggers).
    #[must_use]
    pub fn peek_memory(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// The CPU (inspection).
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// The system bus (inspection).
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Mutable bus access, for tests and debug front-ends that drive the
    /// memory map directly.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
