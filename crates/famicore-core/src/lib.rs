//! famicore-core: the NES emulation core.
//!
//! Integrates the cycle-accurate 6502 ([`famicore_cpu`]) and the
//! dot-accurate 2C02 ([`famicore_ppu`]) behind one bus/scheduler:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                       Console                         │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │                     NesBus                      │  │
//! │  │  ┌─────┐ ┌─────┐ ┌──────┐ ┌─────────┐ ┌──────┐  │  │
//! │  │  │ RAM │ │ PPU │ │ APU  │ │Cartridge│ │Input │  │  │
//! │  │  │ 2KB │ │     │ │ stub │ │ (trait) │ │(trait│  │  │
//! │  │  └─────┘ └─────┘ └──────┘ └─────────┘ └──────┘  │  │
//! │  └─────────────────────────────────────────────────┘  │
//! │                          ▲                            │
//! │                     ┌────┴────┐                       │
//! │                     │  6502   │                       │
//! │                     └─────────┘                       │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! Each [`Console::step`] runs one CPU instruction (or one OAM DMA stall
//! block), then catches the PPU up by three dots per CPU cycle and
//! forwards any NMI edge to the CPU.
//!
//! # Usage
//!
//! ```
//! use famicore_core::{Console, Mirroring, Nrom};
//!
//! // A flat 32 KB program: NOP, JMP $8000.
//! let cart = Nrom::with_program(&[0xEA, 0x4C, 0x00, 0x80], 0x8000, 0x8000);
//!
//! let mut console = Console::new();
//! console.load_cartridge(Box::new(cart));
//! console.reset().unwrap();
//!
//! console.run_frame().unwrap();
//! assert_eq!(console.frames(), 1);
//! let _pixels: &[u32] = console.framebuffer(); // 256x240, 0xAARRGGBB
//! ```

#![warn(missing_docs)]

mod apu;
mod bus;
mod cartridge;
mod console;
mod controller;
mod trace;

pub use apu::ApuStub;
pub use bus::NesBus;
pub use cartridge::{Cartridge, Mirroring, Nrom};
pub use console::{Console, CpuSnapshot, PpuSnapshot};
pub use controller::{Controller, Joypad, JoypadHandle};
pub use trace::{ExecutionLog, TraceEntry, DEFAULT_LOG_CAPACITY};

// Re-export the component crates' primary types.
pub use famicore_cpu::{Cpu, CpuBus, CpuError, Status};
pub use famicore_ppu::{palette, Ppu, PpuBus, FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH};

/// Core error type.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// `reset()` was called with no cartridge attached.
    #[error("no cartridge attached")]
    CartridgeMissing,
    /// The CPU trapped (halt opcode).
    #[error(transparent)]
    Cpu(#[from] CpuError),
}

/// NES screen dimensions.
pub mod screen {
    /// Screen width in pixels.
    pub const WIDTH: u32 = 256;
    /// Screen height in pixels.
    pub const HEIGHT: u32 = 240;
    /// Total pixels per frame.
    pub const PIXELS: u32 = WIDTH * HEIGHT;
}
