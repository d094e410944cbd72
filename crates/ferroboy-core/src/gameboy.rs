use crate::{cartridge::Cartridge, cpu::Cpu, mmu::Mmu};

/// High-level facade wiring the CPU and MMU into a single machine.
pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
}

impl GameBoy {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            mmu: Mmu::new(),
        }
    }

    pub fn load_cart(&mut self, cart: Cartridge) {
        self.mmu.load_cart(cart);
    }

    /// Execute one CPU step and return the T-cycles consumed. Hosts use
    /// the count to run external subsystems (PPU, APU) in lockstep.
    pub fn step(&mut self) -> u32 {
        self.cpu.step(&mut self.mmu)
    }

    /// Drain the serial output captured since the last call.
    pub fn take_serial(&mut self) -> Vec<u8> {
        self.mmu.take_serial()
    }

    /// Reset to the post-boot state while preserving the loaded cartridge.
    pub fn reset(&mut self) {
        let cart = self.mmu.cart.take();
        self.cpu = Cpu::new();
        self.mmu = Mmu::new();
        self.mmu.cart = cart;
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}
