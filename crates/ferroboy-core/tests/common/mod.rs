use ferroboy_core::{cartridge::Cartridge, gameboy::GameBoy};

/// Build a 32 KiB ROM with `program` placed at the post-boot entry point
/// (0x0100) and return a machine with it loaded.
pub fn boot_with(program: &[u8]) -> GameBoy {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    let mut gb = GameBoy::new();
    gb.load_cart(Cartridge::load(rom));
    gb
}

/// Step `count` instructions and return the total T-cycles consumed.
#[allow(dead_code)]
pub fn run_steps(gb: &mut GameBoy, count: usize) -> u32 {
    (0..count).map(|_| gb.step()).sum()
}
