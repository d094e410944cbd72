use std::{fs, io, path::Path};

/// A loaded cartridge ROM image.
///
/// Only the fixed region is modeled: the CPU sees ROM[0x0000..0x8000] and
/// writes into the ROM range are dropped by the MMU. Larger images load in
/// full so a future mapper can bank the remainder, but the extra banks are
/// not addressable.
pub struct Cartridge {
    pub rom: Vec<u8>,
    pub title: String,
    pub cart_type: u8,
}

impl Cartridge {
    /// Wrap a ROM blob, parsing the header fields the core cares about.
    pub fn load(rom: Vec<u8>) -> Self {
        let title = rom
            .get(0x0134..0x0143)
            .map(|bytes| {
                String::from_utf8_lossy(bytes)
                    .trim_end_matches('\0')
                    .to_string()
            })
            .unwrap_or_default();
        let cart_type = rom.get(0x0147).copied().unwrap_or(0);

        if cart_type != 0x00 {
            core_warn!(
                target: "cartridge",
                "cartridge type {cart_type:02X} requests a mapper; only ROM is mapped"
            );
        }
        core_info!(target: "cartridge", "loaded \"{title}\" ({} bytes)", rom.len());

        Self {
            rom,
            title,
            cart_type,
        }
    }

    /// Read a ROM image from disk. I/O failures surface to the host here,
    /// before the run loop starts; the fetch path never sees them.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let rom = fs::read(path)?;
        Ok(Self::load(rom))
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.rom.get(addr as usize).copied().unwrap_or(0xFF)
    }
}
