//! Shadow copy of the chip's register space.

use sgu_common::REGISTER_POOL_SIZE;

/// Byte image of every channel register, updated on each write.
#[derive(Debug, Clone)]
pub struct RegisterPool {
    regs: [u8; REGISTER_POOL_SIZE],
}

impl Default for RegisterPool {
    fn default() -> Self {
        Self {
            regs: [0; REGISTER_POOL_SIZE],
        }
    }
}

impl RegisterPool {
    /// Record a write. Addresses past the pool are ignored.
    #[inline]
    pub fn store(&mut self, addr: u16, value: u8) {
        if let Some(slot) = self.regs.get_mut(addr as usize) {
            *slot = value;
        }
    }

    /// Read back a register.
    pub fn get(&self, addr: u16) -> Option<u8> {
        self.regs.get(addr as usize).copied()
    }

    /// The whole pool.
    pub fn as_slice(&self) -> &[u8] {
        &self.regs
    }

    /// Pool size in bytes.
    pub fn len(&self) -> usize {
        REGISTER_POOL_SIZE
    }

    /// Always false; the pool has a fixed size.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Zero every register.
    pub fn clear(&mut self) {
        self.regs.fill(0);
    }
}
