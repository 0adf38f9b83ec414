//! Processing element.

use serde::Serialize;

/// One CPU core of a host.
#[derive(Serialize, Clone, Debug)]
pub struct ProcessingElement {
    pub id: u32,
    /// Capacity in millions of instructions per second.
    pub mips: f64,
    /// VM which currently holds this PE.
    pub owner: Option<u32>,
}

impl ProcessingElement {
    pub fn new(id: u32, mips: f64) -> Self {
        Self { id, mips, owner: None }
    }

    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    /// Whether the PE is free and fast enough for a VM requesting `mips` per PE.
    pub fn fits(&self, mips: f64) -> bool {
        self.is_free() && self.mips >= mips
    }
}
