//! Shared context passed to modules

use crate::domain::BlockTag;

/// Shared context available to all modules
#[derive(Debug, Default)]
pub struct Context {
    /// Block tag applied to reads
    pub block: BlockTag,

    /// Checksummed address of the session signer
    pub account: Option<String>,

    /// Whether a signer is available for writes
    pub can_sign: bool,

    /// Latest known chain head
    pub head: Option<u64>,

    /// Tick counter, drives the loading spinner
    pub tick: u64,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame of the loading spinner
    pub fn spinner(&self) -> char {
        const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
        FRAMES[(self.tick % FRAMES.len() as u64) as usize]
    }
}
