// Bundled adapters.

pub mod memory;
