//! Typed wrappers over the remote objects twibd and its devices expose.

pub mod debugger;
pub mod device;
pub mod meta;
