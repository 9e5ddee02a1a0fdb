// Herald - buffered in-process publish/subscribe for Rust
//
// This library re-exports the Herald crates behind a single facade so
// applications depend on one crate.

// Re-export publish/subscribe functionality
pub use herald_pubsub::*;

// Re-export the crate itself for fully qualified paths
pub use herald_pubsub as pubsub;
