// All core functionality is in commentlens-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod font_locator;

// Re-export core types for convenience
pub use commentlens_core::*;

// Re-export CLI utilities
pub use font_locator::FontLocator;
