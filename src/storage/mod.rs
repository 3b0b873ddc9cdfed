//! File system storage management
//!
//! Path resolution across the configured roots, containment checks, collision-safe
//! naming and the filesystem primitives the gateway operations are built from.

pub mod filesystem;
pub mod media;
pub mod naming;
pub mod resolver;
pub mod results;
pub mod validation;

// Re-export commonly used items
pub use media::AssetKind;
pub use naming::uniquify;
pub use resolver::{CacheLocation, SaveDestination, resolve_for_fetch, reverse_resolve};
pub use results::{ResolvedAsset, SaveTarget};
pub use validation::{Containment, GuardPolicy, is_allowed};
