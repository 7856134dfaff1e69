// Data structures shared across the crate.

// Error enums for every pipeline stage.
pub mod errors;
// The tool being installed and the package managers that can install it.
pub mod install_target;
// GitHub release listing payload.
pub mod release;
// Optional YAML settings file.
pub mod settings;
