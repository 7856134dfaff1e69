// Register application subcommands.
// Each module corresponds to a specific `setup-sccache` command-line action.

// Runs the full provisioning pipeline.
pub mod now;
// Reports the installed version and cache statistics.
pub mod stats;
