// Command line definitions.
pub mod cmd_enums;
