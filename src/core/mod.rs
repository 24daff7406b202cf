// This file is the module declaration file for the `core` module.
//
// `config` module:
// The `SweepConfig` data structures, the `ConfigProvider` trait, and the
// `ConfigManager` that loads, saves and validates `.treesweep.toml`.
pub mod config;

// `engine` module:
// `SweepEngine`, the single entry point exposing every find, match, delete
// and rewrite operation.
pub mod engine;
