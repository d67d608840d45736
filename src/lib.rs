// Library surface for the binary, headless tests and reuse.
// Terminal rendering stays in the binary (src/ui.rs).
pub mod app_dirs;
pub mod audio;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod game;
pub mod logging;
pub mod presentation;
pub mod records;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod store;
pub mod time_series;
pub mod timer;
pub mod util;
