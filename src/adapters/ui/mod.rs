//! Console adapters: banner, prompts, progress reporting.

pub mod banner;
pub mod console;
pub mod progress;

pub use progress::{ConsoleProgress, NullProgress};

/// Prints the welcome banner. Call once at startup, after tracing init.
pub fn init_ui() {
    banner::print_welcome();
}
