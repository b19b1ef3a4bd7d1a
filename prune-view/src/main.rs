//! Application entry point for the prunable 3D tree viewer.
//!
//! This binary sets up logging and eframe/egui, reads an optional initial
//! state from the command line, and delegates all interactive logic and
//! rendering to [`Viewer`] from the `viewer` module.

mod camera;
mod render;
mod viewer;

use prune_core::codec::{self, TreeState};
use viewer::Viewer;

/// Reads the initial tree state from the first CLI argument.
///
/// Accepts either a bare compact state (`"42_p7,9"`) or a query string
/// carrying it (`"?state=42_p7%2C9"`). Without an argument the fallback
/// state is used.
fn initial_state(arg: Option<&str>) -> TreeState {
    match arg {
        Some(a) if a.contains("state=") => codec::state_from_query(a),
        Some(a) => codec::decode(a),
        None => TreeState::fallback(),
    }
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    env_logger::init();

    let arg = std::env::args().nth(1);
    let initial = initial_state(arg.as_deref());
    log::info!(
        "starting with seed {} and {} pruned ids",
        initial.seed,
        initial.pruned.len()
    );

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Prunable Tree",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new(initial)))),
    )
}
