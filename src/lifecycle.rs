use crate::capture::ShutdownHandle;
use crate::error::Result;
use log::info;

/// Routes SIGINT and SIGTERM to `handle`. Every signal triggers the same
/// shutdown, so repeated Ctrl+C presses are harmless.
pub fn install_signal_handler(handle: ShutdownHandle) -> Result<()> {
    ctrlc::set_handler(move || on_stop_request(&handle))?;
    Ok(())
}

fn on_stop_request(handle: &ShutdownHandle) {
    if handle.is_requested() {
        info!("shutdown already in progress");
    } else {
        eprintln!("\n[!] Stopping listener...");
    }
    handle.shutdown();
}
