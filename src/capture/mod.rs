pub mod session;
pub mod tshark;

pub use session::{CaptureSession, CaptureStats, SessionState, ShutdownHandle};
pub use tshark::{InterfaceEntry, Tshark};
