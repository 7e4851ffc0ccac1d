pub mod hash;
pub mod record;

pub use hash::{format_hash, FormattedHash, HashMode};
pub use record::{parse_asreq_line, CaptureRecord};
