//! Shared utilities: time sources, resource tags, telemetry.

pub mod clock;
pub mod tag;
pub mod telemetry;

pub use clock::{now_ms, Clock, ManualClock, SystemClock};
pub use tag::{decode_tag, encode_tag, TAG_PREFIX};
pub use telemetry::init_tracing;
