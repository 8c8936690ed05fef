//! # Events Module
//!
//! Observability side channel for hashing.
//!
//! The hashers never reach for a global logger. They are handed an
//! [`EventSink`] when they are built and emit [`Event`]s through it; the
//! authoritative outcome of every file is still its `HashResult`.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Hash(HashEvent::Failed { path, message, .. }) = event {
//!             eprintln!("{}: {}", path.display(), message);
//!         }
//!     }
//! });
//!
//! let hasher = BatchHasher::builder().events(Arc::new(sender)).build()?;
//! ```

mod sink;
mod types;

pub use sink::{
    null_sink, EventChannel, EventReceiver, EventSender, EventSink, NullSink, TracingSink,
};
pub use types::*;
