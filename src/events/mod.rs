//! # Events Module
//!
//! Event-driven progress reporting for discovery and batch runs.
//!
//! ## Design
//! The library emits events through a channel; any front end (CLI, GUI,
//! tests) can subscribe and render progress. Senders never block the
//! pipeline and never fail when nobody is listening.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Batch(BatchEvent::RecordFinished { identifier, status }) => {
//!                 println!("{identifier}: {status}");
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! runner.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
