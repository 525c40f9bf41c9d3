//! The two dispatch stages.
//!
//! Every message goes through [`DataDispatchStage`] first. Only after its
//! [`CompletionSignal`] resolves successfully is the message handed to
//! [`UiDispatchRouter`].

pub mod data;
pub mod router;

pub use data::{CompletionSignal, DataDispatchStage};
pub use router::UiDispatchRouter;
