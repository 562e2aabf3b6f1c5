//! Session domain.
//!
//! - [`entities::Session`]: the brainstorming session record and its status
//! - [`transcript::Message`]: a scored agent utterance
//! - [`transcript::NotepadSnapshot`]: one write to the shared notepad
//! - [`stream::StreamEvent`]: fragments of a streaming model response

pub mod entities;
pub mod stream;
pub mod transcript;
