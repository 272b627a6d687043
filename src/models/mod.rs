//! Domain model for the person registry.
//!
//! - [`PersonFields`]: the editable values and their constraints.
//! - [`Person`]: a committed record; identity is its [`PersonId`] alone.
//! - [`PersonRecord`]: a write input, either `Unsaved` or `Saved`.
//! - [`PersonPayload`]: the JSON body accepted by the write endpoints.

mod person;

pub use person::*;
