// src/model/mod.rs
//! Typed QuakeML views over the parsed tree.

mod creation_info;
mod description;
mod event;
mod event_parameters;
mod magnitude;
mod origin;

pub use creation_info::CreationInfo;
pub use description::Description;
pub use event::Event;
pub use event_parameters::EventParameters;
pub use magnitude::Magnitude;
pub use origin::Origin;
