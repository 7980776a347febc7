//! Board engine for the moodboard canvas.
//!
//! This crate is the synchronous core of an open board: the item store, the
//! pan/zoom camera, hit-testing, the gesture state machine, per-variant item
//! behavior, and the debounced dirty tracking that decides when local edits
//! are written back. It performs no I/O and reads no clock; the host feeds it
//! input events and millisecond timestamps and acts on the returned
//! [`engine::Action`]s and [`engine::PendingWrites`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Interaction controller, [`engine::EngineCore`] |
//! | [`doc`] | Board item types, wire normalization, and the item store |
//! | [`variant`] | Per-kind decode, view model, and edit handlers |
//! | [`dirty`] | Geometry and content dirty tracking with debounce deadlines |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing items, move bars, and resize handles |
//! | [`consts`] | Shared numeric constants (zoom limits, minimum sizes, debounce windows) |

pub mod camera;
pub mod consts;
pub mod dirty;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod variant;
