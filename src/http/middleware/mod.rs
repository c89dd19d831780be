//! Built-in interceptors.
//!
//! Opt-in; a router carries none unless registered with `use_interceptor`
//! or `with`. Recommended order, outermost first:
//! `request_id`, `trace`, `recover`.

pub mod recover;
pub mod request_id;
pub mod trace;

pub use recover::recover;
pub use request_id::request_id;
pub use trace::trace;
