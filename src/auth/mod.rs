//! Session persistence and the sign-in / sign-up flow.

pub mod flow;
pub mod session;
