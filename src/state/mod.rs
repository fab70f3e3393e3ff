/// State management module
///
/// This module handles all capture state, including:
/// - Shared data structures (data.rs)
/// - Startup permission and location requests (gate.rs)
/// - The persisted entry list (store.rs)
/// - The capture workflow (capture.rs)

pub mod capture;
pub mod data;
pub mod gate;
pub mod store;
