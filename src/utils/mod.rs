//! Common utilities shared by the tests and the experiment runner.
//!
//! - **`problems`**: Constructs synthetic staggered operators whose low-mode
//!   structure is known analytically, the matching eigenpacks, reproducible
//!   random sources, and a dense direct solver usable wherever the generic
//!   solve abstraction is expected.

pub mod problems;
