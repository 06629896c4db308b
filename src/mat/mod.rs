//! Matrix views and the owning matrix container.
//!
//! [`MatRef`] and [`MatMut`] are non-owning handles over strided memory. All of
//! their algebra (sub-viewing, transposition, conjugation, structure
//! restriction) is O(1) and only reinterprets the storage descriptor. [`Mat`]
//! owns an aligned column-major buffer and exposes exactly one root view over
//! it.

mod matmut;
mod matown;
mod matref;

pub use matmut::MatMut;
pub use matown::Mat;
pub use matref::MatRef;
