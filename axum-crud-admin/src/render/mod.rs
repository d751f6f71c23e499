//! Rendering layer
//!
//! View-model builders for the two generated surfaces: the row listing
//! ([`list`]) and the create/edit/view form ([`form`]). Both are pure over
//! their inputs; the page layer turns them into HTML and the JSON API
//! serializes them directly.

pub mod form;
pub mod list;

pub use form::{build_form, FormMode, FormView};
pub use list::{build_table, CellView, TableView};
