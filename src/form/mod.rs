//! The schema-driven input form: default values, validation, field rendering
//! and the array editing surface.

pub mod fields;
pub mod initial;
pub mod state;
pub mod validation;

pub use fields::{Field, InputKind, ListItem, render_form};
pub use initial::initial_value;
pub use state::{ArrayAction, FormState};
pub use validation::{FormErrors, Validator, build_validator};
