//! Plain-text persistence of models and encoder tables.

pub mod text;

pub use text::{
    load_branching, load_cohesion, load_encoder, save_branching, save_cohesion, save_encoder,
};
