//! Render orchestration for remote content embedding.
//!
//! Ties the fetch collaborator and the rewrite engine together into a single
//! call per embedding point (see [`render::Renderer`]).

pub mod render;

pub use render::{RenderOutcome, RenderSettings, Renderer, RequestContext};
