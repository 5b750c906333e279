//! # Wren — Hierarchical Scene Runtime
//!
//! A small 3D scene-graph runtime: a tree of transform-carrying nodes with
//! per-node components, application-wide systems, and a synchronous frame
//! loop that updates components, resolves world transforms lazily through
//! dirty flags, and runs systems in registration order.
//!
//! Start with `use wren::prelude::*`, build a scene through
//! [`Context::scene`](app::Context), and hand a [`Game`](app::Game) to
//! [`App::run`](app::App::run).

pub mod app;
pub mod camera;
pub mod component;
pub mod input;
pub mod math;
pub mod node;
pub mod prelude;
pub mod render;
pub mod scene;
pub mod system;
pub mod time;
pub mod transform;
