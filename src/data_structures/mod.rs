//! Engine data structures: models, textures, transform nodes and instances.
//!
//! - `model` contains mesh and material definitions and GPU resources for 3D models
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds the per-node model-matrix payload uploaded to the GPU
//! - `scene_graph` is the hierarchical transform-node arena

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
