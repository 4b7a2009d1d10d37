//! mannequin
//!
//! An articulated humanoid figure rendered with wgpu. A small scene graph
//! composes per-part translate/rotate/scale matrices through a parent chain,
//! a fly camera moves around the figure, and the window loop drives pose
//! updates that can be paused and resumed at runtime.
//!
//! High-level modules
//! - `app`: window creation, event loop and the per-frame driver
//! - `camera`: camera types, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipeline
//! - `data_structures`: scene graph, meshes, instances and textures
//! - `figure`: figure assembly, pose state and drawing
//! - `pipelines`: the figure render pipeline and its shader
//! - `resources`: helpers to load obj models and create GPU resources

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod figure;
pub mod pipelines;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
