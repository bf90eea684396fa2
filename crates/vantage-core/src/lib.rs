//! # Vantage Core
//!
//! Core math and timing for the Vantage screen-coverage LOD renderer.
//!
//! - **Math**: bounding boxes, NDC projection and screen extents
//! - **Time**: frame clock and stopwatch for the frame-synchronous loop

pub mod math;
pub mod time;

pub use math::{Aabb, BoundingBox, ScreenExtent, project_to_ndc};
pub use time::{DeltaTime, FrameClock, Stopwatch};
