//! # Vantage Renderer
//!
//! Single-object renderer whose shading cost follows the object's projected
//! screen coverage.
//!
//! ## Frame
//! 1. Build the MVP from the fixed camera and the animated model matrix
//! 2. Project the reference mesh's bounding box and measure its NDC extent
//! 3. Compare the covered area against the threshold to pick a detail level
//! 4. Write the detail flag uniform and draw the node mapped to that level

pub mod backend;
pub mod camera;
pub mod coverage;
pub mod dispatch;
pub mod lod;
pub mod shader;

pub use backend::{BackendCommand, BufferHandle, MeshBuffers, RecordingBackend, RenderBackend};
pub use camera::{Camera, FrameTransforms, ModelAnimation};
pub use coverage::{Coverage, estimate_coverage, estimate_extent};
pub use dispatch::{DispatchStats, Dispatcher, DrawCall, DrawTarget, draw_calls};
pub use lod::{DetailLevel, DetailTable, LodConfig, LodDecision, LodSelector, select_level};
pub use shader::{FrameUniforms, TextureBinding, TextureUnit};

use std::time::Instant;

use glam::Mat4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vantage_assets::{AssetError, Scene, extract_bounding_box};
use vantage_core::math::BoundingBox;
use vantage_core::{DeltaTime, FrameClock};

/// Renderer errors
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("No view initialised; call init_view first")]
    ViewNotInitialized,

    #[error("Detail level {level} maps to missing node {node}")]
    MissingNode { level: DetailLevel, node: usize },

    #[error("No node mapped for detail level {0}")]
    UnmappedLevel(DetailLevel),

    #[error("Buffer creation failed: {0}")]
    BufferCreation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for renderer operations
pub type RendererResult<T> = Result<T, RendererError>;

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// LOD settings
    pub lod: LodConfig,
    /// Viewport width / height
    pub aspect_ratio: f32,
    /// Clear colour (RGBA)
    pub clear_color: [f64; 4],
}

impl RendererConfig {
    /// Reject values the camera and the selector cannot work with
    pub fn validate(&self) -> RendererResult<()> {
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(RendererError::InvalidConfig(format!(
                "aspect_ratio must be positive and finite, got {}",
                self.aspect_ratio
            )));
        }
        if !self.lod.threshold.is_finite() || self.lod.threshold < 0.0 {
            return Err(RendererError::InvalidConfig(format!(
                "lod.threshold must be non-negative and finite, got {}",
                self.lod.threshold
            )));
        }
        if let Some(band) = self.lod.hysteresis {
            if !band.is_finite() || band < 0.0 {
                return Err(RendererError::InvalidConfig(format!(
                    "lod.hysteresis must be non-negative and finite, got {}",
                    band
                )));
            }
        }
        Ok(())
    }

    fn clear(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            lod: LodConfig::default(),
            aspect_ratio: 640.0 / 480.0,
            clear_color: [0.6, 0.8, 1.0, 1.0],
        }
    }
}

/// Per-frame statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RendererStats {
    /// Draw calls this frame
    pub draw_calls: u32,
    /// Triangles rendered this frame
    pub triangles: u32,
    /// Bounding box corners rejected this frame
    pub rejected_corners: u8,
}

/// LOD statistics accumulated since the view was initialised
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LodStats {
    pub high_frames: u64,
    pub low_frames: u64,
    /// Frames whose level changed from the previous frame
    pub switches: u64,
    /// Frames with no projectable corner
    pub degenerate_frames: u64,
}

/// What one frame decided and drew, for overlays and telemetry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub level: DetailLevel,
    /// Covered NDC area, when measurable
    pub area: Option<f32>,
    /// True when the level was carried over from a degenerate frame
    pub fallback: bool,
    pub node: usize,
    pub draw_calls: u32,
    pub triangles: u32,
    /// Wall-clock time since the previous frame, or since the view was
    /// initialised for the first frame
    pub frame_time: DeltaTime,
}

impl FrameReport {
    /// Overlay label for the frame's level
    pub fn label(&self) -> &'static str {
        self.level.label()
    }
}

/// State tied to a live rendering context
struct ViewState {
    dispatcher: Dispatcher,
    /// `None` when the reference mesh was invalid; the object then stays at
    /// high detail
    bounds: Option<BoundingBox>,
}

/// Renderer instance
pub struct Renderer {
    config: RendererConfig,
    camera: Camera,
    animation: ModelAnimation,
    selector: LodSelector,
    clock: FrameClock,
    stats: RendererStats,
    lod_stats: LodStats,
    view: Option<ViewState>,
    last_level: Option<DetailLevel>,
    last_frame: Option<Instant>,
}

impl Renderer {
    /// Create a new renderer
    pub fn new(config: RendererConfig) -> Self {
        Self {
            camera: Camera::new(config.aspect_ratio),
            selector: LodSelector::from_config(&config.lod),
            config,
            animation: ModelAnimation::new(),
            clock: FrameClock::new(),
            stats: RendererStats::default(),
            lod_stats: LodStats::default(),
            view: None,
            last_level: None,
            last_frame: None,
        }
    }

    /// Get the renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Statistics of the last frame
    pub fn stats(&self) -> &RendererStats {
        &self.stats
    }

    /// LOD statistics since the view was initialised
    pub fn lod_stats(&self) -> &LodStats {
        &self.lod_stats
    }

    /// Number of frames rendered
    pub fn frame_number(&self) -> u64 {
        self.clock.frame_count()
    }

    /// Frame timing since the view was initialised
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// The camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Current model animation state
    pub fn animation(&self) -> &ModelAnimation {
        &self.animation
    }

    /// Level chosen by the most recent frame
    pub fn last_level(&self) -> Option<DetailLevel> {
        self.last_level
    }

    /// Whether a view is live
    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }

    /// Whether LOD switching is active for the object
    pub fn lod_enabled(&self) -> bool {
        self.view.as_ref().is_some_and(|v| v.bounds.is_some())
    }

    /// Bounding box driving LOD decisions
    pub fn bounds(&self) -> Option<&BoundingBox> {
        self.view.as_ref().and_then(|v| v.bounds.as_ref())
    }

    /// Acquire GPU resources for `scene` and extract the bounding box of its
    /// reference mesh.
    ///
    /// Configuration, topology, node and detail table errors abort
    /// initialisation and leave no view. An invalid reference mesh is still
    /// reported as an error, but the view is kept with LOD disabled so later
    /// frames draw at high detail.
    pub fn init_view<B: RenderBackend>(&mut self, scene: &Scene, backend: &mut B) -> RendererResult<()> {
        if self.view.is_some() {
            self.release_view(backend);
        }

        self.config.validate()?;
        scene.validate()?;

        let mut buffers = Vec::with_capacity(scene.meshes.len());
        for mesh in &scene.meshes {
            match backend.create_mesh_buffers(mesh) {
                Ok(created) => buffers.push(created),
                Err(err) => {
                    buffers.drain(..).for_each(|b| backend.destroy_mesh_buffers(b));
                    return Err(err);
                }
            }
        }

        let dispatcher = match Dispatcher::new(scene, self.config.lod.detail_table.clone(), &buffers) {
            Ok(dispatcher) => dispatcher,
            Err(err) => {
                buffers.into_iter().for_each(|b| backend.destroy_mesh_buffers(b));
                return Err(err);
            }
        };

        let bounds = scene
            .reference_mesh()
            .and_then(|mesh| extract_bounding_box(&mesh.name, &mesh.vertices));

        backend.assign_samplers(&TextureUnit::ALL);

        self.last_level = None;
        self.lod_stats = LodStats::default();
        self.clock.reset();
        self.last_frame = Some(Instant::now());

        match bounds {
            Ok(bounds) => {
                log::info!(
                    "View initialised: {} meshes, {} nodes, threshold {}",
                    scene.meshes.len(),
                    scene.nodes.len(),
                    self.selector.threshold()
                );
                self.view = Some(ViewState {
                    dispatcher,
                    bounds: Some(bounds),
                });
                Ok(())
            }
            Err(err) => {
                log::warn!("LOD disabled, object pinned at high detail: {}", err);
                self.view = Some(ViewState {
                    dispatcher,
                    bounds: None,
                });
                Err(err.into())
            }
        }
    }

    /// Release GPU resources, e.g. before the context is lost
    pub fn release_view<B: RenderBackend>(&mut self, backend: &mut B) {
        if let Some(view) = self.view.take() {
            for mesh in view.dispatcher.meshes() {
                backend.destroy_mesh_buffers(mesh.buffers());
            }
            log::info!("View released");
        }
    }

    /// Decide the detail level for an MVP without drawing.
    ///
    /// Uses the previous frame's level for the degenerate fallback and the
    /// hysteresis band, but changes no state.
    pub fn evaluate(&self, mvp: &Mat4) -> RendererResult<(LodDecision, Coverage)> {
        let view = self.view.as_ref().ok_or(RendererError::ViewNotInitialized)?;
        Ok(self.decide(view, mvp))
    }

    fn decide(&self, view: &ViewState, mvp: &Mat4) -> (LodDecision, Coverage) {
        match &view.bounds {
            Some(bounds) => {
                let coverage = estimate_coverage(bounds, mvp);
                (self.selector.select(coverage.extent, self.last_level), coverage)
            }
            None => (
                LodDecision::pinned(DetailLevel::High),
                Coverage {
                    extent: None,
                    rejected_corners: 0,
                },
            ),
        }
    }

    /// Render the next animation frame
    pub fn render_frame<B: RenderBackend>(&mut self, backend: &mut B) -> RendererResult<FrameReport> {
        let model = self.animation.model_matrix();
        let report = self.render_model(backend, model)?;
        self.animation.advance();
        Ok(report)
    }

    /// Render one frame with an explicit model matrix
    pub fn render_model<B: RenderBackend>(&mut self, backend: &mut B, model: Mat4) -> RendererResult<FrameReport> {
        self.render_model_at(backend, model, Instant::now())
    }

    /// Render one frame with an explicit model matrix, timed as presented at
    /// `now`.
    ///
    /// The frame's node is resolved before anything is sent to the backend,
    /// so a failed frame leaves no partial commands behind.
    pub fn render_model_at<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        model: Mat4,
        now: Instant,
    ) -> RendererResult<FrameReport> {
        let view = self.view.as_ref().ok_or(RendererError::ViewNotInitialized)?;
        let _span = tracing::trace_span!("render_frame", frame = self.clock.frame_count()).entered();

        let transforms = FrameTransforms::new(&self.camera, model);
        let (decision, coverage) = self.decide(view, &transforms.mvp);

        if coverage.rejected_corners > 0 {
            log::debug!(
                "{} bounding box corners behind the eye{}",
                coverage.rejected_corners,
                if decision.fallback { ", keeping previous level" } else { "" }
            );
        }

        let target = view.dispatcher.resolve(decision.level)?;

        backend.begin_frame(self.config.clear());
        let uniforms = FrameUniforms::new(&transforms, decision.level);
        let dispatched = view.dispatcher.submit(backend, &uniforms, target);

        let frame_time = match self.last_frame {
            Some(previous) => DeltaTime::from(now.saturating_duration_since(previous)),
            None => DeltaTime::from_secs(0.0),
        };
        self.last_frame = Some(now);
        self.clock.tick(frame_time);

        if let Some(previous) = self.last_level {
            if previous != decision.level {
                self.lod_stats.switches += 1;
                log::debug!(
                    "Frame {}: detail {} -> {} (area {:?})",
                    self.clock.frame_count(),
                    previous,
                    decision.level,
                    decision.area()
                );
            }
        }
        match decision.level {
            DetailLevel::High => self.lod_stats.high_frames += 1,
            DetailLevel::Low => self.lod_stats.low_frames += 1,
        }
        if decision.fallback {
            self.lod_stats.degenerate_frames += 1;
        }
        self.last_level = Some(decision.level);

        self.stats = RendererStats {
            draw_calls: dispatched.draw_calls,
            triangles: dispatched.triangles,
            rejected_corners: coverage.rejected_corners,
        };

        tracing::trace!(
            detail = %decision.level,
            node = dispatched.node,
            draw_calls = dispatched.draw_calls,
            "frame dispatched"
        );

        Ok(FrameReport {
            frame: self.clock.frame_count(),
            level: decision.level,
            area: decision.area(),
            fallback: decision.fallback,
            node: dispatched.node,
            draw_calls: dispatched.draw_calls,
            triangles: dispatched.triangles,
            frame_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_assets::Topology;
    use vantage_assets::primitives::tessellated_box;

    fn detail_scene() -> Scene {
        Scene::with_detail_pair(
            tessellated_box("high", 20.0, 8, Topology::IndexedList),
            tessellated_box("low", 20.0, 2, Topology::IndexedList),
        )
    }

    #[test]
    fn test_renderer_creation() {
        let renderer = Renderer::new(RendererConfig::default());
        assert_eq!(renderer.frame_number(), 0);
        assert!(!renderer.has_view());
        assert_eq!(renderer.config().lod.threshold, 0.02);
    }

    #[test]
    fn test_render_without_view() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        assert!(matches!(
            renderer.render_frame(&mut backend),
            Err(RendererError::ViewNotInitialized)
        ));
    }

    #[test]
    fn test_frame_progression() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        renderer.init_view(&detail_scene(), &mut backend).unwrap();

        let report = renderer.render_frame(&mut backend).unwrap();
        assert_eq!(report.frame, 1);
        assert_eq!(renderer.frame_number(), 1);
        assert!(renderer.animation().angle_y > 0.0);
        assert_eq!(renderer.last_level(), Some(report.level));
    }

    #[test]
    fn test_release_and_reacquire() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        let scene = detail_scene();

        renderer.init_view(&scene, &mut backend).unwrap();
        assert_eq!(backend.live_buffers(), 2);
        let bounds = *renderer.bounds().unwrap();

        renderer.release_view(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
        assert!(renderer.bounds().is_none());
        assert!(renderer.render_frame(&mut backend).is_err());

        renderer.init_view(&scene, &mut backend).unwrap();
        assert_eq!(backend.live_buffers(), 2);
        assert_eq!(renderer.bounds(), Some(&bounds));
        assert!(renderer.render_frame(&mut backend).is_ok());
    }

    #[test]
    fn test_init_twice_releases_first_view() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        renderer.init_view(&detail_scene(), &mut backend).unwrap();
        renderer.init_view(&detail_scene(), &mut backend).unwrap();
        assert_eq!(backend.live_buffers(), 2);
    }

    #[test]
    fn test_missing_topology_data_is_fatal() {
        let mut low = tessellated_box("low", 1.0, 2, Topology::IndexedStrips);
        low.strip_lengths = None;
        let scene = Scene::with_detail_pair(tessellated_box("high", 1.0, 4, Topology::IndexedList), low);

        let mut renderer = Renderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        let err = renderer.init_view(&scene, &mut backend).unwrap_err();
        assert!(matches!(err, RendererError::Asset(AssetError::MissingTopologyData { .. })));
        assert!(!renderer.has_view());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_bad_detail_table_releases_buffers() {
        let config = RendererConfig {
            lod: LodConfig {
                detail_table: DetailTable::default().with(DetailLevel::Low, 9),
                ..LodConfig::default()
            },
            ..RendererConfig::default()
        };
        let mut renderer = Renderer::new(config);
        let mut backend = RecordingBackend::new();
        assert!(renderer.init_view(&detail_scene(), &mut backend).is_err());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_clear_color_recorded() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        renderer.init_view(&detail_scene(), &mut backend).unwrap();
        backend.take_commands();
        renderer.render_frame(&mut backend).unwrap();
        assert_eq!(
            backend.commands().first(),
            Some(&BackendCommand::BeginFrame(wgpu::Color { r: 0.6, g: 0.8, b: 1.0, a: 1.0 }))
        );
    }

    #[test]
    fn test_unmapped_level_fails_init() {
        let config = RendererConfig {
            lod: LodConfig {
                detail_table: DetailTable::empty().with(DetailLevel::High, 0),
                ..LodConfig::default()
            },
            ..RendererConfig::default()
        };
        let mut renderer = Renderer::new(config);
        let mut backend = RecordingBackend::new();
        let err = renderer.init_view(&detail_scene(), &mut backend).unwrap_err();
        assert!(matches!(err, RendererError::UnmappedLevel(DetailLevel::Low)));
        assert!(!renderer.has_view());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_invalid_aspect_ratio_rejected() {
        for aspect_ratio in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = RendererConfig {
                aspect_ratio,
                ..RendererConfig::default()
            };
            let mut renderer = Renderer::new(config);
            let mut backend = RecordingBackend::new();
            let err = renderer.init_view(&detail_scene(), &mut backend).unwrap_err();
            assert!(matches!(err, RendererError::InvalidConfig(_)));
            assert!(!renderer.has_view());
            assert!(backend.commands().is_empty());
        }
    }

    #[test]
    fn test_config_validate_lod_values() {
        let mut config = RendererConfig::default();
        assert!(config.validate().is_ok());

        config.lod.threshold = -0.1;
        assert!(matches!(config.validate(), Err(RendererError::InvalidConfig(_))));

        config.lod.threshold = 0.02;
        config.lod.hysteresis = Some(f32::NAN);
        assert!(matches!(config.validate(), Err(RendererError::InvalidConfig(_))));
    }

    #[test]
    fn test_frame_time_measured_between_frames() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        renderer.init_view(&detail_scene(), &mut backend).unwrap();

        let start = Instant::now();
        renderer.render_model_at(&mut backend, Mat4::IDENTITY, start).unwrap();
        let report = renderer
            .render_model_at(&mut backend, Mat4::IDENTITY, start + std::time::Duration::from_millis(20))
            .unwrap();

        assert!((report.frame_time.as_secs() - 0.02).abs() < 1e-9);
        assert!((renderer.clock().delta_time().as_secs() - 0.02).abs() < 1e-9);
        assert!(renderer.clock().total_time() >= 0.02);
        assert_eq!(renderer.clock().frame_count(), 2);
    }

    #[test]
    fn test_clock_reset_on_init() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        renderer.init_view(&detail_scene(), &mut backend).unwrap();
        renderer.render_frame(&mut backend).unwrap();
        renderer.render_frame(&mut backend).unwrap();

        renderer.init_view(&detail_scene(), &mut backend).unwrap();
        assert_eq!(renderer.clock().frame_count(), 0);
        assert_eq!(renderer.clock().total_time(), 0.0);
    }

    #[test]
    fn test_samplers_assigned_at_init() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        renderer.init_view(&detail_scene(), &mut backend).unwrap();
        assert_eq!(
            backend.last_uniform(shader::UniformSlot::ReflectionSampler),
            Some(shader::UniformValue::Sampler(0))
        );
        assert_eq!(
            backend.last_uniform(shader::UniformSlot::NormalMapSampler),
            Some(shader::UniformValue::Sampler(1))
        );
    }

    #[test]
    fn test_config_json_defaults() {
        let config: RendererConfig = serde_json::from_str(r#"{"lod": {"threshold": 0.05}}"#).unwrap();
        assert_eq!(config.lod.threshold, 0.05);
        assert_eq!(config.lod.hysteresis, None);
        assert_eq!(config.lod.detail_table, DetailTable::default());
        assert_eq!(config.aspect_ratio, 640.0 / 480.0);
    }
}
