//! # Interactive Designer
//!
//! A [`DesignerSession`] owns a working copy of a [`StickerLayout`], the
//! selection and pointer gesture state, and a preview [`Surface`] that is
//! redrawn through the same pipeline the printer uses.
//!
//! ```no_run
//! use qrlayout::designer::{DesignerConfig, DesignerSession};
//! use qrlayout::layout::builtin_schemas;
//!
//! # async fn example() -> Result<(), qrlayout::LayoutError> {
//! let config = DesignerConfig::new(builtin_schemas(), |layout| {
//!     println!("saved {}", layout.name);
//! })
//! .for_entity("employee");
//!
//! let mut session = DesignerSession::open(config).await?;
//! let id = session.add_text().await?;
//! session.update_content(&id, "{{fullName}}").await?;
//! session.save().map_err(|(_, e)| e)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Gestures
//!
//! ```text
//! Idle ──down on element──▶ Selecting ──up──▶ Idle (selection set)
//!                              │
//!                              └─move > threshold──▶ Dragging ──up──▶ Idle (x,y committed)
//! Idle ──down on handle──▶ Resizing ──up──▶ Idle (x,y,w,h committed)
//! any  ──cancel──▶ Idle (nothing committed)
//! ```
//!
//! Geometry is committed on pointer-up only, followed by a preview refresh.
//! Pointer coordinates are preview pixels.

pub mod gesture;

pub use gesture::{Geometry, Gesture, Handle, Point};

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::LayoutError;
use crate::ir::PixelRect;
use crate::layout::{
    Color, DataRecord, Element, ElementKind, EntitySchema, SchemaMap, StickerLayout, TextStyle,
};
use crate::preview::{Rasterizer, Surface};
use crate::qr::QrCache;
use crate::render::{canvas_size, pixel_bounds, plan::plan};
use crate::units::{Resolution, Unit, convert};

use gesture::{DRAG_THRESHOLD_PX, MIN_SIZE_PX};

/// Called with the finished layout when the session is saved.
pub type SaveCallback = Box<dyn FnOnce(StickerLayout) + Send>;

const SELECTION_COLOR: Color = Color::rgb(0x25, 0x63, 0xeb);
const HANDLE_FILL: Color = Color::WHITE;

/// Options for opening a designer session.
pub struct DesignerConfig {
    /// Surface the preview is drawn onto. Resized to the label.
    pub mount: Surface,
    pub schemas: SchemaMap,
    /// Layout to edit. `None` starts a blank layout for `target_entity`.
    pub initial_layout: Option<StickerLayout>,
    /// Entity type for a new layout. Defaults to the first schema.
    pub target_entity: Option<String>,
    pub on_save: SaveCallback,
    pub resolution: Resolution,
    pub cache: Arc<QrCache>,
}

impl DesignerConfig {
    pub fn new(schemas: SchemaMap, on_save: impl FnOnce(StickerLayout) + Send + 'static) -> Self {
        Self {
            mount: Surface::new(1, 1),
            schemas,
            initial_layout: None,
            target_entity: None,
            on_save: Box::new(on_save),
            resolution: Resolution::SCREEN,
            cache: Arc::new(QrCache::new()),
        }
    }

    pub fn with_layout(mut self, layout: StickerLayout) -> Self {
        self.initial_layout = Some(layout);
        self
    }

    pub fn for_entity(mut self, entity: &str) -> Self {
        self.target_entity = Some(entity.to_string());
        self
    }

    pub fn with_mount(mut self, surface: Surface) -> Self {
        self.mount = surface;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_cache(mut self, cache: Arc<QrCache>) -> Self {
        self.cache = cache;
        self
    }
}

impl std::fmt::Debug for DesignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignerConfig")
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("initial_layout", &self.initial_layout.as_ref().map(|l| &l.id))
            .field("target_entity", &self.target_entity)
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}

/// An open editing session.
pub struct DesignerSession {
    layout: StickerLayout,
    schemas: SchemaMap,
    selected: Option<String>,
    gesture: Gesture,
    resolution: Resolution,
    cache: Arc<QrCache>,
    rasterizer: Rasterizer,
    surface: Surface,
    stale: bool,
    on_save: SaveCallback,
}

impl std::fmt::Debug for DesignerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignerSession")
            .field("layout_id", &self.layout.id)
            .field("selected", &self.selected)
            .field("gesture", &self.gesture)
            .field("resolution", &self.resolution)
            .field("stale", &self.stale)
            .finish_non_exhaustive()
    }
}

impl DesignerSession {
    /// Open a session and draw the first preview.
    ///
    /// Fails with `UnknownEntity` if the layout's entity type has no schema,
    /// or with a validation error if the initial layout can't be drawn.
    pub async fn open(config: DesignerConfig) -> Result<Self, LayoutError> {
        let DesignerConfig {
            mount,
            schemas,
            initial_layout,
            target_entity,
            on_save,
            resolution,
            cache,
        } = config;

        let layout = match initial_layout {
            Some(layout) => layout,
            None => {
                let entity = match target_entity {
                    Some(entity) => entity,
                    None => schemas
                        .keys()
                        .next()
                        .cloned()
                        .ok_or_else(|| LayoutError::UnknownEntity("<none>".to_string()))?,
                };
                StickerLayout::new("New Layout", &entity, 50.0, 30.0, Unit::Millimeter)
            }
        };
        if !schemas.contains_key(&layout.target_entity) {
            return Err(LayoutError::UnknownEntity(layout.target_entity));
        }
        layout.validate()?;
        canvas_size(&layout, resolution)?;

        let mut session = Self {
            layout,
            schemas,
            selected: None,
            gesture: Gesture::Idle,
            resolution,
            cache,
            rasterizer: Rasterizer::new(),
            surface: mount,
            stale: true,
            on_save,
        };
        session.refresh_preview().await?;
        info!(
            layout_id = %session.layout.id,
            entity = %session.layout.target_entity,
            "Designer session opened"
        );
        Ok(session)
    }

    pub fn layout(&self) -> &StickerLayout {
        &self.layout
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn schema(&self) -> Option<&EntitySchema> {
        self.schemas.get(&self.layout.target_entity)
    }

    /// Preview data for the active entity type.
    pub fn sample_record(&self) -> DataRecord {
        self.schema()
            .map(|s| s.sample_data.clone())
            .unwrap_or_default()
    }

    /// Insertable `(label, token)` pairs for the active schema.
    pub fn field_tokens(&self) -> Vec<(String, String)> {
        self.schema()
            .map(|s| {
                s.fields
                    .iter()
                    .map(|f| (f.label.clone(), crate::template::token(&f.name)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// The last rendered preview, without selection chrome.
    pub fn preview(&self) -> &Surface {
        &self.surface
    }

    /// True while a mutation's preview refresh hasn't completed.
    pub fn is_preview_stale(&self) -> bool {
        self.stale
    }

    pub fn select(&mut self, id: &str) -> Result<(), LayoutError> {
        self.require(id)?;
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    fn require(&self, id: &str) -> Result<&Element, LayoutError> {
        self.layout
            .element(id)
            .ok_or_else(|| LayoutError::UnknownElement(id.to_string()))
    }

    fn require_mut(&mut self, id: &str) -> Result<&mut Element, LayoutError> {
        self.layout
            .element_mut(id)
            .ok_or_else(|| LayoutError::UnknownElement(id.to_string()))
    }

    /// Pixel bounds of an element in the preview, honoring an in-flight gesture.
    pub fn element_bounds(&self, id: &str) -> Option<PixelRect> {
        let element = self.layout.element(id)?;
        match self.gesture.pending() {
            Some((pending, geometry)) if pending == id => {
                let mut ghost = element.clone();
                geometry.apply_to(&mut ghost);
                Some(pixel_bounds(&ghost, self.layout.unit, self.resolution))
            }
            _ => Some(pixel_bounds(element, self.layout.unit, self.resolution)),
        }
    }

    /// Topmost element under a preview pixel.
    pub fn hit_test(&self, point: Point) -> Option<&str> {
        let (px, py) = (point.x.floor() as i32, point.y.floor() as i32);
        self.layout
            .elements
            .iter()
            .rev()
            .find(|e| pixel_bounds(e, self.layout.unit, self.resolution).contains(px, py))
            .map(|e| e.id.as_str())
    }

    /// Re-render the preview from the working layout and sample record.
    ///
    /// The surface is only written once every QR symbol is available, so
    /// dropping this future mid-way leaves the previous preview intact.
    pub async fn refresh_preview(&mut self) -> Result<(), LayoutError> {
        self.stale = true;
        let record = self.sample_record();
        let planned = plan(&self.layout, &record, self.resolution)?;
        let program = planned.resolve(&self.cache).await;
        self.rasterizer.execute(&program, &mut self.surface);
        self.stale = false;
        debug!(layout_id = %self.layout.id, ops = program.len(), "Preview refreshed");
        Ok(())
    }

    /// Preview with the selection outline and resize handles drawn on top.
    pub fn render_overlay(&self) -> Surface {
        let mut out = self.surface.clone();
        if let Some((id, _)) = self.gesture.pending()
            && let Some(bounds) = self.element_bounds(id)
        {
            out.stroke_rect(bounds, SELECTION_COLOR);
        }
        if let Some(id) = self.selected.as_deref()
            && let Some(bounds) = self.element_bounds(id)
        {
            out.stroke_rect(bounds, SELECTION_COLOR);
            for handle in Handle::ALL {
                let rect = handle.rect(bounds);
                out.fill_rect(rect, HANDLE_FILL);
                out.stroke_rect(rect, SELECTION_COLOR);
            }
        }
        out
    }

    // ===== Pointer gestures =====

    /// Pointer pressed at a preview position.
    ///
    /// Handles of the selected element win over element bodies; a press on
    /// empty space clears the selection.
    pub fn pointer_down(&mut self, point: Point) {
        if let Some(id) = self.selected.clone()
            && let Some(element) = self.layout.element(&id)
        {
            let bounds = pixel_bounds(element, self.layout.unit, self.resolution);
            if let Some(handle) = Handle::hit(bounds, point) {
                let original = Geometry::of(element);
                self.gesture = Gesture::Resizing {
                    id,
                    handle,
                    origin: point,
                    original,
                    current: original,
                };
                return;
            }
        }

        match self.hit_test(point).map(str::to_string) {
            Some(id) => {
                let original = self.layout.element(&id).map(Geometry::of);
                self.selected = Some(id.clone());
                if let Some(original) = original {
                    self.gesture = Gesture::Selecting {
                        id,
                        origin: point,
                        original,
                    };
                }
            }
            None => {
                self.selected = None;
                self.gesture = Gesture::Idle;
            }
        }
    }

    /// Pointer moved while pressed.
    pub fn pointer_move(&mut self, point: Point) {
        let unit = self.layout.unit;
        let (limit_w, limit_h) = (self.layout.width, self.layout.height);
        let res = self.resolution;
        let delta = |origin: Point| {
            (
                res.from_pixels(point.x - origin.x, unit),
                res.from_pixels(point.y - origin.y, unit),
            )
        };

        self.gesture = match std::mem::take(&mut self.gesture) {
            Gesture::Selecting {
                id,
                origin,
                original,
            } if point.distance(origin) > DRAG_THRESHOLD_PX => {
                let (dx, dy) = delta(origin);
                Gesture::Dragging {
                    id,
                    origin,
                    original,
                    current: original.translated(dx, dy, limit_w, limit_h),
                }
            }
            Gesture::Dragging {
                id,
                origin,
                original,
                ..
            } => {
                let (dx, dy) = delta(origin);
                Gesture::Dragging {
                    id,
                    origin,
                    original,
                    current: original.translated(dx, dy, limit_w, limit_h),
                }
            }
            Gesture::Resizing {
                id,
                handle,
                origin,
                original,
                ..
            } => {
                let (dx, dy) = delta(origin);
                let min_size = res.from_pixels(MIN_SIZE_PX, unit);
                Gesture::Resizing {
                    id,
                    handle,
                    origin,
                    original,
                    current: original.resized(handle, dx, dy, min_size, limit_w, limit_h),
                }
            }
            other => other,
        };
    }

    /// Pointer released: commit a drag or resize and refresh the preview.
    ///
    /// Returns whether geometry changed.
    pub async fn pointer_up(&mut self) -> Result<bool, LayoutError> {
        let Some((id, geometry)) = self
            .gesture
            .pending()
            .map(|(id, geometry)| (id.to_string(), geometry))
        else {
            self.gesture = Gesture::Idle;
            return Ok(false);
        };
        self.gesture = Gesture::Idle;

        let element = self.require_mut(&id)?;
        if Geometry::of(element) == geometry {
            return Ok(false);
        }
        geometry.apply_to(element);
        debug!(element_id = %id, x = geometry.x, y = geometry.y, w = geometry.w, h = geometry.h, "Geometry committed");
        self.refresh_preview().await?;
        Ok(true)
    }

    /// Abandon the current gesture without committing anything.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Move the selected element by `(dx, dy)` layout units.
    pub async fn nudge(&mut self, dx: f64, dy: f64) -> Result<bool, LayoutError> {
        let Some(id) = self.selected.clone() else {
            return Ok(false);
        };
        let (limit_w, limit_h) = (self.layout.width, self.layout.height);
        let element = self.require_mut(&id)?;
        let moved = Geometry::of(element).translated(dx, dy, limit_w, limit_h);
        moved.apply_to(element);
        self.refresh_preview().await?;
        Ok(true)
    }

    // ===== Element operations =====

    fn first_field_token(&self) -> Option<String> {
        self.schema()
            .and_then(|s| s.fields.first())
            .map(|f| crate::template::token(&f.name))
    }

    async fn insert(&mut self, element: Element) -> Result<String, LayoutError> {
        let id = element.id.clone();
        self.layout.elements.push(element);
        self.selected = Some(id.clone());
        self.refresh_preview().await?;
        Ok(id)
    }

    /// Add a text element bound to the schema's first field, and select it.
    pub async fn add_text(&mut self) -> Result<String, LayoutError> {
        let (w, h) = (self.layout.width, self.layout.height);
        let content = self.first_field_token().unwrap_or_else(|| "Text".to_string());
        let element = Element::text(w * 0.1, h * 0.1, w * 0.5, h * 0.15, &content);
        self.insert(element).await
    }

    /// Add a square QR element bound to the schema's first field, and select it.
    pub async fn add_qr(&mut self) -> Result<String, LayoutError> {
        let side = self.layout.width.min(self.layout.height) * 0.35;
        let content = self.first_field_token().unwrap_or_default();
        let element = Element::qr(
            self.layout.width * 0.1,
            self.layout.height * 0.1,
            side,
            &content,
        );
        self.insert(element).await
    }

    pub async fn remove_element(&mut self, id: &str) -> Result<Element, LayoutError> {
        let index = self
            .layout
            .index_of(id)
            .ok_or_else(|| LayoutError::UnknownElement(id.to_string()))?;
        let removed = self.layout.elements.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.gesture.pending().is_some_and(|(g, _)| g == id)
            || matches!(&self.gesture, Gesture::Selecting { id: g, .. } if g == id)
        {
            self.gesture = Gesture::Idle;
        }
        self.refresh_preview().await?;
        Ok(removed)
    }

    pub async fn update_content(&mut self, id: &str, content: &str) -> Result<(), LayoutError> {
        self.require_mut(id)?.content = content.to_string();
        self.refresh_preview().await
    }

    /// Replace a text element's style. A bad color is rejected before anything changes.
    pub async fn update_style(&mut self, id: &str, style: TextStyle) -> Result<(), LayoutError> {
        if let Some(color) = style.color.as_deref() {
            Color::parse(color)?;
        }
        self.require_mut(id)?.style = Some(style);
        self.refresh_preview().await
    }

    pub async fn set_separator(
        &mut self,
        id: &str,
        separator: Option<&str>,
    ) -> Result<(), LayoutError> {
        let element = self.require_mut(id)?;
        if element.kind != ElementKind::Qr {
            debug!(element_id = %id, "Separator set on non-QR element");
        }
        element.qr_separator = separator.map(str::to_string);
        self.refresh_preview().await
    }

    /// Set an element's geometry directly, in layout units.
    pub async fn set_geometry(&mut self, id: &str, geometry: Geometry) -> Result<(), LayoutError> {
        let valid = [geometry.x, geometry.y, geometry.w, geometry.h]
            .iter()
            .all(|v| v.is_finite())
            && geometry.w > 0.0
            && geometry.h > 0.0;
        if !valid {
            return Err(LayoutError::InvalidGeometry(format!(
                "element '{}' cannot be {}x{}",
                id, geometry.w, geometry.h
            )));
        }
        geometry.apply_to(self.require_mut(id)?);
        self.refresh_preview().await
    }

    /// Move an element one step up the paint order. Returns false at the top.
    pub async fn bring_forward(&mut self, id: &str) -> Result<bool, LayoutError> {
        let index = self
            .layout
            .index_of(id)
            .ok_or_else(|| LayoutError::UnknownElement(id.to_string()))?;
        if index + 1 >= self.layout.elements.len() {
            return Ok(false);
        }
        self.layout.elements.swap(index, index + 1);
        self.refresh_preview().await?;
        Ok(true)
    }

    /// Move an element one step down the paint order. Returns false at the bottom.
    pub async fn send_backward(&mut self, id: &str) -> Result<bool, LayoutError> {
        let index = self
            .layout
            .index_of(id)
            .ok_or_else(|| LayoutError::UnknownElement(id.to_string()))?;
        if index == 0 {
            return Ok(false);
        }
        self.layout.elements.swap(index, index - 1);
        self.refresh_preview().await?;
        Ok(true)
    }

    // ===== Layout operations =====

    pub fn set_name(&mut self, name: &str) {
        self.layout.name = name.to_string();
    }

    /// Resize the label. Element geometry is left as is.
    pub async fn set_size(&mut self, width: f64, height: f64) -> Result<(), LayoutError> {
        let mut candidate = self.layout.clone();
        candidate.width = width;
        candidate.height = height;
        candidate.validate()?;
        canvas_size(&candidate, self.resolution)?;
        self.layout = candidate;
        self.refresh_preview().await
    }

    pub async fn set_background(&mut self, color: &str) -> Result<(), LayoutError> {
        Color::parse(color)?;
        self.layout.background_color = color.to_string();
        self.refresh_preview().await
    }

    /// Retarget the layout. The preview switches to the new schema's sample data.
    pub async fn set_target_entity(&mut self, entity: &str) -> Result<(), LayoutError> {
        if !self.schemas.contains_key(entity) {
            return Err(LayoutError::UnknownEntity(entity.to_string()));
        }
        self.layout.target_entity = entity.to_string();
        self.refresh_preview().await
    }

    /// Switch units, converting the label size and every element's geometry.
    ///
    /// Elements that declare their own `unit` are rewritten to the new one.
    /// The converted layout is checked before it replaces the working copy.
    pub async fn set_unit(&mut self, unit: Unit) -> Result<(), LayoutError> {
        let from = self.layout.unit;
        if from == unit {
            return Ok(());
        }
        let res = self.resolution;
        let conv = |v: f64| convert(v, from, unit, res);

        let mut candidate = self.layout.clone();
        candidate.width = conv(candidate.width);
        candidate.height = conv(candidate.height);
        candidate.unit = unit;
        for element in &mut candidate.elements {
            Geometry {
                x: conv(element.x),
                y: conv(element.y),
                w: conv(element.w),
                h: conv(element.h),
            }
            .apply_to(element);
            if let Some(declared) = element.extra.get_mut("unit") {
                *declared = serde_json::to_value(unit)?;
            }
        }
        candidate.validate()?;
        canvas_size(&candidate, self.resolution)?;

        self.layout = candidate;
        self.gesture = Gesture::Idle;
        self.refresh_preview().await
    }

    // ===== Lifecycle =====

    /// Check that the working layout can be saved.
    pub fn validate(&self) -> Result<(), LayoutError> {
        self.layout.validate()
    }

    /// Hand the working layout to the save callback and end the session.
    ///
    /// An invalid layout is not saved: the session comes back with the
    /// error so the edits can be fixed.
    pub fn save(self) -> Result<(), (Box<Self>, LayoutError)> {
        if let Err(e) = self.validate() {
            return Err((Box::new(self), e));
        }
        info!(layout_id = %self.layout.id, elements = self.layout.elements.len(), "Layout saved");
        (self.on_save)(self.layout);
        Ok(())
    }

    /// End the session, discarding unsaved changes.
    pub fn destroy(self) {
        debug!(layout_id = %self.layout.id, "Designer session destroyed");
    }
}
