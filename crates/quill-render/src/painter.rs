//! Immediate-mode batched painter.
//!
//! Shapes and glyph quads are appended to one CPU-side vertex/index batch.
//! The batch is flushed (uploaded and drawn) whenever the texture it samples
//! changes, whenever the clip or offset stack changes, and at the end of the
//! frame. Flushes reach the backend in call order, so later draws always land
//! on top of earlier ones.
//!
//! Coordinates are canvas pixels with integer values on pixel centres. Filled
//! shapes extend half a pixel outwards, so `fill_rect` from `A` to `B` covers
//! pixels `A..=B`.

use std::f32::consts::PI;
use std::path::Path;
use std::sync::Arc;

use glam::Vec2;
use quill::{
    codepoints, Color, Font, HorizontalAlign, IPoint, IRect, Point, Polygon, Rect, Size,
    VerticalAlign,
};
use quill_text::Rasterizer;

use crate::{
    BufferUpload, FontCache, FontMetrics, PainterConfig, RenderBackend, RenderError, Result,
    ScissorRect, TextureId, Vertex, SUBPIXEL_PHASES,
};

const SUBPIXEL_STEPS: f32 = SUBPIXEL_PHASES as f32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameState {
    Idle,
    Recording,
}

/// Counters describing how batches reached the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Draw calls issued.
    pub flushes: u64,
    /// Uploads that had to grow the vertex buffer.
    pub vertex_reallocations: u64,
    /// Uploads that had to grow the index buffer.
    pub index_reallocations: u64,
    /// Current vertex buffer size, in vertices.
    pub vertex_capacity: usize,
    /// Current index buffer size, in indices.
    pub index_capacity: usize,
}

pub struct Painter<B: RenderBackend> {
    backend: B,
    fonts: FontCache,
    config: PainterConfig,
    canvas_size: [u32; 2],
    state: FrameState,

    stencil: IRect,
    stencils: Vec<IRect>,
    offset: IPoint,
    offsets: Vec<IPoint>,

    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    null_texture: TextureId,
    active_texture: TextureId,
    stats: BatchStats,
}

impl<B: RenderBackend> Painter<B> {
    /// Create a painter drawing to a `canvas_size` pixel surface through `backend`.
    pub fn new<R>(backend: B, canvas_size: [u32; 2], rasterizer: R) -> Self
    where
        R: Rasterizer + 'static,
    {
        Self::with_config(backend, canvas_size, rasterizer, PainterConfig::default())
    }

    pub fn with_config<R>(
        mut backend: B,
        canvas_size: [u32; 2],
        rasterizer: R,
        config: PainterConfig,
    ) -> Self
    where
        R: Rasterizer + 'static,
    {
        // 1x1 opaque white, sampled by untextured shapes
        let null_texture = backend.create_texture([1, 1], &[0xFF; 4]);
        let fonts = FontCache::new(&mut backend, rasterizer, config.atlas_max_size);

        Self {
            backend,
            fonts,
            config,
            canvas_size,
            state: FrameState::Idle,
            stencil: IRect::from_size(canvas_size[0], canvas_size[1]),
            stencils: Vec::new(),
            offset: IPoint::ZERO,
            offsets: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            null_texture,
            active_texture: null_texture,
            stats: BatchStats::default(),
        }
    }

    pub fn config(&self) -> &PainterConfig {
        &self.config
    }

    pub fn canvas_size(&self) -> [u32; 2] {
        self.canvas_size
    }

    /// Resize the canvas. The active clip is reset to the whole new canvas.
    pub fn set_canvas_size(&mut self, canvas_size: [u32; 2]) {
        self.flush();
        self.canvas_size = canvas_size;
        self.stencil = IRect::from_size(canvas_size[0], canvas_size[1]);
        if self.is_recording() {
            self.apply_stencil();
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn font_cache(&self) -> &FontCache {
        &self.fonts
    }

    pub fn font_cache_mut(&mut self) -> &mut FontCache {
        &mut self.fonts
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Active clip rectangle in canvas pixels, inclusive.
    pub fn current_stencil(&self) -> IRect {
        self.stencil
    }

    /// Accumulated translation applied to drawn geometry.
    pub fn current_offset(&self) -> IPoint {
        self.offset
    }

    pub fn is_recording(&self) -> bool {
        self.state == FrameState::Recording
    }

    /// Texture the pending batch samples.
    pub fn active_texture(&self) -> TextureId {
        self.active_texture
    }

    /// The 1x1 white texture used by untextured shapes.
    pub fn null_texture(&self) -> TextureId {
        self.null_texture
    }

    pub fn load_font(&mut self, data: impl Into<Arc<[u8]>>) -> Result<String> {
        self.fonts.load_font(data)
    }

    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        self.fonts.load_font_file(path)
    }

    pub fn font_metrics(&mut self, font: &mut Font) -> Result<FontMetrics> {
        self.fonts.font_metrics(font)
    }

    pub fn kerning(&mut self, font: &mut Font, left: u32, right: u32) -> Result<[f32; 2]> {
        self.fonts.kerning(font, left, right)
    }

    pub fn begin_render(&mut self) {
        if self.is_recording() {
            log::warn!("begin_render called while recording; ending the previous frame");
            self.end_render();
        }

        self.stencils.clear();
        self.offsets.clear();
        self.stencil = IRect::from_size(self.canvas_size[0], self.canvas_size[1]);
        self.offset = IPoint::ZERO;
        self.vertices.clear();
        self.indices.clear();
        self.state = FrameState::Recording;

        self.backend.begin_frame(self.canvas_size);
        self.apply_stencil();
        self.apply_offset();

        self.active_texture = self.null_texture;
        self.backend.bind_texture(self.null_texture);
    }

    pub fn end_render(&mut self) {
        if !self.is_recording() {
            log::warn!("end_render called without begin_render");
            return;
        }

        self.flush();
        self.backend.end_frame();
        self.state = FrameState::Idle;
    }

    /// Restrict drawing to `rect` (offset by the current translation) within
    /// the current clip.
    pub fn push_stencil(&mut self, rect: IRect) {
        self.flush();
        self.stencils.push(self.stencil);
        self.stencil = self.stencil.intersect(rect.translate(self.offset));
        self.apply_stencil();
    }

    pub fn pop_stencil(&mut self) -> Result<()> {
        self.flush();
        self.stencil = self
            .stencils
            .pop()
            .ok_or(RenderError::StencilStackUnderflow)?;
        self.apply_stencil();
        Ok(())
    }

    /// Translate everything drawn afterwards by `offset`, on top of the current translation.
    pub fn push_offset(&mut self, offset: IPoint) {
        self.flush();
        self.offsets.push(self.offset);
        self.offset += offset;
        self.apply_offset();
    }

    pub fn pop_offset(&mut self) -> Result<()> {
        self.flush();
        self.offset = self
            .offsets
            .pop()
            .ok_or(RenderError::OffsetStackUnderflow)?;
        self.apply_offset();
        Ok(())
    }

    /// Make `texture` the one sampled by the pending batch, flushing first if it changes.
    pub fn select_texture(&mut self, texture: TextureId) {
        if texture == self.active_texture {
            return;
        }

        self.flush();
        self.backend.bind_texture(texture);
        self.active_texture = texture;
    }

    /// Upload the pending batch and draw it.
    ///
    /// When the batch samples the glyph atlas, pending atlas changes are
    /// uploaded first. Text interleaved with stack changes or other textures
    /// can therefore upload the atlas several times in one frame.
    pub fn flush(&mut self) {
        if self.indices.is_empty() {
            self.vertices.clear();
            return;
        }

        if self.active_texture == self.fonts.atlas().texture() {
            self.fonts.atlas_mut().upload(&mut self.backend);
        }

        let vertex_upload = if self.vertices.len() > self.stats.vertex_capacity {
            self.stats.vertex_capacity = self.vertices.len();
            self.stats.vertex_reallocations += 1;
            BufferUpload::Reallocate
        } else {
            BufferUpload::Update
        };

        let index_upload = if self.indices.len() > self.stats.index_capacity {
            self.stats.index_capacity = self.indices.len();
            self.stats.index_reallocations += 1;
            BufferUpload::Reallocate
        } else {
            BufferUpload::Update
        };

        self.backend.upload_vertices(&self.vertices, vertex_upload);
        self.backend.upload_indices(&self.indices, index_upload);
        self.backend.draw_indexed(self.indices.len() as u32);
        self.stats.flushes += 1;

        log::trace!(
            "Flushed {} vertices, {} indices ({vertex_upload:?}/{index_upload:?})",
            self.vertices.len(),
            self.indices.len()
        );

        self.vertices.clear();
        self.indices.clear();
    }

    pub fn draw_line(&mut self, a: Point, b: Point, color: Color, thickness: f32) {
        if !self.begin_shape("line") {
            return;
        }
        self.push_line(a, b, color, thickness);
    }

    /// Outline `area` with a border `thickness` pixels wide, drawn inside the area.
    pub fn draw_rect(&mut self, area: Rect, color: Color, thickness: f32, border_radius: f32) {
        if !self.begin_shape("rect") {
            return;
        }

        if border_radius > 0.0 {
            let min = area.min - 0.5;
            let max = area.max + 0.5;
            let half = (max - min).min_element() * 0.5;
            let radius = border_radius.min(half);
            let t = thickness.clamp(0.0, half);

            let outer = rounded_outline(min, max, radius, self.config.corner_segments);
            let inner = rounded_outline(
                min + t,
                max - t,
                (radius - t).max(0.0),
                self.config.corner_segments,
            );
            self.push_ring(&outer, &inner, color);
            return;
        }

        let a = area.min;
        let b = area.max;
        let w = thickness - 1.0;

        let otl = self.add_vertex(Vec2::new(a.x - 0.5, a.y - 0.5), color);
        let otr = self.add_vertex(Vec2::new(b.x + 0.5, a.y - 0.5), color);
        let obl = self.add_vertex(Vec2::new(a.x - 0.5, b.y + 0.5), color);
        let obr = self.add_vertex(Vec2::new(b.x + 0.5, b.y + 0.5), color);
        let itl = self.add_vertex(Vec2::new(a.x + 0.5 + w, a.y + 0.5 + w), color);
        let itr = self.add_vertex(Vec2::new(b.x - 0.5 - w, a.y + 0.5 + w), color);
        let ibl = self.add_vertex(Vec2::new(a.x + 0.5 + w, b.y - 0.5 - w), color);
        let ibr = self.add_vertex(Vec2::new(b.x - 0.5 - w, b.y - 0.5 - w), color);

        // Top
        self.add_tri(otl, otr, itl);
        self.add_tri(otr, itl, itr);
        // Left
        self.add_tri(otl, itl, obl);
        self.add_tri(itl, obl, ibl);
        // Bottom
        self.add_tri(ibl, ibr, obl);
        self.add_tri(ibr, obl, obr);
        // Right
        self.add_tri(itr, otr, ibr);
        self.add_tri(otr, ibr, obr);
    }

    pub fn fill_rect(&mut self, area: Rect, color: Color, border_radius: f32) {
        if !self.begin_shape("rect") {
            return;
        }

        let min = area.min - 0.5;
        let max = area.max + 0.5;

        if border_radius > 0.0 {
            let radius = border_radius.min((max - min).min_element() * 0.5);
            let outline = rounded_outline(min, max, radius, self.config.corner_segments);
            self.push_fan((min + max) * 0.5, &outline, color);
            return;
        }

        let tl = self.add_vertex(min, color);
        let tr = self.add_vertex(Vec2::new(max.x, min.y), color);
        let bl = self.add_vertex(Vec2::new(min.x, max.y), color);
        let br = self.add_vertex(max, color);

        self.add_tri(tl, tr, bl);
        self.add_tri(tr, bl, br);
    }

    /// Outline `polygon`, scaled from unit space to `size` and placed at `position`.
    pub fn draw_polygon(
        &mut self,
        position: Point,
        polygon: &Polygon,
        size: Size,
        color: Color,
        thickness: f32,
    ) {
        if !self.begin_shape("polygon") {
            return;
        }

        let points: Vec<Vec2> = polygon
            .vertices()
            .iter()
            .map(|&v| position + v * size - 0.5)
            .collect();
        let n = points.len();
        if n < 2 {
            return;
        }

        for i in 0..n {
            self.push_line(points[i], points[(i + 1) % n], color, thickness);
        }
    }

    /// Fill `polygon`, scaled from unit space to `size` and placed at `position`.
    pub fn fill_polygon(&mut self, position: Point, polygon: &Polygon, size: Size, color: Color) {
        if !self.begin_shape("polygon") {
            return;
        }

        let first = self.vertices.len() as u32;
        for &v in polygon.vertices() {
            self.add_vertex(position + v * size - 0.5, color);
        }
        for t in polygon.triangles() {
            self.add_tri(first + t[0], first + t[1], first + t[2]);
        }
    }

    /// Stroke an arc of a circle. Angles in radians; `thickness` grows inwards
    /// from the outer edge.
    pub fn draw_arc(
        &mut self,
        center: Point,
        diameter: f32,
        start_angle: f32,
        end_angle: f32,
        color: Color,
        thickness: f32,
    ) {
        if !self.begin_shape("arc") {
            return;
        }

        let outer = diameter * 0.5;
        let inner = (outer - thickness).max(0.0);
        let Some((steps, dtheta)) = arc_steps(outer, start_angle, end_angle) else {
            return;
        };

        let first = self.vertices.len() as u32;
        for i in 0..=steps {
            let theta = start_angle + dtheta * i as f32;
            let phase = Vec2::new(theta.cos(), theta.sin());
            self.add_vertex(center - phase * outer, color);
            self.add_vertex(center - phase * inner, color);
        }

        for k in 0..steps {
            let i = first + k * 2;
            self.add_tri(i, i + 1, i + 2);
            self.add_tri(i + 1, i + 2, i + 3);
        }
    }

    /// Fill a circular sector. Angles in radians.
    pub fn fill_arc(
        &mut self,
        center: Point,
        diameter: f32,
        start_angle: f32,
        end_angle: f32,
        color: Color,
    ) {
        if !self.begin_shape("arc") {
            return;
        }

        let radius = diameter * 0.5;
        let Some((steps, dtheta)) = arc_steps(radius, start_angle, end_angle) else {
            return;
        };

        let c = self.add_vertex(center, color);
        let first = self.vertices.len() as u32;
        for i in 0..=steps {
            let theta = start_angle + dtheta * i as f32;
            self.add_vertex(center - Vec2::new(theta.cos(), theta.sin()) * radius, color);
        }

        for i in first..first + steps {
            self.add_tri(i, i + 1, c);
        }
    }

    /// Width of `text` set in `font` (sum of advances), and the font's pixel size as height.
    ///
    /// Uses the same sub-pixel positioning as [`Painter::draw_text`] with the
    /// pen starting at zero.
    pub fn measure_text(&mut self, font: &mut Font, text: impl AsRef<[u8]>) -> Result<Size> {
        self.fonts.prepare_font(font)?;

        let mut size = Size::new(0.0, font.size() as f32);
        for codepoint in codepoints(text.as_ref()) {
            match self.fonts.get_glyph(font, codepoint, subpixel_phase(size.x)) {
                Ok(glyph) => size.x += glyph.advance,
                Err(RenderError::AtlasFull { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(size)
    }

    /// Draw one line of UTF-8 `text`. `position` is interpreted according to the
    /// alignment references; with `Left`/`Baseline` it is the pen start on the baseline.
    ///
    /// Glyphs that do not fit in the atlas are skipped.
    pub fn draw_text(
        &mut self,
        position: Point,
        text: impl AsRef<[u8]>,
        font: &mut Font,
        color: Color,
        h_align: HorizontalAlign,
        v_align: VerticalAlign,
    ) -> Result<()> {
        self.fonts.prepare_font(font)?;
        if !self.is_recording() {
            log::warn!("Dropped text drawn outside begin_render/end_render");
            return Ok(());
        }

        let text = text.as_ref();
        let mut cursor = (position * SUBPIXEL_STEPS).round() / SUBPIXEL_STEPS;

        match h_align {
            HorizontalAlign::Left => {}
            HorizontalAlign::Center => cursor.x -= self.measure_text(font, text)?.x * 0.5,
            HorizontalAlign::Right => cursor.x -= self.measure_text(font, text)?.x,
        }

        if v_align != VerticalAlign::Baseline {
            let metrics = self.fonts.font_metrics(font)?;
            cursor.y += match v_align {
                VerticalAlign::Top => metrics.ascender,
                VerticalAlign::Center => (metrics.ascender + metrics.descender) * 0.5,
                VerticalAlign::Bottom => metrics.descender,
                VerticalAlign::Baseline => 0.0,
            };
        }

        cursor = Vec2::new(
            (cursor.x * SUBPIXEL_STEPS).round() / SUBPIXEL_STEPS,
            cursor.y.round(),
        );

        for codepoint in codepoints(text) {
            let x = cursor.x.floor();
            let glyph = match self.fonts.get_glyph(font, codepoint, subpixel_phase(cursor.x)) {
                Ok(glyph) => glyph,
                Err(RenderError::AtlasFull { .. }) => continue,
                Err(err) => return Err(err),
            };

            if glyph.size.x > 0.0 && glyph.size.y > 0.0 {
                self.select_texture(glyph.texture);

                let tl = Vec2::new(x + glyph.offset.x - 0.5, cursor.y - glyph.offset.y - 0.5);
                let uv = glyph.coords;
                let a = self.add_textured_vertex(tl, uv.tl, color);
                let b = self.add_textured_vertex(tl + Vec2::new(glyph.size.x, 0.0), uv.tr, color);
                let c = self.add_textured_vertex(tl + Vec2::new(0.0, glyph.size.y), uv.bl, color);
                let d = self.add_textured_vertex(tl + glyph.size, uv.br, color);

                self.add_tri(a, b, c);
                self.add_tri(b, c, d);
            }

            cursor.x += glyph.advance;
        }

        Ok(())
    }

    fn begin_shape(&mut self, what: &str) -> bool {
        if !self.is_recording() {
            log::warn!("Dropped {what} drawn outside begin_render/end_render");
            return false;
        }

        self.select_texture(self.null_texture);
        true
    }

    fn apply_stencil(&mut self) {
        self.backend
            .set_scissor(ScissorRect::from_clip(self.stencil, self.canvas_size));
    }

    fn apply_offset(&mut self) {
        self.backend.set_offset(self.offset.to_array());
    }

    #[inline]
    fn add_vertex(&mut self, pos: Vec2, color: Color) -> u32 {
        self.add_textured_vertex(pos, Vec2::ZERO, color)
    }

    #[inline]
    fn add_textured_vertex(&mut self, pos: Vec2, uv: Vec2, color: Color) -> u32 {
        self.vertices.push(Vertex::at(pos, uv, color));
        self.vertices.len() as u32 - 1
    }

    #[inline]
    fn add_tri(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// A quad from `a` to `b`, `thickness` wide and extended half a pixel past both ends.
    fn push_line(&mut self, a: Vec2, b: Vec2, color: Color, thickness: f32) {
        let delta = b - a;
        let length = delta.length();
        if length <= f32::EPSILON {
            return;
        }

        let forw = delta * (0.5 / length);
        let norm = Vec2::new(forw.y, -forw.x) * thickness;

        let tl = self.add_vertex(a - forw - norm, color);
        let tr = self.add_vertex(b + forw - norm, color);
        let bl = self.add_vertex(a - forw + norm, color);
        let br = self.add_vertex(b + forw + norm, color);

        self.add_tri(tl, tr, bl);
        self.add_tri(tr, bl, br);
    }

    /// Triangle fan around `center` over a closed outline.
    fn push_fan(&mut self, center: Vec2, outline: &[Vec2], color: Color) {
        let c = self.add_vertex(center, color);
        let first = self.vertices.len() as u32;
        let n = outline.len() as u32;
        for &p in outline {
            self.add_vertex(p, color);
        }
        for i in 0..n {
            self.add_tri(c, first + i, first + (i + 1) % n);
        }
    }

    /// Closed strip between two outlines with the same number of points.
    fn push_ring(&mut self, outer: &[Vec2], inner: &[Vec2], color: Color) {
        let first = self.vertices.len() as u32;
        let n = outer.len().min(inner.len()) as u32;
        for (&o, &i) in outer.iter().zip(inner) {
            self.add_vertex(o, color);
            self.add_vertex(i, color);
        }
        for i in 0..n {
            let j = (i + 1) % n;
            let (oi, ii) = (first + i * 2, first + i * 2 + 1);
            let (oj, ij) = (first + j * 2, first + j * 2 + 1);
            self.add_tri(oi, ii, oj);
            self.add_tri(ii, oj, ij);
        }
    }
}

/// Sub-pixel phase of pen position `x`: which quarter of its pixel it falls in.
#[inline]
fn subpixel_phase(x: f32) -> u8 {
    (((x - x.floor()) * SUBPIXEL_STEPS).floor() as u8).min(SUBPIXEL_PHASES - 1)
}

/// One segment per pixel of arc length, at least one. `None` for empty arcs.
fn arc_steps(radius: f32, start_angle: f32, end_angle: f32) -> Option<(u32, f32)> {
    let sweep = end_angle - start_angle;
    let length = (sweep * radius).abs();
    if !length.is_finite() || length == 0.0 {
        return None;
    }

    let steps = length.ceil() as u32;
    Some((steps, sweep / steps as f32))
}

/// Clockwise outline of a rounded rectangle, `segments + 1` points per corner.
fn rounded_outline(min: Vec2, max: Vec2, radius: f32, segments: u32) -> Vec<Vec2> {
    let segments = segments.max(1);
    let corners = [
        (Vec2::new(max.x - radius, min.y + radius), -PI / 2.0), // Top-right
        (Vec2::new(max.x - radius, max.y - radius), 0.0),       // Bottom-right
        (Vec2::new(min.x + radius, max.y - radius), PI / 2.0),  // Bottom-left
        (Vec2::new(min.x + radius, min.y + radius), PI),        // Top-left
    ];

    let mut points = Vec::with_capacity(4 * (segments as usize + 1));
    for (center, start_angle) in corners {
        for i in 0..=segments {
            let angle = start_angle + (i as f32 / segments as f32) * (PI / 2.0);
            points.push(center + Vec2::new(angle.cos(), angle.sin()) * radius);
        }
    }
    points
}
