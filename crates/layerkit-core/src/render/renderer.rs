//! CPU renderer for scenes of textured planes.
//!
//! # Algorithm
//!
//! Meshes are drawn back to front (ascending Z, insertion order for ties).
//! For each mesh, every drawing-buffer pixel inside its screen-space bounding
//! box is mapped back to the plane's local space with the inverse of the
//! mesh transform:
//!
//! ```text
//! world = view_origin + (px / buffer_w * view_w, -py / buffer_h * view_h)
//! local = inverse(scale * rotate * translate) * world
//! ```
//!
//! With antialiasing, coverage is estimated from four sub-pixel samples while
//! the colour is sampled once at the pixel centre, like multisampling on a GPU.
//! Colour is kept premultiplied in `f32` until it is read back.

use std::collections::HashMap;

use glam::Vec2;
use image::{Rgba, RgbaImage};

use super::texture::{linear_to_srgb, srgb_to_linear};
use super::{ColorSpace, MagFilter, Mesh, MinFilter, OrthographicCamera, Scene, Texture, TextureId};
use crate::canvas::Canvas;
use crate::decode::DecodedImage;

/// Four-sample rotated grid, in pixels from the pixel centre.
const MSAA_OFFSETS: [Vec2; 4] = [
    Vec2::new(-0.375, -0.125),
    Vec2::new(0.125, -0.375),
    Vec2::new(0.375, 0.125),
    Vec2::new(-0.125, 0.375),
];
const CENTRE_OFFSET: [Vec2; 1] = [Vec2::ZERO];

/// Below this level of detail a texture is treated as magnified.
const MAGNIFICATION_LOD: f32 = 1e-4;

/// Construction-time switches, fixed for the renderer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RendererOptions {
    /// Estimate edge coverage with multiple samples per pixel.
    pub antialias: bool,
    /// Keep an alpha channel in the drawing buffer; otherwise it is opaque.
    pub alpha: bool,
    /// Keep the drawing buffer after it is read back; otherwise reading it
    /// presents the frame and clears the buffer.
    pub preserve_drawing_buffer: bool,
}

/// Limits reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererCapabilities {
    max_anisotropy: u32,
}

impl Default for RendererCapabilities {
    fn default() -> Self {
        Self { max_anisotropy: 16 }
    }
}

impl RendererCapabilities {
    pub fn max_anisotropy(&self) -> u32 {
        self.max_anisotropy
    }
}

/// A texture after upload: premultiplied texels in the output colour
/// encoding, plus its mip chain.
#[derive(Debug)]
struct UploadedTexture {
    version: u64,
    levels: Vec<MipLevel>,
}

#[derive(Debug)]
struct MipLevel {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

/// Renders a [`Scene`] through an [`OrthographicCamera`] into an RGBA buffer.
#[derive(Debug)]
pub struct Renderer {
    options: RendererOptions,
    capabilities: RendererCapabilities,
    pixel_ratio: f64,
    pub output_color_space: ColorSpace,
    clear_color: [f32; 4],
    size: (f64, f64),
    buffer_size: (u32, u32),
    frame: Vec<[f32; 4]>,
    textures: HashMap<TextureId, UploadedTexture>,
}

impl Renderer {
    pub fn new(options: RendererOptions) -> Self {
        Self {
            options,
            capabilities: RendererCapabilities::default(),
            pixel_ratio: 1.0,
            output_color_space: ColorSpace::Srgb,
            clear_color: [0.0; 4],
            size: (0.0, 0.0),
            buffer_size: (0, 0),
            frame: Vec::new(),
            textures: HashMap::new(),
        }
    }

    pub fn options(&self) -> RendererOptions {
        self.options
    }

    pub fn capabilities(&self) -> RendererCapabilities {
        self.capabilities
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Set the ratio of drawing-buffer pixels to logical pixels.
    pub fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
        let (w, h) = self.size;
        self.set_size(w, h);
    }

    /// Resize to `width` x `height` logical pixels. Clears the buffer.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = (width.max(0.0), height.max(0.0));
        let bw = (self.size.0 * self.pixel_ratio).round() as u32;
        let bh = (self.size.1 * self.pixel_ratio).round() as u32;
        self.buffer_size = (bw, bh);
        self.frame = vec![[0.0; 4]; bw as usize * bh as usize];
        self.clear();
    }

    /// Logical size as last passed to [`set_size`](Self::set_size).
    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        self.buffer_size
    }

    /// Colour the buffer is cleared to. Alpha is ignored without an alpha channel.
    pub fn set_clear_color(&mut self, rgb: [f32; 3], alpha: f32) {
        self.clear_color = [rgb[0], rgb[1], rgb[2], alpha.clamp(0.0, 1.0)];
    }

    pub fn clear(&mut self) {
        let a = if self.options.alpha { self.clear_color[3] } else { 1.0 };
        let fill = [
            self.clear_color[0] * a,
            self.clear_color[1] * a,
            self.clear_color[2] * a,
            a,
        ];
        self.frame.fill(fill);
    }

    /// Number of textures currently uploaded.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Draw `scene` as seen by `camera`, replacing the previous frame.
    pub fn render(&mut self, scene: &Scene, camera: &OrthographicCamera) {
        self.clear();
        self.sync_textures(scene);

        let (bw, bh) = self.buffer_size;
        if bw == 0 || bh == 0 {
            return;
        }

        let mut meshes: Vec<&Mesh> = scene
            .meshes()
            .filter(|m| m.visible && camera.contains_depth(m.position.z))
            .collect();
        meshes.sort_by(|a, b| a.position.z.total_cmp(&b.position.z));

        let mut target = Target {
            frame: &mut self.frame,
            width: bw,
            height: bh,
            view: View::new(camera, bw, bh),
            samples: if self.options.antialias {
                &MSAA_OFFSETS
            } else {
                &CENTRE_OFFSET
            },
        };

        for mesh in meshes {
            let texture = mesh
                .material
                .map
                .as_ref()
                .and_then(|t| self.textures.get(&t.id()).map(|u| (t, u)));
            target.draw_mesh(mesh, texture);
        }
    }

    /// Read the drawing buffer back as straight-alpha RGBA.
    ///
    /// Without `preserve_drawing_buffer` the frame is presented by this call
    /// and the buffer is cleared afterwards.
    pub fn read_pixels(&mut self) -> DecodedImage {
        DecodedImage::from_rgba_image(self.present())
    }

    /// Read the drawing buffer into a new canvas.
    pub fn to_canvas(&mut self) -> Canvas {
        Canvas::from_rgba_image(self.present())
    }

    fn present(&mut self) -> RgbaImage {
        let (bw, bh) = self.buffer_size;
        let frame = &self.frame;
        let image = RgbaImage::from_fn(bw, bh, |x, y| {
            let idx = y as usize * bw as usize + x as usize;
            Rgba(frame.get(idx).map_or([0; 4], |px| unpremultiply_to_u8(*px)))
        });

        if !self.options.preserve_drawing_buffer {
            self.clear();
        }
        image
    }

    /// Upload new or changed textures and drop ones no longer in the scene.
    fn sync_textures(&mut self, scene: &Scene) {
        let mut live = Vec::new();
        for texture in scene.meshes().filter_map(|m| m.material.map.as_ref()) {
            live.push(texture.id());
            let stale = self
                .textures
                .get(&texture.id())
                .is_none_or(|u| u.version != texture.version());
            if stale {
                let uploaded = upload(texture, self.output_color_space);
                log::trace!(
                    "uploaded texture {:?} v{} ({} levels)",
                    texture.id(),
                    texture.version(),
                    uploaded.levels.len()
                );
                self.textures.insert(texture.id(), uploaded);
            }
        }
        self.textures.retain(|id, _| live.contains(id));
    }
}

/// Renderer configured for high-quality, exportable output.
///
/// Antialiased, with an alpha channel and a preserved drawing buffer so the
/// frame can be read back, sRGB output, and a pixel ratio of at least 2.
pub fn create_renderer(device_pixel_ratio: f64) -> Renderer {
    let mut renderer = Renderer::new(RendererOptions {
        antialias: true,
        alpha: true,
        preserve_drawing_buffer: true,
    });
    renderer.set_pixel_ratio(device_pixel_ratio.max(2.0));
    renderer.output_color_space = ColorSpace::Srgb;
    renderer
}

/// The camera's visible rectangle in world space, mapped onto the buffer.
#[derive(Debug, Clone, Copy)]
struct View {
    origin: Vec2,
    extent: Vec2,
    buffer: Vec2,
}

impl View {
    fn new(camera: &OrthographicCamera, width: u32, height: u32) -> Self {
        let origin = Vec2::new(
            camera.position.x + camera.left,
            camera.position.y + camera.top,
        );
        let extent = Vec2::new(camera.right - camera.left, camera.top - camera.bottom);
        Self {
            origin,
            extent,
            buffer: Vec2::new(width as f32, height as f32),
        }
    }

    fn to_world(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(
            self.origin.x + pixel.x / self.buffer.x * self.extent.x,
            self.origin.y - pixel.y / self.buffer.y * self.extent.y,
        )
    }

    fn to_pixel(&self, world: Vec2) -> Vec2 {
        Vec2::new(
            (world.x - self.origin.x) / self.extent.x * self.buffer.x,
            (self.origin.y - world.y) / self.extent.y * self.buffer.y,
        )
    }

    /// World units per buffer pixel along each axis.
    fn world_per_pixel(&self) -> Vec2 {
        self.extent / self.buffer
    }
}

struct Target<'a> {
    frame: &'a mut [[f32; 4]],
    width: u32,
    height: u32,
    view: View,
    samples: &'a [Vec2],
}

impl Target<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh, texture: Option<(&Texture, &UploadedTexture)>) {
        let transform = mesh.world_transform();
        if transform.matrix2.determinant().abs() <= f32::EPSILON {
            return;
        }
        let inverse = transform.inverse();

        let Some((x0, y0, x1, y1)) = self.pixel_bounds(mesh) else {
            return;
        };

        let material = &mesh.material;
        let opacity = material.effective_opacity();
        let tint = [
            material.color[0] as f32 / 255.0,
            material.color[1] as f32 / 255.0,
            material.color[2] as f32 / 255.0,
        ];
        let sampler = texture.map(|(t, u)| Sampler::new(t, u, mesh, &self.view));
        let n = self.samples.len() as f32;

        for py in y0..y1 {
            for px in x0..x1 {
                let centre = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);

                let covered = self
                    .samples
                    .iter()
                    .filter(|&&offset| {
                        let local = inverse.transform_point2(self.view.to_world(centre + offset));
                        mesh.geometry.contains(local)
                    })
                    .count();
                if covered == 0 {
                    continue;
                }
                let coverage = covered as f32 / n;

                let local = inverse.transform_point2(self.view.to_world(centre));
                let uv = mesh.geometry.uv(local).clamp(Vec2::ZERO, Vec2::ONE);
                let texel = sampler.as_ref().map_or([1.0; 4], |s| s.sample(uv));

                let weight = opacity * coverage;
                let src = [
                    texel[0] * tint[0] * weight,
                    texel[1] * tint[1] * weight,
                    texel[2] * tint[2] * weight,
                    texel[3] * weight,
                ];

                let dst = &mut self.frame[py as usize * self.width as usize + px as usize];
                let keep = 1.0 - src[3];
                for i in 0..4 {
                    dst[i] = src[i] + dst[i] * keep;
                }
            }
        }
    }

    /// Buffer-pixel rectangle `[x0, x1) x [y0, y1)` touched by the mesh.
    fn pixel_bounds(&self, mesh: &Mesh) -> Option<(u32, u32, u32, u32)> {
        let corners = mesh.world_corners().map(|c| self.view.to_pixel(c));
        let min = corners.iter().fold(Vec2::splat(f32::INFINITY), |a, &c| a.min(c));
        let max = corners.iter().fold(Vec2::splat(f32::NEG_INFINITY), |a, &c| a.max(c));

        let x0 = (min.x.floor() - 1.0).max(0.0) as u32;
        let y0 = (min.y.floor() - 1.0).max(0.0) as u32;
        let x1 = ((max.x.ceil() + 1.0).max(0.0) as u32).min(self.width);
        let y1 = ((max.y.ceil() + 1.0).max(0.0) as u32).min(self.height);

        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

/// Per-mesh sampling state: the filter choice depends only on the mesh's
/// on-screen scale, which is constant across an affine plane.
struct Sampler<'a> {
    levels: &'a [MipLevel],
    mode: SampleMode,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SampleMode {
    Nearest,
    Bilinear { level: usize },
    Trilinear { level: usize, blend: f32 },
}

impl<'a> Sampler<'a> {
    fn new(texture: &Texture, uploaded: &'a UploadedTexture, mesh: &Mesh, view: &View) -> Self {
        let levels = uploaded.levels.as_slice();
        let lod = level_of_detail(texture, mesh, view);
        let last = levels.len().saturating_sub(1);

        let mode = if lod <= MAGNIFICATION_LOD {
            match texture.mag_filter {
                MagFilter::Nearest => SampleMode::Nearest,
                MagFilter::Linear => SampleMode::Bilinear { level: 0 },
            }
        } else {
            match texture.min_filter {
                MinFilter::Nearest => SampleMode::Nearest,
                MinFilter::Linear => SampleMode::Bilinear { level: 0 },
                MinFilter::LinearMipmapNearest => SampleMode::Bilinear {
                    level: (lod.round() as usize).min(last),
                },
                MinFilter::LinearMipmapLinear => {
                    let level = (lod.floor() as usize).min(last);
                    let blend = if level < last { lod.fract() } else { 0.0 };
                    SampleMode::Trilinear { level, blend }
                }
            }
        };

        Self { levels, mode }
    }

    fn sample(&self, uv: Vec2) -> [f32; 4] {
        match self.mode {
            SampleMode::Nearest => sample_nearest(&self.levels[0], uv),
            SampleMode::Bilinear { level } => sample_bilinear(&self.levels[level], uv),
            SampleMode::Trilinear { level, blend } => {
                let a = sample_bilinear(&self.levels[level], uv);
                if blend <= 0.0 {
                    return a;
                }
                let b = sample_bilinear(&self.levels[level + 1], uv);
                std::array::from_fn(|i| a[i] + (b[i] - a[i]) * blend)
            }
        }
    }
}

/// log2 of texels per pixel, sharpened along the minor axis by anisotropy.
fn level_of_detail(texture: &Texture, mesh: &Mesh, view: &View) -> f32 {
    let image = texture.image();
    let per_pixel = view.world_per_pixel();
    let tx = per_pixel.x / mesh.scale.x.abs() * image.width as f32 / mesh.geometry.width;
    let ty = per_pixel.y / mesh.scale.y.abs() * image.height as f32 / mesh.geometry.height;

    let (major, minor) = (tx.max(ty), tx.min(ty));
    if !(major.is_finite() && minor > 0.0) {
        return 0.0;
    }
    let ratio = (major / minor).min(texture.anisotropy.max(1) as f32);
    (major / ratio).log2()
}

fn upload(texture: &Texture, output: ColorSpace) -> UploadedTexture {
    let image = texture.image();
    let convert = transfer_for(texture.color_space, output);

    let texels = image
        .pixels
        .chunks_exact(4)
        .map(|px| {
            let a = px[3] as f32 / 255.0;
            let c = |v: u8| convert(v as f32 / 255.0) * a;
            [c(px[0]), c(px[1]), c(px[2]), a]
        })
        .collect();

    let mut levels = vec![MipLevel {
        width: image.width.max(1),
        height: image.height.max(1),
        texels,
    }];
    if image.is_empty() {
        levels[0].texels = vec![[0.0; 4]];
    }

    if texture.generate_mipmaps && texture.min_filter.uses_mipmaps() {
        while let Some(next) = levels.last().and_then(downsample) {
            levels.push(next);
        }
    }

    UploadedTexture {
        version: texture.version(),
        levels,
    }
}

fn transfer_for(from: ColorSpace, to: ColorSpace) -> fn(f32) -> f32 {
    match (from, to) {
        (ColorSpace::LinearSrgb, ColorSpace::Srgb) => linear_to_srgb,
        (ColorSpace::Srgb, ColorSpace::LinearSrgb) => srgb_to_linear,
        _ => |v| v,
    }
}

/// 2x2 box filter to the next mip level; `None` once 1x1 is reached.
fn downsample(level: &MipLevel) -> Option<MipLevel> {
    if level.width == 1 && level.height == 1 {
        return None;
    }
    let (w, h) = ((level.width / 2).max(1), (level.height / 2).max(1));
    let mut texels = Vec::with_capacity(w as usize * h as usize);

    for y in 0..h {
        for x in 0..w {
            let mut sum = [0.0f32; 4];
            let mut n = 0.0;
            for (sx, sy) in [(2 * x, 2 * y), (2 * x + 1, 2 * y), (2 * x, 2 * y + 1), (2 * x + 1, 2 * y + 1)] {
                if sx < level.width && sy < level.height {
                    let t = level.texels[(sy * level.width + sx) as usize];
                    for i in 0..4 {
                        sum[i] += t[i];
                    }
                    n += 1.0;
                }
            }
            texels.push(sum.map(|v| v / n));
        }
    }

    Some(MipLevel {
        width: w,
        height: h,
        texels,
    })
}

#[inline]
fn texel(level: &MipLevel, x: i64, y: i64) -> [f32; 4] {
    let x = x.clamp(0, level.width as i64 - 1) as usize;
    let y = y.clamp(0, level.height as i64 - 1) as usize;
    level.texels[y * level.width as usize + x]
}

fn sample_nearest(level: &MipLevel, uv: Vec2) -> [f32; 4] {
    let x = (uv.x * level.width as f32).floor() as i64;
    let y = (uv.y * level.height as f32).floor() as i64;
    texel(level, x, y)
}

/// Bilinear sample with clamp-to-edge addressing.
fn sample_bilinear(level: &MipLevel, uv: Vec2) -> [f32; 4] {
    let x = uv.x * level.width as f32 - 0.5;
    let y = uv.y * level.height as f32 - 0.5;
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = texel(level, x0, y0);
    let p10 = texel(level, x0 + 1, y0);
    let p01 = texel(level, x0, y0 + 1);
    let p11 = texel(level, x0 + 1, y0 + 1);

    std::array::from_fn(|i| {
        p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy
    })
}

fn unpremultiply_to_u8(px: [f32; 4]) -> [u8; 4] {
    let a = px[3].clamp(0.0, 1.0);
    if a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let c = |v: f32| ((v / a).clamp(0.0, 1.0) * 255.0).round() as u8;
    [c(px[0]), c(px[1]), c(px[2]), (a * 255.0).round() as u8]
}
