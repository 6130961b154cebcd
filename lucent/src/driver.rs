//! Driver interface.
//!
//! A [`Driver`] is the black box lucent talks to. Queries are side-effect free reads; mutations
//! are one-way calls with no failure channel, exactly like the OpenGL entry points they stand
//! for. A driver is assumed to wrap a context that is already current on the calling thread.
//!
//! Every entry point comes in the flavours the dispatch layer may select from: a bind-to-edit
//! flavour (`buffer_data`, `texture_parameter`, …) that acts on whatever object is bound to a
//! target, and, where the API offers one, a direct-state-access flavour (`named_*`) acting on an
//! object by handle.

use bitflags::bitflags;

use crate::buffer::BufferUsage;
use crate::mesh::{IndexType, Primitive, VertexAttribute};
use crate::program::UniformValue;
use crate::texture::{PixelFormat, TextureParameter};

/// Opaque driver object name.
///
/// [`Handle::NONE`] (`0`) stands for “no object” or “the default object”, depending on the
/// target.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Handle(u32);

impl Handle {
  /// The null / default object.
  pub const NONE: Handle = Handle(0);

  /// Wrap a raw driver name.
  #[inline]
  pub const fn new(raw: u32) -> Self {
    Handle(raw)
  }

  /// Raw driver name.
  #[inline]
  pub const fn raw(self) -> u32 {
    self.0
  }

  /// Whether this is [`Handle::NONE`].
  #[inline]
  pub const fn is_none(self) -> bool {
    self.0 == 0
  }
}

/// Kind of driver object.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResourceKind {
  /// Buffer objects.
  Buffer,
  /// Texture objects.
  Texture,
  /// Framebuffer objects.
  Framebuffer,
  /// Vertex array objects.
  VertexArray,
  /// Shader programs.
  Program,
}

/// Binding target.
///
/// Each target belongs to exactly one [`ResourceKind`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Target {
  /// Vertex attribute data.
  ArrayBuffer,
  /// Vertex indices.
  ElementArrayBuffer,
  /// Uniform block storage.
  UniformBuffer,
  /// Source of buffer copies.
  CopyReadBuffer,
  /// Destination of buffer copies.
  CopyWriteBuffer,
  /// 1D textures.
  Texture1D,
  /// 2D textures.
  Texture2D,
  /// 3D textures.
  Texture3D,
  /// Layered 2D textures.
  Texture2DArray,
  /// Framebuffer drawn into.
  DrawFramebuffer,
  /// Framebuffer read from.
  ReadFramebuffer,
  /// Vertex array object.
  VertexArray,
  /// Program in use.
  Program,
}

impl Target {
  /// Kind of object this target accepts.
  pub fn kind(self) -> ResourceKind {
    match self {
      Target::ArrayBuffer
      | Target::ElementArrayBuffer
      | Target::UniformBuffer
      | Target::CopyReadBuffer
      | Target::CopyWriteBuffer => ResourceKind::Buffer,
      Target::Texture1D | Target::Texture2D | Target::Texture3D | Target::Texture2DArray => {
        ResourceKind::Texture
      }
      Target::DrawFramebuffer | Target::ReadFramebuffer => ResourceKind::Framebuffer,
      Target::VertexArray => ResourceKind::VertexArray,
      Target::Program => ResourceKind::Program,
    }
  }
}

/// Viewport rectangle.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Rect {
  /// Left edge.
  pub x: i32,
  /// Bottom edge.
  pub y: i32,
  /// Width.
  pub width: u32,
  /// Height.
  pub height: u32,
}

impl Rect {
  /// Build a rectangle from its origin and size.
  pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
    Rect {
      x,
      y,
      width,
      height,
    }
  }
}

/// Implementation-defined limits.
///
/// Limits never change during the lifetime of a context, which is what makes memoizing them
/// sound.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Limit {
  /// Largest 1D / 2D texture edge.
  MaxTextureSize,
  /// Largest 3D texture edge.
  Max3DTextureSize,
  /// Largest number of layers of an array texture.
  MaxArrayTextureLayers,
  /// Number of texture layers (units) usable at once.
  MaxTextureLayers,
  /// Number of color attachments of a framebuffer.
  MaxColorAttachments,
  /// Number of simultaneous draw buffers.
  MaxDrawBuffers,
  /// Number of vertex attributes.
  MaxVertexAttributes,
  /// Number of uniform buffer binding points.
  MaxUniformBufferBindings,
}

impl Limit {
  /// Every limit, in declaration order.
  pub const ALL: [Limit; 8] = [
    Limit::MaxTextureSize,
    Limit::Max3DTextureSize,
    Limit::MaxArrayTextureLayers,
    Limit::MaxTextureLayers,
    Limit::MaxColorAttachments,
    Limit::MaxDrawBuffers,
    Limit::MaxVertexAttributes,
    Limit::MaxUniformBufferBindings,
  ];
}

bitflags! {
  /// Flags the context was created with.
  ///
  /// Bits match `GL_CONTEXT_FLAGS`.
  pub struct ContextFlags: u32 {
    /// Forward-compatible context.
    const FORWARD_COMPATIBLE = 0x1;
    /// Debug context.
    const DEBUG = 0x2;
    /// Robust buffer access.
    const ROBUST_ACCESS = 0x4;
    /// Errors are not generated.
    const NO_ERROR = 0x8;
  }
}

bitflags! {
  /// Buffers a clear operates on.
  pub struct ClearMask: u8 {
    /// Color buffers.
    const COLOR = 0x1;
    /// Depth buffer.
    const DEPTH = 0x2;
    /// Stencil buffer.
    const STENCIL = 0x4;
  }
}

/// Framebuffer attachment point.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Attachment {
  /// Color attachment `n`.
  Color(u32),
  /// Depth attachment.
  Depth,
  /// Stencil attachment.
  Stencil,
  /// Combined depth and stencil attachment.
  DepthStencil,
}

/// Completeness status of a framebuffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FramebufferStatus {
  /// Ready to be used.
  Complete,
  /// An attachment is incomplete.
  IncompleteAttachment,
  /// No image is attached.
  IncompleteMissingAttachment,
  /// A draw buffer points to no attachment.
  IncompleteDrawBuffer,
  /// The read buffer points to no attachment.
  IncompleteReadBuffer,
  /// Attachments have mismatching sample counts.
  IncompleteMultisample,
  /// Attachments have mismatching layering.
  IncompleteLayerTargets,
  /// The combination of formats is not supported.
  Unsupported,
  /// The default framebuffer doesn’t exist.
  Undefined,
}

/// The driver surface lucent is built on.
pub trait Driver {
  /// `GL_VENDOR`.
  fn vendor(&self) -> String;

  /// `GL_RENDERER`.
  fn renderer(&self) -> String;

  /// `GL_VERSION`.
  fn version_string(&self) -> String;

  /// `GL_MAJOR_VERSION` and `GL_MINOR_VERSION`, when the driver can report them as integers.
  ///
  /// Old drivers can’t; the version is then parsed out of [`Driver::version_string`].
  fn version_numbers(&self) -> Option<(u32, u32)>;

  /// `GL_CONTEXT_FLAGS`. Only queried on 3.0+ contexts.
  fn context_flags(&self) -> ContextFlags;

  /// Number of individually enumerable extensions, or [`None`] if the driver only exposes the
  /// space-separated extension string.
  fn extension_count(&self) -> Option<usize>;

  /// Name of the `index`-th extension.
  fn extension_name(&self, index: usize) -> String;

  /// Space-separated list of every extension name.
  fn extension_list(&self) -> String;

  /// Value of an implementation-defined limit.
  fn limit(&self, limit: Limit) -> i32;

  /// Viewport currently set on the driver.
  fn viewport(&self) -> Rect;

  /// Reserve a name for an object; the object itself is created when first bound.
  fn gen(&mut self, kind: ResourceKind) -> Handle;

  /// Create an object usable without binding, typed after `target`.
  fn create(&mut self, target: Target) -> Handle;

  /// Delete an object. Bindings of that object revert to [`Handle::NONE`].
  fn delete(&mut self, kind: ResourceKind, handle: Handle);

  /// Bind an object to a target. Texture targets bind to the active layer.
  fn bind(&mut self, target: Target, handle: Handle);

  /// Select the active texture layer.
  fn active_layer(&mut self, layer: u32);

  /// Bind a texture to a layer without touching the active layer.
  fn bind_layer(&mut self, layer: u32, texture: Handle);

  /// Bind consecutive layers starting at `first` in one call. [`Handle::NONE`] unbinds.
  fn bind_layers(&mut self, first: u32, textures: &[Handle]);

  /// Set the viewport.
  fn set_viewport(&mut self, viewport: Rect);

  /// Set the clear color.
  fn set_clear_color(&mut self, color: [f32; 4]);

  /// Clear the buffers of the bound draw framebuffer.
  fn clear(&mut self, mask: ClearMask);

  /// (Re)allocate the storage of the buffer bound to `target`.
  fn buffer_data(&mut self, target: Target, data: &[u8], usage: BufferUsage);

  /// (Re)allocate the storage of a buffer.
  fn named_buffer_data(&mut self, buffer: Handle, data: &[u8], usage: BufferUsage);

  /// Update a range of the buffer bound to `target`.
  fn buffer_sub_data(&mut self, target: Target, offset: usize, data: &[u8]);

  /// Update a range of a buffer.
  fn named_buffer_sub_data(&mut self, buffer: Handle, offset: usize, data: &[u8]);

  /// Set a parameter of the texture bound to `target` on the active layer.
  fn texture_parameter(&mut self, target: Target, parameter: TextureParameter);

  /// Set a parameter of a texture.
  fn named_texture_parameter(&mut self, texture: Handle, parameter: TextureParameter);

  /// Allocate immutable storage for the texture bound to `target`.
  fn texture_storage(&mut self, target: Target, levels: u32, format: PixelFormat, size: [u32; 3]);

  /// Allocate immutable storage for a texture.
  fn named_texture_storage(
    &mut self,
    texture: Handle,
    levels: u32,
    format: PixelFormat,
    size: [u32; 3],
  );

  /// Allocate one mutable level of the texture bound to `target`, leaving it uninitialized.
  fn texture_image(&mut self, target: Target, level: u32, format: PixelFormat, size: [u32; 3]);

  /// Upload texels into a region of the texture bound to `target`.
  fn texture_sub_image(
    &mut self,
    target: Target,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    texels: &[u8],
  );

  /// Upload texels into a region of a texture.
  fn named_texture_sub_image(
    &mut self,
    texture: Handle,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    texels: &[u8],
  );

  /// Read a whole level of the texture bound to `target`. The driver trusts `out` to be large
  /// enough.
  fn read_texture_image(&mut self, target: Target, level: u32, format: PixelFormat, out: &mut [u8]);

  /// Same as [`Driver::read_texture_image`] but never writes past `out`.
  fn read_texture_image_robust(
    &mut self,
    target: Target,
    level: u32,
    format: PixelFormat,
    out: &mut [u8],
  );

  /// Read a whole level of a texture, never writing past `out`.
  fn read_named_texture_image(
    &mut self,
    texture: Handle,
    level: u32,
    format: PixelFormat,
    out: &mut [u8],
  );

  /// Attach a texture level to the framebuffer bound to `target`.
  fn framebuffer_texture(
    &mut self,
    target: Target,
    attachment: Attachment,
    texture: Handle,
    level: u32,
  );

  /// Attach a texture level to a framebuffer.
  fn named_framebuffer_texture(
    &mut self,
    framebuffer: Handle,
    attachment: Attachment,
    texture: Handle,
    level: u32,
  );

  /// Completeness of the framebuffer bound to `target`.
  fn framebuffer_status(&mut self, target: Target) -> FramebufferStatus;

  /// Completeness of a framebuffer, as it would be if bound to `target`.
  fn named_framebuffer_status(&mut self, framebuffer: Handle, target: Target) -> FramebufferStatus;

  /// Describe a vertex attribute sourced from the bound array buffer, recorded into the bound
  /// vertex array if any.
  fn vertex_attribute(&mut self, attribute: &VertexAttribute);

  /// Describe a vertex attribute of a vertex array, sourced from `buffer`.
  fn vertex_array_attribute(
    &mut self,
    vertex_array: Handle,
    buffer: Handle,
    attribute: &VertexAttribute,
  );

  /// Draw `count` vertices starting at `first`.
  fn draw_arrays(&mut self, primitive: Primitive, first: usize, count: usize);

  /// Draw `count` indexed vertices, indices starting at byte `offset` in the element buffer.
  fn draw_elements(&mut self, primitive: Primitive, count: usize, index_type: IndexType, offset: usize);

  /// Same as [`Driver::draw_elements`], adding `base_vertex` to every index.
  fn draw_elements_base_vertex(
    &mut self,
    primitive: Primitive,
    count: usize,
    index_type: IndexType,
    offset: usize,
    base_vertex: i32,
  );

  /// Set a uniform of the program in use.
  fn uniform(&mut self, location: i32, value: &UniformValue);

  /// Set a uniform of a program.
  fn program_uniform(&mut self, program: Handle, location: i32, value: &UniformValue);
}
