//! A scripted driver recording every call it receives.
//!
//! [`StubDriver`] reports whatever version, strings, extensions and limits it is configured with,
//! and logs mutations (and limit queries) as [`Call`]s. The log is shared: grab a [`CallLog`]
//! with [`StubDriver::calls`] before moving the driver into a context, and inspect it afterwards.
//!
//! ```
//! use lucent::context::Context;
//! use lucent::opt::ContextOpt;
//! use lucent::stub::{Call, StubDriver};
//! use lucent::version::Version;
//!
//! let driver = StubDriver::new(Version::GL33);
//! let calls = driver.calls();
//! let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
//!
//! ctx.set_clear_color([0., 0., 0., 1.]);
//! ctx.set_clear_color([0., 0., 0., 1.]);
//!
//! assert_eq!(calls.count(|c| matches!(c, Call::ClearColor(_))), 1);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::buffer::BufferUsage;
use crate::driver::{
  Attachment, ClearMask, ContextFlags, Driver, FramebufferStatus, Handle, Limit, Rect,
  ResourceKind, Target,
};
use crate::mesh::{IndexType, Primitive, VertexAttribute};
use crate::program::UniformValue;
use crate::texture::{PixelFormat, TextureParameter};
use crate::version::Version;

/// A recorded driver call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
  /// `Driver::gen`.
  Gen(ResourceKind, Handle),
  /// `Driver::create`.
  Create(Target, Handle),
  /// `Driver::delete`.
  Delete(ResourceKind, Handle),
  /// `Driver::bind`.
  Bind(Target, Handle),
  /// `Driver::active_layer`.
  ActiveLayer(u32),
  /// `Driver::bind_layer`.
  BindLayer(u32, Handle),
  /// `Driver::bind_layers`.
  BindLayers(u32, Vec<Handle>),
  /// `Driver::set_viewport`.
  Viewport(Rect),
  /// `Driver::set_clear_color`.
  ClearColor([f32; 4]),
  /// `Driver::clear`.
  Clear(ClearMask),
  /// `Driver::buffer_data`; the data is reduced to its size.
  BufferData {
    target: Target,
    size: usize,
    usage: BufferUsage,
  },
  /// `Driver::named_buffer_data`.
  NamedBufferData {
    buffer: Handle,
    size: usize,
    usage: BufferUsage,
  },
  /// `Driver::buffer_sub_data`.
  BufferSubData {
    target: Target,
    offset: usize,
    size: usize,
  },
  /// `Driver::named_buffer_sub_data`.
  NamedBufferSubData {
    buffer: Handle,
    offset: usize,
    size: usize,
  },
  /// `Driver::texture_parameter`.
  TextureParameter(Target, TextureParameter),
  /// `Driver::named_texture_parameter`.
  NamedTextureParameter(Handle, TextureParameter),
  /// `Driver::texture_storage`.
  TextureStorage {
    target: Target,
    levels: u32,
    format: PixelFormat,
    size: [u32; 3],
  },
  /// `Driver::named_texture_storage`.
  NamedTextureStorage {
    texture: Handle,
    levels: u32,
    format: PixelFormat,
    size: [u32; 3],
  },
  /// `Driver::texture_image`.
  TextureImage {
    target: Target,
    level: u32,
    size: [u32; 3],
  },
  /// `Driver::texture_sub_image`.
  TextureSubImage {
    target: Target,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
  },
  /// `Driver::named_texture_sub_image`.
  NamedTextureSubImage {
    texture: Handle,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
  },
  /// `Driver::read_texture_image`.
  ReadTextureImage {
    target: Target,
    level: u32,
  },
  /// `Driver::read_texture_image_robust`; `size` is the output length.
  ReadTextureImageRobust {
    target: Target,
    level: u32,
    size: usize,
  },
  /// `Driver::read_named_texture_image`.
  ReadNamedTextureImage {
    texture: Handle,
    level: u32,
    size: usize,
  },
  /// `Driver::framebuffer_texture`.
  FramebufferTexture {
    target: Target,
    attachment: Attachment,
    texture: Handle,
    level: u32,
  },
  /// `Driver::named_framebuffer_texture`.
  NamedFramebufferTexture {
    framebuffer: Handle,
    attachment: Attachment,
    texture: Handle,
    level: u32,
  },
  /// `Driver::framebuffer_status`.
  FramebufferStatus(Target),
  /// `Driver::named_framebuffer_status`.
  NamedFramebufferStatus(Handle, Target),
  /// `Driver::vertex_attribute`.
  VertexAttribute(VertexAttribute),
  /// `Driver::vertex_array_attribute`.
  VertexArrayAttribute {
    vertex_array: Handle,
    buffer: Handle,
    attribute: VertexAttribute,
  },
  /// `Driver::draw_arrays`.
  DrawArrays {
    primitive: Primitive,
    first: usize,
    count: usize,
  },
  /// `Driver::draw_elements`.
  DrawElements {
    primitive: Primitive,
    count: usize,
    index_type: IndexType,
    offset: usize,
  },
  /// `Driver::draw_elements_base_vertex`.
  DrawElementsBaseVertex {
    primitive: Primitive,
    count: usize,
    index_type: IndexType,
    offset: usize,
    base_vertex: i32,
  },
  /// `Driver::uniform`.
  Uniform(i32, UniformValue),
  /// `Driver::program_uniform`.
  ProgramUniform(Handle, i32, UniformValue),
  /// `Driver::limit`.
  Limit(Limit),
}

/// Shared view on the calls a [`StubDriver`] received.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
  fn push(&self, call: Call) {
    self.0.borrow_mut().push(call);
  }

  /// Copy of every call so far.
  pub fn snapshot(&self) -> Vec<Call> {
    self.0.borrow().clone()
  }

  /// Drain the log.
  pub fn take(&self) -> Vec<Call> {
    self.0.borrow_mut().drain(..).collect()
  }

  /// Forget every call so far.
  pub fn clear(&self) {
    self.0.borrow_mut().clear();
  }

  /// Number of calls so far.
  pub fn len(&self) -> usize {
    self.0.borrow().len()
  }

  /// Whether no call was made.
  pub fn is_empty(&self) -> bool {
    self.0.borrow().is_empty()
  }

  /// Number of calls matching `pred`.
  pub fn count<F>(&self, pred: F) -> usize
  where
    F: Fn(&Call) -> bool,
  {
    self.0.borrow().iter().filter(|c| pred(c)).count()
  }

  /// Whether `call` was made.
  pub fn contains(&self, call: &Call) -> bool {
    self.0.borrow().contains(call)
  }
}

#[derive(Clone, Debug)]
enum StubVersion {
  Numbers(u32, u32),
  // old drivers only report the version string
  StringOnly,
}

/// A driver made of canned answers.
#[derive(Clone, Debug)]
pub struct StubDriver {
  version: StubVersion,
  version_string: String,
  vendor: String,
  renderer: String,
  flags: ContextFlags,
  extensions: Vec<String>,
  indexed_extensions: bool,
  limits: HashMap<Limit, i32>,
  viewport: Rect,
  framebuffer_status: FramebufferStatus,
  next_name: u32,
  free_names: Vec<u32>,
  calls: CallLog,
}

impl Default for StubDriver {
  /// An OpenGL 3.3 driver without extensions.
  fn default() -> Self {
    StubDriver::new(Version::GL33)
  }
}

impl StubDriver {
  /// A driver reporting `version` as integers and enumerating extensions one by one.
  pub fn new(version: Version) -> Self {
    let (major, minor) = version.numbers();
    let limits = [
      (Limit::MaxTextureSize, 16384),
      (Limit::Max3DTextureSize, 2048),
      (Limit::MaxArrayTextureLayers, 2048),
      (Limit::MaxTextureLayers, 32),
      (Limit::MaxColorAttachments, 8),
      (Limit::MaxDrawBuffers, 8),
      (Limit::MaxVertexAttributes, 16),
      (Limit::MaxUniformBufferBindings, 36),
    ];

    StubDriver {
      version: StubVersion::Numbers(major, minor),
      version_string: format!("{}.{} lucent stub", major, minor),
      vendor: "lucent".to_owned(),
      renderer: "stub".to_owned(),
      flags: ContextFlags::empty(),
      extensions: Vec::new(),
      indexed_extensions: true,
      limits: limits.iter().copied().collect(),
      viewport: Rect::new(0, 0, 800, 600),
      framebuffer_status: FramebufferStatus::Complete,
      next_name: 1,
      free_names: Vec::new(),
      calls: CallLog::default(),
    }
  }

  /// A driver only able to report its version as a string, and its extensions as a single
  /// space-separated list.
  pub fn legacy(version_string: impl Into<String>) -> Self {
    StubDriver {
      version: StubVersion::StringOnly,
      version_string: version_string.into(),
      indexed_extensions: false,
      ..StubDriver::new(Version::MINIMUM)
    }
  }

  /// Advertise extensions, by driver name.
  pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.extensions.extend(extensions.into_iter().map(Into::into));
    self
  }

  /// Report extensions through the space-separated list only.
  pub fn with_extension_string(mut self) -> Self {
    self.indexed_extensions = false;
    self
  }

  /// Set the vendor string.
  pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
    self.vendor = vendor.into();
    self
  }

  /// Set the renderer string.
  pub fn with_renderer(mut self, renderer: impl Into<String>) -> Self {
    self.renderer = renderer.into();
    self
  }

  /// Set the version string; integers reported by [`StubDriver::new`] are kept.
  pub fn with_version_string(mut self, version_string: impl Into<String>) -> Self {
    self.version_string = version_string.into();
    self
  }

  /// Set the context flags.
  pub fn with_flags(mut self, flags: ContextFlags) -> Self {
    self.flags = flags;
    self
  }

  /// Override a limit.
  pub fn with_limit(mut self, limit: Limit, value: i32) -> Self {
    self.limits.insert(limit, value);
    self
  }

  /// Set the initial viewport.
  pub fn with_viewport(mut self, viewport: Rect) -> Self {
    self.viewport = viewport;
    self
  }

  /// Status reported for every framebuffer.
  pub fn with_framebuffer_status(mut self, status: FramebufferStatus) -> Self {
    self.framebuffer_status = status;
    self
  }

  /// Shared handle on the call log.
  pub fn calls(&self) -> CallLog {
    self.calls.clone()
  }

  fn name(&mut self) -> Handle {
    let raw = self.free_names.pop().unwrap_or_else(|| {
      let raw = self.next_name;
      self.next_name += 1;
      raw
    });

    Handle::new(raw)
  }
}

impl Driver for StubDriver {
  fn vendor(&self) -> String {
    self.vendor.clone()
  }

  fn renderer(&self) -> String {
    self.renderer.clone()
  }

  fn version_string(&self) -> String {
    self.version_string.clone()
  }

  fn version_numbers(&self) -> Option<(u32, u32)> {
    match self.version {
      StubVersion::Numbers(major, minor) => Some((major, minor)),
      StubVersion::StringOnly => None,
    }
  }

  fn context_flags(&self) -> ContextFlags {
    self.flags
  }

  fn extension_count(&self) -> Option<usize> {
    if self.indexed_extensions {
      Some(self.extensions.len())
    } else {
      None
    }
  }

  fn extension_name(&self, index: usize) -> String {
    self.extensions.get(index).cloned().unwrap_or_default()
  }

  fn extension_list(&self) -> String {
    self.extensions.join(" ")
  }

  fn limit(&self, limit: Limit) -> i32 {
    self.calls.push(Call::Limit(limit));
    self.limits.get(&limit).copied().unwrap_or(0)
  }

  fn viewport(&self) -> Rect {
    self.viewport
  }

  fn gen(&mut self, kind: ResourceKind) -> Handle {
    let handle = self.name();
    self.calls.push(Call::Gen(kind, handle));
    handle
  }

  fn create(&mut self, target: Target) -> Handle {
    let handle = self.name();
    self.calls.push(Call::Create(target, handle));
    handle
  }

  fn delete(&mut self, kind: ResourceKind, handle: Handle) {
    self.calls.push(Call::Delete(kind, handle));
    self.free_names.push(handle.raw());
  }

  fn bind(&mut self, target: Target, handle: Handle) {
    self.calls.push(Call::Bind(target, handle));
  }

  fn active_layer(&mut self, layer: u32) {
    self.calls.push(Call::ActiveLayer(layer));
  }

  fn bind_layer(&mut self, layer: u32, texture: Handle) {
    self.calls.push(Call::BindLayer(layer, texture));
  }

  fn bind_layers(&mut self, first: u32, textures: &[Handle]) {
    self.calls.push(Call::BindLayers(first, textures.to_vec()));
  }

  fn set_viewport(&mut self, viewport: Rect) {
    self.viewport = viewport;
    self.calls.push(Call::Viewport(viewport));
  }

  fn set_clear_color(&mut self, color: [f32; 4]) {
    self.calls.push(Call::ClearColor(color));
  }

  fn clear(&mut self, mask: ClearMask) {
    self.calls.push(Call::Clear(mask));
  }

  fn buffer_data(&mut self, target: Target, data: &[u8], usage: BufferUsage) {
    self.calls.push(Call::BufferData {
      target,
      size: data.len(),
      usage,
    });
  }

  fn named_buffer_data(&mut self, buffer: Handle, data: &[u8], usage: BufferUsage) {
    self.calls.push(Call::NamedBufferData {
      buffer,
      size: data.len(),
      usage,
    });
  }

  fn buffer_sub_data(&mut self, target: Target, offset: usize, data: &[u8]) {
    self.calls.push(Call::BufferSubData {
      target,
      offset,
      size: data.len(),
    });
  }

  fn named_buffer_sub_data(&mut self, buffer: Handle, offset: usize, data: &[u8]) {
    self.calls.push(Call::NamedBufferSubData {
      buffer,
      offset,
      size: data.len(),
    });
  }

  fn texture_parameter(&mut self, target: Target, parameter: TextureParameter) {
    self.calls.push(Call::TextureParameter(target, parameter));
  }

  fn named_texture_parameter(&mut self, texture: Handle, parameter: TextureParameter) {
    self.calls.push(Call::NamedTextureParameter(texture, parameter));
  }

  fn texture_storage(&mut self, target: Target, levels: u32, format: PixelFormat, size: [u32; 3]) {
    self.calls.push(Call::TextureStorage {
      target,
      levels,
      format,
      size,
    });
  }

  fn named_texture_storage(
    &mut self,
    texture: Handle,
    levels: u32,
    format: PixelFormat,
    size: [u32; 3],
  ) {
    self.calls.push(Call::NamedTextureStorage {
      texture,
      levels,
      format,
      size,
    });
  }

  fn texture_image(&mut self, target: Target, level: u32, _: PixelFormat, size: [u32; 3]) {
    self.calls.push(Call::TextureImage {
      target,
      level,
      size,
    });
  }

  fn texture_sub_image(
    &mut self,
    target: Target,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    _: PixelFormat,
    _: &[u8],
  ) {
    self.calls.push(Call::TextureSubImage {
      target,
      level,
      offset,
      size,
    });
  }

  fn named_texture_sub_image(
    &mut self,
    texture: Handle,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    _: PixelFormat,
    _: &[u8],
  ) {
    self.calls.push(Call::NamedTextureSubImage {
      texture,
      level,
      offset,
      size,
    });
  }

  fn read_texture_image(&mut self, target: Target, level: u32, _: PixelFormat, _: &mut [u8]) {
    self.calls.push(Call::ReadTextureImage { target, level });
  }

  fn read_texture_image_robust(
    &mut self,
    target: Target,
    level: u32,
    _: PixelFormat,
    out: &mut [u8],
  ) {
    self.calls.push(Call::ReadTextureImageRobust {
      target,
      level,
      size: out.len(),
    });
  }

  fn read_named_texture_image(
    &mut self,
    texture: Handle,
    level: u32,
    _: PixelFormat,
    out: &mut [u8],
  ) {
    self.calls.push(Call::ReadNamedTextureImage {
      texture,
      level,
      size: out.len(),
    });
  }

  fn framebuffer_texture(
    &mut self,
    target: Target,
    attachment: Attachment,
    texture: Handle,
    level: u32,
  ) {
    self.calls.push(Call::FramebufferTexture {
      target,
      attachment,
      texture,
      level,
    });
  }

  fn named_framebuffer_texture(
    &mut self,
    framebuffer: Handle,
    attachment: Attachment,
    texture: Handle,
    level: u32,
  ) {
    self.calls.push(Call::NamedFramebufferTexture {
      framebuffer,
      attachment,
      texture,
      level,
    });
  }

  fn framebuffer_status(&mut self, target: Target) -> FramebufferStatus {
    self.calls.push(Call::FramebufferStatus(target));
    self.framebuffer_status
  }

  fn named_framebuffer_status(&mut self, framebuffer: Handle, target: Target) -> FramebufferStatus {
    self.calls.push(Call::NamedFramebufferStatus(framebuffer, target));
    self.framebuffer_status
  }

  fn vertex_attribute(&mut self, attribute: &VertexAttribute) {
    self.calls.push(Call::VertexAttribute(*attribute));
  }

  fn vertex_array_attribute(
    &mut self,
    vertex_array: Handle,
    buffer: Handle,
    attribute: &VertexAttribute,
  ) {
    self.calls.push(Call::VertexArrayAttribute {
      vertex_array,
      buffer,
      attribute: *attribute,
    });
  }

  fn draw_arrays(&mut self, primitive: Primitive, first: usize, count: usize) {
    self.calls.push(Call::DrawArrays {
      primitive,
      first,
      count,
    });
  }

  fn draw_elements(&mut self, primitive: Primitive, count: usize, index_type: IndexType, offset: usize) {
    self.calls.push(Call::DrawElements {
      primitive,
      count,
      index_type,
      offset,
    });
  }

  fn draw_elements_base_vertex(
    &mut self,
    primitive: Primitive,
    count: usize,
    index_type: IndexType,
    offset: usize,
    base_vertex: i32,
  ) {
    self.calls.push(Call::DrawElementsBaseVertex {
      primitive,
      count,
      index_type,
      offset,
      base_vertex,
    });
  }

  fn uniform(&mut self, location: i32, value: &UniformValue) {
    self.calls.push(Call::Uniform(location, *value));
  }

  fn program_uniform(&mut self, program: Handle, location: i32, value: &UniformValue) {
    self.calls.push(Call::ProgramUniform(program, location, *value));
  }
}
