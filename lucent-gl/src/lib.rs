//! OpenGL driver.
//!
//! This crate implements the [lucent](https://crates.io/crates/lucent) [`Driver`] interface on top
//! of the [gl](https://crates.io/crates/gl) bindings. Which entry points get called is decided by
//! lucent; this crate only translates arguments.
//!
//! A [`GlDriver`] must be created after an OpenGL context was made current on the calling
//! thread, with [`GlDriver::load_with`] and the windowing library’s symbol loader:
//!
//! ```ignore
//! let driver = unsafe { GlDriver::load_with(|s| window.get_proc_address(s) as _) };
//! let ctx = Context::new(driver, ContextOpt::from_env())?;
//! ```

use gl::types::*;
use lucent::buffer::BufferUsage;
use lucent::driver::{
  Attachment, ClearMask, ContextFlags, Driver, FramebufferStatus, Handle, Limit, Rect,
  ResourceKind, Target,
};
use lucent::mesh::{AttributeType, IndexType, Primitive, VertexAttribute};
use lucent::program::UniformValue;
use lucent::texture::{MagFilter, MinFilter, PixelFormat, TextureParameter, Wrap};
use std::{ffi::CStr, marker::PhantomData, os::raw::c_char, os::raw::c_void, ptr};

/// The OpenGL driver.
///
/// Every method assumes the OpenGL context the driver was loaded for is current on the calling
/// thread, which is why the type is neither [`Send`] nor [`Sync`].
#[derive(Debug)]
pub struct GlDriver {
  _a: PhantomData<*const ()>, // !Send and !Sync
}

impl GlDriver {
  /// Load OpenGL symbols with `loader` and create the driver.
  ///
  /// # Safety
  ///
  /// An OpenGL context must be current on the calling thread, and must stay current for as long
  /// as the driver is used.
  pub unsafe fn load_with<F>(loader: F) -> Self
  where
    F: FnMut(&'static str) -> *const c_void,
  {
    gl::load_with(loader);
    GlDriver { _a: PhantomData }
  }

  /// Create the driver, assuming OpenGL symbols were already loaded.
  ///
  /// # Safety
  ///
  /// Same as [`GlDriver::load_with`]; symbols must also have been loaded beforehand.
  pub unsafe fn new() -> Self {
    GlDriver { _a: PhantomData }
  }
}

fn get_string(name: GLenum) -> String {
  unsafe {
    let s = gl::GetString(name);

    if s.is_null() {
      String::new()
    } else {
      CStr::from_ptr(s as *const c_char)
        .to_string_lossy()
        .into_owned()
    }
  }
}

fn get_integer(name: GLenum) -> GLint {
  let mut value = 0;
  unsafe { gl::GetIntegerv(name, &mut value) };
  value
}

// dimension of a texture object, needed by entry points working by handle
fn texture_target(texture: Handle) -> GLenum {
  let mut target = 0;
  unsafe { gl::GetTextureParameteriv(texture.raw(), gl::TEXTURE_TARGET, &mut target) };
  target as GLenum
}

fn set_tight_packing() {
  unsafe {
    gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
    gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
  }
}

impl Driver for GlDriver {
  fn vendor(&self) -> String {
    get_string(gl::VENDOR)
  }

  fn renderer(&self) -> String {
    get_string(gl::RENDERER)
  }

  fn version_string(&self) -> String {
    get_string(gl::VERSION)
  }

  fn version_numbers(&self) -> Option<(u32, u32)> {
    let major = get_integer(gl::MAJOR_VERSION);
    let minor = get_integer(gl::MINOR_VERSION);

    // pre-3.0 contexts reject the query with GL_INVALID_ENUM; swallow it
    unsafe { gl::GetError() };

    if major > 0 {
      Some((major as u32, minor.max(0) as u32))
    } else {
      None
    }
  }

  fn context_flags(&self) -> ContextFlags {
    ContextFlags::from_bits_truncate(get_integer(gl::CONTEXT_FLAGS) as u32)
  }

  fn extension_count(&self) -> Option<usize> {
    self
      .version_numbers()
      .map(|_| get_integer(gl::NUM_EXTENSIONS).max(0) as usize)
  }

  fn extension_name(&self, index: usize) -> String {
    unsafe {
      let s = gl::GetStringi(gl::EXTENSIONS, index as GLuint);

      if s.is_null() {
        String::new()
      } else {
        CStr::from_ptr(s as *const c_char)
          .to_string_lossy()
          .into_owned()
      }
    }
  }

  fn extension_list(&self) -> String {
    get_string(gl::EXTENSIONS)
  }

  fn limit(&self, limit: Limit) -> i32 {
    get_integer(opengl_limit(limit))
  }

  fn viewport(&self) -> Rect {
    let mut viewport = [0; 4];
    unsafe { gl::GetIntegerv(gl::VIEWPORT, viewport.as_mut_ptr()) };

    Rect::new(
      viewport[0],
      viewport[1],
      viewport[2].max(0) as u32,
      viewport[3].max(0) as u32,
    )
  }

  fn gen(&mut self, kind: ResourceKind) -> Handle {
    let mut handle: GLuint = 0;

    unsafe {
      match kind {
        ResourceKind::Buffer => gl::GenBuffers(1, &mut handle),
        ResourceKind::Texture => gl::GenTextures(1, &mut handle),
        ResourceKind::Framebuffer => gl::GenFramebuffers(1, &mut handle),
        ResourceKind::VertexArray => gl::GenVertexArrays(1, &mut handle),
        ResourceKind::Program => handle = gl::CreateProgram(),
      }
    }

    Handle::new(handle)
  }

  fn create(&mut self, target: Target) -> Handle {
    let mut handle: GLuint = 0;

    unsafe {
      match target.kind() {
        ResourceKind::Buffer => gl::CreateBuffers(1, &mut handle),
        ResourceKind::Texture => gl::CreateTextures(opengl_target(target), 1, &mut handle),
        ResourceKind::Framebuffer => gl::CreateFramebuffers(1, &mut handle),
        ResourceKind::VertexArray => gl::CreateVertexArrays(1, &mut handle),
        ResourceKind::Program => handle = gl::CreateProgram(),
      }
    }

    Handle::new(handle)
  }

  fn delete(&mut self, kind: ResourceKind, handle: Handle) {
    let handle = handle.raw();

    unsafe {
      match kind {
        ResourceKind::Buffer => gl::DeleteBuffers(1, &handle),
        ResourceKind::Texture => gl::DeleteTextures(1, &handle),
        ResourceKind::Framebuffer => gl::DeleteFramebuffers(1, &handle),
        ResourceKind::VertexArray => gl::DeleteVertexArrays(1, &handle),
        ResourceKind::Program => gl::DeleteProgram(handle),
      }
    }
  }

  fn bind(&mut self, target: Target, handle: Handle) {
    let handle = handle.raw();

    unsafe {
      match target.kind() {
        ResourceKind::Buffer => gl::BindBuffer(opengl_target(target), handle),
        ResourceKind::Texture => gl::BindTexture(opengl_target(target), handle),
        ResourceKind::Framebuffer => gl::BindFramebuffer(opengl_target(target), handle),
        ResourceKind::VertexArray => gl::BindVertexArray(handle),
        ResourceKind::Program => gl::UseProgram(handle),
      }
    }
  }

  fn active_layer(&mut self, layer: u32) {
    unsafe { gl::ActiveTexture(gl::TEXTURE0 + layer) };
  }

  fn bind_layer(&mut self, layer: u32, texture: Handle) {
    unsafe { gl::BindTextureUnit(layer, texture.raw()) };
  }

  fn bind_layers(&mut self, first: u32, textures: &[Handle]) {
    let handles: Vec<GLuint> = textures.iter().map(|h| h.raw()).collect();
    unsafe { gl::BindTextures(first, gl_count(handles.len()), handles.as_ptr()) };
  }

  fn set_viewport(&mut self, viewport: Rect) {
    unsafe {
      gl::Viewport(
        viewport.x,
        viewport.y,
        viewport.width as GLsizei,
        viewport.height as GLsizei,
      )
    };
  }

  fn set_clear_color(&mut self, color: [f32; 4]) {
    unsafe { gl::ClearColor(color[0], color[1], color[2], color[3]) };
  }

  fn clear(&mut self, mask: ClearMask) {
    let mut bits = 0;

    if mask.contains(ClearMask::COLOR) {
      bits |= gl::COLOR_BUFFER_BIT;
    }

    if mask.contains(ClearMask::DEPTH) {
      bits |= gl::DEPTH_BUFFER_BIT;
    }

    if mask.contains(ClearMask::STENCIL) {
      bits |= gl::STENCIL_BUFFER_BIT;
    }

    unsafe { gl::Clear(bits) };
  }

  fn buffer_data(&mut self, target: Target, data: &[u8], usage: BufferUsage) {
    unsafe {
      gl::BufferData(
        opengl_target(target),
        data.len() as GLsizeiptr,
        data.as_ptr() as *const c_void,
        opengl_usage(usage),
      )
    };
  }

  fn named_buffer_data(&mut self, buffer: Handle, data: &[u8], usage: BufferUsage) {
    unsafe {
      gl::NamedBufferData(
        buffer.raw(),
        data.len() as GLsizeiptr,
        data.as_ptr() as *const c_void,
        opengl_usage(usage),
      )
    };
  }

  fn buffer_sub_data(&mut self, target: Target, offset: usize, data: &[u8]) {
    unsafe {
      gl::BufferSubData(
        opengl_target(target),
        offset as GLintptr,
        data.len() as GLsizeiptr,
        data.as_ptr() as *const c_void,
      )
    };
  }

  fn named_buffer_sub_data(&mut self, buffer: Handle, offset: usize, data: &[u8]) {
    unsafe {
      gl::NamedBufferSubData(
        buffer.raw(),
        offset as GLintptr,
        data.len() as GLsizeiptr,
        data.as_ptr() as *const c_void,
      )
    };
  }

  fn texture_parameter(&mut self, target: Target, parameter: TextureParameter) {
    let (name, value) = opengl_texture_parameter(parameter);
    unsafe { gl::TexParameteri(opengl_target(target), name, value) };
  }

  fn named_texture_parameter(&mut self, texture: Handle, parameter: TextureParameter) {
    let (name, value) = opengl_texture_parameter(parameter);
    unsafe { gl::TextureParameteri(texture.raw(), name, value) };
  }

  fn texture_storage(&mut self, target: Target, levels: u32, format: PixelFormat, size: [u32; 3]) {
    let internal = opengl_pixel_format(format).0;
    let [w, h, d] = size.map(|x| x as GLsizei);
    let levels = levels as GLsizei;
    let target = opengl_target(target);

    unsafe {
      match target {
        gl::TEXTURE_1D => gl::TexStorage1D(target, levels, internal, w),
        gl::TEXTURE_2D => gl::TexStorage2D(target, levels, internal, w, h),
        _ => gl::TexStorage3D(target, levels, internal, w, h, d),
      }
    }
  }

  fn named_texture_storage(
    &mut self,
    texture: Handle,
    levels: u32,
    format: PixelFormat,
    size: [u32; 3],
  ) {
    let internal = opengl_pixel_format(format).0;
    let [w, h, d] = size.map(|x| x as GLsizei);
    let levels = levels as GLsizei;
    let t = texture.raw();

    unsafe {
      match texture_target(texture) {
        gl::TEXTURE_1D => gl::TextureStorage1D(t, levels, internal, w),
        gl::TEXTURE_2D => gl::TextureStorage2D(t, levels, internal, w, h),
        _ => gl::TextureStorage3D(t, levels, internal, w, h, d),
      }
    }
  }

  fn texture_image(&mut self, target: Target, level: u32, format: PixelFormat, size: [u32; 3]) {
    let (internal, fmt, ty) = opengl_pixel_format(format);
    let [w, h, d] = size.map(|x| x as GLsizei);
    let level = level as GLint;
    let internal = internal as GLint;
    let target = opengl_target(target);

    unsafe {
      match target {
        gl::TEXTURE_1D => gl::TexImage1D(target, level, internal, w, 0, fmt, ty, ptr::null()),
        gl::TEXTURE_2D => gl::TexImage2D(target, level, internal, w, h, 0, fmt, ty, ptr::null()),
        _ => gl::TexImage3D(target, level, internal, w, h, d, 0, fmt, ty, ptr::null()),
      }
    }
  }

  fn texture_sub_image(
    &mut self,
    target: Target,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    texels: &[u8],
  ) {
    let (_, fmt, ty) = opengl_pixel_format(format);
    let [x, y, z] = offset.map(|x| x as GLint);
    let [w, h, d] = size.map(|x| x as GLsizei);
    let level = level as GLint;
    let target = opengl_target(target);
    let texels = texels.as_ptr() as *const c_void;

    set_tight_packing();

    unsafe {
      match target {
        gl::TEXTURE_1D => gl::TexSubImage1D(target, level, x, w, fmt, ty, texels),
        gl::TEXTURE_2D => gl::TexSubImage2D(target, level, x, y, w, h, fmt, ty, texels),
        _ => gl::TexSubImage3D(target, level, x, y, z, w, h, d, fmt, ty, texels),
      }
    }
  }

  fn named_texture_sub_image(
    &mut self,
    texture: Handle,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    texels: &[u8],
  ) {
    let (_, fmt, ty) = opengl_pixel_format(format);
    let [x, y, z] = offset.map(|x| x as GLint);
    let [w, h, d] = size.map(|x| x as GLsizei);
    let level = level as GLint;
    let t = texture.raw();
    let texels = texels.as_ptr() as *const c_void;

    set_tight_packing();

    unsafe {
      match texture_target(texture) {
        gl::TEXTURE_1D => gl::TextureSubImage1D(t, level, x, w, fmt, ty, texels),
        gl::TEXTURE_2D => gl::TextureSubImage2D(t, level, x, y, w, h, fmt, ty, texels),
        _ => gl::TextureSubImage3D(t, level, x, y, z, w, h, d, fmt, ty, texels),
      }
    }
  }

  fn read_texture_image(&mut self, target: Target, level: u32, format: PixelFormat, out: &mut [u8]) {
    let (_, fmt, ty) = opengl_pixel_format(format);
    set_tight_packing();

    unsafe {
      gl::GetTexImage(
        opengl_target(target),
        level as GLint,
        fmt,
        ty,
        out.as_mut_ptr() as *mut c_void,
      )
    };
  }

  fn read_texture_image_robust(
    &mut self,
    target: Target,
    level: u32,
    format: PixelFormat,
    out: &mut [u8],
  ) {
    let (_, fmt, ty) = opengl_pixel_format(format);
    set_tight_packing();

    unsafe {
      gl::GetnTexImage(
        opengl_target(target),
        level as GLint,
        fmt,
        ty,
        gl_count(out.len()),
        out.as_mut_ptr() as *mut c_void,
      )
    };
  }

  fn read_named_texture_image(
    &mut self,
    texture: Handle,
    level: u32,
    format: PixelFormat,
    out: &mut [u8],
  ) {
    let (_, fmt, ty) = opengl_pixel_format(format);
    set_tight_packing();

    unsafe {
      gl::GetTextureImage(
        texture.raw(),
        level as GLint,
        fmt,
        ty,
        gl_count(out.len()),
        out.as_mut_ptr() as *mut c_void,
      )
    };
  }

  fn framebuffer_texture(
    &mut self,
    target: Target,
    attachment: Attachment,
    texture: Handle,
    level: u32,
  ) {
    unsafe {
      gl::FramebufferTexture(
        opengl_target(target),
        opengl_attachment(attachment),
        texture.raw(),
        level as GLint,
      )
    };
  }

  fn named_framebuffer_texture(
    &mut self,
    framebuffer: Handle,
    attachment: Attachment,
    texture: Handle,
    level: u32,
  ) {
    unsafe {
      gl::NamedFramebufferTexture(
        framebuffer.raw(),
        opengl_attachment(attachment),
        texture.raw(),
        level as GLint,
      )
    };
  }

  fn framebuffer_status(&mut self, target: Target) -> FramebufferStatus {
    let status = unsafe { gl::CheckFramebufferStatus(opengl_target(target)) };
    framebuffer_status(status)
  }

  fn named_framebuffer_status(&mut self, framebuffer: Handle, target: Target) -> FramebufferStatus {
    let status = unsafe { gl::CheckNamedFramebufferStatus(framebuffer.raw(), opengl_target(target)) };
    framebuffer_status(status)
  }

  fn vertex_attribute(&mut self, attribute: &VertexAttribute) {
    let kind = opengl_attribute_type(attribute.kind);
    let offset = attribute.offset as *const c_void;
    let stride = attribute.stride as GLsizei;
    let components = GLint::from(attribute.components);

    unsafe {
      gl::EnableVertexAttribArray(attribute.index);

      if is_integral(attribute) {
        gl::VertexAttribIPointer(attribute.index, components, kind, stride, offset);
      } else {
        gl::VertexAttribPointer(
          attribute.index,
          components,
          kind,
          opengl_bool(attribute.normalized),
          stride,
          offset,
        );
      }
    }
  }

  fn vertex_array_attribute(
    &mut self,
    vertex_array: Handle,
    buffer: Handle,
    attribute: &VertexAttribute,
  ) {
    let vao = vertex_array.raw();
    let index = attribute.index;
    let kind = opengl_attribute_type(attribute.kind);
    let components = GLint::from(attribute.components);

    // one buffer binding point per attribute, named after it
    unsafe {
      gl::EnableVertexArrayAttrib(vao, index);
      gl::VertexArrayVertexBuffer(
        vao,
        index,
        buffer.raw(),
        attribute.offset as GLintptr,
        attribute.stride as GLsizei,
      );

      if is_integral(attribute) {
        gl::VertexArrayAttribIFormat(vao, index, components, kind, 0);
      } else {
        gl::VertexArrayAttribFormat(
          vao,
          index,
          components,
          kind,
          opengl_bool(attribute.normalized),
          0,
        );
      }

      gl::VertexArrayAttribBinding(vao, index, index);
    }
  }

  fn draw_arrays(&mut self, primitive: Primitive, first: usize, count: usize) {
    unsafe { gl::DrawArrays(opengl_primitive(primitive), first as GLint, count as GLsizei) };
  }

  fn draw_elements(&mut self, primitive: Primitive, count: usize, index_type: IndexType, offset: usize) {
    unsafe {
      gl::DrawElements(
        opengl_primitive(primitive),
        count as GLsizei,
        opengl_index_type(index_type),
        offset as *const c_void,
      )
    };
  }

  fn draw_elements_base_vertex(
    &mut self,
    primitive: Primitive,
    count: usize,
    index_type: IndexType,
    offset: usize,
    base_vertex: i32,
  ) {
    unsafe {
      gl::DrawElementsBaseVertex(
        opengl_primitive(primitive),
        count as GLsizei,
        opengl_index_type(index_type),
        offset as *const c_void,
        base_vertex,
      )
    };
  }

  fn uniform(&mut self, location: i32, value: &UniformValue) {
    unsafe {
      match *value {
        UniformValue::Int(x) => gl::Uniform1i(location, x),
        UniformValue::UInt(x) => gl::Uniform1ui(location, x),
        UniformValue::Float(x) => gl::Uniform1f(location, x),
        UniformValue::Vec2(ref v) => gl::Uniform2fv(location, 1, v.as_ptr()),
        UniformValue::Vec3(ref v) => gl::Uniform3fv(location, 1, v.as_ptr()),
        UniformValue::Vec4(ref v) => gl::Uniform4fv(location, 1, v.as_ptr()),
        UniformValue::Mat4(ref m) => {
          gl::UniformMatrix4fv(location, 1, gl::FALSE, m.as_ptr() as *const GLfloat)
        }
      }
    }
  }

  fn program_uniform(&mut self, program: Handle, location: i32, value: &UniformValue) {
    let p = program.raw();

    unsafe {
      match *value {
        UniformValue::Int(x) => gl::ProgramUniform1i(p, location, x),
        UniformValue::UInt(x) => gl::ProgramUniform1ui(p, location, x),
        UniformValue::Float(x) => gl::ProgramUniform1f(p, location, x),
        UniformValue::Vec2(ref v) => gl::ProgramUniform2fv(p, location, 1, v.as_ptr()),
        UniformValue::Vec3(ref v) => gl::ProgramUniform3fv(p, location, 1, v.as_ptr()),
        UniformValue::Vec4(ref v) => gl::ProgramUniform4fv(p, location, 1, v.as_ptr()),
        UniformValue::Mat4(ref m) => {
          gl::ProgramUniformMatrix4fv(p, location, 1, gl::FALSE, m.as_ptr() as *const GLfloat)
        }
      }
    }
  }
}

// saturating: the driver never reads or writes past the count it is given
fn gl_count(len: usize) -> GLsizei {
  GLsizei::try_from(len).unwrap_or(GLsizei::MAX)
}

fn opengl_bool(b: bool) -> GLboolean {
  if b {
    gl::TRUE
  } else {
    gl::FALSE
  }
}

fn is_integral(attribute: &VertexAttribute) -> bool {
  attribute.kind != AttributeType::F32 && !attribute.normalized
}

fn opengl_target(target: Target) -> GLenum {
  match target {
    Target::ArrayBuffer => gl::ARRAY_BUFFER,
    Target::ElementArrayBuffer => gl::ELEMENT_ARRAY_BUFFER,
    Target::UniformBuffer => gl::UNIFORM_BUFFER,
    Target::CopyReadBuffer => gl::COPY_READ_BUFFER,
    Target::CopyWriteBuffer => gl::COPY_WRITE_BUFFER,
    Target::Texture1D => gl::TEXTURE_1D,
    Target::Texture2D => gl::TEXTURE_2D,
    Target::Texture3D => gl::TEXTURE_3D,
    Target::Texture2DArray => gl::TEXTURE_2D_ARRAY,
    Target::DrawFramebuffer => gl::DRAW_FRAMEBUFFER,
    Target::ReadFramebuffer => gl::READ_FRAMEBUFFER,
    // not bound through a target enum
    Target::VertexArray | Target::Program => 0,
  }
}

fn opengl_limit(limit: Limit) -> GLenum {
  match limit {
    Limit::MaxTextureSize => gl::MAX_TEXTURE_SIZE,
    Limit::Max3DTextureSize => gl::MAX_3D_TEXTURE_SIZE,
    Limit::MaxArrayTextureLayers => gl::MAX_ARRAY_TEXTURE_LAYERS,
    Limit::MaxTextureLayers => gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS,
    Limit::MaxColorAttachments => gl::MAX_COLOR_ATTACHMENTS,
    Limit::MaxDrawBuffers => gl::MAX_DRAW_BUFFERS,
    Limit::MaxVertexAttributes => gl::MAX_VERTEX_ATTRIBS,
    Limit::MaxUniformBufferBindings => gl::MAX_UNIFORM_BUFFER_BINDINGS,
  }
}

fn opengl_usage(usage: BufferUsage) -> GLenum {
  match usage {
    BufferUsage::StreamDraw => gl::STREAM_DRAW,
    BufferUsage::StreamRead => gl::STREAM_READ,
    BufferUsage::StreamCopy => gl::STREAM_COPY,
    BufferUsage::StaticDraw => gl::STATIC_DRAW,
    BufferUsage::StaticRead => gl::STATIC_READ,
    BufferUsage::StaticCopy => gl::STATIC_COPY,
    BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
    BufferUsage::DynamicRead => gl::DYNAMIC_READ,
    BufferUsage::DynamicCopy => gl::DYNAMIC_COPY,
  }
}

// (internal format, format, type)
fn opengl_pixel_format(format: PixelFormat) -> (GLenum, GLenum, GLenum) {
  match format {
    PixelFormat::R8 => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
    PixelFormat::RG8 => (gl::RG8, gl::RG, gl::UNSIGNED_BYTE),
    PixelFormat::RGB8 => (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
    PixelFormat::RGBA8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
    PixelFormat::R32F => (gl::R32F, gl::RED, gl::FLOAT),
    PixelFormat::RG32F => (gl::RG32F, gl::RG, gl::FLOAT),
    PixelFormat::RGB32F => (gl::RGB32F, gl::RGB, gl::FLOAT),
    PixelFormat::RGBA32F => (gl::RGBA32F, gl::RGBA, gl::FLOAT),
    PixelFormat::Depth32F => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
    PixelFormat::Depth24Stencil8 => (
      gl::DEPTH24_STENCIL8,
      gl::DEPTH_STENCIL,
      gl::UNSIGNED_INT_24_8,
    ),
  }
}

fn opengl_wrap(wrap: Wrap) -> GLenum {
  match wrap {
    Wrap::ClampToEdge => gl::CLAMP_TO_EDGE,
    Wrap::Repeat => gl::REPEAT,
    Wrap::MirroredRepeat => gl::MIRRORED_REPEAT,
  }
}

fn opengl_min_filter(filter: MinFilter) -> GLenum {
  match filter {
    MinFilter::Nearest => gl::NEAREST,
    MinFilter::Linear => gl::LINEAR,
    MinFilter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
    MinFilter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
    MinFilter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
    MinFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
  }
}

fn opengl_mag_filter(filter: MagFilter) -> GLenum {
  match filter {
    MagFilter::Nearest => gl::NEAREST,
    MagFilter::Linear => gl::LINEAR,
  }
}

fn opengl_texture_parameter(parameter: TextureParameter) -> (GLenum, GLint) {
  match parameter {
    TextureParameter::MinFilter(f) => (gl::TEXTURE_MIN_FILTER, opengl_min_filter(f) as GLint),
    TextureParameter::MagFilter(f) => (gl::TEXTURE_MAG_FILTER, opengl_mag_filter(f) as GLint),
    TextureParameter::WrapS(w) => (gl::TEXTURE_WRAP_S, opengl_wrap(w) as GLint),
    TextureParameter::WrapT(w) => (gl::TEXTURE_WRAP_T, opengl_wrap(w) as GLint),
    TextureParameter::WrapR(w) => (gl::TEXTURE_WRAP_R, opengl_wrap(w) as GLint),
    TextureParameter::BaseLevel(l) => (gl::TEXTURE_BASE_LEVEL, l as GLint),
    TextureParameter::MaxLevel(l) => (gl::TEXTURE_MAX_LEVEL, l as GLint),
  }
}

fn opengl_attachment(attachment: Attachment) -> GLenum {
  match attachment {
    Attachment::Color(i) => gl::COLOR_ATTACHMENT0 + i,
    Attachment::Depth => gl::DEPTH_ATTACHMENT,
    Attachment::Stencil => gl::STENCIL_ATTACHMENT,
    Attachment::DepthStencil => gl::DEPTH_STENCIL_ATTACHMENT,
  }
}

fn framebuffer_status(status: GLenum) -> FramebufferStatus {
  match status {
    gl::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
    gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
    gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::IncompleteMissingAttachment,
    gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
    gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => FramebufferStatus::IncompleteReadBuffer,
    gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
    gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => FramebufferStatus::IncompleteLayerTargets,
    gl::FRAMEBUFFER_UNDEFINED => FramebufferStatus::Undefined,
    _ => FramebufferStatus::Unsupported,
  }
}

fn opengl_primitive(primitive: Primitive) -> GLenum {
  match primitive {
    Primitive::Points => gl::POINTS,
    Primitive::Lines => gl::LINES,
    Primitive::LineStrip => gl::LINE_STRIP,
    Primitive::Triangles => gl::TRIANGLES,
    Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
    Primitive::TriangleFan => gl::TRIANGLE_FAN,
  }
}

fn opengl_index_type(index_type: IndexType) -> GLenum {
  match index_type {
    IndexType::U8 => gl::UNSIGNED_BYTE,
    IndexType::U16 => gl::UNSIGNED_SHORT,
    IndexType::U32 => gl::UNSIGNED_INT,
  }
}

fn opengl_attribute_type(kind: AttributeType) -> GLenum {
  match kind {
    AttributeType::I8 => gl::BYTE,
    AttributeType::U8 => gl::UNSIGNED_BYTE,
    AttributeType::I16 => gl::SHORT,
    AttributeType::U16 => gl::UNSIGNED_SHORT,
    AttributeType::I32 => gl::INT,
    AttributeType::U32 => gl::UNSIGNED_INT,
    AttributeType::F32 => gl::FLOAT,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn targets_are_distinct() {
    let targets = [
      Target::ArrayBuffer,
      Target::ElementArrayBuffer,
      Target::UniformBuffer,
      Target::CopyReadBuffer,
      Target::CopyWriteBuffer,
      Target::Texture1D,
      Target::Texture2D,
      Target::Texture3D,
      Target::Texture2DArray,
      Target::DrawFramebuffer,
      Target::ReadFramebuffer,
    ];

    for (i, a) in targets.iter().enumerate() {
      for b in &targets[i + 1..] {
        assert_ne!(opengl_target(*a), opengl_target(*b), "{:?} / {:?}", a, b);
      }
    }
  }

  #[test]
  fn counts_saturate() {
    assert_eq!(gl_count(3), 3);
    assert_eq!(gl_count(usize::MAX), GLsizei::MAX);
  }

  #[test]
  fn attachments() {
    assert_eq!(opengl_attachment(Attachment::Color(0)), gl::COLOR_ATTACHMENT0);
    assert_eq!(opengl_attachment(Attachment::Color(3)), gl::COLOR_ATTACHMENT3);
    assert_eq!(
      opengl_attachment(Attachment::DepthStencil),
      gl::DEPTH_STENCIL_ATTACHMENT
    );
  }

  #[test]
  fn unknown_status_is_unsupported() {
    assert_eq!(
      framebuffer_status(gl::FRAMEBUFFER_COMPLETE),
      FramebufferStatus::Complete
    );
    assert_eq!(framebuffer_status(0), FramebufferStatus::Unsupported);
  }

  #[test]
  fn integral_attributes() {
    let mut attribute = VertexAttribute {
      index: 0,
      components: 4,
      kind: AttributeType::U8,
      normalized: true,
      stride: 4,
      offset: 0,
    };
    assert!(!is_integral(&attribute));

    attribute.normalized = false;
    assert!(is_integral(&attribute));

    attribute.kind = AttributeType::F32;
    assert!(!is_integral(&attribute));
  }

  #[test]
  fn texture_parameters() {
    assert_eq!(
      opengl_texture_parameter(TextureParameter::MaxLevel(3)),
      (gl::TEXTURE_MAX_LEVEL, 3)
    );
    assert_eq!(
      opengl_texture_parameter(TextureParameter::WrapS(Wrap::Repeat)),
      (gl::TEXTURE_WRAP_S, gl::REPEAT as GLint)
    );
  }
}
