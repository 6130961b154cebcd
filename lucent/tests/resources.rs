use lucent::buffer::{Buffer, BufferUsage};
use lucent::context::Context;
use lucent::driver::{Attachment, FramebufferStatus, Handle, Limit, Rect, ResourceKind, Target};
use lucent::framebuffer::{Framebuffer, FramebufferError};
use lucent::mesh::{AttributeType, IndexType, Mesh, Primitive, VertexAttribute};
use lucent::opt::ContextOpt;
use lucent::program::{Program, UniformValue};
use lucent::stub::{Call, StubDriver};
use lucent::texture::{
  bind_textures, Dim2, Dim2Array, Dim3, PixelFormat, Sampler, Texture, TextureError,
};
use lucent::version::Version;

type Texture2D = Texture<StubDriver, Dim2>;

fn context(driver: StubDriver) -> Context<StubDriver> {
  Context::new(driver, ContextOpt::default()).unwrap()
}

fn svga3d(version: Version) -> StubDriver {
  let (major, minor) = version.numbers();

  StubDriver::new(version)
    .with_vendor("VMware, Inc.")
    .with_renderer("SVGA3D; build: RELEASE; LLVM;")
    .with_version_string(format!("{}.{} (Core Profile) Mesa 20.0.8", major, minor))
}

#[test]
fn texture_bind_is_idempotent() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let texture = Texture2D::new(&mut ctx, Sampler::default());

  calls.clear();
  assert_eq!(texture.bind(0), Ok(true));
  assert_eq!(texture.bind(0), Ok(false));

  assert_eq!(
    calls.take(),
    vec![
      Call::ActiveLayer(0),
      Call::Bind(Target::Texture2D, texture.handle())
    ]
  );
  assert_eq!(
    ctx.state().layer_binding(0),
    Some((Target::Texture2D, texture.handle()))
  );
}

#[test]
fn editing_reuses_active_layer() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let mut texture = Texture2D::new(&mut ctx, Sampler::default());
  texture.bind(3).unwrap();

  calls.clear();
  texture
    .set_storage(1, PixelFormat::RGBA8, [4, 4])
    .unwrap();

  assert_eq!(calls.count(|c| matches!(c, Call::ActiveLayer(_) | Call::Bind(..))), 0);
  assert_eq!(ctx.state().active_layer(), Some(3));
}

#[test]
fn editing_uses_last_layer() {
  let driver = StubDriver::new(Version::GL33).with_limit(Limit::MaxTextureLayers, 16);
  let calls = driver.calls();
  let mut ctx = context(driver);

  calls.clear();
  let texture = Texture2D::new(&mut ctx, Sampler::default());

  assert!(calls.contains(&Call::ActiveLayer(15)));
  assert_eq!(
    ctx.state().layer_binding(15),
    Some((Target::Texture2D, texture.handle()))
  );
  assert_eq!(ctx.state().layer_binding(0), None);
}

#[test]
fn direct_bind_keeps_active_layer() {
  let driver = StubDriver::new(Version::GL45);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let texture = Texture2D::new(&mut ctx, Sampler::default());

  calls.clear();
  assert_eq!(texture.bind(2), Ok(true));
  assert_eq!(texture.bind(2), Ok(false));

  assert_eq!(calls.take(), vec![Call::BindLayer(2, texture.handle())]);
  assert_eq!(ctx.state().active_layer(), None);
}

#[test]
fn editing_switches_back_to_last_layer() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let u = Texture2D::new(&mut ctx, Sampler::default());
  let mut t = Texture2D::new(&mut ctx, Sampler::default());

  // t still sits on the last layer, but layer 0 is now active and holds u
  u.bind(0).unwrap();
  assert_eq!(ctx.state().layer_binding(31), Some((Target::Texture2D, t.handle())));

  calls.clear();
  t.set_storage(1, PixelFormat::RGBA8, [4, 4]).unwrap();

  let edits: Vec<_> = calls
    .take()
    .into_iter()
    .filter(|c| !matches!(c, Call::Limit(_)))
    .collect();
  assert_eq!(edits.first(), Some(&Call::ActiveLayer(31)));
  assert!(!edits.iter().any(|c| matches!(c, Call::Bind(..))));
  assert_eq!(ctx.state().active_layer(), Some(31));

  // later edits of t stay on the last layer without driver calls
  t.set_sub_image(0, [0, 0], [2, 2], &[0; 16]).unwrap();
  assert_eq!(calls.count(|c| matches!(c, Call::ActiveLayer(_) | Call::Bind(..))), 0);

  // u is still bound to layer 0
  assert_eq!(u.bind(0), Ok(false));
}

#[test]
fn layer_out_of_range() {
  let mut ctx = context(StubDriver::new(Version::GL33).with_limit(Limit::MaxTextureLayers, 8));
  let a = Texture2D::new(&mut ctx, Sampler::default());

  assert_eq!(
    a.bind(8),
    Err(TextureError::LayerOutOfRange { layer: 8, max: 8 })
  );
  assert_eq!(
    bind_textures(&mut ctx, 6, &[Some(a.binding()), None, None]),
    Err(TextureError::LayerOutOfRange { layer: 8, max: 8 })
  );
}

#[test]
fn multi_bind() {
  let driver = StubDriver::new(Version::GL44);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let a = Texture2D::new(&mut ctx, Sampler::default());
  let b = Texture::<StubDriver, Dim3>::new(&mut ctx, Sampler::default());
  let layers = [Some(a.binding()), None, Some(b.binding())];

  calls.clear();
  assert_eq!(bind_textures(&mut ctx, 1, &layers), Ok(true));
  assert_eq!(bind_textures(&mut ctx, 1, &layers), Ok(false));

  assert_eq!(
    calls.take(),
    vec![Call::BindLayers(1, vec![a.handle(), Handle::NONE, b.handle()])]
  );

  // single binds see what multi binds did
  assert_eq!(a.bind(1), Ok(false));
  assert_eq!(b.bind(3), Ok(false));
}

#[test]
fn multi_bind_fallback() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let a = Texture2D::new(&mut ctx, Sampler::default());
  let b = Texture2D::new(&mut ctx, Sampler::default());

  calls.clear();
  assert_eq!(
    bind_textures(&mut ctx, 0, &[Some(a.binding()), Some(b.binding())]),
    Ok(true)
  );
  assert_eq!(
    bind_textures(&mut ctx, 0, &[Some(a.binding()), Some(b.binding())]),
    Ok(false)
  );

  assert_eq!(
    calls.take(),
    vec![
      Call::ActiveLayer(0),
      Call::Bind(Target::Texture2D, a.handle()),
      Call::ActiveLayer(1),
      Call::Bind(Target::Texture2D, b.handle()),
    ]
  );

  // unbinding a known layer goes through its target
  calls.clear();
  assert_eq!(bind_textures(&mut ctx, 1, &[None]), Ok(true));
  assert_eq!(
    calls.take(),
    vec![Call::Bind(Target::Texture2D, Handle::NONE)]
  );
}

#[test]
fn storage_strategies() {
  {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = context(driver);
    let mut texture = Texture2D::new(&mut ctx, Sampler::default());
    texture.set_storage(3, PixelFormat::RGBA8, [8, 4]).unwrap();

    let levels: Vec<_> = calls
      .snapshot()
      .into_iter()
      .filter_map(|c| match c {
        Call::TextureImage { level, size, .. } => Some((level, size)),
        _ => None,
      })
      .collect();
    assert_eq!(levels, vec![(0, [8, 4, 1]), (1, [4, 2, 1]), (2, [2, 1, 1])]);
    assert_eq!(texture.levels(), Some(3));
  }

  {
    let driver = StubDriver::new(Version::GL42);
    let calls = driver.calls();
    let mut ctx = context(driver);
    let mut texture = Texture::<StubDriver, Dim2Array>::new(&mut ctx, Sampler::default());
    texture
      .set_storage(2, PixelFormat::R8, ([16, 16], 4))
      .unwrap();

    assert!(calls.contains(&Call::TextureStorage {
      target: Target::Texture2DArray,
      levels: 2,
      format: PixelFormat::R8,
      size: [16, 16, 4]
    }));
  }

  {
    let driver = StubDriver::new(Version::GL45);
    let calls = driver.calls();
    let mut ctx = context(driver);
    let mut texture = Texture2D::new(&mut ctx, Sampler::default());
    texture.set_storage(0, PixelFormat::RGBA8, [8, 8]).unwrap();

    assert!(calls.contains(&Call::NamedTextureStorage {
      texture: texture.handle(),
      levels: 1,
      format: PixelFormat::RGBA8,
      size: [8, 8, 1]
    }));
  }
}

#[test]
fn storage_over_limits() {
  let driver = StubDriver::new(Version::GL33).with_limit(Limit::Max3DTextureSize, 64);
  let mut ctx = context(driver);
  let mut texture = Texture::<StubDriver, Dim3>::new(&mut ctx, Sampler::default());

  assert_eq!(
    texture.set_storage(1, PixelFormat::R8, [64, 128, 1]),
    Err(TextureError::SizeExceedsLimit {
      limit: Limit::Max3DTextureSize,
      requested: 128,
      max: 64
    })
  );
  assert_eq!(texture.levels(), None);
}

#[test]
fn sub_image_checks() {
  let mut ctx = context(StubDriver::new(Version::GL33));
  let mut texture = Texture2D::new(&mut ctx, Sampler::default());

  assert_eq!(
    texture.set_sub_image(0, [0, 0], [2, 2], &[0; 16]),
    Err(TextureError::MissingStorage)
  );

  texture.set_storage(1, PixelFormat::RGBA8, [4, 4]).unwrap();

  assert_eq!(
    texture.set_sub_image(0, [0, 0], [2, 2], &[0; 12]),
    Err(TextureError::DataSizeMismatch {
      expected: 16,
      actual: 12
    })
  );
  assert!(texture.set_sub_image(0, [2, 2], [2, 2], &[0; 16]).is_ok());
}

#[test]
fn svga3d_uploads_slice_by_slice() {
  let driver = svga3d(Version::GL45);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let mut texture = Texture::<StubDriver, Dim3>::new(&mut ctx, Sampler::default());
  let h = texture.handle();
  texture.set_storage(1, PixelFormat::RG8, [2, 2, 3]).unwrap();

  calls.clear();
  texture
    .set_sub_image(0, [0, 0, 1], [2, 2, 2], &[7; 16])
    .unwrap();

  assert_eq!(
    calls.take(),
    vec![
      Call::NamedTextureSubImage {
        texture: h,
        level: 0,
        offset: [0, 0, 1],
        size: [2, 2, 1]
      },
      Call::NamedTextureSubImage {
        texture: h,
        level: 0,
        offset: [0, 0, 2],
        size: [2, 2, 1]
      },
    ]
  );
}

#[test]
fn svga3d_uploads_slice_by_slice_without_dsa() {
  let driver = svga3d(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let mut texture = Texture::<StubDriver, Dim2Array>::new(&mut ctx, Sampler::default());
  texture
    .set_storage(1, PixelFormat::R8, ([2, 2], 2))
    .unwrap();

  calls.clear();
  texture
    .set_sub_image(0, ([0, 0], 0), ([2, 2], 2), &[0; 8])
    .unwrap();

  assert_eq!(
    calls.count(|c| matches!(
      c,
      Call::TextureSubImage {
        target: Target::Texture2DArray,
        size: [2, 2, 1],
        ..
      }
    )),
    2
  );
}

#[test]
fn image_read_strategies() {
  {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = context(driver);
    let mut texture = Texture2D::new(&mut ctx, Sampler::default());
    texture.set_storage(2, PixelFormat::RGBA8, [4, 4]).unwrap();

    let mut out = vec![0; 16];
    texture.image(1, &mut out).unwrap();
    assert!(calls.contains(&Call::ReadTextureImage {
      target: Target::Texture2D,
      level: 1
    }));

    assert_eq!(
      texture.image(0, &mut out),
      Err(TextureError::DataSizeMismatch {
        expected: 64,
        actual: 16
      })
    );
  }

  {
    let driver = StubDriver::new(Version::GL33).with_extensions(vec!["GL_ARB_robustness"]);
    let calls = driver.calls();
    let mut ctx = context(driver);
    let mut texture = Texture2D::new(&mut ctx, Sampler::default());
    texture.set_storage(1, PixelFormat::R8, [4, 4]).unwrap();

    let mut out = vec![0; 16];
    texture.image(0, &mut out).unwrap();
    assert!(calls.contains(&Call::ReadTextureImageRobust {
      target: Target::Texture2D,
      level: 0,
      size: 16
    }));
  }

  {
    let driver = StubDriver::new(Version::GL45);
    let calls = driver.calls();
    let mut ctx = context(driver);
    let mut texture = Texture2D::new(&mut ctx, Sampler::default());
    texture.set_storage(1, PixelFormat::R8, [4, 4]).unwrap();

    let mut out = vec![0; 16];
    texture.image(0, &mut out).unwrap();
    assert!(calls.contains(&Call::ReadNamedTextureImage {
      texture: texture.handle(),
      level: 0,
      size: 16
    }));
  }
}

#[test]
fn deleted_texture_is_forgotten() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let texture = Texture2D::new(&mut ctx, Sampler::default());
  let h = texture.handle();
  texture.bind(0).unwrap();
  drop(texture);

  assert_eq!(ctx.state().layer_binding(0), Some((Target::Texture2D, Handle::NONE)));

  // the name is recycled and must not be mistaken for the deleted texture
  let texture = Texture2D::new(&mut ctx, Sampler::default());
  assert_eq!(texture.handle(), h);

  calls.clear();
  assert_eq!(texture.bind(0), Ok(true));
  assert!(calls.contains(&Call::Bind(Target::Texture2D, h)));
}

#[test]
fn deleted_buffer_is_forgotten() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let buffer = Buffer::new(&mut ctx, Target::ArrayBuffer);
  let h = buffer.handle();
  drop(buffer);

  let mut buffer = Buffer::new(&mut ctx, Target::ArrayBuffer);
  assert_eq!(buffer.handle(), h);

  calls.clear();
  buffer.set_data(&[1, 2, 3], BufferUsage::StreamDraw);
  assert_eq!(calls.len(), 1);
}

#[test]
fn framebuffer_rendering() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let mut color = Texture2D::new(&mut ctx, Sampler::default());
  color.set_storage(1, PixelFormat::RGBA8, [64, 64]).unwrap();

  let viewport = Rect::new(0, 0, 64, 64);
  let mut framebuffer = Framebuffer::new(&mut ctx, viewport);
  framebuffer
    .attach_texture(Attachment::Color(0), &color, 0)
    .unwrap();

  calls.clear();
  framebuffer.bind();
  framebuffer.bind();

  assert_eq!(
    calls.take(),
    vec![
      Call::Bind(Target::DrawFramebuffer, framebuffer.handle()),
      Call::Viewport(viewport),
    ]
  );
  assert_eq!(framebuffer.validate(), Ok(()));

  let mut back = ctx.default_framebuffer();
  back.bind();
  assert_eq!(ctx.state().bound(Target::DrawFramebuffer), Some(Handle::NONE));
  assert_eq!(ctx.state().viewport(), Some(back.viewport()));

  // attaching bound it for reading
  drop(framebuffer);
  assert_eq!(ctx.state().bound(Target::ReadFramebuffer), Some(Handle::NONE));
  back.set_viewport(Rect::new(0, 0, 10, 10));
  assert!(calls.contains(&Call::Viewport(Rect::new(0, 0, 10, 10))));
}

#[test]
fn incomplete_framebuffer() {
  let driver =
    StubDriver::new(Version::GL45).with_framebuffer_status(FramebufferStatus::IncompleteMissingAttachment);
  let mut ctx = context(driver);
  let framebuffer = Framebuffer::new(&mut ctx, Rect::new(0, 0, 1, 1));

  assert_eq!(
    framebuffer.validate(),
    Err(FramebufferError::Incomplete(
      FramebufferStatus::IncompleteMissingAttachment
    ))
  );
}

#[test]
fn draw_triangle() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);

  let mut program = Program::new(&mut ctx);
  program.set_uniform(0, UniformValue::Vec4([1., 0., 0., 1.]));

  let mut vertices = Buffer::new(&mut ctx, Target::ArrayBuffer);
  vertices.set_data(&[0; 24], BufferUsage::StaticDraw);
  let mut indices = Buffer::new(&mut ctx, Target::ElementArrayBuffer);
  indices.set_data(&[0, 1, 2], BufferUsage::StaticDraw);

  let mut mesh = Mesh::new(&mut ctx, Primitive::Triangles);
  mesh.add_vertex_buffer(
    vertices,
    &[VertexAttribute {
      index: 0,
      components: 2,
      kind: AttributeType::F32,
      normalized: false,
      stride: 8,
      offset: 0,
    }],
  );
  mesh.set_index_buffer(indices, IndexType::U8, 0);
  mesh.set_count(3);

  calls.clear();
  mesh.draw(&program).unwrap();

  // the program was already in use for the uniform update
  assert_eq!(
    calls.take(),
    vec![Call::DrawElements {
      primitive: Primitive::Triangles,
      count: 3,
      index_type: IndexType::U8,
      offset: 0
    }]
  );

  drop(mesh);
  assert_eq!(
    calls.count(|c| matches!(c, Call::Delete(ResourceKind::Buffer, _))),
    2
  );
}

#[test]
fn index_buffer_creation_keeps_bound_vertex_array() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let mut mesh = Mesh::new(&mut ctx, Primitive::Triangles);
  let indices = Buffer::new(&mut ctx, Target::ElementArrayBuffer);
  let i = indices.handle();
  mesh.set_index_buffer(indices, IndexType::U16, 0);

  assert_eq!(ctx.state().bound(Target::VertexArray), Some(mesh.vertex_array()));

  calls.clear();
  let other = Buffer::new(&mut ctx, Target::ElementArrayBuffer);

  assert_eq!(
    calls.take(),
    vec![
      Call::Gen(ResourceKind::Buffer, other.handle()),
      Call::Bind(Target::ArrayBuffer, other.handle()),
    ]
  );
  assert_eq!(ctx.state().bound(Target::ElementArrayBuffer), Some(i));
}

#[test]
fn deleted_vertex_array_forgets_its_index_buffer() {
  let driver = StubDriver::new(Version::GL33);
  let calls = driver.calls();
  let mut ctx = context(driver);
  let mut mesh = Mesh::new(&mut ctx, Primitive::Triangles);
  let indices = Buffer::new(&mut ctx, Target::ElementArrayBuffer);
  let keep = Buffer::new(&mut ctx, Target::ElementArrayBuffer);
  mesh.set_index_buffer(indices, IndexType::U16, 0);
  keep.bind(Target::ElementArrayBuffer);

  // the default vertex array takes over and holds no index buffer
  drop(mesh);
  assert_eq!(ctx.state().bound(Target::ElementArrayBuffer), None);

  calls.clear();
  assert!(keep.bind(Target::ElementArrayBuffer));
  assert_eq!(
    calls.take(),
    vec![Call::Bind(Target::ElementArrayBuffer, keep.handle())]
  );
}
