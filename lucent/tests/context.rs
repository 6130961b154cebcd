use lucent::buffer::{Buffer, BufferCreate, BufferData};
use lucent::context::{Context, ContextError};
use lucent::driver::{Driver, Handle, Limit, Rect, Target};
use lucent::extension::extensions;
use lucent::mesh::{MeshAttribute, MeshIndexed, MeshVertexArray};
use lucent::opt::ContextOpt;
use lucent::program::ProgramUniform;
use lucent::state::ResetState;
use lucent::stub::{Call, StubDriver};
use lucent::texture::{TextureBind, TextureImage, TextureMultiBind, TextureStorage, TextureSubImage};
use lucent::version::Version;

#[test]
fn one_context_per_thread() {
  let ctx = Context::new(StubDriver::default(), ContextOpt::default()).unwrap();

  assert_eq!(
    Context::new(StubDriver::default(), ContextOpt::default()).unwrap_err(),
    ContextError::AnotherContextActive
  );
  assert!(ctx.is_current());

  drop(ctx);
  assert!(Context::new(StubDriver::default(), ContextOpt::default()).is_ok());
}

#[test]
#[should_panic(expected = "cannot create context: another context is currently active")]
fn create_panics_with_another_context() {
  let _ctx = Context::create(StubDriver::default(), ContextOpt::default());
  let _other = Context::create(StubDriver::default(), ContextOpt::default());
}

#[test]
fn failed_creation_keeps_slot_free() {
  assert!(Context::new(StubDriver::legacy("1.1 Mesa 3.0"), ContextOpt::default()).is_err());
  assert!(!Context::<StubDriver>::has_current());
}

#[test]
fn resources_hold_the_slot() {
  let mut ctx = Context::new(StubDriver::default(), ContextOpt::default()).unwrap();
  let buffer = Buffer::new(&mut ctx, Target::ArrayBuffer);

  drop(ctx);
  assert!(Context::<StubDriver>::has_current());

  drop(buffer);
  assert!(!Context::<StubDriver>::has_current());
}

#[test]
fn legacy_context_dispatch() {
  let ctx = Context::new(StubDriver::new(Version::GL21), ContextOpt::default()).unwrap();
  let dispatch = ctx.dispatch();

  assert_eq!(dispatch.mesh.vertex_array.get(), MeshVertexArray::NoVertexArray);
  assert_eq!(dispatch.mesh.attribute.get(), MeshAttribute::Default);
  assert_eq!(dispatch.mesh.indexed.get(), MeshIndexed::Default);
  assert_eq!(dispatch.buffer.create.get(), BufferCreate::Default);
  assert_eq!(dispatch.texture.storage.get(), TextureStorage::Mutable);
  assert_eq!(dispatch.texture.multi_bind.get(), TextureMultiBind::Fallback);
  assert!(ctx.used_features().is_empty());
}

#[test]
fn vertex_arrays_from_30() {
  let ctx = Context::new(StubDriver::new(Version::GL30), ContextOpt::default()).unwrap();

  assert_eq!(
    ctx.dispatch().mesh.vertex_array.get(),
    MeshVertexArray::VertexArrayObject
  );
  // core in 3.0, so not an optional feature
  assert!(ctx.used_features().is_empty());
}

#[test]
fn vertex_arrays_as_extension() {
  let driver = StubDriver::new(Version::GL21).with_extensions(vec!["GL_ARB_vertex_array_object"]);
  let ctx = Context::new(driver, ContextOpt::default()).unwrap();

  assert_eq!(
    ctx.dispatch().mesh.vertex_array.get(),
    MeshVertexArray::VertexArrayObject
  );
  assert_eq!(ctx.used_features(), vec![extensions::ARB_vertex_array_object]);
}

#[test]
fn modern_context_dispatch() {
  let ctx = Context::new(StubDriver::new(Version::GL46), ContextOpt::default()).unwrap();
  let dispatch = ctx.dispatch();

  assert_eq!(dispatch.buffer.create.get(), BufferCreate::DirectStateAccess);
  assert_eq!(dispatch.buffer.data.get(), BufferData::DirectStateAccess);
  assert_eq!(dispatch.texture.bind.get(), TextureBind::DirectStateAccess);
  assert_eq!(dispatch.texture.multi_bind.get(), TextureMultiBind::MultiBind);
  assert_eq!(dispatch.texture.storage.get(), TextureStorage::DirectStateAccess);
  assert_eq!(dispatch.texture.sub_image.get(), TextureSubImage::DirectStateAccess);
  assert_eq!(dispatch.texture.image.get(), TextureImage::DirectStateAccess);
  assert_eq!(dispatch.program.uniform.get(), ProgramUniform::Separate);
  assert_eq!(dispatch.mesh.attribute.get(), MeshAttribute::DirectStateAccess);
  assert_eq!(dispatch.mesh.indexed.get(), MeshIndexed::BaseVertex);
}

#[test]
fn disabled_extension_changes_dispatch() {
  let opt = ContextOpt::default().set_disabled_extensions(vec!["GL_ARB_direct_state_access"]);
  let ctx = Context::new(StubDriver::new(Version::GL46), opt).unwrap();
  let dispatch = ctx.dispatch();

  assert_eq!(dispatch.buffer.create.get(), BufferCreate::Default);
  assert_eq!(dispatch.texture.bind.get(), TextureBind::MultiBind);
  assert_eq!(dispatch.texture.storage.get(), TextureStorage::Immutable);
  assert_eq!(dispatch.mesh.attribute.get(), MeshAttribute::Default);
}

#[test]
fn optional_features_are_reported_once() {
  let driver = StubDriver::new(Version::GL33).with_extensions(vec![
    "GL_ARB_direct_state_access",
    "GL_ARB_multi_bind",
    "GL_ARB_robustness",
  ]);
  let ctx = Context::new(driver, ContextOpt::default()).unwrap();
  let used = ctx.used_features();

  for e in [
    extensions::ARB_direct_state_access,
    extensions::ARB_multi_bind,
  ] {
    assert_eq!(used.iter().filter(|u| **u == e).count(), 1, "{}", e);
  }

  // DSA reads win over robust ones
  assert!(!used.contains(&extensions::ARB_robustness));
}

#[test]
fn limits_are_queried_once() {
  let driver = StubDriver::default().with_limit(Limit::MaxColorAttachments, 4);
  let calls = driver.calls();
  let ctx = Context::new(driver, ContextOpt::default()).unwrap();

  assert_eq!(ctx.max_color_attachments(), 4);
  assert_eq!(ctx.max_color_attachments(), 4);
  assert_eq!(ctx.max_texture_layers(), 32);
  assert_eq!(ctx.max_vertex_attributes(), 16);

  assert_eq!(
    calls.count(|c| *c == Call::Limit(Limit::MaxColorAttachments)),
    1
  );
  // queried while initializing textures already
  assert_eq!(calls.count(|c| *c == Call::Limit(Limit::MaxTextureLayers)), 1);
}

#[test]
fn reset_state_forgets_bindings() {
  let driver = StubDriver::default();
  let calls = driver.calls();
  let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
  let buffer = Buffer::new(&mut ctx, Target::ArrayBuffer);

  assert!(!buffer.bind(Target::ArrayBuffer));

  // something else touched the driver
  ctx.driver_mut().bind(Target::ArrayBuffer, Handle::NONE);
  ctx.reset_state(ResetState::BUFFERS);
  calls.clear();

  assert!(buffer.bind(Target::ArrayBuffer));
  assert_eq!(calls.take(), vec![Call::Bind(Target::ArrayBuffer, buffer.handle())]);
}

#[test]
fn default_framebuffer_viewport() {
  let viewport = Rect::new(0, 0, 1280, 720);
  let mut ctx = Context::new(
    StubDriver::default().with_viewport(viewport),
    ContextOpt::default(),
  )
  .unwrap();

  assert_eq!(ctx.default_framebuffer().viewport(), viewport);
  assert_eq!(ctx.state().viewport(), Some(viewport));
}

#[test]
fn quiet_contexts_still_work() {
  let opt = ContextOpt::default().set_log(lucent::opt::ContextLog::Quiet);
  let ctx = Context::new(StubDriver::new(Version::GL33), opt).unwrap();

  assert_eq!(ctx.capabilities().version(), Version::GL33);
  assert_eq!(ctx.capabilities().version_string(), "3.3 lucent stub");
}
