//! Framebuffers.
//!
//! Binding a framebuffer for drawing also applies its viewport. The viewport is part of the
//! framebuffer, not of the binding: binding a framebuffer that is already bound still re-applies
//! its viewport, as something else might have changed it in between.

use std::error;
use std::fmt;

use crate::context::{Context, ContextInner, Shared};
use crate::dispatch::{Initializer, Requirement, Slot, Strategy, Subsystem};
use crate::driver::{
  Attachment, ClearMask, Driver, FramebufferStatus, Handle, Limit, Rect, ResourceKind, Target,
};
use crate::extension::extensions;
use crate::state::Bind;
use crate::texture::{Dimensionable, Texture};

/// Framebuffer binding points.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FramebufferTarget {
  /// Rendering destination.
  Draw,
  /// Read-back and blit source.
  Read,
}

impl From<FramebufferTarget> for Target {
  fn from(target: FramebufferTarget) -> Self {
    match target {
      FramebufferTarget::Draw => Target::DrawFramebuffer,
      FramebufferTarget::Read => Target::ReadFramebuffer,
    }
  }
}

/// Framebuffer creation strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FramebufferCreate {
  /// Create the framebuffer object right away.
  DirectStateAccess,
  /// Reserve a name; the object is created when first bound.
  Default,
}

impl Strategy for FramebufferCreate {
  const SLOT: &'static str = "framebuffer create";

  fn requirement(self) -> Requirement {
    match self {
      FramebufferCreate::DirectStateAccess => {
        Requirement::Extension(extensions::ARB_direct_state_access)
      }
      FramebufferCreate::Default => Requirement::Always,
    }
  }
}

/// Completeness check strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FramebufferCheck {
  /// Check by handle.
  DirectStateAccess,
  /// Bind to the checked target, then check.
  Default,
}

impl Strategy for FramebufferCheck {
  const SLOT: &'static str = "framebuffer status";

  fn requirement(self) -> Requirement {
    match self {
      FramebufferCheck::DirectStateAccess => {
        Requirement::Extension(extensions::ARB_direct_state_access)
      }
      FramebufferCheck::Default => Requirement::Always,
    }
  }
}

/// Attachment strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FramebufferAttach {
  /// Attach by handle.
  DirectStateAccess,
  /// Bind (for reading, unless already bound), then attach.
  Default,
}

impl Strategy for FramebufferAttach {
  const SLOT: &'static str = "framebuffer attach";

  fn requirement(self) -> Requirement {
    match self {
      FramebufferAttach::DirectStateAccess => {
        Requirement::Extension(extensions::ARB_direct_state_access)
      }
      FramebufferAttach::Default => Requirement::Always,
    }
  }
}

/// Committed framebuffer strategies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FramebufferDispatch {
  /// How framebuffers are created.
  pub create: Slot<FramebufferCreate>,
  /// How completeness is checked.
  pub status: Slot<FramebufferCheck>,
  /// How textures are attached.
  pub attach: Slot<FramebufferAttach>,
}

impl Subsystem for FramebufferDispatch {
  const NAME: &'static str = "framebuffer";

  fn initialize<D>(init: &mut Initializer<D>) -> Self
  where
    D: Driver + ?Sized,
  {
    FramebufferDispatch {
      create: init.select(&[FramebufferCreate::DirectStateAccess, FramebufferCreate::Default]),
      status: init.select(&[FramebufferCheck::DirectStateAccess, FramebufferCheck::Default]),
      attach: init.select(&[FramebufferAttach::DirectStateAccess, FramebufferAttach::Default]),
    }
  }
}

/// Framebuffer error.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FramebufferError {
  /// The framebuffer is not complete.
  Incomplete(FramebufferStatus),
  /// The color attachment index is above what the driver supports.
  ColorAttachmentOutOfRange {
    /// Requested index.
    index: u32,
    /// Number of color attachments.
    max: i32,
  },
}

impl fmt::Display for FramebufferError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      FramebufferError::Incomplete(status) => write!(f, "incomplete framebuffer: {:?}", status),

      FramebufferError::ColorAttachmentOutOfRange { index, max } => write!(
        f,
        "color attachment {} out of range (max: {})",
        index, max
      ),
    }
  }
}

impl error::Error for FramebufferError {}

/// An offscreen framebuffer.
#[derive(Debug)]
pub struct Framebuffer<D>
where
  D: Driver,
{
  handle: Handle,
  viewport: Rect,
  ctx: Shared<D>,
}

impl<D> Drop for Framebuffer<D>
where
  D: Driver,
{
  fn drop(&mut self) {
    let inner = &mut *self.ctx.borrow_mut();
    inner.state.forget(ResourceKind::Framebuffer, self.handle);
    inner.driver.delete(ResourceKind::Framebuffer, self.handle);
  }
}

impl<D> Framebuffer<D>
where
  D: Driver,
{
  /// Create a framebuffer without attachments.
  pub fn new(ctx: &mut Context<D>, viewport: Rect) -> Self {
    let shared = ctx.shared();

    let handle = {
      let inner = &mut *shared.borrow_mut();

      match inner.dispatch.framebuffer.create.get() {
        FramebufferCreate::DirectStateAccess => inner.driver.create(Target::DrawFramebuffer),
        FramebufferCreate::Default => inner.driver.gen(ResourceKind::Framebuffer),
      }
    };

    Framebuffer {
      handle,
      viewport,
      ctx: shared,
    }
  }

  /// Driver handle.
  #[inline]
  pub fn handle(&self) -> Handle {
    self.handle
  }

  /// Viewport applied when the framebuffer is bound.
  #[inline]
  pub fn viewport(&self) -> Rect {
    self.viewport
  }

  /// Attach a level of a texture.
  pub fn attach_texture<Dm>(
    &mut self,
    attachment: Attachment,
    texture: &Texture<D, Dm>,
    level: u32,
  ) -> Result<(), FramebufferError>
  where
    Dm: Dimensionable,
  {
    let inner = &mut *self.ctx.borrow_mut();

    if let Attachment::Color(index) = attachment {
      let max = inner.state.limit(&inner.driver, Limit::MaxColorAttachments);

      if i64::from(index) >= i64::from(max) {
        return Err(FramebufferError::ColorAttachmentOutOfRange { index, max });
      }
    }

    match inner.dispatch.framebuffer.attach.get() {
      FramebufferAttach::DirectStateAccess => {
        inner
          .driver
          .named_framebuffer_texture(self.handle, attachment, texture.handle(), level)
      }

      FramebufferAttach::Default => {
        let target = bind_internal(inner, self.handle);
        inner
          .driver
          .framebuffer_texture(target, attachment, texture.handle(), level);
      }
    }

    Ok(())
  }

  /// Completeness of the framebuffer for `target`.
  pub fn check_status(&self, target: FramebufferTarget) -> FramebufferStatus {
    let inner = &mut *self.ctx.borrow_mut();
    let target = Target::from(target);

    match inner.dispatch.framebuffer.status.get() {
      FramebufferCheck::DirectStateAccess => {
        inner.driver.named_framebuffer_status(self.handle, target)
      }

      FramebufferCheck::Default => {
        inner
          .state
          .bind(&mut inner.driver, target, self.handle, Bind::Cached);
        inner.driver.framebuffer_status(target)
      }
    }
  }

  /// Check the framebuffer can be drawn to.
  pub fn validate(&self) -> Result<(), FramebufferError> {
    match self.check_status(FramebufferTarget::Draw) {
      FramebufferStatus::Complete => Ok(()),
      status => Err(FramebufferError::Incomplete(status)),
    }
  }

  /// Bind for drawing and apply the viewport.
  pub fn bind(&self) {
    let inner = &mut *self.ctx.borrow_mut();
    bind_for_drawing(inner, self.handle, self.viewport);
  }

  /// Change the viewport; it is applied right away if the framebuffer is bound for drawing.
  pub fn set_viewport(&mut self, viewport: Rect) {
    self.viewport = viewport;

    let inner = &mut *self.ctx.borrow_mut();

    if inner.state.bound(Target::DrawFramebuffer) == Some(self.handle) {
      inner.state.set_viewport(&mut inner.driver, viewport);
    }
  }

  /// Clear the buffers of the framebuffer.
  pub fn clear(&self, mask: ClearMask) {
    let inner = &mut *self.ctx.borrow_mut();
    clear(inner, self.handle, mask);
  }
}

/// The framebuffer of the window or surface the driver renders to.
#[derive(Debug)]
pub struct DefaultFramebuffer<D>
where
  D: Driver,
{
  ctx: Shared<D>,
}

impl<D> DefaultFramebuffer<D>
where
  D: Driver,
{
  pub(crate) fn new(ctx: &Context<D>) -> Self {
    DefaultFramebuffer { ctx: ctx.shared() }
  }

  /// Viewport applied when the default framebuffer is bound.
  pub fn viewport(&self) -> Rect {
    self.ctx.borrow().default_viewport
  }

  /// Bind for drawing and apply the viewport.
  pub fn bind(&self) {
    let inner = &mut *self.ctx.borrow_mut();
    let viewport = inner.default_viewport;
    bind_for_drawing(inner, Handle::NONE, viewport);
  }

  /// Change the viewport, typically after the window was resized; it is applied right away if
  /// the default framebuffer is bound for drawing.
  pub fn set_viewport(&mut self, viewport: Rect) {
    let inner = &mut *self.ctx.borrow_mut();
    inner.default_viewport = viewport;

    if inner.state.bound(Target::DrawFramebuffer) == Some(Handle::NONE) {
      inner.state.set_viewport(&mut inner.driver, viewport);
    }
  }

  /// Clear the buffers of the default framebuffer.
  pub fn clear(&self, mask: ClearMask) {
    let inner = &mut *self.ctx.borrow_mut();
    clear(inner, Handle::NONE, mask);
  }
}

fn bind_for_drawing<D>(inner: &mut ContextInner<D>, handle: Handle, viewport: Rect)
where
  D: Driver,
{
  inner
    .state
    .bind(&mut inner.driver, Target::DrawFramebuffer, handle, Bind::Cached);
  inner.state.set_viewport(&mut inner.driver, viewport);
}

fn clear<D>(inner: &mut ContextInner<D>, handle: Handle, mask: ClearMask)
where
  D: Driver,
{
  inner
    .state
    .bind(&mut inner.driver, Target::DrawFramebuffer, handle, Bind::Cached);
  inner.driver.clear(mask);
}

// Target to edit the framebuffer through: wherever it is already bound, reading otherwise.
fn bind_internal<D>(inner: &mut ContextInner<D>, handle: Handle) -> Target
where
  D: Driver,
{
  for target in [Target::ReadFramebuffer, Target::DrawFramebuffer] {
    if inner.state.bound(target) == Some(handle) {
      return target;
    }
  }

  inner
    .state
    .bind(&mut inner.driver, Target::ReadFramebuffer, handle, Bind::Forced);
  Target::ReadFramebuffer
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::opt::ContextOpt;
  use crate::stub::{Call, StubDriver};
  use crate::texture::{Dim2, Sampler};
  use crate::version::Version;

  #[test]
  fn rebinding_reapplies_viewport() {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();

    let fb = Framebuffer::new(&mut ctx, Rect::new(0, 0, 64, 64));
    fb.bind();

    // something else changes the viewport while the framebuffer stays bound
    {
      let shared = ctx.shared();
      let inner = &mut *shared.borrow_mut();
      inner.state.set_viewport(&mut inner.driver, Rect::new(0, 0, 1, 1));
    }

    calls.clear();
    fb.bind();

    assert_eq!(calls.take(), vec![Call::Viewport(Rect::new(0, 0, 64, 64))]);
  }

  #[test]
  fn set_viewport_only_applies_when_bound() {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let mut fb = Framebuffer::new(&mut ctx, Rect::new(0, 0, 64, 64));

    calls.clear();
    fb.set_viewport(Rect::new(0, 0, 32, 32));
    assert!(calls.is_empty());

    fb.bind();
    fb.set_viewport(Rect::new(0, 0, 16, 16));
    assert_eq!(calls.count(|c| *c == Call::Viewport(Rect::new(0, 0, 16, 16))), 1);
    assert_eq!(fb.viewport(), Rect::new(0, 0, 16, 16));
  }

  #[test]
  fn default_attach_binds_for_reading() {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let texture = Texture::<_, Dim2>::new(&mut ctx, Sampler::default());
    let mut fb = Framebuffer::new(&mut ctx, Rect::new(0, 0, 8, 8));
    let h = fb.handle();

    calls.clear();
    fb.attach_texture(Attachment::Color(0), &texture, 0).unwrap();
    fb.attach_texture(Attachment::Depth, &texture, 0).unwrap();

    assert_eq!(
      calls.take(),
      vec![
        Call::Limit(Limit::MaxColorAttachments),
        Call::Bind(Target::ReadFramebuffer, h),
        Call::FramebufferTexture {
          target: Target::ReadFramebuffer,
          attachment: Attachment::Color(0),
          texture: texture.handle(),
          level: 0
        },
        Call::FramebufferTexture {
          target: Target::ReadFramebuffer,
          attachment: Attachment::Depth,
          texture: texture.handle(),
          level: 0
        },
      ]
    );
  }

  #[test]
  fn attach_to_draw_binding() {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let texture = Texture::<_, Dim2>::new(&mut ctx, Sampler::default());
    let mut fb = Framebuffer::new(&mut ctx, Rect::new(0, 0, 8, 8));

    fb.bind();
    calls.clear();
    fb.attach_texture(Attachment::Color(1), &texture, 0).unwrap();

    assert!(calls.contains(&Call::FramebufferTexture {
      target: Target::DrawFramebuffer,
      attachment: Attachment::Color(1),
      texture: texture.handle(),
      level: 0
    }));
    assert_eq!(calls.count(|c| matches!(c, Call::Bind(..))), 0);
  }

  #[test]
  fn color_attachment_limit() {
    let driver = StubDriver::new(Version::GL45).with_limit(Limit::MaxColorAttachments, 4);
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let texture = Texture::<_, Dim2>::new(&mut ctx, Sampler::default());
    let mut fb = Framebuffer::new(&mut ctx, Rect::new(0, 0, 8, 8));

    assert_eq!(
      fb.attach_texture(Attachment::Color(4), &texture, 0),
      Err(FramebufferError::ColorAttachmentOutOfRange { index: 4, max: 4 })
    );
    assert!(fb.attach_texture(Attachment::Color(3), &texture, 0).is_ok());
  }

  #[test]
  fn validation() {
    let driver =
      StubDriver::new(Version::GL45).with_framebuffer_status(FramebufferStatus::IncompleteMissingAttachment);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let fb = Framebuffer::new(&mut ctx, Rect::new(0, 0, 8, 8));

    assert_eq!(
      fb.validate(),
      Err(FramebufferError::Incomplete(
        FramebufferStatus::IncompleteMissingAttachment
      ))
    );
    assert!(calls.contains(&Call::NamedFramebufferStatus(
      fb.handle(),
      Target::DrawFramebuffer
    )));
  }

  #[test]
  fn default_framebuffer_clear() {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let default_fb = ctx.default_framebuffer();

    calls.clear();
    default_fb.clear(ClearMask::COLOR | ClearMask::DEPTH);
    default_fb.clear(ClearMask::COLOR);

    assert_eq!(
      calls.take(),
      vec![
        Call::Bind(Target::DrawFramebuffer, Handle::NONE),
        Call::Clear(ClearMask::COLOR | ClearMask::DEPTH),
        Call::Clear(ClearMask::COLOR),
      ]
    );
    assert_eq!(default_fb.viewport(), Rect::new(0, 0, 800, 600));
  }
}
