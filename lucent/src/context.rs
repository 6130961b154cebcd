//! Context lifecycle.
//!
//! A [`Context`] owns a driver and everything lucent derives from it: the [`CapabilitySet`], the
//! [`StateCache`] and the [`DispatchTable`]. Creating one goes through these steps, in order:
//!
//! 1. The driver is queried and the capability set is computed.
//! 2. The context claims the current-context slot of the thread. There is only one such slot per
//!    thread; creating a context while another one is alive fails.
//! 3. The state cache is created and seeded with the viewport the driver currently has.
//! 4. Every subsystem commits its dispatch slots.
//!
//! Dropping the context (and every resource created from it, as they share it) releases the slot.

use std::cell::{Ref, RefCell, RefMut};
use std::error;
use std::fmt;
use std::rc::Rc;

use log::info;

use crate::capability::CapabilitySet;
use crate::current::{self, CurrentGuard};
use crate::dispatch::{DispatchTable, Initializer};
use crate::driver::{Driver, Limit, Rect};
use crate::extension::Extension;
use crate::framebuffer::DefaultFramebuffer;
use crate::opt::{ContextLog, ContextOpt};
use crate::state::{ResetState, StateCache};
use crate::workaround;

/// Error that might occur when creating a context.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContextError {
  /// The driver reports a version lucent doesn’t support.
  UnsupportedVersion {
    /// Reported major version.
    major: u32,
    /// Reported minor version.
    minor: u32,
  },
  /// The driver version string couldn’t be parsed.
  UnsupportedVersionString(String),
  /// Another context is already active on this thread.
  AnotherContextActive,
}

impl fmt::Display for ContextError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      ContextError::UnsupportedVersion { major, minor } => write!(
        f,
        "unsupported OpenGL version {}.{} (at least 2.1 is required)",
        major, minor
      ),

      ContextError::UnsupportedVersionString(ref s) => {
        write!(f, "cannot read the OpenGL version out of {:?}", s)
      }

      ContextError::AnotherContextActive => f.write_str("another context is currently active"),
    }
  }
}

impl error::Error for ContextError {}

/// Everything a context owns; shared by the context and every resource created from it.
#[derive(Debug)]
pub(crate) struct ContextInner<D> {
  pub(crate) driver: D,
  pub(crate) caps: CapabilitySet,
  pub(crate) state: StateCache,
  pub(crate) dispatch: DispatchTable,
  pub(crate) default_viewport: Rect,
  used: Vec<Extension>,
  // last, so that the slot is released once everything else is gone
  current: CurrentGuard,
}

pub(crate) type Shared<D> = Rc<RefCell<ContextInner<D>>>;

/// A live driver context.
///
/// Contexts are neither [`Send`] nor [`Sync`].
#[derive(Debug)]
pub struct Context<D>
where
  D: Driver,
{
  inner: Shared<D>,
}

impl<D> Context<D>
where
  D: Driver,
{
  /// Create a context out of a driver whose underlying API context is current on this thread.
  pub fn new(mut driver: D, opt: ContextOpt) -> Result<Self, ContextError> {
    let caps = CapabilitySet::detect(&driver, &opt)?;
    let current = CurrentGuard::acquire().ok_or(ContextError::AnotherContextActive)?;
    let log = opt.log();

    if log != ContextLog::Quiet {
      info!("Renderer: {} by {}", caps.renderer(), caps.vendor());
      info!("OpenGL version: {}", caps.version_string());

      if !caps.disabled_extensions().is_empty() {
        info!("Disabling extensions:");

        for e in caps.disabled_extensions() {
          info!("    {}", e);
        }
      }
    }

    let viewport = driver.viewport();
    let mut state = StateCache::new();
    state.prime_viewport(viewport);

    // apitrace assumes a zero-sized framebuffer until the viewport is set explicitly
    if caps
      .workarounds()
      .is_active(workaround::APITRACE_ZERO_INITIAL_VIEWPORT)
    {
      driver.set_viewport(viewport);
    }

    let mut init = Initializer::new(&caps, &mut state, &mut driver, log);
    let dispatch = DispatchTable::initialize(&mut init);
    let used = init.into_used_extensions();

    if log != ContextLog::Quiet {
      if !used.is_empty() {
        info!("Using optional features:");

        for e in &used {
          info!("    {}", e);
        }
      }

      if !caps.workarounds().active().is_empty() {
        info!("Using driver workarounds:");

        for name in caps.workarounds().active() {
          info!("    {}", name);
        }
      }
    }

    let inner = ContextInner {
      driver,
      caps,
      state,
      dispatch,
      default_viewport: viewport,
      used,
      current,
    };

    Ok(Context {
      inner: Rc::new(RefCell::new(inner)),
    })
  }

  /// Create a context, panicking if it cannot be created.
  ///
  /// # Panics
  ///
  /// Panics on any [`ContextError`], including when another context is active on this thread.
  pub fn create(driver: D, opt: ContextOpt) -> Self {
    match Self::new(driver, opt) {
      Ok(ctx) => ctx,
      Err(e) => panic!("cannot create context: {}", e),
    }
  }

  /// Whether a context is active on this thread.
  pub fn has_current() -> bool {
    current::current().is_some()
  }

  /// Whether this context is the one active on this thread.
  pub fn is_current(&self) -> bool {
    current::current() == Some(self.inner.borrow().current.id())
  }

  /// Capabilities of the driver.
  pub fn capabilities(&self) -> Ref<CapabilitySet> {
    Ref::map(self.inner.borrow(), |inner| &inner.caps)
  }

  /// Strategies committed at creation.
  pub fn dispatch(&self) -> DispatchTable {
    self.inner.borrow().dispatch
  }

  /// The state cache.
  pub fn state(&self) -> Ref<StateCache> {
    Ref::map(self.inner.borrow(), |inner| &inner.state)
  }

  /// The driver.
  pub fn driver(&self) -> Ref<D> {
    Ref::map(self.inner.borrow(), |inner| &inner.driver)
  }

  /// The driver, mutably.
  ///
  /// Changing driver state behind the context’s back requires a [`Context::reset_state`]
  /// afterwards.
  pub fn driver_mut(&mut self) -> RefMut<D> {
    RefMut::map(self.inner.borrow_mut(), |inner| &mut inner.driver)
  }

  /// Optional extensions the committed strategies rely on.
  ///
  /// Extensions implied by the context version aren’t listed.
  pub fn used_features(&self) -> Vec<Extension> {
    self.inner.borrow().used.clone()
  }

  /// The default framebuffer, with the viewport the driver had when the context was created.
  pub fn default_framebuffer(&mut self) -> DefaultFramebuffer<D> {
    DefaultFramebuffer::new(self)
  }

  /// Set the clear color.
  pub fn set_clear_color(&mut self, color: [f32; 4]) {
    let inner = &mut *self.inner.borrow_mut();
    inner.state.set_clear_color(&mut inner.driver, color);
  }

  /// Forget cached state, after the driver state was changed by something else.
  pub fn reset_state(&mut self, what: ResetState) {
    self.inner.borrow_mut().state.reset(what);
  }

  fn limit(&self, limit: Limit) -> i32 {
    let inner = &mut *self.inner.borrow_mut();
    inner.state.limit(&inner.driver, limit)
  }

  /// Maximum width and height of 1D and 2D textures.
  pub fn max_texture_size(&self) -> i32 {
    self.limit(Limit::MaxTextureSize)
  }

  /// Maximum extent of 3D textures.
  pub fn max_3d_texture_size(&self) -> i32 {
    self.limit(Limit::Max3DTextureSize)
  }

  /// Maximum number of layers of array textures.
  pub fn max_array_layers(&self) -> i32 {
    self.limit(Limit::MaxArrayTextureLayers)
  }

  /// Number of texture layers textures can be bound to.
  pub fn max_texture_layers(&self) -> i32 {
    self.limit(Limit::MaxTextureLayers)
  }

  /// Maximum number of framebuffer color attachments.
  pub fn max_color_attachments(&self) -> i32 {
    self.limit(Limit::MaxColorAttachments)
  }

  /// Maximum number of draw buffers.
  pub fn max_draw_buffers(&self) -> i32 {
    self.limit(Limit::MaxDrawBuffers)
  }

  /// Maximum number of vertex attributes.
  pub fn max_vertex_attributes(&self) -> i32 {
    self.limit(Limit::MaxVertexAttributes)
  }

  /// Maximum number of uniform buffer binding points.
  pub fn max_uniform_bindings(&self) -> i32 {
    self.limit(Limit::MaxUniformBufferBindings)
  }

  pub(crate) fn shared(&self) -> Shared<D> {
    self.inner.clone()
  }
}
