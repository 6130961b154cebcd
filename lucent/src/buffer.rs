//! Buffers.
//!
//! A [`Buffer`] is a region of driver memory holding untyped bytes. Creating and filling one
//! goes either through direct state access, when available, or through the classic
//! bind-then-edit entry points.

use std::error;
use std::fmt;

use crate::context::{Context, Shared};
use crate::dispatch::{Initializer, Requirement, Slot, Strategy, Subsystem};
use crate::driver::{Driver, Handle, ResourceKind, Target};
use crate::extension::extensions;
use crate::state::Bind;
use crate::workaround;

/// Hint about how a buffer is going to be used.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferUsage {
  /// Written once, read a few times.
  StreamDraw,
  /// Written once by the driver, read a few times by the user.
  StreamRead,
  /// Written once by the driver, read a few times by the driver.
  StreamCopy,
  /// Written once, read many times.
  StaticDraw,
  /// Written once by the driver, read many times by the user.
  StaticRead,
  /// Written once by the driver, read many times by the driver.
  StaticCopy,
  /// Written and read many times.
  DynamicDraw,
  /// Written many times by the driver, read many times by the user.
  DynamicRead,
  /// Written and read many times by the driver.
  DynamicCopy,
}

impl Default for BufferUsage {
  fn default() -> Self {
    BufferUsage::StaticDraw
  }
}

/// Buffer creation strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferCreate {
  /// Create the buffer object right away.
  DirectStateAccess,
  /// Reserve a name and bind it once, which creates the object.
  Default,
}

impl Strategy for BufferCreate {
  const SLOT: &'static str = "buffer create";

  fn requirement(self) -> Requirement {
    match self {
      BufferCreate::DirectStateAccess => Requirement::Extension(extensions::ARB_direct_state_access),
      BufferCreate::Default => Requirement::Always,
    }
  }
}

const DSA_BUFFER_DATA: &[Requirement] = &[
  Requirement::Extension(extensions::ARB_direct_state_access),
  Requirement::Without(workaround::SVGA3D_BROKEN_DSA_BUFFERDATA),
];

/// Buffer upload strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferData {
  /// Upload by handle.
  DirectStateAccess,
  /// Bind, then upload.
  Default,
}

impl Strategy for BufferData {
  const SLOT: &'static str = "buffer data";

  fn requirement(self) -> Requirement {
    match self {
      BufferData::DirectStateAccess => Requirement::All(DSA_BUFFER_DATA),
      BufferData::Default => Requirement::Always,
    }
  }
}

/// Committed buffer strategies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BufferDispatch {
  /// How buffers are created.
  pub create: Slot<BufferCreate>,
  /// How data is uploaded.
  pub data: Slot<BufferData>,
}

impl Subsystem for BufferDispatch {
  const NAME: &'static str = "buffer";

  fn initialize<D>(init: &mut Initializer<D>) -> Self
  where
    D: Driver + ?Sized,
  {
    BufferDispatch {
      create: init.select(&[BufferCreate::DirectStateAccess, BufferCreate::Default]),
      data: init.select(&[BufferData::DirectStateAccess, BufferData::Default]),
    }
  }
}

/// Buffer error.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BufferError {
  /// An update doesn’t fit in the buffer.
  OutOfRange {
    /// Offset of the update.
    offset: usize,
    /// Length of the update.
    len: usize,
    /// Size of the buffer.
    size: usize,
  },
}

impl fmt::Display for BufferError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      BufferError::OutOfRange { offset, len, size } => write!(
        f,
        "buffer update out of range: {} bytes at offset {} in a {}-byte buffer",
        len, offset, size
      ),
    }
  }
}

impl error::Error for BufferError {}

/// A driver buffer.
///
/// The buffer is deleted when dropped; bindings of it are forgotten by the state cache.
#[derive(Debug)]
pub struct Buffer<D>
where
  D: Driver,
{
  handle: Handle,
  size: usize,
  ctx: Shared<D>,
}

impl<D> Drop for Buffer<D>
where
  D: Driver,
{
  fn drop(&mut self) {
    let inner = &mut *self.ctx.borrow_mut();
    inner.state.forget(ResourceKind::Buffer, self.handle);
    inner.driver.delete(ResourceKind::Buffer, self.handle);
  }
}

impl<D> Buffer<D>
where
  D: Driver,
{
  /// Create an empty buffer.
  ///
  /// `target_hint` is the target the buffer is first bound to when it must be bound to be
  /// created; any target works. An element array hint is bound to the array target instead, so
  /// that the index buffer of the bound vertex array stays untouched.
  pub fn new(ctx: &mut Context<D>, target_hint: Target) -> Self {
    debug_assert_eq!(target_hint.kind(), ResourceKind::Buffer);

    let shared = ctx.shared();

    let handle = {
      let inner = &mut *shared.borrow_mut();

      match inner.dispatch.buffer.create.get() {
        BufferCreate::DirectStateAccess => inner.driver.create(target_hint),

        BufferCreate::Default => {
          let target = if target_hint == Target::ElementArrayBuffer {
            EDIT_TARGET
          } else {
            target_hint
          };

          let handle = inner.driver.gen(ResourceKind::Buffer);
          inner
            .state
            .bind(&mut inner.driver, target, handle, Bind::Forced);
          handle
        }
      }
    };

    Buffer {
      handle,
      size: 0,
      ctx: shared,
    }
  }

  /// Driver handle.
  #[inline]
  pub fn handle(&self) -> Handle {
    self.handle
  }

  /// Size of the buffer in bytes.
  #[inline]
  pub fn size(&self) -> usize {
    self.size
  }

  /// Bind the buffer to `target`, returning whether the driver was called.
  pub fn bind(&self, target: Target) -> bool {
    let inner = &mut *self.ctx.borrow_mut();
    inner
      .state
      .bind(&mut inner.driver, target, self.handle, Bind::Cached)
  }

  /// Replace the whole storage of the buffer.
  pub fn set_data(&mut self, data: &[u8], usage: BufferUsage) {
    let inner = &mut *self.ctx.borrow_mut();

    match inner.dispatch.buffer.data.get() {
      BufferData::DirectStateAccess => inner.driver.named_buffer_data(self.handle, data, usage),

      BufferData::Default => {
        inner
          .state
          .bind(&mut inner.driver, EDIT_TARGET, self.handle, Bind::Cached);
        inner.driver.buffer_data(EDIT_TARGET, data, usage);
      }
    }

    self.size = data.len();
  }

  /// Update part of the buffer.
  pub fn set_sub_data(&mut self, offset: usize, data: &[u8]) -> Result<(), BufferError> {
    let end = offset.checked_add(data.len());

    if end.map_or(true, |end| end > self.size) {
      return Err(BufferError::OutOfRange {
        offset,
        len: data.len(),
        size: self.size,
      });
    }

    let inner = &mut *self.ctx.borrow_mut();

    match inner.dispatch.buffer.data.get() {
      BufferData::DirectStateAccess => inner
        .driver
        .named_buffer_sub_data(self.handle, offset, data),

      BufferData::Default => {
        inner
          .state
          .bind(&mut inner.driver, EDIT_TARGET, self.handle, Bind::Cached);
        inner.driver.buffer_sub_data(EDIT_TARGET, offset, data);
      }
    }

    Ok(())
  }
}

// the element buffer binding belongs to the bound vertex array, so edits never go through it
const EDIT_TARGET: Target = Target::ArrayBuffer;
