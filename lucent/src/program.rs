//! Shader programs.
//!
//! Compiling and linking shaders is up to the driver; a [`Program`] only holds the handle and
//! routes uniform updates through the committed strategy.

use crate::context::{Context, Shared};
use crate::dispatch::{Initializer, Requirement, Slot, Strategy, Subsystem};
use crate::driver::{Driver, Handle, ResourceKind, Target};
use crate::extension::extensions;
use crate::state::Bind;

/// Value of a uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
  /// `int`.
  Int(i32),
  /// `uint`.
  UInt(u32),
  /// `float`.
  Float(f32),
  /// `vec2`.
  Vec2([f32; 2]),
  /// `vec3`.
  Vec3([f32; 3]),
  /// `vec4`.
  Vec4([f32; 4]),
  /// `mat4`, column-major.
  Mat4([[f32; 4]; 4]),
}

/// Uniform update strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProgramUniform {
  /// Update the uniform of a program by handle.
  Separate,
  /// Use the program, then update.
  Default,
}

impl Strategy for ProgramUniform {
  const SLOT: &'static str = "program uniform";

  fn requirement(self) -> Requirement {
    match self {
      ProgramUniform::Separate => Requirement::Extension(extensions::ARB_separate_shader_objects),
      ProgramUniform::Default => Requirement::Always,
    }
  }
}

/// Committed program strategies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProgramDispatch {
  /// How uniforms are updated.
  pub uniform: Slot<ProgramUniform>,
}

impl Subsystem for ProgramDispatch {
  const NAME: &'static str = "program";

  fn initialize<D>(init: &mut Initializer<D>) -> Self
  where
    D: Driver + ?Sized,
  {
    ProgramDispatch {
      uniform: init.select(&[ProgramUniform::Separate, ProgramUniform::Default]),
    }
  }
}

/// A linked shader program.
#[derive(Debug)]
pub struct Program<D>
where
  D: Driver,
{
  handle: Handle,
  ctx: Shared<D>,
}

impl<D> Drop for Program<D>
where
  D: Driver,
{
  fn drop(&mut self) {
    let inner = &mut *self.ctx.borrow_mut();
    inner.state.forget(ResourceKind::Program, self.handle);
    inner.driver.delete(ResourceKind::Program, self.handle);
  }
}

impl<D> Program<D>
where
  D: Driver,
{
  /// Create a program.
  pub fn new(ctx: &mut Context<D>) -> Self {
    let shared = ctx.shared();
    let handle = shared.borrow_mut().driver.gen(ResourceKind::Program);

    Program {
      handle,
      ctx: shared,
    }
  }

  /// Driver handle.
  #[inline]
  pub fn handle(&self) -> Handle {
    self.handle
  }

  /// Make this program the one in use, returning whether the driver was called.
  pub fn use_program(&self) -> bool {
    let inner = &mut *self.ctx.borrow_mut();
    inner
      .state
      .bind(&mut inner.driver, Target::Program, self.handle, Bind::Cached)
  }

  /// Set a uniform.
  pub fn set_uniform(&mut self, location: i32, value: UniformValue) {
    let inner = &mut *self.ctx.borrow_mut();

    match inner.dispatch.program.uniform.get() {
      ProgramUniform::Separate => inner.driver.program_uniform(self.handle, location, &value),

      ProgramUniform::Default => {
        inner
          .state
          .bind(&mut inner.driver, Target::Program, self.handle, Bind::Cached);
        inner.driver.uniform(location, &value);
      }
    }
  }
}
