//! Capability dispatch.
//!
//! Most operations lucent exposes can be implemented in more than one way, depending on what the
//! driver supports: binding a texture to a layer may go through direct state access, through a
//! multi-bind entry point or through the classic “activate the layer, then bind” pair.
//!
//! Each such operation owns a [`Slot`], holding a [`Strategy`]: a small enum listing the
//! alternatives. When a context is created, every subsystem walks its own priority lists and
//! commits, per slot, the first strategy whose [`Requirement`] the [`CapabilitySet`] satisfies.
//! Committed slots never change afterwards; invoking an operation is a plain `match` on the
//! committed strategy, with no capability check on the way.

use std::fmt;

use log::{debug, info};

use crate::buffer::BufferDispatch;
use crate::capability::CapabilitySet;
use crate::driver::Driver;
use crate::extension::Extension;
use crate::framebuffer::FramebufferDispatch;
use crate::mesh::MeshDispatch;
use crate::opt::ContextLog;
use crate::program::ProgramDispatch;
use crate::state::StateCache;
use crate::texture::TextureDispatch;
use crate::version::Version;

/// Prerequisite of a strategy.
#[derive(Clone, Copy, Debug)]
pub enum Requirement {
  /// Always satisfied; the baseline every priority list ends with.
  Always,
  /// The context must be at least this version.
  Version(Version),
  /// The extension must be usable.
  Extension(Extension),
  /// The named driver workaround must be in effect.
  Workaround(&'static str),
  /// The named driver workaround must not be in effect.
  Without(&'static str),
  /// Every requirement must be satisfied.
  All(&'static [Requirement]),
}

impl Requirement {
  /// Whether `caps` satisfies this requirement.
  pub fn is_satisfied(&self, caps: &CapabilitySet) -> bool {
    match *self {
      Requirement::Always => true,
      Requirement::Version(version) => caps.is_version_supported(version),
      Requirement::Extension(extension) => caps.supports(extension),
      Requirement::Workaround(name) => caps.workarounds().is_active(name),
      Requirement::Without(name) => !caps.workarounds().is_active(name),
      Requirement::All(requirements) => requirements.iter().all(|r| r.is_satisfied(caps)),
    }
  }

  // Extensions this requirement relies on beyond what the version implies.
  fn optional_extensions(&self, caps: &CapabilitySet, out: &mut Vec<Extension>) {
    match *self {
      Requirement::Extension(extension) if caps.is_optional(extension) => {
        if !out.contains(&extension) {
          out.push(extension);
        }
      }

      Requirement::All(requirements) => {
        for r in requirements {
          r.optional_extensions(caps, out);
        }
      }

      _ => (),
    }
  }
}

/// A set of alternative implementations of one operation.
pub trait Strategy: Copy + fmt::Debug + Eq {
  /// Name of the operation, for diagnostics.
  const SLOT: &'static str;

  /// What the strategy needs to be viable.
  fn requirement(self) -> Requirement;
}

/// The committed strategy of an operation.
///
/// A slot can only be obtained by committing a strategy, so there is no such thing as an empty
/// slot to invoke.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Slot<S> {
  strategy: S,
}

impl<S> Slot<S>
where
  S: Strategy,
{
  /// Commit the first viable candidate.
  ///
  /// # Panics
  ///
  /// Panics if no candidate is viable. Priority lists end with an always-viable baseline, so
  /// this is a bug in the list.
  pub fn select(caps: &CapabilitySet, candidates: &[S]) -> Self {
    let strategy = candidates
      .iter()
      .copied()
      .find(|s| s.requirement().is_satisfied(caps))
      .unwrap_or_else(|| panic!("{}: no viable implementation", S::SLOT));

    Slot { strategy }
  }

  /// The committed strategy.
  #[inline]
  pub fn get(self) -> S {
    self.strategy
  }
}

/// Per-subsystem dispatch, filled once when a context is created.
pub trait Subsystem: Sized {
  /// Name of the subsystem, for diagnostics.
  const NAME: &'static str;

  /// Commit every slot of the subsystem.
  fn initialize<D>(init: &mut Initializer<D>) -> Self
  where
    D: Driver + ?Sized;
}

/// What subsystems get to see while committing their slots.
///
/// Capabilities are final by then, and the state cache already exists, so subsystems may also
/// pre-warm cache entries.
pub struct Initializer<'a, D: ?Sized> {
  caps: &'a CapabilitySet,
  state: &'a mut StateCache,
  driver: &'a mut D,
  log: ContextLog,
  used: Vec<Extension>,
}

impl<'a, D> Initializer<'a, D>
where
  D: Driver + ?Sized,
{
  /// Prepare the initialization of subsystems.
  pub fn new(
    caps: &'a CapabilitySet,
    state: &'a mut StateCache,
    driver: &'a mut D,
    log: ContextLog,
  ) -> Self {
    Initializer {
      caps,
      state,
      driver,
      log,
      used: Vec::new(),
    }
  }

  /// Capabilities slots are committed against.
  pub fn capabilities(&self) -> &CapabilitySet {
    self.caps
  }

  /// The state cache and the driver, to pre-warm the cache.
  pub fn state(&mut self) -> (&mut StateCache, &mut D) {
    (&mut *self.state, &mut *self.driver)
  }

  /// Initialize a subsystem.
  pub fn initialize<S>(&mut self) -> S
  where
    S: Subsystem,
  {
    debug!("initializing {} dispatch", S::NAME);
    S::initialize(self)
  }

  /// Commit the first viable candidate, remembering the optional extensions it relies on.
  pub fn select<S>(&mut self, candidates: &[S]) -> Slot<S>
  where
    S: Strategy,
  {
    let slot = Slot::select(self.caps, candidates);

    if self.log == ContextLog::Verbose {
      info!("{}: {:?}", S::SLOT, slot.get());
    } else {
      debug!("{}: {:?}", S::SLOT, slot.get());
    }

    slot
      .get()
      .requirement()
      .optional_extensions(self.caps, &mut self.used);

    slot
  }

  /// Optional extensions committed strategies rely on, in commit order.
  pub fn into_used_extensions(self) -> Vec<Extension> {
    self.used
  }
}

/// Every committed slot of a context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DispatchTable {
  /// Buffer operations.
  pub buffer: BufferDispatch,
  /// Texture operations.
  pub texture: TextureDispatch,
  /// Program operations.
  pub program: ProgramDispatch,
  /// Framebuffer operations.
  pub framebuffer: FramebufferDispatch,
  /// Mesh operations.
  pub mesh: MeshDispatch,
}

impl DispatchTable {
  /// Initialize every subsystem, leaves first.
  pub fn initialize<D>(init: &mut Initializer<D>) -> Self
  where
    D: Driver + ?Sized,
  {
    let buffer = init.initialize::<BufferDispatch>();
    let texture = init.initialize::<TextureDispatch>();
    let program = init.initialize::<ProgramDispatch>();
    let framebuffer = init.initialize::<FramebufferDispatch>();
    let mesh = init.initialize::<MeshDispatch>();

    DispatchTable {
      buffer,
      texture,
      program,
      framebuffer,
      mesh,
    }
  }
}
