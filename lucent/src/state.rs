//! Driver state cache.

use std::collections::HashMap;
use std::marker::PhantomData;

use bitflags::bitflags;

use crate::driver::{Driver, Handle, Limit, Rect, ResourceKind, Target};

/// Cached value.
///
/// A cached value is used to prevent issuing driver calls if we know the target value is already
/// set to what the call tries to set. If you ask to bind buffer `34` once, that value is set on
/// the driver and cached on our side; as long as nothing else got bound in between, binding `34`
/// again doesn’t need to reach the driver.
///
/// An empty cache means the value is unknown: it never compares equal, so the next request always
/// goes through.
#[derive(Clone, Debug)]
struct Cached<T>(Option<T>)
where
  T: PartialEq;

impl<T> Cached<T>
where
  T: PartialEq,
{
  /// Cache a value.
  fn new(initial: T) -> Self {
    Cached(Some(initial))
  }

  /// A value nothing is known about.
  fn unknown() -> Self {
    Cached(None)
  }

  /// Explicitly invalidate a value.
  ///
  /// This is necessary when the driver state was changed behind our back.
  fn invalidate(&mut self) {
    self.0 = None;
  }

  fn set(&mut self, value: T) {
    self.0 = Some(value);
  }

  fn get(&self) -> Option<&T> {
    self.0.as_ref()
  }

  /// Check if the cached value is invalid regarding a value.
  ///
  /// A non-cached value (i.e. empty) is always invalid whatever compared value. If a value is
  /// already cached, then it’s invalid if it’s not equal ([`PartialEq`]) to the input value.
  fn is_invalid(&self, new_val: &T) -> bool {
    match &self.0 {
      Some(ref t) => t != new_val,
      _ => true,
    }
  }
}

/// Should the binding be cached or forced to the provided value?
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Bind {
  /// Always issue the driver call.
  Forced,
  /// Issue the driver call only if the cache disagrees.
  Cached,
}

bitflags! {
  /// Parts of the cache to forget, see [`StateCache::reset`].
  pub struct ResetState: u8 {
    /// Buffer bindings.
    const BUFFERS = 0x01;
    /// Framebuffer bindings.
    const FRAMEBUFFERS = 0x02;
    /// Vertex array binding.
    const MESHES = 0x04;
    /// Program in use.
    const PROGRAMS = 0x08;
    /// Active layer and per-layer texture bindings.
    const TEXTURES = 0x10;
    /// Viewport.
    const VIEWPORT = 0x20;
    /// Clear color.
    const CLEAR_COLOR = 0x40;
  }
}

/// The driver state cache.
///
/// This type mirrors the part of the driver state lucent changes: the object bound to each target,
/// the active texture layer and what every layer holds, the viewport and the clear color. Every
/// state-changing request goes through it; the driver is only called when the cache disagrees,
/// and the cache is updated in the same call.
///
/// Limits are memoized here too: they never change for the lifetime of a context.
#[derive(Debug)]
pub struct StateCache {
  _a: PhantomData<*const ()>, // !Send and !Sync

  // non-texture bindings
  bindings: HashMap<Target, Cached<Handle>>,

  // texture layers
  active_layer: Cached<u32>,
  layers: Vec<Cached<(Target, Handle)>>,

  viewport: Cached<Rect>,
  clear_color: Cached<[f32; 4]>,

  limits: HashMap<Limit, i32>,
}

impl Default for StateCache {
  fn default() -> Self {
    Self::new()
  }
}

impl StateCache {
  /// A cache knowing nothing about the driver state.
  pub fn new() -> Self {
    StateCache {
      _a: PhantomData,
      bindings: HashMap::new(),
      active_layer: Cached::unknown(),
      layers: Vec::new(),
      viewport: Cached::unknown(),
      clear_color: Cached::unknown(),
      limits: HashMap::new(),
    }
  }

  /// Record the viewport the driver is known to have, without calling it.
  pub fn prime_viewport(&mut self, viewport: Rect) {
    self.viewport = Cached::new(viewport);
  }

  /// Object bound to `target`, if known.
  pub fn bound(&self, target: Target) -> Option<Handle> {
    self.bindings.get(&target).and_then(Cached::get).copied()
  }

  /// Bind `handle` to `target`, returning whether the driver was called.
  ///
  /// Textures are bound per layer, see [`StateCache::bind_layer`].
  pub fn bind<D>(&mut self, driver: &mut D, target: Target, handle: Handle, bind: Bind) -> bool
  where
    D: Driver + ?Sized,
  {
    debug_assert_ne!(target.kind(), ResourceKind::Texture);

    let cached = self.bindings.entry(target).or_insert_with(Cached::unknown);

    if bind == Bind::Cached && !cached.is_invalid(&handle) {
      return false;
    }

    driver.bind(target, handle);
    cached.set(handle);

    // the element buffer binding is part of the vertex array state
    if target == Target::VertexArray {
      self.invalidate(Target::ElementArrayBuffer);
    }

    true
  }

  fn invalidate(&mut self, target: Target) {
    if let Some(cached) = self.bindings.get_mut(&target) {
      cached.invalidate();
    }
  }

  /// Active texture layer, if known.
  pub fn active_layer(&self) -> Option<u32> {
    self.active_layer.get().copied()
  }

  /// Make `layer` the active texture layer, returning whether the driver was called.
  pub fn set_active_layer<D>(&mut self, driver: &mut D, layer: u32) -> bool
  where
    D: Driver + ?Sized,
  {
    if self.active_layer.is_invalid(&layer) {
      driver.active_layer(layer);
      self.active_layer.set(layer);
      true
    } else {
      false
    }
  }

  /// Texture bound to `layer`, if known.
  pub fn layer_binding(&self, layer: u32) -> Option<(Target, Handle)> {
    self
      .layers
      .get(layer as usize)
      .and_then(Cached::get)
      .copied()
  }

  /// Whether `layer` is known to hold `handle` on `target`.
  pub fn is_layer_bound(&self, layer: u32, target: Target, handle: Handle) -> bool {
    self.layer_binding(layer) == Some((target, handle))
  }

  /// Bind a texture to `layer` by activating the layer first, returning whether the driver was
  /// called.
  pub fn bind_layer<D>(&mut self, driver: &mut D, layer: u32, target: Target, handle: Handle) -> bool
  where
    D: Driver + ?Sized,
  {
    if self.is_layer_bound(layer, target, handle) {
      return false;
    }

    self.set_active_layer(driver, layer);
    driver.bind(target, handle);
    self.record_layer_binding(layer, target, handle);

    true
  }

  /// Record a layer binding made without going through [`StateCache::bind_layer`].
  ///
  /// Every code path binding textures must end up here or the cache goes stale.
  pub fn record_layer_binding(&mut self, layer: u32, target: Target, handle: Handle) {
    let layer = layer as usize;

    if layer >= self.layers.len() {
      // not enough tracked layers; let’s grow a bit more
      self.layers.resize_with(layer + 1, Cached::unknown);
    }

    self.layers[layer].set((target, handle));
  }

  /// Current viewport, if known.
  pub fn viewport(&self) -> Option<Rect> {
    self.viewport.get().copied()
  }

  /// Set the viewport, returning whether the driver was called.
  pub fn set_viewport<D>(&mut self, driver: &mut D, viewport: Rect) -> bool
  where
    D: Driver + ?Sized,
  {
    if self.viewport.is_invalid(&viewport) {
      driver.set_viewport(viewport);
      self.viewport.set(viewport);
      true
    } else {
      false
    }
  }

  /// Current clear color, if known.
  pub fn clear_color(&self) -> Option<[f32; 4]> {
    self.clear_color.get().copied()
  }

  /// Set the clear color, returning whether the driver was called.
  pub fn set_clear_color<D>(&mut self, driver: &mut D, color: [f32; 4]) -> bool
  where
    D: Driver + ?Sized,
  {
    if self.clear_color.is_invalid(&color) {
      driver.set_clear_color(color);
      self.clear_color.set(color);
      true
    } else {
      false
    }
  }

  /// Value of a limit, queried on first use only.
  pub fn limit<D>(&mut self, driver: &D, limit: Limit) -> i32
  where
    D: Driver + ?Sized,
  {
    *self
      .limits
      .entry(limit)
      .or_insert_with(|| driver.limit(limit))
  }

  /// Forget every binding of a deleted object.
  ///
  /// The driver reverts such bindings to [`Handle::NONE`] itself, so no call is made.
  pub fn forget(&mut self, kind: ResourceKind, handle: Handle) {
    if kind == ResourceKind::Texture {
      for layer in &mut self.layers {
        if let Some((target, bound)) = layer.get().copied() {
          if bound == handle {
            layer.set((target, Handle::NONE));
          }
        }
      }

      return;
    }

    let mut vertex_array_deleted = false;

    for (target, cached) in &mut self.bindings {
      if target.kind() == kind && cached.get() == Some(&handle) {
        cached.set(Handle::NONE);
        vertex_array_deleted |= *target == Target::VertexArray;
      }
    }

    // the default vertex array takes over, with its own element buffer binding
    if vertex_array_deleted {
      self.invalidate(Target::ElementArrayBuffer);
    }
  }

  /// Forget parts of the cache, after the driver state was changed by something else.
  ///
  /// Forgotten entries are unknown: the next request for them always reaches the driver.
  pub fn reset(&mut self, what: ResetState) {
    let kinds = [
      (ResetState::BUFFERS, ResourceKind::Buffer),
      (ResetState::FRAMEBUFFERS, ResourceKind::Framebuffer),
      (ResetState::MESHES, ResourceKind::VertexArray),
      (ResetState::PROGRAMS, ResourceKind::Program),
    ];

    for (flag, kind) in kinds {
      if what.contains(flag) {
        for (target, cached) in &mut self.bindings {
          if target.kind() == kind {
            cached.invalidate();
          }
        }
      }
    }

    if what.contains(ResetState::TEXTURES) {
      self.active_layer.invalidate();
      self.layers.clear();
    }

    if what.contains(ResetState::VIEWPORT) {
      self.viewport.invalidate();
    }

    if what.contains(ResetState::CLEAR_COLOR) {
      self.clear_color.invalidate();
    }
  }
}
