//! Textures.
//!
//! A [`Texture`] is generic over its dimension, described by a [`Dimensionable`] type: [`Dim1`],
//! [`Dim2`], [`Dim3`] and [`Dim2Array`]. Every operation is written once and only reads the
//! target, the limits and the extent of its dimension out of the descriptor.
//!
//! Textures are bound to layers (texture units). Operations needing a bound texture without the
//! caller asking for a specific layer use the last layer, so that user bindings of lower layers
//! are left alone.

use std::error;
use std::fmt;
use std::marker::PhantomData;

use crate::context::{Context, ContextInner, Shared};
use crate::dispatch::{Initializer, Requirement, Slot, Strategy, Subsystem};
use crate::driver::{Driver, Handle, Limit, ResourceKind, Target};
use crate::extension::extensions;
use crate::workaround;

/// How to wrap texture coordinates while sampling textures?
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Wrap {
  /// Coordinates outside of *[0;1]* are clamped to *0* or *1*.
  ClampToEdge,
  /// Coordinates outside of *[0;1]* wrap around.
  Repeat,
  /// Same as `Repeat` but alternating between *[0;1]* and *[1;0]*.
  MirroredRepeat,
}

/// Minification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MinFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
  /// Nearest mipmap, nearest interpolation.
  NearestMipmapNearest,
  /// Nearest mipmap, linear interpolation.
  NearestMipmapLinear,
  /// Linear interpolation between mipmaps sampled with a nearest filter.
  LinearMipmapNearest,
  /// Linear interpolation between mipmaps sampled with a linear filter.
  LinearMipmapLinear,
}

/// Magnification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MagFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
}

/// How a texture is sampled.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Sampler {
  /// Wrapping of the *r* coordinate.
  pub wrap_r: Wrap,
  /// Wrapping of the *s* coordinate.
  pub wrap_s: Wrap,
  /// Wrapping of the *t* coordinate.
  pub wrap_t: Wrap,
  /// Minification filter.
  pub min_filter: MinFilter,
  /// Magnification filter.
  pub mag_filter: MagFilter,
}

impl Default for Sampler {
  fn default() -> Self {
    Sampler {
      wrap_r: Wrap::ClampToEdge,
      wrap_s: Wrap::ClampToEdge,
      wrap_t: Wrap::ClampToEdge,
      min_filter: MinFilter::NearestMipmapLinear,
      mag_filter: MagFilter::Linear,
    }
  }
}

impl Sampler {
  fn parameters(&self) -> [TextureParameter; 5] {
    [
      TextureParameter::WrapR(self.wrap_r),
      TextureParameter::WrapS(self.wrap_s),
      TextureParameter::WrapT(self.wrap_t),
      TextureParameter::MinFilter(self.min_filter),
      TextureParameter::MagFilter(self.mag_filter),
    ]
  }
}

/// A single texture parameter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureParameter {
  /// Minification filter.
  MinFilter(MinFilter),
  /// Magnification filter.
  MagFilter(MagFilter),
  /// Wrapping of the *s* coordinate.
  WrapS(Wrap),
  /// Wrapping of the *t* coordinate.
  WrapT(Wrap),
  /// Wrapping of the *r* coordinate.
  WrapR(Wrap),
  /// Lowest mipmap level.
  BaseLevel(u32),
  /// Highest mipmap level.
  MaxLevel(u32),
}

/// Texel format.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelFormat {
  /// Red, 8-bit normalized.
  R8,
  /// Red and green, 8-bit normalized.
  RG8,
  /// Red, green and blue, 8-bit normalized.
  RGB8,
  /// Red, green, blue and alpha, 8-bit normalized.
  RGBA8,
  /// Red, 32-bit float.
  R32F,
  /// Red and green, 32-bit float.
  RG32F,
  /// Red, green and blue, 32-bit float.
  RGB32F,
  /// Red, green, blue and alpha, 32-bit float.
  RGBA32F,
  /// Depth, 32-bit float.
  Depth32F,
  /// Depth 24-bit normalized, stencil 8-bit.
  Depth24Stencil8,
}

impl PixelFormat {
  /// Size of a texel in bytes.
  pub fn bytes_per_pixel(self) -> usize {
    match self {
      PixelFormat::R8 => 1,
      PixelFormat::RG8 => 2,
      PixelFormat::RGB8 => 3,
      PixelFormat::RGBA8 => 4,
      PixelFormat::R32F => 4,
      PixelFormat::RG32F => 8,
      PixelFormat::RGB32F => 12,
      PixelFormat::RGBA32F => 16,
      PixelFormat::Depth32F => 4,
      PixelFormat::Depth24Stencil8 => 4,
    }
  }
}

/// Dimension of a texture.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Dim {
  /// 1D.
  Dim1,
  /// 2D.
  Dim2,
  /// 3D.
  Dim3,
  /// Array of 2D layers.
  Dim2Array,
}

/// Reify a type into a [`Dim`].
pub trait Dimensionable {
  /// Size type of a dimension.
  type Size: Copy;

  /// Offset type of a dimension.
  type Offset: Copy;

  /// Zero offset.
  const ZERO_OFFSET: Self::Offset;

  /// Binding target of textures of this dimension.
  const TARGET: Target;

  /// Limit bounding each of the width, the height and the depth.
  const LIMITS: [Limit; 3];

  /// Dimension.
  fn dim() -> Dim;

  /// Width of the associated `Size`.
  fn width(size: Self::Size) -> u32;

  /// Height of the associated `Size`. If it doesn’t have one, set it to 1.
  fn height(_: Self::Size) -> u32 {
    1
  }

  /// Depth of the associated `Size`. If it doesn’t have one, set it to 1.
  fn depth(_: Self::Size) -> u32 {
    1
  }

  /// X offset.
  fn x_offset(offset: Self::Offset) -> u32;

  /// Y offset. If it doesn’t have one, set it to 0.
  fn y_offset(_: Self::Offset) -> u32 {
    0
  }

  /// Z offset. If it doesn’t have one, set it to 0.
  fn z_offset(_: Self::Offset) -> u32 {
    0
  }

  /// Size padded to three components.
  fn extent(size: Self::Size) -> [u32; 3] {
    [Self::width(size), Self::height(size), Self::depth(size)]
  }

  /// Offset padded to three components.
  fn offset(offset: Self::Offset) -> [u32; 3] {
    [
      Self::x_offset(offset),
      Self::y_offset(offset),
      Self::z_offset(offset),
    ]
  }

  /// Amount of texels this size represents.
  fn count(size: Self::Size) -> usize {
    texel_count(Self::extent(size))
  }
}

fn texel_count([w, h, d]: [u32; 3]) -> usize {
  w as usize * h as usize * d as usize
}

/// 1D dimension.
#[derive(Clone, Copy, Debug)]
pub struct Dim1;

impl Dimensionable for Dim1 {
  type Offset = u32;
  type Size = u32;

  const ZERO_OFFSET: Self::Offset = 0;
  const TARGET: Target = Target::Texture1D;
  const LIMITS: [Limit; 3] = [Limit::MaxTextureSize; 3];

  fn dim() -> Dim {
    Dim::Dim1
  }

  fn width(w: Self::Size) -> u32 {
    w
  }

  fn x_offset(off: Self::Offset) -> u32 {
    off
  }
}

/// 2D dimension.
#[derive(Clone, Copy, Debug)]
pub struct Dim2;

impl Dimensionable for Dim2 {
  type Offset = [u32; 2];
  type Size = [u32; 2];

  const ZERO_OFFSET: Self::Offset = [0, 0];
  const TARGET: Target = Target::Texture2D;
  const LIMITS: [Limit; 3] = [Limit::MaxTextureSize; 3];

  fn dim() -> Dim {
    Dim::Dim2
  }

  fn width(size: Self::Size) -> u32 {
    size[0]
  }

  fn height(size: Self::Size) -> u32 {
    size[1]
  }

  fn x_offset(off: Self::Offset) -> u32 {
    off[0]
  }

  fn y_offset(off: Self::Offset) -> u32 {
    off[1]
  }
}

/// 3D dimension.
#[derive(Clone, Copy, Debug)]
pub struct Dim3;

impl Dimensionable for Dim3 {
  type Offset = [u32; 3];
  type Size = [u32; 3];

  const ZERO_OFFSET: Self::Offset = [0, 0, 0];
  const TARGET: Target = Target::Texture3D;
  const LIMITS: [Limit; 3] = [Limit::Max3DTextureSize; 3];

  fn dim() -> Dim {
    Dim::Dim3
  }

  fn width(size: Self::Size) -> u32 {
    size[0]
  }

  fn height(size: Self::Size) -> u32 {
    size[1]
  }

  fn depth(size: Self::Size) -> u32 {
    size[2]
  }

  fn x_offset(off: Self::Offset) -> u32 {
    off[0]
  }

  fn y_offset(off: Self::Offset) -> u32 {
    off[1]
  }

  fn z_offset(off: Self::Offset) -> u32 {
    off[2]
  }
}

/// Array of 2D layers; sizes and offsets are `([x, y], layer)`.
#[derive(Clone, Copy, Debug)]
pub struct Dim2Array;

impl Dimensionable for Dim2Array {
  type Offset = ([u32; 2], u32);
  type Size = ([u32; 2], u32);

  const ZERO_OFFSET: Self::Offset = ([0, 0], 0);
  const TARGET: Target = Target::Texture2DArray;
  const LIMITS: [Limit; 3] = [
    Limit::MaxTextureSize,
    Limit::MaxTextureSize,
    Limit::MaxArrayTextureLayers,
  ];

  fn dim() -> Dim {
    Dim::Dim2Array
  }

  fn width(size: Self::Size) -> u32 {
    size.0[0]
  }

  fn height(size: Self::Size) -> u32 {
    size.0[1]
  }

  fn depth(size: Self::Size) -> u32 {
    size.1
  }

  fn x_offset(off: Self::Offset) -> u32 {
    off.0[0]
  }

  fn y_offset(off: Self::Offset) -> u32 {
    off.0[1]
  }

  fn z_offset(off: Self::Offset) -> u32 {
    off.1
  }
}

// Extent of a mipmap level; array layers don’t shrink.
fn level_extent(dim: Dim, [w, h, d]: [u32; 3], level: u32) -> [u32; 3] {
  let shrink = |x: u32| x.checked_shr(level).unwrap_or(0).max(1);

  match dim {
    Dim::Dim2Array => [shrink(w), shrink(h), d],
    _ => [shrink(w), shrink(h), shrink(d)],
  }
}

/// Texture creation strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureCreate {
  /// Create the texture object right away.
  DirectStateAccess,
  /// Reserve a name; the object is created when first bound.
  Default,
}

impl Strategy for TextureCreate {
  const SLOT: &'static str = "texture create";

  fn requirement(self) -> Requirement {
    match self {
      TextureCreate::DirectStateAccess => {
        Requirement::Extension(extensions::ARB_direct_state_access)
      }
      TextureCreate::Default => Requirement::Always,
    }
  }
}

/// Strategies binding a texture to a layer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureBind {
  /// Bind to a layer by index.
  DirectStateAccess,
  /// One-element multi-bind.
  MultiBind,
  /// Activate the layer, then bind.
  Default,
}

impl Strategy for TextureBind {
  const SLOT: &'static str = "texture bind";

  fn requirement(self) -> Requirement {
    match self {
      TextureBind::DirectStateAccess => Requirement::Extension(extensions::ARB_direct_state_access),
      TextureBind::MultiBind => Requirement::Extension(extensions::ARB_multi_bind),
      TextureBind::Default => Requirement::Always,
    }
  }
}

/// Strategies binding consecutive layers at once.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureMultiBind {
  /// A single driver call.
  MultiBind,
  /// One [`TextureBind`] per layer.
  Fallback,
}

impl Strategy for TextureMultiBind {
  const SLOT: &'static str = "texture multi bind";

  fn requirement(self) -> Requirement {
    match self {
      TextureMultiBind::MultiBind => Requirement::Extension(extensions::ARB_multi_bind),
      TextureMultiBind::Fallback => Requirement::Always,
    }
  }
}

/// Texture parameter strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureParameterUpdate {
  /// Set parameters by handle.
  DirectStateAccess,
  /// Bind to the internal layer, then set.
  Default,
}

impl Strategy for TextureParameterUpdate {
  const SLOT: &'static str = "texture parameter";

  fn requirement(self) -> Requirement {
    match self {
      TextureParameterUpdate::DirectStateAccess => {
        Requirement::Extension(extensions::ARB_direct_state_access)
      }
      TextureParameterUpdate::Default => Requirement::Always,
    }
  }
}

const DSA_STORAGE: &[Requirement] = &[
  Requirement::Extension(extensions::ARB_direct_state_access),
  Requirement::Extension(extensions::ARB_texture_storage),
];

/// Storage allocation strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureStorage {
  /// Immutable storage, by handle.
  DirectStateAccess,
  /// Immutable storage of the bound texture.
  Immutable,
  /// One mutable image per level.
  Mutable,
}

impl Strategy for TextureStorage {
  const SLOT: &'static str = "texture storage";

  fn requirement(self) -> Requirement {
    match self {
      TextureStorage::DirectStateAccess => Requirement::All(DSA_STORAGE),
      TextureStorage::Immutable => Requirement::Extension(extensions::ARB_texture_storage),
      TextureStorage::Mutable => Requirement::Always,
    }
  }
}

const SLICE_BY_SLICE_DSA: &[Requirement] = &[
  Requirement::Workaround(workaround::SVGA3D_TEXTURE_UPLOAD_SLICE_BY_SLICE),
  Requirement::Extension(extensions::ARB_direct_state_access),
];

/// Texel upload strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureSubImage {
  /// One upload per slice, by handle.
  SliceBySliceDirectStateAccess,
  /// One upload per slice of the bound texture.
  SliceBySlice,
  /// Upload by handle.
  DirectStateAccess,
  /// Bind to the internal layer, then upload.
  Default,
}

impl Strategy for TextureSubImage {
  const SLOT: &'static str = "texture sub image";

  fn requirement(self) -> Requirement {
    match self {
      TextureSubImage::SliceBySliceDirectStateAccess => Requirement::All(SLICE_BY_SLICE_DSA),
      TextureSubImage::SliceBySlice => {
        Requirement::Workaround(workaround::SVGA3D_TEXTURE_UPLOAD_SLICE_BY_SLICE)
      }
      TextureSubImage::DirectStateAccess => {
        Requirement::Extension(extensions::ARB_direct_state_access)
      }
      TextureSubImage::Default => Requirement::Always,
    }
  }
}

/// Texel read-back strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureImage {
  /// Bounded read, by handle.
  DirectStateAccess,
  /// Bounded read of the bound texture.
  Robust,
  /// Unbounded read of the bound texture; the size is checked beforehand.
  Default,
}

impl Strategy for TextureImage {
  const SLOT: &'static str = "texture image";

  fn requirement(self) -> Requirement {
    match self {
      TextureImage::DirectStateAccess => Requirement::Extension(extensions::ARB_direct_state_access),
      TextureImage::Robust => Requirement::Extension(extensions::ARB_robustness),
      TextureImage::Default => Requirement::Always,
    }
  }
}

/// Committed texture strategies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TextureDispatch {
  /// How textures are created.
  pub create: Slot<TextureCreate>,
  /// How a texture is bound to a layer.
  pub bind: Slot<TextureBind>,
  /// How consecutive layers are bound.
  pub multi_bind: Slot<TextureMultiBind>,
  /// How parameters are set.
  pub parameter: Slot<TextureParameterUpdate>,
  /// How storage is allocated.
  pub storage: Slot<TextureStorage>,
  /// How texels are uploaded.
  pub sub_image: Slot<TextureSubImage>,
  /// How texels are read back.
  pub image: Slot<TextureImage>,
}

impl Subsystem for TextureDispatch {
  const NAME: &'static str = "texture";

  fn initialize<D>(init: &mut Initializer<D>) -> Self
  where
    D: Driver + ?Sized,
  {
    // the internal layer is needed as soon as a texture is edited
    let (state, driver) = init.state();
    state.limit(&*driver, Limit::MaxTextureLayers);

    TextureDispatch {
      create: init.select(&[TextureCreate::DirectStateAccess, TextureCreate::Default]),
      bind: init.select(&[
        TextureBind::DirectStateAccess,
        TextureBind::MultiBind,
        TextureBind::Default,
      ]),
      multi_bind: init.select(&[TextureMultiBind::MultiBind, TextureMultiBind::Fallback]),
      parameter: init.select(&[
        TextureParameterUpdate::DirectStateAccess,
        TextureParameterUpdate::Default,
      ]),
      storage: init.select(&[
        TextureStorage::DirectStateAccess,
        TextureStorage::Immutable,
        TextureStorage::Mutable,
      ]),
      sub_image: init.select(&[
        TextureSubImage::SliceBySliceDirectStateAccess,
        TextureSubImage::SliceBySlice,
        TextureSubImage::DirectStateAccess,
        TextureSubImage::Default,
      ]),
      // DSA first: a robust read of the bound texture would still need the internal bind
      image: init.select(&[
        TextureImage::DirectStateAccess,
        TextureImage::Robust,
        TextureImage::Default,
      ]),
    }
  }
}

/// Texture error.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TextureError {
  /// A requested extent is above what the driver supports.
  SizeExceedsLimit {
    /// Limit bounding the extent.
    limit: Limit,
    /// Requested extent.
    requested: u32,
    /// Value of the limit.
    max: i32,
  },
  /// The layer doesn’t exist.
  LayerOutOfRange {
    /// First layer out of range.
    layer: u32,
    /// Number of layers.
    max: i32,
  },
  /// The number of bytes doesn’t match the region.
  DataSizeMismatch {
    /// Expected number of bytes.
    expected: usize,
    /// Provided number of bytes.
    actual: usize,
  },
  /// The texture has no storage yet.
  MissingStorage,
}

impl fmt::Display for TextureError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      TextureError::SizeExceedsLimit {
        limit,
        requested,
        max,
      } => write!(f, "texture extent {} exceeds {:?} ({})", requested, limit, max),

      TextureError::LayerOutOfRange { layer, max } => {
        write!(f, "texture layer {} out of range (max: {})", layer, max)
      }

      TextureError::DataSizeMismatch { expected, actual } => write!(
        f,
        "texture data size mismatch: expected {} bytes, got {}",
        expected, actual
      ),

      TextureError::MissingStorage => f.write_str("texture has no storage"),
    }
  }
}

impl error::Error for TextureError {}

/// A texture, without its dimension; see [`bind_textures`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TextureBinding {
  /// Target the texture binds to.
  pub target: Target,
  /// Driver handle.
  pub handle: Handle,
}

#[derive(Clone, Copy, Debug)]
struct Storage {
  levels: u32,
  format: PixelFormat,
  extent: [u32; 3],
}

/// A texture of dimension `Dm`.
#[derive(Debug)]
pub struct Texture<D, Dm>
where
  D: Driver,
{
  handle: Handle,
  sampler: Sampler,
  storage: Option<Storage>,
  ctx: Shared<D>,
  _dim: PhantomData<Dm>,
}

impl<D, Dm> Drop for Texture<D, Dm>
where
  D: Driver,
{
  fn drop(&mut self) {
    let inner = &mut *self.ctx.borrow_mut();
    inner.state.forget(ResourceKind::Texture, self.handle);
    inner.driver.delete(ResourceKind::Texture, self.handle);
  }
}

impl<D, Dm> Texture<D, Dm>
where
  D: Driver,
  Dm: Dimensionable,
{
  /// Create a texture without storage.
  pub fn new(ctx: &mut Context<D>, sampler: Sampler) -> Self {
    let shared = ctx.shared();

    let handle = {
      let inner = &mut *shared.borrow_mut();

      match inner.dispatch.texture.create.get() {
        TextureCreate::DirectStateAccess => inner.driver.create(Dm::TARGET),
        TextureCreate::Default => inner.driver.gen(ResourceKind::Texture),
      }
    };

    let mut texture = Texture {
      handle,
      sampler,
      storage: None,
      ctx: shared,
      _dim: PhantomData,
    };

    texture.set_sampler(sampler);
    texture
  }

  /// Driver handle.
  #[inline]
  pub fn handle(&self) -> Handle {
    self.handle
  }

  /// The texture, without its dimension.
  #[inline]
  pub fn binding(&self) -> TextureBinding {
    TextureBinding {
      target: Dm::TARGET,
      handle: self.handle,
    }
  }

  /// Current sampler.
  #[inline]
  pub fn sampler(&self) -> Sampler {
    self.sampler
  }

  /// Number of mipmap levels, if storage was allocated.
  pub fn levels(&self) -> Option<u32> {
    self.storage.map(|s| s.levels)
  }

  /// Change how the texture is sampled.
  pub fn set_sampler(&mut self, sampler: Sampler) {
    self.sampler = sampler;

    for parameter in sampler.parameters() {
      self.set_parameter(parameter);
    }
  }

  /// Set a single parameter.
  pub fn set_parameter(&mut self, parameter: TextureParameter) {
    let inner = &mut *self.ctx.borrow_mut();

    match inner.dispatch.texture.parameter.get() {
      TextureParameterUpdate::DirectStateAccess => {
        inner.driver.named_texture_parameter(self.handle, parameter)
      }

      TextureParameterUpdate::Default => {
        bind_internal(inner, Dm::TARGET, self.handle);
        inner.driver.texture_parameter(Dm::TARGET, parameter);
      }
    }
  }

  /// Allocate storage for `levels` mipmap levels (at least one).
  pub fn set_storage(
    &mut self,
    levels: u32,
    format: PixelFormat,
    size: Dm::Size,
  ) -> Result<(), TextureError> {
    let levels = levels.max(1);
    let extent = Dm::extent(size);
    let inner = &mut *self.ctx.borrow_mut();

    for (&requested, &limit) in extent.iter().zip(Dm::LIMITS.iter()) {
      let max = inner.state.limit(&inner.driver, limit);

      if i64::from(requested) > i64::from(max) {
        return Err(TextureError::SizeExceedsLimit {
          limit,
          requested,
          max,
        });
      }
    }

    match inner.dispatch.texture.storage.get() {
      TextureStorage::DirectStateAccess => {
        inner
          .driver
          .named_texture_storage(self.handle, levels, format, extent)
      }

      TextureStorage::Immutable => {
        bind_internal(inner, Dm::TARGET, self.handle);
        inner.driver.texture_storage(Dm::TARGET, levels, format, extent);
      }

      TextureStorage::Mutable => {
        bind_internal(inner, Dm::TARGET, self.handle);

        for level in 0..levels {
          let level_extent = level_extent(Dm::dim(), extent, level);
          inner
            .driver
            .texture_image(Dm::TARGET, level, format, level_extent);
        }

        // mutable textures otherwise expect a full mipmap chain
        inner
          .driver
          .texture_parameter(Dm::TARGET, TextureParameter::MaxLevel(levels - 1));
      }
    }

    self.storage = Some(Storage {
      levels,
      format,
      extent,
    });

    Ok(())
  }

  /// Upload texels into a region of a level.
  pub fn set_sub_image(
    &mut self,
    level: u32,
    offset: Dm::Offset,
    size: Dm::Size,
    texels: &[u8],
  ) -> Result<(), TextureError> {
    let storage = self.storage.ok_or(TextureError::MissingStorage)?;
    let format = storage.format;
    let offset = Dm::offset(offset);
    let size = Dm::extent(size);
    let expected = texel_count(size) * format.bytes_per_pixel();

    if texels.len() != expected {
      return Err(TextureError::DataSizeMismatch {
        expected,
        actual: texels.len(),
      });
    }

    let inner = &mut *self.ctx.borrow_mut();

    match inner.dispatch.texture.sub_image.get() {
      TextureSubImage::SliceBySliceDirectStateAccess => {
        for_each_slice(offset, size, format, texels, |offset, size, texels| {
          inner
            .driver
            .named_texture_sub_image(self.handle, level, offset, size, format, texels)
        })
      }

      TextureSubImage::SliceBySlice => {
        bind_internal(inner, Dm::TARGET, self.handle);

        for_each_slice(offset, size, format, texels, |offset, size, texels| {
          inner
            .driver
            .texture_sub_image(Dm::TARGET, level, offset, size, format, texels)
        })
      }

      TextureSubImage::DirectStateAccess => {
        inner
          .driver
          .named_texture_sub_image(self.handle, level, offset, size, format, texels)
      }

      TextureSubImage::Default => {
        bind_internal(inner, Dm::TARGET, self.handle);
        inner
          .driver
          .texture_sub_image(Dm::TARGET, level, offset, size, format, texels);
      }
    }

    Ok(())
  }

  /// Read a whole level back into `out`, which must be exactly the size of the level.
  pub fn image(&self, level: u32, out: &mut [u8]) -> Result<(), TextureError> {
    let storage = self.storage.ok_or(TextureError::MissingStorage)?;
    let extent = level_extent(Dm::dim(), storage.extent, level);
    let expected = texel_count(extent) * storage.format.bytes_per_pixel();

    if out.len() != expected {
      return Err(TextureError::DataSizeMismatch {
        expected,
        actual: out.len(),
      });
    }

    let inner = &mut *self.ctx.borrow_mut();

    match inner.dispatch.texture.image.get() {
      TextureImage::DirectStateAccess => {
        inner
          .driver
          .read_named_texture_image(self.handle, level, storage.format, out)
      }

      TextureImage::Robust => {
        bind_internal(inner, Dm::TARGET, self.handle);
        inner
          .driver
          .read_texture_image_robust(Dm::TARGET, level, storage.format, out);
      }

      TextureImage::Default => {
        bind_internal(inner, Dm::TARGET, self.handle);
        inner
          .driver
          .read_texture_image(Dm::TARGET, level, storage.format, out);
      }
    }

    Ok(())
  }

  /// Bind the texture to `layer`, returning whether the driver was called.
  pub fn bind(&self, layer: u32) -> Result<bool, TextureError> {
    let inner = &mut *self.ctx.borrow_mut();
    check_layers(inner, layer, 1)?;

    Ok(bind_one(inner, layer, self.binding()))
  }
}

/// Bind textures to consecutive layers starting at `first`; [`None`] unbinds a layer.
///
/// Returns whether the driver was called.
pub fn bind_textures<D>(
  ctx: &mut Context<D>,
  first: u32,
  textures: &[Option<TextureBinding>],
) -> Result<bool, TextureError>
where
  D: Driver,
{
  let shared = ctx.shared();
  let inner = &mut *shared.borrow_mut();
  check_layers(inner, first, textures.len())?;

  let called = match inner.dispatch.texture.multi_bind.get() {
    TextureMultiBind::MultiBind => {
      let layers = (first..).zip(textures);
      let up_to_date = layers.clone().all(|(layer, texture)| match texture {
        Some(b) => inner.state.is_layer_bound(layer, b.target, b.handle),
        None => matches!(inner.state.layer_binding(layer), Some((_, h)) if h.is_none()),
      });

      if up_to_date {
        false
      } else {
        let handles: Vec<Handle> = textures
          .iter()
          .map(|t| t.map_or(Handle::NONE, |b| b.handle))
          .collect();
        inner.driver.bind_layers(first, &handles);

        for (layer, texture) in layers {
          record_binding(inner, layer, *texture);
        }

        true
      }
    }

    TextureMultiBind::Fallback => {
      let mut called = false;

      for (layer, texture) in (first..).zip(textures) {
        called |= match texture {
          Some(b) => bind_one(inner, layer, *b),
          None => unbind_one(inner, layer),
        };
      }

      called
    }
  };

  Ok(called)
}

fn check_layers<D>(inner: &mut ContextInner<D>, first: u32, count: usize) -> Result<(), TextureError>
where
  D: Driver,
{
  let max = inner.state.limit(&inner.driver, Limit::MaxTextureLayers);
  let end = u64::from(first) + count as u64;

  if end > max.max(0) as u64 {
    let layer = first.max(max.max(0) as u32);
    Err(TextureError::LayerOutOfRange { layer, max })
  } else {
    Ok(())
  }
}

fn record_binding<D>(inner: &mut ContextInner<D>, layer: u32, texture: Option<TextureBinding>)
where
  D: Driver,
{
  match texture {
    Some(b) => inner.state.record_layer_binding(layer, b.target, b.handle),

    // every target of the layer is unbound, so any target stands for the layer
    None => {
      let target = inner
        .state
        .layer_binding(layer)
        .map_or(Target::Texture2D, |(target, _)| target);
      inner.state.record_layer_binding(layer, target, Handle::NONE);
    }
  }
}

fn bind_one<D>(inner: &mut ContextInner<D>, layer: u32, binding: TextureBinding) -> bool
where
  D: Driver,
{
  let TextureBinding { target, handle } = binding;

  if inner.state.is_layer_bound(layer, target, handle) {
    return false;
  }

  match inner.dispatch.texture.bind.get() {
    TextureBind::DirectStateAccess => {
      inner.driver.bind_layer(layer, handle);
      inner.state.record_layer_binding(layer, target, handle);
      true
    }

    TextureBind::MultiBind => {
      inner.driver.bind_layers(layer, &[handle]);
      inner.state.record_layer_binding(layer, target, handle);
      true
    }

    TextureBind::Default => inner
      .state
      .bind_layer(&mut inner.driver, layer, target, handle),
  }
}

fn unbind_one<D>(inner: &mut ContextInner<D>, layer: u32) -> bool
where
  D: Driver,
{
  let known = inner.state.layer_binding(layer);

  if matches!(known, Some((_, h)) if h.is_none()) {
    return false;
  }

  match inner.dispatch.texture.bind.get() {
    TextureBind::DirectStateAccess => {
      inner.driver.bind_layer(layer, Handle::NONE);
      record_binding(inner, layer, None);
      true
    }

    TextureBind::MultiBind => {
      inner.driver.bind_layers(layer, &[Handle::NONE]);
      record_binding(inner, layer, None);
      true
    }

    // unbinding needs the target the layer holds
    TextureBind::Default => match known {
      Some((target, _)) => inner
        .state
        .bind_layer(&mut inner.driver, layer, target, Handle::NONE),
      None => false,
    },
  }
}

// Bind a texture for bind-to-edit entry points. The active layer is reused if it already holds
// the texture; otherwise the last layer is used.
fn bind_internal<D>(inner: &mut ContextInner<D>, target: Target, handle: Handle)
where
  D: Driver,
{
  if let Some(active) = inner.state.active_layer() {
    if inner.state.is_layer_bound(active, target, handle) {
      return;
    }
  }

  let layers = inner.state.limit(&inner.driver, Limit::MaxTextureLayers);
  let internal = layers.max(1) as u32 - 1;

  // the internal layer may already hold the texture while another layer is active
  inner.state.set_active_layer(&mut inner.driver, internal);
  inner
    .state
    .bind_layer(&mut inner.driver, internal, target, handle);
}

fn for_each_slice<F>(offset: [u32; 3], size: [u32; 3], format: PixelFormat, texels: &[u8], mut f: F)
where
  F: FnMut([u32; 3], [u32; 3], &[u8]),
{
  let slice_len = texel_count([size[0], size[1], 1]) * format.bytes_per_pixel();

  for z in 0..size[2] {
    let start = z as usize * slice_len;
    f(
      [offset[0], offset[1], offset[2] + z],
      [size[0], size[1], 1],
      &texels[start..start + slice_len],
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extents() {
    assert_eq!(Dim1::extent(16), [16, 1, 1]);
    assert_eq!(Dim2::extent([4, 8]), [4, 8, 1]);
    assert_eq!(Dim2Array::extent(([4, 8], 3)), [4, 8, 3]);
    assert_eq!(Dim2Array::offset(([1, 2], 3)), [1, 2, 3]);
    assert_eq!(Dim2::offset(Dim2::ZERO_OFFSET), [0, 0, 0]);
    assert_eq!(Dim3::count([2, 3, 4]), 24);
  }

  #[test]
  fn mipmap_extents() {
    assert_eq!(level_extent(Dim::Dim2, [16, 4, 1], 0), [16, 4, 1]);
    assert_eq!(level_extent(Dim::Dim2, [16, 4, 1], 3), [2, 1, 1]);
    assert_eq!(level_extent(Dim::Dim3, [8, 8, 8], 2), [2, 2, 2]);
    assert_eq!(level_extent(Dim::Dim2Array, [8, 8, 6], 2), [2, 2, 6]);
    assert_eq!(level_extent(Dim::Dim1, [8, 1, 1], 40), [1, 1, 1]);
  }

  #[test]
  fn slices() {
    let texels: Vec<u8> = (0..24).collect();
    let mut seen = Vec::new();

    for_each_slice([0, 0, 2], [2, 3, 2], PixelFormat::RG8, &texels, |offset, size, t| {
      seen.push((offset, size, t[0]));
    });

    assert_eq!(seen, vec![([0, 0, 2], [2, 3, 1], 0), ([0, 0, 3], [2, 3, 1], 12)]);
  }

  #[test]
  fn sampler_parameters() {
    let params = Sampler::default().parameters();
    assert!(params.contains(&TextureParameter::MinFilter(MinFilter::NearestMipmapLinear)));
    assert!(params.contains(&TextureParameter::MagFilter(MagFilter::Linear)));
  }
}
