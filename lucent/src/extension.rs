//! Extension registry.
//!
//! Every extension lucent knows about is described by a constant [`Extension`] in the
//! [`extensions`] module. An extension carries two version tiers:
//!
//! - `required`: the lowest tier at which the extension is usable at all;
//! - `core`: the tier at which the extension functionality was folded into the core API, if
//!   ever. From that tier on, the extension is available whether or not the driver advertises
//!   its name.
//!
//! Vendor extensions never became core and have `core` set to [`None`].

use std::fmt;

use crate::version::Version;

/// A known driver extension.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Extension {
  index: usize,
  name: &'static str,
  required: Version,
  core: Option<Version>,
}

impl Extension {
  /// Dense index of the extension in the registry.
  #[inline]
  pub const fn index(self) -> usize {
    self.index
  }

  /// Name as advertised by drivers, e.g. `GL_ARB_direct_state_access`.
  #[inline]
  pub const fn name(self) -> &'static str {
    self.name
  }

  /// Lowest version tier the extension can be used with.
  #[inline]
  pub const fn required_version(self) -> Version {
    self.required
  }

  /// Version tier at which the extension became core, if any.
  #[inline]
  pub const fn core_version(self) -> Option<Version> {
    self.core
  }

  /// All known extensions, sorted by index.
  pub fn all() -> &'static [Extension] {
    extensions::ALL
  }

  /// Look an extension up by its driver name.
  pub fn by_name(name: &str) -> Option<Extension> {
    extensions::ALL.iter().copied().find(|e| e.name == name)
  }

  /// Extensions that became core exactly at `version`.
  pub fn core_in(version: Version) -> impl Iterator<Item = Extension> {
    extensions::ALL
      .iter()
      .copied()
      .filter(move |e| e.core == Some(version))
  }

  /// Extensions that never became core.
  pub fn vendor() -> impl Iterator<Item = Extension> {
    extensions::ALL.iter().copied().filter(|e| e.core.is_none())
  }
}

impl fmt::Debug for Extension {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name)
  }
}

impl fmt::Display for Extension {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name)
  }
}

macro_rules! core_version {
  (None) => {
    None
  };
  ($version:ident) => {
    Some(Version::$version)
  };
}

macro_rules! extensions {
  ($($index:literal $ident:ident $required:ident $core:ident;)*) => {
    $(
      #[allow(missing_docs)]
      pub const $ident: Extension = Extension {
        index: $index,
        name: concat!("GL_", stringify!($ident)),
        required: Version::$required,
        core: core_version!($core),
      };
    )*

    pub(crate) const ALL: &[Extension] = &[$($ident),*];
  }
}

/// Known extensions.
#[allow(non_upper_case_globals)]
pub mod extensions {
  use super::Extension;
  use crate::version::Version;

  extensions! {
    0 AMD_vertex_shader_layer GL21 None;
    1 AMD_shader_trinary_minmax GL21 None;
    2 ARB_texture_rectangle GL21 GL31;
    3 ARB_color_buffer_float GL21 GL30;
    4 ARB_half_float_pixel GL21 GL30;
    5 ARB_texture_float GL21 GL30;
    6 ARB_depth_buffer_float GL21 GL30;
    7 ARB_draw_instanced GL21 GL31;
    8 ARB_framebuffer_object GL21 GL30;
    9 ARB_framebuffer_sRGB GL21 GL30;
    10 ARB_geometry_shader4 GL21 GL32;
    11 ARB_instanced_arrays GL21 GL33;
    12 ARB_map_buffer_range GL21 GL30;
    13 ARB_texture_buffer_object GL21 GL31;
    14 ARB_texture_rg GL21 GL30;
    15 ARB_vertex_array_object GL21 GL30;
    16 ARB_uniform_buffer_object GL21 GL31;
    17 ARB_copy_buffer GL21 GL31;
    18 ARB_depth_clamp GL21 GL32;
    19 ARB_draw_elements_base_vertex GL21 GL32;
    20 ARB_seamless_cube_map GL21 GL32;
    21 ARB_sync GL31 GL32;
    22 ARB_texture_multisample GL21 GL32;
    23 ARB_blend_func_extended GL21 GL33;
    24 ARB_explicit_attrib_location GL21 GL33;
    25 ARB_sampler_objects GL21 GL33;
    26 ARB_timer_query GL21 GL33;
    27 ARB_draw_indirect GL31 GL40;
    28 ARB_gpu_shader5 GL32 GL40;
    29 ARB_tessellation_shader GL32 GL40;
    30 ARB_transform_feedback2 GL21 GL40;
    31 ARB_get_program_binary GL30 GL41;
    32 ARB_separate_shader_objects GL21 GL41;
    33 ARB_viewport_array GL21 GL41;
    34 ARB_robustness GL21 None;
    35 ARB_base_instance GL21 GL42;
    36 ARB_shading_language_420pack GL30 GL42;
    37 ARB_shader_image_load_store GL30 GL42;
    38 ARB_texture_storage GL21 GL42;
    39 ARB_compute_shader GL42 GL43;
    40 ARB_copy_image GL21 GL43;
    41 ARB_vertex_attrib_binding GL21 GL43;
    42 ARB_explicit_uniform_location GL21 GL43;
    43 ARB_invalidate_subdata GL21 GL43;
    44 ARB_multi_draw_indirect GL31 GL43;
    45 ARB_shader_storage_buffer_object GL40 GL43;
    46 ARB_buffer_storage GL43 GL44;
    47 ARB_multi_bind GL30 GL44;
    48 ARB_clip_control GL21 GL45;
    49 ARB_direct_state_access GL21 GL45;
    50 ARB_get_texture_sub_image GL21 GL45;
    51 ARB_texture_filter_anisotropic GL21 GL46;
    52 EXT_texture_filter_anisotropic GL21 None;
    53 EXT_texture_compression_s3tc GL21 None;
    54 EXT_texture_array GL21 GL30;
    55 EXT_texture_sRGB_decode GL21 None;
    56 EXT_debug_label GL21 None;
    57 EXT_debug_marker GL21 None;
    58 GREMEDY_string_marker GL21 None;
    59 KHR_debug GL21 GL43;
    60 KHR_robustness GL32 GL45;
    61 KHR_no_error GL21 GL46;
    62 NV_primitive_restart GL21 GL31;
  }
}

// presence sets are stored as a single 128-bit mask
const _: () = assert!(extensions::ALL.len() <= 128);
