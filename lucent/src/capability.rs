//! Capability detection.
//!
//! A [`CapabilitySet`] is computed once, when a context is created, and never changes
//! afterwards. It answers “can feature F be used?” for every known [`Extension`]:
//!
//! - an extension is usable if the driver advertises it **or** if the context version is at
//!   least the version the extension became core in;
//! - a driver workaround or the user may disable an extension, in which case it is never usable,
//!   whatever the version.

use std::collections::HashMap;

use log::debug;

use crate::context::ContextError;
use crate::driver::{ContextFlags, Driver};
use crate::extension::{extensions, Extension};
use crate::opt::ContextOpt;
use crate::version::{parse_version_numbers, Version};
use crate::workaround::{self, DetectedDrivers, Workarounds};

/// Snapshot of what a driver can do.
#[derive(Clone, Debug)]
pub struct CapabilitySet {
  version: Version,
  flags: ContextFlags,
  vendor: String,
  renderer: String,
  version_string: String,
  drivers: DetectedDrivers,
  // one bit per extension index
  present: u128,
  // None for disabled extensions
  required: Vec<Option<Version>>,
  supported: Vec<Extension>,
  disabled: Vec<Extension>,
  workarounds: Workarounds,
}

#[inline]
fn bit(extension: Extension) -> u128 {
  1 << extension.index()
}

impl CapabilitySet {
  fn empty(version: Version) -> Self {
    CapabilitySet {
      version,
      flags: ContextFlags::empty(),
      vendor: String::new(),
      renderer: String::new(),
      version_string: String::new(),
      drivers: DetectedDrivers::empty(),
      present: 0,
      required: Extension::all()
        .iter()
        .map(|e| Some(e.required_version()))
        .collect(),
      supported: Vec::new(),
      disabled: Vec::new(),
      workarounds: Workarounds::default(),
    }
  }

  /// Start building a set by hand, without a driver.
  pub fn builder(version: Version) -> CapabilitySetBuilder {
    CapabilitySetBuilder {
      caps: CapabilitySet::empty(version),
      disabled_workarounds: Vec::new(),
      disabled_extensions: Vec::new(),
    }
  }

  /// Query `driver` for its version and extensions.
  ///
  /// Fails if the version is below [`Version::MINIMUM`] or can’t be read at all.
  pub fn detect<D>(driver: &D, opt: &ContextOpt) -> Result<Self, ContextError>
  where
    D: Driver + ?Sized,
  {
    let version_string = driver.version_string();
    let (major, minor) = match driver.version_numbers() {
      Some(numbers) => numbers,
      None => parse_version_numbers(&version_string)
        .ok_or_else(|| ContextError::UnsupportedVersionString(version_string.clone()))?,
    };
    let version = Version::from_numbers(major, minor)
      .ok_or(ContextError::UnsupportedVersion { major, minor })?;

    let mut caps = CapabilitySet::empty(version);
    caps.vendor = driver.vendor();
    caps.renderer = driver.renderer();
    caps.drivers = DetectedDrivers::detect(&caps.vendor, &caps.renderer, &version_string);
    caps.version_string = version_string;

    if version >= Version::GL30 {
      caps.flags = driver.context_flags();
    }

    // everything folded into this version is there, whatever the driver advertises
    for e in Extension::all() {
      if e.core_version().map_or(false, |core| core <= version) {
        caps.present |= bit(*e);
      }
    }

    // only names that can still change the answer are worth looking up
    let future: HashMap<&'static str, Extension> = Extension::all()
      .iter()
      .filter(|e| e.core_version().map_or(true, |core| core > version))
      .map(|e| (e.name(), *e))
      .collect();

    match driver.extension_count() {
      Some(count) => {
        for i in 0..count {
          caps.probe(&future, &driver.extension_name(i));
        }
      }

      None => {
        let list = driver.extension_list();

        for name in list.split(' ').filter(|name| !name.is_empty()) {
          caps.probe(&future, name);
        }
      }
    }

    Ok(caps.finish(opt.disabled_workarounds(), opt.disabled_extensions()))
  }

  fn probe(&mut self, future: &HashMap<&'static str, Extension>, name: &str) {
    if let Some(&e) = future.get(name) {
      if self.present & bit(e) == 0 {
        self.present |= bit(e);
        self.supported.push(e);
      }
    }
  }

  // Apply workarounds, then user-disabled extensions.
  fn finish<W, E>(mut self, disabled_workarounds: &[W], disabled_extensions: &[E]) -> Self
  where
    W: AsRef<str>,
    E: AsRef<str>,
  {
    self.workarounds = Workarounds::detect(self.drivers, disabled_workarounds, |e| self.supports(e));

    if self.workarounds.is_active(workaround::NO_LAYOUT_QUALIFIERS_ON_OLD_GLSL) {
      for e in [
        extensions::ARB_explicit_attrib_location,
        extensions::ARB_explicit_uniform_location,
        extensions::ARB_shading_language_420pack,
      ] {
        self.raise_required(e, Version::GL32);
      }
    }

    if self.workarounds.is_active(workaround::SVGA3D_GETTEXSUBIMAGE_OOB_WRITE) {
      self.required[extensions::ARB_get_texture_sub_image.index()] = None;
    }

    for name in disabled_extensions {
      let name = name.as_ref();
      let found = Extension::by_name(name).or_else(|| Extension::by_name(&format!("GL_{}", name)));

      match found {
        Some(e) => {
          self.required[e.index()] = None;

          if !self.disabled.contains(&e) {
            self.disabled.push(e);
          }
        }

        None => debug!("ignoring unknown extension {}", name),
      }
    }

    self
  }

  fn raise_required(&mut self, extension: Extension, version: Version) {
    if let Some(required) = &mut self.required[extension.index()] {
      if *required < version {
        *required = version;
      }
    }
  }

  /// Version tier of the context.
  pub fn version(&self) -> Version {
    self.version
  }

  /// Whether the context is at least `version`.
  pub fn is_version_supported(&self, version: Version) -> bool {
    self.version >= version
  }

  /// First supported version of `versions`, or [`Version::MINIMUM`] if none is.
  pub fn supported_version(&self, versions: &[Version]) -> Version {
    versions
      .iter()
      .copied()
      .find(|v| self.is_version_supported(*v))
      .unwrap_or(Version::MINIMUM)
  }

  /// Whether `extension` can be used.
  pub fn supports(&self, extension: Extension) -> bool {
    match self.required[extension.index()] {
      Some(required) if self.version >= required => {
        self.present & bit(extension) != 0
          || extension
            .core_version()
            .map_or(false, |core| self.version >= core)
      }

      _ => false,
    }
  }

  /// Whether `extension` was disabled, by a workaround or by the user.
  pub fn is_extension_disabled(&self, extension: Extension) -> bool {
    self.required[extension.index()].is_none()
  }

  /// Whether `extension` is only usable because the driver advertises it.
  pub fn is_optional(&self, extension: Extension) -> bool {
    extension
      .core_version()
      .map_or(true, |core| self.version < core)
  }

  /// Extensions the driver advertises beyond what the version implies.
  pub fn supported_extensions(&self) -> &[Extension] {
    &self.supported
  }

  /// Extensions disabled by the user.
  pub fn disabled_extensions(&self) -> &[Extension] {
    &self.disabled
  }

  /// Context flags; empty before 3.0.
  pub fn flags(&self) -> ContextFlags {
    self.flags
  }

  /// Driver vendor string.
  pub fn vendor(&self) -> &str {
    &self.vendor
  }

  /// Renderer string.
  pub fn renderer(&self) -> &str {
    &self.renderer
  }

  /// Full version string.
  pub fn version_string(&self) -> &str {
    &self.version_string
  }

  /// Recognized driver families.
  pub fn drivers(&self) -> DetectedDrivers {
    self.drivers
  }

  /// Workarounds in effect.
  pub fn workarounds(&self) -> &Workarounds {
    &self.workarounds
  }
}

/// Hand-made [`CapabilitySet`].
#[derive(Clone, Debug)]
pub struct CapabilitySetBuilder {
  caps: CapabilitySet,
  disabled_workarounds: Vec<String>,
  disabled_extensions: Vec<String>,
}

impl CapabilitySetBuilder {
  /// Mark `extension` as advertised.
  pub fn extension(mut self, extension: Extension) -> Self {
    if self.caps.present & bit(extension) == 0 {
      self.caps.present |= bit(extension);
      self.caps.supported.push(extension);
    }

    self
  }

  /// Pretend to run on `drivers`.
  pub fn drivers(mut self, drivers: DetectedDrivers) -> Self {
    self.caps.drivers = drivers;
    self
  }

  /// Set the context flags.
  pub fn flags(mut self, flags: ContextFlags) -> Self {
    self.caps.flags = flags;
    self
  }

  /// Disable an extension by name.
  pub fn disable_extension(mut self, name: impl Into<String>) -> Self {
    self.disabled_extensions.push(name.into());
    self
  }

  /// Disable a workaround by name.
  pub fn disable_workaround(mut self, name: impl Into<String>) -> Self {
    self.disabled_workarounds.push(name.into());
    self
  }

  /// Build the set, applying workarounds and disabled extensions.
  pub fn build(self) -> CapabilitySet {
    self.caps.finish(
      self.disabled_workarounds.as_slice(),
      self.disabled_extensions.as_slice(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn core_version_implies_support() {
    let caps = CapabilitySet::builder(Version::GL30).build();

    assert!(caps.supports(extensions::ARB_vertex_array_object));
    assert!(caps.supports(extensions::ARB_framebuffer_object));
    assert!(!caps.supports(extensions::ARB_draw_elements_base_vertex));
    assert!(caps.supported_extensions().is_empty());
  }

  #[test]
  fn advertised_extension_is_supported() {
    let caps = CapabilitySet::builder(Version::GL21)
      .extension(extensions::ARB_vertex_array_object)
      .build();

    assert!(caps.supports(extensions::ARB_vertex_array_object));
    assert!(!caps.supports(extensions::ARB_texture_storage));
  }

  #[test]
  fn required_version_gates_advertised_extension() {
    // ARB_multi_bind needs a 3.0 context even when advertised
    let caps = CapabilitySet::builder(Version::GL21)
      .extension(extensions::ARB_multi_bind)
      .build();

    assert!(!caps.supports(extensions::ARB_multi_bind));
  }

  #[test]
  fn disabled_extension() {
    let caps = CapabilitySet::builder(Version::GL45)
      .disable_extension("GL_ARB_direct_state_access")
      .disable_extension("ARB_multi_bind")
      .disable_extension("GL_NOT_an_extension")
      .build();

    assert!(!caps.supports(extensions::ARB_direct_state_access));
    assert!(!caps.supports(extensions::ARB_multi_bind));
    assert!(caps.is_extension_disabled(extensions::ARB_direct_state_access));
    assert_eq!(
      caps.disabled_extensions(),
      &[
        extensions::ARB_direct_state_access,
        extensions::ARB_multi_bind
      ]
    );
  }

  #[test]
  fn layout_qualifiers_need_glsl_150() {
    let caps = CapabilitySet::builder(Version::GL30)
      .extension(extensions::ARB_explicit_attrib_location)
      .build();
    assert!(!caps.supports(extensions::ARB_explicit_attrib_location));

    let caps = CapabilitySet::builder(Version::GL30)
      .extension(extensions::ARB_explicit_attrib_location)
      .disable_workaround(workaround::NO_LAYOUT_QUALIFIERS_ON_OLD_GLSL)
      .build();
    assert!(caps.supports(extensions::ARB_explicit_attrib_location));
  }

  #[test]
  fn svga3d_disables_get_texture_sub_image() {
    let caps = CapabilitySet::builder(Version::GL45)
      .drivers(DetectedDrivers::MESA | DetectedDrivers::SVGA3D)
      .build();

    assert!(!caps.supports(extensions::ARB_get_texture_sub_image));
    assert!(caps.supports(extensions::ARB_direct_state_access));
    assert!(caps.workarounds().is_active(workaround::SVGA3D_BROKEN_DSA_BUFFERDATA));
  }

  #[test]
  fn supported_version() {
    let caps = CapabilitySet::builder(Version::GL33).build();

    assert_eq!(
      caps.supported_version(&[Version::GL45, Version::GL33, Version::GL21]),
      Version::GL33
    );
    assert_eq!(caps.supported_version(&[Version::GL46]), Version::MINIMUM);
    assert!(caps.is_version_supported(Version::GL32));
    assert!(!caps.is_version_supported(Version::GL40));
  }

  #[test]
  fn optional() {
    let caps = CapabilitySet::builder(Version::GL33).build();

    assert!(!caps.is_optional(extensions::ARB_vertex_array_object));
    assert!(caps.is_optional(extensions::ARB_direct_state_access));
    assert!(caps.is_optional(extensions::ARB_robustness));
  }
}
