//! Driver detection and driver-specific workarounds.
//!
//! Some drivers advertise features they don’t implement correctly. Each known problem has a
//! named workaround; a workaround is active when the detected drivers match it and the user
//! didn’t disable it by name (see [`ContextOpt::set_disabled_workarounds`]).
//!
//! [`ContextOpt::set_disabled_workarounds`]: crate::opt::ContextOpt::set_disabled_workarounds

use bitflags::bitflags;
use log::warn;

use crate::extension::{extensions, Extension};

bitflags! {
  /// Driver families recognized from the vendor, renderer and version strings.
  pub struct DetectedDrivers: u8 {
    /// AMD proprietary drivers.
    const AMD = 0x01;
    /// Intel drivers.
    const INTEL = 0x02;
    /// Mesa drivers.
    const MESA = 0x04;
    /// NVIDIA proprietary drivers.
    const NVIDIA = 0x08;
    /// VMware SVGA3D, on top of Mesa.
    const SVGA3D = 0x10;
    /// SwiftShader software renderer.
    const SWIFTSHADER = 0x20;
  }
}

impl DetectedDrivers {
  /// Recognize drivers from the strings they report.
  pub fn detect(vendor: &str, renderer: &str, version: &str) -> Self {
    let mut drivers = DetectedDrivers::empty();

    if vendor.contains("ATI Technologies Inc.") {
      drivers |= DetectedDrivers::AMD;
    }

    if vendor.contains("Intel") {
      drivers |= DetectedDrivers::INTEL;
    }

    if version.contains("Mesa") {
      drivers |= DetectedDrivers::MESA;

      if renderer.contains("SVGA3D") {
        drivers |= DetectedDrivers::SVGA3D;
      }
    }

    if vendor.contains("NVIDIA Corporation") {
      drivers |= DetectedDrivers::NVIDIA;
    }

    if renderer.contains("SwiftShader") {
      drivers |= DetectedDrivers::SWIFTSHADER;
    }

    drivers
  }
}

/// Shading languages older than 1.50 reject layout qualifiers even when the extension providing
/// them is advertised.
pub const NO_LAYOUT_QUALIFIERS_ON_OLD_GLSL: &str = "no-layout-qualifiers-on-old-glsl";

/// SVGA3D writes past the destination when reading texture sub-images.
pub const SVGA3D_GETTEXSUBIMAGE_OOB_WRITE: &str = "svga3d-gettexsubimage-oob-write";

/// SVGA3D ignores data passed to DSA buffer storage reallocation.
pub const SVGA3D_BROKEN_DSA_BUFFERDATA: &str = "svga3d-broken-dsa-bufferdata";

/// SVGA3D corrupts 3D and array texture uploads spanning more than one slice.
pub const SVGA3D_TEXTURE_UPLOAD_SLICE_BY_SLICE: &str = "svga3d-texture-upload-slice-by-slice";

/// Apitrace reports a zero initial viewport; the viewport is set explicitly at startup.
pub const APITRACE_ZERO_INITIAL_VIEWPORT: &str = "apitrace-zero-initial-viewport";

/// A known driver workaround.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Workaround {
  /// Name, as accepted by the disable list.
  pub name: &'static str,
  /// Affected drivers; empty means every driver.
  pub drivers: DetectedDrivers,
  /// Only relevant when this extension is usable.
  pub extension: Option<Extension>,
}

/// Every known workaround.
pub const KNOWN: &[Workaround] = &[
  Workaround {
    name: NO_LAYOUT_QUALIFIERS_ON_OLD_GLSL,
    drivers: DetectedDrivers::empty(),
    extension: None,
  },
  Workaround {
    name: SVGA3D_GETTEXSUBIMAGE_OOB_WRITE,
    drivers: DetectedDrivers::SVGA3D,
    extension: Some(extensions::ARB_get_texture_sub_image),
  },
  Workaround {
    name: SVGA3D_BROKEN_DSA_BUFFERDATA,
    drivers: DetectedDrivers::SVGA3D,
    extension: Some(extensions::ARB_direct_state_access),
  },
  Workaround {
    name: SVGA3D_TEXTURE_UPLOAD_SLICE_BY_SLICE,
    drivers: DetectedDrivers::SVGA3D,
    extension: None,
  },
  Workaround {
    name: APITRACE_ZERO_INITIAL_VIEWPORT,
    drivers: DetectedDrivers::empty(),
    extension: Some(extensions::GREMEDY_string_marker),
  },
];

fn known(name: &str) -> Option<&'static Workaround> {
  KNOWN.iter().find(|w| w.name == name)
}

/// Workarounds in effect for a context.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Workarounds {
  active: Vec<&'static str>,
  disabled: Vec<&'static str>,
}

impl Workarounds {
  /// Select the workarounds matching `drivers`, minus the ones disabled by name.
  ///
  /// `supports` tells whether an extension is usable; workarounds tied to an extension only
  /// apply when it is. Unknown names in `disabled` are reported and ignored.
  pub fn detect<S, F>(drivers: DetectedDrivers, disabled: &[S], supports: F) -> Self
  where
    S: AsRef<str>,
    F: Fn(Extension) -> bool,
  {
    let mut workarounds = Workarounds::default();

    for name in disabled {
      let name = name.as_ref();

      match known(name) {
        Some(w) if !workarounds.disabled.contains(&w.name) => workarounds.disabled.push(w.name),
        Some(_) => (),
        None => warn!("unknown workaround {}", name),
      }
    }

    for w in KNOWN {
      let driver_matches = w.drivers.is_empty() || drivers.intersects(w.drivers);
      let extension_matches = w.extension.map_or(true, &supports);

      if driver_matches && extension_matches && !workarounds.disabled.contains(&w.name) {
        workarounds.active.push(w.name);
      }
    }

    workarounds
  }

  /// Whether the named workaround is in effect.
  pub fn is_active(&self, name: &str) -> bool {
    self.active.iter().any(|w| *w == name)
  }

  /// Whether the named workaround was disabled by the user.
  pub fn is_disabled(&self, name: &str) -> bool {
    self.disabled.iter().any(|w| *w == name)
  }

  /// Workarounds in effect.
  pub fn active(&self) -> &[&'static str] {
    &self.active
  }

  /// Workarounds disabled by the user.
  pub fn disabled(&self) -> &[&'static str] {
    &self.disabled
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detect_drivers() {
    let svga = DetectedDrivers::detect("VMware, Inc.", "SVGA3D; build: RELEASE", "2.1 Mesa 20.0.8");
    assert_eq!(svga, DetectedDrivers::MESA | DetectedDrivers::SVGA3D);

    let nv = DetectedDrivers::detect("NVIDIA Corporation", "GeForce GTX 1080", "4.6.0 NVIDIA 470.57");
    assert_eq!(nv, DetectedDrivers::NVIDIA);

    let amd = DetectedDrivers::detect("ATI Technologies Inc.", "Radeon", "4.6.14761");
    assert_eq!(amd, DetectedDrivers::AMD);

    // SVGA3D is only recognized on top of Mesa
    let fake = DetectedDrivers::detect("VMware, Inc.", "SVGA3D", "2.1");
    assert_eq!(fake, DetectedDrivers::empty());
  }

  #[test]
  fn any_driver_workarounds() {
    let w = Workarounds::detect(DetectedDrivers::NVIDIA, &[] as &[&str], |_| false);
    assert_eq!(w.active(), &[NO_LAYOUT_QUALIFIERS_ON_OLD_GLSL]);
  }

  #[test]
  fn extension_bound_workarounds() {
    let w = Workarounds::detect(DetectedDrivers::SVGA3D, &[] as &[&str], |e| {
      e == extensions::ARB_direct_state_access
    });

    assert!(w.is_active(SVGA3D_BROKEN_DSA_BUFFERDATA));
    assert!(w.is_active(SVGA3D_TEXTURE_UPLOAD_SLICE_BY_SLICE));
    assert!(!w.is_active(SVGA3D_GETTEXSUBIMAGE_OOB_WRITE));
    assert!(!w.is_active(APITRACE_ZERO_INITIAL_VIEWPORT));
  }

  #[test]
  fn disabled_by_name() {
    let w = Workarounds::detect(
      DetectedDrivers::SVGA3D,
      &["svga3d-texture-upload-slice-by-slice", "not-a-workaround"],
      |_| true,
    );

    assert!(!w.is_active(SVGA3D_TEXTURE_UPLOAD_SLICE_BY_SLICE));
    assert!(w.is_disabled(SVGA3D_TEXTURE_UPLOAD_SLICE_BY_SLICE));
    assert!(!w.is_disabled("not-a-workaround"));
    assert!(w.is_active(SVGA3D_BROKEN_DSA_BUFFERDATA));
  }
}
