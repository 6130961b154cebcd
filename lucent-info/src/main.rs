//! Print what lucent detects and commits for a scripted driver.
//!
//! The driver is a [`StubDriver`] described on the command line, so that any combination of
//! version, vendor strings and extensions can be inspected without the matching hardware.

use log::error;
use lucent::capability::CapabilitySet;
use lucent::context::Context;
use lucent::driver::{Driver, Limit};
use lucent::extension::Extension;
use lucent::opt::{ContextLog, ContextOpt};
use lucent::stub::StubDriver;
use lucent::version::Version;
use std::error::Error;
use std::process;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "lucent-info")]
pub struct CLIOpts {
  #[structopt(long, default_value = "3.3")]
  /// Version the driver reports, e.g. 3.3 or GL33.
  gl_version: Version,

  #[structopt(long)]
  /// Report the version as a string only, and extensions as a single list.
  legacy: bool,

  #[structopt(long, default_value = "lucent")]
  /// Vendor string.
  vendor: String,

  #[structopt(long, default_value = "stub")]
  /// Renderer string.
  renderer: String,

  #[structopt(long)]
  /// Full version string; defaults to the version followed by the renderer name.
  version_string: Option<String>,

  #[structopt(short, long)]
  /// Extensions the driver advertises, e.g. GL_ARB_multi_bind.
  extensions: Vec<String>,

  #[structopt(long)]
  /// Extensions to disable; LUCENT_DISABLE_EXTENSIONS is used when absent.
  disable_extensions: Vec<String>,

  #[structopt(long)]
  /// Driver workarounds to disable; LUCENT_DISABLE_WORKAROUNDS is used when absent.
  disable_workarounds: Vec<String>,

  #[structopt(long)]
  /// Context creation log: quiet, default or verbose.
  log: Option<ContextLog>,

  #[structopt(long)]
  /// Print the extension strings the driver advertises.
  extension_strings: bool,

  #[structopt(long)]
  /// Print every known extension along with its status.
  all_extensions: bool,

  #[structopt(long)]
  /// Print implementation-defined limits.
  limits: bool,
}

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  if let Err(e) = run(CLIOpts::from_args()) {
    error!("{}", e);
    process::exit(1);
  }
}

fn run(cli_opts: CLIOpts) -> Result<(), Box<dyn Error>> {
  let driver = scripted_driver(&cli_opts);
  let ctx = Context::new(driver, context_opt(&cli_opts))?;

  if cli_opts.extension_strings {
    print_extension_strings(&*ctx.driver());
    return Ok(());
  }

  let caps = ctx.capabilities();

  println!();
  println!("  +-----------------------------------------------+");
  println!("  |   Capabilities and dispatch of lucent {:<7} |", env!("CARGO_PKG_VERSION"));
  println!("  +-----------------------------------------------+");
  println!();
  println!("Vendor: {}", caps.vendor());
  println!("Renderer: {}", caps.renderer());
  println!("Version: {} ({})", caps.version(), caps.version_string());
  println!("Context flags: {:?}", caps.flags());
  println!("Detected drivers: {:?}", caps.drivers());
  println!();

  println!("Supported versions:");
  for version in Version::ALL.iter().filter(|v| caps.is_version_supported(**v)) {
    println!("    {}", version);
  }
  println!();

  if cli_opts.all_extensions {
    println!("Extensions:");
    for e in Extension::all() {
      println!("    {:<42} {}", e.name(), extension_status(&caps, *e));
    }
  } else {
    println!("Vendor extension support:");
    for e in Extension::all().iter().filter(|e| caps.is_optional(**e)) {
      println!("    {:<42} {}", e.name(), extension_status(&caps, *e));
    }
  }
  println!();

  print_list("Used features:", ctx.used_features());
  print_list("Driver workarounds:", caps.workarounds().active().iter());
  println!("Dispatch: {:#?}", ctx.dispatch());

  // limits are queried through the context, which borrows the capabilities again
  drop(caps);

  if cli_opts.limits {
    println!();
    println!("Limits:");

    for limit in Limit::ALL {
      println!("    {:<26} {}", format!("{:?}", limit), limit_value(&ctx, limit));
    }
  }

  Ok(())
}

fn scripted_driver(cli_opts: &CLIOpts) -> StubDriver {
  let (major, minor) = cli_opts.gl_version.numbers();
  let version_string = cli_opts
    .version_string
    .clone()
    .unwrap_or_else(|| format!("{}.{} {}", major, minor, cli_opts.renderer));

  let driver = if cli_opts.legacy {
    StubDriver::legacy(version_string.clone())
  } else {
    StubDriver::new(cli_opts.gl_version)
  };

  driver
    .with_vendor(cli_opts.vendor.as_str())
    .with_renderer(cli_opts.renderer.as_str())
    .with_version_string(version_string)
    .with_extensions(cli_opts.extensions.iter().map(String::as_str))
}

fn context_opt(cli_opts: &CLIOpts) -> ContextOpt {
  let mut opt = ContextOpt::from_env();

  if !cli_opts.disable_extensions.is_empty() {
    opt = opt.set_disabled_extensions(cli_opts.disable_extensions.iter().map(String::as_str));
  }

  if !cli_opts.disable_workarounds.is_empty() {
    opt = opt.set_disabled_workarounds(cli_opts.disable_workarounds.iter().map(String::as_str));
  }

  if let Some(log) = cli_opts.log {
    opt = opt.set_log(log);
  }

  opt
}

fn extension_status(caps: &CapabilitySet, e: Extension) -> &'static str {
  if caps.is_extension_disabled(e) {
    "disabled"
  } else if !caps.is_version_supported(e.required_version()) {
    "n/a"
  } else if !caps.supports(e) {
    "-"
  } else if caps.is_optional(e) {
    "SUPPORTED"
  } else {
    "core"
  }
}

fn print_extension_strings(driver: &StubDriver) {
  println!("Extension strings:");

  match driver.extension_count() {
    Some(count) => {
      for i in 0..count {
        println!("    {}", driver.extension_name(i));
      }
    }

    None => {
      for name in driver.extension_list().split(' ').filter(|n| !n.is_empty()) {
        println!("    {}", name);
      }
    }
  }
}

fn print_list<I, T>(title: &str, items: I)
where
  I: IntoIterator<Item = T>,
  T: std::fmt::Display,
{
  let mut items = items.into_iter().peekable();

  if items.peek().is_none() {
    return;
  }

  println!("{}", title);

  for item in items {
    println!("    {}", item);
  }

  println!();
}

fn limit_value(ctx: &Context<StubDriver>, limit: Limit) -> i32 {
  match limit {
    Limit::MaxTextureSize => ctx.max_texture_size(),
    Limit::Max3DTextureSize => ctx.max_3d_texture_size(),
    Limit::MaxArrayTextureLayers => ctx.max_array_layers(),
    Limit::MaxTextureLayers => ctx.max_texture_layers(),
    Limit::MaxColorAttachments => ctx.max_color_attachments(),
    Limit::MaxDrawBuffers => ctx.max_draw_buffers(),
    Limit::MaxVertexAttributes => ctx.max_vertex_attributes(),
    Limit::MaxUniformBufferBindings => ctx.max_uniform_bindings(),
  }
}
