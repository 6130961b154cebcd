//! # Runtime capability dispatch and state caching for OpenGL-family drivers
//!
//! lucent sits between rendering code and an OpenGL-family driver. It answers two questions
//! once, when a context is created, and then gets out of the way:
//!
//! - _What can this driver do?_ The driver is queried for its version, its extensions, its
//!   vendor and renderer strings; the result is a [`CapabilitySet`], which also knows which
//!   driver bugs must be worked around and which extensions the user asked to pretend are
//!   missing.
//! - _How should each operation be performed?_ Many operations can be expressed several ways:
//!   through direct state access, through a newer extension, or through the classic
//!   bind-then-edit entry points. Every subsystem picks the best available one for each of its
//!   operations and commits it into the [`DispatchTable`]. Those choices never change afterwards.
//!
//! On top of that, lucent keeps a [`StateCache`] mirroring what is bound to the driver, so that
//! redundant bind calls are never issued.
//!
//! # The driver
//!
//! lucent never talks to OpenGL directly: it talks to a type implementing [`Driver`]. Such a
//! driver wraps a context that is already current on the calling thread. The `lucent-gl` crate
//! provides one for real OpenGL; [`stub::StubDriver`] is a scripted one recording every call
//! it receives, which is what tests and tooling use.
//!
//! # Contexts and resources
//!
//! A [`Context`] is created out of a driver and a [`ContextOpt`]. At most one context may exist
//! per thread at any time; creating another one fails with [`ContextError::AnotherContextActive`].
//!
//! Resources ([`Buffer`], [`Texture`], [`Framebuffer`], [`Program`], [`Mesh`]) are created from
//! a context and share it. They route every operation through the strategy committed in the
//! dispatch table and every bind through the state cache. When dropped, a resource deletes its
//! driver object and the cache forgets every binding of it.
//!
//! # Feature flags
//!
//! None so far.
//!
//! [`CapabilitySet`]: crate::capability::CapabilitySet
//! [`DispatchTable`]: crate::dispatch::DispatchTable
//! [`StateCache`]: crate::state::StateCache
//! [`Driver`]: crate::driver::Driver
//! [`Context`]: crate::context::Context
//! [`ContextOpt`]: crate::opt::ContextOpt
//! [`ContextError::AnotherContextActive`]: crate::context::ContextError::AnotherContextActive
//! [`Buffer`]: crate::buffer::Buffer
//! [`Texture`]: crate::texture::Texture
//! [`Framebuffer`]: crate::framebuffer::Framebuffer
//! [`Program`]: crate::program::Program
//! [`Mesh`]: crate::mesh::Mesh

//#![deny(missing_docs)]

pub mod buffer;
pub mod capability;
pub mod context;
mod current;
pub mod dispatch;
pub mod driver;
pub mod extension;
pub mod framebuffer;
pub mod mesh;
pub mod opt;
pub mod program;
pub mod state;
pub mod stub;
pub mod texture;
pub mod version;
pub mod workaround;
