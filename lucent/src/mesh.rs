//! Meshes.
//!
//! A [`Mesh`] gathers vertex buffers, their attribute layout and an optional index buffer. When
//! vertex array objects are available, the layout is recorded once in one; otherwise it is
//! replayed before every draw.

use std::error;
use std::fmt;

use crate::buffer::Buffer;
use crate::context::{Context, Shared};
use crate::dispatch::{Initializer, Requirement, Slot, Strategy, Subsystem};
use crate::driver::{Driver, Handle, ResourceKind, Target};
use crate::extension::extensions;
use crate::program::Program;
use crate::state::Bind;

/// Vertices connectivity.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Primitive {
  /// Single points.
  Points,
  /// Pairs of vertices make lines.
  Lines,
  /// Each vertex is connected to the previous one.
  LineStrip,
  /// Triples of vertices make triangles.
  Triangles,
  /// Each vertex makes a triangle with the two previous ones.
  TriangleStrip,
  /// Each vertex makes a triangle with the previous one and the first one.
  TriangleFan,
}

/// Type of indices.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IndexType {
  /// 8-bit unsigned.
  U8,
  /// 16-bit unsigned.
  U16,
  /// 32-bit unsigned.
  U32,
}

impl IndexType {
  /// Size of an index in bytes.
  pub fn bytes(self) -> usize {
    match self {
      IndexType::U8 => 1,
      IndexType::U16 => 2,
      IndexType::U32 => 4,
    }
  }
}

/// Type of the components of a vertex attribute.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttributeType {
  /// 8-bit signed integer.
  I8,
  /// 8-bit unsigned integer.
  U8,
  /// 16-bit signed integer.
  I16,
  /// 16-bit unsigned integer.
  U16,
  /// 32-bit signed integer.
  I32,
  /// 32-bit unsigned integer.
  U32,
  /// 32-bit float.
  F32,
}

/// Where and how a vertex attribute is read out of a buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VertexAttribute {
  /// Attribute location.
  pub index: u32,
  /// Number of components, 1 to 4.
  pub components: u8,
  /// Type of the components.
  pub kind: AttributeType,
  /// Whether integer components are normalized to *[0;1]* or *[-1;1]*.
  pub normalized: bool,
  /// Bytes between two consecutive vertices.
  pub stride: usize,
  /// Offset of the first component in the buffer.
  pub offset: usize,
}

/// Vertex array strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MeshVertexArray {
  /// Record the layout in a vertex array object.
  VertexArrayObject,
  /// Replay the layout before each draw.
  NoVertexArray,
}

impl Strategy for MeshVertexArray {
  const SLOT: &'static str = "mesh vertex array";

  fn requirement(self) -> Requirement {
    match self {
      MeshVertexArray::VertexArrayObject => {
        Requirement::Extension(extensions::ARB_vertex_array_object)
      }
      MeshVertexArray::NoVertexArray => Requirement::Always,
    }
  }
}

const DSA_ATTRIBUTE: &[Requirement] = &[
  Requirement::Extension(extensions::ARB_vertex_array_object),
  Requirement::Extension(extensions::ARB_direct_state_access),
];

/// Attribute layout strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MeshAttribute {
  /// Describe attributes of a vertex array by handle.
  DirectStateAccess,
  /// Bind the vertex array and the buffer, then describe.
  Default,
}

impl Strategy for MeshAttribute {
  const SLOT: &'static str = "mesh attribute";

  fn requirement(self) -> Requirement {
    match self {
      MeshAttribute::DirectStateAccess => Requirement::All(DSA_ATTRIBUTE),
      MeshAttribute::Default => Requirement::Always,
    }
  }
}

/// Indexed draw strategies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MeshIndexed {
  /// Indexed draws support a base vertex.
  BaseVertex,
  /// Plain indexed draws only.
  Default,
}

impl Strategy for MeshIndexed {
  const SLOT: &'static str = "mesh indexed draw";

  fn requirement(self) -> Requirement {
    match self {
      MeshIndexed::BaseVertex => Requirement::Extension(extensions::ARB_draw_elements_base_vertex),
      MeshIndexed::Default => Requirement::Always,
    }
  }
}

/// Committed mesh strategies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MeshDispatch {
  /// Whether layouts live in vertex arrays.
  pub vertex_array: Slot<MeshVertexArray>,
  /// How attributes are described.
  pub attribute: Slot<MeshAttribute>,
  /// How indexed meshes are drawn.
  pub indexed: Slot<MeshIndexed>,
}

impl Subsystem for MeshDispatch {
  const NAME: &'static str = "mesh";

  fn initialize<D>(init: &mut Initializer<D>) -> Self
  where
    D: Driver + ?Sized,
  {
    MeshDispatch {
      vertex_array: init.select(&[
        MeshVertexArray::VertexArrayObject,
        MeshVertexArray::NoVertexArray,
      ]),
      attribute: init.select(&[MeshAttribute::DirectStateAccess, MeshAttribute::Default]),
      indexed: init.select(&[MeshIndexed::BaseVertex, MeshIndexed::Default]),
    }
  }
}

/// Mesh error.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MeshError {
  /// Indexed draws with a non-zero base vertex are not supported by the driver.
  BaseVertexUnsupported(i32),
  /// Non-indexed draws can’t start before the first vertex.
  NegativeFirstVertex(i32),
}

impl fmt::Display for MeshError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      MeshError::BaseVertexUnsupported(base) => {
        write!(f, "base vertex {} not supported by the driver", base)
      }

      MeshError::NegativeFirstVertex(first) => write!(f, "negative first vertex {}", first),
    }
  }
}

impl error::Error for MeshError {}

#[derive(Debug)]
struct IndexBuffer<D>
where
  D: Driver,
{
  buffer: Buffer<D>,
  kind: IndexType,
  offset: usize,
}

/// A drawable set of vertices.
#[derive(Debug)]
pub struct Mesh<D>
where
  D: Driver,
{
  // Handle::NONE without vertex arrays
  vertex_array: Handle,
  primitive: Primitive,
  vertex_buffers: Vec<(Buffer<D>, Vec<VertexAttribute>)>,
  index_buffer: Option<IndexBuffer<D>>,
  count: usize,
  base_vertex: i32,
  ctx: Shared<D>,
}

impl<D> Drop for Mesh<D>
where
  D: Driver,
{
  fn drop(&mut self) {
    if !self.vertex_array.is_none() {
      let inner = &mut *self.ctx.borrow_mut();
      inner.state.forget(ResourceKind::VertexArray, self.vertex_array);
      inner.driver.delete(ResourceKind::VertexArray, self.vertex_array);
    }
  }
}

impl<D> Mesh<D>
where
  D: Driver,
{
  /// Create an empty mesh.
  pub fn new(ctx: &mut Context<D>, primitive: Primitive) -> Self {
    let shared = ctx.shared();

    let vertex_array = {
      let inner = &mut *shared.borrow_mut();
      let dispatch = inner.dispatch.mesh;

      match (dispatch.vertex_array.get(), dispatch.attribute.get()) {
        (MeshVertexArray::NoVertexArray, _) => Handle::NONE,

        (MeshVertexArray::VertexArrayObject, MeshAttribute::DirectStateAccess) => {
          inner.driver.create(Target::VertexArray)
        }

        (MeshVertexArray::VertexArrayObject, MeshAttribute::Default) => {
          inner.driver.gen(ResourceKind::VertexArray)
        }
      }
    };

    Mesh {
      vertex_array,
      primitive,
      vertex_buffers: Vec::new(),
      index_buffer: None,
      count: 0,
      base_vertex: 0,
      ctx: shared,
    }
  }

  /// Vertex array handle; [`Handle::NONE`] without vertex arrays.
  #[inline]
  pub fn vertex_array(&self) -> Handle {
    self.vertex_array
  }

  /// Number of vertices (or indices) drawn.
  #[inline]
  pub fn count(&self) -> usize {
    self.count
  }

  /// Add a vertex buffer and the attributes it feeds.
  pub fn add_vertex_buffer(&mut self, buffer: Buffer<D>, attributes: &[VertexAttribute]) {
    {
      let inner = &mut *self.ctx.borrow_mut();
      let dispatch = inner.dispatch.mesh;

      match (dispatch.vertex_array.get(), dispatch.attribute.get()) {
        (MeshVertexArray::NoVertexArray, _) => (),

        (MeshVertexArray::VertexArrayObject, MeshAttribute::DirectStateAccess) => {
          for attribute in attributes {
            inner
              .driver
              .vertex_array_attribute(self.vertex_array, buffer.handle(), attribute);
          }
        }

        (MeshVertexArray::VertexArrayObject, MeshAttribute::Default) => {
          inner.state.bind(
            &mut inner.driver,
            Target::VertexArray,
            self.vertex_array,
            Bind::Cached,
          );
          inner
            .state
            .bind(&mut inner.driver, Target::ArrayBuffer, buffer.handle(), Bind::Cached);

          for attribute in attributes {
            inner.driver.vertex_attribute(attribute);
          }
        }
      }
    }

    self.vertex_buffers.push((buffer, attributes.to_vec()));
  }

  /// Draw through `buffer`, holding indices of type `kind` starting at `offset` bytes.
  pub fn set_index_buffer(&mut self, buffer: Buffer<D>, kind: IndexType, offset: usize) {
    {
      let inner = &mut *self.ctx.borrow_mut();

      if inner.dispatch.mesh.vertex_array.get() == MeshVertexArray::VertexArrayObject {
        inner.state.bind(
          &mut inner.driver,
          Target::VertexArray,
          self.vertex_array,
          Bind::Cached,
        );
        inner.state.bind(
          &mut inner.driver,
          Target::ElementArrayBuffer,
          buffer.handle(),
          Bind::Cached,
        );
      }
    }

    self.index_buffer = Some(IndexBuffer {
      buffer,
      kind,
      offset,
    });
  }

  /// Set the number of vertices (or indices) to draw.
  pub fn set_count(&mut self, count: usize) {
    self.count = count;
  }

  /// Set the base vertex, added to every index; for non-indexed meshes, the first vertex.
  pub fn set_base_vertex(&mut self, base_vertex: i32) {
    self.base_vertex = base_vertex;
  }

  /// Draw the mesh with `program`.
  pub fn draw(&self, program: &Program<D>) -> Result<(), MeshError> {
    let indexed = self.ctx.borrow().dispatch.mesh.indexed.get();

    let first = match self.index_buffer {
      Some(_) if self.base_vertex != 0 && indexed == MeshIndexed::Default => {
        return Err(MeshError::BaseVertexUnsupported(self.base_vertex));
      }

      Some(_) => 0,

      None => usize::try_from(self.base_vertex)
        .map_err(|_| MeshError::NegativeFirstVertex(self.base_vertex))?,
    };

    program.use_program();

    let inner = &mut *self.ctx.borrow_mut();

    match inner.dispatch.mesh.vertex_array.get() {
      MeshVertexArray::VertexArrayObject => {
        inner.state.bind(
          &mut inner.driver,
          Target::VertexArray,
          self.vertex_array,
          Bind::Cached,
        );
      }

      MeshVertexArray::NoVertexArray => {
        for (buffer, attributes) in &self.vertex_buffers {
          inner
            .state
            .bind(&mut inner.driver, Target::ArrayBuffer, buffer.handle(), Bind::Cached);

          for attribute in attributes {
            inner.driver.vertex_attribute(attribute);
          }
        }

        if let Some(ref index) = self.index_buffer {
          inner.state.bind(
            &mut inner.driver,
            Target::ElementArrayBuffer,
            index.buffer.handle(),
            Bind::Cached,
          );
        }
      }
    }

    match self.index_buffer {
      Some(ref index) if self.base_vertex != 0 => inner.driver.draw_elements_base_vertex(
        self.primitive,
        self.count,
        index.kind,
        index.offset,
        self.base_vertex,
      ),

      Some(ref index) => {
        inner
          .driver
          .draw_elements(self.primitive, self.count, index.kind, index.offset)
      }

      None => inner.driver.draw_arrays(self.primitive, first, self.count),
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::buffer::BufferUsage;
  use crate::opt::ContextOpt;
  use crate::stub::{Call, StubDriver};
  use crate::version::Version;

  fn position() -> VertexAttribute {
    VertexAttribute {
      index: 0,
      components: 3,
      kind: AttributeType::F32,
      normalized: false,
      stride: 12,
      offset: 0,
    }
  }

  fn vertices(ctx: &mut Context<StubDriver>) -> Buffer<StubDriver> {
    let mut buffer = Buffer::new(ctx, Target::ArrayBuffer);
    buffer.set_data(&[0; 36], BufferUsage::StaticDraw);
    buffer
  }

  #[test]
  fn layout_replayed_without_vertex_arrays() {
    let driver = StubDriver::new(Version::GL21);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let program = Program::new(&mut ctx);
    let mut mesh = Mesh::new(&mut ctx, Primitive::Triangles);

    let buffer = vertices(&mut ctx);
    mesh.add_vertex_buffer(buffer, &[position()]);
    mesh.set_count(3);
    assert_eq!(mesh.vertex_array(), Handle::NONE);

    calls.clear();
    mesh.draw(&program).unwrap();
    mesh.draw(&program).unwrap();

    assert_eq!(
      calls.count(|c| matches!(c, Call::VertexAttribute(_))),
      2
    );
    assert_eq!(
      calls.count(|c| matches!(c, Call::DrawArrays { count: 3, .. })),
      2
    );
  }

  #[test]
  fn layout_recorded_once_in_vertex_array() {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let program = Program::new(&mut ctx);
    let mut mesh = Mesh::new(&mut ctx, Primitive::Triangles);

    let buffer = vertices(&mut ctx);
    mesh.add_vertex_buffer(buffer, &[position()]);
    mesh.set_count(3);

    calls.clear();
    mesh.draw(&program).unwrap();
    mesh.draw(&program).unwrap();

    assert_eq!(
      calls.take(),
      vec![
        Call::Bind(Target::Program, program.handle()),
        Call::DrawArrays {
          primitive: Primitive::Triangles,
          first: 0,
          count: 3
        },
        Call::DrawArrays {
          primitive: Primitive::Triangles,
          first: 0,
          count: 3
        },
      ]
    );
  }

  #[test]
  fn dsa_layout() {
    let driver = StubDriver::new(Version::GL45);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let mut mesh = Mesh::new(&mut ctx, Primitive::Points);
    let buffer = vertices(&mut ctx);
    let b = buffer.handle();

    calls.clear();
    mesh.add_vertex_buffer(buffer, &[position()]);

    assert_eq!(
      calls.take(),
      vec![Call::VertexArrayAttribute {
        vertex_array: mesh.vertex_array(),
        buffer: b,
        attribute: position()
      }]
    );
  }

  #[test]
  fn base_vertex() {
    let driver = StubDriver::new(Version::GL30);
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let program = Program::new(&mut ctx);
    let mut mesh = Mesh::new(&mut ctx, Primitive::Triangles);
    let indices = Buffer::new(&mut ctx, Target::ElementArrayBuffer);

    mesh.set_index_buffer(indices, IndexType::U16, 0);
    mesh.set_count(6);
    assert!(mesh.draw(&program).is_ok());

    mesh.set_base_vertex(4);
    assert_eq!(
      mesh.draw(&program),
      Err(MeshError::BaseVertexUnsupported(4))
    );
  }

  #[test]
  fn base_vertex_supported() {
    let driver = StubDriver::new(Version::GL32);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let program = Program::new(&mut ctx);
    let mut mesh = Mesh::new(&mut ctx, Primitive::Triangles);
    let indices = Buffer::new(&mut ctx, Target::ElementArrayBuffer);

    mesh.set_index_buffer(indices, IndexType::U32, 8);
    mesh.set_count(6);
    mesh.set_base_vertex(4);
    mesh.draw(&program).unwrap();

    assert!(calls.contains(&Call::DrawElementsBaseVertex {
      primitive: Primitive::Triangles,
      count: 6,
      index_type: IndexType::U32,
      offset: 8,
      base_vertex: 4
    }));
  }

  #[test]
  fn first_vertex() {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let program = Program::new(&mut ctx);
    let mut mesh = Mesh::new(&mut ctx, Primitive::Lines);

    mesh.set_count(2);
    mesh.set_base_vertex(2);
    mesh.draw(&program).unwrap();
    assert!(calls.contains(&Call::DrawArrays {
      primitive: Primitive::Lines,
      first: 2,
      count: 2
    }));

    mesh.set_base_vertex(-1);
    assert_eq!(mesh.draw(&program), Err(MeshError::NegativeFirstVertex(-1)));
  }

  #[test]
  fn drop_deletes_vertex_array() {
    let driver = StubDriver::new(Version::GL33);
    let calls = driver.calls();
    let mut ctx = Context::new(driver, ContextOpt::default()).unwrap();
    let mut mesh = Mesh::new(&mut ctx, Primitive::Lines);
    let vao = mesh.vertex_array();
    let buffer = vertices(&mut ctx);
    let b = buffer.handle();
    mesh.add_vertex_buffer(buffer, &[position()]);

    drop(mesh);

    assert!(calls.contains(&Call::Delete(ResourceKind::VertexArray, vao)));
    assert!(calls.contains(&Call::Delete(ResourceKind::Buffer, b)));
  }
}
