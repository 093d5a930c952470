//! Core mesh data structures.
//!
//! This module holds the input mesh and the topology derived from it before
//! any operator is assembled.
//!
//! # Overview
//!
//! - [`TriMesh`] - vertex positions plus index triples, nothing more
//! - [`VertexFaceMap`] - the triangles touching each vertex
//! - [`RingSet`] - each vertex's first-ring neighbors in fan order, with
//!   boundary and non-manifold flags
//!
//! # Construction
//!
//! ```
//! use harmonic::mesh::{RingOptions, RingSet, TriMesh, VertexFaceMap};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh = TriMesh::new(vertices, vec![[0, 1, 2]]).unwrap();
//!
//! let faces = VertexFaceMap::build(&mesh);
//! let rings = RingSet::build(&mesh, &faces, &RingOptions::default());
//! assert_eq!(rings.boundary_vertices(), vec![0, 1, 2]);
//! ```

mod ring;
mod topology;
mod trimesh;

pub use ring::{build_ring, RingOptions, RingSet, VertexRing};
pub use topology::VertexFaceMap;
pub use trimesh::TriMesh;

pub(crate) use trimesh::validate_triangles;
