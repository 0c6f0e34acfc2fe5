use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use umbra_common::ObjectKind;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// Indexed triangle list in object space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Face normals and the four corners of each face, counter-clockwise seen
/// from outside, on the unit cube.
#[rustfmt::skip]
const CUBE_FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
    ([0.0, 0.0, 1.0],  [[-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0]]),
    ([0.0, 0.0, -1.0], [[ 1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0]]),
    ([1.0, 0.0, 0.0],  [[ 1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0]]),
    ([-1.0, 0.0, 0.0], [[-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0]]),
    ([0.0, 1.0, 0.0],  [[-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0]]),
    ([0.0, -1.0, 0.0], [[-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0]]),
];

impl MeshData {
    /// Axis-aligned box centred on `center`.
    pub fn cuboid(center: Vec3, half_extents: Vec3, color: Vec3) -> Self {
        let mut mesh = Self::default();
        for (normal, corners) in CUBE_FACES {
            let base = mesh.vertices.len() as u32;
            for corner in corners {
                let position = center + Vec3::from(corner) * half_extents;
                mesh.vertices.push(Vertex {
                    position: position.to_array(),
                    normal,
                    color: color.to_array(),
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }

    /// Square on the y = `height` plane, facing up.
    pub fn plane(half_extent: f32, height: f32, color: Vec3) -> Self {
        let h = half_extent;
        let vertices = [[-h, h], [h, h], [h, -h], [-h, -h]]
            .into_iter()
            .map(|[x, z]| Vertex {
                position: [x, height, z],
                normal: [0.0, 1.0, 0.0],
                color: color.to_array(),
            })
            .collect();
        Self {
            vertices,
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Append `other`, rebasing its indices.
    pub fn merge(mut self, other: MeshData) -> Self {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
        self
    }

    /// Stand-in geometry used until real meshes are uploaded.
    pub fn placeholder(object: ObjectKind) -> Self {
        match object {
            ObjectKind::Bird => MeshData::cuboid(
                Vec3::new(18.0, 22.0, 0.0),
                Vec3::new(1.5, 0.3, 0.6),
                Vec3::new(0.25, 0.2, 0.2),
            ),
            ObjectKind::Tank => MeshData::cuboid(
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(2.0, 1.0, 3.0),
                Vec3::new(0.3, 0.4, 0.2),
            )
            .merge(MeshData::cuboid(
                Vec3::new(0.0, 2.5, 0.0),
                Vec3::new(1.0, 0.5, 1.0),
                Vec3::new(0.3, 0.4, 0.2),
            )),
            ObjectKind::Tree => MeshData::cuboid(
                Vec3::new(10.0, 4.0, 20.0),
                Vec3::new(0.5, 4.0, 0.5),
                Vec3::new(0.4, 0.25, 0.1),
            ),
            ObjectKind::Leaves => MeshData::cuboid(
                Vec3::new(10.0, 10.0, 20.0),
                Vec3::new(3.0, 2.5, 3.0),
                Vec3::new(0.15, 0.5, 0.15),
            ),
            ObjectKind::BackgroundScene => {
                MeshData::plane(100.0, 0.0, Vec3::new(0.35, 0.45, 0.25))
            }
            ObjectKind::LightMarker => {
                MeshData::cuboid(Vec3::ZERO, Vec3::splat(1.0), Vec3::ONE)
            }
        }
    }

    /// Unit cube for the skybox; only positions are used.
    pub fn skybox() -> Self {
        MeshData::cuboid(Vec3::ZERO, Vec3::ONE, Vec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
    }

    #[test]
    fn cuboid_has_flat_faces() {
        let mesh = MeshData::cuboid(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0), Vec3::ONE);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for v in &mesh.vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            // every vertex lies on the face its normal points out of
            assert!(p.dot(n).abs() > 0.99);
        }
    }

    #[test]
    fn merge_rebases_indices() {
        let a = MeshData::plane(1.0, 0.0, Vec3::ONE);
        let b = MeshData::plane(2.0, 1.0, Vec3::ONE);
        let merged = a.merge(b);
        assert_eq!(merged.vertices.len(), 8);
        assert_eq!(&merged.indices[6..], &[4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn every_object_has_a_placeholder() {
        for object in ObjectKind::ALL {
            let mesh = MeshData::placeholder(object);
            assert!(!mesh.indices.is_empty());
            assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        }
    }

    #[test]
    fn plane_faces_up() {
        let mesh = MeshData::plane(5.0, 2.0, Vec3::ONE);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        assert!(mesh.vertices.iter().all(|v| v.position[1] == 2.0));
    }
}
