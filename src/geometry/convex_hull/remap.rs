//! Vertex remap: compacts surviving original indices into dense hull
//! indices.

use super::edge_expansion::Face;

pub(crate) struct RemappedFaces {
    pub original_vertex_mapping: Vec<usize>,
    pub face_start_indices: Vec<usize>,
    pub face_vertex_indices: Vec<usize>,
}

/// Walks `faces` in order, assigning each first-seen original vertex index
/// a dense hull index, and rewrites every face's vertex list in terms of
/// those dense indices.
pub(crate) fn remap(faces: &[Face]) -> RemappedFaces {
    let mut original_vertex_mapping = Vec::new();
    let mut dense_index_of = rustc_hash::FxHashMap::default();
    let mut face_start_indices = Vec::with_capacity(faces.len());
    let mut face_vertex_indices = Vec::new();

    for face in faces {
        face_start_indices.push(face_vertex_indices.len());
        for &original in &face.vertices {
            let dense = *dense_index_of.entry(original).or_insert_with(|| {
                let dense = original_vertex_mapping.len();
                original_vertex_mapping.push(original);
                dense
            });
            face_vertex_indices.push(dense);
        }
    }

    RemappedFaces {
        original_vertex_mapping,
        face_start_indices,
        face_vertex_indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector;

    #[test]
    fn assigns_dense_indices_in_first_seen_order() {
        let faces = vec![
            Face {
                vertices: vec![5, 2, 9],
                normal: Vector::new(0.0, 0.0, 1.0),
            },
            Face {
                vertices: vec![2, 9, 7],
                normal: Vector::new(0.0, 1.0, 0.0),
            },
        ];
        let remapped = remap(&faces);
        assert_eq!(remapped.original_vertex_mapping, vec![5, 2, 9, 7]);
        assert_eq!(remapped.face_start_indices, vec![0, 3]);
        assert_eq!(remapped.face_vertex_indices, vec![0, 1, 2, 1, 2, 3]);
    }
}
