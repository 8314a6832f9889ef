use crate::attributes::{AttrDomain, AttrStorage};
use crate::mesh::Mesh;
use crate::parallel::for_each_indexed_mut;
use crate::varray::VArray;

/// Adaptation for components without interior topology: identity plus the
/// Detail broadcast/collapse pairs. Everything else is unsupported.
pub(crate) fn adapt_trivial<'a>(
    varray: VArray<'a>,
    from: AttrDomain,
    to: AttrDomain,
    target_len: usize,
) -> Option<VArray<'a>> {
    if from == to {
        return Some(varray);
    }
    match (from, to) {
        (AttrDomain::Detail, _) => {
            let value = varray.get(0)?;
            Some(VArray::filled(value, target_len))
        }
        (_, AttrDomain::Detail) => {
            let source = varray.materialize();
            let mapping = vec![(0..source.len()).collect::<Vec<_>>()];
            Some(VArray::Owned(combine(&source, &mapping)))
        }
        _ => None,
    }
}

/// Mesh adaptation: values move between point, corner, and face granularity
/// through the triangle incidence, combined by averaging (boolean columns
/// combine by any-set).
pub(crate) fn adapt_mesh_domain<'a>(
    mesh: &Mesh,
    varray: VArray<'a>,
    from: AttrDomain,
    to: AttrDomain,
) -> Option<VArray<'a>> {
    if from == to {
        return Some(varray);
    }
    if from == AttrDomain::Detail {
        let value = varray.get(0)?;
        return Some(VArray::filled(value, mesh.attribute_domain_len(to)));
    }
    let mapping = build_mapping(mesh, from, to);
    let source = varray.materialize();
    Some(VArray::Owned(combine(&source, &mapping)))
}

/// For each target element, the source elements contributing to it.
fn build_mapping(mesh: &Mesh, from: AttrDomain, to: AttrDomain) -> Vec<Vec<usize>> {
    if to == AttrDomain::Detail {
        let source_len = mesh.attribute_domain_len(from);
        return vec![(0..source_len).collect()];
    }
    let target_len = mesh.attribute_domain_len(to);
    let mut mapping = vec![Vec::new(); target_len];
    match (from, to) {
        (AttrDomain::Point, AttrDomain::Vertex) => {
            for (vertex_idx, point_idx) in mesh.indices.iter().enumerate() {
                mapping[vertex_idx].push(*point_idx as usize);
            }
        }
        (AttrDomain::Primitive, AttrDomain::Vertex) => {
            for (vertex_idx, slot) in mapping.iter_mut().enumerate() {
                slot.push(vertex_idx / 3);
            }
        }
        (AttrDomain::Point, AttrDomain::Primitive) => {
            for (prim_idx, corners) in mesh.indices.chunks_exact(3).enumerate() {
                for point_idx in corners {
                    mapping[prim_idx].push(*point_idx as usize);
                }
            }
        }
        (AttrDomain::Vertex, AttrDomain::Primitive) => {
            for (prim_idx, slot) in mapping.iter_mut().enumerate() {
                let base = prim_idx * 3;
                slot.extend([base, base + 1, base + 2]);
            }
        }
        (AttrDomain::Vertex, AttrDomain::Point) => {
            for (vertex_idx, point_idx) in mesh.indices.iter().enumerate() {
                let point_idx = *point_idx as usize;
                if point_idx < mapping.len() {
                    mapping[point_idx].push(vertex_idx);
                }
            }
        }
        (AttrDomain::Primitive, AttrDomain::Point) => {
            for (prim_idx, corners) in mesh.indices.chunks_exact(3).enumerate() {
                for point_idx in corners {
                    let point_idx = *point_idx as usize;
                    if point_idx < mapping.len() {
                        mapping[point_idx].push(prim_idx);
                    }
                }
            }
        }
        _ => {}
    }
    mapping
}

fn combine(source: &AttrStorage, mapping: &[Vec<usize>]) -> AttrStorage {
    match source {
        AttrStorage::Float(values) => AttrStorage::Float(combine_f32(values, mapping)),
        AttrStorage::Int(values) => AttrStorage::Int(combine_i32(values, mapping)),
        AttrStorage::Bool(values) => AttrStorage::Bool(combine_bool(values, mapping)),
        AttrStorage::Vec2(values) => AttrStorage::Vec2(combine_vec(values, mapping)),
        AttrStorage::Vec3(values) => AttrStorage::Vec3(combine_vec(values, mapping)),
        AttrStorage::Vec4(values) => AttrStorage::Vec4(combine_vec(values, mapping)),
    }
}

fn combine_f32(values: &[f32], mapping: &[Vec<usize>]) -> Vec<f32> {
    let mut out = vec![0.0; mapping.len()];
    for_each_indexed_mut(&mut out, |idx, slot| {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &source in &mapping[idx] {
            if let Some(value) = values.get(source).copied() {
                if value.is_finite() {
                    sum += value;
                    count += 1;
                }
            }
        }
        if count > 0 {
            *slot = sum / count as f32;
        }
    });
    out
}

fn combine_i32(values: &[i32], mapping: &[Vec<usize>]) -> Vec<i32> {
    let mut out = vec![0; mapping.len()];
    for_each_indexed_mut(&mut out, |idx, slot| {
        let mut sum = 0i64;
        let mut count = 0usize;
        for &source in &mapping[idx] {
            if let Some(value) = values.get(source).copied() {
                sum += value as i64;
                count += 1;
            }
        }
        if count > 0 {
            *slot = (sum as f64 / count as f64).round() as i32;
        }
    });
    out
}

fn combine_bool(values: &[bool], mapping: &[Vec<usize>]) -> Vec<bool> {
    let mut out = vec![false; mapping.len()];
    for_each_indexed_mut(&mut out, |idx, slot| {
        *slot = mapping[idx]
            .iter()
            .any(|&source| values.get(source).copied().unwrap_or(false));
    });
    out
}

fn combine_vec<const N: usize>(values: &[[f32; N]], mapping: &[Vec<usize>]) -> Vec<[f32; N]> {
    let mut out = vec![[0.0; N]; mapping.len()];
    for_each_indexed_mut(&mut out, |idx, slot| {
        let mut sum = [0.0f32; N];
        let mut count = 0usize;
        for &source in &mapping[idx] {
            if let Some(value) = values.get(source) {
                for axis in 0..N {
                    sum[axis] += value[axis];
                }
                count += 1;
            }
        }
        if count > 0 {
            for axis in 0..N {
                slot[axis] = sum[axis] / count as f32;
            }
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoset_types::AttrValue;

    fn quad() -> Mesh {
        Mesh::with_positions_indices(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn identity_adaptation_returns_input_values() {
        let mesh = quad();
        let storage = AttrStorage::Float(vec![1.0, 2.0, 3.0, 4.0]);
        let varray = VArray::Owned(storage.clone());
        let adapted = adapt_mesh_domain(&mesh, varray, AttrDomain::Point, AttrDomain::Point)
            .unwrap();
        assert_eq!(adapted.materialize(), storage);
    }

    #[test]
    fn point_to_primitive_averages_corners() {
        let mesh = quad();
        let varray = VArray::Owned(AttrStorage::Float(vec![0.0, 3.0, 6.0, 9.0]));
        let adapted = adapt_mesh_domain(&mesh, varray, AttrDomain::Point, AttrDomain::Primitive)
            .unwrap();
        // Triangles (0,1,2) and (0,2,3).
        assert_eq!(
            adapted.materialize(),
            AttrStorage::Float(vec![3.0, 5.0])
        );
    }

    #[test]
    fn vertex_to_point_averages_incident_corners() {
        let mesh = quad();
        let varray = VArray::Owned(AttrStorage::Float(vec![1.0, 2.0, 3.0, 5.0, 7.0, 9.0]));
        let adapted = adapt_mesh_domain(&mesh, varray, AttrDomain::Vertex, AttrDomain::Point)
            .unwrap();
        // Point 0 appears at corners 0 and 3, point 2 at corners 2 and 4.
        assert_eq!(
            adapted.materialize(),
            AttrStorage::Float(vec![3.0, 2.0, 5.0, 9.0])
        );
    }

    #[test]
    fn detail_broadcasts_to_every_element() {
        let mesh = quad();
        let varray = VArray::filled(AttrValue::Int(7), 1);
        let adapted = adapt_mesh_domain(&mesh, varray, AttrDomain::Detail, AttrDomain::Point)
            .unwrap();
        assert_eq!(adapted.len(), 4);
        assert_eq!(adapted.get(3), Some(AttrValue::Int(7)));
    }

    #[test]
    fn bool_collapse_is_any_set() {
        let varray = VArray::Owned(AttrStorage::Bool(vec![false, true, false]));
        let adapted = adapt_trivial(varray, AttrDomain::Point, AttrDomain::Detail, 1).unwrap();
        assert_eq!(adapted.materialize(), AttrStorage::Bool(vec![true]));
    }

    #[test]
    fn unsupported_pair_is_none() {
        let varray = VArray::Owned(AttrStorage::Float(vec![1.0, 2.0]));
        assert!(adapt_trivial(varray, AttrDomain::Point, AttrDomain::Primitive, 2).is_none());
    }
}
