//! TopoJSON decoding for the `land` object of a world-atlas topology.
//!
//! A topology stores every boundary once as a shared arc; rings reference
//! arcs by index, with a negative index meaning "bitwise-NOT, traversed
//! backwards". Quantized topologies delta-encode arc vertices and carry a
//! scale/translate transform back to degrees.

use crate::error::LandError;
use crate::geo::{GeoPolygon, Ring};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<Vec<f64>>>,
    objects: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

/// The geometry shapes the land object may take. Other object types in the
/// same file (countries, graticules) are left unparsed.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
    GeometryCollection { geometries: Vec<TopoGeometry> },
}

/// Decode the `land` object of a topology document into polygons, one
/// `GeoPolygon` per component ring-set of every (multi)polygon.
pub fn parse_land(text: &str) -> Result<Vec<GeoPolygon>, LandError> {
    let topo: Topology = serde_json::from_str(text)?;
    let land = topo
        .objects
        .get("land")
        .ok_or(LandError::Topology("no `land` object"))?;
    let geometry: TopoGeometry = serde_json::from_value(land.clone())?;

    let mut polygons = Vec::new();
    collect_polygons(&topo, &geometry, &mut polygons)?;
    if polygons.is_empty() {
        return Err(LandError::EmptyLand);
    }
    Ok(polygons)
}

fn collect_polygons(
    topo: &Topology,
    geometry: &TopoGeometry,
    out: &mut Vec<GeoPolygon>,
) -> Result<(), LandError> {
    match geometry {
        TopoGeometry::Polygon { arcs } => {
            out.push(polygon_from_ring_arcs(topo, arcs)?);
        }
        TopoGeometry::MultiPolygon { arcs } => {
            for ring_arcs in arcs {
                out.push(polygon_from_ring_arcs(topo, ring_arcs)?);
            }
        }
        TopoGeometry::GeometryCollection { geometries } => {
            for g in geometries {
                collect_polygons(topo, g, out)?;
            }
        }
    }
    Ok(())
}

fn polygon_from_ring_arcs(topo: &Topology, ring_arcs: &[Vec<i64>]) -> Result<GeoPolygon, LandError> {
    if ring_arcs.is_empty() {
        return Err(LandError::Topology("polygon with no rings"));
    }
    let mut rings = Vec::with_capacity(ring_arcs.len());
    for arc_indices in ring_arcs {
        rings.push(stitch_ring(topo, arc_indices)?);
    }
    Ok(GeoPolygon::new(rings))
}

/// Concatenate arcs into one ring. Consecutive arcs share their join vertex,
/// so every arc after the first contributes from its second vertex on.
fn stitch_ring(topo: &Topology, arc_indices: &[i64]) -> Result<Ring, LandError> {
    let mut ring: Ring = Vec::new();
    for &signed in arc_indices {
        let pts = decode_arc(topo, signed)?;
        if ring.is_empty() {
            ring.extend(pts);
        } else {
            ring.extend(pts.into_iter().skip(1));
        }
    }
    if ring.len() < 4 {
        return Err(LandError::Topology("ring shorter than a closed triangle"));
    }
    Ok(ring)
}

fn decode_arc(topo: &Topology, signed: i64) -> Result<Vec<[f64; 2]>, LandError> {
    let (index, reversed) = if signed < 0 {
        ((!signed) as usize, true)
    } else {
        (signed as usize, false)
    };
    let raw = topo
        .arcs
        .get(index)
        .ok_or(LandError::Topology("arc index out of range"))?;

    let mut pts = Vec::with_capacity(raw.len());
    match &topo.transform {
        Some(t) => {
            // Quantized: per-axis running sums of integer deltas, then the
            // affine transform back into degrees.
            let (mut x, mut y) = (0.0_f64, 0.0_f64);
            for p in raw {
                if p.len() < 2 {
                    return Err(LandError::Topology("arc vertex with fewer than 2 axes"));
                }
                x += p[0];
                y += p[1];
                pts.push([x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]);
            }
        }
        None => {
            for p in raw {
                if p.len() < 2 {
                    return Err(LandError::Topology("arc vertex with fewer than 2 axes"));
                }
                pts.push([p[0], p[1]]);
            }
        }
    }
    if reversed {
        pts.reverse();
    }
    Ok(pts)
}

#[cfg(test)]
mod tests {
    use super::*;

    // One quantized square: arcs delta-encoded, scale 0.1, so the decoded
    // ring runs (0,0) (1,0) (1,1) (0,1) (0,0) in degrees.
    const QUANTIZED_SQUARE: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [0.1, 0.1], "translate": [0.0, 0.0] },
        "arcs": [
            [[0,0],[10,0],[0,10],[-10,0],[0,-10]]
        ],
        "objects": {
            "land": { "type": "Polygon", "arcs": [[0]] }
        }
    }"#;

    // Two arcs forming a triangle, referenced forward then reversed, plus an
    // unrelated object that must not disturb land parsing.
    const TWO_ARC_TRIANGLE: &str = r#"{
        "type": "Topology",
        "arcs": [
            [[0.0, 0.0], [4.0, 0.0], [4.0, 3.0]],
            [[0.0, 0.0], [4.0, 3.0]]
        ],
        "objects": {
            "land": { "type": "MultiPolygon", "arcs": [[[0, -2]]] },
            "grid": { "type": "Point", "coordinates": [1.0, 2.0] }
        }
    }"#;

    #[test]
    fn quantized_arcs_decode_to_degrees() {
        let polys = parse_land(QUANTIZED_SQUARE).unwrap();
        assert_eq!(polys.len(), 1);
        let ring = polys[0].outer();
        assert_eq!(
            ring,
            &vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
        );
    }

    #[test]
    fn negative_arc_index_reverses() {
        let polys = parse_land(TWO_ARC_TRIANGLE).unwrap();
        assert_eq!(polys.len(), 1);
        // Arc 0 gives (0,0)(4,0)(4,3); arc ~1 gives (4,3)(0,0) with the join
        // vertex dropped, closing the ring.
        assert_eq!(
            polys[0].outer(),
            &vec![[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 0.0]]
        );
    }

    #[test]
    fn missing_land_object_is_rejected() {
        let doc = r#"{"type":"Topology","arcs":[],"objects":{}}"#;
        assert!(matches!(
            parse_land(doc),
            Err(LandError::Topology("no `land` object"))
        ));
    }

    #[test]
    fn arc_index_out_of_range_is_rejected() {
        let doc = r#"{
            "type": "Topology",
            "arcs": [[[0.0,0.0],[1.0,1.0]]],
            "objects": { "land": { "type": "Polygon", "arcs": [[5]] } }
        }"#;
        assert!(matches!(parse_land(doc), Err(LandError::Topology(_))));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(parse_land("not json"), Err(LandError::Parse(_))));
    }
}
