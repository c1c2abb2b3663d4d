//! Store location pins. This module owns the 3D side of the layer: marker
//! placement on the sphere and which pins earn a floating label. Drawing the
//! label text is the embedder's job.

use crate::sample::project_unit;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Markers float just off the surface so they never z-fight the point cloud.
pub const PIN_SURFACE_SCALE: f32 = 1.01;
/// Labels sit further out than their markers.
pub const LABEL_SURFACE_SCALE: f32 = 1.035;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pin {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Pin {
    /// A pin with no contact details still gets a marker, just no label.
    pub fn has_details(&self) -> bool {
        self.name.is_some() || self.address.is_some() || self.phone.is_some()
    }

    /// First contact field, the line a label leads with.
    pub fn title(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.address.as_deref())
            .or(self.phone.as_deref())
    }
}

/// One marker (and its halo) in globe space.
#[derive(Debug, Clone, PartialEq)]
pub struct PinNode {
    pub pin_index: usize,
    pub position: [f32; 3],
}

/// Anchor for a pin's floating text.
#[derive(Debug, Clone, PartialEq)]
pub struct PinLabel {
    pub pin_index: usize,
    pub position: [f32; 3],
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct PinScene {
    pub nodes: Vec<PinNode>,
    pub labels: Vec<PinLabel>,
}

/// Rebuild the full scene from the pin list. Incremental updates are not
/// worth the bookkeeping at storefront pin counts.
pub fn build_pin_scene(pins: &[Pin]) -> PinScene {
    let mut scene = PinScene::default();
    for (pin_index, pin) in pins.iter().enumerate() {
        let unit = project_unit(pin.lon, pin.lat);
        scene.nodes.push(PinNode {
            pin_index,
            position: scale3(unit, PIN_SURFACE_SCALE),
        });
        if let Some(title) = pin.title() {
            scene.labels.push(PinLabel {
                pin_index,
                position: scale3(unit, LABEL_SURFACE_SCALE),
                title: title.to_string(),
            });
        }
    }
    scene
}

/// Order-sensitive digest of the pin list. The scene is rebuilt whenever
/// this changes, field edits included.
pub fn pins_signature(pins: &[Pin]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    pins.len().hash(&mut hasher);
    for pin in pins {
        pin.lat.to_bits().hash(&mut hasher);
        pin.lon.to_bits().hash(&mut hasher);
        pin.name.hash(&mut hasher);
        pin.address.hash(&mut hasher);
        pin.phone.hash(&mut hasher);
    }
    hasher.finish()
}

fn scale3(v: [f32; 3], s: f32) -> [f32; 3] {
    [v[0] * s, v[1] * s, v[2] * s]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pins() -> Vec<Pin> {
        vec![
            Pin {
                lat: 40.71,
                lon: -74.0,
                name: Some("Downtown".into()),
                address: Some("1 Main St".into()),
                phone: Some("555-0100".into()),
            },
            Pin {
                lat: 51.5,
                lon: -0.12,
                name: None,
                address: Some("2 High Rd".into()),
                phone: None,
            },
            Pin {
                lat: -33.86,
                lon: 151.2,
                ..Pin::default()
            },
        ]
    }

    #[test]
    fn every_pin_gets_a_node_but_only_detailed_pins_get_labels() {
        let scene = build_pin_scene(&sample_pins());
        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.labels.len(), 2);
        assert_eq!(scene.labels[0].title, "Downtown");
        assert_eq!(scene.labels[1].title, "2 High Rd");
        assert_eq!(scene.labels[1].pin_index, 1);
    }

    #[test]
    fn markers_sit_above_the_unit_sphere() {
        let scene = build_pin_scene(&sample_pins());
        for node in &scene.nodes {
            let [x, y, z] = node.position;
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - PIN_SURFACE_SCALE).abs() < 1e-4, "radius {r}");
        }
    }

    #[test]
    fn labels_anchor_on_the_marker_ray() {
        let scene = build_pin_scene(&sample_pins());
        let node = &scene.nodes[0].position;
        let label = &scene.labels[0].position;
        for axis in 0..3 {
            let expected = node[axis] / PIN_SURFACE_SCALE * LABEL_SURFACE_SCALE;
            assert!((label[axis] - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn signature_tracks_field_edits_and_order() {
        let pins = sample_pins();
        assert_eq!(pins_signature(&pins), pins_signature(&sample_pins()));

        let mut renamed = sample_pins();
        renamed[0].name = Some("Uptown".into());
        assert_ne!(pins_signature(&pins), pins_signature(&renamed));

        let mut swapped = sample_pins();
        swapped.swap(0, 1);
        assert_ne!(pins_signature(&pins), pins_signature(&swapped));

        assert_ne!(pins_signature(&pins), pins_signature(&pins[..2]));
    }
}
