// THEORY:
// The `viewpoint` module holds the fixed camera catalog used to photograph an
// asset. Three views are taken, always in the same order, and the inference
// prompt relies on that order to know which image is which:
//
// 1.  **Oblique overhead**: looking down at the model from a corner.
// 2.  **Side**: straight along the X axis.
// 3.  **Top**: straight down the Y axis.
//
// A `Viewpoint` is also the renderer's wire descriptor, so its serde shape is
// the flat camelCase JSON object the renderer expects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of views rendered for every asset.
pub const VIEW_COUNT: usize = 3;

const FOV_DEGREES: f64 = 45.0;
const IMAGE_WIDTH: u32 = 800;
const IMAGE_HEIGHT: u32 = 600;

/// A single camera pose sent to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewpoint {
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub target_z: f64,
    /// Vertical field of view in degrees.
    pub fov: f64,
    pub width: u32,
    pub height: u32,
    pub enable_lighting: bool,
}

impl Viewpoint {
    /// A camera at `position` aimed at the origin with the catalog's lens and output size.
    const fn looking_at_origin(position: [f64; 3]) -> Self {
        Self {
            position_x: position[0],
            position_y: position[1],
            position_z: position[2],
            target_x: 0.0,
            target_y: 0.0,
            target_z: 0.0,
            fov: FOV_DEGREES,
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            enable_lighting: false,
        }
    }
}

/// Identifies a catalog entry. The discriminant order is the canonical render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    ObliqueOverhead,
    Side,
    Top,
}

impl ViewKind {
    /// All views in the order they are rendered and handed to the model.
    pub const ALL: [ViewKind; VIEW_COUNT] = [ViewKind::ObliqueOverhead, ViewKind::Side, ViewKind::Top];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn viewpoint(self) -> &'static Viewpoint {
        &VIEWPOINTS[self.index()]
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewKind::ObliqueOverhead => "oblique-overhead",
            ViewKind::Side => "side",
            ViewKind::Top => "top",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The fixed viewpoint catalog, indexed by `ViewKind::index`.
pub static VIEWPOINTS: [Viewpoint; VIEW_COUNT] = [
    Viewpoint::looking_at_origin([2.0, 2.5, 2.0]),
    Viewpoint::looking_at_origin([3.0, 0.0, 0.0]),
    Viewpoint::looking_at_origin([0.0, 3.0, 0.0]),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn position(vp: &Viewpoint) -> [f64; 3] {
        [vp.position_x, vp.position_y, vp.position_z]
    }

    #[test]
    fn catalog_is_in_canonical_order() {
        assert_eq!(ViewKind::ALL.len(), VIEW_COUNT);
        assert_eq!(position(ViewKind::ObliqueOverhead.viewpoint()), [2.0, 2.5, 2.0]);
        assert_eq!(position(ViewKind::Side.viewpoint()), [3.0, 0.0, 0.0]);
        assert_eq!(position(ViewKind::Top.viewpoint()), [0.0, 3.0, 0.0]);

        for kind in ViewKind::ALL {
            let vp = kind.viewpoint();
            assert_eq!([vp.target_x, vp.target_y, vp.target_z], [0.0, 0.0, 0.0]);
            assert_eq!((vp.width, vp.height), (800, 600));
            assert_eq!(vp.fov, 45.0);
            assert!(!vp.enable_lighting);
        }
    }

    #[test]
    fn wire_json_uses_renderer_field_names() {
        let json = serde_json::to_value(ViewKind::ObliqueOverhead.viewpoint()).expect("serialize");
        let obj = json.as_object().expect("object");

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "enableLighting",
                "fov",
                "height",
                "positionX",
                "positionY",
                "positionZ",
                "targetX",
                "targetY",
                "targetZ",
                "width",
            ]
        );
        assert_eq!(obj["positionY"], 2.5);
        assert_eq!(obj["enableLighting"], false);
    }

    #[test]
    fn wire_json_round_trips() {
        for kind in ViewKind::ALL {
            let json = serde_json::to_string(kind.viewpoint()).expect("serialize");
            let back: Viewpoint = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(&back, kind.viewpoint());
        }
    }
}
