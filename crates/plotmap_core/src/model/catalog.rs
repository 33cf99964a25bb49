//! Built-in item type catalog and category to layer routing.

use crate::model::item::ItemCategory;

/// Placement defaults for one item type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemTypeSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ItemCategory,
    pub color: &'static str,
    pub default_width: f64,
    pub default_height: f64,
    pub elevation_offset: f64,
}

const fn spec(
    id: &'static str,
    name: &'static str,
    category: ItemCategory,
    color: &'static str,
    size: (f64, f64),
    elevation_offset: f64,
) -> ItemTypeSpec {
    ItemTypeSpec {
        id,
        name,
        category,
        color,
        default_width: size.0,
        default_height: size.1,
        elevation_offset,
    }
}

use ItemCategory::{Building, Decorative, Ground, Landmark, Plot, Street};

/// Every placeable item type, grouped by category.
pub static ITEM_TYPES: &[ItemTypeSpec] = &[
    spec("plot-standard", "Standard Plot", Plot, "#d5e8d4", (10.0, 10.0), 0.0),
    spec("plot-premium", "Premium Plot", Plot, "#b5e7a0", (15.0, 10.0), 0.0),
    spec("plot-commercial", "Commercial Plot", Plot, "#e1d5e7", (20.0, 15.0), 0.0),
    spec("building-community-center", "Community Center", Building, "#4ECDC4", (8.0, 6.0), 0.0),
    spec("building-directory", "Directory Building", Building, "#FF6B6B", (5.0, 5.0), 0.0),
    spec("building-feedback", "Feedback Building", Building, "#C7B3E5", (4.0, 4.0), 0.0),
    spec("landmark-centralpark", "Central Park", Landmark, "#8CC084", (20.0, 15.0), 0.0),
    spec("landmark-mountain-with-waterfall", "Mountain Waterfall", Landmark, "#FFD700", (3.0, 5.0), 0.0),
    spec("landmark-clock-tower", "Clock Tower", Landmark, "#1e88e5", (5.0, 10.0), 0.0),
    spec("decorative-tree-pine", "Pine Tree", Decorative, "#6B8E23", (1.0, 1.0), 0.0),
    spec("decorative-tree-mushroom", "Mushroom Tree", Decorative, "#8B4513", (1.0, 1.0), 0.0),
    spec("decorative-tree-crystal", "Crystal Tree", Decorative, "#87CEEB", (1.0, 1.0), 0.0),
    spec("decorative-tree-floating", "Floating Tree", Decorative, "#9370DB", (1.0, 1.0), 0.0),
    spec("decorative-tree-bonsai", "Bonsai Tree", Decorative, "#8B0000", (1.0, 1.0), 0.0),
    spec("decorative-tree-tree", "Tree", Decorative, "#228B22", (1.0, 1.0), 0.0),
    spec("decorative-tree-forest", "Forest Tree", Decorative, "#2E8B57", (1.0, 1.0), 0.0),
    spec("decorative-mailbox", "Mailbox", Decorative, "#CD5C5C", (0.5, 0.5), 0.0),
    spec("decorative-bench", "Bench", Decorative, "#A0522D", (1.5, 0.5), 0.0),
    spec("decorative-lamp", "Street Lamp", Decorative, "#FFD700", (0.5, 2.0), 0.0),
    spec("decorative-billboard", "Hologram Billboard", Decorative, "#00CED1", (3.0, 2.0), 0.0),
    spec("decorative-robot-pet", "Robot Pet", Decorative, "#C0C0C0", (0.7, 0.7), 0.0),
    spec("street-main", "Main Street", Street, "#555555", (2.0, 10.0), 0.0),
    spec("street-rounded", "Secondary Street", Street, "#666666", (1.5, 8.0), 0.0),
    spec("street-path", "Walking Path", Street, "#d2b48c", (1.0, 5.0), -0.005),
    spec("street-ellipse", "Elliptical Street", Street, "#999999", (2.0, 10.0), 0.0),
    spec("street-roundabout", "Roundabout", Street, "#AAAAAA", (3.0, 3.0), 0.0),
    spec("street-junction", "Junction", Street, "#BBBBBB", (2.0, 2.0), 0.0),
    spec("street-diagonal", "Diagonal Street", Street, "#CCCCCC", (1.5, 8.0), 0.0),
    spec("street-bridge", "Bridge", Street, "#B0C4DE", (2.0, 10.0), 0.02),
    spec("street-railroad", "Railroad", Street, "#8B0000", (2.0, 10.0), 0.0),
    spec("street-curve", "Curved Street", Street, "#A9A9A9", (1.5, 8.0), 0.0),
    spec("street-traffic-circle", "Traffic Circle", Street, "#808080", (3.0, 3.0), 0.0),
    spec("street-parking-lot", "Parking Lot", Street, "#696969", (10.0, 10.0), 0.0),
    spec("street-sidewalk", "Sidewalk", Street, "#C0C0C0", (1.0, 5.0), -0.005),
    spec("ground-grass", "Grass", Ground, "#8CC084", (5.0, 5.0), 0.0),
    spec("ground-street", "Paved Street (Ground)", Ground, "#AAAAAA", (10.0, 10.0), 0.02),
    spec("ground-water", "Water", Ground, "#1e88e5", (10.0, 10.0), 0.04),
    spec("ground-sand", "Sand", Ground, "#F5DEB3", (5.0, 5.0), 0.01),
    spec("ground-park", "Park Ground", Ground, "#228B22", (10.0, 10.0), 0.0),
    spec("ground-dirt", "Dirt", Ground, "#8B4513", (5.0, 5.0), 0.0),
    spec("ground-rock", "Rocky Ground", Ground, "#A9A9A9", (5.0, 5.0), 0.0),
    spec("ground-snow", "Snowy Ground", Ground, "#FFFFFF", (5.0, 5.0), 0.0),
    spec("ground-lava", "Lava", Ground, "#FF4500", (5.0, 5.0), 0.0),
    spec("ground-toxic", "Toxic Waste", Ground, "#32CD32", (5.0, 5.0), 0.0),
];

/// Looks up a catalog entry by type id.
pub fn find_item_type(type_id: &str) -> Option<&'static ItemTypeSpec> {
    ITEM_TYPES.iter().find(|spec| spec.id == type_id)
}

/// Catalog entries of one category, in catalog order.
pub fn item_types_in(category: ItemCategory) -> impl Iterator<Item = &'static ItemTypeSpec> {
    ITEM_TYPES.iter().filter(move |spec| spec.category == category)
}

/// Layer lookup hint: an exact (case-insensitive) name, then a substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerHint {
    pub exact: &'static str,
    pub contains: &'static str,
}

const fn hint(exact: &'static str, contains: &'static str) -> LayerHint {
    LayerHint { exact, contains }
}

const WATER_HINTS: &[LayerHint] = &[hint("Water", "water")];
const GROUND_HINTS: &[LayerHint] = &[hint("Ground", "ground")];
const PLOT_HINTS: &[LayerHint] = &[hint("Plots", "plot")];
const STREET_HINTS: &[LayerHint] = &[hint("Streets", "street")];
const BUILDING_HINTS: &[LayerHint] = &[hint("Objects", "object"), hint("Buildings", "building")];
const DECORATIVE_HINTS: &[LayerHint] = &[hint("Objects", "object"), hint("Decorative", "decorative")];
const LANDMARK_HINTS: &[LayerHint] = &[hint("Objects", "object"), hint("Landmarks", "landmark")];

/// Ordered layer hints a new item of `category`/`type_id` is routed by.
pub fn layer_hints(category: ItemCategory, type_id: &str) -> &'static [LayerHint] {
    match category {
        Ground if type_id == "ground-water" => WATER_HINTS,
        Ground => GROUND_HINTS,
        Plot => PLOT_HINTS,
        Street => STREET_HINTS,
        Building => BUILDING_HINTS,
        Decorative => DECORATIVE_HINTS,
        Landmark => LANDMARK_HINTS,
    }
}
