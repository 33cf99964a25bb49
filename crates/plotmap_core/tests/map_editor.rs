use plotmap_core::editor::{CollisionPolicy, EditorError, LayerDirection, MapEditor, NewItem, SelectionFilter};
use plotmap_core::geometry::{Bounds, Point, SnapSettings};
use plotmap_core::model::item::{ItemCategory, PlotProperties};
use plotmap_core::model::map::MapData;

fn editor() -> MapEditor {
    MapEditor::new(MapData::new_default(), SnapSettings::default()).unwrap()
}

fn layer_id(editor: &MapEditor, name: &str) -> String {
    editor
        .layers()
        .iter()
        .find(|layer| layer.name == name)
        .map(|layer| layer.id.clone())
        .unwrap()
}

fn plot(editor: &MapEditor, id: &str, x: f64, y: f64) -> NewItem {
    NewItem::new(
        "plot-standard",
        ItemCategory::Plot,
        layer_id(editor, "Plots"),
        Bounds::new(x, y, 10.0, 10.0),
    )
    .with_id(id)
}

#[test]
fn overlap_is_rejected_only_for_positive_area_on_the_same_layer() {
    let mut editor = editor();
    editor
        .place_item(plot(&editor, "a", 0.0, 0.0), CollisionPolicy::Reject)
        .unwrap();

    // Shared edge is not an overlap.
    editor
        .place_item(plot(&editor, "b", 10.0, 0.0), CollisionPolicy::Reject)
        .unwrap();

    let err = editor
        .place_item(plot(&editor, "c", 5.0, 5.0), CollisionPolicy::Reject)
        .unwrap_err();
    assert!(matches!(err, EditorError::Overlap { ref existing } if existing == "a"));
    assert!(editor.item("c").is_none());

    let ground = NewItem::new(
        "ground-grass",
        ItemCategory::Ground,
        layer_id(&editor, "Ground"),
        Bounds::new(5.0, 5.0, 10.0, 10.0),
    );
    editor.place_item(ground, CollisionPolicy::Reject).unwrap();

    editor
        .place_item(plot(&editor, "d", 5.0, 5.0), CollisionPolicy::Allow)
        .unwrap();
    assert_eq!(editor.items().len(), 4);
}

#[test]
fn move_and_resize_respect_collisions_and_snapping() {
    let mut editor = editor();
    editor
        .place_item(plot(&editor, "a", 0.0, 0.0), CollisionPolicy::Reject)
        .unwrap();
    editor
        .place_item(plot(&editor, "b", 20.0, 0.0), CollisionPolicy::Reject)
        .unwrap();

    editor.move_item("b", 12.7, 3.2, CollisionPolicy::Reject).unwrap();
    let moved = editor.item("b").unwrap();
    assert_eq!((moved.x, moved.y), (12.0, 3.0));

    let err = editor
        .resize_item("a", 14.0, 10.0, CollisionPolicy::Reject)
        .unwrap_err();
    assert!(matches!(err, EditorError::Overlap { .. }));
    assert_eq!(editor.item("a").unwrap().width, 10.0);

    editor.resize_item("a", 11.6, 4.4, CollisionPolicy::Reject).unwrap();
    let resized = editor.item("a").unwrap();
    assert_eq!((resized.width, resized.height), (12.0, 4.0));
}

#[test]
fn background_layer_is_protected_and_last_operational_layer_stays() {
    let mut editor = editor();
    let background = layer_id(&editor, "Map Background");

    assert!(matches!(
        editor.remove_layer(&background),
        Err(EditorError::LayerProtected(_))
    ));
    assert!(matches!(
        editor.rename_layer(&background, "Sky"),
        Err(EditorError::LayerProtected(_))
    ));
    assert!(matches!(
        editor.add_layer("background"),
        Err(EditorError::LayerProtected(_))
    ));
    let bg_item = NewItem::new(
        "ground-grass",
        ItemCategory::Ground,
        background.clone(),
        Bounds::new(0.0, 0.0, 5.0, 5.0),
    );
    assert!(matches!(
        editor.place_item(bg_item, CollisionPolicy::Reject),
        Err(EditorError::LayerProtected(_))
    ));

    let operational: Vec<String> = editor
        .layers()
        .iter()
        .filter(|layer| !layer.is_background())
        .map(|layer| layer.id.clone())
        .collect();
    let (last, rest) = operational.split_last().unwrap();
    for id in rest {
        editor.remove_layer(id).unwrap();
    }
    assert!(matches!(
        editor.remove_layer(last),
        Err(EditorError::LastOperationalLayer)
    ));
    assert_eq!(editor.layers().len(), 2);
    editor.map().validate().unwrap();
}

#[test]
fn removing_a_layer_removes_its_items() {
    let mut editor = editor();
    editor
        .place_item(plot(&editor, "a", 0.0, 0.0), CollisionPolicy::Reject)
        .unwrap();
    editor
        .place_item(plot(&editor, "b", 10.0, 0.0), CollisionPolicy::Reject)
        .unwrap();

    let plots = layer_id(&editor, "Plots");
    assert_eq!(editor.remove_layer(&plots).unwrap(), 2);
    assert!(editor.items().is_empty());
    assert!(editor.layer(&plots).is_none());
}

#[test]
fn new_layers_go_on_top_and_reorder_swaps_neighbours() {
    let mut editor = editor();
    let added = editor.add_layer("Trees").unwrap();
    let top = editor.layers().last().unwrap();
    assert_eq!(top.id, added);
    assert!((top.z_index - 0.11).abs() < 1e-9);

    assert!(editor.reorder_layer(&added, LayerDirection::Up).unwrap());
    let names: Vec<&str> = editor.layers().iter().map(|layer| layer.name.as_str()).collect();
    assert_eq!(names[names.len() - 2], "Trees");
    assert!(!editor.reorder_layer(&layer_id(&editor, "Objects & Structures"), LayerDirection::Down).unwrap());

    let ground = layer_id(&editor, "Ground");
    assert!(!editor.reorder_layer(&ground, LayerDirection::Up).unwrap());
}

#[test]
fn render_order_does_not_depend_on_insertion_order() {
    let specs = [
        ("p1", "plot-standard", ItemCategory::Plot, "Plots", 0.0, 20.0),
        ("p2", "plot-standard", ItemCategory::Plot, "Plots", 10.0, 0.0),
        ("g1", "ground-grass", ItemCategory::Ground, "Ground", 0.0, 0.0),
        ("s1", "street-main", ItemCategory::Street, "Streets", 40.0, 0.0),
        ("p3", "plot-standard", ItemCategory::Plot, "Plots", 0.0, 0.0),
    ];

    let build = |order: &[usize]| {
        let mut editor = editor();
        for &index in order {
            let (id, kind, category, layer, x, y) = specs[index];
            let item = NewItem::new(kind, category, layer_id(&editor, layer), Bounds::new(x, y, 5.0, 5.0))
                .with_id(id);
            editor.place_item(item, CollisionPolicy::Reject).unwrap();
        }
        editor
            .render_order(false)
            .iter()
            .map(|entry| entry.item.id.clone())
            .collect::<Vec<_>>()
    };

    let forward = build(&[0, 1, 2, 3, 4]);
    assert_eq!(forward, build(&[4, 3, 2, 1, 0]));
    assert_eq!(forward, build(&[2, 0, 4, 1, 3]));
    assert_eq!(forward, vec!["g1", "s1", "p3", "p2", "p1"]);
}

#[test]
fn hidden_layers_are_skipped_unless_requested() {
    let mut editor = editor();
    editor
        .place_item(plot(&editor, "a", 0.0, 0.0), CollisionPolicy::Reject)
        .unwrap();
    let plots = layer_id(&editor, "Plots");
    editor.set_layer_visible(&plots, false).unwrap();

    assert!(editor.render_order(false).is_empty());
    assert_eq!(editor.render_order(true).len(), 1);
}

#[test]
fn rotating_a_plot_mirrors_facing_direction() {
    let mut editor = editor();
    editor
        .place_item(plot(&editor, "a", 0.0, 0.0), CollisionPolicy::Reject)
        .unwrap();
    let ids = vec!["a".to_string()];

    editor.rotate_items(&ids, 90.0).unwrap();
    editor.rotate_items(&ids, 300.0).unwrap();

    let item = editor.item("a").unwrap();
    assert_eq!(item.rotation, 30.0);
    assert_eq!(item.plot_properties().unwrap().facing_direction, Some(30.0));

    let missing = vec!["a".to_string(), "ghost".to_string()];
    assert!(matches!(
        editor.rotate_items(&missing, 10.0),
        Err(EditorError::UnknownItem(_))
    ));
    assert_eq!(editor.item("a").unwrap().rotation, 30.0);
}

#[test]
fn plot_properties_are_typed_and_validated() {
    let mut editor = editor();
    editor
        .place_item(plot(&editor, "a", 0.0, 0.0), CollisionPolicy::Reject)
        .unwrap();

    let properties = PlotProperties {
        name: Some("Corner Lot".to_string()),
        price: Some(250.0),
        facing_direction: None,
    };
    editor.set_plot_properties("a", &properties).unwrap();
    assert_eq!(editor.item("a").unwrap().plot_properties(), Some(properties));

    let negative = PlotProperties {
        price: Some(-1.0),
        ..PlotProperties::default()
    };
    assert!(matches!(
        editor.set_plot_properties("a", &negative),
        Err(EditorError::InvalidValue("price"))
    ));
}

#[test]
fn rectangle_selection_counts_edge_contact_and_filters() {
    let mut editor = editor();
    editor
        .place_item(plot(&editor, "a", 0.0, 0.0), CollisionPolicy::Reject)
        .unwrap();
    editor
        .place_item(plot(&editor, "b", 30.0, 0.0), CollisionPolicy::Reject)
        .unwrap();
    let grass = NewItem::new(
        "ground-grass",
        ItemCategory::Ground,
        layer_id(&editor, "Ground"),
        Bounds::new(0.0, 0.0, 5.0, 5.0),
    )
    .with_id("g");
    editor.place_item(grass, CollisionPolicy::Reject).unwrap();

    // Drag from bottom-right to top-left.
    let mut all = editor.select_in_rectangle(Point::new(20.0, 20.0), Point::new(2.0, 2.0), &SelectionFilter::all());
    all.sort();
    assert_eq!(all, vec!["a", "g"]);

    let edge = editor.select_in_rectangle(Point::new(10.0, 0.0), Point::new(10.0, 5.0), &SelectionFilter::all());
    assert_eq!(edge, vec!["a"]);

    let plots_only = editor.select_in_rectangle(
        Point::new(0.0, 0.0),
        Point::new(40.0, 10.0),
        &SelectionFilter::categories([ItemCategory::Plot]),
    );
    assert_eq!(plots_only, vec!["a", "b"]);
}

#[test]
fn catalog_items_route_to_matching_layers() {
    let mut editor = editor();
    let plot_id = editor
        .place_catalog_item("plot-premium", 3.0, 4.0, None, CollisionPolicy::Reject)
        .unwrap();
    let water_id = editor
        .place_catalog_item("ground-water", 50.0, 50.0, None, CollisionPolicy::Reject)
        .unwrap();

    let plot = editor.item(&plot_id).unwrap();
    assert_eq!(plot.layer_id, layer_id(&editor, "Plots"));
    assert_eq!((plot.width, plot.height), (15.0, 10.0));
    assert_eq!(editor.item(&water_id).unwrap().layer_id, layer_id(&editor, "Water Features"));

    assert!(matches!(
        editor.place_catalog_item("plot-mansion", 0.0, 0.0, None, CollisionPolicy::Reject),
        Err(EditorError::UnknownItemType(_))
    ));
}

#[test]
fn export_then_import_preserves_the_document() {
    let mut editor = editor();
    editor
        .place_item(plot(&editor, "a", 0.0, 0.0), CollisionPolicy::Reject)
        .unwrap();
    editor
        .set_plot_properties(
            "a",
            &PlotProperties {
                name: Some("Harbour View".to_string()),
                price: Some(180.0),
                facing_direction: Some(90.0),
            },
        )
        .unwrap();

    let json = editor.export_json().unwrap();
    let restored = MapEditor::import_json(&json, SnapSettings::default()).unwrap();
    assert_eq!(restored.map(), editor.map());
}

#[test]
fn importing_an_invalid_document_fails() {
    let json = r#"{"name": "Broken", "width": 100, "height": 100, "layers": [
        {"id": "l1", "name": "Ground", "zIndex": 0}
    ]}"#;
    assert!(matches!(
        MapEditor::import_json(json, SnapSettings::default()),
        Err(EditorError::InvalidMap(_))
    ));
}

#[test]
fn world_position_recenters_on_the_map() {
    let mut editor = editor();
    editor
        .place_item(plot(&editor, "a", 70.0, 70.0), CollisionPolicy::Reject)
        .unwrap();

    let world = editor.world_position("a", 2.0).unwrap();
    assert_eq!((world.x, world.z), (0.0, 0.0));
    assert!(matches!(
        editor.world_position("a", 0.0),
        Err(EditorError::InvalidValue("unitSize"))
    ));
}

#[test]
fn non_positive_or_non_finite_sizes_are_rejected_before_snapping() {
    let mut editor = editor();
    let plots = layer_id(&editor, "Plots");
    for (width, height) in [(-5.0, 10.0), (10.0, 0.0), (f64::NAN, 10.0), (10.0, f64::INFINITY)] {
        let item = NewItem::new("plot-standard", ItemCategory::Plot, plots.clone(), Bounds::new(0.0, 0.0, width, height));
        assert!(matches!(
            editor.place_item(item, CollisionPolicy::Reject),
            Err(EditorError::InvalidDimensions { .. })
        ));
    }
    assert!(editor.items().is_empty());

    // Positive sizes below one cell still snap up to the grid.
    let small = NewItem::new("plot-standard", ItemCategory::Plot, plots, Bounds::new(0.0, 0.0, 0.3, 0.3))
        .with_id("small");
    editor.place_item(small, CollisionPolicy::Reject).unwrap();
    let placed = editor.item("small").unwrap();
    assert_eq!((placed.width, placed.height), (1.0, 1.0));

    assert!(matches!(
        editor.resize_item("small", -5.0, 4.0, CollisionPolicy::Reject),
        Err(EditorError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        editor.resize_item("small", 4.0, f64::NAN, CollisionPolicy::Reject),
        Err(EditorError::InvalidDimensions { .. })
    ));
    let unchanged = editor.item("small").unwrap();
    assert_eq!((unchanged.width, unchanged.height), (1.0, 1.0));
}

#[test]
fn export_then_import_keeps_computed_z_indices_bit_exact() {
    let mut editor = editor();
    for index in 0..200 {
        editor.add_layer(&format!("Layer {index}")).unwrap();
    }
    let unsnapped = SnapSettings {
        enabled: false,
        grid_size: 1.0,
    };
    editor.set_snap(unsnapped).unwrap();
    let top = editor.layers().last().unwrap().id.clone();
    let item = NewItem::new("ground-grass", ItemCategory::Ground, top, Bounds::new(0.1, 0.7, 3.33, 2.9))
        .with_elevation_offset(0.1 + 0.2);
    editor.place_item(item, CollisionPolicy::Reject).unwrap();

    let json = editor.export_json().unwrap();
    let restored = MapEditor::import_json(&json, unsnapped).unwrap();

    let bits = |editor: &MapEditor| {
        editor
            .layers()
            .iter()
            .map(|layer| (layer.id.clone(), layer.z_index.to_bits()))
            .collect::<Vec<_>>()
    };
    assert_eq!(bits(&restored), bits(&editor));
    let (before, after) = (&editor.items()[0], &restored.items()[0]);
    assert_eq!(before.elevation_offset.to_bits(), after.elevation_offset.to_bits());
    assert_eq!(before.width.to_bits(), after.width.to_bits());

    let order = |editor: &MapEditor| {
        editor
            .render_order(true)
            .iter()
            .map(|entry| entry.item.id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(order(&restored), order(&editor));
}
