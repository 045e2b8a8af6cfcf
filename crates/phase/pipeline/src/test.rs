#![allow(non_snake_case)]

use super::*;
use lib_asset_store::{AssetRecord, AssetState, Format};
use lib_snapshot::Snapshot;
use serde_json::json;
use std::fs::File;

fn project() -> Value {
    json!({
        "name": "Demo",
        "document": {"type": "DOCUMENT", "children": [{
            "id": "0:1", "type": "CANVAS", "name": "Page 1",
            "backgroundColor": {"r": 1.0, "g": 1.0, "b": 1.0, "a": 1.0},
            "children": [
                {
                    "id": "1:1", "type": "FRAME", "name": "Main",
                    "size": {"x": 200.0, "y": 100.0},
                    "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                    "clipsContent": true,
                    "fills": [],
                    "children": [
                        {
                            "id": "2:0", "type": "COMPONENT", "name": "Widget",
                            "size": {"x": 100.0, "y": 50.0},
                            "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                            "clipsContent": false,
                            "fills": [],
                            "children": [{
                                "id": "2:1", "type": "RECTANGLE", "name": "A",
                                "size": {"x": 40.0, "y": 20.0},
                                "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                                "fills": []
                            }]
                        },
                        {
                            "id": "4:1", "type": "RECTANGLE", "name": "Photo",
                            "size": {"x": 50.0, "y": 50.0},
                            "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 60.0]],
                            "fills": [{"imageRef": "img1"}]
                        }
                    ]
                },
                {
                    "id": "I9:1", "type": "INSTANCE", "name": "Widget",
                    "componentId": "2:0",
                    "size": {"x": 100.0, "y": 50.0},
                    "relativeTransform": [[1.0, 0.0, 10.0], [0.0, 1.0, 10.0]],
                    "fills": [],
                    "children": [{
                        "id": "I9:1;2:1", "type": "RECTANGLE", "name": "A",
                        "size": {"x": 40.0, "y": 20.0},
                        "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                        "fills": []
                    }]
                }
            ]
        }]},
        "components": {"2:0": {"name": "Widget", "key": "kw", "description": ""}}
    })
}

fn snapshot() -> Snapshot {
    Snapshot {
        project_token: "proj".to_owned(),
        root: Bytes::from(serde_json::to_vec(&project()).unwrap()),
        checksum: 7,
        flags: 0,
        imports: default_imports(),
        images: vec![AssetRecord {
            id: "img1".to_owned(),
            url: String::new(),
            bytes: Bytes::from_static(b"fakepng"),
            format: Format::Png,
            state: AssetState::Committed,
        }],
        renderings: Vec::new(),
        nodes: Vec::new(),
    }
}

fn snapshot_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("demo.fqs");
    let mut file = File::create(&path).unwrap();
    lib_snapshot::write(&snapshot(), &mut file).unwrap();
    path
}

fn restored_driver(dir: &tempfile::TempDir) -> (Driver, Receiver<DriverEvent>) {
    let (mut driver, events) = Driver::new(DriverConfig::new("token", "proj"));
    driver.restore(&snapshot_file(dir)).unwrap();
    (driver, events)
}

#[test]
fn restore_snapshot__EXPECT__document_built_with_header_and_components() {
    // Given
    let dir = tempfile::tempdir().unwrap();

    // When
    let (driver, events) = restored_driver(&dir);

    // Then
    assert!(driver.is_valid());
    assert_eq!("Demo", driver.document_name());
    assert_eq!(1, driver.canvas_count());
    assert_eq!(2, driver.element_count());
    assert_eq!("Page 1", driver.canvas_name());
    assert_eq!("Main_figma", driver.element_name());
    let source = String::from_utf8(driver.source_code().to_vec()).unwrap();
    assert!(source.starts_with(
        "import QtQuick 2.15\nimport QtQuick.Shapes 1.15\nimport QtGraphicalEffects 1.15\n\n"
    ));
    // the image fill is embedded since no output directory is set
    assert!(source.contains("data:image/png;base64,ZmFrZXBuZw=="));
    // the inline component child references the component definition
    assert!(source.contains("Widget_figma {\n"));
    assert_eq!(vec!["Widget_figma".to_owned()], driver.components());
    let component = driver.component_source_code("Widget_figma").unwrap();
    assert!(String::from_utf8(component.to_vec())
        .unwrap()
        .contains("property Component delegate_2_1: "));
    let received: Vec<DriverEvent> = events.try_iter().collect();
    assert!(received.contains(&DriverEvent::DocumentCreated));
    assert!(received.contains(&DriverEvent::ComponentLoaded(0, 0)));
    assert!(received.contains(&DriverEvent::ComponentLoaded(0, 1)));
}

#[test]
fn unique_names__EXPECT__instance_element_counter_disambiguated_from_component() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let (mut driver, _events) = restored_driver(&dir);

    // When: the instance element is also named "Widget"
    assert!(driver.set_current_element(1));

    // Then
    assert_eq!("Widget1_figma", driver.element_name());
}

#[test]
fn cursor_bounds__EXPECT__out_of_range_rejected() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let (mut driver, _events) = restored_driver(&dir);

    // When / Then
    assert!(driver.set_current_canvas(0));
    assert!(!driver.set_current_canvas(1));
    assert!(driver.set_current_element(1));
    assert!(!driver.set_current_element(2));
}

#[test]
fn filter__EXPECT__restricts_parsing_to_selected_elements() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let (mut driver, _events) = restored_driver(&dir);
    assert_eq!(2, driver.element_count());

    // When
    let mut filter = OrderMap::new();
    filter.insert(0usize, HashSet::from([0usize]));
    driver.set_filter(filter);

    // Then
    assert_eq!(1, driver.element_count());
    assert_eq!("Main_figma", driver.element_name());
}

#[test]
fn flags_change__EXPECT__document_rebuilt_with_new_emission() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let (mut driver, _events) = restored_driver(&dir);
    let plain = String::from_utf8(driver.source_code().to_vec()).unwrap();
    assert!(plain.contains("objectName:"));

    // When
    driver.set_flags(Flags::QUL_MODE);

    // Then
    let qul = String::from_utf8(driver.source_code().to_vec()).unwrap();
    assert!(!qul.contains("objectName:"));
    assert!(driver.is_valid());
}

#[test]
fn corrupted_snapshot__EXPECT__distinct_error_and_empty_driver() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let path = snapshot_file(&dir);
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[..4].copy_from_slice(b"FQ01");
    std::fs::write(&path, &bytes).unwrap();

    // When
    let (mut driver, _events) = Driver::new(DriverConfig::new("token", "proj"));
    let result = driver.restore(&path);

    // Then
    assert!(matches!(
        result,
        Err(Error::Snapshot(lib_snapshot::Error::BadMagic(_)))
    ));
    assert!(!driver.is_valid());
    assert_eq!(0, driver.canvas_count());
}

#[test]
fn store_then_restore__EXPECT__identical_source_code() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let (driver, _events) = restored_driver(&dir);
    let copy = dir.path().join("copy.fqs");

    // When
    driver.store(&copy).unwrap();
    let (mut thawed, _events2) = Driver::new(DriverConfig::new("token", "other"));
    thawed.restore(&copy).unwrap();

    // Then
    assert_eq!(driver.source_code(), thawed.source_code());
    assert_eq!(driver.element_name(), thawed.element_name());
}

#[test]
fn save_all_qml__EXPECT__elements_and_components_written() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let (driver, _events) = restored_driver(&dir);
    let out = dir.path().join("qml");

    // When
    driver.save_all_qml(&out).unwrap();

    // Then
    assert!(out.join("Main_figma.qml").exists());
    assert!(out.join("Widget1_figma.qml").exists());
    assert!(out.join("Widget_figma.qml").exists());
}

#[test]
fn no_document_data__EXPECT__build_refused() {
    // Given
    let (mut driver, _events) = Driver::new(DriverConfig::new("token", "proj"));

    // When
    let result = driver.build_document();

    // Then
    assert!(matches!(result, Err(Error::NoDocument)));
    assert!(!driver.is_valid());
}

#[test]
fn font_mapping__EXPECT__applied_on_rebuild() {
    // Given: a text element using the Inter family
    let mut design = project();
    design["document"]["children"][0]["children"] = json!([{
        "id": "6:1", "type": "TEXT", "name": "Label",
        "characters": "Hi",
        "size": {"x": 100.0, "y": 20.0},
        "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        "fills": [],
        "style": {
            "fontFamily": "Inter", "fontSize": 12.0, "fontWeight": 400.0,
            "textAlignHorizontal": "LEFT", "textAlignVertical": "TOP",
            "letterSpacing": 0.0
        }
    }]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.fqs");
    let snapshot = Snapshot {
        root: Bytes::from(serde_json::to_vec(&design).unwrap()),
        imports: default_imports(),
        ..Snapshot::default()
    };
    let mut file = File::create(&path).unwrap();
    lib_snapshot::write(&snapshot, &mut file).unwrap();
    let (mut driver, _events) = Driver::new(DriverConfig::new("token", "proj"));
    driver.restore(&path).unwrap();
    assert!(
        String::from_utf8(driver.source_code().to_vec())
            .unwrap()
            .contains("font.family: \"Inter\"")
    );

    // When
    driver.set_font_mapping("Inter", "Helvetica");

    // Then
    assert!(
        String::from_utf8(driver.source_code().to_vec())
            .unwrap()
            .contains("font.family: \"Helvetica\"")
    );
}
