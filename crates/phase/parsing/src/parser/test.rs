#![allow(non_snake_case)]

use super::*;
use crate::{Flags, NameRegistry, ParserData, components};
use serde_json::json;

#[derive(Default)]
struct StubData {
    images: HashMap<String, Vec<u8>>,
    renderings: HashMap<String, Vec<u8>>,
}

impl ParserData for StubData {
    fn image_data(&mut self, id: &str, is_rendering: bool) -> Option<Vec<u8>> {
        if is_rendering {
            self.renderings.get(id).cloned()
        } else {
            self.images.get(id).cloned()
        }
    }
    fn node_data(&mut self, _id: &str) -> Option<Vec<u8>> {
        None
    }
    fn font_info(&mut self, family: &str) -> String {
        family.to_owned()
    }
}

fn parse(obj: &Value, flags: Flags) -> Result<Element> {
    parse_with(obj, flags, &mut StubData::default(), &Components::new())
}

fn parse_with(
    obj: &Value,
    flags: Flags,
    data: &mut StubData,
    catalog: &Components,
) -> Result<Element> {
    let mut names = NameRegistry::new();
    FigmaParser::element(obj.as_object().unwrap(), flags, data, catalog, &mut names)
}

fn text_of(element: &Element) -> String {
    String::from_utf8(element.data.clone()).unwrap()
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

fn rect(id: &str, x: f64, y: f64, width: f64, height: f64) -> Value {
    json!({
        "id": id,
        "type": "RECTANGLE",
        "name": format!("Rect {id}"),
        "size": {"x": width, "y": height},
        "relativeTransform": [[1.0, 0.0, x], [0.0, 1.0, y]],
        "fills": [{"color": {"r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0}}],
        "fillGeometry": [{
            "path": format!("M0 0L{width} 0L{width} {height}L0 {height}Z"),
            "windingRule": "NONZERO"
        }]
    })
}

// region: dispatch and plain shapes

#[test]
fn plain_rectangle__EXPECT__exact_emission() {
    // Given
    let node = rect("1:1", 4.0, 6.0, 10.0, 10.0);

    // When
    let out = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    let expected = unindent::unindent(
        "
        Shape {
            id: figma_1_1
            objectName:\"Rect 1:1\"
            x:4
            y:6
            width:10
            height:10
            ShapePath {
                strokeColor: \"transparent\"
                fillColor:\"#ffff0000\"
                id: svgpath_figma_1_1
                fillRule: ShapePath.WindingFill
                PathSvg {
                    path: \"M0 0L10 0L10 10L0 10Z\"
                }
            }
        }
        ",
    );
    // PathSvg closes with a trailing blank before the newline
    let expected = expected.replace("        }\n    }", "        } \n    }");
    assert_eq!(expected, out);
}

#[test]
fn plain_rectangle__EXPECT__shape_with_svg_path_and_colors() {
    // Given
    let node = rect("1:1", 4.0, 6.0, 10.0, 10.0);

    // When
    let element = parse(&node, Flags::empty()).unwrap();
    let out = text_of(&element);

    // Then
    assert!(out.starts_with("Shape {\n"));
    assert!(out.contains("id: figma_1_1\n"));
    assert!(out.contains("objectName:\"Rect 1:1\"\n"));
    assert!(out.contains("x:4\n"));
    assert!(out.contains("y:6\n"));
    assert!(out.contains("width:10\n"));
    assert!(out.contains("fillColor:\"#ffff0000\"\n"));
    assert!(out.contains("fillRule: ShapePath.WindingFill\n"));
    assert!(out.contains("PathSvg {\n"));
    assert!(out.contains("path: \"M0 0L10 0L10 10L0 10Z\"\n"));
    assert_eq!("Rect_1_1_figma", element.name);
    assert_eq!("RECTANGLE", element.node_type);
}

#[test]
fn skip_types__EXPECT__empty_emission() {
    // Given / When / Then
    for node_type in ["SLICE", "NONE", "STAMP", "STICKY", "SHAPE_WITH_TEXT"] {
        let node = json!({"id": "1:1", "type": node_type, "name": "n"});
        let element = parse(&node, Flags::empty()).unwrap();
        assert!(element.data.is_empty(), "{node_type} emitted something");
    }
}

#[test]
fn unknown_type__EXPECT__fatal_parser_error_naming_it() {
    // Given
    let node = json!({"id": "1:1", "type": "WIDGET", "name": "n"});

    // When
    let result = parse(&node, Flags::empty());

    // Then
    assert!(matches!(result, Err(Error::UnsupportedType(t)) if t == "WIDGET"));
}

#[test]
fn qul_mode__EXPECT__no_object_name_no_effects() {
    // Given
    let mut node = rect("1:1", 0.0, 0.0, 10.0, 10.0);
    node["effects"] = json!([{
        "type": "DROP_SHADOW",
        "color": {"r": 0.0, "g": 0.0, "b": 0.0, "a": 0.5},
        "radius": 4.0,
        "offset": {"x": 1.0, "y": 2.0}
    }]);

    // When
    let qul = text_of(&parse(&node, Flags::QUL_MODE).unwrap());
    let qt = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    assert!(!qul.contains("objectName"));
    assert!(!qul.contains("DropShadow"));
    assert!(qt.contains("objectName:\"Rect 1:1\"\n"));
    assert!(qt.contains("layer.effect: DropShadow {\n"));
    assert!(qt.contains("horizontalOffset: 1\n"));
    assert!(qt.contains("verticalOffset: 2\n"));
}

#[test]
fn antialize_flag__EXPECT__hint_on_shapes_but_not_in_qul_mode() {
    // Given
    let node = rect("1:1", 0.0, 0.0, 10.0, 10.0);

    // When
    let on = text_of(&parse(&node, Flags::ANTIALIZE_SHAPES).unwrap());
    let qul = text_of(&parse(&node, Flags::ANTIALIZE_SHAPES | Flags::QUL_MODE).unwrap());

    // Then
    assert!(on.contains("antialiasing: true\n"));
    assert!(!qul.contains("antialiasing"));
}

#[test]
fn rotated_node__EXPECT__matrix_transform_attribute() {
    // Given
    let mut node = rect("1:1", 0.0, 0.0, 10.0, 10.0);
    node["relativeTransform"] = json!([[0.0, -1.0, 5.0], [1.0, 0.0, 5.0]]);

    // When
    let out = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    assert!(out.contains("transform: Matrix4x4 {\n"));
    assert!(out.contains("matrix: Qt.matrix4x4(\n"));
    assert!(out.contains("0, -1, 5, 0,\n"));
    assert!(out.contains("1, 0, 5, 0,\n"));
}

// endregion: dispatch and plain shapes

// region: constraints (S4)

fn frame_with_child(child: Value) -> Value {
    json!({
        "id": "1:0",
        "type": "FRAME",
        "name": "Holder",
        "size": {"x": 200.0, "y": 100.0},
        "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        "clipsContent": true,
        "fills": [],
        "children": [child]
    })
}

#[test]
fn centered_child_without_offset__EXPECT__pure_center_expression() {
    // Given: 40 wide at x=80 inside a 200 wide parent
    let mut child = rect("1:1", 80.0, 10.0, 40.0, 30.0);
    child["constraints"] = json!({"horizontal": "CENTER", "vertical": "TOP"});

    // When
    let out = text_of(&parse(&frame_with_child(child), Flags::empty()).unwrap());

    // Then
    assert!(out.contains("x: (figma_1_0.width - width) / 2\n"));
    assert!(!out.contains("x: (figma_1_0.width - width) / 2 "));
    assert!(out.contains("y:10\n"));
}

#[test]
fn centered_child_with_offset__EXPECT__center_expression_plus_constant() {
    // Given: center would be x=80, the node sits at x=70
    let mut child = rect("1:1", 70.0, 10.0, 40.0, 30.0);
    child["constraints"] = json!({"horizontal": "CENTER", "vertical": "CENTER"});

    // When
    let out = text_of(&parse(&frame_with_child(child), Flags::empty()).unwrap());

    // Then
    assert!(out.contains("x: (figma_1_0.width - width) / 2 - 10\n"));
    assert!(out.contains("y: (figma_1_0.height - height) / 2 - 25\n"));
}

#[test]
fn frame__EXPECT__rectangle_with_clip_and_radius() {
    // Given
    let mut frame = frame_with_child(rect("1:1", 0.0, 0.0, 10.0, 10.0));
    frame["cornerRadius"] = json!(8.0);

    // When
    let out = text_of(&parse(&frame, Flags::empty()).unwrap());

    // Then
    assert!(out.starts_with("Rectangle {\n"));
    assert!(out.contains("radius:8\n"));
    assert!(out.contains("clip: true \n"));
}

// endregion: constraints (S4)

// region: strokes

fn stroked_rect(align: &str, weight: f64) -> Value {
    let mut node = rect("3:1", 0.0, 0.0, 10.0, 10.0);
    node["strokes"] = json!([{"color": {"r": 0.0, "g": 0.0, "b": 1.0, "a": 1.0}}]);
    node["strokeWeight"] = json!(weight);
    node["strokeAlign"] = json!(align);
    node
}

#[test]
fn center_stroke__EXPECT__single_shape_path_with_stroke_width() {
    // Given
    let node = stroked_rect("CENTER", 3.0);

    // When
    let out = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    assert!(out.contains("strokeColor: \"#ff0000ff\"\n"));
    assert!(out.contains("strokeWidth:3\n"));
    assert!(!out.contains("OpacityMask"));
}

#[test]
fn inside_stroke__EXPECT__double_weight_masked_without_invert() {
    // Given
    let node = stroked_rect("INSIDE", 2.0);

    // When
    let out = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    assert!(out.contains("// QML (SVG) supports only center borders"));
    assert!(out.contains("borderSource_figma_3_1"));
    assert!(out.contains("borderMask_figma_3_1"));
    assert!(out.contains("strokeWidth:4\n"));
    assert_eq!(1, count(&out, "OpacityMask {\n"));
    assert!(!out.contains("invert: true"));
}

#[test]
fn outside_stroke__EXPECT__expanded_extents_and_inverted_mask() {
    // Given
    let node = stroked_rect("OUTSIDE", 2.0);

    // When
    let out = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    assert!(out.contains("x:-2\n"));
    assert!(out.contains("width:14\n"));
    assert!(out.contains("height:14\n"));
    assert!(out.contains("strokeWidth:4\n"));
    assert!(out.contains("invert: true\n"));
}

#[test]
fn thin_stroke__EXPECT__stays_on_normal_path() {
    // Given: weight 1 never triggers the inside/outside machinery
    let node = stroked_rect("INSIDE", 1.0);

    // When
    let out = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    assert!(!out.contains("borderSource"));
    assert!(out.contains("strokeWidth:1\n"));
}

#[test]
fn line_node__EXPECT__stroke_color_through_fill() {
    // Given
    let node = json!({
        "id": "3:9",
        "type": "LINE",
        "name": "Line",
        "size": {"x": 10.0, "y": 0.0},
        "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        "strokes": [{"color": {"r": 0.0, "g": 1.0, "b": 0.0, "a": 1.0}}],
        "strokeWeight": 1.0,
        "strokeGeometry": [{"path": "M0 0L10 0", "windingRule": "NONZERO"}]
    });

    // When
    let out = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    assert!(out.contains("fillColor: \"#ff00ff00\"\n"));
    assert!(out.contains("strokeColor: \"transparent\"\n"));
    assert!(out.contains("path: \"M0 0L10 0\"\n"));
}

// endregion: strokes

// region: image fills

#[test]
fn image_fill__EXPECT__masked_image_with_silhouette() {
    // Given
    let mut node = rect("4:1", 0.0, 0.0, 10.0, 10.0);
    node["fills"] = json!([{"imageRef": "img1"}]);
    let mut data = StubData::default();
    data.images.insert("img1".to_owned(), b"images/img1.png".to_vec());

    // When
    let out = text_of(&parse_with(&node, Flags::empty(), &mut data, &Components::new()).unwrap());

    // Then
    assert!(out.contains("source_figma_4_1"));
    assert!(out.contains("maskSource_figma_4_1"));
    assert!(out.contains("source: \"images/img1.png\"\n"));
    assert!(out.contains("fillMode: Image.PreserveAspectCrop\n"));
    assert!(out.contains("fillColor:\"black\"\n"));
}

#[test]
fn uncached_image_fill__EXPECT__retriable_not_ready() {
    // Given
    let mut node = rect("4:1", 0.0, 0.0, 10.0, 10.0);
    node["fills"] = json!([{"imageRef": "img1"}]);

    // When
    let result = parse(&node, Flags::empty());

    // Then
    match result {
        Err(Error::NotReady { id, kind }) => {
            assert_eq!("img1", id);
            assert_eq!(AssetKind::Image, kind);
            assert!(Error::NotReady { id, kind }.is_retriable());
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn long_embedded_source__EXPECT__chunked_for_viewers() {
    // Given
    let mut node = rect("4:1", 0.0, 0.0, 10.0, 10.0);
    node["fills"] = json!([{"imageRef": "img1"}]);
    let mut data = StubData::default();
    data.images
        .insert("img1".to_owned(), vec![b'a'; 3000]);

    // When
    let out = text_of(&parse_with(&node, Flags::empty(), &mut data, &Components::new()).unwrap());

    // Then
    assert_eq!(2, count(&out, "\" +\n \""));
}

// endregion: image fills

// region: pre-rendering

fn prerender_node() -> Value {
    json!({
        "id": "7:1",
        "type": "RECTANGLE",
        "name": "Fancy",
        "absoluteBoundingBox": {"x": 100.0, "y": 50.0, "width": 30.0, "height": 20.0},
        "size": {"x": 30.0, "y": 20.0},
        "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        "fills": []
    })
}

#[test]
fn prerender_shapes_flag__EXPECT__single_image_item() {
    // Given
    let node = prerender_node();
    let mut data = StubData::default();
    data.renderings
        .insert("7:1".to_owned(), b"renderings/7_1.png".to_vec());

    // When
    let out =
        text_of(&parse_with(&node, Flags::PRERENDER_SHAPES, &mut data, &Components::new()).unwrap());

    // Then: the element is its own parent, so position is relative to itself
    assert!(out.starts_with("Item {\n"));
    assert!(out.contains("x: 0\n"));
    assert!(out.contains("y: 0\n"));
    assert!(out.contains("width:30\n"));
    assert!(out.contains("id: i_figma_7_1\n"));
    assert!(out.contains("fillMode: Image.PreserveAspectFit\n"));
    assert!(out.contains("source: \"renderings/7_1.png\"\n"));
    assert!(!out.contains("ShapePath"));
}

#[test]
fn gradient_fill__EXPECT__forces_prerender_without_flag() {
    // Given
    let mut node = prerender_node();
    node["fills"] = json!([{
        "gradientHandlePositions": [{"x": 0.0, "y": 0.0}, {"x": 1.0, "y": 1.0}],
        "type": "GRADIENT_LINEAR"
    }]);
    let mut data = StubData::default();
    data.renderings
        .insert("7:1".to_owned(), b"renderings/7_1.png".to_vec());

    // When
    let out = text_of(&parse_with(&node, Flags::empty(), &mut data, &Components::new()).unwrap());

    // Then
    assert!(out.contains("source: \"renderings/7_1.png\"\n"));
    assert!(!out.contains("ShapePath"));
}

#[test]
fn missing_rendering__EXPECT__retriable_not_ready() {
    // Given
    let node = prerender_node();

    // When
    let result = parse(&node, Flags::PRERENDER_SHAPES);

    // Then
    assert!(matches!(
        result,
        Err(Error::NotReady { id, kind: AssetKind::Rendering }) if id == "7:1"
    ));
}

#[test]
fn failed_rendering__EXPECT__placeholder_with_marker_comment() {
    // Given
    let node = prerender_node();
    let mut data = StubData::default();
    data.renderings.insert("7:1".to_owned(), Vec::new());
    data.renderings
        .insert(PLACEHOLDER.to_owned(), b"broken.png".to_vec());

    // When
    let out =
        text_of(&parse_with(&node, Flags::PRERENDER_SHAPES, &mut data, &Components::new()).unwrap());

    // Then
    assert!(out.contains("//Image load failed, placeholder\n"));
    assert!(out.contains("sourceSize: Qt.size(parent.width, parent.height)\n"));
    assert!(out.contains("source: \"broken.png\"\n"));
}

#[test]
fn invisible_prerendered_node__EXPECT__no_image_emitted() {
    // Given
    let mut node = prerender_node();
    node["visible"] = json!(false);

    // When
    let out = text_of(&parse(&node, Flags::PRERENDER_SHAPES).unwrap());

    // Then
    assert!(!out.contains("Image {"));
}

// endregion: pre-rendering

// region: booleans (S3)

fn boolean_node(operation: &str, children: Vec<Value>) -> Value {
    json!({
        "id": "5:1",
        "type": "BOOLEAN_OPERATION",
        "name": "Bool",
        "booleanOperation": operation,
        "size": {"x": 15.0, "y": 15.0},
        "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        "fills": [{"color": {"r": 0.0, "g": 0.0, "b": 0.0, "a": 1.0}}],
        "fillGeometry": [{"path": "M0 0L15 0L15 15L0 15Z", "windingRule": "NONZERO"}],
        "children": children
    })
}

#[test]
fn union_with_flag__EXPECT__one_source_rect_one_mask_item_one_opacity_mask() {
    // Given
    let node = boolean_node(
        "UNION",
        vec![rect("5:2", 0.0, 0.0, 10.0, 10.0), rect("5:3", 5.0, 5.0, 10.0, 10.0)],
    );

    // When
    let out = text_of(&parse(&node, Flags::BREAK_BOOLEANS).unwrap());

    // Then
    assert_eq!(1, count(&out, "Rectangle {\n"));
    assert_eq!(1, count(&out, "OpacityMask {\n"));
    assert!(out.contains("id: source_figma_5_1\n"));
    assert!(out.contains("id: maskSource_figma_5_1\n"));
    assert!(out.contains("source:source_figma_5_1\n"));
    assert!(out.contains("maskSource:maskSource_figma_5_1\n"));
    // both children live inside the mask item
    assert_eq!(2, count(&out, "Shape {\n"));
}

#[test]
fn union_without_flag__EXPECT__falls_through_to_vector_path() {
    // Given
    let node = boolean_node(
        "UNION",
        vec![rect("5:2", 0.0, 0.0, 10.0, 10.0), rect("5:3", 5.0, 5.0, 10.0, 10.0)],
    );

    // When
    let out = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    assert!(!out.contains("OpacityMask"));
    assert!(out.contains("ShapePath {\n"));
    assert!(out.contains("path: \"M0 0L15 0L15 15L0 15Z\"\n"));
}

#[test]
fn subtract__EXPECT__inverted_mask_over_remaining_children() {
    // Given
    let node = boolean_node(
        "SUBTRACT",
        vec![rect("5:2", 0.0, 0.0, 10.0, 10.0), rect("5:3", 5.0, 5.0, 10.0, 10.0)],
    );

    // When
    let out = text_of(&parse(&node, Flags::BREAK_BOOLEANS).unwrap());

    // Then
    assert!(out.contains("id: source_figma_5_1_subtract\n"));
    assert!(out.contains("id: maskSource_figma_5_1_subtract\n"));
    assert!(out.contains("invert: true\n"));
    assert_eq!(2, count(&out, "OpacityMask {\n"));
}

#[test]
fn intersect__EXPECT__chained_masks_last_one_visible() {
    // Given
    let node = boolean_node(
        "INTERSECT",
        vec![rect("5:2", 0.0, 0.0, 10.0, 10.0), rect("5:3", 5.0, 5.0, 10.0, 10.0)],
    );

    // When
    let out = text_of(&parse(&node, Flags::BREAK_BOOLEANS).unwrap());

    // Then
    assert_eq!(2, count(&out, "OpacityMask {\n"));
    assert!(out.contains("id: source_figma_5_1_0\n"));
    assert!(out.contains("id: source_figma_5_1_1\n"));
    assert!(out.contains("source:source_figma_5_1_0\n"));
}

#[test]
fn exclude__EXPECT__shader_composition_over_pairs() {
    // Given
    let node = boolean_node(
        "EXCLUDE",
        vec![rect("5:2", 0.0, 0.0, 10.0, 10.0), rect("5:3", 5.0, 5.0, 10.0, 10.0)],
    );

    // When
    let out = text_of(&parse(&node, Flags::BREAK_BOOLEANS).unwrap());

    // Then
    assert_eq!(2, count(&out, "ShaderEffect {\n"));
    assert!(out.contains("gl_FragColor = qt_Opacity * color * ((cm.a * (1.0 - pm.a)) + ((1.0 - cm.a) * pm.a));\n"));
    assert!(out.contains("fragmentShader: source_figma_5_1.shaderSource0\n"));
    assert!(out.contains("fragmentShader: source_figma_5_1.shaderSource\n"));
}

#[test]
fn boolean_single_child__EXPECT__error() {
    // Given
    let node = boolean_node("UNION", vec![rect("5:2", 0.0, 0.0, 10.0, 10.0)]);

    // When
    let result = parse(&node, Flags::BREAK_BOOLEANS);

    // Then
    assert!(matches!(result, Err(Error::BooleanChildren(id)) if id == "5:1"));
}

#[test]
fn unknown_boolean_operation__EXPECT__empty_emission() {
    // Given
    let node = boolean_node(
        "XOR",
        vec![rect("5:2", 0.0, 0.0, 10.0, 10.0), rect("5:3", 5.0, 5.0, 10.0, 10.0)],
    );

    // When
    let element = parse(&node, Flags::BREAK_BOOLEANS).unwrap();

    // Then
    assert!(element.data.is_empty());
}

// endregion: booleans (S3)

// region: text

#[test]
fn text_node__EXPECT__font_and_alignment_attributes() {
    // Given
    let node = json!({
        "id": "6:1",
        "type": "TEXT",
        "name": "Label",
        "characters": "Hello",
        "size": {"x": 100.0, "y": 20.0},
        "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        "fills": [{"color": {"r": 0.0, "g": 0.0, "b": 0.0, "a": 1.0}}],
        "style": {
            "fontFamily": "Inter",
            "italic": true,
            "fontSize": 13.6,
            "fontWeight": 700.0,
            "textCase": "UPPER",
            "textDecoration": "UNDERLINE",
            "paragraphSpacing": 4.0,
            "textAlignHorizontal": "CENTER",
            "textAlignVertical": "BOTTOM",
            "letterSpacing": 0.5
        }
    });

    // When
    let out = text_of(&parse(&node, Flags::empty()).unwrap());

    // Then
    assert!(out.starts_with("Text {\n"));
    assert!(out.contains("text:\"Hello\"\n"));
    assert!(out.contains("wrapMode: TextEdit.WordWrap\n"));
    assert!(out.contains("font.family: \"Inter\"\n"));
    assert!(out.contains("font.italic: true\n"));
    assert!(out.contains("font.pixelSize: 13\n"));
    assert!(out.contains("font.weight: Font.DemiBold\n"));
    assert!(out.contains("font.capitalization: Font.AllUppercase\n"));
    assert!(out.contains("underline: true\n"));
    assert!(out.contains("topPadding: 4\n"));
    assert!(out.contains("horizontalAlignment: Text.AlignHCenter\n"));
    assert!(out.contains("verticalAlignment: Text.AlignBottom\n"));
    assert!(out.contains("font.letterSpacing: 0.5\n"));
}

#[test]
fn font_weights__EXPECT__nine_bucket_mapping() {
    // Given / When / Then
    assert_eq!("Font.Thin", font_weight(100.0));
    assert_eq!("Font.Normal", font_weight(400.0));
    assert_eq!("Font.DemiBold", font_weight(700.0));
    assert_eq!("Font.ExtraBold", font_weight(900.0));
}

// endregion: text

// region: masks

#[test]
fn mask_child__EXPECT__wraps_siblings_as_masked_source() {
    // Given
    let mut mask = rect("m:1", 0.0, 0.0, 10.0, 10.0);
    mask["isMask"] = json!(true);
    let frame = frame_with_child(json!(null));
    let mut frame = frame.as_object().unwrap().clone();
    frame.insert(
        "children".to_owned(),
        json!([mask, rect("m:2", 0.0, 0.0, 5.0, 5.0)]),
    );

    // When
    let out = text_of(
        &parse(&Value::Object(frame), Flags::empty()).unwrap(),
    );

    // Then
    assert!(out.contains("id: mask_figma_m_1\n"));
    assert!(out.contains("id: source_figma_m_1\n"));
    assert!(out.contains("source: source_figma_m_1\n"));
    assert!(out.contains("maskSource: mask_figma_m_1\n"));
    assert_eq!(1, count(&out, "OpacityMask {\n"));
    // both intermediates render invisibly
    assert!(2 <= count(&out, "visible:false\n"));
}

// endregion: masks

// region: components and instances (S5)

fn widget_project() -> Value {
    json!({
        "document": {
            "type": "DOCUMENT",
            "children": [{
                "id": "0:1", "type": "CANVAS", "name": "Page 1",
                "children": [{
                    "id": "2:0", "type": "COMPONENT", "name": "Widget",
                    "size": {"x": 100.0, "y": 50.0},
                    "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                    "clipsContent": false,
                    "fills": [],
                    "children": [
                        {
                            "id": "2:1", "type": "RECTANGLE", "name": "A",
                            "size": {"x": 40.0, "y": 20.0},
                            "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                            "fills": []
                        },
                        {
                            "id": "2:2", "type": "RECTANGLE", "name": "B",
                            "size": {"x": 10.0, "y": 10.0},
                            "relativeTransform": [[1.0, 0.0, 50.0], [0.0, 1.0, 0.0]],
                            "fills": []
                        }
                    ]
                }]
            }]
        },
        "components": {"2:0": {"name": "Widget", "key": "kw", "description": ""}}
    })
}

fn widget_catalog() -> Components {
    let mut data = StubData::default();
    let mut names = NameRegistry::new();
    components(&widget_project(), &mut data, &mut names).unwrap()
}

fn widget_instance(a_width: f64) -> Value {
    json!({
        "id": "I9:1", "type": "INSTANCE", "name": "Widget", "componentId": "2:0",
        "size": {"x": 100.0, "y": 50.0},
        "relativeTransform": [[1.0, 0.0, 5.0], [0.0, 1.0, 5.0]],
        "fills": [],
        "children": [
            {
                "id": "I9:1;2:1", "type": "RECTANGLE", "name": "A",
                "size": {"x": a_width, "y": 20.0},
                "relativeTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                "fills": []
            },
            {
                "id": "I9:1;2:2", "type": "RECTANGLE", "name": "B",
                "size": {"x": 10.0, "y": 10.0},
                "relativeTransform": [[1.0, 0.0, 50.0], [0.0, 1.0, 0.0]],
                "fills": []
            }
        ]
    })
}

#[test]
fn instance_with_resized_child__EXPECT__only_geometry_overrides_for_it() {
    // Given: child A is 50 wide, the component says 40; B is untouched
    let catalog = widget_catalog();
    let instance = widget_instance(50.0);

    // When
    let out = text_of(
        &parse_with(&instance, Flags::empty(), &mut StubData::default(), &catalog).unwrap(),
    );

    // Then
    assert!(out.starts_with("Widget_figma {\n"));
    assert!(out.contains("delegate_2_1_width: 50\n"));
    assert!(out.contains("delegate_2_1_height: 20\n"));
    assert!(!out.contains("delegate_2_1_x"));
    assert!(!out.contains("delegate_2_1:"));
    assert!(!out.contains("delegate_2_2"));
}

#[test]
fn identical_instance__EXPECT__no_child_overrides_at_all() {
    // Given: instance children equal the component modulo id
    let catalog = widget_catalog();
    let instance = widget_instance(40.0);

    // When
    let element =
        parse_with(&instance, Flags::empty(), &mut StubData::default(), &catalog).unwrap();
    let out = text_of(&element);

    // Then
    assert!(!out.contains("delegate_"));
    assert_eq!(vec!["2:0".to_owned()], element.components);
}

#[test]
fn moved_instance_child__EXPECT__position_overrides_only() {
    // Given: child A shifted by 3,4
    let catalog = widget_catalog();
    let mut instance = widget_instance(40.0);
    instance["children"][0]["relativeTransform"] = json!([[1.0, 0.0, 3.0], [0.0, 1.0, 4.0]]);

    // When
    let out = text_of(
        &parse_with(&instance, Flags::empty(), &mut StubData::default(), &catalog).unwrap(),
    );

    // Then
    assert!(out.contains("delegate_2_1_x: 3\n"));
    assert!(out.contains("delegate_2_1_y: 4\n"));
    assert!(!out.contains("delegate_2_1_width"));
    assert!(!out.contains("delegate_2_1_transform"));
}

#[test]
fn deep_child_difference__EXPECT__whole_delegate_reemitted() {
    // Given: child A changes fill, not just geometry
    let catalog = widget_catalog();
    let mut instance = widget_instance(40.0);
    instance["children"][0]["fills"] =
        json!([{"color": {"r": 1.0, "g": 1.0, "b": 0.0, "a": 1.0}}]);

    // When
    let out = text_of(
        &parse_with(&instance, Flags::empty(), &mut StubData::default(), &catalog).unwrap(),
    );

    // Then
    assert!(out.contains("delegate_2_1:"));
    assert!(out.contains("fillColor:\"#ffffff00\"\n"));
}

#[test]
fn unknown_component__EXPECT__missing_dependency_error() {
    // Given
    let instance = widget_instance(40.0);

    // When
    let result = parse(&instance, Flags::empty());

    // Then
    assert!(matches!(
        result,
        Err(Error::MissingComponent { from, to }) if from == "I9:1" && to == "2:0"
    ));
}

#[test]
fn component_definition__EXPECT__delegate_slots_and_completion_block() {
    // Given
    let project = widget_project();
    let catalog = widget_catalog();
    let component_node =
        project["document"]["children"][0]["children"][0].as_object().unwrap();

    // When
    let mut data = StubData::default();
    let mut names = NameRegistry::new();
    let element = FigmaParser::component(
        component_node,
        Flags::empty(),
        &mut data,
        &catalog,
        &mut names,
    )
    .unwrap();
    let out = text_of(&element);

    // Then
    for child in ["delegate_2_1", "delegate_2_2"] {
        assert!(out.contains(&format!("property Component {child}: ")));
        assert!(out.contains(&format!("property Item i_{child}\n")));
        assert!(out.contains(&format!("property real {child}_width: NaN\n")));
        assert!(out.contains(&format!(
            "i_{child} = {child}.createObject(this, o_{child})\n"
        )));
        assert!(out.contains(&format!("{child}_x = Qt.binding(()=>i_{child}.x)\n")));
    }
    assert!(out.contains("onDelegate_2_1_widthChanged:"));
    assert!(out.contains("Component.onCompleted: {\n"));
}

#[test]
fn component_without_parse_flag__EXPECT__plain_component_reference() {
    // Given
    let project = widget_project();
    let catalog = widget_catalog();
    let component_node =
        project["document"]["children"][0]["children"][0].as_object().unwrap();

    // When
    let mut data = StubData::default();
    let mut names = NameRegistry::new();
    let element = FigmaParser::element(
        component_node,
        Flags::empty(),
        &mut data,
        &catalog,
        &mut names,
    )
    .unwrap();
    let out = text_of(&element);

    // Then
    assert!(out.starts_with("Widget_figma {\n"));
    assert!(!out.contains("property Component"));
    assert_eq!(vec!["2:0".to_owned()], element.components);
}

// endregion: components and instances (S5)

// region: determinism

#[test]
fn same_input_twice__EXPECT__byte_identical_emission() {
    // Given
    let catalog = widget_catalog();
    let instance = widget_instance(50.0);

    // When
    let first =
        parse_with(&instance, Flags::empty(), &mut StubData::default(), &catalog).unwrap();
    let second =
        parse_with(&instance, Flags::empty(), &mut StubData::default(), &catalog).unwrap();

    // Then
    assert_eq!(first.data, second.data);
    assert_eq!(first.name, second.name);
}

// endregion: determinism
