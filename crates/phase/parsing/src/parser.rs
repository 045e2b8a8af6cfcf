use crate::{
    AssetKind, Components, Error, Flags, NameRegistry, ParserData, Result,
};
use ordermap::OrderMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

const INDENT: &str = "    ";

/// Rendering id looked up when a requested rasterization never arrived.
pub const PLACEHOLDER: &str = "placeholder";

type JsonMap = Map<String, Value>;

/// Parser output for one top-level frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub id: String,
    pub node_type: String,
    pub data: Vec<u8>,
    pub components: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemType {
    None,
    Vector,
    Text,
    Frame,
    Component,
    Boolean,
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrokeType {
    Normal,
    Double,
}

#[derive(Debug, Clone, Copy, Default)]
struct Extents {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// The current parent during recursion, threaded explicitly instead of
/// being parser state. The top-level element is its own parent.
#[derive(Clone, Copy)]
struct Parent<'p> {
    obj: &'p JsonMap,
    #[allow(dead_code)]
    parent: Option<&'p Parent<'p>>,
}

impl<'p> Parent<'p> {
    fn get(&self, key: &str) -> Option<&'p Value> {
        self.obj.get(key)
    }
}

// region: json accessors

fn get_str<'a>(obj: &'a JsonMap, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

fn get_f64(obj: &JsonMap, key: &str) -> f64 {
    obj.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn get_bool(obj: &JsonMap, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn get_obj<'a>(obj: &'a JsonMap, key: &str) -> Option<&'a JsonMap> {
    obj.get(key).and_then(Value::as_object)
}

fn get_arr<'a>(obj: &'a JsonMap, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn num(value: &Value) -> f64 {
    value.as_f64().unwrap_or(0.0)
}

fn eq(a: f64, b: f64) -> bool {
    (a - b).abs() < f64::EPSILON
}

// endregion: json accessors

fn tabs(indents: usize) -> String {
    INDENT.repeat(indents)
}

fn to_color(r: f64, g: f64, b: f64, a: f64) -> String {
    format!(
        "\"#{:02x}{:02x}{:02x}{:02x}\"",
        (a * 255.0).round() as u32,
        (r * 255.0).round() as u32,
        (g * 255.0).round() as u32,
        (b * 255.0).round() as u32
    )
}

fn color_attr(color: &JsonMap, opacity: f64) -> String {
    to_color(
        get_f64(color, "r"),
        get_f64(color, "g"),
        get_f64(color, "b"),
        get_f64(color, "a") * opacity,
    )
}

/// `figma_` plus the node id clamped to identifier characters.
fn qml_id(id: &str) -> String {
    let mangled: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("figma_{mangled}")
}

fn delegate_name(id: &str) -> String {
    format!("delegate_{}", id.replace(':', "_"))
}

/// Figma weighs 100-900; QML has nine named buckets.
fn font_weight(value: f64) -> &'static str {
    let scaled = ((value - 100.0) / 900.0) * 90.0;
    const WEIGHTS: [(&str, f64); 9] = [
        ("Font.Thin", 0.0),
        ("Font.ExtraLight", 12.0),
        ("Font.Light", 25.0),
        ("Font.Normal", 50.0),
        ("Font.Medium", 57.0),
        ("Font.DemiBold", 63.0),
        ("Font.Bold", 75.0),
        ("Font.ExtraBold", 81.0),
        ("Font.Black", 87.0),
    ];
    for (name, weight) in WEIGHTS {
        if scaled <= weight {
            return name;
        }
    }
    WEIGHTS[WEIGHTS.len() - 1].0
}

type CompareFn = Box<dyn Fn(&Value, &Value) -> Value>;

/// The translator: one instance per element parse.
pub struct FigmaParser<'a> {
    flags: Flags,
    data: &'a mut dyn ParserData,
    components: &'a Components,
    component_ids: BTreeSet<String>,
}

impl<'a> FigmaParser<'a> {
    /// Parses a canvas element (frame, shape, instance...).
    pub fn element(
        obj: &JsonMap,
        flags: Flags,
        data: &'a mut dyn ParserData,
        components: &'a Components,
        names: &mut NameRegistry,
    ) -> Result<Element> {
        Self::new(flags, data, components).get_element(obj, names)
    }

    /// Parses a component definition: children become delegate slots.
    pub fn component(
        obj: &JsonMap,
        flags: Flags,
        data: &'a mut dyn ParserData,
        components: &'a Components,
        names: &mut NameRegistry,
    ) -> Result<Element> {
        Self::new(flags | Flags::PARSE_COMPONENT, data, components).get_element(obj, names)
    }

    fn new(flags: Flags, data: &'a mut dyn ParserData, components: &'a Components) -> Self {
        Self {
            flags,
            data,
            components,
            component_ids: BTreeSet::new(),
        }
    }

    fn is_qul(&self) -> bool {
        self.flags.contains(Flags::QUL_MODE)
    }

    fn get_element(mut self, obj: &JsonMap, names: &mut NameRegistry) -> Result<Element> {
        let parent = Parent { obj, parent: None };
        let data = self.parse(obj, &parent, 1)?;
        Ok(Element {
            name: names.unique_name(get_str(obj, "name")),
            id: get_str(obj, "id").to_owned(),
            node_type: get_str(obj, "type").to_owned(),
            data: data.into_bytes(),
            components: self.component_ids.into_iter().collect(),
        })
    }

    fn item_type(&self, obj: &JsonMap) -> Result<ItemType> {
        match get_str(obj, "type") {
            "RECTANGLE" | "ELLIPSE" | "VECTOR" | "LINE" | "REGULAR_POLYGON" | "STAR" => {
                Ok(ItemType::Vector)
            }
            "TEXT" => Ok(ItemType::Text),
            "GROUP" | "FRAME" | "COMPONENT_SET" => Ok(ItemType::Frame),
            "COMPONENT" => Ok(ItemType::Component),
            "BOOLEAN_OPERATION" => Ok(ItemType::Boolean),
            "INSTANCE" => Ok(ItemType::Instance),
            "SLICE" | "NONE" | "STAMP" | "STICKY" | "SHAPE_WITH_TEXT" => Ok(ItemType::None),
            other => Err(Error::UnsupportedType(other.to_owned())),
        }
    }

    fn parse(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> Result<String> {
        let item_type = self.item_type(obj)?;
        if item_type == ItemType::None {
            return Ok(String::new());
        }
        if self.is_rendering(obj) {
            return self.parse_rendered(obj, parent, indents);
        }
        match item_type {
            ItemType::Vector => self.parse_vector(obj, parent, indents),
            ItemType::Text => self.parse_text(obj, parent, indents),
            ItemType::Frame => self.parse_frame(obj, parent, indents),
            ItemType::Component => self.parse_component(obj, parent, indents),
            ItemType::Boolean => self.parse_boolean_operation(obj, parent, indents),
            ItemType::Instance => self.parse_instance(obj, parent, indents),
            ItemType::None => unreachable!("handled above"),
        }
    }

    // region: pre-render selection

    fn is_gradient(&self, obj: &JsonMap) -> bool {
        get_arr(obj, "fills").iter().any(|fill| {
            fill.as_object()
                .is_some_and(|fill| fill.contains_key("gradientHandlePositions"))
        })
    }

    fn image_fill(&self, obj: &JsonMap) -> Option<String> {
        let fill = get_arr(obj, "fills").first()?.as_object()?;
        fill.get("imageRef")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    fn is_rendering(&self, obj: &JsonMap) -> bool {
        if get_bool(obj, "isRendering") {
            return true;
        }
        let item_type = self.item_type(obj).ok();
        let node_type = get_str(obj, "type");
        if item_type == Some(ItemType::Vector)
            && (self.flags.contains(Flags::PRERENDER_SHAPES) || self.is_gradient(obj))
        {
            return true;
        }
        if item_type == Some(ItemType::Text) && self.is_gradient(obj) {
            return true;
        }
        if item_type == Some(ItemType::Frame)
            && node_type != "GROUP"
            && self.flags.contains(Flags::PRERENDER_FRAMES)
        {
            return true;
        }
        if node_type == "GROUP" && self.flags.contains(Flags::PRERENDER_GROUPS) {
            return true;
        }
        if item_type == Some(ItemType::Component) && self.flags.contains(Flags::PRERENDER_COMPONENTS)
        {
            return true;
        }
        if item_type == Some(ItemType::Instance) && self.flags.contains(Flags::PRERENDER_INSTANCES) {
            return true;
        }
        false
    }

    // endregion: pre-render selection

    // region: shared attribute emission

    fn make_component_instance(&self, type_name: &str, obj: &JsonMap, indents: usize) -> String {
        let mut out = String::new();
        let indent = tabs(indents);
        let _ = write!(out, "{}{} {{\n", tabs(indents - 1), type_name);
        debug_assert!(obj.contains_key("type") && obj.contains_key("id"));
        let _ = write!(out, "{indent}id: {}\n", qml_id(get_str(obj, "id")));
        if !self.is_qul() {
            let _ = write!(
                out,
                "{indent}objectName:\"{}\"\n",
                get_str(obj, "name").replace('"', "\\\"")
            );
        }
        out
    }

    fn make_item(&self, type_name: &str, obj: &JsonMap, indents: usize) -> String {
        let mut out = String::new();
        let indent = tabs(indents);
        out += &self.make_component_instance(type_name, obj, indents);
        out += &self.make_effects(obj, indents);
        out += &self.make_transforms(obj, indents);
        if obj.contains_key("visible") && !get_bool(obj, "visible") {
            let _ = write!(out, "{indent}visible: false\n");
        }
        if obj.contains_key("opacity") {
            let _ = write!(out, "{indent}opacity: {}\n", get_f64(obj, "opacity"));
        }
        out
    }

    fn position(&self, obj: &JsonMap) -> (f64, f64) {
        let rows = get_arr(obj, "relativeTransform");
        let row1 = rows.first().and_then(Value::as_array);
        let row2 = rows.get(1).and_then(Value::as_array);
        let x = row1.and_then(|row| row.get(2)).map(num).unwrap_or(0.0);
        let y = row2.and_then(|row| row.get(2)).map(num).unwrap_or(0.0);
        (x, y)
    }

    /// x/y/width/height, with CENTER constraints turned into an expression
    /// anchoring the child to its parent's middle.
    fn make_extents(
        &self,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
        extents: Extents,
    ) -> String {
        let mut out = String::new();
        let indent = tabs(indents);
        let mut horizontal = "LEFT".to_owned();
        let mut vertical = "TOP".to_owned();
        if let Some(constraints) = get_obj(obj, "constraints") {
            vertical = get_str(constraints, "vertical").to_owned();
            horizontal = get_str(constraints, "horizontal").to_owned();
        }
        // A delta instance may lack the transform even though Figma always
        // writes it.
        if obj.contains_key("relativeTransform") {
            let (px, py) = self.position(obj);
            let tx = (px + extents.x) as i64;
            let ty = (py + extents.y) as i64;

            match horizontal.as_str() {
                "LEFT" | "SCALE" | "LEFT_RIGHT" | "RIGHT" => {
                    let _ = write!(out, "{indent}x:{tx}\n");
                }
                "CENTER" => {
                    let parent_size = parent
                        .get("size")
                        .and_then(Value::as_object)
                        .map(|size| get_f64(size, "x"))
                        .unwrap_or(0.0);
                    let id = qml_id(
                        parent
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or_default(),
                    );
                    let width = self
                        .get_value(obj, "size")
                        .as_object()
                        .map(|size| get_f64(size, "x"))
                        .unwrap_or(0.0);
                    let static_width = (parent_size - width) / 2.0 - tx as f64;
                    if eq(static_width, 0.0) {
                        let _ = write!(out, "{indent}x: ({id}.width - width) / 2\n");
                    } else {
                        let _ = write!(
                            out,
                            "{indent}x: ({id}.width - width) / 2 {} {}\n",
                            if static_width < 0.0 { "+" } else { "-" },
                            static_width.abs()
                        );
                    }
                }
                _ => {}
            }

            match vertical.as_str() {
                "TOP" | "SCALE" | "TOP_BOTTOM" | "BOTTOM" => {
                    let _ = write!(out, "{indent}y:{ty}\n");
                }
                "CENTER" => {
                    let parent_size = parent
                        .get("size")
                        .and_then(Value::as_object)
                        .map(|size| get_f64(size, "y"))
                        .unwrap_or(0.0);
                    let id = qml_id(
                        parent
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or_default(),
                    );
                    let height = self
                        .get_value(obj, "size")
                        .as_object()
                        .map(|size| get_f64(size, "y"))
                        .unwrap_or(0.0);
                    let static_height = (parent_size - height) / 2.0 - ty as f64;
                    if eq(static_height, 0.0) {
                        let _ = write!(out, "{indent}y: ({id}.height - height) / 2\n");
                    } else {
                        let _ = write!(
                            out,
                            "{indent}y: ({id}.height - height) / 2 {} {}\n",
                            if static_height < 0.0 { "+" } else { "-" },
                            static_height.abs()
                        );
                    }
                }
                _ => {}
            }
        }
        if let Some(size) = get_obj(obj, "size") {
            let _ = write!(out, "{indent}width:{}\n", get_f64(size, "x") + extents.width);
            let _ = write!(out, "{indent}height:{}\n", get_f64(size, "y") + extents.height);
        }
        out
    }

    fn make_size(&self, obj: &JsonMap, indents: usize, extents: (f64, f64)) -> String {
        let mut out = String::new();
        let indent = tabs(indents);
        let size = get_obj(obj, "size");
        let width = size.map(|s| get_f64(s, "x")).unwrap_or(0.0) + extents.0;
        let height = size.map(|s| get_f64(s, "y")).unwrap_or(0.0) + extents.1;
        let _ = write!(out, "{indent}width:{width}\n");
        let _ = write!(out, "{indent}height:{height}\n");
        out
    }

    fn make_color(&self, color: &JsonMap, indents: usize, opacity: f64) -> String {
        format!("{}color:{}\n", tabs(indents), color_attr(color, opacity))
    }

    /// Only the first effect translates; the constrained target has none.
    fn make_effects(&self, obj: &JsonMap, indents: usize) -> String {
        let mut out = String::new();
        if self.is_qul() {
            return out;
        }
        let Some(effect) = get_arr(obj, "effects").first().and_then(Value::as_object) else {
            return out;
        };
        let effect_type = get_str(effect, "type");
        if effect_type != "INNER_SHADOW" && effect_type != "DROP_SHADOW" {
            return out;
        }
        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);
        let color = get_obj(effect, "color").cloned().unwrap_or_default();
        let radius = get_f64(effect, "radius");
        let offset = get_obj(effect, "offset").cloned().unwrap_or_default();
        let _ = write!(out, "{indent}layer.enabled:true\n");
        let _ = write!(out, "{indent}layer.effect: DropShadow {{\n");
        if effect_type == "INNER_SHADOW" {
            let _ = write!(out, "{indent1}horizontalOffset: {}\n", -get_f64(&offset, "x"));
            let _ = write!(out, "{indent1}verticalOffset: {}\n", -get_f64(&offset, "y"));
        } else {
            let _ = write!(out, "{indent1}horizontalOffset: {}\n", get_f64(&offset, "x"));
            let _ = write!(out, "{indent1}verticalOffset: {}\n", get_f64(&offset, "y"));
        }
        let _ = write!(out, "{indent1}radius: {radius}\n");
        let _ = write!(out, "{indent1}samples: 17\n");
        let _ = write!(out, "{indent1}color: {}\n", color_attr(&color, 1.0));
        let _ = write!(out, "{indent}}}\n");
        out
    }

    /// A `Qt.matrix4x4(...)` expression for the node's affine placement, or
    /// None when the linear part is identity.
    fn make_matrix_expression(&self, obj: &JsonMap) -> Option<String> {
        let rows = get_arr(obj, "relativeTransform");
        let r1: Vec<f64> = rows.first().and_then(Value::as_array)?.iter().map(num).collect();
        let r2: Vec<f64> = rows.get(1).and_then(Value::as_array)?.iter().map(num).collect();
        if r1.len() < 3 || r2.len() < 3 {
            return None;
        }
        if eq(r1[0], 1.0) && eq(r1[1], 0.0) && eq(r2[0], 0.0) && eq(r2[1], 1.0) {
            return None;
        }
        Some(format!(
            "Qt.matrix4x4({}, {}, {}, 0, {}, {}, {}, 0, 0, 0, 1, 0, 0, 0, 0, 1)",
            r1[0], r1[1], r1[2], r2[0], r2[1], r2[2]
        ))
    }

    /// An affine matrix attribute when the linear part is not identity.
    fn make_transforms(&self, obj: &JsonMap, indents: usize) -> String {
        let mut out = String::new();
        let rows = get_arr(obj, "relativeTransform");
        let (Some(row1), Some(row2)) = (
            rows.first().and_then(Value::as_array),
            rows.get(1).and_then(Value::as_array),
        ) else {
            return out;
        };
        let r1: Vec<f64> = row1.iter().map(num).collect();
        let r2: Vec<f64> = row2.iter().map(num).collect();
        if r1.len() < 3 || r2.len() < 3 {
            return out;
        }
        if !eq(r1[0], 1.0) || !eq(r1[1], 0.0) || !eq(r2[0], 0.0) || !eq(r2[1], 1.0) {
            let indent = tabs(indents + 1);
            let _ = write!(out, "{}transform: Matrix4x4 {{\n", tabs(indents));
            let _ = write!(out, "{indent}matrix: Qt.matrix4x4(\n");
            let _ = write!(out, "{indent}{}, {}, {}, 0,\n", r1[0], r1[1], r1[2]);
            let _ = write!(out, "{indent}{}, {}, {}, 0,\n", r2[0], r2[1], r2[2]);
            let _ = write!(out, "{indent}0, 0, 1, 0,\n");
            let _ = write!(out, "{indent}0, 0, 0, 1)\n");
            let _ = write!(out, "{}}}\n", tabs(indents));
        }
        out
    }

    /// The `source:` binding for an image, chunked so source viewers stay
    /// responsive on embedded payloads.
    fn make_image_source(
        &mut self,
        image: &str,
        is_rendering: bool,
        indents: usize,
        placeholder: Option<&str>,
    ) -> Result<String> {
        let mut out = String::new();
        let kind = if is_rendering {
            AssetKind::Rendering
        } else {
            AssetKind::Image
        };
        let mut image_data = self.data.image_data(image, is_rendering).ok_or(Error::NotReady {
            id: image.to_owned(),
            kind,
        })?;
        if image_data.is_empty() {
            let Some(placeholder) = placeholder else {
                return Err(Error::Image(format!("Cannot read imageRef \"{image}\"")));
            };
            image_data = self
                .data
                .image_data(placeholder, is_rendering)
                .unwrap_or_default();
            if image_data.is_empty() {
                return Err(Error::Image("Cannot load placeholder".to_owned()));
            }
            let _ = write!(out, "{}//Image load failed, placeholder\n", tabs(indents));
            let _ = write!(
                out,
                "{}sourceSize: Qt.size(parent.width, parent.height)\n",
                tabs(indents)
            );
        }

        let mut source = String::from_utf8(image_data)
            .map_err(|_| Error::Image(format!("Image source is not text \"{image}\"")))?;
        // helps source viewers cope with embedded payloads
        let mut pos = 1024;
        while pos < source.len() {
            while !source.is_char_boundary(pos) {
                pos += 1;
            }
            if pos >= source.len() {
                break;
            }
            source.insert_str(pos, "\" +\n \"");
            pos += 1024;
        }

        let _ = write!(out, "{}source: \"{source}\"\n", tabs(indents));
        Ok(out)
    }

    fn make_image_ref(&mut self, image: &str, indents: usize) -> Result<String> {
        let mut out = String::new();
        let indent = tabs(indents + 1);
        let _ = write!(out, "{}Image {{\n", tabs(indents));
        let _ = write!(out, "{indent}anchors.fill: parent\n");
        let _ = write!(out, "{indent}mipmap: true\n");
        let _ = write!(out, "{indent}fillMode: Image.PreserveAspectCrop\n");
        out += &self.make_image_source(image, false, indents + 1, None)?;
        let _ = write!(out, "{}}}\n", tabs(indents));
        Ok(out)
    }

    /// Color (with fill opacity and visibility folded in) plus an optional
    /// image fill.
    fn make_fill(&mut self, fill: &JsonMap, indents: usize) -> Result<String> {
        let mut out = String::new();
        let invisible = fill.contains_key("visible") && !get_bool(fill, "visible");
        if let Some(color) = get_obj(fill, "color") {
            if !invisible && fill.contains_key("opacity") {
                out += &self.make_color(color, indents, get_f64(fill, "opacity"));
            } else {
                out += &self.make_color(color, indents, if invisible { 0.0 } else { 1.0 });
            }
        } else {
            let _ = write!(out, "{}color: \"transparent\"\n", tabs(indents));
        }
        if fill.contains_key("imageRef") {
            out += &self.make_image_ref(get_str(fill, "imageRef"), indents + 1)?;
        }
        Ok(out)
    }

    fn make_vector(
        &mut self,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<String> {
        let mut out = String::new();
        out += &self.make_extents(obj, parent, indents, Extents::default());
        let fills = get_arr(obj, "fills");
        if let Some(fill) = fills.first().and_then(Value::as_object) {
            out += &self.make_fill(fill, indents)?;
        } else if !obj.get("fills").is_some_and(Value::is_string) {
            // A string marker means a delta instance: the component supplies
            // the fill, nothing is emitted here.
            let _ = write!(out, "{}color: \"transparent\"\n", tabs(indents));
        }
        Ok(out)
    }

    // endregion: shared attribute emission

    // region: shape paths and strokes

    fn make_stroke_join(&self, stroke: &JsonMap, indents: usize) -> String {
        let join = match get_str(stroke, "strokeJoin") {
            "BEVEL" => "MiterBevel",
            "ROUND" => "MiterRound",
            _ => "MiterJoin",
        };
        format!("{}joinStyle: ShapePath.{join}\n", tabs(indents))
    }

    fn make_shape_stroke(&self, obj: &JsonMap, indents: usize, stroke_type: StrokeType) -> String {
        let mut out = String::new();
        let indent = tabs(indents);
        // LINE renders better when the stroke color drives the fill.
        let color_attr_name = if get_str(obj, "type") == "LINE" {
            "fillColor"
        } else {
            "strokeColor"
        };
        if let Some(stroke) = get_arr(obj, "strokes").first().and_then(Value::as_object) {
            out += &self.make_stroke_join(stroke, indents);
            let opacity = if stroke.contains_key("opacity") {
                get_f64(stroke, "opacity")
            } else {
                1.0
            };
            let color = get_obj(stroke, "color").cloned().unwrap_or_default();
            let _ = write!(
                out,
                "{indent}{color_attr_name}: {}\n",
                color_attr(&color, opacity)
            );
        } else if !obj.get("strokes").is_some_and(Value::is_string) {
            let _ = write!(out, "{indent}{color_attr_name}: \"transparent\"\n");
        }
        if obj.contains_key("strokeWeight") {
            let weight = get_f64(obj, "strokeWeight");
            let value = match stroke_type {
                StrokeType::Normal => weight,
                StrokeType::Double => weight * 2.0,
            };
            let _ = write!(out, "{indent}strokeWidth:{value}\n");
        }
        out
    }

    fn make_shape_fill(&self, obj: &JsonMap, indents: usize) -> String {
        let mut out = String::new();
        let indent = tabs(indents);
        if get_str(obj, "type") != "LINE" {
            if let Some(fill) = get_arr(obj, "fills").first().and_then(Value::as_object) {
                let opacity = if fill.contains_key("opacity") {
                    get_f64(fill, "opacity")
                } else {
                    1.0
                };
                let color = get_obj(fill, "color").cloned().unwrap_or_default();
                let _ = write!(out, "{indent}fillColor:{}\n", color_attr(&color, opacity));
            } else if !obj.get("fills").is_some_and(Value::is_string) {
                let _ = write!(out, "{indent}fillColor:\"transparent\"\n");
            }
        } else {
            let _ = write!(out, "{indent}strokeColor: \"transparent\"\n");
        }
        let _ = write!(out, "{indent}id: svgpath_{}\n", qml_id(get_str(obj, "id")));
        out
    }

    fn make_svg_path(&self, index: usize, is_fill: bool, obj: &JsonMap, indents: usize) -> String {
        let mut out = String::new();
        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);
        let array = if is_fill {
            get_arr(obj, "fillGeometry")
        } else {
            get_arr(obj, "strokeGeometry")
        };
        let Some(path) = array.get(index).and_then(Value::as_object) else {
            return out;
        };
        // Figma sets a winding per path; QML has one rule per ShapePath.
        if index == 0 && get_str(path, "windingRule") == "NONZERO" {
            let _ = write!(out, "{indent}fillRule: ShapePath.WindingFill\n");
        }
        let _ = write!(out, "{indent}PathSvg {{\n");
        let _ = write!(out, "{indent1}path: \"{}\"\n", get_str(path, "path"));
        let _ = write!(out, "{indent}}} \n");
        out
    }

    fn make_shape_fill_data(&self, obj: &JsonMap, shape_indents: usize) -> String {
        let mut out = String::new();
        if !get_arr(obj, "fillGeometry").is_empty() {
            for index in 0..get_arr(obj, "fillGeometry").len() {
                out += &self.make_svg_path(index, true, obj, shape_indents);
            }
        } else if !get_arr(obj, "strokeGeometry").is_empty() {
            for index in 0..get_arr(obj, "strokeGeometry").len() {
                out += &self.make_svg_path(index, false, obj, shape_indents);
            }
        }
        out
    }

    fn make_antialiasing(&self, indents: usize) -> String {
        if !self.is_qul() && self.flags.contains(Flags::ANTIALIZE_SHAPES) {
            format!("{}antialiasing: true\n", tabs(indents))
        } else {
            String::new()
        }
    }

    /// The stroke silhouette drawn black into a hidden layer; used as an
    /// opacity-mask input by the image-fill variants.
    fn make_image_mask_data(
        &mut self,
        image_ref: &str,
        obj: &JsonMap,
        indents: usize,
        source_id: &str,
        mask_source_id: &str,
    ) -> Result<String> {
        let mut out = String::new();
        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);

        let _ = write!(out, "{indent}OpacityMask {{\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        let _ = write!(out, "{indent1}source: {source_id}\n");
        let _ = write!(out, "{indent1}maskSource: {mask_source_id}\n");
        let _ = write!(out, "{indent}}}\n");
        let _ = write!(out, "{indent}Image {{\n");
        let _ = write!(out, "{indent1}id: {source_id}\n");
        let _ = write!(out, "{indent1}layer.enabled: true\n");
        let _ = write!(out, "{indent1}fillMode: Image.PreserveAspectCrop\n");
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}mipmap: true\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        out += &self.make_image_source(image_ref, false, indents + 1, None)?;
        let _ = write!(out, "{indent}}}\n");
        let _ = write!(out, "{indent}Shape {{\n");
        let _ = write!(out, "{indent1}id: {mask_source_id}\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        let _ = write!(out, "{indent1}layer.enabled: true\n");
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}ShapePath {{\n");
        out += &self.make_shape_stroke(obj, indents + 2, StrokeType::Normal);
        let _ = write!(out, "{}fillColor:\"black\"\n", tabs(indents + 2));
        out += &self.make_shape_fill_data(obj, indents + 2);
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");
        Ok(out)
    }

    fn make_vector_normal_fill(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> String {
        let mut out = String::new();
        out += &self.make_item("Shape", obj, indents);
        out += &self.make_extents(obj, parent, indents, Extents::default());
        let indent = tabs(indents);
        out += &self.make_antialiasing(indents);
        let _ = write!(out, "{indent}ShapePath {{\n");
        out += &self.make_shape_stroke(obj, indents + 1, StrokeType::Normal);
        out += &self.make_shape_fill(obj, indents + 1);
        out += &self.make_shape_fill_data(obj, indents + 1);
        let _ = write!(out, "{indent}}}\n");
        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        out
    }

    fn make_vector_normal_image(
        &mut self,
        image: &str,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<String> {
        let mut out = String::new();
        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);

        out += &self.make_item("Item", obj, indents);
        out += &self.make_extents(obj, parent, indents, Extents::default());

        let source_id = format!("source_{}", qml_id(get_str(obj, "id")));
        let mask_source_id = format!("maskSource_{}", qml_id(get_str(obj, "id")));
        out += &self.make_image_mask_data(image, obj, indents, &source_id, &mask_source_id)?;

        let _ = write!(out, "{indent}Shape {{\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        out += &self.make_antialiasing(indents + 1);
        let _ = write!(out, "{indent1}ShapePath {{\n");
        out += &self.make_shape_stroke(obj, indents + 2, StrokeType::Normal);
        out += &self.make_shape_fill(obj, indents + 2);
        out += &self.make_shape_fill_data(obj, indents + 2);
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{}}} \n", tabs(indents - 1));
        Ok(out)
    }

    fn make_vector_normal(
        &mut self,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<String> {
        match self.image_fill(obj) {
            Some(image) => self.make_vector_normal_image(&image, obj, parent, indents),
            None => Ok(self.make_vector_normal_fill(obj, parent, indents)),
        }
    }

    fn make_vector_inside_fill(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "{}// QML (SVG) supports only center borders, thus an extra mask is created for {}\n",
            tabs(indents - 1),
            get_str(obj, "strokeAlign")
        );
        out += &self.make_item("Item", obj, indents);
        out += &self.make_extents(obj, parent, indents, Extents::default());
        let border_source_id = format!("borderSource_{}", qml_id(get_str(obj, "id")));

        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);

        let _ = write!(out, "{indent}Shape {{ \n");
        let _ = write!(out, "{indent1}id:{border_source_id}\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        out += &self.make_antialiasing(indents + 1);
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}ShapePath {{\n");
        out += &self.make_shape_stroke(obj, indents + 2, StrokeType::Double);
        out += &self.make_shape_fill(obj, indents + 2);
        out += &self.make_shape_fill_data(obj, indents + 2);
        let _ = write!(out, "{}}}\n", tabs(indents + 2));
        let _ = write!(out, "{indent1}}}\n");

        let border_mask_id = format!("borderMask_{}", qml_id(get_str(obj, "id")));
        let _ = write!(out, "{indent1}Shape {{\n");
        let _ = write!(out, "{indent1}id: {border_mask_id}\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        out += &self.make_antialiasing(indents + 1);
        // drawn out of bounds
        let _ = write!(out, "{indent1}layer.enabled: true\n");
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}ShapePath {{\n");
        let indent2 = tabs(indents + 2);
        let _ = write!(out, "{indent2}fillColor: \"black\"\n");
        let _ = write!(out, "{indent2}strokeColor: \"transparent\"\n");
        let _ = write!(out, "{indent2}strokeWidth: 0\n");
        let _ = write!(out, "{indent2}joinStyle: ShapePath.MiterJoin\n");
        out += &self.make_shape_fill_data(obj, indents + 2);
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{indent}OpacityMask {{\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        let _ = write!(out, "{indent1}source: {border_source_id}\n");
        let _ = write!(out, "{indent1}maskSource: {border_mask_id}\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        out
    }

    fn make_vector_inside_image(
        &mut self,
        image: &str,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<String> {
        let mut out = String::new();
        let _ = write!(
            out,
            "{}// QML (SVG) supports only center borders, thus an extra mask is created for {}\n",
            tabs(indents - 1),
            get_str(obj, "strokeAlign")
        );
        out += &self.make_item("Item", obj, indents);
        out += &self.make_extents(obj, parent, indents, Extents::default());

        let border_source_id = format!("borderSource_{}", qml_id(get_str(obj, "id")));

        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);
        let indent2 = tabs(indents + 2);

        let source_id = format!("source_{}", qml_id(get_str(obj, "id")));
        let mask_source_id = format!("maskSource_{}", qml_id(get_str(obj, "id")));

        let _ = write!(out, "{indent}Item {{\n");
        let _ = write!(out, "{indent1}id:{border_source_id}\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        out += &self.make_antialiasing(indents + 1);
        let _ = write!(out, "{indent1}visible: false\n");

        out += &self.make_image_mask_data(image, obj, indents + 1, &source_id, &mask_source_id)?;

        let _ = write!(out, "{indent1}Shape {{\n");
        let _ = write!(out, "{indent2}anchors.fill: parent\n");
        out += &self.make_antialiasing(indents + 2);
        let _ = write!(out, "{indent2}ShapePath {{\n");
        out += &self.make_shape_stroke(obj, indents + 3, StrokeType::Double);
        out += &self.make_shape_fill(obj, indents + 3);
        out += &self.make_shape_fill_data(obj, indents + 3);
        let _ = write!(out, "{indent2}}}\n");
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");

        let border_mask_id = format!("borderMask_{}", qml_id(get_str(obj, "id")));
        let _ = write!(out, "{indent}Shape {{\n");
        let _ = write!(out, "{indent1}id: {border_mask_id}\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        out += &self.make_antialiasing(indents + 1);
        let _ = write!(out, "{indent1}layer.enabled: true\n");
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}ShapePath {{\n");
        let _ = write!(out, "{indent2}fillColor: \"black\"\n");
        let _ = write!(out, "{indent2}strokeColor: \"transparent\"\n");
        let _ = write!(out, "{indent2}strokeWidth: 0\n");
        let _ = write!(out, "{indent2}joinStyle: ShapePath.MiterJoin\n");
        out += &self.make_shape_fill_data(obj, indents + 2);
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{indent}OpacityMask {{\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        let _ = write!(out, "{indent1}source: {border_source_id}\n");
        let _ = write!(out, "{indent1}maskSource: {border_mask_id}\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        Ok(out)
    }

    fn make_vector_inside(
        &mut self,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<String> {
        match self.image_fill(obj) {
            Some(image) => self.make_vector_inside_image(&image, obj, parent, indents),
            None => Ok(self.make_vector_inside_fill(obj, parent, indents)),
        }
    }

    fn make_vector_outside_fill(
        &mut self,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> String {
        let mut out = String::new();
        let border_width = get_f64(obj, "strokeWeight");
        let _ = write!(
            out,
            "{}// QML (SVG) supports only center borders, thus an extra mask is created for {}\n",
            tabs(indents - 1),
            get_str(obj, "strokeAlign")
        );
        out += &self.make_item("Item", obj, indents);
        // Borders land outside the shape; expand so the mask never clips.
        out += &self.make_extents(
            obj,
            parent,
            indents,
            Extents {
                x: -border_width,
                y: -border_width,
                width: border_width * 2.0,
                height: border_width * 2.0,
            },
        );

        let border_source_id = format!("borderSource_{}", qml_id(get_str(obj, "id")));

        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);
        let indent2 = tabs(indents + 2);
        let indent3 = tabs(indents + 3);

        let _ = write!(out, "{indent}Shape {{\n");
        let _ = write!(out, "{indent1}x: {border_width}\n");
        let _ = write!(out, "{indent1}y: {border_width}\n");
        out += &self.make_size(obj, indents + 1, (0.0, 0.0));
        out += &self.make_antialiasing(indents + 1);
        let _ = write!(out, "{indent1}ShapePath {{\n");
        out += &self.make_shape_fill(obj, indents + 2);
        out += &self.make_shape_fill_data(obj, indents + 2);
        let _ = write!(out, "{indent2}strokeWidth: 0\n");
        let _ = write!(out, "{indent2}strokeColor: fillColor\n");
        let _ = write!(out, "{indent2}joinStyle: ShapePath.MiterJoin\n");
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{indent}Item {{\n");
        let _ = write!(out, "{indent1}id: {border_source_id}\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}Shape {{\n");
        out += &self.make_antialiasing(indents + 2);
        let _ = write!(out, "{indent2}x: {border_width}\n");
        let _ = write!(out, "{indent2}y: {border_width}\n");
        out += &self.make_size(obj, indents + 2, (0.0, 0.0));
        let _ = write!(out, "{indent2}ShapePath {{\n");
        let _ = write!(out, "{indent3}fillColor: \"black\"\n");
        out += &self.make_shape_stroke(obj, indents + 3, StrokeType::Double);
        out += &self.make_shape_fill_data(obj, indents + 3);
        let _ = write!(out, "{indent2}}}\n");
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");

        let border_mask_id = format!("borderMask_{}", qml_id(get_str(obj, "id")));
        let _ = write!(out, "{indent}Item {{\n");
        let _ = write!(out, "{indent1}id: {border_mask_id}\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        out += &self.make_antialiasing(indents + 1);
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}Shape {{\n");
        let _ = write!(out, "{indent2}x: {border_width}\n");
        let _ = write!(out, "{indent2}y: {border_width}\n");
        out += &self.make_size(obj, indents + 2, (0.0, 0.0));
        let _ = write!(out, "{indent2}ShapePath {{\n");
        let _ = write!(out, "{indent3}fillColor: \"black\"\n");
        let _ = write!(out, "{indent3}strokeColor: \"transparent\"\n");
        let _ = write!(out, "{indent3}strokeWidth: {border_width}\n");
        let _ = write!(out, "{indent3}joinStyle: ShapePath.MiterJoin\n");
        out += &self.make_shape_fill_data(obj, indents + 3);
        let _ = write!(out, "{indent2}}}\n");
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{indent}OpacityMask {{\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        let _ = write!(out, "{indent1}maskSource: {border_mask_id}\n");
        let _ = write!(out, "{indent1}source: {border_source_id}\n");
        let _ = write!(out, "{indent1}invert: true\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        out
    }

    fn make_vector_outside_image(
        &mut self,
        image: &str,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<String> {
        let mut out = String::new();
        let border_width = get_f64(obj, "strokeWeight");
        let _ = write!(
            out,
            "{}// QML (SVG) supports only center borders, thus an extra mask is created for {}\n",
            tabs(indents - 1),
            get_str(obj, "strokeAlign")
        );
        out += &self.make_item("Item", obj, indents);
        out += &self.make_extents(
            obj,
            parent,
            indents,
            Extents {
                x: -border_width,
                y: -border_width,
                width: border_width * 2.0,
                height: border_width * 2.0,
            },
        );

        let border_source_id = format!("borderSource_{}", qml_id(get_str(obj, "id")));

        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);
        let indent2 = tabs(indents + 2);
        let indent3 = tabs(indents + 3);

        let source_id = format!("source_{}", qml_id(get_str(obj, "id")));
        let mask_source_id = format!("maskSource_{}", qml_id(get_str(obj, "id")));

        let _ = write!(out, "{indent}Item {{\n");
        let _ = write!(out, "{indent1}x: {border_width}\n");
        let _ = write!(out, "{indent1}y: {border_width}\n");
        out += &self.make_size(obj, indents + 1, (0.0, 0.0));
        out += &self.make_antialiasing(indents + 1);
        out += &self.make_image_mask_data(image, obj, indents + 1, &source_id, &mask_source_id)?;

        let _ = write!(out, "{indent1}Shape {{\n");
        let _ = write!(out, "{indent2}anchors.fill: parent\n");
        out += &self.make_antialiasing(indents + 2);
        let _ = write!(out, "{indent2}ShapePath {{\n");
        let _ = write!(out, "{indent3}strokeColor: \"transparent\"\n");
        let _ = write!(out, "{indent3}strokeWidth: 0\n");
        let _ = write!(out, "{indent3}joinStyle: ShapePath.MiterJoin\n");
        out += &self.make_shape_fill(obj, indents + 3);
        out += &self.make_shape_fill_data(obj, indents + 3);
        let _ = write!(out, "{indent2}}} \n");
        let _ = write!(out, "{indent1}}} \n");
        let _ = write!(out, "{indent}}} \n");

        let _ = write!(out, "{indent}Item {{\n");
        let _ = write!(out, "{indent1}id: {border_source_id}\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}Shape {{\n");
        out += &self.make_antialiasing(indents + 2);
        let _ = write!(out, "{indent2}x: {border_width}\n");
        let _ = write!(out, "{indent2}y: {border_width}\n");
        out += &self.make_size(obj, indents + 2, (0.0, 0.0));
        let _ = write!(out, "{indent2}ShapePath {{\n");
        let _ = write!(out, "{indent3}fillColor: \"black\"\n");
        out += &self.make_shape_stroke(obj, indents + 3, StrokeType::Double);
        out += &self.make_shape_fill_data(obj, indents + 3);
        let _ = write!(out, "{indent2}}}\n");
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");

        let border_mask_id = format!("borderMask_{}", qml_id(get_str(obj, "id")));
        let _ = write!(out, "{indent}Item {{\n");
        let _ = write!(out, "{indent1}id: {border_mask_id}\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        out += &self.make_antialiasing(indents + 1);
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}Shape {{\n");
        let _ = write!(out, "{indent2}x: {border_width}\n");
        let _ = write!(out, "{indent2}y: {border_width}\n");
        out += &self.make_size(obj, indents + 2, (0.0, 0.0));
        let _ = write!(out, "{indent2}ShapePath {{\n");
        let _ = write!(out, "{indent3}fillColor: \"black\"\n");
        let _ = write!(out, "{indent3}strokeColor: \"transparent\"\n");
        let _ = write!(out, "{indent3}strokeWidth: {border_width}\n");
        let _ = write!(out, "{indent3}joinStyle: ShapePath.MiterJoin\n");
        out += &self.make_shape_fill_data(obj, indents + 3);
        let _ = write!(out, "{indent2}}}\n");
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{indent}OpacityMask {{\n");
        let _ = write!(out, "{indent1}anchors.fill:parent\n");
        let _ = write!(out, "{indent1}maskSource: {border_mask_id}\n");
        let _ = write!(out, "{indent1}source: {border_source_id}\n");
        let _ = write!(out, "{indent1}invert: true\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        Ok(out)
    }

    fn make_vector_outside(
        &mut self,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<String> {
        match self.image_fill(obj) {
            Some(image) => self.make_vector_outside_image(&image, obj, parent, indents),
            None => Ok(self.make_vector_outside_fill(obj, parent, indents)),
        }
    }

    fn parse_vector(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> Result<String> {
        let has_borders = !get_arr(obj, "strokes").is_empty()
            && obj.contains_key("strokeWeight")
            && get_f64(obj, "strokeWeight") > 1.0;
        if has_borders && get_str(obj, "strokeAlign") == "INSIDE" {
            self.make_vector_inside(obj, parent, indents)
        } else if has_borders && get_str(obj, "strokeAlign") == "OUTSIDE" {
            self.make_vector_outside(obj, parent, indents)
        } else {
            self.make_vector_normal(obj, parent, indents)
        }
    }

    // endregion: shape paths and strokes

    // region: text

    fn text_styles(&mut self, style: &JsonMap) -> BTreeMap<String, String> {
        let mut styles = BTreeMap::new();
        let resolved = self.data.font_info(get_str(style, "fontFamily"));
        styles.insert("font.family".to_owned(), format!("\"{resolved}\""));
        styles.insert(
            "font.italic".to_owned(),
            if get_bool(style, "italic") { "true" } else { "false" }.to_owned(),
        );
        styles.insert(
            "font.pixelSize".to_owned(),
            (get_f64(style, "fontSize").floor() as i64).to_string(),
        );
        styles.insert(
            "font.weight".to_owned(),
            font_weight(get_f64(style, "fontWeight")).to_owned(),
        );
        if style.contains_key("textCase") {
            let capitalization = match get_str(style, "textCase") {
                "UPPER" => Some("Font.AllUppercase"),
                "LOWER" => Some("Font.AllLowercase"),
                "TITLE" => Some("Font.MixedCase"),
                "SMALL_CAPS" => Some("Font.SmallCaps"),
                "SMALL_CAPS_FORCED" => Some("Font.Capitalize"),
                _ => None,
            };
            if let Some(capitalization) = capitalization {
                styles.insert("font.capitalization".to_owned(), capitalization.to_owned());
            }
        }
        if style.contains_key("textDecoration") {
            match get_str(style, "textDecoration") {
                "STRIKETHROUGH" => {
                    styles.insert("strikeout".to_owned(), "true".to_owned());
                }
                "UNDERLINE" => {
                    styles.insert("underline".to_owned(), "true".to_owned());
                }
                _ => {}
            }
        }
        if style.contains_key("paragraphSpacing") {
            styles.insert(
                "topPadding".to_owned(),
                (get_f64(style, "paragraphSpacing") as i64).to_string(),
            );
        }
        if style.contains_key("paragraphIndent") {
            styles.insert(
                "leftPadding".to_owned(),
                (get_f64(style, "paragraphIndent") as i64).to_string(),
            );
        }
        let horizontal = match get_str(style, "textAlignHorizontal") {
            "RIGHT" => "Text.AlignRight",
            "CENTER" => "Text.AlignHCenter",
            "JUSTIFIED" => "Text.AlignJustify",
            _ => "Text.AlignLeft",
        };
        styles.insert("horizontalAlignment".to_owned(), horizontal.to_owned());
        let vertical = match get_str(style, "textAlignVertical") {
            "BOTTOM" => "Text.AlignBottom",
            "CENTER" => "Text.AlignVCenter",
            _ => "Text.AlignTop",
        };
        styles.insert("verticalAlignment".to_owned(), vertical.to_owned());
        styles.insert(
            "font.letterSpacing".to_owned(),
            get_f64(style, "letterSpacing").to_string(),
        );
        styles
    }

    fn parse_style(&mut self, style: &JsonMap, indents: usize) -> Result<String> {
        let mut out = String::new();
        let indent = tabs(indents);
        for (key, value) in self.text_styles(style) {
            let _ = write!(out, "{indent}{key}: {value}\n");
        }
        if let Some(fill) = get_arr(style, "fills").first().and_then(Value::as_object) {
            out += &self.make_fill(fill, indents)?;
        }
        Ok(out)
    }

    fn parse_text(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> Result<String> {
        let mut out = String::new();
        out += &self.make_item("Text", obj, indents);
        out += &self.make_vector(obj, parent, indents)?;
        let indent = tabs(indents);
        let _ = write!(out, "{indent}wrapMode: TextEdit.WordWrap\n");
        let _ = write!(out, "{indent}text:\"{}\"\n", get_str(obj, "characters"));
        let style = get_obj(obj, "style").cloned().unwrap_or_default();
        out += &self.parse_style(&style, indents)?;
        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        Ok(out)
    }

    // endregion: text

    // region: frames and components

    fn parse_frame(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> Result<String> {
        let mut out = self.make_item("Rectangle", obj, indents);
        out += &self.make_vector(obj, parent, indents)?;
        let indent = tabs(indents);
        if obj.contains_key("cornerRadius") {
            let _ = write!(out, "{indent}radius:{}\n", get_f64(obj, "cornerRadius"));
        }
        let _ = write!(
            out,
            "{indent}clip: {} \n",
            if get_bool(obj, "clipsContent") { "true" } else { "false" }
        );
        out += &self.parse_children(obj, parent, indents)?;
        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        Ok(out)
    }

    /// A component definition: every child becomes an injectable delegate
    /// with transform and geometry override properties, instantiated in
    /// Component.onCompleted with the non-NaN overrides applied.
    fn parse_component(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> Result<String> {
        if !self.flags.contains(Flags::PARSE_COMPONENT) {
            return self.parse_instance(obj, parent, indents);
        }
        let mut out = self.make_item("Rectangle", obj, indents);
        out += &self.make_vector(obj, parent, indents)?;
        let indent = tabs(indents);
        if obj.contains_key("cornerRadius") {
            let _ = write!(out, "{indent}radius:{}\n", get_f64(obj, "cornerRadius"));
        }
        let _ = write!(
            out,
            "{indent}clip: {} \n",
            if get_bool(obj, "clipsContent") { "true" } else { "false" }
        );

        let children = self.parse_children_items(obj, parent, indents)?;
        const PROPERTIES: [&str; 4] = ["x", "y", "width", "height"];
        let nan_matrix = vec!["NaN"; 16].join(",");
        for (key, bytes) in &children {
            let id = delegate_name(key);
            let mut sname = id.clone();
            if let Some(first) = sname.get_mut(..1) {
                first.make_ascii_uppercase();
            }
            let _ = write!(out, "{indent}property Component {id}: {bytes}");
            let _ = write!(out, "{indent}property Item i_{id}\n");
            let _ = write!(
                out,
                "{indent}property matrix4x4 {id}_transform: Qt.matrix4x4({nan_matrix})\n"
            );
            let _ = write!(
                out,
                "{indent}on{sname}_transformChanged: {{if(i_{id} && i_{id}.transform != {id}_transform) i_{id}.transform = {id}_transform;}}\n"
            );
            for property in PROPERTIES {
                let _ = write!(out, "{indent}property real {id}_{property}: NaN\n");
                let _ = write!(
                    out,
                    "{indent}on{sname}_{property}Changed: {{if(i_{id} && i_{id}.{property} != {id}_{property}) i_{id}.{property} = {id}_{property};}}\n"
                );
            }
        }

        let indent1 = tabs(indents + 1);
        let _ = write!(out, "{indent}Component.onCompleted: {{\n");
        for key in children.keys() {
            let dname = delegate_name(key);
            let _ = write!(out, "{indent1}const o_{dname} = {{}}\n");
            let _ = write!(
                out,
                "{indent1}if(!isNaN({dname}_transform.m11)) o_{dname}['transform'] = {dname}_transform;\n"
            );
            for property in PROPERTIES {
                let _ = write!(
                    out,
                    "{indent1}if(!isNaN({dname}_{property})) o_{dname}['{property}'] = {dname}_{property};\n"
                );
            }
            let _ = write!(out, "{indent1}i_{dname} = {dname}.createObject(this, o_{dname})\n");
            for property in PROPERTIES {
                let _ = write!(
                    out,
                    "{indent1}{dname}_{property} = Qt.binding(()=>i_{dname}.{property})\n"
                );
            }
        }
        let _ = write!(out, "{indent}}}\n");
        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        Ok(out)
    }

    // endregion: frames and components

    // region: boolean operations

    fn parse_boolean_union(
        &mut self,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
        source_id: &str,
        mask_source_id: &str,
    ) -> Result<String> {
        let mut out = String::new();
        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);
        let _ = write!(out, "{indent}Rectangle {{\n");
        let _ = write!(out, "{indent1}id: {source_id}\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        if let Some(fill) = get_arr(obj, "fills").first().and_then(Value::as_object) {
            out += &self.make_fill(fill, indents + 1)?;
        } else if !obj.get("fills").is_some_and(Value::is_string) {
            let _ = write!(out, "{indent1}color: \"transparent\"\n");
        }
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{indent}Item {{\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}id: {mask_source_id}\n");
        out += &self.parse_children(obj, parent, indents + 1)?;
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{indent}OpacityMask {{\n");
        let _ = write!(out, "{indent1}anchors.fill:{source_id}\n");
        let _ = write!(out, "{indent1}source:{source_id}\n");
        let _ = write!(out, "{indent1}maskSource:{mask_source_id}\n");
        let _ = write!(out, "{indent}}}\n");
        Ok(out)
    }

    fn parse_boolean_subtract(
        &mut self,
        obj: &JsonMap,
        children: &[Value],
        parent: &Parent,
        indents: usize,
        source_id: &str,
        mask_source_id: &str,
    ) -> Result<String> {
        let mut out = String::new();
        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);
        let indent2 = tabs(indents + 2);

        let _ = write!(out, "{indent}Item {{\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}id: {source_id}_subtract\n");
        let _ = write!(out, "{indent1}Rectangle {{\n");
        let _ = write!(out, "{indent2}id: {source_id}\n");
        let _ = write!(out, "{indent2}anchors.fill: parent\n");
        let _ = write!(out, "{indent2}visible: false\n");
        if let Some(fill) = get_arr(obj, "fills").first().and_then(Value::as_object) {
            out += &self.make_fill(fill, indents + 2)?;
        } else if !obj.get("fills").is_some_and(Value::is_string) {
            let _ = write!(out, "{indent1}color: \"transparent\"\n");
        }
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent1}Item {{\n");
        let _ = write!(out, "{indent2}anchors.fill: parent\n");
        let _ = write!(out, "{indent2}visible: false\n");
        let _ = write!(out, "{indent2}id:{mask_source_id}\n");
        if let Some(first) = children.first().and_then(Value::as_object) {
            out += &self.parse(first, parent, indents + 3)?;
        }
        let _ = write!(out, "{indent1}}}\n");

        let _ = write!(out, "{indent1}OpacityMask {{\n");
        let _ = write!(out, "{indent2}anchors.fill:{source_id}\n");
        let _ = write!(out, "{indent2}source:{source_id}\n");
        let _ = write!(out, "{indent2}maskSource:{mask_source_id}\n");
        let _ = write!(out, "{indent1}}}\n");
        let _ = write!(out, "{indent}}}\n");
        // that was the one we subtract from

        let _ = write!(out, "{indent}Item {{\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}id: {mask_source_id}_subtract\n");
        for child in children.iter().skip(1) {
            if let Some(child) = child.as_object() {
                out += &self.parse(child, parent, indents + 2)?;
            }
        }
        let _ = write!(out, "{indent}}}\n");

        let _ = write!(out, "{indent}OpacityMask {{\n");
        let _ = write!(out, "{indent1}anchors.fill:{source_id}_subtract\n");
        let _ = write!(out, "{indent1}source:{source_id}_subtract\n");
        let _ = write!(out, "{indent1}maskSource:{mask_source_id}_subtract\n");
        let _ = write!(out, "{indent1}invert: true\n");
        let _ = write!(out, "{indent}}}\n");
        Ok(out)
    }

    fn parse_boolean_intersect(
        &mut self,
        obj: &JsonMap,
        children: &[Value],
        parent: &Parent,
        indents: usize,
        source_id: &str,
        mask_source_id: &str,
    ) -> Result<String> {
        let mut out = String::new();
        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);

        let _ = write!(out, "{indent}Rectangle {{\n");
        let _ = write!(out, "{indent1}id: {source_id}\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        if let Some(fill) = get_arr(obj, "fills").first().and_then(Value::as_object) {
            out += &self.make_fill(fill, indents + 1)?;
        } else if !obj.get("fills").is_some_and(Value::is_string) {
            let _ = write!(out, "{indent1}color: \"transparent\"\n");
        }
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent}}}\n");

        let mut next_source_id = source_id.to_owned();
        for (index, child) in children.iter().enumerate() {
            let mask_id = format!("{mask_source_id}_{index}");
            let _ = write!(out, "{indent}Item {{\n");
            let _ = write!(out, "{indent1}anchors.fill: parent\n");
            let _ = write!(out, "{indent1}visible: false\n");
            if let Some(child) = child.as_object() {
                out += &self.parse(child, parent, indents + 2)?;
            }
            let _ = write!(out, "{indent1}id: {mask_id}\n");
            let _ = write!(out, "{indent}}}\n");

            let _ = write!(out, "{indent}OpacityMask {{\n");
            let _ = write!(out, "{indent1}anchors.fill:{source_id}\n");
            let _ = write!(out, "{indent1}source:{next_source_id}\n");
            let _ = write!(out, "{indent1}maskSource:{mask_id}\n");
            next_source_id = format!("{source_id}_{index}");
            let _ = write!(out, "{indent1}id: {next_source_id}\n");
            if index < children.len() - 1 {
                let _ = write!(out, "{indent1}visible: false\n");
            }
            let _ = write!(out, "{indent}}}\n");
        }
        Ok(out)
    }

    /// Pairwise a(1-b) + (1-a)b, composed through fragment shaders.
    fn parse_boolean_exclude(
        &mut self,
        obj: &JsonMap,
        children: &[Value],
        parent: &Parent,
        indents: usize,
        source_id: &str,
        mask_source_id: &str,
    ) -> Result<String> {
        let mut out = String::new();
        let indent = tabs(indents);
        let indent1 = tabs(indents + 1);
        let indent2 = tabs(indents + 2);
        let indent3 = tabs(indents + 3);

        let _ = write!(out, "{indent}Rectangle {{\n");
        let _ = write!(out, "{indent1}id: {source_id}\n");
        let _ = write!(out, "{indent1}anchors.fill: parent\n");
        if let Some(fill) = get_arr(obj, "fills").first().and_then(Value::as_object) {
            out += &self.make_fill(fill, indents + 1)?;
        } else if !obj.get("fills").is_some_and(Value::is_string) {
            let _ = write!(out, "{indent1}color: \"transparent\"\n");
        }
        let _ = write!(out, "{indent1}visible: false\n");
        let _ = write!(out, "{indent1}layer.enabled: true\n");

        let _ = write!(out, "{indent1}readonly property string shaderSource: \"\n");
        let _ = write!(out, "{indent2}uniform lowp sampler2D colorSource;\n");
        let _ = write!(out, "{indent2}uniform lowp sampler2D prevMask;\n");
        let _ = write!(out, "{indent2}uniform lowp sampler2D currentMask;\n");
        let _ = write!(out, "{indent2}uniform lowp float qt_Opacity;\n");
        let _ = write!(out, "{indent2}varying highp vec2 qt_TexCoord0;\n");
        let _ = write!(out, "{indent2}void main() {{\n");
        let _ = write!(out, "{indent3}vec4 color = texture2D(colorSource, qt_TexCoord0);\n");
        let _ = write!(out, "{indent3}vec4 cm = texture2D(currentMask, qt_TexCoord0);\n");
        let _ = write!(out, "{indent3}vec4 pm = texture2D(prevMask, qt_TexCoord0);\n");
        let _ = write!(
            out,
            "{indent3}gl_FragColor = qt_Opacity * color * ((cm.a * (1.0 - pm.a)) + ((1.0 - cm.a) * pm.a));\n"
        );
        let _ = write!(out, "{indent2}}}\"\n");

        let _ = write!(out, "{indent1}readonly property string shaderSource0: \"\n");
        let _ = write!(out, "{indent2}uniform lowp sampler2D colorSource;\n");
        let _ = write!(out, "{indent2}uniform lowp sampler2D currentMask;\n");
        let _ = write!(out, "{indent2}uniform lowp float qt_Opacity;\n");
        let _ = write!(out, "{indent2}varying highp vec2 qt_TexCoord0;\n");
        let _ = write!(out, "{indent2}void main() {{\n");
        let _ = write!(out, "{indent3}vec4 color = texture2D(colorSource, qt_TexCoord0);\n");
        let _ = write!(out, "{indent3}vec4 cm = texture2D(currentMask, qt_TexCoord0);\n");
        let _ = write!(out, "{indent3}gl_FragColor = cm.a * color;\n");
        let _ = write!(out, "{indent2}}}\"\n");
        let _ = write!(out, "{indent}}}\n");

        let mut next_source_id = String::new();
        for (index, child) in children.iter().enumerate() {
            let mask_id = format!("{mask_source_id}_{index}");
            let _ = write!(out, "{indent}Item {{\n");
            let _ = write!(out, "{indent1}visible: false\n");
            let _ = write!(out, "{indent1}anchors.fill: parent\n");
            if let Some(child) = child.as_object() {
                out += &self.parse(child, parent, indents + 2)?;
            }
            let _ = write!(out, "{indent1}layer.enabled: true\n");
            let _ = write!(out, "{indent1}id: {mask_id}\n");
            let _ = write!(out, "{indent}}}\n");

            let _ = write!(out, "{indent}ShaderEffect {{\n");
            let _ = write!(out, "{indent1}anchors.fill: parent\n");
            let _ = write!(out, "{indent1}layer.enabled: true\n");
            let _ = write!(out, "{indent1}property var colorSource:{source_id}\n");
            if !next_source_id.is_empty() {
                let _ = write!(out, "{indent2}property var prevMask: ShaderEffectSource {{\n");
                let _ = write!(out, "{indent2}sourceItem: {next_source_id}\n");
                let _ = write!(out, "{indent1}}}\n");
            }
            let _ = write!(out, "{indent1}property var currentMask:{mask_id}\n");
            let _ = write!(
                out,
                "{indent1}fragmentShader: {source_id}{}\n",
                if next_source_id.is_empty() {
                    ".shaderSource0"
                } else {
                    ".shaderSource"
                }
            );
            next_source_id = format!("{source_id}_{index}");
            if index < children.len() - 1 {
                let _ = write!(out, "{indent1}visible: false\n");
                let _ = write!(out, "{indent1}id: {next_source_id}\n");
            }
            let _ = write!(out, "{indent1}}}\n");
        }
        Ok(out)
    }

    fn parse_boolean_operation(
        &mut self,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<String> {
        if !self.flags.contains(Flags::BREAK_BOOLEANS) {
            return self.parse_vector(obj, parent, indents);
        }
        let children = get_arr(obj, "children").to_vec();
        if children.len() < 2 {
            return Err(Error::BooleanChildren(get_str(obj, "id").to_owned()));
        }
        let operation = get_str(obj, "booleanOperation").to_owned();

        let mut out = String::new();
        out += &self.make_item("Item", obj, indents);
        out += &self.make_extents(obj, parent, indents, Extents::default());
        let source_id = format!("source_{}", qml_id(get_str(obj, "id")));
        let mask_source_id = format!("maskSource_{}", qml_id(get_str(obj, "id")));
        match operation.as_str() {
            "UNION" => {
                out += &self.parse_boolean_union(obj, parent, indents, &source_id, &mask_source_id)?;
            }
            "SUBTRACT" => {
                out += &self.parse_boolean_subtract(
                    obj,
                    &children,
                    parent,
                    indents,
                    &source_id,
                    &mask_source_id,
                )?;
            }
            "INTERSECT" => {
                out += &self.parse_boolean_intersect(
                    obj,
                    &children,
                    parent,
                    indents,
                    &source_id,
                    &mask_source_id,
                )?;
            }
            "EXCLUDE" => {
                out += &self.parse_boolean_exclude(
                    obj,
                    &children,
                    parent,
                    indents,
                    &source_id,
                    &mask_source_id,
                )?;
            }
            _ => return Ok(String::new()),
        }
        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        Ok(out)
    }

    // endregion: boolean operations

    // region: pre-rendered nodes

    /// Bounding size including everything the children spill over.
    fn get_size(&self, obj: &JsonMap) -> (f64, f64) {
        let rect = get_obj(obj, "absoluteBoundingBox").cloned().unwrap_or_default();
        let mut size = (get_f64(&rect, "width"), get_f64(&rect, "height"));
        for child in get_arr(obj, "children") {
            if let Some(child) = child.as_object() {
                let child_size = self.get_size(child);
                size.0 = size.0.max(child_size.0);
                size.1 = size.1.max(child_size.1);
            }
        }
        size
    }

    fn parse_rendered(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> Result<String> {
        let mut out = String::new();
        out += &self.make_component_instance("Item", obj, indents);
        let indent = tabs(indents);
        let prect = parent
            .get("absoluteBoundingBox")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let px = get_f64(&prect, "x");
        let py = get_f64(&prect, "y");

        // node positions still come from the live tree
        let rect = get_obj(obj, "absoluteBoundingBox").cloned().unwrap_or_default();
        let x = get_f64(&rect, "x");
        let y = get_f64(&rect, "y");

        let (width, height) = self.get_size(obj);
        let image_id = format!("i_{}", qml_id(get_str(obj, "id")));

        let _ = write!(out, "{indent}x: {}\n", x - px);
        let _ = write!(out, "{indent}y: {}\n", y - py);
        let _ = write!(out, "{indent}width:{width}\n");
        let _ = write!(out, "{indent}height:{height}\n");

        let invisible = obj.contains_key("visible") && !get_bool(obj, "visible");
        if !invisible {
            // pre-rendering is pointless for invisible elements
            let _ = write!(out, "{indent}Image {{\n");
            let indent1 = tabs(indents + 1);
            let _ = write!(out, "{indent1}id: {image_id}\n");
            let _ = write!(out, "{indent1}anchors.centerIn: parent\n");
            let _ = write!(out, "{indent1}mipmap: true\n");
            let _ = write!(out, "{indent1}fillMode: Image.PreserveAspectFit\n");
            out += &self.make_image_source(
                get_str(obj, "id"),
                true,
                indents + 1,
                Some(PLACEHOLDER),
            )?;
            let _ = write!(out, "{indent}}}\n");
        }
        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        Ok(out)
    }

    // endregion: pre-rendered nodes

    // region: instances

    /// Fields of `instance` differing from `base`, with ignored keys
    /// skipped and custom comparators consulted. A non-empty delta gets the
    /// instance's name put back, since later emission needs it.
    fn delta(
        instance: &JsonMap,
        base: &JsonMap,
        ignored: &[&str],
        compares: &HashMap<&str, CompareFn>,
    ) -> JsonMap {
        let mut new_object = JsonMap::new();
        for (key, value) in instance {
            if ignored.contains(&key.as_str()) {
                continue;
            }
            match base.get(key) {
                None => {
                    new_object.insert(key.clone(), value.clone());
                }
                Some(base_value) => {
                    if let Some(compare) = compares.get(key.as_str()) {
                        let ret = compare(base_value, value);
                        if !ret.is_null() {
                            new_object.insert(key.clone(), ret);
                        }
                    } else if base_value != value {
                        new_object.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        if !new_object.is_empty() && !ignored.contains(&"name") && instance.contains_key("name") {
            new_object.insert("name".to_owned(), instance["name"].clone());
        }
        new_object
    }

    fn get_value(&self, obj: &JsonMap, key: &str) -> Value {
        if let Some(value) = obj.get(key) {
            return value.clone();
        }
        if self.item_type(obj).ok() == Some(ItemType::Instance) {
            if let Some(component) = self.components.get(get_str(obj, "componentId")) {
                if let Some(component) = component.object().as_object() {
                    return self.get_value(component, key);
                }
            }
        }
        Value::Null
    }

    /// Per-child overrides for an instance. A delta reduced to geometry
    /// emits only the delegate's transform/x/y/width/height properties; a
    /// deeper difference re-emits the whole child as the delegate source.
    fn make_instance_children(
        &mut self,
        obj: &JsonMap,
        comp: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<String> {
        let mut out = String::new();
        let comp_children = get_arr(comp, "children").to_vec();
        let obj_children = get_arr(obj, "children").to_vec();
        let children = self.parse_children_items(obj, parent, indents)?;
        if comp_children.len() != children.len() {
            // Mismatched child counts leave no way to pair delegates; fall
            // back to emitting the instance tree as-is.
            for (_, bytes) in &children {
                out += bytes;
            }
            return Ok(out);
        }
        let keys: Vec<&String> = children.keys().collect();
        let indent = tabs(indents);
        for comp_child in &comp_children {
            let Some(comp_child) = comp_child.as_object() else {
                continue;
            };
            let id = get_str(comp_child, "id");
            // instance child ids carry the component child id as their
            // trailing segment
            let Some(position) = keys
                .iter()
                .position(|key| key.split(';').next_back() == Some(id))
            else {
                continue;
            };
            let Some(obj_child) = obj_children.get(position).and_then(Value::as_object) else {
                continue;
            };
            // absoluteBoundingBox is ignored: size and transform alias it
            let mut compares: HashMap<&str, CompareFn> = HashMap::new();
            let child_is_unbroken_boolean = self.item_type(obj_child).ok()
                == Some(ItemType::Boolean)
                && !self.flags.contains(Flags::BREAK_BOOLEANS);
            compares.insert(
                "children",
                Box::new(move |base, current| {
                    if child_is_unbroken_boolean || base == current {
                        Value::Null
                    } else {
                        current.clone()
                    }
                }),
            );
            let delta_object = Self::delta(
                obj_child,
                comp_child,
                &["absoluteBoundingBox", "name", "id"],
                &compares,
            );

            if delta_object.is_empty() {
                continue; // no difference, nothing to override
            }

            let geometry_only = delta_object.len() <= 2
                && ((delta_object.len() == 2
                    && delta_object.contains_key("relativeTransform")
                    && delta_object.contains_key("size"))
                    || (delta_object.len() == 1
                        && (delta_object.contains_key("relativeTransform")
                            || delta_object.contains_key("size"))));
            if geometry_only {
                let delegate_id = delegate_name(id);
                if delta_object.contains_key("relativeTransform") {
                    if let Some(matrix) = self.make_matrix_expression(obj_child) {
                        let _ = write!(out, "{indent}{delegate_id}_transform: {matrix}\n");
                    }
                    let (x, y) = self.position(obj_child);
                    let _ = write!(out, "{indent}{delegate_id}_x: {}\n", x as i64);
                    let _ = write!(out, "{indent}{delegate_id}_y: {}\n", y as i64);
                }
                if let Some(size) = delta_object.get("size").and_then(Value::as_object) {
                    let _ = write!(out, "{indent}{delegate_id}_width: {}\n", get_f64(size, "x") as i64);
                    let _ = write!(
                        out,
                        "{indent}{delegate_id}_height: {}\n",
                        get_f64(size, "y") as i64
                    );
                }
                continue;
            }
            let key = keys[position];
            let _ = write!(out, "{indent}{}:{}", delegate_name(id), children[key]);
        }
        Ok(out)
    }

    fn parse_instance(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> Result<String> {
        let mut out = String::new();
        let is_instance = self.item_type(obj)? == ItemType::Instance;
        let component_id = if is_instance {
            get_str(obj, "componentId").to_owned()
        } else {
            get_str(obj, "id").to_owned()
        };
        self.component_ids.insert(component_id.clone());

        let Some(component) = self.components.get(&component_id) else {
            return Err(Error::MissingComponent {
                from: get_str(obj, "id").to_owned(),
                to: component_id,
            });
        };

        if !is_instance {
            out += &self.make_component_instance(component.name(), obj, indents);
        } else {
            let component_object = component
                .object()
                .as_object()
                .cloned()
                .unwrap_or_default();
            let mut instance_object =
                Self::delta(obj, &component_object, &["children"], &HashMap::new());

            // dummy markers so an inherited fill does not emit as transparent
            if obj.contains_key("fills") && !instance_object.contains_key("fills") {
                instance_object.insert("fills".to_owned(), Value::String(String::new()));
            }
            if obj.contains_key("strokes") && !instance_object.contains_key("strokes") {
                instance_object.insert("strokes".to_owned(), Value::String(String::new()));
            }

            let component_name = component.name().to_owned();
            out += &self.make_item(&component_name, &instance_object, indents);
            out += &self.make_vector(&instance_object, parent, indents)?;
            out += &self.make_instance_children(obj, &component_object, parent, indents)?;
        }
        let _ = write!(out, "{}}}\n", tabs(indents - 1));
        Ok(out)
    }

    // endregion: instances

    // region: children

    fn parse_children(&mut self, obj: &JsonMap, parent: &Parent, indents: usize) -> Result<String> {
        let mut out = String::new();
        for (_, bytes) in self.parse_children_items(obj, parent, indents)? {
            out += &bytes;
        }
        Ok(out)
    }

    /// Parses children in order, keyed by id. A child flagged `isMask`
    /// wraps its sibling subtree: the siblings render invisibly as the
    /// source, the mask child as the maskSource of an OpacityMask.
    fn parse_children_items(
        &mut self,
        obj: &JsonMap,
        parent: &Parent,
        indents: usize,
    ) -> Result<OrderMap<String, String>> {
        let mut children_items = OrderMap::new();
        let Some(children) = obj.get("children").and_then(Value::as_array) else {
            return Ok(children_items);
        };
        let child_parent = Parent {
            obj,
            parent: Some(parent),
        };
        let mut has_mask = false;
        let mut out = String::new();
        for child in children {
            let Some(child) = child.as_object() else {
                continue;
            };
            // the mask may not be first, but it masks the rest
            let is_mask = get_bool(child, "isMask");
            if is_mask {
                let indent = tabs(indents);
                let indent1 = tabs(indents + 1);
                let mask_source_id = format!("mask_{}", qml_id(get_str(child, "id")));
                let source_id = format!("source_{}", qml_id(get_str(child, "id")));
                let _ = write!(out, "{indent}Item {{\n");
                let _ = write!(out, "{indent}anchors.fill:parent\n");
                let _ = write!(out, "{indent}OpacityMask {{\n");
                let _ = write!(out, "{indent1}anchors.fill:parent\n");
                let _ = write!(out, "{indent1}source: {source_id}\n");
                let _ = write!(out, "{indent1}maskSource: {mask_source_id}\n");
                let _ = write!(out, "{indent}}}\n\n");
                let _ = write!(out, "{indent}Item {{\n");
                let _ = write!(out, "{indent1}id: {mask_source_id}\n");
                let _ = write!(out, "{indent1}anchors.fill:parent\n");
                out += &self.parse(child, &child_parent, indents + 2)?;
                let _ = write!(out, "{indent1}visible:false\n");
                let _ = write!(out, "{indent}}}\n\n");
                let _ = write!(out, "{indent}Item {{\n");
                let _ = write!(out, "{indent1}id: {source_id}\n");
                let _ = write!(out, "{indent1}anchors.fill:parent\n");
                let _ = write!(out, "{indent1}visible:false\n");
                has_mask = true;
            } else {
                let parsed = self.parse(
                    child,
                    &child_parent,
                    if has_mask { indents + 2 } else { indents + 1 },
                )?;
                children_items.insert(get_str(child, "id").to_owned(), parsed);
            }
        }
        if has_mask {
            for (_, bytes) in &children_items {
                out += bytes;
            }
            let _ = write!(out, "{}}}\n", tabs(indents + 1));
            let _ = write!(out, "{}}}\n", tabs(indents));
            children_items.clear();
            children_items.insert("maskedItem".to_owned(), out);
        }
        Ok(children_items)
    }

    // endregion: children
}

#[cfg(test)]
mod test;
