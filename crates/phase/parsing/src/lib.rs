use serde_json::Value;

mod components;
mod data;
mod error;
mod names;
mod parser;

pub use components::{Component, Components, components, objects_by_type};
pub use data::{Flags, ParserData};
pub use error::{AssetKind, Error, Result};
pub use names::{FIGMA_SUFFIX, NameRegistry, make_file_name};
pub use parser::{Element, FigmaParser, PLACEHOLDER};

/// A Figma page: name, background color, and its top-level nodes (each of
/// which becomes one emitted element).
#[derive(Debug, Clone)]
pub struct Canvas {
    name: String,
    id: String,
    color: String,
    elements: Vec<Value>,
}

impl Canvas {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `"#aarrggbb"` background, quotes included.
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }
}

/// The project's display name.
pub fn document_name(project: &Value) -> String {
    project
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_owned()
}

/// Splits the project document into its canvases.
pub fn canvases(project: &Value) -> Vec<Canvas> {
    let mut array = Vec::new();
    let Some(pages) = project
        .get("document")
        .and_then(|document| document.get("children"))
        .and_then(Value::as_array)
    else {
        return array;
    };
    for canvas in pages {
        let children = canvas
            .get("children")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let color = canvas
            .get("backgroundColor")
            .and_then(Value::as_object)
            .map(|color| {
                let component = |key: &str| {
                    color.get(key).and_then(Value::as_f64).unwrap_or(0.0)
                };
                format!(
                    "\"#{:02x}{:02x}{:02x}{:02x}\"",
                    (component("a") * 255.0).round() as u32,
                    (component("r") * 255.0).round() as u32,
                    (component("g") * 255.0).round() as u32,
                    (component("b") * 255.0).round() as u32
                )
            })
            .unwrap_or_else(|| "\"#00000000\"".to_owned());
        array.push(Canvas {
            name: canvas
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_owned(),
            id: canvas
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_owned(),
            color,
            elements: children,
        });
    }
    array
}

#[cfg(test)]
#[allow(non_snake_case)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_with_two_pages__EXPECT__canvases_in_document_order() {
        // Given
        let project = json!({
            "name": "My design",
            "document": {"children": [
                {"id": "0:1", "name": "Page 1",
                 "backgroundColor": {"r": 1.0, "g": 1.0, "b": 1.0, "a": 1.0},
                 "children": [{"id": "1:1", "type": "FRAME", "name": "Frame"}]},
                {"id": "0:2", "name": "Page 2",
                 "backgroundColor": {"r": 0.0, "g": 0.0, "b": 0.0, "a": 1.0},
                 "children": []}
            ]}
        });

        // When
        let canvases = canvases(&project);

        // Then
        assert_eq!("My design", document_name(&project));
        assert_eq!(2, canvases.len());
        assert_eq!("Page 1", canvases[0].name());
        assert_eq!("\"#ffffffff\"", canvases[0].color());
        assert_eq!(1, canvases[0].elements().len());
        assert_eq!("\"#ff000000\"", canvases[1].color());
        assert!(canvases[1].elements().is_empty());
    }

    #[test]
    fn empty_project__EXPECT__no_canvases() {
        // Given / When / Then
        assert!(canvases(&json!({})).is_empty());
    }
}
