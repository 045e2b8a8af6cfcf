use crate::{AssetKind, Error, NameRegistry, ParserData, Result};
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A reusable node referenced by instances through `componentId`.
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    id: String,
    key: String,
    description: String,
    object: Value,
}

impl Component {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The component's original node JSON, used for instance deltas.
    pub fn object(&self) -> &Value {
        &self.object
    }
}

pub type Components = HashMap<String, Component>;

/// Collects every node of the given `type` in the subtree, keyed by id.
pub fn objects_by_type(obj: &Value, node_type: &str) -> HashMap<String, Value> {
    let mut objects = HashMap::new();
    if obj.get("type").and_then(Value::as_str) == Some(node_type) {
        if let Some(id) = obj.get("id").and_then(Value::as_str) {
            objects.insert(id.to_owned(), obj.clone());
        }
    } else if let Some(children) = obj.get("children").and_then(Value::as_array) {
        for child in children {
            objects.extend(objects_by_type(child, node_type));
        }
    }
    objects
}

/// Builds the component catalog for a project document.
///
/// Components referenced in the root's `components` map but not present
/// inline are fetched through `node_data`; a missing cache entry aborts
/// with a retriable error, an answer that still lacks the id is fatal.
/// Display names are made unique through the shared registry.
pub fn components(
    project: &Value,
    data: &mut dyn ParserData,
    names: &mut NameRegistry,
) -> Result<Components> {
    let mut map = Components::new();
    let document = project.get("document").cloned().unwrap_or(Value::Null);
    let mut component_objects = objects_by_type(&document, "COMPONENT");
    let empty = Map::new();
    let catalog = project
        .get("components")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    for (key, entry) in catalog {
        if !component_objects.contains_key(key) {
            let response = data.node_data(key).ok_or(Error::NotReady {
                id: key.clone(),
                kind: AssetKind::Node,
            })?;
            if response.is_empty() {
                return Err(Error::MissingComponent {
                    from: "document".to_owned(),
                    to: key.clone(),
                });
            }
            let obj: Value = serde_json::from_slice(&response)
                .map_err(|_| Error::InvalidComponent(key.clone()))?;
            let node_document = obj
                .get("nodes")
                .and_then(|nodes| nodes.get(key))
                .and_then(|node| node.get("document"))
                .cloned()
                .unwrap_or(Value::Null);
            let received = objects_by_type(&node_document, "COMPONENT");
            let Some(found) = received.get(key) else {
                return Err(Error::UnrecognizedComponent(key.clone()));
            };
            debug!(target: "Parser", "component '{key}' resolved from node fetch");
            component_objects.insert(key.clone(), found.clone());
        }

        let name = entry.get("name").and_then(Value::as_str).unwrap_or("");
        let unique_name = names.unique_name(name);
        map.insert(
            key.clone(),
            Component {
                name: unique_name,
                id: key.clone(),
                key: entry
                    .get("key")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_owned(),
                description: entry
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_owned(),
                object: component_objects.remove(key).unwrap_or(Value::Null),
            },
        );
    }
    Ok(map)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod test {
    use super::*;
    use serde_json::json;

    struct StubData {
        nodes: HashMap<String, Vec<u8>>,
    }

    impl ParserData for StubData {
        fn image_data(&mut self, _id: &str, _is_rendering: bool) -> Option<Vec<u8>> {
            None
        }
        fn node_data(&mut self, id: &str) -> Option<Vec<u8>> {
            self.nodes.get(id).cloned()
        }
        fn font_info(&mut self, family: &str) -> String {
            family.to_owned()
        }
    }

    fn project_with_inline_component() -> Value {
        json!({
            "document": {
                "type": "DOCUMENT",
                "children": [{
                    "id": "0:1", "type": "CANVAS", "name": "Page 1",
                    "children": [{
                        "id": "2:1", "type": "COMPONENT", "name": "Button",
                        "children": []
                    }]
                }]
            },
            "components": {
                "2:1": {"name": "Button", "key": "k1", "description": "push it"}
            }
        })
    }

    #[test]
    fn inline_component__EXPECT__catalog_entry_with_unique_name() {
        // Given
        let project = project_with_inline_component();
        let mut data = StubData { nodes: HashMap::new() };
        let mut names = NameRegistry::new();

        // When
        let map = components(&project, &mut data, &mut names).unwrap();

        // Then
        let component = map.get("2:1").unwrap();
        assert_eq!("Button_figma", component.name());
        assert_eq!("k1", component.key());
        assert_eq!("push it", component.description());
        assert_eq!(
            Some("COMPONENT"),
            component.object().get("type").and_then(Value::as_str)
        );
    }

    #[test]
    fn external_component__EXPECT__resolved_through_node_fetch() {
        // Given
        let mut project = project_with_inline_component();
        project["components"]["9:9"] = json!({"name": "Remote", "key": "k2", "description": ""});
        let node_payload = json!({
            "nodes": {"9:9": {"document": {
                "id": "9:9", "type": "COMPONENT", "name": "Remote", "children": []
            }}}
        });
        let mut data = StubData {
            nodes: HashMap::from([(
                "9:9".to_owned(),
                serde_json::to_vec(&node_payload).unwrap(),
            )]),
        };
        let mut names = NameRegistry::new();

        // When
        let map = components(&project, &mut data, &mut names).unwrap();

        // Then
        assert_eq!("Remote_figma", map.get("9:9").unwrap().name());
    }

    #[test]
    fn uncached_external_component__EXPECT__retriable_not_ready() {
        // Given
        let mut project = project_with_inline_component();
        project["components"]["9:9"] = json!({"name": "Remote"});
        let mut data = StubData { nodes: HashMap::new() };
        let mut names = NameRegistry::new();

        // When
        let result = components(&project, &mut data, &mut names);

        // Then
        match result {
            Err(Error::NotReady { id, kind }) => {
                assert_eq!("9:9", id);
                assert_eq!(AssetKind::Node, kind);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn node_fetch_without_the_component__EXPECT__fatal_unrecognized() {
        // Given
        let mut project = project_with_inline_component();
        project["components"]["9:9"] = json!({"name": "Remote"});
        let payload = json!({"nodes": {"9:9": {"document": {"id": "9:9", "type": "FRAME"}}}});
        let mut data = StubData {
            nodes: HashMap::from([("9:9".to_owned(), serde_json::to_vec(&payload).unwrap())]),
        };
        let mut names = NameRegistry::new();

        // When
        let result = components(&project, &mut data, &mut names);

        // Then
        assert!(matches!(result, Err(Error::UnrecognizedComponent(id)) if id == "9:9"));
    }

    #[test]
    fn duplicate_component_names__EXPECT__counter_disambiguates() {
        // Given
        let project = json!({
            "document": {
                "type": "DOCUMENT",
                "children": [
                    {"id": "2:1", "type": "COMPONENT", "name": "Button", "children": []},
                    {"id": "2:2", "type": "COMPONENT", "name": "Button", "children": []}
                ]
            },
            "components": {
                "2:1": {"name": "Button"},
                "2:2": {"name": "Button"}
            }
        });
        let mut data = StubData { nodes: HashMap::new() };
        let mut names = NameRegistry::new();

        // When
        let map = components(&project, &mut data, &mut names).unwrap();

        // Then: serde_json maps iterate in key order, so assignment is stable
        assert_eq!("Button_figma", map.get("2:1").unwrap().name());
        assert_eq!("Button1_figma", map.get("2:2").unwrap().name());
    }
}
