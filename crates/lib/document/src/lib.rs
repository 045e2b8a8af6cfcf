use bytes::Bytes;
use log::debug;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::PathBuf;

/// How a document stores generated element sources.
///
/// A file-backed document materializes each element to `<dir>/<name>.qml`
/// on append and removes those files when dropped; its elements then carry
/// the file path instead of content. A data document keeps sources in
/// memory and additionally retains per-component source and raw JSON for
/// recall by name.
#[derive(Debug, Clone)]
pub enum DocumentKind {
    File { dir: PathBuf },
    Data,
}

#[derive(Debug)]
enum ElementData {
    Bytes(Bytes),
    File(PathBuf),
}

#[derive(Debug)]
pub struct Element {
    name: String,
    data: ElementData,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generated source for data elements; the backing file path for file
    /// elements (viewers load the file through it).
    pub fn data(&self) -> Bytes {
        match &self.data {
            ElementData::Bytes(bytes) => bytes.clone(),
            ElementData::File(path) => Bytes::from(path.display().to_string().into_bytes()),
        }
    }
}

#[derive(Debug)]
pub struct Canvas {
    name: String,
    color: String,
    current: usize,
    elements: Vec<Element>,
}

impl Canvas {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `"#aarrggbb"` background, quotes included.
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Element> {
        self.elements.get(self.current)
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }
}

#[derive(Debug)]
struct ComponentEntry {
    source: Bytes,
    json: Value,
}

/// Ordered canvases of generated elements plus the component relation the
/// external writers traverse.
#[derive(Debug)]
pub struct Document {
    name: String,
    kind: DocumentKind,
    current: usize,
    canvases: Vec<Canvas>,
    // element/component name -> component names it references
    component_uses: HashMap<String, HashSet<String>>,
    components: HashMap<String, ComponentEntry>,
}

impl Document {
    pub fn new(name: &str, kind: DocumentKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            current: 0,
            canvases: Vec::new(),
            component_uses: HashMap::new(),
            components: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DocumentKind {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty() || self.canvases.iter().all(Canvas::is_empty)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.canvases.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Canvas> {
        self.canvases.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut Canvas> {
        self.canvases.get_mut(self.current)
    }

    pub fn canvas(&self, index: usize) -> Option<&Canvas> {
        self.canvases.get(index)
    }

    pub fn canvases(&self) -> impl Iterator<Item = &Canvas> {
        self.canvases.iter()
    }

    pub fn add_canvas(&mut self, name: &str, color: &str) -> usize {
        self.canvases.push(Canvas {
            name: name.to_owned(),
            color: color.to_owned(),
            current: 0,
            elements: Vec::new(),
        });
        self.canvases.len() - 1
    }

    pub fn set_canvas_current(&mut self, canvas: usize, index: usize) -> bool {
        match self.canvases.get_mut(canvas) {
            Some(canvas) if index < canvas.elements.len() => {
                canvas.current = index;
                true
            }
            _ => false,
        }
    }

    /// Appends an element to the given canvas. File documents write the
    /// bytes out immediately and keep only the path.
    pub fn add_element(&mut self, canvas: usize, name: &str, data: Bytes) -> io::Result<()> {
        debug_assert!(!name.is_empty());
        debug_assert!(!data.is_empty());
        let element_data = match &self.kind {
            DocumentKind::File { dir } => {
                let path = dir.join(format!("{name}.qml"));
                if !path.exists() {
                    fs::write(&path, &data)?;
                }
                ElementData::File(path)
            }
            DocumentKind::Data => ElementData::Bytes(data),
        };
        let canvas = &mut self.canvases[canvas];
        canvas.elements.push(Element {
            name: name.to_owned(),
            data: element_data,
        });
        Ok(())
    }

    /// Records the components an element (or another component) refers to.
    pub fn set_components(&mut self, name: &str, components: Vec<String>) {
        debug_assert!(!name.is_empty());
        self.component_uses
            .entry(name.to_owned())
            .or_default()
            .extend(components);
    }

    /// Transitive closure of the `component uses` relation, sorted.
    pub fn components_of(&self, name: &str) -> Vec<String> {
        let mut all = HashSet::new();
        self.collect_components(&mut all, name);
        let mut list: Vec<String> = all.into_iter().collect();
        list.sort();
        list
    }

    fn collect_components(&self, found: &mut HashSet<String>, name: &str) {
        let Some(direct) = self.component_uses.get(name) else {
            return;
        };
        for component in direct {
            if found.insert(component.clone()) {
                self.collect_components(found, component);
            }
        }
    }

    pub fn contains_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn add_component(&mut self, name: &str, json: Value, source: Bytes) {
        debug_assert!(!name.is_empty());
        match &self.kind {
            DocumentKind::File { .. } => {
                // File documents only track presence; sources are written by
                // the save-out path together with elements.
                self.components.insert(
                    name.to_owned(),
                    ComponentEntry {
                        source,
                        json: Value::Null,
                    },
                );
                let _ = json;
            }
            DocumentKind::Data => {
                self.components
                    .insert(name.to_owned(), ComponentEntry { source, json });
            }
        }
    }

    pub fn component_source(&self, name: &str) -> Option<Bytes> {
        self.components.get(name).map(|entry| entry.source.clone())
    }

    pub fn component_json(&self, name: &str) -> Option<&Value> {
        self.components.get(name).map(|entry| &entry.json)
    }

    pub fn component_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if let DocumentKind::File { .. } = self.kind {
            for canvas in &self.canvases {
                for element in &canvas.elements {
                    if let ElementData::File(path) = &element.data {
                        debug!(target: "Document", "removing {}", path.display());
                        let _ = fs::remove_file(path);
                    }
                }
            }
        }
    }
}
