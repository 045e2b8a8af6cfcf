#![recursion_limit = "256"]

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, unbounded};
use lib_document::{Document, DocumentKind};
use log::{debug, info, warn};
use ordermap::OrderMap;
use phase_fetching::{AssetKind as FetchAssetKind, FetchEvent, Fetcher, FetcherConfig};
use phase_parsing::{
    AssetKind, Components, FigmaParser, Flags, NameRegistry, PLACEHOLDER, ParserData, canvases,
    components, document_name, make_file_name,
};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

mod error;
mod fonts;
pub use error::*;
pub use fonts::{FontCache, FontResolver};

/// Rounds of parse -> fetch-missing -> re-parse before giving up on
/// assets that never arrive.
const BUILD_ROUNDS: usize = 16;

/// Lifecycle notifications mirrored to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    DocumentCreated,
    SourceCodeChanged,
    ElementChanged,
    ComponentLoaded(usize, usize),
    BusyChanged(bool),
    TooManyRequests,
    Progress {
        bytes_received: u64,
        bytes_total: u64,
        active_count: usize,
    },
    Error(String),
    Warning(String),
    Info(String),
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub fetcher: FetcherConfig,
    pub flags: Flags,
    pub imports: OrderMap<String, String>,
    pub image_dimension_max: u32,
    pub font_folder: String,
    /// Where image files referenced by generated sources are written; None
    /// embeds every image as a data URI regardless of flags.
    pub qml_dir: Option<PathBuf>,
}

impl DriverConfig {
    pub fn new(user_token: &str, project_token: &str) -> Self {
        Self {
            fetcher: FetcherConfig::new(user_token, project_token),
            flags: Flags::empty(),
            imports: default_imports(),
            image_dimension_max: 1024,
            font_folder: String::new(),
            qml_dir: None,
        }
    }
}

/// The QtQuick modules every generated file imports unless overridden.
pub fn default_imports() -> OrderMap<String, String> {
    let mut imports = OrderMap::new();
    imports.insert("QtQuick".to_owned(), "2.15".to_owned());
    imports.insert("QtQuick.Shapes".to_owned(), "1.15".to_owned());
    imports.insert("QtGraphicalEffects".to_owned(), "1.15".to_owned());
    imports
}

/// Orchestrates fetch -> parse -> emit: owns the settings that shape
/// emission, rebuilds the document when they change, drives the fetcher
/// for assets the parser discovers lazily, and exposes canvas/element
/// cursors over the result.
pub struct Driver {
    fetcher: Fetcher,
    fetch_events: Receiver<FetchEvent>,
    events: Sender<DriverEvent>,
    flags: Flags,
    imports: OrderMap<String, String>,
    image_dimension_max: u32,
    font_folder: String,
    fonts: FontCache,
    filter: OrderMap<usize, HashSet<usize>>,
    qml_dir: Option<PathBuf>,
    placeholder: Option<Vec<u8>>,
    document: Option<Document>,
    busy: bool,
    last_error: Option<String>,
    asset_timeout: Duration,
}

impl Driver {
    pub fn new(config: DriverConfig) -> (Self, Receiver<DriverEvent>) {
        let (fetcher, fetch_events) = Fetcher::new(config.fetcher);
        let (tx, rx) = unbounded();
        (
            Self {
                fetcher,
                fetch_events,
                events: tx,
                flags: config.flags,
                imports: config.imports,
                image_dimension_max: config.image_dimension_max,
                font_folder: config.font_folder,
                fonts: FontCache::default(),
                filter: OrderMap::new(),
                qml_dir: config.qml_dir,
                placeholder: None,
                document: None,
                busy: false,
                last_error: None,
                asset_timeout: Duration::from_secs(120),
            },
            rx,
        )
    }

    // region: settings

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: Flags) {
        if self.flags != flags {
            self.flags = flags;
            self.settings_changed();
        }
    }

    pub fn imports(&self) -> &OrderMap<String, String> {
        &self.imports
    }

    pub fn set_imports(&mut self, imports: OrderMap<String, String>) {
        if self.imports != imports {
            self.imports = imports;
            self.settings_changed();
        }
    }

    pub fn set_image_dimension_max(&mut self, max: u32) {
        if self.image_dimension_max != max {
            self.image_dimension_max = max;
            self.settings_changed();
        }
    }

    pub fn font_folder(&self) -> &str {
        &self.font_folder
    }

    pub fn set_font_folder(&mut self, folder: &str) {
        self.font_folder = folder.to_owned();
    }

    pub fn set_font_resolver(&mut self, resolver: FontResolver) {
        self.fonts = FontCache::new(resolver);
        self.settings_changed();
    }

    pub fn set_font_mapping(&mut self, family: &str, mapped: &str) {
        self.fonts.set_mapping(family, mapped);
        self.settings_changed();
    }

    pub fn reset_font_mappings(&mut self) {
        self.fonts.reset_mappings();
        self.settings_changed();
    }

    /// Restricts parsing to the chosen elements per canvas. An empty map
    /// admits everything.
    pub fn set_filter(&mut self, filter: OrderMap<usize, HashSet<usize>>) {
        self.filter = filter;
        self.settings_changed();
    }

    /// Raster shown for renderings the backend never produced.
    pub fn set_placeholder(&mut self, bytes: Vec<u8>) {
        self.placeholder = Some(bytes);
    }

    pub fn set_asset_timeout(&mut self, timeout: Duration) {
        self.asset_timeout = timeout;
    }

    /// Any output-shaping setting change rebuilds the document from the
    /// cached root bytes.
    fn settings_changed(&mut self) {
        self.document = None;
        if !self.fetcher.data().is_empty() {
            if let Err(e) = self.build_document() {
                warn!(target: "Driver", "rebuild after settings change failed: {e}");
            }
        }
    }

    // endregion: settings

    // region: lifecycle

    /// Fetches the root document and rebuilds when its content changed.
    /// Returns whether new content arrived.
    pub fn update(&mut self) -> Result<bool> {
        self.fetcher.update();
        let deadline = Instant::now() + self.asset_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.fetch_events.recv_timeout(remaining) {
                Ok(FetchEvent::UpdateCompleted(changed)) => {
                    if changed {
                        self.build_document()?;
                    }
                    return Ok(changed);
                }
                Ok(FetchEvent::Error(message)) => {
                    self.emit(DriverEvent::Error(message.clone()));
                    return Err(Error::Fetch(message));
                }
                Ok(event) => self.forward(event),
                Err(_) => return Err(Error::Fetch("update timed out".to_owned())),
            }
        }
    }

    /// Re-walks the cached root bytes into a fresh document, fetching
    /// missing assets between rounds instead of blocking mid-parse.
    pub fn build_document(&mut self) -> Result<()> {
        let data = self.fetcher.data();
        if data.is_empty() {
            return Err(Error::NoDocument);
        }
        self.set_busy(true);
        let result = self.build_rounds(&data);
        self.set_busy(false);
        match result {
            Ok((document, loaded)) => {
                self.document = Some(document);
                self.fetcher.document_created();
                for (canvas, element) in loaded {
                    self.emit(DriverEvent::ComponentLoaded(canvas, element));
                }
                self.emit(DriverEvent::DocumentCreated);
                self.emit(DriverEvent::SourceCodeChanged);
                self.emit(DriverEvent::ElementChanged);
                Ok(())
            }
            Err(e) => {
                self.document = None;
                self.last_error = Some(e.to_string());
                self.emit(DriverEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    fn build_rounds(&mut self, data: &[u8]) -> Result<(Document, Vec<(usize, usize)>)> {
        let project: Value = serde_json::from_slice(data)?;
        let mut last_missing = Vec::new();
        for round in 0..BUILD_ROUNDS {
            let (outcome, missing) = self.try_build(&project)?;
            if missing.is_empty() {
                return Ok(outcome);
            }
            debug!(
                target: "Driver",
                "build round {round}: {} asset(s) missing",
                missing.len()
            );
            last_missing = missing;
            self.request_and_await(last_missing.clone());
        }
        Err(Error::AssetsUnavailable(
            last_missing.into_iter().map(|(_, id)| id).collect(),
        ))
    }

    /// One full parse pass over the project. Elements and components whose
    /// assets are not cached yet are recorded in the missing list and the
    /// pass completes without them.
    #[allow(clippy::type_complexity)]
    fn try_build(
        &mut self,
        project: &Value,
    ) -> Result<((Document, Vec<(usize, usize)>), Vec<(AssetKind, String)>)> {
        let mut names = NameRegistry::new();
        let mut missing: Vec<(AssetKind, String)> = Vec::new();
        let mut loaded: Vec<(usize, usize)> = Vec::new();

        let components_result = {
            let mut parser_data = DriverData {
                fetcher: &self.fetcher,
                fonts: &mut self.fonts,
                embed: self.flags.contains(Flags::EMBED_IMAGES),
                qml_dir: self.qml_dir.as_deref(),
                placeholder: self.placeholder.as_deref(),
                missing: &mut missing,
            };
            components(project, &mut parser_data, &mut names)
        };
        let catalog = match components_result {
            Ok(catalog) => catalog,
            Err(e) if e.is_retriable() => {
                let kind = match &self.qml_dir {
                    Some(dir) => DocumentKind::File { dir: dir.clone() },
                    None => DocumentKind::Data,
                };
                let empty = Document::new(&document_name(project), kind);
                return Ok(((empty, loaded), missing));
            }
            Err(e) => return Err(e.into()),
        };

        let kind = match &self.qml_dir {
            Some(dir) => DocumentKind::File { dir: dir.clone() },
            None => DocumentKind::Data,
        };
        let mut document = Document::new(&document_name(project), kind);
        let header = self.document_header();
        let mut referenced: Vec<String> = Vec::new();

        for (canvas_index, canvas) in canvases(project).iter().enumerate() {
            let canvas_slot = document.add_canvas(canvas.name(), canvas.color());
            for (element_index, element_value) in canvas.elements().iter().enumerate() {
                if !self.filter_allows(canvas_index, element_index) {
                    continue;
                }
                let Some(element_obj) = element_value.as_object() else {
                    continue;
                };
                let parsed = {
                    let mut parser_data = DriverData {
                        fetcher: &self.fetcher,
                        fonts: &mut self.fonts,
                        embed: self.flags.contains(Flags::EMBED_IMAGES),
                        qml_dir: self.qml_dir.as_deref(),
                        placeholder: self.placeholder.as_deref(),
                        missing: &mut missing,
                    };
                    FigmaParser::element(
                        element_obj,
                        self.flags,
                        &mut parser_data,
                        &catalog,
                        &mut names,
                    )
                };
                match parsed {
                    Ok(element) => {
                        if element.data.is_empty() {
                            continue;
                        }
                        let mut bytes = header.clone().into_bytes();
                        bytes.extend_from_slice(&element.data);
                        document.add_element(canvas_slot, &element.name, Bytes::from(bytes))?;
                        document.set_components(
                            &element.name,
                            component_names(&catalog, &element.components),
                        );
                        referenced.extend(element.components);
                        loaded.push((canvas_index, element_index));
                    }
                    Err(e) if e.is_retriable() => {
                        // recorded in the missing list; a later round
                        // re-parses this element
                    }
                    Err(e) => {
                        self.last_error = Some(e.to_string());
                        self.emit(DriverEvent::Warning(format!(
                            "Skipping element '{}': {e}",
                            element_obj
                                .get("name")
                                .and_then(Value::as_str)
                                .unwrap_or("?")
                        )));
                    }
                }
            }
        }
        // component definitions parse after every element so the name
        // registry hands elements the same names on every round
        self.add_component_sources(
            &mut document,
            &catalog,
            referenced,
            &header,
            &mut names,
            &mut missing,
        )?;
        Ok(((document, loaded), missing))
    }

    /// Generates component definition sources for every referenced
    /// component, transitively.
    fn add_component_sources(
        &mut self,
        document: &mut Document,
        catalog: &Components,
        referenced: Vec<String>,
        header: &str,
        names: &mut NameRegistry,
        missing: &mut Vec<(AssetKind, String)>,
    ) -> Result<()> {
        let mut queue = referenced;
        while let Some(component_id) = queue.pop() {
            let Some(component) = catalog.get(&component_id) else {
                continue;
            };
            if document.contains_component(component.name()) {
                continue;
            }
            let Some(component_obj) = component.object().as_object() else {
                continue;
            };
            let parsed = {
                let mut parser_data = DriverData {
                    fetcher: &self.fetcher,
                    fonts: &mut self.fonts,
                    embed: self.flags.contains(Flags::EMBED_IMAGES),
                    qml_dir: self.qml_dir.as_deref(),
                    placeholder: self.placeholder.as_deref(),
                    missing: &mut *missing,
                };
                FigmaParser::component(
                    component_obj,
                    self.flags,
                    &mut parser_data,
                    catalog,
                    names,
                )
            };
            match parsed {
                Ok(element) => {
                    let mut bytes = header.to_owned().into_bytes();
                    bytes.extend_from_slice(&element.data);
                    document.add_component(
                        component.name(),
                        component.object().clone(),
                        Bytes::from(bytes),
                    );
                    document.set_components(
                        component.name(),
                        component_names(catalog, &element.components),
                    );
                    queue.extend(element.components);
                }
                Err(e) if e.is_retriable() => {}
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    self.emit(DriverEvent::Warning(format!(
                        "Skipping component '{}': {e}",
                        component.name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Requests every missing asset and drains fetch events until each one
    /// is either committed or conclusively failed.
    fn request_and_await(&mut self, missing: Vec<(AssetKind, String)>) {
        let mut pending: HashSet<(FetchAssetKind, String)> = HashSet::new();
        for (kind, id) in missing {
            let kind = fetch_kind(kind);
            match kind {
                FetchAssetKind::Image => self
                    .fetcher
                    .get_image(&id, (self.image_dimension_max, self.image_dimension_max)),
                FetchAssetKind::Rendering => self.fetcher.get_rendering(&id),
                FetchAssetKind::Node => self.fetcher.get_node(&id),
            }
            pending.insert((kind, id));
        }
        let deadline = Instant::now() + self.asset_timeout;
        while !pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(target: "Driver", "timed out waiting for {} asset(s)", pending.len());
                return;
            }
            match self.fetch_events.recv_timeout(remaining) {
                Ok(event) => {
                    match &event {
                        FetchEvent::ImageReady(id) => {
                            pending.remove(&(FetchAssetKind::Image, id.clone()));
                        }
                        FetchEvent::RenderingReady(id) => {
                            pending.remove(&(FetchAssetKind::Rendering, id.clone()));
                        }
                        FetchEvent::NodeReady(id) => {
                            pending.remove(&(FetchAssetKind::Node, id.clone()));
                        }
                        FetchEvent::Error(_) => {
                            pending.retain(|(kind, id)| !self.fetcher.is_failed(*kind, id));
                        }
                        _ => {}
                    }
                    self.forward(event);
                }
                Err(_) => return,
            }
        }
    }

    fn forward(&self, event: FetchEvent) {
        match event {
            FetchEvent::TooManyRequests => self.emit(DriverEvent::TooManyRequests),
            FetchEvent::Progress {
                bytes_received,
                bytes_total,
                active_count,
            } => self.emit(DriverEvent::Progress {
                bytes_received,
                bytes_total,
                active_count,
            }),
            FetchEvent::Error(message) => self.emit(DriverEvent::Error(message)),
            FetchEvent::Warning(message) => self.emit(DriverEvent::Warning(message)),
            FetchEvent::Info(message) => self.emit(DriverEvent::Info(message)),
            _ => {}
        }
    }

    pub fn cancel(&mut self) {
        self.fetcher.cancel();
    }

    // endregion: lifecycle

    // region: snapshots

    pub fn store(&self, path: &Path) -> Result<()> {
        let snapshot = self
            .fetcher
            .snapshot(self.flags.bits(), self.imports.clone());
        let mut file = fs::File::create(path)?;
        lib_snapshot::write(&snapshot, &mut file)?;
        info!(target: "Driver", "stored snapshot to {}", path.display());
        Ok(())
    }

    /// Thaws a snapshot and rebuilds. A bad or truncated stream leaves the
    /// driver empty.
    pub fn restore(&mut self, path: &Path) -> Result<()> {
        self.document = None;
        let snapshot = lib_snapshot::read(&mut fs::File::open(path)?)?;
        self.flags = Flags::from_bits(snapshot.flags);
        self.imports = snapshot.imports.clone();
        self.fetcher.restore(&snapshot);
        info!(target: "Driver", "restored snapshot from {}", path.display());
        self.build_document()
    }

    // endregion: snapshots

    // region: views

    pub fn is_valid(&self) -> bool {
        self.document.as_ref().is_some_and(|doc| !doc.is_empty())
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn document_name(&self) -> String {
        self.document
            .as_ref()
            .map(|doc| doc.name().to_owned())
            .unwrap_or_default()
    }

    pub fn canvas_count(&self) -> usize {
        self.document.as_ref().map(Document::len).unwrap_or(0)
    }

    pub fn element_count(&self) -> usize {
        self.document
            .as_ref()
            .and_then(Document::current)
            .map(lib_document::Canvas::len)
            .unwrap_or(0)
    }

    pub fn current_canvas(&self) -> usize {
        self.document
            .as_ref()
            .map(Document::current_index)
            .unwrap_or(0)
    }

    pub fn current_element(&self) -> usize {
        self.document
            .as_ref()
            .and_then(Document::current)
            .map(lib_document::Canvas::current_index)
            .unwrap_or(0)
    }

    pub fn set_current_canvas(&mut self, index: usize) -> bool {
        let changed = self
            .document
            .as_mut()
            .map(|doc| doc.set_current(index))
            .unwrap_or(false);
        if changed {
            self.emit(DriverEvent::ElementChanged);
            self.emit(DriverEvent::SourceCodeChanged);
        }
        changed
    }

    pub fn set_current_element(&mut self, index: usize) -> bool {
        let Some(document) = self.document.as_mut() else {
            return false;
        };
        let canvas = document.current_index();
        let changed = document.set_canvas_current(canvas, index);
        if changed {
            self.emit(DriverEvent::ElementChanged);
            self.emit(DriverEvent::SourceCodeChanged);
        }
        changed
    }

    pub fn canvas_name(&self) -> String {
        self.document
            .as_ref()
            .and_then(Document::current)
            .map(|canvas| canvas.name().to_owned())
            .unwrap_or_default()
    }

    pub fn element_name(&self) -> String {
        self.document
            .as_ref()
            .and_then(Document::current)
            .and_then(lib_document::Canvas::current)
            .map(|element| element.name().to_owned())
            .unwrap_or_default()
    }

    /// Generated source of the current element.
    pub fn source_code(&self) -> Bytes {
        self.document
            .as_ref()
            .and_then(Document::current)
            .and_then(lib_document::Canvas::current)
            .map(lib_document::Element::data)
            .unwrap_or_default()
    }

    /// Component names the current element depends on, transitively.
    pub fn components(&self) -> Vec<String> {
        let name = self.element_name();
        self.document
            .as_ref()
            .map(|doc| doc.components_of(&name))
            .unwrap_or_default()
    }

    pub fn component_source_code(&self, name: &str) -> Option<Bytes> {
        self.document.as_ref()?.component_source(name)
    }

    pub fn component_data(&self, name: &str) -> Option<String> {
        let json = self.document.as_ref()?.component_json(name)?;
        Some(json.to_string())
    }

    /// Writes every element and its referenced components into `dir`.
    pub fn save_all_qml(&self, dir: &Path) -> Result<()> {
        let document = self.document.as_ref().ok_or(Error::NoDocument)?;
        fs::create_dir_all(dir)?;
        let mut written = HashSet::new();
        for canvas in document.canvases() {
            for element in canvas.elements() {
                fs::write(dir.join(format!("{}.qml", element.name())), element.data())?;
                for component in document.components_of(element.name()) {
                    if !written.insert(component.clone()) {
                        continue;
                    }
                    if let Some(source) = document.component_source(&component) {
                        fs::write(dir.join(format!("{component}.qml")), source)?;
                    }
                }
            }
        }
        info!(target: "Driver", "saved QML tree to {}", dir.display());
        Ok(())
    }

    // endregion: views

    fn document_header(&self) -> String {
        let mut header = String::new();
        for (module, version) in &self.imports {
            header.push_str(&format!("import {module} {version}\n"));
        }
        header.push('\n');
        header
    }

    fn filter_allows(&self, canvas: usize, element: usize) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        self.filter
            .get(&canvas)
            .is_some_and(|elements| elements.contains(&element))
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            self.emit(DriverEvent::BusyChanged(busy));
        }
    }

    fn emit(&self, event: DriverEvent) {
        let _ = self.events.send(event);
    }
}

fn fetch_kind(kind: AssetKind) -> FetchAssetKind {
    match kind {
        AssetKind::Image => FetchAssetKind::Image,
        AssetKind::Rendering => FetchAssetKind::Rendering,
        AssetKind::Node => FetchAssetKind::Node,
    }
}

fn component_names(catalog: &Components, ids: &[String]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| catalog.get(id).map(|component| component.name().to_owned()))
        .collect()
}

/// The parser's host surface: synchronous cache queries against the
/// fetcher, recording misses for the driver's retry rounds, plus font
/// resolution and image source-text policy.
struct DriverData<'a> {
    fetcher: &'a Fetcher,
    fonts: &'a mut FontCache,
    embed: bool,
    qml_dir: Option<&'a Path>,
    placeholder: Option<&'a [u8]>,
    missing: &'a mut Vec<(AssetKind, String)>,
}

impl DriverData<'_> {
    fn source_text(
        &self,
        id: &str,
        bytes: &[u8],
        format: lib_asset_store::Format,
    ) -> Vec<u8> {
        let (mime, ext) = match format {
            lib_asset_store::Format::Jpeg => ("jpeg", "jpg"),
            _ => ("png", "png"),
        };
        if !self.embed {
            if let Some(dir) = self.qml_dir {
                let images = dir.join("images");
                let file_name = format!("{}.{ext}", make_file_name(id));
                let path = images.join(&file_name);
                if !path.exists() {
                    let write_result = fs::create_dir_all(&images)
                        .and_then(|_| fs::write(&path, bytes));
                    if let Err(e) = write_result {
                        warn!(target: "Driver", "cannot write {}: {e}", path.display());
                    }
                }
                return format!("images/{file_name}").into_bytes();
            }
        }
        format!("data:image/{mime};base64,{}", BASE64.encode(bytes)).into_bytes()
    }
}

impl ParserData for DriverData<'_> {
    fn image_data(&mut self, id: &str, is_rendering: bool) -> Option<Vec<u8>> {
        if is_rendering && id == PLACEHOLDER {
            return Some(match self.placeholder {
                Some(bytes) => {
                    format!("data:image/png;base64,{}", BASE64.encode(bytes)).into_bytes()
                }
                None => Vec::new(),
            });
        }
        let kind = if is_rendering {
            FetchAssetKind::Rendering
        } else {
            FetchAssetKind::Image
        };
        let cached = if is_rendering {
            self.fetcher.cached_rendering(id)
        } else {
            self.fetcher.cached_image(id)
        };
        match cached {
            Some((bytes, format)) => Some(self.source_text(id, &bytes, format)),
            None if self.fetcher.is_failed(kind, id) => Some(Vec::new()),
            None => {
                let kind = if is_rendering {
                    AssetKind::Rendering
                } else {
                    AssetKind::Image
                };
                self.missing.push((kind, id.to_owned()));
                None
            }
        }
    }

    fn node_data(&mut self, id: &str) -> Option<Vec<u8>> {
        match self.fetcher.cached_node(id) {
            Some(bytes) => Some(bytes.to_vec()),
            None if self.fetcher.is_failed(FetchAssetKind::Node, id) => Some(Vec::new()),
            None => {
                self.missing.push((AssetKind::Node, id.to_owned()));
                None
            }
        }
    }

    fn font_info(&mut self, family: &str) -> String {
        self.fonts.resolve(family)
    }
}

#[cfg(test)]
mod test;
