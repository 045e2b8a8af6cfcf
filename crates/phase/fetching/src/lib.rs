use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, unbounded};
use lib_asset_store::{AssetStore, Format};
use lib_figma_api::FigmaApi;
use lib_snapshot::Snapshot;
use lib_throttler::Throttler;
use log::{debug, warn};
use ordermap::OrderMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use xxhash_rust::xxh32::xxh32;

mod error;
mod images;
mod progress;
pub use error::*;
pub use images::{UNBOUNDED, postprocess};
pub use progress::Progress;

const RENDER_URL_ATTEMPTS: u32 = 3;

/// Notifications delivered to the driver's event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    DataChanged,
    UpdateCompleted(bool),
    ImagesPopulated,
    ImageReady(String),
    RenderingReady(String),
    NodeReady(String),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Rendering,
    Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Loading,
    Complete,
    Error,
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_token: String,
    pub project_token: String,
    /// Tick interval of the outbound request queue.
    pub throttle: Duration,
    /// Delay before a 429-failed closure is re-enqueued.
    pub rate_limit_delay: Duration,
    /// Override of the REST host; None means api.figma.com.
    pub base_url: Option<String>,
}

impl FetcherConfig {
    pub fn new(user_token: &str, project_token: &str) -> Self {
        Self {
            user_token: user_token.to_owned(),
            project_token: project_token.to_owned(),
            throttle: Throttler::DEFAULT_TICK,
            rate_limit_delay: Duration::from_secs(60),
            base_url: None,
        }
    }
}

/// The fetch/cache layer: materializes the root document, image fills,
/// renderings and per-node JSON through the Figma REST API, with
/// at-most-once retrieval per asset id, rate-limit retries and a checksum
/// gate on the root document. All operations return immediately; outcomes
/// arrive on the event channel.
pub struct Fetcher {
    shared: Arc<Shared>,
}

struct Shared {
    api: FigmaApi,
    user_token: String,
    project_token: Mutex<String>,
    throttler: Throttler,
    events: Sender<FetchEvent>,
    images: AssetStore,
    renderings: AssetStore,
    nodes: AssetStore,
    data: Mutex<Bytes>,
    checksum: AtomicU32,
    state: Mutex<ConnectionState>,
    downloading: AtomicBool,
    population_ongoing: AtomicBool,
    waiting_images: Mutex<Vec<(String, (u32, u32))>>,
    render_queue: Mutex<Vec<String>>,
    render_attempts: Mutex<std::collections::HashMap<String, u32>>,
    cancelled: AtomicBool,
    rate_limit_delay: Duration,
    progress: Progress,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> (Self, Receiver<FetchEvent>) {
        let (tx, rx) = unbounded();
        let api = match &config.base_url {
            Some(base) => FigmaApi::with_base_url(base.clone()),
            None => FigmaApi::default(),
        };
        let shared = Arc::new(Shared {
            api,
            user_token: config.user_token,
            project_token: Mutex::new(config.project_token),
            throttler: Throttler::new(config.throttle),
            events: tx,
            images: AssetStore::new(),
            renderings: AssetStore::new(),
            nodes: AssetStore::new(),
            data: Mutex::new(Bytes::new()),
            checksum: AtomicU32::new(0),
            state: Mutex::new(ConnectionState::Loading),
            downloading: AtomicBool::new(false),
            population_ongoing: AtomicBool::new(false),
            waiting_images: Mutex::new(Vec::new()),
            render_queue: Mutex::new(Vec::new()),
            render_attempts: Mutex::new(std::collections::HashMap::new()),
            cancelled: AtomicBool::new(false),
            rate_limit_delay: config.rate_limit_delay,
            progress: Progress::default(),
        });
        (Self { shared }, rx)
    }

    /// Root document bytes as of the last completed update or restore.
    pub fn data(&self) -> Bytes {
        self.shared.data.lock().unwrap().clone()
    }

    /// Downloads the root file and swaps it in when its checksum changed.
    /// A call while a download is in flight is a no-op reporting
    /// `UpdateCompleted(false)`.
    pub fn update(&self) {
        let shared = Arc::clone(&self.shared);
        if shared.downloading.swap(true, Ordering::SeqCst) {
            shared.emit(FetchEvent::UpdateCompleted(false));
            return;
        }
        shared.cancelled.store(false, Ordering::SeqCst);
        if *shared.state.lock().unwrap() == ConnectionState::Error {
            // A failed run leaves Error rows behind; the explicit retry
            // starts from a fully clean cache.
            shared.images.clean(false);
            shared.renderings.clean(false);
            shared.nodes.clean(false);
        }
        *shared.state.lock().unwrap() = ConnectionState::Loading;
        let update = Arc::clone(&shared);
        shared
            .throttler
            .enqueue(Box::new(move || Shared::do_update(&update)));
    }

    /// Emits the cached image if committed, otherwise ensures the catalog is
    /// populated and admits the first retrieval for this ref.
    pub fn get_image(&self, image_ref: &str, max_size: (u32, u32)) {
        debug_assert!(max_size.0 > 0 && max_size.1 > 0);
        debug_assert!(!image_ref.is_empty());
        Shared::get_image_inner(&self.shared, image_ref, max_size);
    }

    /// Requests a server-side rasterization; pending ids coalesce into one
    /// batched render call.
    pub fn get_rendering(&self, figma_id: &str) {
        Shared::get_rendering_inner(&self.shared, figma_id);
    }

    /// Fetches per-node JSON (geometry included).
    pub fn get_node(&self, figma_id: &str) {
        Shared::get_node_inner(&self.shared, figma_id);
    }

    /// Aborts queued work, resets non-Committed rows and drops the cached
    /// checksum. Idempotent, safe mid-parse.
    pub fn cancel(&self) {
        let shared = &self.shared;
        shared.cancelled.store(true, Ordering::SeqCst);
        shared.throttler.cancel();
        shared.images.clean(true);
        shared.renderings.clean(true);
        shared.nodes.clean(true);
        shared.checksum.store(0, Ordering::SeqCst);
        shared.downloading.store(false, Ordering::SeqCst);
        shared.population_ongoing.store(false, Ordering::SeqCst);
        shared.waiting_images.lock().unwrap().clear();
        shared.render_queue.lock().unwrap().clear();
        shared.progress.reset();
        shared.emit_progress();
    }

    /// The driver signals that the document view exists.
    pub fn document_created(&self) {
        *self.shared.state.lock().unwrap() = ConnectionState::Complete;
    }

    pub fn cached_image(&self, image_ref: &str) -> Option<(Bytes, Format)> {
        let bytes = self.shared.images.data(image_ref)?;
        Some((bytes, self.shared.images.format(image_ref)))
    }

    pub fn cached_rendering(&self, figma_id: &str) -> Option<(Bytes, Format)> {
        let bytes = self.shared.renderings.data(figma_id)?;
        Some((bytes, self.shared.renderings.format(figma_id)))
    }

    pub fn cached_node(&self, figma_id: &str) -> Option<Bytes> {
        self.shared.nodes.data(figma_id)
    }

    /// True when the asset failed permanently (until the next clean).
    pub fn is_failed(&self, kind: AssetKind, id: &str) -> bool {
        self.shared.store(kind).is_error(id)
    }

    /// Freezes the current state together with the driver's settings.
    pub fn snapshot(&self, flags: u32, imports: OrderMap<String, String>) -> Snapshot {
        let shared = &self.shared;
        Snapshot {
            project_token: shared.project_token.lock().unwrap().clone(),
            root: shared.data.lock().unwrap().clone(),
            checksum: shared.checksum.load(Ordering::SeqCst),
            flags,
            imports,
            images: shared.images.committed(),
            renderings: shared.renderings.committed(),
            nodes: shared.nodes.committed(),
        }
    }

    /// Thaws a snapshot, replacing tokens, root bytes and caches.
    pub fn restore(&self, snapshot: &Snapshot) {
        let shared = &self.shared;
        self.reset();
        *shared.project_token.lock().unwrap() = snapshot.project_token.clone();
        *shared.data.lock().unwrap() = snapshot.root.clone();
        shared.checksum.store(snapshot.checksum, Ordering::SeqCst);
        shared.images.restore(snapshot.images.clone());
        shared.renderings.restore(snapshot.renderings.clone());
        shared.nodes.restore(snapshot.nodes.clone());
    }

    /// Drops every cache and the root document (project change).
    pub fn reset(&self) {
        let shared = &self.shared;
        shared.throttler.cancel();
        shared.images.clear();
        shared.renderings.clear();
        shared.nodes.clear();
        *shared.data.lock().unwrap() = Bytes::new();
        shared.checksum.store(0, Ordering::SeqCst);
        *shared.state.lock().unwrap() = ConnectionState::Loading;
        shared.cancelled.store(false, Ordering::SeqCst);
        shared.downloading.store(false, Ordering::SeqCst);
        shared.population_ongoing.store(false, Ordering::SeqCst);
        shared.waiting_images.lock().unwrap().clear();
        shared.render_queue.lock().unwrap().clear();
        shared.render_attempts.lock().unwrap().clear();
        shared.progress.reset();
    }
}

impl Shared {
    fn emit(&self, event: FetchEvent) {
        let _ = self.events.send(event);
    }

    fn emit_progress(&self) {
        let (bytes_received, bytes_total, active_count) = self.progress.snapshot();
        self.emit(FetchEvent::Progress {
            bytes_received,
            bytes_total,
            active_count,
        });
    }

    fn store(&self, kind: AssetKind) -> &AssetStore {
        match kind {
            AssetKind::Image => &self.images,
            AssetKind::Rendering => &self.renderings,
            AssetKind::Node => &self.nodes,
        }
    }

    fn ready_event(kind: AssetKind, id: &str) -> FetchEvent {
        match kind {
            AssetKind::Image => FetchEvent::ImageReady(id.to_owned()),
            AssetKind::Rendering => FetchEvent::RenderingReady(id.to_owned()),
            AssetKind::Node => FetchEvent::NodeReady(id.to_owned()),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn project_token(&self) -> String {
        self.project_token.lock().unwrap().clone()
    }

    /// Remote or payload failure: report, mark the run failed, keep Error
    /// rows so the next update can decide on a full clean.
    fn fail(&self, message: String) {
        warn!(target: "Fetcher", "{message}");
        self.emit(FetchEvent::Error(message));
        *self.state.lock().unwrap() = ConnectionState::Error;
        self.throttler.cancel();
        self.images.clean(true);
        self.renderings.clean(true);
        self.nodes.clean(true);
        self.checksum.store(0, Ordering::SeqCst);
    }

    fn do_update(shared: &Arc<Shared>) {
        if shared.is_cancelled() {
            shared.downloading.store(false, Ordering::SeqCst);
            return;
        }
        shared.progress.begin();
        shared.emit_progress();
        let result = shared
            .api
            .get_file(&shared.user_token, &shared.project_token());
        match result {
            Ok(bytes) => {
                shared.progress.finish(bytes.len() as u64);
                shared.emit_progress();
                shared.reply_completed(bytes);
            }
            Err(lib_figma_api::Error::RateLimit) => {
                shared.progress.abort();
                shared.emit(FetchEvent::TooManyRequests);
                let retry = Arc::clone(shared);
                shared.throttler.enqueue_after(
                    shared.rate_limit_delay,
                    Box::new(move || Shared::do_update(&retry)),
                );
            }
            Err(e) => {
                shared.progress.abort();
                shared.downloading.store(false, Ordering::SeqCst);
                shared.fail(format!("Update failed: {e}"));
            }
        }
    }

    /// The checksum gate: identical bytes complete without a data swap.
    fn reply_completed(&self, bytes: Bytes) {
        let checksum = xxh32(&bytes, 0);
        let was_error = *self.state.lock().unwrap() == ConnectionState::Error;
        if checksum != self.checksum.load(Ordering::SeqCst) || was_error {
            *self.state.lock().unwrap() = ConnectionState::Loading;
            self.checksum.store(checksum, Ordering::SeqCst);
            *self.data.lock().unwrap() = bytes;
            self.emit(FetchEvent::DataChanged);
            self.emit(FetchEvent::UpdateCompleted(true));
        } else {
            self.emit(FetchEvent::UpdateCompleted(false));
        }
        self.downloading.store(false, Ordering::SeqCst);
    }

    fn get_image_inner(shared: &Arc<Shared>, image_ref: &str, max_size: (u32, u32)) {
        if !shared.images.contains(image_ref) {
            shared
                .waiting_images
                .lock()
                .unwrap()
                .push((image_ref.to_owned(), max_size));
            if !shared.population_ongoing.swap(true, Ordering::SeqCst) {
                let populate = Arc::clone(shared);
                shared
                    .throttler
                    .enqueue(Box::new(move || Shared::do_populate_images(&populate)));
            }
            return;
        }
        if !shared.images.is_empty(image_ref) {
            shared.emit(FetchEvent::ImageReady(image_ref.to_owned()));
            return;
        }
        if shared.images.is_error(image_ref) {
            shared.emit(FetchEvent::Error(format!(
                "Image cannot be retrieved \"{image_ref}\""
            )));
            return;
        }
        if !shared.images.set_pending(image_ref) {
            return; // already waiting for a fetch
        }
        let retrieve = Arc::clone(shared);
        let id = image_ref.to_owned();
        shared.throttler.enqueue(Box::new(move || {
            Shared::do_retrieve(&retrieve, AssetKind::Image, &id, max_size);
        }));
    }

    fn do_populate_images(shared: &Arc<Shared>) {
        if shared.is_cancelled() {
            shared.population_ongoing.store(false, Ordering::SeqCst);
            return;
        }
        shared.progress.begin();
        shared.emit_progress();
        let result = shared
            .api
            .get_image_catalog(&shared.user_token, &shared.project_token());
        match result {
            Ok(catalog) => {
                shared.progress.finish(0);
                shared.emit_progress();
                for (key, url) in &catalog.meta.images {
                    if !shared.images.contains(key) {
                        shared.images.insert_url(key, url);
                    }
                }
                shared.population_ongoing.store(false, Ordering::SeqCst);
                shared.emit(FetchEvent::ImagesPopulated);
                let waiting: Vec<_> = shared.waiting_images.lock().unwrap().drain(..).collect();
                for (image_ref, max_size) in waiting {
                    if shared.images.contains(&image_ref) {
                        Shared::get_image_inner(shared, &image_ref, max_size);
                    } else {
                        shared.emit(FetchEvent::Error(format!(
                            "Image not found \"{image_ref}\""
                        )));
                    }
                }
            }
            Err(lib_figma_api::Error::RateLimit) => {
                shared.progress.abort();
                shared.emit(FetchEvent::TooManyRequests);
                let retry = Arc::clone(shared);
                shared.throttler.enqueue_after(
                    shared.rate_limit_delay,
                    Box::new(move || Shared::do_populate_images(&retry)),
                );
            }
            Err(e) => {
                shared.progress.abort();
                shared.population_ongoing.store(false, Ordering::SeqCst);
                shared.fail(format!("Error on populate: {e}"));
            }
        }
    }

    fn get_rendering_inner(shared: &Arc<Shared>, figma_id: &str) {
        if figma_id.is_empty() {
            return;
        }
        if !shared.renderings.contains(figma_id) {
            {
                let mut queue = shared.render_queue.lock().unwrap();
                if !queue.iter().any(|queued| queued == figma_id) {
                    queue.push(figma_id.to_owned());
                }
            }
            let flush = Arc::clone(shared);
            shared
                .throttler
                .enqueue(Box::new(move || Shared::do_flush_renderings(&flush)));
            return;
        }
        if !shared.renderings.is_empty(figma_id) {
            shared.emit(FetchEvent::RenderingReady(figma_id.to_owned()));
            return;
        }
        if shared.renderings.is_error(figma_id) {
            shared.emit(FetchEvent::Error(format!(
                "Rendering cannot be retrieved \"{figma_id}\""
            )));
            return;
        }
        if !shared.renderings.set_pending(figma_id) {
            return; // already waiting for a fetch
        }
        let retrieve = Arc::clone(shared);
        let id = figma_id.to_owned();
        shared.throttler.enqueue(Box::new(move || {
            Shared::do_retrieve(&retrieve, AssetKind::Rendering, &id, UNBOUNDED);
        }));
    }

    /// One batched render call for every id queued so far. Ids arriving
    /// while the request runs stay queued; a follow-up flush drains them.
    fn do_flush_renderings(shared: &Arc<Shared>) {
        if shared.is_cancelled() {
            return;
        }
        let ids: Vec<String> = {
            let mut queue = shared.render_queue.lock().unwrap();
            queue.drain(..).collect()
        };
        if ids.is_empty() {
            return;
        }
        debug!(target: "Fetcher", "rendering batch: {}", ids.join(","));
        shared.progress.begin();
        shared.emit_progress();
        let result = shared
            .api
            .render(&shared.user_token, &shared.project_token(), &ids);
        match result {
            Ok(response) => {
                shared.progress.finish(0);
                shared.emit_progress();
                for id in &ids {
                    match response.images.get(id).cloned().flatten() {
                        Some(url) if !url.is_empty() => {
                            if !shared.renderings.contains(id) {
                                shared.renderings.insert_url(id, &url);
                            }
                            Shared::get_rendering_inner(shared, id);
                        }
                        _ => {
                            // Figma sometimes answers without a url; retry
                            // the id a bounded number of times.
                            let attempts = {
                                let mut map = shared.render_attempts.lock().unwrap();
                                let n = map.entry(id.clone()).or_insert(0);
                                *n += 1;
                                *n
                            };
                            if attempts < RENDER_URL_ATTEMPTS {
                                shared.render_queue.lock().unwrap().push(id.clone());
                            } else {
                                shared.emit(FetchEvent::Error(format!(
                                    "Invalid URL key:\"{id}\""
                                )));
                            }
                        }
                    }
                }
                if !shared.render_queue.lock().unwrap().is_empty() {
                    let flush = Arc::clone(shared);
                    shared
                        .throttler
                        .enqueue(Box::new(move || Shared::do_flush_renderings(&flush)));
                }
            }
            Err(lib_figma_api::Error::RateLimit) => {
                shared.progress.abort();
                {
                    let mut queue = shared.render_queue.lock().unwrap();
                    for id in ids {
                        if !queue.contains(&id) {
                            queue.push(id);
                        }
                    }
                }
                shared.emit(FetchEvent::TooManyRequests);
                let retry = Arc::clone(shared);
                shared.throttler.enqueue_after(
                    shared.rate_limit_delay,
                    Box::new(move || Shared::do_flush_renderings(&retry)),
                );
            }
            Err(e) => {
                shared.progress.abort();
                shared.fail(format!("Error on rendering: {e}"));
            }
        }
    }

    fn get_node_inner(shared: &Arc<Shared>, figma_id: &str) {
        if !shared.nodes.contains(figma_id) {
            let url = format!(
                "/v1/files/{project}/nodes?ids={figma_id}&geometry=paths",
                project = shared.project_token()
            );
            shared.nodes.insert_url(figma_id, &url);
        }
        if !shared.nodes.is_empty(figma_id) {
            shared.emit(FetchEvent::NodeReady(figma_id.to_owned()));
            return;
        }
        if shared.nodes.is_error(figma_id) {
            shared.emit(FetchEvent::Error(format!(
                "Node cannot be retrieved \"{figma_id}\""
            )));
            return;
        }
        if !shared.nodes.set_pending(figma_id) {
            return; // already on its way
        }
        let retrieve = Arc::clone(shared);
        let id = figma_id.to_owned();
        shared
            .throttler
            .enqueue(Box::new(move || Shared::do_retrieve_node(&retrieve, &id)));
    }

    fn do_retrieve_node(shared: &Arc<Shared>, figma_id: &str) {
        if shared.is_cancelled() {
            return;
        }
        shared.progress.begin();
        shared.emit_progress();
        let result = shared.api.get_nodes(
            &shared.user_token,
            &shared.project_token(),
            std::slice::from_ref(&figma_id.to_owned()),
        );
        match result {
            Ok(bytes) => {
                shared.progress.finish(bytes.len() as u64);
                shared.emit_progress();
                if shared.nodes.is_empty(figma_id)
                    && *shared.state.lock().unwrap() == ConnectionState::Loading
                {
                    shared.nodes.set_bytes(figma_id, bytes, Format::None);
                }
                if !shared.nodes.is_empty(figma_id) {
                    shared.emit(FetchEvent::NodeReady(figma_id.to_owned()));
                } else {
                    shared.emit(FetchEvent::Error(format!(
                        "Node cannot be retrieved \"{figma_id}\""
                    )));
                }
            }
            Err(lib_figma_api::Error::RateLimit) => {
                shared.progress.abort();
                shared.emit(FetchEvent::TooManyRequests);
                let retry = Arc::clone(shared);
                let id = figma_id.to_owned();
                shared.throttler.enqueue_after(
                    shared.rate_limit_delay,
                    Box::new(move || Shared::do_retrieve_node(&retry, &id)),
                );
            }
            Err(e) if e.is_timeout() => {
                shared.progress.abort();
                shared.nodes.set_error(figma_id);
                shared.emit(FetchEvent::Error(format!("Timeout on: {figma_id}")));
            }
            Err(e) => {
                shared.progress.abort();
                shared.nodes.set_error(figma_id);
                shared.fail(format!("Node error \"{figma_id}\": {e}"));
            }
        }
    }

    /// Downloads committed-url bytes for an image or rendering row.
    fn do_retrieve(shared: &Arc<Shared>, kind: AssetKind, id: &str, max_size: (u32, u32)) {
        if shared.is_cancelled() {
            return;
        }
        let store = shared.store(kind);
        let Some(url) = store.url(id) else {
            store.set_error(id);
            shared.emit(FetchEvent::Error(format!("Url not valid \"{id}\"")));
            return;
        };
        shared.progress.begin();
        shared.emit_progress();
        match shared.api.download(&shared.user_token, &url) {
            Ok(bytes) => {
                shared.progress.finish(bytes.len() as u64);
                shared.emit_progress();
                match postprocess(id, bytes, max_size) {
                    Ok((bytes, format)) => {
                        // Only the first completed fetch commits.
                        if store.is_empty(id)
                            && *shared.state.lock().unwrap() == ConnectionState::Loading
                        {
                            store.set_bytes(id, bytes, format);
                        }
                        if !store.is_empty(id) {
                            shared.emit(Shared::ready_event(kind, id));
                        } else {
                            shared.emit(FetchEvent::Error(format!(
                                "Image cannot be retrieved \"{id}\""
                            )));
                        }
                    }
                    Err(e) => {
                        store.set_error(id);
                        shared.emit(FetchEvent::Error(e.to_string()));
                    }
                }
            }
            Err(lib_figma_api::Error::RateLimit) => {
                shared.progress.abort();
                shared.emit(FetchEvent::TooManyRequests);
                let retry = Arc::clone(shared);
                let id = id.to_owned();
                shared.throttler.enqueue_after(
                    shared.rate_limit_delay,
                    Box::new(move || Shared::do_retrieve(&retry, kind, &id, max_size)),
                );
            }
            Err(e) if e.is_timeout() => {
                shared.progress.abort();
                store.set_error(id);
                shared.emit(FetchEvent::Error(format!("Timeout on: {id}")));
            }
            Err(e) => {
                shared.progress.abort();
                store.set_error(id);
                shared.fail(format!("Network error \"{id}\": {e}"));
            }
        }
    }
}
