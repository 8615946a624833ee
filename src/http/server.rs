//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all resource handler
//! - Wire up middleware (tracing, timeout, request ID, body limit)
//! - Compile the route table and access schema at startup (failures fatal)
//! - Dispatch requests: parse path → match route → resolve access →
//!   run before-hooks → storage operation → run after-hooks → respond
//!
//! # Design Decisions
//! - Route table and access schema are immutable after startup and shared
//!   read-only across requests
//! - A direct path parse failure is a 400; a route miss is a 404; a
//!   permission miss is a 403; a before-hook failure blocks the operation
//! - After-hooks run once the response state is committed; their failures
//!   are logged, never surfaced

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::access::{resolve, AccessSchema, EffectiveAccess, SchemaError};
use crate::config::ServerConfig;
use crate::hooks::{self, HookContext, HookRegistry, HookStage, Linker, RequestContext};
use crate::http::request::request_id_layers;
use crate::lifecycle::Shutdown;
use crate::path::{parse, NodeType, ParsedPath, PathNode};
use crate::routing::{default_routes, RouteError, RouteTable};
use crate::storage::Storage;

/// Startup failures: a server with a broken route table or access schema
/// must not come up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub access: Arc<AccessSchema>,
    pub hooks: Arc<HookRegistry>,
    pub store: Arc<dyn Storage>,
    pub linker: Option<Arc<dyn Linker>>,
    pub max_body_bytes: usize,
}

/// HTTP server for the resource tree.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Compile routes and access schema and assemble the router. Hooks and
    /// storage come from the host; this layer never discovers them.
    pub fn new(
        config: ServerConfig,
        hooks: HookRegistry,
        store: Arc<dyn Storage>,
        linker: Option<Arc<dyn Linker>>,
    ) -> Result<Self, StartupError> {
        let route_configs = if config.routes.is_empty() {
            default_routes()
        } else {
            config.routes.clone()
        };
        let routes = Arc::new(RouteTable::from_config(&route_configs)?);
        let access = Arc::new(AccessSchema::from_config(&config.access)?);

        let state = AppState {
            routes,
            access,
            hooks: Arc::new(hooks),
            store,
            linker,
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let (set_request_id, propagate_request_id) = request_id_layers();
        Router::new()
            .route("/{*path}", any(resource_handler))
            .route("/", any(resource_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(propagate_request_id)
            .layer(set_request_id)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(GlobalConcurrencyLimitLayer::new(
                config.listener.max_connections,
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shutdown = Shutdown::new();
        shutdown.listen_for_signals();
        let mut rx = shutdown.subscribe();

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
                tracing::info!("shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// One storage-level operation resolved from (method, target node type).
#[derive(Debug)]
enum Operation {
    ListCollection,
    CreateDocument,
    GetDocument,
    ReplaceDocument,
    PatchDocument,
    DeleteDocument,
    ReadSubPath,
    InvokeMethod,
}

impl Operation {
    fn classify(method: &Method, target: &PathNode) -> Option<Operation> {
        match (method.as_str(), target.node_type()) {
            ("GET", NodeType::Collection) => Some(Operation::ListCollection),
            ("GET", NodeType::Id | NodeType::SlugId) => Some(Operation::GetDocument),
            ("GET", NodeType::Offset | NodeType::Range) => Some(Operation::ListCollection),
            ("GET", NodeType::Property | NodeType::LinkProperty) => Some(Operation::ReadSubPath),
            ("POST", NodeType::Collection) => Some(Operation::CreateDocument),
            ("POST", NodeType::Method) => Some(Operation::InvokeMethod),
            ("PUT", NodeType::Id | NodeType::SlugId) => Some(Operation::ReplaceDocument),
            ("PATCH", NodeType::Id | NodeType::SlugId) => Some(Operation::PatchDocument),
            ("DELETE", NodeType::Id | NodeType::SlugId) => Some(Operation::DeleteDocument),
            _ => None,
        }
    }

    /// Check this operation against the resolved permissions. Nested
    /// targets additionally require traverse. Fail closed.
    fn permitted(&self, effective: &EffectiveAccess, nested: bool) -> bool {
        if nested && !effective.traverse {
            return false;
        }
        match self {
            Operation::ListCollection => effective.query,
            Operation::CreateDocument => effective.create,
            Operation::GetDocument | Operation::ReadSubPath => !effective.read.is_empty(),
            Operation::ReplaceDocument => effective.overwrite,
            Operation::PatchDocument => !effective.write.is_empty(),
            Operation::DeleteDocument => effective.delete,
            Operation::InvokeMethod => !effective.exec.is_empty(),
        }
    }

    fn object_scoped(&self) -> bool {
        !matches!(self, Operation::ListCollection | Operation::CreateDocument)
    }
}

/// Structural view of the matched path the handler operates on.
struct Target<'a> {
    /// The final node the operation applies to.
    node: &'a PathNode,
    /// Deepest collection node, when present.
    collection_node: Option<&'a PathNode>,
    collection_name: Option<&'a str>,
    /// Document node following the deepest collection.
    document_node: Option<&'a PathNode>,
    /// Document node preceding the deepest collection (nested trees).
    parent_object_node: Option<&'a PathNode>,
}

impl<'a> Target<'a> {
    fn of(path: &'a ParsedPath) -> Option<Target<'a>> {
        let node = path.last()?;
        let nodes = path.nodes();
        let collection_index = nodes.iter().rposition(|n| n.is_collection());

        let collection_node = collection_index.map(|i| &nodes[i]);
        let document_node = collection_index
            .and_then(|i| nodes.get(i + 1))
            .filter(|n| matches!(n.node_type(), NodeType::Id | NodeType::SlugId));
        let parent_object_node = collection_index
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| nodes.get(i))
            .filter(|n| matches!(n.node_type(), NodeType::Id | NodeType::SlugId));

        Some(Target {
            node,
            collection_node,
            collection_name: collection_node.map(|n| n.identifier()),
            document_node,
            parent_object_node,
        })
    }
}

/// Main resource handler: the full parse → match → access → hooks →
/// storage → hooks flow for one request.
async fn resource_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let method = request.method().clone();
    let raw_path = request.uri().path().to_string();

    // 1. Parse the path. A request whose path fits no grammar rule is
    //    rejected outright.
    let path = match parse(&raw_path, false) {
        Ok(path) => path,
        Err(err) => {
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    // 2. Route lookup. Candidates are tried in order; no candidate ever
    //    raises, so a miss here means no registered pattern covers this
    //    shape.
    let Some((route, matched)) = state.routes.lookup(&path) else {
        tracing::debug!(path = %raw_path, "no route matched");
        return (StatusCode::NOT_FOUND, "no matching route").into_response();
    };
    tracing::debug!(route = %route.name, target = %matched.path.value, "route matched");

    let Some(target) = Target::of(&path) else {
        return (StatusCode::NOT_FOUND, "no resource at /").into_response();
    };
    let Some(operation) = Operation::classify(&method, target.node) else {
        return (StatusCode::METHOD_NOT_ALLOWED, "unsupported operation").into_response();
    };

    // 3. Access resolution along the collection chain.
    let chain = path.collection_chain();
    let effective = resolve(&state.access, &chain);
    if !operation.permitted(&effective, chain.len() > 1) {
        tracing::debug!(route = %route.name, path = %raw_path, "access denied");
        return (StatusCode::FORBIDDEN, "access denied").into_response();
    }

    // 4. Body.
    let bytes = match axum::body::to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };
    let input = if bytes.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                return (StatusCode::BAD_REQUEST, format!("invalid JSON body: {err}"))
                    .into_response();
            }
        }
    };

    // 5. Before-hooks. A failure blocks the operation before any effect.
    let mut ctx = RequestContext::new(input);
    ctx.linker = state.linker.clone();

    let (before_stage, after_stage) = if operation.object_scoped() {
        (HookStage::BeforeObject, HookStage::AfterObject)
    } else {
        (HookStage::BeforeCollection, HookStage::AfterCollection)
    };
    let before_ctx = build_before_context(before_stage, &target, &ctx);
    if let Err(err) = hooks::run(state.hooks.hooks(before_stage), &mut ctx, Some(before_ctx)).await
    {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("operation blocked: {err}"),
        )
            .into_response();
    }
    if ctx.done {
        // A hook requested finalization from current state.
        return Json(ctx.output).into_response();
    }

    // 6. Storage operation.
    let status = match perform_operation(&state, &operation, &target, &mut ctx).await {
        Ok(status) => status,
        Err(response) => return response,
    };

    // 7. After-hooks: the operation is committed; failures are logged only.
    let after_ctx = build_after_context(after_stage, &target, &ctx);
    hooks::run_after(state.hooks.hooks(after_stage), &mut ctx, Some(after_ctx)).await;

    (status, Json(ctx.output)).into_response()
}

fn build_before_context(stage: HookStage, target: &Target<'_>, ctx: &RequestContext) -> HookContext {
    let incoming = (!ctx.input.is_null()).then(|| ctx.input.clone());
    match stage {
        HookStage::BeforeCollection => HookContext::before_collection(
            target
                .collection_node
                .cloned()
                .unwrap_or_else(|| target.node.clone()),
            target.parent_object_node.cloned(),
            incoming,
        ),
        _ => HookContext::before_object(
            target
                .document_node
                .unwrap_or(target.node)
                .clone(),
            incoming,
        ),
    }
}

fn build_after_context(stage: HookStage, target: &Target<'_>, ctx: &RequestContext) -> HookContext {
    let document = (!ctx.output.is_null()).then(|| ctx.output.clone());
    match stage {
        HookStage::AfterCollection => HookContext::after_collection(
            target
                .collection_node
                .cloned()
                .unwrap_or_else(|| target.node.clone()),
            target.parent_object_node.cloned(),
            document,
            target.document_node.cloned(),
        ),
        _ => HookContext::after_object(
            target
                .document_node
                .unwrap_or(target.node)
                .clone(),
            document,
        ),
    }
}

/// Execute the storage side of the operation, leaving the response state
/// in `ctx.output`. Errors are full responses so the handler can return
/// them directly.
async fn perform_operation(
    state: &AppState,
    operation: &Operation,
    target: &Target<'_>,
    ctx: &mut RequestContext,
) -> Result<StatusCode, Response> {
    let collection = target
        .collection_name
        .ok_or_else(|| (StatusCode::NOT_FOUND, "no collection in path").into_response())?;

    match operation {
        Operation::ListCollection => {
            let documents = state
                .store
                .list(collection)
                .await
                .map_err(storage_failure)?;
            ctx.output = Value::Array(window(documents, target.node));
            Ok(StatusCode::OK)
        }
        Operation::CreateDocument => {
            let id = new_document_id();
            let mut document = ctx.input.clone();
            if let Value::Object(map) = &mut document {
                map.insert("id".into(), json!(id));
            }
            state
                .store
                .insert(collection, &id, document.clone())
                .await
                .map_err(storage_failure)?;
            ctx.output = document;
            Ok(StatusCode::CREATED)
        }
        Operation::GetDocument => {
            let key = document_key(target)?;
            let document = state
                .store
                .get(collection, key)
                .await
                .map_err(storage_failure)?
                .ok_or_else(document_missing)?;
            ctx.output = document;
            Ok(StatusCode::OK)
        }
        Operation::ReplaceDocument => {
            let key = document_key(target)?;
            state
                .store
                .replace(collection, key, ctx.input.clone())
                .await
                .map_err(storage_failure)?;
            ctx.output = ctx.input.clone();
            Ok(StatusCode::OK)
        }
        Operation::PatchDocument => {
            let key = document_key(target)?;
            let mut document = state
                .store
                .get(collection, key)
                .await
                .map_err(storage_failure)?
                .ok_or_else(document_missing)?;
            merge_shallow(&mut document, &ctx.input);
            state
                .store
                .replace(collection, key, document.clone())
                .await
                .map_err(storage_failure)?;
            ctx.output = document;
            Ok(StatusCode::OK)
        }
        Operation::DeleteDocument => {
            let key = document_key(target)?;
            let removed = state
                .store
                .delete(collection, key)
                .await
                .map_err(storage_failure)?;
            if !removed {
                return Err(document_missing());
            }
            ctx.output = json!({ "deleted": true });
            Ok(StatusCode::OK)
        }
        Operation::ReadSubPath => {
            let key = document_key(target)?;
            let document = state
                .store
                .get(collection, key)
                .await
                .map_err(storage_failure)?
                .ok_or_else(document_missing)?;
            let property = target.node.identifier();
            let value = if target.node.node_type() == NodeType::LinkProperty {
                ctx.linker
                    .as_ref()
                    .and_then(|linker| linker.resolve(property, &document))
            } else {
                lookup_property(&document, property)
            };
            ctx.output = value.ok_or_else(|| {
                (StatusCode::NOT_FOUND, "property not found").into_response()
            })?;
            Ok(StatusCode::OK)
        }
        Operation::InvokeMethod => {
            // Method semantics come from registered hooks; the pipeline
            // already ran and shaped `ctx.output`.
            Ok(StatusCode::OK)
        }
    }
}

fn storage_failure(err: crate::storage::StorageError) -> Response {
    tracing::error!(error = %err, "storage operation failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "storage failure").into_response()
}

fn document_missing() -> Response {
    (StatusCode::NOT_FOUND, "document not found").into_response()
}

fn document_key<'a>(target: &Target<'a>) -> Result<&'a str, Response> {
    target
        .document_node
        .map(|n| n.raw.as_str())
        .ok_or_else(|| (StatusCode::NOT_FOUND, "no document in path").into_response())
}

/// Fresh 24-lowercase-hex document id.
fn new_document_id() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    simple[..24].to_string()
}

/// Apply an offset or range node to a listing.
fn window(documents: Vec<Value>, target: &PathNode) -> Vec<Value> {
    use crate::path::NodeKind;
    match &target.kind {
        NodeKind::Offset { value } => documents.into_iter().skip(*value as usize).collect(),
        NodeKind::Range { min, max } => documents
            .into_iter()
            .skip(*min as usize)
            .take((max.saturating_sub(*min) as usize) + 1)
            .collect(),
        _ => documents,
    }
}

/// Follow a dotted property identifier into a document.
fn lookup_property(document: &Value, property: &str) -> Option<Value> {
    let mut cursor = document;
    for part in property.split('.') {
        cursor = cursor.as_object()?.get(part)?;
    }
    Some(cursor.clone())
}

/// Shallow object merge for PATCH.
fn merge_shallow(document: &mut Value, patch: &Value) {
    if let (Value::Object(doc), Value::Object(patch)) = (document, patch) {
        for (key, value) in patch {
            doc.insert(key.clone(), value.clone());
        }
    }
}
