//! End-to-end scans over a synthetic component/renderer graph

use regscan_core::{
    AbortReason, Evidence, LookupFailure, Provenance, SampleStatus, ScanConfig, ScanPhase,
    ScanPipeline, ScanResult,
};
use regscan_reflect::{ObjectGraph, TypeBuilder, TypeId, Value};

const DICTIONARY: &str = "System.Collections.Generic.Dictionary`2";

/// Types of a component whose renderer holds several registries
///
/// ```text
/// Counter : ComponentBase { _renderHandle }
/// RenderHandle { _renderer, _componentId }
/// RemoteRenderer : Renderer
///     _zeta          HandlerMap       direct
///     _eventRegistry RenderEventRegistry { _handlersById: HandlerMap }  nested
///     _batch         RenderBatch
///     _eventHandlers NamedHandlerMap  fast path, wrong key
///     _eventQueue    NamedHandlerMap  heuristic only, wrong key
///     _eventBindings HandlerMap       fast path
/// Renderer
///     _componentStateById ComponentStateMap
///     _alpha              HandlerMap  direct
/// ```
struct Fixture {
    graph: ObjectGraph,
    component: TypeId,
    handle: TypeId,
    renderer: TypeId,
    handler_map: TypeId,
    handler_entry: TypeId,
    named_map: TypeId,
    named_entry: TypeId,
    state_map: TypeId,
    registry: TypeId,
    batch: TypeId,
    callback: TypeId,
}

impl Fixture {
    fn new() -> Self {
        let mut graph = ObjectGraph::new();
        let callback = graph
            .define(TypeBuilder::new("EventCallback").namespace("Web"))
            .unwrap();
        let handler_entry = graph
            .define(TypeBuilder::new("HandlerEntry").entry(TypeId::U64, callback))
            .unwrap();
        let handler_map = graph
            .define(
                TypeBuilder::new("HandlerMap")
                    .generic(DICTIONARY, vec![TypeId::U64, callback])
                    .counted(),
            )
            .unwrap();
        let named_entry = graph
            .define(TypeBuilder::new("NamedEntry").entry(TypeId::STRING, callback))
            .unwrap();
        let named_map = graph
            .define(
                TypeBuilder::new("NamedHandlerMap")
                    .generic(DICTIONARY, vec![TypeId::STRING, callback])
                    .counted(),
            )
            .unwrap();
        let state_map = graph
            .define(
                TypeBuilder::new("ComponentStateMap")
                    .generic(DICTIONARY, vec![TypeId::I32, TypeId::OBJECT])
                    .counted(),
            )
            .unwrap();
        let registry = graph
            .define(
                TypeBuilder::new("RenderEventRegistry")
                    .namespace("Web")
                    .field("_handlersById", handler_map),
            )
            .unwrap();
        let batch = graph
            .define(TypeBuilder::new("RenderBatch").namespace("Web"))
            .unwrap();
        let renderer_base = graph
            .define(
                TypeBuilder::new("Renderer")
                    .namespace("Web")
                    .field("_componentStateById", state_map)
                    .field("_alpha", handler_map),
            )
            .unwrap();
        let renderer = graph
            .define(
                TypeBuilder::new("RemoteRenderer")
                    .namespace("Web.Remote")
                    .parent(renderer_base)
                    .field("_zeta", handler_map)
                    .field("_eventRegistry", registry)
                    .field("_batch", batch)
                    .field("_eventHandlers", named_map)
                    .field("_eventQueue", named_map)
                    .field("_eventBindings", handler_map),
            )
            .unwrap();
        let handle = graph
            .define(
                TypeBuilder::new("RenderHandle")
                    .namespace("Web")
                    .field("_renderer", renderer_base)
                    .field("_componentId", TypeId::I32),
            )
            .unwrap();
        let component_base = graph
            .define(
                TypeBuilder::new("ComponentBase")
                    .namespace("Web")
                    .field("_renderHandle", handle),
            )
            .unwrap();
        let component = graph
            .define(TypeBuilder::new("Counter").namespace("App").parent(component_base))
            .unwrap();

        Self {
            graph,
            component,
            handle,
            renderer,
            handler_map,
            handler_entry,
            named_map,
            named_entry,
            state_map,
            registry,
            batch,
            callback,
        }
    }

    fn handlers(&mut self, ids: &[u64]) -> Value {
        let mut pairs = Vec::new();
        for id in ids {
            let callback = self.graph.instantiate(self.callback).unwrap();
            pairs.push((Value::U64(*id), callback));
        }
        self.graph.map(self.handler_map, self.handler_entry, pairs).unwrap()
    }

    fn named(&mut self, names: &[&str]) -> Value {
        let pairs = names
            .iter()
            .map(|name| (Value::Str(name.to_string()), Value::Null))
            .collect();
        self.graph.map(self.named_map, self.named_entry, pairs).unwrap()
    }

    /// Fully populated renderer
    fn renderer(&mut self) -> Value {
        let renderer = self.graph.instantiate(self.renderer).unwrap();

        let bindings = self.handlers(&[1, 2, 3]);
        let alpha = self.handlers(&[10]);
        let zeta = self.handlers(&[]);
        let handlers = self.named(&["click"]);
        let queue = self.named(&["submit", "input"]);
        let inner = self.handlers(&[40, 41]);
        let registry = self.graph.instantiate(self.registry).unwrap();
        self.graph.set_field(&registry, "_handlersById", inner).unwrap();
        let batch = self.graph.instantiate(self.batch).unwrap();
        let states = self
            .graph
            .map(
                self.state_map,
                self.handler_entry,
                vec![(Value::U64(0), Value::Null), (Value::U64(1), Value::Null)],
            )
            .unwrap();

        for (name, value) in [
            ("_eventBindings", bindings),
            ("_alpha", alpha),
            ("_zeta", zeta),
            ("_eventHandlers", handlers),
            ("_eventQueue", queue),
            ("_eventRegistry", registry),
            ("_batch", batch),
            ("_componentStateById", states),
        ] {
            self.graph.set_field(&renderer, name, value).unwrap();
        }
        renderer
    }

    fn component_with(&mut self, renderer: Value) -> Value {
        let handle = self.graph.instantiate(self.handle).unwrap();
        self.graph.set_field(&handle, "_renderer", renderer).unwrap();
        self.graph
            .set_field(&handle, "_componentId", Value::I32(7))
            .unwrap();
        let component = self.graph.instantiate(self.component).unwrap();
        self.graph
            .set_field(&component, "_renderHandle", handle)
            .unwrap();
        component
    }

    fn scan(&self, root: &Value) -> ScanResult {
        ScanPipeline::default().scan(&self.graph, root)
    }
}

fn paths(result: &ScanResult) -> Vec<&str> {
    result.candidates.iter().map(|c| c.path.as_str()).collect()
}

#[test]
fn test_full_scan_orders_candidates_by_phase() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);

    assert_eq!(result.phase, ScanPhase::Done);
    assert!(!result.is_aborted());
    assert!(result.found_any);
    assert_eq!(
        paths(&result),
        vec![
            "RemoteRenderer._eventBindings",
            "RemoteRenderer._eventHandlers",
            "Renderer._alpha",
            "RemoteRenderer._eventBindings",
            "RemoteRenderer._zeta",
            "RenderEventRegistry._handlersById",
        ]
    );
    assert_eq!(result.fast_path().count(), 2);
    assert_eq!(result.discovered().count(), 4);
}

#[test]
fn test_resolved_types_and_component_identity() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);

    assert_eq!(result.root_type.as_deref(), Some("App.Counter"));
    assert_eq!(result.handle_type.as_deref(), Some("Web.RenderHandle"));
    assert_eq!(result.target_type.as_deref(), Some("Web.Remote.RemoteRenderer"));
    assert_eq!(result.component_id.as_deref(), Some("7"));

    let states = result.component_states.as_ref().unwrap();
    assert_eq!(states.field, "_componentStateById");
    assert_eq!(states.type_name, "ComponentStateMap");
    assert_eq!(states.count, Some(2));
}

#[test]
fn test_fast_path_accepts_non_map_shape_as_suspected() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);

    let bindings = &result.candidates[0];
    assert_eq!(bindings.field, "_eventBindings");
    assert_eq!(bindings.provenance, Provenance::FastPath);
    assert_eq!(bindings.evidence, Evidence::Confirmed);

    let handlers = &result.candidates[1];
    assert_eq!(handlers.field, "_eventHandlers");
    assert_eq!(handlers.provenance, Provenance::FastPath);
    assert_eq!(handlers.evidence, Evidence::Suspected);
    assert_eq!(handlers.type_name, "NamedHandlerMap");
    assert_eq!(handlers.summary.size, Some(1));
    assert_eq!(handlers.summary.samples[0].key.as_deref(), Some("click"));
}

#[test]
fn test_heuristic_field_with_wrong_key_is_not_a_candidate() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);

    assert!(result.candidates.iter().all(|c| c.field != "_eventQueue"));
    assert!(result.candidates.iter().all(|c| c.field != "_componentStateById"));
    assert!(result.candidates.iter().all(|c| c.field != "_batch"));
}

#[test]
fn test_fast_path_field_also_reported_as_direct() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);

    let bindings: Vec<_> = result
        .candidates
        .iter()
        .filter(|c| c.field == "_eventBindings")
        .collect();
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].provenance, Provenance::FastPath);
    assert_eq!(bindings[1].provenance, Provenance::Direct);
    assert_eq!(bindings[0].path, bindings[1].path);
    assert_eq!(bindings[1].summary.size, Some(3));
}

#[test]
fn test_listing_a_fast_path_name_twice_records_it_once() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let config = ScanConfig {
        fast_path_names: vec!["_eventBindings".to_string(), "_eventBindings".to_string()],
        ..ScanConfig::default()
    };
    let result = ScanPipeline::new(config).scan(&fx.graph, &root);

    assert_eq!(result.fast_path().count(), 1);
}

#[test]
fn test_direct_candidates_sort_ignoring_case() {
    let mut graph = ObjectGraph::new();
    let map_ty = graph
        .define(TypeBuilder::new("IdMap").generic(DICTIONARY, vec![TypeId::U64, TypeId::STRING]))
        .unwrap();
    let renderer_ty = graph
        .define(
            TypeBuilder::new("Renderer")
                .field("_Zeta", map_ty)
                .field("_beta", map_ty)
                .field("_alpha", map_ty)
                .field("_Beta", map_ty),
        )
        .unwrap();
    let handle_ty = graph
        .define(TypeBuilder::new("RenderHandle").field("_renderer", renderer_ty))
        .unwrap();
    let root_ty = graph
        .define(TypeBuilder::new("Component").field("_renderHandle", handle_ty))
        .unwrap();

    let renderer = graph.instantiate(renderer_ty).unwrap();
    for name in ["_Zeta", "_beta", "_alpha", "_Beta"] {
        let map = graph.collection(map_ty, regscan_reflect::Elements::new(Vec::new())).unwrap();
        graph.set_field(&renderer, name, map).unwrap();
    }
    let handle = graph.instantiate(handle_ty).unwrap();
    graph.set_field(&handle, "_renderer", renderer).unwrap();
    let root = graph.instantiate(root_ty).unwrap();
    graph.set_field(&root, "_renderHandle", handle).unwrap();

    let result = ScanPipeline::default().scan(&graph, &root);

    let fields: Vec<_> = result.candidates.iter().map(|c| c.field.as_str()).collect();
    assert_eq!(fields, vec!["_alpha", "_Beta", "_beta", "_Zeta"]);
}

#[test]
fn test_direct_and_nested_candidates() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);

    let alpha = &result.candidates[2];
    assert_eq!(alpha.provenance, Provenance::Direct);
    assert_eq!(alpha.declaring_type, "Web.Renderer");
    assert_eq!(alpha.evidence, Evidence::Confirmed);

    let bindings = &result.candidates[3];
    assert_eq!(bindings.field, "_eventBindings");
    assert_eq!(bindings.provenance, Provenance::Direct);

    let zeta = &result.candidates[4];
    assert_eq!(zeta.summary.size, Some(0));
    assert_eq!(zeta.summary.status, SampleStatus::Empty);

    let nested = &result.candidates[5];
    assert_eq!(
        nested.provenance,
        Provenance::Nested {
            container_field: "_eventRegistry".to_string(),
            container_type: "Web.RenderEventRegistry".to_string(),
        }
    );
    assert_eq!(nested.summary.size, Some(2));
    let keys: Vec<_> = nested
        .summary
        .samples
        .iter()
        .map(|s| s.key.clone().unwrap())
        .collect();
    assert_eq!(keys, vec!["40", "41"]);
    assert_eq!(nested.summary.samples[0].value_type, "Web.EventCallback");
}

#[test]
fn test_large_registry_is_sampled_to_limit() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let ids: Vec<u64> = (100..200).collect();
    let big = fx.handlers(&ids);
    fx.graph.set_field(&renderer, "_eventBindings", big).unwrap();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);

    let bindings = &result.candidates[0];
    assert_eq!(bindings.summary.size, Some(100));
    assert_eq!(bindings.summary.samples.len(), 5);
    assert_eq!(bindings.summary.samples[4].key.as_deref(), Some("104"));
    assert_eq!(bindings.summary.status, SampleStatus::Sampled);
}

#[test]
fn test_missing_handle_aborts_without_candidates() {
    let mut fx = Fixture::new();
    let root = fx.graph.instantiate(fx.component).unwrap();

    let result = fx.scan(&root);

    assert_eq!(result.phase, ScanPhase::Aborted);
    assert!(!result.found_any);
    assert!(result.candidates.is_empty());
    assert_eq!(
        result.aborted,
        Some(AbortReason::RootUnavailable {
            field: "_renderHandle".to_string(),
            failure: LookupFailure::Null,
        })
    );
}

#[test]
fn test_null_root_aborts() {
    let fx = Fixture::new();
    let result = fx.scan(&Value::Null);

    assert_eq!(
        result.aborted,
        Some(AbortReason::RootUnavailable {
            field: "_renderHandle".to_string(),
            failure: LookupFailure::NoRuntimeType,
        })
    );
    assert!(result.root_type.is_none());
    assert!(result.candidates.is_empty());
}

#[test]
fn test_root_without_handle_field_aborts() {
    let fx = Fixture::new();
    let mut graph = fx.graph;
    let plain = graph.define(TypeBuilder::new("Plain")).unwrap();
    let root = graph.instantiate(plain).unwrap();

    let result = ScanPipeline::default().scan(&graph, &root);

    assert_eq!(
        result.aborted,
        Some(AbortReason::RootUnavailable {
            field: "_renderHandle".to_string(),
            failure: LookupFailure::FieldNotFound,
        })
    );
}

#[test]
fn test_missing_renderer_aborts_after_handle() {
    let mut fx = Fixture::new();
    let handle = fx.graph.instantiate(fx.handle).unwrap();
    let root = fx.graph.instantiate(fx.component).unwrap();
    fx.graph.set_field(&root, "_renderHandle", handle).unwrap();

    let result = fx.scan(&root);

    assert_eq!(result.handle_type.as_deref(), Some("Web.RenderHandle"));
    assert_eq!(
        result.aborted,
        Some(AbortReason::InnerUnavailable {
            field: "_renderer".to_string(),
            failure: LookupFailure::Null,
        })
    );
    assert!(!result.found_any);
}

#[test]
fn test_partially_constructed_renderer_is_scanned() {
    let mut fx = Fixture::new();
    // Only the base type's two fields are backed
    let renderer = fx.graph.instantiate_partial(fx.renderer, 2).unwrap();
    let alpha = fx.handlers(&[5]);
    fx.graph.set_field(&renderer, "_alpha", alpha).unwrap();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);

    assert_eq!(result.phase, ScanPhase::Done);
    assert_eq!(paths(&result), vec!["Renderer._alpha"]);
}

#[test]
fn test_empty_renderer_finds_nothing() {
    let mut fx = Fixture::new();
    let renderer = fx.graph.instantiate(fx.renderer).unwrap();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);

    assert_eq!(result.phase, ScanPhase::Done);
    assert!(result.aborted.is_none());
    assert!(!result.found_any);
    assert!(result.component_states.is_none());
}

#[test]
fn test_root_base_type_lookup() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let config = ScanConfig {
        root_base_type: Some("Web.ComponentBase".to_string()),
        ..ScanConfig::default()
    };
    let result = ScanPipeline::new(config).scan(&fx.graph, &root);
    assert!(result.found_any);

    let config = ScanConfig {
        root_base_type: Some("Web.Missing".to_string()),
        ..ScanConfig::default()
    };
    let result = ScanPipeline::new(config).scan(&fx.graph, &root);
    assert_eq!(
        result.aborted,
        Some(AbortReason::RootUnavailable {
            field: "_renderHandle".to_string(),
            failure: LookupFailure::UnknownBaseType("Web.Missing".to_string()),
        })
    );
}

#[test]
fn test_custom_fast_path_names() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let config = ScanConfig {
        fast_path_names: vec!["_zeta".to_string(), "_missing".to_string()],
        keywords: Vec::new(),
        ..ScanConfig::default()
    };
    let result = ScanPipeline::new(config).scan(&fx.graph, &root);

    // No keywords: the registry container is never searched
    assert_eq!(
        paths(&result),
        vec![
            "RemoteRenderer._zeta",
            "Renderer._alpha",
            "RemoteRenderer._eventBindings",
            "RemoteRenderer._zeta",
        ]
    );
}

#[test]
fn test_result_serializes_to_json() {
    let mut fx = Fixture::new();
    let renderer = fx.renderer();
    let root = fx.component_with(renderer);

    let result = fx.scan(&root);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["phase"], "done");
    assert_eq!(json["found_any"], true);
    assert_eq!(json["candidates"][0]["provenance"]["kind"], "fast_path");
    assert_eq!(json["candidates"][1]["evidence"], "suspected");
    assert_eq!(json["candidates"][3]["provenance"]["kind"], "direct");
    assert_eq!(json["candidates"][4]["summary"]["status"]["status"], "empty");
    assert_eq!(
        json["candidates"][5]["provenance"]["container_field"],
        "_eventRegistry"
    );
    assert!(json["candidates"][0].get("value").is_none());
}
