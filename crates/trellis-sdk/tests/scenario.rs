//! End-to-end tests through the public SDK surface.

use serde_json::{Value, json};
use trellis_common::config::TrellisConfig;
use trellis_compose::{ComponentClass, DispatchOutcome, FeedbackKind, LoadRequest};
use trellis_sdk::{Application, DispatchRequest, LoadComponentRequest, Manifest};
use trellis_store::{MemoryPersistence, MemorySession, PersistenceBackend};

const MANIFEST: &str = r"
root:
  class_name: App
  name: R
classes:
  App:
    client_code: define('App')
    strong_children_config: { locale: fr }
    components:
      x: { class_name: T }
  T:
    client_code: define('T')
    components:
      y: { class_name: U, lazy: true, config: { title: Details } }
  U:
    client_code: define('U')
    default_config: { persistence: true, height: 200 }
    endpoints:
      refresh: { response: { ok: true } }
      audit: { exposed: false }
";

fn application() -> Application {
    let manifest = Manifest::from_yaml(MANIFEST).expect("manifest");
    Application::from_manifest(&manifest).expect("application")
}

#[test]
fn eager_children_materialize_and_lazy_ones_wait() {
    let app = application();
    let mut session = MemorySession::new();
    let ctx = app.context(&mut session);
    let tree = app.build_tree(&ctx).expect("build");

    assert!(tree.find("R__x").is_some());
    assert!(tree.find("R__x__y").is_none());
    let x = tree.find("R__x").expect("x");
    let id = tree.resolve_global_id(tree.root(), "x__y").expect("resolve");
    assert_eq!(id.map(String::from), Some("R__x__y".to_owned()));
    let id = tree.resolve_global_id(x, "parent__x__y").expect("resolve");
    assert_eq!(id.map(String::from), Some("R__x__y".to_owned()));
}

#[test]
fn loading_a_lazy_child_returns_code_render_and_event() {
    let app = application();
    let mut session = MemorySession::new();
    let mut ctx = app.context(&mut session);
    let mut tree = app.build_tree(&ctx).expect("build");

    let request = LoadComponentRequest {
        parent: "x".into(),
        request: LoadRequest::new("y").container("center"),
    };
    let first = app.handle_load(&mut tree, &mut ctx, &request);
    assert!(first.feedback.is_none(), "unexpected feedback: {:?}", first.feedback);
    assert_eq!(first.missing_types().collect::<Vec<_>>(), vec!["T", "U"]);
    let render = first.render.as_ref().expect("render");
    assert_eq!(render.container.as_deref(), Some("center"));
    assert_eq!(render.config["title"], json!("Details"));
    assert_eq!(render.config["locale"], json!("fr"));
    assert_eq!(render.config["height"], json!(200));
    assert!(render.config.get("persistence").is_none());
    assert_eq!(first.loaded.as_ref().map(|l| l.name.as_str()), Some("y"));

    let cached = LoadComponentRequest {
        parent: "x".into(),
        request: LoadRequest::new("y")
            .container("center")
            .cached(first.missing_types().map(ToOwned::to_owned).collect::<Vec<_>>()),
    };
    let second = app.handle_load(&mut tree, &mut ctx, &cached);
    assert!(second.missing_code.is_empty());
    assert_eq!(second.loaded, first.loaded);
}

#[test]
fn dispatch_honours_exposure_and_reports_unknown_segments() {
    let app = application();
    let mut session = MemorySession::new();
    let mut ctx = app.context(&mut session);
    let mut tree = app.build_tree(&ctx).expect("build");

    let ok = app.handle_dispatch(&mut tree, &mut ctx, DispatchRequest::new("x__y__refresh"));
    assert_eq!(ok, DispatchOutcome::Response(json!({ "ok": true })));

    let hidden = app.handle_dispatch(&mut tree, &mut ctx, DispatchRequest::new("x__y__audit"));
    assert_eq!(hidden.feedback().map(|f| f.kind), Some(FeedbackKind::ActionNotExposed));

    let unknown = app.handle_dispatch(&mut tree, &mut ctx, DispatchRequest::new("x__nope__refresh"));
    let feedback = unknown.feedback().expect("feedback");
    assert_eq!(feedback.kind, FeedbackKind::UnknownComponent);
    assert!(feedback.message.contains("nope"));
}

#[test]
fn deliver_component_is_reachable_through_dispatch() {
    let app = application();
    let mut session = MemorySession::new();
    let mut ctx = app.context(&mut session);
    let mut tree = app.build_tree(&ctx).expect("build");

    let outcome = app.handle_dispatch(
        &mut tree,
        &mut ctx,
        DispatchRequest::new("x__deliver_component").params(json!({ "name": "y", "cached_types": ["T"] })),
    );
    let payload = outcome.response().expect("response");
    assert_eq!(payload["missing_code"][0]["class_name"], json!("U"));
    assert_eq!(payload["loaded"]["global_id"], json!("R__x__y"));
}

#[test]
fn persisted_settings_survive_new_trees() {
    let mut catalog = application().catalog().clone();
    catalog.register(
        ComponentClass::new("U")
            .default_config(json!({ "persistence": true }))
            .endpoint("resize", |inv, params| {
                inv.persist("size__width", params)?;
                Ok(inv.config()?["size"].clone())
            }),
    );
    let app = Application::new(catalog, "App", "R");
    let mut store = MemoryPersistence::new();

    {
        let mut session = MemorySession::new();
        let mut ctx = app.context(&mut session).with_persistence(&mut store);
        let mut tree = app.build_tree(&ctx).expect("build");
        let outcome = app.handle_dispatch(
            &mut tree,
            &mut ctx,
            DispatchRequest::new("x__y__resize").params(json!(640)),
        );
        assert_eq!(outcome.response(), Some(&json!({ "width": 640 })));
    }

    assert_eq!(
        store.find_all_for_key("R__x__y").expect("read"),
        vec![("size__width".to_owned(), json!(640))]
    );

    let mut session = MemorySession::new();
    let mut ctx = app.context(&mut session).with_persistence(&mut store);
    let mut tree = app.build_tree(&ctx).expect("build");
    let result = app.handle_load(
        &mut tree,
        &mut ctx,
        &LoadComponentRequest {
            parent: "x".into(),
            request: LoadRequest::new("y"),
        },
    );
    let config = result.render.map(|r| r.config).unwrap_or(Value::Null);
    assert_eq!(config["size"]["width"], json!(640));
}

#[test]
fn file_backed_persistence_is_opened_from_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = TrellisConfig {
        state_file: dir.path().join("state.json"),
        ..TrellisConfig::default()
    };
    let app = application().with_settings(settings);
    let mut store = app.open_persistence().expect("open").expect("enabled");
    assert_eq!(store.path(), dir.path().join("state.json"));
    store.set("R__x__y", "height", json!(480)).expect("set");

    let mut reopened = app.open_persistence().expect("open").expect("enabled");
    let mut session = MemorySession::new();
    let ctx = app.context(&mut session).with_persistence(&mut reopened);
    let mut tree = app.build_tree(&ctx).expect("build");
    let y = tree
        .node_at(&ctx, tree.root(), "x__y")
        .expect("path")
        .expect("inside tree");
    let config = tree.resolved_config(&ctx, y).expect("config");
    assert_eq!(config["height"], json!(480));
    assert_eq!(config["title"], json!("Details"));
    assert!(dir.path().join("state.json").exists());
}
