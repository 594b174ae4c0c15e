//! End-to-end registry scenarios: discovery, option merging, activation
//! isolation and the active-extension view.

use std::sync::{Arc, Mutex};

use extman_core::{
    DiscoveryCache, Error, ExtensionRegistry, RegistryOptions, RegistryState, StaticLoader,
};
use extman_test_utils::ExtensionTree;
use pretty_assertions::assert_eq;
use serde_json::json;

/// Host that records which entry points ran, in order.
#[derive(Default)]
struct RecordingHost {
    calls: Mutex<Vec<String>>,
}

impl RecordingHost {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn record(host: &RecordingHost, name: &str) {
    host.calls.lock().unwrap().push(name.to_string());
}

/// Three extensions: `templates` (no deps), `pdf-export` (one dep) and
/// `charts` (no deps), each with its own entry point key.
fn sample_tree() -> ExtensionTree {
    let tree = ExtensionTree::new();
    tree.add_extension_with_main("a-pdf", "pdf-export", "pdf.rs", &["templates"]);
    tree.add_extension_with_main("b-templates", "templates", "templates.rs", &[]);
    tree.add_extension_with_main("c-charts", "charts", "charts.rs", &[]);
    tree
}

fn recording_loader() -> StaticLoader<RecordingHost> {
    StaticLoader::<RecordingHost>::new()
        .with("pdf.rs", |host, ext| {
            record(host, ext.name());
            Ok(())
        })
        .with("templates.rs", |host, ext| {
            record(host, ext.name());
            Ok(())
        })
        .with("charts.rs", |host, ext| {
            record(host, ext.name());
            Ok(())
        })
}

fn registry_with(
    options: RegistryOptions,
    loader: StaticLoader<RecordingHost>,
) -> ExtensionRegistry<RecordingHost> {
    ExtensionRegistry::with_cache(
        Arc::new(RecordingHost::default()),
        options,
        Arc::new(loader),
        Arc::new(DiscoveryCache::new()),
    )
}

fn names<'a>(list: impl IntoIterator<Item = &'a extman_core::ExtensionDescriptor>) -> Vec<&'a str> {
    list.into_iter().map(|d| d.name()).collect()
}

#[tokio::test]
async fn test_init_activates_everything_in_dependency_order() {
    let tree = sample_tree();
    let mut registry = registry_with(RegistryOptions::new(tree.root()), recording_loader());

    let report = registry.init().await.unwrap();

    assert_eq!(registry.state(), RegistryState::Ready);
    assert!(report.is_clean());
    assert_eq!(
        registry.host().calls(),
        vec!["templates", "charts", "pdf-export"]
    );
    assert_eq!(
        names(registry.extensions()),
        vec!["templates", "charts", "pdf-export"]
    );
}

#[tokio::test]
async fn test_explicit_list_activates_only_named_extensions() {
    let tree = sample_tree();
    let options = RegistryOptions::new(tree.root()).with_extensions(["pdf-export", "charts"]);
    let mut registry = registry_with(options, recording_loader());

    registry.init().await.unwrap();

    assert_eq!(registry.host().calls(), vec!["pdf-export", "charts"]);
    assert_eq!(names(registry.extensions()), vec!["charts", "pdf-export"]);
    assert!(!registry.get("templates").unwrap().is_registered);
}

#[tokio::test]
async fn test_unknown_name_is_reported_without_failing() {
    let tree = sample_tree();
    let options = RegistryOptions::new(tree.root()).with_extensions(["templates", "ghost"]);
    let mut registry = registry_with(options, recording_loader());
    let mut events = registry.subscribe();

    let report = registry.init().await.unwrap();

    assert_eq!(report.activated, vec!["templates"]);
    assert_eq!(report.missing, vec!["ghost"]);
    assert!(report.failed.is_empty());

    let event = events.try_recv().unwrap();
    assert_eq!(event.descriptor().name(), "templates");
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_subscriber_sees_every_event_of_a_large_batch() {
    let tree = ExtensionTree::new();
    for i in 0..100 {
        tree.add_extension(&format!("ext{i:03}"), &format!("ext{i:03}"), &[]);
    }
    let loader = StaticLoader::<RecordingHost>::new().with("main.sh", |_, _| Ok(()));
    let mut registry = registry_with(RegistryOptions::new(tree.root()), loader);
    let mut events = registry.subscribe();

    let report = registry.init().await.unwrap();

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event.descriptor().name().to_string());
    }
    assert_eq!(report.activated.len(), 100);
    assert_eq!(received, report.activated);
}

#[tokio::test]
async fn test_failing_entry_point_does_not_stop_the_batch() {
    let tree = sample_tree();
    let loader = recording_loader().with("templates.rs", |_, _| Err("template engine missing".into()));
    let mut registry = registry_with(RegistryOptions::new(tree.root()), loader);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    registry.on_extension_registered(move |ext| sink.lock().unwrap().push(ext.name().to_string()));

    let report = registry.init().await.unwrap();

    assert_eq!(report.failed, vec!["templates"]);
    assert_eq!(report.activated, vec!["charts", "pdf-export"]);
    assert!(!registry.get("templates").unwrap().is_registered);
    assert_eq!(*seen.lock().unwrap(), vec!["charts", "pdf-export"]);
}

#[tokio::test]
async fn test_panicking_entry_point_is_contained() {
    let tree = sample_tree();
    let loader = recording_loader().with("charts.rs", |_, _| panic!("charts exploded"));
    let mut registry = registry_with(RegistryOptions::new(tree.root()), loader);

    let report = registry.init().await.unwrap();

    assert_eq!(report.failed, vec!["charts"]);
    assert_eq!(names(registry.extensions()), vec!["templates", "pdf-export"]);
}

#[tokio::test]
async fn test_missing_entry_point_counts_as_failure() {
    let tree = sample_tree();
    tree.add_extension_with_main("d-orphan", "orphan", "nowhere.rs", &[]);
    let mut registry = registry_with(RegistryOptions::new(tree.root()), recording_loader());

    let report = registry.init().await.unwrap();

    assert_eq!(report.failed, vec!["orphan"]);
    assert_eq!(registry.extensions().len(), 3);
}

#[tokio::test]
async fn test_empty_names_are_skipped() {
    let tree = sample_tree();
    let options = RegistryOptions::new(tree.root()).with_extensions(["", "charts", ""]);
    let mut registry = registry_with(options, recording_loader());

    let report = registry.init().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.activated, vec!["charts"]);
    assert_eq!(registry.host().calls(), vec!["charts"]);
}

#[tokio::test]
async fn test_options_are_attached_by_name() {
    let tree = sample_tree();
    let options = RegistryOptions::new(tree.root())
        .with_extension_options("pdf-export", json!({ "margin": 10 }));

    let received = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&received);
    let loader = recording_loader().with("pdf.rs", move |_, ext| {
        *slot.lock().unwrap() = ext.options.clone();
        Ok(())
    });
    let mut registry = registry_with(options, loader);

    registry.init().await.unwrap();

    assert_eq!(*received.lock().unwrap(), Some(json!({ "margin": 10 })));
    assert_eq!(
        registry.get("pdf-export").unwrap().options,
        Some(json!({ "margin": 10 }))
    );
    assert_eq!(registry.get("templates").unwrap().options, None);
}

#[tokio::test]
async fn test_active_view_tracks_descriptor_flags() {
    let tree = sample_tree();
    let mut registry = registry_with(RegistryOptions::new(tree.root()), recording_loader());
    registry.init().await.unwrap();

    registry
        .available_extensions_mut()
        .iter_mut()
        .find(|d| d.name() == "charts")
        .unwrap()
        .is_registered = false;

    let expected: Vec<&str> = registry
        .available_extensions()
        .iter()
        .filter(|d| d.is_registered)
        .map(|d| d.name())
        .collect();
    assert_eq!(names(registry.extensions()), expected);
    assert_eq!(names(registry.extensions()), vec!["templates", "pdf-export"]);
}

#[tokio::test]
async fn test_use_extensions_after_init() {
    let tree = sample_tree();
    let options = RegistryOptions::new(tree.root()).with_extensions(["templates"]);
    let mut registry = registry_with(options, recording_loader());
    registry.init().await.unwrap();

    let descriptor = registry.get("charts").unwrap().clone();
    let report = registry.use_extensions(&descriptor);

    assert_eq!(report.activated, vec!["charts"]);
    assert_eq!(names(registry.extensions()), vec!["templates", "charts"]);
}

#[tokio::test]
async fn test_shared_cache_ignores_second_root() {
    let first = sample_tree();
    let second = ExtensionTree::new();
    second.add_extension_with_main("other", "other", "other.rs", &[]);

    let cache = Arc::new(DiscoveryCache::new());
    let mut one = ExtensionRegistry::with_cache(
        Arc::new(RecordingHost::default()),
        RegistryOptions::new(first.root()).with_cache(true),
        Arc::new(recording_loader()),
        Arc::clone(&cache),
    );
    let mut two = ExtensionRegistry::with_cache(
        Arc::new(RecordingHost::default()),
        RegistryOptions::new(second.root()).with_cache(true),
        Arc::new(recording_loader()),
        Arc::clone(&cache),
    );

    one.init().await.unwrap();
    two.init().await.unwrap();

    assert_eq!(
        names(one.available_extensions()),
        names(two.available_extensions())
    );
    assert!(two.get("other").is_none());
    // Activation state is per registry, not shared through the cache.
    assert_eq!(two.host().calls(), vec!["templates", "charts", "pdf-export"]);
}

#[tokio::test]
async fn test_bad_manifest_rejects_init() {
    let tree = sample_tree();
    tree.write_manifest("broken", "extman.config.json", "{ \"name\": ");
    let mut registry = registry_with(RegistryOptions::new(tree.root()), recording_loader());

    let err = registry.init().await.unwrap_err();

    assert!(matches!(err, Error::ManifestParse { .. }), "got: {err:?}");
    assert_eq!(registry.state(), RegistryState::Uninitialized);
    assert!(registry.host().calls().is_empty());
}

#[tokio::test]
async fn test_manifest_missing_main_rejects_init() {
    let tree = ExtensionTree::new();
    tree.write_manifest("x", "extman.config.yaml", "name: x\n");
    let mut registry = registry_with(RegistryOptions::new(tree.root()), recording_loader());

    let err = registry.init().await.unwrap_err();

    assert!(
        matches!(err, Error::ManifestParse { .. } | Error::InvalidManifest { .. }),
        "got: {err:?}"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_loader_runs_script_entry_points() {
    use extman_core::ProcessLoader;

    let tree = ExtensionTree::new();
    tree.add_script_extension("hello", "hello", &[], "echo \"$EXTMAN_EXTENSION_NAME\" > ran.txt");
    tree.add_script_extension("sad", "sad", &[], "exit 1");

    let mut registry = ExtensionRegistry::with_cache(
        Arc::new(()),
        RegistryOptions::new(tree.root()),
        Arc::new(ProcessLoader::new()),
        Arc::new(DiscoveryCache::new()),
    );

    let report = registry.init().await.unwrap();

    assert_eq!(report.activated, vec!["hello"]);
    assert_eq!(report.failed, vec!["sad"]);
    tree.assert_file_contains("hello/ran.txt", "hello");
}
