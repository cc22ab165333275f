// tests/watch_mode.rs

use std::error::Error;
use std::time::Duration;

use melter::config::PluginSpec;
use melter::errors::MelterError;
use melter::types::AssetAction;
use melter::{melter, melter_with_plugins};
use melter_test_utils::{
    HookLog, RecordingPlugin, ThemeFixture, eventually, init_tracing, with_timeout,
};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn injected_changes_are_compiled_before_close() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let log = HookLog::default();
    let compiler = melter_with_plugins(
        theme.config().build(),
        vec![Box::new(RecordingPlugin::new(log.clone()))],
    );
    let handle = compiler.handle();

    let driver = async {
        let icon = theme.write("snippets/icon.liquid", "<svg/>");
        handle.file_changed(AssetAction::Add, icon).await;

        let header = theme.remove("sections/header.liquid");
        handle.file_changed(AssetAction::Remove, header).await;

        handle.close().await;
    };

    let (result, ()) = with_timeout(async { tokio::join!(compiler.watch(), driver) }).await;
    result?;

    assert_eq!(
        theme.read_output("snippets/icon.liquid").as_deref(),
        Some(&b"<svg/>"[..])
    );
    assert!(!theme.output_exists("sections/header.liquid"));
    assert!(theme.output_exists("assets/theme.css"));

    assert_eq!(log.count("watcherStart"), 1);
    assert_eq!(log.count("watcherClose"), 1);
    assert_eq!(log.phases().last().map(String::as_str), Some("watcherClose"));
    Ok(())
}

#[tokio::test]
async fn changes_outside_the_input_are_ignored() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let compiler = melter(theme.config().build());
    let handle = compiler.handle();

    let driver = async {
        let outside = theme.root().join("notes/sections/x.liquid");
        handle.file_changed(AssetAction::Add, outside).await;
        handle.close().await;
    };

    let (result, ()) = with_timeout(async { tokio::join!(compiler.watch(), driver) }).await;
    result?;

    assert!(!theme.output_exists("sections/x.liquid"));
    assert!(theme.output_exists("sections/header.liquid"));
    Ok(())
}

#[tokio::test]
async fn removal_frees_the_slot_for_a_new_source() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::new();
    theme.write("theme-a/sections/header.liquid", "A");
    let compiler = melter(theme.config().build());
    let handle = compiler.handle();

    let driver = async {
        // Collides with theme-a while it exists.
        let b = theme.write("theme-b/sections/header.liquid", "B");
        handle.file_changed(AssetAction::Add, b.clone()).await;

        let a = theme.remove("theme-a/sections/header.liquid");
        handle.file_changed(AssetAction::Remove, a).await;

        handle.file_changed(AssetAction::Update, b).await;
        handle.close().await;
    };

    let (result, ()) = with_timeout(async { tokio::join!(compiler.watch(), driver) }).await;
    result?;

    assert_eq!(
        theme.read_output("sections/header.liquid").as_deref(),
        Some(&b"B"[..])
    );
    Ok(())
}

#[tokio::test]
async fn second_concurrent_watch_is_rejected() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let compiler = melter(theme.config().build());
    let handle = compiler.handle();

    let second = async {
        let rejected = compiler.watch().await;
        handle.close().await;
        rejected
    };

    let (first, second) = with_timeout(async { tokio::join!(compiler.watch(), second) }).await;
    first?;
    assert!(matches!(second, Err(MelterError::AlreadyRunning)));
    Ok(())
}

#[tokio::test]
async fn watch_can_be_restarted_after_close() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let log = HookLog::default();
    let compiler = melter_with_plugins(
        theme.config().build(),
        vec![Box::new(RecordingPlugin::new(log.clone()))],
    );

    for _ in 0..2 {
        let handle = compiler.handle();
        let (result, ()) =
            with_timeout(async { tokio::join!(compiler.watch(), handle.close()) }).await;
        result?;
    }

    assert_eq!(log.count("watcherStart"), 2);
    assert_eq!(log.count("watcherClose"), 2);
    Ok(())
}

#[tokio::test]
async fn bailed_compiler_refuses_to_watch() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let config = theme
        .config()
        .plugin(PluginSpec::new("nope"))
        .build_unchecked();
    let compiler = melter(config);

    let result = with_timeout(compiler.watch()).await;

    assert!(matches!(result, Err(MelterError::Bail(_))));
    assert!(!theme.output().exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_system_events_reach_the_output() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let compiler = melter(theme.config().build());
    let handle = compiler.handle();

    let driver = async {
        let initial = eventually(Duration::from_secs(5), || {
            theme.output_exists("sections/header.liquid")
        })
        .await;
        // Give the OS watcher a moment to register before touching files.
        tokio::time::sleep(Duration::from_millis(200)).await;
        theme.write("snippets/live.liquid", "live");
        let delivered = eventually(Duration::from_secs(10), || {
            theme.read_output("snippets/live.liquid").as_deref() == Some(&b"live"[..])
        })
        .await;
        handle.close().await;
        (initial, delivered)
    };

    let (result, (initial, delivered)) = tokio::join!(compiler.watch(), driver);
    result?;
    assert!(initial, "initial build never landed");
    assert!(delivered, "file system change never reached the output");
    Ok(())
}
