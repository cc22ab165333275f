// tests/end_to_end.rs

use std::error::Error;
use std::fs;

use indexmap::IndexSet;
use melter::config::{PluginSpec, validate_config};
use melter::errors::MelterError;
use melter::types::{AssetAction, AssetType};
use melter::{melter, melter_with_plugins};
use melter_test_utils::{
    CompilerConfigBuilder, HookLog, RecordingPlugin, ThemeFixture, init_tracing,
};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn build_emits_classified_files_into_typed_layout() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();

    let stats = melter(theme.config().build()).build().await?;

    assert!(stats.errors.is_empty(), "errors: {:?}", stats.errors);
    assert!(stats.warnings.is_empty(), "warnings: {:?}", stats.warnings);
    assert_eq!(
        theme.output_files(),
        [
            "assets/theme.css",
            "sections/header.liquid",
            "templates/customers/account.liquid",
        ]
    );
    assert_eq!(
        theme.read_output("sections/header.liquid").as_deref(),
        Some(&b"<header>Hello, world</header>"[..])
    );
    assert_eq!(
        theme.read_output("templates/customers/account.liquid").as_deref(),
        Some(&b"{{ customer.name }}"[..])
    );
    Ok(())
}

#[tokio::test]
async fn unclassified_files_are_dropped_silently() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();

    let stats = melter(theme.config().build()).build().await?;

    assert!(!stats.assets.iter().any(|a| a.contains("README")));
    assert!(!theme.output_exists("README.md"));
    assert!(stats.warnings.is_empty());
    Ok(())
}

#[tokio::test]
async fn rebuilding_unchanged_input_is_idempotent() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let compiler = melter(theme.config().build());

    compiler.build().await?;
    let first = theme.output_files();
    let header = theme.read_output("sections/header.liquid");

    let stats = compiler.build().await?;

    assert!(stats.errors.is_empty());
    assert_eq!(theme.output_files(), first);
    assert_eq!(theme.read_output("sections/header.liquid"), header);
    Ok(())
}

#[tokio::test]
async fn without_output_nothing_is_emitted() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let log = HookLog::default();

    let compiler = melter_with_plugins(
        theme.config().without_output().build(),
        vec![Box::new(RecordingPlugin::new(log.clone()))],
    );
    let stats = compiler.build().await?;

    assert!(stats.errors.is_empty());
    assert!(log.position("afterCompile").is_some());
    assert!(log.position("done").is_some());
    assert_eq!(log.position("beforeEmit"), None);
    assert_eq!(log.position("emitter"), None);
    assert!(!theme.output().exists());
    Ok(())
}

#[tokio::test]
async fn colliding_sources_keep_the_first_and_warn() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::new();
    theme.write("theme-a/sections/header.liquid", "A");
    theme.write("theme-b/sections/header.liquid", "B");

    let stats = melter(theme.config().build()).build().await?;

    assert_eq!(stats.warnings.len(), 1, "warnings: {:?}", stats.warnings);
    assert!(stats.warnings[0].contains("theme-b/sections/header.liquid"));
    assert!(stats.warnings[0].contains("already exists in 'theme-a/sections/header.liquid'"));
    assert_eq!(theme.output_files(), ["sections/header.liquid"]);
    assert_eq!(theme.read_output("sections/header.liquid").as_deref(), Some(&b"A"[..]));
    Ok(())
}

#[tokio::test]
async fn clean_empties_output_and_lays_out_type_directories() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    fs::create_dir_all(theme.output().join("old"))?;
    fs::write(theme.output().join("old/stale.liquid"), "stale")?;
    fs::write(theme.output().join("stale.txt"), "stale")?;

    melter(theme.config().clean(true).build()).build().await?;

    assert!(!theme.output_exists("stale.txt"));
    assert!(!theme.output_exists("old"));
    for ty in AssetType::CLASSIFIED {
        assert!(
            theme.output().join(ty.as_str()).is_dir(),
            "missing directory for {ty}"
        );
    }
    assert!(theme.output_exists("sections/header.liquid"));
    Ok(())
}

#[tokio::test]
async fn ignored_sources_are_never_emitted() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    theme.write("sections/draft.liquid", "draft");

    let stats = melter(theme.config().ignore("**/draft.liquid").build())
        .build()
        .await?;

    assert!(stats.warnings.is_empty());
    assert!(theme.output_exists("sections/header.liquid"));
    assert!(!theme.output_exists("sections/draft.liquid"));
    Ok(())
}

#[tokio::test]
async fn configured_replace_plugin_rewrites_output_only() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let config = theme
        .config()
        .plugin(
            PluginSpec::new("replace")
                .with_option("from", "Hello")
                .with_option("to", "Hi"),
        )
        .build();

    let stats = melter(config).build().await?;

    assert!(stats.errors.is_empty(), "errors: {:?}", stats.errors);
    assert_eq!(
        theme.read_output("sections/header.liquid").as_deref(),
        Some(&b"<header>Hi, world</header>"[..])
    );
    assert_eq!(
        fs::read_to_string(theme.input().join("sections/header.liquid"))?,
        "<header>Hello, world</header>"
    );
    Ok(())
}

#[tokio::test]
async fn unknown_configured_plugin_bails_the_build() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let config = theme
        .config()
        .plugin(PluginSpec::new("does-not-exist"))
        .build_unchecked();

    let compiler = melter(config);
    assert!(compiler.is_bailed());

    match compiler.build().await {
        Err(MelterError::Bail(reason)) => assert!(reason.contains("does-not-exist")),
        other => panic!("expected Bail, got {other:?}"),
    }
    assert!(!theme.output().exists());
    Ok(())
}

#[tokio::test]
async fn output_nested_in_input_refuses_to_build() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::new();
    theme.write("sections/header.liquid", "v1");
    let dist = theme.input().join("dist");
    let config = CompilerConfigBuilder::new(theme.input(), &dist).build_unchecked();

    assert!(validate_config(&config).is_err());
    match melter(config).build().await {
        Err(MelterError::Bail(reason)) => assert!(reason.contains("outside input")),
        other => panic!("expected Bail, got {other:?}"),
    }
    assert!(!dist.exists());
    assert_eq!(
        fs::read_to_string(theme.input().join("sections/header.liquid"))?,
        "v1"
    );
    Ok(())
}

#[tokio::test]
async fn disabled_paths_admit_everything_but_emit_nothing() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();

    let stats = melter(theme.config().without_paths().build()).build().await?;

    assert_eq!(stats.assets.len(), 4);
    assert_eq!(stats.warnings.len(), 4, "warnings: {:?}", stats.warnings);
    assert!(
        stats
            .warnings
            .iter()
            .all(|w| w.starts_with("Missing target path:"))
    );
    assert!(theme.output_files().is_empty());
    Ok(())
}

#[tokio::test]
async fn compiling_an_unclassified_path_warns_about_missing_target() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let compiler = melter(theme.config().build());

    let compilation = compiler
        .compile(AssetAction::Add, IndexSet::from(["README.md".to_string()]))
        .await;

    assert_eq!(compilation.assets().len(), 1);
    assert_eq!(compilation.assets()[0].asset_type, AssetType::Unclassified);
    assert_eq!(
        compilation.stats.warnings,
        ["Missing target path: 'README.md'"]
    );
    assert!(!theme.output_exists("README.md"));
    Ok(())
}

#[tokio::test]
async fn compiling_a_removal_deletes_the_emitted_file() -> TestResult {
    init_tracing();
    let theme = ThemeFixture::standard();
    let compiler = melter(theme.config().build());
    compiler.build().await?;
    assert!(theme.output_exists("sections/header.liquid"));

    theme.remove("sections/header.liquid");
    let compilation = compiler
        .compile(
            AssetAction::Remove,
            IndexSet::from(["sections/header.liquid".to_string()]),
        )
        .await;

    assert!(compilation.stats.errors.is_empty());
    assert!(!theme.output_exists("sections/header.liquid"));
    assert!(theme.output_exists("assets/theme.css"));
    Ok(())
}
