use clap::{Arg, Command};
use page_i18n::{
    EngineConfig, HtmlDocument, LanguageBinding, MemoryStore, PassOutcome, ProviderConfig,
    SOURCE_LANGUAGE, language,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::LocalSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("page-translate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate the text of an HTML page in place")
        .arg(
            Arg::new("html-file")
                .help("HTML page authored in Romanian")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("target")
                .help("Target language code (ro, en, de, fr, it, es, hu)")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("route")
                .long("route")
                .short('r')
                .help("Route path the page was rendered for")
                .default_value("/"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON engine configuration")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of the configured providers")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .short('s')
                .help("Directory for the translation cache and selected language")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("restore")
                .long("restore")
                .help("Switch back to Romanian before printing, as a round-trip check")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every pass and batch")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let default_filter = if matches.get_flag("verbose") {
        "page_i18n=debug,page_i18n_mt=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let html_file = matches
        .get_one::<String>("html-file")
        .ok_or("missing html file")?;
    let target = language::resolve(matches.get_one::<String>("target").ok_or("missing target")?)?;
    let route = matches
        .get_one::<String>("route")
        .cloned()
        .unwrap_or_else(|| "/".to_string());
    let use_mock = matches.get_flag("mock");
    let restore = matches.get_flag("restore");

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    }
    .with_env_overrides();
    if let Some(dir) = matches.get_one::<PathBuf>("store") {
        config.store_dir = Some(dir.clone());
    }
    if use_mock {
        config.primary = ProviderConfig::Mock;
        config.secondary = None;
    }
    // The page is fully parsed before the route event, nothing to wait for
    config.settle_delay_ms = 0;

    let html = std::fs::read_to_string(html_file)?;
    let document = HtmlDocument::parse(&html);

    let binding = if use_mock && matches.get_one::<PathBuf>("store").is_none() {
        // Keep mock output out of the real cache
        LanguageBinding::with_store(
            &config,
            document.clone(),
            config.build_gateway()?,
            Arc::new(MemoryStore::new()),
        )
    } else {
        LanguageBinding::from_config(&config, document.clone())?
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    LocalSet::new().block_on(&runtime, async {
        let captured = binding.notify_route_changed(route.as_str()).await?;
        info!(route = %route, outcome = ?captured, "route settled");

        match binding.select_language(target.code)?.await? {
            PassOutcome::Translated { language, stats } => info!(
                language = %language,
                entries = stats.entries,
                from_cache = stats.from_cache,
                from_gateway = stats.from_gateway,
                failed = stats.failed,
                "page translated"
            ),
            other => info!(outcome = ?other, "language applied"),
        }

        if restore {
            binding.select_language(SOURCE_LANGUAGE)?.await?;
        }
        Ok::<_, Box<dyn std::error::Error>>(())
    })?;

    println!("{}", document.to_html()?);
    Ok(())
}
