//! Address Atlas command line front end
//!
//! Extracts three-word addresses from text, scans label images through the
//! demo recognition engine and prints the ranked delivery route.

use anyhow::Context;
use atlas_core::types::{Delivery, NewDeliveryEvent, OcrLanguage, SortKey};
use atlas_core::{
    delivery_channel, format_distance_km, sample_deliveries, AddressExtractor, AtlasConfig,
    AtlasError, DeliveryList, ImageInput, MockOcrEngine, ProgressReporter, ScanSettings,
    ScanWorkflow, StaticGeocoder,
};
use chrono::{Local, Utc};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type DemoWorkflow = ScanWorkflow<MockOcrEngine, StaticGeocoder>;

#[tokio::main]
async fn main() {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let matches = cli().get_matches();

    if let Err(e) = run(&matches).await {
        match e.downcast_ref::<AtlasError>() {
            Some(atlas_error) => {
                log::error!("{}", atlas_error);
                eprintln!("{}", atlas_error.operator_message());
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn cli() -> Command {
    Command::new("address-atlas")
        .version("1.0.0")
        .about("Three-word address scanner and delivery planner")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file path")
                .global(true)
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("extract")
                .about("Print every three-word address found in TEXT")
                .arg(
                    Arg::new("text")
                        .value_name("TEXT")
                        .help("Recognized label text")
                        .required(true)
                )
        )
        .subcommand(
            Command::new("scan")
                .about("Scan a label image and print the detected address")
                .arg(
                    Arg::new("image")
                        .value_name("IMAGE")
                        .help("Label image file")
                        .required(true)
                )
                .arg(
                    Arg::new("language")
                        .long("language")
                        .short('l')
                        .value_name("CODE")
                        .help("Recognition language: eng, mon or eng+mon")
                )
        )
        .subcommand(
            Command::new("route")
                .about("Show the delivery list in route order")
                .arg(
                    Arg::new("sort-by")
                        .long("sort-by")
                        .value_name("KEY")
                        .help("Sort key: distance, duration or created-at")
                )
                .arg(
                    Arg::new("scan")
                        .long("scan")
                        .value_name("IMAGE")
                        .help("Scan IMAGE and add it to the list (repeatable)")
                        .action(ArgAction::Append)
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the ranked list as JSON")
                        .action(ArgAction::SetTrue)
                )
        )
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(matches.get_one::<String>("config"))?;

    match matches.subcommand() {
        Some(("extract", sub)) => extract(&config, sub),
        Some(("scan", sub)) => scan(&config, sub).await,
        Some(("route", sub)) => route(&config, sub).await,
        _ => anyhow::bail!("No command specified. Use --help for options."),
    }
}

fn load_config(path: Option<&String>) -> anyhow::Result<AtlasConfig> {
    match path {
        Some(path) => {
            let config = AtlasConfig::from_file(path)?;
            log::info!("Loaded configuration from {}", path);
            Ok(config)
        }
        None => {
            log::debug!("No configuration file given, using defaults");
            Ok(AtlasConfig::default())
        }
    }
}

fn demo_workflow(config: &AtlasConfig, settings: ScanSettings) -> DemoWorkflow {
    ScanWorkflow::new(
        MockOcrEngine::demo(),
        StaticGeocoder::demo(config.base_location(), config.geocoder.jitter_degrees),
        settings,
    )
}

/// Cancels `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling scan");
            token.cancel();
        }
    });
}

fn progress_logger(label: String) -> ProgressReporter {
    ProgressReporter::from_fn(move |percent| log::info!("{}: {}%", label, percent))
}

fn extract(config: &AtlasConfig, matches: &ArgMatches) -> anyhow::Result<()> {
    let text = matches.get_one::<String>("text").context("TEXT is required")?;
    let candidates = AddressExtractor::new().extract(text);

    if candidates.is_empty() {
        return Err(AtlasError::NoAddressFound {
            preview: atlas_core::services::address_extractor::preview(text, config.extraction.preview_chars),
        }
        .into());
    }

    for candidate in candidates {
        println!("{}", candidate);
    }
    Ok(())
}

async fn scan(config: &AtlasConfig, matches: &ArgMatches) -> anyhow::Result<()> {
    let path = matches.get_one::<String>("image").context("IMAGE is required")?;

    let mut settings = ScanSettings::from_config(config);
    if let Some(code) = matches.get_one::<String>("language") {
        settings.language = code.parse::<OcrLanguage>()?;
    }

    let image = ImageInput::from_path(path)?;
    let workflow = demo_workflow(config, settings);

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let result = workflow.scan(&image, &progress_logger(path.clone()), &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn route(config: &AtlasConfig, matches: &ArgMatches) -> anyhow::Result<()> {
    let sort_by = match matches.get_one::<String>("sort-by") {
        Some(key) => key.parse::<SortKey>()?,
        None => config.deliveries.default_sort,
    };

    let mut list = DeliveryList::from_config(config);
    for delivery in sample_deliveries(Utc::now()) {
        list.insert(delivery)?;
    }

    let images: Vec<String> = matches
        .get_many::<String>("scan")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    if !images.is_empty() {
        list = scan_into_list(config, list, &images).await?;
    }

    let ranked = list.ranked(sort_by);
    log::info!("{} deliveries ranked by {}", ranked.len(), sort_by);

    if matches.get_flag("json") {
        print_json(&list, &ranked)?;
    } else {
        print_table(&list, &ranked);
    }
    Ok(())
}

/// Scan every image and hand the results to a list owner task over the
/// delivery channel
async fn scan_into_list(
    config: &AtlasConfig,
    mut list: DeliveryList,
    images: &[String],
) -> anyhow::Result<DeliveryList> {
    let workflow = demo_workflow(config, ScanSettings::from_config(config));
    let (tx, mut rx) = delivery_channel();

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let listener_cancel = cancel.clone();
    let listener = tokio::spawn(async move {
        let added = list.run(&mut rx, &listener_cancel).await;
        log::info!("Delivery list received {} new deliveries", added);
        list
    });

    for path in images {
        match scan_and_accept(&workflow, path, &tx, &cancel).await {
            Ok(event) => println!("Added {} from {}", event.address, path),
            Err(AtlasError::Cancelled) => return Err(AtlasError::Cancelled.into()),
            Err(e) => {
                log::warn!("Skipping {}: {}", path, e);
                eprintln!("{}: {}", path, e.operator_message());
            }
        }
    }

    drop(tx);
    listener.await.context("Delivery list task failed")
}

async fn scan_and_accept(
    workflow: &DemoWorkflow,
    path: &str,
    tx: &mpsc::Sender<NewDeliveryEvent>,
    cancel: &CancellationToken,
) -> atlas_core::Result<NewDeliveryEvent> {
    let image = ImageInput::from_path(path)?;
    let result = workflow.scan(&image, &progress_logger(path.to_string()), cancel).await?;
    workflow.accept(&result, tx).await
}

fn print_table(list: &DeliveryList, ranked: &[Delivery]) {
    println!(
        "{:>3}  {:<11}  {:<28}  {:>9}  {:>7}  {}",
        "#", "STATUS", "ADDRESS", "DISTANCE", "MINUTES", "ADDED"
    );

    for (position, delivery) in ranked.iter().enumerate() {
        let minutes = delivery
            .estimated_minutes
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:>3}  {:<11}  {:<28}  {:>9}  {:>7}  {}",
            position + 1,
            delivery.status,
            delivery.address,
            format_distance_km(list.distance_km(delivery)),
            minutes,
            delivery.created_at.with_timezone(&Local).format("%H:%M")
        );
    }

    let summary = list.summary();
    println!();
    println!(
        "{} pending, {} in transit, {} delivered ({} total)",
        summary.pending,
        summary.in_transit,
        summary.delivered,
        summary.total()
    );
}

fn print_json(list: &DeliveryList, ranked: &[Delivery]) -> anyhow::Result<()> {
    let rows: Vec<serde_json::Value> = ranked
        .iter()
        .enumerate()
        .map(|(position, delivery)| {
            serde_json::json!({
                "position": position + 1,
                "delivery": delivery,
                "distance_km": list.distance_km(delivery),
            })
        })
        .collect();

    let output = serde_json::json!({
        "base_location": list.base_location(),
        "deliveries": rows,
        "summary": list.summary(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_route_accepts_repeated_scans() {
        let matches = cli()
            .try_get_matches_from([
                "address-atlas", "route", "--sort-by", "duration", "--scan", "a.png", "--scan", "b.jpg",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "route");

        let scans: Vec<&String> = sub.get_many::<String>("scan").unwrap().collect();
        assert_eq!(scans, vec!["a.png", "b.jpg"]);
        assert_eq!(sub.get_one::<String>("sort-by").unwrap().parse::<SortKey>().unwrap(), SortKey::Duration);
    }

    #[test]
    fn test_config_flag_is_global() {
        let matches = cli()
            .try_get_matches_from(["address-atlas", "extract", "///filled.count.soap", "--config", "atlas.json"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("config").unwrap(), "atlas.json");
    }

    #[test]
    fn test_extract_without_address_reports_preview() {
        let config = AtlasConfig::default();
        let matches = cli()
            .try_get_matches_from(["address-atlas", "extract", "no address here"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();

        let err = extract(&config, sub).unwrap_err();
        let atlas_error = err.downcast_ref::<AtlasError>().unwrap();
        assert!(atlas_error.operator_message().ends_with("no address here"));
    }
}
