//! The `run` and `test` command implementations: rows in, dispatcher
//! through, CSV preview and upserts out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aisle_core::{AisleRecord, AppConfig, ProxyCredentials};
use aisle_scraper::{Dispatcher, ExternalRenderer, Fetcher, FetcherConfig, ProxyPool};
use futures::stream::{self, StreamExt};

/// Process up to `limit` rows from the input table.
pub async fn run_annotation(
    config: &AppConfig,
    limit: Option<i64>,
    preview_only_flag: bool,
) -> anyhow::Result<()> {
    let preview_only = preview_only_flag || config.preview_only;
    let pool = aisle_db::connect_pool_from_env().await?;

    let input_rows = aisle_db::fetch_product_rows(&pool, limit).await?;
    tracing::info!(rows = input_rows.len(), preview_only, "starting annotation run");

    let dispatcher = Arc::new(build_dispatcher(config)?);

    // Run-level cancellation is honored at row boundaries: rows already
    // in flight finish, queued rows are dropped.
    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = Arc::clone(&cancelled);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("cancellation requested — stopping at the next row boundary");
                cancelled.store(true, Ordering::Relaxed);
            }
        });
    }

    let max_concurrent = config.max_concurrent_rows.max(1);
    let results: Vec<(String, Vec<AisleRecord>, bool)> = stream::iter(input_rows)
        .map(|input| {
            let dispatcher = Arc::clone(&dispatcher);
            let cancelled = Arc::clone(&cancelled);
            async move {
                if cancelled.load(Ordering::Relaxed) {
                    return None;
                }
                let Some(row) = input.to_product_row() else {
                    tracing::warn!(
                        product_code = %input.product_code,
                        "store-links cell is unparseable; skipping row"
                    );
                    return Some((input.product_code.clone(), Vec::new(), false));
                };
                let outcome = dispatcher.process_row(&row).await;
                let found = outcome.best.is_some();
                if let Some(best) = &outcome.best {
                    tracing::info!(
                        product_code = %row.product_code,
                        retailer = %best.retailer,
                        score = best.score,
                        trail = %best.aisle(),
                        "row annotated"
                    );
                } else {
                    tracing::info!(product_code = %row.product_code, "no trail found");
                }
                let records = Dispatcher::to_records(&row, &outcome);
                Some((row.product_code.clone(), records, found))
            }
        })
        .buffer_unordered(max_concurrent)
        .filter_map(|r| async move { r })
        .collect()
        .await;

    let processed = results.len();
    let annotated = results.iter().filter(|(_, _, found)| *found).count();
    let records: Vec<AisleRecord> = results
        .into_iter()
        .flat_map(|(_, records, _)| records)
        .collect();

    write_preview(config, &records)?;

    if preview_only {
        tracing::info!(
            processed,
            annotated,
            records = records.len(),
            "preview-only run complete; database untouched"
        );
    } else {
        let (new_count, updated_count) =
            aisle_db::upsert_aisle_records(&pool, &records).await?;
        tracing::info!(
            processed,
            annotated,
            new = new_count,
            updated = updated_count,
            "annotation run complete"
        );
    }

    Ok(())
}

/// Single-URL diagnostic for the `test` command.
pub async fn run_test_url(
    config: &AppConfig,
    url: &str,
    retailer: Option<&str>,
) -> anyhow::Result<()> {
    let dispatcher = build_dispatcher(config)?;
    let outcome = dispatcher.annotate_url(url, retailer).await;

    println!("retailer:    {}", outcome.retailer);
    println!("url:         {}", outcome.url);
    println!("status:      {}", outcome.status.as_str());
    println!("method:      {}", outcome.method);
    println!("score:       {}", outcome.score);
    println!(
        "breadcrumbs: {}",
        if outcome.breadcrumbs.is_empty() {
            "(none)".to_string()
        } else {
            outcome.aisle()
        }
    );
    if !outcome.debug.is_empty() {
        println!("debug:       {}", outcome.debug);
    }
    Ok(())
}

fn build_dispatcher(config: &AppConfig) -> anyhow::Result<Dispatcher> {
    let mut endpoints: Vec<ProxyCredentials> = Vec::new();
    if let Some(primary) = &config.proxy {
        endpoints.push(primary.clone());
    }
    endpoints.extend(config.extra_proxies.iter().cloned());

    let fetcher_config = FetcherConfig {
        min_body_bytes: config.min_body_bytes,
        request_timeout: std::time::Duration::from_secs(config.request_timeout_secs),
        browser_headful: config.ocado_headful,
        ..FetcherConfig::default()
    };
    let fetcher = Arc::new(Fetcher::new(fetcher_config, ProxyPool::new(endpoints)));

    let renderer = match &config.render_api_key {
        Some(key) => Some(Arc::new(ExternalRenderer::new(
            key,
            config.render_daily_quota,
        )?)),
        None => None,
    };

    Ok(Dispatcher::new(fetcher, renderer))
}

fn write_preview(config: &AppConfig, records: &[AisleRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(&config.preview_path)?;
    writer.write_record(["product code", "Store", "Store_link", "aisle"])?;
    for record in records {
        writer.write_record([
            record.product_code.as_str(),
            record.store.as_str(),
            record.store_link.as_str(),
            record.aisle.as_str(),
        ])?;
    }
    writer.flush()?;
    tracing::info!(
        path = %config.preview_path.display(),
        records = records.len(),
        "preview written"
    );
    Ok(())
}
