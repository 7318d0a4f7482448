//! spark-maps demo - runs the full widget against the headless SDK.
//!
//! ```bash
//! MAPS_API_KEY=... RUST_LOG=spark_maps=debug cargo run --bin spark-maps-demo
//! ```

use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spark_maps::{
    start, AppEnv, ConfigError, Document, Fixtures, Handler, HeadlessMaps, LatLng, LoadStatus,
    Loader, LoaderOptions, MapInit, MarkerData, SystemClock, WidgetConfig, MOUNT_POINT_ID,
};

const DEMO_API_KEY: &str = "demo-key";

fn load_config() -> Result<WidgetConfig> {
    match WidgetConfig::from_env() {
        Ok(config) => Ok(config),
        Err(ConfigError::Missing(key)) => {
            warn!(key, "not set, using the demo key against the headless SDK");
            WidgetConfig::from_lookup(|name| match name {
                "MAPS_API_KEY" => Some(DEMO_API_KEY.to_string()),
                other => std::env::var(other).ok(),
            })
            .context("reading widget config")
        }
        Err(err) => Err(err).context("reading widget config"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("spark_maps=info".parse()?))
        .init();

    let config = load_config()?;
    config.log_redacted();

    let api = HeadlessMaps::new();
    let loader = Rc::new(Loader::new(LoaderOptions::from(&config)));
    let fixtures = Fixtures::embedded().context("decoding embedded fixtures")?;

    let document = Document::new();
    let mount = document.create_element("div");
    mount.set_id(MOUNT_POINT_ID);
    document.body().append_child(&mount);

    let env = AppEnv {
        api: Rc::new(api.clone()),
        loader: loader.clone(),
        fixtures: Rc::new(fixtures),
        clock: Rc::new(SystemClock),
        init: MapInit {
            map_id: config.map_id.clone(),
            clickable_icons: false,
        },
        on_marker_click: Some(Handler::new(|data: &MarkerData| {
            info!(id = %data.diff_id, title = ?data.title, "marker clicked");
        })),
    };

    let handle = start(&document, env);
    document.finish_loading();

    if loader.status() != LoadStatus::Success {
        anyhow::bail!("mapping SDK failed to load");
    }

    let map = api
        .maps()
        .first()
        .cloned()
        .context("map was not constructed")?;

    map.settle();
    map.click(LatLng::new(48.8566, 2.3522));
    map.click(LatLng::new(52.52, 13.405));
    map.double_click(LatLng::new(0.0, 0.0));

    if let Some(marker) = api.attached_markers().first() {
        marker.click();
    }

    map.settle();

    info!(
        clicks = handle.state().clicks.get().len(),
        zoom = map.zoom(),
        markers = api.attached_markers().len(),
        constructed = api.markers().len(),
        "demo finished"
    );

    handle.unmount();
    Ok(())
}
