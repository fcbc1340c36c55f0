mod bootstrap;

use std::io::Write;

use anyhow::{Context, Result};
use flowmap_core::formatting::{format_count, format_net_flow, frame_file_name, frame_title};
use flowmap_core::models::Region;
use flowmap_core::regions::region_label;
use flowmap_core::settings::Settings;
use flowmap_data::analysis::{load_dataset, DatasetPaths};
use flowmap_render::boundaries::load_boundaries;
use flowmap_render::colormap::ValueScale;
use flowmap_render::map::{MapFrame, MapRenderer};
use flowmap_render::style::MapStyle;

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("flowmap v{} starting", env!("CARGO_PKG_VERSION"));

    let format = settings.output_format()?;
    let cell_base = settings.cell_index_base()?;
    tracing::info!(
        "Frames: {} years x {} days, format: {}, colour scale: {}..{}",
        settings.years,
        settings.days,
        format.extension(),
        settings.value_min,
        settings.value_max
    );

    let style = match &settings.style {
        Some(path) => MapStyle::load(path)?,
        None => MapStyle::default(),
    };

    // Load and aggregate the inputs.
    let dataset = load_dataset(&DatasetPaths {
        observations: settings.observations.clone(),
        reconstruction: settings.reconstruction.clone(),
        cell_base,
    })?;
    tracing::debug!(
        "Dataset loaded in {:.3}s, aggregated in {:.3}s",
        dataset.metadata.load_time_seconds,
        dataset.metadata.aggregate_time_seconds
    );

    let boundaries = match &settings.boundaries {
        Some(path) => load_boundaries(path)?,
        None => {
            tracing::warn!("No boundary file given; drawing graticule and arrows only");
            Vec::new()
        }
    };
    let renderer = MapRenderer::new(style, &boundaries)?;

    if !settings.preview {
        bootstrap::ensure_output_dir(&settings.output_dir)?;
    }

    let scale = ValueScale::new(settings.value_min, settings.value_max);
    let mut rendered = 0usize;

    for key in settings.frame_keys() {
        tracing::info!("Year {} Day {}", key.year, key.day);

        let frame = dataset.frame(key);
        tracing::debug!(
            "{} birds observed, {} non-zero flows",
            format_count(frame.total_observed()),
            frame.net_flows().count()
        );
        for region in Region::all() {
            let net = dataset.aggregator.net_outflow(key, region);
            if net != 0 {
                tracing::debug!("  {}: {}", region_label(region), format_net_flow(net));
            }
        }

        let title = frame_title(key);
        let map_frame = MapFrame::new(&frame, scale, &title);

        if settings.preview {
            let svg = renderer.render_svg_string(&map_frame)?;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(svg.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .context("writing preview to stdout")?;
        } else {
            let path = settings.output_dir.join(frame_file_name(key, format));
            renderer.render(&path, format, &map_frame)?;
            tracing::debug!("Wrote {}", path.display());
        }
        rendered += 1;
    }

    tracing::info!("Rendered {} frames", rendered);
    Ok(())
}
