//! The two processing pipelines behind the CLI subcommands.

use crate::config::{ChoroplethConfig, MosaicConfig};
use crate::{CliError, Result};
use terramap_choropleth::{
    join, load_geometries_from_file, save_svg, AttributeTable, ChoroplethLayer, JoinReport, Layer,
    Legend, QuantileScale, RegionGeometry, SvgOptions, TooltipLayer, WebMap, WfsClient,
};
use terramap_raster::{discover_tiles, merge_files, write_raster};
use tracing::{debug, info};

/// What [`run_mosaic`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicSummary {
    /// Number of input tiles.
    pub tile_count: usize,
    pub width: u32,
    pub height: u32,
}

/// Discover tiles, merge them and write the mosaic.
pub fn run_mosaic(config: &MosaicConfig) -> Result<MosaicSummary> {
    let paths = discover_tiles(&config.input_dir, &config.pattern)?;
    info!(
        "Found {} tiles matching '{}' in {}",
        paths.len(),
        config.pattern,
        config.input_dir.display()
    );

    let (mosaic, template) = merge_files(&paths)?;
    let profile = template.updated_for(&mosaic);
    write_raster(&config.output, &profile, mosaic.data())?;
    info!("Wrote mosaic to {}", config.output.display());

    Ok(MosaicSummary {
        tile_count: paths.len(),
        width: profile.width,
        height: profile.height,
    })
}

/// What [`run_choropleth`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethSummary {
    /// Join counts and unmatched keys.
    pub report: JoinReport,
    /// Quantile class breaks.
    pub breaks: Vec<f64>,
}

fn load_geometries(config: &ChoroplethConfig) -> Result<Vec<RegionGeometry>> {
    if let Some(path) = &config.geometry_file {
        return Ok(load_geometries_from_file(path, &config.id_property)?);
    }
    match config.wfs.request()? {
        Some(request) => {
            let client = WfsClient::with_timeout(config.wfs.timeout())?;
            Ok(client.fetch_geometries(&request, &config.id_property)?)
        }
        None => Err(CliError::Config(
            "no geometry source: set choropleth.geometry_file or choropleth.wfs.url".to_string(),
        )),
    }
}

/// Load attributes and geometries, join them, classify the value column and
/// write the static and interactive maps.
pub fn run_choropleth(config: &ChoroplethConfig) -> Result<ChoroplethSummary> {
    // Validate settings before any I/O
    let palette = config.palette()?;
    let missing = config.missing_color()?;
    let tiles = config.map.tile_provider()?;

    let mut table =
        AttributeTable::from_path(&config.csv_path, &config.key_column, config.delimiter_byte()?)?;
    table.require_column(&config.value_column)?;
    table.strip_key_prefix(config.key_prefix_len)?;

    let geometries = load_geometries(config)?;
    let outcome = join(&table, geometries, config.join_policy())?;

    let values = outcome.numeric_values(&config.value_column);
    debug!(
        "{} of {} joined regions have a value for '{}'",
        values.len(),
        outcome.regions.len(),
        config.value_column
    );
    let scale = QuantileScale::new(&values, config.classes, &palette)?;
    info!("Quantile breaks: {:?}", scale.breaks());

    let svg_options = SvgOptions {
        title: config.legend_name.clone(),
        legend_title: config.legend_name.clone(),
        missing_color: missing,
        ..Default::default()
    };
    save_svg(
        &config.static_output,
        &outcome.regions,
        &config.value_column,
        &scale,
        &svg_options,
    )?;

    let mut tooltip_fields: Vec<(String, String)> = config
        .tooltip_fields
        .iter()
        .map(|field| (field.clone(), field.clone()))
        .collect();
    if !config.tooltip_fields.contains(&config.value_column) {
        tooltip_fields.push((config.value_column.clone(), config.legend_name.clone()));
    }

    let [lat, lon] = config.map.center;
    WebMap::builder((lat, lon), config.map.zoom)
        .title(config.legend_name.as_str())
        .tiles(tiles)
        .add_layer(Layer::Choropleth(ChoroplethLayer::new(
            config.legend_name.as_str(),
            &outcome.regions,
            &config.value_column,
            &scale,
            missing,
        )))
        .add_layer(Layer::Tooltip(TooltipLayer::new(
            "Details",
            &outcome.regions,
            &tooltip_fields,
        )))
        .legend(Legend::from_scale(config.legend_name.as_str(), &scale, missing))
        .layer_control(true)
        .build()
        .save(&config.html_output)?;

    Ok(ChoroplethSummary {
        report: outcome.report,
        breaks: scale.breaks().to_vec(),
    })
}
