use autocurator_scan::{CdmlPipeline, CliConfig, LocalStorage, ScanEngine, ScanOptions};
use std::fmt::Write as _;
use std::path::Path;
use tempfile::TempDir;

/// Build a representative NetCDF file covering the first year of the
/// collection: a time axis, regular lat/lon axes, a bare bounds dimension
/// and three data variables.
fn create_representative_file(path: &Path) {
    let mut file = netcdf::create(path).unwrap();

    file.add_attribute("institution", "CCSR/NIES").unwrap();
    file.add_attribute("Conventions", "CF-1.0").unwrap();
    file.add_attribute("history", "written by autocurator test fixture")
        .unwrap();
    file.add_attribute("title", "Surface air temperature").unwrap();

    file.add_dimension("time", 12).unwrap();
    file.add_dimension("lat", 4).unwrap();
    file.add_dimension("lon", 8).unwrap();
    file.add_dimension("bnds", 2).unwrap();

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"]).unwrap();
        time_var
            .put_attribute("units", "days since 1979-1-1")
            .unwrap();
        time_var.put_attribute("calendar", "standard").unwrap();
        time_var.put_attribute("axis", "T").unwrap();
        let time_data: Vec<f64> = (0..12).map(|i| 15.5 + i as f64 * 30.0).collect();
        time_var.put_values(&time_data, ..).unwrap();
    }

    {
        let mut lat_var = file.add_variable::<f32>("lat", &["lat"]).unwrap();
        lat_var.put_attribute("units", "degrees_north").unwrap();
        let lat_data: Vec<f32> = (0..4).map(|i| -60.0 + i as f32 * 40.0).collect();
        lat_var.put_values(&lat_data, ..).unwrap();
    }

    {
        let mut lon_var = file.add_variable::<f32>("lon", &["lon"]).unwrap();
        lon_var.put_attribute("units", "degrees_east").unwrap();
        let lon_data: Vec<f32> = (0..8).map(|i| i as f32 * 45.0).collect();
        lon_var.put_values(&lon_data, ..).unwrap();
    }

    {
        let mut tas_var = file
            .add_variable::<f32>("tas", &["time", "lat", "lon"])
            .unwrap();
        tas_var.put_attribute("units", "K").unwrap();
        tas_var
            .put_attribute("standard_name", "air_temperature")
            .unwrap();
        let tas_data = vec![288.0f32; 12 * 4 * 8];
        tas_var.put_values(&tas_data, ..).unwrap();
    }

    {
        let mut bounds_var = file
            .add_variable::<f64>("bounds_time", &["time", "bnds"])
            .unwrap();
        let bounds_data = vec![0.0f64; 12 * 2];
        bounds_var.put_values(&bounds_data, ..).unwrap();
    }

    {
        let mut weights_var = file.add_variable::<f32>("weights_lat", &["lat"]).unwrap();
        let weights_data = vec![0.25f32; 4];
        weights_var.put_values(&weights_data, ..).unwrap();
    }
}

/// Inventory covering two years split across two physical files; only the
/// first file exists on disk.
fn write_inventory(dir: &Path) -> String {
    let mut csv = String::from("time,tas,bounds_time,weights_lat\nNONE,X,X,\n");
    for (file_ix, year) in [(0usize, 1979), (1usize, 1980)] {
        for month in 1..=12 {
            writeln!(
                csv,
                "{}-{}-16 12:0:0.0,{}:{},{}:{},",
                year,
                month,
                file_ix,
                month - 1,
                file_ix,
                month - 1
            )
            .unwrap();
        }
    }
    csv.push_str("file_ix,filename\n");
    writeln!(csv, "0,\"{}\"", dir.join("tas_1979.nc").display()).unwrap();
    writeln!(csv, "1,\"{}\"", dir.join("tas_1980.nc").display()).unwrap();

    let input_path = dir.join("inventory.csv");
    std::fs::write(&input_path, csv).unwrap();
    input_path.to_str().unwrap().to_string()
}

fn cli_config(input: String, output: String) -> CliConfig {
    CliConfig {
        input,
        output,
        options: None,
        verbose: false,
        monitor: false,
    }
}

#[tokio::test]
async fn test_end_to_end_catalog_scan() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    create_representative_file(&dir.join("tas_1979.nc"));
    let input = write_inventory(dir);
    let output = dir.join("catalog.xml").to_str().unwrap().to_string();

    let config = cli_config(input, output.clone());
    let storage = LocalStorage::new(".".to_string());
    let pipeline = CdmlPipeline::new(storage, config, ScanOptions::default());
    let engine = ScanEngine::new(pipeline);

    let result = engine.run().await;
    assert!(result.is_ok(), "scan failed: {:?}", result.err());
    assert_eq!(result.unwrap(), output);

    let xml = std::fs::read_to_string(&output).unwrap();
    let mut lines = xml.lines();
    assert_eq!(lines.next(), Some(r#"<?xml version="1.0"?>"#));
    assert_eq!(
        lines.next(),
        Some(r#"<!DOCTYPE dataset SYSTEM "http://www-pcmdi.llnl.gov/software/cdms/cdml.dtd">"#)
    );

    // promoted globals land on the dataset element, the rest become children
    assert!(xml.contains(r#"institution="CCSR/NIES""#));
    assert!(xml.contains(r#"Conventions="CF-1.0""#));
    assert!(xml.contains(r#"production="""#));
    assert!(xml.contains(r#"id="none""#));
    assert!(xml.contains(r#"<attr datatype="String" name="title">Surface air temperature</attr>"#));

    // the file map and partition describe both files
    assert!(xml.contains(
        r#"cdms_filemap="[[[tas,bounds_time],[[0,12,-,-,-,tas_1979.nc],[12,24,-,-,-,tas_1980.nc]]],[[weights_lat],[[-,-,-,-,-,tas_1979.nc]]]]""#
    ));
    assert!(xml.contains(r#"partition="[0 12 12 24]""#));
    assert!(xml.contains(&format!("directory=\"{}\"", dir.display())));

    // the time axis aggregates the converted inventory timestamps
    assert!(xml.contains(r#"name_in_file="time""#));
    assert!(xml.contains(r#"calendar="standard""#));
    assert!(xml.contains(">[15.5 "));
    assert!(xml.contains("380.5"));

    // axis topologies: the regular longitude wraps, latitude does not
    assert!(xml.contains(r#"<attr datatype="String" name="realtopology">circular</attr>"#));
    assert!(xml.contains(r#"<attr datatype="String" name="realtopology">linear</attr>"#));

    // the bare bnds dimension is synthesized with index values
    assert!(xml.contains(r#"id="bnds""#));
    assert!(xml.contains("[0.0 1.0]"));

    // variable domains aggregate over the virtual time axis
    assert!(xml.contains(r#"<domElem start="0" length="24" name="time"/>"#));
    assert!(xml.contains(r#"<domElem start="0" length="4" name="lat"/>"#));
    assert!(xml.contains(r#"<domElem start="0" length="8" name="lon"/>"#));
}

#[tokio::test]
async fn test_scan_options_override_dataset_id() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    create_representative_file(&dir.join("tas_1979.nc"));
    let input = write_inventory(dir);
    let output = dir.join("catalog.xml").to_str().unwrap().to_string();

    let options_path = dir.join("scan.toml");
    std::fs::write(&options_path, "id = \"tas_ccsr\"\n").unwrap();
    let options = ScanOptions::from_file(options_path.to_str().unwrap()).unwrap();

    let config = cli_config(input, output.clone());
    let pipeline = CdmlPipeline::new(LocalStorage::new(".".to_string()), config, options);
    let engine = ScanEngine::new(pipeline);

    engine.run().await.unwrap();

    let xml = std::fs::read_to_string(&output).unwrap();
    assert!(xml.contains(r#"id="tas_ccsr""#));
    assert!(!xml.contains(r#"id="none""#));
}

#[tokio::test]
async fn test_missing_representative_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    // inventory points at files that were never created
    let input = write_inventory(dir);
    let output = dir.join("catalog.xml").to_str().unwrap().to_string();

    let config = cli_config(input, output.clone());
    let pipeline = CdmlPipeline::new(
        LocalStorage::new(".".to_string()),
        config,
        ScanOptions::default(),
    );
    let engine = ScanEngine::new(pipeline);

    assert!(engine.run().await.is_err());
    assert!(!Path::new(&output).exists());
}

#[tokio::test]
async fn test_missing_inventory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    let config = cli_config(
        dir.join("missing.csv").to_str().unwrap().to_string(),
        dir.join("catalog.xml").to_str().unwrap().to_string(),
    );
    let pipeline = CdmlPipeline::new(
        LocalStorage::new(".".to_string()),
        config,
        ScanOptions::default(),
    );
    let engine = ScanEngine::new(pipeline);

    assert!(engine.run().await.is_err());
}
