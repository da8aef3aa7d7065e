/*!
 * Load fire detections from CSV files.
 *
 * The files are expected to look like the active fire products distributed by FIRMS, but only a
 * few columns are used: `latitude`, `longitude`, `brightness`, and `frp` (or
 * `fire_radiative_power`). Any other column is ignored. Empty or unparseable cells are treated as
 * missing values.
 */

use crate::{error::FireClusterResult, pipeline::RecordSource, record::RawRecord};
use std::{
    io::Read,
    path::{Path, PathBuf},
};

const LATITUDE_COLUMN: &str = "latitude";
const LONGITUDE_COLUMN: &str = "longitude";
const BRIGHTNESS_COLUMN: &str = "brightness";
const FRP_COLUMNS: [&str; 2] = ["frp", "fire_radiative_power"];

/// Reads records from one or more CSV files, in the order given.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    paths: Vec<PathBuf>,
}

impl CsvRecordSource {
    /**
     * Create a source from a file or a directory.
     *
     * A directory is searched recursively for files ending in ".csv", which are read in order
     * of their paths.
     */
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.is_dir() {
            return CsvRecordSource {
                paths: vec![path.to_path_buf()],
            };
        }

        let paths = walkdir::WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|res| res.ok())
            // WalkDir takes care of recursing into directories.
            .filter(|entry| entry.path().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .to_lowercase()
                    .ends_with(".csv")
            })
            .map(|entry| entry.into_path())
            .collect();

        CsvRecordSource { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl RecordSource for CsvRecordSource {
    fn load(&mut self) -> FireClusterResult<Vec<RawRecord>> {
        if self.paths.is_empty() {
            return Err("no CSV files to load".into());
        }

        let mut records = vec![];
        for path in &self.paths {
            log::debug!("reading {}", path.display());
            let f = std::fs::File::open(path)
                .map_err(|err| format!("unable to open {}: {}", path.display(), err))?;
            records.extend(read_records(f)?);
        }

        Ok(records)
    }
}

/// Parse all the records from a CSV stream with a header row.
pub fn read_records<R: Read>(rdr: R) -> FireClusterResult<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_reader(rdr);

    let headers = reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let lat_col = find(LATITUDE_COLUMN)
        .ok_or_else(|| format!("missing required column: {}", LATITUDE_COLUMN))?;
    let lon_col = find(LONGITUDE_COLUMN)
        .ok_or_else(|| format!("missing required column: {}", LONGITUDE_COLUMN))?;
    let brightness_col = find(BRIGHTNESS_COLUMN);
    let frp_col = FRP_COLUMNS.iter().find_map(|name| find(*name));

    let mut records = vec![];
    for row in reader.records() {
        let row = row?;
        let cell = |col: Option<usize>| -> Option<f64> {
            col.and_then(|c| row.get(c))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .and_then(|s| s.parse().ok())
        };

        records.push(RawRecord {
            latitude: cell(Some(lat_col)),
            longitude: cell(Some(lon_col)),
            brightness: cell(brightness_col),
            fire_radiative_power: cell(frp_col),
        });
    }

    Ok(records)
}
