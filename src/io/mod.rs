pub mod csv;

pub use csv::{CoordinateSource, CsvTileConfig, CsvToTiles, csv_to_tile_csv};
