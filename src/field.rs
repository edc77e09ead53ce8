use crate::coord::{Coordinate, MercatorPoint, project};
use crate::error::TileError;
use crate::index::constants::{DEFAULT_PRECISION, MAX_PRECISION};
use crate::index::coverage::coverage;
use crate::index::proximity::{select_tiles, zoom_out};
use crate::index::ranges::{prefix, ranges};
use crate::query::Query;
use crate::tile::Tile;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How tiles are written to and looked up in the backend index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileEncoding {
    /// Base-4 ordinals in a numeric field, queried with ranges.
    #[default]
    Ordinal,
    /// Quadkey strings in a term field, queried with prefixes.
    Quadkey,
}

/// A single indexed value for a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Ordinal(u64),
    Quadkey(String),
}

/// Geospatial point field, indexing each point as its tile at a fixed precision.
///
/// Tiles form a tiered index: every coarser tile of a point is a prefix of its
/// key, so one prefix or range lookup matches a whole region. Points must
/// still be stored if exact distances are required after the search; see
/// [`DistanceComparator`].
///
/// # Example
///
/// ```
/// use quadtile::PointField;
///
/// # fn main() -> Result<(), quadtile::TileError> {
/// let field = PointField::builder().name("tile").precision(15).build()?;
/// let values = field.items(&[(-118.4065, 34.0901)])?;
/// assert_eq!(values.len(), 1);
///
/// let query = field.within(&(-118.4065, 34.0901), 1000.0, 4)?;
/// assert!(query.clause_count() <= 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointFieldBuilder", into = "PointFieldBuilder")]
pub struct PointField {
    name: String,
    precision: u8,
    encoding: TileEncoding,
}

impl PointField {
    /// Create an ordinal-encoded field.
    pub fn new(name: impl Into<String>, precision: u8) -> Result<Self, TileError> {
        Self::builder().name(name).precision(precision).build()
    }

    pub fn builder() -> PointFieldBuilder {
        PointFieldBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zoom level of indexed tiles, also the reference precision for ordinals.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn encoding(&self) -> TileEncoding {
        self.encoding
    }

    /// Tile of a WGS84 (lon/lat) coordinate at the field's precision.
    pub fn tile(&self, coord: &impl Coordinate) -> Result<Tile, TileError> {
        Ok(project(coord)?.tile(self.precision))
    }

    /// Value stored in the index for a tile of the field's precision.
    pub fn value(&self, tile: &Tile) -> FieldValue {
        match self.encoding {
            TileEncoding::Ordinal => FieldValue::Ordinal(tile.ordinal()),
            TileEncoding::Quadkey => FieldValue::Quadkey(tile.key().to_string()),
        }
    }

    /// Values to index for a document's points, sorted and de-duplicated.
    pub fn items<C>(&self, points: &[C]) -> Result<Vec<FieldValue>, TileError>
    where
        C: Coordinate + Sync,
    {
        let tiles: BTreeSet<Tile> = points
            .par_iter()
            .map(|point| self.tile(point))
            .collect::<Result<_, _>>()?;
        Ok(self.values(tiles))
    }

    fn values(&self, tiles: BTreeSet<Tile>) -> Vec<FieldValue> {
        tiles.iter().map(|tile| self.value(tile)).collect()
    }

    /// Query matching a tile and everything indexed inside it.
    pub fn prefix(&self, tile: &Tile) -> Result<Query, TileError> {
        match self.encoding {
            TileEncoding::Ordinal => Ok(Query::range(&self.name, prefix(tile, self.precision)?)),
            TileEncoding::Quadkey => {
                if tile.precision() > self.precision {
                    return Err(TileError::InvalidPrecision(tile.precision()));
                }
                Ok(Query::prefix(&self.name, tile.key()))
            }
        }
    }

    /// Disjunction matching any of a set of tiles.
    ///
    /// Ordinal fields merge adjacent tiles (which must share one precision)
    /// into ranges. Quadkey fields zoom out complete sibling groups and emit
    /// one prefix per remaining tile.
    pub fn ranges(&self, tiles: &[Tile]) -> Result<Query, TileError> {
        match self.encoding {
            TileEncoding::Ordinal => {
                let merged = ranges(tiles, self.precision)?;
                Ok(Query::any(
                    merged.into_iter().map(|r| Query::range(&self.name, r)),
                ))
            }
            TileEncoding::Quadkey => {
                let grouped = zoom_out(tiles.iter().cloned());
                let queries = grouped
                    .iter()
                    .map(|tile| self.prefix(tile))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Query::any(queries))
            }
        }
    }

    /// Prefix query for the tile around a point, optionally at a coarser precision.
    pub fn near(&self, coord: &impl Coordinate, precision: Option<u8>) -> Result<Query, TileError> {
        let tile = self.tile(coord)?;
        let tile = match precision {
            Some(p) => tile.truncate(p),
            None => tile,
        };
        self.prefix(&tile)
    }

    /// Query for any tiles which could be within `distance` meters of a point.
    ///
    /// Refines around the point until the next level would need more than
    /// `limit` tiles, then queries the last set that fit. The limit trades
    /// search precision against the number of query clauses. Candidates are
    /// a superset of the true matches; exact distances are the caller's job.
    pub fn within(
        &self,
        coord: &impl Coordinate,
        distance: f64,
        limit: usize,
    ) -> Result<Query, TileError> {
        let center = project(coord)?;
        let tiles = select_tiles(center.within(distance, self.precision), limit);
        let query = self.ranges(&tiles)?;
        log::debug!(
            "within {}m of ({}, {}): {} tiles at precision {}, {} clauses",
            distance,
            coord.x(),
            coord.y(),
            tiles.len(),
            tiles.first().map_or(0, Tile::precision),
            query.clause_count()
        );
        Ok(query)
    }
}

impl Default for PointField {
    fn default() -> Self {
        Self {
            name: "tile".to_string(),
            precision: DEFAULT_PRECISION,
            encoding: TileEncoding::default(),
        }
    }
}

/// Builder for [`PointField`]; precision is validated when building.
///
/// Also the serialized form of a field, so deserializing validates too.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointFieldBuilder {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    precision: Option<u8>,
    encoding: TileEncoding,
}

impl PointFieldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn precision(mut self, precision: u8) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn encoding(mut self, encoding: TileEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Builds the field.
    ///
    /// # Errors
    ///
    /// [`TileError::InvalidPrecision`] unless the precision is in
    /// `1..=MAX_PRECISION`; beyond that, ordinals overflow the backend's
    /// 64-bit numeric field.
    pub fn build(self) -> Result<PointField, TileError> {
        let precision = self.precision.unwrap_or(DEFAULT_PRECISION);
        if precision == 0 || precision > MAX_PRECISION {
            return Err(TileError::InvalidPrecision(precision));
        }
        Ok(PointField {
            name: self.name.unwrap_or_else(|| "tile".to_string()),
            precision,
            encoding: self.encoding,
        })
    }
}

impl TryFrom<PointFieldBuilder> for PointField {
    type Error = TileError;

    fn try_from(builder: PointFieldBuilder) -> Result<Self, TileError> {
        builder.build()
    }
}

impl From<PointField> for PointFieldBuilder {
    fn from(field: PointField) -> Self {
        PointField::builder()
            .name(field.name)
            .precision(field.precision)
            .encoding(field.encoding)
    }
}

/// Point field which indexes polygons (linear rings of points).
///
/// Every tile overlapping a ring's bounding box is indexed, so a search
/// matching any part of the box finds the polygon. As with [`PointField`],
/// the tiles are a search optimization, not a distance calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonField {
    field: PointField,
}

impl PolygonField {
    pub fn new(field: PointField) -> Self {
        Self { field }
    }

    /// The underlying point field, which builds the queries.
    pub fn field(&self) -> &PointField {
        &self.field
    }

    /// Values to index for a document's polygons: the union of their coverage.
    pub fn items<C>(&self, polygons: &[Vec<C>]) -> Result<Vec<FieldValue>, TileError>
    where
        C: Coordinate + Sync,
    {
        let precision = self.field.precision;
        let tiles = polygons
            .par_iter()
            .map(|ring| coverage(ring, precision))
            .try_reduce(BTreeSet::new, |mut acc, tiles| {
                acc.extend(tiles);
                Ok(acc)
            })?;
        Ok(self.field.values(tiles))
    }

    /// Query matching polygons whose tiles are within `distance` meters of a point.
    pub fn within(
        &self,
        coord: &impl Coordinate,
        distance: f64,
        limit: usize,
    ) -> Result<Query, TileError> {
        self.field.within(coord, distance, limit)
    }
}

/// Exact projected distances from a query point to cached document locations.
///
/// Locations are indexed by document id. Used to filter or sort the candidates
/// a tile search returns.
#[derive(Debug, Clone)]
pub struct DistanceComparator {
    point: MercatorPoint,
    locations: Vec<MercatorPoint>,
}

impl DistanceComparator {
    /// Projects the query point and every `(lng, lat)` location up front.
    pub fn new<C>(coord: &impl Coordinate, locations: &[C]) -> Result<Self, TileError>
    where
        C: Coordinate + Sync,
    {
        let point = project(coord)?;
        let locations = locations
            .par_iter()
            .map(project)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { point, locations })
    }

    /// Distance in meters to document `id`, or `None` for an unknown id.
    pub fn distance(&self, id: usize) -> Option<f64> {
        self.locations.get(id).map(|loc| self.point.distance(loc))
    }

    /// Sorts document ids nearest first; unknown ids go last.
    pub fn sort(&self, ids: &mut [usize]) {
        ids.sort_by(|a, b| {
            let da = self.distance(*a).unwrap_or(f64::INFINITY);
            let db = self.distance(*b).unwrap_or(f64::INFINITY);
            da.total_cmp(&db)
        });
    }
}
