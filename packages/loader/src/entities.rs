//! Builds [`Facility`] and [`Community`] records from raw tables.

use std::collections::BTreeMap;

use care_map_facility_models::{Community, CommunityId, Coordinate, Facility, FacilityId};

use crate::schema::{self, describe_candidates, resolve_column, resolve_column_or_first};
use crate::table::{RawRow, RawTable};
use crate::values::{coerce_count, parse_coordinate};
use crate::LoadError;

/// Loaded hospitals plus the header row they came from.
///
/// Eligibility rules resolve their column against `columns`, so the header
/// row has to travel with the records.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityTable {
    /// Trimmed header row of the hospital table.
    pub columns: Vec<String>,
    /// Hospitals with valid coordinates, in file order.
    pub facilities: Vec<Facility>,
}

/// Column indexes for the two coordinate fields.
struct CoordinateColumns {
    latitude: usize,
    longitude: usize,
}

impl CoordinateColumns {
    fn resolve(table: &RawTable) -> Result<Self, LoadError> {
        let latitude = resolve_column(&table.headers, schema::LATITUDE).ok_or_else(|| {
            LoadError::MissingColumn {
                input: table.input.clone(),
                field: "latitude",
                candidates: describe_candidates(schema::LATITUDE),
            }
        })?;
        let longitude = resolve_column(&table.headers, schema::LONGITUDE).ok_or_else(|| {
            LoadError::MissingColumn {
                input: table.input.clone(),
                field: "longitude",
                candidates: describe_candidates(schema::LONGITUDE),
            }
        })?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    fn parse(&self, row: &RawRow, input: &str) -> Option<Coordinate> {
        let lat = row.get(self.latitude).unwrap_or("");
        let lon = row.get(self.longitude).unwrap_or("");
        let coordinate = parse_coordinate(lat, lon);
        if coordinate.is_none() {
            log::warn!(
                "{input}: skipping line {} with invalid coordinates ({lat:?}, {lon:?})",
                row.line
            );
        }
        coordinate
    }
}

fn cell<'a>(row: &'a RawRow, column: Option<usize>) -> Option<&'a str> {
    column.and_then(|idx| row.get(idx))
}

fn log_resolution(input: &str, field: &str, headers: &[String], column: Option<usize>) {
    match column {
        Some(idx) => log::debug!("{input}: {field} column = {:?}", headers[idx]),
        None => log::debug!("{input}: no {field} column, defaulting"),
    }
}

/// Builds hospitals from a raw table.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if no latitude or longitude column
/// resolves.
pub fn facilities_from_table(table: &RawTable) -> Result<FacilityTable, LoadError> {
    let input = table.input.as_str();
    let headers = &table.headers;
    let coords = CoordinateColumns::resolve(table)?;

    let name_col = resolve_column_or_first(headers, schema::FACILITY_NAME);
    let beds_col = resolve_column(headers, schema::BEDS);
    let declared_col = resolve_column(headers, schema::DECLARED_POPULATION);
    let type_col = resolve_column(headers, schema::FACILITY_TYPE);
    log_resolution(input, "name", headers, name_col);
    log_resolution(input, "beds", headers, beds_col);
    log_resolution(input, "declared population", headers, declared_col);
    log_resolution(input, "type", headers, type_col);

    let mut facilities = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let Some(position) = coords.parse(row, input) else {
            continue;
        };

        // Repeated headers keep the first column's value, matching
        // `resolve_column`.
        let mut attributes = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            attributes
                .entry(header.clone())
                .or_insert_with(|| row.get(idx).unwrap_or("").to_owned());
        }

        facilities.push(Facility {
            id: FacilityId(facilities.len()),
            name: cell(row, name_col).unwrap_or("").to_owned(),
            position,
            beds: coerce_count(cell(row, beds_col)),
            declared_population: coerce_count(cell(row, declared_col)),
            facility_type: cell(row, type_col).unwrap_or("").to_owned(),
            attributes,
        });
    }

    log::info!(
        "{input}: loaded {} hospitals ({} rows skipped)",
        facilities.len(),
        table.rows.len() - facilities.len()
    );

    Ok(FacilityTable {
        columns: headers.clone(),
        facilities,
    })
}

/// Builds communities from a raw table.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if no latitude or longitude column
/// resolves.
pub fn communities_from_table(table: &RawTable) -> Result<Vec<Community>, LoadError> {
    let input = table.input.as_str();
    let headers = &table.headers;
    let coords = CoordinateColumns::resolve(table)?;

    let name_col = resolve_column_or_first(headers, schema::COMMUNITY_NAME);
    let population_col = resolve_column(headers, schema::POPULATION);
    log_resolution(input, "name", headers, name_col);
    log_resolution(input, "population", headers, population_col);

    let mut communities = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let Some(position) = coords.parse(row, input) else {
            continue;
        };

        communities.push(Community {
            id: CommunityId(communities.len()),
            name: cell(row, name_col).unwrap_or("").to_owned(),
            position,
            population: coerce_count(cell(row, population_col)),
        });
    }

    log::info!(
        "{input}: loaded {} communities ({} rows skipped)",
        communities.len(),
        table.rows.len() - communities.len()
    );

    Ok(communities)
}
