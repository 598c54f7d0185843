use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

use crate::error::{CoverageError, Result};
use crate::types::{Coordinate, Tags};

/// A bank outlet or office from the outlet listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlet {
    pub id: String,
    /// Outlet type as listed (e.g. `KC` for branch offices)
    pub kind: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub tags: Option<Tags>,
}

impl Outlet {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

#[derive(Debug, Deserialize)]
struct OutletRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Lat")]
    lat: f64,
    #[serde(rename = "Lon")]
    lon: f64,
    #[serde(default)]
    tags: Option<String>,
}

impl OutletRow {
    fn into_outlet(self) -> Result<Outlet> {
        let tags = match self.tags.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_tags(raw).map_err(|e| {
                CoverageError::InvalidInput(format!("outlet '{}' has unreadable tags: {}", self.id, e))
            })?),
        };
        Ok(Outlet {
            id: self.id.trim().to_string(),
            kind: self.kind.trim().to_string(),
            name: self.name.trim().to_string(),
            lat: self.lat,
            lon: self.lon,
            tags,
        })
    }
}

/// JSON object of tags; non-string values are kept in their JSON text form
fn parse_tags(raw: &str) -> std::result::Result<Tags, serde_json::Error> {
    let values: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)?;
    Ok(values
        .into_iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect())
}

/// Read an outlet listing with `ID`, `Type`, `Name`, `Lat`, `Lon` and an
/// optional JSON `tags` column
pub fn read_outlets<R: Read>(reader: R, delimiter: char) -> Result<Vec<Outlet>> {
    if !delimiter.is_ascii() {
        return Err(CoverageError::Config(format!("delimiter '{}' is not a single byte", delimiter)));
    }
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    csv_reader
        .deserialize::<OutletRow>()
        .map(|row| row.map_err(CoverageError::from).and_then(OutletRow::into_outlet))
        .collect()
}

#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load_outlets(path: impl AsRef<Path>, delimiter: char) -> Result<Vec<Outlet>> {
    let file = File::open(path.as_ref())?;
    let outlets = read_outlets(file, delimiter)?;
    info!("Loaded {} outlets", outlets.len());
    Ok(outlets)
}

/// Outlets with the given ids, in the order the ids were given
pub fn select_outlets<'a>(outlets: &'a [Outlet], ids: &[String]) -> Result<Vec<&'a Outlet>> {
    ids.iter()
        .map(|id| {
            outlets
                .iter()
                .find(|o| o.id == id.trim())
                .ok_or_else(|| CoverageError::UnknownOutlet(id.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "ID;Type;Name;Lat;Lon\n\
        KC001;KC;Jakarta Kota;-6.1376;106.8133\n\
        KCP002;KCP;Sudirman;-6.2088;106.8226\n";

    #[test]
    fn test_read_semicolon_listing() {
        let outlets = read_outlets(LISTING.as_bytes(), ';').unwrap();
        assert_eq!(outlets.len(), 2);
        assert_eq!(outlets[0].id, "KC001");
        assert_eq!(outlets[0].kind, "KC");
        assert_eq!(outlets[1].coordinate(), Coordinate::new(-6.2088, 106.8226));
        assert!(outlets[0].tags.is_none());
    }

    #[test]
    fn test_tags_column() {
        let listing = "ID;Type;Name;Lat;Lon;tags\n\
            A;KC;Alpha;1.0;2.0;{\"amenity\": \"bank\", \"levels\": 3}\n\
            B;KC;Beta;1.5;2.5;\n";
        let outlets = read_outlets(listing.as_bytes(), ';').unwrap();
        let tags = outlets[0].tags.as_ref().unwrap();
        assert_eq!(tags.get("amenity").map(String::as_str), Some("bank"));
        assert_eq!(tags.get("levels").map(String::as_str), Some("3"));
        assert!(outlets[1].tags.is_none());
    }

    #[test]
    fn test_bad_tags_name_the_outlet() {
        let listing = "ID;Type;Name;Lat;Lon;tags\nA;KC;Alpha;1.0;2.0;{not json\n";
        let err = read_outlets(listing.as_bytes(), ';').unwrap_err();
        assert!(err.to_string().contains("'A'"));
    }

    #[test]
    fn test_bad_latitude_is_csv_error() {
        let listing = "ID;Type;Name;Lat;Lon\nA;KC;Alpha;north;2.0\n";
        assert!(matches!(read_outlets(listing.as_bytes(), ';'), Err(CoverageError::Csv(_))));
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let outlets = read_outlets(LISTING.as_bytes(), ';').unwrap();
        let picked = select_outlets(&outlets, &["KCP002".to_string(), "KC001".to_string()]).unwrap();
        assert_eq!(picked[0].id, "KCP002");
        assert_eq!(picked[1].id, "KC001");
        assert!(matches!(
            select_outlets(&outlets, &["NOPE".to_string()]),
            Err(CoverageError::UnknownOutlet(_))
        ));
    }
}
