//! US Census ACS place populations.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{build_client, read_json, REQUEST_TIMEOUT};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::foundation::POPULATION_YEAR;
use crate::security::ApiKey;
use crate::traits::population::{PopulationRow, PopulationSource};

const SERVICE: &str = "census";

/// ACS total population variable.
const TOTAL_POPULATION: &str = "B01003_001E";

/// Parse the Census API's array-of-rows reply. The first row is the header.
fn parse_rows(rows: Vec<Vec<Value>>) -> CollaboratorResult<Vec<PopulationRow>> {
    let mut rows = rows.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| CollaboratorError::malformed(SERVICE, "empty reply"))?;
    let column = |name: &str| {
        header
            .iter()
            .position(|cell| cell.as_str() == Some(name))
            .ok_or_else(|| CollaboratorError::malformed(SERVICE, format!("missing column {name}")))
    };
    let name_at = column("NAME")?;
    let count_at = column(TOTAL_POPULATION)?;

    Ok(rows
        .filter_map(|row| {
            let name = row.get(name_at)?.as_str()?.to_string();
            let population = row.get(count_at).and_then(|cell| match cell {
                Value::String(text) => text.parse().ok(),
                Value::Number(number) => number.as_u64(),
                _ => None,
            });
            Some(PopulationRow::new(name, population))
        })
        .collect())
}

/// Census API client for [`POPULATION_YEAR`] ACS 5-year estimates.
pub struct CensusPopulation {
    client: reqwest::Client,
    api_key: Option<ApiKey>,
    base_url: String,
}

impl CensusPopulation {
    /// The API answers without a key at a lower rate limit.
    pub fn new(api_key: Option<ApiKey>) -> CollaboratorResult<Self> {
        Ok(Self {
            client: build_client(SERVICE, REQUEST_TIMEOUT)?,
            api_key,
            base_url: "https://api.census.gov/data".to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl PopulationSource for CensusPopulation {
    async fn places_in_region(&self, fips: &str) -> CollaboratorResult<Vec<PopulationRow>> {
        let get = format!("NAME,{TOTAL_POPULATION}");
        let within = format!("state:{fips}");
        let mut query = vec![("get", get.as_str()), ("for", "place:*"), ("in", within.as_str())];
        if let Some(key) = &self.api_key {
            query.push(("key", key.expose()));
        }

        let response = self
            .client
            .get(format!("{}/{POPULATION_YEAR}/acs/acs5", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        let rows = parse_rows(read_json(SERVICE, response).await?)?;
        debug!(fips = %fips, rows = rows.len(), "Loaded population rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rows() {
        let rows: Vec<Vec<Value>> = serde_json::from_value(json!([
            ["NAME", "B01003_001E", "state", "place"],
            ["Austin city, Texas", "958202", "48", "05000"],
            ["Tiny CDP, Texas", null, "48", "99999"]
        ]))
        .unwrap();

        let parsed = parse_rows(rows).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], PopulationRow::new("Austin city, Texas", Some(958202)));
        assert_eq!(parsed[1].population, None);
    }

    #[test]
    fn test_missing_header_is_malformed() {
        assert!(parse_rows(Vec::new()).is_err());
        let rows: Vec<Vec<Value>> = serde_json::from_value(json!([["NAME"], ["Austin city, Texas"]])).unwrap();
        assert!(parse_rows(rows).is_err());
    }
}
