//! Worker analysis callbacks and their validated, persistable form.

use serde::{de::Error as _, Deserialize, Deserializer};

use crate::ValidationError;

/// Column bound on `market_analysis.top_item_name`.
pub const TOP_ITEM_NAME_MAX_CHARS: usize = 500;

/// Raw analysis callback body as posted by the external worker.
///
/// Field names follow the worker's snake_case wire format; camelCase aliases
/// are accepted as well. `searchKeyword` and the legacy `keyword` (an older
/// name for the category) are separate fields so a payload may carry both
/// spellings; the snake_case value wins when both are present. Numeric
/// metrics accept fractional JSON numbers and truncate them toward zero. Any
/// `analysis_date` in the payload is ignored: the timestamp is assigned at
/// persistence time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisSubmission {
    #[serde(default)]
    pub search_keyword: Option<String>,
    #[serde(default, rename = "searchKeyword")]
    pub search_keyword_camel: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default, alias = "averagePrice", deserialize_with = "lenient_i32")]
    pub average_price: Option<i32>,
    #[serde(default, alias = "lowestPrice", deserialize_with = "lenient_i32")]
    pub lowest_price: Option<i32>,
    #[serde(default, alias = "sampleCount", deserialize_with = "lenient_i32")]
    pub sample_count: Option<i32>,
    #[serde(default, alias = "topItemName")]
    pub top_item_name: Option<String>,
    #[serde(default, alias = "totalListings", deserialize_with = "lenient_i32")]
    pub total_listings: Option<i32>,
    #[serde(default, alias = "competitionLevel")]
    pub competition_level: Option<String>,
    #[serde(
        default,
        alias = "searchVolumeRatio",
        deserialize_with = "lenient_i32"
    )]
    pub search_volume_ratio: Option<i32>,
    #[serde(default, alias = "marketAttractiveness")]
    pub market_attractiveness: Option<String>,
    #[serde(default, alias = "sourcingScore", deserialize_with = "lenient_i32")]
    pub sourcing_score: Option<i32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Int(i64),
    Float(f64),
}

/// Accepts any JSON number that fits in `i32` after truncating its fraction.
fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<WireNumber>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let out_of_range = || D::Error::custom("number does not fit in a 32-bit integer");
    match number {
        WireNumber::Int(v) => i32::try_from(v).map(Some).map_err(|_| out_of_range()),
        WireNumber::Float(v) => {
            let truncated = v.trunc();
            if truncated.is_finite()
                && truncated >= f64::from(i32::MIN)
                && truncated <= f64::from(i32::MAX)
            {
                #[allow(clippy::cast_possible_truncation)]
                let value = truncated as i32;
                Ok(Some(value))
            } else {
                Err(out_of_range())
            }
        }
    }
}

/// A validated analysis record, ready to be appended to the analysis store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnalysis {
    pub search_keyword: String,
    pub category: Option<String>,
    pub average_price: i32,
    pub lowest_price: i32,
    pub sample_count: i32,
    pub top_item_name: Option<String>,
    pub total_listings: i32,
    pub competition_level: Option<String>,
    pub search_volume_ratio: i32,
    pub market_attractiveness: Option<String>,
    pub sourcing_score: i32,
}

impl AnalysisSubmission {
    /// Validate the callback and normalise it into a [`NewAnalysis`].
    ///
    /// Missing numbers default to zero and blank labels become `None`.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingSearchKeyword`] when `search_keyword` is absent or blank.
    /// - [`ValidationError::Negative`] for a negative price, count, or ratio.
    /// - [`ValidationError::TooLong`] when `top_item_name` exceeds
    ///   [`TOP_ITEM_NAME_MAX_CHARS`].
    pub fn validate(self) -> Result<NewAnalysis, ValidationError> {
        let search_keyword = non_blank(self.search_keyword)
            .or_else(|| non_blank(self.search_keyword_camel))
            .ok_or(ValidationError::MissingSearchKeyword)?;

        let average_price = non_negative("average_price", self.average_price)?;
        let lowest_price = non_negative("lowest_price", self.lowest_price)?;
        let sample_count = non_negative("sample_count", self.sample_count)?;
        let total_listings = non_negative("total_listings", self.total_listings)?;
        let search_volume_ratio = non_negative("search_volume_ratio", self.search_volume_ratio)?;

        let top_item_name = non_blank(self.top_item_name);
        if top_item_name
            .as_ref()
            .is_some_and(|name| name.chars().count() > TOP_ITEM_NAME_MAX_CHARS)
        {
            return Err(ValidationError::TooLong {
                field: "top_item_name",
                max: TOP_ITEM_NAME_MAX_CHARS,
            });
        }

        Ok(NewAnalysis {
            search_keyword,
            category: non_blank(self.category).or_else(|| non_blank(self.keyword)),
            average_price,
            lowest_price,
            sample_count,
            top_item_name,
            total_listings,
            competition_level: non_blank(self.competition_level),
            search_volume_ratio,
            market_attractiveness: non_blank(self.market_attractiveness),
            sourcing_score: self.sourcing_score.unwrap_or(0),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn non_negative(field: &'static str, value: Option<i32>) -> Result<i32, ValidationError> {
    match value.unwrap_or(0) {
        v if v < 0 => Err(ValidationError::Negative {
            field,
            value: i64::from(v),
        }),
        v => Ok(v),
    }
}
