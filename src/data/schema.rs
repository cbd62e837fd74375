//! Schema Parser Module
//! Discovers years and age groups from `{year}년_{sex}_{bucket}` column headers.

use crate::data::model::Sex;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Marker of the total-population column.
pub const TOTAL_MARKER: &str = "총인구수";
/// Open-ended top age bucket.
pub const TOP_BUCKET_LABEL: &str = "100세 이상";
/// Character present in every age-group column.
pub const AGE_MARKER: char = '세';
/// Field separator inside column names.
pub const FIELD_SEPARATOR: char = '_';

const RANGE_SEPARATOR: char = '~';
const TOP_BUCKET_ORDINAL: i32 = 100;

static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})년").expect("valid year pattern"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("No year columns found in the table")]
    NoYears,
    #[error("No age-group columns found for {year}")]
    NoAgeGroups { year: i32 },
    #[error("No {sex} total-population column found for {year}")]
    NoTotalColumn { year: i32, sex: Sex },
}

/// Extract the year token of a column name, if it carries one.
pub fn column_year(column: &str) -> Option<i32> {
    YEAR_PATTERN
        .captures(column)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Every distinct year in the headers, most recent first.
pub fn discover_years<S: AsRef<str>>(columns: &[S]) -> Result<Vec<i32>, SchemaError> {
    let years: BTreeSet<i32> = columns
        .iter()
        .filter_map(|c| column_year(c.as_ref()))
        .collect();

    if years.is_empty() {
        return Err(SchemaError::NoYears);
    }
    Ok(years.into_iter().rev().collect())
}

/// Sort key for an age-group label.
///
/// The top bucket sorts as 100; ranges sort by their lower bound. Labels that
/// do not parse fall back to 0.
pub fn age_group_ordinal(label: &str) -> i32 {
    if label == TOP_BUCKET_LABEL {
        return TOP_BUCKET_ORDINAL;
    }
    label
        .split(RANGE_SEPARATOR)
        .next()
        .unwrap_or_default()
        .replace(AGE_MARKER, "")
        .trim()
        .parse()
        .unwrap_or(0)
}

/// Trailing segment of a column name.
pub fn age_group_label(column: &str) -> &str {
    column
        .rsplit(FIELD_SEPARATOR)
        .next()
        .unwrap_or(column)
}

/// Prefix shared by every column of one (year, sex).
pub fn sex_prefix(year: i32, sex: Sex) -> String {
    format!("{year}년{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}", sex.marker())
}

pub fn is_total_column(column: &str) -> bool {
    column.contains(TOTAL_MARKER)
}

/// De-duplicated age-group labels of a year, in axis order.
pub fn age_groups<S: AsRef<str>>(columns: &[S], year: i32) -> Result<Vec<String>, SchemaError> {
    let year_str = year.to_string();
    let mut seen = HashSet::new();
    let mut labels: Vec<String> = columns
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|c| c.contains(AGE_MARKER) && c.contains(year_str.as_str()))
        .map(age_group_label)
        .filter(|label| seen.insert(*label))
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err(SchemaError::NoAgeGroups { year });
    }

    sort_age_groups(&mut labels);
    Ok(labels)
}

/// Order labels by `age_group_ordinal`, ties by text.
pub fn sort_age_groups(labels: &mut [String]) {
    labels.sort_by(|a, b| {
        age_group_ordinal(a)
            .cmp(&age_group_ordinal(b))
            .then_with(|| a.cmp(b))
    });
}

/// Columns of one (year, sex) in table order, split into age groups and totals.
pub fn sex_columns<S: AsRef<str>>(columns: &[S], year: i32, sex: Sex) -> (Vec<&str>, Vec<&str>) {
    let prefix = sex_prefix(year, sex);
    columns
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|c| c.starts_with(prefix.as_str()))
        .partition(|c| !is_total_column(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<&'static str> {
        vec![
            "행정구역",
            "2023년_남_총인구수",
            "2023년_남_0~4세",
            "2023년_남_100세 이상",
            "2023년_남_5~9세",
            "2023년_여_총인구수",
            "2023년_여_0~4세",
            "2023년_여_100세 이상",
            "2022년_남_총인구수",
            "2022년_남_0~4세",
            "2022년_여_0~4세",
        ]
    }

    #[test]
    fn years_are_unique_and_descending() {
        let years = discover_years(&headers()).unwrap();
        assert_eq!(years, vec![2023, 2022]);
    }

    #[test]
    fn columns_without_year_are_skipped() {
        let years = discover_years(&["행정구역", "비고", "2021년_남_0~4세"]).unwrap();
        assert_eq!(years, vec![2021]);
    }

    #[test]
    fn no_year_columns_is_an_error() {
        assert_eq!(discover_years(&["행정구역", "비고"]), Err(SchemaError::NoYears));
    }

    #[test]
    fn top_bucket_sorts_after_ranges() {
        assert!(age_group_ordinal("100세 이상") > age_group_ordinal("95~99세"));
        assert!(age_group_ordinal("95~99세") > age_group_ordinal("0~4세"));
        assert_eq!(age_group_ordinal("20~24세"), 20);
    }

    #[test]
    fn unparsable_labels_sort_as_zero() {
        assert_eq!(age_group_ordinal("미상"), 0);
        assert_eq!(age_group_ordinal(""), 0);
    }

    #[test]
    fn age_groups_are_deduplicated_and_ordered() {
        let groups = age_groups(&headers(), 2023).unwrap();
        assert_eq!(groups, vec!["0~4세", "5~9세", "100세 이상"]);
    }

    #[test]
    fn year_without_age_columns_is_an_error() {
        let cols = ["행정구역", "2020년_남_총인구수"];
        assert_eq!(age_groups(&cols, 2020), Err(SchemaError::NoAgeGroups { year: 2020 }));
    }

    #[test]
    fn sex_columns_split_totals() {
        let cols = headers();
        let (ages, totals) = sex_columns(&cols, 2023, Sex::Male);
        assert_eq!(ages, vec!["2023년_남_0~4세", "2023년_남_100세 이상", "2023년_남_5~9세"]);
        assert_eq!(totals, vec!["2023년_남_총인구수"]);
    }

    #[test]
    fn label_is_trailing_segment() {
        assert_eq!(age_group_label("2023년_여_100세 이상"), "100세 이상");
        assert_eq!(column_year("2019년_남_0~4세"), Some(2019));
        assert_eq!(column_year("행정구역"), None);
    }
}
