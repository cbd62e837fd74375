//! Data Model Module
//! Typed views derived from a population table for one selection.

use std::collections::HashMap;
use std::fmt;

/// Sex marker used in column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Token used between the year and the age group in column headers.
    pub fn marker(self) -> &'static str {
        match self {
            Sex::Male => "남",
            Sex::Female => "여",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// A value held once per sex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BySex<T> {
    pub male: T,
    pub female: T,
}

impl<T> BySex<T> {
    pub fn new(male: T, female: T) -> Self {
        Self { male, female }
    }

    pub fn get(&self, sex: Sex) -> &T {
        match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Sex, T) -> U) -> BySex<U> {
        BySex {
            male: f(Sex::Male, self.male),
            female: f(Sex::Female, self.female),
        }
    }

    /// Build a pair by calling `f` for each sex, stopping at the first error.
    pub fn try_build<E>(mut f: impl FnMut(Sex) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            male: f(Sex::Male)?,
            female: f(Sex::Female)?,
        })
    }
}

/// Population counts per age-group label for one (region, year, sex).
///
/// The total-population column is never part of this series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeGroupSeries {
    /// Labels in the order their columns appear in the table.
    pub labels: Vec<String>,
    pub counts: HashMap<String, u64>,
}

impl AgeGroupSeries {
    /// Add a count, merging repeated labels.
    pub fn push(&mut self, label: String, count: u64) {
        match self.counts.get_mut(&label) {
            Some(existing) => *existing += count,
            None => {
                self.counts.insert(label.clone(), count);
                self.labels.push(label);
            }
        }
    }

    /// Count for a label; labels missing from this series count as zero.
    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Age distribution of one region in one year, aligned on a shared age axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeDistribution {
    pub region: String,
    pub year: i32,
    /// Ordered age-group axis (youngest first, open-ended bucket last).
    pub age_groups: Vec<String>,
    /// Counts aligned with `age_groups`.
    pub counts: BySex<Vec<u64>>,
    /// Value of the total-population column, when the table carries one.
    pub reported_totals: BySex<Option<u64>>,
}

impl AgeDistribution {
    pub fn total(&self, sex: Sex) -> u64 {
        self.counts.get(sex).iter().sum()
    }

    pub fn combined_total(&self) -> u64 {
        self.total(Sex::Male) + self.total(Sex::Female)
    }

    /// Sexes whose age-group sum differs from the reported total column.
    pub fn total_mismatches(&self) -> Vec<(Sex, u64, u64)> {
        Sex::ALL
            .iter()
            .filter_map(|&sex| {
                let reported = (*self.reported_totals.get(sex))?;
                let summed = self.total(sex);
                (summed != reported).then_some((sex, summed, reported))
            })
            .collect()
    }
}

/// Total population per year for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendSeries {
    pub region: String,
    /// Ascending years; `totals` is parallel to this.
    pub years: Vec<i32>,
    pub totals: BySex<Vec<u64>>,
}

impl TrendSeries {
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_labels_are_merged() {
        let mut series = AgeGroupSeries::default();
        series.push("0~4세".to_string(), 10);
        series.push("5~9세".to_string(), 3);
        series.push("0~4세".to_string(), 5);

        assert_eq!(series.labels, vec!["0~4세", "5~9세"]);
        assert_eq!(series.count("0~4세"), 15);
        assert_eq!(series.count("10~14세"), 0);
        assert_eq!(series.total(), 18);
    }

    #[test]
    fn mismatches_only_for_present_totals() {
        let dist = AgeDistribution {
            region: "r".into(),
            year: 2023,
            age_groups: vec!["0~4세".into()],
            counts: BySex::new(vec![10], vec![7]),
            reported_totals: BySex::new(Some(11), None),
        };
        assert_eq!(dist.total_mismatches(), vec![(Sex::Male, 10, 11)]);
        assert_eq!(dist.combined_total(), 17);
    }
}
