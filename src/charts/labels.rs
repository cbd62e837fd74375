//! Localized chart and control labels.

use crate::data::processor::format_thousands;
use crate::data::Sex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Display language of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ko-en")]
    Bilingual,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ko" | "kr" | "korean" => Ok(Locale::Korean),
            "en" | "english" => Ok(Locale::English),
            "ko-en" | "bilingual" => Ok(Locale::Bilingual),
            other => Err(format!("unknown locale '{other}' (expected ko, en or ko-en)")),
        }
    }
}

/// Every user-visible string of the dashboard for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub locale: Locale,
    pub app_title: String,
    pub male: String,
    pub female: String,
    pub combined: String,
    pub unit: String,
    pub population_axis: String,
    pub year_axis: String,
    pub year_prompt: String,
    pub region_prompt: String,
    pub no_data: String,
    pub data_source: String,
    pub no_file: String,
    pub browse: String,
    pub show_trend: String,
    pub export_button: String,
    pub ready: String,
    pub loading: String,
    pub no_charts: String,
    pub load_error: String,
    pub export_error: String,
    pub trend_unavailable: String,
}

impl Labels {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Korean => Self {
                locale,
                app_title: "연도별 인구 현황".into(),
                male: "남".into(),
                female: "여".into(),
                combined: "총".into(),
                unit: "명".into(),
                population_axis: "인구 수".into(),
                year_axis: "연도".into(),
                year_prompt: "연도를 선택하세요".into(),
                region_prompt: "행정구역을 선택하세요".into(),
                no_data: "선택한 조건에 해당하는 데이터가 없습니다".into(),
                data_source: "📁 데이터 파일".into(),
                no_file: "선택된 파일 없음".into(),
                browse: "📂 찾아보기".into(),
                show_trend: "연도별 추이 표시".into(),
                export_button: "💾 PNG 내보내기".into(),
                ready: "준비".into(),
                loading: "CSV 파일을 불러오는 중...".into(),
                no_charts: "내보낼 차트가 없습니다".into(),
                load_error: "불러오기 오류".into(),
                export_error: "내보내기 오류".into(),
                trend_unavailable: "연도별 추이를 그릴 수 없습니다".into(),
            },
            Locale::English => Self {
                locale,
                app_title: "Korean Annual Population".into(),
                male: "Male".into(),
                female: "Female".into(),
                combined: "Total".into(),
                unit: " people".into(),
                population_axis: "Population".into(),
                year_axis: "Year".into(),
                year_prompt: "Select a year".into(),
                region_prompt: "Select a region".into(),
                no_data: "No data for this selection".into(),
                data_source: "📁 Data Source".into(),
                no_file: "No file selected".into(),
                browse: "📂 Browse".into(),
                show_trend: "Show yearly trend".into(),
                export_button: "💾 Export PNG".into(),
                ready: "Ready".into(),
                loading: "Loading CSV file...".into(),
                no_charts: "No charts to export".into(),
                load_error: "Load error".into(),
                export_error: "Export error".into(),
                trend_unavailable: "Yearly trend unavailable".into(),
            },
            Locale::Bilingual => Self {
                locale,
                app_title: "연도별 인구 현황 (Korean Annual Population)".into(),
                male: "남 (Male)".into(),
                female: "여 (Female)".into(),
                combined: "총 (Total)".into(),
                unit: "명".into(),
                population_axis: "인구 수 (Population)".into(),
                year_axis: "연도 (Year)".into(),
                year_prompt: "연도를 선택하세요 (Year)".into(),
                region_prompt: "행정구역을 선택하세요 (Region)".into(),
                no_data: "데이터 없음 (No data)".into(),
                data_source: "📁 데이터 파일 (Data Source)".into(),
                no_file: "선택된 파일 없음 (No file)".into(),
                browse: "📂 찾아보기 (Browse)".into(),
                show_trend: "연도별 추이 표시 (Yearly trend)".into(),
                export_button: "💾 PNG 내보내기 (Export)".into(),
                ready: "준비 (Ready)".into(),
                loading: "CSV 파일을 불러오는 중... (Loading)".into(),
                no_charts: "내보낼 차트가 없습니다 (No charts)".into(),
                load_error: "불러오기 오류 (Load error)".into(),
                export_error: "내보내기 오류 (Export error)".into(),
                trend_unavailable: "연도별 추이 없음 (Trend unavailable)".into(),
            },
        }
    }

    pub fn sex(&self, sex: Sex) -> &str {
        match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        }
    }

    /// Population with thousands separators and unit, e.g. `10,050명`.
    pub fn population(&self, value: u64) -> String {
        format!("{}{}", format_thousands(value), self.unit)
    }

    /// Legend entry such as `남: 10,050명`.
    pub fn legend(&self, sex: Sex, total: u64) -> String {
        format!("{}: {}", self.sex(sex), self.population(total))
    }

    pub fn combined_legend(&self, total: u64) -> String {
        format!("{}: {}", self.combined, self.population(total))
    }

    pub fn pyramid_title(&self, region: &str, year: i32) -> String {
        match self.locale {
            Locale::Korean => format!("{region} {year}년 성별 인구 분포"),
            Locale::English => format!("{region} population by sex and age, {year}"),
            Locale::Bilingual => {
                format!("{region} {year}년 성별 인구 분포 (Population by sex and age)")
            }
        }
    }

    /// Status line after a table load.
    pub fn loaded(&self, rows: usize, columns: usize) -> String {
        match self.locale {
            Locale::Korean => format!("{rows}개 행, {columns}개 열을 불러왔습니다"),
            Locale::English => format!("Loaded {rows} rows, {columns} columns"),
            Locale::Bilingual => format!("{rows}개 행, {columns}개 열 (Loaded {rows} rows)"),
        }
    }

    pub fn file_not_found(&self, path: &Path) -> String {
        let path = path.display();
        match self.locale {
            Locale::Korean => format!("{path} 파일이 없습니다. CSV 파일을 선택하세요"),
            Locale::English => format!("{path} not found, browse for a CSV file"),
            Locale::Bilingual => format!("{path} 파일이 없습니다 (not found)"),
        }
    }

    pub fn exported_to(&self, dir: &Path) -> String {
        let dir = dir.display();
        match self.locale {
            Locale::Korean => format!("{dir}에 저장했습니다"),
            Locale::English => format!("Exported to {dir}"),
            Locale::Bilingual => format!("{dir}에 저장했습니다 (Exported)"),
        }
    }

    pub fn trend_title(&self, region: &str) -> String {
        match self.locale {
            Locale::Korean => format!("{region} 연도별 총인구 추이"),
            Locale::English => format!("{region} total population by year"),
            Locale::Bilingual => format!("{region} 연도별 총인구 추이 (Total population by year)"),
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::for_locale(Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korean_legend_matches_published_format() {
        let labels = Labels::for_locale(Locale::Korean);
        assert_eq!(labels.legend(Sex::Male, 10_050), "남: 10,050명");
        assert_eq!(labels.legend(Sex::Female, 9_580), "여: 9,580명");
        assert_eq!(labels.combined_legend(19_630), "총: 19,630명");
        assert_eq!(labels.pyramid_title("서울특별시", 2023), "서울특별시 2023년 성별 인구 분포");
    }

    #[test]
    fn korean_controls_are_not_english() {
        let labels = Labels::for_locale(Locale::Korean);
        for text in [
            &labels.data_source,
            &labels.no_file,
            &labels.browse,
            &labels.show_trend,
            &labels.ready,
        ] {
            assert!(!text.chars().any(|c| c.is_ascii_alphabetic()), "{text}");
        }
        assert_eq!(labels.loaded(17, 203), "17개 행, 203개 열을 불러왔습니다");
        assert_eq!(
            labels.file_not_found(Path::new("a.csv")),
            "a.csv 파일이 없습니다. CSV 파일을 선택하세요"
        );
    }

    #[test]
    fn english_legend() {
        let labels = Labels::for_locale(Locale::English);
        assert_eq!(labels.legend(Sex::Female, 1_234), "Female: 1,234 people");
    }

    #[test]
    fn locale_parsing() {
        assert_eq!("ko".parse::<Locale>(), Ok(Locale::Korean));
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::English));
        assert_eq!("ko-en".parse::<Locale>(), Ok(Locale::Bilingual));
        assert!("fr".parse::<Locale>().is_err());
    }
}
