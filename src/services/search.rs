//! Check search
//!
//! Structured filters run as SQL; free text can additionally be matched
//! fuzzily against number, client, bank and notes. Named searches are
//! persisted as JSON next to the settings file.

use std::path::PathBuf;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{CheckDetails, CheckStatus, Money};
use crate::storage::{CheckFilter, Storage};

/// Minimum similarity for a fuzzy text match
pub const FUZZY_THRESHOLD: f64 = 0.6;

/// Similarity of two strings in `0.0..=1.0`, case-insensitive
///
/// Twice the longest common subsequence over the combined length.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    let common = previous[b.len()];

    (2 * common) as f64 / (a.len() + b.len()) as f64
}

/// Match strength of `query` against `text`: 1.0 when contained
fn match_score(query: &str, text: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let text = text.trim().to_lowercase();
    if query.is_empty() || text.is_empty() {
        return 0.0;
    }
    if text.contains(&query) {
        1.0
    } else {
        similarity(&query, &text)
    }
}

/// Whether `query` is contained in, or similar enough to, `text`
pub fn fuzzy_match(query: &str, text: &str) -> bool {
    match_score(query, text) >= FUZZY_THRESHOLD
}

/// One-click filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickFilter {
    /// Open checks due within the next N days
    DueWithin(u32),
    Overdue,
    Status(CheckStatus),
    /// Amount range, upper bound optional
    Amount(Money, Option<Money>),
}

impl QuickFilter {
    /// Parse `today`, `week`, `month`, `overdue`, `due:N`, a status name,
    /// or `amount:MIN-MAX` / `amount:MIN+`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "today" => return Some(Self::DueWithin(0)),
            "week" => return Some(Self::DueWithin(7)),
            "month" => return Some(Self::DueWithin(30)),
            "overdue" | "late" => return Some(Self::Overdue),
            _ => {}
        }
        if let Some(days) = s.strip_prefix("due:") {
            return days.parse().ok().map(Self::DueWithin);
        }
        if let Some(range) = s.strip_prefix("amount:") {
            if let Some(min) = range.strip_suffix('+') {
                return Money::parse(min).ok().map(|min| Self::Amount(min, None));
            }
            let (min, max) = range.split_once('-')?;
            let min = Money::parse(min).ok()?;
            let max = Money::parse(max).ok()?;
            return Some(Self::Amount(min, Some(max)));
        }
        CheckStatus::parse(&s).map(Self::Status)
    }

    pub fn to_filter(&self, today: NaiveDate) -> CheckFilter {
        match *self {
            Self::DueWithin(days) => {
                let until = today
                    .checked_add_days(Days::new(u64::from(days)))
                    .unwrap_or(NaiveDate::MAX);
                CheckFilter::open_due_between(today, until)
            }
            Self::Overdue => CheckFilter::overdue(today),
            Self::Status(status) => CheckFilter::default().with_status(status),
            Self::Amount(min, max) => CheckFilter {
                min_amount: Some(min),
                max_amount: max,
                ..CheckFilter::default()
            },
        }
    }
}

/// A named, reusable search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub name: String,
    #[serde(default)]
    pub filter: CheckFilter,
    /// Fuzzy text applied on top of the filter
    #[serde(default)]
    pub fuzzy: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

/// Service for searching checks
pub struct SearchService<'a> {
    storage: &'a Storage,
    saved_path: PathBuf,
}

impl<'a> SearchService<'a> {
    pub fn new(storage: &'a Storage, saved_path: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            saved_path: saved_path.into(),
        }
    }

    /// Run a structured filter
    pub fn search(&self, filter: &CheckFilter) -> CheckdeskResult<Vec<CheckDetails>> {
        self.storage.checks().list(filter)
    }

    /// Run `filter`, then keep checks whose number, client, bank or notes
    /// fuzzily match `query`, best matches first
    pub fn fuzzy_search(
        &self,
        query: &str,
        filter: &CheckFilter,
    ) -> CheckdeskResult<Vec<CheckDetails>> {
        let unlimited = CheckFilter {
            limit: None,
            ..filter.clone()
        };

        let mut scored: Vec<(f64, CheckDetails)> = self
            .storage
            .checks()
            .list(&unlimited)?
            .into_iter()
            .filter_map(|d| {
                let best = [
                    d.check.number.as_str(),
                    d.client_name.as_str(),
                    d.bank_name.as_str(),
                    d.check.notes.as_str(),
                ]
                .iter()
                .map(|field| match_score(query, field))
                .fold(0.0, f64::max);
                (best >= FUZZY_THRESHOLD).then_some((best, d))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let matches = scored.into_iter().map(|(_, d)| d);
        Ok(match filter.limit {
            Some(limit) => matches.take(limit).collect(),
            None => matches.collect(),
        })
    }

    pub fn quick(&self, quick: QuickFilter, today: NaiveDate) -> CheckdeskResult<Vec<CheckDetails>> {
        self.search(&quick.to_filter(today))
    }

    /// Save a search, replacing any search with the same name
    pub fn save(
        &self,
        name: &str,
        filter: CheckFilter,
        fuzzy: Option<String>,
    ) -> CheckdeskResult<SavedSearch> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CheckdeskError::Validation(
                "Saved search name cannot be empty".into(),
            ));
        }

        let saved = SavedSearch {
            name: name.to_string(),
            filter,
            fuzzy: fuzzy.filter(|q| !q.trim().is_empty()),
            created_at: Utc::now(),
            last_used: None,
        };

        let mut all = self.read_saved()?;
        all.retain(|s| !s.name.eq_ignore_ascii_case(name));
        all.push(saved.clone());
        self.write_saved(&all)?;

        Ok(saved)
    }

    /// Saved searches, most recently used first
    pub fn list_saved(&self) -> CheckdeskResult<Vec<SavedSearch>> {
        let mut all = self.read_saved()?;
        all.sort_by(|a, b| {
            b.last_used
                .cmp(&a.last_used)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(all)
    }

    /// Load a saved search and mark it as used
    pub fn load(&self, name: &str) -> CheckdeskResult<SavedSearch> {
        let mut all = self.read_saved()?;
        let saved = all
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CheckdeskError::NotFound {
                entity_type: "Saved search",
                identifier: name.to_string(),
            })?;
        saved.last_used = Some(Utc::now());
        let result = saved.clone();
        self.write_saved(&all)?;
        Ok(result)
    }

    /// Load a saved search and run it
    pub fn run_saved(&self, name: &str) -> CheckdeskResult<Vec<CheckDetails>> {
        let saved = self.load(name)?;
        match saved.fuzzy.as_deref() {
            Some(query) => self.fuzzy_search(query, &saved.filter),
            None => self.search(&saved.filter),
        }
    }

    pub fn delete_saved(&self, name: &str) -> CheckdeskResult<bool> {
        let mut all = self.read_saved()?;
        let before = all.len();
        all.retain(|s| !s.name.eq_ignore_ascii_case(name.trim()));
        if all.len() == before {
            return Ok(false);
        }
        self.write_saved(&all)?;
        Ok(true)
    }

    fn read_saved(&self) -> CheckdeskResult<Vec<SavedSearch>> {
        if !self.saved_path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.saved_path)
            .map_err(|e| CheckdeskError::Io(format!("Failed to read saved searches: {}", e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| CheckdeskError::Json(format!("Invalid saved searches file: {}", e)))
    }

    fn write_saved(&self, searches: &[SavedSearch]) -> CheckdeskResult<()> {
        let contents = serde_json::to_string_pretty(searches)?;
        std::fs::write(&self.saved_path, contents)
            .map_err(|e| CheckdeskError::Io(format!("Failed to write saved searches: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bank, Check, Client, ClientKind};
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed(storage: &Storage) {
        let bank = Bank::new("Banque Populaire", Some("BP".into()));
        storage.banks().insert(&bank).unwrap();
        for (number, client, amount, due) in [
            ("100200", "Mohammed Tazi", 1_000, date(2024, 3, 12)),
            ("100201", "Atlas Trading", 20_000, date(2024, 3, 25)),
            ("100202", "Karima Idrissi", 500, date(2024, 2, 20)),
        ] {
            let client = Client::new(client, ClientKind::Individual);
            storage.clients().insert(&client).unwrap();
            let check = Check::new(
                number,
                Money::from_units(amount, 0),
                "MAD",
                date(2024, 1, 15),
                due,
                client.id,
                bank.id,
            );
            storage.checks().insert(&check).unwrap();
        }
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("", "abc"), 0.0);
        assert!(similarity("Mohamed", "Mohammed") > 0.9);
        assert!(similarity("Atlas", "Zenith") < FUZZY_THRESHOLD);
    }

    #[test]
    fn test_fuzzy_match() {
        assert!(fuzzy_match("tazi", "Mohammed Tazi"));
        assert!(fuzzy_match("Mohamed Tazi", "Mohammed Tazi"));
        assert!(!fuzzy_match("", "anything"));
        assert!(!fuzzy_match("Karima", "Atlas Trading"));
    }

    #[test]
    fn test_fuzzy_search() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open_in_memory().unwrap();
        seed(&storage);
        let service = SearchService::new(&storage, temp_dir.path().join("saved.json"));

        let found = service
            .fuzzy_search("Mohamed Tazi", &CheckFilter::default())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].check.number, "100200");

        let by_number = service.fuzzy_search("100201", &CheckFilter::default()).unwrap();
        assert_eq!(by_number[0].client_name, "Atlas Trading");
    }

    #[test]
    fn test_quick_filters() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open_in_memory().unwrap();
        seed(&storage);
        let service = SearchService::new(&storage, temp_dir.path().join("saved.json"));
        let today = date(2024, 3, 10);

        assert_eq!(service.quick(QuickFilter::DueWithin(7), today).unwrap().len(), 1);
        assert_eq!(service.quick(QuickFilter::Overdue, today).unwrap().len(), 1);
        assert_eq!(
            service
                .quick(QuickFilter::Status(CheckStatus::Pending), today)
                .unwrap()
                .len(),
            3
        );
        let large = QuickFilter::Amount(Money::from_units(5_000, 0), None);
        assert_eq!(service.quick(large, today).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_quick_filter() {
        assert_eq!(QuickFilter::parse("week"), Some(QuickFilter::DueWithin(7)));
        assert_eq!(QuickFilter::parse("due:14"), Some(QuickFilter::DueWithin(14)));
        assert_eq!(
            QuickFilter::parse("bounced"),
            Some(QuickFilter::Status(CheckStatus::Bounced))
        );
        assert_eq!(
            QuickFilter::parse("amount:1000-5000"),
            Some(QuickFilter::Amount(
                Money::from_units(1000, 0),
                Some(Money::from_units(5000, 0))
            ))
        );
        assert_eq!(
            QuickFilter::parse("amount:50000+"),
            Some(QuickFilter::Amount(Money::from_units(50000, 0), None))
        );
        assert_eq!(QuickFilter::parse("someday"), None);
    }

    #[test]
    fn test_saved_searches() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open_in_memory().unwrap();
        seed(&storage);
        let service = SearchService::new(&storage, temp_dir.path().join("saved.json"));

        let filter = CheckFilter {
            min_amount: Some(Money::from_units(900, 0)),
            ..CheckFilter::default()
        };
        service.save("big ones", filter.clone(), None).unwrap();
        service
            .save("tazi", CheckFilter::default(), Some("tazi".into()))
            .unwrap();
        assert_eq!(service.list_saved().unwrap().len(), 2);

        // Same name replaces
        service.save("Big Ones", filter, None).unwrap();
        assert_eq!(service.list_saved().unwrap().len(), 2);

        assert_eq!(service.run_saved("big ones").unwrap().len(), 2);
        assert_eq!(service.run_saved("tazi").unwrap().len(), 1);
        assert_eq!(service.list_saved().unwrap()[0].name, "tazi");

        assert!(service.delete_saved("tazi").unwrap());
        assert!(!service.delete_saved("tazi").unwrap());
        assert!(service.load("tazi").unwrap_err().is_not_found());
    }
}
