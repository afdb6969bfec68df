//! Check service
//!
//! Recording, editing and tracking checks. Every check references an
//! existing client and bank, and `(number, bank)` is unique.
//!
//! Status changes follow no fixed order, but re-applying the current status
//! is refused. Reaching cashed, bounced or cancelled records a
//! status-change notification.

use chrono::{NaiveDate, Utc};
use log::info;
use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{
    BankId, BranchId, Check, CheckDetails, CheckId, CheckStatus, ClientId, Money, UserId,
};
use crate::storage::{CheckFilter, Storage};

use super::notification::NotificationService;

/// Weights of the duplicate similarity score, in percent
const SAME_NUMBER_WEIGHT: u32 = 50;
const SAME_AMOUNT_WEIGHT: u32 = 30;
const SAME_CLIENT_WEIGHT: u32 = 15;
const SAME_BRANCH_WEIGHT: u32 = 5;

/// Score from which two checks are reported as likely duplicates
pub const DUPLICATE_THRESHOLD: u32 = 70;

/// Everything needed to record a new check
#[derive(Debug, Clone)]
pub struct NewCheck {
    pub number: String,
    pub amount: Money,
    pub currency: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub client_id: ClientId,
    pub bank_id: BankId,
    pub branch_id: Option<BranchId>,
    pub depositor_name: String,
    pub invoice_number: String,
    pub invoice_date: Option<NaiveDate>,
    pub notes: String,
}

impl NewCheck {
    pub fn new(
        number: impl Into<String>,
        amount: Money,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        client_id: ClientId,
        bank_id: BankId,
    ) -> Self {
        Self {
            number: number.into(),
            amount,
            currency: "MAD".to_string(),
            issue_date,
            due_date,
            client_id,
            bank_id,
            branch_id: None,
            depositor_name: String::new(),
            invoice_number: String::new(),
            invoice_date: None,
            notes: String::new(),
        }
    }

    /// The check this draft would record, for duplicate detection
    pub fn preview(&self) -> Check {
        self.clone().into_check(None)
    }

    fn into_check(self, created_by: Option<UserId>) -> Check {
        let mut check = Check::new(
            self.number,
            self.amount,
            self.currency,
            self.issue_date,
            self.due_date,
            self.client_id,
            self.bank_id,
        );
        check.branch_id = self.branch_id;
        check.depositor_name = self.depositor_name.trim().to_string();
        check.invoice_number = self.invoice_number.trim().to_string();
        check.invoice_date = self.invoice_date;
        check.notes = self.notes.trim().to_string();
        check.created_by = created_by;
        check
    }
}

/// Field changes for an existing check; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct CheckUpdate {
    pub number: Option<String>,
    pub amount: Option<Money>,
    pub currency: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub client_id: Option<ClientId>,
    pub bank_id: Option<BankId>,
    pub branch_id: Option<Option<BranchId>>,
    pub depositor_name: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

impl CheckUpdate {
    pub fn is_empty(&self) -> bool {
        self.number.is_none()
            && self.amount.is_none()
            && self.currency.is_none()
            && self.issue_date.is_none()
            && self.due_date.is_none()
            && self.client_id.is_none()
            && self.bank_id.is_none()
            && self.branch_id.is_none()
            && self.depositor_name.is_none()
            && self.invoice_number.is_none()
            && self.invoice_date.is_none()
            && self.notes.is_none()
    }

    fn apply(self, check: &mut Check) {
        if let Some(number) = self.number {
            check.number = number.trim().to_string();
        }
        if let Some(amount) = self.amount {
            check.amount = amount;
        }
        if let Some(currency) = self.currency {
            check.currency = currency.trim().to_uppercase();
        }
        if let Some(issue_date) = self.issue_date {
            check.issue_date = issue_date;
        }
        if let Some(due_date) = self.due_date {
            check.due_date = due_date;
        }
        if let Some(client_id) = self.client_id {
            check.client_id = client_id;
        }
        if let Some(bank_id) = self.bank_id {
            check.bank_id = bank_id;
        }
        if let Some(branch_id) = self.branch_id {
            check.branch_id = branch_id;
        }
        if let Some(v) = self.depositor_name {
            check.depositor_name = v.trim().to_string();
        }
        if let Some(v) = self.invoice_number {
            check.invoice_number = v.trim().to_string();
        }
        if let Some(v) = self.invoice_date {
            check.invoice_date = v;
        }
        if let Some(v) = self.notes {
            check.notes = v.trim().to_string();
        }
        check.updated_at = Utc::now();
    }
}

/// An existing check that resembles a candidate
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateMatch {
    pub check: Check,
    /// Similarity in percent
    pub score: u32,
    pub reasons: Vec<&'static str>,
}

/// Two recorded checks that resemble each other
#[derive(Debug, Clone, Serialize)]
pub struct DuplicatePair {
    pub first: Check,
    pub second: Check,
    pub score: u32,
    pub reasons: Vec<&'static str>,
}

/// Similarity of two checks in percent, with the matching criteria
pub fn similarity(a: &Check, b: &Check) -> (u32, Vec<&'static str>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    if a.number == b.number {
        score += SAME_NUMBER_WEIGHT;
        reasons.push("same number");
    }
    if a.amount == b.amount {
        score += SAME_AMOUNT_WEIGHT;
        reasons.push("same amount");
    }
    if a.client_id == b.client_id {
        score += SAME_CLIENT_WEIGHT;
        reasons.push("same client");
    }
    if a.branch_id.is_some() && a.branch_id == b.branch_id {
        score += SAME_BRANCH_WEIGHT;
        reasons.push("same branch");
    }

    (score.min(100), reasons)
}

/// Service for check management
pub struct CheckService<'a> {
    storage: &'a Storage,
}

impl<'a> CheckService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a new pending check
    pub fn create(&self, draft: NewCheck, created_by: Option<UserId>) -> CheckdeskResult<Check> {
        let check = draft.into_check(created_by);
        check
            .validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;
        self.verify_references(&check)?;
        self.ensure_unique_number(&check, None)?;

        self.storage.checks().insert(&check)?;
        self.storage.log_create(
            EntityType::Check,
            check.id.to_string(),
            Some(format!("#{}", check.number)),
            &check,
        )?;
        info!(
            "event=check_create status=ok id={} amount={}",
            check.id, check.amount
        );

        Ok(check)
    }

    /// Edit the fields of a check; status has its own operation
    pub fn update(&self, id: CheckId, changes: CheckUpdate) -> CheckdeskResult<Check> {
        let mut check = self.get_required(id)?;
        let before = check.clone();

        let bank_changed = changes.bank_id.is_some_and(|b| b != check.bank_id);
        changes.apply(&mut check);
        if bank_changed && check.branch_id == before.branch_id {
            check.branch_id = None;
        }

        check
            .validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;
        self.verify_references(&check)?;
        self.ensure_unique_number(&check, Some(check.id))?;

        self.storage.checks().update(&check)?;
        self.storage.log_update(
            EntityType::Check,
            check.id.to_string(),
            Some(format!("#{}", check.number)),
            &before,
            &check,
        )?;

        Ok(check)
    }

    /// Move a check to a new status
    ///
    /// `user_id` receives the status-change notification, if any.
    pub fn change_status(
        &self,
        id: CheckId,
        status: CheckStatus,
        user_id: Option<UserId>,
    ) -> CheckdeskResult<Check> {
        let mut check = self.get_required(id)?;
        let before = check.clone();

        let previous = check
            .set_status(status)
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        self.storage.checks().update(&check)?;
        self.storage.log_update(
            EntityType::Check,
            check.id.to_string(),
            Some(format!("#{}", check.number)),
            &before,
            &check,
        )?;
        NotificationService::new(self.storage).notify_status_change(&check, user_id)?;

        info!(
            "event=check_status status=ok id={} from={} to={}",
            check.id,
            previous.as_str(),
            status.as_str()
        );
        Ok(check)
    }

    /// Permanently remove a check
    pub fn delete(&self, id: CheckId) -> CheckdeskResult<Check> {
        let check = self.get_required(id)?;
        self.storage.checks().delete(id)?;
        self.storage.log_delete(
            EntityType::Check,
            check.id.to_string(),
            Some(format!("#{}", check.number)),
            &check,
        )?;
        info!("event=check_delete status=ok id={}", check.id);
        Ok(check)
    }

    pub fn get(&self, id: CheckId) -> CheckdeskResult<Option<Check>> {
        self.storage.checks().get(id)
    }

    fn get_required(&self, id: CheckId) -> CheckdeskResult<Check> {
        self.storage
            .checks()
            .get(id)?
            .ok_or_else(|| CheckdeskError::check_not_found(id.to_string()))
    }

    pub fn get_details(&self, id: CheckId) -> CheckdeskResult<CheckDetails> {
        self.storage
            .checks()
            .get_details(id)?
            .ok_or_else(|| CheckdeskError::check_not_found(id.to_string()))
    }

    /// Find a check by number or id
    ///
    /// A number carried by checks of several banks is ambiguous and must be
    /// given as an id instead.
    pub fn find(&self, identifier: &str) -> CheckdeskResult<Option<Check>> {
        let identifier = identifier.trim();
        if !identifier.starts_with(CheckId::PREFIX) {
            let mut by_number = self.storage.checks().find_by_number(identifier)?;
            match by_number.len() {
                0 => {}
                1 => return Ok(by_number.pop()),
                n => {
                    return Err(CheckdeskError::Validation(format!(
                        "Check number '{}' exists at {} banks; use the check id",
                        identifier, n
                    )))
                }
            }
        }
        match self.storage.checks().resolve(identifier)? {
            Some(id) => self.storage.checks().get(id),
            None => Ok(None),
        }
    }

    pub fn find_required(&self, identifier: &str) -> CheckdeskResult<Check> {
        self.find(identifier)?
            .ok_or_else(|| CheckdeskError::check_not_found(identifier))
    }

    pub fn list(&self, filter: &CheckFilter) -> CheckdeskResult<Vec<CheckDetails>> {
        self.storage.checks().list(filter)
    }

    /// Whether `number` is already recorded for `bank_id`
    pub fn is_duplicate(&self, number: &str, bank_id: BankId) -> CheckdeskResult<bool> {
        self.storage.checks().number_exists(number, bank_id, None)
    }

    /// Recorded checks resembling `candidate`, most similar first
    pub fn detect_duplicates(&self, candidate: &Check) -> CheckdeskResult<Vec<DuplicateMatch>> {
        let mut matches: Vec<DuplicateMatch> = self
            .storage
            .checks()
            .similar_candidates(candidate)?
            .into_iter()
            .filter_map(|existing| {
                let (score, reasons) = similarity(candidate, &existing);
                (score >= DUPLICATE_THRESHOLD).then_some(DuplicateMatch {
                    check: existing,
                    score,
                    reasons,
                })
            })
            .collect();
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(matches)
    }

    /// Every pair of recorded checks that look like duplicates
    pub fn scan_duplicates(&self) -> CheckdeskResult<Vec<DuplicatePair>> {
        let all = self.storage.checks().list(&CheckFilter::default())?;
        let mut pairs = Vec::new();
        for details in all {
            for found in self.detect_duplicates(&details.check)? {
                if details.check.id < found.check.id {
                    pairs.push(DuplicatePair {
                        first: details.check.clone(),
                        second: found.check,
                        score: found.score,
                        reasons: found.reasons,
                    });
                }
            }
        }
        pairs.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(pairs)
    }

    fn verify_references(&self, check: &Check) -> CheckdeskResult<()> {
        let client = self
            .storage
            .clients()
            .get(check.client_id)?
            .ok_or_else(|| CheckdeskError::client_not_found(check.client_id.to_string()))?;
        if !client.active {
            return Err(CheckdeskError::Validation(format!(
                "Client '{}' is inactive",
                client.name
            )));
        }

        let bank = self
            .storage
            .banks()
            .get(check.bank_id)?
            .ok_or_else(|| CheckdeskError::bank_not_found(check.bank_id.to_string()))?;
        if !bank.active {
            return Err(CheckdeskError::Validation(format!(
                "Bank '{}' is inactive",
                bank.name
            )));
        }

        if let Some(branch_id) = check.branch_id {
            let branch = self
                .storage
                .branches()
                .get(branch_id)?
                .ok_or_else(|| CheckdeskError::branch_not_found(branch_id.to_string()))?;
            if branch.bank_id != check.bank_id {
                return Err(CheckdeskError::Validation(format!(
                    "Branch '{}' does not belong to bank '{}'",
                    branch.name, bank.name
                )));
            }
        }
        Ok(())
    }

    fn ensure_unique_number(&self, check: &Check, exclude: Option<CheckId>) -> CheckdeskResult<()> {
        if self
            .storage
            .checks()
            .number_exists(&check.number, check.bank_id, exclude)?
        {
            return Err(CheckdeskError::Duplicate {
                entity_type: "Check",
                identifier: check.number.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bank, Branch, Client, ClientKind, NotificationKind};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        storage: Storage,
        bank: Bank,
        other_bank: Bank,
        client: Client,
    }

    fn fixture() -> Fixture {
        let storage = Storage::open_in_memory().unwrap();
        let bank = Bank::new("Banque Populaire", Some("BP".into()));
        let other_bank = Bank::new("CIH Bank", Some("CIH".into()));
        let client = Client::new("Atlas SARL", ClientKind::Company);
        storage.banks().insert(&bank).unwrap();
        storage.banks().insert(&other_bank).unwrap();
        storage.clients().insert(&client).unwrap();
        Fixture {
            storage,
            bank,
            other_bank,
            client,
        }
    }

    fn draft(f: &Fixture, number: &str, amount: i64) -> NewCheck {
        NewCheck::new(
            number,
            Money::from_units(amount, 0),
            date(2024, 2, 1),
            date(2024, 3, 1),
            f.client.id,
            f.bank.id,
        )
    }

    #[test]
    fn test_create_check() {
        let f = fixture();
        let service = CheckService::new(&f.storage);

        let check = service.create(draft(&f, "1234567", 2500), None).unwrap();
        assert_eq!(check.status, CheckStatus::Pending);
        assert_eq!(check.currency, "MAD");

        let details = service.get_details(check.id).unwrap();
        assert_eq!(details.client_name, "Atlas SARL");
        assert_eq!(details.bank_name, "Banque Populaire");
    }

    #[test]
    fn test_number_unique_per_bank() {
        let f = fixture();
        let service = CheckService::new(&f.storage);

        service.create(draft(&f, "555", 100), None).unwrap();
        let err = service.create(draft(&f, "555", 200), None).unwrap_err();
        assert!(matches!(err, CheckdeskError::Duplicate { .. }));
        assert!(service.is_duplicate("555", f.bank.id).unwrap());

        let mut elsewhere = draft(&f, "555", 100);
        elsewhere.bank_id = f.other_bank.id;
        service.create(elsewhere, None).unwrap();
        assert!(service.find("555").unwrap_err().is_validation());
    }

    #[test]
    fn test_invariants_enforced() {
        let f = fixture();
        let service = CheckService::new(&f.storage);

        let mut zero = draft(&f, "1", 0);
        zero.amount = Money::zero();
        assert!(service.create(zero, None).unwrap_err().is_validation());

        let mut backwards = draft(&f, "2", 10);
        backwards.due_date = date(2024, 1, 1);
        assert!(service.create(backwards, None).unwrap_err().is_validation());

        assert!(service.create(draft(&f, "  ", 10), None).unwrap_err().is_validation());

        let mut orphan = draft(&f, "3", 10);
        orphan.client_id = ClientId::new();
        assert!(service.create(orphan, None).unwrap_err().is_not_found());

        let mut no_bank = draft(&f, "4", 10);
        no_bank.bank_id = BankId::new();
        assert!(service.create(no_bank, None).unwrap_err().is_not_found());

        let mut huge = draft(&f, "5", 10);
        huge.amount = Money::from_minor(5_000_000_000_000_000_000);
        assert!(service.create(huge, None).unwrap_err().is_validation());
        assert!(service.list(&CheckFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_branch_must_belong_to_bank() {
        let f = fixture();
        let service = CheckService::new(&f.storage);
        let branch = Branch::new(f.other_bank.id, "Rabat Agdal");
        f.storage.branches().insert(&branch).unwrap();

        let mut wrong = draft(&f, "9", 10);
        wrong.branch_id = Some(branch.id);
        assert!(service.create(wrong, None).unwrap_err().is_validation());

        let mut right = draft(&f, "9", 10);
        right.bank_id = f.other_bank.id;
        right.branch_id = Some(branch.id);
        assert!(service.create(right, None).is_ok());
    }

    #[test]
    fn test_update_fields() {
        let f = fixture();
        let service = CheckService::new(&f.storage);
        let check = service.create(draft(&f, "10", 10), None).unwrap();

        let updated = service
            .update(
                check.id,
                CheckUpdate {
                    amount: Some(Money::from_units(12, 50)),
                    notes: Some("  second delivery ".into()),
                    ..CheckUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.amount, Money::from_units(12, 50));
        assert_eq!(updated.notes, "second delivery");

        let other = service.create(draft(&f, "11", 10), None).unwrap();
        let err = service
            .update(
                other.id,
                CheckUpdate {
                    number: Some("10".into()),
                    ..CheckUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CheckdeskError::Duplicate { .. }));
    }

    #[test]
    fn test_change_status() {
        let f = fixture();
        let service = CheckService::new(&f.storage);
        let check = service.create(draft(&f, "20", 10), None).unwrap();

        let check = service
            .change_status(check.id, CheckStatus::Deposited, None)
            .unwrap();
        assert_eq!(check.status, CheckStatus::Deposited);
        assert_eq!(f.storage.notifications().count_unread(None).unwrap(), 0);

        assert!(service
            .change_status(check.id, CheckStatus::Deposited, None)
            .unwrap_err()
            .is_validation());

        service
            .change_status(check.id, CheckStatus::Cashed, None)
            .unwrap();
        let notes = f.storage.notifications().list(None, false, 10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::StatusChange);

        // Any order is accepted
        service
            .change_status(check.id, CheckStatus::Pending, None)
            .unwrap();
    }

    #[test]
    fn test_delete_and_find() {
        let f = fixture();
        let service = CheckService::new(&f.storage);
        let check = service.create(draft(&f, "30", 10), None).unwrap();

        assert_eq!(service.find("30").unwrap().unwrap().id, check.id);
        assert_eq!(
            service.find(&check.id.to_string()).unwrap().unwrap().id,
            check.id
        );

        service.delete(check.id).unwrap();
        assert!(service.get(check.id).unwrap().is_none());
        assert!(service.delete(check.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_detect_duplicates() {
        let f = fixture();
        let service = CheckService::new(&f.storage);
        let original = service.create(draft(&f, "40", 900), None).unwrap();

        // Same number and amount at another bank: 50 + 30 + 15
        let mut candidate = draft(&f, "40", 900);
        candidate.bank_id = f.other_bank.id;
        let candidate = candidate.into_check(None);
        let matches = service.detect_duplicates(&candidate).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].check.id, original.id);
        assert_eq!(matches[0].score, 95);

        // Same amount and client only: 30 + 15, below the threshold
        let different_number = draft(&f, "41", 900).into_check(None);
        assert!(service.detect_duplicates(&different_number).unwrap().is_empty());

        let mut copy = draft(&f, "40", 900);
        copy.bank_id = f.other_bank.id;
        service.create(copy, None).unwrap();
        assert_eq!(service.scan_duplicates().unwrap().len(), 1);
    }

    #[test]
    fn test_similarity_weights() {
        let f = fixture();
        let a = draft(&f, "1", 10).into_check(None);
        let mut b = draft(&f, "1", 11).into_check(None);
        b.client_id = ClientId::new();
        assert_eq!(similarity(&a, &b).0, 50);
    }
}
