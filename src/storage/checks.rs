//! Check repository
//!
//! Besides plain CRUD this repository owns the SQL side of filtering and
//! the aggregate queries behind the dashboard.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{
    BankId, BranchId, Check, CheckDetails, CheckId, CheckStatus, ClientId, Money,
};

use super::clients::escape_like;
use super::{map_constraint, parse_column, resolve_id_prefix};

const CHECK_COLUMNS: &str = "c.id, c.number, c.amount, c.currency, c.issue_date, c.due_date,
    c.status, c.client_id, c.bank_id, c.branch_id, c.depositor_name, c.invoice_number,
    c.invoice_date, c.notes, c.created_by, c.created_at, c.updated_at";

const DETAILS_FROM_SQL: &str = "FROM checks c
    JOIN clients cl ON cl.id = c.client_id
    JOIN banks b ON b.id = c.bank_id
    LEFT JOIN branches br ON br.id = c.branch_id";

fn check_from_row(row: &Row<'_>) -> rusqlite::Result<Check> {
    Ok(Check {
        id: row.get(0)?,
        number: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        issue_date: row.get(4)?,
        due_date: row.get(5)?,
        status: parse_column(row, 6, CheckStatus::parse)?,
        client_id: row.get(7)?,
        bank_id: row.get(8)?,
        branch_id: row.get(9)?,
        depositor_name: row.get(10)?,
        invoice_number: row.get(11)?,
        invoice_date: row.get(12)?,
        notes: row.get(13)?,
        created_by: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn details_from_row(row: &Row<'_>) -> rusqlite::Result<CheckDetails> {
    Ok(CheckDetails {
        check: check_from_row(row)?,
        client_name: row.get(17)?,
        bank_name: row.get(18)?,
        branch_name: row.get(19)?,
    })
}

/// Sort order for check listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckSort {
    /// Earliest due first
    #[default]
    DueDate,
    /// Most recently issued first
    IssueDate,
    /// Largest first
    Amount,
    Number,
    /// Most recently recorded first
    Created,
}

impl CheckSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "due" | "due_date" => Some(Self::DueDate),
            "issue" | "issue_date" => Some(Self::IssueDate),
            "amount" => Some(Self::Amount),
            "number" => Some(Self::Number),
            "created" | "recent" => Some(Self::Created),
            _ => None,
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            Self::DueDate => "c.due_date ASC, c.number ASC",
            Self::IssueDate => "c.issue_date DESC, c.number ASC",
            Self::Amount => "c.amount DESC, c.due_date ASC",
            Self::Number => "c.number ASC",
            Self::Created => "c.created_at DESC",
        }
    }
}

/// Criteria for listing checks; every field narrows the result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckFilter {
    /// Any of these statuses; empty means all
    pub statuses: Vec<CheckStatus>,
    pub bank_id: Option<BankId>,
    pub branch_id: Option<BranchId>,
    pub client_id: Option<ClientId>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub issue_from: Option<NaiveDate>,
    pub issue_to: Option<NaiveDate>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    /// Substring matched against number, client, bank, invoice and notes
    pub text: Option<String>,
    pub sort: CheckSort,
    pub limit: Option<usize>,
}

impl CheckFilter {
    pub fn with_status(mut self, status: CheckStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// Open checks due between `from` and `to` inclusive
    pub fn open_due_between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            statuses: vec![CheckStatus::Pending, CheckStatus::Deposited],
            due_from: Some(from),
            due_to: Some(to),
            ..Self::default()
        }
    }

    /// Open checks whose due date is before `today`
    pub fn overdue(today: NaiveDate) -> Self {
        Self {
            statuses: vec![CheckStatus::Pending, CheckStatus::Deposited],
            due_to: today.pred_opt(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(" WHERE 1 = 1");
        let mut binds: Vec<Value> = Vec::new();

        if !self.statuses.is_empty() {
            let placeholders = vec!["?"; self.statuses.len()].join(", ");
            sql.push_str(&format!(" AND c.status IN ({})", placeholders));
            binds.extend(
                self.statuses
                    .iter()
                    .map(|s| Value::Text(s.as_str().to_string())),
            );
        }
        if let Some(id) = self.bank_id {
            sql.push_str(" AND c.bank_id = ?");
            binds.push(Value::Text(id.as_uuid().to_string()));
        }
        if let Some(id) = self.branch_id {
            sql.push_str(" AND c.branch_id = ?");
            binds.push(Value::Text(id.as_uuid().to_string()));
        }
        if let Some(id) = self.client_id {
            sql.push_str(" AND c.client_id = ?");
            binds.push(Value::Text(id.as_uuid().to_string()));
        }
        for (column, op, date) in [
            ("c.due_date", ">=", self.due_from),
            ("c.due_date", "<=", self.due_to),
            ("c.issue_date", ">=", self.issue_from),
            ("c.issue_date", "<=", self.issue_to),
        ] {
            if let Some(date) = date {
                sql.push_str(&format!(" AND {} {} ?", column, op));
                binds.push(Value::Text(date.format("%F").to_string()));
            }
        }
        if let Some(min) = self.min_amount {
            sql.push_str(" AND c.amount >= ?");
            binds.push(Value::Integer(min.minor()));
        }
        if let Some(max) = self.max_amount {
            sql.push_str(" AND c.amount <= ?");
            binds.push(Value::Integer(max.minor()));
        }
        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            sql.push_str(
                " AND (c.number LIKE ? ESCAPE '\\' OR cl.name LIKE ? ESCAPE '\\'
                   OR b.name LIKE ? ESCAPE '\\' OR c.invoice_number LIKE ? ESCAPE '\\'
                   OR c.notes LIKE ? ESCAPE '\\' OR c.depositor_name LIKE ? ESCAPE '\\')",
            );
            let pattern = format!("%{}%", escape_like(text));
            binds.extend(std::iter::repeat(Value::Text(pattern)).take(6));
        }

        (sql, binds)
    }
}

/// Count and amount of checks in one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTotal {
    pub status: CheckStatus,
    pub count: u64,
    pub amount: Money,
}

/// Count and amount of checks drawn on one bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankTotal {
    pub bank_id: BankId,
    pub bank_name: String,
    pub count: u64,
    pub amount: Money,
}

/// Checks issued in one calendar month (`YYYY-MM`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub count: u64,
    pub amount: Money,
}

/// SQLite-backed check repository
pub struct CheckRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CheckRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, check: &Check) -> CheckdeskResult<()> {
        check
            .validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO checks (
                    id, number, amount, currency, issue_date, due_date, status,
                    client_id, bank_id, branch_id, depositor_name, invoice_number,
                    invoice_date, notes, created_by, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    check.id,
                    check.number,
                    check.amount,
                    check.currency,
                    check.issue_date,
                    check.due_date,
                    check.status.as_str(),
                    check.client_id,
                    check.bank_id,
                    check.branch_id,
                    check.depositor_name,
                    check.invoice_number,
                    check.invoice_date,
                    check.notes,
                    check.created_by,
                    check.created_at,
                    check.updated_at,
                ],
            )
            .map_err(|e| map_constraint(e, "Check", &check.number))?;
        Ok(())
    }

    pub fn update(&self, check: &Check) -> CheckdeskResult<()> {
        check
            .validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        let changed = self
            .conn
            .execute(
                "UPDATE checks SET
                    number = ?1, amount = ?2, currency = ?3, issue_date = ?4, due_date = ?5,
                    status = ?6, client_id = ?7, bank_id = ?8, branch_id = ?9,
                    depositor_name = ?10, invoice_number = ?11, invoice_date = ?12,
                    notes = ?13, updated_at = ?14
                 WHERE id = ?15",
                params![
                    check.number,
                    check.amount,
                    check.currency,
                    check.issue_date,
                    check.due_date,
                    check.status.as_str(),
                    check.client_id,
                    check.bank_id,
                    check.branch_id,
                    check.depositor_name,
                    check.invoice_number,
                    check.invoice_date,
                    check.notes,
                    check.updated_at,
                    check.id,
                ],
            )
            .map_err(|e| map_constraint(e, "Check", &check.number))?;

        if changed == 0 {
            return Err(CheckdeskError::check_not_found(check.id.to_string()));
        }
        Ok(())
    }

    /// Delete a check; returns whether a row was removed
    pub fn delete(&self, id: CheckId) -> CheckdeskResult<bool> {
        let changed = self.conn.execute("DELETE FROM checks WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn get(&self, id: CheckId) -> CheckdeskResult<Option<Check>> {
        let check = self
            .conn
            .query_row(
                &format!("SELECT {CHECK_COLUMNS} FROM checks c WHERE c.id = ?1"),
                [id],
                check_from_row,
            )
            .optional()?;
        Ok(check)
    }

    pub fn get_details(&self, id: CheckId) -> CheckdeskResult<Option<CheckDetails>> {
        let details = self
            .conn
            .query_row(
                &format!(
                    "SELECT {CHECK_COLUMNS}, cl.name, b.name, br.name {DETAILS_FROM_SQL} WHERE c.id = ?1"
                ),
                [id],
                details_from_row,
            )
            .optional()?;
        Ok(details)
    }

    /// Checks carrying `number`, across all banks
    pub fn find_by_number(&self, number: &str) -> CheckdeskResult<Vec<Check>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHECK_COLUMNS} FROM checks c WHERE c.number = ?1 ORDER BY c.created_at"
        ))?;
        let checks = stmt
            .query_map([number.trim()], check_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(checks)
    }

    /// Whether `(number, bank)` is already taken, optionally ignoring one check
    pub fn number_exists(
        &self,
        number: &str,
        bank_id: BankId,
        exclude: Option<CheckId>,
    ) -> CheckdeskResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM checks
                WHERE number = ?1 AND bank_id = ?2 AND (?3 IS NULL OR id != ?3)
            )",
            params![number.trim(), bank_id, exclude],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// Checks sharing the number, or the amount and client, of `check`
    pub fn similar_candidates(&self, check: &Check) -> CheckdeskResult<Vec<Check>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHECK_COLUMNS} FROM checks c
             WHERE c.id != ?1
               AND (c.number = ?2 OR (c.amount = ?3 AND c.client_id = ?4))"
        ))?;
        let checks = stmt
            .query_map(
                params![check.id, check.number, check.amount, check.client_id],
                check_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(checks)
    }

    /// Checks with their client, bank and branch names
    pub fn list(&self, filter: &CheckFilter) -> CheckdeskResult<Vec<CheckDetails>> {
        let (where_sql, mut binds) = filter.where_clause();
        let mut sql = format!(
            "SELECT {CHECK_COLUMNS}, cl.name, b.name, br.name {DETAILS_FROM_SQL}{where_sql} ORDER BY {}",
            filter.sort.order_by()
        );
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let checks = stmt
            .query_map(params_from_iter(binds), details_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(checks)
    }

    /// Number and total amount of checks matching a filter
    pub fn totals(&self, filter: &CheckFilter) -> CheckdeskResult<(u64, Money)> {
        let (where_sql, binds) = filter.where_clause();
        let totals = self.conn.query_row(
            &format!("SELECT COUNT(*), COALESCE(SUM(c.amount), 0) {DETAILS_FROM_SQL}{where_sql}"),
            params_from_iter(binds),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(totals)
    }

    pub fn resolve(&self, input: &str) -> CheckdeskResult<Option<CheckId>> {
        resolve_id_prefix(self.conn, "checks", CheckId::strip_display_prefix(input))
    }

    /// Count and amount per status, in status order, omitting empty statuses
    pub fn status_totals(&self, filter: &CheckFilter) -> CheckdeskResult<Vec<StatusTotal>> {
        let (where_sql, binds) = filter.where_clause();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT c.status, COUNT(*), SUM(c.amount) {DETAILS_FROM_SQL}{where_sql} GROUP BY c.status"
        ))?;
        let mut totals = stmt
            .query_map(params_from_iter(binds), |row| {
                Ok(StatusTotal {
                    status: parse_column(row, 0, CheckStatus::parse)?,
                    count: row.get(1)?,
                    amount: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        totals.sort_by_key(|t| t.status);
        Ok(totals)
    }

    /// Banks ranked by total amount, largest first
    pub fn top_banks(&self, limit: usize) -> CheckdeskResult<Vec<BankTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.id, b.name, COUNT(*), SUM(c.amount)
             FROM checks c JOIN banks b ON b.id = c.bank_id
             GROUP BY b.id, b.name
             ORDER BY SUM(c.amount) DESC, b.name ASC
             LIMIT ?1",
        )?;
        let totals = stmt
            .query_map([limit as i64], |row| {
                Ok(BankTotal {
                    bank_id: row.get(0)?,
                    bank_name: row.get(1)?,
                    count: row.get(2)?,
                    amount: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(totals)
    }

    /// Checks issued per month from `from` onward, oldest month first
    pub fn monthly_volume(&self, from: NaiveDate) -> CheckdeskResult<Vec<MonthTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT strftime('%Y-%m', issue_date) AS month, COUNT(*), SUM(amount)
             FROM checks
             WHERE issue_date >= ?1
             GROUP BY month
             ORDER BY month",
        )?;
        let totals = stmt
            .query_map([from], |row| {
                Ok(MonthTotal {
                    month: row.get(0)?,
                    count: row.get(1)?,
                    amount: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bank, Client, ClientKind};
    use crate::storage::Storage;

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
        let bank = Bank::new("Attijariwafa Bank", Some("AWB".into()));
        let other_bank = Bank::new("Banque Populaire", Some("BP".into()));
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

    fn check(f: &Fixture, number: &str, minor: i64, due: NaiveDate) -> Check {
        Check::new(
            number,
            Money::from_minor(minor),
            "MAD",
            date(2026, 1, 1),
            due,
            f.client.id,
            f.bank.id,
        )
    }

    #[test]
    fn test_insert_get_and_details() {
        let f = fixture();
        let c = check(&f, "1000001", 150_000, date(2026, 2, 1));
        f.storage.checks().insert(&c).unwrap();

        assert_eq!(f.storage.checks().get(c.id).unwrap(), Some(c.clone()));
        let details = f.storage.checks().get_details(c.id).unwrap().unwrap();
        assert_eq!(details.client_name, "Atlas SARL");
        assert_eq!(details.bank_name, "Attijariwafa Bank");
        assert_eq!(details.branch_name, None);
    }

    #[test]
    fn test_number_unique_per_bank() {
        let f = fixture();
        f.storage
            .checks()
            .insert(&check(&f, "42", 100, date(2026, 2, 1)))
            .unwrap();

        let err = f
            .storage
            .checks()
            .insert(&check(&f, "42", 200, date(2026, 2, 1)))
            .unwrap_err();
        assert!(matches!(err, CheckdeskError::Duplicate { .. }));

        // Same number on another bank is fine
        let mut other = check(&f, "42", 200, date(2026, 2, 1));
        other.bank_id = f.other_bank.id;
        f.storage.checks().insert(&other).unwrap();

        assert!(f.storage.checks().number_exists("42", f.bank.id, None).unwrap());
        assert!(!f
            .storage
            .checks()
            .number_exists("42", f.other_bank.id, Some(other.id))
            .unwrap());
    }

    #[test]
    fn test_missing_client_rejected() {
        let f = fixture();
        let mut c = check(&f, "7", 100, date(2026, 2, 1));
        c.client_id = ClientId::new();
        assert!(f.storage.checks().insert(&c).unwrap_err().is_validation());
    }

    #[test]
    fn test_filter_composition() {
        let f = fixture();
        let repo = f.storage.checks();
        let mut a = check(&f, "A1", 100_000, date(2026, 2, 10));
        a.notes = "urgent delivery".into();
        let mut b = check(&f, "B2", 500_000, date(2026, 3, 10));
        b.status = CheckStatus::Cashed;
        let mut c = check(&f, "C3", 50_000, date(2026, 2, 20));
        c.bank_id = f.other_bank.id;
        for x in [&a, &b, &c] {
            repo.insert(x).unwrap();
        }

        let pending = CheckFilter::default().with_status(CheckStatus::Pending);
        assert_eq!(repo.list(&pending).unwrap().len(), 2);

        let filter = CheckFilter {
            bank_id: Some(f.bank.id),
            min_amount: Some(Money::from_minor(200_000)),
            ..CheckFilter::default()
        };
        let result = repo.list(&filter).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].check.number, "B2");

        let february = CheckFilter {
            due_from: Some(date(2026, 2, 1)),
            due_to: Some(date(2026, 2, 28)),
            ..CheckFilter::default()
        };
        let numbers: Vec<String> = repo
            .list(&february)
            .unwrap()
            .into_iter()
            .map(|d| d.check.number)
            .collect();
        assert_eq!(numbers, vec!["A1", "C3"]);

        let text = CheckFilter {
            text: Some("URGENT".into()),
            ..CheckFilter::default()
        };
        assert_eq!(repo.list(&text).unwrap().len(), 1);

        let by_bank_name = CheckFilter {
            text: Some("populaire".into()),
            ..CheckFilter::default()
        };
        assert_eq!(repo.list(&by_bank_name).unwrap()[0].check.number, "C3");

        let (count, amount) = repo.totals(&CheckFilter::default()).unwrap();
        assert_eq!(count, 3);
        assert_eq!(amount, Money::from_minor(650_000));
    }

    #[test]
    fn test_sort_and_limit() {
        let f = fixture();
        let repo = f.storage.checks();
        repo.insert(&check(&f, "1", 300, date(2026, 5, 1))).unwrap();
        repo.insert(&check(&f, "2", 100, date(2026, 3, 1))).unwrap();
        repo.insert(&check(&f, "3", 200, date(2026, 4, 1))).unwrap();

        let by_amount = CheckFilter {
            sort: CheckSort::Amount,
            limit: Some(2),
            ..CheckFilter::default()
        };
        let numbers: Vec<String> = repo
            .list(&by_amount)
            .unwrap()
            .into_iter()
            .map(|d| d.check.number)
            .collect();
        assert_eq!(numbers, vec!["1", "3"]);
    }

    #[test]
    fn test_aggregates() {
        let f = fixture();
        let repo = f.storage.checks();
        let mut a = check(&f, "1", 100_000, date(2026, 2, 1));
        a.issue_date = date(2026, 1, 15);
        let mut b = check(&f, "2", 200_000, date(2026, 3, 1));
        b.issue_date = date(2026, 2, 15);
        b.status = CheckStatus::Bounced;
        let mut c = check(&f, "3", 50_000, date(2026, 3, 1));
        c.issue_date = date(2026, 2, 20);
        c.bank_id = f.other_bank.id;
        for x in [&a, &b, &c] {
            repo.insert(x).unwrap();
        }

        let statuses = repo.status_totals(&CheckFilter::default()).unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].status, CheckStatus::Pending);
        assert_eq!(statuses[0].count, 2);
        assert_eq!(statuses[0].amount, Money::from_minor(150_000));

        let banks = repo.top_banks(5).unwrap();
        assert_eq!(banks[0].bank_name, "Attijariwafa Bank");
        assert_eq!(banks[0].amount, Money::from_minor(300_000));
        assert_eq!(banks[1].count, 1);

        let months = repo.monthly_volume(date(2026, 1, 1)).unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2026-01");
        assert_eq!(months[1].count, 2);
    }

    #[test]
    fn test_delete() {
        let f = fixture();
        let c = check(&f, "9", 100, date(2026, 2, 1));
        f.storage.checks().insert(&c).unwrap();
        assert!(f.storage.checks().delete(c.id).unwrap());
        assert!(!f.storage.checks().delete(c.id).unwrap());
        assert!(f.storage.checks().get(c.id).unwrap().is_none());
    }
}
