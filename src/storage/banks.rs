//! Bank and branch repositories

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Bank, BankId, Branch, BranchId};

use super::{bool_to_int, map_constraint, resolve_id_prefix};

const BANK_SELECT_SQL: &str = "SELECT id, name, code, active, created_at FROM banks";

const BRANCH_SELECT_SQL: &str = "SELECT
    id, bank_id, name, address, postal_code, phone, email, active, created_at
FROM branches";

fn bank_from_row(row: &Row<'_>) -> rusqlite::Result<Bank> {
    Ok(Bank {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        active: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn branch_from_row(row: &Row<'_>) -> rusqlite::Result<Branch> {
    Ok(Branch {
        id: row.get(0)?,
        bank_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        postal_code: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// SQLite-backed bank repository
pub struct BankRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> BankRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, bank: &Bank) -> CheckdeskResult<()> {
        bank.validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO banks (id, name, code, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    bank.id,
                    bank.name,
                    bank.code,
                    bool_to_int(bank.active),
                    bank.created_at
                ],
            )
            .map_err(|e| map_constraint(e, "Bank", &bank.name))?;
        Ok(())
    }

    pub fn update(&self, bank: &Bank) -> CheckdeskResult<()> {
        bank.validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        let changed = self
            .conn
            .execute(
                "UPDATE banks SET name = ?1, code = ?2, active = ?3 WHERE id = ?4",
                params![bank.name, bank.code, bool_to_int(bank.active), bank.id],
            )
            .map_err(|e| map_constraint(e, "Bank", &bank.name))?;

        if changed == 0 {
            return Err(CheckdeskError::bank_not_found(bank.id.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, id: BankId) -> CheckdeskResult<Option<Bank>> {
        let bank = self
            .conn
            .query_row(
                &format!("{BANK_SELECT_SQL} WHERE id = ?1"),
                [id],
                bank_from_row,
            )
            .optional()?;
        Ok(bank)
    }

    /// All banks ordered by name
    pub fn list(&self, include_inactive: bool) -> CheckdeskResult<Vec<Bank>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BANK_SELECT_SQL} WHERE (?1 = 1 OR active = 1) ORDER BY name COLLATE NOCASE"
        ))?;
        let banks = stmt
            .query_map([bool_to_int(include_inactive)], bank_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(banks)
    }

    /// Look a bank up by exact name or short code, case-insensitively
    pub fn find_by_name_or_code(&self, query: &str) -> CheckdeskResult<Option<Bank>> {
        let query = query.trim();
        let bank = self
            .conn
            .query_row(
                &format!("{BANK_SELECT_SQL} WHERE name = ?1 OR code = ?1 LIMIT 1"),
                [query],
                bank_from_row,
            )
            .optional()?;
        Ok(bank)
    }

    /// Resolve a full or short (`bnk-1a2b3c4d`) id
    pub fn resolve(&self, input: &str) -> CheckdeskResult<Option<BankId>> {
        resolve_id_prefix(self.conn, "banks", BankId::strip_display_prefix(input))
    }

    /// Number of checks drawn on this bank
    pub fn check_count(&self, id: BankId) -> CheckdeskResult<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM checks WHERE bank_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count(&self) -> CheckdeskResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM banks", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// SQLite-backed branch repository
pub struct BranchRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> BranchRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, branch: &Branch) -> CheckdeskResult<()> {
        branch
            .validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO branches (
                    id, bank_id, name, address, postal_code, phone, email, active, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    branch.id,
                    branch.bank_id,
                    branch.name,
                    branch.address,
                    branch.postal_code,
                    branch.phone,
                    branch.email,
                    bool_to_int(branch.active),
                    branch.created_at,
                ],
            )
            .map_err(|e| map_constraint(e, "Branch", &branch.name))?;
        Ok(())
    }

    pub fn update(&self, branch: &Branch) -> CheckdeskResult<()> {
        branch
            .validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        let changed = self
            .conn
            .execute(
                "UPDATE branches
                 SET name = ?1, address = ?2, postal_code = ?3, phone = ?4, email = ?5, active = ?6
                 WHERE id = ?7",
                params![
                    branch.name,
                    branch.address,
                    branch.postal_code,
                    branch.phone,
                    branch.email,
                    bool_to_int(branch.active),
                    branch.id,
                ],
            )
            .map_err(|e| map_constraint(e, "Branch", &branch.name))?;

        if changed == 0 {
            return Err(CheckdeskError::branch_not_found(branch.id.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, id: BranchId) -> CheckdeskResult<Option<Branch>> {
        let branch = self
            .conn
            .query_row(
                &format!("{BRANCH_SELECT_SQL} WHERE id = ?1"),
                [id],
                branch_from_row,
            )
            .optional()?;
        Ok(branch)
    }

    /// Branches, optionally restricted to one bank, ordered by name
    pub fn list(&self, bank_id: Option<BankId>, include_inactive: bool) -> CheckdeskResult<Vec<Branch>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BRANCH_SELECT_SQL}
             WHERE (?1 IS NULL OR bank_id = ?1)
               AND (?2 = 1 OR active = 1)
             ORDER BY name COLLATE NOCASE"
        ))?;
        let branches = stmt
            .query_map(params![bank_id, bool_to_int(include_inactive)], branch_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(branches)
    }

    pub fn find_by_name(&self, bank_id: BankId, name: &str) -> CheckdeskResult<Option<Branch>> {
        let branch = self
            .conn
            .query_row(
                &format!("{BRANCH_SELECT_SQL} WHERE bank_id = ?1 AND name = ?2"),
                params![bank_id, name.trim()],
                branch_from_row,
            )
            .optional()?;
        Ok(branch)
    }

    pub fn resolve(&self, input: &str) -> CheckdeskResult<Option<BranchId>> {
        resolve_id_prefix(self.conn, "branches", BranchId::strip_display_prefix(input))
    }

    pub fn check_count(&self, id: BranchId) -> CheckdeskResult<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM checks WHERE branch_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[test]
    fn test_insert_get_list() {
        let storage = Storage::open_in_memory().unwrap();
        let repo = storage.banks();

        let bank = Bank::new("Attijariwafa Bank", Some("AWB".into()));
        repo.insert(&bank).unwrap();

        assert_eq!(repo.get(bank.id).unwrap(), Some(bank.clone()));
        assert_eq!(repo.list(false).unwrap().len(), 1);
        assert_eq!(
            repo.find_by_name_or_code("awb").unwrap().map(|b| b.id),
            Some(bank.id)
        );
        assert_eq!(
            repo.find_by_name_or_code("ATTIJARIWAFA BANK").unwrap().map(|b| b.id),
            Some(bank.id)
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let repo = storage.banks();
        repo.insert(&Bank::new("BMCI", None)).unwrap();

        let err = repo.insert(&Bank::new("bmci", None)).unwrap_err();
        assert!(matches!(err, CheckdeskError::Duplicate { .. }));
    }

    #[test]
    fn test_inactive_hidden_from_default_list() {
        let storage = Storage::open_in_memory().unwrap();
        let repo = storage.banks();
        let mut bank = Bank::new("Old Bank", None);
        repo.insert(&bank).unwrap();

        bank.active = false;
        repo.update(&bank).unwrap();

        assert!(repo.list(false).unwrap().is_empty());
        assert_eq!(repo.list(true).unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_short_id() {
        let storage = Storage::open_in_memory().unwrap();
        let bank = Bank::new("CIH", None);
        storage.banks().insert(&bank).unwrap();

        let short = bank.id.to_string();
        assert_eq!(storage.banks().resolve(&short).unwrap(), Some(bank.id));
        assert_eq!(storage.banks().resolve("bnk-zzzz").unwrap(), None);
    }

    #[test]
    fn test_branches_scoped_to_bank() {
        let storage = Storage::open_in_memory().unwrap();
        let a = Bank::new("Bank A", None);
        let b = Bank::new("Bank B", None);
        storage.banks().insert(&a).unwrap();
        storage.banks().insert(&b).unwrap();

        let repo = storage.branches();
        repo.insert(&Branch::new(a.id, "Centre")).unwrap();
        repo.insert(&Branch::new(b.id, "Centre")).unwrap();
        repo.insert(&Branch::new(a.id, "Maarif")).unwrap();

        assert_eq!(repo.list(Some(a.id), false).unwrap().len(), 2);
        assert_eq!(repo.list(None, false).unwrap().len(), 3);
        assert!(repo.find_by_name(b.id, "centre").unwrap().is_some());

        let err = repo.insert(&Branch::new(a.id, "CENTRE")).unwrap_err();
        assert!(matches!(err, CheckdeskError::Duplicate { .. }));
    }

    #[test]
    fn test_branch_requires_existing_bank() {
        let storage = Storage::open_in_memory().unwrap();
        let err = storage
            .branches()
            .insert(&Branch::new(BankId::new(), "Orphan"))
            .unwrap_err();
        assert!(err.is_validation());
    }
}
