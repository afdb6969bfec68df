//! Bank service
//!
//! Banks and their branches. Banks referenced by checks cannot be
//! deactivated; everything else is a soft delete through the `active` flag.

use log::info;

use crate::audit::EntityType;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Bank, BankId, Branch, BranchId};
use crate::storage::Storage;

/// Optional contact fields for a branch
#[derive(Debug, Clone, Default)]
pub struct BranchDetails {
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl BranchDetails {
    fn apply(self, branch: &mut Branch) {
        if let Some(address) = self.address {
            branch.address = address.trim().to_string();
        }
        if let Some(postal_code) = self.postal_code {
            branch.postal_code = postal_code.trim().to_string();
        }
        if let Some(phone) = self.phone {
            branch.phone = phone.trim().to_string();
        }
        if let Some(email) = self.email {
            branch.email = email.trim().to_string();
        }
    }
}

/// Service for bank and branch management
pub struct BankService<'a> {
    storage: &'a Storage,
}

impl<'a> BankService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new bank
    pub fn create(&self, name: &str, code: Option<&str>) -> CheckdeskResult<Bank> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CheckdeskError::Validation("Bank name cannot be empty".into()));
        }

        let bank = Bank::new(name, code.map(str::to_string));
        self.storage.banks().insert(&bank)?;

        self.storage.log_create(
            EntityType::Bank,
            bank.id.to_string(),
            Some(bank.name.clone()),
            &bank,
        )?;
        info!("event=bank_create status=ok id={} name={}", bank.id, bank.name);

        Ok(bank)
    }

    /// Rename a bank or change its code
    ///
    /// `code: Some(None)` clears the code.
    pub fn update(
        &self,
        id: BankId,
        name: Option<&str>,
        code: Option<Option<&str>>,
    ) -> CheckdeskResult<Bank> {
        let mut bank = self.get_required(id)?;
        let before = bank.clone();

        if let Some(name) = name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CheckdeskError::Validation("Bank name cannot be empty".into()));
            }
            bank.name = name.to_string();
        }
        if let Some(code) = code {
            bank.set_code(code.map(str::to_string));
        }

        self.storage.banks().update(&bank)?;
        self.storage.log_update(
            EntityType::Bank,
            bank.id.to_string(),
            Some(bank.name.clone()),
            &before,
            &bank,
        )?;

        Ok(bank)
    }

    /// Deactivate a bank that no check references
    pub fn deactivate(&self, id: BankId) -> CheckdeskResult<Bank> {
        let bank = self.get_required(id)?;
        let referenced = self.storage.banks().check_count(id)?;
        if referenced > 0 {
            return Err(CheckdeskError::Validation(format!(
                "Bank '{}' is referenced by {} check(s) and cannot be removed",
                bank.name, referenced
            )));
        }
        self.set_active(bank, false)
    }

    pub fn reactivate(&self, id: BankId) -> CheckdeskResult<Bank> {
        let bank = self.get_required(id)?;
        self.set_active(bank, true)
    }

    fn set_active(&self, mut bank: Bank, active: bool) -> CheckdeskResult<Bank> {
        if bank.active == active {
            return Ok(bank);
        }
        let before = bank.clone();
        bank.active = active;
        self.storage.banks().update(&bank)?;
        self.storage.log_update(
            EntityType::Bank,
            bank.id.to_string(),
            Some(bank.name.clone()),
            &before,
            &bank,
        )?;
        info!("event=bank_active status=ok id={} active={}", bank.id, active);
        Ok(bank)
    }

    pub fn get(&self, id: BankId) -> CheckdeskResult<Option<Bank>> {
        self.storage.banks().get(id)
    }

    fn get_required(&self, id: BankId) -> CheckdeskResult<Bank> {
        self.storage
            .banks()
            .get(id)?
            .ok_or_else(|| CheckdeskError::bank_not_found(id.to_string()))
    }

    pub fn list(&self, include_inactive: bool) -> CheckdeskResult<Vec<Bank>> {
        self.storage.banks().list(include_inactive)
    }

    /// Find a bank by name, code or id
    pub fn find(&self, identifier: &str) -> CheckdeskResult<Option<Bank>> {
        if let Some(bank) = self.storage.banks().find_by_name_or_code(identifier)? {
            return Ok(Some(bank));
        }
        match self.storage.banks().resolve(identifier)? {
            Some(id) => self.storage.banks().get(id),
            None => Ok(None),
        }
    }

    /// Like [`find`](Self::find), but a miss is an error
    pub fn find_required(&self, identifier: &str) -> CheckdeskResult<Bank> {
        self.find(identifier)?
            .ok_or_else(|| CheckdeskError::bank_not_found(identifier))
    }

    /// Add a branch to an active bank
    pub fn add_branch(
        &self,
        bank_id: BankId,
        name: &str,
        details: BranchDetails,
    ) -> CheckdeskResult<Branch> {
        let bank = self.get_required(bank_id)?;
        if !bank.active {
            return Err(CheckdeskError::Validation(format!(
                "Bank '{}' is inactive",
                bank.name
            )));
        }

        let mut branch = Branch::new(bank_id, name);
        details.apply(&mut branch);
        self.storage.branches().insert(&branch)?;

        self.storage.log_create(
            EntityType::Branch,
            branch.id.to_string(),
            Some(format!("{} / {}", bank.name, branch.name)),
            &branch,
        )?;

        Ok(branch)
    }

    pub fn update_branch(
        &self,
        id: BranchId,
        name: Option<&str>,
        details: BranchDetails,
    ) -> CheckdeskResult<Branch> {
        let mut branch = self.get_branch_required(id)?;
        let before = branch.clone();

        if let Some(name) = name {
            branch.name = name.trim().to_string();
        }
        details.apply(&mut branch);

        self.storage.branches().update(&branch)?;
        self.storage.log_update(
            EntityType::Branch,
            branch.id.to_string(),
            Some(branch.name.clone()),
            &before,
            &branch,
        )?;

        Ok(branch)
    }

    pub fn deactivate_branch(&self, id: BranchId) -> CheckdeskResult<Branch> {
        let mut branch = self.get_branch_required(id)?;
        if !branch.active {
            return Ok(branch);
        }
        let before = branch.clone();
        branch.active = false;
        self.storage.branches().update(&branch)?;
        self.storage.log_update(
            EntityType::Branch,
            branch.id.to_string(),
            Some(branch.name.clone()),
            &before,
            &branch,
        )?;
        Ok(branch)
    }

    pub fn get_branch(&self, id: BranchId) -> CheckdeskResult<Option<Branch>> {
        self.storage.branches().get(id)
    }

    fn get_branch_required(&self, id: BranchId) -> CheckdeskResult<Branch> {
        self.storage
            .branches()
            .get(id)?
            .ok_or_else(|| CheckdeskError::branch_not_found(id.to_string()))
    }

    pub fn list_branches(
        &self,
        bank_id: Option<BankId>,
        include_inactive: bool,
    ) -> CheckdeskResult<Vec<Branch>> {
        self.storage.branches().list(bank_id, include_inactive)
    }

    /// Find a branch by id, or by name within `bank_id`
    pub fn find_branch(
        &self,
        identifier: &str,
        bank_id: Option<BankId>,
    ) -> CheckdeskResult<Option<Branch>> {
        if let Some(bank_id) = bank_id {
            if let Some(branch) = self.storage.branches().find_by_name(bank_id, identifier)? {
                return Ok(Some(branch));
            }
        }
        match self.storage.branches().resolve(identifier)? {
            Some(id) => self.storage.branches().get(id),
            None => Ok(None),
        }
    }

    /// Resolve a branch from a full or partial name, case-insensitively
    ///
    /// An exact name wins. Otherwise a single branch whose name contains
    /// `fragment` is returned; several such branches are an error.
    pub fn match_branch(
        &self,
        fragment: &str,
        bank_id: Option<BankId>,
    ) -> CheckdeskResult<Option<Branch>> {
        let fragment = fragment.trim().to_lowercase();
        if fragment.is_empty() {
            return Ok(None);
        }

        let branches = self.storage.branches().list(bank_id, false)?;
        let mut exact: Vec<&Branch> = branches
            .iter()
            .filter(|b| b.name.to_lowercase() == fragment)
            .collect();
        if exact.is_empty() {
            exact = branches
                .iter()
                .filter(|b| b.name.to_lowercase().contains(&fragment))
                .collect();
        }

        match exact.as_slice() {
            [] => Ok(None),
            [branch] => Ok(Some((*branch).clone())),
            several => Err(CheckdeskError::Validation(format!(
                "Branch '{}' is ambiguous: {}",
                fragment,
                several
                    .iter()
                    .map(|b| b.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Check, Client, ClientKind, Money};
    use chrono::NaiveDate;

    fn setup() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_find() {
        let storage = setup();
        let service = BankService::new(&storage);

        let bank = service.create("Attijariwafa Bank", Some("awb")).unwrap();
        assert_eq!(bank.code.as_deref(), Some("AWB"));

        assert_eq!(service.find("awb").unwrap().unwrap().id, bank.id);
        assert_eq!(service.find("ATTIJARIWAFA BANK").unwrap().unwrap().id, bank.id);
        assert_eq!(
            service.find(&bank.id.to_string()).unwrap().unwrap().id,
            bank.id
        );
        assert!(service.find("nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let storage = setup();
        let service = BankService::new(&storage);

        service.create("Banque Populaire", Some("BP")).unwrap();
        let err = service.create("banque populaire", None).unwrap_err();
        assert!(matches!(err, CheckdeskError::Duplicate { .. }));
    }

    #[test]
    fn test_update_and_clear_code() {
        let storage = setup();
        let service = BankService::new(&storage);
        let bank = service.create("CIH", Some("CIH")).unwrap();

        let updated = service
            .update(bank.id, Some("CIH Bank"), Some(None))
            .unwrap();
        assert_eq!(updated.name, "CIH Bank");
        assert!(updated.code.is_none());
    }

    #[test]
    fn test_deactivate_unreferenced_bank() {
        let storage = setup();
        let service = BankService::new(&storage);
        let bank = service.create("Al Barid Bank", Some("ABB")).unwrap();

        let bank = service.deactivate(bank.id).unwrap();
        assert!(!bank.active);
        assert!(service.list(false).unwrap().is_empty());
        assert_eq!(service.list(true).unwrap().len(), 1);

        let bank = service.reactivate(bank.id).unwrap();
        assert!(bank.active);
    }

    #[test]
    fn test_deactivate_referenced_bank_refused() {
        let storage = setup();
        let service = BankService::new(&storage);
        let bank = service.create("BMCI", None).unwrap();

        let client = Client::new("Atlas SARL", ClientKind::Company);
        storage.clients().insert(&client).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let check = Check::new("0001", Money::from_units(100, 0), "MAD", day, day, client.id, bank.id);
        storage.checks().insert(&check).unwrap();

        let err = service.deactivate(bank.id).unwrap_err();
        assert!(err.is_validation());
        assert!(service.get(bank.id).unwrap().unwrap().active);
    }

    #[test]
    fn test_branches() {
        let storage = setup();
        let service = BankService::new(&storage);
        let bank = service.create("CAM", None).unwrap();

        let branch = service
            .add_branch(
                bank.id,
                "Casablanca Anfa",
                BranchDetails {
                    phone: Some("0522000000".into()),
                    ..BranchDetails::default()
                },
            )
            .unwrap();
        assert_eq!(branch.phone, "0522000000");

        let found = service.find_branch("Casablanca Anfa", Some(bank.id)).unwrap();
        assert_eq!(found.unwrap().id, branch.id);
        assert_eq!(
            service.match_branch("anfa", None).unwrap().unwrap().id,
            branch.id
        );

        let renamed = service
            .update_branch(branch.id, Some("Anfa"), BranchDetails::default())
            .unwrap();
        assert_eq!(renamed.name, "Anfa");

        service.deactivate_branch(branch.id).unwrap();
        assert!(service.list_branches(Some(bank.id), false).unwrap().is_empty());
    }

    #[test]
    fn test_match_branch_prefers_exact_and_reports_ambiguity() {
        let storage = setup();
        let service = BankService::new(&storage);
        let bank = service.create("CAM", None).unwrap();
        let maarif = service
            .add_branch(bank.id, "Casablanca Maarif", BranchDetails::default())
            .unwrap();
        service
            .add_branch(bank.id, "Casablanca Anfa", BranchDetails::default())
            .unwrap();
        let casa = service
            .add_branch(bank.id, "Casa", BranchDetails::default())
            .unwrap();

        assert_eq!(service.match_branch("casa", None).unwrap().unwrap().id, casa.id);
        assert_eq!(
            service.match_branch("Maarif", Some(bank.id)).unwrap().unwrap().id,
            maarif.id
        );
        assert!(service.match_branch("Rabat", None).unwrap().is_none());

        let err = service.match_branch("casablanca", None).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_branch_on_inactive_bank_refused() {
        let storage = setup();
        let service = BankService::new(&storage);
        let bank = service.create("CDM", None).unwrap();
        service.deactivate(bank.id).unwrap();

        assert!(service
            .add_branch(bank.id, "Rabat", BranchDetails::default())
            .unwrap_err()
            .is_validation());
    }
}
