//! Storage initialization
//!
//! Seeds the banks operating in Morocco on first run.

use log::info;

use crate::error::CheckdeskResult;
use crate::models::Bank;

use super::Storage;

/// Banks created on a fresh installation: (name, code)
pub const DEFAULT_BANKS: &[(&str, &str)] = &[
    ("Crédit Agricole du Maroc", "CAM"),
    ("Attijariwafa Bank", "AWB"),
    ("Banque Populaire", "BP"),
    ("Crédit Immobilier et Hôtelier", "CIH"),
    ("BMCE Bank", "BMCE"),
    ("Société Générale Maroc", "SGMB"),
    ("Crédit du Maroc", "CDM"),
    ("Al Barid Bank", "ABB"),
    ("BMCI", "BMCI"),
];

/// Insert any missing default bank; returns how many were created
pub fn initialize_storage(storage: &Storage) -> CheckdeskResult<usize> {
    let banks = storage.banks();
    let mut created = 0;

    for (name, code) in DEFAULT_BANKS {
        if banks.find_by_name_or_code(name)?.is_some() || banks.find_by_name_or_code(code)?.is_some() {
            continue;
        }
        banks.insert(&Bank::new(*name, Some(code.to_string())))?;
        created += 1;
    }

    if created > 0 {
        info!("event=seed_banks status=ok created={}", created);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeding_is_idempotent() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(initialize_storage(&storage).unwrap(), DEFAULT_BANKS.len());
        assert_eq!(initialize_storage(&storage).unwrap(), 0);
        assert_eq!(storage.banks().count().unwrap(), DEFAULT_BANKS.len() as u64);
    }

    #[test]
    fn test_existing_code_is_respected() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .banks()
            .insert(&Bank::new("Attijariwafa", Some("AWB".into())))
            .unwrap();
        assert_eq!(
            initialize_storage(&storage).unwrap(),
            DEFAULT_BANKS.len() - 1
        );
    }
}
