//! Check import service
//!
//! Bulk-records checks from a CSV file or the first worksheet of an Excel
//! workbook (`.xlsx`, `.xlsm`, `.xls`, `.ods`), with a header row. Required columns
//! are `cheque_number` (or `number`), `amount`, `due_date` and
//! `client_name`. Optional columns: `issue_date`, `bank`, `branch_name`,
//! `currency`, `depositor_name`, `notes`, `client_phone`, `client_email`
//! and `client_type`.
//!
//! Clients are found by name or created. Rows whose number is already
//! recorded for the bank are skipped; invalid rows are reported by line and
//! do not stop the import.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use serde::Serialize;

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Bank, BankId, BranchId, ClientId, ClientKind, Money, UserId};
use crate::storage::Storage;

use super::bank::BankService;
use super::check::{CheckService, NewCheck};
use super::client::{ClientFields, ClientService};

const REQUIRED_COLUMNS: [&str; 4] = ["cheque_number", "amount", "due_date", "client_name"];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Summary of a completed import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportResult {
    /// Data rows read, header excluded
    pub total_rows: usize,
    pub imported: usize,
    /// Rows whose number was already recorded for the bank
    pub skipped: usize,
    /// One message per rejected row, prefixed with its line number
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One CSV row, trimmed, before any lookup
#[derive(Debug, Clone, Default)]
struct ImportRow {
    number: String,
    amount: String,
    due_date: String,
    client_name: String,
    issue_date: String,
    bank: String,
    branch_name: String,
    currency: String,
    depositor_name: String,
    notes: String,
    client_phone: String,
    client_email: String,
    client_type: String,
}

/// Header name to column index
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_headers(headers: &StringRecord) -> CheckdeskResult<Self> {
        let mut map = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            let key = header.trim().trim_start_matches('\u{feff}').to_lowercase();
            let key = match key.as_str() {
                "number" | "check_number" => "cheque_number".to_string(),
                _ => key,
            };
            map.entry(key).or_insert(idx);
        }

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !map.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            return Err(CheckdeskError::Import(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )));
        }
        Ok(Self(map))
    }

    fn get(&self, record: &StringRecord, name: &str) -> String {
        self.0
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    fn row(&self, record: &StringRecord) -> ImportRow {
        ImportRow {
            number: self.get(record, "cheque_number"),
            amount: self.get(record, "amount"),
            due_date: self.get(record, "due_date"),
            client_name: self.get(record, "client_name"),
            issue_date: self.get(record, "issue_date"),
            bank: self.get(record, "bank"),
            branch_name: self.get(record, "branch_name"),
            currency: self.get(record, "currency"),
            depositor_name: self.get(record, "depositor_name"),
            notes: self.get(record, "notes"),
            client_phone: self.get(record, "client_phone"),
            client_email: self.get(record, "client_email"),
            client_type: self.get(record, "client_type"),
        }
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, String> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("invalid {} '{}'", field, value))
}

/// `;` when the header uses it and no `,`, else `,`
fn sniff_delimiter(contents: &str) -> u8 {
    let header = contents.lines().next().unwrap_or_default();
    if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

/// Extensions read as spreadsheets; anything else is CSV
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WORKBOOK_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Text of a spreadsheet cell as it would appear in a CSV export
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Whole numbers are check numbers or round amounts: no trailing ".0"
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => s.split('T').next().unwrap_or_default().to_string(),
        other => other.to_string(),
    }
}

/// Service for check import
pub struct ImportService<'a> {
    storage: &'a Storage,
}

impl<'a> ImportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Import checks from a CSV or spreadsheet file, chosen by extension
    pub fn import_file(&self, path: &Path, created_by: Option<UserId>) -> CheckdeskResult<ImportResult> {
        let result = if is_workbook(path) {
            self.import_workbook(path, created_by)?
        } else {
            let file = std::fs::File::open(path).map_err(|e| {
                CheckdeskError::Import(format!("Cannot open {}: {}", path.display(), e))
            })?;
            self.import_reader(file, created_by)?
        };
        info!(
            "event=import status=ok file={} imported={} skipped={} errors={}",
            path.display(),
            result.imported,
            result.skipped,
            result.errors.len()
        );
        Ok(result)
    }

    /// Import checks from any CSV source
    pub fn import_reader<R: Read>(
        &self,
        mut source: R,
        created_by: Option<UserId>,
    ) -> CheckdeskResult<ImportResult> {
        let mut contents = String::new();
        source
            .read_to_string(&mut contents)
            .map_err(|e| CheckdeskError::Import(format!("Cannot read CSV: {}", e)))?;

        let mut reader = ReaderBuilder::new()
            .delimiter(sniff_delimiter(&contents))
            .flexible(true)
            .from_reader(contents.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| CheckdeskError::Import(format!("Cannot read CSV header: {}", e)))?
            .clone();

        let records = reader
            .records()
            .map(|record| record.map_err(|e| format!("unreadable row: {}", e)));
        self.import_records(&headers, records, created_by)
    }

    /// Import checks from the first worksheet of a workbook
    pub fn import_workbook(
        &self,
        path: &Path,
        created_by: Option<UserId>,
    ) -> CheckdeskResult<ImportResult> {
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            CheckdeskError::Import(format!("Cannot open {}: {}", path.display(), e))
        })?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| {
                CheckdeskError::Import(format!("{} has no worksheet", path.display()))
            })?
            .map_err(|e| CheckdeskError::Import(format!("Cannot read worksheet: {}", e)))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<String>>())
            .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
            .map(StringRecord::from);
        let headers = rows
            .next()
            .ok_or_else(|| CheckdeskError::Import(format!("{} is empty", path.display())))?;

        self.import_records(&headers, rows.map(Ok), created_by)
    }

    fn import_records(
        &self,
        headers: &StringRecord,
        records: impl Iterator<Item = Result<StringRecord, String>>,
        created_by: Option<UserId>,
    ) -> CheckdeskResult<ImportResult> {
        let columns = Columns::from_headers(headers)?;

        let mut result = ImportResult::default();
        for (idx, record) in records.enumerate() {
            // Header is line 1
            let line = idx + 2;
            result.total_rows += 1;

            let outcome =
                record.and_then(|record| self.import_row(columns.row(&record), created_by));
            match outcome {
                Ok(true) => result.imported += 1,
                Ok(false) => result.skipped += 1,
                Err(message) => {
                    warn!("event=import_row status=error line={} reason={}", line, message);
                    result.errors.push(format!("Line {}: {}", line, message));
                }
            }
        }

        Ok(result)
    }

    /// Record one row; `Ok(false)` when it duplicates an existing check
    fn import_row(&self, row: ImportRow, created_by: Option<UserId>) -> Result<bool, String> {
        if row.number.is_empty() {
            return Err("cheque_number is required".into());
        }
        if row.client_name.is_empty() {
            return Err("client_name is required".into());
        }
        let amount = Money::parse(&row.amount).map_err(|e| e.to_string())?;
        let due_date = parse_date("due_date", &row.due_date)?;
        let issue_date = if row.issue_date.is_empty() {
            due_date
        } else {
            parse_date("issue_date", &row.issue_date)?
        };
        let kind = if row.client_type.is_empty() {
            None
        } else {
            Some(
                ClientKind::parse(&row.client_type)
                    .ok_or_else(|| format!("unknown client_type '{}'", row.client_type))?,
            )
        };

        let (bank_id, branch_id) = self.resolve_bank(&row).map_err(|e| e.to_string())?;

        let checks = CheckService::new(self.storage);
        if checks.is_duplicate(&row.number, bank_id).map_err(|e| e.to_string())? {
            return Ok(false);
        }

        let mut draft =
            NewCheck::new(row.number, amount, issue_date, due_date, ClientId::new(), bank_id);
        draft.branch_id = branch_id;
        draft.depositor_name = row.depositor_name;
        draft.notes = row.notes;
        if !row.currency.is_empty() {
            draft.currency = row.currency.to_uppercase();
        }
        // A rejected row must not leave a new client behind
        draft.preview().validate().map_err(|e| e.to_string())?;

        let client = ClientService::new(self.storage)
            .find_or_create(
                &row.client_name,
                ClientFields {
                    kind,
                    phone: Some(row.client_phone).filter(|s| !s.is_empty()),
                    email: Some(row.client_email).filter(|s| !s.is_empty()),
                    ..ClientFields::default()
                },
            )
            .map_err(|e| e.to_string())?;
        draft.client_id = client.id;

        checks.create(draft, created_by).map_err(|e| e.to_string())?;
        Ok(true)
    }

    /// Bank from the `bank` column, else from the branch it names
    fn resolve_bank(&self, row: &ImportRow) -> CheckdeskResult<(BankId, Option<BranchId>)> {
        let banks = BankService::new(self.storage);

        let bank: Option<Bank> = if row.bank.is_empty() {
            None
        } else {
            Some(
                self.storage
                    .banks()
                    .find_by_name_or_code(&row.bank)?
                    .ok_or_else(|| CheckdeskError::bank_not_found(row.bank.as_str()))?,
            )
        };

        let branch = if row.branch_name.is_empty() {
            None
        } else {
            banks.match_branch(&row.branch_name, bank.as_ref().map(|b| b.id))?
        };

        match (bank, branch) {
            (Some(bank), branch) => Ok((bank.id, branch.map(|b| b.id))),
            (None, Some(branch)) => Ok((branch.bank_id, Some(branch.id))),
            (None, None) => Err(CheckdeskError::Validation(
                "bank is required (name or code, or a known branch_name)".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::bank::BranchDetails;
    use crate::storage::CheckFilter;

    fn setup() -> (Storage, Bank) {
        let storage = Storage::open_in_memory().unwrap();
        let bank = BankService::new(&storage)
            .create("Banque Populaire", Some("BP"))
            .unwrap();
        BankService::new(&storage)
            .add_branch(bank.id, "Casablanca Maarif", BranchDetails::default())
            .unwrap();
        (storage, bank)
    }

    #[test]
    fn test_import_creates_clients_and_checks() {
        let (storage, bank) = setup();
        let csv = "cheque_number,amount,due_date,client_name,bank,branch_name,client_type\n\
                   1001,\"1 500,00\",2024-04-01,Atlas SARL,BP,maarif,company\n\
                   1002,250.75,15/04/2024,Atlas SARL,Banque Populaire,,\n";

        let result = ImportService::new(&storage)
            .import_reader(csv.as_bytes(), None)
            .unwrap();
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.imported, 2);
        assert!(result.is_clean(), "{:?}", result.errors);

        let clients = storage.clients().list(None, true).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].kind, ClientKind::Company);

        let checks = storage.checks().list(&CheckFilter::default()).unwrap();
        assert_eq!(checks.len(), 2);
        let first = checks.iter().find(|d| d.check.number == "1001").unwrap();
        assert_eq!(first.check.amount, Money::from_units(1_500, 0));
        assert_eq!(first.check.bank_id, bank.id);
        assert!(first.check.branch_id.is_some());
        // issue_date falls back to due_date
        assert_eq!(first.check.issue_date, first.check.due_date);
    }

    #[test]
    fn test_import_reports_bad_rows_and_skips_duplicates() {
        let (storage, _) = setup();
        let csv = "number;amount;due_date;client_name;bank\n\
                   2001;100;2024-04-01;Karim;BP\n\
                   2001;100;2024-04-01;Karim;BP\n\
                   2002;abc;2024-04-01;Karim;BP\n\
                   2003;100;someday;Karim;BP\n\
                   2004;100;2024-04-01;Karim;Unknown Bank\n";

        let result = ImportService::new(&storage)
            .import_reader(csv.as_bytes(), None)
            .unwrap();
        assert_eq!(result.total_rows, 5);
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors[0].starts_with("Line 4:"));
        assert!(result.errors[1].contains("due_date"));
        assert!(result.errors[2].starts_with("Line 6:"));
    }

    #[test]
    fn test_import_bank_from_branch() {
        let (storage, bank) = setup();
        let csv = "cheque_number,amount,due_date,client_name,branch_name\n\
                   3001,100,2024-04-01,Salma,Maarif\n";
        let result = ImportService::new(&storage)
            .import_reader(csv.as_bytes(), None)
            .unwrap();
        assert_eq!(result.imported, 1);
        let check = storage.checks().find_by_number("3001").unwrap().pop().unwrap();
        assert_eq!(check.bank_id, bank.id);
    }

    #[test]
    fn test_rejected_row_creates_no_client() {
        let (storage, _) = setup();
        let csv = "cheque_number,amount,due_date,issue_date,client_name,bank\n\
                   5001,100,2024-01-01,2024-02-01,Nouveau Client,BP\n\
                   5002,0,2024-04-01,,Autre Client,BP\n\
                   5003,\"1.234,50\",2024-04-01,,Karim,BP\n\
                   5004,12.345,2024-04-01,,Salma,BP\n";

        let result = ImportService::new(&storage)
            .import_reader(csv.as_bytes(), None)
            .unwrap();
        assert_eq!(result.imported, 1);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors[0].contains("cannot be before issue date"));
        assert!(result.errors[2].contains("12.345"));

        let clients = storage.clients().list(None, true).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "Karim");
        let check = storage.checks().find_by_number("5003").unwrap().pop().unwrap();
        assert_eq!(check.amount, Money::from_minor(123_450));
    }

    #[test]
    fn test_ambiguous_branch_is_reported() {
        let (storage, bank) = setup();
        BankService::new(&storage)
            .add_branch(bank.id, "Casablanca Anfa", BranchDetails::default())
            .unwrap();
        let csv = "cheque_number,amount,due_date,client_name,branch_name\n\
                   6001,100,2024-04-01,Salma,Casablanca\n\
                   6002,100,2024-04-01,Salma,casablanca anfa\n";

        let result = ImportService::new(&storage)
            .import_reader(csv.as_bytes(), None)
            .unwrap();
        assert_eq!(result.imported, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Line 2:"));
        assert!(result.errors[0].contains("ambiguous"));
        let check = storage.checks().find_by_number("6002").unwrap().pop().unwrap();
        assert!(check.branch_id.is_some());
    }

    #[test]
    fn test_import_xlsx_workbook() {
        let (storage, bank) = setup();
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("cheques.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        let headers = ["cheque_number", "amount", "due_date", "client_name", "bank"];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_number(1, 0, 7001.0).unwrap();
        sheet.write_number(1, 1, 1500.5).unwrap();
        sheet.write_string(1, 2, "01/04/2024").unwrap();
        sheet.write_string(1, 3, "Atlas SARL").unwrap();
        sheet.write_string(1, 4, "BP").unwrap();
        sheet.write_string(2, 0, "7002").unwrap();
        sheet.write_string(2, 1, "abc").unwrap();
        sheet.write_string(2, 2, "2024-04-02").unwrap();
        sheet.write_string(2, 3, "Atlas SARL").unwrap();
        sheet.write_string(2, 4, "BP").unwrap();
        workbook.save(&path).unwrap();

        let result = ImportService::new(&storage).import_file(&path, None).unwrap();
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.imported, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Line 3:"));

        let check = storage.checks().find_by_number("7001").unwrap().pop().unwrap();
        assert_eq!(check.amount, Money::from_minor(150_050));
        assert_eq!(check.bank_id, bank.id);
        assert_eq!(check.due_date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn test_workbook_detection() {
        assert!(is_workbook(Path::new("cheques.XLSX")));
        assert!(is_workbook(Path::new("/tmp/old.xls")));
        assert!(!is_workbook(Path::new("cheques.csv")));
        assert!(!is_workbook(Path::new("cheques")));
    }

    #[test]
    fn test_missing_columns() {
        let (storage, _) = setup();
        let err = ImportService::new(&storage)
            .import_reader("cheque_number,amount\n1,2\n".as_bytes(), None)
            .unwrap_err();
        assert!(err.to_string().contains("due_date"));
    }
}
