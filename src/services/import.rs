//! CSV import service
//!
//! Reads expenses from a CSV file whose header names the columns. Rows with
//! a missing or malformed amount are reported and skipped; dates are stored
//! as written, so reports count the unparseable ones as skipped.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::warn;

use crate::error::{TallyError, TallyResult};
use crate::models::{is_reserved_category, MemberId, Money, RecurringInterval, Transaction};
use crate::services::expense::{CreateExpenseInput, ExpenseService};
use crate::storage::Storage;

/// Column positions found in a CSV header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub date_column: usize,
    pub amount_column: usize,
    pub category_column: Option<usize>,
    pub description_column: Option<usize>,
    pub owner_column: Option<usize>,
    pub recurring_column: Option<usize>,
}

impl ColumnMapping {
    /// Map columns by header name (case-insensitive)
    ///
    /// # Errors
    ///
    /// `Import` when no date or amount column can be found.
    pub fn from_headers(headers: &StringRecord) -> TallyResult<Self> {
        let mut date = None;
        let mut amount = None;
        let mut mapping = Self {
            date_column: 0,
            amount_column: 0,
            category_column: None,
            description_column: None,
            owner_column: None,
            recurring_column: None,
        };

        for (idx, header) in headers.iter().enumerate() {
            let h = header.trim().to_lowercase();
            match h.as_str() {
                "date" | "ds" | "day" => date = date.or(Some(idx)),
                "amount" | "cost" | "price" => amount = amount.or(Some(idx)),
                "category" => mapping.category_column = Some(idx),
                "description" | "memo" | "note" => mapping.description_column = Some(idx),
                "owner" | "member" | "user" | "username" => mapping.owner_column = Some(idx),
                "recurring" | "recurring_interval" => mapping.recurring_column = Some(idx),
                _ => {}
            }
        }

        mapping.date_column =
            date.ok_or_else(|| TallyError::Import("CSV header has no date column".into()))?;
        mapping.amount_column =
            amount.ok_or_else(|| TallyError::Import("CSV header has no amount column".into()))?;
        Ok(mapping)
    }
}

/// Outcome of importing one file
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: Vec<Transaction>,
    /// Error message by data row number (1-based, header excluded)
    pub errors: BTreeMap<usize, String>,
}

impl ImportResult {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }
}

/// Service for CSV import
pub struct ImportService<'a> {
    storage: &'a Storage,
}

impl<'a> ImportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Parse CSV content into expense inputs, one result per data row
    pub fn parse<R: Read>(
        &self,
        reader: R,
        default_owner: &MemberId,
    ) -> TallyResult<Vec<Result<CreateExpenseInput, String>>> {
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mapping = ColumnMapping::from_headers(reader.headers()?)?;

        Ok(reader
            .records()
            .map(|record| match record {
                Ok(record) => parse_record(&record, &mapping, default_owner),
                Err(e) => Err(format!("unreadable row: {}", e)),
            })
            .collect())
    }

    /// Import all valid rows of a CSV file
    pub fn import_file(&self, path: &Path, default_owner: &MemberId) -> TallyResult<ImportResult> {
        let file = File::open(path)
            .map_err(|e| TallyError::Import(format!("Cannot open {}: {}", path.display(), e)))?;
        self.import_from_reader(file, default_owner)
    }

    pub fn import_from_reader<R: Read>(
        &self,
        reader: R,
        default_owner: &MemberId,
    ) -> TallyResult<ImportResult> {
        let mut result = ImportResult::default();
        let mut inputs = Vec::new();

        for (idx, row) in self.parse(reader, default_owner)?.into_iter().enumerate() {
            match row {
                Ok(input) => inputs.push(input),
                Err(message) => {
                    warn!(row = idx + 1, %message, "skipping CSV row");
                    result.errors.insert(idx + 1, message);
                }
            }
        }

        result.imported = ExpenseService::new(self.storage).create_many(inputs)?;
        Ok(result)
    }
}

fn parse_record(
    record: &StringRecord,
    mapping: &ColumnMapping,
    default_owner: &MemberId,
) -> Result<CreateExpenseInput, String> {
    let field = |col: Option<usize>| {
        col.and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let raw_amount = field(Some(mapping.amount_column)).ok_or("missing amount")?;
    let amount = Money::parse(&raw_amount).map_err(|e| e.to_string())?;
    if amount.is_negative() {
        return Err(format!("negative amount: {}", raw_amount));
    }

    let category = field(mapping.category_column);
    if let Some(category) = category.as_deref().filter(|c| is_reserved_category(c)) {
        return Err(format!("reserved category: {}", category));
    }

    let recurring = match field(mapping.recurring_column) {
        Some(text) if matches!(text.to_lowercase().as_str(), "false" | "no" | "0") => None,
        Some(text) => Some(
            RecurringInterval::parse(&text)
                .ok_or_else(|| format!("unknown recurring interval: {}", text))?,
        ),
        None => None,
    };

    Ok(CreateExpenseInput {
        date: field(Some(mapping.date_column)),
        category,
        description: field(mapping.description_column),
        recurring,
        owner: field(mapping.owner_column)
            .map(MemberId::new)
            .unwrap_or_else(|| default_owner.clone()),
        ..CreateExpenseInput::new(amount, default_owner.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_header_mapping() {
        let headers = StringRecord::from(vec!["Description", "Amount", "Date", "Category"]);
        let mapping = ColumnMapping::from_headers(&headers).unwrap();
        assert_eq!(mapping.date_column, 2);
        assert_eq!(mapping.amount_column, 1);
        assert_eq!(mapping.category_column, Some(3));
        assert_eq!(mapping.owner_column, None);

        let headers = StringRecord::from(vec!["when", "amount"]);
        assert!(matches!(
            ColumnMapping::from_headers(&headers),
            Err(TallyError::Import(_))
        ));
    }

    #[test]
    fn test_import_reports_bad_rows() {
        let (_temp, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let csv = "\
date,amount,category,description,owner
2025-01-03,12.50,Food,Lunch,
2025-01-04,abc,Food,Broken,
not a date,4.00,Travel,Bus,bob
2025-01-05,-3,Food,Refund,
2025-01-06,$7,,Coffee,
";

        let result = service
            .import_from_reader(csv.as_bytes(), &"alice".into())
            .unwrap();

        assert_eq!(result.imported_count(), 3);
        assert_eq!(result.errors.keys().copied().collect::<Vec<_>>(), vec![2, 4]);

        let owners: Vec<&str> = result.imported.iter().map(|t| t.owner.as_str()).collect();
        assert_eq!(owners, vec!["alice", "bob", "alice"]);
        assert_eq!(result.imported[1].date, "not a date");
        assert_eq!(result.imported[2].amount, Money::from_cents(700));
        assert_eq!(storage.expenses.count().unwrap(), 3);
    }

    #[test]
    fn test_recurring_column() {
        let (_temp, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let csv = "date,amount,recurring\n2025-01-01,9.99,monthly\n2025-01-02,1,no\n2025-01-03,1,daily\n";

        let rows = service.parse(csv.as_bytes(), &"alice".into()).unwrap();
        assert_eq!(rows[0].as_ref().unwrap().recurring, Some(RecurringInterval::Monthly));
        assert_eq!(rows[1].as_ref().unwrap().recurring, None);
        assert!(rows[2].is_err());
    }

    #[test]
    fn test_out_of_range_and_reserved_rows_are_skipped() {
        let (_temp, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let csv = "\
date,amount,category
2025-01-03,79228162514264337593543950335,Food
2025-01-04,5.00,overall
2025-01-05,2.00,Food
";

        let result = service
            .import_from_reader(csv.as_bytes(), &"alice".into())
            .unwrap();

        assert_eq!(result.imported_count(), 1);
        assert_eq!(result.errors.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!(result.errors[&2].contains("reserved"));
    }
}
