//! CSV storage for pipeline tables
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so a failed stage never leaves a half-written
//! table behind.
//!
//! The transaction CSV format is:
//! OrderID,OrderDate,SupplierName,TotalSpend,TherapeuticCategory,OnTimeDelivery,LeadTime
//! 1,2022-03-17,Sandoz,1234.56,Oncology,1,30

use crate::{from_cents, DataError, Result, Transaction, MAX_SPEND};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Column order of the transaction table
pub const TRANSACTION_HEADER: [&str; 7] = [
    "OrderID",
    "OrderDate",
    "SupplierName",
    "TotalSpend",
    "TherapeuticCategory",
    "OnTimeDelivery",
    "LeadTime",
];

/// Run `write` against a temporary file, then move it over `path`
pub fn write_atomically<P, F>(path: P, write: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut File) -> Result<()>,
{
    let path = path.as_ref();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(directory)?;
    write(staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| DataError::Io(e.error))?;

    debug!(path = %path.display(), "persisted file");
    Ok(())
}

/// Write `records` as CSV with a header row derived from their field names
///
/// `header` is written explicitly so an empty table still carries its columns.
pub fn write_csv<P, T>(path: P, header: &[&str], records: &[T]) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    write_atomically(path, |file| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(header)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    })
}

/// Read every row of a headed CSV file
pub fn read_csv<P, T>(path: P) -> Result<Vec<T>>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Write the transaction table
pub fn write_transactions<P: AsRef<Path>>(path: P, transactions: &[Transaction]) -> Result<()> {
    validate_transactions(transactions)?;
    write_csv(path, &TRANSACTION_HEADER, transactions)
}

/// Read and validate a transaction table
pub fn read_transactions<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>> {
    let transactions: Vec<Transaction> = read_csv(path)?;
    validate_transactions(&transactions)?;
    Ok(transactions)
}

/// Check spend is a positive whole-cent amount, lead time is positive and
/// OrderIDs strictly increase
pub fn validate_transactions(transactions: &[Transaction]) -> Result<()> {
    for transaction in transactions {
        let spend = transaction.total_spend;
        if !spend.is_finite() || spend <= 0.0 || transaction.spend_cents() <= 0 {
            return Err(DataError::DataIntegrity(format!(
                "Order {} has non-positive spend {}",
                transaction.order_id, spend
            )));
        }
        if spend >= MAX_SPEND {
            return Err(DataError::DataIntegrity(format!(
                "Order {} spend {} exceeds {}",
                transaction.order_id, spend, MAX_SPEND
            )));
        }
        if from_cents(transaction.spend_cents()) != spend {
            return Err(DataError::DataIntegrity(format!(
                "Order {} spend {} has sub-cent precision",
                transaction.order_id, spend
            )));
        }
        if transaction.lead_time == 0 {
            return Err(DataError::DataIntegrity(format!(
                "Order {} has a zero-day lead time",
                transaction.order_id
            )));
        }
    }

    if let Some(pair) = transactions
        .windows(2)
        .find(|pair| pair[1].order_id <= pair[0].order_id)
    {
        return Err(DataError::DataIntegrity(format!(
            "OrderID {} follows {}; ids must be unique and increasing",
            pair[1].order_id, pair[0].order_id
        )));
    }
    Ok(())
}
