//! CSV dump of the coupon table

use crate::{CouponRecord, Result};

/// File name offered for the download
pub const EXPORT_FILE_NAME: &str = "coupons.csv";

pub const EXPORT_CONTENT_TYPE: &str = "text/csv";

/// Serialize records with a header row, one line per coupon
pub fn to_csv(records: &[CouponRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    for record in records {
        writer.serialize(record)?;
    }

    // An empty export still carries the header
    if records.is_empty() {
        writer.write_record(["name", "phone", "email", "ticket_number", "unique_id", "discount"])?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::CouponError::Io(e.into_error()))
}

/// Parse an export produced by `to_csv`
pub fn from_csv(data: &[u8]) -> Result<Vec<CouponRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Discount;

    fn sample() -> Vec<CouponRecord> {
        vec![
            CouponRecord {
                name: "Ali".to_string(),
                phone: "+96890000000".to_string(),
                email: "ali@x.com".to_string(),
                ticket_number: 482913,
                unique_id: "aB3dE5fG7hI9jK1lM3nO".to_string(),
                discount: Discount::Ten,
            },
            CouponRecord {
                name: "Salim, \"Jr\"".to_string(),
                phone: "95 555 111".to_string(),
                email: "salim@example.com".to_string(),
                ticket_number: 100000,
                unique_id: "ZZZZZZZZZZ0000000000".to_string(),
                discount: Discount::Twenty,
            },
        ]
    }

    #[test]
    fn test_header_and_integer_discount() {
        let bytes = to_csv(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("name,phone,email,ticket_number,unique_id,discount")
        );
        assert_eq!(
            lines.next(),
            Some("Ali,+96890000000,ali@x.com,482913,aB3dE5fG7hI9jK1lM3nO,10")
        );
    }

    #[test]
    fn test_quoted_fields_survive_parse() {
        let records = sample();
        let parsed = from_csv(&to_csv(&records).unwrap()).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_empty_export_has_only_header() {
        let text = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(text, "name,phone,email,ticket_number,unique_id,discount\n");
        assert!(from_csv(text.as_bytes()).unwrap().is_empty());
    }
}
