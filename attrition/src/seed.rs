//! Employee dataset import.
//!
//! The training dataset ships with PascalCase headers (`MonthlyIncome`, `Over18`); exports
//! of this service use the snake_case column names. Both are accepted.

use crate::api::models::employees::{EmployeeCreate, TEXT_ATTRIBUTES};
use crate::db::models::employees::EmployeeCreateDBRequest;
use anyhow::{Context, bail};
use serde_json::{Map, Value};

/// `MonthlyIncome` -> `monthly_income`, `Over18` -> `over_18`. snake_case input is unchanged.
pub fn to_snake_case(header: &str) -> String {
    let mut out = String::with_capacity(header.len() + 4);
    let mut prev: Option<char> = None;
    for c in header.trim().chars() {
        let boundary = match prev {
            Some(p) => (c.is_ascii_uppercase() && p != '_') || (c.is_ascii_digit() && p.is_ascii_alphabetic()),
            None => false,
        };
        if boundary {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
        prev = Some(c);
    }
    out
}

/// Cell to JSON according to the column's stored type. Empty and `NA` cells are dropped.
fn cell_value(column: &str, cell: &str) -> anyhow::Result<Option<Value>> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "NA" {
        return Ok(None);
    }

    if TEXT_ATTRIBUTES.contains(&column) {
        return Ok(Some(Value::from(cell)));
    }
    if column == "monthly_income" {
        let value: f64 = cell.parse().with_context(|| format!("'{column}' is not a number: '{cell}'"))?;
        return Ok(Some(Value::from(value)));
    }
    let value: i64 = cell.parse().with_context(|| format!("'{column}' is not an integer: '{cell}'"))?;
    Ok(Some(Value::from(value)))
}

/// Parse an employee CSV into insertable records. Any malformed row fails the whole file.
pub fn parse_employees_csv(data: &[u8]) -> anyhow::Result<Vec<EmployeeCreateDBRequest>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(data);
    let headers: Vec<String> = reader.headers()?.iter().map(to_snake_case).collect();
    if !headers.iter().any(|h| h == "age") {
        bail!("employee CSV has no Age column");
    }

    let mut employees = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = record.with_context(|| format!("invalid CSV at line {line}"))?;

        let mut fields = Map::new();
        for (column, cell) in headers.iter().zip(record.iter()) {
            if let Some(value) = cell_value(column, cell).with_context(|| format!("line {line}"))? {
                fields.insert(column.clone(), value);
            }
        }

        let employee: EmployeeCreate =
            serde_json::from_value(Value::Object(fields)).with_context(|| format!("invalid employee at line {line}"))?;
        employees.push(employee.into());
    }

    Ok(employees)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_conversion() {
        assert_eq!(to_snake_case("Age"), "age");
        assert_eq!(to_snake_case("MonthlyIncome"), "monthly_income");
        assert_eq!(to_snake_case("YearsWithCurrManager"), "years_with_curr_manager");
        assert_eq!(to_snake_case("Over18"), "over_18");
        assert_eq!(to_snake_case("over_18"), "over_18");
        assert_eq!(to_snake_case("job_role"), "job_role");
    }

    #[test]
    fn test_parse_dataset_rows() {
        let csv = "Age,Attrition,Department,MonthlyIncome,Over18,EmployeeNumber,JobRole\n\
                   41,Yes,Sales,5993,Y,1,Sales Executive\n\
                   49,No,Research & Development,5130,Y,2,\n";

        let employees = parse_employees_csv(csv.as_bytes()).unwrap();
        assert_eq!(employees.len(), 2);

        let first = &employees[0];
        assert_eq!(first.age, 41);
        assert_eq!(first.attributes.attrition.as_deref(), Some("Yes"));
        assert_eq!(first.attributes.monthly_income, Some(5993.0));
        assert_eq!(first.attributes.over_18.as_deref(), Some("Y"));
        assert_eq!(first.attributes.employee_number, Some(1));
        assert!(employees[1].attributes.job_role.is_none());
    }

    #[test]
    fn test_malformed_rows_fail_the_file() {
        let err = parse_employees_csv(b"Age,DailyRate\n41,lots\n").unwrap_err();
        assert!(format!("{err:#}").contains("daily_rate"));

        assert!(parse_employees_csv(b"Department\nSales\n").is_err());
        assert!(parse_employees_csv(b"Age,Department\n,Sales\n").is_err());
    }
}
