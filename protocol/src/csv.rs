//! Delimited-text codec for sheet rows and the fallback export.
//!
//! Standard CSV quoting: a value containing a comma, quote, or newline is
//! wrapped in quotes with internal quotes doubled. The parser accepts what
//! the encoder produces, including newlines inside quoted fields.

use crate::fields::EXPORT_FIELDS;
use crate::fields::SurveyField;
use crate::record::SurveyRecord;

/// Quote a single field when it needs quoting, else pass it through.
pub fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        let doubled = value.replace('"', "\"\"");
        format!("\"{doubled}\"")
    } else {
        value.to_string()
    }
}

/// Encode one row, without a trailing newline.
pub fn encode_row<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .map(escape_field)
        .collect::<Vec<String>>()
        .join(",")
}

/// Header row for the sheet store: every canonical column.
pub fn store_header() -> String {
    encode_row(SurveyField::ALL.into_iter().map(SurveyField::column_title))
}

/// One sheet row for `record`, in canonical column order.
pub fn store_row(record: &SurveyRecord) -> String {
    encode_row(SurveyField::ALL.into_iter().map(|field| record.value(field)))
}

/// Header row for the fallback export: the 15 "collect all" columns.
pub fn export_header() -> String {
    encode_row(EXPORT_FIELDS.into_iter().map(SurveyField::column_title))
}

/// One export row for `record`.
pub fn export_row(record: &SurveyRecord) -> String {
    encode_row(EXPORT_FIELDS.into_iter().map(|field| record.value(field)))
}

/// Split a delimited-text document into rows of fields. Blank lines are
/// skipped; a CR directly before an LF is treated as part of the line break.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut row_has_content = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                row_has_content = true;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                row_has_content = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if row_has_content || !field.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                row_has_content = false;
            }
            _ => {
                field.push(c);
                row_has_content = true;
            }
        }
    }
    if row_has_content || !field.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
