//! Comma-separated table codec
//!
//! Fields may be double-quoted; inside quotes commas and newlines are
//! literal and `""` is an escaped quote. Blank lines are skipped and
//! fields are not trimmed.

use thiserror::Error;

use crate::table::{Table, TableError, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvError {
    #[error("missing header row")]
    MissingHeader,

    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },

    #[error("line {line}: {error}")]
    Shape {
        line: usize,
        #[source]
        error: TableError,
    },
}

/// Split `text` into records, each tagged with the line it starts on
fn records(text: &str) -> Result<Vec<(usize, Vec<String>)>, CsvError> {
    let mut out = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut dirty = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                dirty = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                dirty = true;
            }
            '\r' => {}
            '\n' => {
                if dirty {
                    record.push(std::mem::take(&mut field));
                    out.push((record_line, std::mem::take(&mut record)));
                }
                dirty = false;
                line += 1;
                record_line = line;
            }
            _ => {
                field.push(c);
                dirty = true;
            }
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: record_line });
    }
    if dirty {
        record.push(field);
        out.push((record_line, record));
    }

    Ok(out)
}

/// Parse a header row plus data rows into a typed table
pub fn parse_csv(text: &str) -> Result<Table, CsvError> {
    let mut records = records(text)?.into_iter();
    let (header_line, header) = records.next().ok_or(CsvError::MissingHeader)?;

    let mut table = Table::new(header).map_err(|error| CsvError::Shape {
        line: header_line,
        error,
    })?;

    for (line, fields) in records {
        let row = fields.iter().map(|f| Value::parse(f)).collect();
        table
            .push_row(row)
            .map_err(|error| CsvError::Shape { line, error })?;
    }

    Ok(table)
}

fn needs_quotes(field: &str) -> bool {
    field.contains([',', '"', '\n', '\r'])
        || field.starts_with(char::is_whitespace)
        || field.ends_with(char::is_whitespace)
}

fn push_field(out: &mut String, field: &str) {
    if needs_quotes(field) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

/// Render a table as CSV with a header row
pub fn write_csv(table: &Table) -> String {
    let mut out = String::new();
    push_record(&mut out, table.columns().iter().map(String::as_str));
    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(Value::to_string).collect();
        push_record(&mut out, cells.iter().map(String::as_str));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_table() {
        let table = parse_csv("Index,KernelName,BeginNs\n0,gemm,100\n1,reduce,250\n").unwrap();
        assert_eq!(table.columns(), ["Index", "KernelName", "BeginNs"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "KernelName"), Some(&Value::from("reduce")));
        assert_eq!(table.get(1, "BeginNs"), Some(&Value::Int(250)));
    }

    #[test]
    fn test_quoted_fields() {
        let text = "KernelName,grd\n\"void gemm<float, 4>(float*)\",\"say \"\"hi\"\"\"\n";
        let table = parse_csv(text).unwrap();
        assert_eq!(
            table.get(0, "KernelName"),
            Some(&Value::from("void gemm<float, 4>(float*)"))
        );
        assert_eq!(table.get(0, "grd"), Some(&Value::from("say \"hi\"")));
    }

    #[test]
    fn test_fields_are_not_trimmed() {
        let table = parse_csv("KernelName,x\n kernelA,1\n").unwrap();
        assert_eq!(table.get(0, "KernelName"), Some(&Value::from(" kernelA")));
    }

    #[test]
    fn test_crlf_blank_lines_and_empty_cells() {
        let table = parse_csv("a,b\r\n\r\n1,\r\n,2\r\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "b"), Some(&Value::Empty));
        assert_eq!(table.get(1, "a"), Some(&Value::Empty));
        assert_eq!(table.get(1, "b"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_embedded_newline_keeps_line_numbers() {
        let err = parse_csv("a,b\n\"x\ny\",1\n1,2,3\n").unwrap_err();
        assert_eq!(
            err,
            CsvError::Shape {
                line: 4,
                error: TableError::RowWidth { expected: 2, found: 3 }
            }
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_csv(""), Err(CsvError::MissingHeader));
        assert_eq!(
            parse_csv("a\n\"open\n"),
            Err(CsvError::UnterminatedQuote { line: 2 })
        );
    }

    #[test]
    fn test_counter_values_written_back_verbatim() {
        let text = "KernelName,TCC_HIT_sum,SQ_INSTS_VALU,ratio\n\
                    k,18446744073709551615,123456789012345678901234,0.12345678901234567890\n";
        let table = parse_csv(text).unwrap();
        assert_eq!(table.get(0, "TCC_HIT_sum"), Some(&Value::UInt(u64::MAX)));
        assert_eq!(write_csv(&table), text);
    }

    #[test]
    fn test_write_quotes_when_needed() {
        let mut table = Table::new(["KernelName", "BeginNs"]).unwrap();
        table
            .push_row(vec!["void k<int, 2>()".into(), Value::Int(10)])
            .unwrap();
        table.push_row(vec![" padded".into(), Value::Empty]).unwrap();

        let text = write_csv(&table);
        assert_eq!(
            text,
            "KernelName,BeginNs\n\"void k<int, 2>()\",10\n\" padded\",\n"
        );
        assert_eq!(parse_csv(&text).unwrap(), table);
    }
}
