use crate::error::LoadError;
use crate::types::{ContractRecord, RawRow};
use crate::util::{clean_text, parse_date_dayfirst, parse_decimal_comma};
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// Columns the normalizer knows about. Any of them may be absent.
pub const KNOWN_COLUMNS: &[&str] = &[
    "fornecedor",
    "objeto",
    "moeda",
    "valor_contrato",
    "situacao",
    "modalidade",
    "unidade_adm",
    "sq_contrato",
    "inicio_vigencia",
    "fim_vigencia",
    "data_log_inclusao",
    "data_log_alteracao",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub missing_columns: BTreeSet<String>,
    pub empty_values: usize,
    pub undated_rows: usize,
}

/// Raw rows plus the header names that were actually present.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn missing_columns(&self) -> BTreeSet<String> {
        KNOWN_COLUMNS
            .iter()
            .filter(|c| !self.headers.iter().any(|h| h == *c))
            .map(|c| c.to_string())
            .collect()
    }
}

/// Read the `;`-separated source. A malformed CSV line fails the read.
pub fn read_rows<R: Read>(reader: R) -> Result<RawTable, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);
    let headers = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect::<Vec<_>>();
    // Re-install the cleaned headers so serde sees names without a BOM.
    rdr.set_headers(csv::StringRecord::from(headers.clone()));

    let mut rows = Vec::new();
    for result in rdr.deserialize::<RawRow>() {
        rows.push(result?);
    }
    debug!("read {} raw rows with {} columns", rows.len(), headers.len());
    Ok(RawTable { headers, rows })
}

pub fn load_rows<P: AsRef<Path>>(path: P) -> Result<RawTable, LoadError> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}

/// Turn raw rows into contract records, keeping input order.
///
/// A `valor_contrato` that is not a number fails the whole batch. Absent text
/// columns become `""`, absent values `0`, absent or unreadable dates `None`.
pub fn normalize(rows: &[RawRow]) -> Result<Vec<ContractRecord>, LoadError> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| normalize_row(idx + 1, row))
        .collect()
}

fn normalize_row(row_no: usize, row: &RawRow) -> Result<ContractRecord, LoadError> {
    let raw_value = row.valor_contrato.as_deref();
    let contract_value =
        parse_decimal_comma(raw_value).ok_or_else(|| LoadError::InvalidNumber {
            row: row_no,
            value: raw_value.unwrap_or_default().to_string(),
        })?;

    Ok(ContractRecord {
        supplier: clean_text(row.fornecedor.clone()),
        object_description: clean_text(row.objeto.clone()),
        currency: clean_text(row.moeda.clone()),
        contract_value,
        status: clean_text(row.situacao.clone()),
        modality: clean_text(row.modalidade.clone()),
        administrative_unit: clean_text(row.unidade_adm.clone()),
        contract_id: clean_text(row.sq_contrato.clone()),
        start_date: parse_date_dayfirst(row.inicio_vigencia.as_deref()),
        end_date: parse_date_dayfirst(row.fim_vigencia.as_deref()),
        log_created_at: parse_date_dayfirst(row.data_log_inclusao.as_deref()),
        log_updated_at: parse_date_dayfirst(row.data_log_alteracao.as_deref()),
    })
}

/// Read and normalize in one go, with diagnostics about what was defaulted.
pub fn load_and_clean<R: Read>(reader: R) -> Result<(Vec<ContractRecord>, LoadReport), LoadError> {
    let table = read_rows(reader)?;
    let missing_columns = table.missing_columns();
    for col in &missing_columns {
        warn!("column {col:?} not found, defaulting every row");
    }
    let records = normalize(&table.rows)?;

    let empty_values = table
        .rows
        .iter()
        .filter(|r| r.valor_contrato.as_deref().map_or(true, |v| v.trim().is_empty()))
        .count();
    let undated_rows = records.iter().filter(|r| r.end_date.is_none()).count();
    let report = LoadReport {
        total_rows: records.len(),
        missing_columns,
        empty_values,
        undated_rows,
    };
    info!(
        "loaded {} contracts ({} without value, {} without end date)",
        report.total_rows, report.empty_values, report.undated_rows
    );
    Ok((records, report))
}

pub fn load_contracts<P: AsRef<Path>>(path: P) -> Result<(Vec<ContractRecord>, LoadReport), LoadError> {
    let file = std::fs::File::open(path)?;
    load_and_clean(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
fornecedor;objeto;moeda;valor_contrato;situacao;modalidade;unidade_adm;sq_contrato;inicio_vigencia;fim_vigencia;data_log_inclusao;data_log_alteracao
 ACME LTDA ;Manutenção de dutos;R$;1.234,56;Ativo;Pregão;UN-BS;101;05/01/2022;04/01/2024;05/01/2022 10:00:00;
Beta SA;Serviços de sondagem;US$;1000;Encerrado;Dispensa;UN-RIO;102;;31/12/2021;;
";

    #[test]
    fn normalizes_sample_rows_in_order() {
        let (records, report) = load_and_clean(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.total_rows, 2);
        assert!(report.missing_columns.is_empty());

        let first = &records[0];
        assert_eq!(first.supplier, "ACME LTDA");
        assert_eq!(first.contract_value, 1234.56);
        assert_eq!(first.currency, "R$");
        assert_eq!(first.start_date, NaiveDate::from_ymd_opt(2022, 1, 5));
        assert_eq!(first.end_date, NaiveDate::from_ymd_opt(2024, 1, 4));
        assert_eq!(first.log_created_at, NaiveDate::from_ymd_opt(2022, 1, 5));
        assert_eq!(first.log_updated_at, None);

        let second = &records[1];
        assert_eq!(second.supplier, "Beta SA");
        assert_eq!(second.contract_value, 1000.0);
        assert_eq!(second.start_date, None);
        assert_eq!(second.contract_id, "102");
    }

    #[test]
    fn missing_columns_are_defaulted() {
        let csv = "fornecedor;moeda\nACME;R$\n";
        let (records, report) = load_and_clean(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.supplier, "ACME");
        assert_eq!(r.contract_value, 0.0);
        assert_eq!(r.status, "");
        assert_eq!(r.object_description, "");
        assert_eq!(r.contract_id, "");
        assert!(report.missing_columns.contains("valor_contrato"));
        assert!(report.missing_columns.contains("situacao"));
        assert!(!report.missing_columns.contains("moeda"));
        assert_eq!(report.empty_values, 1);
    }

    #[test]
    fn unparseable_value_fails_the_load() {
        let csv = "fornecedor;valor_contrato\nA;10,00\nB;dez reais\n";
        let err = load_and_clean(csv.as_bytes()).unwrap_err();
        match err {
            LoadError::InvalidNumber { row, value } => {
                assert_eq!(row, 2);
                assert_eq!(value, "dez reais");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let csv = "\u{feff}fornecedor;valor_contrato\nA;5\n";
        let (records, report) = load_and_clean(csv.as_bytes()).unwrap();
        assert_eq!(records[0].supplier, "A");
        assert_eq!(records[0].contract_value, 5.0);
        assert!(!report.missing_columns.contains("fornecedor"));
    }
}
