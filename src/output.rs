use crate::error::OutputError;
use crate::reports::{self, DashboardResults};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<(), OutputError> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<(), OutputError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_table(rows, max_rows));
}

/// Export every display table as `;`-separated CSV plus the raw results as
/// `summary.json`. Returns the files written.
pub fn write_dashboard(dir: &Path, results: &DashboardResults, currency: &str) -> Result<Vec<PathBuf>, OutputError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    export_csv(dir, "top_fornecedores_valor.csv", &reports::value_rows(&results.top_by_value, currency), &mut written)?;
    export_csv(dir, "top_fornecedores_contratos.csv", &reports::count_rows(&results.top_by_count, currency), &mut written)?;
    export_csv(dir, "detalhe_fornecedores.csv", &reports::detail_rows(&results.top_details, currency), &mut written)?;
    export_csv(dir, "participacao_mercado.csv", &reports::market_share_rows(&results.market_share, currency), &mut written)?;
    export_csv(dir, "dispersao_fornecedores.csv", &reports::scatter_rows(&results.scatter, currency), &mut written)?;
    export_csv(dir, "serie_anual.csv", &reports::year_rows(&results.time_series, currency), &mut written)?;

    let summary = dir.join("summary.json");
    write_json(&summary, results)?;
    written.push(summary);

    info!("wrote {} files to {}", written.len(), dir.display());
    Ok(written)
}

fn export_csv<T: Serialize>(dir: &Path, name: &str, rows: &[T], written: &mut Vec<PathBuf>) -> Result<(), OutputError> {
    let path = dir.join(name);
    write_csv(&path, rows)?;
    written.push(path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::YearRow;

    #[test]
    fn empty_tables_render_placeholder() {
        let rows: Vec<YearRow> = Vec::new();
        assert_eq!(render_table(&rows, 5), "(no rows)");
    }

    #[test]
    fn table_is_truncated_to_max_rows() {
        let rows: Vec<YearRow> = (2020..2025)
            .map(|year| YearRow {
                year,
                total_value: "R$ 1,00".into(),
                contract_count: 1,
            })
            .collect();
        let out = render_table(&rows, 2);
        assert!(out.contains("2020"));
        assert!(out.contains("2021"));
        assert!(!out.contains("2022"));
        assert!(out.contains("Ano"));
    }
}
