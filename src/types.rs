use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One row of the `;`-separated source exactly as read. Every column is
/// optional: a header missing from the file deserializes to `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRow {
    pub fornecedor: Option<String>,
    pub objeto: Option<String>,
    pub moeda: Option<String>,
    pub valor_contrato: Option<String>,
    pub situacao: Option<String>,
    pub modalidade: Option<String>,
    pub unidade_adm: Option<String>,
    pub sq_contrato: Option<String>,
    pub inicio_vigencia: Option<String>,
    pub fim_vigencia: Option<String>,
    pub data_log_inclusao: Option<String>,
    pub data_log_alteracao: Option<String>,
}

/// A normalized contract. Text fields are trimmed and never missing; the
/// value is always a finite number.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ContractRecord {
    pub supplier: String,
    pub object_description: String,
    pub currency: String,
    pub contract_value: f64,
    pub status: String,
    pub modality: String,
    pub administrative_unit: String,
    pub contract_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub log_created_at: Option<NaiveDate>,
    pub log_updated_at: Option<NaiveDate>,
}

/// Which of a record's dates an operation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
    LogCreated,
    LogUpdated,
}

impl ContractRecord {
    pub fn date(&self, field: DateField) -> Option<NaiveDate> {
        match field {
            DateField::Start => self.start_date,
            DateField::End => self.end_date,
            DateField::LogCreated => self.log_created_at,
            DateField::LogUpdated => self.log_updated_at,
        }
    }
}

// Display rows. These hold already formatted strings and are what gets
// previewed on the console and exported to CSV.

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SupplierValueRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Fornecedor")]
    #[tabled(rename = "Fornecedor")]
    pub supplier: String,
    #[serde(rename = "ValorTotal")]
    #[tabled(rename = "ValorTotal")]
    pub total_value: String,
    #[serde(rename = "Participacao")]
    #[tabled(rename = "Participacao")]
    pub share: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SupplierCountRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Fornecedor")]
    #[tabled(rename = "Fornecedor")]
    pub supplier: String,
    #[serde(rename = "Contratos")]
    #[tabled(rename = "Contratos")]
    pub contract_count: String,
    #[serde(rename = "ValorTotal")]
    #[tabled(rename = "ValorTotal")]
    pub total_value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SupplierDetailRow {
    #[serde(rename = "Fornecedor")]
    #[tabled(rename = "Fornecedor")]
    pub supplier: String,
    #[serde(rename = "ValorTotal")]
    #[tabled(rename = "ValorTotal")]
    pub total_value: String,
    #[serde(rename = "Contratos")]
    #[tabled(rename = "Contratos")]
    pub contract_count: String,
    #[serde(rename = "TicketMedio")]
    #[tabled(rename = "TicketMedio")]
    pub average_ticket: String,
    #[serde(rename = "PrimeiroInicio")]
    #[tabled(rename = "PrimeiroInicio")]
    pub earliest_start: String,
    #[serde(rename = "UltimoFim")]
    #[tabled(rename = "UltimoFim")]
    pub latest_end: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MarketShareRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Fornecedor")]
    #[tabled(rename = "Fornecedor")]
    pub supplier: String,
    #[serde(rename = "ValorTotal")]
    #[tabled(rename = "ValorTotal")]
    pub total_value: String,
    #[serde(rename = "Participacao")]
    #[tabled(rename = "Participacao")]
    pub share: String,
    #[serde(rename = "ParticipacaoAcumulada")]
    #[tabled(rename = "ParticipacaoAcumulada")]
    pub cumulative_share: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ScatterRow {
    #[serde(rename = "Fornecedor")]
    #[tabled(rename = "Fornecedor")]
    pub supplier: String,
    #[serde(rename = "Contratos")]
    #[tabled(rename = "Contratos")]
    pub contract_count: usize,
    #[serde(rename = "ValorTotal")]
    #[tabled(rename = "ValorTotal")]
    pub total_value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YearRow {
    #[serde(rename = "Ano")]
    #[tabled(rename = "Ano")]
    pub year: i32,
    #[serde(rename = "ValorTotal")]
    #[tabled(rename = "ValorTotal")]
    pub total_value: String,
    #[serde(rename = "Contratos")]
    #[tabled(rename = "Contratos")]
    pub contract_count: usize,
}
