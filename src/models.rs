use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AtencionesError;
use crate::fmt::parse_amount;

/// A single JSON scalar as sent by the backend. Anything that is not a
/// string, number or boolean is kept in `Other` so one odd field never
/// rejects the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Other(serde_json::Value),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Other(v) => write!(f, "{v}"),
        }
    }
}

impl Scalar {
    /// Numeric value for aggregation; anything unparseable counts as zero.
    pub fn as_amount(&self) -> f64 {
        match self {
            Scalar::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
            Scalar::Text(s) => parse_amount(s),
            Scalar::Bool(_) | Scalar::Other(_) => 0.0,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

/// One clinic visit ("atención") as returned by `GET /atencion`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    #[serde(rename = "cod_ate", default)]
    pub visit_code: Option<Scalar>,
    #[serde(rename = "cm_estado", default)]
    pub status: Option<Scalar>,
    #[serde(rename = "fec_ate", default)]
    pub visit_timestamp: Option<Scalar>,
    #[serde(rename = "nom_pac", default)]
    pub patient_name: Option<Scalar>,
    #[serde(rename = "numero_ce", default)]
    pub receipt_number: Option<Scalar>,
    #[serde(rename = "tar_ate", default)]
    pub amount: Option<Scalar>,
    #[serde(rename = "for_ate", default)]
    pub payment_method: Option<Scalar>,
    #[serde(rename = "num_operacion_ap", default)]
    pub operation_number: Option<Scalar>,
    #[serde(rename = "cod_convenio", default)]
    pub agreement_code: Option<Scalar>,
}

impl VisitRecord {
    pub fn value(&self, column: Column) -> Option<&Scalar> {
        match column {
            Column::VisitCode => self.visit_code.as_ref(),
            Column::Status => self.status.as_ref(),
            Column::VisitTimestamp => self.visit_timestamp.as_ref(),
            Column::PatientName => self.patient_name.as_ref(),
            Column::ReceiptNumber => self.receipt_number.as_ref(),
            Column::Amount => self.amount.as_ref(),
            Column::PaymentMethod => self.payment_method.as_ref(),
            Column::OperationNumber => self.operation_number.as_ref(),
            Column::AgreementCode => self.agreement_code.as_ref(),
        }
    }

    /// Raw value as text, empty when the field is null or missing.
    pub fn text(&self, column: Column) -> String {
        self.value(column).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn amount_value(&self) -> f64 {
        self.amount.as_ref().map(Scalar::as_amount).unwrap_or(0.0)
    }

    /// Visit date as `YYYY-MM-DD` in the local timezone.
    pub fn visit_date(&self) -> String {
        self.visit_date_in(&Local)
    }

    /// Visit date as `YYYY-MM-DD` in `tz`. Instants with an offset are
    /// converted, naive timestamps keep their own date, numbers are epoch
    /// milliseconds. Unrecognised text is shown as-is.
    pub fn visit_date_in<Tz: TimeZone>(&self, tz: &Tz) -> String {
        let Some(value) = &self.visit_timestamp else {
            return String::new();
        };
        let date = match value {
            Scalar::Text(s) => parse_visit_date(s, tz),
            Scalar::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| dt.with_timezone(tz).date_naive()),
            _ => None,
        };
        match date {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => value.to_string(),
        }
    }
}

fn parse_visit_date<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(tz).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// The nine table columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    VisitCode,
    Status,
    VisitTimestamp,
    PatientName,
    ReceiptNumber,
    Amount,
    PaymentMethod,
    OperationNumber,
    AgreementCode,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::VisitCode,
        Column::Status,
        Column::VisitTimestamp,
        Column::PatientName,
        Column::ReceiptNumber,
        Column::Amount,
        Column::PaymentMethod,
        Column::OperationNumber,
        Column::AgreementCode,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire key used by the backend.
    pub fn key(self) -> &'static str {
        match self {
            Column::VisitCode => "cod_ate",
            Column::Status => "cm_estado",
            Column::VisitTimestamp => "fec_ate",
            Column::PatientName => "nom_pac",
            Column::ReceiptNumber => "numero_ce",
            Column::Amount => "tar_ate",
            Column::PaymentMethod => "for_ate",
            Column::OperationNumber => "num_operacion_ap",
            Column::AgreementCode => "cod_convenio",
        }
    }

    /// Header label, shared by the table and the exported sheet.
    pub fn label(self) -> &'static str {
        match self {
            Column::VisitCode => "Cod Ate.",
            Column::Status => "Estado Ate.",
            Column::VisitTimestamp => "Fecha Ate.",
            Column::PatientName => "Paciente",
            Column::ReceiptNumber => "Boleta",
            Column::Amount => "Monto",
            Column::PaymentMethod => "Mét. Pago",
            Column::OperationNumber => "Num. Operación",
            Column::AgreementCode => "Convenio",
        }
    }
}

impl FromStr for Column {
    type Err = AtencionesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AtencionesError::UnknownColumn(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn deserializes_mixed_field_types() {
        let json = r#"{
            "cod_ate": 101, "cm_estado": "AT", "fec_ate": "2024-01-01T15:00:00.000Z",
            "nom_pac": "Ana Pérez", "numero_ce": "B001-12", "tar_ate": "100.50",
            "for_ate": "EFECTIVO", "num_operacion_ap": null
        }"#;
        let rec: VisitRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.text(Column::VisitCode), "101");
        assert_eq!(rec.text(Column::PatientName), "Ana Pérez");
        assert_eq!(rec.operation_number, None);
        assert_eq!(rec.agreement_code, None);
        assert_eq!(rec.text(Column::AgreementCode), "");
        assert_eq!(rec.amount_value(), 100.5);
    }

    #[test]
    fn nested_values_do_not_fail_deserialization() {
        let json = r#"{"cod_convenio": {"id": 3}}"#;
        let rec: VisitRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.text(Column::AgreementCode), r#"{"id":3}"#);
    }

    #[test]
    fn amount_coercion_defaults_to_zero() {
        assert_eq!(Scalar::from("abc").as_amount(), 0.0);
        assert_eq!(Scalar::from(" 12.25 ").as_amount(), 12.25);
        assert_eq!(Scalar::from(50i64).as_amount(), 50.0);
        assert_eq!(Scalar::Bool(true).as_amount(), 0.0);
        assert_eq!(VisitRecord::default().amount_value(), 0.0);
    }

    #[test]
    fn visit_date_converts_instants_to_timezone() {
        let rec = VisitRecord {
            visit_timestamp: Some(Scalar::from("2024-01-02T03:00:00.000Z")),
            ..Default::default()
        };
        assert_eq!(rec.visit_date_in(&Utc), "2024-01-02");
        let lima = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(rec.visit_date_in(&lima), "2024-01-01");
    }

    #[test]
    fn visit_date_handles_naive_and_plain_dates() {
        let naive = VisitRecord {
            visit_timestamp: Some(Scalar::from("2024-03-05T10:30:00")),
            ..Default::default()
        };
        assert_eq!(naive.visit_date_in(&Utc), "2024-03-05");

        let spaced = VisitRecord {
            visit_timestamp: Some(Scalar::from("2024-03-05 23:59:59.5")),
            ..Default::default()
        };
        assert_eq!(spaced.visit_date_in(&Utc), "2024-03-05");

        let plain = VisitRecord {
            visit_timestamp: Some(Scalar::from("2024-03-05")),
            ..Default::default()
        };
        assert_eq!(plain.visit_date_in(&Utc), "2024-03-05");
    }

    #[test]
    fn visit_date_falls_back_to_raw_text() {
        let rec = VisitRecord {
            visit_timestamp: Some(Scalar::from("ayer")),
            ..Default::default()
        };
        assert_eq!(rec.visit_date_in(&Utc), "ayer");
        assert_eq!(VisitRecord::default().visit_date_in(&Utc), "");
    }

    #[test]
    fn column_keys_round_trip() {
        for col in Column::ALL {
            assert_eq!(col.key().parse::<Column>().unwrap(), col);
            assert_eq!(Column::ALL[col.index()], col);
        }
        assert!("tar_Ate".parse::<Column>().is_ok());
        assert!(matches!(
            "monto".parse::<Column>(),
            Err(AtencionesError::UnknownColumn(_))
        ));
    }
}
