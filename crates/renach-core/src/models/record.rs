//! RENACH record and extraction envelope.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

/// A field of the RENACH form.
///
/// Declaration order is also the serialization order of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Full name of the candidate.
    Nome,
    /// Father's name.
    NomePai,
    /// Mother's name.
    NomeMae,
    /// Date of birth, `DD/MM/YYYY`.
    DataNascimento,
    /// CPF, formatted `000.000.000-00`.
    Cpf,
    /// RENACH registration number.
    NumeroRenach,
    /// Canonical process type (Renovação, Primeira Habilitação...).
    TipoProcesso,
    /// CNH category, one to five letters from A to E.
    Categoria,
    /// Date of the first license, `DD/MM/YYYY`.
    DataPrimeiraHabilitacao,
    /// Contact phone.
    Telefone,
    /// Street.
    Logradouro,
    /// House number or `S/N`.
    Numero,
    /// Address complement.
    Complemento,
    /// Neighborhood.
    Bairro,
    /// Postal code, `00000-000`.
    Cep,
    /// Municipality code.
    CodigoMunicipio,
    /// Municipality name.
    Municipio,
    /// Composite address derived from the fragments above.
    Endereco,
    /// RG (identity document) number.
    Rg,
    /// RG issuing body.
    OrgaoExpedidor,
    /// RG issuing state.
    UfRg,
    /// Date of the exam, `DD/MM/YYYY`.
    DataExame,
    /// Apto, Inapto, Inapto Temporário or Dispensado.
    ResultadoExame,
    /// Registration number of the accredited professional.
    NumeroCredenciado,
    /// Exam report (laudo) number.
    NumeroLaudoRenach,
}

impl Field {
    /// All fields in declaration order.
    pub const ALL: [Field; 25] = [
        Field::Nome,
        Field::NomePai,
        Field::NomeMae,
        Field::DataNascimento,
        Field::Cpf,
        Field::NumeroRenach,
        Field::TipoProcesso,
        Field::Categoria,
        Field::DataPrimeiraHabilitacao,
        Field::Telefone,
        Field::Logradouro,
        Field::Numero,
        Field::Complemento,
        Field::Bairro,
        Field::Cep,
        Field::CodigoMunicipio,
        Field::Municipio,
        Field::Endereco,
        Field::Rg,
        Field::OrgaoExpedidor,
        Field::UfRg,
        Field::DataExame,
        Field::ResultadoExame,
        Field::NumeroCredenciado,
        Field::NumeroLaudoRenach,
    ];

    /// Key used in the serialized record.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Nome => "nome",
            Field::NomePai => "nome_pai",
            Field::NomeMae => "nome_mae",
            Field::DataNascimento => "data_nascimento",
            Field::Cpf => "cpf",
            Field::NumeroRenach => "numero_renach",
            Field::TipoProcesso => "tipo_processo",
            Field::Categoria => "categoria",
            Field::DataPrimeiraHabilitacao => "data_primeira_habilitacao",
            Field::Telefone => "telefone",
            Field::Logradouro => "logradouro",
            Field::Numero => "numero",
            Field::Complemento => "complemento",
            Field::Bairro => "bairro",
            Field::Cep => "cep",
            Field::CodigoMunicipio => "codigo_municipio",
            Field::Municipio => "municipio",
            Field::Endereco => "endereco",
            Field::Rg => "rg",
            Field::OrgaoExpedidor => "orgao_expedidor",
            Field::UfRg => "uf_rg",
            Field::DataExame => "data_exame",
            Field::ResultadoExame => "resultado_exame",
            Field::NumeroCredenciado => "numero_credenciado",
            Field::NumeroLaudoRenach => "numero_laudo_renach",
        }
    }

    /// Whether the field is one of the address fragments folded into `endereco`.
    pub fn is_address_fragment(&self) -> bool {
        matches!(
            self,
            Field::Logradouro
                | Field::Numero
                | Field::Complemento
                | Field::Bairro
                | Field::Cep
                | Field::CodigoMunicipio
                | Field::Municipio
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Flat mapping from field to its accepted value.
///
/// Values are set monotonically: once a field is accepted, later
/// candidates for it are ignored. Absent keys mean "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedRecord {
    fields: BTreeMap<Field, String>,
}

impl ExtractedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a value unless the field is already set or the value is blank.
    ///
    /// Returns `true` when the value was stored.
    pub fn accept(&mut self, field: Field, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.trim().is_empty() || self.fields.contains_key(&field) {
            return false;
        }
        self.fields.insert(field, value);
        true
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Values already claimed by any of the given fields.
    pub fn values_of<'a>(&'a self, fields: &'a [Field]) -> impl Iterator<Item = &'a str> + 'a {
        fields.iter().filter_map(move |f| self.get(*f))
    }
}

/// Final envelope of one extraction call.
///
/// Serializes as `{"success", "data": {fields..., "foto"}, "error"?}`. A
/// failed call carries an empty `data` object and no `foto` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub success: bool,
    pub record: ExtractedRecord,
    /// PNG photo as a `data:` URL.
    pub photo: Option<String>,
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn success(record: ExtractedRecord, photo: Option<String>) -> Self {
        Self {
            success: true,
            record,
            photo,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            record: ExtractedRecord::default(),
            photo: None,
            error: Some(error.into()),
        }
    }
}

struct DataView<'a> {
    result: &'a ExtractionResult,
}

impl Serialize for DataView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.result.success {
            return serializer.serialize_map(Some(0))?.end();
        }

        let record = &self.result.record;
        let mut map = serializer.serialize_map(Some(record.len() + 1))?;
        for (field, value) in record.iter() {
            map.serialize_entry(field.key(), value)?;
        }
        map.serialize_entry("foto", &self.result.photo)?;
        map.end()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.error.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("ExtractionResult", len)?;
        state.serialize_field("success", &self.success)?;
        state.serialize_field("data", &DataView { result: self })?;
        if let Some(error) = &self.error {
            state.serialize_field("error", error)?;
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_accept_is_monotonic() {
        let mut record = ExtractedRecord::new();
        assert!(record.accept(Field::Categoria, "B"));
        assert!(!record.accept(Field::Categoria, "AB"));
        assert_eq!(record.get(Field::Categoria), Some("B"));
    }

    #[test]
    fn test_blank_values_stay_absent() {
        let mut record = ExtractedRecord::new();
        assert!(!record.accept(Field::Complemento, "   "));
        assert!(!record.contains(Field::Complemento));
    }

    #[test]
    fn test_field_keys_match_serde() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.key()));
        }
    }

    #[test]
    fn test_success_json_shape() {
        let mut record = ExtractedRecord::new();
        record.accept(Field::Nome, "MARIA DA SILVA");
        record.accept(Field::Categoria, "B");

        let json = serde_json::to_value(ExtractionResult::success(record, None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "data": {"nome": "MARIA DA SILVA", "categoria": "B", "foto": null}
            })
        );
    }

    #[test]
    fn test_failure_json_shape() {
        let json = serde_json::to_value(ExtractionResult::failure("document is empty")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "data": {}, "error": "document is empty"})
        );
    }
}
