use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use renach_core::{ExtractionResult, Field, FormParser, RenachParser};

const SAMPLE_FORM: &str = "\
FORMULÁRIO DE AVALIAÇÃO

Nome:
Pai:
Mãe:
JHORDAN CANDIDO DOS SANTOS SIMEAO
ADALBERTO DA SILVA SIMEAO
ELISANGELA DOS SANTOS

Data de Nascimento: 14/02/1998
CPF: 529.982.247-25
RENACH: SP123456789
RG: 12.345.678-9   Órgão Emissor: SSP/SP

Tipo de Processo: RENOVAÇÃO
Situação Atual: B
Categoria Atual: AB CC
Primeira Habilitação: 10/05/2016

Telefone: (11) 98765-4321

Endereço: Rua das Flores, 123
Complemento: Casa 2
Bairro: Centro
CEP: 13201-005
Município: Jundiaí

Data do Exame: 10/03/2025
Resultado: Apto
N° do Credenciado: 1876
N° do Laudo: 1563
";

fn parser() -> RenachParser {
    RenachParser::new().with_reference_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

#[test]
fn test_complete_sample_form() {
    let result = parser().parse(SAMPLE_FORM);
    let record = &result.record;

    let expected = [
        (Field::Nome, "JHORDAN CANDIDO DOS SANTOS SIMEAO"),
        (Field::NomePai, "ADALBERTO DA SILVA SIMEAO"),
        (Field::NomeMae, "ELISANGELA DOS SANTOS"),
        (Field::DataNascimento, "14/02/1998"),
        (Field::Cpf, "529.982.247-25"),
        (Field::NumeroRenach, "SP123456789"),
        (Field::TipoProcesso, "Renovação"),
        (Field::Categoria, "B"),
        (Field::DataPrimeiraHabilitacao, "10/05/2016"),
        (Field::Telefone, "(11) 98765-4321"),
        (Field::Logradouro, "Rua das Flores"),
        (Field::Numero, "123"),
        (Field::Complemento, "Casa 2"),
        (Field::Bairro, "Centro"),
        (Field::Cep, "13201-005"),
        (Field::Municipio, "JUNDIAÍ"),
        (
            Field::Endereco,
            "Rua das Flores, 123 - Casa 2 - Centro - JUNDIAÍ - CEP 13201-005",
        ),
        (Field::Rg, "12.345.678-9"),
        (Field::OrgaoExpedidor, "SSP"),
        (Field::UfRg, "SP"),
        (Field::DataExame, "10/03/2025"),
        (Field::ResultadoExame, "Apto"),
        (Field::NumeroCredenciado, "1876"),
        (Field::NumeroLaudoRenach, "1563"),
    ];

    for (field, value) in expected {
        assert_eq!(record.get(field), Some(value), "field {}", field);
    }
    assert!(!record.contains(Field::CodigoMunicipio));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_labelled_names_and_temporary_unfitness() {
    let text = "\
Nome: CARLOS EDUARDO PEREIRA
Nome do Pai: JOSE PEREIRA
Nome da Mãe: ANA MARIA PEREIRA
Categoria Pretendida: AB
Resultado: INAPTO TEMPORÁRIO
Credenciado 1876 Laudo 1563
";
    let record = parser().parse(text).record;

    assert_eq!(record.get(Field::Nome), Some("CARLOS EDUARDO PEREIRA"));
    assert_eq!(record.get(Field::NomePai), Some("JOSE PEREIRA"));
    assert_eq!(record.get(Field::NomeMae), Some("ANA MARIA PEREIRA"));
    assert_eq!(record.get(Field::Categoria), Some("AB"));
    assert_eq!(record.get(Field::ResultadoExame), Some("Inapto Temporário"));
    assert_eq!(record.get(Field::NumeroCredenciado), Some("1876"));
    assert_eq!(record.get(Field::NumeroLaudoRenach), Some("1563"));
    assert_eq!(record.get(Field::UfRg), Some("SP")); // home state fallback
    assert!(!record.contains(Field::Endereco));
}

#[test]
fn test_same_text_same_record() {
    let first = serde_json::to_string(&parser().parse(SAMPLE_FORM).record).unwrap();
    let second = serde_json::to_string(&parser().parse(SAMPLE_FORM).record).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_envelope_shape() {
    let record = parser().parse(SAMPLE_FORM).record;
    let json = serde_json::to_value(ExtractionResult::success(record, None)).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["nome"], "JHORDAN CANDIDO DOS SANTOS SIMEAO");
    assert!(json["data"]["foto"].is_null());
    assert!(json.get("error").is_none());

    let failed = serde_json::to_value(ExtractionResult::failure("document is empty")).unwrap();
    assert_eq!(failed["success"], false);
    assert_eq!(failed["data"], serde_json::json!({}));
    assert_eq!(failed["error"], "document is empty");
}
