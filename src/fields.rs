//! Labeled field extraction from cleaned report text
//!
//! Every field is a case-insensitive pattern whose first capture group holds
//! the value. Unmatched fields fall back to a fixed placeholder.

use once_cell::sync::Lazy;
use regex::Regex;

pub const NOT_INFORMED: &str = "(não informado)";
pub const NOT_INFORMED_F: &str = "(não informada)";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Replace newlines, collapse whitespace runs and trim
pub fn clean(text: &str) -> String {
    WHITESPACE_RE
        .replace_all(&text.replace('\n', " "), " ")
        .trim()
        .to_string()
}

/// First (or last) capture of group 1, trimmed
pub fn find(pattern: &Regex, text: &str, last: bool) -> Option<String> {
    let captures = if last {
        pattern.captures_iter(text).last()
    } else {
        pattern.captures(text)
    };
    captures
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// A named extraction rule
pub struct FieldRule {
    pub name: &'static str,
    pub pattern: &'static Lazy<Regex>,
    /// Take the last match instead of the first (cumulative totals restated at the end)
    pub last: bool,
    pub fallback: &'static str,
}

impl FieldRule {
    /// The matched value, or `None` when the pattern does not occur
    pub fn find(&self, text: &str) -> Option<String> {
        find(self.pattern, text, self.last)
    }

    /// The matched value, or the rule's fallback
    pub fn extract(&self, text: &str) -> String {
        self.find(text).unwrap_or_else(|| self.fallback.to_string())
    }
}

/// Apply every rule to `text`, keeping rule order
pub fn parse_fields(text: &str, rules: &[&FieldRule]) -> Vec<(&'static str, String)> {
    rules.iter().map(|rule| (rule.name, rule.extract(text))).collect()
}

static PROJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Projeto\s*[:\-]?\s*([A-Z0-9./_-]+)").unwrap());
static CIRCUIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Circuito\s*[:\-]?\s*([\w/\-]+)").unwrap());
static EQUIPMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Equipamento\s*[:\-]?\s*([\w/\-]+)").unwrap());
static NOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Nota\s*[:\-]?\s*([\w/\-]+)").unwrap());
static PREFEITURA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)Prefeitura\s*[:\-]?\s*([\w À-ÖØ-öø-ÿ-]+?)(?:\s{2,}|Subprefeitura|Foto|Quantidade|Código|Cod|$)",
    )
    .unwrap()
});
static SUBPREFEITURA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Subprefeitura\s*[:\-]?\s*([\w À-ÖØ-öø-ÿ-]+?)(?:\s{2,}|Foto|Quantidade|Código|Cod|$)")
        .unwrap()
});
static QUANTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Quantidade\s*:?\s*(\d+)").unwrap());

static TOTAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)TOTAL GERAL\s*(\d+)").unwrap());
static MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)TOTAL GERAL\s*\d+\s+([A-Za-zÇ-ú]+)").unwrap());
// Execution reports print these fields on one line; the value is a run of
// word characters and spaces that stops early at the next known label
static MUNICIPALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)MUNIC[IÍ]PIO\s*[:\-]?\s*([\w À-ÖØ-öø-ÿ]+?)\s*(?:SUBPREFEITURA|TOTAL GERAL|MUNIC[IÍ]PIO|[^\w À-ÖØ-öø-ÿ]|$)",
    )
    .unwrap()
});
static SUB_MUNICIPALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)SUBPREFEITURA\s*[:\-]?\s*([\w À-ÖØ-öø-ÿ]+?)\s*(?:MUNIC[IÍ]PIO|TOTAL GERAL|SUBPREFEITURA|[^\w À-ÖØ-öø-ÿ]|$)",
    )
    .unwrap()
});

/// Project identifier; callers fall back to the file name
pub static PROJECT: FieldRule = FieldRule {
    name: "Projeto",
    pattern: &PROJECT_RE,
    last: false,
    fallback: "",
};
pub static CIRCUIT: FieldRule = FieldRule {
    name: "Circuito",
    pattern: &CIRCUIT_RE,
    last: false,
    fallback: NOT_INFORMED,
};
pub static EQUIPMENT: FieldRule = FieldRule {
    name: "Equipamento",
    pattern: &EQUIPMENT_RE,
    last: false,
    fallback: NOT_INFORMED,
};
pub static NOTE: FieldRule = FieldRule {
    name: "Nota",
    pattern: &NOTE_RE,
    last: false,
    fallback: NOT_INFORMED_F,
};
pub static PREFEITURA: FieldRule = FieldRule {
    name: "Prefeitura",
    pattern: &PREFEITURA_RE,
    last: false,
    fallback: NOT_INFORMED_F,
};
pub static SUBPREFEITURA: FieldRule = FieldRule {
    name: "Subprefeitura",
    pattern: &SUBPREFEITURA_RE,
    last: false,
    fallback: NOT_INFORMED_F,
};

pub static TOTAL_GERAL: FieldRule = FieldRule {
    name: "TOTAL_GERAL",
    pattern: &TOTAL_RE,
    last: true,
    fallback: "",
};
pub static MONTH: FieldRule = FieldRule {
    name: "Mês",
    pattern: &MONTH_RE,
    last: true,
    fallback: "",
};
pub static MUNICIPALITY: FieldRule = FieldRule {
    name: "MUNICÍPIO",
    pattern: &MUNICIPALITY_RE,
    last: true,
    fallback: "",
};
pub static SUB_MUNICIPALITY: FieldRule = FieldRule {
    name: "SUBPREFEITURA",
    pattern: &SUB_MUNICIPALITY_RE,
    last: true,
    fallback: "",
};

/// Sum of every `Quantidade: N` on a page
pub fn page_quantity(page_text: &str) -> u64 {
    QUANTITY_RE
        .captures_iter(page_text)
        .filter_map(|c| c.get(1)?.as_str().parse::<u64>().ok())
        .fold(0u64, u64::saturating_add)
}

/// Whether text carries an execution-report total line
pub fn has_total_geral(text: &str) -> bool {
    TOTAL_RE.is_match(text)
}

/// Project id fallback: the file stem up to the first underscore
pub fn project_from_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    };
    stem.split('_').next().unwrap_or(stem).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "Relatório de Poda Projeto: PRJ-2024/17 Circuito: CT-09 \
        Equipamento: TR_443 Nota: 88123 Prefeitura: São Paulo Subprefeitura: Vila Mariana \
        Foto inspeção Foto execução Quantidade: 3";

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean("  a\n\nb \t c  "), "a b c");
    }

    #[test]
    fn test_project_fields() {
        assert_eq!(PROJECT.extract(REPORT), "PRJ-2024/17");
        assert_eq!(CIRCUIT.extract(REPORT), "CT-09");
        assert_eq!(EQUIPMENT.extract(REPORT), "TR_443");
        assert_eq!(NOTE.extract(REPORT), "88123");
        assert_eq!(PREFEITURA.extract(REPORT), "São Paulo");
        assert_eq!(SUBPREFEITURA.extract(REPORT), "Vila Mariana");
    }

    #[test]
    fn test_fallback_placeholders() {
        let text = "nada a declarar";
        assert_eq!(CIRCUIT.extract(text), "(não informado)");
        assert_eq!(EQUIPMENT.extract(text), "(não informado)");
        assert_eq!(NOTE.extract(text), "(não informada)");
        assert_eq!(PREFEITURA.extract(text), "(não informada)");
        assert_eq!(PROJECT.find(text), None);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(CIRCUIT.extract("CIRCUITO - ab12"), "ab12");
    }

    #[test]
    fn test_last_match_for_totals() {
        let text = "TOTAL GERAL 10 MARÇO ... TOTAL GERAL 25 ABRIL MUNICÍPIO: Santo André";
        assert_eq!(TOTAL_GERAL.extract(text), "25");
        assert_eq!(MONTH.extract(text), "ABRIL");
        assert_eq!(MUNICIPALITY.extract(text), "Santo André");
        assert_eq!(SUB_MUNICIPALITY.extract(text), "");
    }

    #[test]
    fn test_execution_fields_stop_at_next_label() {
        let text = "MUNICÍPIO: Osasco SUBPREFEITURA: Jardim Piratininga TOTAL GERAL 37 JUNHO \
            MUNICIPIO - Barueri 2024";
        assert_eq!(MUNICIPALITY.extract(text), "Barueri 2024");
        assert_eq!(SUB_MUNICIPALITY.extract(text), "Jardim Piratininga");
    }

    #[test]
    fn test_execution_fields_keep_digits() {
        assert_eq!(SUB_MUNICIPALITY.extract("SUBPREFEITURA: Zona 2"), "Zona 2");
        assert_eq!(SUB_MUNICIPALITY.extract("SUBPREFEITURA: 03 Sé TOTAL GERAL 4 MAIO"), "03 Sé");
        assert_eq!(MUNICIPALITY.extract("MUNICÍPIO: 123"), "123");
        assert_eq!(MUNICIPALITY.extract("MUNICÍPIO: Osasco, SP"), "Osasco");
    }

    #[test]
    fn test_parse_fields_is_idempotent() {
        let rules = [&PROJECT, &CIRCUIT, &NOTE, &PREFEITURA];
        let first = parse_fields(REPORT, &rules);
        let second = parse_fields(REPORT, &rules);
        assert_eq!(first, second);
        assert_eq!(first[0], ("Projeto", "PRJ-2024/17".to_string()));
    }

    #[test]
    fn test_page_quantity_sums_matches() {
        assert_eq!(page_quantity("Quantidade: 2\nfoo\nquantidade 5"), 7);
        assert_eq!(page_quantity("sem podas"), 0);
    }

    #[test]
    fn test_project_from_file_name() {
        assert_eq!(project_from_file_name("P123_relatorio.pdf"), "P123");
        assert_eq!(project_from_file_name("dir/ABC.pdf"), "ABC");
        assert_eq!(project_from_file_name("semextensao"), "semextensao");
    }
}
