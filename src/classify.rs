//! Report-type classification
//!
//! Execution communications are recognized by file name
//! (`...comunicacao...execucao...pdf`). Names carrying only one of the two
//! words are reported as ambiguous and settled by looking at the content.

use crate::fields;
use log::warn;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// What a file name says about the report inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Execution communication (monthly totals)
    Execution,
    /// Project report with photo captions
    PhotoAudit,
    /// The name mentions only one of the execution keywords
    Ambiguous,
}

/// Where a document is routed after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Execution,
    PhotoAudit,
}

/// Lowercase and strip diacritics, so "Comunicação" matches "comunicacao"
pub fn fold_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

pub fn classify_filename(file_name: &str) -> ReportKind {
    let folded = fold_name(file_name);
    match (folded.contains("comunicacao"), folded.contains("execucao")) {
        (true, true) => ReportKind::Execution,
        (false, false) => ReportKind::PhotoAudit,
        _ => ReportKind::Ambiguous,
    }
}

/// Settle the route, deciding ambiguous names from the document text
pub fn resolve(file_name: &str, kind: ReportKind, full_text: &str) -> Route {
    match kind {
        ReportKind::Execution => Route::Execution,
        ReportKind::PhotoAudit => Route::PhotoAudit,
        ReportKind::Ambiguous => {
            let route = if fields::has_total_geral(full_text) {
                Route::Execution
            } else {
                Route::PhotoAudit
            };
            warn!("{}: ambiguous report name, routed as {:?} from content", file_name, route);
            route
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_filename() {
        assert_eq!(classify_filename("comunicacao_execucao_marco.pdf"), ReportKind::Execution);
        assert_eq!(classify_filename("COMUNICACAO-EXECUCAO.PDF"), ReportKind::Execution);
        assert_eq!(classify_filename("Comunicação de Execução 03.pdf"), ReportKind::Execution);
        assert_eq!(classify_filename("P123_poda.pdf"), ReportKind::PhotoAudit);
        assert_eq!(classify_filename("execucao_P123.pdf"), ReportKind::Ambiguous);
        assert_eq!(classify_filename("comunicacao.pdf"), ReportKind::Ambiguous);
    }

    #[test]
    fn test_resolve_ambiguous_by_content() {
        assert_eq!(
            resolve("execucao.pdf", ReportKind::Ambiguous, "TOTAL GERAL 12 MAIO"),
            Route::Execution
        );
        assert_eq!(
            resolve("execucao.pdf", ReportKind::Ambiguous, "Projeto: 77 Foto inspeção"),
            Route::PhotoAudit
        );
        assert_eq!(resolve("x.pdf", ReportKind::PhotoAudit, "TOTAL GERAL 12"), Route::PhotoAudit);
    }

    #[test]
    fn test_fold_name() {
        assert_eq!(fold_name("ExecuçÃo"), "execucao");
    }
}
