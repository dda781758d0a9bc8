//! Per-document summaries, display blocks and export rows

use crate::fields::{self, FieldRule};
use crate::layout::DocumentLayout;
use crate::matcher::{self, MatchConfig, MissingPhotos};
use log::debug;

/// Whether every photo caption of a document found its image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoStatus {
    Complete,
    Incomplete,
}

/// A spreadsheet cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// One export row: column name and value, in column order
pub type Row = Vec<(&'static str, CellValue)>;

/// Text shown for one processed document
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBlock {
    pub header: String,
    pub body: String,
    pub lines: Vec<String>,
}

impl ResultBlock {
    /// Body followed by the detail lines
    pub fn text(&self) -> String {
        std::iter::once(self.body.as_str())
            .chain(self.lines.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Photo-audit result for one project report
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub project: String,
    pub circuit: String,
    pub equipment: String,
    pub note: String,
    pub municipality: String,
    pub sub_municipality: String,
    pub total_quantity: u64,
    pub missing: MissingPhotos,
}

impl ProjectSummary {
    pub fn status(&self) -> PhotoStatus {
        if self.missing.is_empty() {
            PhotoStatus::Complete
        } else {
            PhotoStatus::Incomplete
        }
    }

    pub fn header(&self) -> String {
        format!(
            "Projeto: {} Circuito: {} Equipamento: {} Nota: {}  Prefeitura: {}  Subprefeitura: {}",
            self.project, self.circuit, self.equipment, self.note, self.municipality, self.sub_municipality
        )
    }

    pub fn body(&self) -> String {
        match self.status() {
            PhotoStatus::Incomplete => format!(
                "📍 Projeto: {} — fotos ausentes (total podas {})",
                self.project, self.total_quantity
            ),
            PhotoStatus::Complete => format!(
                "📍 Projeto: {} — todas as fotos estão presentes (total podas {})",
                self.project, self.total_quantity
            ),
        }
    }

    pub fn result_block(&self) -> ResultBlock {
        ResultBlock {
            header: self.header(),
            body: self.body(),
            lines: self.missing.lines(),
        }
    }

    pub fn row(&self) -> Row {
        let mut row: Row = vec![
            ("Projeto", self.project.as_str().into()),
            ("Circuito", self.circuit.as_str().into()),
            ("Equipamento", self.equipment.as_str().into()),
            ("Nota", self.note.as_str().into()),
            ("Prefeitura", self.municipality.as_str().into()),
            ("Subprefeitura", self.sub_municipality.as_str().into()),
            ("Total_Podas", CellValue::Number(self.total_quantity as f64)),
        ];
        if self.status() == PhotoStatus::Incomplete {
            row.push(("Faltantes", self.missing.lines().join("; ").into()));
        }
        row
    }
}

/// Totals of an execution-communication report
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    pub total_general: String,
    pub month: String,
    pub municipality: String,
    pub sub_municipality: String,
}

impl ExecutionSummary {
    pub fn result_block(&self) -> ResultBlock {
        ResultBlock {
            header: "Comunicação de Execução".to_string(),
            body: format!("TOTAL GERAL {}  {}", self.total_general, self.month),
            lines: vec![
                format!("MUNICÍPIO: {}", self.municipality),
                format!("SUBPREFEITURA: {}", self.sub_municipality),
            ],
        }
    }

    pub fn row(&self) -> Row {
        vec![
            ("TOTAL_GERAL", self.total_general.as_str().into()),
            ("Mês", self.month.as_str().into()),
            ("MUNICÍPIO", self.municipality.as_str().into()),
            ("SUBPREFEITURA", self.sub_municipality.as_str().into()),
        ]
    }
}

const PROJECT_RULES: [&FieldRule; 5] = [
    &fields::CIRCUIT,
    &fields::EQUIPMENT,
    &fields::NOTE,
    &fields::PREFEITURA,
    &fields::SUBPREFEITURA,
];

/// Audit the photo captions of a project report
pub fn analyze_photos(layout: &DocumentLayout, file_name: &str, config: &MatchConfig) -> ProjectSummary {
    let full = layout.full_text();

    let project = fields::PROJECT
        .find(&full)
        .unwrap_or_else(|| fields::project_from_file_name(file_name));
    let values = fields::parse_fields(&full, &PROJECT_RULES);
    let value = |i: usize| values[i].1.clone();

    let total_quantity = layout
        .pages
        .iter()
        .map(|page| fields::page_quantity(&page.text()))
        .fold(0u64, u64::saturating_add);

    let missing = matcher::audit_layout(layout, config);
    debug!(
        "{}: project {}, {} items with missing photos",
        file_name,
        project,
        missing.len()
    );

    ProjectSummary {
        project,
        circuit: value(0),
        equipment: value(1),
        note: value(2),
        municipality: value(3),
        sub_municipality: value(4),
        total_quantity,
        missing,
    }
}

/// Read the totals of an execution-communication report
pub fn analyze_execution(layout: &DocumentLayout) -> ExecutionSummary {
    let full = layout.full_text();
    ExecutionSummary {
        total_general: fields::TOTAL_GERAL.extract(&full),
        month: fields::MONTH.extract(&full),
        municipality: fields::MUNICIPALITY.extract(&full),
        sub_municipality: fields::SUB_MUNICIPALITY.extract(&full),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ImageBlock, LayoutPrimitive, PageLayout, TextSpan};
    use crate::matcher::{ItemCode, PhotoCategory};

    fn text(s: &str, x: f32, y: f32) -> LayoutPrimitive {
        LayoutPrimitive::Text(TextSpan {
            text: s.to_string(),
            x,
            y,
            font_size: 9.0,
        })
    }

    fn summary(missing: MissingPhotos) -> ProjectSummary {
        ProjectSummary {
            project: "P1".into(),
            circuit: "C1".into(),
            equipment: "E1".into(),
            note: "N1".into(),
            municipality: "São Paulo".into(),
            sub_municipality: "Sé".into(),
            total_quantity: 4,
            missing,
        }
    }

    #[test]
    fn test_complete_summary() {
        let s = summary(MissingPhotos::new());
        assert_eq!(s.status(), PhotoStatus::Complete);
        assert_eq!(
            s.header(),
            "Projeto: P1 Circuito: C1 Equipamento: E1 Nota: N1  Prefeitura: São Paulo  Subprefeitura: Sé"
        );
        assert_eq!(s.result_block().text(), "📍 Projeto: P1 — todas as fotos estão presentes (total podas 4)");
        let row = s.row();
        assert_eq!(row.len(), 7);
        assert_eq!(row[6], ("Total_Podas", CellValue::Number(4.0)));
    }

    #[test]
    fn test_incomplete_summary_row() {
        let mut missing = MissingPhotos::new();
        missing.record(ItemCode::from("3"), PhotoCategory::Execution);
        missing.record(ItemCode::from("12"), PhotoCategory::Inspection);
        let s = summary(missing);
        assert_eq!(s.status(), PhotoStatus::Incomplete);
        assert_eq!(
            s.result_block().text(),
            "📍 Projeto: P1 — fotos ausentes (total podas 4)\ncodigo 12 : Inspeção\ncodigo 3 : Execução"
        );
        let row = s.row();
        assert_eq!(
            row.last(),
            Some(&("Faltantes", CellValue::from("codigo 12 : Inspeção; codigo 3 : Execução")))
        );
    }

    #[test]
    fn test_analyze_photos_from_layout() {
        let mut prims = vec![
            text("Projeto: 4471-A Circuito: CX3", 60.0, 20.0),
            text("Quantidade: 2", 60.0, 40.0),
            text("7", 20.0, 80.0),
        ];
        for (i, category) in PhotoCategory::ALL.iter().enumerate() {
            let x = 60.0 + i as f32 * 130.0;
            prims.push(text(category.prompt(), x, 100.0));
            if *category != PhotoCategory::Inspection {
                prims.push(LayoutPrimitive::Image(ImageBlock {
                    x,
                    y: 110.0,
                    width: 120.0,
                    height: 90.0,
                }));
            }
        }
        let layout = DocumentLayout {
            pages: vec![PageLayout {
                number: 1,
                width: 595.0,
                height: 842.0,
                primitives: prims,
            }],
        };

        let s = analyze_photos(&layout, "X99_poda.pdf", &MatchConfig::default());
        assert_eq!(s.project, "4471-A");
        assert_eq!(s.circuit, "CX3");
        assert_eq!(s.note, "(não informada)");
        assert_eq!(s.total_quantity, 2);
        assert_eq!(s.missing.lines(), ["codigo 7 : Inspeção"]);
    }

    #[test]
    fn test_project_falls_back_to_file_name() {
        let s = analyze_photos(&DocumentLayout::default(), "X99_poda.pdf", &MatchConfig::default());
        assert_eq!(s.project, "X99");
        assert_eq!(s.status(), PhotoStatus::Complete);
        assert_eq!(s.total_quantity, 0);
    }

    #[test]
    fn test_analyze_execution() {
        let layout = DocumentLayout {
            pages: vec![PageLayout {
                number: 1,
                primitives: vec![
                    text("MUNICÍPIO: Osasco", 40.0, 40.0),
                    text("SUBPREFEITURA: Centro", 40.0, 60.0),
                    text("TOTAL GERAL 37 JUNHO", 40.0, 700.0),
                ],
                ..Default::default()
            }],
        };
        let s = analyze_execution(&layout);
        assert_eq!(s.total_general, "37");
        assert_eq!(s.month, "JUNHO");
        assert_eq!(s.municipality, "Osasco");
        assert_eq!(s.sub_municipality, "Centro");
        let block = s.result_block();
        assert_eq!(block.header, "Comunicação de Execução");
        assert_eq!(block.text(), "TOTAL GERAL 37  JUNHO\nMUNICÍPIO: Osasco\nSUBPREFEITURA: Centro");
    }
}
