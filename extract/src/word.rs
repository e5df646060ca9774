use docx_rs::{
    DocumentChild, ParagraphChild, ReaderError, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};

/// Plain text of a `.docx` document.
///
/// Paragraphs end with a newline; table cells are separated by tabs and rows by newlines,
/// matching the column convention of PDF extraction. The result is trimmed.
///
/// # Errors
///
/// Fails when the bytes are not a readable `.docx` package; legacy `.doc` files land here.
pub fn extract_word_text(bytes: &[u8]) -> Result<String, ReaderError> {
    let docx = docx_rs::read_docx(bytes)?;

    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                push_paragraph(&paragraph.children, &mut text);
                text.push('\n');
            }
            DocumentChild::Table(table) => push_table(table, &mut text),
            _ => {}
        }
    }
    Ok(text.trim().to_string())
}

fn push_paragraph(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for child in &run.children {
                    match child {
                        RunChild::Text(t) => text.push_str(&t.text),
                        RunChild::Tab(_) => text.push('\t'),
                        RunChild::Break(_) => text.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph(&link.children, text),
            _ => {}
        }
    }
}

fn push_table(table: &Table, text: &mut String) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        let mut cells = Vec::with_capacity(row.cells.len());
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            let mut cell_text = String::new();
            for content in &cell.children {
                let start = cell_text.len();
                match content {
                    TableCellContent::Paragraph(paragraph) => {
                        push_paragraph(&paragraph.children, &mut cell_text);
                    }
                    TableCellContent::Table(nested) => push_table(nested, &mut cell_text),
                    _ => {}
                }
                if start > 0 && cell_text.len() > start {
                    cell_text.insert(start, ' ');
                }
            }
            cells.push(cell_text.replace(['\n', '\t'], " ").trim().to_string());
        }
        text.push_str(&cells.join("\t"));
        text.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use docx_rs::{Docx, Paragraph, Run, TableCell, TableRow};

    use super::*;

    fn pack(docx: Docx) -> Vec<u8> {
        let mut buf = Vec::new();
        docx.build().pack(Cursor::new(&mut buf)).unwrap();
        buf
    }

    fn para(text: &str) -> Paragraph {
        Paragraph::new().add_run(Run::new().add_text(text))
    }

    #[test]
    fn paragraphs_become_lines() {
        let bytes = pack(
            Docx::new()
                .add_paragraph(para("Master Services Agreement"))
                .add_paragraph(para("Effective immediately.")),
        );
        assert_eq!(
            extract_word_text(&bytes).unwrap(),
            "Master Services Agreement\nEffective immediately."
        );
    }

    #[test]
    fn runs_keep_tabs_and_breaks() {
        let run = Run::new()
            .add_text("Name")
            .add_tab()
            .add_text("Value")
            .add_break(docx_rs::BreakType::TextWrapping)
            .add_text("next");
        let bytes = pack(Docx::new().add_paragraph(Paragraph::new().add_run(run)));
        assert_eq!(extract_word_text(&bytes).unwrap(), "Name\tValue\nnext");
    }

    #[test]
    fn tables_use_tab_separated_cells() {
        let table = Table::new(vec![
            TableRow::new(vec![
                TableCell::new().add_paragraph(para("Item")),
                TableCell::new().add_paragraph(para("Price")),
            ]),
            TableRow::new(vec![
                TableCell::new().add_paragraph(para("Widget")),
                TableCell::new().add_paragraph(para("12")),
            ]),
        ]);
        let bytes = pack(Docx::new().add_paragraph(para("Prices")).add_table(table));
        assert_eq!(
            extract_word_text(&bytes).unwrap(),
            "Prices\nItem\tPrice\nWidget\t12"
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(extract_word_text(b"definitely not a zip").is_err());
    }
}
