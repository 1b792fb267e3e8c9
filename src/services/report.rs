//! PDF report rendering for objects, relations and hierarchies.
//!
//! Reports use the builtin Helvetica faces so no font files ship with the
//! binary. Ids that no longer resolve to an object render as "Unknown".

use std::collections::BTreeMap;
use std::str::FromStr;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::domain::{HierarchyDto, ObjectDto, RelationDto};
use crate::error::{ObjectDesignError, Result};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Objects,
    Relations,
    Hierarchies,
    Full,
}

impl FromStr for ReportType {
    type Err = ObjectDesignError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "objects" => Ok(Self::Objects),
            "relations" => Ok(Self::Relations),
            "hierarchies" => Ok(Self::Hierarchies),
            "full" => Ok(Self::Full),
            other => Err(ObjectDesignError::InvalidFormat(format!(
                "unknown report type '{}'",
                other
            ))),
        }
    }
}

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    cursor_mm: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor_mm: PAGE_HEIGHT_MM - MARGIN_MM,
        })
    }

    fn advance(&mut self, line_height_mm: f32) {
        if self.cursor_mm - line_height_mm < MARGIN_MM {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.cursor_mm = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        self.cursor_mm -= line_height_mm;
    }

    fn heading(&mut self, text: &str) {
        self.advance(10.0);
        self.layer
            .use_text(text, 14.0, Mm(MARGIN_MM), Mm(self.cursor_mm), &self.bold);
    }

    fn title(&mut self, text: &str) {
        self.advance(14.0);
        self.layer
            .use_text(text, 20.0, Mm(MARGIN_MM), Mm(self.cursor_mm), &self.bold);
    }

    fn line(&mut self, text: &str) {
        self.indented_line(text, 0.0);
    }

    fn indented_line(&mut self, text: &str, indent_mm: f32) {
        self.advance(6.0);
        self.layer.use_text(
            text,
            10.0,
            Mm(MARGIN_MM + indent_mm),
            Mm(self.cursor_mm),
            &self.regular,
        );
    }

    fn gap(&mut self) {
        self.advance(6.0);
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))
    }
}

fn generated_stamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let rendered = OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_default();
    format!("Generated on: {}", rendered)
}

fn object_name<'a>(objects: &'a [ObjectDto], id: &str) -> &'a str {
    objects
        .iter()
        .find(|obj| obj.id == id)
        .map(|obj| obj.name.as_str())
        .unwrap_or("Unknown")
}

fn object_label(objects: &[ObjectDto], id: &str) -> String {
    match objects.iter().find(|obj| obj.id == id) {
        Some(obj) => format!("{} ({})", obj.name, obj.kind),
        None => "Unknown (Unknown)".to_string(),
    }
}

fn group_by_parent(hierarchies: &[HierarchyDto]) -> BTreeMap<String, Vec<&HierarchyDto>> {
    let mut groups: BTreeMap<String, Vec<&HierarchyDto>> = BTreeMap::new();
    for hierarchy in hierarchies {
        let key = hierarchy
            .parent_object_id
            .clone()
            .unwrap_or_else(|| "root".to_string());
        groups.entry(key).or_default().push(hierarchy);
    }
    groups
}

fn write_objects_section(writer: &mut PageWriter, objects: &[ObjectDto], detailed: bool) {
    if objects.is_empty() {
        writer.line("No objects found.");
        return;
    }
    for (index, obj) in objects.iter().enumerate() {
        if detailed {
            writer.heading(&format!("{}. {}", index + 1, obj.name));
            writer.line(&format!("Type: {}", obj.kind));
            if !obj.description.is_empty() {
                writer.line(&format!("Description: {}", obj.description));
            }
            if obj.attributes != serde_json::json!({}) {
                writer.line(&format!("Attributes: {}", obj.attributes));
            }
            if let Some(tables) = obj.tables.as_array() {
                if !tables.is_empty() {
                    writer.line("Tables:");
                    for table in tables {
                        let name = table
                            .get("name")
                            .and_then(|v| v.as_str())
                            .unwrap_or("Unknown");
                        writer.indented_line(&format!("- {}", name), 6.0);
                    }
                }
            }
            writer.gap();
        } else {
            writer.heading(&format!("{}. {} ({})", index + 1, obj.name, obj.kind));
            if !obj.description.is_empty() {
                writer.line(&format!("Description: {}", obj.description));
            }
        }
    }
}

fn write_relations_section(
    writer: &mut PageWriter,
    relations: &[RelationDto],
    objects: &[ObjectDto],
    detailed: bool,
) {
    if relations.is_empty() {
        writer.line("No relations found.");
        return;
    }
    for (index, relation) in relations.iter().enumerate() {
        let primary = object_name(objects, &relation.primary_object_id);
        let label = relation.relation_type.replace('_', " ");
        writer.heading(&format!("{}. {} -> {}", index + 1, primary, label));
        if detailed && !relation.secondary_object_ids.is_empty() {
            writer.line("Related Objects:");
            for id in &relation.secondary_object_ids {
                writer.indented_line(&format!("- {}", object_label(objects, id)), 6.0);
            }
        }
        if let Some(description) = &relation.description {
            writer.line(&format!("Description: {}", description));
        }
        writer.gap();
    }
}

fn write_hierarchies_section(
    writer: &mut PageWriter,
    hierarchies: &[HierarchyDto],
    objects: &[ObjectDto],
    detailed: bool,
) {
    if hierarchies.is_empty() {
        writer.line("No hierarchies found.");
        return;
    }
    for (parent_id, group) in group_by_parent(hierarchies) {
        let parent_name = if parent_id == "root" {
            "Root Level".to_string()
        } else {
            object_name(objects, &parent_id).to_string()
        };
        writer.heading(&format!("Parent: {}", parent_name));
        for hierarchy in group {
            if hierarchy.child_object_ids.is_empty() {
                continue;
            }
            if detailed {
                writer.line(&format!("Level {} Children:", hierarchy.level.max(1)));
            }
            for child_id in &hierarchy.child_object_ids {
                let label = if detailed {
                    object_label(objects, child_id)
                } else {
                    object_name(objects, child_id).to_string()
                };
                writer.indented_line(&format!("- {}", label), 6.0);
            }
        }
        writer.gap();
    }
}

pub fn objects_report(objects: &[ObjectDto]) -> Result<Vec<u8>> {
    let mut writer = PageWriter::new("Objects Report")?;
    writer.title("Object Design System - Objects Report");
    writer.line(&generated_stamp());
    writer.gap();
    write_objects_section(&mut writer, objects, true);
    writer.finish()
}

pub fn relations_report(relations: &[RelationDto], objects: &[ObjectDto]) -> Result<Vec<u8>> {
    let mut writer = PageWriter::new("Relations Report")?;
    writer.title("Object Design System - Relations Report");
    writer.line(&generated_stamp());
    writer.gap();
    write_relations_section(&mut writer, relations, objects, true);
    writer.finish()
}

pub fn hierarchies_report(
    hierarchies: &[HierarchyDto],
    objects: &[ObjectDto],
) -> Result<Vec<u8>> {
    let mut writer = PageWriter::new("Hierarchies Report")?;
    writer.title("Object Design System - Hierarchies Report");
    writer.line(&generated_stamp());
    writer.gap();
    write_hierarchies_section(&mut writer, hierarchies, objects, true);
    writer.finish()
}

pub fn full_report(
    objects: &[ObjectDto],
    relations: &[RelationDto],
    hierarchies: &[HierarchyDto],
) -> Result<Vec<u8>> {
    let mut writer = PageWriter::new("Complete Report")?;
    writer.title("Object Design System - Complete Report");
    writer.line(&generated_stamp());
    writer.gap();

    writer.heading("OBJECTS");
    write_objects_section(&mut writer, objects, false);
    writer.gap();

    writer.heading("RELATIONS");
    write_relations_section(&mut writer, relations, objects, false);
    writer.gap();

    writer.heading("HIERARCHIES");
    write_hierarchies_section(&mut writer, hierarchies, objects, false);

    writer.gap();
    writer.line("Generated by Object Design System");
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_object(id: &str, name: &str) -> ObjectDto {
        ObjectDto {
            id: id.to_string(),
            name: name.to_string(),
            description: "a part".to_string(),
            kind: "Item".to_string(),
            attributes: json!({}),
            tables: json!([]),
            created_date: "1970-01-01T00:00:00Z".to_string(),
            modified_date: "1970-01-01T00:00:00Z".to_string(),
            revision: 1,
        }
    }

    #[test]
    fn report_type_parses_known_names_only() {
        assert_eq!(ReportType::from_str("objects").unwrap(), ReportType::Objects);
        assert_eq!(ReportType::from_str("full").unwrap(), ReportType::Full);
        assert!(ReportType::from_str("everything").is_err());
    }

    #[test]
    fn objects_report_yields_pdf_bytes() {
        let objects = vec![sample_object("a", "Widget")];
        let bytes = objects_report(&objects).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_full_report_still_renders() {
        let bytes = full_report(&[], &[], &[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn hierarchy_grouping_treats_missing_parent_as_root() {
        let hierarchies = vec![HierarchyDto {
            id: "h".to_string(),
            parent_object_id: None,
            child_object_ids: vec!["a".to_string()],
            level: 1,
            properties: json!({}),
        }];
        let groups = group_by_parent(&hierarchies);
        assert!(groups.contains_key("root"));
    }
}
