//! Sample inputs and generator answers

use docflow_mask::SourceFile;

/// Smallest well-formed diagram: start, one task, end
pub const SIMPLE_GRAPH_MODEL: &str = r#"<mxGraphModel dx="800" dy="600" grid="1"><root><mxCell id="0"/><mxCell id="1" parent="0"/><mxCell id="2" value="Start" style="ellipse" vertex="1" parent="1"><mxGeometry x="20" y="40" width="80" height="40" as="geometry"/></mxCell><mxCell id="3" value="Approve invoice" style="rounded=1" vertex="1" parent="1"><mxGeometry x="140" y="40" width="120" height="40" as="geometry"/></mxCell><mxCell id="4" value="End" style="ellipse" vertex="1" parent="1"><mxGeometry x="300" y="40" width="80" height="40" as="geometry"/></mxCell><mxCell id="5" edge="1" source="2" target="3" parent="1"><mxGeometry relative="1" as="geometry"/></mxCell><mxCell id="6" edge="1" source="3" target="4" parent="1"><mxGeometry relative="1" as="geometry"/></mxCell></root></mxGraphModel>"#;

/// Decline in the tagged form
pub const INSUFFICIENT_ANSWER: &str =
    "<insufficient-detail>The description does not say who approves invoices or in which order the steps happen.</insufficient-detail>";

/// Needle matching the document generation prompt
pub const DOCUMENT_NEEDLE: &str = "Write the requirements document";

/// Needle matching the summary prompt
pub const SUMMARY_NEEDLE: &str = "Summarize the material";

/// Needle matching every flow prompt
pub const FLOW_NEEDLE: &str = "Draw the process";

pub const EXECUTIVE_SUMMARY: &str = "Executive Summary";
pub const AS_IS_SECTION: &str = "Current State Process";
pub const TO_BE_SECTION: &str = "Future State Process";

/// Needle matching the extraction prompt for one section
pub fn extraction_needle(label: &str) -> String {
    format!("section titled \"{label}\"")
}

/// Two files that mention the same person and company
pub fn invoice_files() -> Vec<SourceFile> {
    vec![
        SourceFile::new(
            "kickoff_notes.txt",
            "Kickoff with Jane Doe from Acme Corp.\nToday invoices arrive by email and are keyed in by hand.",
        ),
        SourceFile::new(
            "interview.txt",
            "Jane Doe said Acme Corp wants invoices matched to purchase orders automatically.",
        ),
    ]
}

/// Generated document with the default top-level sections
pub fn requirements_document(summary: &str, as_is: &str, to_be: &str) -> String {
    format!(
        "# {EXECUTIVE_SUMMARY}\n\n{summary}\n\n# {AS_IS_SECTION}\n\n{as_is}\n\n# {TO_BE_SECTION}\n\n{to_be}\n\n# Functional Requirements\n\n- Match invoices to purchase orders.\n"
    )
}
