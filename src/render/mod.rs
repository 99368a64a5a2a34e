//! Letter rendering: pure functions from stored rows to substituted body
//! text, structured view data, and final print HTML. Nothing in this module
//! touches the store.

pub mod dates;
pub mod html;
pub mod placeholder;

use serde::Serialize;
use serde_json::json;

use crate::database::models::{
    CarbonCopy, Letter, LetterAttachment, LetterSignature, Letterhead, SignaturePosition, Student,
    Submission,
};

pub use html::render_html;

/// Everything the renderer needs for one letter, assembled by the submission
/// service from stored rows.
#[derive(Debug, Clone)]
pub struct LetterRenderData {
    pub template_content: String,
    pub letter: Letter,
    pub submission: Submission,
    pub student: Option<Student>,
    /// Name of the submission's institution, for the `program_studi`
    /// placeholder.
    pub institution_name: Option<String>,
    /// `(attribute_name, content)` pairs for the dynamic placeholders.
    pub attributes: Vec<(String, String)>,
    pub signatures: Vec<LetterSignature>,
    pub attachments: Vec<LetterAttachment>,
    pub letterhead: Option<Letterhead>,
}

/// One signature block in the structured view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureBlock {
    pub official_name: String,
    pub occupation: String,
    pub unique_code: Option<String>,
    pub position: SignaturePosition,
    pub is_acknowledged: bool,
    pub signed: bool,
    pub signature: Option<String>,
}

/// Structured, placeholder-substituted letter for client-side rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedLetter {
    pub letter_name: String,
    pub letter_number: Option<String>,
    pub letter_date: String,
    pub letter_date_hijri: String,
    pub content: String,
    pub letterhead: Option<Letterhead>,
    pub signatures: Vec<SignatureBlock>,
    pub carbon_copy: Option<CarbonCopy>,
    /// Visible attachments only, in stored order.
    pub attachments: Vec<String>,
}

/// Substituted letter body. Placeholders resolve in fixed order: submitter,
/// letter, submission, then dynamic attributes.
pub fn render_body(data: &LetterRenderData) -> String {
    let mut pairs = submitter_pairs(data);

    pairs.push(("nama_surat".to_string(), data.letter.letter_name.clone()));
    pairs.push((
        "nomor_referensi".to_string(),
        data.letter.reference_number.clone().unwrap_or_default(),
    ));

    pairs.push((
        "nomor_surat".to_string(),
        data.submission.letter_number.clone().unwrap_or_default(),
    ));
    let (gregorian, hijri) = match data.submission.letter_date {
        Some(date) => (dates::format_date_id(date), dates::format_hijri_date(date)),
        None => (String::new(), String::new()),
    };
    pairs.push(("tanggal_surat".to_string(), gregorian));
    pairs.push(("tanggal_hijriah".to_string(), hijri));

    for (name, content) in &data.attributes {
        pairs.push((name.clone(), content.clone()));
    }

    placeholder::substitute(&data.template_content, &pairs)
}

fn submitter_pairs(data: &LetterRenderData) -> Vec<(String, String)> {
    let Some(student) = &data.student else {
        // No submitter: the mapping still runs so its placeholders vanish.
        return placeholder::student_pairs(&json!({}));
    };
    let mut value = json!({
        "fullname": student.fullname,
        "nim": student.nim,
        "classYear": student.class_year,
        "address": student.address,
        "phoneNumber": student.phone_number,
        "birthplace": student.birthplace,
        "gender": student.gender,
        "institution": data.institution_name.as_ref().map(|name| json!({"name": name})),
    });
    if let Some(birthday) = student.birthday {
        value["birthday"] = json!(dates::format_date_id(birthday));
    }
    placeholder::student_pairs(&value)
}

/// Structured view for the public letter endpoint.
pub fn rendered_view(data: &LetterRenderData) -> RenderedLetter {
    RenderedLetter {
        letter_name: data.letter.letter_name.clone(),
        letter_number: data.submission.letter_number.clone(),
        letter_date: data
            .submission
            .letter_date
            .map(dates::format_date_id)
            .unwrap_or_default(),
        letter_date_hijri: data
            .submission
            .letter_date
            .map(dates::format_hijri_date)
            .unwrap_or_default(),
        content: render_body(data),
        letterhead: data.letterhead.clone(),
        signatures: data
            .signatures
            .iter()
            .map(|s| SignatureBlock {
                official_name: s.official_name.clone(),
                occupation: s.occupation.clone(),
                unique_code: s.unique_code.clone(),
                position: s.position,
                is_acknowledged: s.is_acknowledged,
                signed: s.is_signed(),
                signature: s.signature.clone(),
            })
            .collect(),
        carbon_copy: data.submission.carbon_copy.clone(),
        attachments: data
            .attachments
            .iter()
            .filter(|a| a.is_visible)
            .map(|a| a.content.clone())
            .collect(),
    }
}
