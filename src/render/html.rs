//! Final print HTML for a letter. The template body is trusted rich text
//! authored by staff; everything else interpolated here is escaped.

use std::fmt::Write;

use crate::database::models::{CarbonCopy, LetterSignature};

use super::{render_body, LetterRenderData};

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const STYLE: &str = r#"
body { font-family: "Times New Roman", serif; font-size: 12pt; margin: 2cm; }
.letterhead { text-align: center; border-bottom: 3px double #000; padding-bottom: 8px; }
.letterhead img { height: 80px; float: left; }
.letterhead h1 { font-size: 14pt; margin: 0; }
.letterhead h2 { font-size: 12pt; margin: 0; font-weight: normal; }
.letterhead .address { font-size: 10pt; margin: 0; }
.body { margin-top: 16px; }
.signatures { display: grid; margin-top: 32px; gap: 8px; }
.signatures.cols-2 { grid-template-columns: 1fr 1fr; }
.signatures.cols-3 { grid-template-columns: 1fr 1fr 1fr; }
.sig-block { text-align: center; }
.sig-label-hidden { visibility: hidden; }
.sig-mark { height: 64px; }
.sig-space { height: 64px; }
.sig-name { text-decoration: underline; font-weight: bold; }
.carbon-copy { margin-top: 24px; font-size: 10pt; }
.attachment { page-break-before: always; }
"#;

fn push_letterhead(out: &mut String, data: &LetterRenderData) {
    let Some(letterhead) = &data.letterhead else {
        return;
    };
    out.push_str("<header class=\"letterhead\">");
    if let Some(logo) = &letterhead.logo {
        let _ = write!(out, "<img src=\"{}\" alt=\"logo\" />", escape_html(logo));
    }
    let _ = write!(out, "<h1>{}</h1>", escape_html(&letterhead.header));
    if let Some(subheader) = &letterhead.subheader {
        let _ = write!(out, "<h2>{}</h2>", escape_html(subheader));
    }
    if let Some(address) = &letterhead.address {
        let _ = write!(out, "<p class=\"address\">{}</p>", escape_html(address));
    }
    out.push_str("</header>");
}

fn push_signature_block(out: &mut String, signature: &LetterSignature, any_acknowledged: bool) {
    let _ = write!(out, "<div class=\"sig-block {}\">", signature.position.css_class());
    if signature.is_acknowledged {
        out.push_str("<div class=\"sig-label\">Mengetahui,</div>");
    } else if any_acknowledged {
        // Hidden placeholder keeps acknowledged and plain blocks row-aligned.
        out.push_str("<div class=\"sig-label sig-label-hidden\">Mengetahui,</div>");
    }
    let _ = write!(out, "<div>{}</div>", escape_html(&signature.occupation));
    match &signature.signature {
        Some(mark) => {
            let _ = write!(
                out,
                "<img class=\"sig-mark\" src=\"{}\" alt=\"ditandatangani\" />",
                escape_html(mark)
            );
        }
        None => out.push_str("<div class=\"sig-space\"></div>"),
    }
    let _ = write!(out, "<div class=\"sig-name\">{}</div>", escape_html(&signature.official_name));
    if let Some(code) = &signature.unique_code {
        let _ = write!(out, "<div class=\"sig-code\">{}</div>", escape_html(code));
    }
    out.push_str("</div>");
}

fn push_carbon_copy(out: &mut String, carbon_copy: &CarbonCopy) {
    out.push_str("<div class=\"carbon-copy\">");
    match carbon_copy {
        // Pre-formatted rich text goes out verbatim, like the template body.
        CarbonCopy::Text(text) => out.push_str(text),
        CarbonCopy::List(lines) => {
            out.push_str("<p>Tembusan:</p><ol>");
            for line in lines {
                let _ = write!(out, "<li>{}</li>", escape_html(line));
            }
            out.push_str("</ol>");
        }
    }
    out.push_str("</div>");
}

pub fn render_html(data: &LetterRenderData) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\" />");
    let _ = write!(out, "<title>{}</title>", escape_html(&data.submission.name));
    let _ = write!(out, "<style>{}</style>", STYLE);
    out.push_str("</head><body>");

    push_letterhead(&mut out, data);

    let _ = write!(out, "<main class=\"body\">{}</main>", render_body(data));

    if !data.signatures.is_empty() {
        let columns = if data.signatures.iter().any(|s| s.position.is_center()) { 3 } else { 2 };
        let any_acknowledged = data.signatures.iter().any(|s| s.is_acknowledged);
        let _ = write!(out, "<section class=\"signatures cols-{}\">", columns);
        for signature in &data.signatures {
            push_signature_block(&mut out, signature, any_acknowledged);
        }
        out.push_str("</section>");
    }

    if let Some(carbon_copy) = &data.submission.carbon_copy {
        push_carbon_copy(&mut out, carbon_copy);
    }

    for attachment in data.attachments.iter().filter(|a| a.is_visible) {
        let _ = write!(out, "<div class=\"attachment\">{}</div>", attachment.content);
    }

    out.push_str("</body></html>");
    out
}
