//! Bracketed placeholder substitution over letter template bodies.
//!
//! Placeholders keep their original Indonesian names; substitution runs in a
//! fixed order and a missing value always becomes the empty string, never a
//! dangling `[token]`.

use serde_json::Value;

/// Submitter placeholders and the dotted path each reads from the serialized
/// submitter value.
const STUDENT_PLACEHOLDERS: &[(&str, &str)] = &[
    ("nama_mahasiswa", "fullname"),
    ("nim", "nim"),
    ("angkatan", "classYear"),
    ("program_studi", "institution.name"),
    ("alamat", "address"),
    ("nomor_telepon", "phoneNumber"),
    ("tempat_lahir", "birthplace"),
    ("tanggal_lahir", "birthday"),
    ("jenis_kelamin", "gender"),
];

/// Walk a dotted path through a JSON value. Any missing or null link along
/// the way yields None.
pub fn get_nested<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pairs for the submitter mapping, read from a serialized submitter value.
pub fn student_pairs(student: &Value) -> Vec<(String, String)> {
    STUDENT_PLACEHOLDERS
        .iter()
        .map(|(placeholder, path)| {
            let text = get_nested(student, path).map(as_text).unwrap_or_default();
            (placeholder.to_string(), text)
        })
        .collect()
}

/// Replace every `[name]` occurrence with its value, in the order given.
pub fn substitute(content: &str, pairs: &[(String, String)]) -> String {
    let mut out = content.to_string();
    for (name, value) in pairs {
        out = out.replace(&format!("[{}]", name), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_lookup_absorbs_missing_links() {
        let value = json!({"institution": {"name": "Informatika"}});
        assert_eq!(get_nested(&value, "institution.name"), Some(&json!("Informatika")));
        assert_eq!(get_nested(&value, "institution.parent.name"), None);
        assert_eq!(get_nested(&json!({"a": null}), "a"), None);
    }

    #[test]
    fn missing_values_substitute_as_empty() {
        let pairs = student_pairs(&json!({"fullname": "Budi", "nim": "123"}));
        let out = substitute("[nama_mahasiswa] ([nim]) alamat: [alamat]", &pairs);
        assert_eq!(out, "Budi (123) alamat: ");
    }

    #[test]
    fn substitution_is_literal_not_regex() {
        let pairs = vec![("nim".to_string(), "A.1+2".to_string())];
        assert_eq!(substitute("[nim][nim]", &pairs), "A.1+2A.1+2");
    }
}
