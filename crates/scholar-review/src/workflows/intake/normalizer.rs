/// Strip spreadsheet artefacts (byte-order marks, zero-width spaces) and collapse whitespace.
pub(crate) fn normalize_cell(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '\u{a0}'], " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| normalize_cell(&raw))
        .filter(|cleaned| !cleaned.is_empty())
}

#[cfg(test)]
pub(crate) fn normalize_for_tests(value: &str) -> String {
    normalize_cell(value)
}
