pub mod panels;
pub mod plot;
pub mod tabs;

/// `species` → `Species`, for headings built from column names.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
