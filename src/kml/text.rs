use itertools::Itertools;

/// Title-cases every whitespace-separated token of `raw` and joins them with single spaces.
/// The particle `de` is always written in lower case.
pub fn normalize_display(raw: &str) -> String {
    raw.split_whitespace()
        .map(|token| {
            let token = token.to_lowercase();
            match token.as_str() {
                "de" => token,
                _ => capitalize(&token),
            }
        })
        .join(" ")
}

/// Escapes the five XML-significant characters.
/// Running it over already escaped text escapes the `&` of every entity again.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
