pub const FOOTER: &str = "</Document></kml>\n";

/// XML declaration and document opening. `title` is written as given.
pub fn header(title: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<kml><Document><name>{}</name>\n",
        title
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_the_title_verbatim() {
        assert_eq!(
            header("INEGI"),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<kml><Document><name>INEGI</name>\n"
        );
        assert!(header("A & B").contains("<name>A & B</name>"));
    }
}
