//! Wall clock helpers. Metadata only; nothing in generation depends on them.

/// Current local time in the `dd/mm/YYYY HH:MM:SS` form used in provenance
/// comments
#[must_use]
pub fn timenow() -> String {
    chrono::Local::now().format("%d/%m/%Y %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timenow_shape() {
        let now = timenow();
        assert_eq!(now.len(), 19);
        assert_eq!(&now[2..3], "/");
        assert_eq!(&now[10..11], " ");
    }
}
