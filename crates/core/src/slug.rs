//! URL-safe category slugs.

use crate::error::CoreError;

/// Maximum slug length (matches the `categories.slug` column).
pub const MAX_SLUG_LEN: usize = 100;

/// Derive a slug from a display name.
///
/// Non-ASCII letters are transliterated, everything else that is not an
/// ASCII alphanumeric collapses into a single `-`.
///
/// ```
/// use storefront_core::slug::slugify;
///
/// assert_eq!(slugify("Home & Garden"), "home-garden");
/// assert_eq!(slugify("Café Crème"), "cafe-creme");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = ::slug::slugify(name);
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// Check that `slug` is non-empty, lowercase, and URL-safe (`[a-z0-9-]`).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation(
            "Slug must not be empty; give the category a name with letters or digits.".into(),
        ));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(CoreError::Validation(format!(
            "Slug must be at most {MAX_SLUG_LEN} characters."
        )));
    }
    let well_formed = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed || slug.starts_with('-') || slug.ends_with('-') {
        return Err(CoreError::Validation(format!(
            "Slug '{slug}' may only contain lowercase letters, digits, and inner hyphens."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name() {
        assert_eq!(slugify("Electronics"), "electronics");
    }

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("  Men's -- Shoes  "), "men-s-shoes");
    }

    #[test]
    fn transliterates_non_ascii() {
        assert_eq!(slugify("Café Crème"), "cafe-creme");
        assert_eq!(slugify("Straße"), "strasse");
    }

    #[test]
    fn no_alphanumerics_gives_empty_slug() {
        assert_eq!(slugify("!!!"), "");
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn truncation_never_leaves_trailing_dash() {
        let name = format!("{} b", "a".repeat(MAX_SLUG_LEN - 1));
        let slug = slugify(&name);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn slugify_output_always_validates() {
        for name in ["Books", "Home & Garden", "4K TVs", "a--b"] {
            assert!(validate_slug(&slugify(name)).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_uppercase_and_edges() {
        assert!(validate_slug("Books").is_err());
        assert!(validate_slug("-books").is_err());
        assert!(validate_slug("books-").is_err());
        assert!(validate_slug("books_and").is_err());
    }
}
