//! Normalization helpers shared by the marketplace extractors.
//!
//! Every helper here works on already-extracted text and never touches the
//! document tree, so the rules can be tested without HTML fixtures.

use std::sync::LazyLock;

use regex::Regex;

static DP_PATH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/dp/([A-Z0-9]{10})").ok());

static BEST_SELLER_RANK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"#([\d,]+) in ([^(#]+)").ok());

/// Returns `true` if `price` is digits with optional thousands commas and at
/// most one decimal point.
#[must_use]
pub fn is_valid_price(price: &str) -> bool {
    if price.matches('.').count() > 1 {
        return false;
    }
    let digits: String = price.chars().filter(|c| *c != ',' && *c != '.').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Trims `raw` and keeps it only if it passes [`is_valid_price`].
#[must_use]
pub fn sanitize_price(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    is_valid_price(trimmed).then(|| trimmed.to_string())
}

/// Drops a leading currency marker such as `₹` or `Rs.` from a displayed price.
#[must_use]
pub fn strip_currency(text: &str) -> &str {
    text.trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .trim_end()
}

/// Exactly ten characters, each `A-Z` or `0-9`.
#[must_use]
pub fn is_asin(candidate: &str) -> bool {
    candidate.len() == 10
        && candidate
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Pulls the ASIN out of a `/dp/<ASIN>` product URL.
#[must_use]
pub fn asin_from_url(url: &str) -> Option<String> {
    let re = DP_PATH.as_ref()?;
    re.captures(url).map(|c| c[1].to_string())
}

/// Resolves a possibly relative href against a marketplace origin.
#[must_use]
pub fn absolute_url(base_url: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = reqwest::Url::parse(base_url).ok()?;
    base.join(href).ok().map(String::from)
}

/// Reads a query parameter such as Flipkart's `pid` from a product URL.
#[must_use]
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// First whitespace-delimited token, e.g. `"4.3 out of 5 stars"` -> `"4.3"`.
#[must_use]
pub fn first_token(text: &str) -> Option<String> {
    text.split_whitespace().next().map(str::to_string)
}

/// Strips surrounding parentheses and whitespace from a review count like `"(1,024)"`.
#[must_use]
pub fn strip_review_parens(text: &str) -> String {
    text.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
        .to_string()
}

/// Parses every `#<rank> in <category>` occurrence, dropping thousands
/// separators from the rank and trimming the category.
#[must_use]
pub fn parse_best_seller_ranks(text: &str) -> Vec<String> {
    let Some(re) = BEST_SELLER_RANK.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|c| {
            let rank = c[1].replace(',', "");
            let category = c[2].trim();
            (!rank.is_empty() && !category.is_empty()).then(|| format!("#{rank} in {category}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_with_separators_is_valid() {
        assert!(is_valid_price("1,234.56"));
        assert!(is_valid_price("12,34,56"));
        assert!(is_valid_price("1,299."));
        assert_eq!(sanitize_price(Some(" 1,234.56 ")).as_deref(), Some("1,234.56"));
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        assert!(!is_valid_price("abc"));
        assert!(!is_valid_price(""));
        assert!(!is_valid_price("1.2.3"));
        assert!(!is_valid_price("₹499"));
        assert_eq!(sanitize_price(Some("abc")), None);
        assert_eq!(sanitize_price(Some("")), None);
        assert_eq!(sanitize_price(None), None);
    }

    #[test]
    fn currency_prefix_is_dropped() {
        assert_eq!(strip_currency("₹1,299"), "1,299");
        assert_eq!(strip_currency(" Rs. 499 "), "499");
        assert_eq!(strip_currency("Free"), "");
    }

    #[test]
    fn asin_pattern() {
        assert!(is_asin("B08N5WRWNW"));
        assert!(!is_asin("b08n5wrwnw"));
        assert!(!is_asin("B08N5WRWN"));
        assert!(!is_asin("B08N5WRWNWX"));
        assert!(!is_asin("B08N5-RWNW"));
    }

    #[test]
    fn asin_from_product_url() {
        assert_eq!(
            asin_from_url("https://www.amazon.in/Echo-Dot/dp/B08N5WRWNW/ref=sr_1_1").as_deref(),
            Some("B08N5WRWNW")
        );
        assert_eq!(asin_from_url("https://www.amazon.in/gp/bestsellers"), None);
    }

    #[test]
    fn relative_links_resolve_against_base() {
        assert_eq!(
            absolute_url("https://www.flipkart.com", "/boat/p/itm1?pid=X").as_deref(),
            Some("https://www.flipkart.com/boat/p/itm1?pid=X")
        );
        assert_eq!(
            absolute_url("https://www.flipkart.com", "https://dl.flipkart.com/x").as_deref(),
            Some("https://dl.flipkart.com/x")
        );
        assert_eq!(absolute_url("not a base", "/x"), None);
    }

    #[test]
    fn query_param_lookup() {
        let url = "https://www.flipkart.com/boat-rockerz/p/itm123?pid=ACCFZGAQJGYCYDCM&lid=x";
        assert_eq!(query_param(url, "pid").as_deref(), Some("ACCFZGAQJGYCYDCM"));
        assert_eq!(query_param(url, "missing"), None);
        assert_eq!(query_param("not a url", "pid"), None);
    }

    #[test]
    fn tokens_and_parens() {
        assert_eq!(first_token("4.3 out of 5 stars").as_deref(), Some("4.3"));
        assert_eq!(first_token("   "), None);
        assert_eq!(strip_review_parens(" (1,024) "), "1,024");
        assert_eq!(strip_review_parens("2,315 Ratings & 180 Reviews"), "2,315 Ratings & 180 Reviews");
    }

    #[test]
    fn best_seller_ranks_are_split_and_cleaned() {
        let ranks = parse_best_seller_ranks("#1,234 in Beauty (See Top 100) #56 in Perfumes");
        assert_eq!(ranks, vec!["#1234 in Beauty", "#56 in Perfumes"]);
    }

    #[test]
    fn best_seller_text_without_ranks() {
        assert!(parse_best_seller_ranks("Best Sellers Rank: not ranked").is_empty());
    }
}
