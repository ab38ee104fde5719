use super::*;
use std::collections::HashSet;

#[test]
fn catalog_has_unique_ids() {
    let ids: HashSet<_> = catalog().iter().map(|a| a.id).collect();
    assert_eq!(ids.len(), catalog().len());
}

#[test]
fn every_article_has_body_and_tags() {
    for article in catalog() {
        assert!(!article.body_markdown.trim().is_empty(), "article {} has no body", article.id);
        assert!(article.body_markdown.starts_with("###"), "article {} body is not markdown", article.id);
        assert!(!article.tags.is_empty());
        assert!(article.tags.iter().all(|t| t.starts_with('#')));
        assert!(article.read_time_minutes > 0);
    }
}

#[test]
fn find_returns_known_articles_only() {
    assert_eq!(find("5").map(|a| a.primary_tag()), Some(Some("YapayZeka")));
    assert!(find("99").is_none());
}

#[test]
fn impact_display_is_lowercase() {
    assert_eq!(Impact::Mixed.to_string(), "mixed");
    assert_eq!(find("2").unwrap().impact, Impact::Negative);
}
