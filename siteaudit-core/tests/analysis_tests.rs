// Tests for the analysis rule engine

use siteaudit_core::analysis::{
    CmsDetectionRule, H1Rule, MetaDescriptionRule, RepeatedIdRule, Rule, RuleError, RuleSet,
    SocialLinkRule,
};
use siteaudit_scanner::extractor::{Extractor, PageContent};
use siteaudit_scanner::result::{Finding, Severity};
use url::Url;

fn extract(html: &str) -> PageContent {
    let base = Url::parse("https://example.com/").unwrap();
    Extractor::new().extract(html, &base)
}

// ============================================================================
// RepeatedID
// ============================================================================

#[test]
fn test_repeated_id_flags_duplicates_only() {
    let content = extract(
        r#"<div id="nav"></div><span id="nav"></span><section id="main"></section>"#,
    );
    let findings = RepeatedIdRule.evaluate(&content).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule, "RepeatedID");
    assert_eq!(findings[0].severity, Severity::Warning);
    let evidence = findings[0].evidence.as_ref().unwrap();
    assert_eq!(evidence["id"], "nav");
    assert_eq!(evidence["count"], 2);
}

#[test]
fn test_repeated_id_clean_page() {
    let content = extract(r#"<div id="a"></div><div id="b"></div>"#);
    let findings = RepeatedIdRule.evaluate(&content).unwrap();
    assert!(findings.is_empty());
}

#[test]
fn test_repeated_id_one_finding_per_offending_id() {
    let content = extract(
        r#"<i id="x"></i><i id="x"></i><i id="x"></i><i id="y"></i><i id="y"></i>"#,
    );
    let findings = RepeatedIdRule.evaluate(&content).unwrap();
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].evidence.as_ref().unwrap()["count"], 3);
    assert_eq!(findings[1].evidence.as_ref().unwrap()["count"], 2);
}

// ============================================================================
// H1Check
// ============================================================================

#[test]
fn test_h1_exactly_one_is_clean() {
    let content = extract("<h1>Title</h1><h2>Sub</h2>");
    let findings = H1Rule.evaluate(&content).unwrap();
    assert!(findings.is_empty());
}

#[test]
fn test_h1_missing_is_flagged() {
    let content = extract("<h2>Only a subheading</h2>");
    let findings = H1Rule.evaluate(&content).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
    assert_eq!(findings[0].evidence.as_ref().unwrap()["count"], 0);
}

#[test]
fn test_h1_multiple_is_flagged() {
    let content = extract("<h1>One</h1><h1>Two</h1>");
    let findings = H1Rule.evaluate(&content).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].evidence.as_ref().unwrap()["count"], 2);
}

// ============================================================================
// MetaDescriptionCheck
// ============================================================================

#[test]
fn test_meta_description_missing_is_flagged() {
    let content = extract("<head><title>t</title></head>");
    let findings = MetaDescriptionRule.evaluate(&content).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
}

#[test]
fn test_meta_description_empty_is_flagged_like_missing() {
    let empty = extract(r#"<head><meta name="description" content=""></head>"#);
    let missing = extract("<head></head>");

    let empty_findings = MetaDescriptionRule.evaluate(&empty).unwrap();
    let missing_findings = MetaDescriptionRule.evaluate(&missing).unwrap();

    assert_eq!(empty_findings.len(), 1);
    assert_eq!(empty_findings[0].message, missing_findings[0].message);
}

#[test]
fn test_meta_description_whitespace_only_is_flagged() {
    let content = extract(r#"<head><meta name="description" content="   "></head>"#);
    assert_eq!(MetaDescriptionRule.evaluate(&content).unwrap().len(), 1);
}

#[test]
fn test_meta_description_present_is_clean() {
    let content = extract(r#"<head><meta name="description" content="A real description"></head>"#);
    assert!(MetaDescriptionRule.evaluate(&content).unwrap().is_empty());
}

// ============================================================================
// MismatchedSocialLinks
// ============================================================================

#[test]
fn test_social_link_with_wrong_icon_is_flagged() {
    let content = extract(
        r#"<a href="https://facebook.com/acme"><i class="fab fa-instagram"></i></a>"#,
    );
    let findings = SocialLinkRule.evaluate(&content).unwrap();

    assert_eq!(findings.len(), 1);
    let evidence = findings[0].evidence.as_ref().unwrap();
    assert_eq!(evidence["expectedPlatform"], "Facebook");
    assert_eq!(evidence["url"], "https://facebook.com/acme");
}

#[test]
fn test_social_link_with_matching_text_is_clean() {
    let content = extract(r#"<a href="https://facebook.com/acme">Find us on Facebook</a>"#);
    assert!(SocialLinkRule.evaluate(&content).unwrap().is_empty());
}

#[test]
fn test_social_link_with_matching_icon_is_clean() {
    let content =
        extract(r#"<a href="https://www.instagram.com/acme"><i class="fa-instagram"></i></a>"#);
    assert!(SocialLinkRule.evaluate(&content).unwrap().is_empty());
}

#[test]
fn test_social_link_with_aria_label_is_clean() {
    let content = extract(r#"<a href="https://x.com/acme" aria-label="Twitter profile"></a>"#);
    assert!(SocialLinkRule.evaluate(&content).unwrap().is_empty());
}

#[test]
fn test_non_social_anchor_is_ignored() {
    let content = extract(r#"<a href="https://example.org/about">About</a>"#);
    assert!(SocialLinkRule.evaluate(&content).unwrap().is_empty());
}

// ============================================================================
// CMSDetection
// ============================================================================

#[test]
fn test_cms_detects_wordpress_from_generator() {
    let content =
        extract(r#"<head><meta name="generator" content="WordPress 6.2"></head>"#);
    let findings = CmsDetectionRule.evaluate(&content).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Info);
    let evidence = findings[0].evidence.as_ref().unwrap();
    assert_eq!(evidence["platform"], "WordPress");
    assert_eq!(evidence["confidence"], "high");
}

#[test]
fn test_cms_detects_wordpress_from_asset_paths() {
    let content = extract(r#"<script src="/wp-content/themes/x/app.js"></script>"#);
    let findings = CmsDetectionRule.evaluate(&content).unwrap();

    assert_eq!(findings.len(), 1);
    let evidence = findings[0].evidence.as_ref().unwrap();
    assert_eq!(evidence["platform"], "WordPress");
    assert_eq!(evidence["confidence"], "medium");
}

#[test]
fn test_cms_detects_shopify_from_cdn() {
    let content = extract(
        r#"<link rel="stylesheet" href="https://cdn.shopify.com/s/files/theme.css">"#,
    );
    let findings = CmsDetectionRule.evaluate(&content).unwrap();
    assert_eq!(findings[0].evidence.as_ref().unwrap()["platform"], "Shopify");
}

#[test]
fn test_cms_priority_order_is_fixed() {
    // Both WordPress and Shopify signals present: WordPress is earlier in
    // the signature list, so it must win every time.
    let content = extract(
        r#"<script src="/wp-content/app.js"></script>
           <link href="https://cdn.shopify.com/theme.css">"#,
    );
    let findings = CmsDetectionRule.evaluate(&content).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].evidence.as_ref().unwrap()["platform"], "WordPress");
}

#[test]
fn test_cms_unknown_platform_yields_no_findings() {
    let content = extract("<html><body><p>hand-written site</p></body></html>");
    assert!(CmsDetectionRule.evaluate(&content).unwrap().is_empty());
}

// ============================================================================
// Rule engine behavior
// ============================================================================

struct FailingRule;

impl Rule for FailingRule {
    fn name(&self) -> &'static str {
        "AlwaysFails"
    }

    fn evaluate(&self, _content: &PageContent) -> Result<Vec<Finding>, RuleError> {
        Err(RuleError::Evaluation("fixture failure".to_string()))
    }
}

#[test]
fn test_failing_rule_is_isolated() {
    let ruleset = RuleSet::new()
        .with_rule(Box::new(FailingRule))
        .with_rule(Box::new(H1Rule));
    let content = extract("<h2>no h1 here</h2>");

    let findings = ruleset.analyze(&content);

    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].rule, "AlwaysFails");
    assert_eq!(findings[0].severity, Severity::Error);
    assert!(findings[0].message.contains("fixture failure"));
    // The failing rule did not suppress the one after it.
    assert_eq!(findings[1].rule, "H1Check");
}

#[test]
fn test_builtin_rule_order_is_deterministic() {
    let content = extract(
        r#"<head><meta name="generator" content="WordPress 6.2"></head>
           <body><div id="d"></div><div id="d"></div></body>"#,
    );

    let first = RuleSet::builtin().analyze(&content);
    let second = RuleSet::builtin().analyze(&content);
    assert_eq!(first, second);

    let rules: Vec<&str> = first.iter().map(|f| f.rule.as_str()).collect();
    // RepeatedID runs before the h1/meta checks, CMSDetection last.
    assert_eq!(
        rules,
        vec![
            "RepeatedID",
            "H1Check",
            "MetaDescriptionCheck",
            "CMSDetection"
        ]
    );
}

#[test]
fn test_ruleset_callback_adapter() {
    let callback = RuleSet::builtin().into_callback();
    let content = extract("<h1>One</h1><h1>Two</h1>");
    let findings = callback(&content);
    assert!(findings.iter().any(|f| f.rule == "H1Check"));
}
