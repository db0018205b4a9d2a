// Content quality and SEO checks for extracted pages

use serde_json::json;
use siteaudit_scanner::crawler::AnalyzeCallback;
use siteaudit_scanner::extractor::PageContent;
use siteaudit_scanner::result::{Finding, Severity};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("rule evaluation failed: {0}")]
    Evaluation(String),
}

/// One independent, pluggable analysis check. Implementations must be pure
/// functions of the page content: no I/O, deterministic output.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, content: &PageContent) -> Result<Vec<Finding>, RuleError>;
}

/// Ordered collection of rules. The order is fixed so finding order within a
/// page record is deterministic; a failing rule is isolated to a single
/// error-severity finding and never suppresses the other rules.
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in battery, in its documented evaluation order:
    /// RepeatedID, H1Check, MetaDescriptionCheck, MismatchedSocialLinks,
    /// CMSDetection.
    pub fn builtin() -> Self {
        Self::new()
            .with_rule(Box::new(RepeatedIdRule))
            .with_rule(Box::new(H1Rule))
            .with_rule(Box::new(MetaDescriptionRule))
            .with_rule(Box::new(SocialLinkRule))
            .with_rule(Box::new(CmsDetectionRule))
    }

    pub fn with_rule(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn analyze(&self, content: &PageContent) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            match rule.evaluate(content) {
                Ok(mut rule_findings) => findings.append(&mut rule_findings),
                Err(e) => {
                    findings.push(Finding::new(rule.name(), Severity::Error, e.to_string()));
                }
            }
        }
        findings
    }

    /// Adapter for the crawl engine's analyzer hook.
    pub fn into_callback(self) -> AnalyzeCallback {
        Arc::new(move |content| self.analyze(content))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Built-in rules
// ============================================================================

/// Flags every `id` attribute value that appears on two or more elements.
pub struct RepeatedIdRule;

impl Rule for RepeatedIdRule {
    fn name(&self) -> &'static str {
        "RepeatedID"
    }

    fn evaluate(&self, content: &PageContent) -> Result<Vec<Finding>, RuleError> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for id in &content.element_ids {
            *counts.entry(id.as_str()).or_insert(0) += 1;
        }

        // One finding per offending id, in first-occurrence document order.
        let mut reported = Vec::new();
        let mut findings = Vec::new();
        for id in &content.element_ids {
            let count = counts[id.as_str()];
            if count >= 2 && !reported.contains(&id.as_str()) {
                reported.push(id.as_str());
                findings.push(
                    Finding::new(
                        self.name(),
                        Severity::Warning,
                        format!("id \"{}\" appears on {} elements", id, count),
                    )
                    .with_evidence(json!({ "id": id, "count": count })),
                );
            }
        }
        Ok(findings)
    }
}

/// A page should carry exactly one h1.
pub struct H1Rule;

impl Rule for H1Rule {
    fn name(&self) -> &'static str {
        "H1Check"
    }

    fn evaluate(&self, content: &PageContent) -> Result<Vec<Finding>, RuleError> {
        let count = content.headings.iter().filter(|h| h.level == 1).count();
        if count == 1 {
            return Ok(Vec::new());
        }

        let message = if count == 0 {
            "page has no h1 heading".to_string()
        } else {
            format!("page has {} h1 headings", count)
        };
        Ok(vec![
            Finding::new(self.name(), Severity::Warning, message)
                .with_evidence(json!({ "count": count })),
        ])
    }
}

/// Missing, empty or whitespace-only meta description.
pub struct MetaDescriptionRule;

impl Rule for MetaDescriptionRule {
    fn name(&self) -> &'static str {
        "MetaDescriptionCheck"
    }

    fn evaluate(&self, content: &PageContent) -> Result<Vec<Finding>, RuleError> {
        let present = content
            .meta_tags
            .get("description")
            .is_some_and(|d| !d.trim().is_empty());
        if present {
            Ok(Vec::new())
        } else {
            Ok(vec![Finding::new(
                self.name(),
                Severity::Warning,
                "meta description is missing or empty",
            )])
        }
    }
}

/// Known social platforms: the anchor-host suffixes that identify them and
/// the label/icon tokens a matching anchor is expected to carry.
const SOCIAL_PLATFORMS: &[(&str, &[&str], &[&str])] = &[
    ("Facebook", &["facebook.com"], &["facebook", "fb"]),
    ("Twitter", &["twitter.com", "x.com"], &["twitter", "x"]),
    ("Instagram", &["instagram.com"], &["instagram", "ig"]),
    ("LinkedIn", &["linkedin.com"], &["linkedin"]),
    ("TikTok", &["tiktok.com"], &["tiktok"]),
    ("YouTube", &["youtube.com"], &["youtube", "yt"]),
];

/// An anchor that points at a social platform but whose visible text,
/// aria-label and icon classes never mention that platform is likely a
/// copy-paste mistake (e.g. a Facebook icon linking to Instagram).
pub struct SocialLinkRule;

impl SocialLinkRule {
    fn platform_for_host(host: &str) -> Option<(&'static str, &'static [&'static str])> {
        for (platform, domains, aliases) in SOCIAL_PLATFORMS {
            for domain in *domains {
                if host == *domain || host.ends_with(&format!(".{}", domain)) {
                    return Some((platform, aliases));
                }
            }
        }
        None
    }
}

impl Rule for SocialLinkRule {
    fn name(&self) -> &'static str {
        "MismatchedSocialLinks"
    }

    fn evaluate(&self, content: &PageContent) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for anchor in &content.anchors {
            let Ok(url) = Url::parse(&anchor.href) else { continue };
            let Some(host) = url.host_str() else { continue };
            let Some((platform, aliases)) = Self::platform_for_host(host) else {
                continue;
            };

            let mut tokens: Vec<String> = Vec::new();
            tokens.extend(split_tokens(&anchor.text));
            if let Some(label) = &anchor.aria_label {
                tokens.extend(split_tokens(label));
            }
            for class in &anchor.icon_classes {
                tokens.extend(split_tokens(class));
            }

            let references = tokens
                .iter()
                .any(|t| aliases.iter().any(|alias| t == alias));
            if !references {
                findings.push(
                    Finding::new(
                        self.name(),
                        Severity::Warning,
                        format!(
                            "anchor to {} does not reference {} in its text or icons",
                            anchor.href, platform
                        ),
                    )
                    .with_evidence(json!({
                        "url": anchor.href,
                        "expectedPlatform": platform,
                    })),
                );
            }
        }

        Ok(findings)
    }
}

fn split_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// One CMS signature: tested in priority order, first match wins. Generator
/// hits are the strongest signal, asset paths next, bare class names last.
struct CmsSignature {
    platform: &'static str,
    generator_token: Option<&'static str>,
    asset_tokens: &'static [&'static str],
    class_tokens: &'static [&'static str],
}

struct PlatformMatch {
    platform: &'static str,
    confidence: &'static str,
}

impl CmsSignature {
    fn matches(&self, content: &PageContent) -> Option<PlatformMatch> {
        if let Some(token) = self.generator_token
            && let Some(generator) = content.meta_tags.get("generator")
            && generator.to_lowercase().contains(token)
        {
            return Some(PlatformMatch {
                platform: self.platform,
                confidence: "high",
            });
        }

        for asset in &content.asset_urls {
            let asset = asset.to_lowercase();
            if self.asset_tokens.iter().any(|t| asset.contains(t)) {
                return Some(PlatformMatch {
                    platform: self.platform,
                    confidence: "medium",
                });
            }
        }

        if self
            .class_tokens
            .iter()
            .any(|t| content.class_names.iter().any(|c| c.starts_with(t)))
        {
            return Some(PlatformMatch {
                platform: self.platform,
                confidence: "low",
            });
        }

        None
    }
}

const CMS_SIGNATURES: &[CmsSignature] = &[
    CmsSignature {
        platform: "WordPress",
        generator_token: Some("wordpress"),
        asset_tokens: &["wp-content", "wp-includes", "wp-json"],
        class_tokens: &["wp-block"],
    },
    CmsSignature {
        platform: "Shopify",
        generator_token: Some("shopify"),
        asset_tokens: &["cdn.shopify.com"],
        class_tokens: &["shopify-section"],
    },
    CmsSignature {
        platform: "Wix",
        generator_token: Some("wix.com"),
        asset_tokens: &["static.parastorage.com", "wixstatic.com"],
        class_tokens: &[],
    },
    CmsSignature {
        platform: "Squarespace",
        generator_token: Some("squarespace"),
        asset_tokens: &["static1.squarespace.com"],
        class_tokens: &["sqs-block"],
    },
    CmsSignature {
        platform: "Joomla",
        generator_token: Some("joomla"),
        asset_tokens: &["/media/jui/", "index.php?option=com_"],
        class_tokens: &[],
    },
    CmsSignature {
        platform: "Drupal",
        generator_token: Some("drupal"),
        asset_tokens: &["sites/default/files", "/core/misc/drupal"],
        class_tokens: &[],
    },
    CmsSignature {
        platform: "PrestaShop",
        generator_token: Some("prestashop"),
        asset_tokens: &["modules/prestashop"],
        class_tokens: &[],
    },
    CmsSignature {
        platform: "Weebly",
        generator_token: Some("weebly"),
        asset_tokens: &["weebly.com"],
        class_tokens: &[],
    },
];

/// Advisory platform detection: at most one info finding, never an error.
pub struct CmsDetectionRule;

impl Rule for CmsDetectionRule {
    fn name(&self) -> &'static str {
        "CMSDetection"
    }

    fn evaluate(&self, content: &PageContent) -> Result<Vec<Finding>, RuleError> {
        for signature in CMS_SIGNATURES {
            if let Some(found) = signature.matches(content) {
                return Ok(vec![
                    Finding::new(
                        self.name(),
                        Severity::Info,
                        format!("site appears to be built with {}", found.platform),
                    )
                    .with_evidence(json!({
                        "platform": found.platform,
                        "confidence": found.confidence,
                    })),
                ]);
            }
        }
        Ok(Vec::new())
    }
}
