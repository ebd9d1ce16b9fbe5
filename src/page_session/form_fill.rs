//! Form autofill
//!
//! Three independent jobs fill `input`, `textarea` and `select` elements. Each
//! job first checks that its elements exist (bounded by
//! `FORM_ELEMENT_TIMEOUT`) and skips silently when they don't. Mutations on a
//! single element are bounded by `FORM_MUTATION_TIMEOUT`; their failures are
//! ignored because pages routinely reject one of the two write paths.

use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

use crate::browser::{DomNode, PageDriver};
use crate::config::{FormKeywordRule, TaskConfig};
use crate::utils::constants::{FORM_ELEMENT_TIMEOUT, FORM_MUTATION_TIMEOUT};

/// Semantic categories with their keywords and built-in values, tried in order
const BUILTIN_FORM_VALUES: &[(&str, &[&str], &str)] = &[
    ("mail", &["mail"], "crawlscope@example.com"),
    ("code", &["yanzhengma", "code", "ver", "captcha"], "123a"),
    ("phone", &["phone", "number", "tel", "shouji"], "18812345678"),
    (
        "username",
        &["name", "user", "id", "login", "account"],
        "crawlscope@example.com",
    ),
    ("password", &["pass", "pwd"], "Crawlscope6."),
    ("qq", &["qq", "wechat", "tencent", "weixin"], "123456789"),
    ("IdCard", &["card", "shenfen"], "511702197409284963"),
    (
        "url",
        &["url", "site", "web", "blog", "link"],
        "https://crawlscope.example.com/",
    ),
    ("date", &["date", "time", "year", "now"], "2018-01-01"),
    ("number", &["day", "age", "num", "count"], "10"),
];

/// Lookup key used for textareas, which carry no useful type
pub(crate) const TEXTAREA_LOOKUP_KEY: &str = "other";

/// Resolves the value typed into a form field from its lookup key
#[derive(Debug, Clone)]
pub struct FormValueResolver {
    keyword_rules: Vec<FormKeywordRule>,
    custom_values: BTreeMap<String, String>,
    default_value: String,
}

impl FormValueResolver {
    #[must_use]
    pub fn new(
        keyword_rules: Vec<FormKeywordRule>,
        custom_values: BTreeMap<String, String>,
        default_value: impl Into<String>,
    ) -> Self {
        Self {
            keyword_rules,
            custom_values,
            default_value: default_value.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &TaskConfig) -> Self {
        Self::new(
            config.custom_form_keyword_values().to_vec(),
            config.custom_form_values().clone(),
            config.default_form_value(),
        )
    }

    /// Value for `lookup_key`.
    ///
    /// Custom keyword rules win in insertion order, then the built-in category
    /// table (with per-category overrides), then the global default.
    #[must_use]
    pub fn resolve(&self, lookup_key: &str) -> String {
        let key = lookup_key.to_lowercase();

        if let Some(rule) = self
            .keyword_rules
            .iter()
            .find(|rule| !rule.keyword.is_empty() && key.contains(&rule.keyword.to_lowercase()))
        {
            return rule.value.clone();
        }

        for (category, keywords, builtin) in BUILTIN_FORM_VALUES {
            if keywords.iter().any(|kw| key.contains(kw)) {
                return self
                    .custom_values
                    .get(*category)
                    .cloned()
                    .unwrap_or_else(|| (*builtin).to_string());
            }
        }

        self.custom_values
            .get("default")
            .cloned()
            .unwrap_or_else(|| self.default_value.clone())
    }
}

/// What to do with one `<input>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Type the value resolved from this lookup key
    Fill(String),
    Check,
    Upload,
    Skip,
}

/// Classify an input by its `type` attribute
#[must_use]
pub fn classify_input(node: &DomNode) -> InputAction {
    let input_type = node.attr("type").trim().to_ascii_lowercase();
    match input_type.as_str() {
        "" | "text" => InputAction::Fill(
            format!("{}{}{}", node.attr("id"), node.attr("class"), node.attr("name"))
                .to_lowercase(),
        ),
        "email" | "password" | "tel" => InputAction::Fill(input_type),
        "radio" | "checkbox" => InputAction::Check,
        "file" | "image" => InputAction::Upload,
        _ => InputAction::Skip,
    }
}

/// Runs the three fill jobs concurrently and waits for all of them
pub async fn fill_forms<P: PageDriver>(page: &P, resolver: &FormValueResolver, upload_file: &Path) {
    tokio::join!(
        fill_inputs(page, resolver, upload_file),
        fill_textareas(page, resolver),
        fill_selects(page),
    );
}

async fn fill_inputs<P: PageDriver>(page: &P, resolver: &FormValueResolver, upload_file: &Path) {
    let nodes = existing_nodes(page, "input").await;
    for node in &nodes {
        let action = classify_input(node);
        let _ = tokio::time::timeout(
            FORM_MUTATION_TIMEOUT,
            apply_input_action(page, node, action, resolver, upload_file),
        )
        .await;
    }
}

async fn apply_input_action<P: PageDriver>(
    page: &P,
    node: &DomNode,
    action: InputAction,
    resolver: &FormValueResolver,
    upload_file: &Path,
) {
    match action {
        InputAction::Fill(lookup_key) => {
            let value = resolver.resolve(&lookup_key);
            let _ = page.send_keys(node, &value).await;
            let _ = page.set_attribute(node, "value", &value).await;
        }
        InputAction::Check => {
            let _ = page.set_attribute(node, "checked", "true").await;
        }
        InputAction::Upload => {
            let _ = page.remove_attribute(node, "accept").await;
            let _ = page.remove_attribute(node, "required").await;
            let _ = page.set_input_files(node, upload_file).await;
        }
        InputAction::Skip => {}
    }
}

async fn fill_textareas<P: PageDriver>(page: &P, resolver: &FormValueResolver) {
    let nodes = existing_nodes(page, "textarea").await;
    if nodes.is_empty() {
        return;
    }
    let value = resolver.resolve(TEXTAREA_LOOKUP_KEY);
    for node in &nodes {
        let _ = tokio::time::timeout(FORM_MUTATION_TIMEOUT, async {
            let _ = page.send_keys(node, &value).await;
            let _ = page
                .set_property(node, "value", serde_json::Value::from(value.as_str()))
                .await;
        })
        .await;
    }
}

async fn fill_selects<P: PageDriver>(page: &P) {
    let nodes = existing_nodes(page, "select option:first-child").await;
    for node in &nodes {
        let _ = tokio::time::timeout(FORM_MUTATION_TIMEOUT, async {
            let _ = page.set_attribute(node, "selected", "true").await;
            let _ = page
                .set_property(node, "selected", serde_json::Value::Bool(true))
                .await;
        })
        .await;
    }
}

async fn existing_nodes<P: PageDriver>(page: &P, selector: &str) -> Vec<DomNode> {
    let lookup = page.query_nodes(selector, FORM_ELEMENT_TIMEOUT);
    match tokio::time::timeout(FORM_ELEMENT_TIMEOUT, lookup).await {
        Ok(Ok(nodes)) => nodes,
        Ok(Err(e)) => {
            debug!(target: "crawlscope::session", "Query for '{selector}' failed: {e}");
            Vec::new()
        }
        Err(_) => {
            debug!(target: "crawlscope::session", "Query for '{selector}' timed out");
            Vec::new()
        }
    }
}
