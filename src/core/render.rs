use crate::domain::model::Scope;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_]\w*)\s*\}\}").expect("placeholder pattern is valid")
});

/// 將題幹中的 `{{name}}` 換成變數的字串形式；找不到的變數原樣保留
pub fn render(stem: &str, scope: &Scope) -> String {
    PLACEHOLDER
        .replace_all(stem, |caps: &Captures| match scope.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
